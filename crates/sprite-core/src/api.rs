//! Client for the sprite HTTP API.
//!
//! Every endpoint answers with the same envelope:
//! `{"status":"ok","data":...}` or `{"status":"err","msg":"..."}`.

use std::time::Duration;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::config::ApiConfig;
use crate::error::SpriteError;

const UNKNOWN_API_ERROR: &str = "Unknown API error";

/// Recent chain context for building a transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TxContext {
    /// Base58 recent blockhash.
    pub blockhash: String,
    pub last_valid_block_height: u64,
    /// Suggested compute-unit price in micro-lamports.
    pub reasonable_priority_fee: u64,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub(crate) enum ApiEnvelope<T> {
    Ok {
        data: Option<T>,
    },
    Err {
        #[serde(default)]
        msg: String,
    },
}

impl<T> ApiEnvelope<T> {
    fn into_result(self) -> Result<Option<T>, SpriteError> {
        match self {
            ApiEnvelope::Ok { data } => Ok(data),
            ApiEnvelope::Err { msg } if msg.is_empty() => {
                Err(SpriteError::Api(UNKNOWN_API_ERROR.into()))
            }
            ApiEnvelope::Err { msg } => Err(SpriteError::Api(msg)),
        }
    }

    fn into_data(self) -> Result<T, SpriteError> {
        self.into_result()?
            .ok_or_else(|| SpriteError::Api("response is missing data".into()))
    }
}

#[derive(Debug, Serialize)]
struct SendTransactionRequest {
    tx_base64: String,
}

#[derive(Debug, Deserialize)]
struct SendTransactionResponse {
    signature: String,
}

#[async_trait]
pub trait SpriteApi: Send + Sync {
    /// Blockhash, validity window and priority fee for instruction `ins_name`.
    async fn get_context(&self, ins_name: &str) -> Result<TxContext, SpriteError>;

    /// Submit a signed wire-format transaction; returns its signature.
    async fn send_transaction(&self, signed_tx: &[u8]) -> Result<String, SpriteError>;

    /// Resolves once the transaction is confirmed or the server gives up at
    /// `last_valid_block_height`.
    async fn confirm_transaction(
        &self,
        signature: &str,
        last_valid_block_height: u64,
    ) -> Result<(), SpriteError>;
}

/// [`SpriteApi`] over HTTPS.
#[derive(Debug, Clone)]
pub struct HttpApi {
    client: reqwest::Client,
    base_url: String,
}

impl HttpApi {
    pub fn new(config: &ApiConfig) -> Result<Self, SpriteError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_owned(),
        })
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}{endpoint}", self.base_url)
    }

    async fn decode<T: DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<ApiEnvelope<T>, SpriteError> {
        let body = response.text().await?;
        serde_json::from_str(&body)
            .map_err(|e| SpriteError::Api(format!("malformed API response: {e}")))
    }
}

#[async_trait]
impl SpriteApi for HttpApi {
    async fn get_context(&self, ins_name: &str) -> Result<TxContext, SpriteError> {
        tracing::debug!(ins_name, "fetching transaction context");
        let response = self
            .client
            .get(self.url(&format!("/ctx/{ins_name}")))
            .send()
            .await?;
        Self::decode(response).await?.into_data()
    }

    async fn send_transaction(&self, signed_tx: &[u8]) -> Result<String, SpriteError> {
        let request = SendTransactionRequest {
            tx_base64: STANDARD.encode(signed_tx),
        };
        let response = self
            .client
            .post(self.url("/tx/send"))
            .json(&request)
            .send()
            .await?;
        let sent: SendTransactionResponse = Self::decode(response).await?.into_data()?;
        tracing::info!(signature = %sent.signature, "transaction sent");
        Ok(sent.signature)
    }

    async fn confirm_transaction(
        &self,
        signature: &str,
        last_valid_block_height: u64,
    ) -> Result<(), SpriteError> {
        let response = self
            .client
            .get(self.url(&format!("/tx/confirm/{signature}")))
            .query(&[("lastValidBlockHeight", last_valid_block_height)])
            .send()
            .await?;
        Self::decode::<serde_json::Value>(response)
            .await?
            .into_result()?;
        tracing::info!(signature, "transaction confirmed");
        Ok(())
    }
}
