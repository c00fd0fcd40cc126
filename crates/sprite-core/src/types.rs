use serde::{Deserialize, Serialize};

/// Prefix marking a Telegram account id. Everything else is Discord.
pub const TELEGRAM_ID_PREFIX: &str = "tg:";

/// Chat platform an account id belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Platform {
    Telegram,
    Discord,
}

impl Platform {
    pub fn from_account_id(account_id: &str) -> Self {
        if account_id.starts_with(TELEGRAM_ID_PREFIX) {
            Platform::Telegram
        } else {
            Platform::Discord
        }
    }

    /// Character the bot expects in front of its commands.
    pub fn command_prefix(&self) -> &'static str {
        match self {
            Platform::Telegram => "/",
            Platform::Discord => "$",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Platform::Telegram => "Telegram",
            Platform::Discord => "Discord",
        }
    }

    /// Where the user talks to the bot.
    pub fn chat_kind(&self) -> &'static str {
        match self {
            Platform::Telegram => "chat",
            Platform::Discord => "DM",
        }
    }
}

/// Direction of a vault payment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentKind {
    Deposit,
    Withdraw,
}

impl PaymentKind {
    /// Route segment, also used to build `/{route}-complete`.
    pub fn route(&self) -> &'static str {
        match self {
            PaymentKind::Deposit => "deposit",
            PaymentKind::Withdraw => "withdraw",
        }
    }

    /// Query parameter carrying the payment id.
    pub fn id_field(&self) -> &'static str {
        match self {
            PaymentKind::Deposit => "deposit_id",
            PaymentKind::Withdraw => "withdraw_id",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            PaymentKind::Deposit => "Confirm Deposit",
            PaymentKind::Withdraw => "Confirm Withdrawal",
        }
    }

    pub fn submit_label(&self) -> &'static str {
        match self {
            PaymentKind::Deposit => "Submit Deposit",
            PaymentKind::Withdraw => "Confirm Withdrawal",
        }
    }
}
