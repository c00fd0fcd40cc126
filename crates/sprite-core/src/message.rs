//! Canonical link message.
//!
//! The bot backend rebuilds this exact string from the same three values to
//! check the wallet's signature, so inputs are used verbatim.

/// Bot name embedded in every link message.
pub const LINK_MESSAGE_BOT: &str = "ivy-sprite";

/// `Link wallet {wallet} to ivy-sprite user {account_id} at {timestamp}`
pub fn build_link_message(wallet: &str, account_id: &str, timestamp: &str) -> String {
    format!("Link wallet {wallet} to {LINK_MESSAGE_BOT} user {account_id} at {timestamp}")
}
