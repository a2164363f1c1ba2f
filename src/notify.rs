use crate::erc20::Erc20Error;
use derive_more::Display;
use ethers::{
    types::{Address, H256},
    utils::to_checksum,
};

/// How long a notification stays on screen
pub const NOTIFY_TIMEOUT_MS: u32 = 5_000;

#[derive(Clone, Copy, Debug, Display, PartialEq, Eq)]
pub enum AlertStatus {
    #[display(fmt = "success")]
    Success,
    #[display(fmt = "info")]
    Info,
    #[display(fmt = "warning")]
    Warning,
    #[display(fmt = "error")]
    Error,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Notification {
    pub title: String,
    pub description: Option<String>,
    pub status: AlertStatus,
}

impl Notification {
    pub fn new(status: AlertStatus, title: &str) -> Self {
        Self { title: title.to_string(), description: None, status }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn logged_in(account: &Address) -> Self {
        Self::new(AlertStatus::Success, "Logged In")
            .with_description(format!("Successfully logged in with {}", to_checksum(account, None)))
    }

    pub fn login_failed(detail: impl std::fmt::Display) -> Self {
        Self::new(AlertStatus::Error, "Failed to log in").with_description(detail.to_string())
    }

    pub fn logged_out() -> Self {
        Self::new(AlertStatus::Success, "Logged out").with_description("Successfully logged out")
    }

    pub fn unsupported_network(chain_id: u64) -> Self {
        Self::new(AlertStatus::Warning, "Unsupported network")
            .with_description(format!("Chain {chain_id} is not supported"))
    }

    pub fn network_switch_failed(detail: impl std::fmt::Display) -> Self {
        Self::new(AlertStatus::Error, "Network switch failed").with_description(detail.to_string())
    }

    pub fn token_not_exist() -> Self {
        Self::new(AlertStatus::Warning, "Token Not Exist")
    }

    pub fn not_a_contract() -> Self {
        Self::new(AlertStatus::Warning, "Spender is not a smart contract")
    }

    pub fn invalid_address() -> Self {
        Self::new(AlertStatus::Error, "Not a valid address")
    }

    /// Outcome of a mined transaction
    pub fn transaction(succeeded: bool, hash: &H256) -> Self {
        let (status, title) = if succeeded {
            (AlertStatus::Success, "Transaction succeeded")
        } else {
            (AlertStatus::Error, "Transaction failed")
        };
        Self::new(status, title).with_description(format!("Transaction hash: {hash:?}"))
    }

    pub fn transaction_error(detail: impl std::fmt::Display) -> Self {
        Self::new(AlertStatus::Error, "Transaction failed")
            .with_description(format!("Detail: {detail}"))
    }
}

impl From<&Erc20Error> for Notification {
    fn from(err: &Erc20Error) -> Self {
        match err {
            Erc20Error::TokenNotExist => Self::token_not_exist(),
            Erc20Error::InvalidAddress => Self::invalid_address(),
            Erc20Error::NotAContract => Self::not_a_contract(),
            Erc20Error::InvalidAmount(_) | Erc20Error::NoAccount => {
                Self::new(AlertStatus::Warning, &err.to_string())
            }
            err => Self::new(AlertStatus::Error, "Request failed").with_description(err.to_string()),
        }
    }
}
