use std::fmt::Display;

/// Events emitted by an EIP-1193 provider
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum WalletEvent {
    AccountsChanged,
    ChainChanged,
    Connect,
    Disconnect,
}

impl WalletEvent {
    pub fn as_str(&self) -> &'static str {
        match self {
            WalletEvent::AccountsChanged => "accountsChanged",
            WalletEvent::ChainChanged => "chainChanged",
            WalletEvent::Connect => "connect",
            WalletEvent::Disconnect => "disconnect",
        }
    }
}

impl Display for WalletEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_match_provider_events() {
        assert_eq!(WalletEvent::AccountsChanged.to_string(), "accountsChanged");
        assert_eq!(WalletEvent::ChainChanged.to_string(), "chainChanged");
        assert_eq!(WalletEvent::Connect.as_str(), "connect");
        assert_eq!(WalletEvent::Disconnect.as_str(), "disconnect");
    }
}
