use crate::{
    chain::{Chain, SupportedChains},
    Event, WalletType,
};
use ethers::types::Address;
use gloo_storage::{errors::StorageError, LocalStorage, Storage};
use serde::{Deserialize, Serialize};

const STORAGE_KEY: &str = "dapp-boilerplate.session";

/// What the UI knows about the wallet, rebuilt from `Event`s
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SessionState {
    pub connected: bool,
    pub accounts: Option<Vec<Address>>,
    pub chain_id: Option<u64>,
    pub pairing_url: Option<String>,
}

impl SessionState {
    pub fn apply(&mut self, event: &Event) {
        match event {
            Event::ConnectionWaiting(url) => self.pairing_url = Some(url.clone()),
            Event::Connected => {
                self.connected = true;
                self.pairing_url = None;
            }
            Event::Disconnected => *self = Self::default(),
            Event::Broken => {}
            Event::ChainIdChanged(chain_id) => self.chain_id = *chain_id,
            Event::AccountsChanged(accounts) => self.accounts = accounts.clone(),
        }
    }

    /// Main account of the connected wallet
    pub fn account(&self) -> Option<Address> {
        self.accounts.as_ref().and_then(|a| a.first().copied())
    }

    pub fn chain<'a>(&self, chains: &'a SupportedChains) -> Option<&'a Chain> {
        self.chain_id.and_then(|id| chains.get(id))
    }

    /// `false` only when the wallet sits on a chain we do not support
    pub fn is_supported_chain(&self, chains: &SupportedChains) -> bool {
        match self.chain_id {
            Some(id) => chains.contains(id),
            None => true,
        }
    }
}

/// `0x1234....abcd`
pub fn short_address(address: &Address) -> String {
    let full = format!("{address:?}");
    format!("{}....{}", &full[..6], &full[full.len() - 4..])
}

/// Last session, kept in local storage so a reload can reconnect silently
/// and come back on the same network
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StoredSession {
    /// `None` while browsing read-only
    #[serde(default)]
    pub wallet: Option<WalletType>,
    pub chain_id: Option<u64>,
}

impl StoredSession {
    pub fn load() -> Option<Self> {
        LocalStorage::get(STORAGE_KEY).ok()
    }

    pub fn save(&self) -> Result<(), StorageError> {
        LocalStorage::set(STORAGE_KEY, self)
    }

    pub fn clear() {
        LocalStorage::delete(STORAGE_KEY);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn address(s: &str) -> Address {
        Address::from_str(s).unwrap()
    }

    #[test]
    fn short_address_keeps_prefix_and_suffix() {
        let a = address("0xBE565E3eEFcfd58920FfB5048292f67F431356eF");
        assert_eq!(short_address(&a), "0xbe56....56ef");
    }

    #[test]
    fn walletconnect_flow() {
        let mut state = SessionState::default();
        state.apply(&Event::ConnectionWaiting("wc:abc@2".into()));
        assert_eq!(state.pairing_url.as_deref(), Some("wc:abc@2"));
        assert!(!state.connected);

        state.apply(&Event::Connected);
        assert!(state.connected);
        assert!(state.pairing_url.is_none());

        let account = address("0x0000000000000000000000000000000000000001");
        state.apply(&Event::AccountsChanged(Some(vec![account])));
        state.apply(&Event::ChainIdChanged(Some(56)));
        assert_eq!(state.account(), Some(account));
        assert_eq!(state.chain_id, Some(56));
    }

    #[test]
    fn disconnect_resets_everything() {
        let mut state = SessionState {
            connected: true,
            accounts: Some(vec![Address::zero()]),
            chain_id: Some(1),
            pairing_url: None,
        };
        state.apply(&Event::Broken);
        assert!(state.connected);

        state.apply(&Event::Disconnected);
        assert_eq!(state, SessionState::default());
        assert_eq!(state.account(), None);
    }

    #[test]
    fn unsupported_chain_is_detected() {
        let chains = SupportedChains::default();
        let mut state = SessionState::default();
        assert!(state.is_supported_chain(&chains));

        state.apply(&Event::ChainIdChanged(Some(4)));
        assert!(!state.is_supported_chain(&chains));
        assert!(state.chain(&chains).is_none());

        state.apply(&Event::ChainIdChanged(Some(137)));
        assert_eq!(state.chain(&chains).map(|c| c.name.as_str()), Some("Polygon"));
    }

    #[test]
    fn stored_session_format() {
        let stored = StoredSession { wallet: Some(WalletType::Injected), chain_id: Some(97) };
        let json = serde_json::to_string(&stored).unwrap();
        assert_eq!(json, r#"{"wallet":"Injected","chain_id":97}"#);
        assert_eq!(serde_json::from_str::<StoredSession>(&json).unwrap(), stored);
    }

    #[test]
    fn read_only_session_keeps_its_network() {
        let stored = StoredSession { wallet: None, chain_id: Some(137) };
        let json = serde_json::to_string(&stored).unwrap();
        assert_eq!(json, r#"{"wallet":null,"chain_id":137}"#);
        assert_eq!(serde_json::from_str::<StoredSession>(&json).unwrap(), stored);
        assert_eq!(serde_json::from_str::<StoredSession>(r#"{"chain_id":137}"#).unwrap(), stored);
    }
}
