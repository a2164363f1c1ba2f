use derive_more::Display;
use url::Url;

/// Mobile wallets offered next to the WalletConnect QR code
#[derive(Clone, Copy, Debug, Display, PartialEq, Eq)]
pub enum MobileWallet {
    #[display(fmt = "MetaMask")]
    MetaMask,
    #[display(fmt = "Trust")]
    Trust,
}

impl MobileWallet {
    pub const ALL: [MobileWallet; 2] = [MobileWallet::MetaMask, MobileWallet::Trust];

    fn universal_link(&self) -> &'static str {
        match self {
            MobileWallet::MetaMask => "https://metamask.app.link/wc",
            MobileWallet::Trust => "https://link.trustwallet.com/wc",
        }
    }

    /// Link opening the wallet app with the pairing URI
    pub fn deep_link(&self, pairing_uri: &str) -> Option<Url> {
        Url::parse_with_params(self.universal_link(), &[("uri", pairing_uri)]).ok()
    }
}

/// `(wallet, link)` pairs for every supported mobile wallet
pub fn deep_links(pairing_uri: &str) -> Vec<(MobileWallet, Url)> {
    MobileWallet::ALL
        .iter()
        .filter_map(|w| w.deep_link(pairing_uri).map(|link| (*w, link)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAIRING: &str = "wc:7f6e504bfad60b485450578e05678ed3@2?relay-protocol=irn&symKey=587d";

    #[test]
    fn pairing_uri_is_query_encoded() {
        let link = MobileWallet::MetaMask.deep_link(PAIRING).unwrap();
        assert_eq!(link.host_str(), Some("metamask.app.link"));
        let (key, value) = link.query_pairs().next().unwrap();
        assert_eq!(key, "uri");
        assert_eq!(value, PAIRING);
        assert!(!link.as_str().contains('@'));
    }

    #[test]
    fn every_wallet_gets_a_link() {
        let links = deep_links(PAIRING);
        assert_eq!(links.len(), 2);
        assert_eq!(links[0].0.to_string(), "MetaMask");
        assert_eq!(links[1].1.host_str(), Some("link.trustwallet.com"));
    }
}
