use ethers::types::{Address, H256};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

#[derive(Error, Debug, PartialEq)]
pub enum ChainError {
    #[error("Unsupported chain {0}")]
    Unsupported(u64),

    #[error("Cannot parse chain id {0:?}")]
    BadChainId(String),

    #[error("Bad RPC url {0:?}")]
    BadRpcUrl(String),
}

/// Network the dApp knows how to talk to
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chain {
    pub id: u64,
    pub name: String,
    pub rpc_url: String,
    pub symbol: String,
    pub explorer: String,
}

impl Chain {
    pub fn new(id: u64, name: &str, rpc_url: &str, symbol: &str, explorer: &str) -> Self {
        Self {
            id,
            name: name.to_string(),
            rpc_url: rpc_url.to_string(),
            symbol: symbol.to_string(),
            explorer: explorer.to_string(),
        }
    }

    /// Chain id in the form wallets expect (`97` -> `0x61`)
    pub fn hex_id(&self) -> String {
        format!("{:#x}", self.id)
    }

    pub fn rpc(&self) -> Result<Url, ChainError> {
        Url::parse(&self.rpc_url).map_err(|_| ChainError::BadRpcUrl(self.rpc_url.clone()))
    }

    /// Link to a transaction on the block explorer
    pub fn tx_url(&self, hash: &H256) -> Option<Url> {
        self.explorer_url(&format!("tx/{hash:?}"))
    }

    /// Link to an address on the block explorer
    pub fn address_url(&self, address: &Address) -> Option<Url> {
        self.explorer_url(&format!("address/{address:?}"))
    }

    fn explorer_url(&self, path: &str) -> Option<Url> {
        let base = if self.explorer.ends_with('/') {
            self.explorer.clone()
        } else {
            format!("{}/", self.explorer)
        };
        Url::parse(&base).ok()?.join(path).ok()
    }
}

/// Ordered registry of networks. The first entry is the fallback network.
#[derive(Clone, Debug, PartialEq)]
pub struct SupportedChains {
    chains: Vec<Chain>,
}

impl Default for SupportedChains {
    fn default() -> Self {
        Self::new(vec![
            Chain::new(
                97,
                "BSC Testnet",
                "https://data-seed-prebsc-1-s1.binance.org:8545/",
                "tBNB",
                "https://testnet.bscscan.com",
            ),
            Chain::new(
                56,
                "BSC Mainnet",
                "https://bsc-dataseed1.binance.org",
                "BNB",
                "https://bscscan.com",
            ),
            Chain::new(
                1,
                "Ethereum Mainnet",
                "https://cloudflare-eth.com",
                "ETH",
                "https://etherscan.io",
            ),
            Chain::new(137, "Polygon", "https://polygon-rpc.com", "MATIC", "https://polygonscan.com"),
        ])
    }
}

impl SupportedChains {
    pub fn new(chains: Vec<Chain>) -> Self {
        let mut unique: Vec<Chain> = Vec::with_capacity(chains.len());
        for chain in chains {
            if !unique.iter().any(|c| c.id == chain.id) {
                unique.push(chain);
            }
        }
        Self { chains: unique }
    }

    pub fn get(&self, id: u64) -> Option<&Chain> {
        self.chains.iter().find(|c| c.id == id)
    }

    /// Looks a chain up by the id string a wallet reports (`0x61` or `97`)
    pub fn get_by_hex(&self, id: &str) -> Option<&Chain> {
        parse_chain_id(id).ok().and_then(|id| self.get(id))
    }

    pub fn contains(&self, id: u64) -> bool {
        self.get(id).is_some()
    }

    pub fn first(&self) -> Option<&Chain> {
        self.chains.first()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Chain> {
        self.chains.iter()
    }

    pub fn ids(&self) -> Vec<u64> {
        self.chains.iter().map(|c| c.id).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.chains.is_empty()
    }

    pub fn len(&self) -> usize {
        self.chains.len()
    }

    pub fn with_rpc_override(mut self, id: u64, rpc_url: &str) -> Result<Self, ChainError> {
        Url::parse(rpc_url).map_err(|_| ChainError::BadRpcUrl(rpc_url.to_string()))?;
        match self.chains.iter_mut().find(|c| c.id == id) {
            Some(chain) => {
                chain.rpc_url = rpc_url.to_string();
                Ok(self)
            }
            None => Err(ChainError::Unsupported(id)),
        }
    }

    pub fn require(&self, id: u64) -> Result<&Chain, ChainError> {
        self.get(id).ok_or(ChainError::Unsupported(id))
    }
}

/// Parses chain ids in both `0x` hex and decimal notation
pub fn parse_chain_id(id: &str) -> Result<u64, ChainError> {
    let trimmed = id.trim();
    let parsed = match trimmed.strip_prefix("0x").or_else(|| trimmed.strip_prefix("0X")) {
        Some(hex) => u64::from_str_radix(hex, 16),
        None => trimmed.parse::<u64>(),
    };
    parsed.map_err(|_| ChainError::BadChainId(id.to_string()))
}
