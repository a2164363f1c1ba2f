pub mod error;
pub(crate) mod ethereum;
pub(crate) mod request;

use crate::{
    chain::Chain,
    eip1193::{error::Eip1193Error, ethereum::Ethereum, request::Eip1193Request},
    event::WalletEvent,
};
use async_trait::async_trait;
use ethers::{
    providers::JsonRpcClient,
    types::{Address, U256},
};
use futures::channel::oneshot;
use log::{debug, warn};
use serde::{de::DeserializeOwned, Serialize};
use std::fmt::Debug;
use wasm_bindgen::{closure::Closure, JsValue};
use wasm_bindgen_futures::spawn_local;

#[derive(Debug, Clone)]
// All attributes this library needs is thread unsafe.
// But wasm itself is a single threaded... something.
// To avoid problems with Send and Sync, all these parameters are
// fetched whenever it is needed
pub(crate) struct Eip1193 {}

#[cfg_attr(target_arch = "wasm32", async_trait(? Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
impl JsonRpcClient for Eip1193 {
    type Error = Eip1193Error;

    /// Sends the request via `window.ethereum` in Js
    async fn request<T, R>(&self, method: &str, params: T) -> Result<R, Self::Error>
    where
        T: Debug + Serialize + Send + Sync,
        R: DeserializeOwned + Send,
    {
        let (sender, receiver) = oneshot::channel();

        let payload = Eip1193Request::new(method, params)?.to_js()?;
        spawn_local(async move {
            let res = match Ethereum::default_opt() {
                Ok(ethereum) => match ethereum.request(&payload).await {
                    Ok(r) if r.is_undefined() => Ok("null".to_string()),
                    Ok(r) => js_sys::JSON::stringify(&r)
                        .map_err(Eip1193Error::from)
                        .and_then(|r| r.as_string().ok_or(Eip1193Error::JsParseError)),
                    Err(e) => Err(e.into()),
                },
                Err(e) => Err(e),
            };
            _ = sender.send(res);
        });

        let res = receiver.await.map_err(|_| Eip1193Error::CommunicationError)?;
        Ok(serde_json::from_str(&res?)?)
    }
}

impl Default for Eip1193 {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SwitchChainParams {
    chain_id: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct NativeCurrency {
    name: String,
    symbol: String,
    decimals: u8,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AddChainParams {
    chain_id: String,
    chain_name: String,
    native_currency: NativeCurrency,
    rpc_urls: Vec<String>,
    block_explorer_urls: Vec<String>,
}

impl From<&Chain> for AddChainParams {
    fn from(chain: &Chain) -> Self {
        Self {
            chain_id: chain.hex_id(),
            chain_name: chain.name.clone(),
            native_currency: NativeCurrency {
                name: chain.symbol.clone(),
                symbol: chain.symbol.clone(),
                decimals: 18,
            },
            rpc_urls: vec![chain.rpc_url.clone()],
            block_explorer_urls: vec![chain.explorer.clone()],
        }
    }
}

impl Eip1193 {
    pub fn is_available() -> bool {
        Ethereum::default_opt().is_ok()
    }

    pub fn is_metamask() -> bool {
        Ethereum::default_opt().ok().and_then(|e| e.is_metamask()).unwrap_or(false)
    }

    pub fn new() -> Self {
        Eip1193 {}
    }

    /// Prompts the user to expose accounts to the site
    pub async fn request_accounts(&self) -> Result<Vec<Address>, Eip1193Error> {
        self.request("eth_requestAccounts", ()).await
    }

    /// Accounts already exposed to the site, never prompts
    pub async fn accounts(&self) -> Result<Vec<Address>, Eip1193Error> {
        self.request("eth_accounts", ()).await
    }

    pub async fn chain_id(&self) -> Result<u64, Eip1193Error> {
        let chain_id: U256 = self.request("eth_chainId", ()).await?;
        Ok(chain_id.low_u64())
    }

    /// Asks the wallet to switch to `chain`, registering it first when the
    /// wallet does not know it yet
    pub async fn switch_chain(&self, chain: &Chain) -> Result<(), Eip1193Error> {
        let params = [SwitchChainParams { chain_id: chain.hex_id() }];
        match self.request::<_, serde_json::Value>("wallet_switchEthereumChain", params).await {
            Ok(_) => Ok(()),
            Err(err) if err.is_unrecognized_chain() => {
                debug!("Wallet does not know chain {}, adding it", chain.id);
                let params = [AddChainParams::from(chain)];
                self.request::<_, serde_json::Value>("wallet_addEthereumChain", params).await?;
                Ok(())
            }
            Err(err) => Err(err),
        }
    }

    /// Subscribes to a provider event. The subscription lasts as long as the
    /// returned listener.
    pub fn on(
        &self,
        event: WalletEvent,
        callback: Box<dyn FnMut(JsValue)>,
    ) -> Result<Listener, Eip1193Error> {
        let ethereum = Ethereum::default_opt()?;
        let closure = Closure::wrap(callback);
        ethereum.on(event.as_str(), &closure);
        Ok(Listener { event, closure })
    }
}

/// Live provider event subscription, removed from `window.ethereum` on drop
pub(crate) struct Listener {
    event: WalletEvent,
    closure: Closure<dyn FnMut(JsValue)>,
}

impl Debug for Listener {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Listener({})", self.event)
    }
}

impl Drop for Listener {
    fn drop(&mut self) {
        match Ethereum::default_opt() {
            Ok(ethereum) => ethereum.remove_listener(self.event.as_str(), &self.closure),
            Err(_) => warn!("Provider vanished before {} listener was removed", self.event),
        }
    }
}
