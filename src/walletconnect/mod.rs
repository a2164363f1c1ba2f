pub mod error;

use self::error::Error;
use crate::chain::Chain;
use async_trait::async_trait;
use ethers::{
    providers::{Http, JsonRpcClient},
    types::Address,
};
use futures::channel::oneshot;
use log::{debug, warn};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::{from_value, json};
use std::{
    cell::RefCell,
    fmt::{Debug, Formatter, Result as FmtResult},
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
};
use unsafe_send_sync::UnsafeSendSync;
use walletconnect_client::prelude::*;
use wasm_bindgen_futures::spawn_local;

/// Wallet session over the WalletConnect relay.
///
/// Signing methods travel to the paired wallet, everything else is answered by
/// the HTTP RPC of the session's current chain. Clones share the current chain
/// and the RPC fallback.
#[derive(Clone)]
pub(crate) struct WalletConnectProvider {
    client: UnsafeSendSync<WalletConnect>,
    chain_id: Arc<AtomicU64>,
    provider: UnsafeSendSync<Arc<RefCell<Option<Http>>>>,
}

impl Debug for WalletConnectProvider {
    fn fmt(&self, f: &mut Formatter) -> FmtResult {
        write!(f, "WalletConnect session on chain {}", self.chain_id())
    }
}

#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
impl JsonRpcClient for WalletConnectProvider {
    type Error = Error;

    async fn request<T, R>(&self, method: &str, params: T) -> Result<R, Error>
    where
        T: Debug + Serialize + Send + Sync,
        R: DeserializeOwned + Send,
    {
        let params = json!(params);

        let chain_id = self.chain_id();

        if self.client.supports_method(method) {
            let (sender, receiver) = oneshot::channel();
            let m = method.to_string();
            let client = self.client.clone();
            spawn_local(async move {
                _ = sender.send(client.request(&m, Some(params), chain_id).await)
            });
            let res = receiver.await.map_err(|_| Error::CommsError)??;

            Ok(from_value(res)?)
        } else {
            let http = self.provider.borrow().clone();
            match http {
                Some(http) => Ok(http.request(method, params).await?),
                None => Err(Error::MissingProvider),
            }
        }
    }
}

fn http_for(chain: &Chain) -> Option<Http> {
    match chain.rpc() {
        Ok(url) => Some(Http::new(url)),
        Err(err) => {
            warn!("No RPC fallback for chain {}: {err}", chain.id);
            None
        }
    }
}

impl WalletConnectProvider {
    /// Opens a new pairing proposing `chain`. Returns the provider and the
    /// pairing URI the wallet has to scan.
    pub async fn connect(
        project_id: &str,
        metadata: Metadata,
        chain: &Chain,
    ) -> Result<(Self, String), Error> {
        let client = WalletConnect::connect(project_id.to_string().into(), chain.id, metadata, None)?;
        let pairing_uri = client.initiate_session(None).await?;
        debug!("WalletConnect pairing ready for chain {}", chain.id);
        let provider = Self {
            client: UnsafeSendSync::new(client),
            chain_id: Arc::new(AtomicU64::new(chain.id)),
            provider: UnsafeSendSync::new(Arc::new(RefCell::new(http_for(chain)))),
        };
        Ok((provider, pairing_uri))
    }

    pub async fn disconnect(&self) {
        if let Err(err) = self.client.disconnect().await {
            warn!("WalletConnect disconnect failed: {err:?}");
        }
    }

    /// Chain requests are sent to
    pub fn chain_id(&self) -> u64 {
        self.chain_id.load(Ordering::SeqCst)
    }

    /// Get all accounts connected to currently set chain_id
    pub fn accounts(&self) -> Option<Vec<Address>> {
        self.accounts_for_chain(self.chain_id())
    }

    /// Get all accounts available for chain id
    pub fn accounts_for_chain(&self, chain_id: u64) -> Option<Vec<Address>> {
        self.client.get_accounts_for_chain_id(chain_id).filter(|a| !a.is_empty())
    }

    /// Moves the session to another chain the wallet approved during pairing
    pub fn switch_chain(&self, chain: &Chain) -> Result<(), Error> {
        if self.accounts_for_chain(chain.id).is_none() {
            return Err(Error::ChainNotApproved(chain.id));
        }
        self.chain_id.store(chain.id, Ordering::SeqCst);
        self.set_fallback(Some(chain));
        Ok(())
    }

    /// Points non-wallet requests at the RPC of `chain`
    pub fn set_fallback(&self, chain: Option<&Chain>) {
        *self.provider.borrow_mut() = chain.and_then(http_for);
    }

    /// Waits for the next relay message. `Ok(None)` means it did not change
    /// the session.
    pub async fn next(&self) -> Result<Option<Event>, Error> {
        let event = self.client.next().await?;
        if let Some(Event::ChainIdChanged(chain_id)) = &event {
            // the wallet moved to another chain on its own
            self.chain_id.store(*chain_id, Ordering::SeqCst);
        }
        Ok(event)
    }
}
