pub mod app;
pub mod chain;
pub mod config;
pub mod eip1193;
pub mod erc20;
mod event;
pub mod hooks;
pub mod notify;
pub mod session;
pub mod wallet_links;
pub mod walletconnect;

use async_trait::async_trait;
use chain::{parse_chain_id, Chain, ChainError, SupportedChains};
use config::AppConfig;
use derive_more::Display;
use eip1193::{error::Eip1193Error, Eip1193, Listener};
use ethers::{
    providers::{Http, HttpClientError, JsonRpcClient, JsonRpcError, Provider, ProviderError, RpcError},
    types::Address,
};
use event::WalletEvent;
use gloo::timers::future::TimeoutFuture;
use gloo_utils::format::JsValueSerdeExt;
use log::{debug, warn};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::{
    fmt::{Debug, Formatter, Result as FmtResult},
    sync::{
        atomic::{AtomicBool, AtomicU32, Ordering},
        Arc, Mutex, Weak,
    },
};
use thiserror::Error;
use tokio::sync::{
    mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender},
    watch, Mutex as AsyncMutex,
};
use unsafe_send_sync::UnsafeSendSync;
use url::Url;
use walletconnect::WalletConnectProvider;
use walletconnect_client::prelude::{Event as RelayEvent, Metadata};
use wasm_bindgen::JsValue;

pub struct EthereumBuilder {
    pub name: String,
    pub description: String,
    pub url: String,
    pub wc_project_id: Option<String>,
    pub icons: Vec<String>,
    pub chains: SupportedChains,
    pub default_chain: Option<u64>,
}

impl Default for EthereumBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl EthereumBuilder {
    pub fn new() -> Self {
        Self {
            name: "DAPP Boilerplate".to_string(),
            description: "A dApp boilerplate written in Rust".to_string(),
            url: "http://localhost".to_string(),
            wc_project_id: None,
            icons: Vec::new(),
            chains: SupportedChains::default(),
            default_chain: None,
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        let mut builder = Self::new();
        builder
            .name(&config.name)
            .description(&config.description)
            .url(&config.url)
            .chains(config.chains.clone())
            .default_chain(config.default_chain_id);
        if let Some(project_id) = &config.wc_project_id {
            builder.walletconnect_id(project_id);
        }
        builder
    }

    pub fn name(&mut self, name: &str) -> &mut Self {
        self.name = name.to_string();
        self
    }

    pub fn description(&mut self, description: &str) -> &mut Self {
        self.description = description.to_string();
        self
    }

    pub fn url(&mut self, url: &str) -> &mut Self {
        self.url = url.to_string();
        self
    }

    pub fn walletconnect_id(&mut self, wc_project_id: &str) -> &mut Self {
        self.wc_project_id = Some(wc_project_id.to_string());
        self
    }

    pub fn chains(&mut self, chains: SupportedChains) -> &mut Self {
        self.chains = chains;
        self
    }

    /// Network used before a wallet is connected
    pub fn default_chain(&mut self, chain_id: u64) -> &mut Self {
        self.default_chain = Some(chain_id);
        self
    }

    pub fn add_icon(&mut self, icon_url: &str) -> &mut Self {
        self.icons.push(icon_url.to_string());
        self
    }

    pub fn build(&self) -> Result<Ethereum, EthereumError> {
        let selected_chain = match self.default_chain {
            Some(id) => self.chains.require(id)?.id,
            None => self.chains.first().map(|c| c.id).ok_or(EthereumError::NoChains)?,
        };
        let url = Url::parse(&self.url).map_err(|_| EthereumError::InvalidAppUrl(self.url.clone()))?;
        Ok(Ethereum::new(
            Metadata::from(&self.name, &self.description, url, self.icons.clone()),
            self.wc_project_id.clone(),
            self.chains.clone(),
            selected_chain,
        ))
    }
}

#[derive(Clone, Debug, Copy, Display, PartialEq, Eq, Serialize, Deserialize)]
pub enum WalletType {
    #[display(fmt = "Browser wallet")]
    Injected,
    #[display(fmt = "WalletConnect")]
    WalletConnect,
}

#[derive(Error, Debug)]
pub enum EthereumError {
    #[error("Wallet unavailable")]
    Unavailable,

    #[error("Not connected")]
    NotConnected,

    #[error("Already connected")]
    AlreadyConnected,

    #[error("No supported chains configured")]
    NoChains,

    #[error("App url {0:?} is not a valid url")]
    InvalidAppUrl(String),

    #[error("Chain {0} is not approved by the connected wallet")]
    ChainNotApproved(u64),

    #[error(transparent)]
    ChainError(#[from] ChainError),

    #[error(transparent)]
    HttpClientError(#[from] HttpClientError),

    #[error(transparent)]
    Eip1193Error(#[from] Eip1193Error),

    #[error(transparent)]
    WalletConnectError(#[from] walletconnect::error::Error),
}

impl From<EthereumError> for ProviderError {
    fn from(src: EthereumError) -> Self {
        ProviderError::JsonRpcClientError(Box::new(src))
    }
}

impl RpcError for EthereumError {
    fn as_serde_error(&self) -> Option<&serde_json::Error> {
        match self {
            EthereumError::HttpClientError(e) => e.as_serde_error(),
            EthereumError::Eip1193Error(e) => e.as_serde_error(),
            EthereumError::WalletConnectError(e) => e.as_serde_error(),
            _ => None,
        }
    }

    fn is_serde_error(&self) -> bool {
        self.as_serde_error().is_some()
    }

    fn as_error_response(&self) -> Option<&JsonRpcError> {
        match self {
            EthereumError::HttpClientError(e) => e.as_error_response(),
            EthereumError::Eip1193Error(e) => e.as_error_response(),
            EthereumError::WalletConnectError(e) => e.as_error_response(),
            _ => None,
        }
    }

    fn is_error_response(&self) -> bool {
        self.as_error_response().is_some()
    }
}

#[derive(Clone)]
pub(crate) enum WebProvider {
    None,
    Injected(Eip1193),
    WalletConnect(WalletConnectProvider),
}

impl WebProvider {
    pub fn wallet_type(&self) -> Option<WalletType> {
        match self {
            WebProvider::None => None,
            WebProvider::Injected(_) => Some(WalletType::Injected),
            WebProvider::WalletConnect(_) => Some(WalletType::WalletConnect),
        }
    }
}

impl PartialEq for WebProvider {
    fn eq(&self, other: &Self) -> bool {
        self.wallet_type() == other.wallet_type()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// WalletConnect pairing URI waiting to be scanned
    ConnectionWaiting(String),
    Connected,
    Disconnected,
    /// Relay hiccup, the session may still recover
    Broken,
    ChainIdChanged(Option<u64>),
    AccountsChanged(Option<Vec<Address>>),
}

/// Consecutive relay errors tolerated before a WalletConnect session is dropped
const MAX_RELAY_FAILURES: u32 = 3;

/// Pause before the relay is read again after an error
const RELAY_RETRY_MS: u32 = 1_000;

#[derive(Clone, Debug, Default, PartialEq)]
struct Snapshot {
    connected: bool,
    accounts: Option<Vec<Address>>,
    chain_id: Option<u64>,
}

/// Event queue and provider reported state of one wallet connection.
///
/// Every clone of an `Ethereum` shares it, so provider callbacks, the UI
/// event loop and request paths all see the same session.
struct Connection {
    sender: UnboundedSender<Event>,
    receiver: AsyncMutex<UnboundedReceiver<Event>>,
    state: watch::Sender<Snapshot>,
    closed: AtomicBool,
    failures: AtomicU32,
    listeners: Mutex<Vec<UnsafeSendSync<Listener>>>,
}

impl Connection {
    fn new() -> Self {
        let (sender, receiver) = unbounded_channel();
        let (state, _) = watch::channel(Snapshot::default());
        Self {
            sender,
            receiver: AsyncMutex::new(receiver),
            state,
            closed: AtomicBool::new(false),
            failures: AtomicU32::new(0),
            listeners: Mutex::new(Vec::new()),
        }
    }

    fn emit(&self, event: Event) {
        if self.sender.send(event).is_err() {
            debug!("Event queue gone, dropping event");
        }
    }

    fn snapshot(&self) -> Snapshot {
        self.state.borrow().clone()
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    fn mark_connected(&self) {
        self.state.send_modify(|s| s.connected = true);
        self.emit(Event::Connected);
    }

    fn set_chain(&self, chain_id: Option<u64>) {
        self.state.send_modify(|s| s.chain_id = chain_id);
        self.emit(Event::ChainIdChanged(chain_id));
    }

    fn set_accounts(&self, accounts: Option<Vec<Address>>) {
        self.state.send_modify(|s| s.accounts = accounts.clone());
        self.emit(Event::AccountsChanged(accounts));
    }

    /// Ends the session once. Listeners are left in place because this may
    /// run inside one of them.
    fn close(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        self.set_chain(None);
        self.set_accounts(None);
        self.state.send_modify(|s| s.connected = false);
        self.emit(Event::Disconnected);
    }

    fn keep_listener(&self, listener: Listener) {
        if let Ok(mut listeners) = self.listeners.lock() {
            listeners.push(UnsafeSendSync::new(listener));
        }
    }

    fn drop_listeners(&self) {
        if let Ok(mut listeners) = self.listeners.lock() {
            listeners.clear();
        }
    }

    /// Reconciles what the wallet reports with what was announced so far
    fn sync(&self, accounts: Option<Vec<Address>>, chain_id: u64) {
        if self.is_closed() {
            return;
        }
        let previous = self.snapshot();
        if !previous.connected {
            if accounts.is_none() {
                return;
            }
            self.mark_connected();
        } else if accounts.is_none() {
            self.close();
            return;
        }
        if previous.chain_id != Some(chain_id) {
            self.set_chain(Some(chain_id));
        }
        if previous.accounts != accounts {
            self.set_accounts(accounts);
        }
    }

    /// Applies an EIP-1193 provider event. Returns `true` when it ended the
    /// session.
    fn apply_wallet_event(&self, event: WalletEvent, payload: serde_json::Value) -> bool {
        if self.is_closed() {
            return false;
        }
        match event {
            WalletEvent::ChainChanged => match payload.as_str().map(parse_chain_id) {
                Some(Ok(chain_id)) => self.set_chain(Some(chain_id)),
                _ => warn!("Unreadable chainChanged payload {payload}"),
            },
            WalletEvent::AccountsChanged => match serde_json::from_value::<Vec<Address>>(payload) {
                // locked wallet or site access revoked
                Ok(accounts) if accounts.is_empty() => {
                    self.close();
                    return true;
                }
                Ok(accounts) => self.set_accounts(Some(accounts)),
                Err(err) => warn!("Unreadable accountsChanged payload: {err}"),
            },
            WalletEvent::Connect => match serde_json::from_value::<ConnectInfo>(payload) {
                Ok(info) => match parse_chain_id(&info.chain_id) {
                    Ok(chain_id) if self.snapshot().chain_id != Some(chain_id) => {
                        self.set_chain(Some(chain_id))
                    }
                    Ok(_) => {}
                    Err(err) => warn!("{err}"),
                },
                Err(err) => warn!("Unreadable connect payload: {err}"),
            },
            WalletEvent::Disconnect => {
                self.close();
                return true;
            }
        }
        false
    }

    fn relay_ok(&self) {
        self.failures.store(0, Ordering::SeqCst);
    }

    /// Counts a relay failure. Gives `Broken` while the session may still
    /// recover and `None` once it has been closed.
    fn relay_failed(&self) -> Option<Event> {
        let failures = self.failures.fetch_add(1, Ordering::SeqCst) + 1;
        if failures >= MAX_RELAY_FAILURES {
            warn!("WalletConnect relay lost after {failures} failures");
            self.close();
            return None;
        }
        warn!("WalletConnect relay error ({failures}/{MAX_RELAY_FAILURES})");
        Some(Event::Broken)
    }

    fn try_next(&self) -> Option<Event> {
        self.receiver.try_lock().ok().and_then(|mut r| r.try_recv().ok())
    }

    async fn next(&self) -> Option<Event> {
        self.receiver.lock().await.recv().await
    }
}

/// Wallet session handle: which wallet is attached, what it reports, and a
/// JSON-RPC client routing calls to it (or to the selected chain's RPC when
/// no wallet is attached).
#[derive(Clone)]
pub struct Ethereum {
    pub metadata: Metadata,
    pub wc_project_id: Option<String>,

    chains: SupportedChains,
    selected_chain: u64,
    wallet: WebProvider,
    connection: Arc<Connection>,
    read_only: Option<UnsafeSendSync<Http>>,
}

impl Debug for Ethereum {
    fn fmt(&self, f: &mut Formatter) -> FmtResult {
        let state = self.connection.snapshot();
        write!(
            f,
            "Ethereum with accounts: {:?}, chain_id: {:?}, selected chain: {}",
            state.accounts, state.chain_id, self.selected_chain
        )
    }
}

impl PartialEq for Ethereum {
    fn eq(&self, other: &Self) -> bool {
        self.wallet == other.wallet
            && self.selected_chain == other.selected_chain
            && Arc::ptr_eq(&self.connection, &other.connection)
    }
}

fn read_only_client(chain: Option<&Chain>) -> Option<UnsafeSendSync<Http>> {
    let chain = chain?;
    match chain.rpc() {
        Ok(url) => Some(UnsafeSendSync::new(Http::new(url))),
        Err(err) => {
            warn!("No read-only RPC for chain {}: {err}", chain.id);
            None
        }
    }
}

impl Ethereum {
    fn new(
        metadata: Metadata,
        wc_project_id: Option<String>,
        chains: SupportedChains,
        selected_chain: u64,
    ) -> Self {
        let read_only = read_only_client(chains.get(selected_chain));
        Ethereum {
            metadata,
            wc_project_id,
            chains,
            selected_chain,
            wallet: WebProvider::None,
            connection: Arc::new(Connection::new()),
            read_only,
        }
    }

    pub fn is_available(&self, wallet_type: WalletType) -> bool {
        match wallet_type {
            WalletType::Injected => self.injected_available(),
            WalletType::WalletConnect => self.walletconnect_available(),
        }
    }

    pub fn available_wallets(&self) -> Vec<WalletType> {
        let mut types = Vec::new();

        if self.injected_available() {
            types.push(WalletType::Injected);
        }

        if self.walletconnect_available() {
            types.push(WalletType::WalletConnect);
        }

        types
    }

    pub fn injected_available(&self) -> bool {
        Eip1193::is_available()
    }

    /// Whether the browser wallet announces itself as MetaMask
    pub fn injected_is_metamask(&self) -> bool {
        Eip1193::is_metamask()
    }

    pub fn walletconnect_available(&self) -> bool {
        self.wc_project_id.is_some()
    }

    /// Wallet to use for a plain "Connect" click: browser wallet first
    pub fn preferred_wallet(&self) -> Option<WalletType> {
        self.available_wallets().first().copied()
    }

    /// A wallet is attached and its session has not ended
    pub fn has_provider(&self) -> bool {
        self.wallet != WebProvider::None && !self.connection.is_closed()
    }

    pub fn wallet_type(&self) -> Option<WalletType> {
        self.wallet.wallet_type()
    }

    /// Changes with every new wallet connection
    pub fn connection_id(&self) -> usize {
        Arc::as_ptr(&self.connection) as usize
    }

    pub fn chains(&self) -> &SupportedChains {
        &self.chains
    }

    /// Network used for reads while no wallet is attached, and the initial
    /// network offered to WalletConnect
    pub fn selected_chain(&self) -> Option<&Chain> {
        self.chains.get(self.selected_chain)
    }

    pub fn accounts(&self) -> Option<Vec<Address>> {
        self.connection.snapshot().accounts
    }

    pub fn chain_id(&self) -> Option<u64> {
        self.connection.snapshot().chain_id
    }

    pub fn provider(&self) -> Provider<Ethereum> {
        Provider::new(self.clone())
    }

    pub async fn connect(&mut self, wallet: WalletType) -> Result<(), EthereumError> {
        if self.has_provider() {
            return Err(EthereumError::AlreadyConnected);
        }
        if !self.is_available(wallet) {
            return Err(EthereumError::Unavailable);
        }
        self.wallet = WebProvider::None;
        self.connection.drop_listeners();
        self.connection = Arc::new(Connection::new());
        match wallet {
            WalletType::Injected => self.connect_injected(true).await,
            WalletType::WalletConnect => self.connect_wc().await,
        }
    }

    /// Reattaches a browser wallet that already trusts this site, without
    /// prompting. Returns `false` when nothing could be restored.
    pub async fn restore(&mut self, wallet: WalletType) -> bool {
        if wallet != WalletType::Injected || self.has_provider() || !self.injected_available() {
            return false;
        }
        self.connection = Arc::new(Connection::new());
        match self.connect_injected(false).await {
            Ok(()) => true,
            Err(err) => {
                debug!("Session not restored: {err}");
                self.wallet = WebProvider::None;
                false
            }
        }
    }

    pub async fn disconnect(&mut self) {
        let wallet = std::mem::replace(&mut self.wallet, WebProvider::None);
        if let WebProvider::WalletConnect(wc) = &wallet {
            wc.disconnect().await;
        }
        self.connection.drop_listeners();
        self.connection.close();
    }

    /// Moves the session to `chain_id`.
    ///
    /// Without a wallet only the read-only network changes. Browser wallets
    /// are asked to switch (and to add the network if they do not know it).
    /// WalletConnect sessions can only move to networks approved at pairing.
    pub async fn switch_network(&mut self, chain_id: u64) -> Result<(), EthereumError> {
        let chain = self.chains.require(chain_id)?.clone();
        let wallet = if self.connection.is_closed() { &WebProvider::None } else { &self.wallet };
        match wallet {
            WebProvider::None => {}
            WebProvider::Injected(injected) => injected.switch_chain(&chain).await?,
            WebProvider::WalletConnect(wc) => {
                wc.switch_chain(&chain).map_err(|err| match err {
                    walletconnect::error::Error::ChainNotApproved(id) => {
                        EthereumError::ChainNotApproved(id)
                    }
                    err => err.into(),
                })?;
                self.connection.set_chain(Some(chain.id));
            }
        }
        self.selected_chain = chain.id;
        self.read_only = read_only_client(Some(&chain));
        Ok(())
    }

    /// Waits for the next session event of the current connection
    pub async fn next(&self) -> Result<Option<Event>, EthereumError> {
        if let Some(event) = self.connection.try_next() {
            return Ok(Some(event));
        }
        let wc = match &self.wallet {
            WebProvider::WalletConnect(wc) if !self.connection.is_closed() => wc,
            _ => return Ok(self.connection.next().await),
        };

        let mut queue = self.connection.receiver.lock().await;
        let relayed = tokio::select! {
            biased;
            event = queue.recv() => return Ok(event),
            relayed = wc.next() => relayed,
        };
        drop(queue);

        match relayed {
            Ok(Some(RelayEvent::Broken)) => {}
            Ok(Some(RelayEvent::Disconnected)) => {
                debug!("Wallet ended the WalletConnect session");
                self.connection.close();
                return Ok(self.connection.try_next());
            }
            Ok(relayed) => {
                self.connection.relay_ok();
                if relayed.is_some() {
                    let chain_id = wc.chain_id();
                    let moved = self.connection.snapshot().chain_id != Some(chain_id);
                    self.connection.sync(wc.accounts(), chain_id);
                    if moved {
                        wc.set_fallback(self.chains.get(chain_id));
                    }
                }
                return Ok(self.connection.try_next());
            }
            Err(err) => debug!("WalletConnect relay read failed: {err}"),
        }

        match self.connection.relay_failed() {
            Some(broken) => {
                // a dead socket answers at once, do not spin on it
                TimeoutFuture::new(RELAY_RETRY_MS).await;
                Ok(Some(broken))
            }
            None => Ok(self.connection.try_next()),
        }
    }

    async fn connect_injected(&mut self, prompt: bool) -> Result<(), EthereumError> {
        let injected = Eip1193::new();

        let accounts =
            if prompt { injected.request_accounts().await? } else { injected.accounts().await? };
        if accounts.is_empty() {
            return Err(EthereumError::NotConnected);
        }
        let chain_id = injected.chain_id().await?;

        self.wallet = WebProvider::Injected(injected.clone());
        self.subscribe(&injected)?;

        self.connection.mark_connected();
        self.connection.set_chain(Some(chain_id));
        self.connection.set_accounts(Some(accounts));

        if self.chains.contains(chain_id) {
            self.selected_chain = chain_id;
            self.read_only = read_only_client(self.chains.get(chain_id));
        } else {
            warn!("Wallet is on unsupported chain {chain_id}");
        }
        Ok(())
    }

    fn subscribe(&self, injected: &Eip1193) -> Result<(), EthereumError> {
        let connection = Arc::downgrade(&self.connection);
        for event in [
            WalletEvent::ChainChanged,
            WalletEvent::AccountsChanged,
            WalletEvent::Connect,
            WalletEvent::Disconnect,
        ] {
            let weak = connection.clone();
            let listener = injected.on(
                event,
                Box::new(move |payload: JsValue| on_wallet_event(&weak, event, payload)),
            )?;
            self.connection.keep_listener(listener);
        }
        Ok(())
    }

    async fn connect_wc(&mut self) -> Result<(), EthereumError> {
        let project_id = self.wc_project_id.clone().ok_or(EthereumError::Unavailable)?;
        let chain = self.chains.require(self.selected_chain)?.clone();

        let (provider, pairing_uri) =
            WalletConnectProvider::connect(&project_id, self.metadata.clone(), &chain).await?;
        self.wallet = WebProvider::WalletConnect(provider);
        self.connection.emit(Event::ConnectionWaiting(pairing_uri));
        Ok(())
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConnectInfo {
    chain_id: String,
}

fn on_wallet_event(connection: &Weak<Connection>, event: WalletEvent, payload: JsValue) {
    let Some(connection) = connection.upgrade() else {
        return;
    };
    let payload = payload.into_serde::<serde_json::Value>().unwrap_or_default();
    if connection.apply_wallet_event(event, payload) {
        // listeners cannot be removed from inside their own callback
        let connection = Arc::downgrade(&connection);
        wasm_bindgen_futures::spawn_local(async move {
            if let Some(connection) = connection.upgrade() {
                connection.drop_listeners();
            }
        });
    }
}

#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
impl JsonRpcClient for Ethereum {
    type Error = EthereumError;

    async fn request<T, R>(&self, method: &str, params: T) -> Result<R, Self::Error>
    where
        T: Debug + Serialize + Send + Sync,
        R: DeserializeOwned + Send,
    {
        // an ended session no longer answers for the app
        let wallet = if self.connection.is_closed() { &WebProvider::None } else { &self.wallet };
        match wallet {
            WebProvider::None => match &self.read_only {
                Some(http) => Ok(http.request(method, params).await?),
                None => Err(EthereumError::NotConnected),
            },
            WebProvider::Injected(provider) => Ok(provider.request(method, params).await?),
            WebProvider::WalletConnect(provider) => Ok(provider.request(method, params).await?),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ethers::types::U64;
    use futures::executor::block_on;
    use serde_json::{json, Value as JsonValue};

    fn drain(connection: &Connection) -> Vec<Event> {
        std::iter::from_fn(|| connection.try_next()).collect()
    }

    fn account(n: u64) -> Address {
        Address::from_low_u64_be(n)
    }

    #[test]
    fn close_announces_once() {
        let connection = Connection::new();
        connection.mark_connected();
        connection.close();
        connection.close();
        assert_eq!(
            drain(&connection),
            vec![
                Event::Connected,
                Event::ChainIdChanged(None),
                Event::AccountsChanged(None),
                Event::Disconnected,
            ]
        );
        assert!(connection.is_closed());
        assert_eq!(connection.snapshot(), Snapshot::default());
    }

    #[test]
    fn sync_waits_for_accounts_before_connecting() {
        let connection = Connection::new();
        connection.sync(None, 97);
        assert!(drain(&connection).is_empty());

        connection.sync(Some(vec![account(1)]), 97);
        assert_eq!(
            drain(&connection),
            vec![
                Event::Connected,
                Event::ChainIdChanged(Some(97)),
                Event::AccountsChanged(Some(vec![account(1)])),
            ]
        );
    }

    #[test]
    fn sync_only_reports_changes() {
        let connection = Connection::new();
        connection.sync(Some(vec![account(1)]), 56);
        drain(&connection);

        connection.sync(Some(vec![account(1)]), 56);
        assert!(drain(&connection).is_empty());

        connection.sync(Some(vec![account(2)]), 137);
        assert_eq!(
            drain(&connection),
            vec![Event::ChainIdChanged(Some(137)), Event::AccountsChanged(Some(vec![account(2)]))]
        );
    }

    #[test]
    fn sync_losing_accounts_ends_session() {
        let connection = Connection::new();
        connection.sync(Some(vec![account(1)]), 1);
        drain(&connection);

        connection.sync(None, 1);
        assert_eq!(drain(&connection).last(), Some(&Event::Disconnected));

        connection.sync(Some(vec![account(1)]), 1);
        assert!(drain(&connection).is_empty());
    }

    #[test]
    fn queued_events_are_awaitable() {
        let connection = Connection::new();
        connection.set_chain(Some(1));
        assert_eq!(block_on(connection.next()), Some(Event::ChainIdChanged(Some(1))));
    }

    #[test]
    fn chain_changed_payload_is_parsed() {
        let connection = Connection::new();
        assert!(!connection.apply_wallet_event(WalletEvent::ChainChanged, json!("0x89")));
        assert_eq!(drain(&connection), vec![Event::ChainIdChanged(Some(137))]);
        assert_eq!(connection.snapshot().chain_id, Some(137));

        connection.apply_wallet_event(WalletEvent::ChainChanged, json!(137));
        connection.apply_wallet_event(WalletEvent::ChainChanged, json!("polygon"));
        assert!(drain(&connection).is_empty());
    }

    #[test]
    fn accounts_changed_payload_is_parsed() {
        let connection = Connection::new();
        let payload = json!(["0x0000000000000000000000000000000000000002"]);
        assert!(!connection.apply_wallet_event(WalletEvent::AccountsChanged, payload));
        assert_eq!(drain(&connection), vec![Event::AccountsChanged(Some(vec![account(2)]))]);

        connection.apply_wallet_event(WalletEvent::AccountsChanged, json!({"accounts": []}));
        assert!(drain(&connection).is_empty());
        assert!(!connection.is_closed());
    }

    #[test]
    fn empty_accounts_end_the_session() {
        let connection = Connection::new();
        connection.mark_connected();
        drain(&connection);

        assert!(connection.apply_wallet_event(WalletEvent::AccountsChanged, json!([])));
        assert!(connection.is_closed());
        assert_eq!(drain(&connection).last(), Some(&Event::Disconnected));
    }

    #[test]
    fn connect_event_reports_new_chain_only() {
        let connection = Connection::new();
        connection.apply_wallet_event(WalletEvent::Connect, json!({"chainId": "0x61"}));
        assert_eq!(drain(&connection), vec![Event::ChainIdChanged(Some(97))]);

        connection.apply_wallet_event(WalletEvent::Connect, json!({"chainId": "0x61"}));
        connection.apply_wallet_event(WalletEvent::Connect, JsonValue::Null);
        assert!(drain(&connection).is_empty());
    }

    #[test]
    fn disconnect_event_closes_and_silences() {
        let connection = Connection::new();
        connection.mark_connected();
        drain(&connection);

        assert!(connection.apply_wallet_event(WalletEvent::Disconnect, json!({"code": 4900})));
        assert_eq!(drain(&connection).last(), Some(&Event::Disconnected));

        assert!(!connection.apply_wallet_event(WalletEvent::Disconnect, JsonValue::Null));
        assert!(!connection.apply_wallet_event(WalletEvent::ChainChanged, json!("0x1")));
        assert!(drain(&connection).is_empty());
    }

    #[test]
    fn relay_failures_close_the_session() {
        let connection = Connection::new();
        connection.mark_connected();
        drain(&connection);

        assert_eq!(connection.relay_failed(), Some(Event::Broken));
        connection.relay_ok();
        assert_eq!(connection.relay_failed(), Some(Event::Broken));
        assert_eq!(connection.relay_failed(), Some(Event::Broken));
        assert!(!connection.is_closed());
        assert!(drain(&connection).is_empty());

        assert_eq!(connection.relay_failed(), None);
        assert!(connection.is_closed());
        assert_eq!(drain(&connection).last(), Some(&Event::Disconnected));
    }

    #[test]
    fn closed_wallet_session_falls_back_to_read_only() {
        let mut ethereum = EthereumBuilder::new().build().unwrap();
        ethereum.wallet = WebProvider::Injected(Eip1193::new());
        ethereum.connection.mark_connected();
        assert!(ethereum.has_provider());

        ethereum.connection.close();
        assert!(!ethereum.has_provider());
        assert_eq!(ethereum.wallet_type(), Some(WalletType::Injected));

        // the wallet is not asked to switch anymore
        block_on(ethereum.switch_network(56)).unwrap();
        assert_eq!(ethereum.selected_chain().map(|c| c.id), Some(56));

        ethereum.read_only = None;
        let chain_id: Result<U64, _> = block_on(ethereum.request("eth_chainId", ()));
        assert!(matches!(chain_id, Err(EthereumError::NotConnected)));
    }

    #[test]
    fn builder_rejects_unknown_default_chain() {
        let mut builder = EthereumBuilder::new();
        builder.default_chain(4);
        assert!(matches!(
            builder.build(),
            Err(EthereumError::ChainError(ChainError::Unsupported(4)))
        ));
    }

    #[test]
    fn builder_rejects_bad_app_url() {
        let mut builder = EthereumBuilder::new();
        builder.url("not a url");
        assert!(matches!(builder.build(), Err(EthereumError::InvalidAppUrl(u)) if u == "not a url"));
    }

    #[test]
    fn builder_from_config() {
        let config = AppConfig::from_values(Some("project"), None, Some("56"), None);
        let ethereum = EthereumBuilder::from_config(&config).build().unwrap();
        assert!(ethereum.walletconnect_available());
        assert!(!ethereum.has_provider());
        assert_eq!(ethereum.selected_chain().map(|c| c.id), Some(56));
        assert_eq!(ethereum.accounts(), None);
    }

    #[test]
    fn read_only_switch_changes_selected_chain() {
        let mut ethereum = EthereumBuilder::new().build().unwrap();
        block_on(ethereum.switch_network(137)).unwrap();
        assert_eq!(ethereum.selected_chain().map(|c| c.id), Some(137));

        let err = block_on(ethereum.switch_network(4)).unwrap_err();
        assert!(matches!(err, EthereumError::ChainError(ChainError::Unsupported(4))));
        assert_eq!(ethereum.selected_chain().map(|c| c.id), Some(137));
    }

    #[test]
    fn clones_share_the_connection() {
        let ethereum = EthereumBuilder::new().build().unwrap();
        let clone = ethereum.clone();
        assert_eq!(ethereum, clone);
        ethereum.connection.set_chain(Some(97));
        assert_eq!(clone.chain_id(), Some(97));
    }
}
