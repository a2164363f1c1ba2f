use crate::{
    chain::{Chain, SupportedChains},
    notify::{Notification, NOTIFY_TIMEOUT_MS},
    session::{SessionState, StoredSession},
    Ethereum, EthereumError, Event, WalletType,
};
use ethers::{providers::Provider, types::Address};
use gloo::timers::callback::Timeout;
use log::{debug, error, warn};
use std::{rc::Rc, sync::Arc};
use yew::{platform::spawn_local, prelude::*};

impl Reducible for SessionState {
    type Action = Event;

    fn reduce(self: Rc<Self>, action: Event) -> Rc<Self> {
        let mut next = (*self).clone();
        next.apply(&action);
        next.into()
    }
}

#[derive(Properties, PartialEq)]
pub struct Props {
    #[prop_or_default]
    pub children: Children,
}

/// Currently shown notification, cleared automatically
#[derive(Clone, Debug, PartialEq)]
pub struct UseNotify {
    current: UseStateHandle<Option<Notification>>,
}

impl UseNotify {
    pub fn show(&self, notification: Notification) {
        self.current.set(Some(notification));
    }

    pub fn clear(&self) {
        self.current.set(None);
    }

    pub fn current(&self) -> Option<&Notification> {
        (*self.current).as_ref()
    }
}

#[function_component(NotifyContextProvider)]
pub fn notify_context_provider(props: &Props) -> Html {
    let current = use_state(|| None as Option<Notification>);

    {
        let handle = current.clone();
        use_effect_with((*current).clone(), move |notification| {
            let timeout = notification
                .as_ref()
                .map(|_| Timeout::new(NOTIFY_TIMEOUT_MS, move || handle.set(None)));
            move || drop(timeout)
        });
    }

    html! {
        <ContextProvider<UseNotify> context={UseNotify { current }}>
            {for props.children.iter()}
        </ContextProvider<UseNotify>>
    }
}

#[hook]
pub fn use_notify() -> UseNotify {
    use_context::<UseNotify>()
        .expect("No notify context found. You must wrap your components in a <NotifyContextProvider />")
}

/// Page wide "transaction in flight" flag
#[derive(Clone, Debug, PartialEq)]
pub struct UseLoading {
    shown: UseStateHandle<bool>,
}

impl UseLoading {
    pub fn set(&self, shown: bool) {
        self.shown.set(shown);
    }

    pub fn is_shown(&self) -> bool {
        *self.shown
    }
}

#[function_component(LoadingContextProvider)]
pub fn loading_context_provider(props: &Props) -> Html {
    let shown = use_state(|| false);

    html! {
        <ContextProvider<UseLoading> context={UseLoading { shown }}>
            {for props.children.iter()}
        </ContextProvider<UseLoading>>
    }
}

#[hook]
pub fn use_loading() -> UseLoading {
    use_context::<UseLoading>()
        .expect("No loading context found. You must wrap your components in a <LoadingContextProvider />")
}

#[derive(Clone, Debug, PartialEq)]
pub struct UseEthereum {
    pub ethereum: UseStateHandle<Ethereum>,
    pub session: UseReducerHandle<SessionState>,
    notify: UseNotify,
}

impl UseEthereum {
    /// Connects the browser wallet when there is one, WalletConnect otherwise
    pub fn login(&self) {
        match (*self.ethereum).preferred_wallet() {
            Some(wallet_type) => self.connect(wallet_type),
            None => self.notify.show(Notification::login_failed(EthereumError::Unavailable)),
        }
    }

    /// Connect to the wallet (defined by type)
    pub fn connect(&self, wallet_type: WalletType) {
        let handle = self.ethereum.clone();
        let notify = self.notify.clone();
        let mut eth = (*self.ethereum).clone();
        spawn_local(async move {
            if eth.has_provider() {
                eth.disconnect().await;
            }
            match eth.connect(wallet_type).await {
                Ok(()) => {
                    remember(&eth);
                    if let Some(account) = eth.accounts().and_then(|a| a.first().copied()) {
                        notify.show(Notification::logged_in(&account));
                    }
                }
                Err(err) => {
                    match &err {
                        EthereumError::Eip1193Error(e) if e.is_user_rejection() => {
                            debug!("User rejected the {wallet_type} connection")
                        }
                        _ => error!("Connecting {wallet_type} failed: {err}"),
                    }
                    notify.show(Notification::login_failed(err));
                }
            }
            handle.set(eth);
        });
    }

    /// Disconnect from wallet
    pub fn disconnect(&self) {
        let handle = self.ethereum.clone();
        let notify = self.notify.clone();
        let mut eth = (*self.ethereum).clone();
        spawn_local(async move {
            eth.disconnect().await;
            StoredSession::clear();
            handle.set(eth);
            notify.show(Notification::logged_out());
        });
    }

    /// Moves wallet (or the read-only view) to another supported network.
    /// WalletConnect sessions that did not approve the network are paired
    /// again on it.
    pub fn switch_network(&self, chain_id: u64) {
        let handle = self.ethereum.clone();
        let notify = self.notify.clone();
        let mut eth = (*self.ethereum).clone();
        spawn_local(async move {
            match eth.switch_network(chain_id).await {
                Ok(()) => remember(&eth),
                Err(EthereumError::ChainNotApproved(id)) => {
                    debug!("Chain {id} not approved, pairing again");
                    eth.disconnect().await;
                    if let Err(err) = eth.switch_network(id).await {
                        notify.show(Notification::network_switch_failed(err));
                    } else if let Err(err) = eth.connect(WalletType::WalletConnect).await {
                        notify.show(Notification::login_failed(err));
                    }
                }
                Err(err) => {
                    warn!("Switching to {chain_id} failed: {err}");
                    notify.show(Notification::network_switch_failed(err));
                }
            }
            handle.set(eth);
        });
    }

    /// Gets a provider you can feed to ethers constructors to start interaction with wallet and
    /// the network
    pub fn provider(&self) -> Arc<Provider<Ethereum>> {
        Arc::new((*self.ethereum).provider())
    }

    /// Checks if any wallet is currently connected
    pub fn is_connected(&self) -> bool {
        self.session.connected
    }

    /// Main account of the connected wallet
    pub fn account(&self) -> Option<Address> {
        self.session.account()
    }

    pub fn chains(&self) -> &SupportedChains {
        (*self.ethereum).chains()
    }

    /// Network the wallet is on, when it is a supported one
    pub fn chain(&self) -> Option<Chain> {
        self.session.chain((*self.ethereum).chains()).cloned()
    }

    /// Network used while no wallet is connected
    pub fn selected_chain(&self) -> Option<Chain> {
        (*self.ethereum).selected_chain().cloned()
    }

    /// Returns current pairing url if wallet connect connection is awaiting to be established
    pub fn pairing_url(&self) -> Option<String> {
        self.session.pairing_url.clone()
    }
}

/// Stores the wallet and the network picked in the app. The wallet's own
/// chain is not used because it only catches up with a switch later.
fn remember(eth: &Ethereum) {
    let stored =
        StoredSession { wallet: eth.wallet_type(), chain_id: eth.selected_chain().map(|c| c.id) };
    if let Err(err) = stored.save() {
        warn!("Cannot store session: {err}");
    }
}

async fn run(eth: Ethereum, session: UseReducerDispatcher<SessionState>, notify: UseNotify) {
    let announce_login = eth.wallet_type() == Some(WalletType::WalletConnect);
    let mut announced = false;
    loop {
        match eth.next().await {
            Ok(Some(event)) => {
                let done = event == Event::Disconnected;
                match &event {
                    Event::ChainIdChanged(Some(chain_id)) if !eth.chains().contains(*chain_id) => {
                        notify.show(Notification::unsupported_network(*chain_id))
                    }
                    Event::AccountsChanged(Some(accounts)) if announce_login && !announced => {
                        if let Some(account) = accounts.first() {
                            announced = true;
                            notify.show(Notification::logged_in(account));
                        }
                    }
                    _ => {}
                }
                session.dispatch(event);
                if done {
                    break;
                }
            }
            Ok(None) => {}
            Err(err) => {
                error!("Error on fetching event message {err:?}");
                session.dispatch(Event::Disconnected);
                break;
            }
        }
    }
    debug!("Listener loop ended");
}

#[hook]
pub fn use_ethereum(initial: &Ethereum) -> UseEthereum {
    let notify = use_notify();
    let ethereum = {
        let initial = initial.clone();
        use_state(move || initial)
    };
    let session = use_reducer(SessionState::default);

    {
        let eth = (*ethereum).clone();
        let dispatcher = session.dispatcher();
        let notify = notify.clone();
        use_effect_with(
            (ethereum.has_provider(), ethereum.connection_id()),
            move |(has_provider, _)| {
                if *has_provider {
                    debug!("Start running");
                    spawn_local(run(eth, dispatcher, notify));
                }
            },
        );
    }

    {
        let handle = ethereum.clone();
        yew_hooks::use_effect_once(move || {
            spawn_local(async move {
                let Some(stored) = StoredSession::load() else {
                    return;
                };
                let mut eth = (*handle).clone();
                let mut changed = false;
                if let Some(chain_id) = stored.chain_id.filter(|id| eth.chains().contains(*id)) {
                    changed |= eth.switch_network(chain_id).await.is_ok();
                }
                if let Some(wallet) = stored.wallet {
                    if eth.restore(wallet).await {
                        debug!("Restored {wallet} session");
                        changed = true;
                    }
                }
                if changed {
                    handle.set(eth);
                }
            });
            || {}
        });
    }

    UseEthereum { ethereum, session, notify }
}

#[derive(Properties, PartialEq)]
pub struct EthereumProps {
    pub ethereum: Ethereum,
    #[prop_or_default]
    pub children: Children,
}

#[function_component(EthereumContextProvider)]
pub fn ethereum_context_provider(props: &EthereumProps) -> Html {
    let ethereum = use_ethereum(&props.ethereum);

    html! {
        <ContextProvider<UseEthereum> context={ethereum}>
            {for props.children.iter()}
        </ContextProvider<UseEthereum>>
    }
}

#[hook]
pub fn use_wallet() -> UseEthereum {
    use_context::<UseEthereum>().expect(
        "No ethereum found. You must wrap your components in an <EthereumContextProvider />",
    )
}
