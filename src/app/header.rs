use super::Page;
use crate::{hooks::use_wallet, session::short_address, WalletType};
use yew::prelude::*;

#[derive(Properties, PartialEq)]
pub struct HeaderProps {
    pub page: Page,
    pub on_navigate: Callback<Page>,
}

#[function_component(Header)]
pub fn header(props: &HeaderProps) -> Html {
    let ethereum = use_wallet();
    let menu_open = use_state(|| false);

    let toggle_menu = {
        let menu_open = menu_open.clone();
        Callback::from(move |_: MouseEvent| menu_open.set(!*menu_open))
    };

    let chain_menu = ethereum
        .chains()
        .iter()
        .map(|chain| {
            let onclick = {
                let ethereum = ethereum.clone();
                let menu_open = menu_open.clone();
                let id = chain.id;
                Callback::from(move |_: MouseEvent| {
                    menu_open.set(false);
                    ethereum.switch_network(id);
                })
            };
            html! { <li key={chain.id}><a {onclick}>{&chain.name}</a></li> }
        })
        .collect::<Html>();

    let nav = Page::ALL
        .iter()
        .map(|page| {
            let onclick = props.on_navigate.reform({
                let page = *page;
                move |_: MouseEvent| page
            });
            let active = (*page == props.page).then_some("active");
            html! { <a class={classes!("nav-link", active)} {onclick}>{page.title()}</a> }
        })
        .collect::<Html>();

    let user = ethereum.account().map(|account| {
        let chain = ethereum.chain().filter(|_| ethereum.session.is_supported_chain(ethereum.chains()));
        let chain_name = match &chain {
            Some(chain) => chain.name.clone(),
            None => "Unsupported network".to_string(),
        };
        let profile = chain.and_then(|c| c.address_url(&account)).map(|u| u.to_string());
        html! {
            <div class="user-info">
                <a class="avatar" href={profile} target="_blank" title={short_address(&account)}>
                    {"👤"}
                </a>
                <div class="chain">{chain_name}</div>
            </div>
        }
    });

    let buttons = if ethereum.is_connected() || ethereum.pairing_url().is_some() {
        let onclick = {
            let ethereum = ethereum.clone();
            Callback::from(move |_: MouseEvent| ethereum.disconnect())
        };
        html! { <button class="button" {onclick}>{"Disconnect"}</button> }
    } else {
        let login = {
            let ethereum = ethereum.clone();
            Callback::from(move |_: MouseEvent| ethereum.login())
        };
        let eth = &*ethereum.ethereum;
        let walletconnect = (eth.injected_available() && eth.walletconnect_available()).then(|| {
            let ethereum = ethereum.clone();
            let onclick =
                Callback::from(move |_: MouseEvent| ethereum.connect(WalletType::WalletConnect));
            html! { <button class="button secondary" {onclick}>{"WalletConnect"}</button> }
        });
        let wallet_name = match eth.preferred_wallet() {
            Some(WalletType::Injected) if eth.injected_is_metamask() => "MetaMask".to_string(),
            Some(wallet) => wallet.to_string(),
            None => "no wallet available".to_string(),
        };
        html! {
            <>
                <button class="button" onclick={login} title={format!("Connect with {wallet_name}")}>
                    {"Connect"}
                </button>
                {walletconnect}
            </>
        }
    };

    let home = props.on_navigate.reform(|_: MouseEvent| Page::Home);
    let selected = ethereum.selected_chain().map(|c| c.name).unwrap_or_default();

    html! {
        <header class="header">
            <div class="logo" onclick={home}>{"DAPP Boilerplate"}</div>
            <nav class="nav">{nav}</nav>
            <div class="dropdown" style="margin-right: 10px">
                <div class="dropdown-link" onclick={toggle_menu} title={selected}>
                    {"Select Network ▾"}
                </div>
                if *menu_open {
                    <ul class="dropdown-menu">{chain_menu}</ul>
                }
            </div>
            {user}
            <div class="buttons">{buttons}</div>
        </header>
    }
}
