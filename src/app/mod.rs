pub mod footer;
pub mod header;
pub mod layout;
pub mod notification;
pub mod pages;
pub mod pairing;

use crate::{
    hooks::{EthereumContextProvider, LoadingContextProvider, NotifyContextProvider},
    Ethereum,
};
use layout::Layout;
use yew::prelude::*;

/// Screens reachable from the header
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Page {
    Home,
    ApproveErc20,
}

impl Page {
    pub const ALL: [Page; 2] = [Page::Home, Page::ApproveErc20];

    pub fn title(&self) -> &'static str {
        match self {
            Page::Home => "Home",
            Page::ApproveErc20 => "Approve ERC20",
        }
    }
}

#[derive(Properties, PartialEq)]
pub struct AppProps {
    pub ethereum: Ethereum,
}

#[function_component(App)]
pub fn app(props: &AppProps) -> Html {
    html! {
        <NotifyContextProvider>
            <LoadingContextProvider>
                <EthereumContextProvider ethereum={props.ethereum.clone()}>
                    <Layout />
                </EthereumContextProvider>
            </LoadingContextProvider>
        </NotifyContextProvider>
    }
}
