use super::{
    footer::{Footer, FooterData},
    header::Header,
    notification::NotificationBanner,
    pages::{approve_erc20::ApproveErc20, home::Home},
    pairing::PairingView,
    Page,
};
use yew::prelude::*;

#[function_component(Layout)]
pub fn layout() -> Html {
    let page = use_state(|| Page::Home);

    let on_navigate = {
        let page = page.clone();
        Callback::from(move |next: Page| page.set(next))
    };

    let content = match *page {
        Page::Home => html! { <Home /> },
        Page::ApproveErc20 => html! { <ApproveErc20 /> },
    };

    html! {
        <div class="layout">
            <Header page={*page} {on_navigate} />
            <NotificationBanner />
            <PairingView />
            <main class="content">{content}</main>
            <Footer data={FooterData::default()} />
        </div>
    }
}
