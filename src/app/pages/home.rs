use crate::hooks::use_wallet;
use log::debug;
use yew::prelude::*;

#[function_component(Home)]
pub fn home() -> Html {
    let ethereum = use_wallet();

    use_effect_with((*ethereum.session).clone(), |session| {
        debug!("Session {session:?}");
    });

    html! {
        <div class="home">
            <h1>{"DAPP boilerplate (Rust + yew)"}</h1>
        </div>
    }
}
