use dapp_boilerplate::{
    app::{App, AppProps},
    config::AppConfig,
    EthereumBuilder,
};
use log::{error, info, Level};
use yew::prelude::*;

#[derive(Properties, PartialEq)]
struct StartupErrorProps {
    message: String,
}

#[function_component(StartupError)]
fn startup_error(props: &StartupErrorProps) -> Html {
    html! {
        <div class="startup-error">
            <h1>{"DAPP boilerplate could not start"}</h1>
            <p>{&props.message}</p>
        </div>
    }
}

fn main() {
    _ = console_log::init_with_level(Level::Debug);
    console_error_panic_hook::set_once();

    let config = AppConfig::default();
    match EthereumBuilder::from_config(&config).build() {
        Ok(ethereum) => {
            info!("Starting on chain {}", config.default_chain_id);
            yew::Renderer::<App>::with_props(AppProps { ethereum }).render();
        }
        Err(err) => {
            error!("Cannot set up wallet session: {err}");
            yew::Renderer::<StartupError>::with_props(StartupErrorProps { message: err.to_string() })
                .render();
        }
    }
}
