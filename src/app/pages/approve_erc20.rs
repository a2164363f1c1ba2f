use crate::{
    erc20::{self, format_amount, Erc20Error, SpenderInfo, Token},
    hooks::{use_loading, use_notify, use_wallet},
    notify::Notification,
};
use ethers::types::H256;
use log::{error, info};
use web_sys::HtmlInputElement;
use yew::{platform::spawn_local, prelude::*};

#[derive(Properties, PartialEq)]
struct SearchProps {
    label: &'static str,
    loading: bool,
    on_search: Callback<String>,
}

/// Address input submitted with Enter or the search button
#[function_component(SearchInput)]
fn search_input(props: &SearchProps) -> Html {
    let input = use_node_ref();

    let search = {
        let input = input.clone();
        let on_search = props.on_search.clone();
        move || {
            if let Some(el) = input.cast::<HtmlInputElement>() {
                on_search.emit(el.value().trim().to_string());
            }
        }
    };
    let onclick = {
        let search = search.clone();
        Callback::from(move |_: MouseEvent| search())
    };
    let onkeydown = Callback::from(move |e: KeyboardEvent| {
        if e.key() == "Enter" {
            search()
        }
    });

    html! {
        <div class="search">
            <span class="addon">{props.label}</span>
            <input ref={input} type="text" {onkeydown} />
            <button class="search-button" {onclick} disabled={props.loading}>
                {if props.loading { "…" } else { "Search" }}
            </button>
        </div>
    }
}

#[derive(Properties, PartialEq)]
struct StatisticProps {
    title: &'static str,
    value: String,
}

#[function_component(Statistic)]
fn statistic(props: &StatisticProps) -> Html {
    html! {
        <div class="statistic">
            <div class="statistic-title">{props.title}</div>
            <div class="statistic-value">{&props.value}</div>
        </div>
    }
}

#[function_component(ApproveErc20)]
pub fn approve_erc20() -> Html {
    let ethereum = use_wallet();
    let notify = use_notify();
    let loading = use_loading();

    let token = use_state(|| None as Option<Token>);
    let spender = use_state(|| None as Option<SpenderInfo>);
    let amount = use_state(String::new);
    let last_tx = use_state(|| None as Option<H256>);

    // Allowances belong to an account on a network
    {
        let token = token.clone();
        let spender = spender.clone();
        let selected = ethereum.selected_chain().map(|c| c.id);
        use_effect_with((ethereum.account(), ethereum.session.chain_id, selected), move |_| {
            token.set(None);
            spender.set(None);
        });
    }

    let on_token_search = {
        let ethereum = ethereum.clone();
        let notify = notify.clone();
        let token = token.clone();
        let spender = spender.clone();
        Callback::from(move |address: String| {
            let provider = ethereum.provider();
            let notify = notify.clone();
            let token = token.clone();
            let spender = spender.clone();
            spawn_local(async move {
                match erc20::load_token(provider, &address).await {
                    Ok(loaded) => {
                        spender.set(None);
                        token.set(Some(loaded));
                    }
                    Err(err) => {
                        error!("Loading token {address:?} failed: {err}");
                        notify.show(Notification::from(&err));
                    }
                }
            });
        })
    };

    let on_spender_search = {
        let ethereum = ethereum.clone();
        let notify = notify.clone();
        let token = token.clone();
        let spender = spender.clone();
        Callback::from(move |address: String| {
            let Some(current) = (*token).clone() else {
                notify.show(Notification::token_not_exist());
                return;
            };
            let provider = ethereum.provider();
            let owner = ethereum.account();
            let notify = notify.clone();
            let spender = spender.clone();
            spawn_local(async move {
                match erc20::load_spender(provider, &current, owner, &address).await {
                    Ok(info) => spender.set(Some(info)),
                    Err(err) => {
                        error!("Loading spender {address:?} failed: {err}");
                        notify.show(Notification::from(&err));
                    }
                }
            });
        })
    };

    let on_amount = {
        let amount = amount.clone();
        Callback::from(move |e: InputEvent| {
            amount.set(e.target_unchecked_into::<HtmlInputElement>().value());
        })
    };

    let on_approve = {
        let ethereum = ethereum.clone();
        let notify = notify.clone();
        let loading = loading.clone();
        let token = token.clone();
        let spender = spender.clone();
        let amount = amount.clone();
        let last_tx = last_tx.clone();
        Callback::from(move |_: MouseEvent| {
            let Some(current) = (*token).clone() else {
                notify.show(Notification::token_not_exist());
                return;
            };
            let Some(target) = (*spender).clone() else {
                notify.show(Notification::invalid_address());
                return;
            };
            let provider = ethereum.provider();
            let owner = ethereum.account();
            let value = (*amount).clone();
            let notify = notify.clone();
            let loading = loading.clone();
            let spender = spender.clone();
            let last_tx = last_tx.clone();

            loading.set(true);
            spawn_local(async move {
                info!("Approving {value} {} for {:?}", current.symbol, target.address);
                match erc20::approve(provider, &current, owner, target.address, &value).await {
                    Ok(outcome) => {
                        notify.show(Notification::transaction(outcome.status, &outcome.tx_hash));
                        last_tx.set(Some(outcome.tx_hash));
                        spender.set(Some(SpenderInfo { allowance: outcome.allowance, ..target }));
                    }
                    Err(err @ (Erc20Error::InvalidAmount(_) | Erc20Error::NoAccount)) => {
                        notify.show(Notification::from(&err))
                    }
                    Err(err) => {
                        error!("Approval failed: {err}");
                        notify.show(Notification::transaction_error(err));
                    }
                }
                loading.set(false);
            });
        })
    };

    let busy = loading.is_shown();
    let symbol = (*token).as_ref().map(|t| t.symbol.clone()).unwrap_or_default();
    let allowance = match ((*token).as_ref(), (*spender).as_ref()) {
        (Some(t), Some(s)) => format_amount(s.allowance, t.decimals),
        _ => "0".to_string(),
    };
    let spender_address = (*spender).as_ref().map(|s| format!("{:?}", s.address)).unwrap_or_default();

    let explorer = (*last_tx).and_then(|hash| {
        let chain = ethereum.chain().or_else(|| ethereum.selected_chain())?;
        let url = chain.tx_url(&hash)?;
        Some(html! {
            <a class="explorer-link" href={url.to_string()} target="_blank" rel="noopener noreferrer">
                {format!("View {hash:?} on explorer")}
            </a>
        })
    });

    html! {
        <div class="erc20approve">
            <SearchInput label="Token(ERC20) address" loading={busy} on_search={on_token_search} />
            <SearchInput
                label="Spender(Smart Contract) address"
                loading={busy}
                on_search={on_spender_search}
            />
            <Statistic title="Token(ERC20)" value={symbol.clone()} />
            <Statistic title="Spender(Smart Contract)" value={spender_address} />
            <Statistic title="Allowance" value={allowance} />
            <div class="amount">
                <span class="addon">{"Amount to approve"}</span>
                <input
                    type="number"
                    min="0"
                    value={(*amount).clone()}
                    oninput={on_amount}
                    disabled={token.is_none() || spender.is_none() || busy}
                />
                <span class="suffix">{symbol}</span>
            </div>
            <button class="button" onclick={on_approve} disabled={busy}>{"APPROVE"}</button>
            {explorer}
        </div>
    }
}
