use crate::hooks::use_notify;
use yew::prelude::*;

#[function_component(NotificationBanner)]
pub fn notification_banner() -> Html {
    let notify = use_notify();

    let Some(notification) = notify.current().cloned() else {
        return html! {};
    };

    let onclick = {
        let notify = notify.clone();
        Callback::from(move |_: MouseEvent| notify.clear())
    };

    html! {
        <div class={classes!("notify", format!("notify--{}", notification.status))} role="alert">
            <strong class="notify-title">{&notification.title}</strong>
            if let Some(description) = &notification.description {
                <p class="notify-description">{description}</p>
            }
            <button class="notify-close" {onclick}>{"×"}</button>
        </div>
    }
}
