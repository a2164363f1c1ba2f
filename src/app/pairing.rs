use crate::{hooks::use_wallet, wallet_links::deep_links};
use log::error;
use qrcode_generator::QrCodeEcc;
use yew::prelude::*;

/// PNG data URL with the QR code of `content`
pub fn qr_data_url(content: &str) -> Option<String> {
    match qrcode_generator::to_png_to_vec(content, QrCodeEcc::Low, 512) {
        Ok(png) => Some(format!("data:image/png;base64,{}", data_encoding::BASE64.encode(&png))),
        Err(err) => {
            error!("Cannot render pairing QR code: {err}");
            None
        }
    }
}

/// WalletConnect pairing: QR code for desktop, deep links for mobile
#[function_component(PairingView)]
pub fn pairing_view() -> Html {
    let ethereum = use_wallet();
    let pairing_url = ethereum.pairing_url();

    let code = use_memo(pairing_url.clone(), |url| url.as_deref().and_then(qr_data_url));

    let Some(url) = pairing_url else {
        return html! {};
    };

    let links = deep_links(&url)
        .into_iter()
        .map(|(wallet, link)| {
            html! { <a class="wallet-link" href={link.to_string()}>{wallet.to_string()}</a> }
        })
        .collect::<Html>();

    html! {
        <div class="pairing">
            <p>{"Scan with a WalletConnect compatible wallet"}</p>
            if let Some(src) = (*code).clone() {
                <img class="qr" src={src} alt="WalletConnect pairing code" />
            }
            <div class="wallet-links">{links}</div>
        </div>
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn qr_is_a_png_data_url() {
        let url = qr_data_url("wc:abc@2?relay-protocol=irn&symKey=00").unwrap();
        let payload = url.strip_prefix("data:image/png;base64,").unwrap();
        let png = data_encoding::BASE64.decode(payload.as_bytes()).unwrap();
        assert_eq!(&png[..8], b"\x89PNG\r\n\x1a\n");
    }
}
