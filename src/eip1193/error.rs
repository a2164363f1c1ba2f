use ethers::prelude::{JsonRpcError, ProviderError, RpcError};
use gloo_utils::format::JsValueSerdeExt;
use serde::Deserialize;
use thiserror::Error;
use wasm_bindgen::JsValue;

/// Wallet does not know the chain it was asked to switch to
pub(crate) const UNRECOGNIZED_CHAIN_CODE: i64 = 4902;

/// User rejected the request in the wallet
pub(crate) const USER_REJECTED_CODE: i64 = 4001;

#[derive(Error, Debug)]
/// Error thrown by the injected `window.ethereum` provider
pub enum Eip1193Error {
    /// Thrown if the request failed
    #[error("JsValue error: {0}")]
    JsValueError(String),

    /// Thrown if no window.ethereum is found in DOM
    #[error("No ethereum found")]
    JsNoEthereum,

    #[error("Cannot parse ethereum response")]
    JsParseError,

    #[error(transparent)]
    /// Thrown if the wallet answered with an error object
    JsonRpcError(#[from] JsonRpcError),

    #[error(transparent)]
    /// Serde JSON Error
    SerdeJson(#[from] serde_json::Error),

    #[error("Communication error")]
    CommunicationError,
}

/// Some mobile wallets wrap the real error in `data.originalError`
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct WrappedError {
    original_error: Option<JsonRpcError>,
}

impl Eip1193Error {
    /// Error code reported by the wallet, looking through wrapped errors
    pub fn code(&self) -> Option<i64> {
        match self {
            Eip1193Error::JsonRpcError(e) => {
                let wrapped = e
                    .data
                    .clone()
                    .and_then(|data| serde_json::from_value::<WrappedError>(data).ok())
                    .and_then(|w| w.original_error)
                    .map(|original| original.code);
                Some(wrapped.unwrap_or(e.code))
            }
            _ => None,
        }
    }

    pub fn is_unrecognized_chain(&self) -> bool {
        self.code() == Some(UNRECOGNIZED_CHAIN_CODE)
    }

    pub fn is_user_rejection(&self) -> bool {
        self.code() == Some(USER_REJECTED_CODE)
    }
}

impl RpcError for Eip1193Error {
    fn as_error_response(&self) -> Option<&JsonRpcError> {
        match self {
            Eip1193Error::JsonRpcError(e) => Some(e),
            _ => None,
        }
    }

    fn is_error_response(&self) -> bool {
        self.as_error_response().is_some()
    }

    fn as_serde_error(&self) -> Option<&serde_json::Error> {
        match self {
            Eip1193Error::SerdeJson(e) => Some(e),
            _ => None,
        }
    }

    fn is_serde_error(&self) -> bool {
        self.as_serde_error().is_some()
    }
}

impl From<JsValue> for Eip1193Error {
    fn from(src: JsValue) -> Self {
        if let Ok(message) = src.into_serde::<JsonRpcError>() {
            Eip1193Error::JsonRpcError(message)
        } else {
            Eip1193Error::JsValueError(format!("{:?}", src))
        }
    }
}

impl From<Eip1193Error> for ProviderError {
    fn from(src: Eip1193Error) -> Self {
        ProviderError::JsonRpcClientError(Box::new(src))
    }
}
