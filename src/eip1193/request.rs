use crate::eip1193::error::Eip1193Error;
use serde::Serialize;
use serde_json::Value;
use serde_wasm_bindgen::Serializer;
use wasm_bindgen::JsValue;

/// MetaMask takes an options object instead of a params array for this one
const WATCH_ASSET_METHOD: &str = "wallet_watchAsset";

/// `{ method, params }` payload handed to `window.ethereum.request`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub(crate) struct Eip1193Request {
    method: String,
    params: Value,
}

impl Eip1193Request {
    pub(crate) fn new<T: Serialize>(method: &str, params: T) -> Result<Self, Eip1193Error> {
        let params = normalize_params(method, serde_json::to_value(params)?);
        Ok(Self { method: method.to_string(), params })
    }

    pub(crate) fn method(&self) -> &str {
        &self.method
    }

    pub(crate) fn params(&self) -> &Value {
        &self.params
    }

    pub(crate) fn to_js(&self) -> Result<JsValue, Eip1193Error> {
        self.serialize(&Serializer::json_compatible())
            .map_err(|e| Eip1193Error::JsValueError(e.to_string()))
    }
}

/// Shapes params the way injected wallets accept them.
///
/// Anything that is not an array becomes an empty array, except for
/// `wallet_watchAsset`. Typed transactions serialized with a zero padded
/// `type` (`0x02`) are rewritten to `0x2`, which MetaMask insists on.
fn normalize_params(method: &str, params: Value) -> Value {
    match params {
        Value::Null => Value::Array(Vec::new()),
        params if method == WATCH_ASSET_METHOD => params,
        Value::Array(items) => Value::Array(items.into_iter().map(normalize_tx_type).collect()),
        _ => Value::Array(Vec::new()),
    }
}

fn normalize_tx_type(mut item: Value) -> Value {
    if let Some(Value::String(tx_type)) = item.get_mut("type") {
        let fixed = match tx_type.as_str() {
            "0x01" => Some("0x1"),
            "0x02" => Some("0x2"),
            "0x03" => Some("0x3"),
            _ => None,
        };
        if let Some(fixed) = fixed {
            *tx_type = fixed.to_string();
        }
    }
    item
}

#[cfg(test)]
mod tests {
    use super::*;
    use ethers::types::H160;
    use serde::Deserialize;
    use serde_json::json;
    use std::str::FromStr;

    #[derive(Serialize, Deserialize)]
    struct UnsupportedParamsStruct {
        field1: String,
        field2: i32,
    }

    #[test]
    fn unit_params_become_empty_array() {
        let request = Eip1193Request::new("eth_accounts", ()).unwrap();
        assert_eq!(request.method(), "eth_accounts");
        assert_eq!(request.params(), &json!([]));
    }

    #[test]
    fn struct_params_become_empty_array() {
        let params = UnsupportedParamsStruct { field1: "test".to_string(), field2: 123 };
        let request = Eip1193Request::new("wrong_method", params).unwrap();
        assert_eq!(request.params(), &json!([]));
    }

    #[test]
    fn array_params_are_passed_through() {
        let params = vec![
            H160::from_str("0x0000000000000000000000000000000000000001").unwrap(),
            H160::from_str("0x0000000000000000000000000000000000000002").unwrap(),
        ];
        let request = Eip1193Request::new("correct_method", params).unwrap();
        assert_eq!(
            request.params(),
            &json!([
                "0x0000000000000000000000000000000000000001",
                "0x0000000000000000000000000000000000000002"
            ])
        );
    }

    #[test]
    fn watch_asset_keeps_its_options_object() {
        let params = json!({
            "type": "ERC20",
            "options": { "address": "0x0000000000000000000000000000000000000001" },
        });
        let request = Eip1193Request::new("wallet_watchAsset", params.clone()).unwrap();
        assert_eq!(request.params(), &params);
    }

    #[test]
    fn zero_padded_tx_types_are_trimmed() {
        for i in 1..4 {
            let params = json!([{ "type": format!("0x0{i}"), "value": "0x10" }]);
            let request = Eip1193Request::new("eth_sendTransaction", params).unwrap();
            assert_eq!(request.params(), &json!([{ "type": format!("0x{i}"), "value": "0x10" }]));
        }
    }

    #[test]
    fn unknown_tx_types_are_left_alone() {
        let params = json!([{ "type": "0x00" }, "latest"]);
        let request = Eip1193Request::new("eth_call", params.clone()).unwrap();
        assert_eq!(request.params(), &params);
    }
}

#[cfg(test)]
#[cfg(target_arch = "wasm32")]
mod wasm_tests {
    use super::*;
    use wasm_bindgen::JsCast;
    use wasm_bindgen_test::*;

    #[wasm_bindgen_test]
    fn request_becomes_plain_js_object() {
        let request = Eip1193Request::new("eth_chainId", ()).unwrap();
        let js = request.to_js().unwrap();
        assert!(js.is_object());

        let method = js_sys::Reflect::get(&js, &JsValue::from_str("method")).unwrap();
        assert_eq!(method.as_string().unwrap(), "eth_chainId");

        let params = js_sys::Reflect::get(&js, &JsValue::from_str("params")).unwrap();
        let params = params.dyn_into::<js_sys::Array>().unwrap();
        assert_eq!(params.length(), 0);
    }
}
