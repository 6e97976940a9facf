//! `window.ethereum` bindings for the wasm32 build.

use alloy::primitives::Address;
use serde_json::Value;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::{JsCast, JsValue};

use nexus_deployer_core::domain::{Injected, InjectedProvider, ProviderFlags};
use nexus_deployer_core::events::ReleaseFn;
use nexus_deployer_core::rpc::parse_chain_id_str;
use nexus_deployer_core::{EventHub, InjectionSurface, PortError, WalletEvent};

use crate::eip1193::Eip1193Adapter;

type Listener = Closure<dyn FnMut(JsValue)>;

#[derive(Debug, Clone)]
pub struct BrowserRuntime {
    provider: JsValue,
}

impl BrowserRuntime {
    /// The root `window.ethereum` object.
    pub fn root() -> Result<Self, PortError> {
        window_ethereum().map(|provider| Self { provider })
    }

    pub async fn request(&self, method: &str, params: Value) -> Result<Value, PortError> {
        let request_fn = get_prop(&self.provider, "request")
            .ok()
            .and_then(|v| v.dyn_into::<js_sys::Function>().ok())
            .ok_or(PortError::NotImplemented(
                "window.ethereum.request is unavailable",
            ))?;

        let request = serde_json::json!({
            "method": method,
            "params": params,
        });
        let request_js = serde_wasm_bindgen::to_value(&request)
            .map_err(|e| PortError::Transport(format!("failed to encode wasm request: {e}")))?;
        let promise_js = request_fn.call1(&self.provider, &request_js).map_err(js_error)?;
        let promise = promise_js.dyn_into::<js_sys::Promise>().map_err(|_| {
            PortError::Transport("provider request did not return Promise".to_owned())
        })?;
        let result_js = wasm_bindgen_futures::JsFuture::from(promise)
            .await
            .map_err(js_error)?;
        if result_js.is_undefined() {
            return Ok(Value::Null);
        }
        serde_wasm_bindgen::from_value(result_js)
            .map_err(|e| PortError::Transport(format!("failed to decode wasm response: {e}")))
    }

    /// Registers `accountsChanged`, `chainChanged` and `disconnect` listeners
    /// that forward into `hub`. The returned release removes them again.
    pub fn register_listeners(&self, hub: EventHub) -> Result<ReleaseFn, PortError> {
        let on_fn = function(&self.provider, "on")
            .or_else(|| function(&self.provider, "addListener"))
            .ok_or(PortError::NotImplemented(
                "provider does not expose on/addListener",
            ))?;

        let accounts_hub = hub.clone();
        let accounts_cb = Listener::new(move |value: JsValue| {
            let mut accounts = Vec::new();
            if js_sys::Array::is_array(&value) {
                for item in js_sys::Array::from(&value).iter() {
                    match item.as_string().map(|raw| raw.parse::<Address>()) {
                        Some(Ok(addr)) => accounts.push(addr),
                        _ => tracing::warn!("ignoring malformed account in accountsChanged"),
                    }
                }
            }
            accounts_hub.publish(WalletEvent::AccountsChanged(accounts));
        });

        let chain_hub = hub.clone();
        let chain_cb = Listener::new(move |value: JsValue| match js_chain_id(&value) {
            Ok(chain_id) => {
                chain_hub.publish(WalletEvent::ChainChanged(chain_id));
            }
            Err(e) => tracing::warn!("ignoring malformed chainChanged payload: {e}"),
        });

        let disconnect_cb = Listener::new(move |_: JsValue| {
            hub.publish(WalletEvent::Disconnect);
        });

        let listeners = vec![
            ("accountsChanged", accounts_cb),
            ("chainChanged", chain_cb),
            ("disconnect", disconnect_cb),
        ];
        for (name, cb) in &listeners {
            on_fn
                .call2(
                    &self.provider,
                    &JsValue::from_str(name),
                    cb.as_ref().unchecked_ref(),
                )
                .map_err(|e| PortError::Transport(format!("register {name} failed: {e:?}")))?;
        }

        let provider = self.provider.clone();
        Ok(Box::new(move || {
            let Some(remove_fn) = function(&provider, "removeListener") else {
                return Err(PortError::NotImplemented(
                    "provider does not expose removeListener",
                ));
            };
            for (name, cb) in &listeners {
                remove_fn
                    .call2(&provider, &JsValue::from_str(name), cb.as_ref().unchecked_ref())
                    .map_err(|e| PortError::Transport(format!("remove {name} failed: {e:?}")))?;
            }
            drop(listeners);
            Ok(())
        }))
    }
}

/// Reads `window.ethereum` and, when present, `window.ethereum.providers`.
#[derive(Debug, Clone, Default)]
pub struct BrowserSurface;

impl InjectionSurface for BrowserSurface {
    type Provider = Eip1193Adapter;

    async fn probe(&self) -> Option<Injected<Eip1193Adapter>> {
        let root = window_ethereum().ok()?;
        let siblings = get_prop(&root, "providers")
            .ok()
            .filter(js_sys::Array::is_array)
            .map(|list| {
                js_sys::Array::from(&list)
                    .iter()
                    .filter(|p| p.is_object())
                    .map(injected)
                    .collect()
            })
            .unwrap_or_default();
        Some(Injected {
            root: injected(root),
            siblings,
        })
    }
}

fn injected(provider: JsValue) -> InjectedProvider<Eip1193Adapter> {
    let flags = ProviderFlags {
        is_metamask: flag(&provider, "isMetaMask"),
        is_coinbase_wallet: flag(&provider, "isCoinbaseWallet"),
        is_rabby: flag(&provider, "isRabby"),
        is_zerion: flag(&provider, "isZerion"),
    };
    InjectedProvider {
        provider: Eip1193Adapter::browser(BrowserRuntime { provider }),
        flags,
    }
}

fn flag(target: &JsValue, key: &str) -> bool {
    get_prop(target, key)
        .ok()
        .and_then(|v| v.as_bool())
        .unwrap_or(false)
}

fn window_ethereum() -> Result<JsValue, PortError> {
    let window =
        web_sys::window().ok_or_else(|| PortError::Transport("missing window".to_owned()))?;
    let provider = get_prop(&window.into(), "ethereum")?;
    if provider.is_null() || provider.is_undefined() {
        return Err(PortError::ProviderMissing("window.ethereum missing".to_owned()));
    }
    Ok(provider)
}

fn function(target: &JsValue, key: &str) -> Option<js_sys::Function> {
    get_prop(target, key)
        .ok()
        .and_then(|v| v.dyn_into::<js_sys::Function>().ok())
}

fn get_prop(target: &JsValue, key: &str) -> Result<JsValue, PortError> {
    js_sys::Reflect::get(target, &JsValue::from_str(key))
        .map_err(|e| PortError::Transport(format!("read provider property {key} failed: {e:?}")))
}

fn js_chain_id(value: &JsValue) -> Result<u64, PortError> {
    if let Some(s) = value.as_string() {
        return parse_chain_id_str(&s);
    }
    if let Some(num) = value.as_f64() {
        return Ok(num as u64);
    }
    Err(PortError::Validation("invalid JS chain id".to_owned()))
}

/// Provider rejections carry `{ code, message, data }`.
fn js_error(err: JsValue) -> PortError {
    let code = get_prop(&err, "code")
        .ok()
        .and_then(|v| v.as_f64())
        .map(|c| c as i64);
    let message = get_prop(&err, "message")
        .ok()
        .and_then(|v| v.as_string())
        .unwrap_or_else(|| format!("{err:?}"));
    let data = get_prop(&err, "data")
        .ok()
        .filter(|v| !v.is_null() && !v.is_undefined())
        .and_then(|v| serde_wasm_bindgen::from_value(v).ok());
    match code {
        Some(code) => PortError::Rpc {
            code,
            message,
            data,
        },
        None => PortError::Transport(format!("provider request rejected: {message}")),
    }
}
