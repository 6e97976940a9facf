#![allow(dead_code)]

use std::io::Read;
use std::sync::{Arc, Mutex};
use std::thread;

use alloy::primitives::Address;
use serde_json::{json, Value};
use tiny_http::{Response, Server, StatusCode};

use nexus_deployer_adapters::{DeployerConfig, Eip1193Adapter};
use nexus_deployer_core::{ClockPort, PortError};

/// Clock that never blocks; sleeping only advances virtual time.
#[derive(Debug, Default)]
pub struct TestClock {
    now: std::sync::atomic::AtomicU64,
}

impl ClockPort for TestClock {
    fn now_ms(&self) -> Result<u64, PortError> {
        Ok(1_739_750_400_000 + self.now.load(std::sync::atomic::Ordering::SeqCst))
    }

    async fn sleep_ms(&self, ms: u64) {
        self.now.fetch_add(ms, std::sync::atomic::Ordering::SeqCst);
    }
}

pub fn owner_address() -> Address {
    "0x1000000000000000000000000000000000000001"
        .parse()
        .expect("valid owner address")
}

pub fn proxy_adapter(base_url: String) -> Eip1193Adapter {
    Eip1193Adapter::with_config(DeployerConfig {
        eip1193_proxy_url: Some(base_url),
        request_timeout_ms: 5_000,
        ..DeployerConfig::default()
    })
}

/// What the mock node answers for one method.
pub type Handler = Box<dyn Fn(&Value) -> Result<Value, Value> + Send>;

/// JSON-RPC node on a random local port. Each request's method name is
/// recorded; unknown methods get `-32601`.
pub fn spawn_rpc_server(
    routes: Vec<(&'static str, Handler)>,
    calls: Arc<Mutex<Vec<String>>>,
    max_requests: usize,
) -> (String, thread::JoinHandle<()>) {
    let server = Server::http("127.0.0.1:0").expect("start server");
    let addr = format!("http://{}", server.server_addr());

    let join = thread::spawn(move || {
        for _ in 0..max_requests {
            let mut req = match server.recv() {
                Ok(r) => r,
                Err(_) => break,
            };
            let mut body = String::new();
            if req.as_reader().read_to_string(&mut body).is_err() {
                break;
            }
            let request: Value = serde_json::from_str(&body).unwrap_or(Value::Null);
            let method = request["method"].as_str().unwrap_or_default().to_owned();
            if let Ok(mut g) = calls.lock() {
                g.push(method.clone());
            }

            let outcome = routes
                .iter()
                .find(|(name, _)| *name == method)
                .map(|(_, handler)| handler(&request["params"]))
                .unwrap_or_else(|| {
                    Err(json!({
                        "code": -32601,
                        "message": format!("the method {method} does not exist/is not available"),
                    }))
                });
            let payload = match outcome {
                Ok(result) => json!({ "jsonrpc": "2.0", "id": request["id"], "result": result }),
                Err(error) => json!({ "jsonrpc": "2.0", "id": request["id"], "error": error }),
            };
            let response =
                Response::from_string(payload.to_string()).with_status_code(StatusCode(200));
            let _ = req.respond(response);
        }
    });

    (addr, join)
}

pub fn handler(f: impl Fn(&Value) -> Result<Value, Value> + Send + 'static) -> Handler {
    Box::new(f)
}

pub fn fixed(value: Value) -> Handler {
    handler(move |_: &Value| Ok(value.clone()))
}

pub fn failing(error: Value) -> Handler {
    handler(move |_: &Value| Err(error.clone()))
}
