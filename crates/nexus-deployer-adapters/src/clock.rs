use nexus_deployer_core::{ClockPort, PortError};

#[derive(Debug, Clone, Default)]
pub struct SystemClockAdapter;

impl ClockPort for SystemClockAdapter {
    fn now_ms(&self) -> Result<u64, PortError> {
        let now = web_time::SystemTime::now()
            .duration_since(web_time::UNIX_EPOCH)
            .map_err(|e| PortError::Transport(format!("time error: {e}")))?;
        Ok(now.as_millis() as u64)
    }

    async fn sleep_ms(&self, ms: u64) {
        #[cfg(not(target_arch = "wasm32"))]
        tokio::time::sleep(std::time::Duration::from_millis(ms)).await;

        #[cfg(target_arch = "wasm32")]
        if let Err(e) = browser_sleep(ms).await {
            tracing::warn!("setTimeout unavailable: {e}");
        }
    }
}

#[cfg(target_arch = "wasm32")]
async fn browser_sleep(ms: u64) -> Result<(), PortError> {
    let window =
        web_sys::window().ok_or_else(|| PortError::Transport("missing window".to_owned()))?;
    let delay = i32::try_from(ms).unwrap_or(i32::MAX);
    let mut scheduled = Ok(());
    let promise = js_sys::Promise::new(&mut |resolve, _reject| {
        scheduled = window
            .set_timeout_with_callback_and_timeout_and_arguments_0(&resolve, delay)
            .map(|_| ());
    });
    scheduled.map_err(|e| PortError::Transport(format!("setTimeout failed: {e:?}")))?;
    wasm_bindgen_futures::JsFuture::from(promise)
        .await
        .map(|_| ())
        .map_err(|e| PortError::Transport(format!("timer rejected: {e:?}")))
}
