//! Process-backed proxy engine: spawns an external Xray-compatible binary
//! with the generated configuration and supervises the child process.

use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tk_types::{EngineError, ProxyEngine, TrafficSnapshot};
use tokio::process::{Child, Command};
use tracing::{info, warn};

/// How long to wait after spawn before declaring the start good. Bad configs
/// make the engine exit within this window.
const STARTUP_GRACE: Duration = Duration::from_millis(600);

pub struct ProcessEngine {
    binary: PathBuf,
    config_path: PathBuf,
    child: Mutex<Option<Child>>,
}

impl ProcessEngine {
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
            config_path: std::env::temp_dir().join("tunkit-engine.json"),
            child: Mutex::new(None),
        }
    }
}

#[async_trait]
impl ProxyEngine for ProcessEngine {
    async fn start(&self, config: serde_json::Value) -> Result<(), EngineError> {
        if self.is_running() {
            self.stop().await?;
        }

        tokio::fs::write(&self.config_path, config.to_string())
            .await
            .map_err(|e| EngineError::start(format!("write config: {e}")))?;

        let mut child = Command::new(&self.binary)
            .arg("run")
            .arg("-c")
            .arg(&self.config_path)
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| EngineError::start(format!("spawn {}: {e}", self.binary.display())))?;

        // Catch configs the engine rejects at boot.
        tokio::time::sleep(STARTUP_GRACE).await;
        match child.try_wait() {
            Ok(Some(status)) => {
                return Err(EngineError::start(format!(
                    "engine exited during startup: {status}"
                )));
            }
            Ok(None) => {}
            Err(e) => return Err(EngineError::start(format!("probe child: {e}"))),
        }

        info!(binary = %self.binary.display(), "engine process started");
        *self.child.lock() = Some(child);
        Ok(())
    }

    async fn stop(&self) -> Result<(), EngineError> {
        let child = self.child.lock().take();
        if let Some(mut child) = child {
            if let Err(e) = child.kill().await {
                warn!(error = %e, "engine kill failed");
                return Err(EngineError::stop(e.to_string()));
            }
            info!("engine process stopped");
        }
        Ok(())
    }

    fn is_running(&self) -> bool {
        let mut guard = self.child.lock();
        match guard.as_mut() {
            Some(child) => match child.try_wait() {
                Ok(None) => true,
                // Exited or unobservable: drop the handle either way.
                _ => {
                    *guard = None;
                    false
                }
            },
            None => false,
        }
    }

    /// The bare process exposes no stats API; counters stay at zero.
    fn traffic(&self) -> TrafficSnapshot {
        TrafficSnapshot::default()
    }
}
