//! Environment loading.
//!
//! The shell polls an [`EnvironmentSource`] once per frame and mounts no
//! scene until it reports [`LoadStatus::Ready`]. No retries, no timeouts.

use std::path::PathBuf;

use demo_shared::resources::{load_environment, EnvironmentMap};
use tokio::sync::oneshot::{self, error::TryRecvError};
use tracing::info;

/// Progress of an environment load.
#[derive(Debug, Clone, PartialEq)]
pub enum LoadStatus {
    Pending,
    Ready(EnvironmentMap),
    Failed(String),
}

pub trait EnvironmentSource {
    /// Preset being loaded.
    fn preset(&self) -> &str;
    fn poll(&mut self) -> LoadStatus;
}

/// An environment that is already resolved.
#[derive(Debug, Clone)]
pub struct Preloaded {
    preset: String,
    status: LoadStatus,
}

impl Preloaded {
    pub fn ready(env: EnvironmentMap) -> Self {
        Self {
            preset: env.preset.clone(),
            status: LoadStatus::Ready(env),
        }
    }

    pub fn failed(preset: &str, reason: impl Into<String>) -> Self {
        Self {
            preset: preset.to_string(),
            status: LoadStatus::Failed(reason.into()),
        }
    }

    /// A built-in preset, or a failure if the name is unknown.
    pub fn builtin(preset: &str) -> Self {
        match EnvironmentMap::builtin(preset) {
            Some(env) => Self::ready(env),
            None => Self::failed(preset, format!("unknown environment preset '{preset}'")),
        }
    }
}

impl EnvironmentSource for Preloaded {
    fn preset(&self) -> &str {
        &self.preset
    }

    fn poll(&mut self) -> LoadStatus {
        self.status.clone()
    }
}

/// An environment delivered later over a oneshot channel.
#[derive(Debug)]
pub struct BackgroundLoad {
    preset: String,
    rx: oneshot::Receiver<anyhow::Result<EnvironmentMap>>,
}

impl BackgroundLoad {
    /// A load completed by whoever holds the returned sender.
    pub fn channel(preset: &str) -> (Self, oneshot::Sender<anyhow::Result<EnvironmentMap>>) {
        let (tx, rx) = oneshot::channel();
        (
            Self {
                preset: preset.to_string(),
                rx,
            },
            tx,
        )
    }

    /// Reads the preset on the blocking pool of `runtime`.
    pub fn spawn(runtime: &tokio::runtime::Handle, assets_dir: PathBuf, preset: &str) -> Self {
        let (load, tx) = Self::channel(preset);
        let name = preset.to_string();
        runtime.spawn_blocking(move || {
            let result = load_environment(&assets_dir, &name);
            info!(preset = %name, ok = result.is_ok(), "Environment load finished");
            // The shell may be gone already; nothing to report then.
            let _ = tx.send(result);
        });
        load
    }
}

impl EnvironmentSource for BackgroundLoad {
    fn preset(&self) -> &str {
        &self.preset
    }

    fn poll(&mut self) -> LoadStatus {
        match self.rx.try_recv() {
            Ok(Ok(env)) => LoadStatus::Ready(env),
            Ok(Err(e)) => LoadStatus::Failed(format!("{e:#}")),
            Err(TryRecvError::Empty) => LoadStatus::Pending,
            Err(TryRecvError::Closed) => {
                LoadStatus::Failed("environment loader exited without a result".to_string())
            }
        }
    }
}
