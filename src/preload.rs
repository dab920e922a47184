use std::sync::Arc;
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::sync::oneshot::{self, error::TryRecvError};
use tracing::debug;

use crate::asset::AssetRef;
use crate::decode::DecodedCache;
use crate::prober::FsProber;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    Loaded,
    Failed,
}

/// A background load the frame loop can check on without blocking.
#[derive(Debug)]
pub struct PendingLoad {
    rx: oneshot::Receiver<LoadOutcome>,
}

impl PendingLoad {
    pub fn channel() -> (oneshot::Sender<LoadOutcome>, Self) {
        let (tx, rx) = oneshot::channel();
        (tx, Self { rx })
    }

    /// A load that has already settled.
    pub fn settled(outcome: LoadOutcome) -> Self {
        let (tx, pending) = Self::channel();
        let _ = tx.send(outcome);
        pending
    }

    /// `None` while still loading. A loader that went away without answering
    /// counts as a failed load.
    pub fn poll(&mut self) -> Option<LoadOutcome> {
        match self.rx.try_recv() {
            Ok(outcome) => Some(outcome),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Closed) => Some(LoadOutcome::Failed),
        }
    }
}

/// Starts loading an asset in the background.
pub trait Preload {
    fn preload(&self, asset: &AssetRef) -> PendingLoad;
}

/// Preloads by reading and decoding the asset on a tokio runtime.
///
/// Decoded pixels go into `cache` before the load reports success, so the
/// renderer finds them there once the carousel swaps the asset in.
pub struct DecodingPreloader {
    handle: Handle,
    prober: Arc<FsProber>,
    cache: DecodedCache,
    timeout: Duration,
}

impl DecodingPreloader {
    pub fn new(handle: Handle, prober: Arc<FsProber>, cache: DecodedCache, timeout: Duration) -> Self {
        Self { handle, prober, cache, timeout }
    }
}

impl Preload for DecodingPreloader {
    fn preload(&self, asset: &AssetRef) -> PendingLoad {
        let (tx, pending) = PendingLoad::channel();
        let prober = Arc::clone(&self.prober);
        let cache = self.cache.clone();
        let asset = asset.clone();
        let timeout = self.timeout;

        self.handle.spawn(async move {
            let outcome = match tokio::time::timeout(timeout, prober.load(&asset)).await {
                Ok(Some(image)) => {
                    cache.insert(asset, image);
                    LoadOutcome::Loaded
                }
                Ok(None) => LoadOutcome::Failed,
                Err(_) => {
                    debug!(%asset, ?timeout, "preload: timed out");
                    LoadOutcome::Failed
                }
            };
            // The controller drops receivers of superseded loads.
            let _ = tx.send(outcome);
        });
        pending
    }
}
