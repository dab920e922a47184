use std::future::Future;
use std::path::PathBuf;
use std::time::Duration;

use tracing::debug;

use crate::asset::AssetRef;
use crate::decode::{DecodedImage, decode_image};

/// Tests whether a reference can be loaded.
///
/// Resolves to the reference itself on success and to `None` when it cannot be
/// loaded. Failure is the normal answer for a candidate that does not exist, so
/// implementations never return errors and never retry.
pub trait Prober {
    fn probe(&self, reference: &AssetRef) -> impl Future<Output = Option<AssetRef>> + Send;
}

/// Probes references relative to an asset root on the local filesystem.
///
/// A probe reads the whole file and decodes it as an image, so a file that exists
/// but is truncated or is not an image counts as absent.
#[derive(Debug, Clone)]
pub struct FsProber {
    root: PathBuf,
}

impl FsProber {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn resolve(&self, reference: &AssetRef) -> PathBuf {
        self.root.join(reference.as_str())
    }
}

impl FsProber {
    /// Reads and decodes `reference`. Decoding runs on the blocking pool.
    pub async fn load(&self, reference: &AssetRef) -> Option<DecodedImage> {
        let path = self.resolve(reference);
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) => {
                debug!(%reference, error = %e, "probe: unreadable");
                return None;
            }
        };

        match tokio::task::spawn_blocking(move || decode_image(&bytes)).await {
            Ok(Ok(image)) => Some(image),
            Ok(Err(e)) => {
                debug!(%reference, error = %e, "probe: not a decodable image");
                None
            }
            Err(e) => {
                debug!(%reference, error = %e, "probe: decode task failed");
                None
            }
        }
    }
}

impl Prober for FsProber {
    async fn probe(&self, reference: &AssetRef) -> Option<AssetRef> {
        self.load(reference).await.map(|_| reference.clone())
    }
}

/// Runs one probe, treating it as absent if it has not settled within `timeout`.
pub async fn probe_with_timeout<P: Prober>(
    prober: &P,
    reference: &AssetRef,
    timeout: Duration,
) -> Option<AssetRef> {
    match tokio::time::timeout(timeout, prober.probe(reference)).await {
        Ok(result) => result,
        Err(_) => {
            debug!(%reference, ?timeout, "probe: timed out");
            None
        }
    }
}
