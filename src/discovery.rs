use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use crate::asset::{AssetRef, CandidateReference};
use crate::constants::*;
use crate::prober::{Prober, probe_with_timeout};

/// Bounds of the candidate space walked by [`discover`].
#[derive(Debug, Clone, PartialEq)]
pub struct DiscoveryParams {
    pub max_index: u32,
    pub extensions: Vec<String>,
    pub base_path: String,
    pub probe_timeout: Duration,
}

impl Default for DiscoveryParams {
    fn default() -> Self {
        Self {
            max_index: MAX_CANDIDATE_INDEX,
            extensions: CANDIDATE_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
            base_path: BASE_PATH.to_string(),
            probe_timeout: Duration::from_millis(PROBE_TIMEOUT_MS),
        }
    }
}

/// Every candidate for `1..=max_index`, index-major, extensions in declaration order.
pub fn candidates(params: &DiscoveryParams) -> Vec<CandidateReference<'_>> {
    let mut out = Vec::with_capacity(params.max_index as usize * params.extensions.len());
    for index in 1..=params.max_index {
        for extension in &params.extensions {
            out.push(CandidateReference {
                base_path: params.base_path.as_str(),
                index,
                extension: extension.as_str(),
            });
        }
    }
    out
}

/// Probes the whole candidate space and returns the references that loaded.
///
/// Every probe is spawned before any is awaited, so discovery takes about as
/// long as the slowest probe. Results are joined in candidate order, which
/// makes the output independent of completion order. Must be called from
/// within a tokio runtime.
pub async fn discover<P>(prober: Arc<P>, params: &DiscoveryParams) -> Vec<AssetRef>
where
    P: Prober + Send + Sync + 'static,
{
    let timeout = params.probe_timeout;
    let handles: Vec<_> = candidates(params)
        .iter()
        .map(|candidate| {
            let prober = Arc::clone(&prober);
            let reference = candidate.to_asset_ref();
            tokio::spawn(async move { probe_with_timeout(&*prober, &reference, timeout).await })
        })
        .collect();

    let attempted = handles.len();
    let mut seen = HashSet::new();
    let mut found = Vec::new();
    for handle in handles {
        match handle.await {
            Ok(Some(reference)) => {
                if seen.insert(reference.clone()) {
                    found.push(reference);
                }
            }
            Ok(None) => {}
            Err(e) => warn!(error = %e, "probe task did not complete"),
        }
    }

    info!(attempted, found = found.len(), "asset discovery finished");
    found
}
