//! Reachability probe run before a browser is launched for a target
//!
//! One bounded request per target. A target that does not answer is reported
//! as unreachable straight away; the probe never retries.

use std::time::Duration;

use tracing::{info, warn};

use crate::error::{VerifyError, VerifyResult};

#[derive(Debug, Clone)]
pub struct PreflightConfig {
    pub request_timeout: Duration,
}

impl Default for PreflightConfig {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(10),
        }
    }
}

/// Probe the front office once; any non-server-error status counts as reachable
pub async fn probe(url: &str, config: &PreflightConfig) -> VerifyResult<()> {
    let client = reqwest::Client::builder()
        .timeout(config.request_timeout)
        .build()?;

    match client.get(url).send().await {
        Ok(resp) if !resp.status().is_server_error() => {
            info!("Target answered {} at {}", resp.status(), url);
            return Ok(());
        }
        Ok(resp) => warn!("Probe of {} returned {}", url, resp.status()),
        Err(e) => warn!("Probe of {} failed: {}", url, e),
    }

    Err(VerifyError::Unreachable {
        url: url.to_string(),
        attempts: 1,
    })
}
