use std::time::Duration;

use tokio::time::{sleep, Instant};
use tracing::{debug, warn};

use crate::config::ScrapingConfig;
use crate::fetcher::DocumentProbe;
use crate::models::Result;

/// Textual anchors whose presence means the facility page has started
/// rendering real content. The page exposes no reliable "loaded" event, so a
/// disjunctive match over several plausible anchors is the best signal we get.
const DEFAULT_ANCHORS: [&str; 3] = ["Contact information", "Business number", "Facility details"];

#[derive(Debug, Clone)]
pub struct ReadinessConfig {
    pub budget: Duration,
    pub poll_interval: Duration,
    pub settle_delay: Duration,
    pub anchors: Vec<String>,
}

impl ReadinessConfig {
    pub fn from_scraping(config: &ScrapingConfig) -> Self {
        Self {
            budget: Duration::from_secs(config.wait_budget_secs),
            poll_interval: Duration::from_millis(config.poll_interval_ms),
            settle_delay: Duration::from_secs(config.settle_delay_secs),
            anchors: DEFAULT_ANCHORS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// What the wait observed. Timeout is a normal outcome, recorded in
/// `content_detected` and never surfaced as an error; the pipeline proceeds
/// with whatever markup the last snapshot returned.
#[derive(Debug)]
pub struct ReadinessReport {
    pub content_detected: bool,
    pub waited: Duration,
    pub markup: String,
}

/// Poll the page until one of the anchors appears or the budget runs out,
/// then hold for the settle delay either way. One anchor being present does
/// not guarantee sibling fields have rendered, hence the trailing settle.
///
/// Only a probe that never yields a single readable snapshot is an error;
/// that is a collaborator failure, not a timeout.
pub async fn wait_for_content(
    probe: &dyn DocumentProbe,
    config: &ReadinessConfig,
) -> Result<ReadinessReport> {
    let start = Instant::now();
    let mut detected = false;
    let mut markup: Option<String> = None;
    let mut last_error: Option<String> = None;

    loop {
        match probe.snapshot().await {
            Ok(body) => {
                if config.anchors.iter().any(|a| body.contains(a.as_str())) {
                    detected = true;
                    markup = Some(body);
                    debug!("Content detected after {:?}", start.elapsed());
                    break;
                }
                markup = Some(body);
            }
            Err(e) => {
                warn!("Snapshot failed while waiting for content: {}", e);
                last_error = Some(e.to_string());
            }
        }

        let elapsed = start.elapsed();
        if elapsed >= config.budget {
            debug!("Wait budget of {:?} exhausted, proceeding anyway", config.budget);
            break;
        }
        sleep((config.budget - elapsed).min(config.poll_interval)).await;
    }

    let waited = start.elapsed();

    let markup = match markup {
        Some(m) => m,
        None => {
            let reason = last_error.unwrap_or_else(|| "no snapshot available".to_string());
            return Err(format!("page never became readable: {}", reason).into());
        }
    };

    // Let asynchronous sub-renders finish before the snapshot is handed on.
    sleep(config.settle_delay).await;

    Ok(ReadinessReport {
        content_detected: detected,
        waited,
        markup,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Yields `pending` until `appears_after` snapshots have been taken, then
    /// a body containing a readiness anchor.
    struct ScriptedProbe {
        calls: AtomicUsize,
        appears_after: usize,
    }

    #[async_trait]
    impl DocumentProbe for ScriptedProbe {
        async fn snapshot(&self) -> Result<String> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            if n >= self.appears_after {
                Ok("<html>Contact information ...</html>".to_string())
            } else {
                Ok("<html>loading</html>".to_string())
            }
        }
    }

    struct BrokenProbe;

    #[async_trait]
    impl DocumentProbe for BrokenProbe {
        async fn snapshot(&self) -> Result<String> {
            Err("connection refused".into())
        }
    }

    fn config(budget_s: u64, poll_ms: u64, settle_s: u64) -> ReadinessConfig {
        ReadinessConfig {
            budget: Duration::from_secs(budget_s),
            poll_interval: Duration::from_millis(poll_ms),
            settle_delay: Duration::from_secs(settle_s),
            anchors: DEFAULT_ANCHORS.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn returns_after_signal_plus_settle() {
        let probe = ScriptedProbe {
            calls: AtomicUsize::new(0),
            appears_after: 2,
        };
        let start = Instant::now();
        let report = wait_for_content(&probe, &config(30, 1000, 5)).await.unwrap();

        assert!(report.content_detected);
        // Anchor appeared on the third snapshot, i.e. after two poll sleeps.
        assert_eq!(report.waited, Duration::from_secs(2));
        // Total wall time includes the settle delay.
        assert_eq!(start.elapsed(), Duration::from_secs(7));
    }

    #[tokio::test(start_paused = true)]
    async fn exhausts_budget_without_signal() {
        let probe = ScriptedProbe {
            calls: AtomicUsize::new(0),
            appears_after: usize::MAX,
        };
        let report = wait_for_content(&probe, &config(3, 1000, 1)).await.unwrap();

        assert!(!report.content_detected);
        assert_eq!(report.waited, Duration::from_secs(3));
        assert!(report.markup.contains("loading"));
    }

    #[tokio::test(start_paused = true)]
    async fn unreadable_page_is_an_error() {
        let result = wait_for_content(&BrokenProbe, &config(2, 1000, 1)).await;
        assert!(result.is_err());
    }
}
