//! Tiered recognition dispatch.
//!
//! Lines are routed to one of three recognizer tiers from their complexity
//! estimate. The cheaper tiers run first; a line whose text comes back at or
//! above the tier's length limit is handed to the next tier instead of being
//! accepted. The largest tier never escalates. Results are merged back into
//! reading order with a stable sort on `order_index`.
//!
//! A failing recognizer call is retried within the same tier
//! ([`CascadeConfig::retries`] times). If it still fails the line degrades to
//! empty text and the batch continues; dispatch itself never fails. A panic
//! inside a recognizer counts as a failed call.

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::document::line::LineRegion;
use crate::inference::worker_pool::WorkerPool;
use crate::inference::{InferenceError, Recognizer};

/// Recognizer capability level, in increasing cost and capacity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    Small,
    Medium,
    Large,
}

impl Tier {
    /// Tiers in cascade order.
    pub const ALL: [Tier; 3] = [Tier::Small, Tier::Medium, Tier::Large];

    #[inline]
    pub fn index(self) -> usize {
        match self {
            Tier::Small => 0,
            Tier::Medium => 1,
            Tier::Large => 2,
        }
    }

    /// The tier a line moves to when its output is too long for this one.
    #[inline]
    pub fn escalate(self) -> Option<Tier> {
        match self {
            Tier::Small => Some(Tier::Medium),
            Tier::Medium => Some(Tier::Large),
            Tier::Large => None,
        }
    }

    /// Initial tier for a line with the given complexity estimate.
    ///
    /// With `cascade` disabled every line goes to [`Tier::Large`]. Estimates
    /// that match neither configured class, including non-finite ones, also
    /// go to [`Tier::Large`].
    pub fn route(complexity: f32, config: &CascadeConfig, cascade: bool) -> Tier {
        if !cascade || !complexity.is_finite() {
            return Tier::Large;
        }
        if complexity == config.small_class {
            Tier::Small
        } else if complexity == config.medium_class {
            Tier::Medium
        } else {
            Tier::Large
        }
    }
}

impl std::fmt::Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Tier::Small => "small",
            Tier::Medium => "medium",
            Tier::Large => "large",
        };
        f.write_str(name)
    }
}

/// Routing classes, escalation limits and retry policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CascadeConfig {
    /// Complexity estimate routed to [`Tier::Small`]
    pub small_class: f32,

    /// Complexity estimate routed to [`Tier::Medium`]
    pub medium_class: f32,

    /// Small-tier outputs with at least this many characters escalate
    pub small_max_chars: usize,

    /// Medium-tier outputs with at least this many characters escalate
    pub medium_max_chars: usize,

    /// Extra attempts after a failed recognizer call, on the same tier
    pub retries: usize,
}

impl Default for CascadeConfig {
    fn default() -> Self {
        Self {
            small_class: 3.0,
            medium_class: 2.0,
            small_max_chars: 25,
            medium_max_chars: 45,
            retries: 1,
        }
    }
}

impl CascadeConfig {
    /// Output length at which a tier's result is rejected, if the tier has one.
    pub fn max_chars(&self, tier: Tier) -> Option<usize> {
        match tier {
            Tier::Small => Some(self.small_max_chars),
            Tier::Medium => Some(self.medium_max_chars),
            Tier::Large => None,
        }
    }
}

/// One recognizer per tier.
#[derive(Clone)]
pub struct RecognizerTiers {
    small: Arc<dyn Recognizer>,
    medium: Arc<dyn Recognizer>,
    large: Arc<dyn Recognizer>,
}

impl RecognizerTiers {
    pub fn new(
        small: Arc<dyn Recognizer>,
        medium: Arc<dyn Recognizer>,
        large: Arc<dyn Recognizer>,
    ) -> Self {
        Self {
            small,
            medium,
            large,
        }
    }

    pub fn get(&self, tier: Tier) -> &dyn Recognizer {
        match tier {
            Tier::Small => self.small.as_ref(),
            Tier::Medium => self.medium.as_ref(),
            Tier::Large => self.large.as_ref(),
        }
    }
}

/// Lines with their final text, in reading order.
#[derive(Debug)]
pub struct DispatchOutcome {
    pub lines: Vec<LineRegion>,
    /// Lines whose every recognition attempt failed.
    pub failed: usize,
    /// Number of times a line moved up a tier.
    pub escalations: usize,
}

impl DispatchOutcome {
    pub fn texts(&self) -> Vec<String> {
        self.lines
            .iter()
            .map(|line| line.recognized_text().unwrap_or_default().to_string())
            .collect()
    }

    pub fn into_texts(self) -> Vec<String> {
        self.lines.into_iter().map(LineRegion::into_text).collect()
    }

    pub fn all_failed(&self) -> bool {
        !self.lines.is_empty() && self.failed == self.lines.len()
    }
}

pub struct CascadeDispatcher {
    tiers: RecognizerTiers,
    pool: Arc<WorkerPool>,
    config: CascadeConfig,
}

impl CascadeDispatcher {
    pub fn new(tiers: RecognizerTiers, pool: Arc<WorkerPool>, config: CascadeConfig) -> Self {
        Self {
            tiers,
            pool,
            config,
        }
    }

    pub fn config(&self) -> &CascadeConfig {
        &self.config
    }

    /// Recognizes every line and returns them sorted by `order_index`.
    ///
    /// Each tier's batch runs on the worker pool and finishes before the next
    /// tier starts, so escalated lines join the next batch.
    pub fn dispatch(&self, lines: Vec<LineRegion>, cascade: bool) -> DispatchOutcome {
        let total = lines.len();
        let mut pending: [Vec<LineRegion>; 3] = [Vec::new(), Vec::new(), Vec::new()];

        for line in lines {
            let tier = Tier::route(line.complexity, &self.config, cascade);
            pending[tier.index()].push(line);
        }

        debug!(
            "Routed {} lines: small={}, medium={}, large={}",
            total,
            pending[0].len(),
            pending[1].len(),
            pending[2].len()
        );

        let mut accepted = Vec::with_capacity(total);
        let mut failed = 0;
        let mut escalations = 0;

        for tier in Tier::ALL {
            let batch = std::mem::take(&mut pending[tier.index()]);
            if batch.is_empty() {
                continue;
            }

            debug!("Recognizing {} lines on the {} tier", batch.len(), tier);
            let results = self.pool.map(&batch, |line| self.read_with_retry(tier, line));

            for (mut line, result) in batch.into_iter().zip(results) {
                match result {
                    Ok(text) => {
                        let next = self
                            .config
                            .max_chars(tier)
                            .filter(|&limit| text.chars().count() >= limit)
                            .and(tier.escalate());

                        match next {
                            Some(next) => {
                                debug!(
                                    "Line {} escalated from {} to {} tier",
                                    line.order_index, tier, next
                                );
                                escalations += 1;
                                pending[next.index()].push(line);
                            }
                            None => {
                                line.accept(text);
                                accepted.push(line);
                            }
                        }
                    }
                    Err(_) => {
                        failed += 1;
                        line.accept_failure();
                        accepted.push(line);
                    }
                }
            }
        }

        accepted.sort_by_key(|line| line.order_index);

        DispatchOutcome {
            lines: accepted,
            failed,
            escalations,
        }
    }

    fn read_with_retry(&self, tier: Tier, line: &LineRegion) -> Result<String, InferenceError> {
        let recognizer = self.tiers.get(tier);
        let attempts = self.config.retries + 1;
        let mut attempt = 1;

        loop {
            match read_guarded(recognizer, line) {
                Ok(text) => return Ok(text),
                Err(e) if attempt < attempts => {
                    warn!(
                        "Recognition of line {} failed on the {} tier (attempt {}/{}), retrying: {}",
                        line.order_index, tier, attempt, attempts, e
                    );
                    attempt += 1;
                }
                Err(e) => {
                    warn!(
                        "Recognition of line {} failed on the {} tier after {} attempts: {}",
                        line.order_index, tier, attempts, e
                    );
                    return Err(e);
                }
            }
        }
    }
}

/// Runs one recognizer call, turning a panic into a per-line error.
fn read_guarded(recognizer: &dyn Recognizer, line: &LineRegion) -> Result<String, InferenceError> {
    panic::catch_unwind(AssertUnwindSafe(|| recognizer.read(&line.image))).unwrap_or_else(
        |payload| {
            let message = if let Some(message) = payload.downcast_ref::<&str>() {
                (*message).to_string()
            } else if let Some(message) = payload.downcast_ref::<String>() {
                message.clone()
            } else {
                "unknown panic".to_string()
            };
            Err(InferenceError::RecognizerPanic { message })
        },
    )
}
