//! Bounded-concurrency batch execution
//!
//! Every item runs through the same async operation. A fixed pool of
//! `max_concurrent` workers pulls item ids from a shared queue, so no more
//! than that many operations are ever in flight. Outcomes are collected
//! over a channel sized to the input and arrive in completion order.
//!
//! Errors and panics are caught at the item boundary. A batch never fails
//! as a whole: it returns exactly one outcome per input item.

use crate::agents::AgentRegistry;
use crate::types::{AgentResult, AppError, Result};
use futures::{stream::FuturesUnordered, FutureExt, StreamExt};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::any::Any;
use std::collections::VecDeque;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Default number of items processed at once
pub const DEFAULT_MAX_CONCURRENT: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BatchStatus {
    Success,
    Error,
}

/// Outcome of a single batch item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchOutcome<T> {
    pub item_id: String,
    pub status: BatchStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> BatchOutcome<T> {
    pub fn success(item_id: String, result: T) -> Self {
        Self {
            item_id,
            status: BatchStatus::Success,
            result: Some(result),
            error: None,
        }
    }

    pub fn error(item_id: String, error: impl Into<String>) -> Self {
        Self {
            item_id,
            status: BatchStatus::Error,
            result: None,
            error: Some(error.into()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == BatchStatus::Success
    }
}

/// All outcomes of one batch run, in completion order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchReport<T> {
    pub outcomes: Vec<BatchOutcome<T>>,
}

impl<T> BatchReport<T> {
    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_success()).count()
    }

    pub fn failed(&self) -> usize {
        self.len() - self.succeeded()
    }

    /// Look up the outcome for an item id
    pub fn get(&self, item_id: &str) -> Option<&BatchOutcome<T>> {
        self.outcomes.iter().find(|o| o.item_id == item_id)
    }

    pub fn errors(&self) -> impl Iterator<Item = &BatchOutcome<T>> {
        self.outcomes.iter().filter(|o| !o.is_success())
    }

    pub fn into_outcomes(self) -> Vec<BatchOutcome<T>> {
        self.outcomes
    }
}

/// Fans items out over an async operation with a hard concurrency cap
#[derive(Debug, Clone)]
pub struct BatchDispatcher {
    max_concurrent: usize,
}

impl Default for BatchDispatcher {
    fn default() -> Self {
        Self {
            max_concurrent: DEFAULT_MAX_CONCURRENT,
        }
    }
}

impl BatchDispatcher {
    /// Create a dispatcher. `max_concurrent` must be at least 1.
    pub fn new(max_concurrent: usize) -> Result<Self> {
        if max_concurrent == 0 {
            return Err(AppError::InvalidInput(
                "max_concurrent must be at least 1".to_string(),
            ));
        }
        Ok(Self { max_concurrent })
    }

    pub fn max_concurrent(&self) -> usize {
        self.max_concurrent
    }

    /// Run `operation` once per item id
    ///
    /// Returns after every item has produced exactly one outcome. An item
    /// whose operation returns `Err` or panics is reported as an error
    /// outcome; siblings are unaffected.
    ///
    /// # Example
    /// ```ignore
    /// let report = dispatcher
    ///     .run(ids, |id| async move { load(&id).await })
    ///     .await;
    /// println!("{} ok, {} failed", report.succeeded(), report.failed());
    /// ```
    pub async fn run<T, F, Fut>(&self, items: Vec<String>, operation: F) -> BatchReport<T>
    where
        F: Fn(String) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let total = items.len();
        let workers = self.max_concurrent.min(total);
        let queue = Mutex::new(VecDeque::from(items));
        // sized to the input so workers never wait on the collector
        let (tx, mut rx) = mpsc::channel(total.max(1));

        tracing::debug!(items = total, workers, "Batch started");

        let pool: FuturesUnordered<_> = (0..workers)
            .map(|worker| {
                let tx = tx.clone();
                let queue = &queue;
                let operation = &operation;
                async move {
                    loop {
                        let next = queue.lock().pop_front();
                        let Some(item_id) = next else {
                            break;
                        };
                        let outcome = run_item(operation, item_id).await;
                        if tx.send(outcome).await.is_err() {
                            break;
                        }
                    }
                    tracing::trace!(worker, "Batch worker drained");
                }
            })
            .collect();
        drop(tx);

        let collect = async {
            let mut outcomes = Vec::with_capacity(total);
            while let Some(outcome) = rx.recv().await {
                outcomes.push(outcome);
            }
            outcomes
        };
        let (_, outcomes) = futures::join!(pool.collect::<Vec<()>>(), collect);

        let report = BatchReport { outcomes };
        tracing::info!(
            items = total,
            succeeded = report.succeeded(),
            failed = report.failed(),
            "Batch finished"
        );
        report
    }

    /// Dispatch each item id to one registered agent
    ///
    /// The id is sent as a JSON string payload. An `AgentResult` with
    /// `success == false` counts as an item error carrying the agent's
    /// error message. Fails up front only if the agent does not exist.
    pub async fn run_agent(
        &self,
        registry: Arc<AgentRegistry>,
        agent_id: &str,
        items: Vec<String>,
    ) -> Result<BatchReport<AgentResult>> {
        if !registry.contains(agent_id) {
            return Err(AppError::NotFound(format!("Agent '{}' not found", agent_id)));
        }

        let report = self
            .run(items, |item_id| {
                let registry = Arc::clone(&registry);
                async move {
                    let result = registry.dispatch(agent_id, Value::String(item_id)).await?;
                    if result.success {
                        Ok(result)
                    } else {
                        Err(AppError::Agent {
                            agent_id: agent_id.to_string(),
                            message: result
                                .error
                                .unwrap_or_else(|| result.message.clone()),
                        })
                    }
                }
            })
            .await;

        Ok(report)
    }
}

/// Run one item, converting errors and panics into an error outcome
async fn run_item<T, F, Fut>(operation: &F, item_id: String) -> BatchOutcome<T>
where
    F: Fn(String) -> Fut,
    Fut: Future<Output = Result<T>>,
{
    match AssertUnwindSafe(operation(item_id.clone())).catch_unwind().await {
        Ok(Ok(value)) => BatchOutcome::success(item_id, value),
        Ok(Err(e)) => {
            tracing::warn!(item_id = %item_id, error = %e, "Batch item failed");
            BatchOutcome::error(item_id, e.to_string())
        }
        Err(panic) => {
            let message = panic_message(panic.as_ref());
            tracing::error!(item_id = %item_id, panic = %message, "Batch item panicked");
            BatchOutcome::error(item_id, format!("Item panicked: {}", message))
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
