//! Transfer queue fed by the completion hook.
//!
//! Jobs are numbered from 1 and handled one at a time by a single worker
//! task. A job looks its torrent up again and, when the options name a
//! `moveto` directory, moves the torrent's storage there.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tokio::sync::{mpsc, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::torrent_client::{TorrentClient, TorrentClientError};

#[derive(Debug, Error)]
pub enum TransferError {
    #[error("Invalid job options: {0}")]
    InvalidOptions(String),
}

/// Options sent along with a job.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferOptions {
    /// Directory to move the torrent's storage into.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub moveto: Option<String>,
}

impl TransferOptions {
    /// `null` and booleans (hooks send `false`) mean no options.
    pub fn from_value(value: &Value) -> Result<Self, TransferError> {
        match value {
            Value::Null | Value::Bool(_) => Ok(Self::default()),
            Value::Object(_) => serde_json::from_value(value.clone())
                .map_err(|e| TransferError::InvalidOptions(e.to_string())),
            other => Err(TransferError::InvalidOptions(format!(
                "expected an object, got {}",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum JobState {
    Queued,
    Running,
    Done,
    Failed { reason: String },
}

impl JobState {
    pub fn is_finished(&self) -> bool {
        matches!(self, JobState::Done | JobState::Failed { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransferJob {
    pub id: u64,
    pub thash: String,
    pub opts: TransferOptions,
    #[serde(flatten)]
    pub state: JobState,
}

/// In-memory job queue shared by the daemon's handlers and its worker.
pub struct TransferQueue {
    last_id: AtomicU64,
    jobs: RwLock<BTreeMap<u64, TransferJob>>,
    tx: mpsc::UnboundedSender<u64>,
    /// Taken by the worker when it starts.
    rx: Mutex<Option<mpsc::UnboundedReceiver<u64>>>,
}

impl Default for TransferQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl TransferQueue {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            last_id: AtomicU64::new(0),
            jobs: RwLock::new(BTreeMap::new()),
            tx,
            rx: Mutex::new(Some(rx)),
        }
    }

    /// Record a job and hand it to the worker. Returns the job id.
    pub async fn enqueue(&self, thash: impl Into<String>, opts: TransferOptions) -> u64 {
        let id = self.last_id.fetch_add(1, Ordering::SeqCst) + 1;
        let thash = thash.into();
        self.jobs.write().await.insert(
            id,
            TransferJob {
                id,
                thash: thash.clone(),
                opts,
                state: JobState::Queued,
            },
        );

        if self.tx.send(id).is_err() {
            warn!(job = id, "Transfer worker is gone; job stays queued");
        }
        info!(job = id, %thash, "Enqueued transfer job");
        id
    }

    pub async fn job(&self, id: u64) -> Option<TransferJob> {
        self.jobs.read().await.get(&id).cloned()
    }

    /// All known jobs, oldest first.
    pub async fn jobs(&self) -> Vec<TransferJob> {
        self.jobs.read().await.values().cloned().collect()
    }

    /// Spawn the worker. Only the first call starts one; later calls return `None`.
    pub fn start(self: &Arc<Self>, client: Arc<dyn TorrentClient>) -> Option<JoinHandle<()>> {
        let taken = self.rx.lock().ok().and_then(|mut rx| rx.take());
        let Some(mut rx) = taken else {
            warn!("Transfer worker already running");
            return None;
        };

        let queue = Arc::clone(self);
        Some(tokio::spawn(async move {
            info!(backend = client.name(), "Transfer worker started");
            while let Some(id) = rx.recv().await {
                queue.run(id, client.as_ref()).await;
            }
            info!("Transfer worker stopped");
        }))
    }

    async fn run(&self, id: u64, client: &dyn TorrentClient) {
        let Some(job) = self.set_state(id, JobState::Running).await else {
            return;
        };

        let state = match process(&job, client).await {
            Ok(()) => JobState::Done,
            Err(e) => {
                warn!(job = id, thash = %job.thash, error = %e, "Transfer job failed");
                JobState::Failed {
                    reason: e.to_string(),
                }
            }
        };
        self.set_state(id, state).await;
    }

    async fn set_state(&self, id: u64, state: JobState) -> Option<TransferJob> {
        let mut jobs = self.jobs.write().await;
        let job = jobs.get_mut(&id)?;
        job.state = state;
        Some(job.clone())
    }
}

async fn process(job: &TransferJob, client: &dyn TorrentClient) -> Result<(), TorrentClientError> {
    let info = client.get_torrent(&job.thash).await?;
    debug!(job = job.id, name = %info.name, "Processing transfer job");

    if let Some(dest) = &job.opts.moveto {
        client.move_torrent(&info.hash, dest).await?;
        info!(job = job.id, name = %info.name, dest = %dest, "Moved torrent storage");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{fixtures::torrent_info, MockTorrentClient};
    use serde_json::json;
    use std::time::Duration;

    async fn finished(queue: &TransferQueue, id: u64) -> TransferJob {
        tokio::time::timeout(Duration::from_secs(5), async {
            loop {
                if let Some(job) = queue.job(id).await.filter(|j| j.state.is_finished()) {
                    return job;
                }
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .expect("job did not finish")
    }

    #[test]
    fn test_options_from_value() {
        assert_eq!(
            TransferOptions::from_value(&json!(false)).unwrap(),
            TransferOptions::default()
        );
        assert_eq!(
            TransferOptions::from_value(&Value::Null).unwrap(),
            TransferOptions::default()
        );
        assert_eq!(
            TransferOptions::from_value(&json!({"moveto": "/srv/done"}))
                .unwrap()
                .moveto
                .as_deref(),
            Some("/srv/done")
        );
        assert!(TransferOptions::from_value(&json!("/srv")).is_err());
        assert!(TransferOptions::from_value(&json!({"moveto": 7})).is_err());
    }

    #[tokio::test]
    async fn test_ids_start_at_one() {
        let queue = TransferQueue::new();
        assert_eq!(queue.enqueue("a", TransferOptions::default()).await, 1);
        assert_eq!(queue.enqueue("b", TransferOptions::default()).await, 2);

        let jobs = queue.jobs().await;
        assert_eq!(jobs.len(), 2);
        assert!(jobs.iter().all(|j| j.state == JobState::Queued));
    }

    #[tokio::test]
    async fn test_worker_moves_storage() {
        let client = Arc::new(MockTorrentClient::new());
        client.insert(torrent_info("abc", 1)).await;
        let queue = Arc::new(TransferQueue::new());
        queue
            .start(Arc::clone(&client) as Arc<dyn TorrentClient>)
            .unwrap();

        let opts = TransferOptions {
            moveto: Some("/srv/done".to_string()),
        };
        let id = queue.enqueue("ABC", opts).await;

        assert_eq!(finished(&queue, id).await.state, JobState::Done);
        assert_eq!(
            client.moves().await,
            vec![("abc".to_string(), "/srv/done".to_string())]
        );
    }

    #[tokio::test]
    async fn test_unknown_torrent_fails_job() {
        let client = Arc::new(MockTorrentClient::new());
        let queue = Arc::new(TransferQueue::new());
        queue
            .start(Arc::clone(&client) as Arc<dyn TorrentClient>)
            .unwrap();

        let id = queue.enqueue("missing", TransferOptions::default()).await;

        let job = finished(&queue, id).await;
        assert!(matches!(job.state, JobState::Failed { .. }));
        assert!(client.moves().await.is_empty());
    }

    #[tokio::test]
    async fn test_worker_starts_once() {
        let client: Arc<dyn TorrentClient> = Arc::new(MockTorrentClient::new());
        let queue = Arc::new(TransferQueue::new());
        assert!(queue.start(Arc::clone(&client)).is_some());
        assert!(queue.start(client).is_none());
    }

    #[test]
    fn test_job_serializes_state_inline() {
        let job = TransferJob {
            id: 3,
            thash: "abc".to_string(),
            opts: TransferOptions::default(),
            state: JobState::Failed {
                reason: "gone".to_string(),
            },
        };
        assert_eq!(
            serde_json::to_value(&job).unwrap(),
            json!({"id": 3, "thash": "abc", "opts": {}, "state": "failed", "reason": "gone"})
        );
    }
}
