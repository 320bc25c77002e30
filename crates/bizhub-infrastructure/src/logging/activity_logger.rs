// ============================================================================
// BizHub Infrastructure - Activity Logger
// File: crates/bizhub-infrastructure/src/logging/activity_logger.rs
// Description: Queue-backed ActivityRecorder; workers batch inserts into activity_logs
// ============================================================================

use flume::{bounded, Receiver, Sender, TrySendError};
use sqlx::{PgPool, Postgres, QueryBuilder};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::{debug, error, info, warn};

use bizhub_core::domain::ActivityLog;
use bizhub_core::repositories::ActivityRecorder;
use bizhub_shared::config::ActivityLogSettings;

/// Logger configuration
#[derive(Debug, Clone)]
pub struct LoggerConfig {
    /// Entries held in memory before new ones are dropped
    pub queue_capacity: usize,

    /// Rows per INSERT
    pub batch_size: usize,

    /// Max wait before a partial batch is flushed (milliseconds)
    pub batch_timeout_ms: u64,

    pub worker_count: usize,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            queue_capacity: 10_000,
            batch_size: 100,
            batch_timeout_ms: 1000,
            worker_count: 2,
        }
    }
}

impl From<&ActivityLogSettings> for LoggerConfig {
    fn from(settings: &ActivityLogSettings) -> Self {
        if settings.worker_count == 0 {
            warn!("activity_log.worker_count is 0, running 1 worker so entries are written");
        }
        Self {
            queue_capacity: settings.queue_capacity.max(1),
            batch_size: settings.batch_size.max(1),
            batch_timeout_ms: settings.batch_timeout_ms,
            worker_count: settings.worker_count.max(1),
        }
    }
}

/// Fire-and-forget activity logger. Cloning shares the queue.
#[derive(Clone)]
pub struct ActivityLogger {
    sender: Sender<ActivityLog>,
}

/// Handles to the insert workers, used to drain the queue on shutdown.
/// Dropping it also stops the workers, without waiting for them.
pub struct ActivityLogWorkers {
    stop: watch::Sender<bool>,
    handles: Vec<JoinHandle<()>>,
}

impl ActivityLogWorkers {
    /// Tells every worker to flush what is queued and waits for them to exit.
    /// Call before closing the pool.
    pub async fn shutdown(self) {
        info!("Stopping {} activity log workers", self.handles.len());
        self.stop.send_replace(true);
        for handle in self.handles {
            if let Err(e) = handle.await {
                error!("Activity log worker ended abnormally: {}", e);
            }
        }
    }
}

impl ActivityLogger {
    /// Creates the queue and spawns `worker_count` insert workers.
    /// Must be called inside a Tokio runtime when `worker_count > 0`.
    pub fn new(pool: PgPool, config: LoggerConfig) -> (Self, ActivityLogWorkers) {
        let (sender, receiver) = bounded(config.queue_capacity);
        let (stop, stop_rx) = watch::channel(false);

        info!(
            "Initializing ActivityLogger: queue={}, batch={}, timeout={}ms, workers={}",
            config.queue_capacity, config.batch_size, config.batch_timeout_ms, config.worker_count
        );

        let handles = (0..config.worker_count)
            .map(|worker_id| {
                let pool = pool.clone();
                let receiver = receiver.clone();
                let stop_rx = stop_rx.clone();
                let config = config.clone();

                tokio::spawn(async move {
                    Self::worker_loop(worker_id, pool, receiver, stop_rx, config).await;
                })
            })
            .collect();

        (Self { sender }, ActivityLogWorkers { stop, handles })
    }

    /// Enqueue without waiting. A full queue drops the entry with a warning.
    pub fn log(&self, activity: ActivityLog) {
        match self.sender.try_send(activity) {
            Ok(()) => {}
            Err(TrySendError::Full(dropped)) => {
                warn!(
                    "Activity log queue full, dropping {} on {}",
                    dropped.action, dropped.entity_type
                );
            }
            Err(TrySendError::Disconnected(dropped)) => {
                error!("Activity log queue closed, dropping {}", dropped.action);
            }
        }
    }

    async fn worker_loop(
        worker_id: usize,
        pool: PgPool,
        receiver: Receiver<ActivityLog>,
        mut stop: watch::Receiver<bool>,
        config: LoggerConfig,
    ) {
        info!("Activity log worker {} started", worker_id);

        let mut batch: Vec<ActivityLog> = Vec::with_capacity(config.batch_size);
        let batch_timeout = Duration::from_millis(config.batch_timeout_ms);

        loop {
            let deadline = tokio::time::Instant::now() + batch_timeout;

            while batch.len() < config.batch_size {
                tokio::select! {
                    biased;
                    // stop requested or the handle was dropped: take what is left and exit
                    _ = stop.changed() => {
                        batch.extend(receiver.drain());
                        for chunk in batch.chunks(config.batch_size) {
                            Self::flush_batch(&pool, chunk, worker_id).await;
                        }
                        info!("Activity log worker {} shutting down", worker_id);
                        return;
                    }
                    received = tokio::time::timeout_at(deadline, receiver.recv_async()) => match received {
                        Ok(Ok(entry)) => batch.push(entry),
                        Ok(Err(_)) => {
                            // Channel closed, flush and exit
                            if !batch.is_empty() {
                                Self::flush_batch(&pool, &batch, worker_id).await;
                            }
                            info!("Activity log worker {} shutting down", worker_id);
                            return;
                        }
                        Err(_) => break,
                    },
                }
            }

            if !batch.is_empty() {
                Self::flush_batch(&pool, &batch, worker_id).await;
                batch.clear();
            } else {
                sleep(Duration::from_millis(100)).await;
            }
        }
    }

    async fn flush_batch(pool: &PgPool, batch: &[ActivityLog], worker_id: usize) {
        let start = std::time::Instant::now();

        match Self::insert_batch(pool, batch).await {
            Ok(inserted) => {
                debug!(
                    "Worker {} inserted {} activity logs in {:?}",
                    worker_id,
                    inserted,
                    start.elapsed()
                );
            }
            Err(e) => {
                error!("Worker {} failed to insert {} activity logs: {}", worker_id, batch.len(), e);
            }
        }
    }

    fn batch_query(logs: &[ActivityLog]) -> QueryBuilder<'_, Postgres> {
        let mut query_builder = QueryBuilder::new(
            "INSERT INTO activity_logs (id, action, entity_type, entity_id, details, severity, user_id, created_at) ",
        );

        query_builder.push_values(logs, |mut b, log| {
            b.push_bind(log.id)
                .push_bind(&log.action)
                .push_bind(&log.entity_type)
                .push_bind(&log.entity_id)
                .push_bind(&log.details)
                .push_bind(log.severity.as_str())
                .push_bind(log.user_id)
                .push_bind(log.created_at);
        });
        query_builder
    }

    async fn insert_batch(pool: &PgPool, logs: &[ActivityLog]) -> Result<u64, sqlx::Error> {
        let mut query_builder = Self::batch_query(logs);
        let result = query_builder.build().execute(pool).await?;
        Ok(result.rows_affected())
    }

    /// Entries waiting to be written
    pub fn queue_len(&self) -> usize {
        self.sender.len()
    }

    pub fn is_queue_full(&self) -> bool {
        self.sender.is_full()
    }
}

impl ActivityRecorder for ActivityLogger {
    fn record(&self, entry: ActivityLog) {
        self.log(entry);
    }
}
