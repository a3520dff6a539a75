//! Rotation Worker: cycles rotation-class instruments through the capacity
//! left over after a connection's permanent (priority) set.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;

use crate::constants::{CYCLE_INTERVAL, INTER_COMMAND_GAP, ROTATION_STRIDE, SYMBOLS_PER_CONNECTION};
use crate::error::RelayError;
use crate::supervisor::{ConnectionRole, ConnectionSupervisor};
use crate::types::enums::Mode;
use crate::types::instrument::Instrument;

/// Clamp `stride` to make progress against a queue of length `queue_len`:
/// the stride must be strictly less than the queue length, so a stride at
/// or past the queue length falls back to `queue_len - 1` (or `1` for very
/// short queues).
fn effective_stride(stride: usize, queue_len: usize) -> usize {
    if queue_len == 0 {
        return 0;
    }
    if stride >= queue_len {
        (queue_len - 1).max(1)
    } else {
        stride
    }
}

/// Drives one connection's rotation cycle: unsubscribe the previous batch,
/// advance the cyclic queue, subscribe the permanent set plus the new
/// batch, sleep, repeat.
pub struct RotationWorker {
    id: u8,
    permanent: Vec<u32>,
    queue: VecDeque<u32>,
    last_rotation_batch: Vec<u32>,
    catalog: Arc<HashMap<u32, Instrument>>,
    capacity_window: usize,
    stride: usize,
    cycle_interval: Duration,
    inter_command_gap: Duration,
}

impl RotationWorker {
    /// Construct a worker for connection `id` with the given permanent set
    /// and rotation queue. `catalog` resolves instrument ids to full
    /// records for the wire-level subscribe/unsubscribe calls. Falls back
    /// to the compiled-in defaults in [`crate::constants`]; use
    /// [`RotationWorker::with_tunables`] to honor environment overrides.
    pub fn new(
        id: u8,
        permanent: Vec<u32>,
        queue: Vec<u32>,
        catalog: Arc<HashMap<u32, Instrument>>,
    ) -> Self {
        Self::with_tunables(
            id,
            permanent,
            queue,
            catalog,
            SYMBOLS_PER_CONNECTION,
            ROTATION_STRIDE,
            CYCLE_INTERVAL,
            INTER_COMMAND_GAP,
        )
    }

    /// Construct a worker with explicit (possibly environment-overridden)
    /// tunables, as supplied by [`crate::config::Config`].
    #[allow(clippy::too_many_arguments)]
    pub fn with_tunables(
        id: u8,
        permanent: Vec<u32>,
        queue: Vec<u32>,
        catalog: Arc<HashMap<u32, Instrument>>,
        symbols_per_connection: usize,
        stride: usize,
        cycle_interval: Duration,
        inter_command_gap: Duration,
    ) -> Self {
        Self {
            id,
            capacity_window: symbols_per_connection.saturating_sub(permanent.len()),
            permanent,
            queue: queue.into(),
            last_rotation_batch: Vec::new(),
            catalog,
            stride,
            cycle_interval,
            inter_command_gap,
        }
    }

    /// Run the rotation loop until the supervisor signals shutdown.
    pub async fn run(mut self, supervisor: Arc<ConnectionSupervisor>) {
        loop {
            if supervisor.is_shutting_down() {
                tracing::info!(connection = self.id, "rotation worker exiting on shutdown");
                return;
            }

            let handle = match supervisor.ensure(self.id, ConnectionRole::Rotation).await {
                Ok(handle) => handle,
                Err(RelayError::ShuttingDown) => return,
                Err(e) => {
                    tracing::warn!(connection = self.id, error = %e, "ensure failed, retrying next cycle");
                    tokio::time::sleep(self.cycle_interval).await;
                    continue;
                }
            };

            let capacity = self.capacity_window;
            if capacity == 0 || self.queue.is_empty() {
                tokio::time::sleep(self.cycle_interval).await;
                continue;
            }
            if self.queue.len() <= capacity {
                tokio::time::sleep(self.cycle_interval).await;
                continue;
            }

            if !self.last_rotation_batch.is_empty() {
                let outgoing = self.resolve(&self.last_rotation_batch);
                let mut conn = handle.lock().await;
                if let Err(e) = conn.unsubscribe(&outgoing, Mode::Full).await {
                    tracing::warn!(connection = self.id, error = %e, "unsubscribe failed, continuing cycle");
                }
                drop(conn);
                tokio::time::sleep(self.inter_command_gap).await;
            }

            let stride = effective_stride(self.stride, self.queue.len());
            self.queue.rotate_left(stride);

            let window = capacity.min(self.queue.len());
            let new_batch: Vec<u32> = self.queue.iter().take(window).copied().collect();

            let mut incoming = self.resolve(&self.permanent);
            incoming.extend(self.resolve(&new_batch));
            {
                let mut conn = handle.lock().await;
                if let Err(e) = conn.subscribe(&incoming, Mode::Full).await {
                    tracing::warn!(connection = self.id, error = %e, "subscribe failed, continuing cycle");
                }
            }
            self.last_rotation_batch = new_batch;

            if supervisor.is_shutting_down() {
                tracing::info!(connection = self.id, "rotation worker exiting on shutdown");
                return;
            }
            tokio::time::sleep(self.cycle_interval).await;
        }
    }

    fn resolve(&self, ids: &[u32]) -> Vec<Instrument> {
        ids.iter()
            .filter_map(|id| self.catalog.get(id).cloned())
            .collect()
    }
}
