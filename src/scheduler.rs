//! Top-level Scheduler: classifies the catalog into priority/rotation
//! classes, computes the three connections' initial subscription plan, and
//! launches a Rotation Worker per connection that needs one.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::task::JoinHandle;

use crate::config::Config;
use crate::error::Result;
use crate::rotation::RotationWorker;
use crate::supervisor::{ConnectionRole, ConnectionSupervisor};
use crate::types::enums::{Mode, Segment};
use crate::types::instrument::Instrument;

/// The immutable output of [`plan`]: each connection's starting
/// subscription set.
#[derive(Debug, Clone, Default)]
pub struct SubscriptionPlan {
    /// Connection #1's permanent set — the priority class, capped to `N`
    /// ids if priority overflowed capacity.
    pub permanent: Vec<u32>,
    /// Each connection's rotation queue, indexed `[conn1, conn2, conn3]`.
    /// Connection #1's queue (`L`) may be empty.
    pub rotation: [Vec<u32>; 3],
}

/// Partition the catalog by segment into the priority and rotation classes.
/// Catalog order is preserved; segments outside both classes are dropped.
pub fn classify(catalog: &[Instrument]) -> (Vec<u32>, Vec<u32>) {
    let mut priority = Vec::new();
    let mut rotation = Vec::new();
    for instrument in catalog {
        match instrument.segment {
            Segment::INDICES | Segment::NFO_FUT => priority.push(instrument.instrument_id),
            Segment::NSE | Segment::NFO_OPT => rotation.push(instrument.instrument_id),
            Segment::Other => {}
        }
    }
    (priority, rotation)
}

/// Compute the subscription plan for a catalog, given the maximum
/// instruments per connection `n`.
pub fn plan(catalog: &[Instrument], n: usize) -> SubscriptionPlan {
    let (priority, mut rotation) = classify(catalog);

    let (permanent, l) = if priority.len() <= n {
        let leftover = n - priority.len();
        let take = leftover.min(rotation.len());
        let l: Vec<u32> = rotation.drain(0..take).collect();
        (priority, l)
    } else {
        let mut permanent = priority;
        let overflow = permanent.split_off(n);
        let mut promoted = overflow;
        promoted.extend(rotation);
        rotation = promoted;
        (permanent, Vec::new())
    };

    let mid = rotation.len() / 2;
    let r2 = rotation[..mid].to_vec();
    let r3 = rotation[mid..].to_vec();

    SubscriptionPlan {
        permanent,
        rotation: [l, r2, r3],
    }
}

/// Bring up the three connections per their planned subscription sets and
/// launch a Rotation Worker for every connection with a non-empty rotation
/// queue. Returns the spawned workers' task handles.
pub async fn run(
    catalog: &[Instrument],
    supervisor: Arc<ConnectionSupervisor>,
    config: &Config,
) -> Result<Vec<JoinHandle<()>>> {
    let subscription_plan = plan(catalog, config.symbols_per_connection);
    let by_id: Arc<HashMap<u32, Instrument>> = Arc::new(
        catalog
            .iter()
            .map(|i| (i.instrument_id, i.clone()))
            .collect(),
    );

    let mut workers = Vec::new();

    for (idx, rotation_queue) in subscription_plan.rotation.iter().enumerate() {
        let conn_id = (idx + 1) as u8;
        let role = if conn_id == 1 {
            ConnectionRole::Priority
        } else {
            ConnectionRole::Rotation
        };

        let initial_ids: Vec<u32> = if conn_id == 1 {
            subscription_plan
                .permanent
                .iter()
                .chain(rotation_queue.iter())
                .copied()
                .collect()
        } else {
            rotation_queue
                .iter()
                .take(config.symbols_per_connection)
                .copied()
                .collect()
        };

        if initial_ids.is_empty() {
            continue;
        }

        let handle = supervisor.ensure(conn_id, role).await?;
        let instruments: Vec<Instrument> = initial_ids
            .iter()
            .filter_map(|id| by_id.get(id).cloned())
            .collect();
        handle.lock().await.subscribe(&instruments, Mode::Full).await?;

        if !rotation_queue.is_empty() {
            let permanent = if conn_id == 1 {
                subscription_plan.permanent.clone()
            } else {
                Vec::new()
            };
            let worker = RotationWorker::with_tunables(
                conn_id,
                permanent,
                rotation_queue.clone(),
                by_id.clone(),
                config.symbols_per_connection,
                config.rotation_stride,
                config.cycle_interval,
                config.inter_command_gap,
            );
            let supervisor = supervisor.clone();
            workers.push(tokio::spawn(worker.run(supervisor)));
        }
    }

    Ok(workers)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::enums::Exchange;

    fn instrument(id: u32, segment: Segment) -> Instrument {
        Instrument::new(id, format!("SYM{id}"), Exchange::NSE, segment)
    }

    #[test]
    fn classifies_priority_and_rotation_segments_preserving_order() {
        let catalog = vec![
            instrument(1, Segment::INDICES),
            instrument(2, Segment::NSE),
            instrument(3, Segment::NFO_FUT),
            instrument(4, Segment::Other),
            instrument(5, Segment::NFO_OPT),
        ];
        let (priority, rotation) = classify(&catalog);
        assert_eq!(priority, vec![1, 3]);
        assert_eq!(rotation, vec![2, 5]);
    }

    #[test]
    fn leftover_capacity_becomes_connection_one_rotation_queue() {
        let catalog: Vec<Instrument> = (1..=2)
            .map(|id| instrument(id, Segment::INDICES))
            .chain((3..=7).map(|id| instrument(id, Segment::NSE)))
            .collect();
        let result = plan(&catalog, 4);
        assert_eq!(result.permanent, vec![1, 2]);
        // leftover = 4 - 2 = 2, so only the first two rotation ids join L
        assert_eq!(result.rotation[0], vec![3, 4]);
        // the remaining rotation ids (5, 6, 7) split across conn 2/3
        assert_eq!(result.rotation[1], vec![5]);
        assert_eq!(result.rotation[2], vec![6, 7]);
    }

    #[test]
    fn priority_overflow_is_promoted_to_rotation() {
        let catalog: Vec<Instrument> = (1..=3)
            .map(|id| instrument(id, Segment::INDICES))
            .chain(std::iter::once(instrument(4, Segment::NSE)))
            .collect();
        let result = plan(&catalog, 2);
        // only the first 2 priority ids fit; id 3 is demoted ahead of the
        // existing rotation id 4
        assert_eq!(result.permanent, vec![1, 2]);
        assert!(result.rotation[0].is_empty());
        assert_eq!(result.rotation[1], vec![3]);
        assert_eq!(result.rotation[2], vec![4]);
    }

    #[test]
    fn rotation_halves_give_extra_id_to_second_half() {
        let catalog: Vec<Instrument> = (1..=5).map(|id| instrument(id, Segment::NSE)).collect();
        // n=0 forces all rotation ids past connection #1's leftover (none)
        let result = plan(&catalog, 0);
        assert!(result.rotation[0].is_empty());
        assert_eq!(result.rotation[1], vec![1, 2]);
        assert_eq!(result.rotation[2], vec![3, 4, 5]);
    }
}
