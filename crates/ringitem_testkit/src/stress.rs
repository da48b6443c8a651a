//! Stress helpers for the fragment pool and ring buffer.
//!
//! These exercise the hot paths under sustained and concurrent load.

use std::time::{Duration, Instant};

use ringitem_core::{
    FragmentHeader, FragmentPool, ItemType, LockMode, Locked, ReserveConfig, RingItem, WireFormat,
    V11,
};
use ringitem_storage::RingBuffer;

/// Result of a stress test run.
#[derive(Debug, Clone)]
pub struct StressTestResult {
    /// Total operations performed.
    pub total_ops: usize,
    /// Successful operations.
    pub successful_ops: usize,
    /// Failed operations.
    pub failed_ops: usize,
    /// Total duration.
    pub duration: Duration,
    /// Operations per second.
    pub ops_per_second: f64,
}

impl StressTestResult {
    /// Creates a new result.
    pub fn new(successful: usize, failed: usize, duration: Duration) -> Self {
        let total = successful + failed;
        let ops_per_second = if duration.as_secs_f64() > 0.0 {
            total as f64 / duration.as_secs_f64()
        } else {
            0.0
        };

        Self {
            total_ops: total,
            successful_ops: successful,
            failed_ops: failed,
            duration,
            ops_per_second,
        }
    }

    /// Prints a summary of the test.
    pub fn print_summary(&self, name: &str) {
        println!("\n=== {} ===", name);
        println!("Total operations: {}", self.total_ops);
        println!("Successful: {}", self.successful_ops);
        println!("Failed: {}", self.failed_ops);
        println!("Duration: {:?}", self.duration);
        println!("Throughput: {:.2} ops/sec", self.ops_per_second);
    }
}

/// Configuration for stress tests.
#[derive(Debug, Clone)]
pub struct StressConfig {
    /// Number of operations per thread.
    pub operations: usize,
    /// Number of concurrent threads (for concurrent tests).
    pub threads: usize,
    /// Largest fragment payload or item body in bytes.
    pub max_payload: usize,
    /// Ring buffer capacity for ring tests.
    pub ring_capacity: usize,
}

impl Default for StressConfig {
    fn default() -> Self {
        Self {
            operations: 10_000,
            threads: 4,
            max_payload: 4096,
            ring_capacity: 64 * 1024,
        }
    }
}

/// Allocates and releases fragments of cycling sizes on one thread.
pub fn stress_pool_cycle<L: LockMode>(pool: &FragmentPool<L>, config: &StressConfig) -> StressTestResult {
    let start = Instant::now();
    let mut successful = 0usize;
    let mut failed = 0usize;

    for i in 0..config.operations {
        let size = (i * 37) % config.max_payload.max(1);
        let header = FragmentHeader::new(i as u64, 0, size as u32, 0);
        match pool.allocate(&header) {
            Ok(mut fragment) => {
                fragment.payload_mut().fill(i as u8);
                pool.release(fragment);
                successful += 1;
            }
            Err(_) => failed += 1,
        }
    }

    StressTestResult::new(successful, failed, start.elapsed())
}

/// Allocates and releases fragments from several threads sharing one pool.
pub fn stress_pool_concurrent(pool: &FragmentPool<Locked>, config: &StressConfig) -> StressTestResult {
    let start = Instant::now();
    let results: Vec<StressTestResult> = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..config.threads)
            .map(|_| scope.spawn(|| stress_pool_cycle(pool, config)))
            .collect();
        handles
            .into_iter()
            .map(|h| h.join().expect("stress thread panicked"))
            .collect()
    });

    let successful = results.iter().map(|r| r.successful_ops).sum();
    let failed = results.iter().map(|r| r.failed_ops).sum();
    StressTestResult::new(successful, failed, start.elapsed())
}

/// Produces items into a ring and drains them, checking each body.
///
/// Items are built in place when the ring has contiguous room and copied in
/// otherwise, so the run exercises both commit paths across wrap points.
pub fn stress_ring_roundtrip(config: &StressConfig) -> StressTestResult {
    let mut ring = RingBuffer::new(config.ring_capacity);
    let reserve = ReserveConfig::new().slack(32);
    let start = Instant::now();
    let mut successful = 0usize;
    let mut failed = 0usize;

    for i in 0..config.operations {
        let len = (i * 13) % config.max_payload.min(config.ring_capacity / 4).max(1);
        let body = vec![i as u8; len];

        let produced = V11::new_zero_copy(ItemType::PHYSICS_EVENT, len, &mut ring, &reserve)
            .and_then(|mut item| {
                item.append(&body)?;
                item.commit()
            });
        if produced.is_err() {
            failed += 1;
            continue;
        }

        match V11::read_from(&mut ring) {
            Ok(item) if item.body() == body.as_slice() => successful += 1,
            _ => failed += 1,
        }
    }

    StressTestResult::new(successful, failed, start.elapsed())
}

/// Returns `true` if the item was built in place inside `ring`.
pub fn builds_in_place(ring: &mut RingBuffer, len: usize) -> bool {
    RingItem::new_zero_copy(
        ItemType::PHYSICS_EVENT,
        len,
        V11::FRAMING,
        ring,
        &ReserveConfig::default(),
    )
    .map(|item| item.is_in_place())
    .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ringitem_core::Unlocked;

    fn small() -> StressConfig {
        StressConfig {
            operations: 500,
            threads: 4,
            max_payload: 512,
            ring_capacity: 4096,
        }
    }

    #[test]
    fn pool_cycle_never_fails() {
        let pool = FragmentPool::<Unlocked>::new();
        let result = stress_pool_cycle(&pool, &small());
        assert_eq!(result.failed_ops, 0);
        assert_eq!(result.successful_ops, 500);

        let stats = pool.stats();
        let classes = stats.free_blocks_per_class.iter().filter(|&&n| n > 0).count() as u64;
        assert_eq!(stats.fresh_allocations, classes + 1);
    }

    #[test]
    fn pool_concurrent_never_fails() {
        let pool = FragmentPool::<Locked>::new();
        let result = stress_pool_concurrent(&pool, &small());
        assert_eq!(result.failed_ops, 0);
        assert_eq!(result.total_ops, 2000);
    }

    #[test]
    fn ring_roundtrip_across_wraps() {
        let result = stress_ring_roundtrip(&small());
        assert_eq!(result.failed_ops, 0, "{result:?}");
    }

    #[test]
    fn in_place_depends_on_contiguous_room() {
        let mut ring = RingBuffer::new(256);
        assert!(builds_in_place(&mut ring, 16));
        assert!(!builds_in_place(&mut ring, 1024));
    }
}
