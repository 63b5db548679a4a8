use std::sync::LazyLock;
use std::sync::atomic::{AtomicU64, Ordering};

use rand::Rng;

/// Current UTC timestamp in milliseconds
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Custom epoch for generated ids: 2024-01-01 00:00:00 UTC
const EPOCH_MS: i64 = 1_704_067_200_000;

/// Low 12 bits of generated ids, seeded randomly once per process
static SEQUENCE: LazyLock<AtomicU64> =
    LazyLock::new(|| AtomicU64::new(rand::thread_rng().gen_range(0..0x1000)));

/// Generate a snowflake-style i64 resource id.
///
/// Layout (53 bits, safe for JavaScript numbers):
///   - 41 bits: milliseconds since [`EPOCH_MS`]
///   - 12 bits: rolling sequence, so ids from one process in the same
///     millisecond differ
pub fn snowflake_id() -> i64 {
    let ts = (now_millis() - EPOCH_MS) & 0x1FF_FFFF_FFFF;
    let seq = (SEQUENCE.fetch_add(1, Ordering::Relaxed) & 0xFFF) as i64;
    (ts << 12) | seq
}
