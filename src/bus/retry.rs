//! Exponential backoff for C3 redelivery, the same doubling-with-cap shape
//! the teacher uses for its connection-retry loops.

use std::time::Duration;

const BASE_DELAY_MS: u64 = 200;
const MAX_DELAY_MS: u64 = 30_000;

/// Delay before redelivery attempt `attempt` (1-based): doubles each time,
/// capped at 30s.
pub fn backoff_delay(attempt: u32) -> Duration {
    let shift = attempt.saturating_sub(1).min(16);
    let delay_ms = BASE_DELAY_MS.saturating_mul(1u64 << shift).min(MAX_DELAY_MS);
    Duration::from_millis(delay_ms)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn doubles_then_caps() {
        assert_eq!(backoff_delay(1), Duration::from_millis(200));
        assert_eq!(backoff_delay(2), Duration::from_millis(400));
        assert_eq!(backoff_delay(3), Duration::from_millis(800));
        assert_eq!(backoff_delay(20), Duration::from_millis(MAX_DELAY_MS));
    }
}
