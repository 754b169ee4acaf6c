//! Timestamp value object (Unix milliseconds, UTC).

use serde::{Deserialize, Serialize};

/// Server-assigned instant, in Unix milliseconds.
///
/// Ordered and copyable so the playback state machine can enforce that a
/// room's sync timestamp never moves backwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(i64);

impl Timestamp {
    pub const ZERO: Timestamp = Timestamp(0);

    pub fn new(millis: i64) -> Self {
        Self(millis)
    }

    pub fn value(self) -> i64 {
        self.0
    }

    /// Seconds elapsed from `self` to `now`, clamped at zero.
    pub fn elapsed_seconds_until(self, now: Timestamp) -> f64 {
        (now.0 - self.0).max(0) as f64 / 1000.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_elapsed_seconds_until_converts_millis() {
        // テスト項目: ミリ秒差が秒に変換される
        // given (前提条件):
        let start = Timestamp::new(10_000);
        let now = Timestamp::new(12_500);

        // when (操作):
        let elapsed = start.elapsed_seconds_until(now);

        // then (期待する結果):
        assert!((elapsed - 2.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_elapsed_seconds_until_clamps_negative() {
        // テスト項目: 過去方向の経過時間は 0 に丸められる
        // given (前提条件):
        let start = Timestamp::new(12_500);
        let now = Timestamp::new(10_000);

        // when (操作):
        let elapsed = start.elapsed_seconds_until(now);

        // then (期待する結果):
        assert_eq!(elapsed, 0.0);
    }
}
