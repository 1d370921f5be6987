//! Randomizer port - cohort 用の一様乱数
//!
//! candidate ごとに 1 回だけ引かれ、永続化されます。
//! テスト容易性のために trait として抽象化しています。
//!
//! # 実装
//! - **ThreadRandom**: rand ベース（本番用）
//! - **FixedRandom**: 固定値（テスト用、引いた回数を数える）

use std::sync::atomic::{AtomicUsize, Ordering};

/// Randomizer は `[0, 1)` の一様乱数を返す
///
/// # Thread Safety
/// - `Send + Sync` を要求（複数の candidate チェックから使える）
pub trait Randomizer: Send + Sync {
    fn draw(&self) -> f64;
}

/// rand の thread-local RNG を使う Randomizer
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadRandom;

impl Randomizer for ThreadRandom {
    fn draw(&self) -> f64 {
        // Standard distribution for f64 is [0, 1)
        rand::random::<f64>()
    }
}

/// 常に同じ値を返す Randomizer
#[derive(Debug, Default)]
pub struct FixedRandom {
    value: f64,
    draws: AtomicUsize,
}

impl FixedRandom {
    pub fn new(value: f64) -> Self {
        Self {
            value,
            draws: AtomicUsize::new(0),
        }
    }

    /// これまでに `draw()` された回数
    pub fn draws(&self) -> usize {
        self.draws.load(Ordering::SeqCst)
    }
}

impl Randomizer for FixedRandom {
    fn draw(&self) -> f64 {
        self.draws.fetch_add(1, Ordering::SeqCst);
        self.value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn thread_random_stays_in_unit_interval() {
        let randomizer = ThreadRandom;
        for _ in 0..1_000 {
            let value = randomizer.draw();
            assert!((0.0..1.0).contains(&value));
        }
    }

    #[test]
    fn fixed_random_counts_draws() {
        let randomizer = FixedRandom::new(0.42);
        assert_eq!(randomizer.draws(), 0);
        assert_eq!(randomizer.draw(), 0.42);
        assert_eq!(randomizer.draw(), 0.42);
        assert_eq!(randomizer.draws(), 2);
    }
}
