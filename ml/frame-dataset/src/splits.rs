//! Seeded train/val/test partitioning.
//!
//! The random generator is always passed in by the caller. Nothing here
//! touches a process-wide RNG, so repeated or concurrent partitions never
//! interfere with each other.

use std::fmt;

use rand::Rng;
use rand::SeedableRng;
use rand::seq::SliceRandom;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::error::{DatasetError, Result};

/// Allowed deviation of the ratio sum from 1.0.
pub const RATIO_TOLERANCE: f64 = 1e-6;

/// One of the three output splits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Split {
    /// Training split.
    Train,
    /// Validation split.
    Val,
    /// Test split.
    Test,
}

impl Split {
    /// All splits in output order.
    pub const ALL: [Self; 3] = [Self::Train, Self::Val, Self::Test];

    /// Directory name of the split.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Train => "train",
            Self::Val => "val",
            Self::Test => "test",
        }
    }
}

impl fmt::Display for Split {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Train/val/test ratios.
///
/// # Example
///
/// ```
/// use frame_dataset::SplitRatios;
///
/// let ratios = SplitRatios::new(0.7, 0.15, 0.15).unwrap();
/// assert_eq!(ratios.counts(10), (7, 1, 2));
///
/// assert!(SplitRatios::new(0.7, 0.2, 0.2).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawRatios", into = "RawRatios")]
pub struct SplitRatios {
    train: f64,
    val: f64,
    test: f64,
}

#[derive(Serialize, Deserialize)]
struct RawRatios {
    train: f64,
    val: f64,
    test: f64,
}

impl TryFrom<RawRatios> for SplitRatios {
    type Error = DatasetError;

    fn try_from(raw: RawRatios) -> Result<Self> {
        Self::new(raw.train, raw.val, raw.test)
    }
}

impl From<SplitRatios> for RawRatios {
    fn from(ratios: SplitRatios) -> Self {
        Self {
            train: ratios.train,
            val: ratios.val,
            test: ratios.test,
        }
    }
}

impl SplitRatios {
    /// Creates validated ratios.
    ///
    /// # Errors
    ///
    /// Returns [`DatasetError::InvalidRatio`] if any ratio is negative or not
    /// finite, or if the sum differs from 1.0 by more than [`RATIO_TOLERANCE`].
    pub fn new(train: f64, val: f64, test: f64) -> Result<Self> {
        let valid = [train, val, test]
            .iter()
            .all(|r| r.is_finite() && *r >= 0.0);
        if !valid || (train + val + test - 1.0).abs() > RATIO_TOLERANCE {
            return Err(DatasetError::invalid_ratio(train, val, test));
        }
        Ok(Self { train, val, test })
    }

    /// Training ratio.
    #[must_use]
    pub const fn train(&self) -> f64 {
        self.train
    }

    /// Validation ratio.
    #[must_use]
    pub const fn val(&self) -> f64 {
        self.val
    }

    /// Test ratio.
    #[must_use]
    pub const fn test(&self) -> f64 {
        self.test
    }

    /// Split sizes `(train, val, test)` for `total` items.
    ///
    /// Train and val are truncated, test takes the remainder, so test may be
    /// larger than `test * total` suggests.
    #[must_use]
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    pub fn counts(&self, total: usize) -> (usize, usize, usize) {
        let n = total as f64;
        let train = ((n * self.train).floor() as usize).min(total);
        let val = ((n * self.val).floor() as usize).min(total - train);
        (train, val, total - train - val)
    }

    /// Common 70/15/15 split.
    pub const SEVENTY_FIFTEEN_FIFTEEN: Self = Self {
        train: 0.7,
        val: 0.15,
        test: 0.15,
    };

    /// Common 80/10/10 split.
    pub const EIGHTY_TEN_TEN: Self = Self {
        train: 0.8,
        val: 0.1,
        test: 0.1,
    };
}

impl Default for SplitRatios {
    fn default() -> Self {
        Self::SEVENTY_FIFTEEN_FIFTEEN
    }
}

/// Three disjoint subsets of one input sequence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Partition<T> {
    /// Training items.
    pub train: Vec<T>,
    /// Validation items.
    pub val: Vec<T>,
    /// Test items.
    pub test: Vec<T>,
}

impl<T> Partition<T> {
    /// Items assigned to `split`.
    #[must_use]
    pub fn get(&self, split: Split) -> &[T] {
        match split {
            Split::Train => &self.train,
            Split::Val => &self.val,
            Split::Test => &self.test,
        }
    }

    /// Iterates `(split, items)` in output order.
    pub fn iter(&self) -> impl Iterator<Item = (Split, &[T])> {
        Split::ALL.into_iter().map(move |split| (split, self.get(split)))
    }

    /// Total number of items across all splits.
    #[must_use]
    pub fn len(&self) -> usize {
        self.train.len() + self.val.len() + self.test.len()
    }

    /// Returns `true` if no items were partitioned.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Shuffles `items` with `rng` and cuts them into train/val/test.
///
/// The same RNG state and input order always give the same partition.
///
/// # Example
///
/// ```
/// use frame_dataset::{SplitRatios, partition};
/// use rand::SeedableRng;
/// use rand_chacha::ChaCha8Rng;
///
/// let items: Vec<u32> = (0..20).collect();
/// let mut rng = ChaCha8Rng::seed_from_u64(7);
/// let parts = partition(&items, SplitRatios::default(), &mut rng);
/// assert_eq!(parts.train.len(), 14);
/// assert_eq!(parts.val.len(), 3);
/// assert_eq!(parts.test.len(), 3);
/// ```
pub fn partition<T: Clone, R: Rng + ?Sized>(
    items: &[T],
    ratios: SplitRatios,
    rng: &mut R,
) -> Partition<T> {
    let mut shuffled = items.to_vec();
    shuffled.shuffle(rng);

    let (train_count, val_count, _) = ratios.counts(shuffled.len());
    let test = shuffled.split_off(train_count + val_count);
    let val = shuffled.split_off(train_count);

    Partition {
        train: shuffled,
        val,
        test,
    }
}

/// [`partition`] with a fresh `ChaCha8Rng` seeded from `seed`.
#[must_use]
pub fn partition_seeded<T: Clone>(items: &[T], ratios: SplitRatios, seed: u64) -> Partition<T> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    partition(items, ratios, &mut rng)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_names() {
        assert_eq!(Split::Train.as_str(), "train");
        assert_eq!(Split::Val.to_string(), "val");
        assert_eq!(Split::ALL.len(), 3);
    }

    #[test]
    fn ratios_accept_standard_triple() {
        let ratios = SplitRatios::new(0.70, 0.15, 0.15);
        assert!(ratios.is_ok());
    }

    #[test]
    fn ratios_within_tolerance() {
        assert!(SplitRatios::new(0.7, 0.15, 0.149_999_9).is_ok());
        assert!(SplitRatios::new(0.7, 0.15, 0.149_99).is_err());
        assert!(SplitRatios::new(0.7, 0.15, 0.150_01).is_err());
    }

    #[test]
    fn ratios_reject_negative_and_nan() {
        assert!(SplitRatios::new(1.2, -0.1, -0.1).is_err());
        assert!(SplitRatios::new(f64::NAN, 0.5, 0.5).is_err());
        assert!(SplitRatios::new(f64::INFINITY, 0.0, 0.0).is_err());
    }

    #[test]
    fn ratios_degenerate_but_valid() {
        let all_train = SplitRatios::new(1.0, 0.0, 0.0).unwrap();
        assert_eq!(all_train.counts(5), (5, 0, 0));
        let all_test = SplitRatios::new(0.0, 0.0, 1.0).unwrap();
        assert_eq!(all_test.counts(5), (0, 0, 5));
    }

    #[test]
    fn counts_truncate() {
        let ratios = SplitRatios::default();
        assert_eq!(ratios.counts(10), (7, 1, 2));
        assert_eq!(ratios.counts(100), (70, 15, 15));
        assert_eq!(ratios.counts(3), (2, 0, 1));
        assert_eq!(ratios.counts(0), (0, 0, 0));
    }

    #[test]
    fn counts_never_exceed_total() {
        let ratios = SplitRatios::new(0.500_000_5, 0.500_000_4, 0.0).unwrap();
        for n in [0, 1, 7, 1_000_000, 10_000_000] {
            let (train, val, test) = ratios.counts(n);
            assert_eq!(train + val + test, n);
        }
    }

    #[test]
    fn ratios_serialization() {
        let json = serde_json::to_string(&SplitRatios::default()).unwrap();
        let parsed: SplitRatios = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, SplitRatios::default());

        let bad = serde_json::from_str::<SplitRatios>(r#"{"train":0.9,"val":0.2,"test":0.1}"#);
        assert!(bad.is_err());
    }

    #[test]
    fn partition_basic() {
        let items: Vec<u64> = (0..10).collect();
        let parts = partition_seeded(&items, SplitRatios::default(), 42);

        assert_eq!(parts.train.len(), 7);
        assert_eq!(parts.val.len(), 1);
        assert_eq!(parts.test.len(), 2);
        assert_eq!(parts.len(), 10);

        let mut all: Vec<u64> = parts.iter().flat_map(|(_, s)| s.iter().copied()).collect();
        all.sort_unstable();
        assert_eq!(all, items);
    }

    #[test]
    fn partition_empty() {
        let items: Vec<u64> = Vec::new();
        let parts = partition_seeded(&items, SplitRatios::default(), 1);
        assert!(parts.is_empty());
    }

    #[test]
    fn partition_reproducible() {
        let items: Vec<String> = (0..100).map(|i| format!("frame_{i}.png")).collect();
        let a = partition_seeded(&items, SplitRatios::default(), 42);
        let b = partition_seeded(&items, SplitRatios::default(), 42);
        assert_eq!(a, b);
    }

    #[test]
    fn partition_seed_changes_order() {
        let items: Vec<u64> = (0..100).collect();
        let a = partition_seeded(&items, SplitRatios::default(), 1);
        let b = partition_seeded(&items, SplitRatios::default(), 2);
        assert_ne!(a.train, b.train);
    }

    #[test]
    fn partition_local_rng_is_independent() {
        let items: Vec<u64> = (0..50).collect();
        let mut rng = ChaCha8Rng::seed_from_u64(9);
        let first = partition(&items, SplitRatios::default(), &mut rng);
        let second = partition(&items, SplitRatios::default(), &mut rng);
        // Reusing one generator advances it; a fresh one replays the first call.
        assert_ne!(first, second);
        assert_eq!(first, partition_seeded(&items, SplitRatios::default(), 9));
    }

    #[test]
    fn partition_get_matches_fields() {
        let items: Vec<u64> = (0..20).collect();
        let parts = partition_seeded(&items, SplitRatios::EIGHTY_TEN_TEN, 3);
        assert_eq!(parts.get(Split::Train), parts.train.as_slice());
        assert_eq!(parts.get(Split::Val), parts.val.as_slice());
        assert_eq!(parts.get(Split::Test), parts.test.as_slice());
    }
}
