//! Specialized collection types

use std::cmp::Ordering;

pub use slotmap::{SecondaryMap, SlotMap};

/// Totally ordered `f64` usable as a map key
///
/// Equality is bitwise (after folding `-0.0` into `0.0`), so two keys are
/// equal only when they were produced by the same arithmetic. Keys that are
/// merely close remain distinct.
#[derive(Debug, Clone, Copy)]
pub struct FrameKey(f64);

impl FrameKey {
    /// Wrap a frame value
    pub fn new(value: f64) -> Self {
        // -0.0 and 0.0 must collapse to one key
        if value == 0.0 {
            Self(0.0)
        } else {
            Self(value)
        }
    }

    /// The wrapped frame value
    pub fn value(self) -> f64 {
        self.0
    }
}

impl PartialEq for FrameKey {
    fn eq(&self, other: &Self) -> bool {
        self.0.total_cmp(&other.0) == Ordering::Equal
    }
}

impl Eq for FrameKey {}

impl PartialOrd for FrameKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for FrameKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

impl From<f64> for FrameKey {
    fn from(value: f64) -> Self {
        Self::new(value)
    }
}
