//! Completeness scores and the leaf walk records expose for them.

use serde::{Deserialize, Serialize};

use super::field::Field;

/// Field coverage of one record.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CompletenessScore {
    pub filled: u32,
    pub total: u32,
    /// `100 * filled / total`, rounded to two decimals; 0 when `total` is 0.
    pub percent: f64,
}

impl CompletenessScore {
    pub fn new(filled: u32, total: u32) -> Self {
        let percent = if total == 0 {
            0.0
        } else {
            (f64::from(filled) * 100.0 / f64::from(total) * 100.0).round() / 100.0
        };
        Self {
            filled,
            total,
            percent,
        }
    }

    pub fn zero() -> Self {
        Self::new(0, 0)
    }

    pub fn meets(&self, target_percent: f64) -> bool {
        self.percent >= target_percent
    }
}

/// Accumulates filled/total counts while a record walks its leaves.
#[derive(Debug, Default)]
pub struct LeafCounter {
    filled: u32,
    total: u32,
}

impl LeafCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one scalar leaf.
    pub fn field(&mut self, field: &Field) -> &mut Self {
        self.total += 1;
        if field.is_filled() {
            self.filled += 1;
        }
        self
    }

    /// Count one leaf whose fill state the record judges itself.
    pub fn leaf(&mut self, filled: bool) -> &mut Self {
        self.total += 1;
        if filled {
            self.filled += 1;
        }
        self
    }

    /// Count several scalar leaves.
    pub fn fields<'a>(&mut self, fields: impl IntoIterator<Item = &'a Field>) -> &mut Self {
        for field in fields {
            self.field(field);
        }
        self
    }

    /// Count leaves that are expected but have no slot in the record
    /// (e.g. a roster shorter than its minimum size).
    pub fn missing(&mut self, count: u32) -> &mut Self {
        self.total += count;
        self
    }

    pub fn finish(&self) -> CompletenessScore {
        CompletenessScore::new(self.filled, self.total)
    }
}

/// A record whose schema can be flattened into scalar leaves.
pub trait Leaves {
    /// Visit every leaf the record's schema declares.
    fn count_leaves(&self, counter: &mut LeafCounter);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percent_rounds_to_two_decimals() {
        let score = CompletenessScore::new(1, 3);
        assert_eq!(score.percent, 33.33);
    }

    #[test]
    fn test_zero_total_is_zero_percent() {
        assert_eq!(CompletenessScore::new(0, 0).percent, 0.0);
    }

    #[test]
    fn test_counter_counts_missing_slots_as_unfilled() {
        let mut counter = LeafCounter::new();
        counter
            .field(&Field::new("a"))
            .field(&Field::unfilled())
            .leaf(false)
            .missing(2);
        let score = counter.finish();
        assert_eq!((score.filled, score.total), (1, 5));
        assert_eq!(score.percent, 20.0);
    }
}
