//! Per-iteration records of a descent run.
//!
//! The history is append-only except for [`IterationHistory::pop`], which the
//! constant-step policy uses to discard a step that increased the objective.

use crate::types::{DVector, Scalar};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use std::ops::Index;

/// One step of a descent run.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct IterationRecord<T>
where
    T: Scalar,
{
    /// Iteration counter at the time the record was taken
    pub index: usize,
    /// Position `x_k`
    pub position: DVector<T>,
    /// Objective value `f(x_k)`
    pub value: T,
    /// Descent direction chosen at `x_k`, if one was computed
    pub direction: Option<DVector<T>>,
}

impl<T> IterationRecord<T>
where
    T: Scalar,
{
    /// Creates a record.
    pub fn new(index: usize, position: DVector<T>, value: T, direction: Option<DVector<T>>) -> Self {
        Self {
            index,
            position,
            value,
            direction,
        }
    }
}

/// Ordered sequence of iteration records.
///
/// `current` is the most recent record and `last` the one before it; the
/// convergence criteria only ever compare these two.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct IterationHistory<T>
where
    T: Scalar,
{
    records: Vec<IterationRecord<T>>,
}

impl<T> Default for IterationHistory<T>
where
    T: Scalar,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T> IterationHistory<T>
where
    T: Scalar,
{
    /// Creates an empty history.
    pub fn new() -> Self {
        Self {
            records: Vec::new(),
        }
    }

    /// Appends a record.
    pub fn push(&mut self, record: IterationRecord<T>) {
        self.records.push(record);
    }

    /// Most recent record.
    pub fn current(&self) -> Option<&IterationRecord<T>> {
        self.records.last()
    }

    /// Record before the most recent one.
    pub fn last(&self) -> Option<&IterationRecord<T>> {
        self.records.len().checked_sub(2).map(|i| &self.records[i])
    }

    /// Removes and returns the most recent record.
    pub fn pop(&mut self) -> Option<IterationRecord<T>> {
        self.records.pop()
    }

    /// Replaces the record at `index`, returning the previous one.
    ///
    /// Returns `None` and leaves the history unchanged when `index` is out
    /// of range.
    pub fn replace(&mut self, index: usize, record: IterationRecord<T>) -> Option<IterationRecord<T>> {
        self.records
            .get_mut(index)
            .map(|slot| std::mem::replace(slot, record))
    }

    /// Record at `index`, if any.
    pub fn get(&self, index: usize) -> Option<&IterationRecord<T>> {
        self.records.get(index)
    }

    /// Removes every record.
    pub fn clear(&mut self) {
        self.records.clear();
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the history holds no record.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Iterates over the records in insertion order.
    pub fn iter(&self) -> std::slice::Iter<'_, IterationRecord<T>> {
        self.records.iter()
    }

    /// All records as a slice.
    pub fn records(&self) -> &[IterationRecord<T>] {
        &self.records
    }

    /// Objective values in insertion order.
    pub fn values(&self) -> Vec<T> {
        self.records.iter().map(|r| r.value).collect()
    }
}

impl<T> Index<usize> for IterationHistory<T>
where
    T: Scalar,
{
    type Output = IterationRecord<T>;

    fn index(&self, index: usize) -> &Self::Output {
        &self.records[index]
    }
}

impl<'a, T> IntoIterator for &'a IterationHistory<T>
where
    T: Scalar,
{
    type Item = &'a IterationRecord<T>;
    type IntoIter = std::slice::Iter<'a, IterationRecord<T>>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn record(index: usize, x: f64, value: f64) -> IterationRecord<f64> {
        IterationRecord::new(index, DVector::from_vec(vec![x]), value, None)
    }

    #[test]
    fn test_empty_history() {
        let history = IterationHistory::<f64>::new();
        assert!(history.is_empty());
        assert!(history.current().is_none());
        assert!(history.last().is_none());
    }

    #[test]
    fn test_current_and_last() {
        let mut history = IterationHistory::new();
        history.push(record(0, 1.0, 10.0));
        assert_eq!(history.current().map(|r| r.index), Some(0));
        assert!(history.last().is_none());

        history.push(record(1, 0.5, 4.0));
        history.push(record(2, 0.25, 1.0));
        assert_eq!(history.len(), 3);
        assert_eq!(history.current().map(|r| r.index), Some(2));
        assert_eq!(history.last().map(|r| r.index), Some(1));
        assert_eq!(history[0].value, 10.0);
    }

    #[test]
    fn test_pop_rolls_back() {
        let mut history = IterationHistory::new();
        history.push(record(0, 1.0, 1.0));
        history.push(record(1, 2.0, 5.0));

        let removed = history.pop();
        assert_eq!(removed.map(|r| r.value), Some(5.0));
        assert_eq!(history.current().map(|r| r.index), Some(0));
        assert!(history.last().is_none());
    }

    #[test]
    fn test_replace_and_clear() {
        let mut history = IterationHistory::new();
        history.push(record(0, 1.0, 1.0));

        let old = history.replace(0, record(0, 3.0, 9.0));
        assert_eq!(old, Some(record(0, 1.0, 1.0)));
        assert_eq!(history[0], record(0, 3.0, 9.0));
        assert!(history.replace(5, record(5, 0.0, 0.0)).is_none());

        history.clear();
        assert!(history.is_empty());
    }

    #[test]
    fn test_iteration_order() {
        let mut history = IterationHistory::new();
        for i in 0..4 {
            history.push(record(i, i as f64, (4 - i) as f64));
        }

        let indices: Vec<usize> = history.iter().map(|r| r.index).collect();
        assert_eq!(indices, vec![0, 1, 2, 3]);
        assert_eq!(history.values(), vec![4.0, 3.0, 2.0, 1.0]);
        assert_eq!((&history).into_iter().count(), 4);
    }
}
