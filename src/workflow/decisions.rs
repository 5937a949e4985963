use tracing::warn;

use crate::core::types::Decision;

/// Positional allow/deny flags over a pending batch. Knows nothing about row
/// content; its length is fixed at creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecisionTracker {
    decisions: Vec<Decision>,
}

impl DecisionTracker {
    /// Every row starts out allowed.
    pub fn new(len: usize) -> Self {
        Self {
            decisions: vec![Decision::Allow; len],
        }
    }

    /// Out-of-range indices mean the view and the batch disagree; the call is
    /// ignored and `false` returned.
    pub fn set(&mut self, index: usize, value: Decision) -> bool {
        match self.decisions.get_mut(index) {
            Some(slot) => {
                *slot = value;
                true
            }
            None => {
                warn!(index, len = self.decisions.len(), "decision index out of range, ignoring");
                false
            }
        }
    }

    pub fn bulk_set(&mut self, value: Decision) {
        self.decisions.fill(value);
    }

    pub fn get(&self, index: usize) -> Option<Decision> {
        self.decisions.get(index).copied()
    }

    pub fn len(&self) -> usize {
        self.decisions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.decisions.is_empty()
    }

    pub fn allowed_count(&self) -> usize {
        self.decisions
            .iter()
            .filter(|decision| **decision == Decision::Allow)
            .count()
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, Decision)> + '_ {
        self.decisions.iter().copied().enumerate()
    }

    pub fn as_slice(&self) -> &[Decision] {
        &self.decisions
    }
}
