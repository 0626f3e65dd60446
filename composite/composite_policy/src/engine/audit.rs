//! Visibility auditing.
//!
//! Keeps a bounded log of visibility decisions per client bundle.

use composite_core::id::BundleId;
use dashmap::DashMap;
use std::sync::Arc;

use crate::model::{DecisionReason, VisibilityDecision};

/// A visibility audit log.
#[derive(Clone)]
pub struct VisibilityAudit {
    /// Decisions, oldest first, per client.
    entries: Arc<DashMap<BundleId, Vec<VisibilityDecision>>>,

    /// The maximum number of decisions kept per client.
    max_entries_per_bundle: usize,
}

impl VisibilityAudit {
    /// Create a new audit log.
    ///
    /// # Arguments
    ///
    /// * `max_entries_per_bundle` - The maximum number of decisions to keep per client.
    pub fn new(max_entries_per_bundle: usize) -> Self {
        Self {
            entries: Arc::new(DashMap::new()),
            max_entries_per_bundle,
        }
    }

    /// Record a decision, dropping the client's oldest entries past capacity.
    pub fn record(&self, decision: VisibilityDecision) {
        let mut entries = self.entries.entry(decision.client).or_default();
        entries.push(decision);
        if entries.len() > self.max_entries_per_bundle {
            let to_remove = entries.len() - self.max_entries_per_bundle;
            entries.drain(0..to_remove);
        }
    }

    /// Get the decisions recorded for a client.
    pub fn decisions_for(&self, client: BundleId) -> Vec<VisibilityDecision> {
        self.entries
            .get(&client)
            .map(|entries| entries.clone())
            .unwrap_or_default()
    }

    /// Forget the decisions recorded for a client.
    pub fn clear(&self, client: BundleId) {
        self.entries.remove(&client);
    }

    /// Get every recorded decision.
    pub fn all_decisions(&self) -> Vec<VisibilityDecision> {
        self.entries
            .iter()
            .flat_map(|entry| entry.value().clone())
            .collect()
    }

    /// Get the decisions with the given outcome.
    pub fn decisions_by_outcome(&self, visible: bool) -> Vec<VisibilityDecision> {
        self.entries
            .iter()
            .flat_map(|entry| {
                entry
                    .value()
                    .iter()
                    .filter(|decision| decision.visible == visible)
                    .cloned()
                    .collect::<Vec<_>>()
            })
            .collect()
    }

    /// Get the decisions made for the given reason.
    pub fn decisions_by_reason(&self, reason: DecisionReason) -> Vec<VisibilityDecision> {
        self.entries
            .iter()
            .flat_map(|entry| {
                entry
                    .value()
                    .iter()
                    .filter(|decision| decision.reason == reason)
                    .cloned()
                    .collect::<Vec<_>>()
            })
            .collect()
    }
}

impl Default for VisibilityAudit {
    fn default() -> Self {
        Self::new(1000)
    }
}
