use std::collections::HashMap;

use crate::CommentId;

/// External comment id → destination id, filled as rows are inserted.
///
/// Only holds comments inserted earlier in the current pass, so a reference
/// to a comment that comes later in the export never resolves.
#[derive(Debug, Default)]
pub struct IdentityMap {
    assigned: HashMap<String, CommentId>,
}

impl IdentityMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Re-recording an external id points it at the newer destination id.
    pub fn record(&mut self, external_id: &str, destination_id: CommentId) {
        if let Some(previous) = self
            .assigned
            .insert(external_id.to_string(), destination_id)
        {
            tracing::debug!(
                "external id {external_id} seen again: {previous} replaced by {destination_id}"
            );
        }
    }

    pub fn resolve(&self, external_id: &str) -> Option<CommentId> {
        self.assigned.get(external_id).copied()
    }

    pub fn len(&self) -> usize {
        self.assigned.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assigned.is_empty()
    }
}
