//! Mutation batching.
//!
//! Child-list records are collapsed into an ordered set of affected parents.
//! The set is rescanned once the debounce window has passed without new
//! relevant records. Time is passed in by the caller.

use crate::config::MirrorConfig;
use crate::dom::{LiveDocument, MutationRecord, NodeId};
use crate::layers::{is_ignored, scan_with, LayerNode};
use indexmap::IndexSet;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

/// Fresh layer subtree for a parent whose children changed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayersChanged {
    pub parent_oid: Option<String>,
    pub layer: LayerNode,
}

#[derive(Debug)]
pub struct MutationBatcher {
    pending: IndexSet<NodeId>,
    deadline: Option<Instant>,
    debounce: Duration,
}

impl MutationBatcher {
    pub fn new(debounce: Duration) -> Self {
        Self {
            pending: IndexSet::new(),
            deadline: None,
            debounce,
        }
    }

    pub fn from_config(config: &MirrorConfig) -> Self {
        Self::new(config.mutation_debounce())
    }

    pub fn is_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Queue the parents of relevant records and push the deadline back
    pub fn observe(
        &mut self,
        doc: &LiveDocument,
        records: Vec<MutationRecord>,
        now: Instant,
        config: &MirrorConfig,
    ) {
        let mut relevant = false;
        for record in records {
            if !is_relevant(doc, &record, config) {
                continue;
            }
            relevant = true;
            self.pending.insert(record.target);
        }

        if relevant {
            self.deadline = Some(now + self.debounce);
        }
    }

    /// Flush when the debounce window has elapsed
    pub fn poll(
        &mut self,
        doc: &mut LiveDocument,
        now: Instant,
        config: &MirrorConfig,
    ) -> Vec<LayersChanged> {
        match self.deadline {
            Some(deadline) if now >= deadline => self.flush(doc, config),
            _ => Vec::new(),
        }
    }

    /// Rescan every queued parent, one report per parent
    pub fn flush(&mut self, doc: &mut LiveDocument, config: &MirrorConfig) -> Vec<LayersChanged> {
        self.deadline = None;
        let mut changes = Vec::new();

        for parent in self.pending.drain(..) {
            if !doc.is_connected(parent) {
                continue;
            }
            let Some(layer) = scan_with(doc, parent, config) else {
                tracing::debug!(?parent, "skipping parent that no longer renders");
                continue;
            };
            changes.push(LayersChanged {
                parent_oid: doc.oid(parent).map(str::to_string),
                layer,
            });
        }

        changes
    }
}

/// A record matters unless every node it touches is an editor helper
fn is_relevant(doc: &LiveDocument, record: &MutationRecord, config: &MirrorConfig) -> bool {
    let mut touched = record.added.iter().chain(record.removed.iter()).peekable();
    if touched.peek().is_none() {
        return false;
    }
    touched.any(|node| !is_ignored(doc, *node, config))
}

/// Periodic full-rescan timer, independent of mutations
#[derive(Debug)]
pub struct KeepAlive {
    interval: Duration,
    next_due: Instant,
}

impl KeepAlive {
    pub fn new(interval: Duration, now: Instant) -> Self {
        Self {
            interval,
            next_due: now + interval,
        }
    }

    /// True once per elapsed interval
    pub fn is_due(&mut self, now: Instant) -> bool {
        if now < self.next_due {
            return false;
        }
        self.next_due = now + self.interval;
        true
    }
}
