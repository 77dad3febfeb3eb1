//! Coverage bookkeeping for `unevaluatedProperties` / `unevaluatedItems`.
//!
//! A bucket is keyed by the schema node that claimed a key and the
//! instance location the node was applied at. In-place applicators
//! (`$ref`, `allOf`, the selected `then`, ...) add an edge from the
//! parent node to the child node at the same location, so the keys
//! covered "under X" are the union of every bucket reachable from X.
//!
//! Tentative evaluation (`anyOf` branches) opens a [`Checkpoint`];
//! while one is open, every new claim and edge is journaled so that
//! [`CoverageTracker::rollback`] can undo exactly those entries.

use schemafill_core::SchemaId;
use std::collections::{BTreeSet, HashMap, HashSet};

type Bucket = (SchemaId, String);

/// A journaled insertion.
#[derive(Debug, Clone)]
enum Entry {
    Property(Bucket, String),
    Item(Bucket, usize),
    Edge(Bucket, SchemaId),
}

/// Position in the journal returned by [`CoverageTracker::checkpoint`].
#[derive(Debug)]
#[must_use]
pub struct Checkpoint(usize);

#[derive(Debug, Clone, Default)]
pub struct CoverageTracker {
    properties: HashMap<Bucket, BTreeSet<String>>,
    items: HashMap<Bucket, BTreeSet<usize>>,
    edges: HashMap<Bucket, BTreeSet<SchemaId>>,
    journal: Vec<Entry>,
    open: usize,
}

impl CoverageTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn claim_property(&mut self, schema: SchemaId, location: &str, key: &str) {
        let bucket = (schema, location.to_string());
        let inserted = self
            .properties
            .entry(bucket.clone())
            .or_default()
            .insert(key.to_string());
        if inserted && self.open > 0 {
            self.journal.push(Entry::Property(bucket, key.to_string()));
        }
    }

    pub fn claim_item(&mut self, schema: SchemaId, location: &str, index: usize) {
        let bucket = (schema, location.to_string());
        let inserted = self.items.entry(bucket.clone()).or_default().insert(index);
        if inserted && self.open > 0 {
            self.journal.push(Entry::Item(bucket, index));
        }
    }

    /// Record that `to` was applied in place of `from` at `location`.
    pub fn link(&mut self, from: SchemaId, to: SchemaId, location: &str) {
        if from == to {
            return;
        }
        let bucket = (from, location.to_string());
        let inserted = self.edges.entry(bucket.clone()).or_default().insert(to);
        if inserted && self.open > 0 {
            self.journal.push(Entry::Edge(bucket, to));
        }
    }

    /// Keys covered by `schema` or any node applied in place under it.
    pub fn covered_properties(&self, schema: SchemaId, location: &str) -> BTreeSet<String> {
        self.reachable(schema, location)
            .into_iter()
            .filter_map(|node| self.properties.get(&(node, location.to_string())))
            .flatten()
            .cloned()
            .collect()
    }

    /// Indices covered by `schema` or any node applied in place under it.
    pub fn covered_items(&self, schema: SchemaId, location: &str) -> BTreeSet<usize> {
        self.reachable(schema, location)
            .into_iter()
            .filter_map(|node| self.items.get(&(node, location.to_string())))
            .flatten()
            .copied()
            .collect()
    }

    fn reachable(&self, schema: SchemaId, location: &str) -> HashSet<SchemaId> {
        let mut seen = HashSet::from([schema]);
        let mut stack = vec![schema];
        while let Some(node) = stack.pop() {
            let Some(targets) = self.edges.get(&(node, location.to_string())) else {
                continue;
            };
            for target in targets {
                if seen.insert(*target) {
                    stack.push(*target);
                }
            }
        }
        seen
    }

    /// Start journaling claims for a tentative evaluation. Checkpoints
    /// nest; each must be closed by [`commit`](Self::commit) or
    /// [`rollback`](Self::rollback), innermost first.
    pub fn checkpoint(&mut self) -> Checkpoint {
        self.open += 1;
        Checkpoint(self.journal.len())
    }

    /// Keep everything claimed since `checkpoint`.
    pub fn commit(&mut self, _checkpoint: Checkpoint) {
        self.close();
    }

    /// Undo everything claimed since `checkpoint`.
    pub fn rollback(&mut self, checkpoint: Checkpoint) {
        let Checkpoint(mark) = checkpoint;
        let undone = self.journal.split_off(mark.min(self.journal.len()));
        for entry in undone.into_iter().rev() {
            match entry {
                Entry::Property(bucket, key) => {
                    if let Some(keys) = self.properties.get_mut(&bucket) {
                        keys.remove(&key);
                    }
                }
                Entry::Item(bucket, index) => {
                    if let Some(indices) = self.items.get_mut(&bucket) {
                        indices.remove(&index);
                    }
                }
                Entry::Edge(bucket, target) => {
                    if let Some(targets) = self.edges.get_mut(&bucket) {
                        targets.remove(&target);
                    }
                }
            }
        }
        self.close();
    }

    fn close(&mut self) {
        self.open = self.open.saturating_sub(1);
        if self.open == 0 {
            self.journal.clear();
        }
    }
}
