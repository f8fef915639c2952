use std::collections::{HashSet, VecDeque};

use refsync_types::Oid;

use crate::memory::Repository;

/// Object negotiation: computes which objects must travel to bring one
/// repository's tips into another.
pub struct NegotiationEngine;

impl NegotiationEngine {
    /// Objects reachable from `tips` in `source` that `target` lacks, in
    /// breadth-first order from the tips. The walk stops at any object
    /// `target` already has, since its ancestry is present too.
    pub fn compute_wants(source: &Repository, tips: &[Oid], target: &Repository) -> Vec<Oid> {
        let mut wants = Vec::new();
        let mut seen: HashSet<Oid> = HashSet::new();
        let mut queue: VecDeque<Oid> = tips.iter().copied().collect();

        while let Some(oid) = queue.pop_front() {
            if target.contains(&oid) || !seen.insert(oid) {
                continue;
            }
            if let Some(record) = source.object(&oid) {
                wants.push(oid);
                queue.extend(record.parents.iter().copied());
            }
        }
        wants
    }
}
