//! Enumeration of every simple (elementary) cycle in a [`LockGraph`],
//! following Johnson's algorithm: restricting each search to the subgraph
//! of vertices at or above the start index guarantees each elementary
//! circuit is found exactly once, with its lowest-indexed vertex as the
//! start — so cycles that are rotations of one another are never both
//! emitted.
//!
//! The graph is a multigraph: two locks can be connected by more than one
//! edge (the same pair acquired together more than once, in different
//! segments or gatelock contexts). Each edge is a materially different
//! potential-deadlock witness, so the enumeration walks individual edges
//! rather than collapsing to unique neighbors — a vertex cycle with two
//! parallel edges on one step yields two distinct `Cycle`s.

use crate::core::graph::{EdgeRef, LockGraph};
use fxhash::{FxHashMap, FxHashSet};

/// One elementary cycle, as the ordered edges that trace it: `edges[0].from`
/// is the start vertex and `edges.last().to` returns to it.
#[derive(Debug, Clone)]
pub struct Cycle {
    pub edges: Vec<EdgeRef>,
}

pub fn enumerate_cycles(graph: &LockGraph) -> Vec<Cycle> {
    let mut results = Vec::new();
    for s in graph.vertex_indices() {
        let mut blocked: FxHashMap<usize, bool> = FxHashMap::default();
        let mut block_map: FxHashMap<usize, FxHashSet<usize>> = FxHashMap::default();
        let mut stack: Vec<EdgeRef> = Vec::new();
        circuit(graph, s, s, &mut blocked, &mut block_map, &mut stack, &mut results);
    }
    results
}

fn circuit(
    graph: &LockGraph,
    v: usize,
    s: usize,
    blocked: &mut FxHashMap<usize, bool>,
    block_map: &mut FxHashMap<usize, FxHashSet<usize>>,
    stack: &mut Vec<EdgeRef>,
    results: &mut Vec<Cycle>,
) -> bool {
    let mut found = false;
    blocked.insert(v, true);

    for edge in graph.edges_from(v) {
        if edge.to < s {
            continue;
        }
        if edge.to == s {
            stack.push(edge);
            results.push(Cycle {
                edges: stack.clone(),
            });
            stack.pop();
            found = true;
        } else if !*blocked.get(&edge.to).unwrap_or(&false) {
            stack.push(edge.clone());
            if circuit(graph, edge.to, s, blocked, block_map, stack, results) {
                found = true;
            }
            stack.pop();
        }
    }

    if found {
        unblock(v, blocked, block_map);
    } else {
        for edge in graph.edges_from(v) {
            if edge.to < s {
                continue;
            }
            block_map.entry(edge.to).or_default().insert(v);
        }
    }

    found
}

fn unblock(
    v: usize,
    blocked: &mut FxHashMap<usize, bool>,
    block_map: &mut FxHashMap<usize, FxHashSet<usize>>,
) {
    blocked.insert(v, false);
    if let Some(dependents) = block_map.get_mut(&v) {
        let dependents: Vec<usize> = dependents.drain().collect();
        for w in dependents {
            if *blocked.get(&w).unwrap_or(&false) {
                unblock(w, blocked, block_map);
            }
        }
    }
}
