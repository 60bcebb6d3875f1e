//! The segmentation graph: a DAG over [`Segment`]s built by replaying
//! `Start`/`Join` events, whose reachability relation *is* happens-before.

use crate::core::events::ProcessEvent;
use crate::core::types::Segment;
use crate::error::{CoreError, CoreResult};
use fxhash::{FxHashMap, FxHashSet};

/// A directed acyclic graph of segments with a precomputed reachability
/// (transitive closure) cache, so that `happens_before` queries during
/// analysis are O(1) instead of repeating a graph search per pair of edges.
#[derive(Debug, Default)]
pub struct SegmentationGraph {
    vertices: FxHashSet<Segment>,
    edges: FxHashMap<Segment, FxHashSet<Segment>>,
    reachable: FxHashMap<Segment, FxHashSet<Segment>>,
}

impl SegmentationGraph {
    pub fn empty() -> Self {
        SegmentationGraph::default()
    }

    /// Replay `events`, in emission order, into a new segmentation graph.
    ///
    /// An empty input yields an empty graph. Otherwise the first event must
    /// be a `Start`; any other first event is a fatal
    /// [`CoreError::EventType`].
    pub fn build(events: &[ProcessEvent]) -> CoreResult<Self> {
        let mut graph = SegmentationGraph::default();
        let Some(first) = events.first() else {
            return Ok(graph);
        };
        match first {
            ProcessEvent::Start(s) => {
                graph.add_vertex(s.parent_segment);
            }
            other => {
                return Err(CoreError::EventType {
                    expected: "Start",
                    actual: other.variant_name(),
                });
            }
        }

        for event in events {
            match event {
                ProcessEvent::Start(s) => {
                    graph.add_vertex(s.new_parent_segment);
                    graph.add_vertex(s.child_segment);
                    graph.add_edge(s.parent_segment, s.new_parent_segment);
                    graph.add_edge(s.parent_segment, s.child_segment);
                }
                ProcessEvent::Join(j) => {
                    graph.add_vertex(j.new_parent_segment);
                    graph.add_edge(j.parent_segment, j.new_parent_segment);
                    graph.add_edge(j.child_segment, j.new_parent_segment);
                }
            }
        }

        graph.compute_transitive_closure();
        Ok(graph)
    }

    fn add_vertex(&mut self, s: Segment) {
        self.vertices.insert(s);
    }

    fn add_edge(&mut self, from: Segment, to: Segment) {
        self.add_vertex(from);
        self.add_vertex(to);
        self.edges.entry(from).or_default().insert(to);
    }

    /// Reachability from `u` to `v`, not reflexive: a segment never
    /// happens-before itself, and segments absent from the graph simply
    /// yield `false` rather than an error.
    pub fn happens_before(&self, u: Segment, v: Segment) -> bool {
        if u == v {
            return false;
        }
        self.reachable
            .get(&u)
            .map(|set| set.contains(&v))
            .unwrap_or(false)
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    fn compute_transitive_closure(&mut self) {
        // Simple fixed-point closure: fine for the segment counts a single
        // analyzed run produces (one segment per thread start/join).
        let mut reachable: FxHashMap<Segment, FxHashSet<Segment>> = FxHashMap::default();
        for &v in &self.vertices {
            let mut direct = FxHashSet::default();
            if let Some(succ) = self.edges.get(&v) {
                direct.extend(succ.iter().copied());
            }
            reachable.insert(v, direct);
        }

        let mut changed = true;
        while changed {
            changed = false;
            let snapshot = reachable.clone();
            for &v in &self.vertices {
                let additions: Vec<Segment> = snapshot[&v]
                    .iter()
                    .flat_map(|w| snapshot.get(w).into_iter().flatten().copied())
                    .collect();
                let set = reachable.get_mut(&v).unwrap();
                for a in additions {
                    if set.insert(a) {
                        changed = true;
                    }
                }
            }
        }

        self.reachable = reachable;
    }
}
