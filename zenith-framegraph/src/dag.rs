//! Generic directed acyclic graph with cycle detection, ordering and leveling.
//!
//! Nodes are stored densely in insertion order. Every query that has a free choice
//! between independent nodes resolves it through that order, so results are fully
//! reproducible for a given sequence of insertions.

use std::fmt::Debug;
use std::hash::Hash;
use log::trace;
use zenith_core::collections::SmallVec;
use zenith_core::collections::hashmap::HashMap;

/// One level of [`DependencyGraph::parallel_execution_levels`].
pub type ExecutionLevel<N> = SmallVec<[N; 8]>;

/// How [`DependencyGraph::add_edge`] checks for cycles.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum CycleCheckMode {
    /// Rescan the whole graph after every insertion.
    #[default]
    Full,
    /// Only search what is reachable from the new edge's target.
    Incremental,
}

#[derive(Debug, Clone)]
struct NodeSlot<N> {
    id: N,
    successors: SmallVec<[usize; 4]>,
    in_degree: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Color {
    White,
    Grey,
    Black,
}

#[derive(Debug, Clone)]
pub struct DependencyGraph<N> {
    slots: Vec<NodeSlot<N>>,
    index: HashMap<N, usize>,
    edge_count: usize,
    cycle_check: CycleCheckMode,
    // set once a cycle was closed, never cleared except by `clear`
    cyclic: bool,
}

impl<N: Copy + Eq + Hash + Debug> Default for DependencyGraph<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<N: Copy + Eq + Hash + Debug> DependencyGraph<N> {
    pub fn new() -> Self {
        Self::with_cycle_check(CycleCheckMode::default())
    }

    pub fn with_cycle_check(cycle_check: CycleCheckMode) -> Self {
        Self {
            slots: Vec::new(),
            index: HashMap::default(),
            edge_count: 0,
            cycle_check,
            cyclic: false,
        }
    }

    #[inline]
    pub fn cycle_check(&self) -> CycleCheckMode {
        self.cycle_check
    }

    /// Register `node` with no edges. Returns `false` if it already existed.
    pub fn add_node(&mut self, node: N) -> bool {
        let count = self.slots.len();
        self.slot_of_or_insert(node) == count
    }

    /// Add the dependency `from -> to`: `to` may only run once `from` completed.
    ///
    /// Missing endpoints are created. Inserting an edge that already exists changes
    /// nothing. Returns `false` if the graph now contains a cycle; the edge stays in
    /// the graph, and the caller decides whether that is fatal.
    pub fn add_edge(&mut self, from: N, to: N) -> bool {
        let from_slot = self.slot_of_or_insert(from);
        let to_slot = self.slot_of_or_insert(to);

        if !self.slots[from_slot].successors.contains(&to_slot) {
            self.slots[from_slot].successors.push(to_slot);
            self.slots[to_slot].in_degree += 1;
            self.edge_count += 1;
            trace!("Edge {:?} -> {:?}", from, to);
        }

        let acyclic = match self.cycle_check {
            CycleCheckMode::Full => !self.has_cycle(),
            CycleCheckMode::Incremental => !self.cyclic && !self.reaches(to_slot, from_slot),
        };
        self.cyclic |= !acyclic;

        acyclic
    }

    pub fn has_cycle(&self) -> bool {
        let mut color = vec![Color::White; self.slots.len()];
        let mut stack: Vec<(usize, usize)> = Vec::new();

        for root in 0..self.slots.len() {
            if color[root] != Color::White {
                continue;
            }

            color[root] = Color::Grey;
            stack.push((root, 0));

            while let Some(frame) = stack.last_mut() {
                let node = frame.0;
                match self.slots[node].successors.get(frame.1).copied() {
                    Some(next) => {
                        frame.1 += 1;
                        match color[next] {
                            // back edge
                            Color::Grey => return true,
                            Color::White => {
                                color[next] = Color::Grey;
                                stack.push((next, 0));
                            }
                            Color::Black => {}
                        }
                    }
                    None => {
                        color[node] = Color::Black;
                        stack.pop();
                    }
                }
            }
        }

        false
    }

    /// Linear order in which every edge points forward.
    ///
    /// Reverse post-order of a depth first search that visits roots and successors in
    /// reverse insertion order, which lists unrelated nodes in insertion order.
    /// Meaningless on a cyclic graph.
    pub fn topological_sort(&self) -> Vec<N> {
        let mut visited = vec![false; self.slots.len()];
        let mut post_order = Vec::with_capacity(self.slots.len());
        let mut stack: Vec<(usize, usize)> = Vec::new();

        for root in (0..self.slots.len()).rev() {
            if visited[root] {
                continue;
            }

            visited[root] = true;
            stack.push((root, 0));

            while let Some(frame) = stack.last_mut() {
                let node = frame.0;
                let successors = &self.slots[node].successors;

                if frame.1 < successors.len() {
                    let next = successors[successors.len() - 1 - frame.1];
                    frame.1 += 1;

                    if !visited[next] {
                        visited[next] = true;
                        stack.push((next, 0));
                    }
                } else {
                    post_order.push(self.slots[node].id);
                    stack.pop();
                }
            }
        }

        post_order.reverse();
        post_order
    }

    /// Kahn's algorithm, one round per level.
    ///
    /// A node's level is one past the deepest of its predecessors, 0 without any. Nodes
    /// in one level have no path between them. On a cyclic graph every node on or
    /// behind a cycle is missing from the result.
    pub fn parallel_execution_levels(&self) -> Vec<ExecutionLevel<N>> {
        let mut in_degree = self.slots
            .iter()
            .map(|slot| slot.in_degree)
            .collect::<Vec<_>>();

        let mut current = (0..self.slots.len())
            .filter(|&slot| in_degree[slot] == 0)
            .collect::<SmallVec<[usize; 8]>>();
        let mut levels = Vec::new();

        while !current.is_empty() {
            let mut next = SmallVec::<[usize; 8]>::new();

            for &slot in &current {
                for &successor in &self.slots[slot].successors {
                    in_degree[successor] -= 1;
                    if in_degree[successor] == 0 {
                        next.push(successor);
                    }
                }
            }

            levels.push(current
                .iter()
                .map(|&slot| self.slots[slot].id)
                .collect());
            current = next;
        }

        levels
    }

    pub fn is_adjacent_to(&self, from: N, to: N) -> bool {
        match (self.index.get(&from), self.index.get(&to)) {
            (Some(&from), Some(to)) => self.slots[from].successors.contains(to),
            _ => false,
        }
    }

    #[inline]
    pub fn contains(&self, node: N) -> bool {
        self.index.contains_key(&node)
    }

    #[inline]
    pub fn node_count(&self) -> usize {
        self.slots.len()
    }

    #[inline]
    pub fn edge_count(&self) -> usize {
        self.edge_count
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn in_degree(&self, node: N) -> Option<u32> {
        self.index
            .get(&node)
            .map(|&slot| self.slots[slot].in_degree)
    }

    pub fn nodes(&self) -> impl Iterator<Item = N> + '_ {
        self.slots.iter().map(|slot| slot.id)
    }

    pub fn successors(&self, node: N) -> impl Iterator<Item = N> + '_ {
        self.index
            .get(&node)
            .into_iter()
            .flat_map(move |&slot| self.slots[slot].successors.iter())
            .map(move |&successor| self.slots[successor].id)
    }

    pub fn predecessors(&self, node: N) -> impl Iterator<Item = N> + '_ {
        let target = self.index.get(&node).copied();
        self.slots
            .iter()
            .filter(move |slot| target.is_some_and(|target| slot.successors.contains(&target)))
            .map(|slot| slot.id)
    }

    pub fn edges(&self) -> impl Iterator<Item = (N, N)> + '_ {
        self.slots.iter().flat_map(move |slot| {
            slot.successors
                .iter()
                .map(move |&successor| (slot.id, self.slots[successor].id))
        })
    }

    pub fn clear(&mut self) {
        self.slots.clear();
        self.index.clear();
        self.edge_count = 0;
        self.cyclic = false;
    }

    fn slot_of_or_insert(&mut self, node: N) -> usize {
        if let Some(&slot) = self.index.get(&node) {
            return slot;
        }

        let slot = self.slots.len();
        self.slots.push(NodeSlot {
            id: node,
            successors: SmallVec::new(),
            in_degree: 0,
        });
        self.index.insert(node, slot);
        slot
    }

    fn reaches(&self, start: usize, target: usize) -> bool {
        if start == target {
            return true;
        }

        let mut visited = vec![false; self.slots.len()];
        let mut stack = vec![start];
        visited[start] = true;

        while let Some(slot) = stack.pop() {
            for &successor in &self.slots[slot].successors {
                if successor == target {
                    return true;
                }
                if !visited[successor] {
                    visited[successor] = true;
                    stack.push(successor);
                }
            }
        }

        false
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;
    use super::*;

    fn graph_from(mode: CycleCheckMode, edges: &[(u32, u32)]) -> DependencyGraph<u32> {
        let mut graph = DependencyGraph::with_cycle_check(mode);
        for &(from, to) in edges {
            assert!(graph.add_edge(from, to), "edge {from} -> {to} reported a cycle");
        }
        graph
    }

    fn diamond(mode: CycleCheckMode) -> DependencyGraph<u32> {
        graph_from(mode, &[(1, 2), (1, 5), (2, 3), (3, 4), (5, 6), (6, 4), (4, 7)])
    }

    fn levels_of(graph: &DependencyGraph<u32>) -> Vec<Vec<u32>> {
        graph
            .parallel_execution_levels()
            .into_iter()
            .map(|level| level.to_vec())
            .collect()
    }

    fn assert_topological(graph: &DependencyGraph<u32>, order: &[u32]) {
        assert_eq!(order.len(), graph.node_count());
        let position = |node: u32| order.iter().position(|&n| n == node).unwrap();
        for (from, to) in graph.edges() {
            assert!(position(from) < position(to), "{from} must come before {to} in {order:?}");
        }
    }

    fn assert_level_rule(graph: &DependencyGraph<u32>, levels: &[Vec<u32>]) {
        let level = |node: u32| levels.iter().position(|level| level.contains(&node)).unwrap();

        let total = levels.iter().map(Vec::len).sum::<usize>();
        assert_eq!(total, graph.node_count());

        for node in graph.nodes() {
            assert_eq!(levels.iter().filter(|l| l.contains(&node)).count(), 1);

            let expected = graph
                .predecessors(node)
                .map(|pred| level(pred) + 1)
                .max()
                .unwrap_or(0);
            assert_eq!(level(node), expected, "level of {node}");
        }
    }

    #[rstest]
    #[case::full(CycleCheckMode::Full)]
    #[case::incremental(CycleCheckMode::Incremental)]
    fn chain_sorts_in_order(#[case] mode: CycleCheckMode) {
        let edges = (1..11).map(|n| (n, n + 1)).collect::<Vec<_>>();
        let graph = graph_from(mode, &edges);

        assert_eq!(graph.topological_sort(), (1..=11).collect::<Vec<_>>());
        assert!(!graph.has_cycle());
    }

    #[rstest]
    #[case::full(CycleCheckMode::Full)]
    #[case::incremental(CycleCheckMode::Incremental)]
    fn diamond_levels(#[case] mode: CycleCheckMode) {
        let graph = diamond(mode);

        let levels = levels_of(&graph);
        assert_eq!(levels, vec![vec![1], vec![2, 5], vec![3, 6], vec![4], vec![7]]);
        assert_level_rule(&graph, &levels);
    }

    #[test]
    fn diamond_sort_is_fixed() {
        let graph = diamond(CycleCheckMode::Full);
        let order = graph.topological_sort();

        assert_eq!(order, vec![1, 2, 5, 3, 6, 4, 7]);
        assert_topological(&graph, &order);
    }

    #[test]
    fn unrelated_nodes_keep_insertion_order() {
        let mut graph = DependencyGraph::<u32>::new();
        for node in [4, 8, 15, 16] {
            assert!(graph.add_node(node));
        }
        assert!(!graph.add_node(8));

        assert_eq!(graph.topological_sort(), vec![4, 8, 15, 16]);
        assert_eq!(levels_of(&graph), vec![vec![4, 8, 15, 16]]);
    }

    #[test]
    fn two_independent_chains() {
        let graph = graph_from(CycleCheckMode::Full, &[(1, 2), (3, 4)]);

        let order = graph.topological_sort();
        assert_eq!(order, vec![1, 2, 3, 4]);
        assert_eq!(levels_of(&graph), vec![vec![1, 3], vec![2, 4]]);
    }

    #[test]
    fn longest_path_decides_level() {
        // 1 -> 4 directly and through 2 -> 3
        let graph = graph_from(CycleCheckMode::Full, &[(1, 4), (1, 2), (2, 3), (3, 4)]);

        let levels = levels_of(&graph);
        assert_eq!(levels, vec![vec![1], vec![2], vec![3], vec![4]]);
        assert_level_rule(&graph, &levels);
        assert_topological(&graph, &graph.topological_sort());
    }

    #[rstest]
    #[case::full(CycleCheckMode::Full)]
    #[case::incremental(CycleCheckMode::Incremental)]
    fn closing_a_cycle_is_reported(#[case] mode: CycleCheckMode) {
        let mut graph = graph_from(mode, &[(1, 2), (2, 3)]);

        assert!(!graph.add_edge(3, 1));
        assert!(graph.has_cycle());
        // the graph stays cyclic for every later insertion
        assert!(!graph.add_edge(3, 4));
        assert!(graph.is_adjacent_to(3, 1));
    }

    #[rstest]
    #[case::full(CycleCheckMode::Full)]
    #[case::incremental(CycleCheckMode::Incremental)]
    fn self_edge_is_a_cycle(#[case] mode: CycleCheckMode) {
        let mut graph = DependencyGraph::<u32>::with_cycle_check(mode);
        assert!(!graph.add_edge(1, 1));
        assert!(graph.has_cycle());
    }

    #[test]
    fn duplicate_edges_are_ignored() {
        let mut graph = graph_from(CycleCheckMode::Full, &[(1, 2)]);
        assert!(graph.add_edge(1, 2));

        assert_eq!(graph.edge_count(), 1);
        assert_eq!(graph.in_degree(2), Some(1));
        assert_eq!(levels_of(&graph), vec![vec![1], vec![2]]);
    }

    #[test]
    fn adjacency_is_directed() {
        let graph = graph_from(CycleCheckMode::Full, &[(1, 2), (2, 3)]);

        assert!(graph.is_adjacent_to(1, 2));
        assert!(!graph.is_adjacent_to(2, 1));
        assert!(!graph.is_adjacent_to(1, 3));
        assert!(!graph.is_adjacent_to(1, 99));
    }

    #[test]
    fn accepted_edges_never_leave_a_cycle() {
        // forward edges only, over a fixed permutation
        let order = [5u32, 2, 9, 0, 7, 3, 8, 1, 6, 4];
        let mut full = DependencyGraph::with_cycle_check(CycleCheckMode::Full);
        let mut incremental = DependencyGraph::with_cycle_check(CycleCheckMode::Incremental);

        for (i, &a) in order.iter().enumerate() {
            for &b in &order[i + 1..] {
                if (a + b) % 3 == 0 {
                    assert!(full.add_edge(a, b));
                    assert!(incremental.add_edge(a, b));
                    assert!(!full.has_cycle());
                }
            }
        }

        assert_eq!(full.topological_sort(), incremental.topological_sort());
        assert_topological(&full, &full.topological_sort());
        assert_level_rule(&full, &levels_of(&full));

        assert_eq!(full.add_edge(4, 5), incremental.add_edge(4, 5));
    }

    #[test]
    fn queries_are_idempotent() {
        let graph = diamond(CycleCheckMode::Full);

        assert_eq!(graph.topological_sort(), graph.topological_sort());
        assert_eq!(graph.parallel_execution_levels(), graph.parallel_execution_levels());
    }

    #[test]
    fn neighbours() {
        let graph = diamond(CycleCheckMode::Full);

        assert_eq!(graph.successors(1).collect::<Vec<_>>(), vec![2, 5]);
        assert_eq!(graph.predecessors(4).collect::<Vec<_>>(), vec![3, 6]);
        assert_eq!(graph.successors(42).count(), 0);
        assert_eq!(graph.in_degree(4), Some(2));
        assert_eq!(graph.in_degree(42), None);
    }

    #[test]
    fn clear_resets_cycle_state() {
        let mut graph = DependencyGraph::<u32>::with_cycle_check(CycleCheckMode::Incremental);
        assert!(!graph.add_edge(1, 1));

        graph.clear();
        assert!(graph.is_empty());
        assert_eq!(graph.edge_count(), 0);
        assert!(graph.add_edge(1, 2));
    }

    #[test]
    fn empty_graph() {
        let graph = DependencyGraph::<u32>::new();
        assert!(graph.topological_sort().is_empty());
        assert!(graph.parallel_execution_levels().is_empty());
        assert!(!graph.has_cycle());
    }
}
