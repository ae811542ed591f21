//! Decay-chain introspection: the forward-reachable decay chain from a
//! root nuclide, exposed as a [`petgraph::Graph`] for diagnostics and
//! documentation. Purely a read; it has no bearing on solver semantics.

use std::collections::HashMap;

use petgraph::graph::NodeIndex;
use petgraph::Graph;

use crate::nuclide::NuclideId;

use super::DecayDatabase;

/// A decay chain: nodes are nuclides, edges carry the branching ratio of
/// the transition.
pub type DecayChain = Graph<NuclideId, f64>;

/// Builds the forward-reachable decay chain rooted at `root`, following the
/// same stack-based forward traversal the solver uses to compute reachable
/// support, but retaining the full graph shape instead of flattening it
/// into a dense submatrix.
pub fn build_chain(database: &DecayDatabase, root: NuclideId) -> DecayChain {
    let mut graph: DecayChain = Graph::new();
    let mut nodes: HashMap<NuclideId, NodeIndex> = HashMap::new();

    let Some(root_index) = database.index_of(root) else {
        graph.add_node(root);
        return graph;
    };

    fn get_or_insert(
        graph: &mut DecayChain,
        nodes: &mut HashMap<NuclideId, NodeIndex>,
        id: NuclideId,
    ) -> NodeIndex {
        *nodes.entry(id).or_insert_with(|| graph.add_node(id))
    }

    let mut stack = vec![root_index];
    let mut visited = std::collections::HashSet::new();
    visited.insert(root_index);
    get_or_insert(&mut graph, &mut nodes, root);

    while let Some(parent_idx) = stack.pop() {
        let parent_id = database.nuclide_at(parent_idx);
        for &(row, value) in database.matrix().column(parent_idx) {
            if row == parent_idx {
                continue; // the diagonal decay-in-place term, not an edge.
            }
            let daughter_id = database.nuclide_at(row);
            let parent_node = get_or_insert(&mut graph, &mut nodes, parent_id);
            let daughter_node = get_or_insert(&mut graph, &mut nodes, daughter_id);
            graph.add_edge(parent_node, daughter_node, value);

            if visited.insert(row) {
                stack.push(row);
            }
        }
    }

    graph
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::decay::DecayDatabase;

    #[test]
    fn visits_exactly_the_reachable_nuclides() {
        let path = std::env::temp_dir().join(format!(
            "fuelcycle-core-chain-test-{}.txt",
            std::process::id()
        ));
        std::fs::write(
            &path,
            "Sr-90 8.864e8 1\nY-90 1.0\n\
             Cs-137 9.4906e8 1\nBa-137 1.0\n",
        )
        .unwrap();
        let db = DecayDatabase::new();
        db.load_decay_info(&path).unwrap();
        let _ = std::fs::remove_file(&path);

        let sr90: NuclideId = "Sr-90".parse().unwrap();
        let chain = build_chain(&db, sr90);

        // Sr-90 -> Y-90 only; Cs-137/Ba-137 are not reachable from Sr-90.
        assert_eq!(chain.node_count(), 2);
        assert_eq!(chain.edge_count(), 1);
    }
}
