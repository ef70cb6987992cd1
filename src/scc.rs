//! Strongly-connected components of the first-set graph, left-recursion
//! tagging, and leader selection.
//!
//! Grounded on `compute_left_recursives` in
//! `examples/original_source/pegen/parser_generator.py`, with the general
//! cycle-analysis idiom of `src/classification/cyclical.rs` /
//! `src/classification/recursive.rs` (a dedicated pass that tags rules in
//! place and can fail the whole grammar).
//!
//! Leader-candidate selection is restated algorithmically from the
//! original: instead of enumerating every simple cycle in the SCC and
//! intersecting their vertex sets, a vertex `v` is a leader candidate iff
//! the SCC's induced subgraph with `v` removed has no cycle. The two
//! conditions are equivalent — `v` lies on every simple cycle of a graph
//! iff no cycle survives deleting `v` — and the restated form avoids
//! enumerating a potentially exponential family of simple cycles.

use log::{debug, trace};
use std::collections::{BTreeSet, HashMap, HashSet};

use crate::error::GrammarError;
use crate::first::FirstGraph;
use crate::ir::Grammar;

/// Runs SCC analysis over `graph` and tags `left_recursive` / `leader` on
/// the corresponding rules in `grammar`.
///
/// Returns the SCCs in Tarjan's emission order (reverse topological),
/// each as a `BTreeSet` of rule names, for callers (and tests) that want
/// to inspect the partition.
pub fn compute_left_recursion(
    grammar: &mut Grammar,
    graph: &FirstGraph,
) -> Result<Vec<BTreeSet<String>>, GrammarError> {
    let sccs = tarjan_sccs(graph);

    for scc in &sccs {
        if scc.len() == 1 {
            let name = scc.iter().next().unwrap();
            if graph.get(name).map(|succ| succ.contains(name)).unwrap_or(false) {
                trace!("{name} is left-recursive (self-loop)");
                let rule = grammar.rule_mut(name).expect("SCC vertex is a known rule");
                rule.flags.left_recursive = true;
                rule.flags.leader = true;
            }
            continue;
        }

        debug!("SCC {:?} is left-recursive", scc);
        for name in scc {
            let rule = grammar.rule_mut(name).expect("SCC vertex is a known rule");
            rule.flags.left_recursive = true;
        }

        let leader = choose_leader(graph, scc)?;
        trace!("SCC {:?} leader: {}", scc, leader);
        grammar
            .rule_mut(&leader)
            .expect("leader is a member of the SCC")
            .flags
            .leader = true;
    }

    Ok(sccs)
}

/// Picks the lexicographically smallest member common to every simple
/// cycle within `scc`. Rule names are `String`, totally ordered by `Ord`,
/// so this is reproducible run to run.
fn choose_leader(graph: &FirstGraph, scc: &BTreeSet<String>) -> Result<String, GrammarError> {
    let mut candidates = BTreeSet::new();
    for v in scc {
        if !induced_subgraph_has_cycle(graph, scc, v) {
            candidates.insert(v.clone());
        }
    }
    candidates
        .into_iter()
        .next()
        .ok_or_else(|| GrammarError::NoLeaderCandidate {
            members: scc.iter().cloned().collect(),
        })
}

/// Whether the subgraph induced by `scc \ {excluded}` (edges restricted to
/// that vertex set) contains a cycle.
fn induced_subgraph_has_cycle(graph: &FirstGraph, scc: &BTreeSet<String>, excluded: &str) -> bool {
    let mut visiting = HashSet::new();
    let mut done = HashSet::new();

    fn visit(
        v: &str,
        graph: &FirstGraph,
        scc: &BTreeSet<String>,
        excluded: &str,
        visiting: &mut HashSet<String>,
        done: &mut HashSet<String>,
    ) -> bool {
        if done.contains(v) {
            return false;
        }
        visiting.insert(v.to_string());
        let mut found = false;
        if let Some(succ) = graph.get(v) {
            for w in succ {
                if w == excluded || !scc.contains(w) {
                    continue;
                }
                if visiting.contains(w) {
                    found = true;
                    break;
                }
                if visit(w, graph, scc, excluded, visiting, done) {
                    found = true;
                    break;
                }
            }
        }
        visiting.remove(v);
        done.insert(v.to_string());
        found
    }

    for v in scc {
        if v == excluded {
            continue;
        }
        if visit(v, graph, scc, excluded, &mut visiting, &mut done) {
            return true;
        }
    }
    false
}

/// Tarjan's algorithm, visiting vertices in `graph`'s own (insertion)
/// order for a deterministic SCC emission order, and each vertex's
/// successors in sorted (`BTreeSet`) order for deterministic recursion.
fn tarjan_sccs(graph: &FirstGraph) -> Vec<BTreeSet<String>> {
    struct State<'g> {
        graph: &'g FirstGraph,
        counter: usize,
        index: HashMap<String, usize>,
        lowlink: HashMap<String, usize>,
        on_stack: HashSet<String>,
        stack: Vec<String>,
        sccs: Vec<BTreeSet<String>>,
    }

    fn strongconnect(v: &str, st: &mut State) {
        st.index.insert(v.to_string(), st.counter);
        st.lowlink.insert(v.to_string(), st.counter);
        st.counter += 1;
        st.stack.push(v.to_string());
        st.on_stack.insert(v.to_string());

        if let Some(succ) = st.graph.get(v) {
            for w in succ.clone() {
                if !st.index.contains_key(&w) {
                    strongconnect(&w, st);
                    let w_low = st.lowlink[&w];
                    let v_low = st.lowlink[v];
                    st.lowlink.insert(v.to_string(), v_low.min(w_low));
                } else if st.on_stack.contains(&w) {
                    let w_idx = st.index[&w];
                    let v_low = st.lowlink[v];
                    st.lowlink.insert(v.to_string(), v_low.min(w_idx));
                }
            }
        }

        if st.lowlink[v] == st.index[v] {
            let mut scc = BTreeSet::new();
            loop {
                let w = st.stack.pop().expect("stack non-empty while closing SCC");
                st.on_stack.remove(&w);
                let done = w == v;
                scc.insert(w);
                if done {
                    break;
                }
            }
            st.sccs.push(scc);
        }
    }

    let mut st = State {
        graph,
        counter: 0,
        index: HashMap::new(),
        lowlink: HashMap::new(),
        on_stack: HashSet::new(),
        stack: Vec::new(),
        sccs: Vec::new(),
    };

    for v in graph.keys() {
        if !st.index.contains_key(v) {
            strongconnect(v, &mut st);
        }
    }

    st.sccs
}
