//! # Dependency Resolver
//!
//! Orders the compute fields of one parser mapping and detects reference
//! cycles. Placeholder references (`{name}`) inside a compute expression are
//! edges when the name is another key of the same mapping; references to
//! names outside the mapping are recorded as "missing" — external lookups
//! assumed to exist on the item being parsed — and do not participate in
//! ordering or cycle detection.
//!
//! The sort is a depth-first topological sort, stable with respect to the
//! mapping's insertion order: when several orders are valid, fields keep
//! their definition order. Cycles are reported as the full path from the
//! revisited field back to itself (`["a", "b", "a"]`), never thrown; the
//! caller decides whether a cycle is fatal.

use crate::ir::FieldMapping;
use crate::template::extract_field_references;
use indexmap::{IndexMap, IndexSet};

/// Result of analyzing one mapping.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DependencyAnalysis {
    /// Compute fields whose whole dependency closure lives in the mapping,
    /// in dependency order (inputs before dependents)
    pub ordered: Vec<String>,
    /// Every detected reference cycle, as a full path ending where it began
    pub cycles: Vec<Vec<String>>,
    /// Per compute field, the referenced names that are not mapping keys
    /// (unique, first-seen order)
    pub missing: IndexMap<String, Vec<String>>,
    /// Fields on a cycle, or depending on one transitively; these are never
    /// safe to emit
    pub unresolved: Vec<String>,
    /// Acyclic compute fields excluded from `ordered` only because they (or
    /// a dependency) read external names; still emittable, in dependency
    /// order, after every `ordered` field
    pub blocked: Vec<String>,
}

/// Extracts the raw references of one compute mapping: placeholder
/// references in left-to-right order with duplicates preserved, followed by
/// any explicit dependency names not already extracted.
pub fn mapping_references(mapping: &FieldMapping) -> Vec<String> {
    match mapping {
        FieldMapping::Compute { expr, deps } => {
            let mut refs = extract_field_references(expr);
            for dep in deps {
                if !refs.contains(dep) {
                    refs.push(dep.clone());
                }
            }
            refs
        }
        _ => Vec::new(),
    }
}

#[derive(Clone, Copy, PartialEq)]
enum VisitState {
    Unvisited,
    InProgress,
    Done,
}

struct Sorter<'a> {
    edges: &'a IndexMap<String, Vec<String>>,
    state: IndexMap<String, VisitState>,
    stack: Vec<String>,
    topo: Vec<String>,
    cycles: Vec<Vec<String>>,
    cycled: IndexSet<String>,
}

impl<'a> Sorter<'a> {
    fn visit(&mut self, node: &str) {
        match self.state[node] {
            VisitState::Done => return,
            VisitState::InProgress => {
                // Back edge: report the path from the revisited node back
                // to itself, inclusive
                let pos = self
                    .stack
                    .iter()
                    .position(|n| n == node)
                    .expect("in-progress node is on the stack");
                let mut cycle: Vec<String> = self.stack[pos..].to_vec();
                for member in &cycle {
                    self.cycled.insert(member.clone());
                }
                cycle.push(node.to_string());
                self.cycles.push(cycle);
                return;
            }
            VisitState::Unvisited => {}
        }

        self.state[node] = VisitState::InProgress;
        self.stack.push(node.to_string());
        let deps = self.edges[node].clone();
        for dep in &deps {
            self.visit(dep);
        }
        self.stack.pop();
        self.state[node] = VisitState::Done;
        self.topo.push(node.to_string());
    }
}

/// Analyzes the compute fields of a parser mapping.
///
/// Non-compute fields (literal/path/from_context) are not graph nodes: an
/// in-mapping reference to one is always satisfiable and needs no ordering.
pub fn analyze(mapping: &IndexMap<String, FieldMapping>) -> DependencyAnalysis {
    // Edges between compute fields, deduplicated, first-seen order; and the
    // out-of-mapping references per field
    let mut edges: IndexMap<String, Vec<String>> = IndexMap::new();
    let mut missing: IndexMap<String, Vec<String>> = IndexMap::new();

    for (field, field_mapping) in mapping {
        if !field_mapping.is_compute() {
            continue;
        }
        let mut field_edges = Vec::new();
        let mut field_missing = Vec::new();
        for reference in mapping_references(field_mapping) {
            match mapping.get(&reference) {
                Some(target) => {
                    if target.is_compute() && !field_edges.contains(&reference) {
                        field_edges.push(reference);
                    }
                }
                None => {
                    if !field_missing.contains(&reference) {
                        field_missing.push(reference);
                    }
                }
            }
        }
        edges.insert(field.clone(), field_edges);
        if !field_missing.is_empty() {
            missing.insert(field.clone(), field_missing);
        }
    }

    let mut sorter = Sorter {
        edges: &edges,
        state: edges
            .keys()
            .map(|k| (k.clone(), VisitState::Unvisited))
            .collect(),
        stack: Vec::new(),
        topo: Vec::new(),
        cycles: Vec::new(),
        cycled: IndexSet::new(),
    };
    // Root order is mapping insertion order, which makes the sort stable
    let roots: Vec<String> = edges.keys().cloned().collect();
    for root in &roots {
        sorter.visit(root);
    }

    // A field depending on a cycled field, directly or transitively, is
    // itself unresolved. Dependencies precede dependents in topo order, so
    // one forward pass settles the closure.
    let mut tainted = sorter.cycled.clone();
    for field in &sorter.topo {
        if tainted.contains(field) {
            continue;
        }
        if edges[field].iter().any(|dep| tainted.contains(dep)) {
            tainted.insert(field.clone());
        }
    }
    let unresolved: Vec<String> = edges
        .keys()
        .filter(|k| tainted.contains(*k))
        .cloned()
        .collect();

    // Same forward pass for the missing-reference taint
    let mut externally_blocked: IndexSet<String> = missing.keys().cloned().collect();
    for field in &sorter.topo {
        if externally_blocked.contains(field) {
            continue;
        }
        if edges[field].iter().any(|dep| externally_blocked.contains(dep)) {
            externally_blocked.insert(field.clone());
        }
    }

    let mut ordered = Vec::new();
    let mut blocked = Vec::new();
    for field in &sorter.topo {
        if tainted.contains(field) {
            continue;
        }
        if externally_blocked.contains(field) {
            blocked.push(field.clone());
        } else {
            ordered.push(field.clone());
        }
    }

    log::debug!(
        "dependency analysis: {} compute fields, {} ordered, {} cycles, {} missing",
        edges.len(),
        ordered.len(),
        sorter.cycles.len(),
        missing.len()
    );

    DependencyAnalysis {
        ordered,
        cycles: sorter.cycles,
        missing,
        unresolved,
        blocked,
    }
}

impl DependencyAnalysis {
    /// Every emittable compute field in a dependency-respecting order:
    /// fully-resolved fields first, then externally-blocked ones. Ordered
    /// fields never depend on blocked ones (the closure would carry the
    /// missing reference), so the concatenation is safe.
    pub fn emission_order(&self) -> Vec<String> {
        let mut order = self.ordered.clone();
        order.extend(self.blocked.iter().cloned());
        order
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn path(p: &str) -> FieldMapping {
        FieldMapping::Path {
            path: p.to_string(),
            transform: None,
            default: None,
        }
    }

    fn compute(expr: &str) -> FieldMapping {
        FieldMapping::Compute {
            expr: expr.to_string(),
            deps: Vec::new(),
        }
    }

    fn mapping(entries: &[(&str, FieldMapping)]) -> IndexMap<String, FieldMapping> {
        entries
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn orders_chained_compute_fields() {
        let m = mapping(&[
            ("last", path("last")),
            ("open", path("open")),
            ("change", compute("{last} - {open}")),
            ("changePercent", compute("({change} / {open}) * 100")),
        ]);
        let analysis = analyze(&m);
        assert_eq!(analysis.ordered, vec!["change", "changePercent"]);
        assert!(analysis.cycles.is_empty());
        assert!(analysis.missing.is_empty());
        assert!(analysis.unresolved.is_empty());
    }

    #[test]
    fn missing_reference_blocks_ordering_but_is_not_a_cycle() {
        let m = mapping(&[
            ("price", path("price")),
            ("normalized", compute("{price} / {divider}")),
        ]);
        let analysis = analyze(&m);
        assert_eq!(analysis.ordered, Vec::<String>::new());
        assert_eq!(analysis.missing["normalized"], vec!["divider"]);
        assert!(analysis.cycles.is_empty());
        assert!(analysis.unresolved.is_empty());
        assert_eq!(analysis.blocked, vec!["normalized"]);
    }

    #[test]
    fn two_field_cycle_is_reported_once_with_full_path() {
        let m = mapping(&[("a", compute("{b}")), ("b", compute("{a}"))]);
        let analysis = analyze(&m);
        assert_eq!(analysis.cycles, vec![vec!["a", "b", "a"]]);
        assert_eq!(analysis.unresolved, vec!["a", "b"]);
        assert!(analysis.ordered.is_empty());
    }

    #[test]
    fn self_reference_is_a_cycle() {
        let m = mapping(&[("a", compute("{a} + 1"))]);
        let analysis = analyze(&m);
        assert_eq!(analysis.cycles, vec![vec!["a", "a"]]);
        assert_eq!(analysis.unresolved, vec!["a"]);
    }

    #[test]
    fn dependents_of_a_cycle_are_unresolved_not_cycled() {
        let m = mapping(&[
            ("a", compute("{b}")),
            ("b", compute("{a}")),
            ("c", compute("{a} * 2")),
        ]);
        let analysis = analyze(&m);
        assert_eq!(analysis.cycles.len(), 1);
        assert_eq!(analysis.unresolved, vec!["a", "b", "c"]);
        assert!(analysis.ordered.is_empty());
    }

    #[test]
    fn explicit_deps_union_with_extracted_references() {
        let m = FieldMapping::Compute {
            expr: "{last} - {open}".to_string(),
            deps: vec!["open".to_string(), "volume".to_string()],
        };
        assert_eq!(mapping_references(&m), vec!["last", "open", "volume"]);
    }

    #[test]
    fn duplicate_references_preserved_in_extraction_deduplicated_as_edges() {
        let m = mapping(&[
            ("open", compute("{raw_open}")),
            ("spread", compute("({open} + {open}) / {open}")),
        ]);
        assert_eq!(
            mapping_references(&m["spread"]),
            vec!["open", "open", "open"]
        );
        let analysis = analyze(&m);
        // raw_open is external, so open is blocked and spread follows it
        assert_eq!(analysis.blocked, vec!["open", "spread"]);
        assert_eq!(analysis.emission_order(), vec!["open", "spread"]);
    }
}
