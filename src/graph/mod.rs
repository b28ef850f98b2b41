pub mod rank;

use std::collections::HashMap;

/// How a node was discovered during expansion. The traversal root carries no
/// role at all (`None`), and a node keeps the role of its first insertion even
/// if a later branch reaches it through a different relation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Hypernym,
    Hyponym,
    TranslatedSynonym,
    Generated,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Relation {
    Hypernym,
    Hyponym,
    TranslatedSynonym,
    CulturalAdaptation,
}

/// Canonical graph identity for a concept label.
///
/// ConceptNet uses space-separated labels in edge payloads but
/// underscore-joined terms in node ids; both notations must land on the same
/// node. Lowercasing folds the API's inconsistent label casing too.
pub fn normalize_key(label: &str) -> String {
    label.trim().to_lowercase().replace(' ', "_")
}

/// Human-readable form of a concept label, for output rows.
pub fn display_form(label: &str) -> String {
    label.trim().replace('_', " ")
}

#[derive(Debug, Clone)]
pub struct ConceptNode {
    pub key: String,
    pub display: String,
    pub language: String,
    pub role: Option<Role>,
}

/// Directed multigraph over normalized concept keys.
///
/// Owns the nodes and edges for exactly one source concept's run. Node and
/// outbound-edge order is insertion order, which the expansion schedule and
/// the ranker's tie-breaking both rely on.
#[derive(Debug, Default)]
pub struct ConceptGraph {
    nodes: HashMap<String, ConceptNode>,
    order: Vec<String>,
    edges: HashMap<String, Vec<(String, Relation)>>,
    edge_count: usize,
}

impl ConceptGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a node if absent. Re-inserting an existing key is a no-op:
    /// the stored role, language, and display form all keep their first
    /// values. Returns whether a new node was created.
    pub fn add_node(&mut self, label: &str, language: &str, role: Option<Role>) -> bool {
        let key = normalize_key(label);
        if self.nodes.contains_key(&key) {
            return false;
        }
        self.order.push(key.clone());
        self.nodes.insert(
            key.clone(),
            ConceptNode {
                display: display_form(label),
                language: language.to_string(),
                role,
                key,
            },
        );
        true
    }

    /// Inserts a directed edge. Both endpoints must already be nodes;
    /// otherwise nothing is inserted. Duplicate (source, target, relation)
    /// triples are a no-op. Returns whether an edge was inserted.
    pub fn add_edge(&mut self, source: &str, target: &str, relation: Relation) -> bool {
        let src = normalize_key(source);
        let dst = normalize_key(target);
        if !self.nodes.contains_key(&src) || !self.nodes.contains_key(&dst) {
            return false;
        }
        let out = self.edges.entry(src).or_default();
        if out.iter().any(|(t, r)| *t == dst && *r == relation) {
            return false;
        }
        out.push((dst, relation));
        self.edge_count += 1;
        true
    }

    pub fn contains(&self, label: &str) -> bool {
        self.nodes.contains_key(&normalize_key(label))
    }

    pub fn node(&self, label: &str) -> Option<&ConceptNode> {
        self.nodes.get(&normalize_key(label))
    }

    /// Outbound neighbors in insertion order.
    pub fn successors<'a>(
        &'a self,
        label: &str,
    ) -> impl Iterator<Item = &'a ConceptNode> + use<'a> {
        self.outbound(&normalize_key(label))
            .filter_map(|(t, _)| self.nodes.get(t))
    }

    /// Outbound neighbors reached through a specific relation, in insertion
    /// order.
    pub fn successors_by_relation<'a>(
        &'a self,
        label: &str,
        relation: Relation,
    ) -> impl Iterator<Item = &'a ConceptNode> + use<'a> {
        self.outbound(&normalize_key(label))
            .filter(move |(_, r)| *r == relation)
            .filter_map(|(t, _)| self.nodes.get(t))
    }

    /// Keys of outbound neighbors that carry the given role. The expansion
    /// schedule snapshots these before recursing, since recursion mutates
    /// the adjacency it is iterating.
    pub fn successor_keys_with_role(&self, label: &str, role: Role) -> Vec<String> {
        self.successors(label)
            .filter(|n| n.role == Some(role))
            .map(|n| n.key.clone())
            .collect()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edge_count
    }

    fn outbound<'a>(&'a self, key: &str) -> impl Iterator<Item = &'a (String, Relation)> + use<'a> {
        self.edges.get(key).into_iter().flatten()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn space_and_underscore_notations_are_one_node() {
        let mut g = ConceptGraph::new();
        assert!(g.add_node("guide dog", "en", Some(Role::Hyponym)));
        assert!(!g.add_node("guide_dog", "en", Some(Role::Hyponym)));
        assert_eq!(g.node_count(), 1);
        assert!(g.contains("Guide Dog"));
        assert_eq!(g.node("guide_dog").unwrap().display, "guide dog");
    }

    #[test]
    fn role_is_immutable_after_first_insertion() {
        let mut g = ConceptGraph::new();
        g.add_node("dog", "en", None);
        g.add_node("dog", "en", Some(Role::Hypernym));
        assert_eq!(g.node("dog").unwrap().role, None);

        g.add_node("animal", "en", Some(Role::Hypernym));
        g.add_node("animal", "en", Some(Role::Hyponym));
        assert_eq!(g.node("animal").unwrap().role, Some(Role::Hypernym));
    }

    #[test]
    fn duplicate_edges_are_not_inserted() {
        let mut g = ConceptGraph::new();
        g.add_node("dog", "en", None);
        g.add_node("animal", "en", Some(Role::Hypernym));
        assert!(g.add_edge("dog", "animal", Relation::Hypernym));
        assert!(!g.add_edge("dog", "animal", Relation::Hypernym));
        assert_eq!(g.edge_count(), 1);
        assert_eq!(g.successors("dog").count(), 1);
    }

    #[test]
    fn parallel_edges_with_different_relations_coexist() {
        let mut g = ConceptGraph::new();
        g.add_node("dog", "en", None);
        g.add_node("hound", "en", Some(Role::TranslatedSynonym));
        assert!(g.add_edge("dog", "hound", Relation::TranslatedSynonym));
        assert!(g.add_edge("dog", "hound", Relation::Hypernym));
        assert_eq!(g.edge_count(), 2);
        assert_eq!(g.successors("dog").count(), 2);
        assert_eq!(
            g.successors_by_relation("dog", Relation::Hypernym).count(),
            1
        );
    }

    #[test]
    fn edge_with_missing_endpoint_is_rejected() {
        let mut g = ConceptGraph::new();
        g.add_node("dog", "en", None);
        assert!(!g.add_edge("dog", "ghost", Relation::Hypernym));
        assert!(!g.add_edge("ghost", "dog", Relation::Hypernym));
        assert_eq!(g.edge_count(), 0);
    }

    #[test]
    fn successors_preserve_insertion_order() {
        let mut g = ConceptGraph::new();
        g.add_node("dog", "en", None);
        for label in ["animal", "pet", "mammal"] {
            g.add_node(label, "en", Some(Role::Hypernym));
            g.add_edge("dog", label, Relation::Hypernym);
        }
        let order: Vec<&str> = g.successors("dog").map(|n| n.key.as_str()).collect();
        assert_eq!(order, ["animal", "pet", "mammal"]);
    }

    #[test]
    fn successor_keys_with_role_filters() {
        let mut g = ConceptGraph::new();
        g.add_node("dog", "en", None);
        g.add_node("animal", "en", Some(Role::Hypernym));
        g.add_node("狗", "zh", Some(Role::TranslatedSynonym));
        g.add_edge("dog", "animal", Relation::Hypernym);
        g.add_edge("dog", "狗", Relation::TranslatedSynonym);

        assert_eq!(
            g.successor_keys_with_role("dog", Role::Hypernym),
            vec!["animal"]
        );
        assert_eq!(
            g.successor_keys_with_role("dog", Role::TranslatedSynonym),
            vec!["狗"]
        );
    }
}
