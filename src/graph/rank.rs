use std::collections::{HashMap, VecDeque};

use super::{ConceptGraph, normalize_key};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ranked {
    pub concept: String,
    pub distance: usize,
}

/// Ranks every target-language node by directed hop distance from the source.
///
/// A breadth-first sweep over the stored edge directions; nodes are emitted
/// in dequeue order, so distances are non-decreasing and equal-distance ties
/// fall in discovery order. The source itself and nodes with no directed path
/// from it are excluded. A source label that is not in the graph yields an
/// empty ranking.
pub fn rank(graph: &ConceptGraph, source: &str, target_language: &str) -> Vec<Ranked> {
    let start = normalize_key(source);
    if !graph.contains(&start) {
        return Vec::new();
    }

    let mut distances: HashMap<String, usize> = HashMap::new();
    let mut queue: VecDeque<String> = VecDeque::new();
    let mut ranked = Vec::new();

    distances.insert(start.clone(), 0);
    queue.push_back(start.clone());

    while let Some(key) = queue.pop_front() {
        let depth = distances[&key];

        if key != start
            && let Some(node) = graph.node(&key)
            && node.language == target_language
        {
            ranked.push(Ranked {
                concept: node.display.clone(),
                distance: depth,
            });
        }

        for (next, _) in graph.outbound(&key) {
            if !distances.contains_key(next) {
                distances.insert(next.clone(), depth + 1);
                queue.push_back(next.clone());
            }
        }
    }

    ranked
}
