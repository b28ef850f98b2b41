use tracing::{info, warn};

use crate::conceptnet::RelationSource;
use crate::fallback::{AdaptationSource, FallbackError};
use crate::graph::{ConceptGraph, Relation, Role};

#[derive(Debug, thiserror::Error)]
pub enum ExpandError {
    #[error("generative fallback failed: {0}")]
    Fallback(#[from] FallbackError),
}

/// Builds the concept graph for one source concept.
///
/// The lexical source's existence check gates two mutually exclusive
/// strategies: a fixed-depth structured expansion over synonym, hypernym,
/// and hyponym relations, or (when the concept is unknown and a fallback is
/// supplied) a flat one-hop fan-out of generated analogous concepts.
///
/// Individual relation fetches that fail are logged and treated as empty
/// branches; a fallback failure is an error for this concept, since it was
/// the only remaining way to produce results.
pub async fn expand(
    relations: &impl RelationSource,
    fallback: Option<&impl AdaptationSource>,
    graph: &mut ConceptGraph,
    concept: &str,
    source_language: &str,
    target_language: &str,
) -> Result<(), ExpandError> {
    // The traversal root never carries a role.
    graph.add_node(concept, source_language, None);

    let exists = match relations.concept_exists(concept, source_language).await {
        Ok(found) => found,
        Err(e) => {
            warn!(concept, error = %e, "existence check failed, treating concept as absent");
            false
        }
    };

    if exists {
        structured_expand(relations, graph, concept, source_language, target_language).await;
        info!(
            concept,
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            "structured expansion complete"
        );
        return Ok(());
    }

    let Some(fallback) = fallback else {
        info!(concept, "concept not in lexical source and fallback disabled");
        return Ok(());
    };

    let generated = fallback
        .adapt(concept, source_language, target_language)
        .await?;
    // Generated concepts are terminal answers, not traversal seeds: one
    // cultural_adaptation hop each, no recursive expansion.
    for candidate in &generated {
        graph.add_node(candidate, target_language, Some(Role::Generated));
        graph.add_edge(concept, candidate, Relation::CulturalAdaptation);
    }
    info!(
        concept,
        candidates = generated.len(),
        "generative fallback expansion complete"
    );
    Ok(())
}

/// The fixed multi-hop schedule: translated synonyms directly off the source,
/// two orders of source-language hypernyms each anchored to target-language
/// synonyms with their hyponyms (one extra hyponym level under second-order
/// hypernyms), and a target-language bridge through the source's own
/// translated synonyms for when the source-language hierarchy is sparse.
///
/// Depth limits are policy constants baked into the loop shape, not a
/// graph-size-driven search. Successor lists are snapshotted before each
/// inner pass because the passes insert into the adjacency they walk.
async fn structured_expand(
    relations: &impl RelationSource,
    graph: &mut ConceptGraph,
    concept: &str,
    source_language: &str,
    target_language: &str,
) {
    add_translated_synonyms(relations, graph, concept, source_language, target_language).await;
    add_hypernyms(relations, graph, concept, source_language).await;

    for hypernym in graph.successor_keys_with_role(concept, Role::Hypernym) {
        add_translated_synonyms(relations, graph, &hypernym, source_language, target_language)
            .await;
        for synonym in graph.successor_keys_with_role(&hypernym, Role::TranslatedSynonym) {
            add_hyponyms(relations, graph, &synonym, target_language).await;
        }

        add_hypernyms(relations, graph, &hypernym, source_language).await;

        for second_order in graph.successor_keys_with_role(&hypernym, Role::Hypernym) {
            add_translated_synonyms(
                relations,
                graph,
                &second_order,
                source_language,
                target_language,
            )
            .await;
            for synonym in graph.successor_keys_with_role(&second_order, Role::TranslatedSynonym)
            {
                add_hyponyms(relations, graph, &synonym, target_language).await;
                for hyponym in graph.successor_keys_with_role(&synonym, Role::Hyponym) {
                    add_hyponyms(relations, graph, &hyponym, target_language).await;
                }
            }
        }
    }

    // Bridge path: when the source-language hypernym chain is thin, the
    // target-language lexicon may still have its own hierarchy around the
    // translated term.
    for synonym in graph.successor_keys_with_role(concept, Role::TranslatedSynonym) {
        add_hypernyms(relations, graph, &synonym, target_language).await;
        for hypernym in graph.successor_keys_with_role(&synonym, Role::Hypernym) {
            add_hyponyms(relations, graph, &hypernym, target_language).await;
        }
    }
}

async fn add_translated_synonyms(
    relations: &impl RelationSource,
    graph: &mut ConceptGraph,
    concept: &str,
    from: &str,
    to: &str,
) {
    let synonyms = match relations.translated_synonyms(concept, from, to).await {
        Ok(found) => found,
        Err(e) => {
            warn!(concept, error = %e, "translated-synonym fetch failed, skipping branch");
            return;
        }
    };
    for synonym in synonyms {
        graph.add_node(&synonym, to, Some(Role::TranslatedSynonym));
        graph.add_edge(concept, &synonym, Relation::TranslatedSynonym);
    }
}

async fn add_hypernyms(
    relations: &impl RelationSource,
    graph: &mut ConceptGraph,
    concept: &str,
    language: &str,
) {
    let hypernyms = match relations.hypernyms(concept, language).await {
        Ok(found) => found,
        Err(e) => {
            warn!(concept, error = %e, "hypernym fetch failed, skipping branch");
            return;
        }
    };
    for hypernym in hypernyms {
        graph.add_node(&hypernym, language, Some(Role::Hypernym));
        graph.add_edge(concept, &hypernym, Relation::Hypernym);
    }
}

async fn add_hyponyms(
    relations: &impl RelationSource,
    graph: &mut ConceptGraph,
    concept: &str,
    target_language: &str,
) {
    let hyponyms = match relations.hyponyms(concept, target_language).await {
        Ok(found) => found,
        Err(e) => {
            warn!(concept, error = %e, "hyponym fetch failed, skipping branch");
            return;
        }
    };
    for hyponym in hyponyms {
        graph.add_node(&hyponym, target_language, Some(Role::Hyponym));
        graph.add_edge(concept, &hyponym, Relation::Hyponym);
    }
}
