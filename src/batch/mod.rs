use std::path::Path;

use tracing::{error, info};

use crate::conceptnet::RelationSource;
use crate::expand;
use crate::fallback::AdaptationSource;
use crate::graph::ConceptGraph;
use crate::graph::rank::rank;

#[derive(Debug, thiserror::Error)]
pub enum BatchError {
    #[error("tabular IO failed: {0}")]
    Csv(#[from] csv::Error),

    #[error("input file has no 'Concept' column")]
    MissingConceptColumn,

    #[error("output write failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Processes every source concept in the input file and writes the combined
/// ranking rows to the output file.
///
/// Each concept gets a fresh graph and is processed to completion before the
/// next begins; one failed concept logs an error and contributes zero rows,
/// but never aborts the batch.
pub async fn run(
    relations: &impl RelationSource,
    fallback: Option<&impl AdaptationSource>,
    source_language: &str,
    target_language: &str,
    input: &Path,
    output: &Path,
) -> Result<(), BatchError> {
    let concepts = read_source_concepts(input)?;
    info!(count = concepts.len(), "loaded source concepts");

    let mut rows = Vec::new();
    for concept in &concepts {
        let mut graph = ConceptGraph::new();
        if let Err(e) = expand::expand(
            relations,
            fallback,
            &mut graph,
            concept,
            source_language,
            target_language,
        )
        .await
        {
            error!(concept = %concept, error = %e, "concept failed, continuing with the rest of the batch");
            continue;
        }

        let ranked = rank(&graph, concept, target_language);
        info!(
            concept = %concept,
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            results = ranked.len(),
            "concept processed"
        );
        for entry in ranked {
            rows.push((concept.clone(), entry.concept, entry.distance));
        }
    }

    write_results(output, &rows)?;
    info!(rows = rows.len(), output = %output.display(), "results written");
    Ok(())
}

/// Reads the `Concept` column: values trimmed and lowercased, blanks skipped.
pub fn read_source_concepts(path: &Path) -> Result<Vec<String>, BatchError> {
    let mut reader = csv::Reader::from_path(path)?;
    let column = reader
        .headers()?
        .iter()
        .position(|h| h == "Concept")
        .ok_or(BatchError::MissingConceptColumn)?;

    let mut concepts = Vec::new();
    for record in reader.records() {
        let record = record?;
        let Some(value) = record.get(column) else {
            continue;
        };
        let concept = value.trim().to_lowercase();
        if !concept.is_empty() {
            concepts.push(concept);
        }
    }
    Ok(concepts)
}

/// One row per (source, target, distance) pair, in accumulation order.
pub fn write_results(path: &Path, rows: &[(String, String, usize)]) -> Result<(), BatchError> {
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(["Source Concept", "Target Concept", "Distance"])?;
    for (source, target, distance) in rows {
        writer.write_record([source.as_str(), target.as_str(), &distance.to_string()])?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conceptnet::ConceptNetError;
    use crate::fallback::FallbackError;
    use std::io::Write;

    fn write_input(dir: &tempfile::TempDir, contents: &str) -> std::path::PathBuf {
        let path = dir.path().join("input.csv");
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        path
    }

    #[test]
    fn read_lowercases_and_skips_blanks() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_input(&dir, "Concept,Notes\nDog,first\n  Guanxi ,second\n,empty\n");
        let concepts = read_source_concepts(&path).unwrap();
        assert_eq!(concepts, ["dog", "guanxi"]);
    }

    #[test]
    fn read_without_concept_column_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_input(&dir, "Term\ndog\n");
        let result = read_source_concepts(&path);
        assert!(matches!(result, Err(BatchError::MissingConceptColumn)));
    }

    #[test]
    fn write_emits_header_and_rows_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");
        let rows = vec![
            ("dog".to_string(), "狗".to_string(), 1),
            ("dog".to_string(), "動物".to_string(), 2),
        ];
        write_results(&path, &rows).unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = written.lines().collect();
        assert_eq!(lines[0], "Source Concept,Target Concept,Distance");
        assert_eq!(lines[1], "dog,狗,1");
        assert_eq!(lines[2], "dog,動物,2");
    }

    struct EmptyRelations;

    impl RelationSource for EmptyRelations {
        async fn concept_exists(&self, _: &str, _: &str) -> Result<bool, ConceptNetError> {
            Ok(false)
        }
        async fn translated_synonyms(
            &self,
            _: &str,
            _: &str,
            _: &str,
        ) -> Result<Vec<String>, ConceptNetError> {
            Ok(Vec::new())
        }
        async fn hypernyms(&self, _: &str, _: &str) -> Result<Vec<String>, ConceptNetError> {
            Ok(Vec::new())
        }
        async fn hyponyms(&self, _: &str, _: &str) -> Result<Vec<String>, ConceptNetError> {
            Ok(Vec::new())
        }
    }

    /// Fails for one specific concept, answers for the rest.
    struct SelectiveFallback {
        failing_concept: String,
    }

    impl AdaptationSource for SelectiveFallback {
        async fn adapt(
            &self,
            concept: &str,
            _: &str,
            _: &str,
        ) -> Result<Vec<String>, FallbackError> {
            if concept == self.failing_concept {
                Err(FallbackError::EmptyResponse)
            } else {
                Ok(vec!["苹果".to_string()])
            }
        }
    }

    #[tokio::test]
    async fn failed_concept_is_skipped_but_batch_completes() {
        let dir = tempfile::tempdir().unwrap();
        let input = write_input(&dir, "Concept\ngood\nbad\nalso good\n");
        let output = dir.path().join("out.csv");

        let fallback = SelectiveFallback {
            failing_concept: "bad".to_string(),
        };
        run(&EmptyRelations, Some(&fallback), "en", "zh", &input, &output)
            .await
            .unwrap();

        let written = std::fs::read_to_string(&output).unwrap();
        let lines: Vec<&str> = written.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[1], "good,苹果,1");
        assert_eq!(lines[2], "also good,苹果,1");
    }
}
