//! # Diff Pipeline
//!
//! Turns per-file intent batches into before/after source text:
//! Parse → Print original → Validate targets → Apply → Print generated
//!
//! The pipeline never touches the filesystem; callers decide what to write.

use crate::ast_index::build_index;
use crate::mutations::{apply_intents, AssetWrite, TransformError, TransformOptions};
use crate::EditorError;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tandem_parser::{parse, serialize};
use tandem_semantics::{EditIntent, ElementSpec, IdSource, InsertPayload};
use tracing::instrument;

/// Edits requested for one file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileRequest {
    pub path: String,
    pub source: String,
    pub intents: Vec<EditIntent>,
}

/// Before/after text for one file
#[derive(Debug, Clone, PartialEq)]
pub struct FileDiff {
    pub path: String,
    pub original: String,
    pub generated: String,
    pub assets: Vec<AssetWrite>,
}

impl FileDiff {
    pub fn is_changed(&self) -> bool {
        self.original != self.generated || !self.assets.is_empty()
    }
}

#[derive(Debug)]
pub struct FileFailure {
    pub path: String,
    pub error: EditorError,
}

#[derive(Debug, Default)]
pub struct DiffReport {
    pub diffs: Vec<FileDiff>,
    pub failures: Vec<FileFailure>,
}

/// Build diffs for every request; a failing file is reported, not fatal.
#[instrument(skip_all, fields(files = requests.len()))]
pub fn build_diffs(
    requests: Vec<FileRequest>,
    ids: &mut dyn IdSource,
    options: &TransformOptions,
) -> DiffReport {
    let mut report = DiffReport::default();

    for request in requests {
        match build_diff(&request, ids, options) {
            Ok(diff) => report.diffs.push(diff),
            Err(error) => {
                tracing::error!(path = %request.path, %error, "failed to build diff");
                report.failures.push(FileFailure {
                    path: request.path,
                    error,
                });
            }
        }
    }

    report
}

/// Build the diff for a single file
#[instrument(skip_all, fields(path = %request.path, intents = request.intents.len()))]
pub fn build_diff(
    request: &FileRequest,
    ids: &mut dyn IdSource,
    options: &TransformOptions,
) -> Result<FileDiff, EditorError> {
    let mut ast = parse(&request.source)?;
    let original = serialize(&ast);

    validate_targets(&ast, &request.path, &request.intents)?;
    let outcome = apply_intents(&mut ast, &request.intents, ids, options)?;
    let generated = serialize(&ast);

    tracing::debug!(applied = outcome.applied, "built diff");
    Ok(FileDiff {
        path: request.path.clone(),
        original,
        generated,
        assets: outcome.assets,
    })
}

/// Every target must be indexed in the file or created earlier in the batch
fn validate_targets(
    ast: &tandem_parser::Document,
    path: &str,
    intents: &[EditIntent],
) -> Result<(), TransformError> {
    let index = build_index(ast, path);
    let mut created: HashSet<&str> = HashSet::new();

    for intent in intents {
        for oid in intent.target_oids() {
            if !index.contains_key(oid) && !created.contains(oid) {
                return Err(TransformError::TargetNotFound(oid.to_string()));
            }
        }
        match intent {
            EditIntent::Insert {
                payload: InsertPayload::Element { element },
                ..
            } => collect_spec_oids(element, &mut created),
            EditIntent::Group { container, .. } => {
                created.insert(&container.oid);
            }
            _ => {}
        }
    }

    Ok(())
}

fn collect_spec_oids<'a>(spec: &'a ElementSpec, out: &mut HashSet<&'a str>) {
    if let Some(oid) = &spec.oid {
        out.insert(oid);
    }
    for child in &spec.children {
        collect_spec_oids(child, out);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tandem_semantics::{ContainerSpec, SequentialIds};

    fn request(source: &str, intents: Vec<EditIntent>) -> FileRequest {
        FileRequest {
            path: "page.tsx".to_string(),
            source: source.to_string(),
            intents,
        }
    }

    #[test]
    fn test_build_diff_reports_original_and_generated() {
        let source = r#"const Page = () => <div data-oid="d"><p data-oid="p" /></div>;"#;
        let mut ids = SequentialIds::from_seed("g");

        let report = build_diffs(
            vec![request(
                source,
                vec![EditIntent::Remove {
                    oid: "p".to_string(),
                }],
            )],
            &mut ids,
            &TransformOptions::default(),
        );

        assert!(report.failures.is_empty());
        let diff = &report.diffs[0];
        assert_eq!(diff.original, source);
        assert_eq!(diff.generated, r#"const Page = () => <div data-oid="d"></div>;"#);
        assert!(diff.is_changed());
    }

    #[test]
    fn test_targets_created_in_batch_are_valid() {
        let source = r#"const Page = () => <div data-oid="d"><p data-oid="p" /></div>;"#;
        let mut ids = SequentialIds::from_seed("g");
        let intents = vec![
            EditIntent::Group {
                parent_oid: "d".to_string(),
                index: 0,
                container: ContainerSpec::new("section", "s"),
                member_oids: vec!["p".to_string()],
            },
            EditIntent::UpdateText {
                oid: "s".to_string(),
                text: "grouped".to_string(),
            },
        ];

        let diff = build_diff(&request(source, intents), &mut ids, &TransformOptions::default())
            .unwrap();
        assert!(diff.generated.contains(r#"<section data-oid="s" key="tk-g-2">grouped<p"#));
    }

    #[test]
    fn test_failures_are_per_file() {
        let mut ids = SequentialIds::from_seed("g");
        let good = request(r#"const a = <div data-oid="d" />;"#, vec![]);
        let missing = FileRequest {
            path: "missing.tsx".to_string(),
            ..request(
                r#"const a = <div data-oid="d" />;"#,
                vec![EditIntent::Remove {
                    oid: "nope".to_string(),
                }],
            )
        };
        let broken = FileRequest {
            path: "broken.tsx".to_string(),
            ..request("const a = <div>", vec![])
        };

        let report = build_diffs(vec![good, missing, broken], &mut ids, &TransformOptions::default());

        assert_eq!(report.diffs.len(), 1);
        assert!(!report.diffs[0].is_changed());
        assert_eq!(report.failures.len(), 2);
        assert!(matches!(
            report.failures[0].error,
            EditorError::Transform(TransformError::TargetNotFound(_))
        ));
        assert_eq!(report.failures[1].path, "broken.tsx");
        assert!(matches!(report.failures[1].error, EditorError::Parse(_)));
    }
}
