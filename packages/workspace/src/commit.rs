//! # Commit Service
//!
//! Applies intent batches to files on disk.
//!
//! Each file runs on the blocking pool: read → build diff → write source and
//! image assets. Files share no state while in flight. Once every task has
//! finished, committed files are re-processed so the template node index
//! matches what was written.

use crate::config::WorkspaceConfig;
use crate::errors::{StateError, StateResult};
use crate::template_nodes::TemplateNodeManager;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tandem_common::FileOperations;
use tandem_editor::{build_diff, FileDiff, FileRequest, TransformOptions};
use tandem_semantics::{EditIntent, IdSource, RandomIds, SequentialIds};
use tokio::task::JoinSet;
use tracing::instrument;

/// How fresh ids are minted for each file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IdStrategy {
    #[default]
    Random,
    /// Seeded from the file path, reproducible across runs
    Sequential,
}

impl IdStrategy {
    fn for_file(self, path: &str) -> Box<dyn IdSource + Send> {
        match self {
            IdStrategy::Random => Box::new(RandomIds),
            IdStrategy::Sequential => Box::new(SequentialIds::new(path)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommitRequest {
    pub path: String,
    pub intents: Vec<EditIntent>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommittedFile {
    pub path: String,
    /// Whether the source text was rewritten
    pub changed: bool,
    /// Image assets written alongside the source
    pub assets: Vec<String>,
}

#[derive(Debug)]
pub struct CommitFailure {
    pub path: String,
    pub error: StateError,
}

#[derive(Debug, Default)]
pub struct CommitReport {
    pub committed: Vec<CommittedFile>,
    pub failures: Vec<CommitFailure>,
}

pub struct CommitService {
    fs: Arc<dyn FileOperations>,
    options: TransformOptions,
    ids: IdStrategy,
}

impl CommitService {
    pub fn new(fs: Arc<dyn FileOperations>, config: &WorkspaceConfig) -> Self {
        Self {
            fs,
            options: config.transform_options(),
            ids: IdStrategy::default(),
        }
    }

    pub fn with_ids(mut self, ids: IdStrategy) -> Self {
        self.ids = ids;
        self
    }

    /// Commit every request, then refresh the index for the files written
    #[instrument(skip_all, fields(files = requests.len()))]
    pub async fn commit(
        &self,
        requests: Vec<CommitRequest>,
        nodes: &mut TemplateNodeManager,
    ) -> CommitReport {
        let mut tasks = JoinSet::new();

        for (order, request) in requests.into_iter().enumerate() {
            let fs = Arc::clone(&self.fs);
            let options = self.options.clone();
            let ids = self.ids;
            tasks.spawn_blocking(move || {
                let path = request.path.clone();
                let result = commit_file(fs.as_ref(), request, ids, &options);
                (order, path, result)
            });
        }

        let mut finished = Vec::new();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(outcome) => finished.push(outcome),
                Err(error) => {
                    tracing::error!(%error, "commit task did not finish");
                    finished.push((
                        usize::MAX,
                        String::new(),
                        Err(StateError::Task(error.to_string())),
                    ));
                }
            }
        }
        finished.sort_by_key(|(order, _, _)| *order);

        let mut report = CommitReport::default();
        for (_, path, result) in finished {
            let outcome = result.and_then(|diff| self.reindex(nodes, diff));
            match outcome {
                Ok(committed) => report.committed.push(committed),
                Err(error) => {
                    tracing::error!(%path, %error, "commit failed");
                    report.failures.push(CommitFailure { path, error });
                }
            }
        }

        tracing::info!(
            committed = report.committed.len(),
            failed = report.failures.len(),
            "commit finished"
        );
        report
    }

    fn reindex(&self, nodes: &mut TemplateNodeManager, diff: FileDiff) -> StateResult<CommittedFile> {
        let mut ids = self.ids.for_file(&diff.path);
        let processed = nodes.process_file(&diff.path, &diff.generated, &mut *ids)?;
        if processed.modified && !self.fs.write_file(&diff.path, &processed.content) {
            return Err(StateError::WriteFailed(diff.path));
        }

        Ok(CommittedFile {
            changed: diff.original != diff.generated || processed.modified,
            assets: diff.assets.into_iter().map(|asset| asset.path).collect(),
            path: diff.path,
        })
    }
}

fn commit_file(
    fs: &dyn FileOperations,
    request: CommitRequest,
    ids: IdStrategy,
    options: &TransformOptions,
) -> StateResult<FileDiff> {
    let source = fs
        .read_file(&request.path)
        .ok_or_else(|| StateError::FileNotFound(request.path.clone()))?;

    let mut ids = ids.for_file(&request.path);
    let diff = build_diff(
        &FileRequest {
            path: request.path,
            source,
            intents: request.intents,
        },
        &mut *ids,
        options,
    )?;

    if diff.original != diff.generated && !fs.write_file(&diff.path, &diff.generated) {
        return Err(StateError::WriteFailed(diff.path));
    }
    for asset in &diff.assets {
        if !fs.write_binary(&asset.path, &asset.bytes) {
            return Err(StateError::WriteFailed(asset.path.clone()));
        }
    }

    tracing::debug!(path = %diff.path, assets = diff.assets.len(), "file committed");
    Ok(diff)
}
