//! # Template Node Manager
//!
//! Keeps the project-wide oid → [`TemplateNode`] map current as files are
//! loaded and committed.
//!
//! Processing a file tags elements missing an oid, replaces oids that repeat
//! within the file or collide with another file, regenerates the text when
//! anything changed, and re-indexes it. Results are cached by content hash,
//! so an unchanged file is not reparsed.

use crate::config::WorkspaceConfig;
use crate::errors::{StateError, StateResult};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use tandem_common::FileOperations;
use tandem_editor::{build_index, content_from_template_node, TemplateNode};
use tandem_parser::{deduplicate_oids, parse, serialize, tag_oids};
use tandem_semantics::{content_hash, IdSource};

/// Outcome of processing one file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessedFile {
    /// Whether oids were added or replaced
    pub modified: bool,
    /// The file text after processing
    pub content: String,
}

#[derive(Debug, Clone)]
struct CacheEntry {
    hash: String,
    result: ProcessedFile,
    nodes: Vec<(String, TemplateNode)>,
}

#[derive(Debug, Default)]
pub struct TemplateNodeManager {
    nodes: HashMap<String, TemplateNode>,
    /// oids currently indexed for each file
    owned: HashMap<String, Vec<String>>,
    /// Least recently processed first
    cache: IndexMap<String, CacheEntry>,
    config: WorkspaceConfig,
}

impl TemplateNodeManager {
    pub fn new(config: WorkspaceConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    pub fn get(&self, oid: &str) -> Option<&TemplateNode> {
        self.nodes.get(oid)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn all_oids(&self) -> HashSet<String> {
        self.nodes.keys().cloned().collect()
    }

    pub fn oids_for_file(&self, path: &str) -> &[String] {
        self.owned.get(path).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Tag, de-duplicate and index `content` as the current text of `path`
    pub fn process_file(
        &mut self,
        path: &str,
        content: &str,
        ids: &mut dyn IdSource,
    ) -> StateResult<ProcessedFile> {
        let cacheable = content.len() < self.config.max_cached_file_bytes;
        let hash = content_hash(content);

        if cacheable {
            if let Some(entry) = self.cache.shift_remove(path) {
                if entry.hash == hash {
                    tracing::debug!(path, "template node cache hit");
                    let result = entry.result.clone();
                    self.replace_nodes(path, entry.nodes.clone());
                    self.cache.insert(path.to_string(), entry);
                    return Ok(result);
                }
            }
        }

        let mut ast = parse_for(path, content)?;
        let tagged = tag_oids(&mut ast, ids);
        let taken = self.oids_owned_elsewhere(path);
        let deduplicated = deduplicate_oids(&mut ast, ids, &taken);
        let modified = tagged || deduplicated;

        // locations must describe the text the caller ends up with
        let (result, ast) = if modified {
            let regenerated = serialize(&ast);
            let reparsed = parse_for(path, &regenerated)?;
            (
                ProcessedFile {
                    modified,
                    content: regenerated,
                },
                reparsed,
            )
        } else {
            (
                ProcessedFile {
                    modified,
                    content: content.to_string(),
                },
                ast,
            )
        };

        let mut nodes: Vec<(String, TemplateNode)> = build_index(&ast, path).into_iter().collect();
        nodes.sort_by_key(|(_, node)| (node.start_tag.start.line, node.start_tag.start.column));
        tracing::debug!(path, nodes = nodes.len(), modified, "indexed file");
        self.replace_nodes(path, nodes.clone());

        if cacheable {
            // keyed by the final text, so writing it back is a cache hit
            let hash = if modified {
                content_hash(&result.content)
            } else {
                hash
            };
            let cached = ProcessedFile {
                modified: false,
                content: result.content.clone(),
            };
            self.remember(path, hash, cached, nodes);
        }

        Ok(result)
    }

    /// Read `path`, process it and write it back when oids were added
    pub fn load_file(
        &mut self,
        fs: &dyn FileOperations,
        path: &str,
        ids: &mut dyn IdSource,
    ) -> StateResult<ProcessedFile> {
        let content = fs
            .read_file(path)
            .ok_or_else(|| StateError::FileNotFound(path.to_string()))?;
        let result = self.process_file(path, &content, ids)?;

        if result.modified && !fs.write_file(path, &result.content) {
            return Err(StateError::WriteFailed(path.to_string()));
        }
        Ok(result)
    }

    /// Drop every node of `path`
    pub fn forget_file(&mut self, path: &str) {
        if let Some(oids) = self.owned.remove(path) {
            for oid in oids {
                self.nodes.remove(&oid);
            }
        }
        self.cache.shift_remove(path);
    }

    /// Exact source text of the element with `oid`
    pub fn code_block(&self, fs: &dyn FileOperations, oid: &str) -> Option<String> {
        let Some(node) = self.get(oid) else {
            tracing::error!(oid, "no template node");
            return None;
        };
        let Some(source) = fs.read_file(&node.path) else {
            tracing::error!(oid, path = %node.path, "template node file is missing");
            return None;
        };
        content_from_template_node(node, &source)
    }

    fn oids_owned_elsewhere(&self, path: &str) -> HashSet<String> {
        self.owned
            .iter()
            .filter(|(owner, _)| owner.as_str() != path)
            .flat_map(|(_, oids)| oids.iter().cloned())
            .collect()
    }

    fn replace_nodes(&mut self, path: &str, nodes: Vec<(String, TemplateNode)>) {
        if let Some(stale) = self.owned.remove(path) {
            for oid in stale {
                if self.nodes.get(&oid).is_some_and(|n| n.path == path) {
                    self.nodes.remove(&oid);
                }
            }
        }

        let mut oids = Vec::with_capacity(nodes.len());
        for (oid, node) in nodes {
            oids.push(oid.clone());
            self.nodes.insert(oid, node);
        }
        self.owned.insert(path.to_string(), oids);
    }

    fn remember(
        &mut self,
        path: &str,
        hash: String,
        result: ProcessedFile,
        nodes: Vec<(String, TemplateNode)>,
    ) {
        self.cache.shift_remove(path);
        self.cache
            .insert(path.to_string(), CacheEntry { hash, result, nodes });
        while self.cache.len() > self.config.max_cached_files {
            self.cache.shift_remove_index(0);
        }
    }
}

fn parse_for(path: &str, content: &str) -> StateResult<tandem_parser::Document> {
    parse(content).map_err(|source| {
        tracing::warn!(path, %source, "file left stale after parse failure");
        StateError::Parse {
            path: path.to_string(),
            source,
        }
    })
}
