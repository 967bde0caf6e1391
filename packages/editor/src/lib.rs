//! # Tandem Editor
//!
//! Source side of the engine: applies edit intents to component files.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │ parser: component source → lossless AST     │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ editor                                      │
//! │  - index oids to source locations           │
//! │  - apply intent batches, all or nothing     │
//! │  - regenerate sibling keys after edits      │
//! │  - build per-file before/after diffs        │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ workspace: write files, refresh the index   │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use tandem_editor::{build_diffs, FileRequest, TransformOptions};
//! use tandem_semantics::{EditIntent, RandomIds};
//!
//! let report = build_diffs(
//!     vec![FileRequest {
//!         path: "app/page.tsx".into(),
//!         source,
//!         intents: vec![EditIntent::Move { oid: "a1b2c3d".into(), new_index: 0 }],
//!     }],
//!     &mut RandomIds,
//!     &TransformOptions::default(),
//! );
//! ```

pub mod ast_index;
pub mod class_merge;
mod errors;
mod mutations;
mod pipeline;
mod post_effects;

pub use ast_index::{
    build_index, content_from_template_node, index_source, StructuralRole, TemplateIndex,
    TemplateNode,
};
pub use class_merge::merge_classes;
pub use errors::EditorError;
pub use mutations::{
    apply_intents, escape_text, AssetWrite, BatchOutcome, TransformError, TransformOptions,
};
pub use pipeline::{build_diff, build_diffs, DiffReport, FileDiff, FileFailure, FileRequest};
pub use post_effects::{PostEffect, PostEffectEngine, RegenerateSiblingKeys};

// Re-export common types for convenience
pub use tandem_parser::ast::Document as ASTDocument;
