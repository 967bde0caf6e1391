//! # Tandem Workspace
//!
//! Project-level services on top of the editor: the template node index for
//! every file and the concurrent commit flow that writes edits to disk.

pub mod commit;
pub mod config;
mod errors;
pub mod template_nodes;

pub use commit::{CommitFailure, CommitReport, CommitRequest, CommitService, CommittedFile, IdStrategy};
pub use config::WorkspaceConfig;
pub use errors::{StateError, StateResult};
pub use template_nodes::{ProcessedFile, TemplateNodeManager};

// Re-export file access for callers wiring up a service
pub use tandem_common::{FileOperations, MockFileSystem, RealFileSystem};
