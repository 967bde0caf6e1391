//! # Tandem Mirror
//!
//! Live-document side of the engine.
//!
//! The page runtime owns a [`LiveDocument`] arena. The mirror tags each
//! rendered element with a runtime id, reports the layer tree to the host,
//! rescans parents whose children changed, and turns pointer gestures into
//! [`EditIntent`](tandem_semantics::EditIntent)s keyed by source id.
//!
//! ```text
//! LiveDocument ──records──▶ MutationBatcher ──▶ LayersChanged ──▶ HostChannel
//!      ▲                                                              ▲
//!      └── DragController / TextEditor / group ──▶ EditIntent ────────┘
//! ```

pub mod channel;
pub mod config;
pub mod dom;
pub mod drag;
mod errors;
pub mod geometry;
pub mod group;
pub mod insert;
pub mod layers;
mod mirror;
pub mod observer;
pub mod text;

pub use channel::{HostChannel, HostMessage, JsonLinesChannel, MemoryChannel};
pub use config::MirrorConfig;
pub use dom::{ensure_uuid, Display, LiveDocument, MutationRecord, NodeId, NodeKind, Style, Visibility};
pub use drag::DragController;
pub use errors::{ChannelError, ConfigError, DomError};
pub use geometry::{resolve_axis, resolve_grid_index, Axis, Rect};
pub use group::{group_elements, resolve_group, resolve_ungroup, ungroup_elements, UngroupPlan};
pub use insert::{resolve_insert_target, InsertTarget};
pub use layers::{scan, scan_with, LayerNode};
pub use mirror::Mirror;
pub use observer::{KeepAlive, LayersChanged, MutationBatcher};
pub use text::TextEditor;
