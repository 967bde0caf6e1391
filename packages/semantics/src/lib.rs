//! # Tandem Semantics
//!
//! The identity protocol shared by both halves of the engine:
//!
//! - reserved attribute names (`data-oid`, `data-odid`, `key`)
//! - identifier generation
//! - edit intents exchanged between the live mirror and the transform engine

pub mod attributes;
pub mod id_generator;
pub mod intent;

pub use attributes::*;
pub use id_generator::{
    content_hash, generate_oid, generate_uuid, get_document_id, IdSource, RandomIds,
    SequentialIds, UnusedIds,
};
pub use intent::{ContainerSpec, EditIntent, ElementSpec, InsertPayload, Position};
