//! # Mirror
//!
//! Owns the live document and wires scanning, mutation batching and the
//! interactive resolvers to a host channel.
//!
//! Every entry point runs to completion. Timers are driven by [`Mirror::tick`]
//! with the caller's clock.

use crate::channel::{HostChannel, HostMessage};
use crate::config::MirrorConfig;
use crate::dom::{LiveDocument, NodeId};
use crate::drag::DragController;
use crate::errors::ChannelError;
use crate::group::{group_elements, resolve_group, resolve_ungroup, ungroup_elements};
use crate::insert::{resolve_insert_target, InsertTarget};
use crate::layers::{scan_with, LayerNode};
use crate::observer::{KeepAlive, MutationBatcher};
use crate::text::TextEditor;
use std::time::Instant;
use tandem_semantics::{ContainerSpec, EditIntent};

pub struct Mirror<C: HostChannel> {
    doc: LiveDocument,
    config: MirrorConfig,
    channel: C,
    batcher: MutationBatcher,
    keep_alive: KeepAlive,
    drag: DragController,
    text: TextEditor,
}

impl<C: HostChannel> Mirror<C> {
    pub fn new(doc: LiveDocument, channel: C, config: MirrorConfig, now: Instant) -> Self {
        Self {
            batcher: MutationBatcher::from_config(&config),
            keep_alive: KeepAlive::new(config.keep_alive(), now),
            drag: DragController::new(config.snap_threshold),
            text: TextEditor::new(),
            doc,
            config,
            channel,
        }
    }

    pub fn document(&self) -> &LiveDocument {
        &self.doc
    }

    /// Direct access for the page runtime; changes are picked up on the next tick
    pub fn document_mut(&mut self) -> &mut LiveDocument {
        &mut self.doc
    }

    pub fn channel(&self) -> &C {
        &self.channel
    }

    pub fn channel_mut(&mut self) -> &mut C {
        &mut self.channel
    }

    pub fn config(&self) -> &MirrorConfig {
        &self.config
    }

    fn send(&mut self, message: HostMessage) -> Result<(), ChannelError> {
        self.channel.send(message).inspect_err(|error| {
            tracing::error!(%error, "failed to send to host");
        })
    }

    /// Scan the whole body and send it as a snapshot
    pub fn snapshot(&mut self) -> Result<Option<LayerNode>, ChannelError> {
        let body = self.doc.body();
        let Some(layer) = scan_with(&mut self.doc, body, &self.config) else {
            return Ok(None);
        };
        self.send(HostMessage::LayerSnapshot {
            layer: layer.clone(),
        })?;
        Ok(Some(layer))
    }

    /// Feed pending mutations to the batcher and fire due timers
    pub fn tick(&mut self, now: Instant) -> Result<(), ChannelError> {
        let records = self.doc.take_records();
        if !records.is_empty() {
            self.batcher.observe(&self.doc, records, now, &self.config);
        }

        for change in self.batcher.poll(&mut self.doc, now, &self.config) {
            self.send(HostMessage::LayersChanged(change))?;
        }

        if self.keep_alive.is_due(now) {
            tracing::debug!("keep-alive rescan");
            self.snapshot()?;
        }
        Ok(())
    }

    pub fn insert_target(&self, x: f64, y: f64) -> Option<InsertTarget> {
        resolve_insert_target(&self.doc, x, y)
    }

    pub fn start_drag(&mut self, oid: &str) -> Option<usize> {
        self.drag.start(&mut self.doc, oid)
    }

    pub fn drag(&mut self, x: f64, y: f64) -> Option<usize> {
        self.drag.drag(&mut self.doc, x, y)
    }

    /// Finish the drag and report the move to the host
    pub fn end_drag(&mut self) -> Result<Option<EditIntent>, ChannelError> {
        let Some(intent) = self.drag.end(&mut self.doc) else {
            return Ok(None);
        };
        self.send(HostMessage::DragEnded {
            intent: intent.clone(),
        })?;
        Ok(Some(intent))
    }

    pub fn cancel_drag(&mut self) {
        self.drag.cancel(&mut self.doc);
    }

    /// Resolve a group and mirror it in the live document
    pub fn group(&mut self, member_oids: &[String], container: ContainerSpec) -> Option<EditIntent> {
        let intent = resolve_group(&self.doc, member_oids, container)?;
        group_elements(&mut self.doc, &intent)?;
        Some(intent)
    }

    pub fn ungroup(&mut self, container_oid: &str) -> Option<EditIntent> {
        let plan = resolve_ungroup(&self.doc, container_oid)?;
        ungroup_elements(&mut self.doc, container_oid)?;
        Some(plan.intent())
    }

    pub fn start_text_edit(&mut self, oid: &str) -> Option<String> {
        self.text.start(&mut self.doc, oid)
    }

    pub fn edit_text(&mut self, text: &str) -> bool {
        self.text.edit(&mut self.doc, text)
    }

    /// Finish text editing and report the change to the host
    pub fn stop_text_edit(&mut self) -> Result<Option<EditIntent>, ChannelError> {
        let Some(intent) = self.text.stop(&mut self.doc) else {
            return Ok(None);
        };
        self.send(HostMessage::TextEdited {
            intent: intent.clone(),
        })?;
        Ok(Some(intent))
    }

    /// Resolve a live node by its source id
    pub fn find(&self, oid: &str) -> Option<NodeId> {
        self.doc.find_by_oid(oid)
    }
}
