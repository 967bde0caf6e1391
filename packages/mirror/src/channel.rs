//! Transport from the mirror to the host editor.
//!
//! Messages are JSON objects tagged by `type`. Sends are never retried: a
//! failure is logged and handed back to the caller.

use crate::errors::ChannelError;
use crate::layers::LayerNode;
use crate::observer::LayersChanged;
use serde::{Deserialize, Serialize};
use std::io::Write;
use tandem_semantics::EditIntent;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum HostMessage {
    LayerSnapshot { layer: LayerNode },
    LayersChanged(LayersChanged),
    DragEnded { intent: EditIntent },
    TextEdited { intent: EditIntent },
}

pub trait HostChannel {
    fn send(&mut self, message: HostMessage) -> Result<(), ChannelError>;
}

/// Collects messages in memory
#[derive(Debug, Default)]
pub struct MemoryChannel {
    messages: Vec<HostMessage>,
    closed: bool,
}

impl MemoryChannel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> &[HostMessage] {
        &self.messages
    }

    pub fn take(&mut self) -> Vec<HostMessage> {
        std::mem::take(&mut self.messages)
    }

    /// Every later send fails with `ChannelError::Closed`
    pub fn close(&mut self) {
        self.closed = true;
    }
}

impl HostChannel for MemoryChannel {
    fn send(&mut self, message: HostMessage) -> Result<(), ChannelError> {
        if self.closed {
            return Err(ChannelError::Closed);
        }
        self.messages.push(message);
        Ok(())
    }
}

/// Writes one JSON message per line
#[derive(Debug)]
pub struct JsonLinesChannel<W: Write> {
    writer: W,
}

impl<W: Write> JsonLinesChannel<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> HostChannel for JsonLinesChannel<W> {
    fn send(&mut self, message: HostMessage) -> Result<(), ChannelError> {
        serde_json::to_writer(&mut self.writer, &message)?;
        self.writer.write_all(b"\n")?;
        self.writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_lines_wire_format() {
        let mut channel = JsonLinesChannel::new(Vec::new());
        channel
            .send(HostMessage::DragEnded {
                intent: EditIntent::Move {
                    oid: "a1".to_string(),
                    new_index: 2,
                },
            })
            .unwrap();
        channel
            .send(HostMessage::LayersChanged(LayersChanged {
                parent_oid: Some("p".to_string()),
                layer: LayerNode {
                    source_id: Some("p".to_string()),
                    runtime_id: "r".to_string(),
                    tag_name: "div".to_string(),
                    text_snippet: None,
                    children: vec![],
                },
            }))
            .unwrap();

        let out = String::from_utf8(channel.into_inner()).unwrap();
        let lines: Vec<serde_json::Value> = out
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(lines[0]["type"], "dragEnded");
        assert_eq!(lines[0]["intent"]["type"], "move");
        assert_eq!(lines[0]["intent"]["newIndex"], 2);
        assert_eq!(lines[1]["type"], "layersChanged");
        assert_eq!(lines[1]["parentOid"], "p");
        assert_eq!(lines[1]["layer"]["tagName"], "div");
    }

    #[test]
    fn test_closed_channel_fails() {
        let mut channel = MemoryChannel::new();
        channel.close();
        let err = channel
            .send(HostMessage::TextEdited {
                intent: EditIntent::Remove {
                    oid: "x".to_string(),
                },
            })
            .unwrap_err();
        assert!(matches!(err, ChannelError::Closed));
        assert!(channel.messages().is_empty());
    }
}
