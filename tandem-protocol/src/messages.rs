//! Peer-to-peer message envelopes
//!
//! One envelope per transport frame, serialized as a JSON object whose
//! `type` field selects the variant. The field names on the wire are
//! fixed by the protocol and must not change.

use serde::{Deserialize, Serialize};

/// A single synchronization message exchanged between viewers.
///
/// Envelopes are constructed at the moment of the triggering action,
/// serialized, handed to the transport, and discarded. They are never
/// retained or re-sent.
///
/// Unrecognized `type` values decode to [`Envelope::Unknown`] so that
/// newer peers can introduce message types without breaking older ones.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Envelope {
    /// The sender turned to a new page; receivers follow unconditionally.
    #[serde(rename = "page-update")]
    PageUpdate {
        #[serde(rename = "pageNum")]
        page_num: u32,
    },

    /// The sender toggled its readiness to advance.
    #[serde(rename = "ready-state")]
    ReadyState {
        #[serde(rename = "readyState")]
        ready_state: bool,
    },

    /// The sender's pointer moved, in document-surface coordinates.
    #[serde(rename = "cursor-update")]
    CursorUpdate { x: f64, y: f64 },

    /// Full replacement of the shared notes text (last writer wins).
    #[serde(rename = "notes-update")]
    NotesUpdate {
        #[serde(rename = "notesContent")]
        notes_content: String,
    },

    /// A chat line. The timestamp is display-formatted by the sender
    /// and carries no ordering guarantee.
    #[serde(rename = "chat-message")]
    ChatMessage {
        #[serde(rename = "senderDeviceId")]
        sender_device_id: String,
        message: String,
        timestamp: String,
    },

    /// Catch-all for message types this build does not know about.
    /// Decode-only; receivers ignore it without error.
    #[serde(other)]
    Unknown,
}

impl Envelope {
    /// Return the wire tag for logging
    pub fn type_name(&self) -> &'static str {
        match self {
            Envelope::PageUpdate { .. } => "page-update",
            Envelope::ReadyState { .. } => "ready-state",
            Envelope::CursorUpdate { .. } => "cursor-update",
            Envelope::NotesUpdate { .. } => "notes-update",
            Envelope::ChatMessage { .. } => "chat-message",
            Envelope::Unknown => "unknown",
        }
    }
}
