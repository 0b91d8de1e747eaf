//! Per-client session state
//!
//! Each viewer owns exactly one [`SessionState`] replica. Nothing here
//! is shared across the network; the two replicas are kept eventually
//! consistent by message exchange through the relay.

/// Default render scale
pub const DEFAULT_SCALE: f32 = 1.5;

/// Zoom bounds and step
pub const MIN_SCALE: f32 = 0.5;
pub const MAX_SCALE: f32 = 3.0;
pub const ZOOM_STEP: f32 = 0.2;

/// Peer pointer position in document-surface coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CursorPosition {
    pub x: f64,
    pub y: f64,
}

/// Whether a chat entry originated locally or arrived from the peer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatOrigin {
    Sent,
    Received,
}

/// One line in the chat log. Immutable once appended.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatEntry {
    pub sender: String,
    pub body: String,
    /// Display-formatted send time; not an ordering key
    pub sent_at: String,
    pub origin: ChatOrigin,
}

/// Mutable session record owned by one reconciliation engine.
#[derive(Debug, Clone)]
pub struct SessionState {
    /// Current page, 1-based. Meaningful only while a document is loaded.
    pub current_page: u32,
    /// Total pages of the loaded document; 0 means no document.
    pub total_pages: u32,
    /// Local user signalled intent to advance
    pub local_ready: bool,
    /// Last known readiness of the remote party (mirrors their local flag
    /// with network delay)
    pub peer_ready: bool,
    /// Shared free-text notes; last writer wins
    pub notes: String,
    /// Last reported peer pointer position; absent until first report
    pub peer_cursor: Option<CursorPosition>,
    /// Append-only chat log in arrival order at this client
    pub chat_log: Vec<ChatEntry>,
    /// Render zoom, clamped to [MIN_SCALE, MAX_SCALE]
    pub scale: f32,
}

impl SessionState {
    pub fn new() -> Self {
        Self {
            current_page: 1,
            total_pages: 0,
            local_ready: false,
            peer_ready: false,
            notes: String::new(),
            peer_cursor: None,
            chat_log: Vec::new(),
            scale: DEFAULT_SCALE,
        }
    }

    /// Reset for a freshly loaded document. Notes, chat, and zoom carry
    /// over; page position and the handshake do not.
    pub fn load(&mut self, total_pages: u32) {
        self.current_page = 1;
        self.total_pages = total_pages;
        self.local_ready = false;
        self.peer_ready = false;
    }

    pub fn is_loaded(&self) -> bool {
        self.total_pages > 0
    }

    /// Reading progress in [0.0, 1.0]; 0.0 when no document is loaded
    pub fn progress(&self) -> f32 {
        if self.total_pages == 0 {
            return 0.0;
        }
        self.current_page as f32 / self.total_pages as f32
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new()
    }
}
