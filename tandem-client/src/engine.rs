//! Reconciliation engine
//!
//! The single authority, on each client, for how local actions and
//! inbound peer events change the session and what goes back out over
//! the wire. Every operation runs to completion on its triggering event;
//! the engine never suspends mid-mutation, so session state needs no
//! locking.
//!
//! The two replicas converge without an arbiter: page position and notes
//! are last-write-wins, and the ready handshake re-checks after *every*
//! flag mutation so the rendezvous fires no matter which side's signal
//! lands second.

use std::time::{Duration, Instant};

use tandem_protocol::{DeviceId, Envelope};
use tandem_utils::Result;
use tracing::{debug, warn};

use crate::connection::EnvelopeSender;
use crate::render::PageRenderer;
use crate::session::{
    ChatEntry, ChatOrigin, CursorPosition, SessionState, MAX_SCALE, MIN_SCALE, ZOOM_STEP,
};

/// Default minimum interval between cursor emissions
pub const DEFAULT_CURSOR_THROTTLE: Duration = Duration::from_millis(50);

/// Page navigation direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Next,
    Prev,
}

/// What a peer event changed, for the presentation layer to reflect.
///
/// State is already mutated by the time this is returned; the value
/// carries no authority of its own.
#[derive(Debug, Clone, PartialEq)]
pub enum PeerChange {
    PageChanged(u32),
    ReadyChanged { advanced: bool },
    CursorMoved(CursorPosition),
    NotesChanged,
    /// Carries the appended entry so the UI can raise a transient
    /// notification.
    ChatReceived(ChatEntry),
}

/// Reconciliation engine owning one session replica.
pub struct Engine<R: PageRenderer> {
    state: SessionState,
    renderer: R,
    outbound: EnvelopeSender,
    device_id: DeviceId,
    cursor_throttle: Duration,
    last_cursor_sent: Option<Instant>,
}

impl<R: PageRenderer> Engine<R> {
    pub fn new(renderer: R, outbound: EnvelopeSender, device_id: DeviceId) -> Self {
        Self {
            state: SessionState::new(),
            renderer,
            outbound,
            device_id,
            cursor_throttle: DEFAULT_CURSOR_THROTTLE,
            last_cursor_sent: None,
        }
    }

    /// Set the minimum interval between cursor emissions. Zero disables
    /// throttling.
    pub fn with_cursor_throttle(mut self, throttle: Duration) -> Self {
        self.cursor_throttle = throttle;
        self
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn device_id(&self) -> &DeviceId {
        &self.device_id
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    /// Load a document. On success the page position and handshake reset;
    /// on failure the session is left untouched and the error is returned
    /// for user reporting.
    pub fn load_document(&mut self, bytes: &[u8]) -> Result<u32> {
        let pages = self.renderer.load_document(bytes)?;
        self.state.load(pages);
        self.render_current();
        Ok(pages)
    }

    /// Turn one page locally. Out-of-bounds moves and moves without a
    /// loaded document are silent no-ops: navigation at a boundary must
    /// never disturb the session.
    pub fn page_change(&mut self, direction: Direction) {
        if !self.state.is_loaded() {
            return;
        }

        let target = match direction {
            Direction::Next if self.state.current_page < self.state.total_pages => {
                self.state.current_page + 1
            }
            Direction::Prev if self.state.current_page > 1 => self.state.current_page - 1,
            _ => return,
        };

        self.state.current_page = target;
        self.render_current();
        self.emit(Envelope::PageUpdate { page_num: target });
    }

    /// Toggle local readiness. Every toggle emits; suppressing one would
    /// desynchronize the peer's view of our flag. Returns true when the
    /// toggle completed the rendezvous and the page advanced.
    pub fn ready_toggle(&mut self) -> bool {
        self.state.local_ready = !self.state.local_ready;
        self.emit(Envelope::ReadyState {
            ready_state: self.state.local_ready,
        });
        self.reconcile_ready()
    }

    /// Report a local pointer move. Emission is throttled; dropped
    /// intermediates are harmless since the receiver keeps only the
    /// latest position.
    pub fn cursor_move(&mut self, x: f64, y: f64) {
        if !self.cursor_throttle.is_zero() {
            if let Some(last) = self.last_cursor_sent {
                if last.elapsed() < self.cursor_throttle {
                    return;
                }
            }
        }
        self.last_cursor_sent = Some(Instant::now());
        self.emit(Envelope::CursorUpdate { x, y });
    }

    /// Replace the shared notes text and broadcast the new value.
    pub fn notes_edit(&mut self, text: impl Into<String>) {
        let text = text.into();
        self.state.notes = text.clone();
        self.emit(Envelope::NotesUpdate {
            notes_content: text,
        });
    }

    /// Send a chat line. Empty and whitespace-only bodies are rejected
    /// as a no-op. Returns the appended entry.
    pub fn chat_send(&mut self, body: &str) -> Option<&ChatEntry> {
        let body = body.trim();
        if body.is_empty() {
            return None;
        }

        let timestamp = chrono::Local::now().format("%H:%M:%S").to_string();
        self.emit(Envelope::ChatMessage {
            sender_device_id: self.device_id.as_str().to_string(),
            message: body.to_string(),
            timestamp: timestamp.clone(),
        });

        self.state.chat_log.push(ChatEntry {
            sender: self.device_id.as_str().to_string(),
            body: body.to_string(),
            sent_at: timestamp,
            origin: ChatOrigin::Sent,
        });
        self.state.chat_log.last()
    }

    /// Step the zoom up. Local display state only; nothing is emitted.
    pub fn zoom_in(&mut self) {
        self.set_scale(self.state.scale + ZOOM_STEP);
    }

    /// Step the zoom down. Local display state only; nothing is emitted.
    pub fn zoom_out(&mut self) {
        self.set_scale(self.state.scale - ZOOM_STEP);
    }

    fn set_scale(&mut self, scale: f32) {
        let clamped = scale.clamp(MIN_SCALE, MAX_SCALE);
        if (clamped - self.state.scale).abs() < f32::EPSILON {
            return;
        }
        self.state.scale = clamped;
        if self.state.is_loaded() {
            self.render_current();
        }
    }

    /// Apply one inbound peer event. This is the core state machine: one
    /// branch per message type, unknown types ignored without error.
    pub fn apply_peer_event(&mut self, envelope: Envelope) -> Option<PeerChange> {
        match envelope {
            Envelope::PageUpdate { page_num } => {
                // The peer indexes into a document assumed identical to
                // ours, so the value is taken as-is without clamping.
                self.state.current_page = page_num;
                self.render_current();
                Some(PeerChange::PageChanged(page_num))
            }
            Envelope::ReadyState { ready_state } => {
                self.state.peer_ready = ready_state;
                let advanced = self.reconcile_ready();
                Some(PeerChange::ReadyChanged { advanced })
            }
            Envelope::CursorUpdate { x, y } => {
                let position = CursorPosition { x, y };
                self.state.peer_cursor = Some(position);
                Some(PeerChange::CursorMoved(position))
            }
            Envelope::NotesUpdate { notes_content } => {
                // Last received value wins over any concurrent local edit
                self.state.notes = notes_content;
                Some(PeerChange::NotesChanged)
            }
            Envelope::ChatMessage {
                sender_device_id,
                message,
                timestamp,
            } => {
                let entry = ChatEntry {
                    sender: sender_device_id,
                    body: message,
                    sent_at: timestamp,
                    origin: ChatOrigin::Received,
                };
                self.state.chat_log.push(entry.clone());
                Some(PeerChange::ChatReceived(entry))
            }
            Envelope::Unknown => {
                debug!("Ignoring unknown peer message");
                None
            }
        }
    }

    /// The rendezvous rule: when both sides are ready, reset both flags
    /// and advance one page. Must run after every mutation of either
    /// flag, from either origin; wiring it to only one trigger loses the
    /// race where the second-arriving signal never sees the first.
    fn reconcile_ready(&mut self) -> bool {
        if !(self.state.local_ready && self.state.peer_ready) {
            return false;
        }

        self.state.local_ready = false;
        self.state.peer_ready = false;

        if self.state.is_loaded() && self.state.current_page < self.state.total_pages {
            self.state.current_page += 1;
            self.render_current();
            self.emit(Envelope::PageUpdate {
                page_num: self.state.current_page,
            });
            return true;
        }
        false
    }

    fn render_current(&mut self) {
        if let Err(e) = self
            .renderer
            .render_page(self.state.current_page, self.state.scale)
        {
            warn!("Failed to render page {}: {}", self.state.current_page, e);
        }
    }

    fn emit(&self, envelope: Envelope) {
        self.outbound.send_nowait(envelope);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tandem_utils::TandemError;
    use tokio::sync::mpsc;

    /// Renderer double that records every call
    #[derive(Default)]
    struct RecordingRenderer {
        pages: u32,
        rendered: Vec<(u32, f32)>,
        fail_render: bool,
    }

    impl PageRenderer for RecordingRenderer {
        fn load_document(&mut self, bytes: &[u8]) -> Result<u32> {
            if bytes.is_empty() {
                return Err(TandemError::document("empty"));
            }
            Ok(self.pages)
        }

        fn render_page(&mut self, page: u32, scale: f32) -> Result<()> {
            if self.fail_render {
                return Err(TandemError::document("render failed"));
            }
            self.rendered.push((page, scale));
            Ok(())
        }
    }

    fn engine_with_pages(
        pages: u32,
    ) -> (Engine<RecordingRenderer>, mpsc::Receiver<Envelope>) {
        let (tx, rx) = mpsc::channel(64);
        let renderer = RecordingRenderer {
            pages,
            ..Default::default()
        };
        let mut engine = Engine::new(
            renderer,
            EnvelopeSender::new(tx),
            DeviceId::from_string("Device-TESTTESTT"),
        )
        .with_cursor_throttle(Duration::ZERO);

        if pages > 0 {
            engine.load_document(b"doc").unwrap();
        }
        (engine, rx)
    }

    fn drain(rx: &mut mpsc::Receiver<Envelope>) -> Vec<Envelope> {
        let mut out = Vec::new();
        while let Ok(env) = rx.try_recv() {
            out.push(env);
        }
        out
    }

    // ==================== Document loading ====================

    #[test]
    fn test_load_document_resets_state() {
        let (mut engine, _rx) = engine_with_pages(5);
        assert_eq!(engine.state().current_page, 1);
        assert_eq!(engine.state().total_pages, 5);
        assert!(engine.state().is_loaded());
    }

    #[test]
    fn test_load_failure_leaves_state_untouched() {
        let (mut engine, _rx) = engine_with_pages(5);
        engine.state.current_page = 3;

        let result = engine.load_document(b"");
        assert!(result.is_err());

        // No partial load: page position and totals unchanged
        assert_eq!(engine.state().current_page, 3);
        assert_eq!(engine.state().total_pages, 5);
    }

    #[test]
    fn test_load_renders_first_page() {
        let (engine, _rx) = engine_with_pages(5);
        assert_eq!(engine.renderer().rendered.first(), Some(&(1, 1.5)));
    }

    // ==================== Page navigation ====================

    #[test]
    fn test_next_from_middle() {
        let (mut engine, mut rx) = engine_with_pages(5);
        engine.state.current_page = 3;

        engine.page_change(Direction::Next);

        assert_eq!(engine.state().current_page, 4);
        assert_eq!(drain(&mut rx), vec![Envelope::PageUpdate { page_num: 4 }]);
    }

    #[test]
    fn test_prev_at_first_page_is_noop() {
        let (mut engine, mut rx) = engine_with_pages(5);

        engine.page_change(Direction::Prev);

        assert_eq!(engine.state().current_page, 1);
        assert!(drain(&mut rx).is_empty());
    }

    #[test]
    fn test_next_at_last_page_is_noop() {
        let (mut engine, mut rx) = engine_with_pages(3);
        engine.state.current_page = 3;

        engine.page_change(Direction::Next);

        assert_eq!(engine.state().current_page, 3);
        assert!(drain(&mut rx).is_empty());
    }

    #[test]
    fn test_navigation_without_document_is_noop() {
        let (mut engine, mut rx) = engine_with_pages(0);

        engine.page_change(Direction::Next);
        engine.page_change(Direction::Prev);

        assert_eq!(engine.state().current_page, 1);
        assert!(drain(&mut rx).is_empty());
    }

    #[test]
    fn test_page_stays_in_bounds_under_any_sequence() {
        let (mut engine, _rx) = engine_with_pages(4);

        let moves = [
            Direction::Prev,
            Direction::Next,
            Direction::Next,
            Direction::Next,
            Direction::Next,
            Direction::Next,
            Direction::Prev,
            Direction::Prev,
            Direction::Prev,
            Direction::Prev,
            Direction::Prev,
        ];

        for direction in moves {
            engine.page_change(direction);
            let page = engine.state().current_page;
            assert!((1..=4).contains(&page), "page {} escaped bounds", page);
        }
    }

    // ==================== Ready handshake ====================

    #[test]
    fn test_ready_toggle_emits_every_time() {
        let (mut engine, mut rx) = engine_with_pages(5);

        engine.ready_toggle();
        engine.ready_toggle();

        // Two toggles return to the original state but both emissions
        // must go out, or the peer's mirror drifts
        assert_eq!(
            drain(&mut rx),
            vec![
                Envelope::ReadyState { ready_state: true },
                Envelope::ReadyState { ready_state: false },
            ]
        );
        assert!(!engine.state().local_ready);
    }

    #[test]
    fn test_local_then_peer_ready_advances_once() {
        let (mut engine, mut rx) = engine_with_pages(5);
        engine.state.current_page = 3;

        let advanced = engine.ready_toggle();
        assert!(!advanced);

        let change = engine.apply_peer_event(Envelope::ReadyState { ready_state: true });
        assert_eq!(change, Some(PeerChange::ReadyChanged { advanced: true }));

        assert_eq!(engine.state().current_page, 4);
        assert!(!engine.state().local_ready);
        assert!(!engine.state().peer_ready);
        assert_eq!(
            drain(&mut rx),
            vec![
                Envelope::ReadyState { ready_state: true },
                Envelope::PageUpdate { page_num: 4 },
            ]
        );
    }

    #[test]
    fn test_peer_then_local_ready_advances_once() {
        // The rule fires on the local toggle too, not just on peer
        // messages; the second-arriving signal must see the first
        let (mut engine, mut rx) = engine_with_pages(5);

        engine.apply_peer_event(Envelope::ReadyState { ready_state: true });
        assert_eq!(engine.state().current_page, 1);

        let advanced = engine.ready_toggle();
        assert!(advanced);

        assert_eq!(engine.state().current_page, 2);
        assert!(!engine.state().local_ready);
        assert!(!engine.state().peer_ready);
        assert_eq!(
            drain(&mut rx),
            vec![
                Envelope::ReadyState { ready_state: true },
                Envelope::PageUpdate { page_num: 2 },
            ]
        );
    }

    #[test]
    fn test_no_double_trigger_without_fresh_pair() {
        let (mut engine, _rx) = engine_with_pages(5);

        engine.ready_toggle();
        engine.apply_peer_event(Envelope::ReadyState { ready_state: true });
        assert_eq!(engine.state().current_page, 2);

        // A stale repeat of the peer's flag must not advance again
        let change = engine.apply_peer_event(Envelope::ReadyState { ready_state: true });
        assert_eq!(change, Some(PeerChange::ReadyChanged { advanced: false }));
        assert_eq!(engine.state().current_page, 2);

        // A full fresh pair advances exactly once more
        engine.apply_peer_event(Envelope::ReadyState { ready_state: true });
        engine.ready_toggle();
        assert_eq!(engine.state().current_page, 3);
    }

    #[test]
    fn test_ready_at_last_page_resets_flags_without_advance() {
        let (mut engine, mut rx) = engine_with_pages(2);
        engine.state.current_page = 2;

        engine.ready_toggle();
        let change = engine.apply_peer_event(Envelope::ReadyState { ready_state: true });

        assert_eq!(change, Some(PeerChange::ReadyChanged { advanced: false }));
        assert_eq!(engine.state().current_page, 2);
        assert!(!engine.state().local_ready);
        assert!(!engine.state().peer_ready);

        // Only the ReadyState emission; no PageUpdate
        assert_eq!(
            drain(&mut rx),
            vec![Envelope::ReadyState { ready_state: true }]
        );
    }

    #[test]
    fn test_ready_withdrawal_prevents_advance() {
        let (mut engine, _rx) = engine_with_pages(5);

        engine.ready_toggle();
        engine.ready_toggle(); // withdrawn
        engine.apply_peer_event(Envelope::ReadyState { ready_state: true });

        assert_eq!(engine.state().current_page, 1);
        assert!(engine.state().peer_ready);
    }

    #[test]
    fn test_interleavings_yield_exactly_one_advance() {
        // Any interleaving that makes both flags true advances exactly once
        for local_first in [true, false] {
            let (mut engine, _rx) = engine_with_pages(5);
            if local_first {
                engine.ready_toggle();
                engine.apply_peer_event(Envelope::ReadyState { ready_state: true });
            } else {
                engine.apply_peer_event(Envelope::ReadyState { ready_state: true });
                engine.ready_toggle();
            }
            assert_eq!(engine.state().current_page, 2);
            assert!(!engine.state().local_ready);
            assert!(!engine.state().peer_ready);
        }
    }

    // ==================== Peer events ====================

    #[test]
    fn test_peer_page_update_is_trusted() {
        let (mut engine, mut rx) = engine_with_pages(5);

        let change = engine.apply_peer_event(Envelope::PageUpdate { page_num: 4 });

        assert_eq!(change, Some(PeerChange::PageChanged(4)));
        assert_eq!(engine.state().current_page, 4);
        // Following a peer does not rebroadcast
        assert!(drain(&mut rx).is_empty());
    }

    #[test]
    fn test_peer_cursor_update() {
        let (mut engine, _rx) = engine_with_pages(5);
        assert!(engine.state().peer_cursor.is_none());

        engine.apply_peer_event(Envelope::CursorUpdate { x: 12.5, y: 80.0 });
        assert_eq!(
            engine.state().peer_cursor,
            Some(CursorPosition { x: 12.5, y: 80.0 })
        );

        // Latest position wins
        engine.apply_peer_event(Envelope::CursorUpdate { x: 1.0, y: 2.0 });
        assert_eq!(
            engine.state().peer_cursor,
            Some(CursorPosition { x: 1.0, y: 2.0 })
        );
    }

    #[test]
    fn test_peer_notes_overwrite_local() {
        let (mut engine, _rx) = engine_with_pages(5);

        engine.notes_edit("local draft");
        engine.apply_peer_event(Envelope::NotesUpdate {
            notes_content: "peer version".into(),
        });

        assert_eq!(engine.state().notes, "peer version");
    }

    #[test]
    fn test_notes_application_is_idempotent() {
        let (mut engine, _rx) = engine_with_pages(5);

        let update = Envelope::NotesUpdate {
            notes_content: "same text".into(),
        };
        engine.apply_peer_event(update.clone());
        engine.apply_peer_event(update);

        assert_eq!(engine.state().notes, "same text");
    }

    #[test]
    fn test_peer_chat_appends_and_reports() {
        let (mut engine, _rx) = engine_with_pages(5);

        let change = engine.apply_peer_event(Envelope::ChatMessage {
            sender_device_id: "Device-PEERPEERP".into(),
            message: "slow down at the coda".into(),
            timestamp: "15:04:05".into(),
        });

        let Some(PeerChange::ChatReceived(entry)) = change else {
            panic!("expected ChatReceived");
        };
        assert_eq!(entry.sender, "Device-PEERPEERP");
        assert_eq!(entry.origin, ChatOrigin::Received);
        assert_eq!(engine.state().chat_log.len(), 1);
    }

    #[test]
    fn test_unknown_peer_event_ignored() {
        let (mut engine, mut rx) = engine_with_pages(5);
        let before = engine.state().clone();

        let change = engine.apply_peer_event(Envelope::Unknown);

        assert_eq!(change, None);
        assert_eq!(engine.state().current_page, before.current_page);
        assert_eq!(engine.state().notes, before.notes);
        assert!(drain(&mut rx).is_empty());
    }

    // ==================== Chat ====================

    #[test]
    fn test_chat_send_appends_and_emits() {
        let (mut engine, mut rx) = engine_with_pages(5);

        let entry = engine.chat_send("hello over there").unwrap().clone();
        assert_eq!(entry.body, "hello over there");
        assert_eq!(entry.sender, "Device-TESTTESTT");
        assert_eq!(entry.origin, ChatOrigin::Sent);

        let sent = drain(&mut rx);
        assert_eq!(sent.len(), 1);
        let Envelope::ChatMessage {
            sender_device_id,
            message,
            ..
        } = &sent[0]
        else {
            panic!("expected ChatMessage");
        };
        assert_eq!(sender_device_id, "Device-TESTTESTT");
        assert_eq!(message, "hello over there");
    }

    #[test]
    fn test_chat_send_rejects_empty() {
        let (mut engine, mut rx) = engine_with_pages(5);

        assert!(engine.chat_send("").is_none());
        assert!(engine.chat_send("   \t  ").is_none());

        assert!(engine.state().chat_log.is_empty());
        assert!(drain(&mut rx).is_empty());
    }

    #[test]
    fn test_chat_log_preserves_arrival_order() {
        let (mut engine, _rx) = engine_with_pages(5);

        engine.chat_send("first local");
        engine.apply_peer_event(Envelope::ChatMessage {
            sender_device_id: "Device-PEERPEERP".into(),
            message: "peer reply".into(),
            timestamp: "12:00:01".into(),
        });
        engine.chat_send("second local");

        let bodies: Vec<&str> = engine
            .state()
            .chat_log
            .iter()
            .map(|entry| entry.body.as_str())
            .collect();
        assert_eq!(bodies, vec!["first local", "peer reply", "second local"]);
    }

    // ==================== Cursor ====================

    #[test]
    fn test_cursor_move_unthrottled() {
        let (mut engine, mut rx) = engine_with_pages(5);

        engine.cursor_move(10.0, 20.0);
        engine.cursor_move(11.0, 21.0);

        assert_eq!(
            drain(&mut rx),
            vec![
                Envelope::CursorUpdate { x: 10.0, y: 20.0 },
                Envelope::CursorUpdate { x: 11.0, y: 21.0 },
            ]
        );
    }

    #[test]
    fn test_cursor_move_throttled() {
        let (tx, mut rx) = mpsc::channel(64);
        let renderer = RecordingRenderer {
            pages: 5,
            ..Default::default()
        };
        let mut engine = Engine::new(
            renderer,
            EnvelopeSender::new(tx),
            DeviceId::from_string("Device-TESTTESTT"),
        )
        .with_cursor_throttle(Duration::from_secs(60));

        engine.cursor_move(1.0, 1.0);
        engine.cursor_move(2.0, 2.0);
        engine.cursor_move(3.0, 3.0);

        // Only the first emission makes it inside the throttle window
        assert_eq!(
            drain(&mut rx),
            vec![Envelope::CursorUpdate { x: 1.0, y: 1.0 }]
        );
    }

    // ==================== Zoom ====================

    #[test]
    fn test_zoom_steps_and_clamps() {
        let (mut engine, mut rx) = engine_with_pages(5);

        engine.zoom_in();
        assert!((engine.state().scale - 1.7).abs() < 1e-5);

        for _ in 0..20 {
            engine.zoom_in();
        }
        assert_eq!(engine.state().scale, MAX_SCALE);

        for _ in 0..30 {
            engine.zoom_out();
        }
        assert_eq!(engine.state().scale, MIN_SCALE);

        // Zoom is local-only
        assert!(drain(&mut rx).is_empty());
    }

    #[test]
    fn test_zoom_rerenders_current_page() {
        let (mut engine, _rx) = engine_with_pages(5);
        engine.state.current_page = 2;

        engine.zoom_in();

        let last = engine.renderer().rendered.last().copied().unwrap();
        assert_eq!(last.0, 2);
        assert!((last.1 - 1.7).abs() < 1e-5);
    }

    // ==================== Failure absorption ====================

    #[test]
    fn test_render_failure_does_not_stop_session() {
        let (tx, mut rx) = mpsc::channel(64);
        let renderer = RecordingRenderer {
            pages: 5,
            fail_render: true,
            ..Default::default()
        };
        let mut engine = Engine::new(
            renderer,
            EnvelopeSender::new(tx),
            DeviceId::from_string("Device-TESTTESTT"),
        );
        engine.load_document(b"doc").unwrap();

        engine.page_change(Direction::Next);

        // State advances and the update still goes out
        assert_eq!(engine.state().current_page, 2);
        assert_eq!(drain(&mut rx), vec![Envelope::PageUpdate { page_num: 2 }]);
    }

    #[test]
    fn test_emissions_dropped_when_channel_closed() {
        let (tx, rx) = mpsc::channel(64);
        drop(rx);

        let renderer = RecordingRenderer {
            pages: 5,
            ..Default::default()
        };
        let mut engine = Engine::new(
            renderer,
            EnvelopeSender::new(tx),
            DeviceId::from_string("Device-TESTTESTT"),
        );
        engine.load_document(b"doc").unwrap();

        // Must not panic or error: best-effort delivery
        engine.page_change(Direction::Next);
        engine.ready_toggle();
        engine.notes_edit("still works");

        assert_eq!(engine.state().current_page, 2);
        assert_eq!(engine.state().notes, "still works");
    }
}
