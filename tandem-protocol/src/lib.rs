//! tandem-protocol: Shared wire definitions for peer synchronization
//!
//! This crate defines the message envelopes exchanged between tandem
//! viewers through the relay, the framing codecs for both sides of the
//! wire, and the device identity used to label chat messages.

pub mod codec;
pub mod device;
pub mod messages;

// Re-export main types at crate root
pub use codec::{CodecError, EnvelopeCodec, FrameCodec, MAX_FRAME_SIZE};
pub use device::DeviceId;
pub use messages::Envelope;
