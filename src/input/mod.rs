//! Input subsystem: raw source events, current input state, and the
//! arbitration between the virtual pad and physical controllers.
//!
//! # Architecture
//!
//! ```text
//! Gamepad collector ──┐
//!                     ├──► mpsc ──► SourceArbitrator ──► InputState
//! Virtual pad ────────┘            (accept / reject)     (per-frame reads)
//! ```
//!
//! All InputState access happens on the frame-loop side of the channel;
//! sources only ever push raw events.

pub mod arbitrator;
pub mod events;
pub mod state;
pub mod virtual_pad;

pub use arbitrator::SourceArbitrator;
pub use events::{PadButton, PadEvent, PadId, SourceEvent, SourceId};
pub use state::{InputState, PixelMove};
pub use virtual_pad::{VirtualPad, VirtualPadError};
