//! On-screen gamepad state. Holds the thumbstick deflection and button
//! latches the UI layer writes into, and emits a raw event whenever a
//! value actually changes. Drawing lives in the ui module; this type is
//! what the arbitrator creates and destroys when the virtual source
//! connects and disconnects.

use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::input::events::{PadButton, PadEvent, SourceEvent, SourceId};

#[derive(Debug, thiserror::Error)]
pub enum VirtualPadError {
    #[error("Failed to create virtual pad: {0}")]
    CreationError(String),
}

/// State of the on-screen stick and buttons while the virtual source is
/// connected. Change detection lives here so the immediate-mode UI can
/// write every frame without flooding the event channel.
#[derive(Debug)]
pub struct VirtualPad {
    event_tx: mpsc::Sender<SourceEvent>,
    stick: (f32, f32),
    a_pressed: bool,
    b_pressed: bool,
}

impl VirtualPad {
    /// Creates a virtual pad bound to the raw event channel. Fails when
    /// the channel has no receiver left, which callers treat as the
    /// platform refusing the virtual source.
    pub fn create(event_tx: mpsc::Sender<SourceEvent>) -> Result<Self, VirtualPadError> {
        if event_tx.is_closed() {
            return Err(VirtualPadError::CreationError(
                "raw event channel is closed".to_string(),
            ));
        }

        debug!("Virtual pad created");
        Ok(Self {
            event_tx,
            stick: (0.0, 0.0),
            a_pressed: false,
            b_pressed: false,
        })
    }

    /// Writes the current stick deflection, emitting a StickMoved event
    /// when the value changed since the last write.
    pub fn set_stick(&mut self, x: f32, y: f32) {
        if (x, y) == self.stick {
            return;
        }
        self.stick = (x, y);
        self.send(PadEvent::StickMoved { x, y });
    }

    /// Writes one button's state, emitting a ButtonChanged event on a
    /// press or release transition.
    pub fn set_button(&mut self, button: PadButton, pressed: bool) {
        let latch = match button {
            PadButton::A => &mut self.a_pressed,
            PadButton::B => &mut self.b_pressed,
        };
        if *latch == pressed {
            return;
        }
        *latch = pressed;
        self.send(PadEvent::ButtonChanged { button, pressed });
    }

    pub fn stick(&self) -> (f32, f32) {
        self.stick
    }

    pub fn button_pressed(&self, button: PadButton) -> bool {
        match button {
            PadButton::A => self.a_pressed,
            PadButton::B => self.b_pressed,
        }
    }

    fn send(&self, event: PadEvent) {
        if let Err(e) = self
            .event_tx
            .try_send(SourceEvent::now(SourceId::Virtual, event))
        {
            warn!("Failed to send virtual pad event: {}", e);
        }
    }
}
