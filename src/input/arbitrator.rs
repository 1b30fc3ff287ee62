//! Source arbitration: which input provider feeds the input state.
//!
//! At most one provider drives movement and buttons at any instant, with
//! one deliberate exception: when the virtual pad is configured as always
//! visible, it keeps writing alongside the active physical controller so
//! touch and gamepad input can be used simultaneously.
//!
//! ```text
//! NoSource ──setup──► VirtualActive ──pad connects──► PhysicalActive
//!                          ▲                               │
//!                          └────────last pad leaves────────┘
//! ```
//!
//! With several controllers attached the most recently connected one is
//! the active physical source; the others are ignored until it leaves,
//! at which point the most recent of the remaining controllers takes
//! over.

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::input::events::{PadButton, PadEvent, PadId, SourceEvent, SourceId};
use crate::input::state::InputState;
use crate::input::virtual_pad::VirtualPad;
use crate::settings::PadSettings;

/// Owns the active-source decision and translates accepted raw events
/// into [`InputState`] updates. Lives on the frame-loop side of the raw
/// event channel, so transitions and input writes never interleave with
/// a frame's reads.
pub struct SourceArbitrator {
    settings: PadSettings,
    event_tx: mpsc::Sender<SourceEvent>,
    virtual_pad: Option<VirtualPad>,
    // Connection order; the last entry is the most recently connected.
    connected_pads: Vec<PadId>,
    active_pad: Option<PadId>,
}

impl SourceArbitrator {
    pub fn new(settings: PadSettings, event_tx: mpsc::Sender<SourceEvent>) -> Self {
        info!("Creating source arbitrator with settings: {:?}", settings);
        Self {
            settings,
            event_tx,
            virtual_pad: None,
            connected_pads: Vec::new(),
            active_pad: None,
        }
    }

    /// Records controllers that were connected before the event stream
    /// started, as reported by the collector at spawn time. Must run
    /// before [`SourceArbitrator::setup`] so its no-controller check
    /// sees the real world, not an empty list waiting on the first
    /// channel drain. The last seeded pad counts as the most recently
    /// connected one.
    pub fn seed_connected(&mut self, pads: &[PadId]) {
        for pad in pads {
            self.on_connected(SourceId::Physical(*pad));
        }
    }

    /// Initial transition out of `NoSource`. Connects the virtual pad if
    /// virtual input is enabled and either no physical controller is
    /// present or the pad is configured as always visible.
    pub fn setup(&mut self) {
        if !self.settings.virtual_pad_enabled {
            info!("Virtual pad disabled in settings, staying sourceless");
            return;
        }

        let should_show =
            self.settings.virtual_pad_always_visible || self.connected_pads.is_empty();
        if should_show {
            self.connect_virtual();
        }
    }

    /// Applies one raw event: connect/disconnect events drive source
    /// transitions, input events are forwarded to `input` when their
    /// source is currently accepted.
    pub fn handle_event(&mut self, ev: &SourceEvent, input: &mut InputState) {
        match ev.event {
            PadEvent::Connected => self.on_connected(ev.source),
            PadEvent::Disconnected => self.on_disconnected(ev.source),
            PadEvent::StickMoved { x, y } => {
                if self.accepts(ev.source) {
                    // Raw sources are not trusted to stay in range.
                    input.update_movement(x.clamp(-1.0, 1.0), y.clamp(-1.0, 1.0));
                }
            }
            PadEvent::ButtonChanged { button, pressed } => {
                if self.accepts(ev.source) {
                    match button {
                        PadButton::A => input.update_buttons(pressed, input.attack_pressed()),
                        PadButton::B => input.update_buttons(input.jump_pressed(), pressed),
                    }
                }
            }
        }
    }

    /// Tears down the virtual source. Safe to call repeatedly; physical
    /// controller bookkeeping is left to the ordinary disconnect events.
    pub fn disconnect(&mut self) {
        if self.virtual_pad.take().is_some() {
            info!("Virtual pad disconnected");
        }
    }

    pub fn virtual_active(&self) -> bool {
        self.virtual_pad.is_some()
    }

    pub fn active_pad(&self) -> Option<PadId> {
        self.active_pad
    }

    /// The live virtual pad, for the UI layer to draw and write into.
    pub fn virtual_pad_mut(&mut self) -> Option<&mut VirtualPad> {
        self.virtual_pad.as_mut()
    }

    fn on_connected(&mut self, source: SourceId) {
        let SourceId::Physical(pad) = source else {
            debug!("Ignoring connect event from non-physical source");
            return;
        };

        if !self.connected_pads.contains(&pad) {
            self.connected_pads.push(pad);
        }
        // Most recently connected controller takes over.
        self.active_pad = Some(pad);
        info!("Physical controller {} connected and active", pad);

        if !self.settings.virtual_pad_always_visible {
            self.disconnect_virtual();
        }
    }

    fn on_disconnected(&mut self, source: SourceId) {
        let SourceId::Physical(pad) = source else {
            debug!("Ignoring disconnect event from non-physical source");
            return;
        };

        self.connected_pads.retain(|p| *p != pad);
        info!("Physical controller {} disconnected", pad);

        if self.active_pad == Some(pad) {
            self.active_pad = self.connected_pads.last().copied();
            if let Some(next) = self.active_pad {
                info!("Physical controller {} is now active", next);
            }
        }

        if self.connected_pads.is_empty() && self.settings.virtual_pad_enabled {
            self.connect_virtual();
        }
    }

    fn accepts(&self, source: SourceId) -> bool {
        match source {
            SourceId::Virtual => self.virtual_pad.is_some(),
            SourceId::Physical(pad) => self.active_pad == Some(pad),
        }
    }

    fn connect_virtual(&mut self) {
        if self.virtual_pad.is_some() {
            return;
        }
        match VirtualPad::create(self.event_tx.clone()) {
            Ok(pad) => {
                info!("Virtual pad connected");
                self.virtual_pad = Some(pad);
            }
            Err(e) => {
                // Non-fatal: input stays sourceless until a later
                // connect succeeds.
                warn!("Failed to create virtual pad: {}", e);
            }
        }
    }

    fn disconnect_virtual(&mut self) {
        if self.virtual_pad.take().is_some() {
            info!("Virtual pad disconnected while a controller is active");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn arbitrator(enabled: bool, always_visible: bool) -> SourceArbitrator {
        let (tx, rx) = mpsc::channel(64);
        // Keep the channel open for the arbitrator's lifetime.
        std::mem::forget(rx);
        SourceArbitrator::new(
            PadSettings {
                virtual_pad_enabled: enabled,
                virtual_pad_always_visible: always_visible,
            },
            tx,
        )
    }

    fn connect(arb: &mut SourceArbitrator, input: &mut InputState, pad: u32) {
        arb.handle_event(
            &SourceEvent::now(SourceId::Physical(PadId(pad)), PadEvent::Connected),
            input,
        );
    }

    fn disconnect_pad(arb: &mut SourceArbitrator, input: &mut InputState, pad: u32) {
        arb.handle_event(
            &SourceEvent::now(SourceId::Physical(PadId(pad)), PadEvent::Disconnected),
            input,
        );
    }

    fn stick(arb: &mut SourceArbitrator, input: &mut InputState, source: SourceId, x: f32, y: f32) {
        arb.handle_event(
            &SourceEvent::now(source, PadEvent::StickMoved { x, y }),
            input,
        );
    }

    #[test]
    fn test_setup_connects_virtual_when_enabled_and_no_pads() {
        let mut arb = arbitrator(true, false);
        arb.setup();
        assert!(arb.virtual_active());
        assert_eq!(arb.active_pad(), None);
    }

    #[test]
    fn test_setup_respects_disabled_virtual_input() {
        let mut arb = arbitrator(false, false);
        arb.setup();
        assert!(!arb.virtual_active());
    }

    #[test]
    fn test_setup_skips_virtual_when_pad_already_present() {
        let mut arb = arbitrator(true, false);
        let mut input = InputState::new();

        // Controllers plugged in before startup are seeded ahead of the
        // setup decision; the last one counts as most recent.
        arb.seed_connected(&[PadId(0), PadId(1)]);
        arb.setup();

        assert!(!arb.virtual_active());
        assert_eq!(arb.active_pad(), Some(PadId(1)));

        stick(&mut arb, &mut input, SourceId::Physical(PadId(1)), 0.6, 0.0);
        assert_eq!(input.dx(), 0.6);
    }

    #[test]
    fn test_setup_with_present_pad_and_always_visible() {
        let mut arb = arbitrator(true, true);
        arb.seed_connected(&[PadId(0)]);
        arb.setup();

        // Both sources are live from the very first frame.
        assert!(arb.virtual_active());
        assert_eq!(arb.active_pad(), Some(PadId(0)));
    }

    #[test]
    fn test_physical_connect_displaces_virtual() {
        let mut arb = arbitrator(true, false);
        let mut input = InputState::new();
        arb.setup();

        connect(&mut arb, &mut input, 0);

        assert!(!arb.virtual_active());
        assert_eq!(arb.active_pad(), Some(PadId(0)));

        // Physical input flows, virtual input is rejected.
        stick(&mut arb, &mut input, SourceId::Physical(PadId(0)), 0.5, 0.0);
        assert_eq!(input.dx(), 0.5);
        stick(&mut arb, &mut input, SourceId::Virtual, -1.0, 0.0);
        assert_eq!(input.dx(), 0.5);
    }

    #[test]
    fn test_physical_disconnect_restores_virtual() {
        let mut arb = arbitrator(true, false);
        let mut input = InputState::new();
        arb.setup();

        connect(&mut arb, &mut input, 0);
        assert!(!arb.virtual_active());

        disconnect_pad(&mut arb, &mut input, 0);
        assert!(arb.virtual_active());
        assert_eq!(arb.active_pad(), None);

        stick(&mut arb, &mut input, SourceId::Virtual, -0.75, 0.0);
        assert_eq!(input.dx(), -0.75);
    }

    #[test]
    fn test_always_visible_allows_dual_write() {
        let mut arb = arbitrator(true, true);
        let mut input = InputState::new();
        arb.setup();

        connect(&mut arb, &mut input, 0);

        // Virtual pad survives the physical connect, both sources write.
        assert!(arb.virtual_active());
        assert_eq!(arb.active_pad(), Some(PadId(0)));

        stick(&mut arb, &mut input, SourceId::Physical(PadId(0)), 0.5, 0.0);
        assert_eq!(input.dx(), 0.5);
        stick(&mut arb, &mut input, SourceId::Virtual, -1.0, 0.5);
        assert_eq!(input.dx(), -1.0);
    }

    #[test]
    fn test_virtual_stays_disconnected_when_disabled() {
        let mut arb = arbitrator(false, false);
        let mut input = InputState::new();
        arb.setup();

        connect(&mut arb, &mut input, 0);
        disconnect_pad(&mut arb, &mut input, 0);

        // No controllers remain and virtual input is disabled.
        assert!(!arb.virtual_active());
        assert_eq!(arb.active_pad(), None);
    }

    #[test]
    fn test_most_recently_connected_controller_wins() {
        let mut arb = arbitrator(true, false);
        let mut input = InputState::new();
        arb.setup();

        connect(&mut arb, &mut input, 0);
        connect(&mut arb, &mut input, 1);
        assert_eq!(arb.active_pad(), Some(PadId(1)));

        // The displaced controller is ignored while pad1 is active.
        stick(&mut arb, &mut input, SourceId::Physical(PadId(0)), 0.9, 0.0);
        assert_eq!(input.dx(), 0.0);
        stick(&mut arb, &mut input, SourceId::Physical(PadId(1)), 0.4, 0.0);
        assert_eq!(input.dx(), 0.4);

        // When the active controller leaves, the remaining one takes over
        // and the virtual pad stays out of the picture.
        disconnect_pad(&mut arb, &mut input, 1);
        assert_eq!(arb.active_pad(), Some(PadId(0)));
        assert!(!arb.virtual_active());
    }

    #[test]
    fn test_button_translation_preserves_other_button() {
        let mut arb = arbitrator(true, false);
        let mut input = InputState::new();
        arb.setup();

        arb.handle_event(
            &SourceEvent::now(
                SourceId::Virtual,
                PadEvent::ButtonChanged {
                    button: PadButton::B,
                    pressed: true,
                },
            ),
            &mut input,
        );
        arb.handle_event(
            &SourceEvent::now(
                SourceId::Virtual,
                PadEvent::ButtonChanged {
                    button: PadButton::A,
                    pressed: true,
                },
            ),
            &mut input,
        );

        // The A press did not clobber the held attack state.
        assert!(input.jump_pressed());
        assert!(input.attack_pressed());

        arb.handle_event(
            &SourceEvent::now(
                SourceId::Virtual,
                PadEvent::ButtonChanged {
                    button: PadButton::A,
                    pressed: false,
                },
            ),
            &mut input,
        );
        assert!(!input.jump_pressed());
        assert!(input.attack_pressed());
    }

    #[test]
    fn test_out_of_range_stick_values_are_clamped() {
        let mut arb = arbitrator(true, false);
        let mut input = InputState::new();
        arb.setup();

        stick(&mut arb, &mut input, SourceId::Virtual, 1.5, -2.0);
        assert_eq!(input.dx(), 1.0);
        assert_eq!(input.dy(), -1.0);
    }

    #[test]
    fn test_disconnect_is_idempotent() {
        let mut arb = arbitrator(true, false);
        arb.setup();
        assert!(arb.virtual_active());

        arb.disconnect();
        let after_first = (arb.virtual_active(), arb.active_pad());
        arb.disconnect();
        assert_eq!((arb.virtual_active(), arb.active_pad()), after_first);
        assert!(!arb.virtual_active());
    }

    #[test]
    fn test_virtual_creation_failure_is_non_fatal() {
        let (tx, rx) = mpsc::channel(4);
        drop(rx);
        let mut arb = SourceArbitrator::new(
            PadSettings {
                virtual_pad_enabled: true,
                virtual_pad_always_visible: false,
            },
            tx,
        );

        // Creation is refused; the arbitrator stays sourceless.
        arb.setup();
        assert!(!arb.virtual_active());
        assert_eq!(arb.active_pad(), None);
    }
}
