use chrono::{DateTime, Local};
use std::fmt;

/// Stable identifier for a physical controller, assigned by the collector
/// when a pad is first seen. Deliberately not the backend's own id type so
/// arbitration logic and tests never touch gilrs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PadId(pub u32);

impl fmt::Display for PadId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "pad{}", self.0)
    }
}

// Which provider an event came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceId {
    Virtual,
    Physical(PadId),
}

// The two buttons the game cares about: A fires jump, B fires attack
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PadButton {
    A,
    B,
}

// Raw per-source event, the shared vocabulary between the gamepad
// collector, the virtual pad and the arbitrator
#[derive(Debug, Clone)]
pub enum PadEvent {
    StickMoved { x: f32, y: f32 },
    ButtonChanged { button: PadButton, pressed: bool },
    Connected,
    Disconnected,
}

// Raw event with source tag and precise chrono timestamp
#[derive(Debug, Clone)]
pub struct SourceEvent {
    pub source: SourceId,
    pub event: PadEvent,
    pub timestamp: DateTime<Local>,
}

impl SourceEvent {
    pub fn now(source: SourceId, event: PadEvent) -> Self {
        Self {
            source,
            event,
            timestamp: Local::now(),
        }
    }
}
