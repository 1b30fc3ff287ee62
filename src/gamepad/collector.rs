use chrono::Local;
use gilrs::{Axis, Button, Event, EventType, GamepadId, Gilrs};
use statum::{machine, state};
use std::collections::HashMap;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::input::events::{PadButton, PadEvent, PadId, SourceEvent, SourceId};

// Collector settings
#[derive(Clone, Debug)]
pub struct CollectorSettings {
    pub joystick_deadzone: f32,
}

impl Default for CollectorSettings {
    fn default() -> Self {
        Self {
            joystick_deadzone: 0.05,
        }
    }
}

// Collector errors
#[derive(Debug, thiserror::Error)]
pub enum CollectorError {
    #[error("Failed to initialize collector: {0}")]
    InitializationError(String),

    #[error("Failed to send event: {0}")]
    EventSendError(String),
}

// Collector states
#[state]
#[derive(Debug, Clone)]
pub enum CollectionState {
    Initializing,
    Collecting,
}

#[machine]
#[derive(Debug)]
pub struct PadCollector<CollectionState> {
    // Gilrs context
    gilrs: Gilrs,

    // Collector settings
    settings: CollectorSettings,

    // Channel for raw events toward the arbitrator
    event_tx: mpsc::Sender<SourceEvent>,

    // Stable small ids handed out per backend gamepad id
    pad_ids: HashMap<GamepadId, PadId>,
    next_pad_id: u32,

    // Last seen stick values per pad; gilrs reports one axis at a time
    last_sticks: HashMap<GamepadId, (f32, f32)>,
}

impl<S: CollectionStateTrait> PadCollector<S> {
    fn register_pad(&mut self, id: GamepadId) -> PadId {
        if let Some(pad) = self.pad_ids.get(&id) {
            return *pad;
        }
        let pad = PadId(self.next_pad_id);
        self.next_pad_id += 1;
        self.pad_ids.insert(id, pad);
        debug!("Registered gamepad {:?} as {}", id, pad);
        pad
    }
}

impl PadCollector<Initializing> {
    pub fn create(
        settings: Option<CollectorSettings>,
        event_tx: mpsc::Sender<SourceEvent>,
    ) -> Result<Self, CollectorError> {
        let settings = settings.unwrap_or_default();
        debug!("Creating pad collector with settings: {:?}", settings);

        info!("Initializing gilrs controller interface");
        let gilrs = match Gilrs::new() {
            Ok(g) => {
                info!("Successfully initialized gilrs");
                g
            }
            Err(e) => {
                error!("Failed to initialize gilrs: {}", e);
                return Err(CollectorError::InitializationError(e.to_string()));
            }
        };

        Ok(Self {
            marker: core::marker::PhantomData,
            state_data: (),
            gilrs,
            settings,
            event_tx,
            pad_ids: HashMap::new(),
            next_pad_id: 0,
            last_sticks: HashMap::new(),
        })
    }

    // Enumerate already-present gamepads and transition to Collecting.
    // Controllers plugged in before startup never produce a Connected
    // event from gilrs, so the list is handed back to the caller for
    // seeding the arbitrator before its first setup decision.
    pub fn initialize(mut self) -> (PadCollector<Collecting>, Vec<PadId>) {
        info!(
            "Initializing pad collector with deadzone: {}",
            self.settings.joystick_deadzone
        );

        let present: Vec<(GamepadId, String)> = self
            .gilrs
            .gamepads()
            .map(|(id, gamepad)| (id, gamepad.name().to_string()))
            .collect();

        let mut present_pads = Vec::new();
        if present.is_empty() {
            info!("No gamepad connected, waiting for connect events");
        } else {
            info!("Found {} gamepads:", present.len());
            for (id, name) in present {
                let pad = self.register_pad(id);
                info!("  {}: {} ({:?})", pad, name, id);
                present_pads.push(pad);
            }
        }

        info!("Pad collector initialized, transitioning to Collecting state");
        let next = PadCollector::<Collecting> {
            marker: core::marker::PhantomData,
            state_data: (),
            gilrs: self.gilrs,
            settings: self.settings,
            event_tx: self.event_tx,
            pad_ids: self.pad_ids,
            next_pad_id: self.next_pad_id,
            last_sticks: self.last_sticks,
        };
        (next, present_pads)
    }
}

impl PadCollector<Collecting> {
    // Collect a single gilrs event and forward it if it maps to anything
    pub fn collect_next_event(&mut self) -> Result<(), CollectorError> {
        if let Some(Event {
            id, event, time, ..
        }) = self.gilrs.next_event()
        {
            debug!("Processing gilrs event: {:?} at time: {:?}", event, time);

            if let Some(source_event) = self.convert_event(id, event) {
                self.send_event(source_event)?;
            }
        }

        Ok(())
    }

    // Run the collector until the process exits
    pub fn run_collection_loop(&mut self) -> Result<(), CollectorError> {
        info!("Starting pad collection loop");

        let mut event_count: u64 = 0;
        let mut last_log_time = Local::now();
        let log_interval = chrono::Duration::seconds(30);

        loop {
            if let Err(e) = self.collect_next_event() {
                error!("Error collecting event: {}", e);
                // Keep the loop alive despite send failures
            } else {
                event_count += 1;
            }

            let now = Local::now();
            if now - last_log_time > log_interval {
                info!(
                    "Pad collector stats: {} poll cycles in last {} seconds",
                    event_count,
                    log_interval.num_seconds()
                );
                event_count = 0;
                last_log_time = now;
            }

            // Small sleep to keep the poll loop off 100% CPU
            std::thread::sleep(std::time::Duration::from_micros(100));
        }
    }

    fn convert_event(&mut self, id: GamepadId, event: EventType) -> Option<SourceEvent> {
        match event {
            EventType::AxisChanged(axis, value, _) => {
                let pad = self.register_pad(id);
                let deadzone = self.settings.joystick_deadzone;
                let last = self.last_sticks.entry(id).or_insert((0.0, 0.0));

                match axis {
                    Axis::LeftStickX => {
                        let x = apply_deadzone(value, deadzone);
                        let y = last.1;
                        last.0 = x;
                        Some(SourceEvent::now(
                            SourceId::Physical(pad),
                            PadEvent::StickMoved { x, y },
                        ))
                    }
                    Axis::LeftStickY => {
                        let y = apply_deadzone(value, deadzone);
                        let x = last.0;
                        last.1 = y;
                        Some(SourceEvent::now(
                            SourceId::Physical(pad),
                            PadEvent::StickMoved { x, y },
                        ))
                    }
                    _ => {
                        debug!("Ignoring unsupported axis: {:?}", axis);
                        None
                    }
                }
            }
            EventType::ButtonPressed(button, _) => {
                let pad = self.register_pad(id);
                info!("Button pressed on {}: {:?}", pad, button);
                map_button(button).map(|button| {
                    SourceEvent::now(
                        SourceId::Physical(pad),
                        PadEvent::ButtonChanged {
                            button,
                            pressed: true,
                        },
                    )
                })
            }
            EventType::ButtonReleased(button, _) => {
                let pad = self.register_pad(id);
                info!("Button released on {}: {:?}", pad, button);
                map_button(button).map(|button| {
                    SourceEvent::now(
                        SourceId::Physical(pad),
                        PadEvent::ButtonChanged {
                            button,
                            pressed: false,
                        },
                    )
                })
            }
            EventType::ButtonRepeated(button, _) => {
                debug!("Button repeat ignored: {:?}", button);
                None
            }
            EventType::Connected => {
                let pad = self.register_pad(id);
                info!("Controller {} connected", pad);
                Some(SourceEvent::now(
                    SourceId::Physical(pad),
                    PadEvent::Connected,
                ))
            }
            EventType::Disconnected => {
                let pad = self.register_pad(id);
                self.last_sticks.remove(&id);
                warn!("Controller {} disconnected", pad);
                Some(SourceEvent::now(
                    SourceId::Physical(pad),
                    PadEvent::Disconnected,
                ))
            }
            _ => {
                debug!("Unhandled event type: {:?}", event);
                None
            }
        }
    }
}

impl<S: CollectionStateTrait> PadCollector<S> {
    fn send_event(&self, event: SourceEvent) -> Result<(), CollectorError> {
        match self.event_tx.try_send(event) {
            Ok(_) => Ok(()),
            Err(e) => {
                error!("Failed to send event to arbitrator: {}", e);
                Err(CollectorError::EventSendError(e.to_string()))
            }
        }
    }
}

// Public interface for spawning and running the collector
pub struct CollectorHandle {
    // Controllers that were connected before the event stream started
    initial_pads: Vec<PadId>,
}

impl CollectorHandle {
    // Create and initialize a collector on the calling thread, then run
    // its poll loop on a blocking worker. Initialization stays
    // synchronous so the caller knows about already-present controllers
    // before any arbitration decision is made.
    pub fn spawn(
        settings: Option<CollectorSettings>,
        event_tx: mpsc::Sender<SourceEvent>,
    ) -> Result<Self, CollectorError> {
        info!("Spawning pad collector with settings: {:?}", settings);

        let collector = PadCollector::create(settings, event_tx)?;
        info!("Successfully created PadCollector instance");

        let (mut collecting, initial_pads) = collector.initialize();

        tokio::task::spawn_blocking(move || {
            info!("Pad collector initialization successful, starting collection loop");
            if let Err(e) = collecting.run_collection_loop() {
                error!("Collector task terminated with error: {}", e);
            }
        });

        info!("Pad collector successfully started");
        Ok(Self { initial_pads })
    }

    // Controllers present at spawn time, in enumeration order
    pub fn initial_pads(&self) -> &[PadId] {
        &self.initial_pads
    }
}

// Map the backend button to the two buttons the game uses
fn map_button(button: Button) -> Option<PadButton> {
    match button {
        Button::South => Some(PadButton::A),
        Button::East => Some(PadButton::B),
        _ => None,
    }
}

// Apply a deadzone and rescale the remaining range back to [-1, 1]
fn apply_deadzone(value: f32, deadzone: f32) -> f32 {
    if value.abs() < deadzone {
        0.0
    } else {
        let sign = if value < 0.0 { -1.0 } else { 1.0 };
        sign * (value.abs() - deadzone) / (1.0 - deadzone)
    }
}
