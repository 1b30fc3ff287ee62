//! Current movement and button state with one frame of button history.
//!
//! Sources overwrite the analog and digital fields as events arrive; the
//! frame loop reads quantized movement and rising edges once per frame and
//! then calls [`InputState::update_previous_states`] to roll the history
//! forward. The previous-state slots are never read from outside, they
//! only back the edge queries.

use tracing::debug;

/// Per-axis magnitude above which analog input counts as a full step.
const PIXEL_THRESHOLD: f32 = 0.3;

/// Analog movement collapsed to discrete steps, one of {-1, 0, 1} per axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelMove {
    pub x: i32,
    pub y: i32,
}

/// Movement and button state as last written by whichever source is active.
///
/// All operations are total; querying a state no source has ever written
/// returns the all-zero default. The one contract callers must uphold is
/// the per-frame ordering around [`InputState::update_previous_states`]:
/// it runs exactly once per simulation frame, after every edge query and
/// button update for that frame. Calling it early or twice makes
/// `previous == current` before the edge check and silently swallows the
/// edge. That violation is a caller bug and is not detected at runtime.
#[derive(Debug, Default)]
pub struct InputState {
    dx: f32,
    dy: f32,
    jump_pressed: bool,
    attack_pressed: bool,
    previous_jump_pressed: bool,
    previous_attack_pressed: bool,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Overwrites the current analog movement. Values are stored verbatim;
    /// range validation happens at the arbitration boundary.
    pub fn update_movement(&mut self, dx: f32, dy: f32) {
        self.dx = dx;
        self.dy = dy;
    }

    /// Overwrites both digital button states.
    pub fn update_buttons(&mut self, jump: bool, attack: bool) {
        self.jump_pressed = jump;
        self.attack_pressed = attack;
    }

    pub fn dx(&self) -> f32 {
        self.dx
    }

    pub fn dy(&self) -> f32 {
        self.dy
    }

    pub fn jump_pressed(&self) -> bool {
        self.jump_pressed
    }

    pub fn attack_pressed(&self) -> bool {
        self.attack_pressed
    }

    /// True for exactly one frame per press-and-hold of the jump button.
    pub fn is_jump_just_pressed(&self) -> bool {
        self.jump_pressed && !self.previous_jump_pressed
    }

    /// True for exactly one frame per press-and-hold of the attack button.
    pub fn is_attack_just_pressed(&self) -> bool {
        self.attack_pressed && !self.previous_attack_pressed
    }

    /// Rolls the edge-detection history forward. Call once per frame,
    /// after all edge queries and button updates for that frame.
    pub fn update_previous_states(&mut self) {
        self.previous_jump_pressed = self.jump_pressed;
        self.previous_attack_pressed = self.attack_pressed;
    }

    /// Quantizes the analog movement to discrete directions for the
    /// retro movement feel: each axis independently maps to +1 above the
    /// threshold, -1 below its negation, 0 otherwise.
    pub fn pixel_perfect_movement(&self) -> PixelMove {
        let x = if self.dx > PIXEL_THRESHOLD {
            1
        } else if self.dx < -PIXEL_THRESHOLD {
            -1
        } else {
            0
        };

        let y = if self.dy > PIXEL_THRESHOLD {
            1
        } else if self.dy < -PIXEL_THRESHOLD {
            -1
        } else {
            0
        };

        PixelMove { x, y }
    }

    /// Zeroes every current and previous field.
    pub fn reset(&mut self) {
        debug!("Resetting input state");
        self.dx = 0.0;
        self.dy = 0.0;
        self.jump_pressed = false;
        self.attack_pressed = false;
        self.previous_jump_pressed = false;
        self.previous_attack_pressed = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quantization_threshold_per_axis() {
        let mut input = InputState::new();

        input.update_movement(0.31, 0.0);
        assert_eq!(input.pixel_perfect_movement(), PixelMove { x: 1, y: 0 });

        input.update_movement(-0.31, 0.0);
        assert_eq!(input.pixel_perfect_movement(), PixelMove { x: -1, y: 0 });

        input.update_movement(0.0, 0.31);
        assert_eq!(input.pixel_perfect_movement(), PixelMove { x: 0, y: 1 });

        input.update_movement(0.0, -0.31);
        assert_eq!(input.pixel_perfect_movement(), PixelMove { x: 0, y: -1 });
    }

    #[test]
    fn test_quantization_threshold_is_exclusive() {
        let mut input = InputState::new();
        // Exactly at the threshold is still inside the dead region.
        input.update_movement(0.3, -0.3);
        assert_eq!(input.pixel_perfect_movement(), PixelMove { x: 0, y: 0 });
    }

    #[test]
    fn test_quantization_axes_independent() {
        let mut input = InputState::new();
        input.update_movement(0.5, -0.1);
        assert_eq!(input.pixel_perfect_movement(), PixelMove { x: 1, y: 0 });

        input.update_movement(-0.9, 0.9);
        assert_eq!(input.pixel_perfect_movement(), PixelMove { x: -1, y: 1 });
    }

    #[test]
    fn test_quantization_of_full_deflection() {
        let mut input = InputState::new();
        input.update_movement(1.0, -1.0);
        assert_eq!(input.pixel_perfect_movement(), PixelMove { x: 1, y: -1 });
    }

    #[test]
    fn test_jump_edge_fires_once_per_press() {
        let mut input = InputState::new();

        input.update_buttons(true, false);
        assert!(input.is_jump_just_pressed());

        // End of frame: history rolls forward, held button is no edge.
        input.update_previous_states();
        assert!(!input.is_jump_just_pressed());
        assert!(input.jump_pressed());

        // Release and re-press produces a fresh edge.
        input.update_buttons(false, false);
        input.update_previous_states();
        input.update_buttons(true, false);
        assert!(input.is_jump_just_pressed());
    }

    #[test]
    fn test_attack_edge_independent_of_jump() {
        let mut input = InputState::new();

        input.update_buttons(true, true);
        assert!(input.is_jump_just_pressed());
        assert!(input.is_attack_just_pressed());

        input.update_previous_states();
        input.update_buttons(true, false);
        input.update_previous_states();
        input.update_buttons(true, true);

        // Jump was held the whole time, only attack re-edges.
        assert!(!input.is_jump_just_pressed());
        assert!(input.is_attack_just_pressed());
    }

    #[test]
    fn test_edge_query_is_repeatable_within_a_frame() {
        let mut input = InputState::new();
        input.update_buttons(true, false);

        // Queries do not consume the edge; only the frame advance does.
        assert!(input.is_jump_just_pressed());
        assert!(input.is_jump_just_pressed());
        input.update_previous_states();
        assert!(!input.is_jump_just_pressed());
    }

    #[test]
    fn test_untouched_state_is_all_zero() {
        let input = InputState::new();
        assert_eq!(input.dx(), 0.0);
        assert_eq!(input.dy(), 0.0);
        assert!(!input.jump_pressed());
        assert!(!input.attack_pressed());
        assert!(!input.is_jump_just_pressed());
        assert!(!input.is_attack_just_pressed());
        assert_eq!(input.pixel_perfect_movement(), PixelMove { x: 0, y: 0 });
    }

    #[test]
    fn test_reset_returns_to_defaults() {
        let mut input = InputState::new();
        input.update_movement(0.8, -0.6);
        input.update_buttons(true, true);
        input.update_previous_states();

        input.reset();

        assert_eq!(input.dx(), 0.0);
        assert_eq!(input.dy(), 0.0);
        assert!(!input.jump_pressed());
        assert!(!input.attack_pressed());
        // Previous slots are zeroed too: the next press is a fresh edge.
        input.update_buttons(true, false);
        assert!(input.is_jump_just_pressed());
    }

    #[test]
    fn test_movement_stored_verbatim() {
        let mut input = InputState::new();
        input.update_movement(0.123, -0.456);
        assert_eq!(input.dx(), 0.123);
        assert_eq!(input.dy(), -0.456);
    }
}
