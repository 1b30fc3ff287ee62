//! On-screen gamepad overlay: a draggable thumbstick in the lower-left
//! corner and A/B buttons in the lower-right. The widget only writes
//! into the [`VirtualPad`] state; event emission and change detection
//! live there.

use eframe::egui::{self, Align2, FontId, Pos2, Rect, Sense, Stroke, Vec2};

use crate::input::{PadButton, VirtualPad};
use crate::ui::UiColors;

const STICK_RADIUS: f32 = 60.0;
const KNOB_RADIUS: f32 = 24.0;
const BUTTON_RADIUS: f32 = 28.0;
const BUTTON_GAP: f32 = 18.0;
const MARGIN: f32 = 28.0;

pub fn show(ui: &mut egui::Ui, pad: &mut VirtualPad) {
    let area = ui.max_rect();
    show_stick(ui, area, pad);
    show_button(ui, area, pad, PadButton::A, "A", 0);
    show_button(ui, area, pad, PadButton::B, "B", 1);
}

fn show_stick(ui: &mut egui::Ui, area: Rect, pad: &mut VirtualPad) {
    let center = Pos2::new(
        area.left() + MARGIN + STICK_RADIUS,
        area.bottom() - MARGIN - STICK_RADIUS,
    );
    let stick_rect = Rect::from_center_size(center, Vec2::splat(STICK_RADIUS * 2.0));
    let response = ui.interact(stick_rect, ui.id().with("virtual_stick"), Sense::drag());

    let deflection = if response.is_pointer_button_down_on() {
        match response.interact_pointer_pos() {
            Some(pos) => {
                let offset = (pos - center) / STICK_RADIUS;
                // Screen y grows downward, world dy grows upward.
                (offset.x.clamp(-1.0, 1.0), (-offset.y).clamp(-1.0, 1.0))
            }
            None => (0.0, 0.0),
        }
    } else {
        // Released stick springs back to center.
        (0.0, 0.0)
    };
    pad.set_stick(deflection.0, deflection.1);

    // Draw from the pad state so the knob always matches what was sent.
    let (x, y) = pad.stick();
    let painter = ui.painter();
    painter.circle(
        center,
        STICK_RADIUS,
        UiColors::PAD_BASE,
        Stroke::new(1.0, UiColors::BORDER),
    );
    let knob_travel = STICK_RADIUS - KNOB_RADIUS;
    let knob_center = center + Vec2::new(x * knob_travel, -y * knob_travel);
    painter.circle(
        knob_center,
        KNOB_RADIUS,
        UiColors::PAD_KNOB,
        Stroke::new(1.0, UiColors::BORDER),
    );
}

fn show_button(
    ui: &mut egui::Ui,
    area: Rect,
    pad: &mut VirtualPad,
    button: PadButton,
    label: &str,
    slot: u32,
) {
    // Slot 0 sits in the corner, further slots fan out to the left and up.
    let center = Pos2::new(
        area.right() - MARGIN - BUTTON_RADIUS - slot as f32 * (BUTTON_RADIUS * 2.0 + BUTTON_GAP),
        area.bottom() - MARGIN - BUTTON_RADIUS - slot as f32 * BUTTON_RADIUS,
    );
    let button_rect = Rect::from_center_size(center, Vec2::splat(BUTTON_RADIUS * 2.0));
    let response = ui.interact(
        button_rect,
        ui.id().with(("virtual_button", slot)),
        Sense::drag(),
    );

    pad.set_button(button, response.is_pointer_button_down_on());

    let pressed = pad.button_pressed(button);
    let fill = if pressed {
        UiColors::PAD_BUTTON_ACTIVE
    } else {
        UiColors::PAD_BUTTON
    };
    let painter = ui.painter();
    painter.circle(center, BUTTON_RADIUS, fill, Stroke::new(1.0, UiColors::BORDER));
    painter.text(
        center,
        Align2::CENTER_CENTER,
        label,
        FontId::monospace(18.0),
        UiColors::TEXT,
    );
}
