//! Application shell: the eframe app that owns the input state and the
//! arbitrator, drains the raw event channel once per frame, paints the
//! scene and the virtual pad, and steps the demo body.
//!
//! The frame loop is the single mutual-exclusion domain for input: every
//! InputState write (arbitrated events) and read (the scene's queries)
//! happens here, in order, within one `update` call.

pub mod pad_overlay;

use eframe::egui::{self, Align2, Color32, FontId, Pos2, Rect, Vec2};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::game::scene::{GROUND_HEIGHT, PIXEL_SIZE, PLAYER_EXTENT, PROJECTILE_EXTENT};
use crate::game::{PhysicsBody, PlatformScene, PointBody};
use crate::input::{InputState, SourceArbitrator, SourceEvent};
use crate::settings::SettingsPortal;

/// Dark palette shared by the scene and the pad overlay.
pub struct UiColors;

impl UiColors {
    /// Scene background
    pub const MAIN_BG: Color32 = Color32::from_rgb(10, 10, 14);
    /// Ground strip
    pub const GROUND: Color32 = Color32::from_rgb(40, 160, 60);
    /// Player sprite
    pub const PLAYER: Color32 = Color32::from_rgb(210, 50, 40);
    /// Projectile sprite
    pub const PROJECTILE: Color32 = Color32::from_rgb(230, 210, 60);
    /// Component borders
    pub const BORDER: Color32 = Color32::from_rgb(60, 60, 60);
    /// Overlay and button labels
    pub const TEXT: Color32 = Color32::from_rgb(230, 230, 230);
    /// Thumbstick base
    pub const PAD_BASE: Color32 = Color32::from_rgba_premultiplied(40, 40, 48, 160);
    /// Thumbstick knob
    pub const PAD_KNOB: Color32 = Color32::from_rgb(90, 90, 110);
    /// Virtual button at rest
    pub const PAD_BUTTON: Color32 = Color32::from_rgba_premultiplied(40, 40, 48, 160);
    /// Virtual button while held
    pub const PAD_BUTTON_ACTIVE: Color32 = Color32::from_rgb(90, 140, 200);
}

pub struct PixelpadApp {
    input: InputState,
    arbitrator: SourceArbitrator,
    event_rx: mpsc::Receiver<SourceEvent>,
    scene: PlatformScene,
    player: PointBody,
    settings: SettingsPortal,
}

impl PixelpadApp {
    pub fn new(
        _cc: &eframe::CreationContext<'_>,
        event_rx: mpsc::Receiver<SourceEvent>,
        mut arbitrator: SourceArbitrator,
        settings: SettingsPortal,
    ) -> Self {
        arbitrator.setup();

        let world = (800.0, 600.0);
        let player = PointBody::new(world.0 / 2.0, world.1 / 2.0, 1.0, PLAYER_EXTENT / 2.0);
        let overlay_enabled = settings.overlay_enabled();

        Self {
            input: InputState::new(),
            arbitrator,
            event_rx,
            scene: PlatformScene::new(world, overlay_enabled),
            player,
            settings,
        }
    }

    fn drain_events(&mut self) {
        while let Ok(ev) = self.event_rx.try_recv() {
            debug!(
                "Arbitrating event at {}: {:?}",
                ev.timestamp.format("%H:%M:%S%.3f"),
                ev.event
            );
            self.arbitrator.handle_event(&ev, &mut self.input);
        }
    }

    fn toggle_overlay(&mut self) {
        let mut snapshot = self.settings.snapshot();
        snapshot.overlay.overlay_enabled = !snapshot.overlay.overlay_enabled;
        self.scene.set_overlay_enabled(snapshot.overlay.overlay_enabled);
        info!(
            "Debug overlay {}",
            if snapshot.overlay.overlay_enabled {
                "enabled"
            } else {
                "disabled"
            }
        );

        if self.settings.replace(snapshot) {
            let portal = self.settings.clone();
            tokio::spawn(async move {
                if let Err(e) = portal.save().await {
                    warn!("Failed to persist settings: {}", e);
                }
            });
        }
    }

    fn draw_scene(&self, ui: &egui::Ui, area: Rect) {
        let painter = ui.painter();
        let to_screen = |x: f32, y: f32| Pos2::new(area.left() + x, area.bottom() - y);

        let ground = Rect::from_min_max(
            to_screen(0.0, GROUND_HEIGHT),
            to_screen(area.width(), 0.0),
        );
        painter.rect_filled(ground, egui::CornerRadius::ZERO, UiColors::GROUND);

        let (px, py) = self.player.position();
        let player_rect = Rect::from_center_size(to_screen(px, py), Vec2::splat(PLAYER_EXTENT));
        painter.rect_filled(player_rect, egui::CornerRadius::ZERO, UiColors::PLAYER);

        for projectile in self.scene.projectiles() {
            let rect = Rect::from_center_size(
                to_screen(projectile.x, projectile.y),
                Vec2::splat(PROJECTILE_EXTENT),
            );
            painter.rect_filled(rect, egui::CornerRadius::ZERO, UiColors::PROJECTILE);
        }

        if self.scene.overlay_enabled() && !self.scene.overlay_text().is_empty() {
            painter.text(
                area.left_top() + Vec2::new(10.0, 10.0),
                Align2::LEFT_TOP,
                self.scene.overlay_text(),
                FontId::monospace(PIXEL_SIZE * 4.0),
                UiColors::TEXT,
            );
        }
    }
}

impl eframe::App for PixelpadApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // Large dt from a dropped frame would make the body tunnel.
        let dt = ctx.input(|i| i.stable_dt).clamp(0.0, 0.05);

        if ctx.input(|i| i.key_pressed(egui::Key::F3)) {
            self.toggle_overlay();
        }

        // A held button would stick across a focus loss; zero everything
        // until the sources speak again.
        if ctx.input(|i| !i.raw.focused) {
            self.input.reset();
        }

        self.drain_events();

        egui::CentralPanel::default()
            .frame(egui::Frame::new().fill(UiColors::MAIN_BG))
            .show(ctx, |ui| {
                let area = ui.max_rect();
                self.scene.set_world_size((area.width(), area.height()));

                self.draw_scene(ui, area);

                if let Some(pad) = self.arbitrator.virtual_pad_mut() {
                    pad_overlay::show(ui, pad);
                }
            });

        self.scene.advance(&mut self.input, &mut self.player, dt);
        self.player.step(dt, GROUND_HEIGHT);

        ctx.request_repaint();
    }

    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        self.arbitrator.disconnect();
    }
}
