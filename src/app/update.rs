use eframe::egui;
use tracing::trace;

use crate::editor::Gesture;
use crate::model::Point;
use crate::scene::{SceneInput, build_scene, hit_test};
use crate::tools::{Key, KeyInput, Modifiers, Tool};

use super::StudioApp;
use super::command_palette::{CommandContext, CommandPalette};
use super::help;
use super::render::{draw_background, draw_scene, to_point, transform_for};

fn editor_key(key: egui::Key) -> Option<Key> {
    match key {
        egui::Key::Escape => Some(Key::Escape),
        egui::Key::Delete => Some(Key::Delete),
        egui::Key::Backspace => Some(Key::Backspace),
        other => {
            let mut chars = other.name().chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) if c.is_ascii_alphabetic() => Some(Key::Char(c)),
                _ => None,
            }
        }
    }
}

fn editor_modifiers(m: egui::Modifiers) -> Modifiers {
    Modifiers {
        command: m.command || m.ctrl,
        shift: m.shift,
        alt: m.alt,
    }
}

impl eframe::App for StudioApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let wants_keyboard = ctx.wants_keyboard_input();
        let palette_open = self.command_palette.open;
        let mut keys = Vec::new();
        ctx.input_mut(|i| {
            if !palette_open
                && i.consume_key(egui::Modifiers::COMMAND | egui::Modifiers::SHIFT, egui::Key::P)
            {
                self.command_palette.open("");
            }
            if i.consume_key(egui::Modifiers::COMMAND | egui::Modifiers::SHIFT, egui::Key::S) {
                self.save_svg_dialog();
            }
            if i.consume_key(egui::Modifiers::COMMAND, egui::Key::S) {
                self.save_json_dialog();
            }
            if i.consume_key(egui::Modifiers::COMMAND, egui::Key::O) {
                self.open_json_dialog();
            }
            if i.consume_key(egui::Modifiers::NONE, egui::Key::F1) {
                self.show_help = true;
            }
            for event in &i.events {
                if let egui::Event::Key {
                    key,
                    pressed: true,
                    repeat: false,
                    modifiers,
                    ..
                } = event
                {
                    if let Some(key) = editor_key(*key) {
                        keys.push(KeyInput::new(
                            key,
                            editor_modifiers(*modifiers),
                            wants_keyboard || palette_open,
                        ));
                    }
                }
            }
        });
        for input in &keys {
            if self.editor.handle_key(input) {
                trace!(?input, "key handled");
            }
        }

        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            self.menu_bar(ui);
            self.toolbar(ui);
        });
        egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
            self.status_bar(ui);
        });
        egui::SidePanel::left("layers")
            .default_width(220.0)
            .show(ctx, |ui| {
                self.layer_panel(ui);
            });
        egui::SidePanel::right("properties")
            .default_width(240.0)
            .show(ctx, |ui| {
                egui::ScrollArea::vertical().show(ui, |ui| {
                    self.properties_panel(ui);
                });
            });

        egui::CentralPanel::default()
            .frame(egui::Frame::NONE)
            .show(ctx, |ui| {
                let (rect, response) =
                    ui.allocate_exact_size(ui.available_size(), egui::Sense::click_and_drag());
                self.canvas_input(ctx, rect, &response);

                let transform = transform_for(rect, self.editor.workspace());
                let painter = ui.painter_at(rect);
                draw_background(&painter, rect, &transform, self.editor.workspace());
                let input = SceneInput {
                    selection: self.editor.selection(),
                    pending_from: self.editor.pending_connector_source(),
                    pointer: self.pointer_model,
                    ..SceneInput::new(transform)
                };
                let scene = build_scene(self.editor.workspace(), &input);
                draw_scene(&painter, &scene);

                let cursor = match (self.editor.tool(), self.editor.gesture()) {
                    (_, Gesture::Panning) => egui::CursorIcon::Grabbing,
                    (Tool::Pan, _) => egui::CursorIcon::Grab,
                    (Tool::Zoom, _) => egui::CursorIcon::ZoomIn,
                    (Tool::AddNode | Tool::AddConnector, _) => egui::CursorIcon::Crosshair,
                    (Tool::Select, _) => egui::CursorIcon::Default,
                };
                if response.hovered() {
                    ctx.set_cursor_icon(cursor);
                }
            });

        let cx = CommandContext {
            has_selection: self.editor.selection().is_some(),
            has_undo: self.editor.can_undo(),
            has_redo: self.editor.can_redo(),
            layer_count: self.editor.workspace().layers.len(),
        };
        if let Some(cmd) = self.command_palette.ui(ctx, cx) {
            CommandPalette::execute(self, ctx, cmd);
        }

        help::draw_help_window(ctx, &mut self.show_help);
        self.report_rejection();
    }
}

impl StudioApp {
    fn canvas_input(&mut self, ctx: &egui::Context, rect: egui::Rect, response: &egui::Response) {
        let transform = transform_for(rect, self.editor.workspace());
        let hover = ctx.input(|i| i.pointer.hover_pos()).filter(|p| rect.contains(*p));
        self.pointer_model = hover.map(|p| transform.screen_to_model(to_point(p)));

        if hover.is_some() {
            let scroll = ctx.input(|i| i.raw_scroll_delta.y);
            if scroll != 0.0 {
                // egui reports scrolling up as positive; the editor expects wheel deltas
                // where positive zooms out.
                self.editor.wheel(-scroll as f64);
            }
        }

        if response.dragged_by(egui::PointerButton::Middle) {
            let d = response.drag_delta();
            self.editor.pan_view(d.x as f64, d.y as f64);
        }
        if response.dragged_by(egui::PointerButton::Secondary) {
            let d = response.drag_delta();
            self.editor.rotate_view(d.x as f64, d.y as f64);
        }

        if response.drag_started_by(egui::PointerButton::Primary) {
            if let Some(origin) = ctx.input(|i| i.pointer.press_origin()) {
                let screen = to_point(origin);
                let hit = hit_test(self.editor.workspace(), &transform, screen);
                self.editor
                    .pointer_down(transform.screen_to_model(screen), hit.as_deref());
            }
        }
        if response.dragged_by(egui::PointerButton::Primary) {
            if let Some(pos) = response.interact_pointer_pos() {
                let d = response.drag_delta();
                self.editor.pointer_drag(
                    transform.screen_to_model(to_point(pos)),
                    Point::new(d.x as f64, d.y as f64),
                );
            }
        }
        if response.drag_stopped_by(egui::PointerButton::Primary) {
            self.editor.pointer_up();
        }
        if response.clicked() {
            if let Some(pos) = response.interact_pointer_pos() {
                let screen = to_point(pos);
                let hit = hit_test(self.editor.workspace(), &transform, screen);
                self.editor
                    .click(transform.screen_to_model(screen), hit.as_deref());
            }
        }

        self.editor.flush_frame();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn letters_and_editing_keys_reach_the_editor() {
        assert_eq!(editor_key(egui::Key::V), Some(Key::Char('V')));
        assert_eq!(editor_key(egui::Key::Escape), Some(Key::Escape));
        assert_eq!(editor_key(egui::Key::Backspace), Some(Key::Backspace));
        assert_eq!(editor_key(egui::Key::F1), None);
        assert_eq!(editor_key(egui::Key::Num1), None);
    }

    #[test]
    fn ctrl_counts_as_command() {
        let m = editor_modifiers(egui::Modifiers::CTRL);
        assert!(m.command);
        assert!(!m.shift);
    }
}
