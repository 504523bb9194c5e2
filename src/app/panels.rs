use eframe::egui;

use crate::model::{ArrowType, LineStyle, NodeKind, Polarity};
use crate::tools::Tool;

use super::render::{from_color, to_color, tool_button};
use super::{LayerRename, StudioApp};

impl StudioApp {
    pub(super) fn menu_bar(&mut self, ui: &mut egui::Ui) {
        egui::menu::bar(ui, |ui| {
            ui.menu_button("File", |ui| {
                if ui.button("New").clicked() {
                    self.new_workspace();
                    ui.close_menu();
                }
                if ui.button("Open… (⌘O)").clicked() {
                    self.open_json_dialog();
                    ui.close_menu();
                }
                if ui.button("Reload").clicked() {
                    self.load_from_path();
                    ui.close_menu();
                }
                ui.separator();
                if ui.button("Save").clicked() {
                    self.save_to_path();
                    ui.close_menu();
                }
                if ui.button("Save as… (⌘S)").clicked() {
                    self.save_json_dialog();
                    ui.close_menu();
                }
                if ui.button("Export SVG… (⌘⇧S)").clicked() {
                    self.save_svg_dialog();
                    ui.close_menu();
                }
                ui.separator();
                if ui.button("Reload settings").clicked() {
                    self.reload_settings();
                    ui.close_menu();
                }
            });
            ui.menu_button("Edit", |ui| {
                if ui
                    .add_enabled(self.editor.can_undo(), egui::Button::new("Undo (⌘Z)"))
                    .clicked()
                {
                    self.editor.undo();
                    ui.close_menu();
                }
                if ui
                    .add_enabled(self.editor.can_redo(), egui::Button::new("Redo (⌘⇧Z)"))
                    .clicked()
                {
                    self.editor.redo();
                    ui.close_menu();
                }
                ui.separator();
                let has_selection = self.editor.selection().is_some();
                if ui
                    .add_enabled(has_selection, egui::Button::new("Delete node"))
                    .clicked()
                {
                    let _ = self.editor.delete_selected();
                    ui.close_menu();
                }
            });
            ui.menu_button("View", |ui| {
                if ui.button("Zoom in").clicked() {
                    self.editor.zoom_view(crate::viewport::ZOOM_STEP);
                    ui.close_menu();
                }
                if ui.button("Zoom out").clicked() {
                    self.editor.zoom_view(1.0 / crate::viewport::ZOOM_STEP);
                    ui.close_menu();
                }
                if ui.button("Reset view").clicked() {
                    self.editor.reset_view();
                    ui.close_menu();
                }
            });
            ui.menu_button("Help", |ui| {
                if ui.button("Shortcuts (F1)").clicked() {
                    self.show_help = true;
                    ui.close_menu();
                }
                if ui.button("Command palette (⌘⇧P)").clicked() {
                    self.command_palette.open("");
                    ui.close_menu();
                }
            });
        });
    }

    pub(super) fn toolbar(&mut self, ui: &mut egui::Ui) {
        ui.horizontal_wrapped(|ui| {
            let active = self.editor.tool();
            for tool in Tool::ALL {
                if tool_button(ui, tool, active) {
                    self.editor.set_tool(tool);
                }
            }
            ui.separator();

            if ui
                .add_enabled(self.editor.can_undo(), egui::Button::new("Undo"))
                .clicked()
            {
                self.editor.undo();
            }
            if ui
                .add_enabled(self.editor.can_redo(), egui::Button::new("Redo"))
                .clicked()
            {
                self.editor.redo();
            }
            ui.separator();

            let mut snap = self.editor.workspace().snap_to_grid;
            if ui.checkbox(&mut snap, "Snap").changed() {
                self.toggle_grid();
            }
            ui.label("Grid");
            let resp = ui.add(
                egui::TextEdit::singleline(&mut self.grid_size_buffer).desired_width(48.0),
            );
            if resp.lost_focus() {
                self.apply_grid_size();
            }
            ui.separator();

            ui.label(format!("{:.0}%", self.editor.workspace().viewport.zoom * 100.0));
            if ui.button("Reset view").clicked() {
                self.editor.reset_view();
            }
        });
    }

    /// Layers are listed topmost first, the way they stack on the canvas.
    pub(super) fn layer_panel(&mut self, ui: &mut egui::Ui) {
        ui.heading("Layers");
        ui.separator();

        let active = self.editor.active_layer().to_string();
        let mut layers: Vec<_> = self.editor.workspace().layers.clone();
        layers.sort_by_key(|l| std::cmp::Reverse(l.order));
        let count = layers.len();
        let bottom_up: Vec<String> = layers.iter().rev().map(|l| l.id.clone()).collect();

        for layer in &layers {
            ui.horizontal(|ui| {
                let eye = if layer.visible { "👁" } else { "–" };
                if ui
                    .small_button(eye)
                    .on_hover_text("Toggle visibility")
                    .clicked()
                {
                    let _ = self.editor.toggle_layer_visible(&layer.id);
                }
                let lock = if layer.locked { "🔒" } else { "🔓" };
                if ui.small_button(lock).on_hover_text("Toggle lock").clicked() {
                    let _ = self.editor.toggle_layer_locked(&layer.id);
                }
                ui.colored_label(to_color(layer.color), "■");

                let renaming = self
                    .layer_rename
                    .as_ref()
                    .is_some_and(|r| r.id == layer.id);
                if renaming {
                    let mut finished = false;
                    if let Some(rename) = self.layer_rename.as_mut() {
                        let resp = ui.add(
                            egui::TextEdit::singleline(&mut rename.buffer).desired_width(110.0),
                        );
                        resp.request_focus();
                        finished = resp.lost_focus();
                    }
                    if finished {
                        if let Some(rename) = self.layer_rename.take() {
                            if !ui.input(|i| i.key_pressed(egui::Key::Escape)) {
                                let _ = self.editor.rename_layer(&rename.id, &rename.buffer);
                            }
                        }
                    }
                } else {
                    let resp = ui.selectable_label(active == layer.id, layer.name.as_str());
                    if resp.clicked() {
                        self.editor.set_active_layer(&layer.id);
                    }
                    if resp.double_clicked() {
                        self.layer_rename = Some(LayerRename {
                            id: layer.id.clone(),
                            buffer: layer.name.clone(),
                        });
                    }
                }

                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    if ui
                        .add_enabled(count > 1, egui::Button::new("✕").small())
                        .on_hover_text("Remove layer")
                        .clicked()
                    {
                        let _ = self.editor.remove_layer(&layer.id);
                    }
                    if ui.small_button("▼").clicked() {
                        self.swap_layer(&bottom_up, &layer.id, -1);
                    }
                    if ui.small_button("▲").clicked() {
                        self.swap_layer(&bottom_up, &layer.id, 1);
                    }
                });
            });
        }

        ui.separator();
        ui.horizontal(|ui| {
            ui.add(
                egui::TextEdit::singleline(&mut self.new_layer_name)
                    .desired_width(120.0)
                    .hint_text("New layer"),
            );
            if ui.button("Add").clicked() {
                let name = std::mem::take(&mut self.new_layer_name);
                self.editor.add_layer(&name);
            }
        });
    }

    fn swap_layer(&mut self, bottom_up: &[String], id: &str, step: isize) {
        let Some(from) = bottom_up.iter().position(|l| l == id) else {
            return;
        };
        let Some(to) = from.checked_add_signed(step).filter(|to| *to < bottom_up.len()) else {
            return;
        };
        let mut ids = bottom_up.to_vec();
        ids.swap(from, to);
        let _ = self.editor.reorder_layers(&ids);
    }

    pub(super) fn properties_panel(&mut self, ui: &mut egui::Ui) {
        ui.heading("Properties");
        ui.separator();

        let selected = self
            .editor
            .selection()
            .and_then(|id| self.editor.workspace().node(id))
            .cloned();
        match selected {
            Some(node) => {
                if self.label_target.as_deref() != Some(node.id.as_str()) {
                    self.label_target = Some(node.id.clone());
                    self.label_buffer = node.label.clone();
                }
                let locked = self.editor.workspace().is_layer_locked(&node.layer);

                ui.label(format!("Node {}", node.id));
                let layer_name = self
                    .editor
                    .workspace()
                    .layer(&node.layer)
                    .map_or(node.layer.as_str(), |l| l.name.as_str())
                    .to_string();
                ui.label(format!("Layer: {layer_name}{}", if locked { " (locked)" } else { "" }));
                ui.label(format!("Kind: {}", node.kind.label()));
                ui.label(format!("Position: {:.1}, {:.1}", node.x, node.y));
                ui.label(format!("Size: {:.0} × {:.0}", node.width, node.height));
                ui.add_space(6.0);

                ui.label("Label");
                let resp = ui.add_enabled(
                    !locked,
                    egui::TextEdit::singleline(&mut self.label_buffer).desired_width(f32::INFINITY),
                );
                if self.focus_label {
                    resp.request_focus();
                    self.focus_label = false;
                }
                if resp.lost_focus() && self.label_buffer != node.label {
                    let _ = self.editor.relabel_selected(&self.label_buffer);
                }
                ui.add_space(6.0);
                if ui
                    .add_enabled(!locked, egui::Button::new("Delete node"))
                    .clicked()
                {
                    let _ = self.editor.delete_selected();
                }

                let links: Vec<(String, String)> = self
                    .editor
                    .workspace()
                    .connectors
                    .iter()
                    .filter(|c| c.touches(&node.id))
                    .map(|c| (c.id.clone(), format!("{} → {}", c.from, c.to)))
                    .collect();
                if !links.is_empty() {
                    ui.add_space(6.0);
                    ui.label("Connectors");
                    for (id, text) in links {
                        ui.horizontal(|ui| {
                            if ui.small_button("✕").clicked() {
                                let _ = self.editor.delete_connector(&id);
                            }
                            ui.label(text);
                        });
                    }
                }
            }
            None => {
                self.label_target = None;
                self.focus_label = false;
                ui.label("Nothing selected");
            }
        }

        ui.add_space(12.0);
        ui.separator();
        self.node_template_ui(ui);
        ui.add_space(12.0);
        ui.separator();
        self.connector_template_ui(ui);
    }

    fn node_template_ui(&mut self, ui: &mut egui::Ui) {
        ui.label("New nodes");
        let mut template = self.editor.config().node.clone();
        let mut changed = false;
        egui::ComboBox::from_id_salt("node_kind")
            .selected_text(template.kind.label())
            .show_ui(ui, |ui| {
                for kind in NodeKind::ALL {
                    changed |= ui
                        .selectable_value(&mut template.kind, kind, kind.label())
                        .changed();
                }
            });
        ui.horizontal(|ui| {
            ui.label("W");
            changed |= ui
                .add(egui::DragValue::new(&mut template.width).range(10.0..=1000.0))
                .changed();
            ui.label("H");
            changed |= ui
                .add(egui::DragValue::new(&mut template.height).range(10.0..=1000.0))
                .changed();
        });
        ui.horizontal(|ui| {
            ui.label("Colour");
            let mut rgba = to_color(template.color).to_srgba_unmultiplied();
            if ui.color_edit_button_srgba_unmultiplied(&mut rgba).changed() {
                template.color = from_color(egui::Color32::from_rgba_unmultiplied(
                    rgba[0], rgba[1], rgba[2], rgba[3],
                ));
                changed = true;
            }
        });
        if changed {
            self.editor.set_node_template(template);
            self.persist_settings();
        }
    }

    fn connector_template_ui(&mut self, ui: &mut egui::Ui) {
        ui.label("New connectors");
        let template = &mut self.editor.connector_template;
        egui::ComboBox::from_id_salt("connector_style")
            .selected_text(match template.style {
                LineStyle::Solid => "Solid",
                LineStyle::Dashed => "Dashed",
            })
            .show_ui(ui, |ui| {
                ui.selectable_value(&mut template.style, LineStyle::Solid, "Solid");
                ui.selectable_value(&mut template.style, LineStyle::Dashed, "Dashed");
            });
        egui::ComboBox::from_id_salt("connector_polarity")
            .selected_text(match template.polarity {
                Polarity::Reinforcing => "Reinforcing (+)",
                Polarity::Balancing => "Balancing (−)",
            })
            .show_ui(ui, |ui| {
                ui.selectable_value(
                    &mut template.polarity,
                    Polarity::Reinforcing,
                    "Reinforcing (+)",
                );
                ui.selectable_value(&mut template.polarity, Polarity::Balancing, "Balancing (−)");
            });
        egui::ComboBox::from_id_salt("connector_arrow")
            .selected_text(match template.arrow {
                ArrowType::Single => "Single arrow",
                ArrowType::Double => "Double arrow",
            })
            .show_ui(ui, |ui| {
                ui.selectable_value(&mut template.arrow, ArrowType::Single, "Single arrow");
                ui.selectable_value(&mut template.arrow, ArrowType::Double, "Double arrow");
            });
    }

    pub(super) fn status_bar(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            ui.label(format!("Tool: {}", self.editor.tool().label()));
            ui.separator();
            if let Some(from) = self.editor.pending_connector_source() {
                ui.label(format!("Connecting from {from}"));
                ui.separator();
            }
            if let Some(p) = self.pointer_model {
                ui.monospace(format!("{:>8.1} {:>8.1}", p.x, p.y));
                ui.separator();
            }
            let history = self.editor.history();
            ui.label(format!("History {}/{}", history.index() + 1, history.len()));
            if let Some(status) = &self.status {
                ui.separator();
                ui.label(status.as_str());
            }
        });
    }
}
