use eframe::egui;
use fuzzy_matcher::FuzzyMatcher;
use fuzzy_matcher::skim::SkimMatcherV2;

use crate::tools::Tool;

use super::StudioApp;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(super) enum CommandId {
    ToolSelect,
    ToolPan,
    ToolZoom,
    ToolAddNode,
    ToolAddConnector,
    Undo,
    Redo,
    Delete,
    Relabel,
    AddLayer,
    LayerUp,
    LayerDown,
    ToggleLayerVisible,
    ToggleLayerLock,
    RemoveLayer,
    ZoomIn,
    ZoomOut,
    ResetView,
    NewWorkspace,
    SaveJson,
    SaveJsonAs,
    LoadJson,
    OpenJson,
    ExportSvg,
    ToggleSnap,
    ReloadSettings,
    Help,
}

pub(super) struct CommandSpec {
    pub id: CommandId,
    pub name: &'static str,
    pub search: &'static str,
}

const COMMANDS: &[CommandSpec] = &[
    CommandSpec { id: CommandId::ToolSelect, name: "Tool: Select", search: "select tool v" },
    CommandSpec { id: CommandId::ToolPan, name: "Tool: Pan", search: "pan hand move view tool h" },
    CommandSpec { id: CommandId::ToolZoom, name: "Tool: Zoom", search: "zoom magnify tool z" },
    CommandSpec { id: CommandId::ToolAddNode, name: "Tool: Add node", search: "add node variable stock flow tool n" },
    CommandSpec { id: CommandId::ToolAddConnector, name: "Tool: Add connector", search: "add connector link edge arrow tool c" },
    CommandSpec { id: CommandId::Undo, name: "Edit: Undo", search: "undo" },
    CommandSpec { id: CommandId::Redo, name: "Edit: Redo", search: "redo" },
    CommandSpec { id: CommandId::Delete, name: "Edit: Delete node", search: "delete remove node" },
    CommandSpec { id: CommandId::Relabel, name: "Edit: Rename node", search: "rename relabel label node" },
    CommandSpec { id: CommandId::AddLayer, name: "Layer: Add", search: "layer add new" },
    CommandSpec { id: CommandId::LayerUp, name: "Layer: Move up", search: "layer up move order" },
    CommandSpec { id: CommandId::LayerDown, name: "Layer: Move down", search: "layer down move order" },
    CommandSpec { id: CommandId::ToggleLayerVisible, name: "Layer: Toggle visibility", search: "layer visible hide show toggle" },
    CommandSpec { id: CommandId::ToggleLayerLock, name: "Layer: Toggle lock", search: "layer lock unlock toggle" },
    CommandSpec { id: CommandId::RemoveLayer, name: "Layer: Remove", search: "layer remove delete" },
    CommandSpec { id: CommandId::ZoomIn, name: "View: Zoom in", search: "zoom in view" },
    CommandSpec { id: CommandId::ZoomOut, name: "View: Zoom out", search: "zoom out view" },
    CommandSpec { id: CommandId::ResetView, name: "View: Reset", search: "reset view camera zoom pan rotation" },
    CommandSpec { id: CommandId::NewWorkspace, name: "File: New", search: "new file workspace blank" },
    CommandSpec { id: CommandId::SaveJson, name: "File: Save", search: "save file json" },
    CommandSpec { id: CommandId::SaveJsonAs, name: "File: Save as...", search: "save as file json dialog" },
    CommandSpec { id: CommandId::LoadJson, name: "File: Reload", search: "load reload file json" },
    CommandSpec { id: CommandId::OpenJson, name: "File: Open...", search: "open file json dialog" },
    CommandSpec { id: CommandId::ExportSvg, name: "File: Export SVG", search: "export svg save" },
    CommandSpec { id: CommandId::ToggleSnap, name: "Grid: Toggle snap", search: "grid snap toggle" },
    CommandSpec { id: CommandId::ReloadSettings, name: "Settings: Reload", search: "settings reload config" },
    CommandSpec { id: CommandId::Help, name: "Help: Shortcuts", search: "help shortcuts keys" },
];

#[derive(Default)]
pub(super) struct CommandPalette {
    pub open: bool,
    pub query: String,
    pub selected: usize,
    request_focus: bool,
}

#[derive(Clone, Copy)]
pub(super) struct CommandContext {
    pub has_selection: bool,
    pub has_undo: bool,
    pub has_redo: bool,
    pub layer_count: usize,
}

impl CommandPalette {
    pub fn open(&mut self, query: impl Into<String>) {
        self.open = true;
        self.query = query.into();
        self.selected = 0;
        self.request_focus = true;
    }

    pub fn close(&mut self) {
        self.open = false;
        self.query.clear();
        self.selected = 0;
        self.request_focus = false;
    }

    fn is_enabled(cx: CommandContext, id: CommandId) -> bool {
        match id {
            CommandId::Undo => cx.has_undo,
            CommandId::Redo => cx.has_redo,
            CommandId::Delete | CommandId::Relabel => cx.has_selection,
            CommandId::RemoveLayer | CommandId::LayerUp | CommandId::LayerDown => cx.layer_count > 1,
            _ => true,
        }
    }

    pub(super) fn execute(app: &mut StudioApp, ctx: &egui::Context, id: CommandId) {
        let layer = app.editor.active_layer().to_string();
        match id {
            CommandId::ToolSelect
            | CommandId::ToolPan
            | CommandId::ToolZoom
            | CommandId::ToolAddNode
            | CommandId::ToolAddConnector => {
                if let Some(tool) = Self::tool(id) {
                    app.editor.set_tool(tool);
                }
            }
            CommandId::Undo => {
                app.editor.undo();
            }
            CommandId::Redo => {
                app.editor.redo();
            }
            CommandId::Delete => {
                let _ = app.editor.delete_selected();
            }
            CommandId::Relabel => app.focus_label = true,
            CommandId::AddLayer => {
                let name = std::mem::take(&mut app.new_layer_name);
                app.editor.add_layer(&name);
            }
            CommandId::LayerUp => {
                let _ = app.editor.move_layer(&layer, 1);
            }
            CommandId::LayerDown => {
                let _ = app.editor.move_layer(&layer, -1);
            }
            CommandId::ToggleLayerVisible => {
                let _ = app.editor.toggle_layer_visible(&layer);
            }
            CommandId::ToggleLayerLock => {
                let _ = app.editor.toggle_layer_locked(&layer);
            }
            CommandId::RemoveLayer => {
                let _ = app.editor.remove_layer(&layer);
            }
            CommandId::ZoomIn => app.editor.zoom_view(crate::viewport::ZOOM_STEP),
            CommandId::ZoomOut => app.editor.zoom_view(1.0 / crate::viewport::ZOOM_STEP),
            CommandId::ResetView => app.editor.reset_view(),
            CommandId::NewWorkspace => app.new_workspace(),
            CommandId::SaveJson => app.save_to_path(),
            CommandId::SaveJsonAs => app.save_json_dialog(),
            CommandId::LoadJson => app.load_from_path(),
            CommandId::OpenJson => app.open_json_dialog(),
            CommandId::ExportSvg => app.save_svg_to_path(),
            CommandId::ToggleSnap => app.toggle_grid(),
            CommandId::ReloadSettings => app.reload_settings(),
            CommandId::Help => app.show_help = true,
        }
        app.report_rejection();
        ctx.request_repaint();
    }

    fn tool(id: CommandId) -> Option<Tool> {
        match id {
            CommandId::ToolSelect => Some(Tool::Select),
            CommandId::ToolPan => Some(Tool::Pan),
            CommandId::ToolZoom => Some(Tool::Zoom),
            CommandId::ToolAddNode => Some(Tool::AddNode),
            CommandId::ToolAddConnector => Some(Tool::AddConnector),
            _ => None,
        }
    }

    fn shortcut(id: CommandId) -> Option<String> {
        if let Some(tool) = Self::tool(id) {
            return Some(tool.shortcut().to_string());
        }
        let chord = match id {
            CommandId::Undo => "⌘Z",
            CommandId::Redo => "⌘⇧Z",
            CommandId::Delete => "Del",
            CommandId::SaveJsonAs => "⌘S",
            CommandId::OpenJson => "⌘O",
            CommandId::Help => "F1",
            _ => return None,
        };
        Some(chord.to_string())
    }

    fn filtered(&self) -> Vec<&'static CommandSpec> {
        let q = self.query.trim();
        if q.is_empty() {
            return COMMANDS.iter().collect();
        }
        let matcher = SkimMatcherV2::default();
        let mut scored: Vec<(&'static CommandSpec, i64)> = COMMANDS
            .iter()
            .filter_map(|c| matcher.fuzzy_match(c.search, q).map(|score| (c, score)))
            .collect();
        scored.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.name.cmp(b.0.name)));
        scored.into_iter().map(|(c, _)| c).collect()
    }

    pub fn ui(&mut self, ctx: &egui::Context, cx: CommandContext) -> Option<CommandId> {
        if !self.open {
            return None;
        }
        let matches = self.filtered();
        self.selected = self.selected.min(matches.len().saturating_sub(1));

        let (escape, down, up, mut run_selected) = ctx.input(|i| {
            (
                i.key_pressed(egui::Key::Escape),
                i.key_pressed(egui::Key::ArrowDown),
                i.key_pressed(egui::Key::ArrowUp),
                i.key_pressed(egui::Key::Enter),
            )
        });
        if escape {
            self.close();
            return None;
        }
        if down {
            self.selected = (self.selected + 1).min(matches.len().saturating_sub(1));
        }
        if up {
            self.selected = self.selected.saturating_sub(1);
        }

        let screen = ctx.content_rect();
        let size = egui::vec2(520.0, 340.0);
        let pos = egui::pos2(screen.center().x - size.x * 0.5, screen.top() + 56.0);
        egui::Area::new(egui::Id::new("command_palette"))
            .fixed_pos(pos)
            .order(egui::Order::Foreground)
            .show(ctx, |ui| {
                egui::Frame::popup(ui.style())
                    .inner_margin(10.0)
                    .show(ui, |ui| {
                        ui.set_min_size(size);
                        let resp = ui.add(
                            egui::TextEdit::singleline(&mut self.query)
                                .desired_width(f32::INFINITY)
                                .hint_text("Type a command"),
                        );
                        if self.request_focus {
                            resp.request_focus();
                            self.request_focus = false;
                        }
                        ui.separator();
                        if matches.is_empty() {
                            ui.weak("No matching command");
                        }
                        egui::ScrollArea::vertical()
                            .max_height(size.y - 60.0)
                            .show(ui, |ui| {
                                for (idx, spec) in matches.iter().enumerate() {
                                    let enabled = Self::is_enabled(cx, spec.id);
                                    ui.horizontal(|ui| {
                                        let button = egui::Button::new(spec.name)
                                            .selected(idx == self.selected);
                                        if ui.add_enabled(enabled, button).clicked() {
                                            self.selected = idx;
                                            run_selected = true;
                                        }
                                        if let Some(keys) = Self::shortcut(spec.id) {
                                            ui.weak(keys);
                                        }
                                    });
                                }
                            });
                    });
            });

        if !run_selected {
            return None;
        }
        let spec = matches.get(self.selected)?;
        if !Self::is_enabled(cx, spec.id) {
            return None;
        }
        let id = spec.id;
        self.close();
        Some(id)
    }
}
