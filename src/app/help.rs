use eframe::egui;

use crate::tools::Tool;

pub(super) fn draw_help_window(ctx: &egui::Context, open: &mut bool) {
    egui::Window::new("Help & Commands")
        .open(open)
        .resizable(true)
        .default_width(520.0)
        .default_height(460.0)
        .show(ctx, |ui| {
            egui::ScrollArea::vertical().show(ui, |ui| {
                ui.heading("Keyboard Shortcuts");
                ui.separator();

                ui.label("General");
                help_row(ui, "⌘⇧P", "Open command palette");
                help_row(ui, "⌘S", "Save workspace (JSON)");
                help_row(ui, "⌘⇧S", "Export as SVG");
                help_row(ui, "⌘O", "Open workspace");
                help_row(ui, "⌘Z", "Undo");
                help_row(ui, "⌘⇧Z / ⌘Y", "Redo");
                help_row(ui, "Escape", "Cancel gesture, back to Select");
                help_row(ui, "Delete / Backspace", "Delete selected node");
                help_row(ui, "F1", "This window");

                ui.add_space(10.0);
                ui.label("Tools");
                for tool in Tool::ALL {
                    help_row(ui, &tool.shortcut().to_string(), tool.label());
                }

                ui.add_space(10.0);
                ui.label("Canvas");
                help_row(ui, "Scroll wheel", "Zoom, any tool");
                help_row(ui, "Middle drag", "Pan, any tool");
                help_row(ui, "Right drag", "Orbit the camera");
                help_row(ui, "Zoom tool", "Click to zoom in, drag up/down");
                help_row(ui, "Add connector", "Click source, then target");

                ui.add_space(20.0);
                ui.heading("Layers");
                ui.separator();
                ui.label("• Hidden layers are not drawn and cannot be picked");
                ui.label("• Locked layers refuse moves, edits and deletes");
                ui.label("• New nodes and connectors go on the active layer");
                ui.label("• Removing a layer moves its contents to another layer");

                ui.add_space(20.0);
                ui.heading("Settings");
                ui.separator();
                ui.label("Read from ~/.config/isoframe.toml or ./settings.toml:");
                ui.add_space(5.0);
                ui.code(
                    r##"snap_to_grid = true
grid_size = 20.0
node_width = 120.0
node_height = 60.0
node_color = "#60a5fa"
node_kind = "auxiliary"
wheel_sensitivity = 0.001
history_limit = 200"##,
                );
                ui.add_space(5.0);
                ui.label("Set RUST_LOG=debug to trace tool changes and refused edits.");
            });
        });
}

fn help_row(ui: &mut egui::Ui, shortcut: &str, description: &str) {
    ui.horizontal(|ui| {
        ui.add_sized(
            [120.0, 16.0],
            egui::Label::new(egui::RichText::new(shortcut).monospace().strong()),
        );
        ui.label(description);
    });
}
