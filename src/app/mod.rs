use tracing::{info, warn};

use crate::editor::Editor;
use crate::model::Point;

mod actions;
mod command_palette;
mod help;
mod panels;
mod render;
mod settings;
mod svg;
mod update;

#[derive(Clone, Debug, Default)]
struct LayerRename {
    id: String,
    buffer: String,
}

pub struct StudioApp {
    editor: Editor,
    settings: settings::EditorSettings,
    settings_path: String,
    file_path: String,
    svg_path: String,
    status: Option<String>,
    label_buffer: String,
    label_target: Option<String>,
    focus_label: bool,
    grid_size_buffer: String,
    new_layer_name: String,
    layer_rename: Option<LayerRename>,
    pointer_model: Option<Point>,
    command_palette: command_palette::CommandPalette,
    show_help: bool,
}

impl StudioApp {
    fn config_path() -> Option<String> {
        if let Some(home) = std::env::var_os("HOME") {
            let path = std::path::PathBuf::from(home).join(".config").join("isoframe.toml");
            if path.exists() {
                return Some(path.display().to_string());
            }
        }
        if std::path::Path::new("settings.toml").exists() {
            return Some("settings.toml".to_string());
        }
        None
    }

    pub fn new(_cc: &eframe::CreationContext<'_>) -> Self {
        let settings_path = Self::config_path().unwrap_or_else(|| "settings.toml".to_string());
        let settings = settings::load_settings(&settings_path)
            .or_else(|err| {
                if std::path::Path::new("settings.json").exists() {
                    settings::load_settings("settings.json")
                } else {
                    Err(err)
                }
            })
            .unwrap_or_else(|err| {
                if std::path::Path::new(&settings_path).exists() {
                    warn!(%err, "falling back to default settings");
                }
                settings::EditorSettings::default()
            });
        info!(path = %settings_path, "settings resolved");

        let editor = Editor::new(settings.blank_workspace(), settings.editor_config());
        let grid_size_buffer = editor.workspace().grid_size.to_string();

        Self {
            editor,
            file_path: settings.file_path.clone(),
            svg_path: settings.svg_path.clone(),
            settings,
            settings_path,
            status: None,
            label_buffer: String::new(),
            label_target: None,
            focus_label: false,
            grid_size_buffer,
            new_layer_name: String::new(),
            layer_rename: None,
            pointer_model: None,
            command_palette: command_palette::CommandPalette::default(),
            show_help: false,
        }
    }
}
