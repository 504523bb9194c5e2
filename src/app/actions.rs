use std::path::Path;

use thiserror::Error;
use tracing::{info, warn};

use crate::model::Workspace;

use super::{StudioApp, settings, svg};

#[derive(Debug, Error)]
pub(super) enum DocumentError {
    #[error("cannot read {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },
    #[error("cannot write {path}: {source}")]
    Write {
        path: String,
        source: std::io::Error,
    },
    #[error("{path} is not a workspace: {source}")]
    Parse {
        path: String,
        source: serde_json::Error,
    },
    #[error("cannot serialize workspace: {0}")]
    Serialize(#[from] serde_json::Error),
}

pub(super) fn read_workspace(path: &Path) -> Result<Workspace, DocumentError> {
    let json = std::fs::read_to_string(path).map_err(|source| DocumentError::Read {
        path: path.display().to_string(),
        source,
    })?;
    serde_json::from_str(&json).map_err(|source| DocumentError::Parse {
        path: path.display().to_string(),
        source,
    })
}

pub(super) fn write_workspace(path: &Path, ws: &Workspace) -> Result<(), DocumentError> {
    let json = serde_json::to_string_pretty(ws)?;
    write_text(path, &json)
}

fn write_text(path: &Path, text: &str) -> Result<(), DocumentError> {
    std::fs::write(path, text).map_err(|source| DocumentError::Write {
        path: path.display().to_string(),
        source,
    })
}

impl StudioApp {
    pub(super) fn set_status(&mut self, status: impl Into<String>) {
        self.status = Some(status.into());
    }

    pub(super) fn report_rejection(&mut self) {
        if let Some(err) = self.editor.take_rejection() {
            self.set_status(format!("Not applied: {err}"));
        }
    }

    fn after_load(&mut self, ws: Workspace, path: String) {
        self.editor.load(ws);
        self.grid_size_buffer = self.editor.workspace().grid_size.to_string();
        self.label_target = None;
        self.layer_rename = None;
        info!(%path, "workspace loaded");
        self.set_status(format!("Loaded {path}"));
        self.file_path = path;
    }

    pub(super) fn new_workspace(&mut self) {
        self.editor.load(self.settings.blank_workspace());
        self.grid_size_buffer = self.editor.workspace().grid_size.to_string();
        self.label_target = None;
        self.set_status("New workspace");
    }

    pub(super) fn save_to_path(&mut self) {
        let path = self.file_path.clone();
        match write_workspace(Path::new(&path), self.editor.workspace()) {
            Ok(()) => {
                info!(%path, "workspace saved");
                self.set_status(format!("Saved {path}"));
            }
            Err(e) => {
                warn!(error = %e, "save failed");
                self.set_status(format!("Save failed: {e}"));
            }
        }
    }

    pub(super) fn load_from_path(&mut self) {
        let path = self.file_path.clone();
        match read_workspace(Path::new(&path)) {
            Ok(ws) => self.after_load(ws, path),
            Err(e) => {
                warn!(error = %e, "load failed");
                self.set_status(format!("Load failed: {e}"));
            }
        }
    }

    pub(super) fn save_json_dialog(&mut self) {
        let Some(path) = rfd::FileDialog::new()
            .set_file_name("workspace.json")
            .add_filter("JSON", &["json"])
            .save_file()
        else {
            return;
        };
        self.file_path = path.display().to_string();
        self.save_to_path();
        self.persist_settings();
    }

    pub(super) fn open_json_dialog(&mut self) {
        let Some(path) = rfd::FileDialog::new()
            .add_filter("JSON", &["json"])
            .pick_file()
        else {
            return;
        };
        match read_workspace(&path) {
            Ok(ws) => {
                self.after_load(ws, path.display().to_string());
                self.persist_settings();
            }
            Err(e) => {
                warn!(error = %e, "open failed");
                self.set_status(format!("Open failed: {e}"));
            }
        }
    }

    pub(super) fn save_svg_to_path(&mut self) {
        let path = self.svg_path.clone();
        let svg = svg::workspace_to_svg(self.editor.workspace());
        match write_text(Path::new(&path), &svg) {
            Ok(()) => {
                info!(%path, "svg exported");
                self.set_status(format!("Exported {path}"));
            }
            Err(e) => {
                warn!(error = %e, "svg export failed");
                self.set_status(format!("SVG export failed: {e}"));
            }
        }
    }

    pub(super) fn save_svg_dialog(&mut self) {
        let Some(path) = rfd::FileDialog::new()
            .set_file_name("workspace.svg")
            .add_filter("SVG", &["svg"])
            .save_file()
        else {
            return;
        };
        self.svg_path = path.display().to_string();
        self.save_svg_to_path();
        self.persist_settings();
    }

    pub(super) fn toggle_grid(&mut self) {
        let enabled = self.editor.toggle_grid();
        self.set_status(if enabled { "Grid snap on" } else { "Grid snap off" });
        self.persist_settings();
    }

    pub(super) fn apply_grid_size(&mut self) {
        let parsed = self.grid_size_buffer.trim().parse::<f64>();
        match parsed {
            Ok(size) if self.editor.set_grid_size(size).is_ok() => {
                self.persist_settings();
            }
            _ => {
                self.set_status(format!("Invalid grid size: {}", self.grid_size_buffer.trim()));
                self.grid_size_buffer = self.editor.workspace().grid_size.to_string();
            }
        }
    }

    pub(super) fn settings_snapshot(&self) -> settings::EditorSettings {
        let ws = self.editor.workspace();
        let node = &self.editor.config().node;
        settings::EditorSettings {
            file_path: self.file_path.clone(),
            svg_path: self.svg_path.clone(),
            snap_to_grid: ws.snap_to_grid,
            grid_size: ws.grid_size,
            node_width: node.width,
            node_height: node.height,
            node_color: node.color.to_hex(),
            node_kind: node.kind,
            wheel_sensitivity: self.editor.config().wheel_sensitivity,
            history_limit: self.editor.config().history_limit,
        }
    }

    pub(super) fn persist_settings(&mut self) {
        let snapshot = self.settings_snapshot();
        match settings::save_settings(&self.settings_path, &snapshot) {
            Ok(()) => self.settings = snapshot,
            Err(e) => {
                warn!(error = %e, "settings not saved");
                self.set_status(format!("Settings save failed: {e}"));
            }
        }
    }

    pub(super) fn reload_settings(&mut self) {
        match settings::load_settings(&self.settings_path) {
            Ok(settings) => {
                let config = settings.editor_config();
                self.editor.set_node_template(config.node);
                self.editor.set_wheel_sensitivity(config.wheel_sensitivity);
                self.file_path = settings.file_path.clone();
                self.svg_path = settings.svg_path.clone();
                self.settings = settings;
                info!(path = %self.settings_path, "settings reloaded");
                self.set_status("Settings reloaded");
            }
            Err(e) => {
                warn!(error = %e, "settings reload failed");
                self.set_status(format!("Settings reload failed: {e}"));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Connector, DEFAULT_LAYER_ID, Node};

    fn scratch(name: &str) -> std::path::PathBuf {
        let dir = std::env::temp_dir().join(format!("isoframe-doc-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        dir.join(name)
    }

    #[test]
    fn workspace_survives_a_save_and_load() {
        let mut ws = Workspace::default();
        ws.add_node(Node::new("a", DEFAULT_LAYER_ID, 1.0, 2.0)).unwrap();
        ws.add_node(Node::new("b", DEFAULT_LAYER_ID, 3.0, 4.0)).unwrap();
        ws.add_connector(Connector::new("ab", "a", "b", DEFAULT_LAYER_ID))
            .unwrap();
        let path = scratch("roundtrip.json");
        write_workspace(&path, &ws).unwrap();
        assert_eq!(read_workspace(&path).unwrap(), ws);
    }

    #[test]
    fn garbage_is_a_parse_error() {
        let path = scratch("garbage.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(matches!(
            read_workspace(&path),
            Err(DocumentError::Parse { .. })
        ));
        assert!(matches!(
            read_workspace(&scratch("missing.json")),
            Err(DocumentError::Read { .. })
        ));
    }
}
