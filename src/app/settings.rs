use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::editor::{EditorConfig, NodeTemplate};
use crate::history::DEFAULT_HISTORY_LIMIT;
use crate::model::{NodeKind, Rgba, Workspace};
use crate::viewport::DEFAULT_WHEEL_SENSITIVITY;

#[derive(Debug, Error)]
pub(super) enum SettingsError {
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
    #[error("{path} is neither valid TOML ({toml}) nor JSON ({json})")]
    Parse {
        path: String,
        toml: toml::de::Error,
        json: serde_json::Error,
    },
    #[error(transparent)]
    EncodeToml(#[from] toml::ser::Error),
    #[error(transparent)]
    EncodeJson(#[from] serde_json::Error),
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub(super) struct EditorSettings {
    pub file_path: String,
    pub svg_path: String,
    pub snap_to_grid: bool,
    pub grid_size: f64,
    pub node_width: f64,
    pub node_height: f64,
    pub node_color: String,
    pub node_kind: NodeKind,
    pub wheel_sensitivity: f64,
    pub history_limit: usize,
}

impl Default for EditorSettings {
    fn default() -> Self {
        let node = NodeTemplate::default();
        Self {
            file_path: "workspace.json".to_string(),
            svg_path: "workspace.svg".to_string(),
            snap_to_grid: true,
            grid_size: 20.0,
            node_width: node.width,
            node_height: node.height,
            node_color: node.color.to_hex(),
            node_kind: node.kind,
            wheel_sensitivity: DEFAULT_WHEEL_SENSITIVITY,
            history_limit: DEFAULT_HISTORY_LIMIT,
        }
    }
}

impl EditorSettings {
    pub fn editor_config(&self) -> EditorConfig {
        let fallback = NodeTemplate::default();
        let positive = |v: f64, d: f64| if v.is_finite() && v > 0.0 { v } else { d };
        EditorConfig {
            history_limit: self.history_limit.max(1),
            wheel_sensitivity: positive(self.wheel_sensitivity, DEFAULT_WHEEL_SENSITIVITY),
            node: NodeTemplate {
                width: positive(self.node_width, fallback.width),
                height: positive(self.node_height, fallback.height),
                color: Rgba::from_hex(&self.node_color).unwrap_or(fallback.color),
                kind: self.node_kind,
            },
        }
    }

    pub fn blank_workspace(&self) -> Workspace {
        let mut ws = Workspace::default();
        ws.set_snap_to_grid(self.snap_to_grid);
        if ws.set_grid_size(self.grid_size).is_err() {
            tracing::warn!(grid_size = self.grid_size, "ignoring invalid grid size in settings");
        }
        ws
    }
}

fn is_toml(path: &str) -> bool {
    Path::new(path)
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("toml"))
}

/// Reads TOML or JSON, whichever parses; the extension only picks which is tried first.
pub(super) fn load_settings(path: &str) -> Result<EditorSettings, SettingsError> {
    let s = std::fs::read_to_string(path).map_err(|source| SettingsError::Read {
        path: path.to_string(),
        source,
    })?;
    let toml = toml::from_str::<EditorSettings>(&s);
    let json = serde_json::from_str::<EditorSettings>(&s);
    match (toml, json) {
        (Ok(settings), Err(_)) | (Err(_), Ok(settings)) => Ok(settings),
        (Ok(from_toml), Ok(from_json)) => Ok(if is_toml(path) { from_toml } else { from_json }),
        (Err(toml), Err(json)) => Err(SettingsError::Parse {
            path: path.to_string(),
            toml,
            json,
        }),
    }
}

pub(super) fn save_settings(path: &str, settings: &EditorSettings) -> Result<(), SettingsError> {
    let text = if is_toml(path) {
        toml::to_string_pretty(settings)?
    } else {
        serde_json::to_string_pretty(settings)?
    };
    std::fs::write(path, text).map_err(|source| SettingsError::Write {
        path: path.to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_toml_fills_defaults() {
        let s: EditorSettings = toml::from_str("grid_size = 5.0\nnode_kind = \"stock\"\n").unwrap();
        assert_eq!(s.grid_size, 5.0);
        assert_eq!(s.node_kind, NodeKind::Stock);
        assert_eq!(s.history_limit, DEFAULT_HISTORY_LIMIT);
    }

    #[test]
    fn bad_values_fall_back_in_config() {
        let s = EditorSettings {
            node_color: "not a colour".into(),
            wheel_sensitivity: -1.0,
            node_width: 0.0,
            ..EditorSettings::default()
        };
        let config = s.editor_config();
        assert_eq!(config.node.color, NodeTemplate::default().color);
        assert_eq!(config.wheel_sensitivity, DEFAULT_WHEEL_SENSITIVITY);
        assert_eq!(config.node.width, NodeTemplate::default().width);
    }

    #[test]
    fn blank_workspace_uses_grid_preferences() {
        let s = EditorSettings {
            grid_size: 0.0,
            ..EditorSettings::default()
        };
        let ws = s.blank_workspace();
        assert!(ws.snap_to_grid);
        assert_eq!(ws.grid_size, crate::model::DEFAULT_GRID_SIZE);
    }

    #[test]
    fn round_trips_through_both_formats() {
        let dir = std::env::temp_dir().join(format!("isoframe-settings-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let settings = EditorSettings {
            grid_size: 12.5,
            ..EditorSettings::default()
        };
        for name in ["s.toml", "s.json"] {
            let path = dir.join(name).display().to_string();
            save_settings(&path, &settings).unwrap();
            assert_eq!(load_settings(&path).unwrap(), settings);
        }
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn missing_file_is_a_read_error() {
        let err = load_settings("/definitely/not/here.toml").unwrap_err();
        assert!(matches!(err, SettingsError::Read { .. }));
    }
}
