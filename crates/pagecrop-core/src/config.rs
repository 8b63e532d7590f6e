// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Editor configuration.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::Result;
use crate::types::{LayoutMode, Rgb, SaveOptions};

/// File name of the persisted configuration inside [`config_dir`].
pub const CONFIG_FILE: &str = "config.json";

/// Persistent editor settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Rasterization scale (PDF points to pixels).
    pub render_zoom: f32,
    /// Overlay layout selected after opening a document.
    pub default_layout: LayoutMode,
    /// Maximum number of undo snapshots kept.
    pub undo_depth: usize,
    /// Whiteout fill color.
    pub fill_color: Rgb,
    /// Save without compressing streams (faster, larger files).
    pub fast_save: bool,
    /// Unused-object collection level applied on save.
    pub garbage_level: u8,
    /// Thumbnail bounding box width in pixels.
    pub thumbnail_width: u32,
    /// Thumbnail bounding box height in pixels.
    pub thumbnail_height: u32,
    /// Directory for non-interactive saves.
    pub save_directory: Option<PathBuf>,
    /// File name for non-interactive saves.
    pub save_filename: Option<String>,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            render_zoom: 1.5,
            default_layout: LayoutMode::OddEvenSplit,
            undo_depth: 10,
            fill_color: Rgb::WHITE,
            fast_save: true,
            garbage_level: 2,
            thumbnail_width: 80,
            thumbnail_height: 120,
            save_directory: None,
            save_filename: None,
        }
    }
}

impl EditorConfig {
    /// Load settings from `path`, falling back to defaults when the file is
    /// missing or unreadable.
    pub fn load(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        let data = match std::fs::read_to_string(path) {
            Ok(data) => data,
            Err(err) => {
                debug!(path = %path.display(), %err, "no config file, using defaults");
                return Self::default();
            }
        };
        match serde_json::from_str(&data) {
            Ok(config) => config,
            Err(err) => {
                warn!(path = %path.display(), %err, "config file is corrupt, using defaults");
                Self::default()
            }
        }
    }

    /// Write settings to `path` as pretty-printed JSON.
    pub fn persist(&self, path: impl AsRef<Path>) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path.as_ref(), json)?;
        Ok(())
    }

    /// Serialization options implied by the save settings.
    pub fn save_options(&self) -> SaveOptions {
        SaveOptions {
            garbage_level: self.garbage_level,
            compress: !self.fast_save,
        }
    }

    /// Destination for a non-interactive save of `input`.
    ///
    /// With both a directory and a file name configured the result is
    /// `dir/name`; with only a directory it is `dir/<input stem>_modified.pdf`.
    /// Without a directory the caller must ask for a path.
    pub fn resolve_save_path(&self, input: Option<&Path>) -> Option<PathBuf> {
        let dir = self.save_directory.as_ref()?;
        if let Some(name) = &self.save_filename {
            return Some(dir.join(name));
        }
        let stem = input
            .and_then(|p| p.file_stem())
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "document".into());
        Some(dir.join(format!("{stem}_modified.pdf")))
    }
}

/// Configuration directory: `$XDG_CONFIG_HOME/pagecrop`, then
/// `$HOME/.config/pagecrop`, then the temp directory.
pub fn config_dir() -> PathBuf {
    let base = if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME") {
        PathBuf::from(xdg)
    } else if let Ok(home) = std::env::var("HOME") {
        PathBuf::from(home).join(".config")
    } else {
        std::env::temp_dir()
    };
    base.join("pagecrop")
}
