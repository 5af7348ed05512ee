use std::fs;
use std::io::{Read, Write};
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppSettings {
    // If None, use the OS default state directory
    pub state_override: Option<PathBuf>,
    // Namespace of the graph to open; each graph keeps its own set of blobs
    #[serde(default = "AppSettings::default_graph_name")]
    pub graph_name: String,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            state_override: None,
            graph_name: Self::default_graph_name(),
        }
    }
}

impl AppSettings {
    fn config_dir() -> PathBuf {
        // Cross-platform user config dir
        #[cfg(target_os = "macos")]
        {
            // ~/Library/Application Support/Graph-Sketch
            let home = std::env::var_os("HOME").map(PathBuf::from).unwrap_or_else(|| PathBuf::from("~"));
            return home.join("Library").join("Application Support").join("Graph-Sketch");
        }
        #[cfg(target_os = "windows")]
        {
            // %APPDATA%\Graph-Sketch
            if let Ok(appdata) = std::env::var("APPDATA") {
                return PathBuf::from(appdata).join("Graph-Sketch");
            }
            return PathBuf::from("Graph-Sketch");
        }
        #[cfg(all(unix, not(target_os = "macos")))]
        {
            // $XDG_CONFIG_HOME/Graph-Sketch or ~/.config/Graph-Sketch
            if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME") {
                return PathBuf::from(xdg).join("Graph-Sketch");
            }
            let home = std::env::var_os("HOME").map(PathBuf::from).unwrap_or_else(|| PathBuf::from("~"));
            return home.join(".config").join("Graph-Sketch");
        }
    }

    fn state_default_dir() -> PathBuf {
        // Cross-platform user-writable state dir
        #[cfg(target_os = "macos")]
        {
            let home = std::env::var_os("HOME").map(PathBuf::from).unwrap_or_else(|| PathBuf::from("~"));
            return home.join("Library").join("Application Support").join("Graph-Sketch").join("State");
        }
        #[cfg(target_os = "windows")]
        {
            // %LOCALAPPDATA%\Graph-Sketch\State else TEMP
            if let Ok(local) = std::env::var("LOCALAPPDATA") {
                return PathBuf::from(local).join("Graph-Sketch").join("State");
            }
            if let Ok(temp) = std::env::var("TEMP") {
                return PathBuf::from(temp).join("Graph-Sketch");
            }
            return PathBuf::from("Graph-Sketch");
        }
        #[cfg(all(unix, not(target_os = "macos")))]
        {
            // $XDG_STATE_HOME/graph-sketch or ~/.local/state/graph-sketch, else /tmp/Graph-Sketch
            if let Ok(xdg) = std::env::var("XDG_STATE_HOME") {
                return PathBuf::from(xdg).join("graph-sketch");
            }
            if let Ok(home) = std::env::var("HOME") {
                return PathBuf::from(home).join(".local").join("state").join("graph-sketch");
            }
            return PathBuf::from("/tmp").join("Graph-Sketch");
        }
    }

    pub fn load() -> anyhow::Result<Self> {
        let path = Self::config_dir().join("settings.json");
        if path.exists() {
            let mut f = std::fs::File::open(path)?;
            let mut s = String::new();
            f.read_to_string(&mut s)?;
            let v: Self = serde_json::from_str(&s)?;
            return Ok(v);
        }
        // First run: materialize the defaults so there is a file to edit,
        // ignoring errors silently
        let v = Self::default();
        let _ = v.save();
        Ok(v)
    }

    pub fn save(&self) -> anyhow::Result<()> {
        let dir = Self::config_dir();
        fs::create_dir_all(&dir)?;
        let path = dir.join("settings.json");
        let s = serde_json::to_string_pretty(self)?;
        let mut f = std::fs::File::create(path)?;
        f.write_all(s.as_bytes())?;
        Ok(())
    }

    /// Effective state directory honoring the user override.
    pub fn state_dir(&self) -> PathBuf {
        if let Some(p) = &self.state_override { return p.clone(); }
        Self::state_default_dir()
    }

    pub(crate) fn default_graph_name() -> String { "main".to_string() }
}
