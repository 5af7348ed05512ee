use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;
use uuid::Uuid;

use crate::graph_utils::graph::{Canvas, Node, NodeId, Rel, RelId};
use super::settings::AppSettings;

// Seed content shown on first launch, before anything has been saved. The
// ids are fixed so the node and relationship blobs agree with each other.
const DEMO_WATER_ID: Uuid = Uuid::from_u128(0x0190_4af0_0000_7000_8000_000000000001);
const DEMO_ICE_ID: Uuid = Uuid::from_u128(0x0190_4af0_0000_7000_8000_000000000002);
const DEMO_REL_ID: Uuid = Uuid::from_u128(0x0190_4af0_0000_7000_8000_000000000003);

fn demo_nodes() -> HashMap<NodeId, Node> {
    HashMap::from([
        (DEMO_WATER_ID, Node { x: 230.0, y: 240.0, label: "water".into(), color: "#3196cc".into() }),
        (DEMO_ICE_ID, Node { x: 420.0, y: 320.0, label: "ice".into(), color: "#9de8f5".into() }),
    ])
}

fn demo_rels() -> HashMap<RelId, Rel> {
    HashMap::from([(DEMO_REL_ID, Rel { from: DEMO_WATER_ID, to: DEMO_ICE_ID })])
}

/// Key-value gateway for one named graph: the viewport, the node map, and the
/// relationship map each live in their own JSON blob under the state
/// directory, overwritten whole on every save. Loads fall back to built-in
/// defaults when a blob is missing or unreadable.
///
/// Save failures are logged and swallowed here so model mutations stay
/// infallible.
#[derive(Debug, Clone)]
pub struct GraphStorage {
    dir: PathBuf,
    name: String,
}

impl GraphStorage {
    /// Open the graph named in the settings, in the settings' state dir.
    pub fn open(settings: &AppSettings) -> Self {
        Self::with_dir(settings.state_dir(), &settings.graph_name)
    }

    pub fn with_dir(dir: impl Into<PathBuf>, name: &str) -> Self {
        GraphStorage { dir: dir.into(), name: name.to_string() }
    }

    fn blob_path(&self, kind: &str) -> PathBuf {
        self.dir.join(format!("{}.{}.json", self.name, kind))
    }

    pub fn load_canvas(&self) -> Canvas {
        self.load_blob("canvas", Canvas::default)
    }

    pub fn load_nodes(&self) -> HashMap<NodeId, Node> {
        self.load_blob("nodes", demo_nodes)
    }

    pub fn load_rels(&self) -> HashMap<RelId, Rel> {
        self.load_blob("rels", demo_rels)
    }

    pub fn save_canvas(&self, canvas: &Canvas) {
        self.save_blob("canvas", canvas);
    }

    pub fn save_nodes(&self, nodes: &HashMap<NodeId, Node>) {
        self.save_blob("nodes", nodes);
    }

    pub fn save_rels(&self, rels: &HashMap<RelId, Rel>) {
        self.save_blob("rels", rels);
    }

    fn load_blob<T: DeserializeOwned>(&self, kind: &str, default: fn() -> T) -> T {
        let path = self.blob_path(kind);
        if !path.exists() {
            return default();
        }
        match read_json(&path) {
            Ok(value) => value,
            Err(e) => {
                log::warn!("unreadable {} blob at {}, using defaults: {e:#}", kind, path.display());
                default()
            }
        }
    }

    fn save_blob<T: Serialize>(&self, kind: &str, value: &T) {
        if let Err(e) = self.try_save_blob(kind, value) {
            log::warn!("failed to save {} blob for graph '{}': {e:#}", kind, self.name);
        }
    }

    fn try_save_blob<T: Serialize>(&self, kind: &str, value: &T) -> anyhow::Result<()> {
        fs::create_dir_all(&self.dir)?;
        let s = serde_json::to_string_pretty(value)?;
        atomic_write(&self.blob_path(kind), s.as_bytes())?;
        Ok(())
    }
}

fn read_json<T: DeserializeOwned>(path: &Path) -> anyhow::Result<T> {
    let mut f = File::open(path)?;
    let mut buf = String::new();
    f.read_to_string(&mut buf)?;
    Ok(serde_json::from_str(&buf)?)
}

fn atomic_write(path: &Path, data: &[u8]) -> std::io::Result<()> {
    let tmp_path = path.with_extension("json.tmp");
    {
        let mut f = File::create(&tmp_path)?;
        f.write_all(data)?;
        f.flush()?;
    }
    fs::rename(tmp_path, path)?;
    Ok(())
}
