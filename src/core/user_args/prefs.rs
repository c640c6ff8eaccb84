// ─── Legacy Preferences ───
// User JVM options stored by older launchers in the Java preferences tree.

use std::path::{Path, PathBuf};

use quick_xml::de::from_str;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::core::config::OrderedMap;
use crate::core::error::LauncherResult;

const PREFS_NODE: &str = "JVMUserOptions";
const PREFS_FILE: &str = "prefs.xml";

/// Source of user JVM options saved before the override file existed.
pub trait LegacyPreferences {
    /// Ordered `(option, value)` pairs for `app_id`, `None` when nothing was stored.
    fn load(&self, app_id: &str) -> Option<OrderedMap<String>>;
}

/// Nothing to import.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoLegacyPreferences;

impl LegacyPreferences for NoLegacyPreferences {
    fn load(&self, _app_id: &str) -> Option<OrderedMap<String>> {
        None
    }
}

/// File-backed Java user preferences (`~/.java/.userPrefs`).
#[derive(Debug, Clone)]
pub struct JavaUserPrefs {
    root: PathBuf,
}

impl JavaUserPrefs {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Default location under the user's home directory, if one is known.
    pub fn from_home() -> Option<Self> {
        dirs::home_dir().map(|home| Self::new(home.join(".java").join(".userPrefs")))
    }

    /// `<root>/<id with '.' as '/'>/JVMUserOptions/prefs.xml`
    pub fn prefs_file(&self, app_id: &str) -> PathBuf {
        let mut path = self.root.clone();
        for part in app_id.split('.').filter(|part| !part.is_empty()) {
            path.push(part);
        }
        path.join(PREFS_NODE).join(PREFS_FILE)
    }
}

impl LegacyPreferences for JavaUserPrefs {
    fn load(&self, app_id: &str) -> Option<OrderedMap<String>> {
        // Windows keeps this node in the registry, which is not read here.
        if cfg!(target_os = "windows") {
            return None;
        }

        let path = self.prefs_file(app_id);
        let text = read_prefs(&path)?;
        match parse_prefs_xml(&text) {
            Ok(values) if values.is_empty() => None,
            Ok(values) => {
                debug!("Imported {} legacy JVM options from {:?}", values.len(), path);
                Some(values)
            }
            Err(e) => {
                warn!("Ignoring unreadable legacy preferences {:?}: {}", path, e);
                None
            }
        }
    }
}

fn read_prefs(path: &Path) -> Option<String> {
    std::fs::read_to_string(path)
        .map_err(|e| debug!("No legacy preferences at {:?}: {}", path, e))
        .ok()
}

#[derive(Debug, Deserialize)]
struct PrefsMap {
    #[serde(rename = "entry", default)]
    entries: Vec<PrefsEntry>,
}

#[derive(Debug, Deserialize)]
struct PrefsEntry {
    #[serde(rename = "@key")]
    key: String,
    #[serde(rename = "@value", default)]
    value: String,
}

/// Parse a preferences `<map><entry key=".." value=".."/></map>` document.
pub fn parse_prefs_xml(xml: &str) -> LauncherResult<OrderedMap<String>> {
    let map: PrefsMap = from_str(xml)?;
    Ok(OrderedMap::from_pairs(
        map.entries.into_iter().map(|entry| (entry.key, entry.value)),
    ))
}
