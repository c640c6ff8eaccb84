// ─── JVM User Arguments ───
// Bundled defaults merged with the per-user overrides file.

use std::path::PathBuf;

use tracing::{debug, info, warn};

use crate::core::boot::BootConfig;
use crate::core::config::keys::{SECTION_JVM_USER_OPTIONS, SECTION_JVM_USER_OVERRIDES};
use crate::core::config::{ConfigDocument, IniDocument, OrderedMap};
use crate::core::error::LauncherResult;

use super::prefs::LegacyPreferences;

/// Default user arguments, the persisted overrides and their memoized merge.
#[derive(Debug, Clone)]
pub struct JvmUserArgs {
    defaults: OrderedMap<String>,
    store: IniDocument,
    store_path: PathBuf,
    merged: Option<OrderedMap<String>>,
}

impl JvmUserArgs {
    pub fn new(
        defaults: OrderedMap<String>,
        store: IniDocument,
        store_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            defaults,
            store,
            store_path: store_path.into(),
            merged: None,
        }
    }

    /// Load the override file for `config`, importing legacy preferences
    /// when the file does not exist yet.
    pub fn load(config: &BootConfig, legacy: &dyn LegacyPreferences) -> Self {
        let path = &config.overrides_file;
        let store = match ConfigDocument::load(path) {
            Some(ConfigDocument::Sectioned(doc)) => doc,
            Some(ConfigDocument::Flat(flat)) => {
                debug!("Converting flat override file {:?}", path);
                overrides_document(flat.values().clone())
            }
            None => match legacy.load(&config.app_id) {
                Some(values) => {
                    info!("Imported {} legacy user JVM options", values.len());
                    overrides_document(values)
                }
                None => IniDocument::new(),
            },
        };

        Self::new(config.user_arg_defaults.clone(), store, path.clone())
    }

    pub fn defaults(&self) -> &OrderedMap<String> {
        &self.defaults
    }

    /// Persisted overrides. Old override files only carry `JVMUserOptions`.
    pub fn overrides(&self) -> OrderedMap<String> {
        overrides_of(&self.store)
    }

    /// Defaults with overrides applied, recomputed while the store is dirty.
    pub fn merged(&mut self) -> &OrderedMap<String> {
        if self.store.is_modified() {
            self.merged = None;
        }
        let defaults = &self.defaults;
        let store = &self.store;
        self.merged
            .get_or_insert_with(|| merge(defaults, &overrides_of(store)))
    }

    /// Replace the persisted overrides with `candidate`, minus entries equal
    /// to their default, and write them to disk.
    pub fn set_overrides(&mut self, candidate: &OrderedMap<String>) -> LauncherResult<()> {
        let mut persisted = OrderedMap::new();
        for entry in candidate.iter() {
            if self.defaults.get(&entry.key) == Some(&entry.value) {
                continue;
            }
            persisted.append(entry.key.clone(), entry.value.clone());
        }

        if !self
            .store
            .replace_section(SECTION_JVM_USER_OVERRIDES, persisted.clone())
        {
            warn!("User JVM overrides are read-only, not saving {:?}", self.store_path);
        }
        self.store.save(&self.store_path, true)?;

        debug!(
            "Persisted {} of {} user JVM overrides",
            persisted.len(),
            candidate.len()
        );
        self.merged = Some(merge(&self.defaults, &persisted));
        Ok(())
    }
}

fn overrides_document(values: OrderedMap<String>) -> IniDocument {
    let mut doc = IniDocument::new();
    doc.replace_section(SECTION_JVM_USER_OVERRIDES, values);
    doc
}

fn overrides_of(store: &IniDocument) -> OrderedMap<String> {
    store
        .section(SECTION_JVM_USER_OVERRIDES)
        .or_else(|| store.section(SECTION_JVM_USER_OPTIONS))
        .cloned()
        .unwrap_or_default()
}

/// Defaults keep their order and indices; new keys follow in override order.
fn merge(defaults: &OrderedMap<String>, overrides: &OrderedMap<String>) -> OrderedMap<String> {
    let mut merged = defaults.clone();
    for entry in overrides.iter() {
        if !merged.set_in_place(&entry.key, entry.value.clone()) {
            merged.append(entry.key.clone(), entry.value.clone());
        }
    }
    merged
}

/// Clean up a user argument stored by the preferences encoding.
///
/// A trailing `=` on the key or a leading `=` on the value is dropped.
/// Otherwise key and value are joined into a single bare option.
pub fn normalize_user_arg(key: &str, value: &str) -> (String, String) {
    if key.ends_with('=') && !key.ends_with("\\=") {
        return (key[..key.len() - 1].to_string(), value.to_string());
    }
    if let Some(stripped) = value.strip_prefix('=') {
        return (key.to_string(), stripped.to_string());
    }
    (format!("{key}{value}"), String::new())
}
