// ─── Boot Config Resolver ───
// Turns the canonical sectioned document plus the host environment into an
// immutable BootConfig.

use std::path::{Path, PathBuf};

use tracing::{debug, info, instrument, warn};

use crate::core::config::keys;
use crate::core::config::{IniDocument, OrderedMap};
use crate::core::error::{LauncherError, LauncherResult};
use crate::core::macros::{MacroTable, MacroToken};

use super::cli::LauncherFlags;
use super::config::{BootConfig, MemoryPolicy, RuntimeSelection};
use super::environment::BootEnvironment;
use super::paths::{
    app_data_dir, cache_dir, classpath_separator, locate_runtime_library, normalize_path_list,
    overrides_file, safe_path_str,
};

/// Activation entry point used to notify a running instance.
pub const DEFAULT_ACTIVATION_CLASS: &str =
    "jdk.packager.services.singleton.SingleInstanceNewActivation";

const APPCDS_CACHE_EXTENSION: &str = "jsa";

#[instrument(skip(doc, env, flags), fields(config = %config_file.display()))]
pub fn resolve(
    doc: &IniDocument,
    env: &BootEnvironment,
    flags: &LauncherFlags,
    config_file: &Path,
) -> LauncherResult<BootConfig> {
    let app_value = |key: &str| -> String {
        doc.get_value(keys::SECTION_APPLICATION, key)
            .map(|value| value.trim().to_string())
            .unwrap_or_default()
    };
    let optional = |key: &str| -> Option<String> {
        Some(app_value(key)).filter(|v| !v.is_empty())
    };

    let main_class = app_value(keys::MAIN_CLASS);
    let main_module = app_value(keys::MAIN_MODULE);
    if main_class.is_empty() && main_module.is_empty() {
        return Err(LauncherError::MissingEntryPoint(config_file.to_path_buf()));
    }

    let layout = &env.layout;
    let app_name = optional(keys::APP_NAME).unwrap_or_else(|| layout.launcher_name());
    let app_id = optional(keys::APP_ID)
        .or_else(|| Some(main_class.clone()).filter(|v| !v.is_empty()))
        .unwrap_or_else(|| app_name.clone());

    let app_data = app_data_dir(&env.user_data_dir, &app_id);
    let main_jar = app_value(keys::MAIN_JAR);
    let classpath = build_classpath(&main_jar, &app_value(keys::CLASSPATH));

    let memory = if app_value(keys::MEMORY) == keys::MEMORY_AUTO {
        MemoryPolicy::Auto {
            size_mb: env.physical_memory_mb,
        }
    } else {
        MemoryPolicy::Manual { size_mb: 0 }
    };

    let runtime = select_runtime(env, optional(keys::RUNTIME).as_deref());

    let appcds_jvm_args = doc.section_or_empty(keys::SECTION_APPCDS_JVM_OPTIONS);
    let appcds_generate_jvm_args = doc.section_or_empty(keys::SECTION_APPCDS_GENERATE_JVM_OPTIONS);
    let appcds_cache = optional(keys::APPCDS_CACHE).or_else(|| {
        let ships_appcds = doc.has_section(keys::SECTION_APPCDS_JVM_OPTIONS)
            || doc.has_section(keys::SECTION_APPCDS_GENERATE_JVM_OPTIONS);
        ships_appcds.then(|| {
            format!(
                "{}/{}.{}",
                MacroToken::CacheDir,
                app_name,
                APPCDS_CACHE_EXTENSION
            )
        })
    });

    let args = if flags.forwarded.is_empty() {
        configured_args(&doc.section_or_empty(keys::SECTION_ARG_OPTIONS))
    } else {
        flags.forwarded.clone()
    };

    let config = BootConfig {
        config_file: config_file.to_path_buf(),
        launcher_path: layout.launcher_path().to_path_buf(),
        package_dir: layout.package_dir().to_path_buf(),
        app_dir: layout.app_dir().to_path_buf(),
        launcher_dir: layout.launcher_dir().to_path_buf(),
        cache_dir: cache_dir(&app_data),
        overrides_file: overrides_file(&app_data),
        app_data_dir: app_data,
        app_name,
        app_id,
        version: app_value(keys::APP_VERSION),
        main_jar,
        main_class,
        main_module,
        classpath,
        module_path: normalize_path_list(&app_value(keys::MODULE_PATH)),
        jvm_args: doc.section_or_empty(keys::SECTION_JVM_OPTIONS),
        user_arg_defaults: doc.section_or_empty(keys::SECTION_JVM_USER_OPTIONS),
        appcds_jvm_args,
        appcds_generate_jvm_args,
        appcds_mode: optional(keys::APPCDS),
        appcds_cache,
        memory,
        runtime,
        splash: optional(keys::SPLASH),
        single_instance: app_value(keys::APPLICATION_INSTANCE)
            .eq_ignore_ascii_case(keys::INSTANCE_SINGLE),
        activation_class: optional(keys::SINGLE_INSTANCE_ACTIVATION)
            .unwrap_or_else(|| DEFAULT_ACTIVATION_CLASS.to_string()),
        debug_port: optional(keys::DEBUG),
        args,
    };

    info!(
        app_id = %config.app_id,
        bundled_runtime = config.runtime.bundled,
        "Resolved boot config for {}",
        config.app_name
    );
    debug!("Boot config: {:?}", config);
    Ok(config)
}

/// Main jar first unless the configured classpath already lists it.
fn build_classpath(main_jar: &str, configured: &str) -> String {
    let configured = normalize_path_list(configured);
    if configured.is_empty() {
        return main_jar.to_string();
    }
    if main_jar.is_empty() {
        return configured;
    }

    let jar_name = Path::new(main_jar)
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| main_jar.to_string());

    if configured.contains(&jar_name) {
        configured
    } else {
        format!("{}{}{}", main_jar, classpath_separator(), configured)
    }
}

/// Bundled runtime, then `app.runtime`, then `JAVA_HOME`.
fn select_runtime(env: &BootEnvironment, configured: Option<&str>) -> RuntimeSelection {
    let layout = &env.layout;

    let (bundled, home) = if layout.runtime_dir().is_dir() {
        (true, Some(layout.runtime_dir().to_path_buf()))
    } else if let Some(raw) = configured {
        let mut macros = MacroTable::new();
        macros.register(MacroToken::PackageDir, safe_path_str(layout.package_dir()));
        macros.register(MacroToken::AppDir, safe_path_str(layout.app_dir()));
        macros.register(MacroToken::LauncherDir, safe_path_str(layout.launcher_dir()));
        (false, Some(PathBuf::from(macros.expand(raw))))
    } else {
        (false, env.java_home.clone())
    };

    let library = home.as_deref().and_then(locate_runtime_library);
    match (&home, &library) {
        (None, _) => warn!("No bundled runtime, app.runtime or JAVA_HOME available"),
        (Some(home), None) => warn!("No launcher library found under runtime {:?}", home),
        _ => {}
    }

    RuntimeSelection {
        bundled,
        home,
        library,
    }
}

/// `ArgOptions` lines back as command-line arguments.
fn configured_args(section: &OrderedMap<String>) -> Vec<String> {
    section
        .iter()
        .map(|entry| {
            if entry.value.is_empty() {
                entry.key.clone()
            } else {
                format!("{}={}", entry.key, entry.value)
            }
        })
        .collect()
}
