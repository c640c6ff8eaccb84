pub mod core;

use tracing_subscriber::EnvFilter;

use crate::core::appcds::ChildProcessGenerator;
use crate::core::boot::{report_fatal, BootEnvironment, BootServices, Bootstrapper};
use crate::core::launch::DefaultRuntimeLoader;
use crate::core::single_instance::default_coordinator;
use crate::core::user_args::{JavaUserPrefs, LegacyPreferences, NoLegacyPreferences};

/// Launcher entry point. Returns the process exit code.
pub fn run() -> i32 {
    // Logs go to stderr so the application's stdout stays untouched.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,applauncher_lib=debug")),
        )
        .with_writer(std::io::stderr)
        .try_init();

    let env = match BootEnvironment::detect() {
        Ok(env) => env,
        Err(e) => return report_fatal(&e),
    };
    tracing::info!("Launcher starting: {:?}", env.layout.launcher_path());

    let runtime_loader = DefaultRuntimeLoader;
    let cache_generator = ChildProcessGenerator::new(env.layout.launcher_path());
    let java_prefs = JavaUserPrefs::from_home();
    let legacy_preferences: &dyn LegacyPreferences = match &java_prefs {
        Some(prefs) => prefs,
        None => &NoLegacyPreferences,
    };
    let instance_coordinator = default_coordinator(&env.temp_dir);

    let services = BootServices {
        runtime_loader: &runtime_loader,
        cache_generator: &cache_generator,
        legacy_preferences,
        instance_coordinator: instance_coordinator.as_ref(),
    };

    match Bootstrapper::new(env).run(&services) {
        Ok(code) => code,
        Err(e) => report_fatal(&e),
    }
}
