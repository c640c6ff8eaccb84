// ─── Application Launcher Core ───
// Native bootstrapper that prepares and starts the JVM of a packaged app.
//
// Architecture:
//   core/
//     config/           Ordered maps, flat + sectioned .cfg documents
//     macros            $TOKEN expansion
//     boot/             Paths, CLI flags, config resolution, startup sequence
//     user_args/        Per-user JVM option overrides, legacy prefs import
//     launch/           Option list assembly + runtime hosts
//     appcds            Class data sharing cache lifecycle
//     single_instance/  One running copy per app id

pub mod appcds;
pub mod boot;
pub mod config;
pub mod error;
pub mod launch;
pub mod macros;
pub mod single_instance;
pub mod user_args;
