pub mod options;
pub mod runtime;
pub mod task;

pub use options::{LaunchOption, LaunchOptions, OptionKind};
pub use runtime::{DefaultRuntimeLoader, JliRuntime, ProcessRuntime, RuntimeHost, RuntimeLoader};
pub use task::{build_activation_options, build_launch_options, LaunchPlan};
