// ─── Launch Task ───
// Assembles the JVM option list for a normal launch or for notifying a
// running instance, and describes the final hand-off to the runtime.

use std::path::PathBuf;

use tracing::debug;

use crate::core::appcds::AppCdsState;
use crate::core::boot::config::{BootConfig, RuntimeSelection};
use crate::core::boot::paths::{classpath_separator, fix_path_separators};
use crate::core::config::OrderedMap;
use crate::core::macros::MacroToken;

use super::options::{LaunchOption, LaunchOptions};

const LIBRARY_PATH_OPTION: &str = "-Djava.library.path";
const CLASS_PATH_OPTION: &str = "-Djava.class.path";
const MODULE_PATH_OPTION: &str = "--module-path";
const APP_ID_OPTION: &str = "-Dapp.preferences.id";
const INSTANCE_PID_OPTION: &str = "-Dapp.singleinstance.pid";
const SPLASH_OPTION: &str = "-splash:";
const MAX_HEAP_OPTION: &str = "-Xmx";
const MIN_HEAP_OPTION: &str = "-Xms";
const DEBUG_AGENT_OPTION: &str = "-agentlib:jdwp=";
const MODULE_OPTION: &str = "-m";

/// Everything needed once control passes to the runtime.
#[derive(Debug, Clone)]
pub struct LaunchPlan {
    /// Name reported to the runtime as the launching program.
    pub program: String,
    /// Rendered options, main class and application arguments.
    pub options: Vec<String>,
    pub working_dir: PathBuf,
    pub runtime: RuntimeSelection,
}

impl LaunchPlan {
    /// Copy/paste friendly command line for logs.
    pub fn command_line(&self) -> String {
        let program = shell_escape(&self.program);
        let args = self
            .options
            .iter()
            .map(|arg| shell_escape(arg))
            .collect::<Vec<_>>()
            .join(" ");

        if args.is_empty() {
            program
        } else {
            format!("{} {}", program, args)
        }
    }
}

/// Standard launch: paths, identity, JVM options, AppCDS, user options,
/// splash, heap, debug agent, classpath, entry point, application args.
pub fn build_launch_options(
    config: &BootConfig,
    user_args: &OrderedMap<String>,
    appcds: AppCdsState,
    debug: bool,
) -> LaunchOptions {
    let mut options = LaunchOptions::new();

    options.append_path(
        LIBRARY_PATH_OPTION,
        format!(
            "{}{}{}",
            MacroToken::AppDir,
            classpath_separator(),
            MacroToken::LauncherDir
        ),
    );
    if !config.module_path.is_empty() {
        options.append_path(MODULE_PATH_OPTION, config.module_path.clone());
    }
    options.append(APP_ID_OPTION, config.app_id.clone());

    options.append_all(&config.jvm_args);
    match appcds {
        AppCdsState::Enabled | AppCdsState::Auto => options.append_all(&config.appcds_jvm_args),
        AppCdsState::GenerateCache => options.append_all(&config.appcds_generate_jvm_args),
        AppCdsState::Disabled | AppCdsState::Uninitialized => {}
    }
    options.append_user_args(user_args);

    if let Some(splash) = &config.splash {
        options.append_joined(SPLASH_OPTION, fix_path_separators(splash));
    }

    if let Some((max_mb, min_mb)) = config.memory.heap_sizes() {
        // A bare `-Xmx` in the config marks where the heap size goes.
        let max_heap = LaunchOption::joined(MAX_HEAP_OPTION, format!("{}m", max_mb));
        if !options.replace_by_name(max_heap.clone()) {
            options.push(max_heap);
        }
        options.append_joined(MIN_HEAP_OPTION, format!("{}m", min_mb));
    }

    if debug {
        if let Some(port) = &config.debug_port {
            options.append_joined(
                DEBUG_AGENT_OPTION,
                format!("transport=dt_socket,server=y,suspend=y,address={}", port),
            );
        }
    }

    if !config.classpath.is_empty() {
        options.append_path(CLASS_PATH_OPTION, config.classpath.clone());
    }
    append_entry_point(&mut options, config);

    for arg in &config.args {
        options.append_bare(arg.clone());
    }

    debug!("Built {} launch options", options.len());
    options
}

/// Secondary invocation that hands this process's arguments to the
/// instance running as `pid`.
pub fn build_activation_options(config: &BootConfig, pid: u32) -> LaunchOptions {
    let mut options = LaunchOptions::new();
    if !config.classpath.is_empty() {
        options.append_path(CLASS_PATH_OPTION, config.classpath.clone());
    }
    options.append(APP_ID_OPTION, config.app_id.clone());
    options.append(INSTANCE_PID_OPTION, pid.to_string());
    options.append_bare(config.activation_class.clone());
    for arg in &config.args {
        options.append_bare(arg.clone());
    }
    options
}

fn append_entry_point(options: &mut LaunchOptions, config: &BootConfig) {
    if config.has_main_module() {
        let module = if config.main_module.contains('/') || config.main_class.is_empty() {
            config.main_module.clone()
        } else {
            format!("{}/{}", config.main_module, config.main_class)
        };
        options.append_bare(MODULE_OPTION);
        options.append_bare(module);
    } else {
        options.append_bare(config.main_class.clone());
    }
}

fn shell_escape(raw: &str) -> String {
    if raw.is_empty() {
        return "\"\"".to_string();
    }

    if raw.chars().all(|ch| {
        ch.is_ascii_alphanumeric() || matches!(ch, '-' | '_' | '.' | '/' | ':' | '\\' | '=' | ',')
    }) {
        return raw.to_string();
    }

    format!("\"{}\"", raw.replace('"', "\\\""))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::boot::config::MemoryPolicy;
    use crate::core::macros::MacroTable;

    fn config() -> BootConfig {
        BootConfig {
            config_file: PathBuf::from("/opt/demo/app/Demo.cfg"),
            launcher_path: PathBuf::from("/opt/demo/Demo"),
            package_dir: PathBuf::from("/opt/demo"),
            app_dir: PathBuf::from("/opt/demo/app"),
            launcher_dir: PathBuf::from("/opt/demo"),
            app_data_dir: PathBuf::from("/home/u/.local/demo"),
            cache_dir: PathBuf::from("/home/u/.local/demo/cache"),
            overrides_file: PathBuf::from("/home/u/.local/demo/packager/jvmuserargs.cfg"),
            app_name: "Demo".into(),
            app_id: "demo".into(),
            version: "1.0".into(),
            main_jar: "demo.jar".into(),
            main_class: "demo.Main".into(),
            main_module: String::new(),
            classpath: "demo.jar".into(),
            module_path: String::new(),
            jvm_args: OrderedMap::from_pairs([("-Xss", "1m".to_string())]),
            user_arg_defaults: OrderedMap::new(),
            appcds_jvm_args: OrderedMap::from_pairs([("-Xshare:auto", String::new())]),
            appcds_generate_jvm_args: OrderedMap::from_pairs([("-Xshare:dump", String::new())]),
            appcds_mode: None,
            appcds_cache: None,
            memory: MemoryPolicy::Manual { size_mb: 0 },
            runtime: RuntimeSelection {
                bundled: false,
                home: None,
                library: None,
            },
            splash: None,
            single_instance: false,
            activation_class: "demo.Activate".into(),
            debug_port: Some("5005".into()),
            args: vec!["--open".into(), "file.txt".into()],
        }
    }

    fn position(rendered: &[String], prefix: &str) -> usize {
        rendered
            .iter()
            .position(|option| option.starts_with(prefix))
            .unwrap_or_else(|| panic!("{} missing from {:?}", prefix, rendered))
    }

    #[test]
    fn auto_memory_injects_heap_flags() {
        let mut config = config();
        config.memory = MemoryPolicy::Auto { size_mb: 8192 };
        let rendered =
            build_launch_options(&config, &OrderedMap::new(), AppCdsState::Disabled, false)
                .render(&MacroTable::new());
        assert!(rendered.contains(&"-Xmx8192m".to_string()));
        assert!(rendered.contains(&"-Xms256m".to_string()));

        config.memory = MemoryPolicy::Auto { size_mb: 128 };
        let rendered =
            build_launch_options(&config, &OrderedMap::new(), AppCdsState::Disabled, false)
                .render(&MacroTable::new());
        assert!(rendered.contains(&"-Xmx128m".to_string()));
        assert!(rendered.contains(&"-Xms128m".to_string()));

        config.memory = MemoryPolicy::Manual { size_mb: 0 };
        let rendered =
            build_launch_options(&config, &OrderedMap::new(), AppCdsState::Disabled, false)
                .render(&MacroTable::new());
        assert!(!rendered.iter().any(|o| o.starts_with("-Xmx") || o.starts_with("-Xms")));
    }

    #[test]
    fn heap_placeholder_is_filled_in_place() {
        let mut config = config();
        config.memory = MemoryPolicy::Auto { size_mb: 4096 };
        config.jvm_args = OrderedMap::from_pairs([
            ("-Xmx", String::new()),
            ("-Xss", "1m".to_string()),
        ]);

        let rendered =
            build_launch_options(&config, &OrderedMap::new(), AppCdsState::Disabled, false)
                .render(&MacroTable::new());
        assert_eq!(rendered.iter().filter(|o| o.starts_with("-Xmx")).count(), 1);
        assert!(position(&rendered, "-Xmx4096m") < position(&rendered, "-Xss=1m"));
    }

    #[test]
    fn standard_order() {
        let mut config = config();
        config.splash = Some("$APPDIR/splash.png".into());
        let user_args = OrderedMap::from_pairs([("-Dtheme=", "dark".to_string())]);

        let mut macros = MacroTable::new();
        macros.register(MacroToken::AppDir, "/opt/demo/app");
        macros.register(MacroToken::LauncherDir, "/opt/demo");
        let rendered =
            build_launch_options(&config, &user_args, AppCdsState::Auto, true).render(&macros);

        let order = [
            LIBRARY_PATH_OPTION,
            APP_ID_OPTION,
            "-Xss=1m",
            "-Xshare:auto",
            "-Dtheme=dark",
            SPLASH_OPTION,
            DEBUG_AGENT_OPTION,
            CLASS_PATH_OPTION,
            "demo.Main",
            "--open",
            "file.txt",
        ];
        let positions: Vec<_> = order.iter().map(|p| position(&rendered, p)).collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]), "{:?}", rendered);
        assert!(!rendered.iter().any(|o| o == "-Xshare:dump"));
        assert!(rendered
            .iter()
            .any(|o| o.ends_with("suspend=y,address=5005")));
    }

    #[test]
    fn appcds_options_follow_effective_state() {
        let config = config();
        let rendered =
            build_launch_options(&config, &OrderedMap::new(), AppCdsState::GenerateCache, false)
                .render(&MacroTable::new());
        assert!(rendered.contains(&"-Xshare:dump".to_string()));
        assert!(!rendered.contains(&"-Xshare:auto".to_string()));

        let rendered =
            build_launch_options(&config, &OrderedMap::new(), AppCdsState::Disabled, false)
                .render(&MacroTable::new());
        assert!(!rendered.iter().any(|o| o.starts_with("-Xshare")));
        assert!(!rendered.iter().any(|o| o.starts_with(DEBUG_AGENT_OPTION)));
    }

    #[test]
    fn main_module_uses_module_flag() {
        let mut config = config();
        config.main_module = "demo.app".into();
        let rendered =
            build_launch_options(&config, &OrderedMap::new(), AppCdsState::Disabled, false)
                .render(&MacroTable::new());

        let m = position(&rendered, "-m");
        assert_eq!(rendered[m + 1], "demo.app/demo.Main");
        assert!(!rendered.contains(&"demo.Main".to_string()));
    }

    #[test]
    fn activation_options_carry_pid_and_args() {
        let rendered = build_activation_options(&config(), 4242).render(&MacroTable::new());
        assert_eq!(
            rendered,
            vec![
                "-Djava.class.path=demo.jar",
                "-Dapp.preferences.id=demo",
                "-Dapp.singleinstance.pid=4242",
                "demo.Activate",
                "--open",
                "file.txt",
            ]
        );
    }

    #[test]
    fn command_line_quotes_spaces() {
        let plan = LaunchPlan {
            program: "/opt/my demo/Demo".into(),
            options: vec!["-Dfoo=bar".into(), "hello world".into()],
            working_dir: PathBuf::from("/opt"),
            runtime: config().runtime,
        };
        assert_eq!(
            plan.command_line(),
            "\"/opt/my demo/Demo\" -Dfoo=bar \"hello world\""
        );
    }
}
