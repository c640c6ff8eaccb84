//! Section and key names of the packaged `.cfg` format.

pub const SECTION_APPLICATION: &str = "Application";
pub const SECTION_JVM_OPTIONS: &str = "JVMOptions";
pub const SECTION_JVM_USER_OPTIONS: &str = "JVMUserOptions";
pub const SECTION_JVM_USER_OVERRIDES: &str = "JVMUserOverridesOptions";
pub const SECTION_ARG_OPTIONS: &str = "ArgOptions";
pub const SECTION_APPCDS_JVM_OPTIONS: &str = "AppCDSJVMOptions";
pub const SECTION_APPCDS_GENERATE_JVM_OPTIONS: &str = "AppCDSGenerateCacheJVMOptions";

pub const APP_NAME: &str = "app.name";
pub const APP_VERSION: &str = "app.version";
pub const APP_ID: &str = "app.preferences.id";
pub const MAIN_JAR: &str = "app.mainjar";
pub const MAIN_CLASS: &str = "app.mainclass";
pub const MAIN_MODULE: &str = "app.mainmodule";
pub const CLASSPATH: &str = "app.classpath";
pub const MODULE_PATH: &str = "app.modulepath";
pub const RUNTIME: &str = "app.runtime";
pub const SPLASH: &str = "app.splash";
pub const MEMORY: &str = "app.memory";
pub const DEBUG: &str = "app.debug";
pub const APPLICATION_INSTANCE: &str = "app.application.instance";
pub const APPCDS: &str = "app.appcds";
pub const APPCDS_CACHE: &str = "app.appcds.cache";
pub const SINGLE_INSTANCE_ACTIVATION: &str = "app.singleinstance.activation";

/// Value of `app.memory` selecting the automatic heap size.
pub const MEMORY_AUTO: &str = "auto";
/// Value of `app.application.instance` enabling the single-instance policy.
pub const INSTANCE_SINGLE: &str = "single";
