// ─── Launcher Flags ───
// Flags consumed by the launcher itself; everything else goes to the app.

use std::ffi::OsString;

/// Generate the AppCDS cache and exit.
pub const GENERATE_CACHE_FLAG: &str = "-Xappcds:generatecache";
/// Run without the AppCDS cache.
pub const APPCDS_OFF_FLAG: &str = "-Xappcds:off";
/// Marks a launcher process spawned by another launcher process.
pub const CHILD_FLAG: &str = "-Xapp:child";
/// Log the full launch command and enable the configured debug agent.
pub const DEBUG_FLAG: &str = "-Xapp:debug";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LauncherFlags {
    pub generate_cache: bool,
    pub appcds_off: bool,
    pub child: bool,
    pub debug: bool,
    /// Remaining arguments in their original order.
    pub forwarded: Vec<String>,
}

impl LauncherFlags {
    /// Split process arguments (without `argv[0]`).
    pub fn parse<I, S>(args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut flags = Self::default();
        for arg in args {
            let arg = arg.into();
            match arg.as_str() {
                GENERATE_CACHE_FLAG => flags.generate_cache = true,
                APPCDS_OFF_FLAG => flags.appcds_off = true,
                CHILD_FLAG => flags.child = true,
                DEBUG_FLAG => flags.debug = true,
                _ => flags.forwarded.push(arg),
            }
        }
        flags
    }
}

/// Process arguments as strings. Arguments that are not valid Unicode are
/// converted lossily instead of aborting the launcher.
pub fn lossy_args<I>(args: I) -> Vec<String>
where
    I: IntoIterator<Item = OsString>,
{
    args.into_iter()
        .map(|arg| arg.to_string_lossy().into_owned())
        .collect()
}
