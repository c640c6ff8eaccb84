pub mod merger;
pub mod prefs;

pub use merger::{normalize_user_arg, JvmUserArgs};
pub use prefs::{parse_prefs_xml, JavaUserPrefs, LegacyPreferences, NoLegacyPreferences};
