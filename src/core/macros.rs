// ─── Macro Table ───
// `$TOKEN` substitution for config values and launch options.

use std::fmt;

use tracing::warn;

/// Upper bound on substitution rounds. Two tokens whose values reference each
/// other would otherwise rewrite forever.
pub const MAX_EXPANSION_DEPTH: usize = 32;

/// Tokens registered from resolved boot paths.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MacroToken {
    PackageDir,
    AppDir,
    LauncherDir,
    AppDataDir,
    JreHome,
    CacheDir,
    JvmLibFile,
}

impl MacroToken {
    pub const ALL: [MacroToken; 7] = [
        MacroToken::PackageDir,
        MacroToken::AppDir,
        MacroToken::LauncherDir,
        MacroToken::AppDataDir,
        MacroToken::JreHome,
        MacroToken::CacheDir,
        MacroToken::JvmLibFile,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            MacroToken::PackageDir => "$PACKAGEDIR",
            MacroToken::AppDir => "$APPDIR",
            MacroToken::LauncherDir => "$LAUNCHERDIR",
            MacroToken::AppDataDir => "$APPDATADIR",
            MacroToken::JreHome => "$JREHOME",
            MacroToken::CacheDir => "$CACHEDIR",
            MacroToken::JvmLibFile => "$JVMLIBFILE",
        }
    }
}

impl fmt::Display for MacroToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Registry of tokens, searched in registration order.
#[derive(Debug, Clone, Default)]
pub struct MacroTable {
    tokens: Vec<(String, String)>,
}

impl MacroTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, token: MacroToken, value: impl Into<String>) {
        self.register_raw(token.as_str(), value);
    }

    /// Register an arbitrary token name. Re-registering replaces the value.
    pub fn register_raw(&mut self, name: &str, value: impl Into<String>) {
        let value = value.into();
        match self.tokens.iter_mut().find(|(existing, _)| existing == name) {
            Some(slot) => slot.1 = value,
            None => self.tokens.push((name.to_string(), value)),
        }
    }

    pub fn value(&self, token: MacroToken) -> Option<&str> {
        self.tokens
            .iter()
            .find(|(name, _)| name == token.as_str())
            .map(|(_, value)| value.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Substitute registered tokens until none remain.
    ///
    /// Each round replaces every occurrence of the first token found, then
    /// rescans the result. After [`MAX_EXPANSION_DEPTH`] rounds the partially
    /// expanded text is returned as-is.
    pub fn expand(&self, text: &str) -> String {
        let mut current = text.to_string();

        for _ in 0..MAX_EXPANSION_DEPTH {
            let Some((name, value)) = self
                .tokens
                .iter()
                .find(|(name, _)| current.contains(name.as_str()))
            else {
                return current;
            };
            current = current.replace(name.as_str(), value);
        }

        if self.tokens.iter().any(|(name, _)| current.contains(name.as_str())) {
            warn!(
                "Macro expansion stopped after {} rounds, result still contains tokens: {}",
                MAX_EXPANSION_DEPTH, current
            );
        }
        current
    }
}
