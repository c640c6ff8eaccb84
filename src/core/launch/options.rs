// ─── Launch Options ───
// Ordered JVM option list, rendered to strings with macros expanded.

use crate::core::boot::paths::fix_path_separators;
use crate::core::config::OrderedMap;
use crate::core::macros::MacroTable;
use crate::core::user_args::normalize_user_arg;

/// How name and value are combined when rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionKind {
    /// `name=value`
    Assign,
    /// `namevalue`, e.g. `-Xmx512m` or `-splash:img.png`.
    Joined,
    /// `name=value` with directory separators fixed for the host.
    Path,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchOption {
    pub name: String,
    pub value: String,
    pub kind: OptionKind,
}

impl LaunchOption {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            kind: OptionKind::Assign,
        }
    }

    /// Option without a value, rendered as its name.
    pub fn bare(name: impl Into<String>) -> Self {
        Self::new(name, String::new())
    }

    pub fn joined(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            kind: OptionKind::Joined,
            ..Self::new(name, value)
        }
    }

    pub fn path(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            kind: OptionKind::Path,
            ..Self::new(name, value)
        }
    }

    /// Text before macro expansion.
    pub fn to_raw_string(&self) -> String {
        if self.value.is_empty() {
            return self.name.clone();
        }
        match self.kind {
            OptionKind::Assign => format!("{}={}", self.name, self.value),
            OptionKind::Joined => format!("{}{}", self.name, self.value),
            OptionKind::Path => format!("{}={}", self.name, fix_path_separators(&self.value)),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LaunchOptions {
    options: Vec<LaunchOption>,
}

impl LaunchOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, option: LaunchOption) {
        self.options.push(option);
    }

    pub fn append(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.push(LaunchOption::new(name, value));
    }

    pub fn append_bare(&mut self, name: impl Into<String>) {
        self.push(LaunchOption::bare(name));
    }

    pub fn append_joined(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.push(LaunchOption::joined(name, value));
    }

    pub fn append_path(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.push(LaunchOption::path(name, value));
    }

    /// Every entry of `values` as `name=value`, in stored order.
    pub fn append_all(&mut self, values: &OrderedMap<String>) {
        for entry in values.iter() {
            self.append(entry.key.clone(), entry.value.clone());
        }
    }

    /// Like [`append_all`](Self::append_all), cleaning each pair with
    /// [`normalize_user_arg`].
    pub fn append_user_args(&mut self, values: &OrderedMap<String>) {
        for entry in values.iter() {
            let (name, value) = normalize_user_arg(&entry.key, &entry.value);
            self.append(name, value);
        }
    }

    /// Put `option` where the first entry with the same name sits.
    /// Returns `false` when no entry has that name.
    pub fn replace_by_name(&mut self, option: LaunchOption) -> bool {
        match self.options.iter_mut().find(|existing| existing.name == option.name) {
            Some(slot) => {
                *slot = option;
                true
            }
            None => false,
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.options.iter().any(|option| option.name == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &LaunchOption> {
        self.options.iter()
    }

    pub fn len(&self) -> usize {
        self.options.len()
    }

    pub fn is_empty(&self) -> bool {
        self.options.is_empty()
    }

    pub fn render(&self, macros: &MacroTable) -> Vec<String> {
        self.options
            .iter()
            .map(|option| macros.expand(&option.to_raw_string()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::macros::MacroToken;

    #[test]
    fn render_combines_by_kind_and_expands_macros() {
        let mut macros = MacroTable::new();
        macros.register(MacroToken::AppDir, "/opt/demo/app");

        let mut options = LaunchOptions::new();
        options.append("-Dfoo", "bar");
        options.append_bare("-ea");
        options.append_joined("-Xmx", "512m");
        options.append_path("-Djava.class.path", "$APPDIR/demo.jar");

        let rendered = options.render(&macros);
        let expected_cp = if cfg!(target_os = "windows") {
            "-Djava.class.path=/opt/demo/app\\demo.jar"
        } else {
            "-Djava.class.path=/opt/demo/app/demo.jar"
        };
        assert_eq!(rendered, vec!["-Dfoo=bar", "-ea", "-Xmx512m", expected_cp]);
    }

    #[test]
    fn replace_by_name_keeps_position() {
        let mut options = LaunchOptions::new();
        options.append_bare("-server");
        options.append_bare("-Xmx");
        options.append_bare("-ea");

        assert!(options.replace_by_name(LaunchOption::joined("-Xmx", "2048m")));
        assert!(!options.replace_by_name(LaunchOption::joined("-Xms", "256m")));

        let rendered = options.render(&MacroTable::new());
        assert_eq!(rendered, vec!["-server", "-Xmx2048m", "-ea"]);
    }

    #[test]
    fn user_args_are_normalized() {
        let values = OrderedMap::from_pairs([
            ("-Dtheme=", "dark".to_string()),
            ("-Xss", "2m".to_string()),
        ]);
        let mut options = LaunchOptions::new();
        options.append_user_args(&values);

        assert_eq!(
            options.render(&MacroTable::new()),
            vec!["-Dtheme=dark", "-Xss2m"]
        );
    }
}
