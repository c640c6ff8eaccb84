// ─── Config Documents ───
// Flat `key=value` property files and `[section]`-based ini files.

use std::path::Path;

use tracing::{debug, warn};

use crate::core::error::{LauncherError, LauncherResult};

use super::ordered_map::{DuplicatePolicy, OrderedMap};

const FLAT_COMMENT: char = '#';
const SECTION_COMMENT: char = ';';

/// Split a config line into `(name, value)`.
///
/// The first unescaped `=` ends the name. Inside the name `\\` and `\=` are
/// escapes, as is a backslash in front of a leading comment, header or
/// whitespace character; any other backslash is kept literally. Without a
/// separator the whole line, minus trailing whitespace, is the name and the
/// value is empty.
pub fn split_name_value(line: &str) -> (String, String) {
    let mut name = String::new();
    let mut chars = line.char_indices().peekable();

    while let Some((offset, ch)) = chars.next() {
        match ch {
            '=' => return (name, line[offset + 1..].to_string()),
            '\\' => match chars.peek() {
                Some(&(_, next)) if is_escaped(next, offset == 0) => {
                    name.push(next);
                    chars.next();
                }
                _ => name.push('\\'),
            },
            other => name.push(other),
        }
    }

    name.truncate(name.trim_end().len());
    (name, String::new())
}

/// Inverse of the name half of [`split_name_value`].
pub fn escape_name(name: &str) -> String {
    let mut escaped = String::with_capacity(name.len());
    for (position, ch) in name.chars().enumerate() {
        if is_escaped(ch, position == 0) {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

/// Name characters written with a leading backslash. At the start of a name
/// this includes anything that would turn the line into a comment, a header
/// or indentation.
fn is_escaped(ch: char, leading: bool) -> bool {
    match ch {
        '\\' | '=' => true,
        FLAT_COMMENT | SECTION_COMMENT | '[' => leading,
        _ => leading && ch.is_whitespace(),
    }
}

fn format_line(name: &str, value: &str) -> String {
    format!("{}={}", escape_name(name), value)
}

fn read_text(path: &Path) -> Option<String> {
    match std::fs::read(path) {
        Ok(bytes) => Some(String::from_utf8_lossy(&bytes).into_owned()),
        Err(error) => {
            debug!("Config document {:?} unavailable: {}", path, error);
            None
        }
    }
}

fn is_comment(line: &str, marker: char) -> bool {
    line.starts_with(marker)
}

/// Write `contents` to `path`, creating parent directories and optionally
/// restricting the file to its owner.
fn write_document(path: &Path, contents: &str, owner_only: bool) -> LauncherResult<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|source| LauncherError::io(parent, source))?;
    }

    std::fs::write(path, contents).map_err(|source| LauncherError::io(path, source))?;

    if owner_only {
        restrict_to_owner(path)?;
    }

    Ok(())
}

#[cfg(unix)]
fn restrict_to_owner(path: &Path) -> LauncherResult<()> {
    use std::os::unix::fs::PermissionsExt;

    let mut perms = std::fs::metadata(path)
        .map_err(|source| LauncherError::io(path, source))?
        .permissions();
    perms.set_mode(0o600);
    std::fs::set_permissions(path, perms).map_err(|source| LauncherError::io(path, source))
}

#[cfg(not(unix))]
fn restrict_to_owner(path: &Path) -> LauncherResult<()> {
    debug!("Owner-only permissions are not applied on this platform: {:?}", path);
    Ok(())
}

// ── Flat documents ──────────────────────────────────

/// Flat `key=value` document. Later duplicates replace earlier values.
#[derive(Debug, Clone, Default)]
pub struct PropertyDocument {
    values: OrderedMap<String>,
    read_only: bool,
    modified: bool,
}

impl PropertyDocument {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load(path: &Path) -> Option<Self> {
        read_text(path).map(|text| Self::parse(&text))
    }

    pub fn parse(text: &str) -> Self {
        let mut values = OrderedMap::new();
        for raw in text.lines() {
            let line = raw.trim_start();
            if line.trim_end().is_empty() || is_comment(line, FLAT_COMMENT) {
                continue;
            }
            let (name, value) = split_name_value(line);
            values.append(name, value);
        }
        Self {
            values,
            read_only: false,
            modified: false,
        }
    }

    pub fn get_value(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    pub fn set_value(&mut self, key: &str, value: &str) -> bool {
        if self.read_only {
            return false;
        }
        self.values.set(key, value.to_string());
        self.modified = true;
        true
    }

    pub fn remove_key(&mut self, key: &str) -> bool {
        if self.read_only {
            return false;
        }
        let removed = self.values.remove(key).is_some();
        if removed {
            self.modified = true;
        }
        removed
    }

    pub fn values(&self) -> &OrderedMap<String> {
        &self.values
    }

    pub fn set_read_only(&mut self, read_only: bool) {
        self.read_only = read_only;
    }

    pub fn is_read_only(&self) -> bool {
        self.read_only
    }

    pub fn is_modified(&self) -> bool {
        self.modified
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        for entry in self.values.iter() {
            out.push_str(&format_line(&entry.key, &entry.value));
            out.push('\n');
        }
        out
    }

    pub fn save(&mut self, path: &Path, owner_only: bool) -> LauncherResult<()> {
        if self.read_only || !self.modified {
            return Ok(());
        }
        write_document(path, &self.render(), owner_only)?;
        self.modified = false;
        Ok(())
    }
}

// ── Sectioned documents ─────────────────────────────

/// `[section]` document; each section keeps its lines in order and may hold
/// repeated names.
#[derive(Debug, Clone, Default)]
pub struct IniDocument {
    sections: OrderedMap<OrderedMap<String>>,
    read_only: bool,
    modified: bool,
}

impl IniDocument {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load(path: &Path) -> Option<Self> {
        read_text(path).map(|text| Self::parse(&text))
    }

    pub fn parse(text: &str) -> Self {
        let mut doc = Self::new();
        let mut current: Option<String> = None;

        for raw in text.lines() {
            // Trailing whitespace belongs to the value.
            let line = raw.trim_start();
            if line.trim_end().is_empty() || is_comment(line, SECTION_COMMENT) {
                continue;
            }

            if let Some(name) = section_header(line.trim_end()) {
                doc.ensure_section(name);
                current = Some(name.to_string());
                continue;
            }

            let Some(section) = current.as_deref() else {
                warn!("Ignoring config line outside of any section: {}", line);
                continue;
            };
            let (name, value) = split_name_value(line);
            doc.ensure_section(section).append(name, value);
        }

        doc.modified = false;
        doc
    }

    fn ensure_section(&mut self, name: &str) -> &mut OrderedMap<String> {
        self.sections
            .get_or_insert_with(name, || OrderedMap::with_policy(DuplicatePolicy::Allow))
    }

    pub fn section(&self, name: &str) -> Option<&OrderedMap<String>> {
        self.sections.get(name)
    }

    /// Owned copy of a section, empty when the section does not exist.
    pub fn section_or_empty(&self, name: &str) -> OrderedMap<String> {
        self.section(name).cloned().unwrap_or_default()
    }

    pub fn has_section(&self, name: &str) -> bool {
        self.sections.contains_key(name)
    }

    pub fn section_names(&self) -> impl Iterator<Item = &str> {
        self.sections.keys()
    }

    pub fn get_value(&self, section: &str, key: &str) -> Option<&str> {
        self.section(section)
            .and_then(|values| values.get(key))
            .map(String::as_str)
    }

    /// Append a line to `section`, creating the section on first use.
    pub fn append(&mut self, section: &str, key: &str, value: &str) -> bool {
        if self.read_only {
            return false;
        }
        self.ensure_section(section).append(key, value.to_string());
        self.modified = true;
        true
    }

    pub fn set_value(&mut self, section: &str, key: &str, value: &str) -> bool {
        if self.read_only {
            return false;
        }
        self.ensure_section(section).set(key, value.to_string());
        self.modified = true;
        true
    }

    pub fn remove_key(&mut self, section: &str, key: &str) -> bool {
        if self.read_only {
            return false;
        }
        let removed = self
            .sections
            .get_mut(section)
            .and_then(|values| values.remove(key))
            .is_some();
        if removed {
            self.modified = true;
        }
        removed
    }

    /// Replace the whole content of `section`, keeping its position.
    pub fn replace_section(&mut self, section: &str, values: OrderedMap<String>) -> bool {
        if self.read_only {
            return false;
        }
        let target = self.ensure_section(section);
        target.clear();
        for entry in values.iter() {
            target.append(entry.key.clone(), entry.value.clone());
        }
        self.modified = true;
        true
    }

    pub fn set_read_only(&mut self, read_only: bool) {
        self.read_only = read_only;
    }

    pub fn is_read_only(&self) -> bool {
        self.read_only
    }

    pub fn is_modified(&self) -> bool {
        self.modified
    }

    pub(crate) fn mark_modified(&mut self) {
        self.modified = true;
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        for section in self.sections.iter() {
            out.push('[');
            out.push_str(&section.key);
            out.push_str("]\n");
            for entry in section.value.iter() {
                out.push_str(&format_line(&entry.key, &entry.value));
                out.push('\n');
            }
            out.push('\n');
        }
        out
    }

    pub fn save(&mut self, path: &Path, owner_only: bool) -> LauncherResult<()> {
        if self.read_only || !self.modified {
            return Ok(());
        }
        write_document(path, &self.render(), owner_only)?;
        self.modified = false;
        debug!("Saved config document {:?}", path);
        Ok(())
    }
}

fn section_header(line: &str) -> Option<&str> {
    line.strip_prefix('[')
        .and_then(|rest| rest.strip_suffix(']'))
        .map(str::trim)
}

// ── Format detection ────────────────────────────────

/// A config file in whichever format it was found.
#[derive(Debug, Clone)]
pub enum ConfigDocument {
    Flat(PropertyDocument),
    Sectioned(IniDocument),
}

impl ConfigDocument {
    /// Load and classify `path`. Unreadable files count as absent.
    pub fn load(path: &Path) -> Option<Self> {
        read_text(path).map(|text| Self::parse(&text))
    }

    pub fn parse(text: &str) -> Self {
        if is_sectioned(text) {
            ConfigDocument::Sectioned(IniDocument::parse(text))
        } else {
            ConfigDocument::Flat(PropertyDocument::parse(text))
        }
    }

    /// Canonical sectioned view; flat documents are migrated in memory and
    /// come back read-only.
    pub fn into_sectioned(self) -> IniDocument {
        match self {
            ConfigDocument::Sectioned(doc) => doc,
            ConfigDocument::Flat(flat) => IniDocument::from_legacy(&flat),
        }
    }
}

fn is_sectioned(text: &str) -> bool {
    text.lines()
        .map(str::trim)
        .find(|line| {
            !line.is_empty()
                && !is_comment(line, FLAT_COMMENT)
                && !is_comment(line, SECTION_COMMENT)
        })
        .is_some_and(|line| line.starts_with('['))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_handles_escapes_and_missing_separator() {
        assert_eq!(
            split_name_value("-Dfoo=bar"),
            ("-Dfoo".to_string(), "bar".to_string())
        );
        assert_eq!(
            split_name_value("-Xmx1g"),
            ("-Xmx1g".to_string(), String::new())
        );
        assert_eq!(
            split_name_value(r"a\=b=c=d"),
            ("a=b".to_string(), "c=d".to_string())
        );
        assert_eq!(
            split_name_value(r"C:\\dir=1"),
            (r"C:\dir".to_string(), "1".to_string())
        );
        assert_eq!(
            split_name_value(r"C:\dir=1"),
            (r"C:\dir".to_string(), "1".to_string())
        );
        assert_eq!(split_name_value("=value"), (String::new(), "value".to_string()));
    }

    #[test]
    fn escape_name_round_trips_through_split() {
        let names = [
            "plain",
            "-Dfoo=",
            r"back\slash",
            r"\=mixed=",
            ";semi",
            "#hash",
            "[br]",
            " lead",
            "mid;dle",
        ];
        for name in names {
            let line = format_line(name, "v=1");
            assert_eq!(split_name_value(&line), (name.to_string(), "v=1".to_string()));
        }
    }

    #[test]
    fn flat_document_skips_comments_and_rejects_writes_when_read_only() {
        let mut doc = PropertyDocument::parse("# comment\n\napp.name=Demo\napp.memory=auto\n");
        assert_eq!(doc.get_value("app.name"), Some("Demo"));
        assert!(!doc.is_modified());

        doc.set_read_only(true);
        assert!(!doc.set_value("app.name", "Other"));
        assert!(!doc.remove_key("app.memory"));
        assert_eq!(doc.get_value("app.name"), Some("Demo"));
        assert!(!doc.is_modified());

        doc.set_read_only(false);
        assert!(doc.set_value("app.name", "Other"));
        assert!(doc.is_modified());
    }

    #[test]
    fn sectioned_document_preserves_section_and_line_order() {
        let text = "; header comment\n[Application]\napp.name=Demo\n\n[JVMOptions]\n--add-opens=a\n--add-opens=b\n-Xss1m\n";
        let doc = IniDocument::parse(text);

        assert_eq!(
            doc.section_names().collect::<Vec<_>>(),
            vec!["Application", "JVMOptions"]
        );
        let options = doc.section("JVMOptions").unwrap();
        let lines: Vec<_> = options
            .iter()
            .map(|e| (e.key.as_str(), e.value.as_str()))
            .collect();
        assert_eq!(lines, vec![("--add-opens", "a"), ("--add-opens", "b"), ("-Xss1m", "")]);
    }

    #[test]
    fn saved_document_reloads_values_whitespace_and_comment_like_names() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("doc.cfg");

        let mut doc = IniDocument::new();
        doc.append("JVMOptions", "-Dprompt", "> ");
        doc.append("JVMOptions", ";weird", "1");
        doc.append("JVMOptions", "[bracket]", "");
        doc.append("Application", "#name", " padded ");
        doc.save(&path, false).unwrap();

        let reloaded = IniDocument::load(&path).unwrap();
        let lines = |doc: &IniDocument| -> Vec<(String, String, String)> {
            doc.section_names()
                .flat_map(|section| {
                    doc.section(section).unwrap().iter().map(move |e| {
                        (section.to_string(), e.key.clone(), e.value.clone())
                    })
                })
                .collect()
        };
        assert_eq!(lines(&reloaded), lines(&doc));
    }

    #[test]
    fn parse_keeps_trailing_value_whitespace_but_not_indentation() {
        let doc = IniDocument::parse("[A]\n   -Dx=1  \n-Xss1m   \n");
        assert_eq!(doc.get_value("A", "-Dx"), Some("1  "));
        assert_eq!(doc.get_value("A", "-Xss1m"), Some(""));
    }

    #[test]
    fn render_writes_blank_line_after_each_section() {
        let mut doc = IniDocument::new();
        doc.append("A", "k", "v");
        doc.append("B", "x=", "y");
        assert_eq!(doc.render(), "[A]\nk=v\n\n[B]\nx\\==y\n\n");
    }

    #[test]
    fn detection_uses_first_meaningful_line() {
        assert!(matches!(
            ConfigDocument::parse("# c\n; c\n\n[Application]\na=b\n"),
            ConfigDocument::Sectioned(_)
        ));
        assert!(matches!(
            ConfigDocument::parse("app.name=x\n[NotASection]\n"),
            ConfigDocument::Flat(_)
        ));
    }

    #[test]
    fn save_is_noop_when_unmodified_or_read_only() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("doc.cfg");

        let mut doc = IniDocument::parse("[A]\nk=v\n");
        doc.save(&path, false).unwrap();
        assert!(!path.exists());

        doc.set_read_only(true);
        doc.mark_modified();
        doc.save(&path, false).unwrap();
        assert!(!path.exists());

        doc.set_read_only(false);
        doc.save(&path, true).unwrap();
        assert!(path.exists());
        assert!(!doc.is_modified());

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = std::fs::metadata(&path).unwrap().permissions().mode();
            assert_eq!(mode & 0o777, 0o600);
        }
    }
}
