// ─── Legacy Config Migration ───
// Rebuilds the canonical sectioned layout from an old flat `.cfg` file.
// Legacy files are never rewritten; the migrated document is read-only.

use tracing::debug;

use super::document::{split_name_value, IniDocument, PropertyDocument};
use super::keys;

/// `Application` keys carried over verbatim from a flat file.
const APPLICATION_KEYS: &[&str] = &[
    keys::APP_NAME,
    keys::APP_VERSION,
    keys::APP_ID,
    keys::MAIN_JAR,
    keys::MAIN_CLASS,
    keys::MAIN_MODULE,
    keys::CLASSPATH,
    keys::MODULE_PATH,
    keys::RUNTIME,
    keys::SPLASH,
    keys::MEMORY,
    keys::DEBUG,
    keys::APPLICATION_INSTANCE,
    keys::APPCDS,
    keys::APPCDS_CACHE,
    keys::SINGLE_INSTANCE_ACTIVATION,
];

/// Collect `prefix1`, `prefix2`, ... until the first missing index.
fn numbered_values<'a>(flat: &'a PropertyDocument, prefix: &str) -> Vec<&'a str> {
    let mut values = Vec::new();
    for index in 1.. {
        match flat.get_value(&format!("{prefix}.{index}")) {
            Some(value) => values.push(value),
            None => break,
        }
    }
    values
}

/// Collect `prefix.N.name` / `prefix.N.value` pairs until the first missing name.
fn numbered_pairs<'a>(flat: &'a PropertyDocument, prefix: &str) -> Vec<(&'a str, &'a str)> {
    let mut pairs = Vec::new();
    for index in 1.. {
        let Some(name) = flat.get_value(&format!("{prefix}.{index}.name")) else {
            break;
        };
        let value = flat
            .get_value(&format!("{prefix}.{index}.value"))
            .unwrap_or("");
        pairs.push((name, value));
    }
    pairs
}

impl IniDocument {
    /// Migrate a flat legacy document into the sectioned layout.
    pub fn from_legacy(flat: &PropertyDocument) -> IniDocument {
        let mut doc = IniDocument::new();

        for key in APPLICATION_KEYS {
            if let Some(value) = flat.get_value(key) {
                doc.append(keys::SECTION_APPLICATION, key, value);
            }
        }

        for option in numbered_values(flat, "jvmarg") {
            let (name, value) = split_name_value(option);
            doc.append(keys::SECTION_JVM_OPTIONS, &name, &value);
        }

        for (name, value) in numbered_pairs(flat, "jvmuserarg") {
            doc.append(keys::SECTION_JVM_USER_OPTIONS, name, value);
        }

        for arg in numbered_values(flat, "arg") {
            doc.append(keys::SECTION_ARG_OPTIONS, arg, "");
        }

        for option in numbered_values(flat, "appcds.jvmarg") {
            let (name, value) = split_name_value(option);
            doc.append(keys::SECTION_APPCDS_JVM_OPTIONS, &name, &value);
        }

        for option in numbered_values(flat, "appcds.generatecache.jvmarg") {
            let (name, value) = split_name_value(option);
            doc.append(keys::SECTION_APPCDS_GENERATE_JVM_OPTIONS, &name, &value);
        }

        debug!(
            "Migrated legacy config into sections: {:?}",
            doc.section_names().collect::<Vec<_>>()
        );

        doc.set_read_only(true);
        doc
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pairs(doc: &IniDocument, section: &str) -> Vec<(String, String)> {
        doc.section(section)
            .map(|values| {
                values
                    .iter()
                    .map(|e| (e.key.clone(), e.value.clone()))
                    .collect()
            })
            .unwrap_or_default()
    }

    #[test]
    fn jvm_args_are_split_into_name_and_value() {
        let flat = PropertyDocument::parse("jvmarg.1=-Xmx1g\njvmarg.2=-Dfoo=bar\n");
        let doc = IniDocument::from_legacy(&flat);

        assert_eq!(
            pairs(&doc, keys::SECTION_JVM_OPTIONS),
            vec![
                ("-Xmx1g".to_string(), String::new()),
                ("-Dfoo".to_string(), "bar".to_string()),
            ]
        );
        assert!(doc.is_read_only());
    }

    #[test]
    fn scanning_stops_at_first_gap() {
        let flat = PropertyDocument::parse(
            "jvmarg.1=-Da=1\njvmarg.3=-Dc=3\narg.1=first\narg.2=second\narg.4=fourth\n",
        );
        let doc = IniDocument::from_legacy(&flat);

        assert_eq!(pairs(&doc, keys::SECTION_JVM_OPTIONS).len(), 1);
        assert_eq!(
            pairs(&doc, keys::SECTION_ARG_OPTIONS),
            vec![
                ("first".to_string(), String::new()),
                ("second".to_string(), String::new()),
            ]
        );
    }

    #[test]
    fn user_arg_scanning_stops_at_first_missing_name() {
        let flat = PropertyDocument::parse(
            "jvmuserarg.1.name=-Xmx\njvmuserarg.1.value=512m\n\
             jvmuserarg.2.value=orphan\n\
             jvmuserarg.3.name=-Dlate=\njvmuserarg.3.value=1\n",
        );
        let doc = IniDocument::from_legacy(&flat);

        assert_eq!(
            pairs(&doc, keys::SECTION_JVM_USER_OPTIONS),
            vec![("-Xmx".to_string(), "512m".to_string())]
        );
    }

    #[test]
    fn user_args_and_application_keys_are_redistributed() {
        let flat = PropertyDocument::parse(
            "app.name=Demo\napp.mainclass=demo.Main\nunrelated=1\n\
             jvmuserarg.1.name=-Xmx\njvmuserarg.1.value=512m\n\
             jvmuserarg.2.name=-Dtheme=\njvmuserarg.2.value=dark\n",
        );
        let doc = IniDocument::from_legacy(&flat);

        assert_eq!(
            doc.get_value(keys::SECTION_APPLICATION, keys::APP_NAME),
            Some("Demo")
        );
        assert_eq!(
            doc.get_value(keys::SECTION_APPLICATION, keys::MAIN_CLASS),
            Some("demo.Main")
        );
        assert_eq!(doc.get_value(keys::SECTION_APPLICATION, "unrelated"), None);
        assert_eq!(
            pairs(&doc, keys::SECTION_JVM_USER_OPTIONS),
            vec![
                ("-Xmx".to_string(), "512m".to_string()),
                ("-Dtheme=".to_string(), "dark".to_string()),
            ]
        );
    }
}
