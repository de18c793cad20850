//! INI file configuration adapter.

use crate::domain::error::GradError;
use crate::ports::config_port::ConfigPort;
use configparser::ini::Ini;
use std::path::Path;

pub struct FileConfigAdapter {
    config: Ini,
}

impl FileConfigAdapter {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, GradError> {
        let path = path.as_ref();
        let mut config = Ini::new();
        config.load(path).map_err(|reason| GradError::ConfigParse {
            file: path.display().to_string(),
            reason,
        })?;
        tracing::debug!(file = %path.display(), "loaded configuration");
        Ok(Self { config })
    }

    pub fn from_string(content: &str) -> Result<Self, String> {
        let mut config = Ini::new();
        config.read(content.to_string())?;
        Ok(Self { config })
    }

    fn parse_bool(value: &str) -> Option<bool> {
        match value.trim().to_lowercase().as_str() {
            "true" | "yes" | "1" => Some(true),
            "false" | "no" | "0" => Some(false),
            _ => None,
        }
    }
}

impl ConfigPort for FileConfigAdapter {
    fn get_string(&self, section: &str, key: &str) -> Option<String> {
        self.config.get(section, key)
    }

    fn get_int(&self, section: &str, key: &str, default: i64) -> i64 {
        self.config
            .getint(section, key)
            .ok()
            .flatten()
            .unwrap_or(default)
    }

    fn get_bool(&self, section: &str, key: &str, default: bool) -> bool {
        self.config
            .get(section, key)
            .as_ref()
            .and_then(|v| Self::parse_bool(v))
            .unwrap_or(default)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_temp_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{}", content).unwrap();
        file
    }

    #[test]
    fn from_string_parses_config() {
        let content = r#"
[data]
backend = sqlite

[sqlite]
path = /var/lib/gradfund/records.db
pool_size = 2
"#;
        let adapter = FileConfigAdapter::from_string(content).unwrap();
        assert_eq!(
            adapter.get_string("data", "backend"),
            Some("sqlite".to_string())
        );
        assert_eq!(
            adapter.get_string("sqlite", "path"),
            Some("/var/lib/gradfund/records.db".to_string())
        );
    }

    #[test]
    fn get_string_returns_none_for_missing_key() {
        let adapter = FileConfigAdapter::from_string("[report]\nformat = csv\n").unwrap();
        assert_eq!(adapter.get_string("report", "missing"), None);
        assert_eq!(adapter.get_string("missing_section", "key"), None);
    }

    #[test]
    fn get_int_returns_value() {
        let adapter =
            FileConfigAdapter::from_string("[report]\ngrad_date_adjustment = 45\n").unwrap();
        assert_eq!(adapter.get_int("report", "grad_date_adjustment", 0), 45);
    }

    #[test]
    fn get_int_returns_default_for_missing() {
        let adapter = FileConfigAdapter::from_string("[report]\n").unwrap();
        assert_eq!(adapter.get_int("report", "missing", 60), 60);
    }

    #[test]
    fn get_int_returns_default_for_non_numeric() {
        let adapter =
            FileConfigAdapter::from_string("[report]\ngrad_date_adjustment = soon\n").unwrap();
        assert_eq!(adapter.get_int("report", "grad_date_adjustment", 60), 60);
    }

    #[test]
    fn get_bool_returns_true_values() {
        let adapter =
            FileConfigAdapter::from_string("[flags]\na = true\nb = yes\nc = 1\n").unwrap();
        assert!(adapter.get_bool("flags", "a", false));
        assert!(adapter.get_bool("flags", "b", false));
        assert!(adapter.get_bool("flags", "c", false));
    }

    #[test]
    fn get_bool_returns_false_values() {
        let adapter =
            FileConfigAdapter::from_string("[flags]\na = false\nb = no\nc = 0\n").unwrap();
        assert!(!adapter.get_bool("flags", "a", true));
        assert!(!adapter.get_bool("flags", "b", true));
        assert!(!adapter.get_bool("flags", "c", true));
    }

    #[test]
    fn get_bool_returns_default_for_missing() {
        let adapter = FileConfigAdapter::from_string("[flags]\n").unwrap();
        assert!(adapter.get_bool("flags", "missing", true));
        assert!(!adapter.get_bool("flags", "missing", false));
    }

    #[test]
    fn get_list_splits_and_trims() {
        let adapter = FileConfigAdapter::from_string(
            "[report]\nextra_fields = program, start_date ,, status\n",
        )
        .unwrap();
        assert_eq!(
            adapter.get_list("report", "extra_fields"),
            Some(vec![
                "program".to_string(),
                "start_date".to_string(),
                "status".to_string()
            ])
        );
        assert_eq!(adapter.get_list("report", "missing"), None);
    }

    #[test]
    fn from_file_reads_config() {
        let file = create_temp_config("[data]\ndir = /srv/records\n");
        let adapter = FileConfigAdapter::from_file(file.path()).unwrap();
        assert_eq!(
            adapter.get_string("data", "dir"),
            Some("/srv/records".to_string())
        );
    }

    #[test]
    fn from_file_returns_error_for_missing_file() {
        let result = FileConfigAdapter::from_file("/nonexistent/path/config.ini");
        assert!(matches!(result, Err(GradError::ConfigParse { .. })));
    }
}
