use std::{fs::File, io::BufReader, path::Path};

use chrono::Duration;
use serde::Deserialize;

use crate::errors::Result;

/// Limits and timeouts the edit engine enforces.
#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    pub max_number_of_relation_members: usize,
    pub max_number_of_way_nodes: usize,
    pub max_tag_length: usize,
    pub max_changes_per_changeset: u64,
    pub changeset_idle_timeout_secs: i64,
    pub changeset_max_open_secs: i64,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            max_number_of_relation_members: 32_000,
            max_number_of_way_nodes: 2_000,
            max_tag_length: 255,
            max_changes_per_changeset: 10_000,
            changeset_idle_timeout_secs: 60 * 60,
            changeset_max_open_secs: 24 * 60 * 60,
        }
    }
}

impl Settings {
    pub fn idle_timeout(&self) -> Duration {
        Duration::seconds(self.changeset_idle_timeout_secs)
    }

    pub fn max_open_time(&self) -> Duration {
        Duration::seconds(self.changeset_max_open_secs)
    }
}

pub fn load_settings(path: &Path) -> Result<Settings> {
    let file = File::open(path)?;
    Ok(serde_json::from_reader(BufReader::new(file))?)
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn test_partial_config_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"max_number_of_relation_members": 20}}"#).unwrap();

        let settings = load_settings(file.path()).unwrap();
        assert_eq!(settings.max_number_of_relation_members, 20);
        assert_eq!(settings.max_number_of_way_nodes, 2_000);
        assert_eq!(settings.idle_timeout(), Duration::hours(1));
    }

    #[test]
    fn test_missing_file_is_an_error() {
        assert!(load_settings(Path::new("/nonexistent/settings.json")).is_err());
    }
}
