use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Serialize)]
pub struct Settings {
    pub server_url: String,
    pub username: String,
    pub password: String,
    pub sort_by_member_count: bool,
    pub member_page_size: usize,
    pub log_dir: String,
    pub log_level: String,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        Self::load(&get_user_config_path())
    }

    pub fn load(user_config_path: &Path) -> Result<Self, ConfigError> {
        let s = Config::builder()
            .set_default("server_url", "http://localhost")?
            .set_default("username", "admin")?
            .set_default("password", "")?
            .set_default("sort_by_member_count", false)?
            .set_default("member_page_size", 50)?
            .set_default("log_dir", "~/.local/state/grouproster")?
            .set_default("log_level", "info")?
            // User's global config, then a local grouproster.toml in the CWD.
            .add_source(File::from(user_config_path.to_path_buf()).required(false))
            .add_source(File::with_name("grouproster.toml").required(false))
            .add_source(Environment::with_prefix("GROUPROSTER"))
            .build()?;

        s.try_deserialize()
    }

    /// Log directory with `~` and env vars expanded.
    pub fn log_dir(&self) -> PathBuf {
        let expanded = shellexpand::full(&self.log_dir)
            .map(|p| p.into_owned())
            .unwrap_or_else(|_| self.log_dir.clone());
        PathBuf::from(expanded)
    }
}

pub fn get_user_config_path() -> PathBuf {
    let mut path = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
    path.push(".config");
    path.push("grouproster");
    path.push("grouproster.toml");
    path
}

/// Remembers the sort toggle in the user's config file.
pub fn save_sort_mode(by_member_count: bool) -> Result<(), anyhow::Error> {
    save_sort_mode_to(&get_user_config_path(), by_member_count)
}

pub fn save_sort_mode_to(user_config_path: &Path, by_member_count: bool) -> Result<(), anyhow::Error> {
    let config_str = fs::read_to_string(user_config_path).unwrap_or_else(|_| "".to_string());
    let mut doc = config_str.parse::<toml::Table>()?;

    doc.insert("sort_by_member_count".to_string(), toml::Value::Boolean(by_member_count));

    if let Some(parent) = user_config_path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(user_config_path, doc.to_string())?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn saved_sort_mode_is_read_back_and_other_keys_survive() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("grouproster.toml");

        save_sort_mode_to(&path, true).unwrap();
        let saved = fs::read_to_string(&path).unwrap();
        fs::write(&path, format!("{saved}server_url = \"https://cloud.example.com\"\n")).unwrap();
        save_sort_mode_to(&path, false).unwrap();

        let table = fs::read_to_string(&path).unwrap().parse::<toml::Table>().unwrap();
        assert_eq!(table["sort_by_member_count"], toml::Value::Boolean(false));
        assert_eq!(table["server_url"].as_str(), Some("https://cloud.example.com"));
    }

    #[test]
    fn user_file_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("grouproster.toml");
        fs::write(&path, "username = \"root\"\nmember_page_size = 10\n").unwrap();

        let settings = Settings::load(&path).unwrap();
        assert_eq!(settings.username, "root");
        assert_eq!(settings.member_page_size, 10);
        assert_eq!(settings.log_level, "info");
    }
}
