use config::ConfigError;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::{env, fs, io};

const DEFAULT_CLIENT_NAME: &str = "WEB_REMIX";
const DEFAULT_CLIENT_VERSION: &str = "1.20220606.03.00";
const DEFAULT_LANGUAGE: &str = "en";

#[derive(Deserialize)]
pub struct Settings {
    pub api_settings: ApiSettings,
    pub log_filter: Option<String>,
}

#[derive(Deserialize, Clone, Debug)]
pub struct ApiSettings {
    pub base_url: String,
    pub api_key: String,
    #[serde(default = "default_client_name")]
    pub client_name: String,
    #[serde(default = "default_client_version")]
    pub client_version: String,
    #[serde(default = "default_language")]
    pub language: String,
}

fn default_client_name() -> String {
    DEFAULT_CLIENT_NAME.to_string()
}

fn default_client_version() -> String {
    DEFAULT_CLIENT_VERSION.to_string()
}

fn default_language() -> String {
    DEFAULT_LANGUAGE.to_string()
}

impl ApiSettings {
    pub fn new(url: &str, api_key: &str) -> Self {
        Self {
            base_url: url.to_string(),
            api_key: api_key.to_string(),
            client_name: default_client_name(),
            client_version: default_client_version(),
            language: default_language(),
        }
    }
}

pub fn get_configuration(cfg_file: &str) -> Result<Settings, ConfigError> {
    let settings = config::Config::builder()
        .add_source(config::File::new(cfg_file, config::FileFormat::Yaml))
        .add_source(config::Environment::with_prefix("VIMUSYNC").separator("__"))
        .build()?;

    settings.try_deserialize::<Settings>()
}

pub struct ConfigFolder {
    pub config_dir: PathBuf,
    pub config_file: PathBuf,
    pub cache_db: PathBuf,
}

impl ConfigFolder {
    pub fn new() -> io::Result<Self> {
        let home_dir = env::var("HOME")
            .map_err(|_| io::Error::new(io::ErrorKind::NotFound, "HOME is not set"))?;
        Ok(Self::in_home(Path::new(&home_dir)))
    }

    pub fn in_home(home_dir: &Path) -> Self {
        let config_dir = home_dir.join(".vimusync");
        Self {
            config_file: config_dir.join("config.yaml"),
            cache_db: config_dir.join("cache_db"),
            config_dir,
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.config_dir.exists() && self.config_file.exists()
    }
}

pub fn create_config(cfg_folder: &ConfigFolder) -> Result<(), Box<dyn std::error::Error>> {
    println!("\x1b[1m\x1b[32mCreating configuration...\x1b[0m");
    let config_dir = &cfg_folder.config_dir;

    if config_dir.exists() && !confirm_overwrite()? {
        println!("\x1b[33mOperation cancelled.\x1b[0m");
        return Ok(());
    }

    write_config_template(cfg_folder)?;

    println!("\x1b[32mConfiguration folder created at:");
    println!("  -> ~/.vimusync");
    println!("Configuration file created at:");
    println!("  -> ~/.vimusync/config.yaml");
    println!("Cache database folder created at:");
    println!("  -> ~/.vimusync/cache_db");
    println!("\x1b[0mPlease edit the configuration file with your specific settings.");

    Ok(())
}

fn write_config_template(cfg_folder: &ConfigFolder) -> io::Result<()> {
    fs::create_dir_all(&cfg_folder.config_dir)?;
    fs::create_dir_all(&cfg_folder.cache_db)?;

    let config_content = include_str!("config_template.yaml");
    fs::write(&cfg_folder.config_file, config_content)
}

fn confirm_overwrite() -> Result<bool, io::Error> {
    println!("\x1b[31mThe configuration folder already exists.");
    println!("Do you want to overwrite the configuration file? The cache is kept. (y/N)\x1b[0m");

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;

    Ok(input.trim().to_lowercase() == "y")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_template_round_trips_through_config() {
        let home = tempdir().unwrap();
        let folder = ConfigFolder::in_home(home.path());
        assert!(!folder.is_initialized());

        write_config_template(&folder).unwrap();
        assert!(folder.is_initialized());

        let settings = get_configuration(folder.config_file.to_str().unwrap()).unwrap();
        assert_eq!(
            settings.api_settings.base_url,
            "https://music.youtube.com/youtubei/v1"
        );
        assert_eq!(settings.api_settings.client_name, "WEB_REMIX");
        assert_eq!(settings.log_filter.as_deref(), Some("vimusync=info,warn"));
    }

    #[test]
    fn test_api_settings_defaults() {
        let settings = ApiSettings::new("https://example.com", "k");
        assert_eq!(settings.client_version, DEFAULT_CLIENT_VERSION);
        assert_eq!(settings.language, "en");
    }
}
