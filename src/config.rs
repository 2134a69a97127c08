
use std::collections::BTreeMap;
use std::error::Error;
use std::path::{Path, PathBuf};

use clap::ArgMatches;
use directories::ProjectDirs;
use log::debug;
use simple_error::{bail, require_with};
use tabular::*;

use serde_derive::Deserialize;
use serde_derive::Serialize;

use crate::utils::*;

pub const KEY_OUTPUT_DIRECTORY: &str = "output-directory";
pub const KEY_REVISION: &str = "revision";

const KNOWN_KEYS: [&str; 2] = [KEY_OUTPUT_DIRECTORY, KEY_REVISION];

pub const DEFAULT_OUTPUT_DIRECTORY: &str = "./results";
pub const DEFAULT_REVISION: &str = "local";

#[derive(Serialize, Deserialize, Debug, Default, PartialEq)]
pub struct Config {
    #[serde(rename = "output-directory", skip_serializing_if = "Option::is_none", default)]
    output_directory: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    revision: Option<String>,
}

pub fn touca_config_file() -> Result<PathBuf, Box<dyn Error>> {
    if let Some(path) = std::env::var_os("TOUCA_CONFIG") {
        return Ok(PathBuf::from(path));
    }
    let proj_dirs = match ProjectDirs::from("io", "touca", "touca") {
        Some(x) => x,
        None => bail!("Config file is not supported on this system"),
    };
    Ok(proj_dirs.config_dir().join("config.json"))
}

impl Config {
    pub fn load() -> Result<Config, Box<dyn Error>> {
        Config::load_from(&touca_config_file()?)
    }

    pub fn load_from(config_file: &Path) -> Result<Config, Box<dyn Error>> {
        let config: Config = if config_file.exists() {
            debug!("Reading config from {}", config_file.display());
            let contents = read_file_string(config_file)?;
            serde_json::from_str(&contents)?
        } else {
            Config::default()
        };

        Ok(config)
    }

    pub fn save_to(&self, config_file: &Path) -> Result<(), Box<dyn Error>> {
        let str = serde_json::to_string_pretty(self)?;
        if let Some(dir) = config_file.parent() {
            std::fs::create_dir_all(dir)?;
        }
        std::fs::write(config_file, str)?;
        debug!("Saved config to {}", config_file.display());
        Ok(())
    }

    fn slot(&mut self, key: &str) -> Result<&mut Option<String>, Box<dyn Error>> {
        match key {
            KEY_OUTPUT_DIRECTORY => Ok(&mut self.output_directory),
            KEY_REVISION => Ok(&mut self.revision),
            _ => bail!(
                "Unknown config key: {}, known keys are: {}",
                key,
                KNOWN_KEYS.join(", ")
            ),
        }
    }

    pub fn get(&self, key: &str) -> Result<Option<String>, Box<dyn Error>> {
        match self.entries().remove(key) {
            Some(value) => Ok(value),
            None => bail!(
                "Unknown config key: {}, known keys are: {}",
                key,
                KNOWN_KEYS.join(", ")
            ),
        }
    }

    pub fn set(&mut self, key: &str, value: Option<&str>) -> Result<(), Box<dyn Error>> {
        *self.slot(key)? = value.map(|x| x.to_string());
        Ok(())
    }

    pub fn entries(&self) -> BTreeMap<&'static str, Option<String>> {
        let mut entries = BTreeMap::new();
        entries.insert(KEY_OUTPUT_DIRECTORY, self.output_directory.clone());
        entries.insert(KEY_REVISION, self.revision.clone());
        entries
    }

    /// Output directory with `~` expanded, falling back to the default.
    pub fn output_directory_or(&self, flag: Option<&String>) -> PathBuf {
        let dir = flag
            .cloned()
            .or_else(|| self.output_directory.clone())
            .unwrap_or_else(|| DEFAULT_OUTPUT_DIRECTORY.to_string());
        PathBuf::from(shellexpand::tilde(&dir).to_string())
    }

    pub fn revision_or(&self, flag: Option<&String>) -> String {
        flag.cloned()
            .or_else(|| self.revision.clone())
            .unwrap_or_else(|| DEFAULT_REVISION.to_string())
    }
}

pub fn save_config(key: &str, value: Option<&str>) -> Result<(), Box<dyn Error>> {
    let config_file = touca_config_file()?;
    let mut config = Config::load_from(&config_file)?;
    config.set(key, value)?;
    config.save_to(&config_file)?;

    Ok(())
}

pub fn get_config(key: &str) -> Result<Option<String>, Box<dyn Error>> {
    let config = Config::load()?;
    config.get(key)
}

// -- touca config --------------------------------------------------------

pub fn sc_config(args: &ArgMatches) -> Result<(), Box<dyn Error>> {
    match args.subcommand() {
        Some(("list", _)) => sc_config_list(),
        Some(("get", s)) => sc_config_get(s),
        Some(("set", s)) => sc_config_set(s),
        Some(("rm", s)) => sc_config_rm(s),
        _ => Ok(()), // unreachable
    }
}

fn sc_config_list() -> Result<(), Box<dyn Error>> {
    let config = Config::load()?;
    let mut tab: Table = Table::new("{:<}   {:<}");
    tab.add_row(row!("Key", "Value"));
    tab.add_heading("------------------------------------------------------------------------");
    for (k, v) in config.entries().iter() {
        tab.add_row(row!(k, v.as_deref().unwrap_or("-")));
    }
    print!("{}", tab);
    Ok(())
}

fn sc_config_get(args: &ArgMatches) -> Result<(), Box<dyn Error>> {
    let key = require_with!(args.get_one::<String>("key"), "clap error");
    match get_config(key)? {
        Some(value) => println!("{}", value),
        None => bail!("Config key {} is not set", key),
    };
    Ok(())
}

fn sc_config_set(args: &ArgMatches) -> Result<(), Box<dyn Error>> {
    let key = require_with!(args.get_one::<String>("key"), "clap error");
    let value = require_with!(args.get_one::<String>("value"), "clap error");
    save_config(key, Some(value.as_str()))
}

fn sc_config_rm(args: &ArgMatches) -> Result<(), Box<dyn Error>> {
    let key = require_with!(args.get_one::<String>("key"), "clap error");
    save_config(key, None)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_is_empty_config() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("nope.json")).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.revision_or(None), DEFAULT_REVISION);
        assert_eq!(
            config.output_directory_or(None),
            PathBuf::from(DEFAULT_OUTPUT_DIRECTORY)
        );
    }

    #[test]
    fn set_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("nested").join("config.json");
        let mut config = Config::default();
        config.set(KEY_REVISION, Some("v1.2")).unwrap();
        config.set(KEY_OUTPUT_DIRECTORY, Some("/tmp/out")).unwrap();
        config.save_to(&file).unwrap();

        let loaded = Config::load_from(&file).unwrap();
        assert_eq!(loaded.get(KEY_REVISION).unwrap().as_deref(), Some("v1.2"));
        assert_eq!(loaded.output_directory_or(None), PathBuf::from("/tmp/out"));
    }

    #[test]
    fn flags_take_precedence() {
        let mut config = Config::default();
        config.set(KEY_REVISION, Some("from-config")).unwrap();
        let flag = "from-flag".to_string();
        assert_eq!(config.revision_or(Some(&flag)), "from-flag");
        assert_eq!(config.revision_or(None), "from-config");
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let mut config = Config::default();
        assert!(config.set("api-key", Some("x")).is_err());
        assert!(config.get("api-key").is_err());
    }

    #[test]
    fn removing_a_key() {
        let mut config = Config::default();
        config.set(KEY_REVISION, Some("v1")).unwrap();
        config.set(KEY_REVISION, None).unwrap();
        assert_eq!(config.get(KEY_REVISION).unwrap(), None);
        let json = serde_json::to_string(&config).unwrap();
        assert_eq!(json, "{}");
    }
}
