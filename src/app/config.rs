use std::{
    path::{Path, PathBuf},
    str::FromStr,
};

use log::*;
use serde::{Deserialize, Serialize};

use crate::core::Settings;

/// Settings used when running yase as an application.
///
/// Contains the emulator [Settings] as well as where save files and savestates go.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// One of `off`, `error`, `warn`, `info`, `debug` or `trace`
    pub log_level: String,
    /// Where SRAM save files are written. Next to the ROM if unset.
    pub save_dir: Option<PathBuf>,
    /// Where quicksaves are written
    pub savestate_dir: PathBuf,
    /// How many frames to run if not given on the command line
    pub frames: Option<u64>,
    /// The emulator settings
    pub settings: Settings,
    /// Name of the game being played, used in quicksave file names
    #[serde(skip)]
    pub game_name: Option<String>,
    /// File of most recent quicksave
    /// Used for quickloading
    #[serde(skip)]
    pub quickload_file: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            log_level: "info".to_string(),
            save_dir: None,
            savestate_dir: dirs::data_dir()
                .map(|d| d.join("yase").join("savestates"))
                .unwrap_or_else(|| PathBuf::from(".")),
            frames: None,
            settings: Settings::default(),
            game_name: None,
            quickload_file: None,
        }
    }
}

impl Config {
    /// The default location of the config file, in the platform's config directory.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("yase").join("config.yaml"))
    }

    /// Read the config at `path`.
    ///
    /// A missing file is created with the default values. An unreadable file is reported and
    /// the defaults are used.
    pub fn load(path: &Path) -> Config {
        match std::fs::read_to_string(path) {
            Ok(s) => match serde_yaml::from_str(&s) {
                Ok(c) => c,
                Err(e) => {
                    warn!("Unable to parse config {:?}, using defaults: {}", path, e);
                    Config::default()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let config = Config::default();
                match config.save(path) {
                    Ok(_) => info!("Wrote default config to {:?}", path),
                    Err(e) => warn!("Unable to write default config to {:?}: {}", path, e),
                }
                config
            }
            Err(e) => {
                warn!("Unable to read config {:?}, using defaults: {}", path, e);
                Config::default()
            }
        }
    }

    /// Write the config as YAML, creating its directory if needed.
    pub fn save(&self, path: &Path) -> std::io::Result<()> {
        let yaml = serde_yaml::to_string(self).map_err(std::io::Error::other)?;
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)?;
        }
        std::fs::write(path, yaml)
    }

    /// The log level, falling back to `info` if it cannot be parsed.
    pub fn level_filter(&self) -> LevelFilter {
        LevelFilter::from_str(&self.log_level).unwrap_or(LevelFilter::Info)
    }

    /// Where the save file for a ROM lives.
    pub fn save_path(&self, rom: &Path) -> PathBuf {
        let path = rom.with_extension("sav");
        match (&self.save_dir, path.file_name()) {
            (Some(dir), Some(name)) => dir.join(name),
            _ => path,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: Config = serde_yaml::from_str("log_level: debug\nframes: 10\n").unwrap();
        assert_eq!(config.level_filter(), LevelFilter::Debug);
        assert_eq!(config.frames, Some(10));
        assert_eq!(config.settings, Settings::default());
    }

    #[test]
    fn test_save_path() {
        let mut config = Config::default();
        assert_eq!(
            config.save_path(Path::new("roms/game.sfc")),
            PathBuf::from("roms/game.sav")
        );
        config.save_dir = Some(PathBuf::from("saves"));
        assert_eq!(
            config.save_path(Path::new("roms/game.sfc")),
            PathBuf::from("saves/game.sav")
        );
    }

    #[test]
    fn test_missing_file_is_created() {
        let dir = std::env::temp_dir().join(format!("yase-config-{}", std::process::id()));
        let path = dir.join("config.yaml");
        let _ = std::fs::remove_file(&path);
        let config = Config::load(&path);
        assert_eq!(config.log_level, "info");
        assert!(path.exists());
        let _ = std::fs::remove_dir_all(&dir);
    }
}
