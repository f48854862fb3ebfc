use crate::core::join_code::JoinCodePolicy;
use crate::errors::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

const APP_DIR: &str = ".rattendance";
const CONFIG_NAME: &str = "rattendance.conf";
const DB_NAME: &str = "rattendance.sqlite";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_database")]
    pub database: String,
    /// Lifetime of a scan code, in seconds.
    #[serde(default = "default_scan_code_ttl")]
    pub scan_code_ttl_secs: i64,
    #[serde(default = "default_join_code_length")]
    pub join_code_length: usize,
    #[serde(default = "default_join_code_retries")]
    pub join_code_retries: u32,
    /// Hard cap on the instances of one series, whatever its end bound says.
    #[serde(default = "default_max_occurrences")]
    pub max_occurrences: u32,
    /// Offset used to read and print local times on the command line.
    #[serde(default)]
    pub default_tz_offset_minutes: i32,
    /// Scans later than this after the start are stored as LATE.
    #[serde(default)]
    pub late_after_minutes: Option<u32>,
}

fn default_database() -> String {
    Config::database_file().to_string_lossy().to_string()
}
fn default_scan_code_ttl() -> i64 {
    300
}
fn default_join_code_length() -> usize {
    10
}
fn default_join_code_retries() -> u32 {
    5
}
fn default_max_occurrences() -> u32 {
    366
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database: default_database(),
            scan_code_ttl_secs: default_scan_code_ttl(),
            join_code_length: default_join_code_length(),
            join_code_retries: default_join_code_retries(),
            max_occurrences: default_max_occurrences(),
            default_tz_offset_minutes: 0,
            late_after_minutes: None,
        }
    }
}

impl Config {
    /// `~/.rattendance`, or `./.rattendance` when no home directory is known.
    pub fn config_dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(APP_DIR)
    }

    pub fn config_file() -> PathBuf {
        Self::config_dir().join(CONFIG_NAME)
    }

    pub fn database_file() -> PathBuf {
        Self::config_dir().join(DB_NAME)
    }

    /// Load the configuration file; a missing file means all defaults.
    pub fn load() -> AppResult<Self> {
        Self::load_from(&Self::config_file())
    }

    pub fn load_from(path: &Path) -> AppResult<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    pub fn from_yaml(content: &str) -> AppResult<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        let cfg: Config = serde_yaml::from_str(content)
            .map_err(|e| AppError::Config(format!("cannot parse configuration: {e}")))?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> AppResult<()> {
        if self.scan_code_ttl_secs <= 0 {
            return Err(AppError::Config(
                "scan_code_ttl_secs must be positive".into(),
            ));
        }
        if self.join_code_length < 6 {
            return Err(AppError::Config(
                "join_code_length must be at least 6".into(),
            ));
        }
        if self.max_occurrences == 0 {
            return Err(AppError::Config("max_occurrences must be at least 1".into()));
        }
        if self.default_tz_offset_minutes.abs() >= 24 * 60 {
            return Err(AppError::Config(
                "default_tz_offset_minutes must be within ±1439".into(),
            ));
        }
        Ok(())
    }

    pub fn join_code_policy(&self) -> JoinCodePolicy {
        JoinCodePolicy {
            length: self.join_code_length,
            retries: self.join_code_retries,
        }
    }

    pub fn tz_offset_secs(&self) -> i64 {
        i64::from(self.default_tz_offset_minutes) * 60
    }

    pub fn to_yaml(&self) -> AppResult<String> {
        serde_yaml::to_string(self)
            .map_err(|e| AppError::Config(format!("cannot serialize configuration: {e}")))
    }

    /// Create the configuration directory, the configuration file and an
    /// empty database file. Returns the database path.
    ///
    /// In test mode the configuration file is left untouched.
    pub fn init_all(custom_db: Option<&str>, is_test: bool) -> AppResult<PathBuf> {
        let dir = Self::config_dir();

        let db_path = match custom_db {
            Some(name) if Path::new(name).is_absolute() => PathBuf::from(name),
            Some(name) if is_test => PathBuf::from(name),
            Some(name) => dir.join(name),
            None => dir.join(DB_NAME),
        };

        if !is_test {
            fs::create_dir_all(&dir)?;
            let config = Config {
                database: db_path.to_string_lossy().to_string(),
                ..Config::default()
            };
            let mut file = fs::File::create(Self::config_file())?;
            file.write_all(config.to_yaml()?.as_bytes())?;
        }

        if let Some(parent) = db_path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }
        if !db_path.exists() {
            fs::File::create(&db_path)?;
        }

        Ok(db_path)
    }
}
