use chrono::NaiveTime;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use std::time::Duration;
use crate::errors::{Result, TrackerError};

/// 默认配置文件位置，可通过环境变量覆盖
pub const DEFAULT_CONFIG_PATH: &str = "config.json";
pub const CONFIG_PATH_ENV: &str = "FUEL_TRACKER_CONFIG";

const DEFAULT_API_HOST: &str = "www.livemint.com";
const DEFAULT_FUEL_TYPE: &str = "diesel";
const DEFAULT_HISTORY_DAYS: u32 = 365;
const DEFAULT_LOG_FILE: &str = "fuel_price_tracker.log";

/// Immutable configuration loaded once at startup from a flat JSON document.
#[derive(Debug, Clone)]
pub struct Config {
    values: Map<String, Value>,
    cities: Vec<String>,
    data_dir: PathBuf,
    api_host: String,
    fuel_type: String,
    history_days: u32,
    log_file: PathBuf,
    schedule_time: NaiveTime,
    request_timeout: Option<Duration>,
}

impl Config {
    /// 配置文件路径：优先使用 FUEL_TRACKER_CONFIG
    pub fn default_path() -> PathBuf {
        std::env::var_os(CONFIG_PATH_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    pub fn from_json_str(text: &str) -> Result<Self> {
        let values = match serde_json::from_str::<Value>(text)? {
            Value::Object(map) => map,
            _ => return Err(TrackerError::ConfigError("Configuration must be a JSON object".to_string())),
        };

        let cities = match values.get("CITIES") {
            Some(Value::Array(items)) => items
                .iter()
                .map(|item| {
                    item.as_str()
                        .map(str::to_string)
                        .ok_or_else(|| TrackerError::ConfigError(format!("CITIES entries must be strings, got {}", item)))
                })
                .collect::<Result<Vec<_>>>()?,
            Some(other) => return Err(TrackerError::ConfigError(format!("CITIES must be a list, got {}", other))),
            None => return Err(TrackerError::ConfigError("Missing required key CITIES".to_string())),
        };

        let data_dir = values
            .get("DATA_DIR")
            .ok_or_else(|| TrackerError::ConfigError("Missing required key DATA_DIR".to_string()))?
            .as_str()
            .map(PathBuf::from)
            .ok_or_else(|| TrackerError::ConfigError("DATA_DIR must be a string".to_string()))?;

        let api_host = optional_str(&values, "API_HOST")?.unwrap_or(DEFAULT_API_HOST).to_string();
        let fuel_type = optional_str(&values, "FUEL_TYPE")?.unwrap_or(DEFAULT_FUEL_TYPE).to_string();
        let log_file = PathBuf::from(optional_str(&values, "LOG_FILE")?.unwrap_or(DEFAULT_LOG_FILE));

        let history_days = match optional_u64(&values, "HISTORY_DAYS")? {
            Some(days) => u32::try_from(days)
                .map_err(|_| TrackerError::ConfigError(format!("HISTORY_DAYS out of range: {}", days)))?,
            None => DEFAULT_HISTORY_DAYS,
        };

        let schedule_time = match optional_str(&values, "SCHEDULE_TIME")? {
            Some(s) => NaiveTime::parse_from_str(s, "%H:%M")
                .map_err(|e| TrackerError::ConfigError(format!("Invalid SCHEDULE_TIME {}: {}", s, e)))?,
            None => NaiveTime::MIN,
        };

        let request_timeout = optional_u64(&values, "REQUEST_TIMEOUT_SECS")?.map(Duration::from_secs);

        Ok(Self {
            values,
            cities,
            data_dir,
            api_host,
            fuel_type,
            history_days,
            log_file,
            schedule_time,
            request_timeout,
        })
    }

    /// Raw lookup of a configuration key; `None` when absent.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    pub fn cities(&self) -> &[String] {
        &self.cities
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn api_host(&self) -> &str {
        &self.api_host
    }

    pub fn fuel_type(&self) -> &str {
        &self.fuel_type
    }

    pub fn history_days(&self) -> u32 {
        self.history_days
    }

    pub fn log_file(&self) -> &Path {
        &self.log_file
    }

    pub fn schedule_time(&self) -> NaiveTime {
        self.schedule_time
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout
    }

    pub fn with_data_dir(mut self, dir: &Path) -> Self {
        self.data_dir = dir.to_path_buf();
        self
    }

    pub fn with_api_host(mut self, host: &str) -> Self {
        self.api_host = host.to_string();
        self
    }

    pub fn with_cities(mut self, cities: Vec<String>) -> Self {
        self.cities = cities;
        self
    }
}

fn optional_str<'a>(values: &'a Map<String, Value>, key: &str) -> Result<Option<&'a str>> {
    match values.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.as_str())),
        Some(other) => Err(TrackerError::ConfigError(format!("{} must be a string, got {}", key, other))),
    }
}

fn optional_u64(values: &Map<String, Value>, key: &str) -> Result<Option<u64>> {
    match values.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => value
            .as_u64()
            .map(Some)
            .ok_or_else(|| TrackerError::ConfigError(format!("{} must be a non-negative integer, got {}", key, value))),
    }
}
