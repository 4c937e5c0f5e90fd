use thiserror::Error;

/// 单个城市抓取失败的原因
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("City name must not be empty")]
    InvalidCity,

    #[error("HTTP Response Code: {0}")]
    Status(u16),

    #[error("HTTP request error: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Response parsing error: {0}")]
    Parse(String),
}

impl From<serde_json::Error> for FetchError {
    fn from(e: serde_json::Error) -> Self {
        FetchError::Parse(e.to_string())
    }
}

#[derive(Error, Debug)]
pub enum TrackerError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON parsing error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Date parsing error: {0}")]
    DateError(#[from] chrono::ParseError),

    #[error("Excel parsing error: {0}")]
    ExcelError(#[from] calamine::Error),

    #[error("Excel writing error: {0}")]
    XlsxWriteError(#[from] rust_xlsxwriter::XlsxError),

    #[error("Logger error: {0}")]
    LoggerError(String),

    #[error("Fetch error: {0}")]
    FetchError(#[from] FetchError),

    #[error("Data error: {0}")]
    DataError(String),
}

pub type Result<T> = std::result::Result<T, TrackerError>;

impl From<log::SetLoggerError> for TrackerError {
    fn from(e: log::SetLoggerError) -> Self {
        TrackerError::LoggerError(e.to_string())
    }
}
