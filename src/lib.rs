// 公开导出的模块，供外部使用
pub mod models;
pub mod errors;
pub mod config;
pub mod logger;
pub mod scrapers;
pub mod services;
pub mod util;

// 重新导出常用类型，方便使用
pub use models::price::PriceRecord;
pub use config::Config;
pub use errors::{Result, TrackerError, FetchError};
pub use services::fuel_service::FuelPriceService;
