use fuel_price_tracker::config::Config;
use fuel_price_tracker::logger;
use fuel_price_tracker::scrapers::livemint::LivemintScraper;
use fuel_price_tracker::services::fuel_service::FuelPriceService;
use fuel_price_tracker::services::scheduler::{DailyScheduler, POLL_INTERVAL};

use chrono::Local;
use log::info;
use std::error::Error;
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    println!("Script started");

    // 配置缺失或格式错误时直接退出
    let config_path = Config::default_path();
    let config = Config::load(&config_path)
        .map_err(|e| format!("Failed to load configuration from {}: {}", config_path.display(), e))?;

    logger::init_logger(config.log_file())?;
    info!("Loaded configuration from {}", config_path.display());
    info!("Tracking {} cities, data directory: {}", config.cities().len(), config.data_dir().display());

    let scraper = Arc::new(LivemintScraper::new(&config)?);
    let run_at = config.schedule_time();
    let service = FuelPriceService::new(config, scraper);

    // 启动时立即执行一次
    service.run_job_today().await;

    let mut scheduler = DailyScheduler::new(run_at, Local::now().naive_local());
    scheduler
        .run_forever(|| service.run_job_today(), POLL_INTERVAL)
        .await;

    Ok(())
}
