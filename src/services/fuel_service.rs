use crate::config::Config;
use crate::errors::Result;
use crate::scrapers::base::PriceScraper;
use crate::services::aggregator::Aggregator;
use crate::services::daily_store::{DailyStore, MergeOutcome};
use chrono::NaiveDate;
use log::{error, info};
use std::sync::Arc;

/// 燃油价格服务：抓取、合并并保存当日数据
pub struct FuelPriceService {
    config: Config,
    aggregator: Aggregator,
    store: DailyStore,
}

impl FuelPriceService {
    pub fn new(config: Config, scraper: Arc<dyn PriceScraper + Send + Sync>) -> Self {
        let store = DailyStore::new(config.data_dir());
        Self {
            config,
            aggregator: Aggregator::new(scraper),
            store,
        }
    }

    pub fn store(&self) -> &DailyStore {
        &self.store
    }

    /// Fetch all configured cities and merge them into the file for `day`.
    pub async fn fetch_and_save(&self, day: &NaiveDate) -> Result<MergeOutcome> {
        let records = self.aggregator.collect(self.config.cities()).await;
        self.store.merge_and_save(&records, day)
    }

    /// One scheduled run. Errors are logged, never returned.
    pub async fn run_job(&self, day: &NaiveDate) {
        info!("Job started");
        if let Err(e) = self.fetch_and_save(day).await {
            error!("Something went wrong. Error: {}", e);
        }
        info!("Job completed");
    }

    pub async fn run_job_today(&self) {
        let today = chrono::Local::now().date_naive();
        self.run_job(&today).await;
    }
}
