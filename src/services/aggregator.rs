use crate::models::price::PriceRecord;
use crate::scrapers::base::PriceScraper;
use log::{error, info};
use std::sync::Arc;

/// 依次抓取所有城市并合并成功的结果
pub struct Aggregator {
    scraper: Arc<dyn PriceScraper + Send + Sync>,
}

impl Aggregator {
    pub fn new(scraper: Arc<dyn PriceScraper + Send + Sync>) -> Self {
        Self { scraper }
    }

    /// Fetch every city in order, one at a time.
    ///
    /// Failed cities are logged and skipped. The result is ordered by city name then date,
    /// and is empty (not an error) when no city produced data.
    pub async fn collect(&self, cities: &[String]) -> Vec<PriceRecord> {
        info!("Getting data for the following cities: {:?}", cities);

        let mut all_records = Vec::new();
        for city in cities {
            match self.scraper.fetch_city_prices(city).await {
                Ok(records) => all_records.extend(records),
                Err(e) => {
                    error!("Error fetching data for city: {}. Error: {}", city, e);
                }
            }
        }

        if all_records.is_empty() {
            info!("No data fetched for any city");
            return all_records;
        }

        all_records.sort_by(|a, b| a.city.cmp(&b.city).then(a.date.cmp(&b.date)));
        info!("Fetched and sorted data for all cities from {}", self.scraper.source_name());
        all_records
    }
}
