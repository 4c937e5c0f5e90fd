use crate::models::price::PriceRecord;
use crate::errors::FetchError;
use async_trait::async_trait;

/// Base trait for fuel price sources
#[async_trait]
pub trait PriceScraper {
    /// Name of the upstream source, used in log lines
    fn source_name(&self) -> &'static str;

    /// Fetch the price history of one city.
    /// Records carry the city name as supplied and are sorted ascending by date.
    async fn fetch_city_prices(&self, city: &str) -> Result<Vec<PriceRecord>, FetchError>;
}
