use crate::config::Config;
use crate::errors::{FetchError, Result, TrackerError};
use crate::models::price::PriceRecord;
use crate::scrapers::base::PriceScraper;
use crate::util;
use async_trait::async_trait;
use log::{debug, info};
use reqwest::{Client, StatusCode};
use serde::Deserialize;

/// Livemint 燃油价格历史数据抓取器
pub struct LivemintScraper {
    client: Client,
    base_url: String,
    fuel_type: String,
    history_days: u32,
}

impl LivemintScraper {
    /// 根据配置创建抓取器，未配置超时则不设置
    pub fn new(config: &Config) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.request_timeout() {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| TrackerError::FetchError(FetchError::Request(e)))?;

        Ok(Self {
            client,
            base_url: base_url(config.api_host()),
            fuel_type: config.fuel_type().to_string(),
            history_days: config.history_days(),
        })
    }

    pub fn history_url(&self, city: &str) -> String {
        format!(
            "{}/api/cms/fuelprice/gethistoricaldata/city/{}/{}/{}",
            self.base_url,
            self.fuel_type,
            util::normalize_city(city),
            self.history_days
        )
    }
}

// API_HOST 可带协议（如 http://127.0.0.1:8080），否则默认使用 https
fn base_url(api_host: &str) -> String {
    let host = api_host.trim_end_matches('/');
    if host.contains("://") {
        host.to_string()
    } else {
        format!("https://{}", host)
    }
}

/// 接口返回数组中的单个元素，其余字段忽略
#[derive(Debug, Deserialize)]
struct HistoryItem {
    date: String,
    price: RawPrice,
}

// 价格可能是数字也可能是字符串
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawPrice {
    Number(f64),
    Text(String),
}

/// Convert a history response body into records for `city`, sorted ascending by date.
///
/// Any malformed element fails the whole body; no partial data is returned.
pub fn parse_history(city: &str, body: &str) -> std::result::Result<Vec<PriceRecord>, FetchError> {
    let items: Vec<HistoryItem> = serde_json::from_str(body)?;

    let mut records = items
        .into_iter()
        .map(|item| {
            let date = util::parse_source_date(&item.date).map_err(|e| FetchError::Parse(e.to_string()))?;
            let price = match item.price {
                RawPrice::Number(n) => n,
                RawPrice::Text(s) => s
                    .trim()
                    .parse::<f64>()
                    .map_err(|_| FetchError::Parse(format!("Invalid price: {}", s)))?,
            };
            Ok(PriceRecord::new(city, price, date))
        })
        .collect::<std::result::Result<Vec<_>, FetchError>>()?;

    records.sort_by(|a, b| a.date.cmp(&b.date));
    Ok(records)
}

#[async_trait]
impl PriceScraper for LivemintScraper {
    fn source_name(&self) -> &'static str {
        "livemint"
    }

    async fn fetch_city_prices(&self, city: &str) -> std::result::Result<Vec<PriceRecord>, FetchError> {
        info!("Trying to fetch data for city: {}", city);
        if city.trim().is_empty() {
            return Err(FetchError::InvalidCity);
        }

        let url = self.history_url(city);
        debug!("GET {}", url);

        let response = self.client.get(&url).send().await?;
        let status = response.status();
        info!("Response code: {}", status.as_u16());

        if status != StatusCode::OK {
            return Err(FetchError::Status(status.as_u16()));
        }

        let body = response.text().await?;
        let records = parse_history(city, &body)?;

        info!("Got data for {}. Records: {}", city, records.len());
        Ok(records)
    }
}
