use chrono::NaiveDate;
use crate::util;

/// 单条价格记录，唯一键为 (城市, 日期)
#[derive(Debug, Clone, PartialEq)]
pub struct PriceRecord {
    pub city: String,
    pub price: f64,
    pub date: NaiveDate,
    pub month: String,  // 例如 "March-2024"
}

impl PriceRecord {
    /// Build a record, deriving the month label from the date.
    pub fn new(city: &str, price: f64, date: NaiveDate) -> Self {
        Self {
            city: city.to_string(),
            price,
            month: util::month_label(&date),
            date,
        }
    }

    pub fn date_text(&self) -> String {
        util::format_date_text(&self.date)
    }

    pub fn key(&self) -> (&str, NaiveDate) {
        (self.city.as_str(), self.date)
    }
}
