use chrono::NaiveDate;
use crate::errors::{Result, TrackerError};

/// 文件中日期列的文本格式
pub const DATE_TEXT_FORMAT: &str = "%d/%m/%Y";

// 城市名转换为接口路径片段：空格替换为连字符并转为小写
pub fn normalize_city(city: &str) -> String {
    city.replace(' ', "-").to_lowercase()
}

/// Parse a date string as served by the price API.
///
/// Accepts `YYYY-MM-DD`, optionally followed by a time part (`2024-03-01T00:00:00`).
pub fn parse_source_date(date_str: &str) -> Result<NaiveDate> {
    let trimmed = date_str.trim();
    let date_part = trimmed
        .split(|c: char| c == 'T' || c == ' ')
        .next()
        .unwrap_or(trimmed);

    NaiveDate::parse_from_str(date_part, "%Y-%m-%d")
        .map_err(|_| TrackerError::DataError(format!("Invalid date format: {}", date_str)))
}

// 日期转换为 dd/mm/YYYY 文本
pub fn format_date_text(date: &NaiveDate) -> String {
    date.format(DATE_TEXT_FORMAT).to_string()
}

pub fn parse_date_text(text: &str) -> Result<NaiveDate> {
    Ok(NaiveDate::parse_from_str(text.trim(), DATE_TEXT_FORMAT)?)
}

/// Full month name and four-digit year, e.g. `March-2024`.
pub fn month_label(date: &NaiveDate) -> String {
    date.format("%B-%Y").to_string()
}
