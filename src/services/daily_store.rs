use crate::errors::{Result, TrackerError};
use crate::models::price::PriceRecord;
use crate::util;
use calamine::{open_workbook_auto, DataType, Reader};
use chrono::{Duration, NaiveDate};
use log::info;
use rust_xlsxwriter::Workbook;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

/// 输出文件表头，列顺序固定
pub const COLUMNS: [&str; 4] = ["City Name", "Price", "Date", "Month"];

#[derive(Debug, Clone, PartialEq)]
pub enum MergeOutcome {
    /// No new records; the file was not touched
    Skipped,
    Written { path: PathBuf, rows: usize },
}

/// 每日价格文件的读取、合并与保存
pub struct DailyStore {
    data_dir: PathBuf,
}

impl DailyStore {
    pub fn new(data_dir: &Path) -> Self {
        Self {
            data_dir: data_dir.to_path_buf(),
        }
    }

    pub fn daily_file_path(&self, day: &NaiveDate) -> PathBuf {
        self.data_dir
            .join(format!("daily_fuel_prices_{}.xlsx", day.format("%Y-%m-%d")))
    }

    /// Merge `new_records` into the file for `day` and rewrite it.
    ///
    /// Rows are deduplicated by (city, date); an incoming row replaces an existing one.
    /// Nothing is written when `new_records` is empty.
    pub fn merge_and_save(&self, new_records: &[PriceRecord], day: &NaiveDate) -> Result<MergeOutcome> {
        if new_records.is_empty() {
            info!("No new data fetched.");
            return Ok(MergeOutcome::Skipped);
        }

        let path = self.daily_file_path(day);
        let combined = if path.exists() {
            info!("Loading existing data from {}", path.display());
            let existing = read_records(&path)?;
            merge_records(existing, new_records.to_vec())
        } else {
            new_records.to_vec()
        };

        if !self.data_dir.exists() {
            info!("Data directory {} doesn't exist. Creating", self.data_dir.display());
            fs::create_dir_all(&self.data_dir)?;
        }

        write_records(&path, &combined)?;
        info!("File saved as: {}", path.display());

        Ok(MergeOutcome::Written {
            path,
            rows: combined.len(),
        })
    }
}

/// Concatenate `existing` and `incoming`, keeping the last row for each (city, date).
///
/// Surviving rows stay at the position of their last occurrence.
pub fn merge_records(existing: Vec<PriceRecord>, incoming: Vec<PriceRecord>) -> Vec<PriceRecord> {
    let combined: Vec<PriceRecord> = existing.into_iter().chain(incoming).collect();

    // 从后往前扫描，首次出现的键即为最后一次出现
    let keep = {
        let mut keep = vec![false; combined.len()];
        let mut seen = HashSet::new();
        for (i, record) in combined.iter().enumerate().rev() {
            keep[i] = seen.insert(record.key());
        }
        keep
    };

    combined
        .into_iter()
        .zip(keep)
        .filter_map(|(record, kept)| kept.then_some(record))
        .collect()
}

/// Read records from the first worksheet of a daily file, skipping the header row.
pub fn read_records(path: &Path) -> Result<Vec<PriceRecord>> {
    let mut workbook = open_workbook_auto(path)?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| TrackerError::DataError(format!("No worksheet in {}", path.display())))??;

    let mut records = Vec::new();
    for (i, row) in range.rows().enumerate().skip(1) {
        if row.iter().all(|cell| matches!(cell, DataType::Empty)) {
            continue;
        }

        let city = match row.first() {
            Some(DataType::String(s)) if !s.is_empty() => s.clone(),
            _ => return Err(TrackerError::DataError(format!("Row {}: missing City Name", i + 1))),
        };

        let price = match row.get(1) {
            Some(DataType::Float(f)) => *f,
            Some(DataType::Int(n)) => *n as f64,
            Some(DataType::String(s)) => s.trim().parse::<f64>().map_err(|_| {
                TrackerError::DataError(format!("Row {}: invalid Price {}", i + 1, s))
            })?,
            _ => return Err(TrackerError::DataError(format!("Row {}: missing Price", i + 1))),
        };

        let date = match row.get(2) {
            Some(DataType::String(s)) => util::parse_date_text(s)?,
            // 兼容以 Excel 日期单元格保存的旧文件
            Some(DataType::DateTime(serial)) => excel_serial_to_date(*serial)
                .ok_or_else(|| TrackerError::DataError(format!("Row {}: invalid Date {}", i + 1, serial)))?,
            _ => return Err(TrackerError::DataError(format!("Row {}: missing Date", i + 1))),
        };

        let mut record = PriceRecord::new(&city, price, date);
        if let Some(DataType::String(month)) = row.get(3) {
            record.month = month.clone();
        }
        records.push(record);
    }

    Ok(records)
}

/// Write `records` to `path`, fully replacing it.
///
/// The workbook is written to a sibling temp file and renamed over `path`, so a failed
/// write leaves the previous file as it was.
pub fn write_records(path: &Path, records: &[PriceRecord]) -> Result<()> {
    let mut workbook = Workbook::new();
    {
        let worksheet = workbook.add_worksheet();
        for (col, name) in COLUMNS.iter().enumerate() {
            worksheet.write_string(0, col as u16, *name)?;
        }

        for (i, record) in records.iter().enumerate() {
            let row = u32::try_from(i + 1)
                .map_err(|_| TrackerError::DataError(format!("Too many rows: {}", records.len())))?;
            worksheet.write_string(row, 0, record.city.as_str())?;
            worksheet.write_number(row, 1, record.price)?;
            worksheet.write_string(row, 2, &record.date_text())?;
            worksheet.write_string(row, 3, record.month.as_str())?;
        }
    }

    let bytes = workbook.save_to_buffer()?;
    let tmp_path = temp_path(path);
    if let Err(e) = fs::write(&tmp_path, &bytes).and_then(|_| fs::rename(&tmp_path, path)) {
        let _ = fs::remove_file(&tmp_path);
        return Err(e.into());
    }
    Ok(())
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

/// Excel 日期序列号允许的最大值 (9999-12-31)
const MAX_EXCEL_SERIAL: f64 = 2_958_465.0;

fn excel_serial_to_date(serial: f64) -> Option<NaiveDate> {
    if !serial.is_finite() || !(0.0..=MAX_EXCEL_SERIAL).contains(&serial) {
        return None;
    }
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)?;
    epoch.checked_add_signed(Duration::try_days(serial.trunc() as i64)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_xlsxwriter::Format;
    use tempfile::tempdir;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn run_day() -> NaiveDate {
        day(2024, 3, 5)
    }

    #[test]
    fn test_daily_file_path() {
        let store = DailyStore::new(Path::new("/data"));
        assert_eq!(
            store.daily_file_path(&run_day()),
            PathBuf::from("/data/daily_fuel_prices_2024-03-05.xlsx")
        );
    }

    #[test]
    fn test_merge_records_new_row_wins() {
        let existing = vec![
            PriceRecord::new("Delhi", 87.62, day(2024, 3, 1)),
            PriceRecord::new("Mumbai", 92.15, day(2024, 3, 1)),
        ];
        let incoming = vec![PriceRecord::new("Delhi", 88.00, day(2024, 3, 1))];

        let merged = merge_records(existing, incoming);

        assert_eq!(
            merged,
            vec![
                PriceRecord::new("Mumbai", 92.15, day(2024, 3, 1)),
                PriceRecord::new("Delhi", 88.00, day(2024, 3, 1)),
            ]
        );
    }

    #[test]
    fn test_empty_records_leave_file_untouched() {
        let dir = tempdir().unwrap();
        let data_dir = dir.path().join("prices");
        let store = DailyStore::new(&data_dir);

        let outcome = store.merge_and_save(&[], &run_day()).unwrap();

        assert_eq!(outcome, MergeOutcome::Skipped);
        assert!(!store.daily_file_path(&run_day()).exists());
    }

    #[test]
    fn test_empty_records_do_not_truncate_existing_file() {
        let dir = tempdir().unwrap();
        let store = DailyStore::new(dir.path());
        let records = vec![PriceRecord::new("Chennai", 92.34, day(2024, 3, 4))];
        store.merge_and_save(&records, &run_day()).unwrap();

        let path = store.daily_file_path(&run_day());
        let before = fs::read(&path).unwrap();
        store.merge_and_save(&[], &run_day()).unwrap();

        assert_eq!(fs::read(&path).unwrap(), before);
    }

    #[test]
    fn test_creates_directory_and_file() {
        let dir = tempdir().unwrap();
        let data_dir = dir.path().join("nested").join("prices");
        let store = DailyStore::new(&data_dir);
        let records = vec![PriceRecord::new("Mumbai", 95.5, day(2024, 1, 10))];

        let outcome = store.merge_and_save(&records, &run_day()).unwrap();
        let path = store.daily_file_path(&run_day());

        assert_eq!(outcome, MergeOutcome::Written { path: path.clone(), rows: 1 });

        let saved = read_records(&path).unwrap();
        assert_eq!(saved, records);
        assert_eq!(saved[0].date_text(), "10/01/2024");
        assert_eq!(saved[0].month, "January-2024");
    }

    #[test]
    fn test_written_layout() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("layout.xlsx");
        write_records(&path, &[PriceRecord::new("Mumbai", 95.5, day(2024, 1, 10))]).unwrap();

        let mut workbook = open_workbook_auto(&path).unwrap();
        let range = workbook.worksheet_range_at(0).unwrap().unwrap();
        let rows: Vec<&[DataType]> = range.rows().collect();

        assert_eq!(rows.len(), 2);
        let header: Vec<String> = rows[0].iter().map(|c| c.to_string()).collect();
        assert_eq!(header, COLUMNS);
        assert_eq!(rows[1][0], DataType::String("Mumbai".to_string()));
        assert_eq!(rows[1][1], DataType::Float(95.5));
        assert_eq!(rows[1][2], DataType::String("10/01/2024".to_string()));
        assert_eq!(rows[1][3], DataType::String("January-2024".to_string()));
    }

    #[test]
    fn test_existing_file_is_deduplicated() {
        let dir = tempdir().unwrap();
        let store = DailyStore::new(dir.path());
        let first_run = vec![
            PriceRecord::new("Delhi", 87.62, day(2024, 3, 1)),
            PriceRecord::new("Delhi", 87.70, day(2024, 3, 2)),
        ];
        store.merge_and_save(&first_run, &run_day()).unwrap();

        let second_run = vec![
            PriceRecord::new("Delhi", 89.00, day(2024, 3, 1)),
            PriceRecord::new("Delhi", 87.90, day(2024, 3, 3)),
        ];
        let outcome = store.merge_and_save(&second_run, &run_day()).unwrap();
        assert!(matches!(outcome, MergeOutcome::Written { rows: 3, .. }));

        let saved = read_records(&store.daily_file_path(&run_day())).unwrap();
        let delhi_first: Vec<&PriceRecord> = saved.iter().filter(|r| r.date == day(2024, 3, 1)).collect();
        assert_eq!(delhi_first.len(), 1);
        assert_eq!(delhi_first[0].price, 89.00);
    }

    #[test]
    fn test_merge_is_idempotent() {
        let dir = tempdir().unwrap();
        let store = DailyStore::new(dir.path());
        store
            .merge_and_save(&[PriceRecord::new("Pune", 90.10, day(2024, 3, 1))], &run_day())
            .unwrap();

        let new_data = vec![
            PriceRecord::new("Pune", 90.40, day(2024, 3, 1)),
            PriceRecord::new("Pune", 90.55, day(2024, 3, 2)),
        ];
        let path = store.daily_file_path(&run_day());

        store.merge_and_save(&new_data, &run_day()).unwrap();
        let once = read_records(&path).unwrap();
        store.merge_and_save(&new_data, &run_day()).unwrap();
        let twice = read_records(&path).unwrap();

        assert_eq!(once, twice);
        assert_eq!(twice.len(), 2);
    }

    #[test]
    fn test_malformed_existing_file_is_an_error() {
        let dir = tempdir().unwrap();
        let store = DailyStore::new(dir.path());
        let path = store.daily_file_path(&run_day());
        fs::write(&path, b"this is not a workbook").unwrap();

        let result = store.merge_and_save(&[PriceRecord::new("Pune", 90.10, day(2024, 3, 1))], &run_day());

        assert!(result.is_err());
        assert_eq!(fs::read(&path).unwrap(), b"this is not a workbook");
    }

    #[test]
    fn test_excel_serial_to_date() {
        assert_eq!(excel_serial_to_date(45352.0), Some(day(2024, 3, 1)));
        assert_eq!(excel_serial_to_date(1.0e15), None);
        assert_eq!(excel_serial_to_date(-1.0), None);
        assert_eq!(excel_serial_to_date(f64::NAN), None);
        assert_eq!(excel_serial_to_date(f64::INFINITY), None);
    }

    #[test]
    fn test_out_of_range_date_cell_is_an_error() {
        let dir = tempdir().unwrap();
        let store = DailyStore::new(dir.path());
        let path = store.daily_file_path(&run_day());

        let mut workbook = Workbook::new();
        {
            let date_format = Format::new().set_num_format("dd/mm/yyyy");
            let worksheet = workbook.add_worksheet();
            for (col, name) in COLUMNS.iter().enumerate() {
                worksheet.write_string(0, col as u16, *name).unwrap();
            }
            worksheet.write_string(1, 0, "Delhi").unwrap();
            worksheet.write_number(1, 1, 87.62).unwrap();
            worksheet.write_number_with_format(1, 2, 1.0e15, &date_format).unwrap();
            worksheet.write_string(1, 3, "March-2024").unwrap();
        }
        workbook.save(&path).unwrap();
        let before = fs::read(&path).unwrap();

        let result = store.merge_and_save(&[PriceRecord::new("Delhi", 88.0, day(2024, 3, 1))], &run_day());

        assert!(matches!(result, Err(TrackerError::DataError(_))));
        assert_eq!(fs::read(&path).unwrap(), before);
    }

    #[test]
    fn test_failed_write_keeps_previous_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("daily.xlsx");
        write_records(&path, &[PriceRecord::new("Pune", 90.10, day(2024, 3, 1))]).unwrap();
        let before = fs::read(&path).unwrap();

        // 临时文件路径被目录占用，写入必然失败
        fs::create_dir(temp_path(&path)).unwrap();
        let result = write_records(&path, &[PriceRecord::new("Pune", 91.00, day(2024, 3, 2))]);

        assert!(matches!(result, Err(TrackerError::IoError(_))));
        assert_eq!(fs::read(&path).unwrap(), before);
    }

    #[test]
    fn test_write_leaves_no_temp_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("daily.xlsx");
        write_records(&path, &[PriceRecord::new("Pune", 90.10, day(2024, 3, 1))]).unwrap();

        assert!(path.exists());
        assert!(!temp_path(&path).exists());
    }
}
