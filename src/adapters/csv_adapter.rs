//! CSV file data adapter. One `SYMBOL.csv` per symbol with a
//! `date,open,high,low,close,volume` header.

use crate::domain::bar::{PriceBar, PriceSeries};
use crate::domain::error::GaptraderError;
use crate::ports::data_port::DataPort;
use chrono::NaiveDate;
use std::fs;
use std::path::PathBuf;

pub struct CsvAdapter {
    base_path: PathBuf,
}

impl CsvAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn csv_path(&self, symbol: &str) -> PathBuf {
        self.base_path.join(format!("{symbol}.csv"))
    }
}

fn bad_data(path: &PathBuf, reason: impl ToString) -> GaptraderError {
    GaptraderError::DataFormat {
        file: path.display().to_string(),
        reason: reason.to_string(),
    }
}

fn field<'a>(
    record: &'a csv::StringRecord,
    index: usize,
    name: &str,
    path: &PathBuf,
) -> Result<&'a str, GaptraderError> {
    record
        .get(index)
        .ok_or_else(|| bad_data(path, format!("missing {name} column")))
}

impl DataPort for CsvAdapter {
    fn fetch_series(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<PriceSeries, GaptraderError> {
        let path = self.csv_path(symbol);
        let content = fs::read_to_string(&path).map_err(|_| GaptraderError::NoData {
            symbol: symbol.to_string(),
        })?;

        let mut rdr = csv::Reader::from_reader(content.as_bytes());
        let mut bars = Vec::new();

        for result in rdr.records() {
            let record = result.map_err(|e| bad_data(&path, e))?;

            let date = NaiveDate::parse_from_str(field(&record, 0, "date", &path)?, "%Y-%m-%d")
                .map_err(|e| bad_data(&path, format!("invalid date: {e}")))?;
            if date < start || date > end {
                continue;
            }

            let open: f64 = field(&record, 1, "open", &path)?
                .parse()
                .map_err(|e| bad_data(&path, format!("invalid open: {e}")))?;
            let high: f64 = field(&record, 2, "high", &path)?
                .parse()
                .map_err(|e| bad_data(&path, format!("invalid high: {e}")))?;
            let low: f64 = field(&record, 3, "low", &path)?
                .parse()
                .map_err(|e| bad_data(&path, format!("invalid low: {e}")))?;
            let close: f64 = field(&record, 4, "close", &path)?
                .parse()
                .map_err(|e| bad_data(&path, format!("invalid close: {e}")))?;
            let volume: i64 = field(&record, 5, "volume", &path)?
                .parse()
                .map_err(|e| bad_data(&path, format!("invalid volume: {e}")))?;

            bars.push(PriceBar {
                date,
                open,
                high,
                low,
                close,
                volume,
            });
        }

        bars.sort_by_key(|b| b.date);
        Ok(PriceSeries::new(symbol, bars)?)
    }

    fn list_symbols(&self) -> Result<Vec<String>, GaptraderError> {
        let entries = fs::read_dir(&self.base_path)?;
        let mut symbols = Vec::new();

        for entry in entries {
            let name = entry?.file_name();
            let name_str = name.to_string_lossy();
            if let Some(symbol) = name_str.strip_suffix(".csv") {
                symbols.push(symbol.to_string());
            }
        }

        symbols.sort();
        Ok(symbols)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn setup_test_data() -> (TempDir, PathBuf) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().to_path_buf();

        let csv_content = "date,open,high,low,close,volume\n\
            2024-01-15,100.0,110.0,90.0,105.0,50000\n\
            2024-01-16,105.0,115.0,100.0,110.0,60000\n\
            2024-01-17,110.0,120.0,105.0,115.0,55000\n";

        fs::write(path.join("BHP.csv"), csv_content).unwrap();
        fs::write(path.join("CBA.csv"), "date,open,high,low,close,volume\n").unwrap();
        fs::write(path.join("notes.txt"), "not a csv\n").unwrap();

        (dir, path)
    }

    #[test]
    fn fetch_series_returns_validated_bars() {
        let (_dir, path) = setup_test_data();
        let adapter = CsvAdapter::new(path);

        let start = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();
        let end = NaiveDate::from_ymd_opt(2024, 1, 17).unwrap();
        let series = adapter.fetch_series("BHP", start, end).unwrap();

        assert_eq!(series.len(), 3);
        assert_eq!(series.symbol(), "BHP");
        let first = series.get(0).unwrap();
        assert_eq!(first.date, start);
        assert_eq!(first.open, 100.0);
        assert_eq!(first.volume, 50000);
    }

    #[test]
    fn fetch_series_filters_by_date() {
        let (_dir, path) = setup_test_data();
        let adapter = CsvAdapter::new(path);

        let day = NaiveDate::from_ymd_opt(2024, 1, 16).unwrap();
        let series = adapter.fetch_series("BHP", day, day).unwrap();
        assert_eq!(series.len(), 1);
    }

    #[test]
    fn missing_file_is_no_data() {
        let (_dir, path) = setup_test_data();
        let adapter = CsvAdapter::new(path);

        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(2024, 1, 31).unwrap();
        let result = adapter.fetch_series("XYZ", start, end);
        assert!(matches!(
            result,
            Err(GaptraderError::NoData { symbol }) if symbol == "XYZ"
        ));
    }

    #[test]
    fn malformed_row_is_a_data_format_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().to_path_buf();
        fs::write(
            path.join("BAD.csv"),
            "date,open,high,low,close,volume\n2024-01-15,abc,110,90,105,50000\n",
        )
        .unwrap();

        let adapter = CsvAdapter::new(path);
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(2024, 1, 31).unwrap();
        assert!(matches!(
            adapter.fetch_series("BAD", start, end),
            Err(GaptraderError::DataFormat { .. })
        ));
    }

    #[test]
    fn negative_price_fails_series_validation() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().to_path_buf();
        fs::write(
            path.join("NEG.csv"),
            "date,open,high,low,close,volume\n2024-01-15,-1.0,110,90,105,50000\n",
        )
        .unwrap();

        let adapter = CsvAdapter::new(path);
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(2024, 1, 31).unwrap();
        assert!(matches!(
            adapter.fetch_series("NEG", start, end),
            Err(GaptraderError::Series(_))
        ));
    }

    #[test]
    fn list_symbols_returns_sorted_csv_stems() {
        let (_dir, path) = setup_test_data();
        let adapter = CsvAdapter::new(path);
        assert_eq!(adapter.list_symbols().unwrap(), vec!["BHP", "CBA"]);
    }
}
