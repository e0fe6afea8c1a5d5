//! Daily price bar and validated per-symbol bar series.

use chrono::NaiveDate;

#[derive(Debug, Clone, PartialEq)]
pub struct PriceBar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: i64,
}

impl PriceBar {
    /// close * volume, the daily traded value used as a liquidity proxy for
    /// universe ranking and admission tie-breaking.
    pub fn turnover(&self) -> f64 {
        self.close * self.volume as f64
    }
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum SeriesError {
    #[error("{symbol}: bars out of order at {date} (previous {prev})")]
    OutOfOrder {
        symbol: String,
        date: NaiveDate,
        prev: NaiveDate,
    },

    #[error("{symbol}: non-positive price at {date}")]
    NonPositivePrice { symbol: String, date: NaiveDate },

    #[error("{symbol}: negative volume at {date}")]
    NegativeVolume { symbol: String, date: NaiveDate },
}

/// An ordered, validated sequence of daily bars for one symbol.
///
/// Validation happens once at construction: strictly increasing dates (which
/// also rules out duplicates), positive prices, non-negative volume. Every
/// consumer downstream can index the series without re-checking.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceSeries {
    symbol: String,
    bars: Vec<PriceBar>,
}

impl PriceSeries {
    pub fn new(symbol: impl Into<String>, bars: Vec<PriceBar>) -> Result<Self, SeriesError> {
        let symbol = symbol.into();
        for (i, bar) in bars.iter().enumerate() {
            if i > 0 && bar.date <= bars[i - 1].date {
                return Err(SeriesError::OutOfOrder {
                    symbol,
                    date: bar.date,
                    prev: bars[i - 1].date,
                });
            }
            if bar.open <= 0.0 || bar.high <= 0.0 || bar.low <= 0.0 || bar.close <= 0.0 {
                return Err(SeriesError::NonPositivePrice {
                    symbol,
                    date: bar.date,
                });
            }
            if bar.volume < 0 {
                return Err(SeriesError::NegativeVolume {
                    symbol,
                    date: bar.date,
                });
            }
        }
        Ok(PriceSeries { symbol, bars })
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn bars(&self) -> &[PriceBar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&PriceBar> {
        self.bars.get(index)
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.bars.first().map(|b| b.date)
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.bars.last().map(|b| b.date)
    }

    /// Index of the bar on `date`, if the symbol traded that day.
    pub fn index_of(&self, date: NaiveDate) -> Option<usize> {
        self.bars.binary_search_by_key(&date, |b| b.date).ok()
    }

    /// Bars with `start <= date <= end`, as a new series.
    pub fn window(&self, start: NaiveDate, end: NaiveDate) -> PriceSeries {
        let bars = self
            .bars
            .iter()
            .filter(|b| b.date >= start && b.date <= end)
            .cloned()
            .collect();
        // Ordering invariants are inherited from self.
        PriceSeries {
            symbol: self.symbol.clone(),
            bars,
        }
    }

    /// Bars with `date <= as_of`, as a new series.
    pub fn up_to(&self, as_of: NaiveDate) -> PriceSeries {
        let bars = self
            .bars
            .iter()
            .filter(|b| b.date <= as_of)
            .cloned()
            .collect();
        PriceSeries {
            symbol: self.symbol.clone(),
            bars,
        }
    }
}
