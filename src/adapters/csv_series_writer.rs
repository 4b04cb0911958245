//! Aligned return series export.
//!
//! One row per common date: `Date,<ticker returns...>,Portfolio,Portfolio_Dollars`.
//! Ticker cells on the base row are empty.

use crate::domain::aligned::AlignedReturnSeries;
use crate::domain::error::GrowthfolioError;
use std::io::Write;
use std::path::Path;

pub fn write_series<W: Write>(writer: W, series: &AlignedReturnSeries) -> Result<(), GrowthfolioError> {
    let mut wtr = csv::Writer::from_writer(writer);
    let to_io = |e: csv::Error| GrowthfolioError::Io(e.into());

    let mut header = vec!["Date".to_string()];
    header.extend(series.tickers().iter().cloned());
    header.push("Portfolio".to_string());
    header.push("Portfolio_Dollars".to_string());
    wtr.write_record(&header).map_err(to_io)?;

    for row in series.rows() {
        let mut record = Vec::with_capacity(header.len());
        record.push(row.date.format("%Y-%m-%d").to_string());
        match &row.returns {
            Some(returns) => record.extend(returns.iter().map(|r| r.to_string())),
            None => record.extend(std::iter::repeat_n(String::new(), series.tickers().len())),
        }
        record.push(row.portfolio.to_string());
        record.push(row.portfolio_dollars.to_string());
        wtr.write_record(&record).map_err(to_io)?;
    }

    wtr.flush()?;
    Ok(())
}

pub fn write_series_file(path: &Path, series: &AlignedReturnSeries) -> Result<(), GrowthfolioError> {
    let file = std::fs::File::create(path)?;
    write_series(file, series)
}
