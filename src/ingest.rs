// =============================================================================
// Price Ingestion - close prices from an uploaded CSV
// =============================================================================
//
// The header row must name a `Close` column (exact, case-sensitive). Rows
// whose Close cell is not a number are skipped; a structurally broken row
// rejects the whole file. Only the Close cell has to be UTF-8, so exports
// with Latin-1 text in other columns still load.
// =============================================================================

use thiserror::Error;
use tracing::debug;

const CLOSE_COLUMN: &str = "Close";

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("failed to read CSV header: {0}")]
    MissingHeader(#[source] csv::Error),

    #[error("\"Close\" column not found")]
    MissingCloseColumn,

    #[error("failed to parse CSV rows: {0}")]
    Malformed(#[source] csv::Error),
}

/// Extract the `Close` column of `bytes` in file order.
pub fn close_prices(bytes: &[u8]) -> Result<Vec<f64>, IngestError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(bytes);

    let headers = reader.byte_headers().map_err(IngestError::MissingHeader)?;
    let close_idx = headers
        .iter()
        .position(|h| h == CLOSE_COLUMN.as_bytes())
        .ok_or(IngestError::MissingCloseColumn)?;

    let mut closes = Vec::new();
    for (row, record) in reader.byte_records().enumerate() {
        let record = record.map_err(IngestError::Malformed)?;
        let cell = record.get(close_idx);
        match cell.and_then(parse_price) {
            Some(value) => closes.push(value),
            None => {
                debug!(row, value = ?cell.map(String::from_utf8_lossy), "skipping unparsable close");
            }
        }
    }

    Ok(closes)
}

fn parse_price(cell: &[u8]) -> Option<f64> {
    std::str::from_utf8(cell).ok()?.parse().ok()
}
