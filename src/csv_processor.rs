use crate::error;
use crate::series;

/// Column holding the day-first timestamp.
pub const TIMESTAMP_COLUMN: &str = "timestamp";
/// Column holding the scrubbing count.
pub const VALUE_COLUMN: &str = "scrubbing";

/// Positions of the required columns within the header row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ColumnLayout {
    timestamp: usize,
    scrubbing: usize,
}

/// Locates the required columns in the header row.
///
/// Header names are compared after trimming whitespace. Extra columns are
/// ignored.
///
/// # Errors
/// * `MalformedInput` if either required column is missing.
fn locate_columns(headers: &csv::StringRecord) -> error::Result<ColumnLayout> {
    let position = |name: &str| headers.iter().position(|h| h.trim() == name);

    let missing: Vec<&str> = [TIMESTAMP_COLUMN, VALUE_COLUMN]
        .into_iter()
        .filter(|name| position(name).is_none())
        .collect();
    if !missing.is_empty() {
        return Err(error::ForecastError::MalformedInput(format!(
            "missing required column(s): {}",
            missing.join(", ")
        )));
    }

    Ok(ColumnLayout {
        timestamp: position(TIMESTAMP_COLUMN).unwrap_or_default(),
        scrubbing: position(VALUE_COLUMN).unwrap_or_default(),
    })
}

/// Reads raw records from CSV data.
///
/// This function:
/// 1. Reads the header row and locates the `timestamp` and `scrubbing` columns.
/// 2. Reads every data row, tolerating rows with too few or too many fields.
/// 3. Copies the two required cells of each row into a `RawRecord`.
///
/// Cell contents are not validated here; that is the normalizer's job.
///
/// # Arguments
/// * `reader` - Any source of CSV bytes (file, upload buffer, stdin).
///
/// # Returns
/// * `error::Result<Vec<series::RawRecord>>` - One record per data row.
///
/// # Errors
/// * `MalformedInput` if the header lacks a required column or the CSV
///   cannot be decoded.
pub fn read_records<R: std::io::Read>(reader: R) -> error::Result<Vec<series::RawRecord>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = reader.headers().map_err(malformed)?.clone();
    let layout = locate_columns(&headers)?;

    let mut records = Vec::new();
    for result in reader.records() {
        let row = result.map_err(malformed)?;
        let cell = |idx: usize| row.get(idx).map(str::to_string);
        records.push(series::RawRecord {
            timestamp: cell(layout.timestamp),
            scrubbing: cell(layout.scrubbing),
        });
    }

    tracing::info!(rows = records.len(), "read upload");
    Ok(records)
}

/// Opens a CSV file and reads its raw records.
///
/// # Errors
/// * `Io` if the file cannot be opened.
/// * Anything [`read_records`] reports.
pub fn read_records_from_path<P: AsRef<std::path::Path>>(
    path: P,
) -> error::Result<Vec<series::RawRecord>> {
    let file = std::fs::File::open(path.as_ref())?;
    read_records(std::io::BufReader::new(file))
}

fn malformed(e: csv::Error) -> error::ForecastError {
    error::ForecastError::MalformedInput(format!("unreadable CSV: {}", e))
}

/// Writes forecast rows as CSV with a header row.
///
/// # Errors
/// * `Io` if serialization or writing fails.
pub fn write_forecast<W: std::io::Write>(
    writer: W,
    forecast: &series::ForecastResult,
) -> error::Result<()> {
    let mut writer = csv::Writer::from_writer(writer);
    for row in &forecast.rows {
        writer.serialize(row).map_err(std::io::Error::other)?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_read_records_ignores_extra_columns() {
        let data = "host,timestamp,scrubbing,deep\nosd1,01/01/2024,5,0\nosd2,02/01/2024,7,1\n";
        let records = read_records(data.as_bytes()).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0], series::RawRecord::new("01/01/2024", "5"));
        assert_eq!(records[1], series::RawRecord::new("02/01/2024", "7"));
    }

    #[test]
    fn test_read_records_short_row_has_missing_cell() {
        let data = "timestamp,scrubbing\n01/01/2024,5\n02/01/2024\n";
        let records = read_records(data.as_bytes()).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].scrubbing, None);
    }

    #[test]
    fn test_read_records_trims_headers() {
        let data = " timestamp , scrubbing \n01/01/2024, 5\n";
        let records = read_records(data.as_bytes()).unwrap();
        assert_eq!(records[0].scrubbing.as_deref(), Some("5"));
    }

    #[test]
    fn test_missing_column_is_malformed() {
        let data = "timestamp,count\n01/01/2024,5\n";
        let err = read_records(data.as_bytes()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MalformedInput);
        assert!(err.to_string().contains("scrubbing"));
    }

    #[test]
    fn test_empty_upload_is_malformed() {
        let err = read_records("".as_bytes()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MalformedInput);
    }

    #[test]
    fn test_header_only_yields_no_records() {
        let records = read_records("timestamp,scrubbing\n".as_bytes()).unwrap();
        assert!(records.is_empty());
    }

    #[test]
    fn test_missing_file_is_io() {
        let err = read_records_from_path("/nonexistent/upload.csv").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Io);
    }
}
