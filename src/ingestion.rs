use crate::error::Result;
use crate::table::RawTable;
use csv::ReaderBuilder;
use log::debug;

/// Reads an already-decoded tab-delimited disclosure extract into a
/// [`RawTable`].
///
/// Encoding detection and decompression happen upstream; this helper only
/// accepts decoded text. Rows shorter than the header are kept as-is and
/// padded during standardization.
pub fn read_tsv_str(text: &str) -> Result<RawTable> {
    let mut reader = ReaderBuilder::new()
        .delimiter(b'\t')
        .flexible(true)
        .from_reader(text.as_bytes());

    let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        rows.push(record.iter().map(str::to_string).collect());
    }

    debug!("Read {} rows from tab-delimited input", rows.len());
    Ok(RawTable::new(headers, rows))
}
