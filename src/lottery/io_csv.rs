// Primitives for reading CSV files.

use crate::lottery::{io_common::parse_table, *};

pub fn read_csv_candidates(path: &str) -> CliResult<Vec<ParsedCandidate>> {
    info!("Attempting to read candidate file {:?}", path);
    let mut rdr = csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(path)
        .context(OpeningCsvSnafu { path })?;
    let headers: Vec<String> = rdr
        .headers()
        .context(OpeningCsvSnafu { path })?
        .iter()
        .map(|h| h.trim_start_matches('\u{feff}').trim().to_string())
        .collect();
    debug!("read_csv_candidates: headers: {:?}", headers);

    // The header is line 1.
    let rows = rdr
        .into_records()
        .enumerate()
        .map(|(idx, line_r)| -> CliResult<(usize, Vec<String>)> {
            let lineno = idx + 2;
            let line = line_r.context(CsvLineParseSnafu { lineno })?;
            Ok((lineno, line.iter().map(|s| s.to_string()).collect()))
        });
    parse_table(path, headers, rows)
}
