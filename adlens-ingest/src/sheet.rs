//! Parse uploaded keyword sheets into raw records.
//!
//! Tabular UTF-8 delimited text: first row = header labels, one row per
//! keyword/match-type slice, no fixed column order. Rows shorter than the
//! header are padded with blanks rather than rejected.

use adlens_core::RawRecord;
use anyhow::{bail, Context, Result};
use std::io::Read;
use std::path::Path;

/// Header labels plus untyped rows, exactly as found in the source.
#[derive(Debug, Clone, PartialEq)]
pub struct Sheet {
    pub headers: Vec<String>,
    pub rows: Vec<RawRecord>,
}

pub fn parse_sheet(path: impl AsRef<Path>) -> Result<Sheet> {
    let file = std::fs::File::open(path.as_ref())
        .with_context(|| format!("opening {}", path.as_ref().display()))?;
    parse_sheet_from_reader(file)
}

pub fn parse_sheet_from_reader<R: Read>(reader: R) -> Result<Sheet> {
    let mut rdr = csv::ReaderBuilder::new()
        .flexible(true)
        .has_headers(false)
        .from_reader(reader);

    let mut headers: Option<Vec<String>> = None;
    let mut rows = Vec::new();

    for result in rdr.records() {
        let record = result?;
        // Skip leading blank rows before the header.
        if headers.is_none() {
            if record.iter().all(|c| c.trim().is_empty()) {
                continue;
            }
            headers = Some(record.iter().map(|c| c.trim().to_string()).collect());
            continue;
        }

        let labels = headers.as_ref().unwrap();
        if record.iter().all(|c| c.trim().is_empty()) {
            continue;
        }
        let cells = labels
            .iter()
            .enumerate()
            .map(|(i, label)| (label.clone(), record.get(i).unwrap_or("").trim().to_string()))
            .collect();
        rows.push(RawRecord { cells });
    }

    match headers {
        Some(headers) => Ok(Sheet { headers, rows }),
        None => bail!("sheet is empty: no header row found"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_basic_sheet() {
        let csv = "\
キーワード,マッチタイプ,表示回数,クリック数,費用,CV
渋谷 賃貸,完全一致,1200,120,24000,5
新宿 賃貸,部分一致,900,45,9000,1
";
        let sheet = parse_sheet_from_reader(csv.as_bytes()).unwrap();
        assert_eq!(sheet.headers.len(), 6);
        assert_eq!(sheet.rows.len(), 2);
        assert_eq!(sheet.rows[0].get("キーワード"), Some("渋谷 賃貸"));
        assert_eq!(sheet.rows[1].get("費用"), Some("9000"));
    }

    #[test]
    fn test_short_rows_padded_blank_rows_skipped() {
        let csv = "kw,imps,cost\n,,\nrent,100\n\n";
        let sheet = parse_sheet_from_reader(csv.as_bytes()).unwrap();
        assert_eq!(sheet.rows.len(), 1);
        assert_eq!(sheet.rows[0].get("cost"), Some(""));
    }

    #[test]
    fn test_empty_sheet_is_an_error() {
        assert!(parse_sheet_from_reader("".as_bytes()).is_err());
    }
}
