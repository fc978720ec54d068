//! CSV loading.

use crate::error::{DataError, Result};
use crate::pipeline::context::Context;
use crate::pipeline::handler::Transform;
use polars::io::csv::read::{CsvEncoding, CsvParseOptions, CsvReadOptions};
use polars::prelude::*;
use std::fs::File;
use std::path::Path;
use tracing::{debug, info};

/// Delimiters a single-column header is checked for.
const FOREIGN_SEPARATORS: [u8; 4] = [b',', b';', b'\t', b'|'];

/// Reads the input file into the raw table, every column as text.
///
/// Schema inference is disabled so that salary strings, ages and dates reach
/// the handlers exactly as written. Empty cells become nulls. Every record
/// must have as many fields as the header.
#[derive(Debug, Clone)]
pub struct Loader {
    separator: u8,
}

impl Default for Loader {
    fn default() -> Self {
        Self { separator: b',' }
    }
}

impl Loader {
    pub fn with_separator(separator: u8) -> Self {
        Self { separator }
    }

    pub fn separator(&self) -> u8 {
        self.separator
    }

    /// Reject files whose records disagree with the header.
    ///
    /// Polars silently pads short records with nulls.
    fn check_record_lengths(&self, path: &Path) -> Result<()> {
        let file = File::open(path).map_err(|source| DataError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let mut reader = csv::ReaderBuilder::new()
            .delimiter(self.separator)
            .has_headers(true)
            .flexible(false)
            .from_reader(file);

        let headers = reader
            .byte_headers()
            .map_err(|e| csv_error(path, e))?
            .clone();

        if headers.len() == 1
            && let Some(&other) = FOREIGN_SEPARATORS
                .iter()
                .find(|&&c| c != self.separator && headers[0].contains(&c))
        {
            return Err(DataError::Malformed {
                path: path.to_path_buf(),
                reason: format!(
                    "header looks delimited by {:?}, expected {:?}",
                    other as char, self.separator as char
                ),
            });
        }

        for record in reader.byte_records() {
            record.map_err(|e| csv_error(path, e))?;
        }
        Ok(())
    }
}

fn csv_error(path: &Path, err: csv::Error) -> DataError {
    let reason = match err.into_kind() {
        csv::ErrorKind::Io(source) => {
            return DataError::Io {
                path: path.to_path_buf(),
                source,
            };
        }
        csv::ErrorKind::UnequalLengths {
            pos,
            expected_len,
            len,
        } => match pos {
            Some(pos) => format!(
                "line {} has {} fields, expected {}",
                pos.line(),
                len,
                expected_len
            ),
            None => format!("record has {} fields, expected {}", len, expected_len),
        },
        other => format!("{:?}", other),
    };
    DataError::Malformed {
        path: path.to_path_buf(),
        reason,
    }
}

impl Transform for Loader {
    fn transform(&self, mut ctx: Context) -> Result<Context> {
        let path = ctx.source.clone();
        info!("Loading dataset from: {}", path.display());

        self.check_record_lengths(&path)?;

        let file = File::open(&path).map_err(|source| DataError::Io {
            path: path.clone(),
            source,
        })?;

        let malformed = |reason: String| DataError::Malformed {
            path: path.clone(),
            reason,
        };

        let df = CsvReadOptions::default()
            .with_has_header(true)
            .with_infer_schema_length(Some(0))
            .with_parse_options(
                CsvParseOptions::default()
                    .with_separator(self.separator)
                    .with_quote_char(Some(b'"'))
                    .with_encoding(CsvEncoding::LossyUtf8),
            )
            .into_reader_with_file_handle(file)
            .finish()
            .map_err(|e| malformed(e.to_string()))?;

        if df.width() == 0 {
            return Err(malformed("no header row".to_string()));
        }
        if df.height() == 0 {
            return Err(malformed("no data rows".to_string()));
        }

        debug!("Loaded columns: {:?}", df.get_column_names());
        info!("Dataset loaded successfully: {:?}", df.shape());

        ctx.diagnostics.rows_loaded = df.height();
        ctx.raw_table = df;
        Ok(ctx)
    }
}
