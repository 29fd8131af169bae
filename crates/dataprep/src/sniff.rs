//! File format, delimiter, and encoding detection.

use std::borrow::Cow;
use std::fmt;
use std::path::Path;

use tracing::{debug, warn};

use crate::error::{DataPrepError, Result};

/// Delimiter candidates, in detection priority order.
pub const DELIMITERS: &[u8] = &[b',', b';', b'\t', b'|'];

/// Encoding candidates, in detection priority order.
pub const ENCODINGS: &[TextEncoding] = &[
    TextEncoding::Utf8,
    TextEncoding::Latin1,
    TextEncoding::Windows1252,
];

/// How many records of the sample each candidate is allowed to look at.
const SAMPLE_ROWS: usize = 5;

/// Broad file kind, decided from the extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    /// Excel workbook (`.xlsx`, `.xls`).
    Spreadsheet,
    /// Delimited text (`.csv`, `.tsv`, `.txt`).
    DelimitedText,
    /// JSON array of records (`.json`).
    Structured,
}

/// Character encoding of a delimited text file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextEncoding {
    Utf8,
    Latin1,
    Windows1252,
}

impl TextEncoding {
    /// Decode raw bytes, or `None` when the bytes are not valid in this
    /// encoding. Latin-1 accepts any byte sequence.
    pub fn decode<'a>(&self, bytes: &'a [u8]) -> Option<Cow<'a, str>> {
        match self {
            TextEncoding::Utf8 => std::str::from_utf8(bytes).ok().map(Cow::Borrowed),
            TextEncoding::Latin1 => Some(encoding_rs::mem::decode_latin1(bytes)),
            TextEncoding::Windows1252 => {
                let (decoded, _, had_errors) =
                    encoding_rs::WINDOWS_1252.decode(bytes);
                if had_errors { None } else { Some(decoded) }
            }
        }
    }

    /// Canonical label for logs and reports.
    pub fn label(&self) -> &'static str {
        match self {
            TextEncoding::Utf8 => "utf-8",
            TextEncoding::Latin1 => "latin-1",
            TextEncoding::Windows1252 => "cp1252",
        }
    }
}

impl fmt::Display for TextEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One evaluated delimiter/encoding candidate. `rejected` is `None` for
/// the accepted candidate, otherwise the reason it was skipped.
#[derive(Debug, Clone)]
pub struct SniffAttempt {
    pub delimiter: u8,
    pub encoding: TextEncoding,
    pub rejected: Option<String>,
}

/// Outcome of sniffing a file.
#[derive(Debug, Clone)]
pub struct FormatDecision {
    /// Broad kind decided from the extension.
    pub kind: FileKind,
    /// Confirmed delimiter (delimited text only).
    pub delimiter: Option<u8>,
    /// Confirmed encoding (delimited text only).
    pub encoding: Option<TextEncoding>,
    /// True when no candidate succeeded and the `,`/utf-8 default applies.
    pub fallback: bool,
    /// Every candidate evaluated, in order, with its outcome.
    pub attempts: Vec<SniffAttempt>,
}

impl FormatDecision {
    fn fixed(kind: FileKind, delimiter: Option<u8>, encoding: Option<TextEncoding>) -> Self {
        Self {
            kind,
            delimiter,
            encoding,
            fallback: false,
            attempts: Vec::new(),
        }
    }
}

/// Infers file kind from the extension and, for CSV files, the delimiter
/// and encoding from a sample of the content.
pub struct FormatSniffer;

impl FormatSniffer {
    /// Sniff a file. Reads the file content only for `.csv` paths, where a
    /// delimiter/encoding candidate search is needed.
    pub fn sniff(path: impl AsRef<Path>) -> Result<FormatDecision> {
        let path = path.as_ref();
        let extension = path
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .unwrap_or_default();

        match extension.as_str() {
            "xlsx" | "xls" => Ok(FormatDecision::fixed(FileKind::Spreadsheet, None, None)),
            "json" => Ok(FormatDecision::fixed(FileKind::Structured, None, None)),
            "txt" | "tsv" => Ok(FormatDecision::fixed(
                FileKind::DelimitedText,
                Some(b'\t'),
                Some(TextEncoding::Utf8),
            )),
            "csv" => {
                let bytes =
                    std::fs::read(path).map_err(|e| DataPrepError::io(path, e))?;
                Ok(Self::sniff_delimited(&bytes))
            }
            other => Err(DataPrepError::UnsupportedFormat(format!(
                "unknown extension '.{other}' for {}",
                path.display()
            ))),
        }
    }

    /// Run the delimiter × encoding candidate search over raw bytes.
    ///
    /// Candidates are evaluated in a fixed priority order (encodings outer,
    /// delimiters inner) and the first one whose sample parses into more
    /// than one column wins. When every candidate fails the default
    /// `,`/utf-8 pair is returned with `fallback` set; the full parse
    /// downstream will surface the real error.
    pub fn sniff_delimited(bytes: &[u8]) -> FormatDecision {
        let mut attempts = Vec::new();

        for &encoding in ENCODINGS {
            let Some(decoded) = encoding.decode(bytes) else {
                for &delimiter in DELIMITERS {
                    attempts.push(SniffAttempt {
                        delimiter,
                        encoding,
                        rejected: Some(format!("not valid {encoding}")),
                    });
                }
                continue;
            };

            for &delimiter in DELIMITERS {
                match Self::sample_columns(&decoded, delimiter) {
                    Ok(columns) if columns > 1 => {
                        debug!(
                            "sniffed delimiter '{}' with encoding {}",
                            delimiter as char, encoding
                        );
                        attempts.push(SniffAttempt {
                            delimiter,
                            encoding,
                            rejected: None,
                        });
                        return FormatDecision {
                            kind: FileKind::DelimitedText,
                            delimiter: Some(delimiter),
                            encoding: Some(encoding),
                            fallback: false,
                            attempts,
                        };
                    }
                    Ok(columns) => attempts.push(SniffAttempt {
                        delimiter,
                        encoding,
                        rejected: Some(format!("sample parsed into {columns} column(s)")),
                    }),
                    Err(reason) => attempts.push(SniffAttempt {
                        delimiter,
                        encoding,
                        rejected: Some(reason),
                    }),
                }
            }
        }

        warn!("could not detect CSV format, falling back to ','/utf-8");
        FormatDecision {
            kind: FileKind::DelimitedText,
            delimiter: Some(b','),
            encoding: Some(TextEncoding::Utf8),
            fallback: true,
            attempts,
        }
    }

    /// Parse at most [`SAMPLE_ROWS`] records and report the header width.
    fn sample_columns(decoded: &str, delimiter: u8) -> std::result::Result<usize, String> {
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(delimiter)
            .has_headers(true)
            .flexible(false)
            .from_reader(decoded.as_bytes());

        let columns = reader
            .headers()
            .map_err(|e| e.to_string())?
            .len();

        for record in reader.records().take(SAMPLE_ROWS) {
            record.map_err(|e| e.to_string())?;
        }
        Ok(columns)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sniff_comma_csv() {
        let decision = FormatSniffer::sniff_delimited(b"a,b,c\n1,2,3\n4,5,6\n");
        assert_eq!(decision.delimiter, Some(b','));
        assert_eq!(decision.encoding, Some(TextEncoding::Utf8));
        assert!(!decision.fallback);
    }

    #[test]
    fn test_sniff_semicolon_csv_first_success_wins() {
        let decision = FormatSniffer::sniff_delimited(b"a;b;c\n1;2;3\n");
        assert_eq!(decision.delimiter, Some(b';'));
        assert_eq!(decision.encoding, Some(TextEncoding::Utf8));
        // The comma/utf-8 candidate was tried first and rejected.
        let first = &decision.attempts[0];
        assert_eq!(first.delimiter, b',');
        assert!(first.rejected.is_some());
    }

    #[test]
    fn test_sniff_pipe_delimited() {
        let decision = FormatSniffer::sniff_delimited(b"a|b\n1|2\n");
        assert_eq!(decision.delimiter, Some(b'|'));
    }

    #[test]
    fn test_sniff_latin1_bytes() {
        // 0xF1 is 'ñ' in latin-1 and invalid as a UTF-8 start byte.
        let decision = FormatSniffer::sniff_delimited(b"a;se\xf1al\n1;2\n");
        assert_eq!(decision.delimiter, Some(b';'));
        assert_eq!(decision.encoding, Some(TextEncoding::Latin1));
    }

    #[test]
    fn test_sniff_single_column_falls_back() {
        let decision = FormatSniffer::sniff_delimited(b"justone\n1\n2\n");
        assert!(decision.fallback);
        assert_eq!(decision.delimiter, Some(b','));
        assert_eq!(decision.encoding, Some(TextEncoding::Utf8));
        // Every candidate left an inspectable rejection.
        assert!(decision.attempts.iter().all(|a| a.rejected.is_some()));
    }

    #[test]
    fn test_sniff_unknown_extension() {
        let result = FormatSniffer::sniff("data.parquet");
        assert!(matches!(
            result,
            Err(crate::error::DataPrepError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn test_tsv_extension_is_tab_without_sniffing() {
        let decision = FormatSniffer::sniff("missing.tsv").unwrap();
        assert_eq!(decision.kind, FileKind::DelimitedText);
        assert_eq!(decision.delimiter, Some(b'\t'));
        assert!(decision.attempts.is_empty());
    }
}
