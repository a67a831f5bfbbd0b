pub mod csv_file;
pub mod json_file;

use std::{fmt, path::Path, str::FromStr};

use crate::error::LedgerError;

pub use ledger_client::db::DecodedStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataFormat {
    Json,
    Csv,
}

impl DataFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Csv => "csv",
        }
    }

    /// Pick the format from a file extension.
    pub fn from_path(path: &Path) -> Result<Self, LedgerError> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(|ext| ext.parse().ok())
            .ok_or_else(|| {
                LedgerError::MalformedInput(format!(
                    "unsupported file format for '{}', use .json or .csv",
                    path.display()
                ))
            })
    }
}

impl FromStr for DataFormat {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "csv" => Ok(Self::Csv),
            other => Err(LedgerError::MalformedInput(format!(
                "unsupported format '{other}', use json or csv"
            ))),
        }
    }
}

impl fmt::Display for DataFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// How imported data is combined with what is already stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ImportMode {
    /// Append imported entries to existing datacenters.
    #[default]
    Merge,
    /// Discard everything stored and keep only the imported data.
    Replace,
}

/// Decode `text` into a standalone store without touching any existing data.
pub fn decode(text: &str, format: DataFormat) -> Result<DecodedStore, LedgerError> {
    match format {
        DataFormat::Json => json_file::decode_json(text),
        DataFormat::Csv => Ok(csv_file::decode_csv(text)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_from_extension() {
        assert_eq!(DataFormat::from_path(Path::new("a/b.json")).unwrap(), DataFormat::Json);
        assert_eq!(DataFormat::from_path(Path::new("export.CSV")).unwrap(), DataFormat::Csv);
        assert!(matches!(
            DataFormat::from_path(Path::new("notes.txt")),
            Err(LedgerError::MalformedInput(_))
        ));
        assert!(DataFormat::from_path(Path::new("no_extension")).is_err());
    }

    #[test]
    fn format_parses_selector() {
        assert_eq!("csv".parse::<DataFormat>().unwrap(), DataFormat::Csv);
        assert_eq!(" JSON ".parse::<DataFormat>().unwrap(), DataFormat::Json);
        assert!("xml".parse::<DataFormat>().is_err());
    }
}
