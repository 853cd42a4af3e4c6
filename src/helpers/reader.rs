use crate::error::TrimError;
use crate::spreadsheet::SpreadsheetError;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Buffered reader over a local source file
pub(crate) type FileReader = BufReader<File>;

/// Opens a local source file, reporting a missing path as `SourceNotFound`.
pub(crate) fn open_source_file(file_name: &str) -> Result<FileReader, TrimError> {
    if !Path::new(file_name).is_file() {
        Err(SpreadsheetError::SourceNotFound(file_name.to_owned()))?;
    }
    let file = File::open(file_name)?;
    Ok(BufReader::new(file))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_local_file() {
        let result = open_source_file("Cargo.toml");
        assert!(result.is_ok(), "Failed to open local file: {:?}", result.err());
    }

    #[test]
    fn test_open_missing_file() {
        let result = open_source_file("non_existent_file.xlsx");
        assert!(matches!(
            result,
            Err(TrimError::SpreadsheetError(SpreadsheetError::SourceNotFound(name))) if name == "non_existent_file.xlsx"
        ));
    }
}
