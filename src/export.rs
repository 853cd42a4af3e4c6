use crate::error::TrimError;
use crate::table::Table;
use regex::Regex;
use std::fs;
use std::fs::File;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;
use std::sync::LazyLock;

/// Characters not allowed in exported file names
static FORBIDDEN_CHARACTERS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"[\\/*?:"<>|]"#).expect("Hardcode regex pattern"));

/// UTF-8 byte order mark, written so spreadsheet applications detect the encoding
const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Writes tables as CSV files into one output directory.
#[derive(Clone, Debug)]
pub struct CsvExporter {
    directory: PathBuf,
}

impl CsvExporter {
    /// Creates the exporter, creating `directory` and its parents when missing.
    pub fn new<P: AsRef<Path>>(directory: P) -> Result<Self, TrimError> {
        fs::create_dir_all(directory.as_ref())?;
        Ok(CsvExporter {
            directory: directory.as_ref().to_path_buf(),
        })
    }

    /// Writes `table` to `<directory>/<file_name>` and returns the written path.
    pub fn export(&self, table: &Table, file_name: &str) -> Result<PathBuf, TrimError> {
        let path = self.directory.join(sanitize_file_name(file_name));
        let mut file = File::create(&path)?;
        file.write_all(UTF8_BOM)?;

        let mut writer = csv::Writer::from_writer(file);
        writer.write_record(&table.columns)?;
        for row in &table.rows {
            writer.write_record(row.iter().map(|value| value.to_string()))?;
        }
        writer.flush()?;
        Ok(path)
    }
}

/// Replaces characters forbidden in file names with `_`.
pub fn sanitize_file_name(file_name: &str) -> String {
    FORBIDDEN_CHARACTERS.replace_all(file_name, "_").into_owned()
}
