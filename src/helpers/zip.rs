//! Part lookup inside OOXML packages

use crate::error::TrimError;
use crate::helpers::xml::XmlReader;
use crate::spreadsheet::SpreadsheetError;
use std::io::BufReader;
use std::io::Read;
use std::io::Seek;
use zip::read::ZipFile;
use zip::result::ZipError;
use zip::ZipArchive;

pub(crate) type PartReader<'a, RS> = XmlReader<BufReader<ZipFile<'a, RS>>>;

pub(crate) trait ZipHelper<RS: Read + Seek> {
    /// Finds a part by name. Matching ignores ASCII case and treats `\` as `/`.
    fn part(&'_ mut self, name: &str) -> Result<Option<ZipFile<'_, RS>>, TrimError>;

    /// XML reader over an optional part such as `xl/styles.xml`.
    fn xml_reader(&'_ mut self, name: &str) -> Result<Option<PartReader<'_, RS>>, TrimError>;

    /// XML reader over a part the workbook cannot be read without.
    fn required_xml_reader(&'_ mut self, name: &str) -> Result<PartReader<'_, RS>, TrimError> {
        match self.xml_reader(name)? {
            Some(reader) => Ok(reader),
            None => Err(SpreadsheetError::FileError(name.to_owned()))?,
        }
    }
}

impl<RS: Read + Seek> ZipHelper<RS> for ZipArchive<RS> {
    fn part(&'_ mut self, name: &str) -> Result<Option<ZipFile<'_, RS>>, TrimError> {
        let wanted = name.replace('\\', "/");
        let Some(stored) = self
            .file_names()
            .find(|stored| wanted.eq_ignore_ascii_case(stored))
            .map(str::to_owned)
        else {
            return Ok(None);
        };
        match self.by_name(&stored) {
            Ok(file) => Ok(Some(file)),
            Err(ZipError::FileNotFound) => Ok(None),
            Err(error) => Err(error)?,
        }
    }

    fn xml_reader(&'_ mut self, name: &str) -> Result<Option<PartReader<'_, RS>>, TrimError> {
        Ok(self.part(name)?.map(|file| XmlReader::new(BufReader::new(file))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use std::io::Write;
    use zip::write::SimpleFileOptions;
    use zip::ZipWriter;

    fn package() -> ZipArchive<Cursor<Vec<u8>>> {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        writer.start_file("xl/Workbook.xml", SimpleFileOptions::default()).unwrap();
        writer.write_all(b"<workbook/>").unwrap();
        ZipArchive::new(writer.finish().unwrap()).unwrap()
    }

    #[test]
    fn parts_match_loosely() {
        let mut zip = package();
        assert!(zip.part("xl/workbook.xml").unwrap().is_some());
        assert!(zip.part("XL\\WORKBOOK.XML").unwrap().is_some());
        assert!(zip.part("xl/styles.xml").unwrap().is_none());
    }

    #[test]
    fn missing_required_part_is_reported() {
        let mut zip = package();
        assert!(zip.required_xml_reader("xl/workbook.xml").is_ok());
        let error = zip.required_xml_reader("xl/styles.xml").err().unwrap();
        assert!(matches!(error, TrimError::SpreadsheetError(SpreadsheetError::FileError(part)) if part == "xl/styles.xml"));
    }
}
