//! Office Open XML package helpers
use crate::error::TrimError;
use crate::helpers::reader::open_source_file;
use crate::helpers::reader::FileReader;
use crate::helpers::xml::XmlElementExt;
use crate::helpers::zip::ZipHelper;
use crate::match_xml_events;
use crate::spreadsheet::cell::CellType;
use crate::spreadsheet::SpreadsheetError;
use quick_xml::events::Event;
use std::borrow::Cow;
use std::collections::HashMap;
use zip::ZipArchive;

/// XML tag name for relationship elements
const TAG_RELATIONSHIP: &[u8] = b"Relationship";

/// Workbook structure loaded when a package is opened
pub(super) struct Package {
    pub(super) zip: ZipArchive<FileReader>,
    /// Cell type for each cell style index
    pub(super) number_formats: Vec<CellType>,
    /// Worksheets as (name, zip path) in workbook order
    pub(super) sheets: Vec<(String, String)>,
    /// Whether dates use the 1904 system
    pub(super) is_1904: bool,
}

/// Opens a package and loads its workbook structure.
///
/// `load_workbook` returns the worksheets and the 1904 flag, `load_number_formats` the cell type of
/// every style index.
pub(super) fn open<W, F>(file_name: &str, load_workbook: W, load_number_formats: F) -> Result<Package, TrimError>
where
    W: Fn(&mut ZipArchive<FileReader>) -> Result<(Vec<(String, String)>, bool), TrimError>,
    F: Fn(&mut ZipArchive<FileReader>) -> Result<Vec<CellType>, TrimError>,
{
    let reader = open_source_file(file_name)?;
    let mut zip = ZipArchive::new(reader)?;
    let (sheets, is_1904) = load_workbook(&mut zip)?;
    if sheets.is_empty() {
        Err(SpreadsheetError::SpreadsheetEmptyError(file_name.to_owned()))?
    }

    let number_formats = load_number_formats(&mut zip)?;
    Ok(Package {
        zip,
        number_formats,
        sheets,
        is_1904,
    })
}

/// Loads worksheet relationships, mapping relationship ids to worksheet part paths.
pub(super) fn load_relationships(zip: &mut ZipArchive<FileReader>, path: &str) -> Result<HashMap<String, String>, TrimError> {
    let mut reader = zip.required_xml_reader(path)?;
    let mut relationships: HashMap<String, String> = HashMap::new();
    match_xml_events!(reader => {
        Event::Start(event) if event.local_name().as_ref() == TAG_RELATIONSHIP => {
            let id = event.attribute("Id")?;
            let kind = event.attribute("Type")?;
            let target = event.attribute("Target")?;
            if kind.map(|it| it.ends_with("/worksheet")).unwrap_or(true) {
                if let Some((id, target)) = id.zip(target) {
                    relationships.insert(id.to_string(), to_zip_path(target));
                }
            }
        }
    });
    Ok(relationships)
}

/// Maps each style's number format id to a cell type, preferring custom formats over built-in ids.
pub(super) fn load_number_formats(format_indexes: Vec<String>, custom_formats: HashMap<String, CellType>) -> Vec<CellType> {
    format_indexes
        .iter()
        .map(|id| {
            custom_formats
                .get(id)
                .copied()
                .or_else(|| CellType::parse_builtin_number_format_id(id))
                .unwrap_or(CellType::Number)
        })
        .collect()
}

/// Normalizes a relationship target to a path inside the package.
pub(crate) fn to_zip_path(path: Cow<'_, str>) -> String {
    if let Some(path) = path.strip_prefix("/xl/") {
        format!("xl/{path}")
    } else if path.starts_with("xl/") {
        path.to_string()
    } else {
        format!("xl/{path}")
    }
}
