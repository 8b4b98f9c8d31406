//! Office Open XML package helpers: relationships, number formats and
//! container detection.

use crate::error::DatabookError;
use crate::helpers::reader::UnifiedReader;
use crate::helpers::xml::XmlNodeHelper;
use crate::helpers::zip::ZipHelper;
use crate::match_xml_events;
use crate::spreadsheet::cell::CellType;
use crate::spreadsheet::SpreadsheetError;
use quick_xml::events::Event;
use std::collections::HashMap;
use std::io::Read;
use std::io::Seek;
use zip::ZipArchive;

const TAG_RELATIONSHIP: &[u8] = b"Relationship";

/// Compound File Binary signature shared by encrypted xlsx packages and legacy xls.
const OLE_MAGIC: [u8; 8] = [0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1];

/// Opens the ZIP container of an xlsx workbook, rejecting OLE containers.
pub(super) fn open_package(file_name: &str) -> Result<ZipArchive<UnifiedReader>, DatabookError> {
    let mut reader = UnifiedReader::new(file_name)?;
    if reader.peek::<8>()? == Some(OLE_MAGIC) {
        Err(SpreadsheetError::OleContainer(file_name.to_owned()))?;
    }
    Ok(ZipArchive::new(reader)?)
}

/// Maps relationship ids to worksheet part paths.
pub(super) fn load_relationships<RS: Read + Seek>(
    zip: &mut ZipArchive<RS>,
    path: &str,
) -> Result<HashMap<String, String>, DatabookError> {
    let mut reader = zip
        .xml_reader(path)?
        .ok_or_else(|| SpreadsheetError::MissingPart(path.to_owned()))?;
    let mut relationships = HashMap::<String, String>::new();
    match_xml_events!(reader => {
        Event::Start(event) if event.local_name().as_ref() == TAG_RELATIONSHIP => {
            let id = event.get_attribute_value("Id")?;
            let kind = event.get_attribute_value("Type")?;
            let target = event.get_attribute_value("Target")?;
            if kind.map_or(true, |kind| kind.ends_with("/worksheet")) {
                if let Some((id, target)) = id.zip(target) {
                    relationships.insert(id.to_string(), to_zip_path(&target));
                }
            }
        }
    });
    Ok(relationships)
}

/// Cell type per style index, from the `numFmtId` of every `cellXfs` entry.
pub(super) fn resolve_number_formats(format_ids: &[String], custom_formats: &HashMap<String, CellType>) -> Vec<CellType> {
    format_ids
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
pub(crate) fn to_zip_path(path: &str) -> String {
    if let Some(absolute) = path.strip_prefix('/') {
        absolute.to_owned()
    } else if path.starts_with("xl/") {
        path.to_owned()
    } else {
        format!("xl/{path}")
    }
}
