use crate::error::DatabookError;
use crate::helpers::reader::UnifiedReader;
use crate::helpers::xml::XmlAttributeHelper;
use crate::helpers::xml::XmlNodeHelper;
use crate::helpers::xml::XmlReader;
use crate::helpers::xml::XmlTextContextHelper;
use crate::helpers::zip::ZipHelper;
use crate::match_xml_events;
use crate::spreadsheet::cell::CellType;
use crate::spreadsheet::excel;
use crate::spreadsheet::grid::Grid;
use crate::spreadsheet::reference::index_to_reference;
use crate::spreadsheet::reference::reference_to_index;
use crate::spreadsheet::SpreadsheetError;
use quick_xml::events::Event;
use quick_xml::name::QName;
use std::borrow::Cow;
use std::collections::HashMap;
use std::io::BufReader;
use zip::read::ZipFile;
use zip::ZipArchive;

const TAG_CUSTOM_FORMATS: QName = QName(b"numFmts");
const TAG_CUSTOM_FORMAT: QName = QName(b"numFmt");
const TAG_FORMAT_INDEXES: QName = QName(b"cellXfs");
const TAG_FORMAT_INDEX: QName = QName(b"xf");
const TAG_SHARED_STRING_ITEM: QName = QName(b"si");
const TAG_PHONETIC_TEXT: QName = QName(b"rPh"); // ruby text, not part of the value
const TAG_TEXT: QName = QName(b"t");
const TAG_WORKBOOK_PROPERTIES: QName = QName(b"workbookPr");
const TAG_SHEET: QName = QName(b"sheet");
const TAG_ROW: QName = QName(b"row");
const TAG_CELL: QName = QName(b"c");
const TAG_INLINE_STRING: QName = QName(b"is");
const TAG_VALUE: QName = QName(b"v");

/// An opened xlsx workbook whose sheets load as text grids.
pub(crate) struct XlsxWorkbook {
    pub(crate) name: String,
    zip: ZipArchive<UnifiedReader>,
    is_1904: bool,
    /// Cell type per style index
    number_formats: Vec<CellType>,
    shared_strings: Vec<String>,
    /// (sheet name, part path) in workbook order
    sheets: Vec<(String, String)>,
}

impl XlsxWorkbook {
    pub(crate) fn open(file_name: &str) -> Result<XlsxWorkbook, DatabookError> {
        Self::from_package(file_name, excel::open_package(file_name)?)
    }

    pub(crate) fn from_package(file_name: &str, mut zip: ZipArchive<UnifiedReader>) -> Result<XlsxWorkbook, DatabookError> {
        let (sheets, is_1904) = load_workbook(&mut zip)?;
        if sheets.is_empty() {
            Err(SpreadsheetError::EmptyWorkbook(file_name.to_owned()))?;
        }
        let number_formats = load_number_formats(&mut zip)?;
        let shared_strings = load_shared_strings(&mut zip)?;
        Ok(XlsxWorkbook {
            name: file_name.to_owned(),
            zip,
            is_1904,
            number_formats,
            shared_strings,
            sheets,
        })
    }

    pub(crate) fn sheet_names(&self) -> Vec<String> {
        self.sheets.iter().map(|(name, _)| name.to_owned()).collect()
    }

    /// Loads one sheet as a grid of display texts.
    pub(crate) fn read_grid(&mut self, sheet_name: &str) -> Result<Grid, DatabookError> {
        let zip_path = self
            .sheets
            .iter()
            .find(|(name, _)| name == sheet_name)
            .map(|(_, path)| path.to_owned())
            .ok_or_else(|| SpreadsheetError::SheetNotFound(self.name.to_owned(), sheet_name.to_owned()))?;
        let mut reader = self
            .zip
            .xml_reader(&zip_path)?
            .ok_or_else(|| SpreadsheetError::MissingPart(zip_path.to_owned()))?;

        let mut cells = Vec::<(usize, usize, String)>::new();
        let mut row_count = 0usize;
        let mut col_count = 0usize;
        let mut row = 0usize;
        let mut col = 0usize;
        let mut kind = CellType::default();
        let mut value = String::new();
        match_xml_events!(reader => {
            Event::Start(event) if event.name() == TAG_ROW => {
                if let Some(number) = event.get_attribute_value("r")? {
                    row_count = number.parse::<usize>()?.saturating_sub(1);
                }
                col_count = 0;
            }
            Event::End(event) if event.name() == TAG_ROW => row_count += 1,
            Event::Start(event) if event.name() == TAG_CELL => {
                (row, col) = event.get_attribute_value("r")?
                    .and_then(|reference| reference_to_index(&reference))
                    .unwrap_or((row_count, col_count));
                col_count = col + 1;
                kind = CellType::from_type_attribute(event.get_attribute_value("t")?.as_deref());
                if let Some(style) = event.get_attribute_value("s")? {
                    if kind == CellType::Number && !style.is_empty() {
                        let index = style.parse::<usize>()?;
                        kind = self.number_formats.get(index).copied().unwrap_or(CellType::Number);
                    }
                }
                value.clear();
            }
            Event::Start(event) if event.name() == TAG_INLINE_STRING => {
                value = read_string_value(&mut reader, TAG_INLINE_STRING, false)?;
            }
            Event::Start(event) if event.name() == TAG_VALUE => {
                value = read_string_value(&mut reader, TAG_VALUE, true)?;
            }
            Event::End(event) if !value.is_empty() && event.name() == TAG_CELL => {
                let text = kind.render(&value, self.is_1904, &self.shared_strings).ok_or_else(|| {
                    SpreadsheetError::SharedStringOutOfRange(
                        self.name.to_owned(),
                        sheet_name.to_owned(),
                        index_to_reference(row, col),
                        value.to_owned(),
                    )
                })?;
                cells.push((row, col, text));
                value.clear();
            }
        });
        Ok(Grid::from_cells(cells))
    }
}

/// Worksheet (name, part path) pairs in workbook order, and the date system.
fn load_workbook(zip: &mut ZipArchive<UnifiedReader>) -> Result<(Vec<(String, String)>, bool), DatabookError> {
    let relationships = excel::load_relationships(zip, "xl/_rels/workbook.xml.rels")?;
    let mut reader = zip
        .xml_reader("xl/workbook.xml")?
        .ok_or_else(|| SpreadsheetError::MissingPart("xl/workbook.xml".to_owned()))?;
    let mut sheets = Vec::<(String, String)>::new();
    let mut is_1904 = false;
    match_xml_events!(reader => {
        Event::Start(event) if event.name() == TAG_SHEET => {
            let mut name = None::<Cow<str>>;
            let mut id = None::<Cow<str>>;
            for result in event.attributes() {
                let attribute = result?;
                match attribute.key.local_name().as_ref() {
                    b"name" => name = Some(attribute.get_value()?),
                    b"id" => id = Some(attribute.get_value()?),
                    _ => (),
                }
            }
            if let Some((name, id)) = name.zip(id) {
                if let Some(path) = relationships.get(id.as_ref()) {
                    sheets.push((name.into_owned(), path.to_owned()));
                }
            }
        }
        Event::Start(event) if event.name() == TAG_WORKBOOK_PROPERTIES => {
            is_1904 = event.get_attribute_value("date1904")?
                .is_some_and(|value| value == "1" || value == "true");
        }
    });
    Ok((sheets, is_1904))
}

/// Cell type per style index, read from `xl/styles.xml`.
fn load_number_formats(zip: &mut ZipArchive<UnifiedReader>) -> Result<Vec<CellType>, DatabookError> {
    let Some(mut reader) = zip.xml_reader("xl/styles.xml")? else {
        return Ok(Vec::new());
    };

    let mut custom_formats = HashMap::<String, CellType>::new();
    let mut format_ids = Vec::<String>::new();
    let mut in_custom_formats = false;
    let mut in_format_indexes = false;
    match_xml_events!(reader => {
        Event::Start(event) if event.name() == TAG_CUSTOM_FORMATS => in_custom_formats = true,
        Event::End(event) if event.name() == TAG_CUSTOM_FORMATS => in_custom_formats = false,
        Event::Start(event) if in_custom_formats && event.name() == TAG_CUSTOM_FORMAT => {
            let id = event.get_attribute_value("numFmtId")?;
            let format = event.get_attribute_value("formatCode")?;
            if let Some((id, format)) = id.zip(format) {
                custom_formats.insert(id.into_owned(), CellType::parse_custom_number_format(&format));
            }
        }
        Event::Start(event) if event.name() == TAG_FORMAT_INDEXES => in_format_indexes = true,
        Event::End(event) if event.name() == TAG_FORMAT_INDEXES => in_format_indexes = false,
        Event::Start(event) if in_format_indexes && event.name() == TAG_FORMAT_INDEX => {
            let id = event.get_attribute_value("numFmtId")?.unwrap_or(Cow::Borrowed("0"));
            format_ids.push(id.into_owned());
        }
    });
    Ok(excel::resolve_number_formats(&format_ids, &custom_formats))
}

fn load_shared_strings(zip: &mut ZipArchive<UnifiedReader>) -> Result<Vec<String>, DatabookError> {
    let mut shared_strings = Vec::<String>::new();
    let Some(mut reader) = zip.xml_reader("xl/sharedStrings.xml")? else {
        return Ok(shared_strings);
    };
    match_xml_events!(reader => {
        Event::Start(event) if event.name() == TAG_SHARED_STRING_ITEM => {
            shared_strings.push(read_string_value(&mut reader, TAG_SHARED_STRING_ITEM, false)?);
        }
    });
    Ok(shared_strings)
}

/// Collects the text of a string item up to `end_tag`, skipping phonetic runs.
/// `<v>` holds bare text; `<si>` and `<is>` wrap it in `<t>` runs.
fn read_string_value(
    reader: &mut XmlReader<BufReader<ZipFile<'_, UnifiedReader>>>,
    end_tag: QName,
    is_text_content: bool,
) -> Result<String, DatabookError> {
    let mut is_phonetic_text = false;
    let mut is_text = is_text_content;
    let mut text = String::new();
    match_xml_events!(reader => {
        Event::End(event) if event.name() == end_tag => break,
        Event::Start(event) if event.name() == TAG_PHONETIC_TEXT => is_phonetic_text = true,
        Event::End(event) if event.name() == TAG_PHONETIC_TEXT => is_phonetic_text = false,
        Event::Start(event) if !is_phonetic_text && event.name() == TAG_TEXT => is_text = true,
        Event::End(event) if is_text && event.name() == TAG_TEXT => is_text = false,
        Event::Text(event) if is_text => text.push_str(&event.xml_content()?),
        Event::CData(event) if is_text => text.push_str(&event.xml_content()?),
        Event::GeneralRef(event) if is_text => text.push_bytes_ref(&event)?,
    });
    Ok(text)
}


#[cfg(test)]
mod tests {
    use super::fixtures::xlsx_package;
    use super::*;

    const SHEET: &str = concat!(
        r#"<row r="1"><c r="A1" t="s"><v>0</v></c><c r="B1" s="1"><v>44196</v></c><c r="C1" s="2"><v>44561.5</v></c></row>"#,
        r#"<row r="2"><c r="A2" t="inlineStr"><is><t>Net &amp; sales</t></is></c><c r="B2"><v>1234.5</v></c><c r="C2" t="e"><v>#N/A</v></c></row>"#,
        r#"<row r="4"><c r="A4" t="b"><v>1</v></c><c r="B4" t="s"><v>1</v></c><c r="D4"><f>SUM(B2)</f></c></row>"#,
        r#"<row><c t="str"><v>formula text</v></c></row>"#,
    );

    #[test]
    fn reads_sheet_as_grid() {
        let package = xlsx_package(&[("P&amp;L", SHEET), ("Cover", "")], &["$ in thousands", "  "], false);
        let mut workbook = XlsxWorkbook::from_package("book.xlsx", package).unwrap();
        assert_eq!(workbook.sheet_names(), vec!["P&L", "Cover"]);

        let grid = workbook.read_grid("P&L").unwrap();
        assert_eq!(grid.get(0, 0), Some("$ in thousands"));
        assert_eq!(grid.get(0, 1), Some("2020-12-31"));
        assert_eq!(grid.get(0, 2), Some("2021-12-31 12:00:00"));
        assert_eq!(grid.get(1, 0), Some("Net & sales"));
        assert_eq!(grid.get(1, 1), Some("1234.5"));
        assert_eq!(grid.get(1, 2), Some("#N/A"));
        assert_eq!(grid.get(2, 0), None);
        assert_eq!(grid.get(3, 0), Some("TRUE"));
        assert_eq!(grid.get(3, 1), None);
        assert_eq!(grid.get(3, 3), None);
        assert_eq!(grid.get(4, 0), Some("formula text"));
        assert_eq!(grid.height(), 5);

        assert_eq!(workbook.read_grid("Cover").unwrap().height(), 0);
    }

    #[test]
    fn date1904_system() {
        let sheet = r#"<row r="1"><c r="A1" s="1"><v>0</v></c></row>"#;
        let mut workbook = XlsxWorkbook::from_package("book.xlsx", xlsx_package(&[("S", sheet)], &[], true)).unwrap();
        assert_eq!(workbook.read_grid("S").unwrap().get(0, 0), Some("1904-01-01"));
    }

    #[test]
    fn missing_sheet_and_bad_shared_string() {
        let sheet = r#"<row r="1"><c r="A1" t="s"><v>9</v></c></row>"#;
        let mut workbook = XlsxWorkbook::from_package("book.xlsx", xlsx_package(&[("S", sheet)], &[], false)).unwrap();
        assert!(matches!(
            workbook.read_grid("Other"),
            Err(DatabookError::SpreadsheetError(SpreadsheetError::SheetNotFound(..)))
        ));
        assert!(matches!(
            workbook.read_grid("S"),
            Err(DatabookError::SpreadsheetError(SpreadsheetError::SharedStringOutOfRange(..)))
        ));
    }

    #[test]
    fn workbook_without_sheets_is_rejected() {
        let result = XlsxWorkbook::from_package("book.xlsx", xlsx_package(&[], &[], false));
        assert!(matches!(result, Err(DatabookError::SpreadsheetError(SpreadsheetError::EmptyWorkbook(_)))));
    }
}
