//! Lookup of workbook parts inside the xlsx ZIP container.

use crate::error::DatabookError;
use crate::helpers::xml::XmlReader;
use std::io::BufReader;
use std::io::Read;
use std::io::Seek;
use zip::read::ZipFile;
use zip::result::ZipError;
use zip::ZipArchive;

pub(crate) trait ZipHelper<RS: Read + Seek> {
    /// Entry by name, ignoring ASCII case and path separator style.
    fn file(&'_ mut self, name: &str) -> Result<Option<ZipFile<'_, RS>>, DatabookError>;

    /// XML reader over the entry `name`, if present.
    fn xml_reader(&'_ mut self, name: &str) -> Result<Option<XmlReader<BufReader<ZipFile<'_, RS>>>>, DatabookError>;
}

impl<RS: Read + Seek> ZipHelper<RS> for ZipArchive<RS> {
    fn file(&'_ mut self, name: &str) -> Result<Option<ZipFile<'_, RS>>, DatabookError> {
        let pattern = name.replace('\\', "/");
        let path = self
            .file_names()
            .find(|file_name| pattern.eq_ignore_ascii_case(file_name))
            .map(str::to_owned);
        match path.map(|file_name| self.by_name(&file_name)).transpose() {
            Ok(file) => Ok(file),
            Err(ZipError::FileNotFound) => Ok(None),
            Err(error) => Err(error)?,
        }
    }

    fn xml_reader(&'_ mut self, name: &str) -> Result<Option<XmlReader<BufReader<ZipFile<'_, RS>>>>, DatabookError> {
        Ok(self.file(name)?.map(|file| XmlReader::new(BufReader::new(file))))
    }
}
