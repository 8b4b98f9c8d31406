use crate::error::DatabookError;
use std::fs::File;
use std::io::BufReader;
use std::io::Cursor;
use std::io::Read;
use std::io::Seek;
use std::io::SeekFrom;
use thiserror::Error;
use url::Url;

#[derive(Error, Debug)]
pub(crate) enum UnifiedReaderError {
    #[error("No data from remote file: '{0}'")]
    RemoteFileNoDataError(String),
}

/// Byte source of a workbook: a local file or a fetched remote blob.
pub(crate) enum UnifiedReader {
    Local(BufReader<File>),
    Remote(Cursor<Vec<u8>>),
}

impl UnifiedReader {
    /// Opens a local path, or downloads a remote URL through DuckDB `read_blob`
    /// so that DuckDB secrets and protocols (http, s3, gs, hf) apply.
    pub(crate) fn new(file_name: &str) -> Result<UnifiedReader, DatabookError> {
        if Self::is_remote_url(file_name) {
            Self::read_blob_with_duckdb(file_name)
        } else {
            Ok(UnifiedReader::Local(BufReader::new(File::open(file_name)?)))
        }
    }

    pub(crate) fn is_remote_url(file_name: &str) -> bool {
        Url::parse(file_name)
            .map(|url| url.scheme() != "file" && url.scheme().len() > 1)
            .unwrap_or(false)
    }

    fn read_blob_with_duckdb(file_name: &str) -> Result<UnifiedReader, DatabookError> {
        let connection = duckdb::Connection::open_in_memory()?;
        let result: Result<Vec<u8>, _> =
            connection.query_row("SELECT content FROM read_blob(?)", [file_name], |row| row.get(0));
        connection.close().map_err(|(_, e)| e)?;

        let bytes = result?;
        if bytes.is_empty() {
            Err(UnifiedReaderError::RemoteFileNoDataError(file_name.to_owned()))?;
        }
        Ok(UnifiedReader::Remote(Cursor::new(bytes)))
    }

    /// Reads the first `N` bytes and rewinds.
    pub(crate) fn peek<const N: usize>(&mut self) -> Result<Option<[u8; N]>, DatabookError> {
        let mut magic = [0u8; N];
        let filled = match self.read_exact(&mut magic) {
            Ok(()) => true,
            Err(error) if error.kind() == std::io::ErrorKind::UnexpectedEof => false,
            Err(error) => Err(error)?,
        };
        self.seek(SeekFrom::Start(0))?;
        Ok(filled.then_some(magic))
    }
}

impl Read for UnifiedReader {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        match self {
            UnifiedReader::Local(reader) => reader.read(buf),
            UnifiedReader::Remote(reader) => reader.read(buf),
        }
    }
}

impl Seek for UnifiedReader {
    fn seek(&mut self, pos: SeekFrom) -> std::io::Result<u64> {
        match self {
            UnifiedReader::Local(reader) => reader.seek(pos),
            UnifiedReader::Remote(reader) => reader.seek(pos),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remote_url_detection() {
        assert!(!UnifiedReader::is_remote_url("databook.xlsx"));
        assert!(!UnifiedReader::is_remote_url("/data/databook.xlsx"));
        assert!(!UnifiedReader::is_remote_url("./relative/databook.xlsx"));
        assert!(!UnifiedReader::is_remote_url("file:///data/databook.xlsx"));
        assert!(!UnifiedReader::is_remote_url("C:\\data\\databook.xlsx"));

        assert!(UnifiedReader::is_remote_url("https://example.com/databook.xlsx"));
        assert!(UnifiedReader::is_remote_url("s3://bucket/databook.xlsx"));
    }

    #[test]
    fn open_local_file() {
        assert!(UnifiedReader::new("Cargo.toml").is_ok());
        assert!(UnifiedReader::new("missing_databook.xlsx").is_err());
    }

    #[test]
    fn peek_rewinds() {
        let mut reader = UnifiedReader::Remote(Cursor::new(b"PK\x03\x04rest".to_vec()));
        assert_eq!(reader.peek::<4>().unwrap(), Some(*b"PK\x03\x04"));
        let mut all = Vec::new();
        reader.read_to_end(&mut all).unwrap();
        assert_eq!(all.len(), 8);
        assert_eq!(UnifiedReader::Remote(Cursor::new(vec![1])).peek::<8>().unwrap(), None);
    }
}
