//! # Extension Core Module
//!
//! Parameter handling shared by the table functions, and the driver that
//! expands a path into workbooks and runs fact extraction on every selected
//! sheet.

pub(crate) mod analyze_tables;
pub(crate) mod extract_facts;
pub(crate) mod known_sheets;
pub(crate) mod writer;

use crate::config::ExtractConfig;
use crate::config::SegmentStrategy;
use crate::error::DatabookError;
use crate::error::ResultMessage;
use crate::facts::sheet::extract_sheet;
use crate::facts::sheet::SheetExtraction;
use crate::helpers::reader::UnifiedReader;
use crate::spreadsheet::criteria::SheetCriteria;
use crate::spreadsheet::open_workbook;
use duckdb::core::LogicalTypeHandle;
use duckdb::core::LogicalTypeId;
use duckdb::vtab::BindInfo;
use log::info;
use log::warn;
use thiserror::Error;

#[derive(Error, Debug)]
pub(crate) enum ExtensionError {
    #[error("Invalid parameter '{0}': {1}")]
    InvalidParameter(String, String),

    #[error("No workbook matches '{0}'")]
    NoFilesFound(String),
}

/// Positional parameter of a table function.
pub(crate) trait Param<T> {
    fn kind() -> LogicalTypeHandle;

    fn read(bind: &BindInfo, index: u64) -> Result<T, DatabookError>;
}

/// Named parameter of a table function. `read` yields `None` when unset.
pub(crate) trait NamedParam<T> {
    fn name() -> &'static str;

    fn kind() -> LogicalTypeHandle;

    fn definition() -> (String, LogicalTypeHandle) {
        (Self::name().to_owned(), Self::kind())
    }

    fn read(bind: &BindInfo) -> Result<Option<T>, DatabookError>;
}

/// Workbook path: a local file, a glob pattern, or a remote URL.
pub(crate) struct PathParam;

impl Param<Vec<String>> for PathParam {
    fn kind() -> LogicalTypeHandle {
        LogicalTypeHandle::from(LogicalTypeId::Varchar)
    }

    fn read(bind: &BindInfo, index: u64) -> Result<Vec<String>, DatabookError> {
        expand_path(&bind.get_parameter(index).to_string())
    }
}

/// Expands a glob pattern into the matching files, sorted. Remote URLs and
/// plain paths are kept as they are.
pub(crate) fn expand_path(path: &str) -> Result<Vec<String>, DatabookError> {
    if UnifiedReader::is_remote_url(path) || !path.contains(['*', '?', '[']) {
        return Ok(vec![path.to_owned()]);
    }
    let mut files = glob::glob(path)?
        .map(|entry| entry.map(|file| file.to_string_lossy().into_owned()))
        .collect::<Result<Vec<_>, _>>()?;
    if files.is_empty() {
        Err(ExtensionError::NoFilesFound(path.to_owned()))?;
    }
    files.sort();
    Ok(files)
}

pub(crate) struct SheetParam;

impl NamedParam<SheetCriteria> for SheetParam {
    fn name() -> &'static str {
        "sheet"
    }

    fn kind() -> LogicalTypeHandle {
        LogicalTypeHandle::from(LogicalTypeId::Varchar)
    }

    fn read(bind: &BindInfo) -> Result<Option<SheetCriteria>, DatabookError> {
        bind.get_named_parameter(Self::name())
            .map(|value| SheetCriteria::parse(Some(&value.to_string())))
            .transpose()
            .map_err(DatabookError::from)
    }
}

pub(crate) struct StrategyParam;

impl NamedParam<SegmentStrategy> for StrategyParam {
    fn name() -> &'static str {
        "strategy"
    }

    fn kind() -> LogicalTypeHandle {
        LogicalTypeHandle::from(LogicalTypeId::Varchar)
    }

    fn read(bind: &BindInfo) -> Result<Option<SegmentStrategy>, DatabookError> {
        let Some(value) = bind.get_named_parameter(Self::name()) else {
            return Ok(None);
        };
        let name = value.to_string();
        let strategy = SegmentStrategy::parse(&name).ok_or_else(|| {
            ExtensionError::InvalidParameter(
                Self::name().to_owned(),
                format!("'{name}' is not one of 'header_rows', 'blocks'"),
            )
        })?;
        Ok(Some(strategy))
    }
}

/// Reads a named non-negative integer, rejecting values below `minimum`.
fn read_count(bind: &BindInfo, name: &str, minimum: usize) -> Result<Option<usize>, DatabookError> {
    let Some(value) = bind.get_named_parameter(name) else {
        return Ok(None);
    };
    let text = value.to_string();
    match text.parse::<usize>() {
        Ok(count) if count >= minimum => Ok(Some(count)),
        _ => Err(ExtensionError::InvalidParameter(name.to_owned(), format!("'{text}' must be an integer >= {minimum}")).into()),
    }
}

/// Reads a named score threshold in `0..=100`.
fn read_threshold(bind: &BindInfo, name: &str) -> Result<Option<f64>, DatabookError> {
    let Some(value) = bind.get_named_parameter(name) else {
        return Ok(None);
    };
    let text = value.to_string();
    match text.parse::<f64>() {
        Ok(threshold) if (0.0..=100.0).contains(&threshold) => Ok(Some(threshold)),
        _ => Err(ExtensionError::InvalidParameter(name.to_owned(), format!("'{text}' must be a score between 0 and 100")).into()),
    }
}

pub(crate) struct MinRowsParam;

impl NamedParam<usize> for MinRowsParam {
    fn name() -> &'static str {
        "min_rows"
    }

    fn kind() -> LogicalTypeHandle {
        LogicalTypeHandle::from(LogicalTypeId::Bigint)
    }

    fn read(bind: &BindInfo) -> Result<Option<usize>, DatabookError> {
        read_count(bind, Self::name(), 1)
    }
}

pub(crate) struct MinHeaderCellsParam;

impl NamedParam<usize> for MinHeaderCellsParam {
    fn name() -> &'static str {
        "min_header_cells"
    }

    fn kind() -> LogicalTypeHandle {
        LogicalTypeHandle::from(LogicalTypeId::Bigint)
    }

    fn read(bind: &BindInfo) -> Result<Option<usize>, DatabookError> {
        read_count(bind, Self::name(), 1)
    }
}

pub(crate) struct GapRowsParam;

impl NamedParam<usize> for GapRowsParam {
    fn name() -> &'static str {
        "gap_rows"
    }

    fn kind() -> LogicalTypeHandle {
        LogicalTypeHandle::from(LogicalTypeId::Bigint)
    }

    fn read(bind: &BindInfo) -> Result<Option<usize>, DatabookError> {
        read_count(bind, Self::name(), 0)
    }
}

pub(crate) struct OutsideToleranceParam;

impl NamedParam<usize> for OutsideToleranceParam {
    fn name() -> &'static str {
        "outside_tolerance"
    }

    fn kind() -> LogicalTypeHandle {
        LogicalTypeHandle::from(LogicalTypeId::Bigint)
    }

    fn read(bind: &BindInfo) -> Result<Option<usize>, DatabookError> {
        read_count(bind, Self::name(), 0)
    }
}

pub(crate) struct MetricThresholdParam;

impl NamedParam<f64> for MetricThresholdParam {
    fn name() -> &'static str {
        "metric_threshold"
    }

    fn kind() -> LogicalTypeHandle {
        LogicalTypeHandle::from(LogicalTypeId::Double)
    }

    fn read(bind: &BindInfo) -> Result<Option<f64>, DatabookError> {
        read_threshold(bind, Self::name())
    }
}

pub(crate) struct SheetThresholdParam;

impl NamedParam<f64> for SheetThresholdParam {
    fn name() -> &'static str {
        "sheet_threshold"
    }

    fn kind() -> LogicalTypeHandle {
        LogicalTypeHandle::from(LogicalTypeId::Double)
    }

    fn read(bind: &BindInfo) -> Result<Option<f64>, DatabookError> {
        read_threshold(bind, Self::name())
    }
}

/// Parameters shared by every table function of the extension.
pub(crate) struct ExtractParameters {
    pub(crate) files: Vec<String>,
    pub(crate) sheets: SheetCriteria,
    pub(crate) config: ExtractConfig,
}

impl ExtractParameters {
    pub(crate) fn named_parameters() -> Vec<(String, LogicalTypeHandle)> {
        vec![
            SheetParam::definition(),
            StrategyParam::definition(),
            MinRowsParam::definition(),
            MinHeaderCellsParam::definition(),
            GapRowsParam::definition(),
            OutsideToleranceParam::definition(),
            MetricThresholdParam::definition(),
            SheetThresholdParam::definition(),
        ]
    }
}

impl TryFrom<&BindInfo> for ExtractParameters {
    type Error = DatabookError;

    fn try_from(bind: &BindInfo) -> Result<Self, Self::Error> {
        let mut config = ExtractConfig::default();
        if let Some(strategy) = StrategyParam::read(bind)? {
            config.segment.strategy = strategy;
        }
        if let Some(min_rows) = MinRowsParam::read(bind)? {
            config.segment.min_rows = min_rows;
        }
        if let Some(min_header_cells) = MinHeaderCellsParam::read(bind)? {
            config.segment.min_header_cells = min_header_cells;
        }
        if let Some(gap_rows) = GapRowsParam::read(bind)? {
            config.segment.gap_rows = gap_rows;
        }
        if let Some(outside_tolerance) = OutsideToleranceParam::read(bind)? {
            config.segment.outside_tolerance = outside_tolerance;
        }
        if let Some(threshold) = MetricThresholdParam::read(bind)? {
            config.taxonomy.metric_threshold = threshold;
        }
        if let Some(threshold) = SheetThresholdParam::read(bind)? {
            config.taxonomy.sheet_threshold = threshold;
        }
        Ok(ExtractParameters {
            files: PathParam::read(bind, 0)?,
            sheets: SheetParam::read(bind)?.unwrap_or_default(),
            config,
        })
    }
}

/// Selected sheet names of every workbook, in file then workbook order.
///
/// With a single file any failure is returned. With several files an
/// unreadable workbook is logged and skipped.
pub(crate) fn list_sheets(files: &[String], criteria: &SheetCriteria) -> Result<Vec<(String, String)>, DatabookError> {
    let mut sheets = Vec::new();
    for file in files {
        match open_workbook(file).with_prefix(file) {
            Ok(workbook) => sheets.extend(
                workbook
                    .sheet_names()
                    .into_iter()
                    .filter(|sheet| criteria.accept(sheet))
                    .map(|sheet| (file.to_owned(), sheet)),
            ),
            Err(error) if files.len() > 1 => warn!("Skipping workbook: {error}"),
            Err(error) => return Err(error),
        }
    }
    Ok(sheets)
}

/// Loads every selected sheet and extracts its tables and facts.
///
/// With a single file any failure is returned. With several files an
/// unreadable workbook or sheet is logged and skipped.
pub(crate) fn extract_workbooks(parameters: &ExtractParameters) -> Result<Vec<SheetExtraction>, DatabookError> {
    let tolerant = parameters.files.len() > 1;
    let mut extractions = Vec::new();
    for file in &parameters.files {
        let mut workbook = match open_workbook(file).with_prefix(file) {
            Ok(workbook) => workbook,
            Err(error) if tolerant => {
                warn!("Skipping workbook: {error}");
                continue;
            }
            Err(error) => return Err(error),
        };
        let sheet_names = workbook.sheet_names();
        for sheet in sheet_names.iter().filter(|sheet| parameters.sheets.accept(sheet)) {
            let extraction = workbook
                .read_grid(sheet)
                .and_then(|grid| extract_sheet(&grid, file, sheet, &parameters.config).map_err(DatabookError::from))
                .with_prefix(&format!("{file}!{sheet}"));
            match extraction {
                Ok(extraction) => extractions.push(extraction),
                Err(error) if tolerant => warn!("Skipping sheet: {error}"),
                Err(error) => return Err(error),
            }
        }
    }
    info!("Extracted {} sheet(s) from {} workbook(s)", extractions.len(), parameters.files.len());
    Ok(extractions)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_and_remote_paths_are_kept() {
        assert_eq!(expand_path("databook.xlsx").unwrap(), vec!["databook.xlsx"]);
        assert_eq!(expand_path("s3://bucket/*.xlsx").unwrap(), vec!["s3://bucket/*.xlsx"]);
    }

    #[test]
    fn glob_paths_are_expanded() {
        let files = expand_path("src/extension/*.rs").unwrap();
        assert!(files.contains(&"src/extension/mod.rs".to_owned()));
        assert!(files.windows(2).all(|pair| pair[0] <= pair[1]));
        assert!(matches!(
            expand_path("no_such_dir/*.xlsx"),
            Err(DatabookError::ExtensionError(ExtensionError::NoFilesFound(_)))
        ));
    }

    #[test]
    fn unreadable_single_file_is_an_error() {
        let files = vec!["missing_databook.xlsx".to_owned()];
        assert!(list_sheets(&files, &SheetCriteria::default()).is_err());

        let files = vec!["missing_databook.xlsx".to_owned(), "other_missing.xlsx".to_owned()];
        assert!(list_sheets(&files, &SheetCriteria::default()).unwrap().is_empty());
    }
}
