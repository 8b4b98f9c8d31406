use crate::error::DatabookError;
use crate::extension::list_sheets;
use crate::extension::writer::write_double;
use crate::extension::writer::write_text;
use crate::extension::ExtractParameters;
use crate::extension::Param;
use crate::extension::PathParam;
use crate::taxonomy::enrich::KnownSheet;
use crate::taxonomy::enrich::KnownSheets;
use crate::taxonomy::sheet::SheetMatcher;
use duckdb::core::DataChunkHandle;
use duckdb::core::LogicalTypeHandle;
use duckdb::core::LogicalTypeId;
use duckdb::vtab::BindInfo;
use duckdb::vtab::InitInfo;
use duckdb::vtab::TableFunctionInfo;
use duckdb::vtab::VTab;
use log::debug;
use std::error::Error;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;

#[repr(C)]
/// Selected sheets mapped to a canonical sheet category.
pub(crate) struct KnownSheetsBindData {
    /// (file, sheet, match) for every accepted sheet
    sheets: Vec<(String, String, KnownSheet)>,
}

impl TryFrom<&ExtractParameters> for KnownSheetsBindData {
    type Error = DatabookError;

    fn try_from(parameters: &ExtractParameters) -> Result<Self, Self::Error> {
        let pairs = list_sheets(&parameters.files, &parameters.sheets)?;
        let matcher = SheetMatcher::new(parameters.config.taxonomy.sheet_threshold);
        let mut known = KnownSheets::default();
        let tagged = known.populate(pairs.iter().map(|(file, sheet)| (file.as_str(), sheet.as_str())), &matcher);
        debug!("Tagged {tagged} of {} sheet(s) with a known category", pairs.len());

        let mut sheets = Vec::with_capacity(tagged);
        for (file, sheet) in pairs {
            if let Some(found) = known.get(&file, &sheet) {
                let found = found.to_owned();
                sheets.push((file, sheet, found));
            }
        }
        Ok(KnownSheetsBindData { sheets })
    }
}

#[repr(C)]
pub(crate) struct KnownSheetsInitData {
    index: AtomicUsize,
}

/// `known_sheets(path, ...)`: one row per sheet matching a known category.
pub(crate) struct KnownSheetsTableFunction;

impl VTab for KnownSheetsTableFunction {
    type InitData = KnownSheetsInitData;
    type BindData = KnownSheetsBindData;

    fn bind(bind: &BindInfo) -> Result<Self::BindData, Box<dyn Error>> {
        let parameters = ExtractParameters::try_from(bind)?;
        let data = KnownSheetsBindData::try_from(&parameters)?;
        bind.add_result_column("file", LogicalTypeHandle::from(LogicalTypeId::Varchar));
        bind.add_result_column("sheet", LogicalTypeHandle::from(LogicalTypeId::Varchar));
        bind.add_result_column("known_sheet", LogicalTypeHandle::from(LogicalTypeId::Varchar));
        bind.add_result_column("match_score", LogicalTypeHandle::from(LogicalTypeId::Double));
        bind.add_result_column("match_rule", LogicalTypeHandle::from(LogicalTypeId::Varchar));
        Ok(data)
    }

    fn init(_: &InitInfo) -> Result<Self::InitData, Box<dyn Error>> {
        Ok(KnownSheetsInitData {
            index: AtomicUsize::new(0),
        })
    }

    fn func(func: &TableFunctionInfo<Self>, output: &mut DataChunkHandle) -> Result<(), Box<dyn Error>> {
        let init = func.get_init_data();
        let bind = func.get_bind_data();
        let lower = init.index.fetch_add(2048, Ordering::Relaxed);
        let upper = bind.sheets.len().min(lower + 2048);
        if lower < upper {
            let mut files = output.flat_vector(0);
            let mut sheets = output.flat_vector(1);
            let mut known_sheets = output.flat_vector(2);
            let mut scores = output.flat_vector(3);
            let mut rules = output.flat_vector(4);
            for (row, (file, sheet, found)) in bind.sheets[lower..upper].iter().enumerate() {
                write_text(&mut files, row, Some(file.as_str()));
                write_text(&mut sheets, row, Some(sheet.as_str()));
                write_text(&mut known_sheets, row, Some(found.known_sheet.as_str()));
                write_double(&mut scores, row, Some(found.match_score));
                write_text(&mut rules, row, Some(found.match_rule.as_str()));
            }
            output.set_len(upper - lower);
        } else {
            output.set_len(0);
        }
        Ok(())
    }

    fn parameters() -> Option<Vec<LogicalTypeHandle>> {
        Some(vec![PathParam::kind()])
    }

    fn named_parameters() -> Option<Vec<(String, LogicalTypeHandle)>> {
        Some(ExtractParameters::named_parameters())
    }
}
