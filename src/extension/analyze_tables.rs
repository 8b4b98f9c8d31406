use crate::error::DatabookError;
use crate::extension::extract_workbooks;
use crate::extension::writer::write_count;
use crate::extension::writer::write_double;
use crate::extension::writer::write_position;
use crate::extension::writer::write_text;
use crate::extension::ExtractParameters;
use crate::extension::Param;
use crate::extension::PathParam;
use crate::facts::sheet::SheetExtraction;
use duckdb::core::DataChunkHandle;
use duckdb::core::LogicalTypeHandle;
use duckdb::core::LogicalTypeId;
use duckdb::vtab::BindInfo;
use duckdb::vtab::InitInfo;
use duckdb::vtab::TableFunctionInfo;
use duckdb::vtab::VTab;
use std::error::Error;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;

const COLUMNS: [(&str, LogicalTypeId); 20] = [
    ("file", LogicalTypeId::Varchar),
    ("sheet", LogicalTypeId::Varchar),
    ("table_range", LogicalTypeId::Varchar),
    ("table_r0", LogicalTypeId::Bigint),
    ("table_c0", LogicalTypeId::Bigint),
    ("table_r1", LogicalTypeId::Bigint),
    ("table_c1", LogicalTypeId::Bigint),
    ("header_rows", LogicalTypeId::Bigint),
    ("header_cols", LogicalTypeId::Bigint),
    ("inferred_table_name", LogicalTypeId::Varchar),
    ("unit", LogicalTypeId::Varchar),
    ("scale", LogicalTypeId::Double),
    ("unit_evidence", LogicalTypeId::Varchar),
    ("overrides", LogicalTypeId::Bigint),
    ("facts", LogicalTypeId::Bigint),
    ("blank", LogicalTypeId::Bigint),
    ("error_code", LogicalTypeId::Bigint),
    ("dash", LogicalTypeId::Bigint),
    ("non_numeric", LogicalTypeId::Bigint),
    ("generic_heading", LogicalTypeId::Varchar),
];

#[repr(C)]
/// Extraction results of every selected sheet, addressed per table.
pub(crate) struct AnalyzeTablesBindData {
    sheets: Vec<SheetExtraction>,
    /// (sheet index, table index) per output row
    indexes: Vec<(usize, usize)>,
}

impl TryFrom<&ExtractParameters> for AnalyzeTablesBindData {
    type Error = DatabookError;

    fn try_from(parameters: &ExtractParameters) -> Result<Self, Self::Error> {
        let sheets = extract_workbooks(parameters)?;
        let indexes = sheets
            .iter()
            .enumerate()
            .flat_map(|(sheet_index, sheet)| (0..sheet.tables.len()).map(move |table_index| (sheet_index, table_index)))
            .collect();
        Ok(AnalyzeTablesBindData { sheets, indexes })
    }
}

#[repr(C)]
pub(crate) struct AnalyzeTablesInitData {
    index: AtomicUsize,
}

/// `analyze_tables(path, ...)`: one row per detected table.
pub(crate) struct AnalyzeTablesTableFunction;

impl VTab for AnalyzeTablesTableFunction {
    type InitData = AnalyzeTablesInitData;
    type BindData = AnalyzeTablesBindData;

    fn bind(bind: &BindInfo) -> Result<Self::BindData, Box<dyn Error>> {
        let parameters = ExtractParameters::try_from(bind)?;
        let data = AnalyzeTablesBindData::try_from(&parameters)?;
        for (name, kind) in COLUMNS {
            bind.add_result_column(name, LogicalTypeHandle::from(kind));
        }
        Ok(data)
    }

    fn init(_: &InitInfo) -> Result<Self::InitData, Box<dyn Error>> {
        Ok(AnalyzeTablesInitData {
            index: AtomicUsize::new(0),
        })
    }

    fn func(func: &TableFunctionInfo<Self>, output: &mut DataChunkHandle) -> Result<(), Box<dyn Error>> {
        let init = func.get_init_data();
        let bind = func.get_bind_data();
        let lower = init.index.fetch_add(2048, Ordering::Relaxed);
        let upper = bind.indexes.len().min(lower + 2048);
        if lower < upper {
            let mut vectors: Vec<_> = (0..COLUMNS.len()).map(|index| output.flat_vector(index)).collect();
            for (row, (sheet_index, table_index)) in bind.indexes[lower..upper].iter().enumerate() {
                let sheet = &bind.sheets[*sheet_index];
                let table = &sheet.tables[*table_index];
                let default = &table.units.default;
                write_text(&mut vectors[0], row, Some(sheet.file.as_str()));
                write_text(&mut vectors[1], row, Some(sheet.sheet.as_str()));
                write_text(&mut vectors[2], row, Some(table.rect.reference().as_str()));
                write_position(&mut vectors[3], row, table.rect.r0);
                write_position(&mut vectors[4], row, table.rect.c0);
                write_position(&mut vectors[5], row, table.rect.r1);
                write_position(&mut vectors[6], row, table.rect.c1);
                write_count(&mut vectors[7], row, table.depths.header_rows);
                write_count(&mut vectors[8], row, table.depths.header_cols);
                write_text(&mut vectors[9], row, Some(table.table_name.as_str()));
                write_text(&mut vectors[10], row, Some(default.unit.as_str()));
                write_double(&mut vectors[11], row, Some(default.scale));
                write_text(&mut vectors[12], row, Some(default.evidence.as_str()).filter(|evidence| !evidence.is_empty()));
                write_count(&mut vectors[13], row, table.units.overrides.len());
                write_count(&mut vectors[14], row, table.facts.len());
                write_count(&mut vectors[15], row, table.skipped.blank);
                write_count(&mut vectors[16], row, table.skipped.error_code);
                write_count(&mut vectors[17], row, table.skipped.dash);
                write_count(&mut vectors[18], row, table.skipped.non_numeric);
                write_text(&mut vectors[19], row, Some(sheet.generic_heading.as_str()).filter(|heading| !heading.is_empty()));
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
