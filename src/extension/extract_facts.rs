use crate::error::DatabookError;
use crate::extension::extract_workbooks;
use crate::extension::writer::write_double;
use crate::extension::writer::write_position;
use crate::extension::writer::write_text;
use crate::extension::ExtractParameters;
use crate::extension::Param;
use crate::extension::PathParam;
use crate::facts::assemble::Fact;
use crate::taxonomy::enrich::KnownFact;
use crate::taxonomy::enrich::KnownFacts;
use crate::taxonomy::metric::MetricMatcher;
use duckdb::core::DataChunkHandle;
use duckdb::core::FlatVector;
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

/// Output columns, in order. Positions are one-based.
const COLUMNS: [(&str, LogicalTypeId); 18] = [
    ("file", LogicalTypeId::Varchar),
    ("sheet", LogicalTypeId::Varchar),
    ("table_r0", LogicalTypeId::Bigint),
    ("table_c0", LogicalTypeId::Bigint),
    ("row_idx", LogicalTypeId::Bigint),
    ("col_idx", LogicalTypeId::Bigint),
    ("row_header", LogicalTypeId::Varchar),
    ("col_header", LogicalTypeId::Varchar),
    ("raw_text", LogicalTypeId::Varchar),
    ("unit", LogicalTypeId::Varchar),
    ("scale", LogicalTypeId::Double),
    ("value_real", LogicalTypeId::Double),
    ("parse_status", LogicalTypeId::Varchar),
    ("inferred_table_name", LogicalTypeId::Varchar),
    ("known_value", LogicalTypeId::Varchar),
    ("known_period", LogicalTypeId::Varchar),
    ("match_score", LogicalTypeId::Double),
    ("match_rule", LogicalTypeId::Varchar),
];

#[repr(C)]
/// Every fact of the selected sheets with its taxonomy enrichment.
pub(crate) struct ExtractFactsBindData {
    facts: Vec<Fact>,
    known: KnownFacts,
}

impl TryFrom<&ExtractParameters> for ExtractFactsBindData {
    type Error = DatabookError;

    fn try_from(parameters: &ExtractParameters) -> Result<Self, Self::Error> {
        let facts: Vec<Fact> = extract_workbooks(parameters)?
            .iter()
            .flat_map(|sheet| sheet.facts().cloned())
            .collect();
        let matcher = MetricMatcher::new(parameters.config.taxonomy.metric_threshold);
        let mut known = KnownFacts::default();
        let tagged = known.populate(&facts, &matcher);
        debug!("Tagged {tagged} of {} fact(s) with a known metric", facts.len());
        Ok(ExtractFactsBindData { facts, known })
    }
}

#[repr(C)]
pub(crate) struct ExtractFactsInitData {
    index: AtomicUsize,
    projections: Vec<usize>,
}

/// `extract_facts(path, ...)`: one row per fact.
pub(crate) struct ExtractFactsTableFunction;

impl VTab for ExtractFactsTableFunction {
    type InitData = ExtractFactsInitData;
    type BindData = ExtractFactsBindData;

    fn bind(bind: &BindInfo) -> Result<Self::BindData, Box<dyn Error>> {
        let parameters = ExtractParameters::try_from(bind)?;
        let data = ExtractFactsBindData::try_from(&parameters)?;
        for (name, kind) in COLUMNS {
            bind.add_result_column(name, LogicalTypeHandle::from(kind));
        }
        Ok(data)
    }

    fn init(init: &InitInfo) -> Result<Self::InitData, Box<dyn Error>> {
        let projections = init.get_column_indices()
            .into_iter()
            .map(|index| index as usize)
            .collect();
        Ok(ExtractFactsInitData {
            index: AtomicUsize::new(0),
            projections,
        })
    }

    fn func(func: &TableFunctionInfo<Self>, output: &mut DataChunkHandle) -> Result<(), Box<dyn Error>> {
        let bind = func.get_bind_data();
        let init = func.get_init_data();
        let lower = init.index.fetch_add(2048, Ordering::Relaxed);
        let upper = bind.facts.len().min(lower + 2048);
        if lower < upper {
            let mut vectors: Vec<_> = (0..init.projections.len()).map(|index| output.flat_vector(index)).collect();
            for (row, fact) in bind.facts[lower..upper].iter().enumerate() {
                let known = bind.known.get(fact);
                for (index, column) in init.projections.iter().enumerate() {
                    write_column(&mut vectors[index], row, *column, fact, known);
                }
            }
            output.set_len(upper - lower);
        } else {
            output.set_len(0);
        }
        Ok(())
    }

    fn supports_pushdown() -> bool {
        true
    }

    fn parameters() -> Option<Vec<LogicalTypeHandle>> {
        Some(vec![PathParam::kind()])
    }

    fn named_parameters() -> Option<Vec<(String, LogicalTypeHandle)>> {
        Some(ExtractParameters::named_parameters())
    }
}

fn write_column(vector: &mut FlatVector, row: usize, column: usize, fact: &Fact, known: Option<&KnownFact>) {
    match column {
        0 => write_text(vector, row, Some(fact.file.as_str())),
        1 => write_text(vector, row, Some(fact.sheet.as_str())),
        2 => write_position(vector, row, fact.table_r0),
        3 => write_position(vector, row, fact.table_c0),
        4 => write_position(vector, row, fact.row_idx),
        5 => write_position(vector, row, fact.col_idx),
        6 => write_text(vector, row, Some(fact.row_header.as_str())),
        7 => write_text(vector, row, Some(fact.col_header.as_str())),
        8 => write_text(vector, row, Some(fact.raw_text.as_str())),
        9 => write_text(vector, row, Some(fact.unit.as_str())),
        10 => write_double(vector, row, Some(fact.scale)),
        11 => write_double(vector, row, Some(fact.value_real)),
        12 => write_text(vector, row, Some(fact.parse_status.as_str())),
        13 => write_text(vector, row, Some(fact.inferred_table_name.as_str())),
        14 => write_text(vector, row, known.map(|known| known.known_value.as_str())),
        15 => write_text(vector, row, known.and_then(|known| known.known_period).map(|period| period.to_string()).as_deref()),
        16 => write_double(vector, row, known.map(|known| known.match_score)),
        17 => write_text(vector, row, known.map(|known| known.match_rule.as_str())),
        _ => vector.set_null(row),
    }
}
