//! Table geometry: where tables sit in a sheet and which of their leading
//! rows and columns are labels.

pub(crate) mod header;
pub(crate) mod segment;
