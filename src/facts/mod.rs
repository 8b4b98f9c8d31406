//! Turning detected tables into normalized numeric facts.

pub(crate) mod assemble;
pub(crate) mod naming;
pub(crate) mod sheet;
pub(crate) mod unit;
pub(crate) mod value;
