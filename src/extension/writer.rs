//! Writes result values into DuckDB output vectors.

use duckdb::core::FlatVector;
use duckdb::core::Inserter;

/// Writes a primitive value directly into the vector's data buffer.
pub(super) fn write_primitive<T>(vector: &mut FlatVector, index: usize, value: T) {
    unsafe {
        let pointer: *mut T = vector.as_mut_ptr();
        std::ptr::write(pointer.add(index), value);
    }
}

/// Writes a zero-based position as a one-based BIGINT.
pub(super) fn write_position(vector: &mut FlatVector, index: usize, position: usize) {
    write_primitive(vector, index, position as i64 + 1);
}

pub(super) fn write_count(vector: &mut FlatVector, index: usize, count: usize) {
    write_primitive(vector, index, count as i64);
}

/// Writes a string, or NULL when absent.
pub(super) fn write_text(vector: &mut FlatVector, index: usize, text: Option<&str>) {
    match text {
        Some(text) => vector.insert(index, text),
        None => vector.set_null(index),
    }
}

/// Writes a DOUBLE, or NULL when absent.
pub(super) fn write_double(vector: &mut FlatVector, index: usize, value: Option<f64>) {
    match value {
        Some(value) => write_primitive(vector, index, value),
        None => vector.set_null(index),
    }
}
