pub mod field_value;

// Re-export types for convenience.
pub use crate::types::field_value::FieldValue;
