// ============================================================================
// Numeric Module
// The arbitrary-precision float value type
// ============================================================================
//
// This module provides:
// - Float: immutable value owning one native engine handle
// - FloatValue / Operand: accepted construction sources and operands
// - FloatError: error types for construction, arithmetic and rendering
//
// Design principles:
// - Every operation returns Result; Display reports faults as fmt::Error
// - Arithmetic yields new values, never mutates
// - Options are stored only when given explicitly

mod errors;
mod float;
mod value;

pub use errors::{FloatError, FloatResult};
pub use float::Float;
pub use value::{FloatValue, Operand};
