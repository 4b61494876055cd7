//! Request-side gating and assembly, and response-side population.

pub mod input;
pub mod output;
pub mod readiness;
pub mod request;

pub use input::{CoercionError, coerce_input};
pub use output::{clear_values, display_text, populate_values, result_detail};
pub use readiness::{is_ready_to_execute, missing_required};
pub use request::{AssemblyError, assemble_request};
