//! Cost accounting from reported usage
//!
//! Costs stay full-precision here; rounding to currency display happens
//! only at the presentation surface so repeated turns never compound
//! rounding error.

use crate::session::Session;
use quill_ai::Usage;
use quill_ai::pricing::ModelRate;

/// Incremental spend for one exchange in dollars.
pub fn incremental_cost(rate: &ModelRate, usage: &Usage) -> f64 {
    usage.input_tokens as f64 * rate.input_per_mtok / 1_000_000.0
        + usage.output_tokens as f64 * rate.output_per_mtok / 1_000_000.0
}

/// Add an increment to the session's running total and return the new
/// cumulative value. Touches nothing but the cost field.
pub fn accumulate(session: &mut Session, increment: f64) -> f64 {
    session.total_cost += increment;
    session.total_cost
}
