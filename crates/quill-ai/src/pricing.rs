//! Model pricing registry with a public lookup API.
//!
//! Rates are dollars per million tokens. The table is static; switching
//! a session to a model outside it is rejected up front rather than
//! billed at a guessed rate.

use crate::error::{Error, Result};

/// Pricing entry for one model variant
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModelRate {
    /// Model identifier sent to the API (e.g. "claude-sonnet-4-5-20250929")
    pub id: &'static str,
    /// Human-readable name
    pub name: &'static str,
    /// Dollars per million input tokens
    pub input_per_mtok: f64,
    /// Dollars per million output tokens
    pub output_per_mtok: f64,
}

const MODEL_RATES: &[ModelRate] = &[
    ModelRate {
        id: "claude-sonnet-4-5-20250929",
        name: "Claude Sonnet 4.5",
        input_per_mtok: 3.0,
        output_per_mtok: 15.0,
    },
    ModelRate {
        id: "claude-opus-4-20250514",
        name: "Claude Opus 4",
        input_per_mtok: 15.0,
        output_per_mtok: 75.0,
    },
    ModelRate {
        id: "claude-sonnet-4-20250514",
        name: "Claude Sonnet 4",
        input_per_mtok: 3.0,
        output_per_mtok: 15.0,
    },
];

/// Look up the rate for a model by ID.
pub fn rate_for(model: &str) -> Result<&'static ModelRate> {
    MODEL_RATES
        .iter()
        .find(|r| r.id == model)
        .ok_or_else(|| Error::UnknownModel(model.to_string()))
}

/// All registered models, in display order.
pub fn all() -> &'static [ModelRate] {
    MODEL_RATES
}

/// The model used when neither config nor CLI selects one.
pub fn default_model() -> &'static ModelRate {
    &MODEL_RATES[0]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_for_known_model() {
        let rate = rate_for("claude-sonnet-4-5-20250929").unwrap();
        assert_eq!(rate.input_per_mtok, 3.0);
        assert_eq!(rate.output_per_mtok, 15.0);
    }

    #[test]
    fn test_rate_for_opus() {
        let rate = rate_for("claude-opus-4-20250514").unwrap();
        assert_eq!(rate.input_per_mtok, 15.0);
        assert_eq!(rate.output_per_mtok, 75.0);
    }

    #[test]
    fn test_rate_for_unknown_model() {
        let err = rate_for("gpt-5").unwrap_err();
        assert!(matches!(err, Error::UnknownModel(m) if m == "gpt-5"));
    }

    #[test]
    fn test_default_model_is_registered() {
        assert!(rate_for(default_model().id).is_ok());
    }
}
