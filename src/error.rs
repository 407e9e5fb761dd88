use thiserror::Error;

#[derive(Debug, Error)]
pub enum SimulationError {
    #[error("Invalid input: {field} — {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("No cash-kind product configured; exactly one is required")]
    MissingCashProduct,

    #[error("More than one cash-kind product configured: {}", .0.join(", "))]
    MultipleCashProducts(Vec<String>),

    #[error("Duplicate product name: {0}")]
    DuplicateProductName(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = SimulationError::InvalidInput {
            field: "years".into(),
            reason: "must be representable".into(),
        };
        assert_eq!(err.to_string(), "Invalid input: years — must be representable");

        let err = SimulationError::MultipleCashProducts(vec!["a".into(), "b".into()]);
        assert_eq!(
            err.to_string(),
            "More than one cash-kind product configured: a, b"
        );

        let err = SimulationError::DuplicateProductName("livret".into());
        assert_eq!(err.to_string(), "Duplicate product name: livret");
    }
}
