use std::error::Error;
use std::fmt;

/// Pipeline-level failures. Single-source query failures are not represented
/// here: they are absorbed into `ModelResponse.error` and only escalate when
/// an entire batch fails.
#[derive(Debug, Clone, PartialEq)]
pub enum AnalysisError {
    /// Missing credential, zero selected sources, or a region-specific run
    /// without a region. Checked before any network activity starts.
    Configuration(String),
    /// Every source in the fan-out failed, usually a bad credential.
    TotalFailure { attempted: usize },
    /// Normalization was requested with no extractable items.
    EmptyInput,
    /// The normalizer call itself failed (network, transport, empty reply).
    NormalizationQuery(String),
    /// The normalizer replied but no extraction strategy yielded a JSON map.
    NormalizationParse(String),
    /// A recalculation was requested after filtering out every source.
    Recalculation,
}

impl fmt::Display for AnalysisError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnalysisError::Configuration(reason) => {
                write!(f, "configuration error: {}", reason)
            }
            AnalysisError::TotalFailure { attempted } => write!(
                f,
                "all {} sources failed; check your API credential and retry",
                attempted
            ),
            AnalysisError::EmptyInput => {
                write!(f, "no valid items to normalize")
            }
            AnalysisError::NormalizationQuery(reason) => {
                write!(f, "normalization query failed: {}", reason)
            }
            AnalysisError::NormalizationParse(reason) => {
                write!(f, "no valid JSON found in normalizer response: {}", reason)
            }
            AnalysisError::Recalculation => {
                write!(f, "recalculation requires at least one retained source")
            }
        }
    }
}

impl Error for AnalysisError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_messages_are_actionable() {
        let err = AnalysisError::TotalFailure { attempted: 5 };
        assert!(err.to_string().contains("all 5 sources failed"));
        assert!(err.to_string().contains("credential"));

        let err = AnalysisError::Configuration("no sources selected".to_string());
        assert!(err.to_string().contains("no sources selected"));
    }
}
