use thiserror::Error;

/// Errors raised by the analysis pipeline.
///
/// Configuration problems are reported before any iterative work starts.
/// Non-convergence is not an error: models carry a `converged` flag instead.
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("corpus is empty")]
    EmptyCorpus,

    #[error("no terms remain after document-frequency filtering (min_df={min_df}, max_df={max_df})")]
    EmptyVocabulary { min_df: String, max_df: String },

    #[error("invalid parameter {param}={value}: {constraint}")]
    InvalidParameter {
        param: &'static str,
        value: String,
        constraint: &'static str,
    },

    #[error("negative value {value} at ({row}, {col}); input must be non-negative")]
    NegativeInput { row: usize, col: usize, value: f64 },

    #[error("ingest failed at record {row}: {message}")]
    Ingest { row: usize, message: String },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("cbor error: {0}")]
    Cbor(#[from] serde_cbor::Error),

    #[error("config error: {0}")]
    Json(#[from] serde_json::Error),
}

impl AnalysisError {
    pub(crate) fn invalid(param: &'static str, value: impl ToString, constraint: &'static str) -> Self {
        AnalysisError::InvalidParameter {
            param,
            value: value.to_string(),
            constraint,
        }
    }

    /// true for errors caused by the caller's parameters or corpus shape
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            AnalysisError::EmptyCorpus
                | AnalysisError::EmptyVocabulary { .. }
                | AnalysisError::InvalidParameter { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, AnalysisError>;
