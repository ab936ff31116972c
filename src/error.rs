use thiserror::Error;

/// Structural problems in the loaded artifact bundle. All of these are fatal
/// at startup: a bundle that trips one of them does not match the code that
/// is trying to use it.
#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("artifact shape mismatch: {0}")]
    Shape(String),

    #[error("{table} table references code {code} outside the {encoder} encoder")]
    StaleStats {
        table: &'static str,
        encoder: &'static str,
        code: u32,
    },
}

#[derive(Debug, Error, PartialEq)]
pub enum PredictError {
    #[error("unknown {kind}: {label}")]
    UnknownLabel { kind: &'static str, label: String },

    #[error("feature length mismatch: got {got}, expected {expected}")]
    FeatureLength { got: usize, expected: usize },

    #[error("unknown feature name: {0}")]
    UnknownFeature(String),

    #[error("qualifying position {0} is outside 1..=20")]
    QualifyingRange(i32),
}
