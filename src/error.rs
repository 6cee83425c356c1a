use rootcause::Report;

/// The kinds of failure surfaced by setup, proving, verification and (de)serialization.
///
/// A rejected proof is not an error: verification returns `Ok(false)`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Groth16Error {
    /// A witness (or constraint system) has a different length than the key expects.
    #[error("input size mismatch: expected {expected} values, got {actual}")]
    InputSizeMismatch { expected: usize, actual: usize },
    /// The constraint matrices disagree with each other or with the declared wire counts.
    #[error("malformed constraint system")]
    MalformedConstraintSystem,
    /// The evaluation domain needed by the circuit exceeds the scalar field's FFT capacity.
    #[error("circuit too large for the scalar field's evaluation domains")]
    UnsupportedCircuitSize,
    /// Truncated stream, inconsistent header or (safe decoding) an invalid curve point.
    #[error("serialization format error")]
    SerializationFormat,
}

pub type Result<T> = std::result::Result<T, Report<Groth16Error>>;
