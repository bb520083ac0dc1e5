use banderwagon::ElementError;
use thiserror::Error;

/// Failure modes of proof deserialization.
///
/// These cover byte strings that are not a proof at all. A proof that decodes
/// but fails its cryptographic check is reported as `false` by `verify` and
/// `check`, never as an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ProofError {
    /// Fewer bytes than the fixed proof layout requires.
    #[error("proof encoding is truncated: expected {expected} bytes, got {got}")]
    Truncated { expected: usize, got: usize },
    /// More bytes than the fixed proof layout requires.
    #[error("proof encoding has {0} trailing bytes")]
    TrailingBytes(usize),
    /// One of the cross commitments is not a valid group element.
    #[error("invalid group element in proof: {0}")]
    InvalidPoint(#[from] ElementError),
    /// The final folded scalar is not a canonical scalar field element.
    #[error("final scalar is not a canonical scalar field element")]
    InvalidFinalScalar,
}
