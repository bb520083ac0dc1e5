use thiserror::Error;

/// Failure modes of point and scalar deserialization.
///
/// These errors are reserved for byte strings that are not valid encodings at
/// all. A well-formed proof that fails its cryptographic check is reported as
/// `false` by the protocol layers, never as an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ElementError {
    /// The input is not the exact size the encoding requires.
    #[error("invalid encoding length: expected {expected} bytes, got {got}")]
    InvalidLength { expected: usize, got: usize },
    /// A coordinate is numerically greater than or equal to the base field
    /// modulus.
    #[error("coordinate is not a canonical base field element")]
    NonCanonicalCoordinate,
    /// A scalar is numerically greater than or equal to the scalar field
    /// modulus.
    #[error("scalar is not a canonical scalar field element")]
    NonCanonicalScalar,
    /// The coordinates do not satisfy the curve equation.
    #[error("point is not on the curve")]
    PointNotOnCurve,
    /// The supplied y-coordinate is a valid root of the curve equation but
    /// not the canonical (lexicographically largest) one.
    #[error("y-coordinate does not correspond to the x-coordinate")]
    YCoordinateMismatch,
    /// The point is on the curve but outside the prime-order quotient group.
    #[error("point is not in the prime-order subgroup")]
    PointNotInSubgroup,
}
