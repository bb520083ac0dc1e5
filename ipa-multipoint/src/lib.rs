//! Polynomial commitment engine over the banderwagon group.
//!
//! Polynomials are represented by their evaluations over the domain
//! `{0, 1, ..., n-1}` (Lagrange basis). A single evaluation is opened with an
//! inner product argument ([`ipa`]); many openings across many polynomials
//! are batched into one argument by a random linear combination
//! ([`multiproof`]).

pub mod crs;
pub mod error;
pub mod ipa;
pub mod lagrange_basis;
pub mod math_utils;
pub mod multiproof;
pub mod transcript;

pub use error::ProofError;
