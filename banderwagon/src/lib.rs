//! Banderwagon is the prime-order quotient group built on top of the
//! Bandersnatch twisted Edwards curve (itself defined over the BLS12-381
//! scalar field). The quotient identifies each point `(x, y)` with
//! `(-x, -y)`, which removes the cofactor while keeping Bandersnatch's fast
//! arithmetic.

mod element;
mod error;

pub use element::{multi_scalar_mul, try_reduce_to_element, Element, Fr};
pub use error::ElementError;

/// Traits that consumers of this crate routinely need alongside [`Element`]
/// and [`Fr`], re-exported so that they do not have to depend on the
/// arkworks crates directly.
pub mod trait_defs {
    pub use ark_ff::{
        batch_inversion, batch_inversion_and_mul, AdditiveGroup, Field, One, PrimeField, Zero,
    };
    pub use ark_serialize::{CanonicalDeserialize, CanonicalSerialize};
}

use trait_defs::*;

/// Serializes a scalar to 32 little-endian bytes.
pub fn fr_to_le_bytes(fr: Fr) -> [u8; 32] {
    let mut bytes = [0u8; 32];
    fr.serialize_compressed(&mut bytes[..])
        .expect("could not serialize scalar into a 32 byte array");
    bytes
}

/// Serializes a scalar to 32 big-endian bytes.
pub fn fr_to_be_bytes(fr: Fr) -> [u8; 32] {
    let mut bytes = fr_to_le_bytes(fr);
    bytes.reverse();
    bytes
}

/// Deserializes a scalar from 32 little-endian bytes, rejecting
/// non-canonical values.
pub fn fr_from_le_bytes(bytes: &[u8]) -> Result<Fr, ElementError> {
    if bytes.len() != 32 {
        return Err(ElementError::InvalidLength {
            expected: 32,
            got: bytes.len(),
        });
    }
    Fr::deserialize_compressed(bytes).map_err(|_| ElementError::NonCanonicalScalar)
}

/// Deserializes a scalar from 32 big-endian bytes, rejecting non-canonical
/// values.
pub fn fr_from_be_bytes(bytes: &[u8]) -> Result<Fr, ElementError> {
    let mut le_bytes: [u8; 32] = bytes.try_into().map_err(|_| ElementError::InvalidLength {
        expected: 32,
        got: bytes.len(),
    })?;
    le_bytes.reverse();
    Fr::deserialize_compressed(&le_bytes[..]).map_err(|_| ElementError::NonCanonicalScalar)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ark_ff::BigInteger;
    use ark_std::{test_rng, UniformRand};

    #[test]
    fn fr_byte_roundtrips() {
        let mut rng = test_rng();
        for _ in 0..32 {
            let scalar = Fr::rand(&mut rng);

            let le = fr_to_le_bytes(scalar);
            assert_eq!(fr_from_le_bytes(&le).unwrap(), scalar);

            let be = fr_to_be_bytes(scalar);
            assert_eq!(fr_from_be_bytes(&be).unwrap(), scalar);

            let mut reversed = le;
            reversed.reverse();
            assert_eq!(be, reversed);
        }
    }

    #[test]
    fn fr_rejects_non_canonical_scalar() {
        let modulus_le = <Fr as PrimeField>::MODULUS.to_bytes_le();
        assert_eq!(
            fr_from_le_bytes(&modulus_le),
            Err(ElementError::NonCanonicalScalar)
        );

        let modulus_be = <Fr as PrimeField>::MODULUS.to_bytes_be();
        assert_eq!(
            fr_from_be_bytes(&modulus_be),
            Err(ElementError::NonCanonicalScalar)
        );

        assert_eq!(
            fr_from_le_bytes(&[0u8; 16]),
            Err(ElementError::InvalidLength {
                expected: 32,
                got: 16
            })
        );
    }
}
