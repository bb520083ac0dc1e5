//! Common Reference String (CRS) for the polynomial commitment scheme.
//!
//! The CRS consists of a vector of value-binding generators `G` and a
//! blinding generator `Q`, all derived deterministically from a seed with a
//! hash-to-group procedure, so the setup is reproducible and verifiable by
//! anyone.

use crate::{ipa::slow_vartime_multiscalar_mul, lagrange_basis::LagrangeBasis};
use banderwagon::{try_reduce_to_element, Element, ElementError};

/// Seed of the default CRS used by the verkle trie layer.
pub const DEFAULT_CRS_SEED: &[u8] = b"eth_verkle_oct_2021";

/// Common Reference String for the Pedersen commitment scheme.
#[allow(non_snake_case)]
#[derive(Debug, Clone)]
pub struct CRS {
    /// Capacity of the CRS (i.e., the maximum size of a vector that can be
    /// committed to using this CRS)
    pub n: usize,
    /// An array of `n` value-binding generators.
    pub G: Vec<Element>,
    /// Blinding generator.
    pub Q: Element,
}

impl Default for CRS {
    fn default() -> Self {
        CRS::new(256, DEFAULT_CRS_SEED)
    }
}

impl CRS {
    /// Creates a new CRS with `n` value-binding generators derived from the
    /// given seed.
    #[allow(non_snake_case)]
    pub fn new(n: usize, seed: &[u8]) -> CRS {
        // Generate n+1 points: n for G and 1 for Q
        let all_points = generate_random_elements(n + 1, seed);
        let (G, q_slice) = all_points.split_at(n);
        let G = G.to_vec();
        let Q = q_slice[0];

        CRS::assert_dedup(&all_points);

        CRS { n, G, Q }
    }

    /// Returns the maximum number of elements that can be committed to.
    pub fn max_number_of_elements(&self) -> usize {
        self.n
    }

    /// Reconstructs a CRS from 64-byte uncompressed point encodings, the last
    /// of which is `Q`.
    ///
    /// Every point is fully validated; a corrupted encoding surfaces as an
    /// [`ElementError`] instead of an invalid key.
    #[allow(non_snake_case)]
    pub fn from_bytes(bytes: &[[u8; 64]]) -> Result<CRS, ElementError> {
        let (q_bytes, g_vec_bytes) = bytes
            .split_last()
            .expect("bytes vector should not be empty");

        let Q = Element::from_bytes_uncompressed(q_bytes)?;
        let G = g_vec_bytes
            .iter()
            .map(|bytes| Element::from_bytes_uncompressed(bytes))
            .collect::<Result<Vec<_>, _>>()?;
        let n = G.len();
        Ok(CRS { G, Q, n })
    }

    /// Reconstructs a CRS from hex-encoded point representations.
    pub fn from_hex(hex_encoded_crs: &[&str]) -> Result<CRS, ElementError> {
        let bytes: Vec<[u8; 64]> = hex_encoded_crs
            .iter()
            .map(|hex| hex::decode(hex).expect("crs hex strings should be valid hex"))
            .map(|byte_vector| {
                byte_vector
                    .try_into()
                    .expect("crs hex strings should encode 64 bytes")
            })
            .collect();
        CRS::from_bytes(&bytes)
    }

    /// Serializes the CRS points to 64-byte uncompressed encodings, `G`
    /// first, then `Q`.
    pub fn to_bytes(&self) -> Vec<[u8; 64]> {
        let mut bytes = Vec::with_capacity(self.n + 1);
        for point in &self.G {
            bytes.push(point.to_bytes_uncompressed());
        }
        bytes.push(self.Q.to_bytes_uncompressed());
        bytes
    }

    /// Serializes the CRS to hex-encoded strings.
    pub fn to_hex(&self) -> Vec<String> {
        self.to_bytes().iter().map(hex::encode).collect()
    }

    /// Asserts that none of the generated points are duplicates.
    ///
    /// Duplicate points would break the binding property of commitments, so
    /// a CRS is refused outright rather than used degenerately.
    fn assert_dedup(points: &[Element]) {
        use std::collections::HashSet;
        let mut map = HashSet::new();
        for point in points {
            let value_is_new = map.insert(point.to_bytes());
            assert!(value_is_new, "crs has duplicated points")
        }
    }

    /// Commits to a polynomial in Lagrange basis form: the MSM of the
    /// polynomial evaluations against the `G` generators.
    pub fn commit_lagrange_poly(&self, polynomial: &LagrangeBasis) -> Element {
        slow_vartime_multiscalar_mul(polynomial.values().iter(), self.G.iter())
    }
}

impl std::ops::Index<usize> for CRS {
    type Output = Element;

    fn index(&self, index: usize) -> &Self::Output {
        &self.G[index]
    }
}

/// Generates `num_required_points` group elements with no known discrete log
/// relationships between them.
///
/// Each candidate is derived by hashing the seed concatenated with a running
/// index using SHA-256 and attempting to map the digest to a group element;
/// misses simply advance the index, so generation is deterministic for a
/// given seed.
fn generate_random_elements(num_required_points: usize, seed: &[u8]) -> Vec<Element> {
    use sha2::{Digest, Sha256};

    let hash_to_x = |index: u64| -> Vec<u8> {
        let mut hasher = Sha256::new();
        hasher.update(seed);
        hasher.update(index.to_be_bytes());
        hasher.finalize().to_vec()
    };

    (0u64..)
        .map(hash_to_x)
        .filter_map(|hash_bytes| try_reduce_to_element(&hash_bytes))
        .take(num_required_points)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use banderwagon::Fr;

    /// Verifies deterministic CRS generation produces expected points.
    ///
    /// Checks specific point values and an aggregate hash to ensure the
    /// hash-to-group algorithm remains consistent with the reference
    /// implementation.
    #[test]
    fn crs_consistency() {
        use sha2::{Digest, Sha256};

        let points = generate_random_elements(256, b"MAKE_ETHEREUM_GREAT_AGAIN");

        let bytes = points[0].to_bytes();
        assert_eq!(
            hex::encode(bytes),
            "2816c0c3ac2555ec31fd5790f97bec3ec9b87d25136507bae595567416e76b80",
            "the first point is incorrect"
        );
        let bytes = points[255].to_bytes();
        assert_eq!(
            hex::encode(bytes),
            "046e3ca0b403c4bb91b27583d57d305945cae298ce18386cd0c0a0d5d76871ab",
            "the 256th (last) point is incorrect"
        );

        let mut hasher = Sha256::new();
        for point in &points {
            let bytes = point.to_bytes();
            hasher.update(bytes);
        }
        let bytes = hasher.finalize().to_vec();
        assert_eq!(
            hex::encode(bytes),
            "e0d59418bbe04c1f4ec7493a9ed30497982d4ab5480d68b5e8ce426dd756d136",
            "unexpected point encountered"
        );
    }

    /// Tests round-trip serialization consistency for CRS byte encoding.
    #[test]
    fn load_from_bytes_to_bytes() {
        let crs = CRS::new(64, DEFAULT_CRS_SEED);
        let bytes = crs.to_bytes();
        let crs2 = CRS::from_bytes(&bytes).expect("serialized crs points are always valid");
        let bytes2 = crs2.to_bytes();

        assert_eq!(
            bytes, bytes2,
            "Round-trip serialization must preserve all data"
        );
    }

    /// Corrupting a stored CRS must surface as a typed error when reloading.
    #[test]
    fn load_rejects_corrupted_point() {
        let crs = CRS::new(4, b"random seed");
        let mut bytes = crs.to_bytes();
        bytes[1] = [0xff; 64];

        assert!(CRS::from_bytes(&bytes).is_err());
    }

    /// Distinct vectors must commit to distinct points.
    #[test]
    fn commitments_are_binding_smoke() {
        let crs = CRS::new(8, b"random seed");

        let poly_a = LagrangeBasis::new((0..8u64).map(Fr::from).collect());
        let poly_b = LagrangeBasis::new((1..9u64).map(Fr::from).collect());

        assert_ne!(
            crs.commit_lagrange_poly(&poly_a).to_bytes(),
            crs.commit_lagrange_poly(&poly_b).to_bytes()
        );
    }
}
