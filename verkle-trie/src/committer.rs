use banderwagon::{multi_scalar_mul, Element, Fr};
use ipa_multipoint::crs::CRS;
use once_cell::sync::Lazy;
use std::sync::Arc;

/// Fixed-basis committer over the CRS generators.
///
/// Node commitments only ever combine scalars with the fixed generators, so
/// the trie holds one committer and never touches the blinding generator of
/// the full CRS.
pub struct Committer {
    g: Vec<Element>,
}

impl Committer {
    pub fn new(points: &[Element]) -> Committer {
        Committer {
            g: points.to_vec(),
        }
    }

    /// Commits to a dense vector of at most [`NODE_WIDTH`] scalars.
    ///
    /// [`NODE_WIDTH`]: crate::constant::NODE_WIDTH
    pub fn commit_lagrange(&self, evaluations: &[Fr]) -> Element {
        multi_scalar_mul(&self.g[..evaluations.len()], evaluations)
    }

    /// Multiplies a single scalar by the generator at `lagrange_index`.
    pub fn mul_index(&self, value: Fr, lagrange_index: usize) -> Element {
        self.g[lagrange_index] * value
    }

    /// Commits to a sparse vector given as `(index, value)` pairs. Node
    /// vectors are mostly zero, so this avoids a full-width MSM.
    pub fn commit_sparse(&self, values: &[(usize, Fr)]) -> Element {
        values
            .iter()
            .map(|(index, value)| self.mul_index(*value, *index))
            .sum()
    }
}

static SHARED_COMMITTER: Lazy<Arc<Committer>> =
    Lazy::new(|| Arc::new(Committer::new(&CRS::default().G)));

/// The process-wide committer over the default CRS. Building the CRS is
/// expensive, so all tries share one instance unless a caller injects its
/// own key via [`VerkleTrie::with_committer`].
///
/// [`VerkleTrie::with_committer`]: crate::trie::VerkleTrie::with_committer
pub fn shared_committer() -> Arc<Committer> {
    Arc::clone(&SHARED_COMMITTER)
}

#[cfg(test)]
mod tests {
    use super::*;
    use banderwagon::trait_defs::*;

    #[test]
    fn sparse_matches_dense() {
        let committer = shared_committer();

        let mut dense = vec![Fr::zero(); 256];
        dense[0] = Fr::from(1u64);
        dense[17] = Fr::from(42u64);
        dense[255] = Fr::from(99u64);

        let sparse = [
            (0usize, Fr::from(1u64)),
            (17, Fr::from(42u64)),
            (255, Fr::from(99u64)),
        ];

        assert_eq!(
            committer.commit_lagrange(&dense),
            committer.commit_sparse(&sparse)
        );
    }

    #[test]
    fn empty_sparse_commitment_is_identity() {
        let committer = shared_committer();
        assert!(committer.commit_sparse(&[]).is_zero());
    }
}
