#![allow(non_snake_case)]

use crate::crs::CRS;
use crate::error::ProofError;
use crate::math_utils::inner_product;
use crate::transcript::{Transcript, TranscriptProtocol};
use banderwagon::{fr_from_le_bytes, fr_to_le_bytes, multi_scalar_mul, trait_defs::*, Element, Fr};
use rayon::prelude::*;
use std::iter;

/// An inner product argument that some committed polynomial evaluates to a
/// claimed value at a given point.
///
/// The argument consists of one `(L, R)` cross-commitment pair per halving
/// round plus the single scalar left after the folding, so its size is
/// logarithmic in the domain size.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IPAProof {
    pub(crate) L_vec: Vec<Element>,
    pub(crate) R_vec: Vec<Element>,
    pub(crate) a: Fr,
}

impl IPAProof {
    pub(crate) fn serialized_size(&self) -> usize {
        (self.L_vec.len() * 2 + 1) * 32
    }

    /// Deserializes a proof for a domain of `poly_degree` evaluations.
    ///
    /// The layout is fixed by the domain size: `log2(poly_degree)` points
    /// `L`, the same number of points `R`, then the final scalar. Any other
    /// length is a structural error, as is any constituent that fails point
    /// or scalar validation.
    pub fn from_bytes(bytes: &[u8], poly_degree: usize) -> Result<IPAProof, ProofError> {
        let num_rounds = poly_degree.ilog2() as usize;
        let expected = (num_rounds * 2 + 1) * 32;

        if bytes.len() < expected {
            return Err(ProofError::Truncated {
                expected,
                got: bytes.len(),
            });
        }
        if bytes.len() > expected {
            return Err(ProofError::TrailingBytes(bytes.len() - expected));
        }

        let (l_bytes, rest) = bytes.split_at(num_rounds * 32);
        let (r_bytes, a_bytes) = rest.split_at(num_rounds * 32);

        let L_vec = l_bytes
            .chunks_exact(32)
            .map(Element::from_bytes)
            .collect::<Result<Vec<_>, _>>()?;
        let R_vec = r_bytes
            .chunks_exact(32)
            .map(Element::from_bytes)
            .collect::<Result<Vec<_>, _>>()?;

        let a = fr_from_le_bytes(a_bytes).map_err(|_| ProofError::InvalidFinalScalar)?;

        Ok(IPAProof { L_vec, R_vec, a })
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(self.serialized_size());
        for L in &self.L_vec {
            bytes.extend(L.to_bytes());
        }
        for R in &self.R_vec {
            bytes.extend(R.to_bytes());
        }
        bytes.extend(fr_to_le_bytes(self.a));
        bytes
    }

    /// Verifies the proof by replaying the prover's challenges and folding
    /// the basis and the evaluation vector down to a single point.
    ///
    /// Any mismatch, structural or cryptographic, is reported as `false`.
    pub fn verify(
        &self,
        transcript: &mut Transcript,
        crs: &CRS,
        mut b_vec: Vec<Fr>,
        a_comm: Element,
        input_point: Fr,
        output_point: Fr,
    ) -> bool {
        let logn = self.L_vec.len();
        if self.R_vec.len() != logn
            || logn >= usize::BITS as usize
            || crs.n != (1usize << logn)
            || b_vec.len() != crs.n
        {
            return false;
        }

        transcript.domain_sep(b"ipa");
        transcript.append_point(b"C", &a_comm);
        transcript.append_scalar(b"input point", &input_point);
        transcript.append_scalar(b"output point", &output_point);
        let w = transcript.challenge_scalar(b"w");
        let q = crs.Q * w;

        let challenges = self.generate_challenges(transcript);
        let mut challenges_inv = challenges.clone();
        batch_inversion(&mut challenges_inv);

        // Fold the L and R cross terms into the commitment.
        let mut folded_comm = a_comm + q * output_point;
        for ((x, x_inv), (L, R)) in challenges
            .iter()
            .zip(challenges_inv.iter())
            .zip(self.L_vec.iter().zip(self.R_vec.iter()))
        {
            folded_comm += *L * *x + *R * *x_inv;
        }

        // Fold the basis and the evaluation vector with the same challenges.
        let mut g_vec = crs.G.clone();
        let mut b = &mut b_vec[..];
        let mut g = &mut g_vec[..];
        for x_inv in &challenges_inv {
            let (b_L, b_R) = halve(b);
            let (g_L, g_R) = halve(g);
            for i in 0..b_L.len() {
                b_L[i] += *x_inv * b_R[i];
                g_L[i] += g_R[i] * *x_inv;
            }
            b = b_L;
            g = g_L;
        }

        folded_comm == g[0] * self.a + q * (self.a * b[0])
    }

    /// Verifies the proof with a single multiscalar multiplication.
    ///
    /// Instead of folding the basis round by round, the per-generator folding
    /// scalars are computed directly from the challenge bits and the whole
    /// verification equation is flattened into one MSM that must equal the
    /// identity.
    pub fn verify_multiexp(
        &self,
        transcript: &mut Transcript,
        crs: &CRS,
        b_vec: Vec<Fr>,
        a_comm: Element,
        input_point: Fr,
        output_point: Fr,
    ) -> bool {
        let logn = self.L_vec.len();
        if self.R_vec.len() != logn
            || logn >= usize::BITS as usize
            || crs.n != (1usize << logn)
            || b_vec.len() != crs.n
        {
            return false;
        }
        let n = crs.n;

        transcript.domain_sep(b"ipa");
        transcript.append_point(b"C", &a_comm);
        transcript.append_scalar(b"input point", &input_point);
        transcript.append_scalar(b"output point", &output_point);
        let w = transcript.challenge_scalar(b"w");

        let challenges = self.generate_challenges(transcript);
        let mut challenges_inv = challenges.clone();
        batch_inversion(&mut challenges_inv);

        // s_i = prod_j x_j^{-1} over the rounds j where index i fell into
        // the right half of the split.
        let mut folding_scalars = vec![Fr::one(); n];
        for (round, x_inv) in challenges_inv.iter().enumerate() {
            let right_half_bit = n >> (round + 1);
            for (i, folding_scalar) in folding_scalars.iter_mut().enumerate() {
                if i & right_half_bit != 0 {
                    *folding_scalar *= x_inv;
                }
            }
        }

        let b_0 = inner_product(&folding_scalars, &b_vec);

        // The verification equation
        //   a * G_0 + (a * b_0) * (w * Q)
        //     == C + (w * y) * Q + sum_j x_j * L_j + sum_j x_j^{-1} * R_j
        // where G_0 = sum_i s_i * G_i, moved onto one side and checked as a
        // single MSM against the identity.
        let mut scalars = Vec::with_capacity(n + 2 * logn + 2);
        let mut points = Vec::with_capacity(n + 2 * logn + 2);

        for (folding_scalar, g) in folding_scalars.iter().zip(crs.G.iter()) {
            scalars.push(self.a * folding_scalar);
            points.push(*g);
        }
        scalars.push(w * (self.a * b_0 - output_point));
        points.push(crs.Q);
        scalars.push(-Fr::one());
        points.push(a_comm);
        for ((x, x_inv), (L, R)) in challenges
            .iter()
            .zip(challenges_inv.iter())
            .zip(self.L_vec.iter().zip(self.R_vec.iter()))
        {
            scalars.push(-*x);
            points.push(*L);
            scalars.push(-*x_inv);
            points.push(*R);
        }

        multi_scalar_mul(&points, &scalars).is_zero()
    }

    fn generate_challenges(&self, transcript: &mut Transcript) -> Vec<Fr> {
        self.L_vec
            .iter()
            .zip(self.R_vec.iter())
            .map(|(L, R)| {
                transcript.append_point(b"L", L);
                transcript.append_point(b"R", R);
                transcript.challenge_scalar(b"x")
            })
            .collect()
    }
}

/// Creates an opening proof that the polynomial committed by `a_comm`
/// evaluates to `<a, b>` at `input_point`.
///
/// `a_vec` holds the polynomial evaluations over the domain and `b_vec` the
/// Lagrange coefficients of `input_point`, so their inner product is the
/// claimed output. Prover inputs are trusted; the vector lengths must match
/// the (power of two) CRS capacity.
pub fn create(
    transcript: &mut Transcript,
    mut crs: CRS,
    mut a_vec: Vec<Fr>,
    a_comm: Element,
    mut b_vec: Vec<Fr>,
    input_point: Fr,
) -> IPAProof {
    transcript.domain_sep(b"ipa");

    let mut a = &mut a_vec[..];
    let mut b = &mut b_vec[..];
    let mut G = &mut crs.G[..];

    let n = G.len();
    debug_assert!(n.is_power_of_two());
    debug_assert_eq!(a.len(), n);
    debug_assert_eq!(b.len(), n);
    let num_rounds = n.ilog2() as usize;

    let output_point = inner_product(a, b);

    transcript.append_point(b"C", &a_comm);
    transcript.append_scalar(b"input point", &input_point);
    transcript.append_scalar(b"output point", &output_point);
    let w = transcript.challenge_scalar(b"w");
    let q = crs.Q * w;

    let mut L_vec: Vec<Element> = Vec::with_capacity(num_rounds);
    let mut R_vec: Vec<Element> = Vec::with_capacity(num_rounds);

    while a.len() != 1 {
        let (a_L, a_R) = halve(a);
        let (b_L, b_R) = halve(b);
        let (G_L, G_R) = halve(G);

        let z_L = inner_product(a_R, b_L);
        let z_R = inner_product(a_L, b_R);

        let C_L = slow_vartime_multiscalar_mul(
            a_R.iter().chain(iter::once(&z_L)),
            G_L.iter().chain(iter::once(&q)),
        );
        let C_R = slow_vartime_multiscalar_mul(
            a_L.iter().chain(iter::once(&z_R)),
            G_R.iter().chain(iter::once(&q)),
        );

        transcript.append_point(b"L", &C_L);
        transcript.append_point(b"R", &C_R);
        L_vec.push(C_L);
        R_vec.push(C_R);

        let x = transcript.challenge_scalar(b"x");
        let x_inv = x.inverse().expect("challenge scalar is never zero");

        for i in 0..a_L.len() {
            a_L[i] += x * a_R[i];
            b_L[i] += x_inv * b_R[i];
            G_L[i] += G_R[i] * x_inv;
        }

        a = a_L;
        b = b_L;
        G = G_L;
    }

    IPAProof {
        L_vec,
        R_vec,
        a: a[0],
    }
}

fn halve<T>(slice: &mut [T]) -> (&mut [T], &mut [T]) {
    let mid = slice.len() / 2;
    slice.split_at_mut(mid)
}

pub fn slow_vartime_multiscalar_mul<'a>(
    scalars: impl Iterator<Item = &'a Fr>,
    points: impl Iterator<Item = &'a Element>,
) -> Element {
    let scalars: Vec<Fr> = scalars.copied().collect();
    let points: Vec<Element> = points.copied().collect();
    multi_scalar_mul(&points, &scalars)
}

/// Splits a large MSM across the rayon thread pool and sums the partial
/// results.
pub fn multi_scalar_mul_par(bases: &[Element], scalars: &[Fr]) -> Element {
    if bases.is_empty() {
        return Element::zero();
    }

    let chunk_size = bases.len().div_ceil(rayon::current_num_threads());
    bases
        .par_chunks(chunk_size)
        .zip(scalars.par_chunks(chunk_size))
        .map(|(bases, scalars)| multi_scalar_mul(bases, scalars))
        .reduce(Element::zero, |a, b| a + b)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lagrange_basis::{LagrangeBasis, PrecomputedWeights};
    use ark_std::{test_rng, UniformRand};

    fn setup(n: usize) -> (CRS, PrecomputedWeights, Vec<Fr>, Element) {
        let crs = CRS::new(n, b"random seed");
        let precomp = PrecomputedWeights::new(n);

        let mut rng = test_rng();
        let poly: Vec<Fr> = (0..n).map(|_| Fr::rand(&mut rng)).collect();
        let commitment = multi_scalar_mul(&crs.G, &poly);

        (crs, precomp, poly, commitment)
    }

    #[test]
    fn create_verify_roundtrip_outside_domain() {
        let n = 32;
        let (crs, precomp, poly, commitment) = setup(n);

        let input_point = Fr::from(99999u64);
        let b = LagrangeBasis::evaluate_lagrange_coefficients(&precomp, n, input_point);
        let output_point = inner_product(&poly, &b);

        let mut prover_transcript = Transcript::new(b"ipa test");
        let proof = create(
            &mut prover_transcript,
            crs.clone(),
            poly,
            commitment,
            b.clone(),
            input_point,
        );

        let mut verifier_transcript = Transcript::new(b"ipa test");
        assert!(proof.verify(
            &mut verifier_transcript,
            &crs,
            b.clone(),
            commitment,
            input_point,
            output_point,
        ));

        // The one-MSM verifier accepts the same proof.
        let mut verifier_transcript = Transcript::new(b"ipa test");
        assert!(proof.verify_multiexp(
            &mut verifier_transcript,
            &crs,
            b,
            commitment,
            input_point,
            output_point,
        ));
    }

    #[test]
    fn create_verify_roundtrip_in_domain() {
        let n = 32;
        let (crs, precomp, poly, commitment) = setup(n);

        // Opening inside the domain uses the indicator coefficients, so the
        // claimed output is just an index operation.
        let index = 17usize;
        let input_point = Fr::from(index as u64);
        let b = LagrangeBasis::evaluate_lagrange_coefficients(&precomp, n, input_point);
        let output_point = poly[index];
        assert_eq!(inner_product(&poly, &b), output_point);

        let mut prover_transcript = Transcript::new(b"ipa test");
        let proof = create(
            &mut prover_transcript,
            crs.clone(),
            poly,
            commitment,
            b.clone(),
            input_point,
        );

        let mut verifier_transcript = Transcript::new(b"ipa test");
        assert!(proof.verify_multiexp(
            &mut verifier_transcript,
            &crs,
            b,
            commitment,
            input_point,
            output_point,
        ));
    }

    #[test]
    fn rejects_wrong_claims() {
        let n = 32;
        let (crs, precomp, poly, commitment) = setup(n);

        let input_point = Fr::from(99999u64);
        let b = LagrangeBasis::evaluate_lagrange_coefficients(&precomp, n, input_point);
        let output_point = inner_product(&poly, &b);

        let mut prover_transcript = Transcript::new(b"ipa test");
        let proof = create(
            &mut prover_transcript,
            crs.clone(),
            poly,
            commitment,
            b.clone(),
            input_point,
        );

        // Wrong output value.
        let mut transcript = Transcript::new(b"ipa test");
        assert!(!proof.verify(
            &mut transcript,
            &crs,
            b.clone(),
            commitment,
            input_point,
            output_point + Fr::one(),
        ));

        // Wrong input point (with its matching coefficients).
        let other_point = Fr::from(88888u64);
        let other_b = LagrangeBasis::evaluate_lagrange_coefficients(&precomp, n, other_point);
        let mut transcript = Transcript::new(b"ipa test");
        assert!(!proof.verify_multiexp(
            &mut transcript,
            &crs,
            other_b,
            commitment,
            other_point,
            output_point,
        ));

        // Wrong commitment.
        let mut transcript = Transcript::new(b"ipa test");
        assert!(!proof.verify_multiexp(
            &mut transcript,
            &crs,
            b,
            commitment + Element::prime_subgroup_generator(),
            input_point,
            output_point,
        ));
    }

    #[test]
    fn serialization_roundtrip_and_errors() {
        let n = 32;
        let (crs, precomp, poly, commitment) = setup(n);

        let input_point = Fr::from(99999u64);
        let b = LagrangeBasis::evaluate_lagrange_coefficients(&precomp, n, input_point);

        let mut transcript = Transcript::new(b"ipa test");
        let proof = create(&mut transcript, crs, poly, commitment, b, input_point);

        let bytes = proof.to_bytes();
        assert_eq!(bytes.len(), proof.serialized_size());
        assert_eq!(IPAProof::from_bytes(&bytes, n).unwrap(), proof);

        // Truncated and padded encodings are structural errors.
        assert_eq!(
            IPAProof::from_bytes(&bytes[..bytes.len() - 1], n),
            Err(ProofError::Truncated {
                expected: bytes.len(),
                got: bytes.len() - 1
            })
        );
        let mut padded = bytes.clone();
        padded.extend([0u8; 3]);
        assert_eq!(
            IPAProof::from_bytes(&padded, n),
            Err(ProofError::TrailingBytes(3))
        );

        // A corrupted cross commitment is a point error.
        let mut corrupted = bytes.clone();
        corrupted[..32].copy_from_slice(&[0xff; 32]);
        assert!(matches!(
            IPAProof::from_bytes(&corrupted, n),
            Err(ProofError::InvalidPoint(_))
        ));

        // A non-canonical final scalar is rejected.
        let mut corrupted = bytes;
        let len = corrupted.len();
        corrupted[len - 32..].copy_from_slice(&[0xff; 32]);
        assert_eq!(
            IPAProof::from_bytes(&corrupted, n),
            Err(ProofError::InvalidFinalScalar)
        );
    }
}
