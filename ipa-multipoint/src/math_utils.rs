use banderwagon::{trait_defs::*, Fr};

/// Computes the inner product between two scalar vectors.
pub fn inner_product(a: &[Fr], b: &[Fr]) -> Fr {
    a.iter().zip(b.iter()).map(|(a, b)| *a * b).sum()
}

/// Computes `[1, point, point^2, ..., point^(n-1)]`.
pub fn powers_of(point: Fr, n: usize) -> Vec<Fr> {
    let mut powers = Vec::with_capacity(n);
    let mut current = Fr::one();
    for _ in 0..n {
        powers.push(current);
        current *= point;
    }
    powers
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simple_vandemonde() {
        use ark_std::test_rng;
        use ark_std::UniformRand;

        let rand_fr = Fr::rand(&mut test_rng());
        let n = 100;
        let powers = powers_of(rand_fr, n);

        assert_eq!(powers[0], Fr::one());
        assert_eq!(powers[n - 1], rand_fr.pow([(n - 1) as u64]));

        for (i, power) in powers.into_iter().enumerate() {
            assert_eq!(power, rand_fr.pow([i as u64]))
        }
    }

    #[test]
    fn simple_inner_product() {
        let a = vec![Fr::from(1u64), Fr::from(2u64), Fr::from(3u64)];
        let b = vec![Fr::from(10u64), Fr::from(20u64), Fr::from(30u64)];

        // 10 + 40 + 90
        assert_eq!(inner_product(&a, &b), Fr::from(140u64));
    }
}
