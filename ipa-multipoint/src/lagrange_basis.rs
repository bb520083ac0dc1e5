use banderwagon::{trait_defs::*, Fr};
use std::ops::{Add, AddAssign, Mul, Sub};

/// A polynomial represented by its evaluations over the domain
/// `{0, 1, ..., n-1}`.
///
/// The commitment scheme never needs monomial coefficients; everything is
/// done directly on the evaluation form.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LagrangeBasis {
    values: Vec<Fr>,
    domain: usize,
}

impl LagrangeBasis {
    pub fn new(values: Vec<Fr>) -> LagrangeBasis {
        let domain = values.len();
        LagrangeBasis { values, domain }
    }

    /// The additive identity. Adding it to any polynomial returns that
    /// polynomial unchanged, whatever its domain size.
    pub fn zero() -> LagrangeBasis {
        LagrangeBasis {
            values: Vec::new(),
            domain: 0,
        }
    }

    pub fn values(&self) -> &[Fr] {
        &self.values
    }

    pub fn domain_size(&self) -> usize {
        self.domain
    }

    /// Evaluating at a domain point is just an index operation.
    pub fn evaluate_in_domain(&self, index: usize) -> Fr {
        self.values[index]
    }

    /// Evaluates the polynomial at a point outside of the domain using the
    /// barycentric coefficients.
    pub fn evaluate_outside_domain(&self, precomp: &PrecomputedWeights, point: Fr) -> Fr {
        let coefficients = Self::evaluate_lagrange_coefficients(precomp, self.domain, point);
        self.values
            .iter()
            .zip(coefficients)
            .map(|(value, coefficient)| coefficient * value)
            .sum()
    }

    /// Computes the vector `[L_0(point), ..., L_{n-1}(point)]` of Lagrange
    /// polynomial evaluations.
    ///
    /// When `point` is itself a domain element the barycentric formula would
    /// divide by zero, but the coefficients collapse to the indicator vector
    /// of that element, so it is returned directly.
    pub fn evaluate_lagrange_coefficients(
        precomp: &PrecomputedWeights,
        domain_size: usize,
        point: Fr,
    ) -> Vec<Fr> {
        let repr = point.into_bigint();
        if repr < Fr::from(domain_size as u64).into_bigint() {
            let mut coefficients = vec![Fr::zero(); domain_size];
            coefficients[repr.0[0] as usize] = Fr::one();
            return coefficients;
        }

        // L_i(z) = A(z) / (A'(x_i) * (z - x_i)) where A(X) is the vanishing
        // polynomial of the domain.
        let mut a_z = Fr::one();
        let mut denominators = Vec::with_capacity(domain_size);
        for i in 0..domain_size {
            let diff = point - Fr::from(i as u64);
            a_z *= diff;
            denominators.push(precomp.barycentric_weight(i) * diff);
        }

        batch_inversion_and_mul(&mut denominators, &a_z);
        denominators
    }

    /// Divides `f(X) - f(x_index)` by the linear vanishing polynomial
    /// `X - x_index`, staying in evaluation form.
    ///
    /// Away from `x_index` the quotient is a pointwise division; the value at
    /// `x_index` itself is recovered from the other evaluations through the
    /// barycentric weight ratios.
    pub fn divide_by_linear_vanishing(
        &self,
        precomp: &PrecomputedWeights,
        index: usize,
    ) -> LagrangeBasis {
        let y = self.values[index];

        let mut quotient = vec![Fr::zero(); self.domain];
        for i in 0..self.domain {
            if i == index {
                continue;
            }

            // (f_i - y) / (x_i - x_index)
            let term =
                (self.values[i] - y) * precomp.inverted_domain_element(i as isize - index as isize);
            quotient[i] = term;
            quotient[index] -= precomp.weight_ratio(index, i) * term;
        }

        LagrangeBasis::new(quotient)
    }
}

impl Add<LagrangeBasis> for LagrangeBasis {
    type Output = LagrangeBasis;

    fn add(mut self, rhs: LagrangeBasis) -> Self::Output {
        if self.values.is_empty() {
            return rhs;
        }
        if rhs.values.is_empty() {
            return self;
        }

        self.values
            .iter_mut()
            .zip(rhs.values)
            .for_each(|(lhs, rhs)| *lhs += rhs);
        self
    }
}

impl AddAssign<LagrangeBasis> for LagrangeBasis {
    fn add_assign(&mut self, rhs: LagrangeBasis) {
        if self.values.is_empty() {
            *self = rhs;
            return;
        }
        if rhs.values.is_empty() {
            return;
        }

        self.values
            .iter_mut()
            .zip(rhs.values)
            .for_each(|(lhs, rhs)| *lhs += rhs);
    }
}

impl Sub<&LagrangeBasis> for &LagrangeBasis {
    type Output = LagrangeBasis;

    fn sub(self, rhs: &LagrangeBasis) -> Self::Output {
        let values = self
            .values
            .iter()
            .zip(rhs.values.iter())
            .map(|(lhs, rhs)| *lhs - rhs)
            .collect();
        LagrangeBasis::new(values)
    }
}

impl Mul<Fr> for LagrangeBasis {
    type Output = LagrangeBasis;

    fn mul(mut self, rhs: Fr) -> Self::Output {
        self.values.iter_mut().for_each(|value| *value *= rhs);
        self
    }
}

/// Barycentric weights of the evaluation domain, computed once and shared by
/// every opening over that domain.
#[derive(Clone, Debug)]
pub struct PrecomputedWeights {
    // A'(x_j) = prod_{i != j} (x_j - x_i)
    barycentric_weights: Vec<Fr>,
    inverse_barycentric_weights: Vec<Fr>,
    // 1/1, 1/2, ..., 1/(n-1)
    inverted_domain: Vec<Fr>,
}

impl PrecomputedWeights {
    pub fn new(domain_size: usize) -> PrecomputedWeights {
        let mut barycentric_weights = Vec::with_capacity(domain_size);
        for j in 0..domain_size {
            let x_j = Fr::from(j as u64);
            let mut weight = Fr::one();
            for i in 0..domain_size {
                if i != j {
                    weight *= x_j - Fr::from(i as u64);
                }
            }
            barycentric_weights.push(weight);
        }

        let mut inverse_barycentric_weights = barycentric_weights.clone();
        batch_inversion(&mut inverse_barycentric_weights);

        let mut inverted_domain: Vec<Fr> = (1..domain_size).map(|k| Fr::from(k as u64)).collect();
        batch_inversion(&mut inverted_domain);

        PrecomputedWeights {
            barycentric_weights,
            inverse_barycentric_weights,
            inverted_domain,
        }
    }

    pub fn domain_size(&self) -> usize {
        self.barycentric_weights.len()
    }

    fn barycentric_weight(&self, index: usize) -> Fr {
        self.barycentric_weights[index]
    }

    // A'(x_numerator) / A'(x_denominator)
    fn weight_ratio(&self, numerator: usize, denominator: usize) -> Fr {
        self.barycentric_weights[numerator] * self.inverse_barycentric_weights[denominator]
    }

    // 1 / (x_i - x_j) given delta = i - j, delta != 0
    fn inverted_domain_element(&self, delta: isize) -> Fr {
        let inverse = self.inverted_domain[delta.unsigned_abs() - 1];
        if delta < 0 {
            -inverse
        } else {
            inverse
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math_utils::inner_product;

    fn domain_evaluations(domain_size: usize, f: impl Fn(u64) -> u64) -> LagrangeBasis {
        LagrangeBasis::new((0..domain_size as u64).map(|x| Fr::from(f(x))).collect())
    }

    #[test]
    fn evaluates_outside_domain() {
        // f(x) = x^3 + 2x + 5 over an 8 element domain
        let f = |x: u64| x * x * x + 2 * x + 5;
        let poly = domain_evaluations(8, f);
        let precomp = PrecomputedWeights::new(8);

        let got = poly.evaluate_outside_domain(&precomp, Fr::from(100u64));
        assert_eq!(got, Fr::from(f(100)));
    }

    #[test]
    fn coefficients_inside_domain_are_indicators() {
        let precomp = PrecomputedWeights::new(8);

        let coefficients =
            LagrangeBasis::evaluate_lagrange_coefficients(&precomp, 8, Fr::from(5u64));
        for (i, coefficient) in coefficients.iter().enumerate() {
            let expected = if i == 5 { Fr::one() } else { Fr::zero() };
            assert_eq!(*coefficient, expected);
        }

        let poly = domain_evaluations(8, |x| x * x + 1);
        assert_eq!(
            inner_product(poly.values(), &coefficients),
            poly.evaluate_in_domain(5)
        );
    }

    #[test]
    fn quotient_satisfies_division_identity() {
        // q(X) = (f(X) - f(z)) / (X - z) must satisfy
        // q(t) * (t - z) == f(t) - f(z) for t outside the domain.
        let poly = domain_evaluations(16, |x| x * x * x + 7 * x + 3);
        let precomp = PrecomputedWeights::new(16);
        let index = 3;

        let quotient = poly.divide_by_linear_vanishing(&precomp, index);

        let t = Fr::from(1234u64);
        let q_t = quotient.evaluate_outside_domain(&precomp, t);
        let f_t = poly.evaluate_outside_domain(&precomp, t);
        let f_z = poly.evaluate_in_domain(index);

        assert_eq!(q_t * (t - Fr::from(index as u64)), f_t - f_z);
    }

    #[test]
    fn zero_is_additive_identity() {
        let poly = domain_evaluations(8, |x| 3 * x + 1);

        let lhs = LagrangeBasis::zero() + poly.clone();
        assert_eq!(lhs, poly);
        let rhs = poly.clone() + LagrangeBasis::zero();
        assert_eq!(rhs, poly);
    }

    #[test]
    fn scale_and_subtract() {
        let poly_a = domain_evaluations(8, |x| x + 2);
        let poly_b = domain_evaluations(8, |x| 5 * (x + 2));

        let scaled = poly_a * Fr::from(5u64);
        assert_eq!(scaled, poly_b);

        let difference = &scaled - &poly_b;
        assert!(difference.values().iter().all(|value| value.is_zero()));
    }
}
