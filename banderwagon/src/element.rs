use ark_ec::{twisted_edwards::TECurveConfig, PrimeGroup, ScalarMul, VariableBaseMSM};
use ark_ed_on_bls12_381_bandersnatch::{BandersnatchConfig, EdwardsAffine, EdwardsProjective, Fq};
use ark_ff::{batch_inversion, Field, One, PrimeField, Zero};
use ark_serialize::{CanonicalDeserialize, CanonicalSerialize};

use std::{
    hash::Hash,
    iter::Sum,
    ops::{Add, AddAssign, Mul, Neg, Sub},
};

use crate::error::ElementError;

pub use ark_ed_on_bls12_381_bandersnatch::Fr;

/// An element of the banderwagon group: the prime-order quotient of the
/// Bandersnatch curve which identifies each point `(x, y)` with `(-x, -y)`.
#[derive(Debug, Clone, Copy, Eq)]
pub struct Element(pub(crate) EdwardsProjective);

impl PartialEq for Element {
    /// Checks equality in the banderwagon quotient group.
    ///
    /// Points `(x, y)` and `(-x, -y)` are the same element, so instead of
    /// exact point equality this verifies `x₁/y₁ == x₂/y₂` by computing
    /// `x₁ * y₂ == x₂ * y₁` (avoiding division).
    ///
    /// Both operands must have passed the subgroup check, which excludes the
    /// points with `y = 0`.
    fn eq(&self, other: &Self) -> bool {
        (self.0.x * other.0.y) == (other.0.x * self.0.y)
    }
}

impl Element {
    /// Serializes this element to its 32-byte compressed form.
    ///
    /// The compressed form is the big-endian encoding of `sign(y) × x`:
    /// if `y` is lexicographically largest, `x` is serialized, otherwise
    /// `-x`. Since `sign(-y) × (-x) = sign(y) × x`, the two representatives
    /// of an element produce identical bytes, so the encoding is canonical.
    pub fn to_bytes(&self) -> [u8; 32] {
        let affine = EdwardsAffine::from(self.0);
        let x = if is_positive(affine.y) {
            affine.x
        } else {
            -affine.x
        };
        let mut bytes = [0u8; 32];
        x.serialize_compressed(&mut bytes[..])
            .expect("serialization failed");

        // arkworks uses little endian, reverse bytes to big endian
        bytes.reverse();
        bytes
    }

    /// Deserializes a banderwagon element from its 32-byte compressed form.
    ///
    /// The input is interpreted as a big-endian x-coordinate; the point is
    /// reconstructed with the lexicographically largest y-coordinate and
    /// then subgroup-checked. Each rejection reports which contract the
    /// input violated:
    ///
    /// - wrong size: [`ElementError::InvalidLength`]
    /// - `x >= p`: [`ElementError::NonCanonicalCoordinate`]
    /// - no matching y on the curve: [`ElementError::PointNotOnCurve`]
    /// - outside the quotient group: [`ElementError::PointNotInSubgroup`]
    ///
    /// This is the deserialization path for untrusted input.
    pub fn from_bytes(bytes: &[u8]) -> Result<Element, ElementError> {
        let mut le_bytes: [u8; 32] = bytes.try_into().map_err(|_| ElementError::InvalidLength {
            expected: 32,
            got: bytes.len(),
        })?;

        // Switch from big endian to little endian for arkworks
        le_bytes.reverse();

        let x = Fq::deserialize_compressed(&le_bytes[..])
            .map_err(|_| ElementError::NonCanonicalCoordinate)?;

        // Construct a point that is on the curve
        let point = Self::get_point_from_x(x, true).ok_or(ElementError::PointNotOnCurve)?;

        // Check if the point is in the correct subgroup
        if !subgroup_check(&point) {
            return Err(ElementError::PointNotInSubgroup);
        }

        Ok(Element(point))
    }

    /// Serializes this element to a 64-byte uncompressed `x || y` form, both
    /// coordinates big-endian.
    ///
    /// The coordinates are those of the canonical class representative (the
    /// one whose y-coordinate is lexicographically largest), so equivalent
    /// elements `(x, y)` and `(-x, -y)` serialize to identical bytes, just
    /// as with [`to_bytes`](Element::to_bytes).
    pub fn to_bytes_uncompressed(&self) -> [u8; 64] {
        let affine = EdwardsAffine::from(self.0);
        let (x, y) = if is_positive(affine.y) {
            (affine.x, affine.y)
        } else {
            (-affine.x, -affine.y)
        };

        let mut bytes = [0u8; 64];
        x.serialize_compressed(&mut bytes[..32])
            .expect("serialization failed");
        y.serialize_compressed(&mut bytes[32..])
            .expect("serialization failed");
        bytes[..32].reverse();
        bytes[32..].reverse();
        bytes
    }

    /// Deserializes a banderwagon element from the 64-byte uncompressed
    /// `x || y` form, validating every contract of the encoding.
    ///
    /// The supplied y-coordinate must be the canonical (lexicographically
    /// largest) root of the curve equation at x:
    ///
    /// - wrong size: [`ElementError::InvalidLength`]
    /// - a coordinate `>= p`: [`ElementError::NonCanonicalCoordinate`]
    /// - `(x, y)` not on the curve: [`ElementError::PointNotOnCurve`]
    /// - `(x, y)` on the curve but y is the smaller root:
    ///   [`ElementError::YCoordinateMismatch`]
    /// - outside the quotient group: [`ElementError::PointNotInSubgroup`]
    pub fn from_bytes_uncompressed(bytes: &[u8]) -> Result<Element, ElementError> {
        let bytes: &[u8; 64] = bytes.try_into().map_err(|_| ElementError::InvalidLength {
            expected: 64,
            got: bytes.len(),
        })?;

        let mut x_bytes = [0u8; 32];
        let mut y_bytes = [0u8; 32];
        x_bytes.copy_from_slice(&bytes[..32]);
        y_bytes.copy_from_slice(&bytes[32..]);
        x_bytes.reverse();
        y_bytes.reverse();

        let x = Fq::deserialize_compressed(&x_bytes[..])
            .map_err(|_| ElementError::NonCanonicalCoordinate)?;
        let y = Fq::deserialize_compressed(&y_bytes[..])
            .map_err(|_| ElementError::NonCanonicalCoordinate)?;

        let x_sq = x.square();
        let y_squared = (BandersnatchConfig::COEFF_A * x_sq - Fq::one())
            / (BandersnatchConfig::COEFF_D * x_sq - Fq::one());
        if y.square() != y_squared {
            return Err(ElementError::PointNotOnCurve);
        }
        if !is_positive(y) {
            return Err(ElementError::YCoordinateMismatch);
        }

        let point = EdwardsAffine::new_unchecked(x, y).into();
        if !subgroup_check(&point) {
            return Err(ElementError::PointNotInSubgroup);
        }

        Ok(Element(point))
    }

    pub fn prime_subgroup_generator() -> Element {
        Element(EdwardsProjective::generator())
    }

    /// Reconstructs a curve point from an x-coordinate.
    ///
    /// The Bandersnatch curve equation is `ax² + y² = 1 + dx²y²`, so
    /// `y² = (ax² - 1) / (dx² - 1)`, which always has a well-defined
    /// right-hand side because `d` is a non-square.
    ///
    /// `choose_largest` selects which of the two roots to take. Returns
    /// `None` when `y²` has no square root, i.e. the x-coordinate is not on
    /// the curve. No subgroup validation is performed here.
    fn get_point_from_x(x: Fq, choose_largest: bool) -> Option<EdwardsProjective> {
        let x_sq = x.square();
        let y_squared = (BandersnatchConfig::COEFF_A * x_sq - Fq::one())
            / (BandersnatchConfig::COEFF_D * x_sq - Fq::one());

        let y = y_squared.sqrt()?;
        let y = if is_positive(y) == choose_largest {
            y
        } else {
            -y
        };

        Some(EdwardsAffine::new_unchecked(x, y).into())
    }

    fn map_to_field(&self) -> Fq {
        self.0.x / self.0.y
    }

    // Note: This is a 2 to 1 map, but the two preimages are identified to be the same
    pub fn map_to_scalar_field(&self) -> Fr {
        let base_field = self.map_to_field();

        let mut bytes = [0u8; 32];
        base_field
            .serialize_compressed(&mut bytes[..])
            .expect("could not serialize base field element into a 32 byte array");
        Fr::from_le_bytes_mod_order(&bytes)
    }

    /// Maps a batch of elements into the scalar field, sharing one Montgomery
    /// batch inversion for all the `x/y` divisions.
    pub fn batch_map_to_scalar_field(elements: &[Element]) -> Vec<Fr> {
        let mut x_div_y = Vec::with_capacity(elements.len());
        for element in elements {
            x_div_y.push(element.0.y);
        }
        batch_inversion(&mut x_div_y);

        for (quotient, element) in x_div_y.iter_mut().zip(elements) {
            *quotient *= element.0.x;
        }

        let mut scalars = Vec::with_capacity(elements.len());
        for quotient in x_div_y {
            let mut bytes = [0u8; 32];
            quotient
                .serialize_compressed(&mut bytes[..])
                .expect("could not serialize base field element into a 32 byte array");
            scalars.push(Fr::from_le_bytes_mod_order(&bytes));
        }

        scalars
    }

    pub fn zero() -> Element {
        Element(EdwardsProjective::zero())
    }

    pub fn is_zero(&self) -> bool {
        *self == Element::zero()
    }
}

// The lexographically largest value is defined to be the positive value
fn is_positive(coordinate: Fq) -> bool {
    coordinate > -coordinate
}

/// Checks whether a point is in the banderwagon prime-order subgroup.
///
/// Assumes the input point is on the Bandersnatch curve. Subgroup membership
/// is equivalent to `1 - ax²` being a quadratic residue, which also excludes
/// the points at infinity of the (x, y) affine model.
fn subgroup_check(point: &EdwardsProjective) -> bool {
    (Fq::one() - BandersnatchConfig::COEFF_A * point.x.square())
        .legendre()
        .is_qr()
}

/// Reduces arbitrary bytes modulo the base field order and attempts to
/// decompress the result into a group element.
///
/// Used by deterministic hash-to-group point generation: a hash output that
/// does not correspond to a valid element simply yields `None` and the caller
/// moves to the next candidate.
pub fn try_reduce_to_element(bytes: &[u8]) -> Option<Element> {
    let x = Fq::from_be_bytes_mod_order(bytes);

    let point = Element::get_point_from_x(x, true)?;
    if !subgroup_check(&point) {
        return None;
    }
    Some(Element(point))
}

pub fn multi_scalar_mul(bases: &[Element], scalars: &[Fr]) -> Element {
    let bases_inner: Vec<_> = bases.iter().map(|element| element.0).collect();

    // XXX: Converting all of these to affine hurts performance
    let bases = EdwardsProjective::batch_convert_to_mul_base(&bases_inner);

    let result = EdwardsProjective::msm(&bases, scalars)
        .expect("number of bases should equal number of scalars");

    Element(result)
}

impl Mul<Fr> for Element {
    type Output = Element;

    fn mul(self, rhs: Fr) -> Self::Output {
        Element(self.0.mul(rhs))
    }
}

impl Mul<&Fr> for &Element {
    type Output = Element;

    fn mul(self, rhs: &Fr) -> Self::Output {
        Element(self.0.mul(rhs))
    }
}

impl Add<Element> for Element {
    type Output = Element;

    fn add(self, rhs: Element) -> Self::Output {
        Element(self.0 + rhs.0)
    }
}

impl AddAssign<Element> for Element {
    fn add_assign(&mut self, rhs: Element) {
        self.0 += rhs.0
    }
}

impl Sub<Element> for Element {
    type Output = Element;

    fn sub(self, rhs: Element) -> Self::Output {
        Element(self.0 - rhs.0)
    }
}

impl Neg for Element {
    type Output = Element;

    fn neg(self) -> Self::Output {
        Element(-self.0)
    }
}

/// Sums an iterator of elements, returning the group identity for an empty
/// iterator.
impl Sum for Element {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        Element(iter.map(|element| element.0).sum())
    }
}

/// Hashes the canonical byte representation, so equivalent representatives
/// hash identically and `Element` can key a `HashMap`.
impl Hash for Element {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.to_bytes().hash(state)
    }
}
