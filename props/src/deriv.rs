//! Sensitivities of a physical property with respect to the model.
//!
//! A [`Deriv`] is the Jacobian `∂p/∂m` of a mapping evaluated at a model.
//! Elementwise mappings produce a [`Deriv::Diagonal`]; anything else can be
//! expressed as a [`Deriv::Dense`] matrix. [`Deriv::Zero`] is the
//! additive-identity sentinel returned whenever no mapping contributes a
//! derivative: it absorbs under `*` and vanishes under `+`, so downstream
//! chain-rule code never has to special-case an unmapped property.
//!
//! # Panics
//!
//! Combining two non-zero sensitivities of incompatible shapes panics, the
//! same way `ndarray` arithmetic does.

use std::ops::{Add, Mul, Neg};

use ndarray::{Array1, Array2, Axis};

/// Jacobian of a physical property with respect to the model.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Deriv {
    /// No contribution. Acts as `0` under addition and multiplication.
    #[default]
    Zero,
    /// A diagonal matrix, stored as its diagonal.
    Diagonal(Array1<f64>),
    /// A full matrix with one row per property cell and one column per
    /// model parameter.
    Dense(Array2<f64>),
}

impl Deriv {
    /// The identity sensitivity of size `n`.
    #[must_use]
    pub fn identity(n: usize) -> Self {
        Deriv::Diagonal(Array1::ones(n))
    }

    /// Returns true for the additive-identity sentinel.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        matches!(self, Deriv::Zero)
    }

    /// Applies the sensitivity to a model perturbation `v` (a Jacobian-vector
    /// product). [`Deriv::Zero`] maps every `v` to zeros of the same length.
    #[must_use]
    pub fn apply(&self, v: &Array1<f64>) -> Array1<f64> {
        match self {
            Deriv::Zero => Array1::zeros(v.len()),
            Deriv::Diagonal(d) => d * v,
            Deriv::Dense(m) => m.dot(v),
        }
    }

    /// Materialises the sensitivity as an `n × n` matrix.
    ///
    /// `n` is only consulted for [`Deriv::Zero`], which has no shape of its own.
    #[must_use]
    pub fn to_dense(&self, n: usize) -> Array2<f64> {
        match self {
            Deriv::Zero => Array2::zeros((n, n)),
            Deriv::Diagonal(d) => Array2::from_diag(d),
            Deriv::Dense(m) => m.clone(),
        }
    }

    /// Short name of the variant, used in logs and error messages.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Deriv::Zero => "zero",
            Deriv::Diagonal(_) => "diagonal",
            Deriv::Dense(_) => "dense",
        }
    }
}

impl Add for Deriv {
    type Output = Deriv;

    fn add(self, rhs: Deriv) -> Deriv {
        match (self, rhs) {
            (Deriv::Zero, other) | (other, Deriv::Zero) => other,
            (Deriv::Diagonal(a), Deriv::Diagonal(b)) => Deriv::Diagonal(a + b),
            (Deriv::Dense(m), Deriv::Diagonal(d)) | (Deriv::Diagonal(d), Deriv::Dense(m)) => {
                let mut m = m;
                let mut diag = m.diag_mut();
                diag += &d;
                Deriv::Dense(m)
            }
            (Deriv::Dense(a), Deriv::Dense(b)) => Deriv::Dense(a + b),
        }
    }
}

/// Matrix product: `(A * B)` is the sensitivity of `A ∘ B` when `A` is
/// evaluated at `B`'s output. This is the chain rule used by
/// [`ComboMap`](crate::maps::ComboMap).
impl Mul for Deriv {
    type Output = Deriv;

    fn mul(self, rhs: Deriv) -> Deriv {
        match (self, rhs) {
            (Deriv::Zero, _) | (_, Deriv::Zero) => Deriv::Zero,
            (Deriv::Diagonal(a), Deriv::Diagonal(b)) => Deriv::Diagonal(a * b),
            // diag(a) · M scales row i by a[i]
            (Deriv::Diagonal(a), Deriv::Dense(m)) => {
                Deriv::Dense(m * &a.view().insert_axis(Axis(1)))
            }
            // M · diag(b) scales column j by b[j]
            (Deriv::Dense(m), Deriv::Diagonal(b)) => Deriv::Dense(m * &b),
            (Deriv::Dense(a), Deriv::Dense(b)) => Deriv::Dense(a.dot(&b)),
        }
    }
}

impl Mul<f64> for Deriv {
    type Output = Deriv;

    fn mul(self, k: f64) -> Deriv {
        match self {
            Deriv::Zero => Deriv::Zero,
            Deriv::Diagonal(d) => Deriv::Diagonal(d * k),
            Deriv::Dense(m) => Deriv::Dense(m * k),
        }
    }
}

impl Neg for Deriv {
    type Output = Deriv;

    fn neg(self) -> Deriv {
        self * -1.0
    }
}
