//! The mapping capability and the built-in mappings.
//!
//! A mapping turns the inversion model `m` into a physical-property array
//! `p = f(m)` and reports its sensitivity `∂p/∂m`. Mapping descriptors only
//! accept values implementing [`Mapping`]; mapping objects are shared as
//! [`MapRef`] so one transform can back several hosts.

use std::fmt;
use std::sync::Arc;

use ndarray::Array1;

use crate::deriv::Deriv;

/// Shared handle to a mapping object.
pub type MapRef = Arc<dyn Mapping>;

/// A transformation from the model to a physical property.
pub trait Mapping: fmt::Debug + Send + Sync {
    /// Short human-readable description, e.g. `"ExpMap"`.
    fn label(&self) -> String;

    /// Evaluates the mapping at `model`.
    fn apply(&self, model: &Array1<f64>) -> Array1<f64>;

    /// Sensitivity of the mapping evaluated at `model`.
    fn deriv(&self, model: &Array1<f64>) -> Deriv;

    /// The component mappings when this is a composition, outermost first.
    fn parts(&self) -> Option<&[MapRef]> {
        None
    }
}

/// `p = m`.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct IdentityMap;

impl Mapping for IdentityMap {
    fn label(&self) -> String {
        "IdentityMap".to_owned()
    }

    fn apply(&self, model: &Array1<f64>) -> Array1<f64> {
        model.clone()
    }

    fn deriv(&self, model: &Array1<f64>) -> Deriv {
        Deriv::identity(model.len())
    }
}

/// `p = exp(m)`; the usual choice for strictly positive properties
/// inverted in log space.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ExpMap;

impl Mapping for ExpMap {
    fn label(&self) -> String {
        "ExpMap".to_owned()
    }

    fn apply(&self, model: &Array1<f64>) -> Array1<f64> {
        model.mapv(f64::exp)
    }

    fn deriv(&self, model: &Array1<f64>) -> Deriv {
        Deriv::Diagonal(model.mapv(f64::exp))
    }
}

/// `p = 1 / m`, elementwise.
///
/// Composed around a reciprocal property's mapping when a mapping descriptor
/// has no stored value of its own.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ReciprocalMap;

impl Mapping for ReciprocalMap {
    fn label(&self) -> String {
        "ReciprocalMap".to_owned()
    }

    fn apply(&self, model: &Array1<f64>) -> Array1<f64> {
        model.mapv(f64::recip)
    }

    fn deriv(&self, model: &Array1<f64>) -> Deriv {
        Deriv::Diagonal(model.mapv(|x| -1.0 / (x * x)))
    }
}

/// `p = scale · m + offset`, elementwise.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearMap {
    /// Multiplicative factor.
    pub scale: f64,
    /// Additive offset.
    pub offset: f64,
}

impl LinearMap {
    /// Creates a linear map.
    #[must_use]
    pub fn new(scale: f64, offset: f64) -> Self {
        Self { scale, offset }
    }
}

impl Mapping for LinearMap {
    fn label(&self) -> String {
        format!("LinearMap({} * m + {})", self.scale, self.offset)
    }

    fn apply(&self, model: &Array1<f64>) -> Array1<f64> {
        model.mapv(|x| self.scale * x + self.offset)
    }

    fn deriv(&self, model: &Array1<f64>) -> Deriv {
        Deriv::Diagonal(Array1::from_elem(model.len(), self.scale))
    }
}

/// Composition of mappings, outermost first: `ComboMap[f, g](m) = f(g(m))`.
#[derive(Debug, Clone)]
pub struct ComboMap {
    maps: Vec<MapRef>,
}

impl ComboMap {
    /// Composes `maps`, applied right to left.
    #[must_use]
    pub fn new(maps: Vec<MapRef>) -> Self {
        Self { maps }
    }

    /// The composed mappings, outermost first.
    #[must_use]
    pub fn maps(&self) -> &[MapRef] {
        &self.maps
    }
}

impl Mapping for ComboMap {
    fn label(&self) -> String {
        let labels: Vec<String> = self.maps.iter().map(|m| m.label()).collect();
        labels.join(" * ")
    }

    fn apply(&self, model: &Array1<f64>) -> Array1<f64> {
        self.maps
            .iter()
            .rev()
            .fold(model.clone(), |acc, map| map.apply(&acc))
    }

    fn parts(&self) -> Option<&[MapRef]> {
        Some(&self.maps)
    }

    /// Chain rule: `∂(f∘g)/∂m = f'(g(m)) · g'(m)`.
    fn deriv(&self, model: &Array1<f64>) -> Deriv {
        let mut value = model.clone();
        let mut acc: Option<Deriv> = None;
        for map in self.maps.iter().rev() {
            let local = map.deriv(&value);
            acc = Some(match acc {
                None => local,
                Some(inner) => local * inner,
            });
            value = map.apply(&value);
        }
        acc.unwrap_or_else(|| Deriv::identity(model.len()))
    }
}

/// `outer * inner`: a mapping that applies `inner` first, then `outer`.
///
/// Nested combos are flattened so labels and derivatives stay linear.
#[must_use]
pub fn compose(outer: MapRef, inner: MapRef) -> MapRef {
    let mut maps = Vec::new();
    for m in [outer, inner] {
        match m.parts().map(<[MapRef]>::to_vec) {
            Some(parts) => maps.extend(parts),
            None => maps.push(m),
        }
    }
    Arc::new(ComboMap::new(maps))
}

/// Builds a built-in mapping from its short name (`identity`, `exp`,
/// `reciprocal`). Used by scenario files and the CLI.
#[must_use]
pub fn from_name(name: &str) -> Option<MapRef> {
    match name.to_ascii_lowercase().as_str() {
        "identity" | "identitymap" => Some(Arc::new(IdentityMap)),
        "exp" | "expmap" => Some(Arc::new(ExpMap)),
        "reciprocal" | "reciprocalmap" => Some(Arc::new(ReciprocalMap)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn close(a: &Array1<f64>, b: &Array1<f64>) -> bool {
        a.len() == b.len() && a.iter().zip(b).all(|(x, y)| (x - y).abs() < 1e-12)
    }

    #[test]
    fn identity_returns_model() {
        let m = array![1.0, 2.0, 4.0];
        assert_eq!(IdentityMap.apply(&m), m);
        assert_eq!(IdentityMap.deriv(&m), Deriv::Diagonal(array![1.0, 1.0, 1.0]));
    }

    #[test]
    fn reciprocal_inverts_elementwise() {
        let m = array![1.0, 2.0, 4.0];
        assert_eq!(ReciprocalMap.apply(&m), array![1.0, 0.5, 0.25]);
        assert_eq!(
            ReciprocalMap.deriv(&m),
            Deriv::Diagonal(array![-1.0, -0.25, -0.0625])
        );
    }

    #[test]
    fn exp_derivative_is_itself() {
        let m = array![0.0, 1.0];
        let Deriv::Diagonal(d) = ExpMap.deriv(&m) else {
            unreachable!("exp map has a diagonal sensitivity");
        };
        assert!(close(&d, &ExpMap.apply(&m)));
    }

    #[test]
    fn composition_applies_inner_first() {
        let m = array![0.0, 1.0];
        let combo = compose(Arc::new(ReciprocalMap), Arc::new(ExpMap));
        assert!(close(&combo.apply(&m), &array![1.0, (-1.0f64).exp()]));
        assert_eq!(combo.label(), "ReciprocalMap * ExpMap");
    }

    #[test]
    fn nested_compositions_flatten() {
        let inner = compose(Arc::new(ReciprocalMap), Arc::new(ExpMap));
        let outer = compose(Arc::new(LinearMap::new(2.0, 0.0)), inner);
        let parts = outer.parts().unwrap_or_default();
        assert_eq!(parts.len(), 3);
        let flat = ComboMap::new(parts.to_vec());
        assert_eq!(flat.maps().len(), 3);
        assert_eq!(flat.maps()[2].label(), "ExpMap");
        assert_eq!(flat.label(), outer.label());
    }

    #[test]
    fn composition_follows_chain_rule() {
        // d/dm exp(-m) = -exp(-m)
        let m = array![0.0, 2.0];
        let combo = compose(Arc::new(ReciprocalMap), Arc::new(ExpMap));
        let Deriv::Diagonal(d) = combo.deriv(&m) else {
            unreachable!("elementwise combo has a diagonal sensitivity");
        };
        assert!(close(&d, &m.mapv(|x| -(-x).exp())));
    }

    #[test]
    fn linear_map_scales_and_offsets() {
        let map = LinearMap::new(2.0, 1.0);
        assert_eq!(map.apply(&array![0.0, 3.0]), array![1.0, 7.0]);
        assert_eq!(map.deriv(&array![0.0, 3.0]), Deriv::Diagonal(array![2.0, 2.0]));
    }

    #[test]
    fn built_ins_resolve_by_name() {
        assert_eq!(from_name("Exp").map(|m| m.label()), Some("ExpMap".to_owned()));
        assert!(from_name("surject").is_none());
    }
}
