//! Descriptor types and the factories that link them.
//!
//! A descriptor names one attribute of a host and knows how that attribute
//! relates to its neighbours; it never holds per-instance data. Links between
//! descriptors are stored as the partner's *name* and resolved through the
//! owning [`Schema`], so a pair of reciprocal properties is two plain structs
//! rather than a reference cycle.
//!
//! The resolution and invalidation rules that run when a host reads or writes
//! an attribute are implemented alongside each descriptor in `resolve.rs`.

use crate::error::BindingError;
use crate::schema::Schema;

/// The three kinds of descriptor a schema can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DescriptorKind {
    /// A measurable quantity, e.g. conductivity.
    PhysicalProperty,
    /// The mapping from the model to a physical property.
    Mapping,
    /// The read-only sensitivity of a physical property.
    Derivative,
}

impl DescriptorKind {
    /// Returns the string used in error messages and serialized schemas.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            DescriptorKind::PhysicalProperty => "physical property",
            DescriptorKind::Mapping => "mapping",
            DescriptorKind::Derivative => "derivative",
        }
    }
}

/// An attribute holding a mapping object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappingDescriptor {
    /// Attribute name.
    pub name: String,
    /// Documentation text.
    pub help: String,
    /// Name of the physical property this mapping produces.
    pub prop: Option<String>,
}

impl MappingDescriptor {
    /// Creates an unbound mapping descriptor.
    pub fn new(name: impl Into<String>, help: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            help: help.into(),
            prop: None,
        }
    }

    /// The physical property reciprocal to the one this mapping produces.
    #[must_use]
    pub fn reciprocal_prop<'s>(&self, schema: &'s Schema) -> Option<&'s PhysicalProperty> {
        let prop = schema.property(self.prop.as_deref()?).ok()?;
        schema.property(prop.reciprocal.as_deref()?).ok()
    }

    /// The mapping of the reciprocal property, if both exist.
    #[must_use]
    pub fn reciprocal<'s>(&self, schema: &'s Schema) -> Option<&'s MappingDescriptor> {
        let reciprocal = self.reciprocal_prop(schema)?;
        schema.mapping(reciprocal.mapping.as_deref()?).ok()
    }
}

/// An attribute holding a physical-property array.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhysicalProperty {
    /// Attribute name.
    pub name: String,
    /// Documentation text.
    pub help: String,
    /// Name of the mapping that produces this property from the model.
    pub mapping: Option<String>,
    /// Name of the property that is elementwise `1 / self`.
    pub reciprocal: Option<String>,
}

impl PhysicalProperty {
    /// Creates a property with no mapping and no reciprocal.
    pub fn new(name: impl Into<String>, help: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            help: help.into(),
            mapping: None,
            reciprocal: None,
        }
    }

    /// Binds `mapping` to this property, and this property to `mapping`.
    pub fn bind_mapping(&mut self, mapping: &mut MappingDescriptor) {
        mapping.prop = Some(self.name.clone());
        self.mapping = Some(mapping.name.clone());
    }
}

/// A read-only attribute exposing `∂property/∂model`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Derivative {
    /// Attribute name.
    pub name: String,
    /// Documentation text.
    pub help: String,
    /// Name of the physical property being differentiated.
    pub physical_property: Option<String>,
}

impl Derivative {
    /// Creates an unbound derivative; it always evaluates to zero.
    pub fn new(name: impl Into<String>, help: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            help: help.into(),
            physical_property: None,
        }
    }

    /// Looks through to the bound property's mapping descriptor.
    #[must_use]
    pub fn mapping<'s>(&self, schema: &'s Schema) -> Option<&'s MappingDescriptor> {
        let prop = schema.property(self.physical_property.as_deref()?).ok()?;
        schema.mapping(prop.mapping.as_deref()?).ok()
    }
}

/// Any descriptor registered on a schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Descriptor {
    /// See [`PhysicalProperty`].
    Property(PhysicalProperty),
    /// See [`MappingDescriptor`].
    Mapping(MappingDescriptor),
    /// See [`Derivative`].
    Derivative(Derivative),
}

impl Descriptor {
    /// Attribute name.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Descriptor::Property(p) => &p.name,
            Descriptor::Mapping(m) => &m.name,
            Descriptor::Derivative(d) => &d.name,
        }
    }

    /// Documentation text.
    #[must_use]
    pub fn help(&self) -> &str {
        match self {
            Descriptor::Property(p) => &p.help,
            Descriptor::Mapping(m) => &m.help,
            Descriptor::Derivative(d) => &d.help,
        }
    }

    /// Which kind of descriptor this is.
    #[must_use]
    pub fn kind(&self) -> DescriptorKind {
        match self {
            Descriptor::Property(_) => DescriptorKind::PhysicalProperty,
            Descriptor::Mapping(_) => DescriptorKind::Mapping,
            Descriptor::Derivative(_) => DescriptorKind::Derivative,
        }
    }
}

impl From<PhysicalProperty> for Descriptor {
    fn from(p: PhysicalProperty) -> Self {
        Descriptor::Property(p)
    }
}

impl From<MappingDescriptor> for Descriptor {
    fn from(m: MappingDescriptor) -> Self {
        Descriptor::Mapping(m)
    }
}

impl From<Derivative> for Descriptor {
    fn from(d: Derivative) -> Self {
        Descriptor::Derivative(d)
    }
}

/// A linked (property, mapping, derivative) triple.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invertible {
    /// The physical property.
    pub property: PhysicalProperty,
    /// Its mapping from the model.
    pub mapping: MappingDescriptor,
    /// Its sensitivity to the model.
    pub derivative: Derivative,
}

impl Invertible {
    /// Builds the triple `name`, `{name}Map`, `{name}Deriv`.
    ///
    /// ```
    /// let sigma = invprops::Invertible::new("sigma", "Electrical conductivity");
    /// assert_eq!(sigma.mapping.name, "sigmaMap");
    /// assert_eq!(sigma.derivative.help, "Derivative of Electrical conductivity wrt the model.");
    /// ```
    pub fn new(name: &str, help: &str) -> Self {
        Self::with_names(name, &format!("{name}Map"), &format!("{name}Deriv"), help)
    }

    /// Builds the triple under caller-chosen attribute names.
    pub fn with_names(property: &str, mapping: &str, derivative: &str, help: &str) -> Self {
        let mut mapping = MappingDescriptor::new(
            mapping,
            format!("Mapping of {help} to the inversion model."),
        );
        let mut property = PhysicalProperty::new(property, help);
        property.bind_mapping(&mut mapping);

        let mut derivative =
            Derivative::new(derivative, format!("Derivative of {help} wrt the model."));
        derivative.physical_property = Some(property.name.clone());

        Self {
            property,
            mapping,
            derivative,
        }
    }

    /// The three descriptors in registration order.
    #[must_use]
    pub fn into_descriptors(self) -> [Descriptor; 3] {
        [
            self.property.into(),
            self.mapping.into(),
            self.derivative.into(),
        ]
    }
}

/// Links two properties as mutual reciprocals.
///
/// Linking the same pair again, in either order, is a no-op.
///
/// # Errors
///
/// [`BindingError::SelfReciprocal`] when both arguments name the same
/// property, and [`BindingError::AlreadyLinked`] when either side is already
/// reciprocal to a different property. Neither side is modified on error.
pub fn reciprocal(
    prop1: &mut PhysicalProperty,
    prop2: &mut PhysicalProperty,
) -> Result<(), BindingError> {
    if prop1.name == prop2.name {
        return Err(BindingError::SelfReciprocal {
            name: prop1.name.clone(),
        });
    }
    for (this, other) in [(&*prop1, &*prop2), (&*prop2, &*prop1)] {
        if let Some(current) = &this.reciprocal {
            if *current != other.name {
                return Err(BindingError::AlreadyLinked {
                    name: this.name.clone(),
                    current: current.clone(),
                    requested: other.name.clone(),
                });
            }
        }
    }
    prop1.reciprocal = Some(prop2.name.clone());
    prop2.reciprocal = Some(prop1.name.clone());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invertible_binds_mutually() {
        let sigma = Invertible::new("sigma", "Electrical conductivity");
        assert_eq!(sigma.property.mapping.as_deref(), Some("sigmaMap"));
        assert_eq!(sigma.mapping.prop.as_deref(), Some("sigma"));
        assert_eq!(sigma.derivative.physical_property.as_deref(), Some("sigma"));
        assert_eq!(sigma.property.reciprocal, None);
    }

    #[test]
    fn invertible_help_texts() {
        let rho = Invertible::new("rho", "Electrical resistivity");
        assert_eq!(rho.property.help, "Electrical resistivity");
        assert_eq!(
            rho.mapping.help,
            "Mapping of Electrical resistivity to the inversion model."
        );
        assert_eq!(
            rho.derivative.help,
            "Derivative of Electrical resistivity wrt the model."
        );
    }

    #[test]
    fn custom_names() {
        let kappa = Invertible::with_names("kappa", "chiMap", "chiDeriv", "Susceptibility");
        assert_eq!(kappa.mapping.name, "chiMap");
        assert_eq!(kappa.derivative.name, "chiDeriv");
        assert_eq!(kappa.mapping.prop.as_deref(), Some("kappa"));
    }

    #[test]
    fn reciprocal_is_symmetric_and_idempotent() {
        let mut sigma = PhysicalProperty::new("sigma", "");
        let mut rho = PhysicalProperty::new("rho", "");
        assert_eq!(reciprocal(&mut sigma, &mut rho), Ok(()));
        assert_eq!(sigma.reciprocal.as_deref(), Some("rho"));
        assert_eq!(rho.reciprocal.as_deref(), Some("sigma"));

        assert_eq!(reciprocal(&mut rho, &mut sigma), Ok(()));
        assert_eq!(sigma.reciprocal.as_deref(), Some("rho"));
        assert_eq!(rho.reciprocal.as_deref(), Some("sigma"));
    }

    #[test]
    fn relinking_to_a_new_partner_is_rejected() {
        let mut sigma = PhysicalProperty::new("sigma", "");
        let mut rho = PhysicalProperty::new("rho", "");
        let mut eta = PhysicalProperty::new("eta", "");
        assert_eq!(reciprocal(&mut sigma, &mut rho), Ok(()));

        let err = reciprocal(&mut eta, &mut sigma);
        assert_eq!(
            err,
            Err(BindingError::AlreadyLinked {
                name: "sigma".into(),
                current: "rho".into(),
                requested: "eta".into(),
            })
        );
        assert_eq!(eta.reciprocal, None);
        assert_eq!(sigma.reciprocal.as_deref(), Some("rho"));
    }

    #[test]
    fn self_reciprocal_is_rejected() {
        let mut a = PhysicalProperty::new("sigma", "");
        let mut b = a.clone();
        assert!(matches!(
            reciprocal(&mut a, &mut b),
            Err(BindingError::SelfReciprocal { .. })
        ));
    }
}
