//! The host class: a frozen registry of named descriptors.
//!
//! A [`Schema`] is assembled once with a [`SchemaBuilder`] and then shared,
//! usually behind an `Arc`, by every [`Host`](crate::Host) built from it.
//! [`SchemaBuilder::build`] checks every link, so code holding a `Schema` may
//! assume that bindings are mutual, reciprocals are symmetric and every name a
//! descriptor mentions is registered with the right kind.

use std::collections::HashMap;

use tracing::debug;

use crate::error::{BindingError, PropsError, Result};
use crate::model::{
    self, Derivative, Descriptor, DescriptorKind, Invertible, MappingDescriptor, PhysicalProperty,
};

/// Attribute name reserved for the host's model array.
pub const MODEL: &str = "model";

/// A validated, immutable set of descriptors.
#[derive(Debug, Clone)]
pub struct Schema {
    name: String,
    descriptors: Vec<Descriptor>,
    index: HashMap<String, usize>,
}

impl Schema {
    /// Starts a new schema called `name`.
    pub fn builder(name: impl Into<String>) -> SchemaBuilder {
        SchemaBuilder::new(name)
    }

    /// Name of the schema, used in logs and serialized output.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of registered descriptors.
    #[must_use]
    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    /// Returns true if no descriptor is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    /// Descriptors in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &Descriptor> {
        self.descriptors.iter()
    }

    /// Looks up a descriptor by name. Returns `None` if not found.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Descriptor> {
        self.index.get(name).map(|&i| &self.descriptors[i])
    }

    /// Looks up a descriptor by name.
    ///
    /// # Errors
    ///
    /// [`PropsError::UnknownAttribute`] if `name` is not registered.
    pub fn descriptor(&self, name: &str) -> Result<&Descriptor> {
        self.get(name).ok_or_else(|| PropsError::UnknownAttribute {
            name: name.to_owned(),
        })
    }

    /// Looks up a physical property by name.
    ///
    /// # Errors
    ///
    /// [`PropsError::UnknownAttribute`] if `name` is not registered, or
    /// [`BindingError::WrongKind`] if it names another kind of descriptor.
    pub fn property(&self, name: &str) -> Result<&PhysicalProperty> {
        match self.descriptor(name)? {
            Descriptor::Property(p) => Ok(p),
            other => Err(wrong_kind(other, DescriptorKind::PhysicalProperty).into()),
        }
    }

    /// Looks up a mapping descriptor by name.
    ///
    /// # Errors
    ///
    /// [`PropsError::UnknownAttribute`] if `name` is not registered, or
    /// [`BindingError::WrongKind`] if it names another kind of descriptor.
    pub fn mapping(&self, name: &str) -> Result<&MappingDescriptor> {
        match self.descriptor(name)? {
            Descriptor::Mapping(m) => Ok(m),
            other => Err(wrong_kind(other, DescriptorKind::Mapping).into()),
        }
    }

    /// Looks up a derivative descriptor by name.
    ///
    /// # Errors
    ///
    /// [`PropsError::UnknownAttribute`] if `name` is not registered, or
    /// [`BindingError::WrongKind`] if it names another kind of descriptor.
    pub fn derivative(&self, name: &str) -> Result<&Derivative> {
        match self.descriptor(name)? {
            Descriptor::Derivative(d) => Ok(d),
            other => Err(wrong_kind(other, DescriptorKind::Derivative).into()),
        }
    }

    /// All physical properties in registration order.
    pub fn properties(&self) -> impl Iterator<Item = &PhysicalProperty> {
        self.descriptors.iter().filter_map(|d| match d {
            Descriptor::Property(p) => Some(p),
            _ => None,
        })
    }

    /// Each reciprocal pair once, in the order the first member was registered.
    #[must_use]
    pub fn reciprocal_pairs(&self) -> Vec<(&str, &str)> {
        let mut pairs = Vec::new();
        for p in self.properties() {
            if let Some(r) = p.reciprocal.as_deref() {
                if self.index.get(p.name.as_str()) < self.index.get(r) {
                    pairs.push((p.name.as_str(), r));
                }
            }
        }
        pairs
    }
}

/// Collects descriptors and links, then validates them into a [`Schema`].
#[derive(Debug, Clone, Default)]
pub struct SchemaBuilder {
    name: String,
    descriptors: Vec<Descriptor>,
}

impl SchemaBuilder {
    /// Creates an empty builder.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            descriptors: Vec::new(),
        }
    }

    /// Registers a single descriptor.
    #[must_use]
    pub fn descriptor(mut self, descriptor: impl Into<Descriptor>) -> Self {
        self.descriptors.push(descriptor.into());
        self
    }

    /// Registers the three descriptors of an [`Invertible`] triple.
    #[must_use]
    pub fn invertible(mut self, triple: Invertible) -> Self {
        self.descriptors.extend(triple.into_descriptors());
        self
    }

    /// Links two registered properties as reciprocals.
    ///
    /// # Errors
    ///
    /// [`PropsError::UnknownAttribute`] if either name is not registered yet,
    /// [`BindingError::WrongKind`] if either is not a physical property, and
    /// the errors of [`model::reciprocal`].
    pub fn reciprocal(mut self, a: &str, b: &str) -> Result<Self> {
        let i = self.position(a)?;
        let j = self.position(b)?;
        if i == j {
            return Err(BindingError::SelfReciprocal { name: a.to_owned() }.into());
        }
        let (lo, hi) = (i.min(j), i.max(j));
        let (head, tail) = self.descriptors.split_at_mut(hi);
        let first = as_property_mut(&mut head[lo])?;
        let second = as_property_mut(&mut tail[0])?;
        if i < j {
            model::reciprocal(first, second)?;
        } else {
            model::reciprocal(second, first)?;
        }
        Ok(self)
    }

    /// Validates every link and freezes the schema.
    ///
    /// # Errors
    ///
    /// [`BindingError::ReservedName`] for a descriptor called `model`,
    /// [`BindingError::DuplicateName`] for repeated names, and
    /// [`BindingError::Dangling`], [`BindingError::WrongKind`],
    /// [`BindingError::OneSided`] or [`BindingError::Asymmetric`] for links
    /// that do not resolve consistently.
    pub fn build(self) -> Result<Schema> {
        let mut index = HashMap::with_capacity(self.descriptors.len());
        for (i, d) in self.descriptors.iter().enumerate() {
            if d.name() == MODEL {
                return Err(BindingError::ReservedName { name: MODEL.to_owned() }.into());
            }
            if index.insert(d.name().to_owned(), i).is_some() {
                return Err(BindingError::DuplicateName {
                    name: d.name().to_owned(),
                }
                .into());
            }
        }

        let schema = Schema {
            name: self.name,
            descriptors: self.descriptors,
            index,
        };
        for d in &schema.descriptors {
            check_links(&schema, d)?;
        }
        debug!(
            schema = schema.name(),
            descriptors = schema.len(),
            reciprocal_pairs = schema.reciprocal_pairs().len(),
            "built schema"
        );
        Ok(schema)
    }

    fn position(&self, name: &str) -> Result<usize> {
        self.descriptors
            .iter()
            .position(|d| d.name() == name)
            .ok_or_else(|| PropsError::UnknownAttribute {
                name: name.to_owned(),
            })
    }
}

fn as_property_mut(d: &mut Descriptor) -> Result<&mut PhysicalProperty, BindingError> {
    match d {
        Descriptor::Property(p) => Ok(p),
        other => Err(wrong_kind(other, DescriptorKind::PhysicalProperty)),
    }
}

fn wrong_kind(found: &Descriptor, expected: DescriptorKind) -> BindingError {
    BindingError::WrongKind {
        name: found.name().to_owned(),
        expected: expected.as_str(),
        found: found.kind().as_str(),
    }
}

/// Resolves `to` from `from`, mapping a missing name to a dangling-link error.
fn target<'s>(schema: &'s Schema, from: &str, to: &str) -> Result<&'s Descriptor, BindingError> {
    schema.get(to).ok_or_else(|| BindingError::Dangling {
        from: from.to_owned(),
        to: to.to_owned(),
    })
}

fn target_property<'s>(
    schema: &'s Schema,
    from: &str,
    to: &str,
) -> Result<&'s PhysicalProperty, BindingError> {
    match target(schema, from, to)? {
        Descriptor::Property(p) => Ok(p),
        other => Err(wrong_kind(other, DescriptorKind::PhysicalProperty)),
    }
}

fn check_links(schema: &Schema, d: &Descriptor) -> Result<(), BindingError> {
    match d {
        Descriptor::Property(p) => {
            if let Some(m) = p.mapping.as_deref() {
                let mapping = match target(schema, &p.name, m)? {
                    Descriptor::Mapping(mapping) => mapping,
                    other => return Err(wrong_kind(other, DescriptorKind::Mapping)),
                };
                if mapping.prop.as_deref() != Some(p.name.as_str()) {
                    return Err(BindingError::OneSided {
                        mapping: mapping.name.clone(),
                        property: p.name.clone(),
                    });
                }
            }
            if let Some(r) = p.reciprocal.as_deref() {
                if r == p.name {
                    return Err(BindingError::SelfReciprocal {
                        name: p.name.clone(),
                    });
                }
                let other = target_property(schema, &p.name, r)?;
                if other.reciprocal.as_deref() != Some(p.name.as_str()) {
                    return Err(BindingError::Asymmetric {
                        a: p.name.clone(),
                        b: other.name.clone(),
                    });
                }
            }
        }
        Descriptor::Mapping(m) => {
            if let Some(prop) = m.prop.as_deref() {
                let prop = target_property(schema, &m.name, prop)?;
                if prop.mapping.as_deref() != Some(m.name.as_str()) {
                    return Err(BindingError::OneSided {
                        mapping: m.name.clone(),
                        property: prop.name.clone(),
                    });
                }
            }
        }
        Descriptor::Derivative(dv) => {
            if let Some(prop) = dv.physical_property.as_deref() {
                target_property(schema, &dv.name, prop)?;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn conductivity() -> Result<Schema> {
        Schema::builder("conductivity")
            .invertible(Invertible::new("sigma", "Electrical conductivity"))
            .invertible(Invertible::new("rho", "Electrical resistivity"))
            .reciprocal("sigma", "rho")?
            .build()
    }

    #[test]
    fn builds_linked_schema() {
        let schema = conductivity().unwrap();
        assert_eq!(schema.len(), 6);
        assert_eq!(schema.property("sigma").unwrap().reciprocal.as_deref(), Some("rho"));
        assert_eq!(schema.property("rho").unwrap().reciprocal.as_deref(), Some("sigma"));
        assert_eq!(schema.reciprocal_pairs(), vec![("sigma", "rho")]);
    }

    #[test]
    fn mapping_accessors_look_through_reciprocal() {
        let schema = conductivity().unwrap();
        let sigma_map = schema.mapping("sigmaMap").unwrap();
        assert_eq!(sigma_map.reciprocal_prop(&schema).map(|p| p.name.as_str()), Some("rho"));
        assert_eq!(sigma_map.reciprocal(&schema).map(|m| m.name.as_str()), Some("rhoMap"));

        let deriv = schema.derivative("rhoDeriv").unwrap();
        assert_eq!(deriv.mapping(&schema).map(|m| m.name.as_str()), Some("rhoMap"));
    }

    #[test]
    fn kind_checked_lookup() {
        let schema = conductivity().unwrap();
        assert_eq!(
            schema.property("sigmaMap").unwrap_err(),
            PropsError::Binding(BindingError::WrongKind {
                name: "sigmaMap".into(),
                expected: "physical property",
                found: "mapping",
            })
        );
        assert_eq!(
            schema.mapping("nope").unwrap_err(),
            PropsError::UnknownAttribute { name: "nope".into() }
        );
    }

    #[test]
    fn reciprocal_rejects_non_properties() {
        let err = Schema::builder("bad")
            .invertible(Invertible::new("sigma", "Electrical conductivity"))
            .reciprocal("sigma", "sigmaMap")
            .unwrap_err();
        assert!(matches!(
            err,
            PropsError::Binding(BindingError::WrongKind { ref name, .. }) if name == "sigmaMap"
        ));
    }

    #[test]
    fn reciprocal_rejects_second_partner() {
        let err = Schema::builder("bad")
            .invertible(Invertible::new("sigma", "Electrical conductivity"))
            .invertible(Invertible::new("rho", "Electrical resistivity"))
            .descriptor(PhysicalProperty::new("eta", "Chargeability"))
            .reciprocal("sigma", "rho")
            .and_then(|b| b.reciprocal("eta", "rho"))
            .unwrap_err();
        assert!(matches!(
            err,
            PropsError::Binding(BindingError::AlreadyLinked { .. })
        ));
    }

    #[test]
    fn rejects_duplicate_and_reserved_names() {
        let dup = Schema::builder("dup")
            .descriptor(PhysicalProperty::new("sigma", ""))
            .descriptor(PhysicalProperty::new("sigma", ""))
            .build()
            .unwrap_err();
        assert_eq!(
            dup,
            PropsError::Binding(BindingError::DuplicateName { name: "sigma".into() })
        );

        let reserved = Schema::builder("reserved")
            .descriptor(PhysicalProperty::new("model", ""))
            .build()
            .unwrap_err();
        assert_eq!(
            reserved,
            PropsError::Binding(BindingError::ReservedName { name: "model".into() })
        );
    }

    #[test]
    fn rejects_broken_links() {
        let mut lonely = PhysicalProperty::new("sigma", "");
        lonely.reciprocal = Some("rho".into());
        let dangling = Schema::builder("dangling")
            .descriptor(lonely.clone())
            .build()
            .unwrap_err();
        assert!(matches!(
            dangling,
            PropsError::Binding(BindingError::Dangling { .. })
        ));

        let asymmetric = Schema::builder("asymmetric")
            .descriptor(lonely)
            .descriptor(PhysicalProperty::new("rho", ""))
            .build()
            .unwrap_err();
        assert!(matches!(
            asymmetric,
            PropsError::Binding(BindingError::Asymmetric { .. })
        ));

        let mut map = MappingDescriptor::new("sigmaMap", "");
        map.prop = Some("sigma".into());
        let one_sided = Schema::builder("one-sided")
            .descriptor(PhysicalProperty::new("sigma", ""))
            .descriptor(map)
            .build()
            .unwrap_err();
        assert!(matches!(
            one_sided,
            PropsError::Binding(BindingError::OneSided { .. })
        ));
    }
}
