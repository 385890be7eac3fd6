//! The host instance: per-object attribute storage routed through a schema.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use ndarray::Array1;
use tracing::trace;

use crate::deriv::Deriv;
use crate::error::{PropsError, Result};
use crate::maps::MapRef;
use crate::model::Descriptor;
use crate::schema::{Schema, MODEL};

/// A value read from or written to a host attribute.
#[derive(Debug, Clone)]
pub enum Value {
    /// A physical-property (or model) array.
    Array(Array1<f64>),
    /// A mapping object.
    Map(MapRef),
    /// A sensitivity, as returned by derivative descriptors.
    Deriv(Deriv),
}

impl Value {
    /// Returns the array, if this is one.
    #[must_use]
    pub fn as_array(&self) -> Option<&Array1<f64>> {
        match self {
            Value::Array(a) => Some(a),
            _ => None,
        }
    }

    /// Returns the mapping, if this is one.
    #[must_use]
    pub fn as_map(&self) -> Option<&MapRef> {
        match self {
            Value::Map(m) => Some(m),
            _ => None,
        }
    }

    /// Returns the sensitivity, if this is one.
    #[must_use]
    pub fn as_deriv(&self) -> Option<&Deriv> {
        match self {
            Value::Deriv(d) => Some(d),
            _ => None,
        }
    }

    /// Short description used in validation errors.
    #[must_use]
    pub fn describe(&self) -> String {
        match self {
            Value::Array(a) => format!("an array of length {}", a.len()),
            Value::Map(m) => format!("a mapping ({})", m.label()),
            Value::Deriv(d) => format!("a {} derivative", d.kind()),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Array(a) => write!(f, "{a}"),
            Value::Map(m) => f.write_str(&m.label()),
            Value::Deriv(Deriv::Zero) => f.write_str("Zero"),
            Value::Deriv(Deriv::Diagonal(d)) => write!(f, "diag({d})"),
            Value::Deriv(Deriv::Dense(m)) => write!(f, "{m}"),
        }
    }
}

impl From<Array1<f64>> for Value {
    fn from(a: Array1<f64>) -> Self {
        Value::Array(a)
    }
}

impl From<MapRef> for Value {
    fn from(m: MapRef) -> Self {
        Value::Map(m)
    }
}

impl From<Deriv> for Value {
    fn from(d: Deriv) -> Self {
        Value::Deriv(d)
    }
}

/// One object built from a [`Schema`].
///
/// Reads and writes by name go through the registered descriptor, which
/// applies the resolution and invalidation rules; the `*_raw` methods touch
/// the slot storage directly.
#[derive(Debug, Clone)]
pub struct Host {
    schema: Arc<Schema>,
    model: Option<Array1<f64>>,
    slots: HashMap<String, Value>,
}

impl Host {
    /// Creates an instance with every attribute unset.
    #[must_use]
    pub fn new(schema: Arc<Schema>) -> Self {
        Self {
            schema,
            model: None,
            slots: HashMap::new(),
        }
    }

    /// The schema this instance was built from.
    #[must_use]
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// A shared handle to the schema.
    #[must_use]
    pub fn shared_schema(&self) -> Arc<Schema> {
        Arc::clone(&self.schema)
    }

    /// The model array that mappings are applied to.
    #[must_use]
    pub fn model(&self) -> Option<&Array1<f64>> {
        self.model.as_ref()
    }

    /// Replaces the model array. No slot is invalidated.
    pub fn set_model(&mut self, model: Option<Array1<f64>>) {
        self.model = model;
    }

    /// The stored value of a slot, bypassing resolution.
    #[must_use]
    pub fn get_raw(&self, name: &str) -> Option<&Value> {
        self.slots.get(name)
    }

    /// Writes a slot without validation or invalidation; `None` clears it.
    pub fn set_raw(&mut self, name: &str, value: Option<Value>) {
        trace!(attribute = name, set = value.is_some(), "raw slot write");
        match value {
            Some(v) => {
                self.slots.insert(name.to_owned(), v);
            }
            None => {
                self.slots.remove(name);
            }
        }
    }

    /// Names of slots that currently hold a stored value, sorted.
    #[must_use]
    pub fn stored(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.slots.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Resolves an attribute by name.
    ///
    /// Physical properties and mappings resolve to `None` when there is not
    /// enough information; derivatives always resolve, to [`Deriv::Zero`] at
    /// worst.
    ///
    /// # Errors
    ///
    /// [`PropsError::UnknownAttribute`] if `name` is neither `model` nor a
    /// registered descriptor.
    pub fn get(&self, name: &str) -> Result<Option<Value>> {
        if name == MODEL {
            return Ok(self.model.clone().map(Value::Array));
        }
        Ok(match self.schema.descriptor(name)? {
            Descriptor::Property(p) => p.get(self).map(Value::Array),
            Descriptor::Mapping(m) => m.get(self).map(Value::Map),
            Descriptor::Derivative(d) => Some(Value::Deriv(d.get(self))),
        })
    }

    /// Assigns an attribute by name, invalidating whatever the assignment
    /// supersedes. `None` clears the attribute.
    ///
    /// # Errors
    ///
    /// [`PropsError::UnknownAttribute`] for unregistered names,
    /// [`PropsError::PhysicalPropertyType`] / [`PropsError::MappingType`]
    /// when the value has the wrong type, and [`PropsError::ReadOnly`] for
    /// derivatives. The host is unchanged on error.
    pub fn set(&mut self, name: &str, value: Option<Value>) -> Result<()> {
        if name == MODEL {
            return match value {
                None => {
                    self.model = None;
                    Ok(())
                }
                Some(Value::Array(a)) => {
                    self.model = Some(a);
                    Ok(())
                }
                Some(other) => Err(PropsError::PhysicalPropertyType {
                    name: MODEL.to_owned(),
                    found: other.describe(),
                }),
            };
        }
        let schema = self.shared_schema();
        match schema.descriptor(name)? {
            Descriptor::Property(p) => p.set(self, value),
            Descriptor::Mapping(m) => m.set(self, value),
            Descriptor::Derivative(d) => d.set(self, value),
        }
    }

    /// Clears an attribute; shorthand for `set(name, None)`.
    ///
    /// # Errors
    ///
    /// As [`Host::set`].
    pub fn clear(&mut self, name: &str) -> Result<()> {
        self.set(name, None)
    }

    /// Resolves a physical property.
    ///
    /// # Errors
    ///
    /// [`PropsError::UnknownAttribute`] or a wrong-kind binding error if
    /// `name` is not a physical property.
    pub fn property(&self, name: &str) -> Result<Option<Array1<f64>>> {
        Ok(self.schema.property(name)?.get(self))
    }

    /// Resolves a mapping descriptor.
    ///
    /// # Errors
    ///
    /// [`PropsError::UnknownAttribute`] or a wrong-kind binding error if
    /// `name` is not a mapping descriptor.
    pub fn mapping(&self, name: &str) -> Result<Option<MapRef>> {
        Ok(self.schema.mapping(name)?.get(self))
    }

    /// Resolves a derivative descriptor.
    ///
    /// # Errors
    ///
    /// [`PropsError::UnknownAttribute`] or a wrong-kind binding error if
    /// `name` is not a derivative descriptor.
    pub fn derivative(&self, name: &str) -> Result<Deriv> {
        Ok(self.schema.derivative(name)?.get(self))
    }

    /// Assigns a physical property.
    ///
    /// # Errors
    ///
    /// As [`Host::set`], plus a wrong-kind binding error if `name` is not a
    /// physical property.
    pub fn set_property(&mut self, name: &str, value: Option<Array1<f64>>) -> Result<()> {
        let schema = self.shared_schema();
        schema.property(name)?.set(self, value.map(Value::Array))
    }

    /// Assigns a mapping descriptor.
    ///
    /// # Errors
    ///
    /// As [`Host::set`], plus a wrong-kind binding error if `name` is not a
    /// mapping descriptor.
    pub fn set_mapping(&mut self, name: &str, value: Option<MapRef>) -> Result<()> {
        let schema = self.shared_schema();
        schema.mapping(name)?.set(self, value.map(Value::Map))
    }

    /// Resolves every registered attribute, in registration order.
    #[must_use]
    pub fn resolve_all(&self) -> Vec<(&str, Option<Value>)> {
        self.schema
            .iter()
            .map(|d| {
                let value = match d {
                    Descriptor::Property(p) => p.get(self).map(Value::Array),
                    Descriptor::Mapping(m) => m.get(self).map(Value::Map),
                    Descriptor::Derivative(dv) => Some(Value::Deriv(dv.get(self))),
                };
                (d.name(), value)
            })
            .collect()
    }
}
