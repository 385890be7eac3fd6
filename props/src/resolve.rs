//! Resolution and invalidation rules for each descriptor kind.
//!
//! For a physical property `p` with mapping `pMap` and reciprocal `r`, at most
//! one of three sources is live at a time: `p`'s own stored array, `pMap`
//! applied to the model, or `1 / r`. Every assignment clears the slots of the
//! sources it supersedes, and every read walks the sources in a fixed order.

use std::sync::Arc;

use ndarray::Array1;
use tracing::debug;

use crate::deriv::Deriv;
use crate::error::{PropsError, Result};
use crate::host::{Host, Value};
use crate::maps::{self, MapRef, ReciprocalMap};
use crate::model::{Derivative, MappingDescriptor, PhysicalProperty};

impl MappingDescriptor {
    /// Current mapping object on `host`.
    ///
    /// Falls back to `ReciprocalMap * rMap` when this slot is empty and the
    /// reciprocal property's mapping `rMap` is stored.
    #[must_use]
    pub fn get(&self, host: &Host) -> Option<MapRef> {
        if let Some(m) = host.get_raw(&self.name).and_then(Value::as_map) {
            return Some(Arc::clone(m));
        }
        let reciprocal = self.reciprocal(host.schema())?;
        let inner = host.get_raw(&reciprocal.name).and_then(Value::as_map)?;
        debug!(
            attribute = %self.name,
            via = %reciprocal.name,
            "mapping derived from reciprocal"
        );
        Some(maps::compose(Arc::new(ReciprocalMap), Arc::clone(inner)))
    }

    /// Stores `value` (or clears the slot), then clears the bound property,
    /// the reciprocal property and the reciprocal's mapping.
    ///
    /// # Errors
    ///
    /// [`PropsError::MappingType`] if `value` is not a mapping; nothing is
    /// written in that case.
    pub fn set(&self, host: &mut Host, value: Option<Value>) -> Result<()> {
        let value = self.validate(value)?;
        host.set_raw(&self.name, value.map(Value::Map));
        self.clear_props(host);
        Ok(())
    }

    /// Accepts `None` or a mapping.
    ///
    /// # Errors
    ///
    /// [`PropsError::MappingType`] for any other value.
    pub fn validate(&self, value: Option<Value>) -> Result<Option<MapRef>> {
        match value {
            None => Ok(None),
            Some(Value::Map(m)) => Ok(Some(m)),
            Some(other) => Err(PropsError::MappingType {
                name: self.name.clone(),
                found: other.describe(),
            }),
        }
    }

    fn clear_props(&self, host: &mut Host) {
        let schema = host.shared_schema();
        if let Some(prop) = &self.prop {
            host.set_raw(prop, None);
        }
        if let Some(reciprocal) = self.reciprocal_prop(&schema) {
            host.set_raw(&reciprocal.name, None);
        }
        if let Some(reciprocal) = self.reciprocal(&schema) {
            host.set_raw(&reciprocal.name, None);
        }
        debug!(attribute = %self.name, "cleared properties superseded by mapping");
    }
}

impl PhysicalProperty {
    /// Current value on `host`, taken from the first source that has one:
    ///
    /// 1. the stored array;
    /// 2. `1 / r` where `r` is the reciprocal's stored array;
    /// 3. nothing, when neither a mapping nor a reciprocal is bound;
    /// 4. `1 / r.get()` when only a reciprocal is bound;
    /// 5. the mapping applied to the model.
    #[must_use]
    pub fn get(&self, host: &Host) -> Option<Array1<f64>> {
        self.resolve(host, true)
    }

    /// `follow_reciprocal` is false when resolving on behalf of the
    /// reciprocal, so two unmapped reciprocals cannot recurse forever.
    fn resolve(&self, host: &Host, follow_reciprocal: bool) -> Option<Array1<f64>> {
        if let Some(Value::Array(v)) = host.get_raw(&self.name) {
            return Some(v.clone());
        }
        let schema = host.schema();
        let reciprocal = self
            .reciprocal
            .as_deref()
            .and_then(|r| schema.property(r).ok());
        if let Some(r) = reciprocal {
            if let Some(Value::Array(v)) = host.get_raw(&r.name) {
                return Some(v.mapv(f64::recip));
            }
        }
        match (self.mapping.as_deref(), reciprocal) {
            (None, None) => None,
            (None, Some(r)) => {
                if !follow_reciprocal {
                    return None;
                }
                debug!(attribute = %self.name, via = %r.name, "inverting resolved reciprocal");
                r.resolve(host, false).map(|v| v.mapv(f64::recip))
            }
            (Some(mapping), _) => {
                let mapping = schema.mapping(mapping).ok()?.get(host)?;
                let Some(model) = host.model() else {
                    debug!(attribute = %self.name, "mapping bound but model is unset");
                    return None;
                };
                Some(mapping.apply(model))
            }
        }
    }

    /// Stores `value` (or clears the slot), then clears this property's
    /// mapping, the reciprocal property and the reciprocal's mapping.
    ///
    /// # Errors
    ///
    /// [`PropsError::PhysicalPropertyType`] if `value` is not an array;
    /// nothing is written in that case.
    pub fn set(&self, host: &mut Host, value: Option<Value>) -> Result<()> {
        let value = self.validate(value)?;
        host.set_raw(&self.name, value.map(Value::Array));
        self.clear_mappings(host);
        Ok(())
    }

    /// Accepts `None` or a numeric array.
    ///
    /// # Errors
    ///
    /// [`PropsError::PhysicalPropertyType`] for any other value.
    pub fn validate(&self, value: Option<Value>) -> Result<Option<Array1<f64>>> {
        match value {
            None => Ok(None),
            Some(Value::Array(a)) => Ok(Some(a)),
            Some(other) => Err(PropsError::PhysicalPropertyType {
                name: self.name.clone(),
                found: other.describe(),
            }),
        }
    }

    fn clear_mappings(&self, host: &mut Host) {
        let schema = host.shared_schema();
        if let Some(mapping) = &self.mapping {
            host.set_raw(mapping, None);
        }
        let Some(reciprocal) = self
            .reciprocal
            .as_deref()
            .and_then(|r| schema.property(r).ok())
        else {
            return;
        };
        host.set_raw(&reciprocal.name, None);
        if let Some(mapping) = &reciprocal.mapping {
            host.set_raw(mapping, None);
        }
        debug!(attribute = %self.name, "cleared mappings superseded by stored value");
    }
}

impl Derivative {
    /// `∂property/∂model` on `host`, or [`Deriv::Zero`] when no mapping
    /// object or model is available.
    #[must_use]
    pub fn get(&self, host: &Host) -> Deriv {
        let Some(descriptor) = self.mapping(host.schema()) else {
            return Deriv::Zero;
        };
        let Some(mapping) = descriptor.get(host) else {
            return Deriv::Zero;
        };
        match host.model() {
            Some(model) => mapping.deriv(model),
            None => {
                debug!(attribute = %self.name, "derivative requested without a model");
                Deriv::Zero
            }
        }
    }

    /// Derivatives are read-only.
    ///
    /// # Errors
    ///
    /// Always [`PropsError::ReadOnly`].
    pub fn set(&self, _host: &mut Host, _value: Option<Value>) -> Result<()> {
        Err(PropsError::ReadOnly {
            name: self.name.clone(),
        })
    }
}
