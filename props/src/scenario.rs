//! TOML scenario files: a schema, a model and a list of assignments.
//!
//! ```toml
//! name = "conductivity"
//! model = [1.0, 2.0, 4.0]
//! reciprocal = [["sigma", "rho"]]
//!
//! [[invertible]]
//! name = "sigma"
//! help = "Electrical conductivity (S/m)"
//!
//! [[invertible]]
//! name = "rho"
//! help = "Electrical resistivity (Ohm m)"
//!
//! [[property]]
//! name = "eta"
//! help = "Chargeability"
//!
//! [[assign]]
//! attribute = "sigmaMap"
//! mapping = "identity"
//! ```
//!
//! Assignments run in file order through [`Host::set`], so each one applies
//! the same invalidation rules as a programmatic write. An assignment carries
//! exactly one of `values` (a physical-property array), `mapping` (a mapping
//! spec) or `clear = true`.

use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use ndarray::Array1;
use serde::Deserialize;
use tracing::debug;

use crate::host::{Host, Value};
use crate::maps::{self, LinearMap, MapRef};
use crate::model::{Invertible, PhysicalProperty};
use crate::schema::Schema;

/// A parsed scenario file.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Scenario {
    /// Schema name.
    #[serde(default = "default_name")]
    pub name: String,
    /// Initial model array.
    #[serde(default)]
    pub model: Option<Vec<f64>>,
    /// Reciprocal pairs, by property name.
    #[serde(default)]
    pub reciprocal: Vec<[String; 2]>,
    /// Invertible triples to register.
    #[serde(default)]
    pub invertible: Vec<InvertibleEntry>,
    /// Standalone physical properties to register.
    #[serde(default)]
    pub property: Vec<PropertyEntry>,
    /// Assignments applied in order after the host is created.
    #[serde(default)]
    pub assign: Vec<Assignment>,
}

fn default_name() -> String {
    "scenario".to_owned()
}

/// One `[[invertible]]` table.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct InvertibleEntry {
    /// Physical-property name.
    pub name: String,
    /// Documentation text.
    #[serde(default)]
    pub help: String,
    /// Mapping attribute name; defaults to `{name}Map`.
    #[serde(default)]
    pub mapping: Option<String>,
    /// Derivative attribute name; defaults to `{name}Deriv`.
    #[serde(default)]
    pub derivative: Option<String>,
}

impl InvertibleEntry {
    fn triple(&self) -> Invertible {
        let mapping = self
            .mapping
            .clone()
            .unwrap_or_else(|| format!("{}Map", self.name));
        let derivative = self
            .derivative
            .clone()
            .unwrap_or_else(|| format!("{}Deriv", self.name));
        Invertible::with_names(&self.name, &mapping, &derivative, &self.help)
    }
}

/// One `[[property]]` table: a physical property with no mapping.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PropertyEntry {
    /// Physical-property name.
    pub name: String,
    /// Documentation text.
    #[serde(default)]
    pub help: String,
}

/// A mapping as written in a scenario file.
///
/// Either a built-in name (`"identity"`, `"exp"`, `"reciprocal"`), an affine
/// table `{ scale = 2.0, offset = 1.0 }`, or a composition
/// `{ compose = ["reciprocal", "exp"] }` listed outermost first.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum MappingSpec {
    /// A built-in mapping by name.
    Named(String),
    /// `scale * x + offset`.
    Linear {
        /// Multiplier.
        scale: f64,
        /// Additive term.
        #[serde(default)]
        offset: f64,
    },
    /// A composition, outermost first.
    Compose {
        /// The maps to chain.
        compose: Vec<MappingSpec>,
    },
}

impl MappingSpec {
    /// Builds the mapping object.
    ///
    /// # Errors
    ///
    /// Returns an error for an unknown built-in name or an empty composition.
    pub fn build(&self) -> Result<MapRef> {
        match self {
            MappingSpec::Named(name) => match maps::from_name(name) {
                Some(m) => Ok(m),
                None => bail!("unknown mapping `{name}`; expected identity, exp or reciprocal"),
            },
            MappingSpec::Linear { scale, offset } => Ok(Arc::new(LinearMap::new(*scale, *offset))),
            MappingSpec::Compose { compose } => {
                let mut specs = compose.iter();
                let Some(first) = specs.next() else {
                    bail!("`compose` needs at least one mapping");
                };
                specs.try_fold(first.build()?, |outer, inner| {
                    Ok(maps::compose(outer, inner.build()?))
                })
            }
        }
    }
}

/// One `[[assign]]` table.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Assignment {
    /// Attribute name, or `model`.
    pub attribute: String,
    /// Array to store.
    #[serde(default)]
    pub values: Option<Vec<f64>>,
    /// Mapping to store.
    #[serde(default)]
    pub mapping: Option<MappingSpec>,
    /// Clears the attribute when true.
    #[serde(default)]
    pub clear: bool,
}

impl Assignment {
    /// The value this assignment writes; `None` for `clear = true`.
    ///
    /// # Errors
    ///
    /// Returns an error unless exactly one of `values`, `mapping` or
    /// `clear = true` is given, or when the mapping spec does not build.
    pub fn value(&self) -> Result<Option<Value>> {
        match (&self.values, &self.mapping, self.clear) {
            (Some(v), None, false) => Ok(Some(Value::Array(Array1::from(v.clone())))),
            (None, Some(m), false) => Ok(Some(Value::Map(m.build()?))),
            (None, None, true) => Ok(None),
            _ => bail!("expected exactly one of `values`, `mapping` or `clear = true`"),
        }
    }
}

impl Scenario {
    /// Parses a scenario from TOML text.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not a valid scenario document.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        toml::from_str(text).context("failed to parse scenario TOML")
    }

    /// Reads and parses a scenario file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read scenario file {}", path.display()))?;
        Self::from_toml_str(&text).with_context(|| format!("in {}", path.display()))
    }

    /// Builds the schema: invertible triples, then standalone properties,
    /// then reciprocal links.
    ///
    /// # Errors
    ///
    /// Returns the [`crate::PropsError`] raised while linking or building.
    pub fn schema(&self) -> crate::Result<Schema> {
        let mut builder = Schema::builder(self.name.clone());
        for entry in &self.invertible {
            builder = builder.invertible(entry.triple());
        }
        for entry in &self.property {
            let property = PhysicalProperty::new(entry.name.clone(), entry.help.clone());
            builder = builder.descriptor(property);
        }
        for [a, b] in &self.reciprocal {
            builder = builder.reciprocal(a, b)?;
        }
        builder.build()
    }

    /// Builds the schema, creates a host, sets the model and applies every
    /// assignment.
    ///
    /// # Errors
    ///
    /// Returns an error if the schema is invalid or any assignment fails.
    pub fn host(&self) -> Result<Host> {
        let schema = self
            .schema()
            .with_context(|| format!("invalid schema in scenario `{}`", self.name))?;
        let mut host = Host::new(Arc::new(schema));
        host.set_model(self.model.clone().map(Array1::from));
        self.apply(&mut host)?;
        Ok(host)
    }

    /// Applies the assignments, in order, to an existing host.
    ///
    /// # Errors
    ///
    /// Stops at the first assignment that fails; earlier ones stay applied.
    pub fn apply(&self, host: &mut Host) -> Result<()> {
        for (i, assignment) in self.assign.iter().enumerate() {
            let context = || format!("assignment #{} (`{}`)", i + 1, assignment.attribute);
            let value = assignment.value().with_context(context)?;
            debug!(
                attribute = %assignment.attribute,
                value = %value.as_ref().map_or_else(|| "none".to_owned(), |v| v.describe()),
                "applying assignment"
            );
            host.set(&assignment.attribute, value).with_context(context)?;
        }
        Ok(())
    }
}
