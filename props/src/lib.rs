//! Physical-property descriptors for inverse problems.
//!
//! The `invprops` crate lets a simulation object expose physical properties
//! (conductivity, resistivity, ...) that can each be supplied in one of three
//! ways: stored directly, derived from a reciprocal property, or computed by
//! applying a mapping to the inversion model. Assigning one source
//! invalidates the others so they never disagree, and every mapped property
//! comes with a read-only sensitivity `∂p/∂m`.
//!
//! # Entry Point
//!
//! ```
//! use std::sync::Arc;
//! use ndarray::array;
//! use invprops::{ExpMap, Host, Invertible, Schema};
//!
//! let schema = Schema::builder("conductivity")
//!     .invertible(Invertible::new("sigma", "Electrical conductivity (S/m)"))
//!     .invertible(Invertible::new("rho", "Electrical resistivity (Ohm m)"))
//!     .reciprocal("sigma", "rho")?
//!     .build()?;
//!
//! let mut host = Host::new(Arc::new(schema));
//! host.set_model(Some(array![0.0, 0.0]));
//! host.set_mapping("sigmaMap", Some(Arc::new(ExpMap)))?;
//!
//! assert_eq!(host.property("sigma")?, Some(array![1.0, 1.0]));
//! assert_eq!(host.property("rho")?, Some(array![1.0, 1.0]));
//! # Ok::<(), invprops::PropsError>(())
//! ```
//!
//! # Serialization
//!
//! ```
//! # use std::sync::Arc;
//! # use invprops::{Host, Invertible, Schema};
//! let schema = Schema::builder("chargeability")
//!     .invertible(Invertible::new("eta", "Chargeability"))
//!     .build()?;
//! let json = invprops::serializer::json::schema_to_json(&schema);
//! let text = invprops::serializer::text::host_to_text(&Host::new(Arc::new(schema)));
//! assert_eq!(json["descriptors"][1]["prop"], "eta");
//! assert!(text.contains("etaDeriv"));
//! # Ok::<(), invprops::PropsError>(())
//! ```

#![deny(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    missing_docs,
    clippy::missing_errors_doc
)]

pub mod check;
pub mod deriv;
pub mod error;
pub mod host;
pub mod maps;
pub mod model;
pub mod report;
mod resolve;
#[cfg(feature = "scenario")]
pub mod scenario;
pub mod schema;
#[cfg(feature = "serializers")]
pub mod serializer;

pub use deriv::Deriv;
pub use error::{BindingError, PropsError, Result};
pub use host::{Host, Value};
pub use maps::{ComboMap, ExpMap, IdentityMap, LinearMap, MapRef, Mapping, ReciprocalMap};
pub use model::{
    reciprocal, Derivative, Descriptor, DescriptorKind, Invertible, MappingDescriptor,
    PhysicalProperty,
};
pub use report::{CheckReport, CheckResult, Severity};
pub use schema::{Schema, SchemaBuilder, MODEL};
