//! Error types for schema construction and attribute assignment.

use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T, E = PropsError> = std::result::Result<T, E>;

/// Errors raised when assigning attributes or building a schema.
///
/// Every error is raised before any slot is written, so a failed `set`
/// leaves the host exactly as it was.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PropsError {
    /// A mapping descriptor was assigned something that is not a mapping.
    #[error("`{name}` must be a mapping, got {found}")]
    MappingType {
        /// Attribute name.
        name: String,
        /// Description of the rejected value.
        found: String,
    },

    /// A physical-property descriptor was assigned something that is not a
    /// numeric array.
    #[error("physical property `{name}` must be a numeric array, got {found}")]
    PhysicalPropertyType {
        /// Attribute name.
        name: String,
        /// Description of the rejected value.
        found: String,
    },

    /// A derivative descriptor was assigned to.
    #[error("`{name}` is a derivative and cannot be assigned")]
    ReadOnly {
        /// Attribute name.
        name: String,
    },

    /// No descriptor with this name is registered on the schema.
    #[error("unknown attribute `{name}`")]
    UnknownAttribute {
        /// Attribute name.
        name: String,
    },

    /// Descriptors were linked inconsistently.
    #[error(transparent)]
    Binding(#[from] BindingError),
}

/// Structural errors in the links between descriptors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BindingError {
    /// A link pointed at a descriptor of the wrong kind.
    #[error("`{name}` is a {found}, expected a {expected}")]
    WrongKind {
        /// Descriptor name.
        name: String,
        /// Kind the link requires.
        expected: &'static str,
        /// Kind actually registered under `name`.
        found: &'static str,
    },

    /// A link pointed at a name that is not registered.
    #[error("`{from}` links to `{to}`, which is not registered")]
    Dangling {
        /// Descriptor holding the link.
        from: String,
        /// Missing target.
        to: String,
    },

    /// A mapping and a property disagree about their binding.
    #[error("`{mapping}` and `{property}` are not bound to each other")]
    OneSided {
        /// Mapping descriptor name.
        mapping: String,
        /// Physical-property descriptor name.
        property: String,
    },

    /// `a.reciprocal == b` but `b.reciprocal != a`.
    #[error("`{a}` names `{b}` as reciprocal but not the other way round")]
    Asymmetric {
        /// First property.
        a: String,
        /// Second property.
        b: String,
    },

    /// The property already has a different reciprocal.
    #[error("`{name}` is already reciprocal to `{current}`, cannot link to `{requested}`")]
    AlreadyLinked {
        /// Property being linked.
        name: String,
        /// Its existing reciprocal.
        current: String,
        /// The rejected new partner.
        requested: String,
    },

    /// A property cannot be its own reciprocal.
    #[error("`{name}` cannot be its own reciprocal")]
    SelfReciprocal {
        /// Property name.
        name: String,
    },

    /// Two descriptors share a name.
    #[error("duplicate attribute name `{name}`")]
    DuplicateName {
        /// The repeated name.
        name: String,
    },

    /// The name is reserved by the host.
    #[error("`{name}` is reserved by the host")]
    ReservedName {
        /// The reserved name.
        name: String,
    },
}
