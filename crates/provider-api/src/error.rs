use thiserror::Error;

/// Errors that can occur when mutating a provider registry.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    /// A provider attempted to register an id that already exists.
    #[error("provider id '{id}' is already registered")]
    DuplicateId { id: String },
}
