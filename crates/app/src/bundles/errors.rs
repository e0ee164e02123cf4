//! Resolution errors

use std::num::TryFromIntError;

use hamper::{bundles::builder::DescriptorError, pricing::PricingError, selections::SelectionErrors};
use thiserror::Error;

use crate::{bundles::store::StoreError, catalog::CatalogError};

/// Errors from resolving a bundle into a descriptor. Unavailability is not
/// among them: an inactive or sold-out bundle still resolves, carrying its
/// availability as data.
#[derive(Debug, Error)]
pub enum ResolveError {
    /// No live bundle matches the reference.
    #[error("bundle not found")]
    NotFound,

    /// The bundle store failed.
    #[error("bundle store error")]
    Store(#[source] StoreError),

    /// The product catalog failed (beyond individual missing products,
    /// which resolve as delisted lines).
    #[error("product catalog error")]
    Catalog(#[source] CatalogError),

    /// The stored composition is structurally invalid.
    #[error("bundle record rejected")]
    Descriptor(#[from] DescriptorError),

    /// A stored amount does not fit minor-unit arithmetic.
    #[error("invalid stored amount")]
    InvalidAmount(#[from] TryFromIntError),
}

impl From<StoreError> for ResolveError {
    fn from(error: StoreError) -> Self {
        match error {
            StoreError::NotFound => Self::NotFound,
            other => Self::Store(other),
        }
    }
}

/// Errors from quoting a bundle for a storefront request.
#[derive(Debug, Error)]
pub enum QuoteError {
    /// The posted selections do not fit the bundle's slots.
    #[error(transparent)]
    Selection(#[from] SelectionErrors),

    /// The pricing computation failed.
    #[error(transparent)]
    Pricing(#[from] PricingError),
}
