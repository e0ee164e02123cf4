//! Selection Requests

use crate::{bundles::records::SlotUuid, catalog::ProductUuid};

/// One slot's worth of chosen products, as posted by the storefront. The
/// resolver translates these identities into descriptor keys before the
/// engine validates them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotSelectionRequest {
    /// The slot being filled.
    pub slot: SlotUuid,

    /// Chosen candidate products.
    pub products: Vec<ProductUuid>,
}

impl SlotSelectionRequest {
    /// Creates a request for one slot.
    #[must_use]
    pub fn new(slot: SlotUuid, products: impl IntoIterator<Item = ProductUuid>) -> Self {
        Self {
            slot,
            products: products.into_iter().collect(),
        }
    }
}
