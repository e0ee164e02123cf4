//! Product catalog collaborator
//!
//! The engine never owns products; it reads their current price and stock
//! state from whatever catalog service the host wires in. Lookups must
//! reflect catalog state at call time; nothing here caches across calls.

use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use mockall::automock;
use rustc_hash::FxHashMap;
use thiserror::Error;

use crate::uuids::TypedUuid;

/// Product UUID
pub type ProductUuid = TypedUuid<CatalogProduct>;

/// Snapshot of one catalog product at lookup time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CatalogProduct {
    /// Catalog identity.
    pub uuid: ProductUuid,

    /// Current price in minor units.
    pub price: u64,

    /// Whether the product can currently be sold.
    pub in_stock: bool,
}

/// Catalog lookup errors.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// The product does not exist or has been delisted.
    #[error("product not found")]
    NotFound,

    /// The underlying provider failed.
    #[error("catalog provider error")]
    Provider(#[source] Box<dyn std::error::Error + Send + Sync>),
}

#[automock]
#[async_trait]
pub trait ProductCatalog: Send + Sync {
    /// Look up one product's current price and stock state.
    async fn get_product(&self, product: ProductUuid) -> Result<CatalogProduct, CatalogError>;
}

/// In-memory catalog used by tests and demos. Cloning shares the underlying
/// map, so a test can keep a handle and move prices or stock between
/// resolutions.
#[derive(Debug, Clone, Default)]
pub struct InMemoryProductCatalog {
    products: Arc<RwLock<FxHashMap<ProductUuid, CatalogProduct>>>,
}

impl InMemoryProductCatalog {
    /// Creates an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a product.
    pub fn upsert(&self, product: CatalogProduct) {
        // A poisoned lock only follows a panicking writer, which this type
        // has none of; losing the write is acceptable for a test helper.
        if let Ok(mut products) = self.products.write() {
            products.insert(product.uuid, product);
        }
    }

    /// Updates a product's price, if it exists.
    pub fn set_price(&self, product: ProductUuid, price: u64) {
        if let Ok(mut products) = self.products.write() {
            if let Some(entry) = products.get_mut(&product) {
                entry.price = price;
            }
        }
    }

    /// Updates a product's stock state, if it exists.
    pub fn set_stock(&self, product: ProductUuid, in_stock: bool) {
        if let Ok(mut products) = self.products.write() {
            if let Some(entry) = products.get_mut(&product) {
                entry.in_stock = in_stock;
            }
        }
    }

    /// Removes a product from the catalog entirely.
    pub fn delist(&self, product: ProductUuid) {
        if let Ok(mut products) = self.products.write() {
            products.remove(&product);
        }
    }
}

#[async_trait]
impl ProductCatalog for InMemoryProductCatalog {
    async fn get_product(&self, product: ProductUuid) -> Result<CatalogProduct, CatalogError> {
        let products = self
            .products
            .read()
            .map_err(|_err| CatalogError::Provider("catalog lock poisoned".into()))?;

        products.get(&product).copied().ok_or(CatalogError::NotFound)
    }
}
