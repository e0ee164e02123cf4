//! Bundle store collaborator
//!
//! Whatever persists bundles (Postgres, an admin API, a static file) sits
//! behind this trait. Soft deletion is the store's concern: a deleted bundle
//! is simply not found.

use std::{
    fmt,
    sync::{Arc, RwLock},
};

use async_trait::async_trait;
use mockall::automock;
use thiserror::Error;

use crate::bundles::records::{BundleRecord, BundleUuid};

/// Reference to a bundle, the two ways storefront URLs carry it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BundleRef {
    /// By storefront slug.
    Slug(String),

    /// By identity.
    Uuid(BundleUuid),
}

impl fmt::Display for BundleRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Slug(slug) => write!(f, "slug:{slug}"),
            Self::Uuid(uuid) => write!(f, "uuid:{uuid}"),
        }
    }
}

impl From<BundleUuid> for BundleRef {
    fn from(value: BundleUuid) -> Self {
        Self::Uuid(value)
    }
}

impl From<&str> for BundleRef {
    fn from(value: &str) -> Self {
        Self::Slug(value.to_owned())
    }
}

/// Store lookup errors.
#[derive(Debug, Error)]
pub enum StoreError {
    /// No live bundle matches the reference.
    #[error("bundle not found")]
    NotFound,

    /// The underlying provider failed.
    #[error("bundle store error")]
    Provider(#[source] Box<dyn std::error::Error + Send + Sync>),
}

#[automock]
#[async_trait]
pub trait BundleStore: Send + Sync {
    /// Load one live (non-deleted) bundle with its full composition.
    async fn get_bundle(&self, reference: &BundleRef) -> Result<BundleRecord, StoreError>;
}

/// In-memory store used by tests and demos. Cloning shares the records.
#[derive(Debug, Clone, Default)]
pub struct InMemoryBundleStore {
    bundles: Arc<RwLock<Vec<BundleRecord>>>,
}

impl InMemoryBundleStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a bundle by identity.
    pub fn upsert(&self, record: BundleRecord) {
        // A poisoned lock only follows a panicking writer, which this type
        // has none of; losing the write is acceptable for a test helper.
        if let Ok(mut bundles) = self.bundles.write() {
            bundles.retain(|existing| existing.uuid != record.uuid);
            bundles.push(record);
        }
    }
}

#[async_trait]
impl BundleStore for InMemoryBundleStore {
    async fn get_bundle(&self, reference: &BundleRef) -> Result<BundleRecord, StoreError> {
        let bundles = self
            .bundles
            .read()
            .map_err(|_err| StoreError::Provider("store lock poisoned".into()))?;

        bundles
            .iter()
            .find(|record| record.deleted_at.is_none() && matches_reference(record, reference))
            .cloned()
            .ok_or(StoreError::NotFound)
    }
}

fn matches_reference(record: &BundleRecord, reference: &BundleRef) -> bool {
    match reference {
        BundleRef::Slug(slug) => record.slug == *slug,
        BundleRef::Uuid(uuid) => record.uuid == *uuid,
    }
}

#[cfg(test)]
mod tests {
    use jiff::Timestamp;

    use crate::bundles::records::{CompositionRecord, DiscountRecord};

    use super::*;

    fn record(slug: &str) -> BundleRecord {
        BundleRecord {
            uuid: BundleUuid::new(),
            slug: slug.to_owned(),
            discount: DiscountRecord::PercentageOff { basis_points: 1_000 },
            is_active: true,
            starts_at: None,
            ends_at: None,
            stock_limit: None,
            stock_sold: 0,
            allow_coupon_stacking: false,
            display: hamper::bundles::DisplayFlags::default(),
            composition: CompositionRecord::Fixed(Vec::new()),
            created_at: Timestamp::now(),
            updated_at: Timestamp::now(),
            deleted_at: None,
        }
    }

    #[tokio::test]
    async fn finds_bundles_by_slug_and_uuid() -> Result<(), StoreError> {
        let store = InMemoryBundleStore::new();
        let bundle = record("starter-kit");
        let uuid = bundle.uuid;
        store.upsert(bundle);

        let by_slug = store.get_bundle(&BundleRef::from("starter-kit")).await?;
        let by_uuid = store.get_bundle(&BundleRef::from(uuid)).await?;

        assert_eq!(by_slug.uuid, uuid);
        assert_eq!(by_uuid.slug, "starter-kit");

        Ok(())
    }

    #[tokio::test]
    async fn soft_deleted_bundles_are_not_found() {
        let store = InMemoryBundleStore::new();
        let mut bundle = record("gone");
        bundle.deleted_at = Some(Timestamp::now());
        store.upsert(bundle);

        let result = store.get_bundle(&BundleRef::from("gone")).await;

        assert!(matches!(result, Err(StoreError::NotFound)));
    }

    #[test]
    fn references_render_for_logs() {
        let reference = BundleRef::from("starter-kit");

        assert_eq!(reference.to_string(), "slug:starter-kit");
    }
}
