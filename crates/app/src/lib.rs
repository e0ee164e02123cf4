//! Hamper App
//!
//! The asynchronous resolution layer around the `hamper` engine: collaborator
//! traits for the bundle store and product catalog, and the resolver that
//! materializes storage records into live, priceable bundle descriptors.

pub mod bundles;
pub mod catalog;
pub mod uuids;
