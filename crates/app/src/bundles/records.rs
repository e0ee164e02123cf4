//! Bundle Records
//!
//! Storage-shaped rows as returned by the bundle store collaborator:
//! integer money in minor units, percentages in basis points, soft deletes
//! as timestamps. The resolver turns these into live descriptors.

use hamper::bundles::DisplayFlags;
use jiff::Timestamp;

use crate::{catalog::ProductUuid, uuids::TypedUuid};

/// Bundle UUID
pub type BundleUuid = TypedUuid<BundleRecord>;

/// Slot UUID
pub type SlotUuid = TypedUuid<SlotRecord>;

/// Discount as stored by the back office.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiscountRecord {
    /// Whole-bundle price in minor units.
    FixedPrice {
        /// Configured price.
        amount: u64,
    },

    /// Percentage off in basis points (10 000 = 100%).
    PercentageOff {
        /// Configured percentage.
        basis_points: u32,
    },
}

impl DiscountRecord {
    /// Stable identifier for logs and admin forms.
    #[must_use]
    pub const fn to_str(&self) -> &'static str {
        match self {
            Self::FixedPrice { .. } => "fixed_price",
            Self::PercentageOff { .. } => "percentage",
        }
    }
}

/// Bundle Record
#[derive(Debug, Clone)]
pub struct BundleRecord {
    /// Identity.
    pub uuid: BundleUuid,

    /// Storefront slug, unique and immutable once published.
    pub slug: String,

    /// The configured discount.
    pub discount: DiscountRecord,

    /// Administrator on/off switch.
    pub is_active: bool,

    /// Sale window opening, if bounded.
    pub starts_at: Option<Timestamp>,

    /// Sale window close, if bounded.
    pub ends_at: Option<Timestamp>,

    /// Sales cap; `None` means unlimited.
    pub stock_limit: Option<u32>,

    /// Units sold so far, incremented by the order-completion collaborator.
    pub stock_sold: u32,

    /// Whether coupon codes stack on top of the bundle discount.
    pub allow_coupon_stacking: bool,

    /// Presentation gates.
    pub display: DisplayFlags,

    /// The product makeup.
    pub composition: CompositionRecord,

    /// Row bookkeeping.
    pub created_at: Timestamp,

    /// Row bookkeeping.
    pub updated_at: Timestamp,

    /// Soft-delete marker; stores must not return deleted bundles.
    pub deleted_at: Option<Timestamp>,
}

/// Composition as stored: fixed items or selection slots.
#[derive(Debug, Clone)]
pub enum CompositionRecord {
    /// Fixed bundle items.
    Fixed(Vec<FixedItemRecord>),

    /// Configurable bundle slots.
    Configurable(Vec<SlotRecord>),
}

/// One fixed bundle item row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedItemRecord {
    /// Referenced product.
    pub product_uuid: ProductUuid,

    /// Units in the bundle.
    pub quantity: u32,

    /// Per-line override in minor units.
    pub price_override: Option<u64>,
}

/// One selection slot row with its candidate products.
#[derive(Debug, Clone)]
pub struct SlotRecord {
    /// Identity.
    pub uuid: SlotUuid,

    /// Display name.
    pub name: String,

    /// Whether the slot must be filled.
    pub is_required: bool,

    /// Minimum distinct selections when filled.
    pub min_selections: u32,

    /// Maximum distinct selections.
    pub max_selections: u32,

    /// Candidate products, in display order.
    pub products: Vec<SlotProductRecord>,
}

/// One slot candidate row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotProductRecord {
    /// Referenced product.
    pub product_uuid: ProductUuid,

    /// Per-candidate override in minor units.
    pub price_override: Option<u64>,
}
