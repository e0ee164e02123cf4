//! Bundles
//!
//! A bundle descriptor is the fully materialized, in-memory view of one
//! sellable composite offer: its discount rule, sale window, stock counter
//! and composition, with every referenced product annotated with live
//! catalog state. Descriptors are built per request by a resolver and never
//! cached, because prices and stock change between requests.

use jiff::Timestamp;
use rusty_money::iso::Currency;

use crate::discounts::BundleDiscount;

pub mod availability;
pub mod builder;
pub mod composition;

use availability::{Availability, SaleWindow, StockCounter};
use composition::{Composition, Slot, SlotKey};

/// Gates for what the storefront surfaces alongside the price. These are
/// presentation inputs, never computation inputs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DisplayFlags {
    /// Show the savings amount next to the discounted price.
    pub show_savings: bool,

    /// Show a countdown to the end of the sale window.
    pub show_countdown: bool,
}

/// Static bundle configuration shared by both composition shapes.
#[derive(Debug, Clone)]
pub struct BundleConfig<'a> {
    /// Stable storefront identifier.
    pub slug: String,

    /// Currency every amount in the descriptor must be denominated in.
    pub currency: &'static Currency,

    /// The discount rule.
    pub discount: BundleDiscount<'a>,

    /// Administrator on/off switch.
    pub is_active: bool,

    /// Sale window.
    pub window: SaleWindow,

    /// Sales cap bookkeeping.
    pub stock: StockCounter,

    /// Whether coupon codes may stack on top of the bundle discount.
    /// Carried for outer checkout layers; this engine applies no coupons.
    pub allow_coupon_stacking: bool,

    /// Presentation gates.
    pub display: DisplayFlags,
}

/// A resolved bundle, ready for validation and pricing.
#[derive(Debug, Clone)]
pub struct BundleDescriptor<'a> {
    pub(crate) slug: String,
    pub(crate) currency: &'static Currency,
    pub(crate) discount: BundleDiscount<'a>,
    pub(crate) is_active: bool,
    pub(crate) window: SaleWindow,
    pub(crate) stock: StockCounter,
    pub(crate) allow_coupon_stacking: bool,
    pub(crate) display: DisplayFlags,
    pub(crate) composition: Composition<'a>,
}

impl<'a> BundleDescriptor<'a> {
    /// Storefront slug.
    #[must_use]
    pub fn slug(&self) -> &str {
        &self.slug
    }

    /// Descriptor currency.
    #[must_use]
    pub fn currency(&self) -> &'static Currency {
        self.currency
    }

    /// The discount rule.
    #[must_use]
    pub fn discount(&self) -> &BundleDiscount<'a> {
        &self.discount
    }

    /// Administrator on/off switch.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.is_active
    }

    /// Sale window.
    #[must_use]
    pub fn window(&self) -> &SaleWindow {
        &self.window
    }

    /// Sales cap bookkeeping.
    #[must_use]
    pub fn stock(&self) -> &StockCounter {
        &self.stock
    }

    /// Whether coupon codes may stack on top of the bundle discount.
    #[must_use]
    pub fn allow_coupon_stacking(&self) -> bool {
        self.allow_coupon_stacking
    }

    /// Presentation gates.
    #[must_use]
    pub fn display(&self) -> DisplayFlags {
        self.display
    }

    /// The product makeup.
    #[must_use]
    pub fn composition(&self) -> &Composition<'a> {
        &self.composition
    }

    /// Look up a slot of a configurable bundle.
    #[must_use]
    pub fn slot(&self, key: SlotKey) -> Option<&Slot<'a>> {
        self.composition
            .slots()?
            .iter()
            .find(|slot| slot.key() == key)
    }

    /// Evaluates availability at `now`. Checks run most-administrative
    /// first: active flag, window open, window close, stock, composition.
    #[must_use]
    pub fn availability(&self, now: Timestamp) -> Availability {
        if !self.is_active {
            return Availability::Inactive;
        }

        if self.window.not_started_by(now) {
            return Availability::NotYetStarted;
        }

        if self.window.ended_by(now) {
            return Availability::Ended;
        }

        if self.stock.is_exhausted() {
            return Availability::SoldOut;
        }

        if !self.composition_fulfillable() {
            return Availability::CompositionBroken;
        }

        Availability::Available
    }

    fn composition_fulfillable(&self) -> bool {
        match &self.composition {
            Composition::Fixed(lines) => lines.iter().all(|line| !line.is_missing()),
            Composition::Configurable(slots) => slots.iter().all(Slot::is_fulfillable),
        }
    }
}
