//! Bundle composition
//!
//! A bundle is structurally one of two shapes: a fixed list of product lines,
//! or an ordered list of selection slots. The sum type makes the
//! both-or-neither state unrepresentable.

use rusty_money::{Money, iso::Currency};
use slotmap::new_key_type;

use crate::products::{ProductKey, ProductListing};

new_key_type! {
    /// Slot Key
    pub struct SlotKey;
}

/// The product makeup of a bundle.
#[derive(Debug, Clone)]
pub enum Composition<'a> {
    /// A pre-determined, unchangeable set of lines.
    Fixed(Vec<FixedLine<'a>>),

    /// Ordered selection slots the customer fills from candidates.
    Configurable(Vec<Slot<'a>>),
}

impl<'a> Composition<'a> {
    /// True for fixed bundles.
    #[must_use]
    pub fn is_fixed(&self) -> bool {
        matches!(self, Self::Fixed(_))
    }

    /// True for configurable bundles.
    #[must_use]
    pub fn is_configurable(&self) -> bool {
        matches!(self, Self::Configurable(_))
    }

    /// The slots of a configurable bundle.
    #[must_use]
    pub fn slots(&self) -> Option<&[Slot<'a>]> {
        match self {
            Self::Fixed(_) => None,
            Self::Configurable(slots) => Some(slots),
        }
    }

    /// The lines of a fixed bundle.
    #[must_use]
    pub fn lines(&self) -> Option<&[FixedLine<'a>]> {
        match self {
            Self::Fixed(lines) => Some(lines),
            Self::Configurable(_) => None,
        }
    }
}

/// One line of a fixed bundle: a product, a quantity, and optionally a price
/// that supersedes the catalog price for this line only.
#[derive(Debug, Clone)]
pub struct FixedLine<'a> {
    product: ProductKey,
    quantity: u32,
    price_override: Option<Money<'a, Currency>>,
    listing: Option<ProductListing<'a>>,
}

impl<'a> FixedLine<'a> {
    /// Creates a new line.
    #[must_use]
    pub fn new(
        product: ProductKey,
        quantity: u32,
        price_override: Option<Money<'a, Currency>>,
        listing: Option<ProductListing<'a>>,
    ) -> Self {
        Self {
            product,
            quantity,
            price_override,
            listing,
        }
    }

    /// The referenced product.
    #[must_use]
    pub fn product(&self) -> ProductKey {
        self.product
    }

    /// Units of the product in the bundle.
    #[must_use]
    pub fn quantity(&self) -> u32 {
        self.quantity
    }

    /// Per-line price override, if configured.
    #[must_use]
    pub fn price_override(&self) -> Option<Money<'a, Currency>> {
        self.price_override
    }

    /// Live catalog state, absent when the product has been delisted.
    #[must_use]
    pub fn listing(&self) -> Option<ProductListing<'a>> {
        self.listing
    }

    /// True when the product no longer exists in the catalog.
    #[must_use]
    pub fn is_missing(&self) -> bool {
        self.listing.is_none()
    }

    /// Effective per-unit price: the override when present, the catalog price
    /// otherwise. Delisted lines have no price and are excluded from totals.
    #[must_use]
    pub fn unit_price(&self) -> Option<Money<'a, Currency>> {
        let listing = self.listing?;

        Some(self.price_override.unwrap_or_else(|| *listing.price()))
    }
}

/// A candidate product the customer may pick for a slot.
#[derive(Debug, Clone)]
pub struct SlotCandidate<'a> {
    product: ProductKey,
    price_override: Option<Money<'a, Currency>>,
    listing: Option<ProductListing<'a>>,
}

impl<'a> SlotCandidate<'a> {
    /// Creates a new candidate.
    #[must_use]
    pub fn new(
        product: ProductKey,
        price_override: Option<Money<'a, Currency>>,
        listing: Option<ProductListing<'a>>,
    ) -> Self {
        Self {
            product,
            price_override,
            listing,
        }
    }

    /// The candidate product.
    #[must_use]
    pub fn product(&self) -> ProductKey {
        self.product
    }

    /// Per-candidate price override, if configured.
    #[must_use]
    pub fn price_override(&self) -> Option<Money<'a, Currency>> {
        self.price_override
    }

    /// Live catalog state, absent when the product has been delisted.
    #[must_use]
    pub fn listing(&self) -> Option<ProductListing<'a>> {
        self.listing
    }

    /// True when the candidate is listed and in stock, so a customer may
    /// validly select it right now.
    #[must_use]
    pub fn is_selectable(&self) -> bool {
        self.listing.is_some_and(|listing| listing.in_stock())
    }

    /// Effective price when selected: the override when present, the catalog
    /// price otherwise. Quantity is always one per selected candidate.
    #[must_use]
    pub fn unit_price(&self) -> Option<Money<'a, Currency>> {
        let listing = self.listing?;

        Some(self.price_override.unwrap_or_else(|| *listing.price()))
    }
}

/// A named selection group within a configurable bundle.
#[derive(Debug, Clone)]
pub struct Slot<'a> {
    key: SlotKey,
    name: String,
    is_required: bool,
    min_selections: u32,
    max_selections: u32,
    candidates: Vec<SlotCandidate<'a>>,
}

impl<'a> Slot<'a> {
    /// Creates a new slot.
    pub fn new(
        key: SlotKey,
        name: impl Into<String>,
        is_required: bool,
        min_selections: u32,
        max_selections: u32,
        candidates: Vec<SlotCandidate<'a>>,
    ) -> Self {
        Self {
            key,
            name: name.into(),
            is_required,
            min_selections,
            max_selections,
            candidates,
        }
    }

    /// Slot key.
    #[must_use]
    pub fn key(&self) -> SlotKey {
        self.key
    }

    /// Human-readable slot name (e.g. "camera", "memory card").
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether the slot must be filled for a valid selection set.
    #[must_use]
    pub fn is_required(&self) -> bool {
        self.is_required
    }

    /// Minimum number of distinct selections when the slot is filled.
    #[must_use]
    pub fn min_selections(&self) -> u32 {
        self.min_selections
    }

    /// Maximum number of distinct selections.
    #[must_use]
    pub fn max_selections(&self) -> u32 {
        self.max_selections
    }

    /// Candidate products, in display order.
    #[must_use]
    pub fn candidates(&self) -> &[SlotCandidate<'a>] {
        &self.candidates
    }

    /// Look up a candidate by product.
    #[must_use]
    pub fn candidate(&self, product: ProductKey) -> Option<&SlotCandidate<'a>> {
        self.candidates
            .iter()
            .find(|candidate| candidate.product() == product)
    }

    /// True when enough candidates remain selectable to satisfy the slot.
    /// Optional slots are always fulfillable because they may be skipped.
    #[must_use]
    pub fn is_fulfillable(&self) -> bool {
        if !self.is_required {
            return true;
        }

        let selectable = self
            .candidates
            .iter()
            .filter(|candidate| candidate.is_selectable())
            .count();

        selectable >= usize::try_from(self.min_selections).unwrap_or(usize::MAX)
    }
}

#[cfg(test)]
mod tests {
    use rusty_money::iso::PKR;
    use slotmap::SlotMap;

    use super::*;

    fn listing(minor: i64, in_stock: bool) -> ProductListing<'static> {
        ProductListing::new(Money::from_minor(minor, PKR), in_stock)
    }

    #[test]
    fn fixed_line_unit_price_prefers_the_override() {
        let line = FixedLine::new(
            ProductKey::default(),
            2,
            Some(Money::from_minor(250_000, PKR)),
            Some(listing(300_000, true)),
        );

        assert_eq!(line.unit_price(), Some(Money::from_minor(250_000, PKR)));
    }

    #[test]
    fn fixed_line_unit_price_falls_back_to_the_listing() {
        let line = FixedLine::new(ProductKey::default(), 1, None, Some(listing(300_000, true)));

        assert_eq!(line.unit_price(), Some(Money::from_minor(300_000, PKR)));
    }

    #[test]
    fn delisted_line_has_no_price_even_with_an_override() {
        let line = FixedLine::new(
            ProductKey::default(),
            1,
            Some(Money::from_minor(250_000, PKR)),
            None,
        );

        assert!(line.is_missing());
        assert_eq!(line.unit_price(), None);
    }

    #[test]
    fn out_of_stock_candidate_is_not_selectable_but_still_priced() {
        let candidate = SlotCandidate::new(ProductKey::default(), None, Some(listing(1_000, false)));

        assert!(!candidate.is_selectable());
        assert_eq!(candidate.unit_price(), Some(Money::from_minor(1_000, PKR)));
    }

    #[test]
    fn required_slot_with_too_few_selectable_candidates_is_unfulfillable() {
        let mut products = SlotMap::<ProductKey, ()>::with_key();
        let first = products.insert(());
        let second = products.insert(());

        let slot = Slot::new(
            SlotKey::default(),
            "memory card",
            true,
            2,
            2,
            vec![
                SlotCandidate::new(first, None, Some(listing(1_000, true))),
                SlotCandidate::new(second, None, None),
            ],
        );

        assert!(!slot.is_fulfillable());
    }

    #[test]
    fn optional_slot_is_always_fulfillable() {
        let slot = Slot::new(SlotKey::default(), "extras", false, 0, 2, Vec::new());

        assert!(slot.is_fulfillable());
    }

    #[test]
    fn candidate_lookup_matches_on_product() {
        let mut products = SlotMap::<ProductKey, ()>::with_key();
        let known = products.insert(());
        let unknown = products.insert(());

        let slot = Slot::new(
            SlotKey::default(),
            "camera",
            true,
            1,
            1,
            vec![SlotCandidate::new(known, None, Some(listing(1_000, true)))],
        );

        assert!(slot.candidate(known).is_some());
        assert!(slot.candidate(unknown).is_none());
    }
}
