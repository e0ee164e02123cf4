//! Products

use rusty_money::{Money, iso::Currency};
use slotmap::new_key_type;

new_key_type! {
    /// Product Key
    pub struct ProductKey;
}

/// Live catalog state for a product referenced by a bundle, captured at
/// resolve time. A line or candidate without a listing has been delisted
/// from the catalog.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProductListing<'a> {
    price: Money<'a, Currency>,
    in_stock: bool,
}

impl<'a> ProductListing<'a> {
    /// Creates a listing from the current catalog price and stock state.
    #[must_use]
    pub fn new(price: Money<'a, Currency>, in_stock: bool) -> Self {
        Self { price, in_stock }
    }

    /// Current catalog price.
    pub fn price(&self) -> &Money<'a, Currency> {
        &self.price
    }

    /// Whether the product can currently be sold.
    #[must_use]
    pub fn in_stock(&self) -> bool {
        self.in_stock
    }
}
