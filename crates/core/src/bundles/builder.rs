//! Descriptor assembly
//!
//! The builder mints descriptor-scoped keys and enforces at construction
//! time the structural invariants the storage schema cannot: a bundle is
//! fixed or configurable but never both, quantities are positive, slot
//! bounds are ordered, products are not repeated, and every amount agrees
//! on currency.

use rustc_hash::FxHashSet;
use rusty_money::{Money, iso::Currency};
use slotmap::SlotMap;
use thiserror::Error;

use crate::{
    bundles::{
        BundleConfig, BundleDescriptor,
        composition::{Composition, FixedLine, Slot, SlotKey},
    },
    discounts::BundleDiscount,
    products::ProductKey,
};

/// Structural problems found while assembling a descriptor.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DescriptorError {
    /// Neither lines nor slots were added.
    #[error("bundle has no composition")]
    EmptyComposition,

    /// Both lines and slots were added.
    #[error("bundle mixes fixed lines and selection slots")]
    MixedComposition,

    /// A fixed line has quantity zero.
    #[error("fixed line quantity must be at least 1")]
    ZeroQuantity,

    /// The same product appears in two fixed lines.
    #[error("product appears in more than one fixed line")]
    DuplicateLineProduct,

    /// The same product appears twice among one slot's candidates.
    #[error("slot {slot} lists the same candidate product twice")]
    DuplicateCandidate {
        /// Name of the offending slot.
        slot: String,
    },

    /// A required slot allows zero selections.
    #[error("required slot {slot} needs min_selections of at least 1")]
    RequiredSlotWithoutMinimum {
        /// Name of the offending slot.
        slot: String,
    },

    /// A slot's minimum exceeds its maximum.
    #[error("slot {slot} has min_selections {min} above max_selections {max}")]
    SelectionBoundsInverted {
        /// Name of the offending slot.
        slot: String,
        /// Configured minimum.
        min: u32,
        /// Configured maximum.
        max: u32,
    },

    /// An amount is denominated in the wrong currency.
    #[error("currency mismatch: expected {expected}, found {found}")]
    CurrencyMismatch {
        /// The descriptor currency.
        expected: &'static str,
        /// The currency actually found.
        found: &'static str,
    },
}

/// Builds a [`BundleDescriptor`], minting its keys along the way.
#[derive(Debug)]
pub struct DescriptorBuilder<'a> {
    config: BundleConfig<'a>,
    product_keys: SlotMap<ProductKey, ()>,
    slot_keys: SlotMap<SlotKey, ()>,
    lines: Vec<FixedLine<'a>>,
    slots: Vec<Slot<'a>>,
}

impl<'a> DescriptorBuilder<'a> {
    /// Starts a descriptor from its static configuration.
    #[must_use]
    pub fn new(config: BundleConfig<'a>) -> Self {
        Self {
            config,
            product_keys: SlotMap::with_key(),
            slot_keys: SlotMap::with_key(),
            lines: Vec::new(),
            slots: Vec::new(),
        }
    }

    /// Mints a key for one referenced product. Callers resolving from
    /// storage reuse the same key for repeated references to one product.
    pub fn product(&mut self) -> ProductKey {
        self.product_keys.insert(())
    }

    /// Mints a key for one selection slot.
    pub fn slot(&mut self) -> SlotKey {
        self.slot_keys.insert(())
    }

    /// Adds a fixed bundle line.
    pub fn push_line(&mut self, line: FixedLine<'a>) {
        self.lines.push(line);
    }

    /// Adds a selection slot.
    pub fn push_slot(&mut self, slot: Slot<'a>) {
        self.slots.push(slot);
    }

    /// Validates the accumulated composition and assembles the descriptor.
    ///
    /// # Errors
    ///
    /// Returns a [`DescriptorError`] naming the first structural invariant
    /// the composition violates.
    pub fn finish(self) -> Result<BundleDescriptor<'a>, DescriptorError> {
        let Self {
            config,
            lines,
            slots,
            ..
        } = self;

        check_discount_currency(&config.discount, config.currency)?;

        let composition = match (lines.is_empty(), slots.is_empty()) {
            (true, true) => return Err(DescriptorError::EmptyComposition),
            (false, false) => return Err(DescriptorError::MixedComposition),
            (false, true) => {
                check_lines(&lines, config.currency)?;
                Composition::Fixed(lines)
            }
            (true, false) => {
                check_slots(&slots, config.currency)?;
                Composition::Configurable(slots)
            }
        };

        Ok(BundleDescriptor {
            slug: config.slug,
            currency: config.currency,
            discount: config.discount,
            is_active: config.is_active,
            window: config.window,
            stock: config.stock,
            allow_coupon_stacking: config.allow_coupon_stacking,
            display: config.display,
            composition,
        })
    }
}

fn check_discount_currency(
    discount: &BundleDiscount<'_>,
    currency: &'static Currency,
) -> Result<(), DescriptorError> {
    match discount {
        BundleDiscount::FixedPrice(amount) => check_currency(amount, currency),
        BundleDiscount::PercentageOff(_) => Ok(()),
    }
}

fn check_lines(lines: &[FixedLine<'_>], currency: &'static Currency) -> Result<(), DescriptorError> {
    let mut seen = FxHashSet::default();

    for line in lines {
        if line.quantity() == 0 {
            return Err(DescriptorError::ZeroQuantity);
        }

        if !seen.insert(line.product()) {
            return Err(DescriptorError::DuplicateLineProduct);
        }

        if let Some(price_override) = line.price_override() {
            check_currency(&price_override, currency)?;
        }

        if let Some(listing) = line.listing() {
            check_currency(listing.price(), currency)?;
        }
    }

    Ok(())
}

fn check_slots(slots: &[Slot<'_>], currency: &'static Currency) -> Result<(), DescriptorError> {
    for slot in slots {
        if slot.is_required() && slot.min_selections() == 0 {
            return Err(DescriptorError::RequiredSlotWithoutMinimum {
                slot: slot.name().to_owned(),
            });
        }

        if slot.min_selections() > slot.max_selections() {
            return Err(DescriptorError::SelectionBoundsInverted {
                slot: slot.name().to_owned(),
                min: slot.min_selections(),
                max: slot.max_selections(),
            });
        }

        let mut seen = FxHashSet::default();

        for candidate in slot.candidates() {
            if !seen.insert(candidate.product()) {
                return Err(DescriptorError::DuplicateCandidate {
                    slot: slot.name().to_owned(),
                });
            }

            if let Some(price_override) = candidate.price_override() {
                check_currency(&price_override, currency)?;
            }

            if let Some(listing) = candidate.listing() {
                check_currency(listing.price(), currency)?;
            }
        }
    }

    Ok(())
}

fn check_currency(
    amount: &Money<'_, Currency>,
    currency: &'static Currency,
) -> Result<(), DescriptorError> {
    if amount.currency() == currency {
        Ok(())
    } else {
        Err(DescriptorError::CurrencyMismatch {
            expected: currency.iso_alpha_code,
            found: amount.currency().iso_alpha_code,
        })
    }
}
