//! Slot selections
//!
//! Request-scoped customer choices for a configurable bundle, and their
//! validation against the bundle's slots. Validation collects every
//! violation rather than stopping at the first, so a storefront can render
//! complete per-slot feedback in one pass.

use rustc_hash::FxHashMap;
use smallvec::SmallVec;
use thiserror::Error;

use crate::{
    bundles::{
        BundleDescriptor,
        composition::{Composition, Slot, SlotKey},
    },
    products::ProductKey,
};

/// One slot's worth of chosen products, as posted by the storefront.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotSelection {
    /// The slot being filled.
    pub slot: SlotKey,

    /// Chosen candidate products. Duplicates are normalized away.
    pub products: SmallVec<[ProductKey; 2]>,
}

impl SlotSelection {
    /// Creates a selection for one slot.
    #[must_use]
    pub fn new(slot: SlotKey, products: impl IntoIterator<Item = ProductKey>) -> Self {
        Self {
            slot,
            products: products.into_iter().collect(),
        }
    }
}

/// A single way one selection set breaks one slot's rules.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SelectionViolation {
    /// A required slot was left empty.
    #[error("slot \"{name}\" requires at least {min} selection(s)")]
    MissingRequiredSlot {
        /// The violated slot.
        slot: SlotKey,
        /// Its display name.
        name: String,
        /// Its configured minimum.
        min: u32,
    },

    /// A filled slot holds too few or too many selections.
    #[error("slot \"{name}\" takes {min} to {max} selections, got {selected}")]
    SelectionCountOutOfRange {
        /// The violated slot.
        slot: SlotKey,
        /// Its display name.
        name: String,
        /// Distinct products selected.
        selected: u32,
        /// Configured minimum.
        min: u32,
        /// Configured maximum.
        max: u32,
    },

    /// A selected product is not among the slot's candidates.
    #[error("slot \"{name}\" has no such candidate product")]
    UnknownProductInSlot {
        /// The violated slot.
        slot: SlotKey,
        /// Its display name.
        name: String,
        /// The offending product.
        product: ProductKey,
    },

    /// A selected candidate is out of stock or delisted.
    #[error("slot \"{name}\": selected product cannot currently be sold")]
    OutOfStockProductSelected {
        /// The violated slot.
        slot: SlotKey,
        /// Its display name.
        name: String,
        /// The offending product.
        product: ProductKey,
    },

    /// A selection names a slot this bundle does not have.
    #[error("bundle has no such slot")]
    UnknownSlot {
        /// The unrecognized slot key.
        slot: SlotKey,
    },

    /// Selections were posted against a fixed bundle.
    #[error("bundle is not configurable")]
    NotConfigurable,
}

/// Every violation found in one validation attempt. Validation is
/// all-or-nothing: one violation anywhere rejects the whole set.
#[derive(Debug, Clone, Error)]
#[error("selection set rejected with {} violation(s)", violations.len())]
pub struct SelectionErrors {
    /// The violations, in slot order.
    pub violations: Vec<SelectionViolation>,
}

/// A normalized selection set that passed validation. Holding one is proof
/// the selections fit the descriptor it was validated against, which is what
/// the pricing calculator requires.
#[derive(Debug, Clone, Default)]
pub struct ValidatedSelections {
    chosen: FxHashMap<SlotKey, SmallVec<[ProductKey; 2]>>,
}

impl ValidatedSelections {
    /// True when nothing was selected (every slot skipped).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.chosen.is_empty()
    }

    /// Number of filled slots.
    #[must_use]
    pub fn filled_slots(&self) -> usize {
        self.chosen.len()
    }

    /// The chosen products for one slot; empty when the slot was skipped.
    #[must_use]
    pub fn products_for(&self, slot: SlotKey) -> &[ProductKey] {
        self.chosen
            .get(&slot)
            .map_or(&[], SmallVec::as_slice)
    }
}

/// Validates a proposed selection set against a configurable descriptor.
///
/// Duplicate products within one slot's selection are deduplicated before
/// cardinality checks. Slots with zero selections are omitted from the
/// normalized result.
///
/// # Errors
///
/// Returns [`SelectionErrors`] carrying every violated slot, never just the
/// first one found.
pub fn validate_selections(
    descriptor: &BundleDescriptor<'_>,
    selections: &[SlotSelection],
) -> Result<ValidatedSelections, SelectionErrors> {
    let Composition::Configurable(slots) = descriptor.composition() else {
        return Err(SelectionErrors {
            violations: vec![SelectionViolation::NotConfigurable],
        });
    };

    let requested = normalize(selections);
    let mut violations = Vec::new();

    for slot_key in requested.keys() {
        if !slots.iter().any(|slot| slot.key() == *slot_key) {
            violations.push(SelectionViolation::UnknownSlot { slot: *slot_key });
        }
    }

    let mut chosen = FxHashMap::default();

    for slot in slots {
        let picked = requested.get(&slot.key()).cloned().unwrap_or_default();

        check_slot(slot, &picked, &mut violations);

        if !picked.is_empty() {
            chosen.insert(slot.key(), picked);
        }
    }

    if violations.is_empty() {
        Ok(ValidatedSelections { chosen })
    } else {
        Err(SelectionErrors { violations })
    }
}

/// Index selections by slot, deduplicating products while preserving order.
fn normalize(selections: &[SlotSelection]) -> FxHashMap<SlotKey, SmallVec<[ProductKey; 2]>> {
    let mut requested: FxHashMap<SlotKey, SmallVec<[ProductKey; 2]>> = FxHashMap::default();

    for selection in selections {
        let entry = requested.entry(selection.slot).or_default();

        for product in &selection.products {
            if !entry.contains(product) {
                entry.push(*product);
            }
        }
    }

    requested
}

fn check_slot(slot: &Slot<'_>, picked: &[ProductKey], violations: &mut Vec<SelectionViolation>) {
    let selected = u32::try_from(picked.len()).unwrap_or(u32::MAX);

    if selected == 0 {
        if slot.is_required() {
            violations.push(SelectionViolation::MissingRequiredSlot {
                slot: slot.key(),
                name: slot.name().to_owned(),
                min: slot.min_selections(),
            });
        }

        return;
    }

    if selected < slot.min_selections() || selected > slot.max_selections() {
        violations.push(SelectionViolation::SelectionCountOutOfRange {
            slot: slot.key(),
            name: slot.name().to_owned(),
            selected,
            min: slot.min_selections(),
            max: slot.max_selections(),
        });
    }

    for product in picked {
        match slot.candidate(*product) {
            None => violations.push(SelectionViolation::UnknownProductInSlot {
                slot: slot.key(),
                name: slot.name().to_owned(),
                product: *product,
            }),
            Some(candidate) if !candidate.is_selectable() => {
                violations.push(SelectionViolation::OutOfStockProductSelected {
                    slot: slot.key(),
                    name: slot.name().to_owned(),
                    product: *product,
                });
            }
            Some(_) => {}
        }
    }
}
