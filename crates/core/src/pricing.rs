//! Bundle pricing
//!
//! Computes the customer-facing price breakdown for a resolved bundle:
//! original sum-of-parts price, discounted price, savings, and the
//! informational stock/availability state. The breakdown is derived data,
//! recomputed on every request, because catalog prices and stock move
//! between requests.

use decimal_percentage::Percentage;
use jiff::Timestamp;
use rust_decimal::{
    Decimal, RoundingStrategy,
    prelude::FromPrimitive,
};
use rusty_money::{Money, MoneyError, iso::Currency};
use thiserror::Error;

use crate::{
    bundles::{
        BundleDescriptor,
        availability::Availability,
        composition::{Composition, FixedLine, Slot, SlotCandidate},
    },
    discounts::DiscountError,
    selections::ValidatedSelections,
};

/// Pricing configuration snapshot, injected per call so pricing stays a pure
/// function of descriptor, selections and config.
#[derive(Debug, Clone, Copy)]
pub struct PricingConfig {
    /// Rounding applied when a percentage lands between minor units.
    pub rounding: RoundingStrategy,
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            rounding: RoundingStrategy::MidpointAwayFromZero,
        }
    }
}

/// Errors from a pricing call.
#[derive(Debug, Error)]
pub enum PricingError {
    /// A configurable bundle was priced without a validated selection set.
    #[error("configurable bundles are priced from a validated selection set")]
    SelectionsRequired,

    /// A fixed bundle was priced with a selection set.
    #[error("fixed bundles take no selections")]
    SelectionsNotAllowed,

    /// A line amount exceeded the representable range.
    #[error("line amount overflowed")]
    AmountOverflow,

    /// Wrapped discount arithmetic error.
    #[error(transparent)]
    Discount(#[from] DiscountError),

    /// Wrapped money arithmetic error.
    #[error(transparent)]
    Money(#[from] MoneyError),
}

/// The computed price breakdown for one bundle at one instant. Never stored.
#[derive(Debug, Clone, PartialEq)]
pub struct PricingBreakdown<'a> {
    /// Sum of the parts at live catalog prices, honoring overrides.
    pub original_price: Money<'a, Currency>,

    /// Price after the bundle discount.
    pub discounted_price: Money<'a, Currency>,

    /// `original_price - discounted_price`, floored at zero.
    pub savings: Money<'a, Currency>,

    /// Savings as a fraction of the original price, in [0, 1]. Render as a
    /// percentage at presentation time only.
    pub savings_ratio: Percentage,

    /// Units left under the sales cap; `None` when uncapped.
    pub stock_remaining: Option<u32>,

    /// Availability at the pricing instant.
    pub availability: Availability,
}

/// Computes the [`PricingBreakdown`] for a resolved bundle.
///
/// Fixed bundles are priced as-is and must be called without selections;
/// configurable bundles require a [`ValidatedSelections`] token from
/// [`crate::selections::validate_selections`]. An empty validated set prices
/// to zero, which is not an error.
///
/// # Errors
///
/// Returns a [`PricingError`] when selections are passed to a fixed bundle or
/// withheld from a configurable one, or when money arithmetic overflows.
pub fn price_bundle<'a>(
    descriptor: &BundleDescriptor<'a>,
    selections: Option<&ValidatedSelections>,
    config: &PricingConfig,
    now: Timestamp,
) -> Result<PricingBreakdown<'a>, PricingError> {
    let original = match (descriptor.composition(), selections) {
        (Composition::Fixed(_), Some(_)) => return Err(PricingError::SelectionsNotAllowed),
        (Composition::Configurable(_), None) => return Err(PricingError::SelectionsRequired),
        (Composition::Fixed(lines), None) => fixed_original(lines, descriptor.currency())?,
        (Composition::Configurable(slots), Some(validated)) => {
            selected_original(slots, validated, descriptor.currency())?
        }
    };

    let discounted = descriptor.discount().apply(original, config.rounding)?;

    let savings_minor = 0.max(original.to_minor_units() - discounted.to_minor_units());
    let savings = Money::from_minor(savings_minor, descriptor.currency());

    Ok(PricingBreakdown {
        original_price: original,
        discounted_price: discounted,
        savings,
        savings_ratio: savings_ratio(savings_minor, original.to_minor_units()),
        stock_remaining: descriptor.stock().remaining(),
        availability: descriptor.availability(now),
    })
}

/// Sum of fixed lines at `(override ?? live price) * quantity`. Delisted
/// lines carry no price and are skipped; availability reports them as a
/// broken composition separately.
fn fixed_original<'a>(
    lines: &[FixedLine<'a>],
    currency: &'static Currency,
) -> Result<Money<'a, Currency>, PricingError> {
    lines
        .iter()
        .try_fold(Money::from_minor(0, currency), |total, line| {
            let Some(unit) = line.unit_price() else {
                return Ok(total);
            };

            let line_minor = unit
                .to_minor_units()
                .checked_mul(i64::from(line.quantity()))
                .ok_or(PricingError::AmountOverflow)?;

            total
                .add(Money::from_minor(line_minor, currency))
                .map_err(PricingError::from)
        })
}

/// Sum of the validated selections at `(override ?? live price)`, one unit
/// per selected candidate.
fn selected_original<'a>(
    slots: &[Slot<'a>],
    validated: &ValidatedSelections,
    currency: &'static Currency,
) -> Result<Money<'a, Currency>, PricingError> {
    let mut total = Money::from_minor(0, currency);

    for slot in slots {
        for product in validated.products_for(slot.key()) {
            let Some(unit) = slot.candidate(*product).and_then(SlotCandidate::unit_price) else {
                continue;
            };

            total = total.add(unit)?;
        }
    }

    Ok(total)
}

/// Savings over original as a clamped fraction; zero when the original price
/// is zero so empty selections never divide by zero.
fn savings_ratio(savings_minor: i64, original_minor: i64) -> Percentage {
    if savings_minor <= 0 || original_minor <= 0 {
        return Percentage::from(0.0);
    }

    let (Some(savings), Some(original)) = (
        Decimal::from_i64(savings_minor),
        Decimal::from_i64(original_minor),
    ) else {
        return Percentage::from(0.0);
    };

    savings
        .checked_div(original)
        .map_or(Percentage::from(0.0), |ratio| {
            Percentage::from(ratio.clamp(Decimal::ZERO, Decimal::ONE))
        })
}
