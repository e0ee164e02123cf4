//! Bundle discount rules
//!
//! A bundle carries exactly one discount rule, applied to the summed price of
//! its parts. Out-of-range configuration (negative fixed price, percentage
//! outside [0, 100]) is clamped rather than rejected: a storefront pricing
//! call must not fail on a back-office data-entry mistake.

use decimal_percentage::Percentage;
use rust_decimal::{
    Decimal, RoundingStrategy,
    prelude::{FromPrimitive, ToPrimitive},
};
use rusty_money::{Money, MoneyError, iso::Currency};
use thiserror::Error;

/// Errors specific to discount arithmetic.
#[derive(Debug, Error)]
pub enum DiscountError {
    /// Percentage calculation could not be safely converted.
    #[error("percentage conversion overflowed or was not finite")]
    PercentConversion,

    /// The fixed bundle price is denominated in a different currency than the
    /// bundle's parts.
    #[error("currency mismatch: bundle prices in {expected}, discount in {found}")]
    CurrencyMismatch {
        /// Currency of the summed parts.
        expected: &'static str,
        /// Currency of the configured discount amount.
        found: &'static str,
    },

    /// Wrapped money arithmetic error.
    #[error(transparent)]
    Money(#[from] MoneyError),
}

/// Discount rule attached to a bundle.
#[derive(Debug, Copy, Clone)]
pub enum BundleDiscount<'a> {
    /// Sell the whole bundle for a fixed total (e.g. "both for Rs. 4,999").
    FixedPrice(Money<'a, Currency>),

    /// Take a fraction off the summed price (e.g. "10% off").
    PercentageOff(Percentage),
}

impl<'a> BundleDiscount<'a> {
    /// Apply this rule to a bundle's original (sum-of-parts) price.
    ///
    /// A fixed price is clamped to `[0, original]` so a bundle never appears
    /// to cost more than its parts; a percentage is clamped to `[0, 100]`.
    ///
    /// # Errors
    ///
    /// Returns a [`DiscountError`] if:
    /// - Percentage calculation overflows or cannot be safely represented.
    /// - A fixed price is configured in a different currency than `original`.
    pub fn apply(
        &self,
        original: Money<'a, Currency>,
        rounding: RoundingStrategy,
    ) -> Result<Money<'a, Currency>, DiscountError> {
        let original_minor = original.to_minor_units();

        let discounted_minor = match self {
            Self::FixedPrice(amount) => {
                if amount.currency() != original.currency() {
                    return Err(DiscountError::CurrencyMismatch {
                        expected: original.currency().iso_alpha_code,
                        found: amount.currency().iso_alpha_code,
                    });
                }

                amount.to_minor_units().clamp(0, original_minor.max(0))
            }
            Self::PercentageOff(percent) => original_minor
                .checked_sub(fraction_of_minor(*percent, original_minor, rounding)?)
                .ok_or(DiscountError::PercentConversion)?,
        };

        Ok(Money::from_minor(
            0.max(discounted_minor),
            original.currency(),
        ))
    }
}

/// Clamp a configured percentage to the [0, 1] fraction range.
#[must_use]
pub fn clamped_fraction(percent: Percentage) -> Decimal {
    // The decimal_percentage crate doesn't expose the underlying Decimal, but
    // multiplying by one yields it.
    (percent * Decimal::ONE).clamp(Decimal::ZERO, Decimal::ONE)
}

/// Calculate the discount amount in minor units for a clamped percentage of a
/// minor unit amount, rounded with the given strategy.
///
/// # Errors
///
/// Returns [`DiscountError::PercentConversion`] if the calculation overflows
/// or cannot be safely represented.
pub fn fraction_of_minor(
    percent: Percentage,
    minor: i64,
    rounding: RoundingStrategy,
) -> Result<i64, DiscountError> {
    let minor = Decimal::from_i64(minor).ok_or(DiscountError::PercentConversion)?;

    clamped_fraction(percent)
        .checked_mul(minor)
        .ok_or(DiscountError::PercentConversion)?
        .round_dp_with_strategy(0, rounding)
        .to_i64()
        .ok_or(DiscountError::PercentConversion)
}
