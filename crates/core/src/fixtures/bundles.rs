//! Bundle Fixtures

use rusty_money::Money;
use serde::Deserialize;

use crate::{
    discounts::BundleDiscount,
    fixtures::{
        FixtureError,
        products::{parse_percentage, parse_price},
    },
};

/// Wrapper for the bundle in YAML
#[derive(Debug, Deserialize)]
pub struct BundleFixtureFile {
    /// The bundle under test
    pub bundle: BundleFixture,
}

/// Bundle Fixture
#[derive(Debug, Deserialize)]
pub struct BundleFixture {
    /// Storefront slug
    pub slug: String,

    /// Discount rule: "10%" or a fixed total like "9000.00 PKR"
    pub discount: String,

    /// Administrator on/off switch
    #[serde(default = "default_true")]
    pub active: bool,

    /// Sale window opening (RFC 3339)
    #[serde(default)]
    pub starts_at: Option<String>,

    /// Sale window close (RFC 3339)
    #[serde(default)]
    pub ends_at: Option<String>,

    /// Sales cap
    #[serde(default)]
    pub stock_limit: Option<u32>,

    /// Units sold so far
    #[serde(default)]
    pub stock_sold: u32,

    /// Whether coupon codes stack on top of the bundle discount
    #[serde(default)]
    pub coupon_stacking: bool,

    /// Presentation gates
    #[serde(default)]
    pub display: DisplayFixture,

    /// Fixed bundle lines
    #[serde(default)]
    pub items: Vec<ItemFixture>,

    /// Configurable bundle slots
    #[serde(default)]
    pub slots: Vec<SlotFixture>,
}

/// Presentation gates in YAML
#[derive(Debug, Default, Deserialize)]
pub struct DisplayFixture {
    /// Show the savings amount
    #[serde(default)]
    pub savings: bool,

    /// Show the sale countdown
    #[serde(default)]
    pub countdown: bool,
}

/// One fixed bundle line in YAML
#[derive(Debug, Deserialize)]
pub struct ItemFixture {
    /// Product fixture key
    pub product: String,

    /// Units in the bundle
    #[serde(default = "default_quantity")]
    pub quantity: u32,

    /// Per-line price override (e.g., "2500.00 PKR")
    #[serde(default)]
    pub price_override: Option<String>,
}

/// One selection slot in YAML
#[derive(Debug, Deserialize)]
pub struct SlotFixture {
    /// Slot display name
    pub name: String,

    /// Whether the slot must be filled
    #[serde(default)]
    pub required: bool,

    /// Minimum distinct selections when filled
    #[serde(default)]
    pub min: u32,

    /// Maximum distinct selections
    pub max: u32,

    /// Candidate products
    #[serde(default)]
    pub candidates: Vec<CandidateFixture>,
}

/// One slot candidate in YAML
#[derive(Debug, Deserialize)]
pub struct CandidateFixture {
    /// Product fixture key
    pub product: String,

    /// Per-candidate price override
    #[serde(default)]
    pub price_override: Option<String>,
}

fn default_true() -> bool {
    true
}

fn default_quantity() -> u32 {
    1
}

/// Parse a discount string: a trailing `%` or a bare decimal reads as a
/// percentage, an "AMOUNT CURRENCY" pair as a fixed bundle price.
///
/// # Errors
///
/// Returns an error if the string parses as neither.
pub fn parse_discount(s: &str) -> Result<BundleDiscount<'static>, FixtureError> {
    let trimmed = s.trim();

    if trimmed.ends_with('%') {
        return Ok(BundleDiscount::PercentageOff(parse_percentage(trimmed)?));
    }

    if trimmed.split_whitespace().count() == 2 {
        let (minor, currency) = parse_price(trimmed)?;

        return Ok(BundleDiscount::FixedPrice(Money::from_minor(
            minor, currency,
        )));
    }

    Ok(BundleDiscount::PercentageOff(parse_percentage(trimmed)?))
}

#[cfg(test)]
mod tests {
    use decimal_percentage::Percentage;
    use rusty_money::iso::PKR;

    use super::*;

    #[test]
    fn parse_discount_reads_percentages() -> Result<(), FixtureError> {
        assert!(matches!(
            parse_discount("10%")?,
            BundleDiscount::PercentageOff(percent) if percent == Percentage::from(0.10)
        ));
        assert!(matches!(
            parse_discount("0.10")?,
            BundleDiscount::PercentageOff(percent) if percent == Percentage::from(0.10)
        ));

        Ok(())
    }

    #[test]
    fn parse_discount_reads_fixed_prices() -> Result<(), FixtureError> {
        assert!(matches!(
            parse_discount("9000.00 PKR")?,
            BundleDiscount::FixedPrice(amount) if amount == Money::from_minor(900_000, PKR)
        ));

        Ok(())
    }

    #[test]
    fn parse_discount_rejects_garbage() {
        assert!(parse_discount("half off").is_err());
    }

    #[test]
    fn slot_fixture_defaults_are_optional_and_empty() -> Result<(), FixtureError> {
        let slot: SlotFixture =
            serde_norway::from_str("name: extras\nmax: 2\n")?;

        assert!(!slot.required);
        assert_eq!(slot.min, 0);
        assert_eq!(slot.max, 2);
        assert!(slot.candidates.is_empty());

        Ok(())
    }
}
