//! Fixtures
//!
//! YAML-driven bundle scenarios used by the conformance tests: a products
//! file describing the catalog snapshot and a bundle file describing one
//! bundle's configuration and composition. The fixture assembles a real
//! descriptor through the builder and keeps string-keyed lookups so tests
//! can reference products and slots by fixture key.

use std::{fs, path::PathBuf};

use rustc_hash::FxHashMap;
use rusty_money::{Money, iso::Currency};
use thiserror::Error;

use crate::{
    bundles::{
        BundleConfig, BundleDescriptor, DisplayFlags,
        availability::{SaleWindow, StockCounter},
        builder::{DescriptorBuilder, DescriptorError},
        composition::{FixedLine, Slot, SlotCandidate, SlotKey},
    },
    fixtures::{
        bundles::{BundleFixture, BundleFixtureFile, parse_discount},
        products::{ProductsFixture, parse_price},
    },
    products::{ProductKey, ProductListing},
    selections::SlotSelection,
};

pub mod bundles;
pub mod products;

/// Fixture Parsing Errors
#[derive(Debug, Error)]
pub enum FixtureError {
    /// IO error reading fixture files
    #[error("Failed to read fixture file: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parsing error
    #[error("Failed to parse YAML: {0}")]
    Yaml(#[from] serde_norway::Error),

    /// Invalid price format
    #[error("Invalid price format: {0}")]
    InvalidPrice(String),

    /// Invalid percentage format
    #[error("Invalid percentage format: {0}")]
    InvalidPercentage(String),

    /// Invalid timestamp format
    #[error("Invalid timestamp: {0}")]
    InvalidTimestamp(String),

    /// Unknown currency code
    #[error("Unknown currency code: {0}")]
    UnknownCurrency(String),

    /// Product not found
    #[error("Product not found: {0}")]
    ProductNotFound(String),

    /// Slot not found
    #[error("Slot not found: {0}")]
    SlotNotFound(String),

    /// No products loaded yet
    #[error("No products loaded; currency unknown")]
    NoCurrency,

    /// Currency mismatch between fixture amounts
    #[error("Currency mismatch: expected {0}, found {1}")]
    CurrencyMismatch(String, String),

    /// Descriptor assembly error
    #[error(transparent)]
    Descriptor(#[from] DescriptorError),
}

/// Catalog state parsed for one fixture product.
#[derive(Debug, Clone, Copy)]
struct ParsedProduct {
    minor: i64,
    in_stock: bool,
    listed: bool,
}

/// Fixture
#[derive(Debug)]
pub struct Fixture {
    /// String key -> descriptor key mappings for lookups
    product_keys: FxHashMap<String, ProductKey>,
    slot_keys: FxHashMap<String, SlotKey>,

    /// The assembled descriptor
    descriptor: BundleDescriptor<'static>,

    /// Currency shared by every amount in the set
    currency: &'static Currency,
}

impl Fixture {
    /// Load a named fixture set from `./fixtures`.
    ///
    /// # Errors
    ///
    /// Returns a [`FixtureError`] if the files cannot be read or parsed, or
    /// if the composition they describe is structurally invalid.
    pub fn from_set(set: &str) -> Result<Self, FixtureError> {
        Self::with_base_path("./fixtures", set)
    }

    /// Load a fixture set from a custom base path.
    ///
    /// # Errors
    ///
    /// Returns a [`FixtureError`] as for [`Fixture::from_set`].
    pub fn with_base_path(base: impl Into<PathBuf>, set: &str) -> Result<Self, FixtureError> {
        let base_path = base.into().join(set);

        let products_yaml = fs::read_to_string(base_path.join("products.yml"))?;
        let bundle_yaml = fs::read_to_string(base_path.join("bundle.yml"))?;

        Self::from_yaml(&products_yaml, &bundle_yaml)
    }

    /// Build a fixture from in-memory YAML documents.
    ///
    /// # Errors
    ///
    /// Returns a [`FixtureError`] if either document fails to parse or the
    /// composition is structurally invalid.
    pub fn from_yaml(products_yaml: &str, bundle_yaml: &str) -> Result<Self, FixtureError> {
        let products: ProductsFixture = serde_norway::from_str(products_yaml)?;
        let file: BundleFixtureFile = serde_norway::from_str(bundle_yaml)?;

        let (catalog, currency) = parse_catalog(&products)?;

        Self::assemble(&file.bundle, &catalog, currency)
    }

    fn assemble(
        bundle: &BundleFixture,
        catalog: &FxHashMap<String, ParsedProduct>,
        currency: &'static Currency,
    ) -> Result<Self, FixtureError> {
        let config = BundleConfig {
            slug: bundle.slug.clone(),
            currency,
            discount: parse_discount(&bundle.discount)?,
            is_active: bundle.active,
            window: SaleWindow::new(
                parse_timestamp(bundle.starts_at.as_deref())?,
                parse_timestamp(bundle.ends_at.as_deref())?,
            ),
            stock: StockCounter::new(bundle.stock_limit, bundle.stock_sold),
            allow_coupon_stacking: bundle.coupon_stacking,
            display: DisplayFlags {
                show_savings: bundle.display.savings,
                show_countdown: bundle.display.countdown,
            },
        };

        let mut builder = DescriptorBuilder::new(config);
        let mut product_keys: FxHashMap<String, ProductKey> = FxHashMap::default();
        let mut slot_keys: FxHashMap<String, SlotKey> = FxHashMap::default();

        for item in &bundle.items {
            let product = *product_keys
                .entry(item.product.clone())
                .or_insert_with(|| builder.product());

            let parsed = lookup(catalog, &item.product)?;

            builder.push_line(FixedLine::new(
                product,
                item.quantity,
                parse_override(item.price_override.as_deref(), currency)?,
                listing_of(parsed, currency),
            ));
        }

        for slot_fixture in &bundle.slots {
            let slot = builder.slot();
            slot_keys.insert(slot_fixture.name.clone(), slot);

            let mut candidates = Vec::with_capacity(slot_fixture.candidates.len());

            for candidate in &slot_fixture.candidates {
                let product = *product_keys
                    .entry(candidate.product.clone())
                    .or_insert_with(|| builder.product());

                let parsed = lookup(catalog, &candidate.product)?;

                candidates.push(SlotCandidate::new(
                    product,
                    parse_override(candidate.price_override.as_deref(), currency)?,
                    listing_of(parsed, currency),
                ));
            }

            builder.push_slot(Slot::new(
                slot,
                slot_fixture.name.clone(),
                slot_fixture.required,
                slot_fixture.min,
                slot_fixture.max,
                candidates,
            ));
        }

        Ok(Self {
            product_keys,
            slot_keys,
            descriptor: builder.finish()?,
            currency,
        })
    }

    /// The assembled descriptor.
    #[must_use]
    pub fn descriptor(&self) -> &BundleDescriptor<'static> {
        &self.descriptor
    }

    /// Currency of the fixture set.
    #[must_use]
    pub fn currency(&self) -> &'static Currency {
        self.currency
    }

    /// Money in the fixture currency, from minor units.
    #[must_use]
    pub fn money(&self, minor: i64) -> Money<'static, Currency> {
        Money::from_minor(minor, self.currency)
    }

    /// Descriptor key for a fixture product.
    ///
    /// # Errors
    ///
    /// Returns [`FixtureError::ProductNotFound`] for keys the bundle never
    /// references.
    pub fn product_key(&self, key: &str) -> Result<ProductKey, FixtureError> {
        self.product_keys
            .get(key)
            .copied()
            .ok_or_else(|| FixtureError::ProductNotFound(key.to_owned()))
    }

    /// Descriptor key for a fixture slot.
    ///
    /// # Errors
    ///
    /// Returns [`FixtureError::SlotNotFound`] for unknown slot names.
    pub fn slot_key(&self, name: &str) -> Result<SlotKey, FixtureError> {
        self.slot_keys
            .get(name)
            .copied()
            .ok_or_else(|| FixtureError::SlotNotFound(name.to_owned()))
    }

    /// Build a selection for a slot from fixture keys.
    ///
    /// # Errors
    ///
    /// Returns a [`FixtureError`] when the slot or any product is unknown.
    pub fn selection(&self, slot: &str, products: &[&str]) -> Result<SlotSelection, FixtureError> {
        let slot = self.slot_key(slot)?;

        let products = products
            .iter()
            .map(|product| self.product_key(product))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(SlotSelection::new(slot, products))
    }
}

fn parse_catalog(
    products: &ProductsFixture,
) -> Result<(FxHashMap<String, ParsedProduct>, &'static Currency), FixtureError> {
    let mut catalog = FxHashMap::default();
    let mut currency: Option<&'static Currency> = None;

    for (key, product) in &products.products {
        let (minor, product_currency) = parse_price(&product.price)?;

        match currency {
            None => currency = Some(product_currency),
            Some(expected) if expected != product_currency => {
                return Err(FixtureError::CurrencyMismatch(
                    expected.iso_alpha_code.to_owned(),
                    product_currency.iso_alpha_code.to_owned(),
                ));
            }
            Some(_) => {}
        }

        catalog.insert(
            key.clone(),
            ParsedProduct {
                minor,
                in_stock: product.in_stock,
                listed: product.listed,
            },
        );
    }

    Ok((catalog, currency.ok_or(FixtureError::NoCurrency)?))
}

fn lookup<'c>(
    catalog: &'c FxHashMap<String, ParsedProduct>,
    key: &str,
) -> Result<&'c ParsedProduct, FixtureError> {
    catalog
        .get(key)
        .ok_or_else(|| FixtureError::ProductNotFound(key.to_owned()))
}

fn listing_of(parsed: &ParsedProduct, currency: &'static Currency) -> Option<ProductListing<'static>> {
    parsed
        .listed
        .then(|| ProductListing::new(Money::from_minor(parsed.minor, currency), parsed.in_stock))
}

fn parse_override(
    value: Option<&str>,
    currency: &'static Currency,
) -> Result<Option<Money<'static, Currency>>, FixtureError> {
    let Some(value) = value else {
        return Ok(None);
    };

    let (minor, found) = parse_price(value)?;

    if found != currency {
        return Err(FixtureError::CurrencyMismatch(
            currency.iso_alpha_code.to_owned(),
            found.iso_alpha_code.to_owned(),
        ));
    }

    Ok(Some(Money::from_minor(minor, currency)))
}

fn parse_timestamp(value: Option<&str>) -> Result<Option<jiff::Timestamp>, FixtureError> {
    let Some(value) = value else {
        return Ok(None);
    };

    value
        .parse()
        .map(Some)
        .map_err(|_err| FixtureError::InvalidTimestamp(value.to_owned()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const PRODUCTS_YAML: &str = "\
products:
  camera:
    name: Trail camera
    price: \"5000.00 PKR\"
  card:
    name: Memory card
    price: \"3000.00 PKR\"
";

    const BUNDLE_YAML: &str = "\
bundle:
  slug: starter-kit
  discount: \"10%\"
  items:
    - product: camera
    - product: card
      quantity: 2
      price_override: \"2500.00 PKR\"
";

    #[test]
    fn fixture_assembles_a_fixed_descriptor() -> Result<(), FixtureError> {
        let fixture = Fixture::from_yaml(PRODUCTS_YAML, BUNDLE_YAML)?;

        let descriptor = fixture.descriptor();

        assert_eq!(descriptor.slug(), "starter-kit");
        assert!(descriptor.composition().is_fixed());
        assert_eq!(
            descriptor.composition().lines().map(<[FixedLine<'_>]>::len),
            Some(2)
        );

        Ok(())
    }

    #[test]
    fn fixture_keys_resolve_referenced_products() -> Result<(), FixtureError> {
        let fixture = Fixture::from_yaml(PRODUCTS_YAML, BUNDLE_YAML)?;

        assert!(fixture.product_key("camera").is_ok());
        assert!(matches!(
            fixture.product_key("tripod"),
            Err(FixtureError::ProductNotFound(key)) if key == "tripod"
        ));

        Ok(())
    }

    #[test]
    fn unreferenced_catalog_products_are_ignored() -> Result<(), FixtureError> {
        let products = "\
products:
  camera:
    name: Trail camera
    price: \"5000.00 PKR\"
  tripod:
    name: Tripod
    price: \"1500.00 PKR\"
";
        let bundle = "\
bundle:
  slug: solo
  discount: \"5%\"
  items:
    - product: camera
";

        let fixture = Fixture::from_yaml(products, bundle)?;

        assert!(fixture.product_key("tripod").is_err());

        Ok(())
    }

    #[test]
    fn mixed_currencies_are_rejected() {
        let products = "\
products:
  camera:
    name: Trail camera
    price: \"5000.00 PKR\"
  card:
    name: Memory card
    price: \"30.00 USD\"
";

        let result = Fixture::from_yaml(products, BUNDLE_YAML);

        assert!(matches!(result, Err(FixtureError::CurrencyMismatch(_, _))));
    }

    #[test]
    fn missing_bundle_product_is_reported() {
        let bundle = "\
bundle:
  slug: broken
  discount: \"10%\"
  items:
    - product: lens
";

        let result = Fixture::from_yaml(PRODUCTS_YAML, bundle);

        assert!(matches!(
            result,
            Err(FixtureError::ProductNotFound(key)) if key == "lens"
        ));
    }
}
