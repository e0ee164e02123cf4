//! Bundle resolution
//!
//! Loads a bundle record from the store, snapshots every referenced product
//! from the catalog, and assembles the engine's descriptor. Resolution is
//! read-only and per request: two resolutions may legitimately see different
//! prices or stock, and the checkout flow depends on that freshness.

use decimal_percentage::Percentage;
use jiff::Timestamp;
use rust_decimal::Decimal;
use rustc_hash::FxHashMap;
use rusty_money::{Money, iso::Currency};
use slotmap::SecondaryMap;
use tracing::{Span, debug};

use hamper::{
    bundles::{
        BundleConfig, BundleDescriptor,
        availability::{Availability, SaleWindow, StockCounter},
        builder::DescriptorBuilder,
        composition::{Composition, FixedLine, Slot, SlotCandidate, SlotKey},
    },
    discounts::BundleDiscount,
    pricing::{PricingBreakdown, PricingConfig, PricingError, price_bundle},
    products::{ProductKey, ProductListing},
    selections::{
        SelectionErrors, SelectionViolation, SlotSelection, ValidatedSelections,
        validate_selections,
    },
};

use crate::{
    bundles::{
        errors::{QuoteError, ResolveError},
        records::{BundleRecord, BundleUuid, CompositionRecord, DiscountRecord, SlotUuid},
        requests::SlotSelectionRequest,
        store::{BundleRef, BundleStore},
    },
    catalog::{CatalogError, ProductCatalog, ProductUuid},
};

/// Storefront configuration snapshot, injected at construction rather than
/// read from ambient state, so resolution stays a function of its inputs.
#[derive(Debug, Clone, Copy)]
pub struct StorefrontConfig {
    /// Currency every price is quoted in.
    pub currency: &'static Currency,

    /// Pricing knobs forwarded to the engine.
    pub pricing: PricingConfig,
}

impl StorefrontConfig {
    /// Configuration with default pricing behavior.
    #[must_use]
    pub fn new(currency: &'static Currency) -> Self {
        Self {
            currency,
            pricing: PricingConfig::default(),
        }
    }
}

/// Resolves bundle references into live, priceable descriptors.
#[derive(Debug, Clone)]
pub struct BundleResolver<S, C> {
    store: S,
    catalog: C,
    config: StorefrontConfig,
}

impl<S: BundleStore, C: ProductCatalog> BundleResolver<S, C> {
    /// Creates a resolver over the two collaborators.
    #[must_use]
    pub fn new(store: S, catalog: C, config: StorefrontConfig) -> Self {
        Self {
            store,
            catalog,
            config,
        }
    }

    /// Resolve a bundle and snapshot its product listings as of `now`.
    ///
    /// Unavailability (inactive, outside window, sold out, broken
    /// composition) is data on the result, not an error; only a missing
    /// bundle or a failing collaborator fails the call.
    ///
    /// # Errors
    ///
    /// Returns a [`ResolveError`] when no live bundle matches the reference,
    /// a collaborator fails, or the stored record is structurally invalid.
    #[tracing::instrument(
        level = "info",
        name = "resolve_bundle",
        skip_all,
        fields(
            reference = %reference,
            slug = tracing::field::Empty,
            availability = tracing::field::Empty
        )
    )]
    pub async fn resolve(
        &self,
        reference: &BundleRef,
        now: Timestamp,
    ) -> Result<ResolvedBundle, ResolveError> {
        let record = self.store.get_bundle(reference).await?;
        let listings = self.snapshot_listings(&record).await?;

        let resolved = assemble(&record, &listings, self.config, now)?;

        let span = Span::current();
        span.record("slug", tracing::field::display(resolved.descriptor().slug()));
        span.record(
            "availability",
            tracing::field::display(resolved.availability()),
        );

        Ok(resolved)
    }

    /// One catalog lookup per distinct referenced product. Products the
    /// catalog no longer knows resolve as delisted rather than failing the
    /// whole bundle.
    async fn snapshot_listings(
        &self,
        record: &BundleRecord,
    ) -> Result<FxHashMap<ProductUuid, ProductListing<'static>>, ResolveError> {
        let mut listings = FxHashMap::default();

        for product in referenced_products(&record.composition) {
            if listings.contains_key(&product) {
                continue;
            }

            match self.catalog.get_product(product).await {
                Ok(snapshot) => {
                    let minor = i64::try_from(snapshot.price)?;

                    listings.insert(
                        product,
                        ProductListing::new(
                            Money::from_minor(minor, self.config.currency),
                            snapshot.in_stock,
                        ),
                    );
                }
                Err(CatalogError::NotFound) => {
                    debug!(%product, "product missing from catalog; resolves as delisted");
                }
                Err(error) => return Err(ResolveError::Catalog(error)),
            }
        }

        Ok(listings)
    }
}

fn referenced_products(composition: &CompositionRecord) -> Vec<ProductUuid> {
    match composition {
        CompositionRecord::Fixed(items) => items.iter().map(|item| item.product_uuid).collect(),
        CompositionRecord::Configurable(slots) => slots
            .iter()
            .flat_map(|slot| slot.products.iter().map(|candidate| candidate.product_uuid))
            .collect(),
    }
}

/// Identity bookkeeping minted while assembling a descriptor.
#[derive(Debug, Default)]
struct KeyMaps {
    product_keys: FxHashMap<ProductUuid, ProductKey>,
    product_uuids: SecondaryMap<ProductKey, ProductUuid>,
    slot_keys: FxHashMap<SlotUuid, SlotKey>,
    slot_uuids: SecondaryMap<SlotKey, SlotUuid>,
}

impl KeyMaps {
    /// One key per distinct product, shared across slots so the builder's
    /// duplicate checks see repeated references.
    fn product(&mut self, builder: &mut DescriptorBuilder<'static>, uuid: ProductUuid) -> ProductKey {
        let key = *self
            .product_keys
            .entry(uuid)
            .or_insert_with(|| builder.product());

        self.product_uuids.insert(key, uuid);

        key
    }

    fn slot(&mut self, builder: &mut DescriptorBuilder<'static>, uuid: SlotUuid) -> SlotKey {
        let key = builder.slot();

        self.slot_keys.insert(uuid, key);
        self.slot_uuids.insert(key, uuid);

        key
    }
}

fn assemble(
    record: &BundleRecord,
    listings: &FxHashMap<ProductUuid, ProductListing<'static>>,
    config: StorefrontConfig,
    now: Timestamp,
) -> Result<ResolvedBundle, ResolveError> {
    let mut builder = DescriptorBuilder::new(BundleConfig {
        slug: record.slug.clone(),
        currency: config.currency,
        discount: discount_of(record.discount, config.currency)?,
        is_active: record.is_active,
        window: SaleWindow::new(record.starts_at, record.ends_at),
        stock: StockCounter::new(record.stock_limit, record.stock_sold),
        allow_coupon_stacking: record.allow_coupon_stacking,
        display: record.display,
    });

    let mut keys = KeyMaps::default();

    match &record.composition {
        CompositionRecord::Fixed(items) => {
            for item in items {
                let product = keys.product(&mut builder, item.product_uuid);

                builder.push_line(FixedLine::new(
                    product,
                    item.quantity,
                    minor_money(item.price_override, config.currency)?,
                    listings.get(&item.product_uuid).copied(),
                ));
            }
        }
        CompositionRecord::Configurable(slots) => {
            for slot_record in slots {
                let slot = keys.slot(&mut builder, slot_record.uuid);
                let mut candidates = Vec::with_capacity(slot_record.products.len());

                for candidate in &slot_record.products {
                    let product = keys.product(&mut builder, candidate.product_uuid);

                    candidates.push(SlotCandidate::new(
                        product,
                        minor_money(candidate.price_override, config.currency)?,
                        listings.get(&candidate.product_uuid).copied(),
                    ));
                }

                builder.push_slot(Slot::new(
                    slot,
                    slot_record.name.clone(),
                    slot_record.is_required,
                    slot_record.min_selections,
                    slot_record.max_selections,
                    candidates,
                ));
            }
        }
    }

    Ok(ResolvedBundle {
        descriptor: builder.finish()?,
        bundle_uuid: record.uuid,
        product_keys: keys.product_keys,
        product_uuids: keys.product_uuids,
        slot_keys: keys.slot_keys,
        slot_uuids: keys.slot_uuids,
        pricing: config.pricing,
        resolved_at: now,
    })
}

fn discount_of(
    record: DiscountRecord,
    currency: &'static Currency,
) -> Result<BundleDiscount<'static>, ResolveError> {
    match record {
        DiscountRecord::FixedPrice { amount } => Ok(BundleDiscount::FixedPrice(Money::from_minor(
            i64::try_from(amount)?,
            currency,
        ))),
        DiscountRecord::PercentageOff { basis_points } => {
            if basis_points > 10_000 {
                debug!(basis_points, "discount above 100%; clamped at pricing time");
            }

            Ok(BundleDiscount::PercentageOff(Percentage::from(
                Decimal::new(i64::from(basis_points), 4),
            )))
        }
    }
}

fn minor_money(
    amount: Option<u64>,
    currency: &'static Currency,
) -> Result<Option<Money<'static, Currency>>, ResolveError> {
    amount
        .map(|value| Ok(Money::from_minor(i64::try_from(value)?, currency)))
        .transpose()
}

/// A bundle resolved at one instant: the engine descriptor plus the identity
/// maps needed to translate storefront requests into descriptor keys.
#[derive(Debug)]
pub struct ResolvedBundle {
    descriptor: BundleDescriptor<'static>,
    bundle_uuid: BundleUuid,
    product_keys: FxHashMap<ProductUuid, ProductKey>,
    product_uuids: SecondaryMap<ProductKey, ProductUuid>,
    slot_keys: FxHashMap<SlotUuid, SlotKey>,
    slot_uuids: SecondaryMap<SlotKey, SlotUuid>,
    pricing: PricingConfig,
    resolved_at: Timestamp,
}

impl ResolvedBundle {
    /// The assembled descriptor.
    #[must_use]
    pub fn descriptor(&self) -> &BundleDescriptor<'static> {
        &self.descriptor
    }

    /// Identity of the resolved bundle.
    #[must_use]
    pub fn bundle_uuid(&self) -> BundleUuid {
        self.bundle_uuid
    }

    /// The instant the listings were snapshotted.
    #[must_use]
    pub fn resolved_at(&self) -> Timestamp {
        self.resolved_at
    }

    /// Availability at the resolution instant.
    #[must_use]
    pub fn availability(&self) -> Availability {
        self.descriptor.availability(self.resolved_at)
    }

    /// Descriptor key for a catalog product, if the bundle references it.
    #[must_use]
    pub fn product_key(&self, product: ProductUuid) -> Option<ProductKey> {
        self.product_keys.get(&product).copied()
    }

    /// Catalog identity behind a descriptor key.
    #[must_use]
    pub fn product_uuid(&self, key: ProductKey) -> Option<ProductUuid> {
        self.product_uuids.get(key).copied()
    }

    /// Descriptor key for a stored slot.
    #[must_use]
    pub fn slot_key(&self, slot: SlotUuid) -> Option<SlotKey> {
        self.slot_keys.get(&slot).copied()
    }

    /// Stored identity behind a slot key.
    #[must_use]
    pub fn slot_uuid(&self, key: SlotKey) -> Option<SlotUuid> {
        self.slot_uuids.get(key).copied()
    }

    /// Validate a storefront selection request against this bundle.
    ///
    /// # Errors
    ///
    /// Returns [`SelectionErrors`] carrying every violation. Stale slot or
    /// product identities (an admin edited the bundle since the form was
    /// rendered) surface as unknown-slot or unknown-product violations.
    pub fn validate(
        &self,
        requests: &[SlotSelectionRequest],
    ) -> Result<ValidatedSelections, SelectionErrors> {
        let selections: Vec<SlotSelection> = requests
            .iter()
            .map(|request| self.translate(request))
            .collect();

        validate_selections(&self.descriptor, &selections)
    }

    /// Price this bundle with the config captured at resolution.
    ///
    /// # Errors
    ///
    /// Returns a [`PricingError`] as [`price_bundle`] does.
    pub fn price(
        &self,
        selections: Option<&ValidatedSelections>,
    ) -> Result<PricingBreakdown<'static>, PricingError> {
        price_bundle(&self.descriptor, selections, &self.pricing, self.resolved_at)
    }

    /// The storefront convenience: validate whatever was posted, price it,
    /// and report whether the bundle can actually be added to a cart.
    ///
    /// # Errors
    ///
    /// Returns a [`QuoteError`] when the selections do not fit the bundle or
    /// the pricing computation fails.
    #[tracing::instrument(level = "debug", skip_all, fields(slug = %self.descriptor.slug()))]
    pub fn quote(&self, requests: &[SlotSelectionRequest]) -> Result<Quote, QuoteError> {
        let breakdown = match self.descriptor.composition() {
            Composition::Fixed(_) if requests.is_empty() => self.price(None)?,
            Composition::Fixed(_) => {
                return Err(QuoteError::Selection(SelectionErrors {
                    violations: vec![SelectionViolation::NotConfigurable],
                }));
            }
            Composition::Configurable(_) => {
                let validated = self.validate(requests)?;

                self.price(Some(&validated))?
            }
        };

        Ok(Quote {
            sellable: breakdown.availability.is_available(),
            breakdown,
        })
    }

    /// Stale identities become null keys, which the engine's validator then
    /// reports as unknown slots or products.
    fn translate(&self, request: &SlotSelectionRequest) -> SlotSelection {
        let slot = self.slot_keys.get(&request.slot).copied().unwrap_or_default();

        let products = request
            .products
            .iter()
            .map(|product| self.product_keys.get(product).copied().unwrap_or_default());

        SlotSelection::new(slot, products)
    }
}

/// A priced storefront answer for one bundle request.
#[derive(Debug, Clone, PartialEq)]
pub struct Quote {
    /// The full price breakdown, including availability.
    pub breakdown: PricingBreakdown<'static>,

    /// True only when the bundle is available right now; unavailable bundles
    /// may still be displayed but must not be added to a cart.
    pub sellable: bool,
}
