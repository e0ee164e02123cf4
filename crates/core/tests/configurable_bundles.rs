//! Integration tests for configurable bundle validation and pricing.

use decimal_percentage::Percentage;
use jiff::Timestamp;
use rusty_money::{Money, iso::PKR};
use testresult::TestResult;

use hamper::{
    bundles::{
        BundleConfig, BundleDescriptor, DisplayFlags,
        availability::{SaleWindow, StockCounter},
        builder::DescriptorBuilder,
        composition::{Slot, SlotCandidate, SlotKey},
    },
    discounts::BundleDiscount,
    pricing::{PricingConfig, PricingError, price_bundle},
    products::{ProductKey, ProductListing},
    selections::{SelectionViolation, SlotSelection, validate_selections},
};

struct BuildYourOwn {
    descriptor: BundleDescriptor<'static>,
    camera_slot: SlotKey,
    accessory_slot: SlotKey,
    basic_camera: ProductKey,
    pro_camera: ProductKey,
    strap: ProductKey,
    cleaning_kit: ProductKey,
}

fn listing(minor: i64) -> ProductListing<'static> {
    ProductListing::new(Money::from_minor(minor, PKR), true)
}

fn now() -> Result<Timestamp, jiff::Error> {
    "2026-03-01T00:00:00Z".parse()
}

/// One required single-choice camera slot (1000.00 or 1500.00) and one
/// optional accessory slot taking up to two picks.
fn build_your_own() -> Result<BuildYourOwn, hamper::bundles::builder::DescriptorError> {
    let mut builder = DescriptorBuilder::new(BundleConfig {
        slug: "build-your-own".to_owned(),
        currency: PKR,
        discount: BundleDiscount::PercentageOff(Percentage::from(0.0)),
        is_active: true,
        window: SaleWindow::always(),
        stock: StockCounter::unlimited(),
        allow_coupon_stacking: false,
        display: DisplayFlags::default(),
    });

    let basic_camera = builder.product();
    let pro_camera = builder.product();
    let strap = builder.product();
    let cleaning_kit = builder.product();

    let camera_slot = builder.slot();
    let accessory_slot = builder.slot();

    builder.push_slot(Slot::new(
        camera_slot,
        "camera",
        true,
        1,
        1,
        vec![
            SlotCandidate::new(basic_camera, None, Some(listing(100_000))),
            SlotCandidate::new(pro_camera, None, Some(listing(150_000))),
        ],
    ));
    builder.push_slot(Slot::new(
        accessory_slot,
        "accessories",
        false,
        0,
        2,
        vec![
            SlotCandidate::new(strap, None, Some(listing(20_000))),
            SlotCandidate::new(cleaning_kit, None, Some(listing(35_000))),
        ],
    ));

    Ok(BuildYourOwn {
        descriptor: builder.finish()?,
        camera_slot,
        accessory_slot,
        basic_camera,
        pro_camera,
        strap,
        cleaning_kit,
    })
}

#[test]
fn valid_selection_prices_the_chosen_products() -> TestResult {
    let bundle = build_your_own()?;

    let validated = validate_selections(
        &bundle.descriptor,
        &[SlotSelection::new(bundle.camera_slot, [bundle.pro_camera])],
    )
    .map_err(|errors| format!("{errors:?}"))?;

    let breakdown = price_bundle(
        &bundle.descriptor,
        Some(&validated),
        &PricingConfig::default(),
        now()?,
    )?;

    assert_eq!(breakdown.original_price, Money::from_minor(150_000, PKR));
    assert_eq!(breakdown.discounted_price, Money::from_minor(150_000, PKR));
    assert_eq!(breakdown.savings, Money::from_minor(0, PKR));

    Ok(())
}

#[test]
fn selections_sum_across_slots_one_unit_each() -> TestResult {
    let bundle = build_your_own()?;

    let validated = validate_selections(
        &bundle.descriptor,
        &[
            SlotSelection::new(bundle.camera_slot, [bundle.basic_camera]),
            SlotSelection::new(bundle.accessory_slot, [bundle.strap, bundle.cleaning_kit]),
        ],
    )
    .map_err(|errors| format!("{errors:?}"))?;

    let breakdown = price_bundle(
        &bundle.descriptor,
        Some(&validated),
        &PricingConfig::default(),
        now()?,
    )?;

    // 1000.00 + 200.00 + 350.00
    assert_eq!(breakdown.original_price, Money::from_minor(155_000, PKR));

    Ok(())
}

#[test]
fn empty_required_slot_fails_validation() -> TestResult {
    let bundle = build_your_own()?;

    let errors = validate_selections(
        &bundle.descriptor,
        &[SlotSelection::new(bundle.accessory_slot, [bundle.strap])],
    )
    .err()
    .ok_or("expected validation to fail")?;

    assert!(errors.violations.iter().any(|violation| matches!(
        violation,
        SelectionViolation::MissingRequiredSlot { slot, .. } if *slot == bundle.camera_slot
    )));

    Ok(())
}

#[test]
fn too_many_picks_in_a_single_choice_slot_fails_validation() -> TestResult {
    let bundle = build_your_own()?;

    let errors = validate_selections(
        &bundle.descriptor,
        &[SlotSelection::new(
            bundle.camera_slot,
            [bundle.basic_camera, bundle.pro_camera],
        )],
    )
    .err()
    .ok_or("expected validation to fail")?;

    assert_eq!(
        errors.violations,
        vec![SelectionViolation::SelectionCountOutOfRange {
            slot: bundle.camera_slot,
            name: "camera".to_owned(),
            selected: 2,
            min: 1,
            max: 1,
        }]
    );

    Ok(())
}

#[test]
fn violations_from_different_slots_are_all_reported() -> TestResult {
    let bundle = build_your_own()?;

    // Camera slot over its maximum AND the accessory slot holding a product
    // from another slot: both must come back in one pass.
    let errors = validate_selections(
        &bundle.descriptor,
        &[
            SlotSelection::new(bundle.camera_slot, [bundle.basic_camera, bundle.pro_camera]),
            SlotSelection::new(bundle.accessory_slot, [bundle.basic_camera]),
        ],
    )
    .err()
    .ok_or("expected validation to fail")?;

    assert_eq!(errors.violations.len(), 2);
    assert!(errors.violations.iter().any(|violation| matches!(
        violation,
        SelectionViolation::SelectionCountOutOfRange { slot, .. } if *slot == bundle.camera_slot
    )));
    assert!(errors.violations.iter().any(|violation| matches!(
        violation,
        SelectionViolation::UnknownProductInSlot { slot, .. } if *slot == bundle.accessory_slot
    )));

    Ok(())
}

#[test]
fn out_of_stock_candidate_fails_validation_even_when_counts_fit() -> TestResult {
    let mut builder = DescriptorBuilder::new(BundleConfig {
        slug: "single-slot".to_owned(),
        currency: PKR,
        discount: BundleDiscount::PercentageOff(Percentage::from(0.0)),
        is_active: true,
        window: SaleWindow::always(),
        stock: StockCounter::unlimited(),
        allow_coupon_stacking: false,
        display: DisplayFlags::default(),
    });

    let in_stock = builder.product();
    let sold_out = builder.product();
    let slot = builder.slot();

    builder.push_slot(Slot::new(
        slot,
        "camera",
        true,
        1,
        2,
        vec![
            SlotCandidate::new(in_stock, None, Some(listing(100_000))),
            SlotCandidate::new(
                sold_out,
                None,
                Some(ProductListing::new(Money::from_minor(90_000, PKR), false)),
            ),
        ],
    ));
    let descriptor = builder.finish()?;

    let errors = validate_selections(
        &descriptor,
        &[SlotSelection::new(slot, [in_stock, sold_out])],
    )
    .err()
    .ok_or("expected validation to fail")?;

    assert_eq!(
        errors.violations,
        vec![SelectionViolation::OutOfStockProductSelected {
            slot,
            name: "camera".to_owned(),
            product: sold_out,
        }]
    );

    Ok(())
}

#[test]
fn all_optional_bundle_prices_to_zero_on_empty_selection() -> TestResult {
    let mut builder = DescriptorBuilder::new(BundleConfig {
        slug: "extras-only".to_owned(),
        currency: PKR,
        discount: BundleDiscount::PercentageOff(Percentage::from(0.10)),
        is_active: true,
        window: SaleWindow::always(),
        stock: StockCounter::unlimited(),
        allow_coupon_stacking: false,
        display: DisplayFlags::default(),
    });

    let strap = builder.product();
    let slot = builder.slot();

    builder.push_slot(Slot::new(
        slot,
        "extras",
        false,
        0,
        2,
        vec![SlotCandidate::new(strap, None, Some(listing(20_000)))],
    ));
    let descriptor = builder.finish()?;

    let validated =
        validate_selections(&descriptor, &[]).map_err(|errors| format!("{errors:?}"))?;

    assert!(validated.is_empty());

    let breakdown = price_bundle(
        &descriptor,
        Some(&validated),
        &PricingConfig::default(),
        now()?,
    )?;

    assert_eq!(breakdown.original_price, Money::from_minor(0, PKR));
    assert_eq!(breakdown.discounted_price, Money::from_minor(0, PKR));
    assert_eq!(breakdown.savings, Money::from_minor(0, PKR));
    assert_eq!(breakdown.savings_ratio, Percentage::from(0.0));

    Ok(())
}

#[test]
fn configurable_bundle_without_selections_cannot_be_priced() -> TestResult {
    let bundle = build_your_own()?;

    let result = price_bundle(&bundle.descriptor, None, &PricingConfig::default(), now()?);

    assert!(matches!(result, Err(PricingError::SelectionsRequired)));

    Ok(())
}

#[test]
fn candidate_price_overrides_supersede_catalog_prices() -> TestResult {
    let mut builder = DescriptorBuilder::new(BundleConfig {
        slug: "override".to_owned(),
        currency: PKR,
        discount: BundleDiscount::PercentageOff(Percentage::from(0.0)),
        is_active: true,
        window: SaleWindow::always(),
        stock: StockCounter::unlimited(),
        allow_coupon_stacking: false,
        display: DisplayFlags::default(),
    });

    let camera = builder.product();
    let slot = builder.slot();

    builder.push_slot(Slot::new(
        slot,
        "camera",
        true,
        1,
        1,
        vec![SlotCandidate::new(
            camera,
            Some(Money::from_minor(80_000, PKR)),
            Some(listing(100_000)),
        )],
    ));
    let descriptor = builder.finish()?;

    let validated = validate_selections(&descriptor, &[SlotSelection::new(slot, [camera])])
        .map_err(|errors| format!("{errors:?}"))?;

    let breakdown = price_bundle(
        &descriptor,
        Some(&validated),
        &PricingConfig::default(),
        now()?,
    )?;

    assert_eq!(breakdown.original_price, Money::from_minor(80_000, PKR));

    Ok(())
}
