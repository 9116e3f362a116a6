//! Unit tests for the running aggregate

use payment_statistics::Aggregate;
use rstest::*;
use services_common::Amount;

/// Test fixture for an aggregate pre-loaded with a few amounts
#[fixture]
fn loaded_aggregate() -> Aggregate {
    let mut agg = Aggregate::new();
    agg.add(Amount::from_units(10));
    agg.add(Amount::from_units(30));
    agg.add(Amount::from_units(20));
    agg
}

#[rstest]
fn test_add_updates_all_fields(loaded_aggregate: Aggregate) {
    let view = loaded_aggregate.read();
    assert_eq!(view.count, 3);
    assert_eq!(view.sum, 60.0);
    assert_eq!(view.avg, 20.0);
    assert_eq!(view.min, Some(10.0));
    assert_eq!(view.max, Some(30.0));
}

#[rstest]
fn test_remove_recomputes_average(mut loaded_aggregate: Aggregate) {
    loaded_aggregate.remove(Amount::from_units(30));

    let view = loaded_aggregate.read();
    assert_eq!(view.count, 2);
    assert_eq!(view.sum, 30.0);
    assert_eq!(view.avg, 15.0);
    // Extrema are intentionally untouched by remove; the engine reinstalls
    // them from the candidate index after each eviction batch.
    assert_eq!(view.min, Some(10.0));
}

#[rstest]
fn test_remove_to_empty_resets(mut loaded_aggregate: Aggregate) {
    loaded_aggregate.remove(Amount::from_units(10));
    loaded_aggregate.remove(Amount::from_units(30));
    loaded_aggregate.remove(Amount::from_units(20));

    let view = loaded_aggregate.read();
    assert_eq!(view.count, 0);
    assert_eq!(view.sum, 0.0);
    assert_eq!(view.avg, 0.0);
    assert!(view.min.is_none());
    assert!(view.max.is_none());
}

#[test]
fn test_average_law_rounding() {
    let mut agg = Aggregate::new();
    agg.add(Amount::from_f64(0.001));
    agg.add(Amount::from_f64(0.001));
    agg.add(Amount::from_f64(0.001));

    // 0.003 / 3 = 0.001 exactly
    assert_eq!(agg.read().avg, 0.001);

    agg.add(Amount::from_f64(0.002));
    // 0.005 / 4 = 0.00125 -> 0.001 at 3 decimals
    assert_eq!(agg.read().avg, 0.001);
}

#[test]
fn test_single_amount_is_min_and_max() {
    let mut agg = Aggregate::new();
    agg.add(Amount::from_f64(7.125));

    let view = agg.read();
    assert_eq!(view.min, Some(7.125));
    assert_eq!(view.max, Some(7.125));
    assert_eq!(view.avg, 7.125);
}

#[test]
fn test_read_is_side_effect_free() {
    let mut agg = Aggregate::new();
    agg.add(Amount::from_units(5));

    let first = agg.read();
    let second = agg.read();
    assert_eq!(first, second);
    assert_eq!(agg.count(), 1);
}
