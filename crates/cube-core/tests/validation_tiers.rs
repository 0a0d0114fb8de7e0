//! # Validation Tier Tests (T0-T3)
//!
//! If ANY tier fails, the cube is INVALID.
//!
//! ## Tiers
//! - T0: Schema Integrity
//! - T1: Point Storage
//! - T2: Error Tracking
//! - T3: Combination
//!
//! Set `RUST_LOG=cube_core=trace` to see the engine's events while a tier runs.

use chrono::NaiveDate;
use cube_core::{
    Axis, AxisSet, AxisValue, Cube, CubeError, DataType, KeyKind, NamedKeys, ValueDouble,
};
use tracing_subscriber::EnvFilter;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn axis(name: &str, kind: KeyKind) -> Axis {
    Axis::new(name, DataType::of(kind), true).expect("axis")
}

fn date(y: i32, m: u32, d: u32) -> AxisValue {
    AxisValue::from(NaiveDate::from_ymd_opt(y, m, d).expect("date"))
}

fn named(pairs: &[(&str, AxisValue)]) -> NamedKeys {
    pairs
        .iter()
        .map(|(name, value)| (name.to_string(), value.clone()))
        .collect()
}

// =============================================================================
// TIER T0: SCHEMA INTEGRITY
// =============================================================================

mod t0_schema_integrity {
    use super::*;

    /// T0.1: Unique names build a schema of the same length.
    #[test]
    fn unique_names_accepted() {
        let set = AxisSet::new([
            axis("Category", KeyKind::Text),
            axis("Date", KeyKind::Date),
            axis("Tenor", KeyKind::Int),
        ])
        .expect("set");

        assert_eq!(set.len(), 3);
        assert_eq!(set.index_of("Date"), Some(1));
    }

    /// T0.2: A repeated name is rejected.
    #[test]
    fn duplicate_names_rejected() {
        let result = AxisSet::new([axis("A", KeyKind::Text), axis("A", KeyKind::Int)]);
        assert!(matches!(result, Err(CubeError::Schema(_))));
    }

    /// T0.3: A cube needs at least one axis.
    #[test]
    fn empty_schema_rejected_by_cube() {
        let set = AxisSet::new(Vec::new()).expect("empty set");
        assert!(matches!(
            Cube::<ValueDouble>::new(set),
            Err(CubeError::Schema(_))
        ));
    }

    /// T0.4: A TOML schema document builds a working cube.
    #[test]
    fn toml_schema_builds_cube() {
        init_tracing();
        let set = AxisSet::from_toml_str(
            r#"
            [[axis]]
            name = "Book"
            type = "text"
            nullable = true

            [[axis]]
            name = "Expiry"
            type = "date"
            "#,
        )
        .expect("schema");

        let mut cube = Cube::new(set).expect("cube");
        assert!(
            cube.add_item(&[AxisValue::Null, date(2025, 6, 30)], &ValueDouble(1.0))
                .expect("insert")
        );
        assert!(matches!(
            cube.add_item(&["B1".into(), AxisValue::Null], &ValueDouble(1.0)),
            Err(CubeError::TypeMismatch(_))
        ));
    }
}

// =============================================================================
// TIER T1: POINT STORAGE
// =============================================================================

mod t1_point_storage {
    use super::*;

    fn category_date() -> Cube<ValueDouble> {
        let set = AxisSet::new([axis("Category", KeyKind::Text), axis("Date", KeyKind::Date)])
            .expect("set");
        Cube::new(set).expect("cube")
    }

    /// T1.1: Two values at one key merge into one point.
    #[test]
    fn same_key_merges() {
        init_tracing();
        let mut cube = category_date();
        let keys = ["X".into(), date(2024, 1, 31)];

        assert!(cube.add_item(&keys, &ValueDouble(2.3)).expect("first"));
        assert!(!cube.add_item(&keys, &ValueDouble(4.3)).expect("second"));

        assert_eq!(cube.len(), 1);
        let value = cube.try_get_value(&keys).expect("lookup").expect("point");
        assert!((value.0 - 6.6).abs() < 1e-9);
    }

    /// T1.2: Wrong arity and wrong types are rejected without side effects.
    #[test]
    fn arity_and_type_enforced() {
        let mut cube = category_date();

        assert!(matches!(
            cube.add_item(&["X".into()], &ValueDouble(1.0)),
            Err(CubeError::KeyCount { expected: 2, actual: 1 })
        ));
        assert!(matches!(
            cube.add_item(&[date(2024, 1, 1), "X".into()], &ValueDouble(1.0)),
            Err(CubeError::TypeMismatch(_))
        ));
        assert!(matches!(
            cube.add_item(&[AxisValue::Null, date(2024, 1, 1)], &ValueDouble(1.0)),
            Err(CubeError::TypeMismatch(_))
        ));
        assert!(cube.is_empty());
    }

    /// T1.3: Named keys need every axis; extra names are ignored.
    #[test]
    fn named_keys() {
        let mut cube = category_date();

        let missing = cube.add_item_named(&named(&[("Category", "X".into())]), &ValueDouble(1.0));
        assert!(matches!(missing, Err(CubeError::MissingKey { index: 1, .. })));

        let keys = named(&[
            ("Category", "X".into()),
            ("Date", date(2024, 2, 1)),
            ("Desk", "Rates".into()),
        ]);
        assert!(cube.add_item_named(&keys, &ValueDouble(1.0)).expect("insert"));
        assert_eq!(cube.len(), 1);
    }

    /// T1.4: Enumeration round-trips every key, once each.
    #[test]
    fn enumeration_round_trips() {
        let mut cube = category_date();
        let mut inserted = Vec::new();
        for (i, category) in ["A", "B", "C"].iter().enumerate() {
            for day in 1..=4 {
                let keys = [AxisValue::from(*category), date(2024, 3, day)];
                cube.add_item(&keys, &ValueDouble(i as f64)).expect("insert");
                inserted.push(keys);
            }
        }

        let mut seen: Vec<[AxisValue; 2]> = cube
            .iter()
            .map(|point| {
                [
                    point.axis_value(0).expect("key").clone(),
                    point.axis_value(1).expect("key").clone(),
                ]
            })
            .collect();

        assert_eq!(seen.len(), inserted.len());
        let key_order = |k: &[AxisValue; 2]| (k[0].to_string(), k[1].to_string());
        seen.sort_by_key(key_order);
        inserted.sort_by_key(key_order);
        assert_eq!(seen, inserted);
    }

    /// T1.5: Lookups of unseen values neither match nor intern.
    #[test]
    fn lookup_of_unseen_value() {
        let mut cube = category_date();
        cube.add_item(&["X".into(), date(2024, 1, 1)], &ValueDouble(1.0))
            .expect("insert");

        assert!(
            cube.try_get_value(&["Y".into(), date(2024, 1, 1)])
                .expect("lookup")
                .is_none()
        );
        assert!(
            cube.try_get_value(&["Y".into(), date(2024, 1, 1)])
                .expect("lookup")
                .is_none()
        );
    }
}

// =============================================================================
// TIER T2: ERROR TRACKING
// =============================================================================

mod t2_error_tracking {
    use super::*;

    /// Errors at `{A=2,B=3,C=4}`, `{A=5,C=4}`, `{C=4}`, `{A=2}`, `{A=2,B=7}`.
    fn populated() -> Cube<ValueDouble> {
        let set = AxisSet::new([
            axis("A", KeyKind::Int),
            axis("B", KeyKind::Int),
            axis("C", KeyKind::Int),
        ])
        .expect("set");
        let mut cube = Cube::new(set).expect("cube");

        let errors = [
            (named(&[("A", 2.into()), ("B", 3.into()), ("C", 4.into())]), "A2 B3 C4"),
            (named(&[("A", 5.into()), ("C", 4.into())]), "A5 C4"),
            (named(&[("C", 4.into())]), "C4"),
            (named(&[("A", 2.into())]), "A2"),
            (named(&[("A", 2.into()), ("B", 7.into())]), "A2 B7"),
        ];
        for (keys, message) in errors {
            cube.add_error(&keys, message).expect("add error");
        }
        cube
    }

    fn messages(cube: &Cube<ValueDouble>, filter: &NamedKeys) -> Vec<String> {
        let mut found: Vec<String> = cube
            .error_set()
            .matching(filter)
            .expect("filter")
            .map(|e| e.message().to_string())
            .collect();
        found.sort();
        found
    }

    /// T2.1: Every message is enumerated once.
    #[test]
    fn full_enumeration() {
        init_tracing();
        let cube = populated();
        assert_eq!(cube.error_set().iter().count(), 5);
        assert_eq!(messages(&cube, &NamedKeys::new()).len(), 5);
    }

    /// T2.2: A filter keeps errors unset on the axis or equal to the value.
    #[test]
    fn filter_on_one_axis() {
        let cube = populated();
        assert_eq!(
            messages(&cube, &named(&[("B", 3.into())])),
            vec!["A2", "A2 B3 C4", "A5 C4", "C4"]
        );
    }

    /// T2.3: Filters on several axes intersect.
    #[test]
    fn filter_on_two_axes() {
        let cube = populated();
        assert_eq!(
            messages(&cube, &named(&[("A", 2.into()), ("C", 4.into())])),
            vec!["A2", "A2 B3 C4", "A2 B7", "C4"]
        );
    }

    /// T2.4: A value never seen matches only the wildcard branches.
    #[test]
    fn filter_on_unseen_value() {
        let cube = populated();
        assert_eq!(
            messages(&cube, &named(&[("A", 99.into())])),
            vec!["C4"]
        );
    }

    /// T2.5: Error keys round-trip through the interner.
    #[test]
    fn error_keys_round_trip() {
        let cube = populated();
        let entry = cube
            .error_set()
            .iter()
            .find(|e| e.message() == "A5 C4")
            .expect("entry");

        assert_eq!(entry.error_axes(), vec!["A", "C"]);
        assert_eq!(entry.error_key("A").expect("key"), &AxisValue::Int(5));
        assert!(matches!(entry.error_key("B"), Err(CubeError::UnknownAxis(_))));
    }

    /// T2.6: Bad error keys are rejected.
    #[test]
    fn bad_error_keys_rejected() {
        let mut cube = populated();
        assert!(matches!(
            cube.add_error(&named(&[("D", 1.into())]), "x"),
            Err(CubeError::UnknownAxis(_))
        ));
        assert!(matches!(
            cube.add_error(&named(&[("A", "two".into())]), "x"),
            Err(CubeError::TypeMismatch(_))
        ));
        assert!(matches!(
            cube.error_set().matching(&named(&[("D", 1.into())])),
            Err(CubeError::UnknownAxis(_))
        ));
        assert_eq!(cube.error_set().len(), 5);
    }
}

// =============================================================================
// TIER T3: COMBINATION
// =============================================================================

mod t3_combination {
    use super::*;
    use cube_core::{AnyCube, ValueFloat, can_combine_cubes, combine_cubes};

    fn trades() -> Cube<ValueDouble> {
        let set = AxisSet::new([
            axis("Book", KeyKind::Text),
            axis("Trade", KeyKind::Int),
            axis("Expiry", KeyKind::Date),
        ])
        .expect("set");
        let mut cube = Cube::new(set).expect("cube");
        for (book, trade, value) in [("B1", 1, 10.0), ("B1", 2, 5.0), ("B2", 3, 1.0)] {
            cube.add_item(
                &[book.into(), AxisValue::Int(trade), date(2025, 12, 31)],
                &ValueDouble(value),
            )
            .expect("insert");
        }
        cube.add_error(&named(&[("Trade", 2.into())]), "stale price")
            .expect("add error");
        cube
    }

    fn positions() -> Cube<ValueDouble> {
        let set = AxisSet::new([axis("Expiry", KeyKind::Date), axis("Book", KeyKind::Text)])
            .expect("set");
        let mut cube = Cube::new(set).expect("cube");
        cube.add_item(&[date(2025, 12, 31), "B2".into()], &ValueDouble(100.0))
            .expect("insert");
        cube.add_error(&named(&[("Book", "B2".into())]), "missing curve")
            .expect("add error");
        cube
    }

    /// T3.1: Cubes combine over their common axes and sum collapsed points.
    #[test]
    fn combine_over_common_axes() {
        init_tracing();
        let (a, b) = (trades(), positions());
        assert!(can_combine_cubes([&a, &b]));

        let combined = combine_cubes([&a, &b], None).expect("combine");
        assert_eq!(
            combined.axis_set().names().collect::<Vec<_>>(),
            vec!["Book", "Expiry"]
        );
        assert_eq!(combined.len(), 2);

        let b1 = combined
            .try_get_value(&["B1".into(), date(2025, 12, 31)])
            .expect("lookup")
            .expect("point");
        assert!((b1.0 - 15.0).abs() < 1e-9);
        let b2 = combined
            .try_get_value(&["B2".into(), date(2025, 12, 31)])
            .expect("lookup")
            .expect("point");
        assert!((b2.0 - 101.0).abs() < 1e-9);

        let mut errors: Vec<(String, Vec<&str>)> = combined
            .error_set()
            .iter()
            .map(|e| (e.message().to_string(), e.error_axes()))
            .collect();
        errors.sort();
        assert_eq!(
            errors,
            vec![
                ("missing curve".to_string(), vec!["Book"]),
                ("stale price".to_string(), vec![]),
            ]
        );
    }

    /// T3.2: An explicit axis list fixes the output order.
    #[test]
    fn explicit_order() {
        let (a, b) = (trades(), positions());
        let combined = combine_cubes([&a, &b], Some(&["Expiry", "Book"][..])).expect("combine");
        assert_eq!(
            combined.axis_set().names().collect::<Vec<_>>(),
            vec!["Expiry", "Book"]
        );

        let missing = combine_cubes([&a, &b], Some(&["Trade"][..]));
        assert!(matches!(missing, Err(CubeError::Schema(_))));
    }

    /// T3.3: Disjoint schemas cannot be combined.
    #[test]
    fn disjoint_schemas() {
        let a = trades();
        let other = Cube::<ValueDouble>::new(
            AxisSet::new([axis("Desk", KeyKind::Text)]).expect("set"),
        )
        .expect("cube");

        assert!(!can_combine_cubes([&a, &other]));
        assert!(matches!(
            combine_cubes([&a, &other], None),
            Err(CubeError::IncompatibleSchema(_))
        ));
    }

    /// T3.4: Typed handles combine only when they share a value kind.
    #[test]
    fn typed_handles() {
        let floats = Cube::<ValueFloat>::new(
            AxisSet::new([axis("Book", KeyKind::Text)]).expect("set"),
        )
        .expect("cube");

        let mixed = [AnyCube::from(trades()), AnyCube::from(floats)];
        assert!(AnyCube::try_combine(&mixed, None).expect("combine").is_none());

        let same = [AnyCube::from(trades()), AnyCube::from(positions())];
        let combined = AnyCube::try_combine(&same, Some(&["Book"][..]))
            .expect("combine")
            .expect("combinable");
        assert_eq!(combined.value_kind(), "double");
        assert_eq!(combined.len(), 2);
    }
}
