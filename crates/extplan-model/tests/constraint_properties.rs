use extplan_model::{Version, VersionConstraint};
use proptest::prelude::*;

fn version() -> impl Strategy<Value = Version> {
    (0u64..5, 0u64..4, 0u64..3).prop_map(|(major, minor, patch)| Version::new(major, minor, patch))
}

fn constraint() -> impl Strategy<Value = VersionConstraint> {
    let range = (version(), 1u64..4, any::<bool>(), any::<bool>()).prop_map(
        |(lower, width, inclusive_lower, inclusive_upper)| {
            let upper = Version::new(lower.major + width, lower.minor, 0);
            format!(
                "{}{},{}{}",
                if inclusive_lower { '[' } else { '(' },
                lower,
                upper,
                if inclusive_upper { ']' } else { ')' },
            )
        },
    );
    let text = prop_oneof![
        range,
        version().prop_map(|v| format!(">={v}")),
        version().prop_map(|v| format!("<={v}")),
        version().prop_map(|v| format!("!={v}")),
        version().prop_map(|v| format!("^{v}")),
        version().prop_map(|v| format!("[{v}]")),
        (version(), version()).prop_map(|(a, b)| format!("[{a}],[{b}]")),
        Just("*".to_string()),
    ];
    text.prop_map(|t| VersionConstraint::parse(&t).expect("generated constraint parses"))
}

proptest! {
    #[test]
    fn test_merge_is_commutative(a in constraint(), b in constraint()) {
        prop_assert_eq!(a.merge(&b).ok(), b.merge(&a).ok());
    }

    #[test]
    fn test_merge_is_associative(a in constraint(), b in constraint(), c in constraint()) {
        let left = a.merge(&b).and_then(|ab| ab.merge(&c)).ok();
        let right = b.merge(&c).and_then(|bc| a.merge(&bc)).ok();
        prop_assert_eq!(left, right);
    }

    #[test]
    fn test_merge_is_exact_intersection(
        a in constraint(),
        b in constraint(),
        samples in prop::collection::vec(version(), 1..24),
    ) {
        match a.merge(&b) {
            Ok(merged) => {
                for v in &samples {
                    prop_assert_eq!(
                        merged.is_compatible(v),
                        a.is_compatible(v) && b.is_compatible(v),
                        "version {} against {} and {}", v, a, b
                    );
                }
            }
            Err(err) => {
                prop_assert_eq!(&err.left, &a);
                prop_assert_eq!(&err.right, &b);
                for v in &samples {
                    prop_assert!(!(a.is_compatible(v) && b.is_compatible(v)));
                }
            }
        }
    }

    #[test]
    fn test_merge_with_any_is_identity(a in constraint()) {
        prop_assert_eq!(a.merge(&VersionConstraint::any()).ok(), Some(a.clone()));
    }

    #[test]
    fn test_display_reparses_to_equal_constraint(a in constraint(), b in constraint()) {
        if let Ok(merged) = a.merge(&b) {
            let reparsed = VersionConstraint::parse(&merged.to_string()).unwrap();
            prop_assert_eq!(reparsed, merged);
        }
    }
}
