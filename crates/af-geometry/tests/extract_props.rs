use af_geometry::{NOMINAL_ENVELOPE, build_seed, extract_features};
use proptest::prelude::*;

proptest! {
    #[test]
    fn arbitrary_bytes_never_fail(bytes in prop::collection::vec(any::<u8>(), 0..2048)) {
        let a = extract_features(&bytes);
        let b = extract_features(&bytes);
        prop_assert_eq!(&a, &b);
        prop_assert_eq!(build_seed(&a), build_seed(&b));
        prop_assert_eq!(a.byte_len, bytes.len() as u64);
        if a.used_fallback_bounds {
            prop_assert_eq!(a.bounds, NOMINAL_ENVELOPE);
        }
    }

    #[test]
    fn triplets_bound_the_box(points in prop::collection::vec((-500.0f64..500.0, -500.0f64..500.0, -500.0f64..500.0), 1..40)) {
        let mut text = String::from("DATA;\n");
        for (i, (x, y, z)) in points.iter().enumerate() {
            text.push_str(&format!("#{}=CARTESIAN_POINT('',({:?},{:?},{:?}));\n", i + 1, x, y, z));
        }
        let f = extract_features(text.as_bytes());
        prop_assert!(!f.used_fallback_bounds);
        prop_assert_eq!(f.coordinate_matches, points.len() as u64);
        prop_assert_eq!(f.keyword_count("CARTESIAN_POINT"), points.len() as u64);
        for (x, y, z) in &points {
            prop_assert!(f.bounds.min_x <= *x && *x <= f.bounds.max_x);
            prop_assert!(f.bounds.min_y <= *y && *y <= f.bounds.max_y);
            prop_assert!(f.bounds.min_z <= *z && *z <= f.bounds.max_z);
        }
    }
}

#[test]
fn seed_changes_with_content() {
    let mut point = b"#1=CARTESIAN_POINT('',(0.,0.,0.));".to_vec();
    let mut shell = b"#1=CLOSED_SHELL('',(#2));".to_vec();
    point.resize(64, b' ');
    shell.resize(64, b' ');
    let a = extract_features(&point);
    let b = extract_features(&shell);
    assert_eq!(a.byte_len, b.byte_len);
    assert_ne!(build_seed(&a), build_seed(&b));
}
