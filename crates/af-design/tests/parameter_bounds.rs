//! Bounds of synthesized parameters over many seeds.

use af_core::{DeterministicStream, Seed, Tolerances, nearly_equal};
use af_design::{RULES, synthesize_coefficients, synthesize_parameters};
use proptest::prelude::*;

fn assert_within_rules(seed: u64) {
    let params = synthesize_parameters(&mut DeterministicStream::new(Seed(seed)));
    for rule in RULES.iter() {
        let (lo, hi) = rule.bound.interval();
        let lo = rule.floor.map_or(lo, |f| lo.max(f));
        let hi = rule.ceiling.map_or(hi, |c| hi.min(c));
        let v = params.get(rule.field);
        assert!(
            v >= lo && v <= hi,
            "seed {seed}: {} = {v} outside [{lo}, {hi}]",
            rule.id
        );
    }
}

#[test]
fn ten_thousand_seeds_stay_in_bounds() {
    let mut seeder = DeterministicStream::new(Seed(20_240_601));
    for _ in 0..10_000 {
        let seed = (seeder.draw() * 1.0e12) as u64;
        assert_within_rules(seed);
    }
}

#[test]
fn mass_never_below_legal_minimum() {
    for seed in 0..10_000u64 {
        let params = synthesize_parameters(&mut DeterministicStream::new(Seed(seed)));
        assert!(params.total_mass_g >= 50.0);
        assert!(params.canister_clearance_mm >= 3.5);
        assert!(params.rear_wing_height_mm <= 55.0);
    }
}

proptest! {
    #[test]
    fn any_seed_in_bounds(seed in any::<u64>()) {
        assert_within_rules(seed);
    }

    #[test]
    fn coefficients_are_consistent(seed in any::<u64>()) {
        let mut stream = DeterministicStream::new(Seed(seed));
        let params = synthesize_parameters(&mut stream);
        let c = synthesize_coefficients(&params, &mut stream);
        prop_assert!(nearly_equal(c.lift_to_drag_ratio, c.cl / c.cd, Tolerances::default()));
        prop_assert_eq!(c.drag_breakdown.pressure + c.drag_breakdown.skin_friction, 100.0);
        prop_assert!(c.aero_balance >= 0.0 && c.aero_balance <= 100.0);
    }
}
