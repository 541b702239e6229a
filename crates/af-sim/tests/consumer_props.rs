//! Shape properties of the consumers over arbitrary seeds.

use af_core::{DeterministicStream, Seed};
use af_sim::{
    ConvergenceOptions, NarrativeOptions, RaceInputs, RaceOptions, generate_convergence,
    generate_narrative, simulate_races,
};
use proptest::prelude::*;

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn narrative_is_monotone(seed in any::<u64>(), cd in 0.08f64..1.2, epochs in 1usize..16) {
        let mut stream = DeterministicStream::new(Seed(seed));
        let n = generate_narrative(cd, &mut stream, &NarrativeOptions { epochs }).unwrap();

        prop_assert_eq!(n.epochs.len(), epochs);
        prop_assert!(n.epochs[0].result_cd < cd);
        for w in n.epochs.windows(2) {
            prop_assert!(w[1].result_cd < w[0].result_cd);
            prop_assert!(w[1].improvement_pct < w[0].improvement_pct);
        }
        prop_assert!((0.6..=0.98).contains(&n.confidence));
        prop_assert!(n.optimized_cd > 0.0);
        prop_assert_eq!(stream.draws_taken(), 2 + 2 * epochs as u64);
    }

    #[test]
    fn race_aggregates_are_ordered(
        seed in any::<u64>(),
        cd in 0.0f64..3.0,
        mass_g in 10.0f64..400.0,
        area in 0.0f64..0.05,
    ) {
        let opts = RaceOptions {
            samples: 400,
            visualization_points: 40,
            ..RaceOptions::default()
        };
        let mut stream = DeterministicStream::new(Seed(seed));
        let race = simulate_races(RaceInputs::new(cd, mass_g, area), &mut stream, &opts).unwrap();

        let t = race.statistics.time;
        prop_assert!(t.best <= t.average && t.average <= t.worst);
        prop_assert!(t.worst <= opts.max_time_s);
        prop_assert!(t.std_dev >= 0.0);
        prop_assert_eq!(race.sample_count, 400);
        prop_assert_eq!(race.points.len(), 40);
        prop_assert!(race.points.windows(2).all(|w| w[0].time_s <= w[1].time_s));
    }

    #[test]
    fn residual_iterations_increase(seed in any::<u64>(), samples in 2usize..64) {
        let opts = ConvergenceOptions { samples, ..ConvergenceOptions::default() };
        let mut stream = DeterministicStream::new(Seed(seed));
        let history = generate_convergence(&mut stream, &opts).unwrap();

        prop_assert_eq!(history.samples.len(), samples);
        prop_assert!(history.samples.windows(2).all(|w| w[0].iteration < w[1].iteration));
        prop_assert!(history.samples.iter().all(|s| s.max_residual() > 0.0));
        prop_assert_eq!(stream.draws_taken(), 4 + 4 * samples as u64);
    }
}
