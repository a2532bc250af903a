use antibiotic::model::ExtinctionCounts;
use antibiotic::objective::{
    PENALTY_CONCENTRATION, PENALTY_DOSAGE, maximum_concentration, overdose_amount,
    total_antibiotic, treatment_duration, uncured_proportion, weighting,
};
use antibiotic::trace::ConcentrationTrace;
use antibiotic::{Bounds, DosingSchedule, Feasibility, Model, Problem, SamplePolicy};
use proptest::prelude::*;
use rand::prelude::*;
use rand::RngCore;
use rand_chacha::ChaCha12Rng;

fn schedule(doses: &[i32]) -> DosingSchedule {
    DosingSchedule::new(doses).expect("failed to build schedule")
}

#[test]
fn scenario_a_uniform_schedule() {
    let model = Model::fixed_with_loads(1000, 900, 100).unwrap();
    let mut rng = ChaCha12Rng::seed_from_u64(2024);
    let result = model
        .evaluate(&schedule(&[10; 10]), Feasibility::Always, &mut rng)
        .unwrap();

    assert_eq!(result.samples, 1000);
    assert_eq!(total_antibiotic().compute(&result), 100.0);
    assert_eq!(treatment_duration().compute(&result), 10.0);
    let uncured = uncured_proportion().compute(&result);
    assert!(uncured.is_finite());
    assert!((0.0..=1.0).contains(&uncured));
    assert!(result.both_extinct <= result.s1_extinct.min(result.s2_extinct));
}

#[test]
fn scenario_b_no_treatment() {
    let model = Model::fixed_with_loads(10, 900, 100).unwrap();
    let mut rng = ChaCha12Rng::seed_from_u64(5);
    let result = model
        .evaluate(&schedule(&[0; 10]), Feasibility::Always, &mut rng)
        .unwrap();

    assert_eq!(total_antibiotic().compute(&result), 0.0);
    assert_eq!(treatment_duration().compute(&result), 0.0);
    assert_eq!(maximum_concentration().compute(&result), 0.0);
    assert_eq!(uncured_proportion().compute(&result), 1.0);
}

#[test]
fn scenario_c_concentration_overdose() {
    let doses = [40, 40, 0, 0, 0, 0, 0, 0, 0, 0];
    let peak = ConcentrationTrace::new(&schedule(&doses)).peak();
    assert!(peak > 60.0);

    let model = Model::fixed_with_loads(3, 20, 5).unwrap();
    let problem = Problem::with_defaults(
        model,
        vec![overdose_amount(60.0), weighting(1.0, 0.1)],
    )
    .unwrap();
    let mut rng = ChaCha12Rng::seed_from_u64(9);
    let evaluation = problem.evaluate(&doses, &mut rng).unwrap();
    assert_eq!(evaluation.objectives[0], peak - 60.0);
    assert!(evaluation.objectives[0] > 0.0);
    assert_eq!(evaluation.objectives[1], PENALTY_CONCENTRATION);

    assert_eq!(
        model.weighted_fitness(&doses, &mut rng).unwrap(),
        PENALTY_CONCENTRATION
    );
}

#[test]
fn scenario_d_single_dynamic_run() {
    let model = Model::dynamic(1, 1).unwrap();
    for seed in 0..5 {
        let mut rng = ChaCha12Rng::seed_from_u64(seed);
        let counts = model
            .sample(&schedule(&[20, 20, 15, 10, 10, 10, 5, 0, 0, 0]), &mut rng)
            .unwrap();
        assert_eq!(counts.samples, 1);
    }
}

#[test]
fn fixed_policy_takes_exact_sample_count() {
    for runs in [1, 7, 32] {
        let model = Model::fixed_with_loads(runs, 30, 10).unwrap();
        assert_eq!(model.policy(), SamplePolicy::Fixed { runs });
        let mut rng = ChaCha12Rng::seed_from_u64(runs as u64);
        let counts = model
            .sample(&schedule(&[30, 20, 20, 10, 10]), &mut rng)
            .unwrap();
        assert_eq!(counts.samples, runs);
    }
}

#[test]
fn dynamic_policy_stops_on_either_bound() {
    let (target_failures, maximum_runs) = (3, 12);
    let model = Model::dynamic_with_loads(target_failures, maximum_runs, 30, 10).unwrap();
    let doses = schedule(&[35, 20, 15, 15, 10, 0, 0, 0, 0, 0]);
    for seed in 0..20 {
        let mut rng = ChaCha12Rng::seed_from_u64(seed);
        let counts: ExtinctionCounts = model.sample(&doses, &mut rng).unwrap();
        assert!(counts.samples <= maximum_runs);
        assert!(
            counts.samples == maximum_runs || counts.failures() == target_failures,
            "stopped early: {counts:?}"
        );
        assert!(counts.failures() <= target_failures);
    }
}

#[test]
fn seeded_evaluations_are_bit_identical() {
    let model = Model::dynamic_with_loads(5, 40, 300, 50).unwrap();
    let bounds = Bounds {
        max_failure: 0.3,
        ..Bounds::default()
    };
    let problem = Problem::new(
        model,
        bounds,
        vec![uncured_proportion(), maximum_concentration(), weighting(1.0, 0.1)],
    )
    .unwrap();
    let doses = [30, 25, 20, 15, 10, 10, 5, 5, 0, 0];

    let first = problem
        .evaluate(&doses, &mut ChaCha12Rng::seed_from_u64(77))
        .unwrap();
    let second = problem
        .evaluate(&doses, &mut ChaCha12Rng::seed_from_u64(77))
        .unwrap();
    let bits = |vals: &[f64]| vals.iter().map(|v| v.to_bits()).collect::<Vec<_>>();
    assert_eq!(bits(&first.objectives), bits(&second.objectives));
    assert_eq!(first.constraint, second.constraint);
    assert_eq!(first.samples, second.samples);
}

#[test]
fn dosage_overdose_is_penalized_without_sampling() {
    let model = Model::fixed(1000).unwrap();
    let doses = [19; 10];
    let mut rng = ChaCha12Rng::seed_from_u64(1);
    assert_eq!(model.weighted_fitness(&doses, &mut rng).unwrap(), PENALTY_DOSAGE);

    // The random stream was not consumed.
    let mut fresh = ChaCha12Rng::seed_from_u64(1);
    assert_eq!(rng.next_u64(), fresh.next_u64());
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn totals_and_durations_are_exact(doses in prop::collection::vec(0..=60i32, 0..=10)) {
        let schedule = schedule(&doses);
        let model = Model::fixed_with_loads(1, 0, 0).unwrap();
        let mut rng = ChaCha12Rng::seed_from_u64(0);
        let result = model.evaluate(&schedule, Feasibility::ShortCircuit, &mut rng).unwrap();

        let expected_total: i32 = doses.iter().sum();
        let expected_duration = doses.iter().rposition(|&d| d != 0).map_or(0, |i| i + 1);
        prop_assert_eq!(total_antibiotic().compute(&result), f64::from(expected_total));
        prop_assert_eq!(treatment_duration().compute(&result), expected_duration as f64);

        let skipped = ConcentrationTrace::new(&schedule).exceeds_limits();
        prop_assert_eq!(result.samples, usize::from(!skipped));
        prop_assert_eq!(result.sampled(), !skipped);
    }

    #[test]
    fn infeasible_schedules_get_fixed_penalties(doses in prop::collection::vec(0..=60i32, 10)) {
        let trace = ConcentrationTrace::new(&schedule(&doses));
        prop_assume!(trace.exceeds_limits());

        let model = Model::fixed(1000).unwrap();
        let mut rng = ChaCha12Rng::seed_from_u64(0);
        let fitness = model.weighted_fitness(&doses, &mut rng).unwrap();
        if trace.total() > 184 {
            prop_assert_eq!(fitness, PENALTY_DOSAGE);
        } else {
            prop_assert_eq!(fitness, PENALTY_CONCENTRATION);
        }
    }

    #[test]
    fn uncured_proportion_is_a_proportion(
        doses in prop::collection::vec(0..=30i32, 10),
        seed in any::<u64>(),
    ) {
        let model = Model::fixed_with_loads(4, 15, 5).unwrap();
        let mut rng = ChaCha12Rng::seed_from_u64(seed);
        let result = model.evaluate(&schedule(&doses), Feasibility::Always, &mut rng).unwrap();
        let uncured = uncured_proportion().compute(&result);
        prop_assert!((0.0..=1.0).contains(&uncured));
    }
}
