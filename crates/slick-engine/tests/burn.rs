//! Integration test: a burn inside a model extinguishes at the minimum
//! thickness and removes nothing afterwards.

use slick_engine::{Model, ModelConfig};
use slick_test_utils::{crude, point_spill, t0};
use slick_weatherers::Burn;

#[test]
fn burn_extinguishes_within_first_step() {
    let config = ModelConfig::new(t0())
        .with_duration(600.0)
        .with_time_step(60.0);
    let mut m = Model::builder(config)
        .spill(point_spill(crude(), 50, 2000.0, [-128.0, 28.0, 0.0]))
        .weatherer(Burn::new(10.0, "m^2", 3.0, "mm", t0(), 1.0).unwrap())
        .build()
        .unwrap();

    m.step().unwrap();
    let burned = m.containers().certain().ledger.get("burned").unwrap_or(0.0);
    assert!(burned > 0.0);
    assert!(!m.weatherers()[0].is_active());

    m.full_run().unwrap();
    assert_eq!(m.current_step(), 10);
    let after = m.containers().certain().ledger.get("burned").unwrap_or(0.0);
    assert_eq!(after, burned);

    let live = m.containers().certain().sc.store().total_mass();
    assert!((2000.0 - burned - live).abs() < 1e-6);
}

#[test]
fn burn_before_start_removes_nothing() {
    let config = ModelConfig::new(t0())
        .with_duration(1800.0)
        .with_time_step(900.0);
    let late = slick_core::add_seconds(t0(), 7200.0);
    let mut m = Model::builder(config)
        .spill(point_spill(crude(), 10, 100.0, [-128.0, 28.0, 0.0]))
        .weatherer(Burn::new(10.0, "m^2", 3.0, "mm", late, 1.0).unwrap())
        .build()
        .unwrap();
    m.full_run().unwrap();
    assert_eq!(m.containers().certain().ledger.get("burned"), Some(0.0));
}
