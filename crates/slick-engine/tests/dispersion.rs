//! Integration test: a dispersant window that opens while oil is still
//! being released targets a share of the whole spill, not of the oil
//! released so far.

use approx::assert_relative_eq;
use slick_core::add_seconds;
use slick_engine::{Model, ModelConfig, Spill};
use slick_release::PointLineRelease;
use slick_test_utils::{crude, t0};
use slick_weatherers::ChemicalDispersion;

#[test]
fn dispersant_target_uses_total_spill_mass() {
    // 1000 kg over ten hours in 10 kg particles.
    let release = PointLineRelease::builder(t0(), [-128.0, 28.0, 0.0])
        .end_release_time(add_seconds(t0(), 10.0 * 3600.0))
        .num_elements(100)
        .build()
        .unwrap();
    let spill = Spill::builder(release, crude())
        .amount(1000.0, "kg")
        .build()
        .unwrap();

    // Spraying starts at 8 h, before the release has finished.
    let start = add_seconds(t0(), 8.0 * 3600.0);
    let stop = add_seconds(t0(), 18.0 * 3600.0);
    let config = ModelConfig::new(t0())
        .with_duration(18.0 * 3600.0)
        .with_time_step(900.0);
    let mut m = Model::builder(config)
        .spill(spill)
        .weatherer(ChemicalDispersion::new(0.5, start, stop, 1.0).unwrap())
        .build()
        .unwrap();
    m.full_run().unwrap();

    let certain = m.containers().certain();
    assert_eq!(certain.sc.len(), 100);
    let dispersed = certain.ledger.get("chem_dispersed").unwrap_or(0.0);
    assert_relative_eq!(dispersed, 500.0, max_relative = 1e-9);
    let live = certain.sc.store().total_mass();
    assert_relative_eq!(live + dispersed, 1000.0, max_relative = 1e-9);
}
