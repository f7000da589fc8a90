//! Integration test: mover and outputter failures surface with the
//! component's name, and output failures leave the step committed.

use approx::assert_relative_eq;
use slick_engine::{Model, StepError, TracingOutputter};
use slick_test_utils::fixtures::{DriftMover, FailingMover, FailingOutputter};
use slick_test_utils::{hour_config, point_spill, t0, tracer, RecordingOutputter};

#[test]
fn drift_moves_and_clamps_at_the_surface() {
    let mut m = Model::builder(hour_config())
        .spill(point_spill(tracer(), 5, 50.0, [-128.0, 28.0, 0.0]))
        .mover(DriftMover::new("drift", [0.01, -0.005, -5.0]))
        .outputter(TracingOutputter)
        .build()
        .unwrap();
    assert_eq!(m.full_run().unwrap(), 4);

    for p in m.containers().certain().sc.store().positions() {
        assert_relative_eq!(p[0], -127.96, epsilon = 1e-9);
        assert_relative_eq!(p[1], 27.98, epsilon = 1e-9);
        assert_eq!(p[2], 0.0);
    }
    let names: Vec<_> = m.last_metrics().mover_us.iter().map(|(n, _)| n.as_str()).collect();
    assert_eq!(names, ["drift"]);
}

#[test]
fn mover_failure_names_the_mover() {
    let mut m = Model::builder(hour_config())
        .spill(point_spill(tracer(), 5, 50.0, [-128.0, 28.0, 0.0]))
        .mover(FailingMover::new(2))
        .build()
        .unwrap();
    m.step().unwrap();
    m.step().unwrap();
    let err = m.step().unwrap_err();
    match err {
        StepError::MoverFailed { ref mover, .. } => assert_eq!(mover, "failing"),
        other => panic!("expected MoverFailed, got {other:?}"),
    }
    assert_eq!(m.current_step(), 2);

    // A rewound model resets the mover's call count.
    m.rewind();
    m.step().unwrap();
    m.step().unwrap();
    assert!(m.step().is_err());
}

#[test]
fn output_failure_does_not_starve_other_outputters() {
    let recorder = RecordingOutputter::new();
    let frames = recorder.frames();
    let mut m = Model::builder(hour_config())
        .spill(point_spill(tracer(), 3, 30.0, [-128.0, 28.0, 0.0]))
        .outputter(FailingOutputter)
        .outputter(recorder.clone())
        .build()
        .unwrap();

    let err = m.step().unwrap_err();
    assert!(matches!(
        err,
        StepError::OutputFailed { ref outputter, .. } if outputter == "failing"
    ));
    assert_eq!(m.current_step(), 1);
    assert_eq!(recorder.prepared(), Some((t0(), 4)));
    assert_eq!(frames.lock().unwrap().len(), 1);

    while m.current_step() < m.num_time_steps() {
        assert!(m.step().is_err());
    }
    let snapshot = recorder.snapshot();
    assert_eq!(snapshot.len(), 4);
    assert_eq!(snapshot[3].model_time, slick_core::add_seconds(t0(), 3600.0));
    assert_relative_eq!(snapshot[3].mass, 30.0, max_relative = 1e-12);
}
