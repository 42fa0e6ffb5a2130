use std::cell::{Cell, RefCell};
use std::rc::Rc;

use anima_core::{
    Easing, Engine, EngineConfig, EventLog, RunConfig, RunEvent, RunId, TargetRef, TransformComponents,
    Value,
};
use anima_test_fixtures::{ManualClock, MemorySink};
use approx::assert_abs_diff_eq;

fn handle(sink: &Rc<RefCell<MemorySink>>) -> TargetRef {
    sink.clone()
}

fn start(config: RunConfig, sink: &Rc<RefCell<MemorySink>>) -> (Rc<ManualClock>, Engine, EventLog, RunId) {
    let clock = ManualClock::shared(0.0);
    let mut engine = Engine::with_time_source(EngineConfig::default(), clock.clone());
    let log = EventLog::new();
    let id = engine
        .create_run(config, vec![handle(sink)], Some(Box::new(log.clone())))
        .unwrap();
    engine.play(id).unwrap();
    (clock, engine, log, id)
}

fn skipped(log: &EventLog) -> Vec<(String, String)> {
    let mut out: Vec<(String, String)> = log
        .events()
        .into_iter()
        .filter_map(|e| match e {
            RunEvent::PropertySkipped {
                property, reason, ..
            } => Some((property, reason)),
            _ => None,
        })
        .collect();
    out.sort();
    out
}

#[test]
fn bad_properties_are_reported_once_and_the_rest_animate() {
    let config = RunConfig::new(1000.0)
        .with_from("opacity", 0.0)
        .with_to("opacity", 1.0)
        .with_from("left", "10px")
        .with_to("left", "50%")
        .with_to("onclick", 1.0)
        .with_to("height", "20px");
    let sink = MemorySink::new()
        .only_animatable(&["opacity", "left", "height"])
        .shared();
    let (clock, mut engine, log, _id) = start(config, &sink);

    for ms in [100.0, 200.0, 300.0] {
        clock.set(ms);
        engine.frame();
    }
    let issues = skipped(&log);
    let names: Vec<&str> = issues.iter().map(|(p, _)| p.as_str()).collect();
    assert_eq!(names, vec!["height", "left", "onclick"]);
    assert!(issues[0].1.contains("no start value"));
    assert!(issues[2].1.contains("not animatable"));

    let sink = sink.borrow();
    assert_abs_diff_eq!(sink.scalar("opacity").unwrap(), 0.3, epsilon = 1e-12);
    assert!(sink.value("left").is_none());
    assert!(sink.value("onclick").is_none());
}

#[test]
fn unitless_zero_adopts_the_end_unit() {
    let config = RunConfig::new(1000.0).with_to("left", "40px");
    let sink = MemorySink::new().with_value("left", 0.0).shared();
    let (clock, mut engine, log, _id) = start(config, &sink);
    clock.set(250.0);
    engine.frame();
    assert_eq!(sink.borrow().value("left"), Some(&Value::length(10.0, "px")));
    assert!(skipped(&log).is_empty());
}

#[test]
fn discrete_values_step_at_the_end() {
    let config = RunConfig::new(1000.0)
        .with_from("visibility", "hidden")
        .with_to("visibility", "visible");
    let sink = MemorySink::new().with_discrete("visibility").shared();
    let (clock, mut engine, _log, _id) = start(config, &sink);

    clock.set(900.0);
    engine.frame();
    assert_eq!(
        sink.borrow().value("visibility"),
        Some(&Value::Discrete("hidden".into()))
    );
    clock.set(1000.0);
    engine.frame();
    assert_eq!(
        sink.borrow().value("visibility"),
        Some(&Value::Discrete("visible".into()))
    );
}

#[test]
fn implicit_start_is_read_once_per_segment() {
    let config = RunConfig::new(1000.0).with_to("x", 100.0);
    let sink = MemorySink::new().with_value("x", 0.0).shared();
    let (clock, mut engine, _log, _id) = start(config, &sink);

    // The sink now reports its last written value, but the segment keeps the
    // start it resolved on the first frame.
    for (ms, expected) in [(100.0, 10.0), (200.0, 20.0), (500.0, 50.0)] {
        clock.set(ms);
        engine.frame();
        assert_abs_diff_eq!(sink.borrow().scalar("x").unwrap(), expected, epsilon = 1e-9);
    }
}

#[test]
fn transform_components_animate_independently() {
    let from = TransformComponents::default();
    let to = TransformComponents::default()
        .with_translate(100.0, 0.0, 0.0)
        .with_rotate(0.0, 0.0, 90.0);
    let config = RunConfig::new(1000.0)
        .with_from("transform", Value::Transform(from))
        .with_to("transform", Value::Transform(to));
    let sink = MemorySink::new().shared();
    let (clock, mut engine, _log, _id) = start(config, &sink);

    clock.set(500.0);
    engine.frame();
    let sink = sink.borrow();
    let Some(Value::Transform(t)) = sink.value("transform") else {
        panic!("transform not written");
    };
    assert_abs_diff_eq!(t.translate[0], 50.0, epsilon = 1e-9);
    assert_abs_diff_eq!(t.rotate[2], 45.0, epsilon = 1e-9);
    assert_abs_diff_eq!(t.scale[1], 1.0, epsilon = 1e-9);
}

#[test]
fn a_bad_frame_only_skips_that_frame() {
    let first_call = Cell::new(true);
    let ease = Easing::custom(move |t| if first_call.replace(false) { f64::NAN } else { t });
    let config = RunConfig::new(1000.0)
        .with_ease(ease)
        .with_from("opacity", 0.0)
        .with_to("opacity", 1.0);
    let sink = MemorySink::new().shared();
    let (clock, mut engine, log, _id) = start(config, &sink);

    clock.set(100.0);
    engine.frame();
    assert_eq!(sink.borrow().scalar("opacity"), None);
    assert_eq!(skipped(&log).len(), 1);

    for (ms, expected) in [(500.0, 0.5), (900.0, 0.9)] {
        clock.set(ms);
        engine.frame();
        assert_abs_diff_eq!(sink.borrow().scalar("opacity").unwrap(), expected, epsilon = 1e-12);
    }
    assert_eq!(skipped(&log).len(), 1);
}

#[test]
fn implicit_start_recovers_once_the_target_reports_it() {
    let config = RunConfig::new(1000.0).with_to("x", 100.0);
    let sink = MemorySink::new().shared();
    let (clock, mut engine, log, _id) = start(config, &sink);

    clock.set(100.0);
    engine.frame();
    assert_eq!(sink.borrow().scalar("x"), None);

    sink.borrow_mut().set_initial("x", 50.0);
    clock.set(500.0);
    engine.frame();
    assert_abs_diff_eq!(sink.borrow().scalar("x").unwrap(), 75.0, epsilon = 1e-9);
    assert_eq!(skipped(&log).len(), 1);
}
