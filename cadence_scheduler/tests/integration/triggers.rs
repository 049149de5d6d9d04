//! Integration test: triggers, bindings and command-issued requests.

use cadence_common::config::ConfigLoader;
use cadence_scheduler::config::BindingConfig;
use cadence_scheduler::prelude::*;
use cadence_scheduler::trigger::resolve_bindings;
use serde::Deserialize;

use super::support::{ended, run_ticks, scheduler, Mechanism, Probe, Trace};

#[test]
fn triggered_command_is_stepped_in_the_same_tick() {
    let (mut s, _) = scheduler();
    let trace = Trace::default();
    let t = trace.clone();
    let p = CommandTemplate::new("P", move || Probe::new("P", &t));
    let button = Signal::new();
    s.add_trigger(Trigger::new("button", button.clone()).on_true(&p));

    s.run();
    assert!(trace.entries().is_empty());
    button.set(true);
    s.run();
    assert_eq!(trace.of("P"), vec!["init@2", "exec@2"]);
}

#[test]
fn while_true_cancels_on_release() {
    let (mut s, _) = scheduler();
    let trace = Trace::default();
    let t = trace.clone();
    let p = CommandTemplate::new("P", move || Probe::new("P", &t));
    let button = Signal::new();
    s.add_trigger(Trigger::new("button", button.clone()).while_true(&p));

    button.set(true);
    run_ticks(&mut s, 2);
    button.set(false);
    s.run();

    assert_eq!(trace.of("P"), vec!["init@1", "exec@1", "exec@2", "interrupted@3"]);
    assert_eq!(ended(&s.take_events(), "P"), Some((3, EndReason::Cancelled)));
}

#[test]
fn while_true_restarts_a_command_that_finished_while_held() {
    let (mut s, _) = scheduler();
    let trace = Trace::default();
    let t = trace.clone();
    let p = CommandTemplate::new("P", move || Probe::new("P", &t).finishing_after(1));
    let button = Signal::new();
    s.add_trigger(Trigger::new("button", button.clone()).while_true(&p));

    button.set(true);
    run_ticks(&mut s, 2);
    assert_eq!(
        trace.of("P"),
        vec!["init@1", "exec@1", "end@1", "init@2", "exec@2", "end@2"]
    );
}

#[test]
fn toggle_alternates_schedule_and_cancel() {
    let (mut s, _) = scheduler();
    let trace = Trace::default();
    let t = trace.clone();
    let p = CommandTemplate::new("P", move || Probe::new("P", &t));
    let button = Signal::new();
    s.add_trigger(Trigger::new("button", button.clone()).toggle_on_true(&p));

    for pressed in [true, false, true, false, true] {
        button.set(pressed);
        s.run();
    }
    assert!(s.is_scheduled(&p));
    let events = s.take_events();
    let inits = events
        .iter()
        .filter(|e| matches!(e, SchedulerEvent::Initialized { name, .. } if name == "P"))
        .count();
    assert_eq!(inits, 2);
    assert_eq!(ended(&events, "P"), Some((3, EndReason::Cancelled)));
}

#[test]
fn toggle_sees_a_schedule_queued_earlier_in_the_tick() {
    let (mut s, _) = scheduler();
    let trace = Trace::default();
    let t = trace.clone();
    let p = CommandTemplate::new("P", move || Probe::new("P", &t));
    let button = Signal::new();
    s.add_trigger(Trigger::new("start", button.clone()).on_true(&p));
    s.add_trigger(Trigger::new("flip", button.clone()).toggle_on_true(&p));

    button.set(true);
    s.run();

    assert!(!s.is_scheduled(&p));
    assert_eq!(trace.of("P"), vec!["init@1", "interrupted@1"]);
    assert_eq!(ended(&s.take_events(), "P"), Some((1, EndReason::Cancelled)));
}

#[test]
fn cancel_all_binding_stops_everything_and_defaults_return() {
    let (mut s, _) = scheduler();
    let arm = s.register_subsystem(Mechanism::new("arm")).unwrap();
    let trace = Trace::default();
    let (td, tp, tq) = (trace.clone(), trace.clone(), trace.clone());
    s.set_default_command(
        arm,
        CommandTemplate::new("arm.hold", move || Probe::new("arm.hold", &td).requiring(arm)),
    )
    .unwrap();
    let p = CommandTemplate::new("P", move || Probe::new("P", &tp).requiring(arm));
    let q = CommandTemplate::new("Q", move || Probe::new("Q", &tq));
    let stop = Signal::new();
    s.add_trigger(Trigger::new("stop", stop.clone()).cancel_all_on_true());

    s.run();
    s.schedule(&p);
    s.schedule(&q);
    stop.set(true);
    s.run();

    assert_eq!(trace.of("P"), vec!["init@1", "interrupted@2"]);
    assert_eq!(trace.of("Q"), vec!["init@1", "interrupted@2"]);
    assert_eq!(s.running_names(), vec!["arm.hold"]);
}

#[test]
fn sensor_edge_from_a_subsystem() {
    let (mut s, reporter) = scheduler();
    let arm = s.register_subsystem(Mechanism::new("arm")).unwrap();
    let raise = CommandTemplate::new("raise", move || commands::go_to(arm, 3));
    let announce = CommandTemplate::new("announce", || commands::print("arm past 2"));
    s.add_trigger(
        Trigger::new("arm.high", Condition::from_subsystem(arm, |m: &Mechanism| m.position() >= 2))
            .on_true(&announce),
    );

    s.schedule(&raise);
    s.run();
    assert!(!reporter.messages().iter().any(|m| m == "arm past 2"));
    s.run();
    assert!(reporter.messages().iter().any(|m| m == "arm past 2"));
}

#[test]
fn command_issued_requests_apply_within_the_tick() {
    let (mut s, _) = scheduler();
    let trace = Trace::default();
    let t = trace.clone();
    let q = CommandTemplate::new("Q", move || Probe::new("Q", &t));
    let chain = q.clone();
    let p = CommandTemplate::new("P", move || {
        let chain = chain.clone();
        commands::run_once("P", Requirements::empty(), move |ctx| {
            ctx.schedule(&chain);
            Ok(())
        })
    });
    let button = Signal::new();
    s.add_trigger(Trigger::new("button", button.clone()).on_true(&p));

    button.set(true);
    s.run();
    assert_eq!(trace.of("Q"), vec!["init@1", "exec@1"]);
    assert!(s.is_scheduled(&q));
}

#[derive(Debug, Deserialize)]
struct Table {
    bindings: Vec<BindingConfig>,
}

#[test]
fn binding_table_drives_commands() {
    let (mut s, _) = scheduler();
    let trace = Trace::default();
    let (ta, tb) = (trace.clone(), trace.clone());
    let mut catalog = CommandCatalog::new();
    catalog
        .insert(CommandTemplate::new("amp", move || Probe::new("amp", &ta)))
        .insert(CommandTemplate::new("eject", move || Probe::new("eject", &tb)));
    let mut inputs = InputMap::new();
    let (a, b) = (Signal::new(), Signal::new());
    inputs.insert("operator.a", a.clone()).insert("operator.b", b.clone());

    let table = Table::from_toml(
        r#"
        [[bindings]]
        input = "operator.a"
        on = "on_true"
        command = "amp"

        [[bindings]]
        input = "operator.b"
        on = "while_true"
        command = "eject"

        [[bindings]]
        input = "operator.b"
        on = "cancel_on_true"
        command = "amp"
        "#,
    )
    .unwrap();
    s.add_triggers(resolve_bindings(&table.bindings, &inputs, &catalog).unwrap());

    a.set(true);
    s.run();
    b.set(true);
    s.run();

    assert_eq!(trace.of("amp"), vec!["init@1", "exec@1", "interrupted@2"]);
    assert_eq!(trace.of("eject"), vec!["init@2", "exec@2"]);
}
