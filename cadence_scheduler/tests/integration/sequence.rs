//! Integration test: sequence timing and interruption.

use std::time::Duration;

use cadence_scheduler::prelude::*;

use super::support::{ended, run_ticks, scheduler, Mechanism, Probe, Trace};

fn two_step(trace: &Trace) -> CommandTemplate {
    let t = trace.clone();
    CommandTemplate::try_new("auto", move || {
        commands::sequence(vec![
            Probe::new("A", &t).finishing_after(2).boxed(),
            Probe::new("B", &t).finishing_after(1).boxed(),
        ])
        .map(|seq| seq.with_name("auto"))
    })
    .unwrap()
}

#[test]
fn next_child_initializes_in_the_tick_the_previous_ends() {
    let (mut s, _) = scheduler();
    let trace = Trace::default();
    let auto = two_step(&trace);

    s.schedule(&auto);
    run_ticks(&mut s, 2);
    assert!(s.is_scheduled(&auto));
    s.run();
    assert!(!s.is_scheduled(&auto));

    assert_eq!(
        trace.entries(),
        vec![
            "A:init@0", "A:exec@1", "A:exec@2", "A:end@2", "B:init@2", "B:exec@3", "B:end@3",
        ]
    );
    assert_eq!(ended(&s.take_events(), "auto"), Some((3, EndReason::Finished)));
}

#[test]
fn interrupting_a_sequence_ends_only_the_current_child() {
    let (mut s, _) = scheduler();
    let trace = Trace::default();
    let t = trace.clone();
    let auto = CommandTemplate::try_new("auto", move || {
        commands::sequence(vec![
            Probe::new("A", &t).boxed(),
            Probe::new("B", &t).finishing_after(1).boxed(),
        ])
    })
    .unwrap();

    s.schedule(&auto);
    run_ticks(&mut s, 2);
    assert!(s.cancel(&auto));

    assert_eq!(trace.of("A"), vec!["init@0", "exec@1", "exec@2", "interrupted@2"]);
    assert!(trace.of("B").is_empty());
}

#[test]
fn sequence_holds_union_of_requirements_throughout() {
    let (mut s, _) = scheduler();
    let arm = s.register_subsystem(Mechanism::new("arm")).unwrap();
    let intake = s.register_subsystem(Mechanism::new("intake")).unwrap();
    let trace = Trace::default();
    let t = trace.clone();
    let handoff = CommandTemplate::try_new("handoff", move || {
        commands::sequence(vec![
            Probe::new("A", &t).requiring(arm).finishing_after(2).boxed(),
            Probe::new("B", &t).requiring(intake).finishing_after(2).boxed(),
        ])
        .map(|seq| seq.with_name("handoff"))
    })
    .unwrap();

    s.schedule(&handoff);
    s.run();
    assert_eq!(s.claimant_name(arm.id()), Some("handoff"));
    assert_eq!(s.claimant_name(intake.id()), Some("handoff"));
    run_ticks(&mut s, 2);
    assert_eq!(s.claimant_name(arm.id()), Some("handoff"));
    s.run();
    assert_eq!(s.claimant(arm.id()), None);
    assert_eq!(s.claimant(intake.id()), None);
}

#[test]
fn chained_prints_and_waits() {
    let (mut s, reporter) = scheduler();
    let routine = CommandTemplate::new("routine", || {
        commands::print("start")
            .and_then(commands::wait(Duration::from_millis(40)))
            .and_then(commands::print("done"))
    });

    let said = |msg: &str| reporter.messages().iter().any(|m| m == msg);

    s.schedule(&routine);
    assert!(said("start"));
    run_ticks(&mut s, 2);
    assert!(!said("done"));
    s.run();
    assert!(said("done"));
    s.run();
    assert!(!s.is_scheduled(&routine));
}

#[test]
fn empty_sequence_fails_at_composition() {
    let result = CommandTemplate::try_new("empty", || commands::sequence(Vec::new()));
    assert!(matches!(result, Err(CompositionError::EmptyGroup { .. })));
}
