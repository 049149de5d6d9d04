//! Integration test: parallel, race and deadline groups.

use cadence_scheduler::prelude::*;

use super::support::{ended, run_ticks, scheduler, Mechanism, Probe, Trace};

#[test]
fn parallel_finishes_when_every_child_has() {
    let (mut s, _) = scheduler();
    let trace = Trace::default();
    let t = trace.clone();
    let both = CommandTemplate::try_new("both", move || {
        Probe::new("A", &t)
            .finishing_after(1)
            .along_with(Probe::new("B", &t).finishing_after(3))
            .map(|p| p.with_name("both"))
    })
    .unwrap();

    s.schedule(&both);
    run_ticks(&mut s, 3);

    assert_eq!(trace.of("A"), vec!["init@0", "exec@1", "end@1"]);
    assert_eq!(
        trace.of("B"),
        vec!["init@0", "exec@1", "exec@2", "exec@3", "end@3"]
    );
    assert_eq!(ended(&s.take_events(), "both"), Some((3, EndReason::Finished)));
}

#[test]
fn cancelled_parallel_interrupts_only_running_children() {
    let (mut s, _) = scheduler();
    let trace = Trace::default();
    let t = trace.clone();
    let both = CommandTemplate::try_new("both", move || {
        commands::parallel(vec![
            Probe::new("A", &t).finishing_after(1).boxed(),
            Probe::new("B", &t).boxed(),
        ])
    })
    .unwrap();

    s.schedule(&both);
    s.run();
    s.cancel(&both);

    assert_eq!(trace.of("A"), vec!["init@0", "exec@1", "end@1"]);
    assert_eq!(trace.of("B"), vec!["init@0", "exec@1", "interrupted@1"]);
}

#[test]
fn race_steps_every_child_then_interrupts_the_rest() {
    let (mut s, _) = scheduler();
    let trace = Trace::default();
    let t = trace.clone();
    let race = CommandTemplate::try_new("race", move || {
        Probe::new("A", &t)
            .finishing_after(2)
            .race_with(Probe::new("B", &t))
            .map(|r| r.with_name("race"))
    })
    .unwrap();

    s.schedule(&race);
    run_ticks(&mut s, 2);

    let entries = trace.entries();
    assert_eq!(
        &entries[entries.len() - 4..],
        &["A:exec@2", "A:end@2", "B:exec@2", "B:interrupted@2"]
    );
    assert_eq!(ended(&s.take_events(), "race"), Some((2, EndReason::Finished)));
}

#[test]
fn deadline_follows_its_leader() {
    let (mut s, _) = scheduler();
    let trace = Trace::default();
    let t = trace.clone();
    let group = CommandTemplate::try_new("deadline", move || {
        commands::deadline(
            Probe::new("L", &t).finishing_after(2).boxed(),
            vec![
                Probe::new("O", &t).boxed(),
                Probe::new("Q", &t).finishing_after(1).boxed(),
            ],
        )
    })
    .unwrap();

    s.schedule(&group);
    run_ticks(&mut s, 2);

    assert_eq!(trace.of("Q"), vec!["init@0", "exec@1", "end@1"]);
    assert_eq!(trace.of("L"), vec!["init@0", "exec@1", "exec@2", "end@2"]);
    assert_eq!(trace.of("O"), vec!["init@0", "exec@1", "exec@2", "interrupted@2"]);
    assert!(!s.is_scheduled(&group));
}

#[test]
fn concurrent_groups_reject_shared_requirements() {
    let (mut s, _) = scheduler();
    let arm = s.register_subsystem(Mechanism::new("arm")).unwrap();
    let trace = Trace::default();

    let err = Probe::new("A", &trace)
        .requiring(arm)
        .along_with(Probe::new("B", &trace).requiring(arm))
        .err()
        .unwrap();
    assert!(matches!(err, CompositionError::OverlappingRequirements { .. }));

    let err = commands::deadline(
        Probe::new("L", &trace).requiring(arm).boxed(),
        vec![Probe::new("O", &trace).requiring(arm).boxed()],
    )
    .err()
    .unwrap();
    assert!(err.to_string().contains("deadline"));

    // Sequential members may share.
    assert!(commands::sequence(vec![
        Probe::new("A", &trace).requiring(arm).boxed(),
        Probe::new("B", &trace).requiring(arm).boxed(),
    ])
    .is_ok());
}
