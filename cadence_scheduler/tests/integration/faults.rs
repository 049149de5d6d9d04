//! Integration test: callback faults are contained at the command.

use cadence_scheduler::prelude::*;

use super::support::{ended, scheduler, Mechanism, Phase, Probe, Trace};

#[test]
fn execute_fault_ends_only_that_command() {
    let (mut s, reporter) = scheduler();
    let trace = Trace::default();
    let (tf, tg) = (trace.clone(), trace.clone());
    let f = CommandTemplate::new("F", move || Probe::new("F", &tf).faulting_in(Phase::Execute));
    let g = CommandTemplate::new("G", move || Probe::new("G", &tg).finishing_after(2));

    s.schedule(&f);
    s.schedule(&g);
    s.run();
    s.run();

    assert_eq!(trace.of("F"), vec!["init@0", "exec@1", "interrupted@1"]);
    assert_eq!(trace.of("G"), vec!["init@0", "exec@1", "exec@2", "end@2"]);
    assert_eq!(
        ended(&s.take_events(), "F"),
        Some((
            1,
            EndReason::Faulted(CommandFault::failed("F broke in Execute"))
        ))
    );
    assert!(reporter.contains("F faulted: F broke in Execute"));
}

#[test]
fn initialize_fault_releases_claims() {
    let (mut s, _) = scheduler();
    let arm = s.register_subsystem(Mechanism::new("arm")).unwrap();
    let trace = Trace::default();
    let t = trace.clone();
    let f = CommandTemplate::new("F", move || {
        Probe::new("F", &t).requiring(arm).faulting_in(Phase::Init)
    });

    let outcome = s.schedule(&f);
    assert!(matches!(outcome, ScheduleOutcome::Faulted { .. }));
    assert_eq!(trace.of("F"), vec!["init@0", "interrupted@0"]);
    assert!(!s.is_scheduled(&f));
    assert_eq!(s.claimant(arm.id()), None);
}

#[test]
fn end_fault_turns_a_natural_finish_into_a_fault() {
    let (mut s, _) = scheduler();
    let trace = Trace::default();
    let t = trace.clone();
    let f = CommandTemplate::new("F", move || {
        Probe::new("F", &t).finishing_after(1).faulting_in(Phase::End)
    });

    s.schedule(&f);
    s.run();
    assert!(!s.is_scheduled(&f));
    assert!(matches!(
        ended(&s.take_events(), "F"),
        Some((1, EndReason::Faulted(_)))
    ));
}

#[test]
fn mutating_an_unclaimed_subsystem_faults() {
    let (mut s, _) = scheduler();
    let arm = s.register_subsystem(Mechanism::new("arm")).unwrap();
    let sneak = CommandTemplate::new("sneak", move || {
        commands::run_once("sneak", Requirements::empty(), move |ctx| {
            ctx.subsystem_mut(arm)?.set_goal(5);
            Ok(())
        })
    });

    let outcome = s.schedule(&sneak);
    assert!(matches!(
        outcome,
        ScheduleOutcome::Faulted {
            fault: CommandFault::NotClaimed(id),
            ..
        } if id == arm.id()
    ));
    assert_eq!(s.subsystem(arm).unwrap().goal(), 0);
}

#[test]
fn fault_inside_a_group_interrupts_the_group() {
    let (mut s, _) = scheduler();
    let trace = Trace::default();
    let t = trace.clone();
    let group = CommandTemplate::try_new("group", move || {
        commands::sequence(vec![
            Probe::new("A", &t).faulting_in(Phase::Execute).boxed(),
            Probe::new("B", &t).boxed(),
        ])
    })
    .unwrap();

    s.schedule(&group);
    s.run();
    s.run();

    assert_eq!(trace.of("A"), vec!["init@0", "exec@1", "interrupted@1"]);
    assert!(trace.of("B").is_empty());
    assert!(!s.is_scheduled(&group));
    assert_eq!(s.clock().tick, 2);
}

#[test]
fn end_fault_in_a_sequence_never_ends_the_next_child() {
    let (mut s, _) = scheduler();
    let trace = Trace::default();
    let t = trace.clone();
    let group = CommandTemplate::try_new("group", move || {
        commands::sequence(vec![
            Probe::new("A", &t)
                .finishing_after(1)
                .faulting_in(Phase::End)
                .boxed(),
            Probe::new("B", &t).boxed(),
        ])
        .map(|seq| seq.with_name("group"))
    })
    .unwrap();

    s.schedule(&group);
    s.run();

    assert_eq!(trace.of("A"), vec!["init@0", "exec@1", "end@1"]);
    assert!(trace.of("B").is_empty());
    assert!(!s.is_scheduled(&group));
    assert!(matches!(
        ended(&s.take_events(), "group"),
        Some((1, EndReason::Faulted(_)))
    ));
}
