//! Integration test: timeout and end-condition decorators.

use std::cell::Cell;
use std::rc::Rc;
use std::time::Duration;

use cadence_scheduler::prelude::*;

use super::support::{ended, run_ticks, scheduler, Probe, Trace};

#[test]
fn expired_timeout_interrupts_the_command() {
    let (mut s, _) = scheduler();
    let trace = Trace::default();
    let t = trace.clone();
    let p = CommandTemplate::new("P", move || {
        Probe::new("P", &t)
            .with_timeout(Duration::from_millis(60))
            .with_name("P")
    });

    s.schedule(&p);
    run_ticks(&mut s, 2);
    assert!(s.is_scheduled(&p));
    s.run();

    assert_eq!(
        trace.of("P"),
        vec!["init@0", "exec@1", "exec@2", "exec@3", "interrupted@3"]
    );
    assert_eq!(ended(&s.take_events(), "P"), Some((3, EndReason::TimedOut)));
}

#[test]
fn one_period_timeout_expires_on_the_first_tick() {
    let (mut s, _) = scheduler();
    let trace = Trace::default();
    let t = trace.clone();
    let p = CommandTemplate::new("P", move || {
        Probe::new("P", &t).with_timeout(Duration::from_millis(20))
    });

    s.schedule(&p);
    s.run();
    assert_eq!(trace.of("P"), vec!["init@0", "exec@1", "interrupted@1"]);
}

#[test]
fn command_finishing_before_its_deadline_ends_normally() {
    let (mut s, _) = scheduler();
    let trace = Trace::default();
    let t = trace.clone();
    let p = CommandTemplate::new("P", move || {
        Probe::new("P", &t)
            .finishing_after(1)
            .with_timeout(Duration::from_millis(20))
            .with_name("P")
    });

    s.schedule(&p);
    s.run();
    assert_eq!(trace.of("P"), vec!["init@0", "exec@1", "end@1"]);
    assert_eq!(ended(&s.take_events(), "P"), Some((1, EndReason::Finished)));
}

#[test]
fn timeout_inside_a_sequence_advances_to_the_next_child() {
    let (mut s, _) = scheduler();
    let trace = Trace::default();
    let t = trace.clone();
    let seq = CommandTemplate::try_new("seq", move || {
        commands::sequence(vec![
            Probe::new("P", &t)
                .with_timeout(Duration::from_millis(40))
                .boxed(),
            Probe::new("Q", &t).finishing_after(1).boxed(),
        ])
        .map(|seq| seq.with_name("seq"))
    })
    .unwrap();

    s.schedule(&seq);
    run_ticks(&mut s, 3);

    assert_eq!(trace.of("P"), vec!["init@0", "exec@1", "exec@2", "interrupted@2"]);
    assert_eq!(trace.of("Q"), vec!["init@2", "exec@3", "end@3"]);
    assert_eq!(ended(&s.take_events(), "seq"), Some((3, EndReason::Finished)));
}

#[test]
fn until_condition_ends_the_inner_command_as_interrupted() {
    let (mut s, _) = scheduler();
    let trace = Trace::default();
    let t = trace.clone();
    let stop = Signal::new();
    let flag = stop.clone();
    let p = CommandTemplate::new("P", move || {
        let flag = flag.clone();
        Probe::new("P", &t).until(move |_| flag.get()).with_name("P")
    });

    s.schedule(&p);
    run_ticks(&mut s, 2);
    stop.set(true);
    s.run();

    assert_eq!(
        trace.of("P"),
        vec!["init@0", "exec@1", "exec@2", "exec@3", "interrupted@3"]
    );
    assert_eq!(ended(&s.take_events(), "P"), Some((3, EndReason::Finished)));
}

#[test]
fn finally_hook_sees_timeout_as_interruption() {
    let (mut s, _) = scheduler();
    let trace = Trace::default();
    let t = trace.clone();
    let seen = Rc::new(Cell::new(None));
    let sink = seen.clone();
    let p = CommandTemplate::new("P", move || {
        let sink = sink.clone();
        Probe::new("P", &t)
            .with_timeout(Duration::from_millis(20))
            .finally_do(move |_, interrupted| {
                sink.set(Some(interrupted));
                Ok(())
            })
    });

    s.schedule(&p);
    s.run();
    assert_eq!(seen.get(), Some(true));
}

#[test]
fn wait_finishes_after_its_duration() {
    let (mut s, _) = scheduler();
    let wait = CommandTemplate::new("wait", || commands::wait(Duration::from_millis(100)));
    s.schedule(&wait);
    run_ticks(&mut s, 4);
    assert!(s.is_scheduled(&wait));
    s.run();
    assert!(!s.is_scheduled(&wait));
}
