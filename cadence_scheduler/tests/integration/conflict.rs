//! Integration test: requirement conflicts, preemption and rejection.

use std::cell::RefCell;
use std::rc::Rc;

use cadence_scheduler::prelude::*;

use super::support::{ended, scheduler, Mechanism, Probe, Trace};

#[test]
fn non_interruptible_holder_rejects_newcomer() {
    let (mut s, reporter) = scheduler();
    let arm = s.register_subsystem(Mechanism::new("arm")).unwrap();
    let trace = Trace::default();
    let (tx, ty) = (trace.clone(), trace.clone());
    let x = CommandTemplate::new("X", move || Probe::new("X", &tx).requiring(arm).non_interruptible());
    let y = CommandTemplate::new("Y", move || Probe::new("Y", &ty).requiring(arm));

    assert!(matches!(s.schedule(&x), ScheduleOutcome::Scheduled(_)));
    assert_eq!(
        s.schedule(&y),
        ScheduleOutcome::Rejected {
            blocked_by: vec!["X".to_string()]
        }
    );
    s.run();

    assert!(s.is_scheduled(&x));
    assert!(!s.is_scheduled(&y));
    assert!(trace.of("Y").is_empty());
    assert_eq!(trace.of("X"), vec!["init@0", "exec@1"]);
    assert!(reporter.contains("Y rejected by X"));
    assert!(s.take_events().iter().any(|e| matches!(
        e,
        SchedulerEvent::Rejected { name, .. } if name == "Y"
    )));
}

#[test]
fn preempted_holder_ends_before_newcomer_initializes() {
    let (mut s, _) = scheduler();
    let arm = s.register_subsystem(Mechanism::new("arm")).unwrap();
    let trace = Trace::default();
    let (tx, ty) = (trace.clone(), trace.clone());
    let x = CommandTemplate::new("X", move || Probe::new("X", &tx).requiring(arm));
    let y = CommandTemplate::new("Y", move || Probe::new("Y", &ty).requiring(arm));

    s.schedule(&x);
    s.run();
    s.schedule(&y);

    assert_eq!(
        trace.entries(),
        vec!["X:init@0", "X:exec@1", "X:interrupted@1", "Y:init@1"]
    );
    assert_eq!(s.claimant_name(arm.id()), Some("Y"));
    assert_eq!(
        ended(&s.take_events(), "X"),
        Some((1, EndReason::Interrupted { by: "Y".into() }))
    );
}

#[test]
fn newcomer_interrupts_every_conflicting_holder() {
    let (mut s, _) = scheduler();
    let arm = s.register_subsystem(Mechanism::new("arm")).unwrap();
    let intake = s.register_subsystem(Mechanism::new("intake")).unwrap();
    let trace = Trace::default();
    let (tx, tz, ty) = (trace.clone(), trace.clone(), trace.clone());
    let x = CommandTemplate::new("X", move || Probe::new("X", &tx).requiring(arm));
    let z = CommandTemplate::new("Z", move || Probe::new("Z", &tz).requiring(intake));
    let y = CommandTemplate::new("Y", move || {
        Probe::new("Y", &ty).requiring(arm.requirements() | intake.requirements())
    });

    s.schedule(&x);
    s.schedule(&z);
    trace.clear();
    s.schedule(&y);

    assert_eq!(
        trace.entries(),
        vec!["X:interrupted@0", "Z:interrupted@0", "Y:init@0"]
    );
    assert_eq!(s.running_names(), vec!["Y"]);
}

#[test]
fn rejection_leaves_every_holder_untouched() {
    let (mut s, _) = scheduler();
    let arm = s.register_subsystem(Mechanism::new("arm")).unwrap();
    let intake = s.register_subsystem(Mechanism::new("intake")).unwrap();
    let trace = Trace::default();
    let (tx, tz, ty) = (trace.clone(), trace.clone(), trace.clone());
    let x = CommandTemplate::new("X", move || Probe::new("X", &tx).requiring(arm).non_interruptible());
    let z = CommandTemplate::new("Z", move || Probe::new("Z", &tz).requiring(intake));
    let y = CommandTemplate::new("Y", move || {
        Probe::new("Y", &ty).requiring(arm.requirements() | intake.requirements())
    });

    s.schedule(&z);
    s.schedule(&x);
    assert!(matches!(s.schedule(&y), ScheduleOutcome::Rejected { .. }));
    assert_eq!(trace.of("Z"), vec!["init@0"]);
    assert_eq!(s.running_names(), vec!["Z", "X"]);
}

#[test]
fn same_tick_requests_resolve_in_registration_order() {
    let (mut s, _) = scheduler();
    let arm = s.register_subsystem(Mechanism::new("arm")).unwrap();
    let trace = Trace::default();
    let (tp, tq) = (trace.clone(), trace.clone());
    let p = CommandTemplate::new("P", move || Probe::new("P", &tp).requiring(arm));
    let q = CommandTemplate::new("Q", move || Probe::new("Q", &tq).requiring(arm));

    let button = Signal::new();
    s.add_trigger(Trigger::new("first", button.clone()).on_true(&p));
    s.add_trigger(Trigger::new("second", button.clone()).on_true(&q));

    button.set(true);
    s.run();

    assert_eq!(s.claimant_name(arm.id()), Some("Q"));
    assert_eq!(
        trace.entries(),
        vec!["P:init@1", "P:interrupted@1", "Q:init@1", "Q:exec@1"]
    );
}

#[test]
fn rescheduling_a_running_template_is_a_no_op() {
    let (mut s, _) = scheduler();
    let trace = Trace::default();
    let t = trace.clone();
    let hold = CommandTemplate::new("hold", move || Probe::new("hold", &t));

    let ScheduleOutcome::Scheduled(run) = s.schedule(&hold) else {
        panic!("expected a fresh run");
    };
    s.run();
    assert_eq!(s.schedule(&hold.clone()), ScheduleOutcome::AlreadyRunning(run));
    assert_eq!(trace.of("hold"), vec!["init@0", "exec@1"]);
}

/// Holds a fixed set of subsystems and records overlapping occupancy.
struct Occupant {
    name: String,
    requirements: Requirements,
    ticks: u32,
    executed: u32,
    occupancy: Rc<RefCell<Vec<u32>>>,
    violations: Rc<RefCell<u32>>,
}

impl Command for Occupant {
    fn name(&self) -> &str {
        &self.name
    }

    fn requirements(&self) -> Requirements {
        self.requirements
    }

    fn initialize(&mut self, _ctx: &mut CommandContext<'_>) -> Result<(), CommandFault> {
        self.executed = 0;
        let mut occupancy = self.occupancy.borrow_mut();
        for id in self.requirements.ids() {
            occupancy[id.index()] += 1;
            if occupancy[id.index()] > 1 {
                *self.violations.borrow_mut() += 1;
            }
        }
        Ok(())
    }

    fn execute(&mut self, _ctx: &mut CommandContext<'_>) -> Result<(), CommandFault> {
        self.executed += 1;
        Ok(())
    }

    fn is_finished(&self, _ctx: &CommandContext<'_>) -> bool {
        self.executed >= self.ticks
    }

    fn end(&mut self, _ctx: &mut CommandContext<'_>, _interrupted: bool) -> Result<(), CommandFault> {
        let mut occupancy = self.occupancy.borrow_mut();
        for id in self.requirements.ids() {
            occupancy[id.index()] -= 1;
        }
        Ok(())
    }
}

#[test]
fn no_subsystem_is_ever_held_twice() {
    let (mut s, _) = scheduler();
    let handles: Vec<Requirements> = ["a", "b", "c"]
        .into_iter()
        .map(|n| s.register_subsystem(Mechanism::new(n)).unwrap().requirements())
        .collect();
    let occupancy = Rc::new(RefCell::new(vec![0u32; 3]));
    let violations = Rc::new(RefCell::new(0u32));

    // (requirements, ticks, non-interruptible)
    let shapes = [
        (handles[0], 3, false),
        (handles[0] | handles[1], 2, false),
        (handles[1] | handles[2], 5, true),
        (handles[2], 1, false),
        (handles[0] | handles[2], 4, false),
    ];
    let templates: Vec<CommandTemplate> = shapes
        .iter()
        .enumerate()
        .map(|(i, &(requirements, ticks, pinned))| {
            let occupancy = occupancy.clone();
            let violations = violations.clone();
            let name = format!("cmd{i}");
            CommandTemplate::new(name.clone(), move || {
                let cmd = Occupant {
                    name: name.clone(),
                    requirements,
                    ticks,
                    executed: 0,
                    occupancy: occupancy.clone(),
                    violations: violations.clone(),
                };
                let behavior = if pinned {
                    InterruptionBehavior::CancelIncoming
                } else {
                    InterruptionBehavior::CancelSelf
                };
                cmd.with_interrupt_behavior(behavior)
            })
        })
        .collect();

    for tick in 0..300usize {
        let first = &templates[(tick * 7) % templates.len()];
        let second = &templates[(tick * 3 + 1) % templates.len()];
        s.schedule(first);
        s.schedule(second);
        if tick % 11 == 0 {
            s.cancel_all();
        }
        s.run();
    }

    assert_eq!(*violations.borrow(), 0);
    s.cancel_all();
    assert_eq!(*occupancy.borrow(), vec![0, 0, 0]);
}
