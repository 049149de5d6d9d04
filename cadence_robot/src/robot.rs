//! Composition root: builds the subsystems, the command catalogue, the
//! default commands and the trigger bindings.

use cadence_scheduler::config::{BindingConfig, BindingKind, RobotConfig};
use cadence_scheduler::prelude::*;
use cadence_scheduler::trigger::resolve_bindings;
use tracing::info;

use crate::error::RobotError;
use crate::io::{NOTE_SENSOR, OperatorIo};
use crate::subsystems::{arm, drivetrain, intake};
use crate::subsystems::{Arm, ArmState, Drivetrain, Intake};

/// Ticks the note sensor must stay high before it is announced.
const NOTE_DEBOUNCE_TICKS: u32 = 3;

/// Typed handles of every registered subsystem.
#[derive(Debug, Clone, Copy)]
pub struct Handles {
    pub arm: SubsystemHandle<Arm>,
    pub intake: SubsystemHandle<Intake>,
    pub drivetrain: SubsystemHandle<Drivetrain>,
}

pub struct Robot {
    scheduler: Scheduler,
    io: OperatorIo,
    handles: Handles,
    catalog: CommandCatalog,
}

impl Robot {
    /// Build with the tracing telemetry sink.
    pub fn build(config: &RobotConfig) -> Result<Self, RobotError> {
        Self::build_with(config, Scheduler::from_config(&config.scheduler))
    }

    /// Build on top of a caller-provided scheduler (custom reporter).
    pub fn build_with(config: &RobotConfig, mut scheduler: Scheduler) -> Result<Self, RobotError> {
        let period = scheduler.period();
        let io = OperatorIo::new();

        let handles = Handles {
            arm: scheduler.register_subsystem(Arm::simulated(period))?,
            intake: scheduler.register_subsystem(Intake::simulated(io.button(NOTE_SENSOR)?, period))?,
            drivetrain: scheduler.register_subsystem(Drivetrain::new(period))?,
        };

        let (forward, strafe, turn) = (
            io.axis("driver.left_y")?,
            io.axis("driver.left_x")?,
            io.axis("driver.right_x")?,
        );
        let drive = handles.drivetrain;
        scheduler.set_default_command(
            drive,
            named("drive.robot_centric", move || {
                drivetrain::robot_centric_drive(drive, forward.clone(), strafe.clone(), turn.clone())
            }),
        )?;

        let catalog = catalog(handles)?;

        let rows = if config.bindings.is_empty() {
            default_bindings()
        } else {
            config.bindings.clone()
        };
        scheduler.add_triggers(resolve_bindings(&rows, io.buttons(), &catalog)?);

        let announce = CommandTemplate::new("intake.note_acquired", || {
            commands::print("note acquired")
        });
        scheduler.add_trigger(
            Trigger::new(
                "intake.has_note",
                Condition::from_subsystem(handles.intake, Intake::has_note).debounce(NOTE_DEBOUNCE_TICKS),
            )
            .on_true(&announce),
        );

        info!(
            service = %config.shared.service_name,
            subsystems = scheduler.subsystems().len(),
            commands = catalog.len(),
            bindings = rows.len(),
            "Robot composed"
        );

        Ok(Self {
            scheduler,
            io,
            handles,
            catalog,
        })
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    pub fn scheduler_mut(&mut self) -> &mut Scheduler {
        &mut self.scheduler
    }

    pub fn io(&self) -> &OperatorIo {
        &self.io
    }

    pub fn handles(&self) -> Handles {
        self.handles
    }

    pub fn catalog(&self) -> &CommandCatalog {
        &self.catalog
    }

    /// Announce the start of teleoperated control.
    pub fn teleop_init(&mut self) {
        let hello = CommandTemplate::new("teleop_init", || commands::print("Teleop Started"));
        self.scheduler.schedule(&hello);
    }

    pub fn into_parts(self) -> (Scheduler, OperatorIo) {
        (self.scheduler, self.io)
    }
}

/// Template whose runs carry the template's name.
fn named<C, F>(name: &'static str, factory: F) -> CommandTemplate
where
    C: Command + 'static,
    F: Fn() -> C + 'static,
{
    CommandTemplate::new(name, move || factory().with_name(name))
}

/// Every command the binding table may refer to.
pub fn catalog(handles: Handles) -> Result<CommandCatalog, RobotError> {
    let h = handles;
    let mut catalog = CommandCatalog::new();
    catalog
        .insert(named("arm.zero", move || arm::go_to_state(h.arm, ArmState::Zero)))
        .insert(named("arm.amp", move || arm::go_to_state(h.arm, ArmState::Amp)))
        .insert(named("intake.stow", move || intake::stow(h.intake)))
        .insert(named("intake.handoff", move || intake::handoff(h.intake)))
        .insert(named("intake.ready_handoff", move || intake::ready_handoff(h.intake)))
        .insert(named("intake.start_pickup", move || intake::start_pickup(h.intake)))
        .insert(named("intake.pickup", move || intake::pickup(h.intake)))
        .insert(named("intake.eject", move || intake::eject(h.intake)))
        .insert(named("drive.reset_heading", move || drivetrain::reset_heading(h.drivetrain)));

    // Raise the arm while the intake hands the note over.
    catalog.insert(CommandTemplate::try_new("score.amp", move || {
        arm::go_to_state(h.arm, ArmState::Amp)
            .along_with(intake::handoff(h.intake))
            .map(|group| group.with_name("score.amp"))
    })?);
    Ok(catalog)
}

/// Binding table used when the configuration file has none.
pub fn default_bindings() -> Vec<BindingConfig> {
    let row = |input: &str, on: BindingKind, command: Option<&str>| BindingConfig {
        input: input.to_string(),
        on,
        command: command.map(str::to_string),
    };
    vec![
        row("driver.a", BindingKind::OnTrue, Some("drive.reset_heading")),
        row("driver.start", BindingKind::CancelAllOnTrue, None),
        row("operator.intake", BindingKind::OnTrue, Some("intake.start_pickup")),
        row("operator.intake", BindingKind::OnFalse, Some("intake.stow")),
        row("operator.eject", BindingKind::OnTrue, Some("intake.eject")),
        row("operator.amp", BindingKind::OnTrue, Some("arm.amp")),
        row("operator.zero", BindingKind::OnTrue, Some("arm.zero")),
        row("operator.trigger", BindingKind::OnTrue, Some("score.amp")),
    ]
}
