//! Cooperative, run-to-completion task scheduler.
//!
//! Tasks are registered once through [`SchedulerBuilder`]; the order of
//! registration is the order of both `init` and `tick`. The process driver
//! calls [`Scheduler::run_setup`] once and [`Scheduler::run_loop`] forever.

use heapless::Vec;

/// Start-up fault reported by a task. Always fatal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(target_arch = "arm", derive(defmt::Format))]
pub enum Fault {
    /// Sensor did not acknowledge start-up (wiring or hardware).
    SensorNotResponding,
    /// Sensor answered but rejected its configuration.
    SensorConfig,
    /// Display controller could not be brought up.
    Display,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(target_arch = "arm", derive(defmt::Format))]
pub enum SchedulerError {
    /// More tasks registered than the registry can hold.
    RegistryFull,
    /// `run_loop` called before a successful `run_setup`.
    NotInitialized,
    SetupFailed { task: &'static str, fault: Fault },
}

pub trait Task {
    fn name(&self) -> &'static str;

    /// One-time start-up, before any task ticks.
    fn init(&mut self) -> Result<(), Fault>;

    /// One unit of work. Must return promptly and never block indefinitely.
    fn tick(&mut self);
}

pub struct SchedulerBuilder<'a, const N: usize> {
    tasks: Vec<&'a mut (dyn Task + 'a), N>,
}

impl<'a, const N: usize> SchedulerBuilder<'a, N> {
    pub fn register(mut self, task: &'a mut (dyn Task + 'a)) -> Result<Self, SchedulerError> {
        self.tasks
            .push(task)
            .map_err(|_| SchedulerError::RegistryFull)?;
        Ok(self)
    }

    pub fn build(self) -> Scheduler<'a, N> {
        Scheduler {
            tasks: self.tasks,
            started: 0,
        }
    }
}

pub struct Scheduler<'a, const N: usize> {
    tasks: Vec<&'a mut (dyn Task + 'a), N>,
    /// Tasks whose `init` has succeeded, a prefix of the registry.
    started: usize,
}

impl<'a, const N: usize> Scheduler<'a, N> {
    pub fn builder() -> SchedulerBuilder<'a, N> {
        SchedulerBuilder { tasks: Vec::new() }
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn is_ready(&self) -> bool {
        self.started == self.tasks.len()
    }

    /// Initialise every task in registration order. Stops at the first
    /// fault; later tasks are left uninitialised. A repeated call resumes
    /// at the task that failed, so no task is initialised twice.
    pub fn run_setup(&mut self) -> Result<(), SchedulerError> {
        for task in self.tasks.iter_mut().skip(self.started) {
            let name = task.name();
            if let Err(fault) = task.init() {
                log_error!("task {} failed to start: {}", name, fault);
                return Err(SchedulerError::SetupFailed { task: name, fault });
            }
            log_info!("task {} ready", name);
            self.started += 1;
        }
        Ok(())
    }

    /// Tick every task once, in registration order.
    pub fn run_loop(&mut self) -> Result<(), SchedulerError> {
        if !self.is_ready() {
            return Err(SchedulerError::NotInitialized);
        }

        for task in self.tasks.iter_mut() {
            task.tick();
        }
        Ok(())
    }
}
