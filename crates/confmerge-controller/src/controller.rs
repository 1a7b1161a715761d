use std::time::Duration;

use confmerge_model::{ServiceOp, ServiceOutcome, ServiceState};
use log::{debug, warn};

use crate::clock::Clock;
use crate::error::ControllerError;
use crate::init_system::InitSystem;

/// How long to keep polling `status` after a restart before giving up.
#[derive(Debug, Clone, Copy)]
pub struct GracePeriod {
    pub timeout: Duration,
    pub poll_interval: Duration,
}

impl Default for GracePeriod {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            poll_interval: Duration::from_millis(200),
        }
    }
}

/// Drives one service's lifecycle through an [`InitSystem`], recording every
/// transition to an undo log the orchestrator can replay in reverse on
/// rollback (spec §4.4, §4.5).
pub struct ServiceController<'a, I: InitSystem, C: Clock> {
    init: &'a I,
    clock: &'a C,
    grace: GracePeriod,
    undo_log: Vec<ServiceOp>,
}

impl<'a, I: InitSystem, C: Clock> ServiceController<'a, I, C> {
    pub fn new(init: &'a I, clock: &'a C, grace: GracePeriod) -> Self {
        Self {
            init,
            clock,
            grace,
            undo_log: Vec::new(),
        }
    }

    /// Report `service`'s current state without recording an undo-log entry
    /// (a read, not a transition).
    pub fn status(&self, service: &str) -> Result<ServiceState, ControllerError> {
        self.init.status(service)
    }

    /// Start `service`, polling until it reports `Running` or the grace
    /// period elapses. Idempotent: a service already `Running` is left
    /// alone and reported as a trivial success, per spec §4.4.
    pub fn start(&mut self, service: &str) -> Result<ServiceOp, ControllerError> {
        let from_state = self.init.status(service)?;
        if from_state == ServiceState::Running {
            debug!("{service} already running, start is a no-op");
            let op = ServiceOp {
                service: service.to_string(),
                from_state,
                to_state: ServiceState::Running,
                outcome: ServiceOutcome::Ok,
            };
            self.undo_log.push(op.clone());
            return Ok(op);
        }

        let op = match self.init.start(service) {
            Err(e) => {
                warn!("start invocation failed for {service}: {e}");
                ServiceOp {
                    service: service.to_string(),
                    from_state,
                    to_state: ServiceState::Unknown,
                    outcome: ServiceOutcome::Err(e.to_string()),
                }
            }
            Ok(()) => match self.wait_for_running(service) {
                Ok(()) => ServiceOp {
                    service: service.to_string(),
                    from_state,
                    to_state: ServiceState::Running,
                    outcome: ServiceOutcome::Ok,
                },
                Err(e) => ServiceOp {
                    service: service.to_string(),
                    from_state,
                    to_state: ServiceState::Unknown,
                    outcome: ServiceOutcome::Err(e.to_string()),
                },
            },
        };

        self.undo_log.push(op.clone());
        Ok(op)
    }

    /// Stop `service`. Symmetric with [`Self::start`]: records the
    /// transition whether or not it succeeded.
    pub fn stop(&mut self, service: &str) -> Result<ServiceOp, ControllerError> {
        let from_state = self.init.status(service)?;
        let op = match self.init.stop(service) {
            Err(e) => {
                warn!("stop invocation failed for {service}: {e}");
                ServiceOp {
                    service: service.to_string(),
                    from_state,
                    to_state: ServiceState::Unknown,
                    outcome: ServiceOutcome::Err(e.to_string()),
                }
            }
            Ok(()) => ServiceOp {
                service: service.to_string(),
                from_state,
                to_state: ServiceState::Stopped,
                outcome: ServiceOutcome::Ok,
            },
        };
        self.undo_log.push(op.clone());
        Ok(op)
    }

    /// Restart `service` and poll its status until it reports `Running` or
    /// the grace period elapses. Always records a [`ServiceOp`], whether the
    /// restart ultimately succeeded or not.
    pub fn restart(&mut self, service: &str) -> Result<ServiceOp, ControllerError> {
        let from_state = self.init.status(service)?;
        debug!("restarting {service} (was {from_state})");

        let op = match self.init.restart(service) {
            Err(e) => {
                warn!("restart invocation failed for {service}: {e}");
                ServiceOp {
                    service: service.to_string(),
                    from_state,
                    to_state: ServiceState::Unknown,
                    outcome: ServiceOutcome::Err(e.to_string()),
                }
            }
            Ok(()) => match self.wait_for_running(service) {
                Ok(()) => ServiceOp {
                    service: service.to_string(),
                    from_state,
                    to_state: ServiceState::Running,
                    outcome: ServiceOutcome::Ok,
                },
                Err(e) => ServiceOp {
                    service: service.to_string(),
                    from_state,
                    to_state: ServiceState::Unknown,
                    outcome: ServiceOutcome::Err(e.to_string()),
                },
            },
        };

        self.undo_log.push(op.clone());
        Ok(op)
    }

    fn wait_for_running(&self, service: &str) -> Result<(), ControllerError> {
        let started = self.grace.timeout;
        let mut waited = Duration::ZERO;
        loop {
            if self.init.status(service)? == ServiceState::Running {
                return Ok(());
            }
            if waited >= started {
                return Err(ControllerError::GracePeriodExceeded {
                    service: service.to_string(),
                    expected: ServiceState::Running.to_string(),
                });
            }
            self.clock.sleep(self.grace.poll_interval);
            waited += self.grace.poll_interval;
        }
    }

    /// Undo every recorded operation in reverse order, restarting services
    /// back toward their pre-transaction state. Best-effort: failures are
    /// recorded but do not stop the unwind from continuing.
    pub fn rollback(&mut self) -> Vec<ServiceOp> {
        let mut results = Vec::new();
        for op in self.undo_log.drain(..).rev() {
            let outcome = match op.from_state {
                ServiceState::Running => self.init.restart(&op.service),
                ServiceState::Stopped => self.init.stop(&op.service),
                ServiceState::Unknown => Ok(()),
            };
            results.push(ServiceOp {
                service: op.service.clone(),
                from_state: op.to_state,
                to_state: op.from_state,
                outcome: match outcome {
                    Ok(()) => ServiceOutcome::Ok,
                    Err(e) => ServiceOutcome::Err(e.to_string()),
                },
            });
        }
        results
    }

    pub fn undo_log(&self) -> &[ServiceOp] {
        &self.undo_log
    }
}
