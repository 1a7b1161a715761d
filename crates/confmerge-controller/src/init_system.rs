use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use confmerge_model::ServiceState;
use confmerge_utils::subprocess::{ChildCommand, StdioMode};

use crate::error::ControllerError;

/// Adapter over whatever init system manages services on the host. The
/// controller drives services exclusively through this trait so it can be
/// tested against [`FakeInitSystem`] without ever shelling out.
pub trait InitSystem {
    fn status(&self, service: &str) -> Result<ServiceState, ControllerError>;
    fn start(&self, service: &str) -> Result<(), ControllerError>;
    fn stop(&self, service: &str) -> Result<(), ControllerError>;
    fn restart(&self, service: &str) -> Result<(), ControllerError>;
}

/// Drives SysV-style `/etc/init.d/<service> <verb>` scripts, the
/// conventional init system on embedded routers.
pub struct SysvInitSystem {
    init_d_dir: std::path::PathBuf,
    timeout: Duration,
}

impl SysvInitSystem {
    pub fn new(init_d_dir: impl Into<std::path::PathBuf>, timeout: Duration) -> Self {
        Self {
            init_d_dir: init_d_dir.into(),
            timeout,
        }
    }

    fn script(&self, service: &str) -> std::path::PathBuf {
        self.init_d_dir.join(service)
    }

    fn invoke(&self, service: &str, verb: &str) -> Result<confmerge_utils::subprocess::CommandResult, ControllerError> {
        ChildCommand::new(self.script(service))
            .arg(verb)
            .stdout(StdioMode::Pipe)
            .stderr(StdioMode::Pipe)
            .timeout(self.timeout)
            .run()
            .map_err(|source| ControllerError::Invocation {
                service: service.to_string(),
                source,
            })
    }
}

impl InitSystem for SysvInitSystem {
    fn status(&self, service: &str) -> Result<ServiceState, ControllerError> {
        let result = self.invoke(service, "status")?;
        if !result.success() {
            return Ok(ServiceState::Unknown);
        }
        let stdout = String::from_utf8_lossy(&result.stdout).to_ascii_lowercase();
        if stdout.contains("running") {
            Ok(ServiceState::Running)
        } else if stdout.contains("stopped") || stdout.contains("inactive") {
            Ok(ServiceState::Stopped)
        } else {
            Ok(ServiceState::Unknown)
        }
    }

    fn start(&self, service: &str) -> Result<(), ControllerError> {
        self.invoke(service, "start").map(|_| ())
    }

    fn stop(&self, service: &str) -> Result<(), ControllerError> {
        self.invoke(service, "stop").map(|_| ())
    }

    fn restart(&self, service: &str) -> Result<(), ControllerError> {
        self.invoke(service, "restart").map(|_| ())
    }
}

/// In-memory state machine standing in for a real init system, so the
/// controller and the orchestrator above it can be tested without running
/// subprocesses at all.
#[derive(Default)]
pub struct FakeInitSystem {
    states: Mutex<HashMap<String, ServiceState>>,
    /// Services named here fail every verb invoked against them, to exercise
    /// the controller's error and rollback paths.
    failing: Mutex<Vec<String>>,
}

impl FakeInitSystem {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seed(&self, service: &str, state: ServiceState) {
        self.states.lock().unwrap().insert(service.to_string(), state);
    }

    pub fn fail(&self, service: &str) {
        self.failing.lock().unwrap().push(service.to_string());
    }

    fn check_failing(&self, service: &str) -> Result<(), ControllerError> {
        if self.failing.lock().unwrap().iter().any(|s| s == service) {
            return Err(ControllerError::Invocation {
                service: service.to_string(),
                source: confmerge_utils::UtilError::Subprocess {
                    command: format!("fake-init {service}"),
                    source: std::io::Error::other("simulated failure"),
                },
            });
        }
        Ok(())
    }
}

impl InitSystem for FakeInitSystem {
    fn status(&self, service: &str) -> Result<ServiceState, ControllerError> {
        Ok(*self.states.lock().unwrap().get(service).unwrap_or(&ServiceState::Unknown))
    }

    fn start(&self, service: &str) -> Result<(), ControllerError> {
        self.check_failing(service)?;
        self.states.lock().unwrap().insert(service.to_string(), ServiceState::Running);
        Ok(())
    }

    fn stop(&self, service: &str) -> Result<(), ControllerError> {
        self.check_failing(service)?;
        self.states.lock().unwrap().insert(service.to_string(), ServiceState::Stopped);
        Ok(())
    }

    fn restart(&self, service: &str) -> Result<(), ControllerError> {
        self.check_failing(service)?;
        self.states.lock().unwrap().insert(service.to_string(), ServiceState::Running);
        Ok(())
    }
}
