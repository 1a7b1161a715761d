//! Service controller: drives the host init system through restarts with a
//! bounded grace period, recording an undo log for the orchestrator's
//! rollback path (spec §4.4).

mod clock;
mod controller;
mod error;
mod init_system;

pub use clock::{Clock, FakeClock, SystemClock};
pub use controller::{GracePeriod, ServiceController};
pub use error::ControllerError;
pub use init_system::{FakeInitSystem, InitSystem, SysvInitSystem};
