mod actor;
mod command;
#[allow(clippy::module_inception)]
mod registry;

pub use actor::RegistryActor;
pub use command::RegistryCommand;
pub use registry::{JoinOutcome, RoomRegistry};
