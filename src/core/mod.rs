pub mod command;
pub mod launcher;
pub mod registry;

pub use crate::domain::model::LaunchSpec;
pub use crate::domain::ports::ProcessRunner;
pub use crate::utils::error::Result;
