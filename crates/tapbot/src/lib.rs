mod annotation;
mod command;
mod config;
mod orchestrator;
mod phases;
mod report;
mod sanitize;
mod step;
mod target;
mod types;

pub use annotation::*;
pub use command::*;
pub use config::*;
pub use orchestrator::*;
pub use phases::*;
pub use report::*;
pub use sanitize::*;
pub use step::*;
pub use target::*;
pub use types::*;

pub type Result<T> = std::result::Result<T, Error>;
