pub mod cli;
pub mod cli_handlers;
pub mod config;
pub mod core;
pub mod db;
pub mod error;
pub mod models;
pub mod resolver;

pub use config::{ConnectionConfig, InstanceInfo, ServiceConfig};
pub use crate::core::TaskStore;
pub use error::{ErrorKind, Result, TaskError};
pub use models::*;
pub use resolver::{ConnectionMethod, ResolvedTarget, resolve};
