pub mod common;
pub mod domain;
pub mod locations;
pub mod storage;

#[cfg(feature = "db")]
pub mod database;

pub use common::error::{CoreError, Result};
