pub mod config;
pub mod controller;
pub mod error;
pub mod inference;
pub mod view;

pub use error::{Error, Result};
