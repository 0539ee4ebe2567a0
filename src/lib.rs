#[macro_use]
extern crate serde_derive;

pub mod definition;
pub mod error;
pub mod gwm;
pub mod protocols;

pub use self::error::{Error, Result};
