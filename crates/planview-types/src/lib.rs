pub mod domain;
pub mod error;
pub mod tree;

pub use domain::*;
pub use error::{Error, Result};
pub use tree::*;
