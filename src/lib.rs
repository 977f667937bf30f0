pub mod canvas;
pub mod config;
pub mod domain;
pub mod error;
pub mod imaging;
pub mod render;
pub mod session;
pub mod submit;

pub use error::{PatchError, Result};
