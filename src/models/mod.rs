//! Request and response models

pub mod input;
pub mod prediction;
pub mod weather;

pub use input::*;
pub use prediction::*;
pub use weather::*;
