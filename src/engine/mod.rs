// Encode planning engine

pub mod core;
pub mod crop;
pub mod probe;
pub mod runner;

pub use core::*;
