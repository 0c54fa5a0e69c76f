pub mod callable;
pub mod error;
pub mod lookup;
pub mod patch;
