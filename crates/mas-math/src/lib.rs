//! MAS surveillance math utilities.

pub mod math;

pub use math::entropy::*;
pub use math::prob::*;
pub use math::radix::*;
