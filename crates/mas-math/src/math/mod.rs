//! Core math modules.

pub mod entropy;
pub mod prob;
pub mod radix;
