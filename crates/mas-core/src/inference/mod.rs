//! Exact inference over the assembled network.
//!
//! `factor` holds the discrete-factor algebra, `eliminate` the
//! variable-elimination routine, and `adapter` the request-facing
//! layer that completes partial evidence from fallback priors and
//! shapes the posterior into an [`InferenceResult`].

pub mod adapter;
pub mod eliminate;
pub mod factor;

pub use adapter::{InferenceAdapter, InferenceResult};
pub use eliminate::query_posterior;
pub use factor::Factor;
