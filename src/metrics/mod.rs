//! Position metrics
//!
//! Fee fallback, fee-only APR, impermanent-loss attachment and the
//! recommendation bands derived from net effective return.

pub mod classifier;
pub mod fees;
pub mod il;
pub mod yield_calc;

pub use classifier::classify;
pub use fees::{FeeEstimator, DEFAULT_FEE_RATE};
pub use il::{attach_il, decode_il, IlBook};
pub use yield_calc::{apr, apr_from};
