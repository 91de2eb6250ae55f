//! Functional units owned by the core.

/// Direct-mapped cache of decoded fetch results.
pub mod icache;

pub use icache::ICache;
