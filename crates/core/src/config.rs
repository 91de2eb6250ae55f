//! Configuration system for the simulator core.
//!
//! All recognized options are runtime values — one binary supports every
//! mode:
//! 1. **Defaults:** Baseline constants for the core, cache, and host loop.
//! 2. **Structures:** Hierarchical config for core flags, instruction
//!    cache geometry, and the cooperative host driver.
//!
//! Configuration is supplied as JSON (`Config::from_json`) or built in
//! code with `Config::default()`.

use serde::Deserialize;

use crate::common::error::ConfigError;

/// Default configuration constants.
mod defaults {
    /// Initial program counter: base of main RAM in the usual RISC-V
    /// physical memory map.
    pub const START_PC: u64 = 0x8000_0000;

    /// Lines in the decoded-instruction cache (power of two).
    pub const ICACHE_ENTRIES: usize = crate::common::constants::ICACHE_ENTRIES;

    /// Instructions each core runs before the driver rotates to the next.
    pub const INTERLEAVE: u64 = 5000;

    /// Retired instructions per real-time-clock tick (10 MHz clock for a
    /// 1 BIPS core).
    pub const INSNS_PER_RTC_TICK: u64 = 100;

    /// Number of harts the driver instantiates.
    pub const HARTS: usize = 1;
}

/// Root configuration structure.
///
/// # Examples
///
/// ```
/// use rvfsim_core::config::Config;
///
/// let config = Config::default();
/// assert_eq!(config.core.instrumented, false);
/// assert_eq!(config.icache.entries, 1024);
/// ```
///
/// Deserializing from JSON:
///
/// ```
/// use rvfsim_core::config::Config;
///
/// let json = r#"{
///     "core": {
///         "start_pc": 2147483648,
///         "instrumented": true,
///         "commit_log": true,
///         "histogram": false
///     },
///     "icache": { "entries": 256 },
///     "host": { "harts": 2, "interleave": 1000 }
/// }"#;
///
/// let config = Config::from_json(json).unwrap();
/// assert!(config.core.instrumented);
/// assert_eq!(config.icache.entries, 256);
/// assert_eq!(config.host.harts, 2);
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Core execution flags and reset state.
    #[serde(default)]
    pub core: CoreConfig,
    /// Decoded-instruction cache geometry.
    #[serde(default)]
    pub icache: IcacheConfig,
    /// Cooperative multi-core host loop parameters.
    #[serde(default)]
    pub host: HostConfig,
}

impl Config {
    /// Parses and validates a JSON configuration.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks cross-field invariants the type system cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.icache.entries.is_power_of_two() {
            return Err(ConfigError::BadIcacheGeometry(self.icache.entries));
        }
        if self.host.interleave == 0 {
            return Err(ConfigError::ZeroInterleave);
        }
        Ok(())
    }
}

/// Core execution flags and reset state.
#[derive(Debug, Clone, Deserialize)]
pub struct CoreConfig {
    /// Initial program counter.
    #[serde(default = "CoreConfig::default_start_pc")]
    pub start_pc: u64,

    /// Run the instrumented (trace) path instead of the fast path.
    /// Read at the top of each batch.
    #[serde(default)]
    pub instrumented: bool,

    /// Emit one commit-log line per retired instruction.
    #[serde(default)]
    pub commit_log: bool,

    /// Maintain the per-pc execution histogram.
    #[serde(default)]
    pub histogram: bool,
}

impl CoreConfig {
    fn default_start_pc() -> u64 {
        defaults::START_PC
    }
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            start_pc: defaults::START_PC,
            instrumented: false,
            commit_log: false,
            histogram: false,
        }
    }
}

/// Decoded-instruction cache geometry.
#[derive(Debug, Clone, Deserialize)]
pub struct IcacheConfig {
    /// Number of cache lines; must be a nonzero power of two.
    #[serde(default = "IcacheConfig::default_entries")]
    pub entries: usize,
}

impl IcacheConfig {
    fn default_entries() -> usize {
        defaults::ICACHE_ENTRIES
    }
}

impl Default for IcacheConfig {
    fn default() -> Self {
        Self {
            entries: defaults::ICACHE_ENTRIES,
        }
    }
}

/// Cooperative multi-core host loop parameters.
#[derive(Debug, Clone, Deserialize)]
pub struct HostConfig {
    /// Number of harts the driver instantiates.
    #[serde(default = "HostConfig::default_harts")]
    pub harts: usize,

    /// Instructions each core runs before the driver rotates to the next.
    #[serde(default = "HostConfig::default_interleave")]
    pub interleave: u64,

    /// Retired instructions per real-time-clock tick.
    #[serde(default = "HostConfig::default_insns_per_rtc_tick")]
    pub insns_per_rtc_tick: u64,
}

impl HostConfig {
    fn default_harts() -> usize {
        defaults::HARTS
    }

    fn default_interleave() -> u64 {
        defaults::INTERLEAVE
    }

    fn default_insns_per_rtc_tick() -> u64 {
        defaults::INSNS_PER_RTC_TICK
    }
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            harts: defaults::HARTS,
            interleave: defaults::INTERLEAVE,
            insns_per_rtc_tick: defaults::INSNS_PER_RTC_TICK,
        }
    }
}
