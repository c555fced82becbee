//! Search configuration: grid size, tape size, step budgets and the hang
//! sample period (`spec.md` §6).

use anyhow::{ensure, Result};

/// Parameters that fully determine one search run. Validated once at
/// construction so downstream code can assume the invariants hold.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SearchConfig {
    pub width: u8,
    pub height: u8,
    pub data_size: usize,
    pub max_steps_per_run: u32,
    pub max_steps_total: u64,
    pub hang_sample_period: usize,
}

impl SearchConfig {
    /// Defaults mirroring the original project's 7x7 search (`Consts.h`):
    /// `dataSize = 16384`, `maxSteps = dataSize * 4`, sample period `256`.
    pub const DEFAULT_DATA_SIZE: usize = 16_384;
    pub const DEFAULT_HANG_SAMPLE_PERIOD: usize = 256;

    /// # Errors
    /// Returns an error if any dimension or budget is out of range.
    pub fn new(
        width: u8,
        height: u8,
        data_size: usize,
        max_steps_per_run: u32,
        max_steps_total: u64,
        hang_sample_period: usize,
    ) -> Result<Self> {
        ensure!(width >= 1 && width <= 8, "width must be in 1..=8, got {width}");
        ensure!(height >= 1 && height <= 8, "height must be in 1..=8, got {height}");
        ensure!(data_size >= 2, "data_size must be at least 2, got {data_size}");
        ensure!(max_steps_per_run > 0, "max_steps_per_run must be positive");
        ensure!(hang_sample_period > 0, "hang_sample_period must be positive");
        ensure!(
            u64::from(max_steps_per_run) <= max_steps_total,
            "max_steps_per_run ({max_steps_per_run}) must not exceed max_steps_total ({max_steps_total})"
        );
        Ok(Self {
            width,
            height,
            data_size,
            max_steps_per_run,
            max_steps_total,
            hang_sample_period,
        })
    }

    #[must_use]
    pub fn for_grid(width: u8, height: u8) -> Self {
        let max_steps_per_run = (Self::DEFAULT_DATA_SIZE as u32).saturating_mul(4);
        Self::new(
            width,
            height,
            Self::DEFAULT_DATA_SIZE,
            max_steps_per_run,
            u64::from(max_steps_per_run) * 64,
            Self::DEFAULT_HANG_SAMPLE_PERIOD,
        )
        .expect("default config is always valid")
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self::for_grid(7, 7)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_oversized_grid() {
        assert!(SearchConfig::new(9, 7, 16, 100, 1000, 8).is_err());
    }

    #[test]
    fn rejects_run_budget_above_total() {
        assert!(SearchConfig::new(4, 4, 16, 1000, 100, 8).is_err());
    }

    #[test]
    fn default_config_is_valid() {
        let cfg = SearchConfig::default();
        assert_eq!(cfg.width, 7);
        assert_eq!(cfg.height, 7);
    }
}
