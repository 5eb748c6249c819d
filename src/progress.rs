//! Aggregate load progress for one loading cycle.
//!
//! Every fetch belonging to a cycle (material, mesh, textures) reports into a
//! shared [`LoadProgress`]. The indicator reads a percentage in `[0, 100]`
//! that never decreases within the cycle, even when a late fetch grows the
//! expected byte total.

use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::Arc;

/// Shared byte counter for all pending fetches of one load cycle.
///
/// Percent is derived from bytes-loaded over bytes-expected once any fetch has
/// announced its size; until then a completed-assets ratio stands in. The
/// handed-out value is latched, so consumers observe a monotonically
/// non-decreasing reading.
#[derive(Debug, Default)]
pub struct LoadProgress {
    expected_bytes: AtomicU64,
    loaded_bytes: AtomicU64,
    expected_assets: AtomicU32,
    finished_assets: AtomicU32,
    // highest percentage handed out so far, in basis points (percent * 100)
    high_water: AtomicU32,
}

impl LoadProgress {
    /// Start a cycle that will fetch `assets` files in total.
    pub fn for_assets(assets: u32) -> Arc<Self> {
        let progress = Self::default();
        progress.expected_assets.store(assets, Ordering::Relaxed);
        Arc::new(progress)
    }

    /// A fetch learned its total size (file length or Content-Length).
    pub fn expect_bytes(&self, bytes: u64) {
        self.expected_bytes.fetch_add(bytes, Ordering::Relaxed);
    }

    /// A fetch received `bytes` more payload.
    pub fn add_bytes(&self, bytes: u64) {
        self.loaded_bytes.fetch_add(bytes, Ordering::Relaxed);
    }

    /// A fetch completed, size known or not.
    pub fn finish_asset(&self) {
        self.finished_assets.fetch_add(1, Ordering::Relaxed);
    }

    /// Current percentage in `[0, 100]`, monotonically non-decreasing.
    pub fn percent(&self) -> f32 {
        let expected_bytes = self.expected_bytes.load(Ordering::Relaxed);
        let loaded_bytes = self.loaded_bytes.load(Ordering::Relaxed);
        let expected_assets = self.expected_assets.load(Ordering::Relaxed);
        let finished_assets = self.finished_assets.load(Ordering::Relaxed);

        let raw = if expected_assets > 0 && finished_assets >= expected_assets {
            100.0
        } else if expected_bytes > 0 {
            loaded_bytes as f64 / expected_bytes as f64 * 100.0
        } else if expected_assets > 0 {
            finished_assets as f64 / expected_assets as f64 * 100.0
        } else {
            0.0
        };

        let basis_points = (raw.clamp(0.0, 100.0) * 100.0).round() as u32;
        let latched = self
            .high_water
            .fetch_max(basis_points, Ordering::Relaxed)
            .max(basis_points);
        latched as f32 / 100.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_at_zero_and_finishes_at_hundred() {
        let progress = LoadProgress::for_assets(2);
        assert_eq!(progress.percent(), 0.0);

        progress.finish_asset();
        progress.finish_asset();
        assert_eq!(progress.percent(), 100.0);
    }

    #[test]
    fn tracks_bytes_once_a_total_is_known() {
        let progress = LoadProgress::for_assets(1);
        progress.expect_bytes(1000);
        progress.add_bytes(250);
        assert_eq!(progress.percent(), 25.0);
        progress.add_bytes(500);
        assert_eq!(progress.percent(), 75.0);
    }

    #[test]
    fn never_decreases_when_expected_total_grows() {
        let progress = LoadProgress::for_assets(3);
        progress.expect_bytes(100);
        progress.add_bytes(100);
        let before = progress.percent();
        assert_eq!(before, 100.0 * 100.0 / 100.0);

        // A second fetch announces its size, shrinking the raw ratio.
        progress.expect_bytes(900);
        let after = progress.percent();
        assert!(after >= before);
    }

    #[test]
    fn stays_within_bounds_under_overreported_bytes() {
        let progress = LoadProgress::for_assets(1);
        progress.expect_bytes(10);
        progress.add_bytes(200);
        let percent = progress.percent();
        assert!((0.0..=100.0).contains(&percent));
    }

    #[test]
    fn readings_are_monotonic_across_interleavings() {
        let progress = LoadProgress::for_assets(3);
        let mut last = progress.percent();
        let steps: [&dyn Fn(&LoadProgress); 7] = [
            &|p| p.expect_bytes(400),
            &|p| p.add_bytes(100),
            &|p| p.expect_bytes(600),
            &|p| p.add_bytes(300),
            &|p| p.finish_asset(),
            &|p| p.add_bytes(600),
            &|p| {
                p.finish_asset();
                p.finish_asset();
            },
        ];
        for step in steps {
            step(&progress);
            let now = progress.percent();
            assert!((0.0..=100.0).contains(&now));
            assert!(now >= last, "progress went backwards: {} -> {}", last, now);
            last = now;
        }
        assert_eq!(last, 100.0);
    }
}
