//! Asset load progress as shown by the loading indicator

/// Byte counts reported by the downloader and the percent derived from them.
///
/// The percent never goes backwards, even if a later report carries a
/// smaller byte count or a different total.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadProgress {
    loaded: u64,
    total: Option<u64>,
    percent: u8,
}

impl LoadProgress {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a report. Returns true when the percent moved.
    pub fn update(&mut self, loaded: u64, total: Option<u64>) -> bool {
        self.loaded = self.loaded.max(loaded);
        if let Some(total) = total.filter(|t| *t > 0) {
            self.total = Some(total);
        }

        let Some(total) = self.total else {
            return false;
        };

        // Rounded like the indicator displays it, capped below 100 until
        // the asset is actually decoded.
        let raw = ((self.loaded as f64 / total as f64) * 100.0).round();
        let next = raw.clamp(0.0, 99.0) as u8;
        if next > self.percent {
            self.percent = next;
            true
        } else {
            false
        }
    }

    /// Jump to 100%. Returns true when the percent moved.
    pub fn complete(&mut self) -> bool {
        if self.percent == 100 {
            return false;
        }
        self.percent = 100;
        if let Some(total) = self.total {
            self.loaded = self.loaded.max(total);
        }
        true
    }

    pub fn percent(&self) -> u8 {
        self.percent
    }

    pub fn loaded(&self) -> u64 {
        self.loaded
    }

    pub fn total(&self) -> Option<u64> {
        self.total
    }

    pub fn is_complete(&self) -> bool {
        self.percent == 100
    }

    /// Fraction in `0.0..=1.0` for progress bars
    pub fn fraction(&self) -> f32 {
        f32::from(self.percent) / 100.0
    }
}
