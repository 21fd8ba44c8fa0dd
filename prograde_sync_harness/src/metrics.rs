// Copyright 2026 the Prograde Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Presentation-latency metrics and grading.

/// Letter grade for presentation quality.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PresentGrade {
    /// Latency well inside budget, near-zero misses.
    A,
    /// Good latency with moderate misses.
    B,
    /// Degraded but usable.
    C,
    /// Poor.
    D,
}

impl PresentGrade {
    /// Returns a short label for HUD rendering.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::A => "A",
            Self::B => "B",
            Self::C => "C",
            Self::D => "D",
        }
    }
}

/// Aggregated report returned by [`PresentTracker::observe`].
#[derive(Clone, Copy, Debug)]
pub struct PresentReport {
    /// Current grade.
    pub grade: PresentGrade,
    /// Misses (latency over budget) per 1000 observed frames.
    pub miss_rate_per_1000: f64,
    /// Current frame's submit-to-present latency in microseconds.
    pub latency_us: f64,
    /// Total frames observed.
    pub total_frames: u64,
    /// Total misses observed.
    pub missed_frames: u64,
}

/// Rolling present tracker with fixed-size latency history.
#[derive(Debug)]
pub struct PresentTracker<const N: usize> {
    latencies_us: [f64; N],
    cursor: usize,
    budget_us: f64,
    total_frames: u64,
    missed_frames: u64,
}

impl<const N: usize> Default for PresentTracker<N> {
    fn default() -> Self {
        // One 60 Hz refresh interval.
        Self::new(16_667.0)
    }
}

impl<const N: usize> PresentTracker<N> {
    /// Creates a tracker with the given latency budget in microseconds; the
    /// history ring starts prefilled at half budget.
    #[must_use]
    pub const fn new(budget_us: f64) -> Self {
        Self {
            latencies_us: [budget_us / 2.0; N],
            cursor: 0,
            budget_us,
            total_frames: 0,
            missed_frames: 0,
        }
    }

    /// Observes one frame's submit-to-present latency and returns an updated
    /// report.
    #[must_use]
    pub fn observe(&mut self, latency_us: f64) -> PresentReport {
        self.total_frames = self.total_frames.saturating_add(1);
        self.latencies_us[self.cursor % N] = latency_us;
        self.cursor = (self.cursor + 1) % N;

        if latency_us > self.budget_us {
            self.missed_frames = self.missed_frames.saturating_add(1);
        }

        let miss_rate = if self.total_frames == 0 {
            0.0
        } else {
            self.missed_frames as f64 * 1000.0 / self.total_frames as f64
        };

        let grade = grade_for(latency_us / self.budget_us, miss_rate);

        PresentReport {
            grade,
            miss_rate_per_1000: miss_rate,
            latency_us,
            total_frames: self.total_frames,
            missed_frames: self.missed_frames,
        }
    }

    /// Returns ring-buffer latencies oldest→newest.
    #[must_use]
    pub fn latencies(&self) -> [f64; N] {
        let mut out = [0.0; N];
        let mut i = 0;
        while i < N {
            let idx = (self.cursor + i) % N;
            out[i] = self.latencies_us[idx];
            i += 1;
        }
        out
    }

    /// Returns an ASCII sparkline over `latencies()`.
    #[must_use]
    pub fn sparkline_ascii(&self, min_us: f64, max_us: f64) -> String {
        const LEVELS: &[u8] = b" .:-=+*#%@";
        let mut out = String::with_capacity(N);
        let mut i = 0;
        while i < N {
            let idx = (self.cursor + i) % N;
            let v = self.latencies_us[idx].clamp(min_us, max_us);
            let t = (v - min_us) / (max_us - min_us);
            #[expect(
                clippy::cast_possible_truncation,
                reason = "index is clamped to ASCII level count"
            )]
            let level = (t * (LEVELS.len() as f64 - 1.0) + 0.5) as usize;
            out.push(LEVELS[level] as char);
            i += 1;
        }
        out
    }
}

fn grade_for(budget_fraction: f64, miss_rate_per_1000: f64) -> PresentGrade {
    if budget_fraction < 0.5 && miss_rate_per_1000 < 1.0 {
        PresentGrade::A
    } else if budget_fraction < 0.8 && miss_rate_per_1000 < 10.0 {
        PresentGrade::B
    } else if budget_fraction < 1.0 && miss_rate_per_1000 < 50.0 {
        PresentGrade::C
    } else {
        PresentGrade::D
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn miss_rate_accumulates() {
        let mut t = PresentTracker::<8>::new(10_000.0);
        let mut last = None;
        for i in 0..10 {
            let latency = if i < 2 { 12_000.0 } else { 4_000.0 };
            last = Some(t.observe(latency));
        }
        let report = last.unwrap();
        assert!((report.miss_rate_per_1000 - 200.0).abs() < 1e-6);
        assert_eq!(report.total_frames, 10);
        assert_eq!(report.missed_frames, 2);
    }

    #[test]
    fn grades_tighten_with_latency() {
        let mut t = PresentTracker::<4>::new(10_000.0);
        assert_eq!(t.observe(3_000.0).grade, PresentGrade::A);
        assert_eq!(t.observe(7_000.0).grade, PresentGrade::B);
        assert_eq!(t.observe(9_500.0).grade, PresentGrade::C);
        assert_eq!(t.observe(15_000.0).grade, PresentGrade::D);
    }

    #[test]
    fn sparkline_tracks_the_window() {
        let mut t = PresentTracker::<4>::new(10_000.0);
        let _ = t.observe(0.0);
        let _ = t.observe(10_000.0);
        let spark = t.sparkline_ascii(0.0, 10_000.0);
        assert_eq!(spark.len(), 4);
        assert!(spark.contains(' '), "got: {spark:?}");
        assert!(spark.contains('@'), "got: {spark:?}");
    }

    #[test]
    fn latencies_are_ordered_oldest_to_newest() {
        let mut t = PresentTracker::<3>::new(10_000.0);
        for v in [1.0, 2.0, 3.0, 4.0] {
            let _ = t.observe(v);
        }
        assert_eq!(t.latencies(), [2.0, 3.0, 4.0]);
    }
}
