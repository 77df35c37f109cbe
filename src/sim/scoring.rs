//! Run statistics and the final score breakdown

use serde::{Deserialize, Serialize};

use super::collectible::CollectibleKind;
use crate::tuning::ScoringTuning;

/// Items collected during a run, per kind
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectCounts {
    pub stars: u32,
    pub rockets: u32,
    pub bombs: u32,
    pub bounce_pads: u32,
    pub chips: u32,
    pub popcorn: u32,
}

impl CollectCounts {
    /// Count one collection. Barriers end the run and are not counted.
    pub fn record(&mut self, kind: CollectibleKind) {
        match kind {
            CollectibleKind::Star => self.stars += 1,
            CollectibleKind::Rocket => self.rockets += 1,
            CollectibleKind::Bomb => self.bombs += 1,
            CollectibleKind::BouncePad => self.bounce_pads += 1,
            CollectibleKind::Chips => self.chips += 1,
            CollectibleKind::Popcorn => self.popcorn += 1,
            CollectibleKind::Barrier => {}
        }
    }

    pub fn get(&self, kind: CollectibleKind) -> u32 {
        match kind {
            CollectibleKind::Star => self.stars,
            CollectibleKind::Rocket => self.rockets,
            CollectibleKind::Bomb => self.bombs,
            CollectibleKind::BouncePad => self.bounce_pads,
            CollectibleKind::Chips => self.chips,
            CollectibleKind::Popcorn => self.popcorn,
            CollectibleKind::Barrier => 0,
        }
    }

    pub fn total(&self) -> u32 {
        self.stars + self.rockets + self.bombs + self.bounce_pads + self.chips + self.popcorn
    }
}

/// Accumulators for one run; every field only grows
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RunStats {
    /// Furthest x reached past the launch point
    pub max_distance: f32,
    /// Highest clearance above the ground
    pub max_height: f32,
    /// Milliseconds from launch
    pub air_time_ms: f32,
    pub counts: CollectCounts,
}

impl RunStats {
    /// Fold in the projectile's current distance and height
    pub fn observe(&mut self, distance: f32, height: f32) {
        self.max_distance = self.max_distance.max(distance);
        self.max_height = self.max_height.max(height);
    }

    pub fn add_time(&mut self, dt: f32) {
        self.air_time_ms += dt.max(0.0) * 1000.0;
    }
}

/// Final summary of a run
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TossResult {
    /// Whole units travelled
    pub distance: u64,
    /// Seconds from launch to stop
    pub air_time: f32,
    /// Whole units of best clearance
    pub max_height: u64,
    pub counts: CollectCounts,
    /// Points from distance, air time and height
    pub flight_points: u64,
    /// Points from collected items
    pub item_points: u64,
    pub score: u64,
}

#[inline]
fn floor_points(value: f32, multiplier: f32) -> u64 {
    // NaN and negatives count as zero
    (value.max(0.0) * multiplier).max(0.0).floor() as u64
}

/// Score a run. Pure: identical inputs always give an identical result.
pub fn calculate_score(
    distance: f32,
    air_time_ms: f32,
    max_height: f32,
    counts: &CollectCounts,
    tuning: &ScoringTuning,
) -> TossResult {
    let distance = distance.max(0.0);
    let air_time = air_time_ms.max(0.0) / 1000.0;
    let max_height = max_height.max(0.0);

    let flight_points = floor_points(distance, tuning.distance_multiplier)
        + floor_points(air_time, tuning.air_time_multiplier)
        + floor_points(max_height, tuning.height_multiplier);

    let item_points: u64 = CollectibleKind::ALL
        .iter()
        .map(|&kind| counts.get(kind) as u64 * tuning.points_for(kind))
        .sum();

    TossResult {
        distance: distance.floor() as u64,
        air_time,
        max_height: max_height.floor() as u64,
        counts: *counts,
        flight_points,
        item_points,
        score: flight_points + item_points,
    }
}

/// Score accumulated run statistics
pub fn score_run(stats: &RunStats, tuning: &ScoringTuning) -> TossResult {
    calculate_score(
        stats.max_distance,
        stats.air_time_ms,
        stats.max_height,
        &stats.counts,
        tuning,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_reference_score() {
        let counts = CollectCounts {
            stars: 2,
            ..Default::default()
        };
        let result = calculate_score(1000.0, 5000.0, 200.0, &counts, &ScoringTuning::default());
        assert_eq!(result.score, 500 + 50 + 20 + 1000);
        assert_eq!(result.score, 1570);
        assert_eq!(result.flight_points, 570);
        assert_eq!(result.item_points, 1000);
        assert_eq!(result.distance, 1000);
        assert_eq!(result.air_time, 5.0);
        assert_eq!(result.max_height, 200);
    }

    #[test]
    fn test_every_kind_scores() {
        let counts = CollectCounts {
            stars: 1,
            rockets: 1,
            bombs: 1,
            bounce_pads: 1,
            chips: 1,
            popcorn: 1,
        };
        let result = calculate_score(0.0, 0.0, 0.0, &counts, &ScoringTuning::default());
        assert_eq!(result.score, 500 + 200 + 1000 + 100 + 300 + 150);
    }

    #[test]
    fn test_negative_inputs_are_zero() {
        let result = calculate_score(
            -500.0,
            -3000.0,
            -20.0,
            &CollectCounts::default(),
            &ScoringTuning::default(),
        );
        assert_eq!(result.score, 0);
        assert_eq!(result.distance, 0);
        assert_eq!(result.air_time, 0.0);
    }

    #[test]
    fn test_fractional_parts_floor() {
        // 999 * 0.5 = 499.5, 1.999 s * 10 = 19.99, 9 * 0.1 = 0.9
        let result = calculate_score(
            999.0,
            1999.0,
            9.0,
            &CollectCounts::default(),
            &ScoringTuning::default(),
        );
        assert_eq!(result.score, 499 + 19);
    }

    #[test]
    fn test_barrier_not_counted() {
        let mut counts = CollectCounts::default();
        counts.record(CollectibleKind::Barrier);
        counts.record(CollectibleKind::Popcorn);
        assert_eq!(counts.total(), 1);
        assert_eq!(counts.popcorn, 1);
    }

    #[test]
    fn test_stats_only_grow() {
        let mut stats = RunStats::default();
        stats.observe(100.0, 50.0);
        stats.observe(80.0, 10.0);
        stats.add_time(-1.0);
        assert_eq!(stats.max_distance, 100.0);
        assert_eq!(stats.max_height, 50.0);
        assert_eq!(stats.air_time_ms, 0.0);
    }

    proptest! {
        #[test]
        fn prop_score_is_pure(
            distance in -1e5f32..1e6,
            air in -1e4f32..1e6,
            height in -1e4f32..1e5,
            stars in 0u32..100,
            bombs in 0u32..100,
        ) {
            let counts = CollectCounts { stars, bombs, ..Default::default() };
            let tuning = ScoringTuning::default();
            let a = calculate_score(distance, air, height, &counts, &tuning);
            let b = calculate_score(distance, air, height, &counts, &tuning);
            prop_assert_eq!(a, b);
            prop_assert_eq!(a.score, a.flight_points + a.item_points);
        }

        #[test]
        fn prop_negative_flight_inputs_score_as_zero(
            distance in -1e6f32..0.0,
            air in -1e6f32..0.0,
            height in -1e6f32..0.0,
        ) {
            let r = calculate_score(distance, air, height, &CollectCounts::default(), &ScoringTuning::default());
            prop_assert_eq!(r.score, 0);
        }
    }
}
