//! Streamed collectibles
//!
//! Items are generated in bands ahead of the projectile and evicted once far
//! behind it. Every item is placed at its sorted x position, so proximity
//! queries binary-search their horizontal window instead of scanning every
//! item of a long run.

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::terrain::Terrain;
use crate::tuning::{Placement, SpawnTuning};

/// Item kinds scattered over the course
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollectibleKind {
    /// Ground pad that bounces the projectile back into the air
    BouncePad,
    /// Forward propellant kick
    Rocket,
    /// Common score item
    Star,
    /// Rare score item with a big upward blast
    Bomb,
    /// Obstacle that ends the run
    Barrier,
    /// Minor bonus
    Chips,
    /// Minor bonus
    Popcorn,
}

impl CollectibleKind {
    pub const ALL: [CollectibleKind; 7] = [
        CollectibleKind::BouncePad,
        CollectibleKind::Rocket,
        CollectibleKind::Star,
        CollectibleKind::Bomb,
        CollectibleKind::Barrier,
        CollectibleKind::Chips,
        CollectibleKind::Popcorn,
    ];

    /// Collision radius
    pub fn radius(&self) -> f32 {
        match self {
            CollectibleKind::BouncePad => 40.0,
            CollectibleKind::Rocket => 38.0,
            CollectibleKind::Star => 35.0,
            CollectibleKind::Bomb => 32.0,
            CollectibleKind::Barrier => 60.0,
            CollectibleKind::Chips => 30.0,
            CollectibleKind::Popcorn => 28.0,
        }
    }
}

/// A single item on the course
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Collectible {
    pub id: u32,
    pub kind: CollectibleKind,
    pub pos: Vec2,
    pub radius: f32,
    /// Ground angle under barriers so they sit flush; zero for other kinds
    pub rotation: f32,
    /// Flips false -> true once, never back
    pub collected: bool,
}

impl Collectible {
    /// Exact circle overlap against a projectile at `pos` with `radius`
    #[inline]
    pub fn overlaps(&self, pos: Vec2, radius: f32) -> bool {
        self.pos.distance(pos) < self.radius + radius
    }
}

/// Owner of every not-yet-evicted collectible
#[derive(Debug, Clone)]
pub struct CollectibleField {
    tuning: SpawnTuning,
    rng: Pcg32,
    /// Sorted by x
    items: Vec<Collectible>,
    /// Launch x; spawn distances are measured from here
    start_x: f32,
    /// Furthest x generated so far
    frontier: f32,
    next_id: u32,
}

impl CollectibleField {
    /// Create an empty field whose spawn rolls come from `seed`
    pub fn new(tuning: SpawnTuning, start_x: f32, seed: u64) -> Self {
        Self::with_rng(tuning, start_x, Pcg32::seed_from_u64(seed))
    }

    /// Create an empty field drawing spawn rolls from `rng`
    pub fn with_rng(tuning: SpawnTuning, start_x: f32, rng: Pcg32) -> Self {
        Self {
            tuning,
            rng,
            items: Vec::new(),
            start_x,
            frontier: start_x,
            next_id: 1,
        }
    }

    /// Furthest x up to which items exist
    pub fn frontier(&self) -> f32 {
        self.frontier
    }

    /// Live items in x order
    pub fn items(&self) -> &[Collectible] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Look an item up by id (linear; for hosts and tests, not per-tick use)
    pub fn get(&self, id: u32) -> Option<&Collectible> {
        self.items.iter().find(|c| c.id == id)
    }

    /// Generate items from the current frontier up to `until_x`.
    ///
    /// Every rule rolls independently at each step, so several kinds can
    /// land at the same x. Returns the number of items created.
    pub fn spawn_ahead(&mut self, until_x: f32, terrain: &Terrain) -> usize {
        let band_start = self.frontier;
        let first_x = band_start.max(self.start_x + self.tuning.first_spawn_lead);
        let before = self.items.len();

        // A bad step or bound would never reach `until_x`
        let step_len = self.tuning.step;
        if !(step_len.is_finite() && step_len > 0.0 && until_x.is_finite() && first_x.is_finite()) {
            log::warn!(
                "Refusing to spawn with step={} up to x={} from x={}",
                step_len,
                until_x,
                first_x
            );
            return 0;
        }

        let mut step = 0u32;
        loop {
            let x = first_x + step as f32 * step_len;
            if x >= until_x {
                break;
            }
            step += 1;

            let ground = terrain.height(x);
            let distance = x - self.start_x;
            for i in 0..self.tuning.rules.len() {
                let rule = &self.tuning.rules[i];
                let (kind, probability, placement) = (rule.kind, rule.probability, rule.placement);
                // Gates are checked before rolling so a gated rule draws nothing
                if rule.min_distance > 0.0 && distance <= rule.min_distance {
                    continue;
                }
                if rule.band_lead_in > 0.0 && x <= band_start + rule.band_lead_in {
                    continue;
                }
                if self.rng.random::<f32>() >= probability {
                    continue;
                }
                let y = match placement {
                    Placement::Sky { offset, spread } => {
                        ground - offset - self.rng.random::<f32>() * spread
                    }
                    Placement::Ground { offset } => ground - offset,
                };
                let rotation = if kind == CollectibleKind::Barrier {
                    terrain.slope(x)
                } else {
                    0.0
                };
                self.push(kind, Vec2::new(x, y), rotation);
            }
        }

        self.frontier = self.frontier.max(until_x);
        let created = self.items.len() - before;
        log::debug!(
            "Spawned {} collectibles in [{:.0}, {:.0}), {} live",
            created,
            band_start,
            until_x,
            self.items.len()
        );
        created
    }

    /// Insert at the sorted x position; appending is the common case
    fn push(&mut self, kind: CollectibleKind, pos: Vec2, rotation: f32) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        let at = self.items.partition_point(|c| c.pos.x <= pos.x);
        self.items.insert(
            at,
            Collectible {
                id,
                kind,
                pos,
                radius: kind.radius(),
                rotation,
                collected: false,
            },
        );
        id
    }

    /// Place a single item directly (scripted layouts and tests).
    ///
    /// Keeps x order, so it may be called at any time, including ahead of
    /// the frontier.
    pub fn insert(&mut self, kind: CollectibleKind, pos: Vec2) -> u32 {
        self.push(kind, pos, 0.0)
    }

    /// Uncollected items within the horizontal cutoff of `x`, with their
    /// indices into `items()`
    fn window(&self, x: f32) -> impl Iterator<Item = (usize, &Collectible)> {
        let cutoff = self.tuning.query_cutoff;
        let lo = self.items.partition_point(|c| c.pos.x < x - cutoff);
        self.items[lo..]
            .iter()
            .enumerate()
            .take_while(move |(_, c)| c.pos.x <= x + cutoff)
            .filter(|(_, c)| !c.collected)
            .map(move |(i, c)| (lo + i, c))
    }

    /// Indices into `items()` of uncollected items overlapping a circle at
    /// `pos`, in x order.
    ///
    /// Indices stay valid until the next spawn, insert or eviction.
    pub fn query_near(&self, pos: Vec2, radius: f32) -> Vec<usize> {
        self.window(pos.x)
            .filter(|(_, c)| c.overlaps(pos, radius))
            .map(|(i, _)| i)
            .collect()
    }

    /// Mark the item at `index` collected and return its kind and position.
    ///
    /// Collecting an item twice is a state machine bug.
    pub fn collect(&mut self, index: usize) -> Option<(CollectibleKind, Vec2)> {
        let item = self.items.get_mut(index)?;
        debug_assert!(!item.collected, "collectible {} collected twice", item.id);
        if item.collected {
            return None;
        }
        item.collected = true;
        Some((item.kind, item.pos))
    }

    /// Drop every item more than the evict buffer behind `x`.
    ///
    /// Returns the number evicted.
    pub fn evict_behind(&mut self, x: f32) -> usize {
        let cutoff = x - self.tuning.evict_buffer;
        let keep_from = self.items.partition_point(|c| c.pos.x < cutoff);
        self.items.drain(..keep_from);
        if keep_from > 0 {
            log::debug!("Evicted {} collectibles behind x={:.0}", keep_from, cutoff);
        }
        keep_from
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tuning::{SpawnRule, TerrainTuning};

    fn field(seed: u64) -> CollectibleField {
        CollectibleField::new(SpawnTuning::default(), 100.0, seed)
    }

    fn only_rule(rule: SpawnRule) -> SpawnTuning {
        SpawnTuning {
            rules: vec![rule],
            ..SpawnTuning::default()
        }
    }

    #[test]
    fn test_same_seed_same_layout() {
        let terrain = Terrain::default();
        let mut a = field(42);
        let mut b = field(42);
        a.spawn_ahead(5000.0, &terrain);
        b.spawn_ahead(5000.0, &terrain);
        assert!(!a.is_empty());
        assert_eq!(a.items(), b.items());
    }

    #[test]
    fn test_different_seed_different_layout() {
        let terrain = Terrain::default();
        let mut a = field(1);
        let mut b = field(2);
        a.spawn_ahead(5000.0, &terrain);
        b.spawn_ahead(5000.0, &terrain);
        assert_ne!(a.items(), b.items());
    }

    #[test]
    fn test_spawn_respects_lead_and_frontier() {
        let terrain = Terrain::default();
        let mut f = field(7);
        f.spawn_ahead(5000.0, &terrain);
        assert_eq!(f.frontier(), 5000.0);
        assert!(f.items().iter().all(|c| c.pos.x >= 400.0 && c.pos.x < 5000.0));
        assert!(f.items().windows(2).all(|w| w[0].pos.x <= w[1].pos.x));

        let before = f.len();
        f.spawn_ahead(10_000.0, &terrain);
        assert!(f.len() > before);
        assert!(f.items()[before..].iter().all(|c| c.pos.x >= 5000.0));
    }

    #[test]
    fn test_spawn_behind_frontier_is_noop() {
        let terrain = Terrain::default();
        let mut f = field(7);
        f.spawn_ahead(5000.0, &terrain);
        assert_eq!(f.spawn_ahead(3000.0, &terrain), 0);
        assert_eq!(f.frontier(), 5000.0);
    }

    #[test]
    fn test_barriers_only_past_min_distance() {
        let terrain = Terrain::default();
        let rule = SpawnRule {
            kind: CollectibleKind::Barrier,
            probability: 1.0,
            placement: Placement::Ground { offset: 60.0 },
            min_distance: 3000.0,
            band_lead_in: 0.0,
        };
        let mut f = CollectibleField::new(only_rule(rule), 100.0, 3);
        f.spawn_ahead(5000.0, &terrain);
        assert!(!f.is_empty());
        for c in f.items() {
            assert!(c.pos.x - 100.0 > 3000.0);
            assert!((c.pos.y - (terrain.height(c.pos.x) - 60.0)).abs() < 1e-3);
            assert!((c.rotation - terrain.slope(c.pos.x)).abs() < 1e-6);
        }
    }

    #[test]
    fn test_sky_placement_within_spread() {
        let terrain = Terrain::default();
        let rule = SpawnRule {
            kind: CollectibleKind::Star,
            probability: 1.0,
            placement: Placement::Sky { offset: 150.0, spread: 3500.0 },
            min_distance: 0.0,
            band_lead_in: 0.0,
        };
        let mut f = CollectibleField::new(only_rule(rule), 100.0, 9);
        f.spawn_ahead(2000.0, &terrain);
        for c in f.items() {
            let above = terrain.height(c.pos.x) - c.pos.y;
            assert!((150.0..=3650.0).contains(&above));
            assert_eq!(c.rotation, 0.0);
        }
    }

    #[test]
    fn test_band_lead_in_skips_band_start() {
        let terrain = Terrain::default();
        let rule = SpawnRule {
            kind: CollectibleKind::Bomb,
            probability: 1.0,
            placement: Placement::Ground { offset: 30.0 },
            min_distance: 0.0,
            band_lead_in: 500.0,
        };
        let mut f = CollectibleField::new(only_rule(rule), 100.0, 5);
        f.spawn_ahead(5000.0, &terrain);
        assert!(f.items().iter().all(|c| c.pos.x > 100.0 + 500.0));
        f.spawn_ahead(10_000.0, &terrain);
        assert!(!f.items().iter().any(|c| c.pos.x >= 5000.0 && c.pos.x <= 5500.0));
    }

    #[test]
    fn test_query_near_exact_overlap() {
        let mut f = CollectibleField::new(SpawnTuning::default(), 0.0, 0);
        let star = f.insert(CollectibleKind::Star, Vec2::new(1000.0, 500.0));
        let _far = f.insert(CollectibleKind::Star, Vec2::new(1000.0, 900.0));

        // 35 + 45 = 80: just inside and just outside
        let hits = f.query_near(Vec2::new(1079.0, 500.0), 45.0);
        assert_eq!(hits.len(), 1);
        assert_eq!(f.items()[hits[0]].id, star);
        assert!(f.query_near(Vec2::new(1081.0, 500.0), 45.0).is_empty());
    }

    #[test]
    fn test_query_skips_collected() {
        let mut f = CollectibleField::new(SpawnTuning::default(), 0.0, 0);
        let id = f.insert(CollectibleKind::Chips, Vec2::new(50.0, 50.0));
        let hits = f.query_near(Vec2::new(50.0, 50.0), 10.0);
        assert_eq!(hits.len(), 1);
        assert_eq!(
            f.collect(hits[0]),
            Some((CollectibleKind::Chips, Vec2::new(50.0, 50.0)))
        );
        assert!(f.get(id).unwrap().collected);
        assert!(f.query_near(Vec2::new(50.0, 50.0), 10.0).is_empty());
    }

    #[test]
    #[should_panic(expected = "collected twice")]
    #[cfg(debug_assertions)]
    fn test_double_collect_panics_in_debug() {
        let mut f = CollectibleField::new(SpawnTuning::default(), 0.0, 0);
        f.insert(CollectibleKind::Star, Vec2::ZERO);
        f.collect(0);
        f.collect(0);
    }

    #[test]
    fn test_evict_behind_keeps_buffer() {
        let terrain = Terrain::new(&TerrainTuning::flat(900.0));
        let mut f = field(11);
        f.spawn_ahead(10_000.0, &terrain);
        let evicted = f.evict_behind(6000.0);
        assert!(evicted > 0);
        assert!(f.items().iter().all(|c| c.pos.x >= 4000.0));
    }

    #[test]
    fn test_insert_keeps_x_order() {
        let mut f = CollectibleField::new(SpawnTuning::default(), 0.0, 0);
        f.insert(CollectibleKind::Star, Vec2::new(300.0, 0.0));
        f.insert(CollectibleKind::Star, Vec2::new(100.0, 0.0));
        f.insert(CollectibleKind::Star, Vec2::new(200.0, 0.0));
        let xs: Vec<f32> = f.items().iter().map(|c| c.pos.x).collect();
        assert_eq!(xs, vec![100.0, 200.0, 300.0]);
    }

    #[test]
    fn test_insert_ahead_then_spawn_stays_sorted() {
        let terrain = Terrain::new(&TerrainTuning::flat(900.0));
        let rule = SpawnRule {
            kind: CollectibleKind::Star,
            probability: 1.0,
            placement: Placement::Ground { offset: 35.0 },
            min_distance: 0.0,
            band_lead_in: 0.0,
        };
        let mut f = CollectibleField::new(only_rule(rule), 100.0, 1);
        f.spawn_ahead(1000.0, &terrain);
        let bomb = f.insert(CollectibleKind::Bomb, Vec2::new(3000.0, 500.0));
        f.spawn_ahead(5000.0, &terrain);

        assert!(f.items().windows(2).all(|w| w[0].pos.x <= w[1].pos.x));
        for (i, c) in f.items().iter().enumerate() {
            assert!(
                f.query_near(c.pos, 1.0).contains(&i),
                "{:?} at x={} not found",
                c.kind,
                c.pos.x
            );
        }
        let bomb_at = f.items().iter().position(|c| c.id == bomb);
        assert!(bomb_at.is_some_and(|i| f.items()[i].pos.x == 3000.0));

        // Eviction only drops what is actually behind the cutoff
        f.evict_behind(4000.0);
        assert!(f.items().iter().all(|c| c.pos.x >= 2000.0));
        assert!(f.get(bomb).is_some());
    }

    #[test]
    fn test_bad_step_spawns_nothing() {
        let terrain = Terrain::default();
        for step in [0.0, -40.0, f32::NAN, f32::INFINITY] {
            let tuning = SpawnTuning {
                step,
                ..SpawnTuning::default()
            };
            let mut f = CollectibleField::new(tuning, 100.0, 1);
            assert_eq!(f.spawn_ahead(1000.0, &terrain), 0, "step={step}");
            assert!(f.is_empty());
        }
        let mut f = field(1);
        assert_eq!(f.spawn_ahead(f32::NAN, &terrain), 0);
    }
}
