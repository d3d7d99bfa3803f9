#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Spawn point selection that keeps new enemies out of sight.
//!
//! The selector caches the world's spawn markers and, for each query, filters
//! them by category, player distance and line of sight before drawing a
//! behind-biased random subset. A returned point is never within a player's
//! unobstructed view at query time.

use std::time::Duration;

use horde_director_core::{duration_from_secs, PlayerView, SpawnCategory, SpawnPoint, Vec3};
use rand::{seq::SliceRandom, Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Distance, visibility and caching parameters of the selector.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectionConfig {
    /// Minimum distance between a common spawn and every player.
    pub common_min_distance: f32,
    /// Minimum distance between a special spawn and every player.
    pub special_min_distance: f32,
    /// Minimum distance between an ambient spawn and every player.
    pub ambient_min_distance: f32,
    /// Players farther than this from a candidate cannot see it.
    pub view_distance: f32,
    /// Share of each query drawn from candidates behind the players.
    pub behind_fraction: f32,
    /// Seconds between refreshes of the cached marker pool.
    pub refresh_interval_secs: f32,
    /// Maximum number of occlusion tests a single query may perform.
    pub max_rays_per_query: u32,
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            common_min_distance: 20.0,
            special_min_distance: 40.0,
            ambient_min_distance: 20.0,
            view_distance: 120.0,
            behind_fraction: 0.75,
            refresh_interval_secs: 10.0,
            max_rays_per_query: 256,
        }
    }
}

impl SelectionConfig {
    /// Minimum player distance enforced for `category`.
    #[must_use]
    pub const fn min_distance(&self, category: SpawnCategory) -> f32 {
        match category {
            SpawnCategory::Common => self.common_min_distance,
            SpawnCategory::Special => self.special_min_distance,
            SpawnCategory::Ambient => self.ambient_min_distance,
        }
    }

    /// Reports whether distances are non-negative and the bias lies in `[0, 1]`.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        let distances = [
            self.common_min_distance,
            self.special_min_distance,
            self.ambient_min_distance,
            self.view_distance,
            self.refresh_interval_secs,
        ];
        distances
            .iter()
            .all(|value| value.is_finite() && *value >= 0.0)
            && (0.0..=1.0).contains(&self.behind_fraction)
    }
}

/// Caches spawn markers and resolves validated spawn positions.
#[derive(Debug)]
pub struct SpawnPointSelector {
    config: SelectionConfig,
    rng: ChaCha8Rng,
    pool: Vec<SpawnPoint>,
    refresh_countdown: Duration,
    loaded: bool,
}

impl SpawnPointSelector {
    /// Creates a selector with an empty pool that loads on first refresh.
    #[must_use]
    pub fn new(config: SelectionConfig, rng_seed: u64) -> Self {
        Self {
            config,
            rng: ChaCha8Rng::seed_from_u64(rng_seed),
            pool: Vec::new(),
            refresh_countdown: Duration::ZERO,
            loaded: false,
        }
    }

    /// Configuration the selector was built with.
    #[must_use]
    pub fn config(&self) -> &SelectionConfig {
        &self.config
    }

    /// Cached candidate pool.
    #[must_use]
    pub fn pool(&self) -> &[SpawnPoint] {
        &self.pool
    }

    /// Counts down the refresh timer.
    pub fn advance(&mut self, dt: Duration) {
        self.refresh_countdown = self.refresh_countdown.saturating_sub(dt);
    }

    /// Reloads the pool from `markers` when the refresh timer has expired.
    ///
    /// Returns `true` when the pool was replaced.
    pub fn refresh_if_due(&mut self, markers: &[SpawnPoint]) -> bool {
        if self.loaded && !self.refresh_countdown.is_zero() {
            return false;
        }
        self.pool.clear();
        self.pool.extend_from_slice(markers);
        self.loaded = true;
        self.refresh_countdown = duration_from_secs(self.config.refresh_interval_secs);
        debug!(markers = self.pool.len(), "spawn marker pool refreshed");
        true
    }

    /// Forces the next [`refresh_if_due`](Self::refresh_if_due) call to reload.
    pub fn invalidate(&mut self) {
        self.loaded = false;
    }

    /// Returns up to `desired` positions of `category` that no player can see.
    ///
    /// Roughly `behind_fraction` of the result is drawn from candidates behind
    /// at least one player; the rest comes from the front, and either side
    /// makes up for a shortfall in the other. The result is best-effort and
    /// may be shorter than requested. `is_occluded(from, to)` must report
    /// whether world geometry blocks the segment between the two points.
    pub fn get_valid_points<F>(
        &mut self,
        category: SpawnCategory,
        desired: usize,
        players: &PlayerView,
        is_occluded: F,
    ) -> Vec<Vec3>
    where
        F: Fn(Vec3, Vec3) -> bool,
    {
        if desired == 0 {
            return Vec::new();
        }
        if players.is_empty() {
            debug!(?category, "no players connected; spawn selection skipped");
            return Vec::new();
        }

        let min_distance_sq = self.config.min_distance(category).powi(2);
        let mut candidates: Vec<Vec3> = self
            .pool
            .iter()
            .filter(|point| point.category() == category)
            .map(SpawnPoint::position)
            .filter(|position| {
                players
                    .iter()
                    .all(|player| player.position.distance_squared(*position) >= min_distance_sq)
            })
            .collect();
        candidates.shuffle(&mut self.rng);

        let mut rays_left = self.config.max_rays_per_query;
        let mut behind = Vec::new();
        let mut front = Vec::new();
        for candidate in candidates {
            match self.sightline(candidate, players, &is_occluded, &mut rays_left) {
                Sightline::Hidden => {
                    if is_behind_any(candidate, players) {
                        behind.push(candidate);
                    } else {
                        front.push(candidate);
                    }
                }
                Sightline::Visible => {}
                Sightline::BudgetExhausted => {
                    debug!(
                        ?category,
                        budget = self.config.max_rays_per_query,
                        "occlusion budget exhausted; accepting partial selection"
                    );
                    break;
                }
            }
        }

        let selected = self.draw_biased(desired, &behind, &front);
        if selected.len() < desired {
            debug!(
                ?category,
                desired,
                found = selected.len(),
                "spawn selection returned fewer points than requested"
            );
        }
        selected
    }

    fn sightline<F>(
        &self,
        candidate: Vec3,
        players: &PlayerView,
        is_occluded: &F,
        rays_left: &mut u32,
    ) -> Sightline
    where
        F: Fn(Vec3, Vec3) -> bool,
    {
        let view_distance_sq = self.config.view_distance.powi(2);
        for player in players.iter() {
            if player.position.distance_squared(candidate) > view_distance_sq {
                continue;
            }
            if *rays_left == 0 {
                return Sightline::BudgetExhausted;
            }
            *rays_left -= 1;
            if !is_occluded(player.position, candidate) {
                return Sightline::Visible;
            }
        }
        Sightline::Hidden
    }

    fn draw_biased(&mut self, desired: usize, behind: &[Vec3], front: &[Vec3]) -> Vec<Vec3> {
        // Both partitions inherit the shuffled evaluation order, so taking a
        // prefix is a uniform draw without replacement.
        let fraction = self.config.behind_fraction.clamp(0.0, 1.0);
        let share = desired as f32 * fraction;
        let mut behind_target = share.floor() as usize;
        // The fractional part rounds up at random so small requests keep the
        // configured share on average.
        let remainder = share - share.floor();
        if remainder > 0.0 && self.rng.gen_bool(f64::from(remainder)) {
            behind_target += 1;
        }

        let mut take_behind = behind_target.min(behind.len());
        let take_front = (desired - take_behind).min(front.len());
        let shortfall = desired - take_behind - take_front;
        take_behind += shortfall.min(behind.len() - take_behind);

        let mut selected = Vec::with_capacity(take_behind + take_front);
        selected.extend_from_slice(&behind[..take_behind]);
        selected.extend_from_slice(&front[..take_front]);
        selected
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Sightline {
    Hidden,
    Visible,
    BudgetExhausted,
}

fn is_behind_any(candidate: Vec3, players: &PlayerView) -> bool {
    players.iter().any(|player| {
        let direction = (candidate - player.position).normalize_or_zero();
        player.forward.dot(direction) < 0.0
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn selector(behind_fraction: f32) -> SpawnPointSelector {
        SpawnPointSelector::new(
            SelectionConfig {
                behind_fraction,
                ..SelectionConfig::default()
            },
            1,
        )
    }

    fn points(count: usize, x: f32) -> Vec<Vec3> {
        (0..count).map(|index| Vec3::new(x, 0.0, index as f32)).collect()
    }

    #[test]
    fn draw_prefers_behind_partition() {
        let mut selector = selector(0.75);
        let behind = points(6, -1.0);
        let front = points(2, 1.0);
        let drawn = selector.draw_biased(4, &behind, &front);
        assert_eq!(drawn.iter().filter(|p| p.x < 0.0).count(), 3);
        assert_eq!(drawn.iter().filter(|p| p.x > 0.0).count(), 1);
    }

    #[test]
    fn draw_backfills_from_behind_when_front_is_short() {
        let mut selector = selector(0.75);
        let drawn = selector.draw_biased(4, &points(6, -1.0), &[]);
        assert_eq!(drawn.len(), 4);
    }

    #[test]
    fn draw_backfills_from_front_when_behind_is_short() {
        let mut selector = selector(0.75);
        let drawn = selector.draw_biased(4, &points(1, -1.0), &points(5, 1.0));
        assert_eq!(drawn.len(), 4);
        assert_eq!(drawn.iter().filter(|p| p.x < 0.0).count(), 1);
    }

    #[test]
    fn draw_returns_everything_when_both_are_short() {
        let mut selector = selector(0.75);
        let drawn = selector.draw_biased(10, &points(2, -1.0), &points(3, 1.0));
        assert_eq!(drawn.len(), 5);
    }

    #[test]
    fn config_rejects_bias_outside_unit_interval() {
        let config = SelectionConfig {
            behind_fraction: 1.5,
            ..SelectionConfig::default()
        };
        assert!(!config.is_valid());
        assert!(SelectionConfig::default().is_valid());
    }
}
