//! Per-hero target selection and placement eligibility.
//!
//! The planner owns the state tied to in-flight placements: recent target
//! history, the cached next target, the last blast per hero and the live
//! bomb ids. All of it is invalidated together when the grid reloads.

use std::collections::{HashMap, VecDeque};
use std::time::{Duration, Instant};

use crate::grid::{Grid, Target};
use crate::hero::{Hero, HeroId};

/// Tunable scheduling knobs, passed in rather than buried as constants so
/// the eligibility rules are independently testable.
#[derive(Debug, Clone, Copy)]
pub struct PlannerPolicy {
    /// Rolling per-hero history length used to diversify targets.
    pub history_size: usize,
    /// Multiplier on the distance/speed travel budget between placements.
    pub cooldown_safety_factor: f64,
    /// Pause between per-hero launches within one round.
    pub round_stagger: Duration,
    /// Pause between committing to a target and sending the placement.
    pub place_delay: Duration,
}

impl Default for PlannerPolicy {
    fn default() -> Self {
        Self {
            history_size: 5,
            cooldown_safety_factor: 1.2,
            round_stagger: Duration::from_millis(70),
            place_delay: Duration::from_secs(3),
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Blast {
    at: Instant,
    i: usize,
    j: usize,
}

#[derive(Debug, Clone, Default)]
struct BombSlots {
    last_id: u32,
    live: Vec<u32>,
}

#[derive(Debug)]
pub struct Planner {
    policy: PlannerPolicy,
    history: HashMap<HeroId, VecDeque<(usize, usize)>>,
    targets: HashMap<HeroId, Target>,
    blasts: HashMap<HeroId, Blast>,
    bombs: HashMap<HeroId, BombSlots>,
}

impl Default for Planner {
    fn default() -> Self {
        Self::new(PlannerPolicy::default())
    }
}

impl Planner {
    pub fn new(policy: PlannerPolicy) -> Self {
        Self {
            policy,
            history: HashMap::new(),
            targets: HashMap::new(),
            blasts: HashMap::new(),
            bombs: HashMap::new(),
        }
    }

    pub fn policy(&self) -> &PlannerPolicy {
        &self.policy
    }

    /// Pick the next tile for `hero`, or `None` when no tile yields damage.
    ///
    /// A target already committed for this hero is returned unchanged until
    /// `begin_blast` consumes it. With few candidates there is no room to
    /// diversify and the top pick wins; otherwise tiles in the hero's recent
    /// history are skipped, falling back to the top pick when the filter
    /// leaves nothing.
    pub fn next_target(&mut self, hero: &Hero, grid: &Grid) -> Option<Target> {
        if let Some(target) = self.targets.get(&hero.id()) {
            return Some(*target);
        }

        let candidates: Vec<Target> = grid
            .rank_targets(hero)
            .into_iter()
            .filter(|target| target.damage > 0)
            .collect();
        let first = *candidates.first()?;

        let selected = if candidates.len() <= self.policy.history_size {
            first
        } else {
            let history = self.history.get(&hero.id());
            candidates
                .iter()
                .find(|target| {
                    !history.is_some_and(|seen| seen.contains(&(target.i, target.j)))
                })
                .copied()
                .unwrap_or(first)
        };

        self.targets.insert(hero.id(), selected);
        Some(selected)
    }

    pub fn live_bombs(&self, hero_id: HeroId) -> usize {
        self.bombs
            .get(&hero_id)
            .map(|slots| slots.live.len())
            .unwrap_or(0)
    }

    /// Whether `hero` may place on `target` at `now`.
    ///
    /// A hero with no prior blast is always eligible. Otherwise enough
    /// wall-clock time must have passed to plausibly travel from the last
    /// target, and the hero must have a free bomb slot.
    pub fn can_place(&self, hero: &Hero, target: Target, now: Instant) -> bool {
        let Some(blast) = self.blasts.get(&hero.id()) else {
            return true;
        };

        let distance = blast.i.abs_diff(target.i) + blast.j.abs_diff(target.j);
        let speed = hero.speed().max(1);
        let budget_ms =
            distance as f64 / f64::from(speed) * 1000.0 * self.policy.cooldown_safety_factor;
        let elapsed = now.saturating_duration_since(blast.at);

        elapsed.as_millis() as f64 >= budget_ms
            && self.live_bombs(hero.id()) < hero.capacity() as usize
    }

    /// Commit `hero` to `target`: allocate a bomb id, record the blast
    /// instant, drop the cached target and remember the tile in history.
    pub fn begin_blast(&mut self, hero: &Hero, target: Target, now: Instant) -> u32 {
        let slots = self.bombs.entry(hero.id()).or_default();
        slots.last_id += 1;
        if slots.last_id > hero.capacity() {
            slots.last_id = 1;
        }
        let bomb_id = slots.last_id;
        slots.live.push(bomb_id);

        self.blasts.insert(
            hero.id(),
            Blast {
                at: now,
                i: target.i,
                j: target.j,
            },
        );
        self.targets.remove(&hero.id());

        let history = self.history.entry(hero.id()).or_default();
        history.push_back((target.i, target.j));
        while history.len() > self.policy.history_size {
            history.pop_front();
        }

        bomb_id
    }

    /// Release the bomb slot once the placement settled (either way).
    pub fn finish_blast(&mut self, hero_id: HeroId, bomb_id: u32) {
        if let Some(slots) = self.bombs.get_mut(&hero_id) {
            slots.live.retain(|id| *id != bomb_id);
        }
    }

    /// Drop all planning state. Must run before the grid is reloaded.
    pub fn invalidate(&mut self) {
        self.history.clear();
        self.targets.clear();
        self.blasts.clear();
        self.bombs.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::{Block, BlockKind};
    use crate::hero::{HeroState, HeroStats, Rarity, Skin};

    fn hero(id: HeroId, speed: u32, capacity: u32) -> Hero {
        let stats = HeroStats {
            index: 0,
            rarity: Rarity::Common,
            rarity_index: 0,
            level: 1,
            variant: 0,
            skin: Skin::Frog,
            stamina: 2,
            speed,
            bomb_skin: 0,
            skill_count: 0,
            strength: 10,
            range: 1,
            capacity,
            skills: Vec::new(),
        };
        Hero::new(id, stats, HeroState::Work, 100, true)
    }

    fn block(i: usize, j: usize, hp: i32) -> Block {
        Block {
            kind: BlockKind::Green,
            i,
            j,
            hp,
            max_hp: hp,
        }
    }

    /// A grid with well over `history_size` positive-damage tiles.
    fn busy_grid() -> Grid {
        let blocks = (0..8)
            .map(|n| block(n * 4, 2, (8 - n) as i32))
            .collect::<Vec<_>>();
        Grid::new(blocks)
    }

    #[test]
    fn hero_with_no_prior_blast_is_eligible() {
        let planner = Planner::new(PlannerPolicy::default());
        let target = Target {
            i: 4,
            j: 4,
            damage: 3,
        };
        assert!(planner.can_place(&hero(1, 5, 1), target, Instant::now()));
    }

    #[test]
    fn full_capacity_blocks_placement_even_after_the_cooldown() {
        let mut planner = Planner::new(PlannerPolicy::default());
        let hero = hero(1, 5, 1);
        let grid = busy_grid();
        let now = Instant::now();

        let target = planner.next_target(&hero, &grid).expect("candidates");
        planner.begin_blast(&hero, target, now);
        assert_eq!(planner.live_bombs(hero.id()), 1);

        let mut next = planner.next_target(&hero, &grid).expect("candidates");
        // Same tile would mean zero distance and thus a zero travel budget;
        // the capacity check alone must hold the hero back.
        next.i = target.i;
        next.j = target.j;
        let later = now + Duration::from_secs(60);
        assert!(!planner.can_place(&hero, next, later));

        planner.finish_blast(hero.id(), 1);
        assert!(planner.can_place(&hero, next, later));
    }

    #[test]
    fn cooldown_scales_with_distance_and_speed() {
        let mut planner = Planner::new(PlannerPolicy::default());
        let hero = hero(1, 1, 10);
        let grid = busy_grid();
        let now = Instant::now();

        let target = planner.next_target(&hero, &grid).expect("candidates");
        planner.begin_blast(&hero, target, now);

        let far = Target {
            i: target.i + 10,
            j: target.j,
            damage: 1,
        };
        // 10 tiles at speed 1 with the 1.2 factor: 12s of travel budget.
        assert!(!planner.can_place(&hero, far, now + Duration::from_secs(11)));
        assert!(planner.can_place(&hero, far, now + Duration::from_secs(13)));
    }

    #[test]
    fn bomb_ids_wrap_at_capacity() {
        let mut planner = Planner::new(PlannerPolicy::default());
        let hero = hero(1, 5, 2);
        let grid = busy_grid();
        let now = Instant::now();

        for expected in [1, 2, 1] {
            let target = planner.next_target(&hero, &grid).expect("candidates");
            let id = planner.begin_blast(&hero, target, now);
            assert_eq!(id, expected);
            planner.finish_blast(hero.id(), id);
        }
    }

    #[test]
    fn two_heroes_converge_then_diversify() {
        let mut planner = Planner::new(PlannerPolicy::default());
        let grid = busy_grid();
        let alice = hero(1, 5, 3);
        let bob = hero(2, 5, 3);
        let now = Instant::now();

        // First round: empty histories, both pick the top-ranked tile.
        let first_a = planner.next_target(&alice, &grid).expect("candidates");
        let first_b = planner.next_target(&bob, &grid).expect("candidates");
        assert_eq!((first_a.i, first_a.j), (first_b.i, first_b.j));

        planner.begin_blast(&alice, first_a, now);
        planner.begin_blast(&bob, first_b, now);

        // Second round: the tile sits in each hero's own history and enough
        // candidates exist to diversify away from it.
        let second_a = planner.next_target(&alice, &grid).expect("candidates");
        let second_b = planner.next_target(&bob, &grid).expect("candidates");
        assert_ne!((second_a.i, second_a.j), (first_a.i, first_a.j));
        assert_ne!((second_b.i, second_b.j), (first_b.i, first_b.j));
    }

    #[test]
    fn invalidate_drops_all_planning_state() {
        let mut planner = Planner::new(PlannerPolicy::default());
        let hero = hero(1, 5, 2);
        let grid = busy_grid();
        let target = planner.next_target(&hero, &grid).expect("candidates");
        planner.begin_blast(&hero, target, Instant::now());

        planner.invalidate();
        assert_eq!(planner.live_bombs(hero.id()), 0);
        assert!(planner.can_place(&hero, target, Instant::now()));
    }
}
