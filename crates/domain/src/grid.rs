//! The treasure grid and the blast-radius math over it.

use std::fmt;

use crate::block::Block;
use crate::error::DomainError;
use crate::hero::{Hero, Skill};

pub const GRID_WIDTH: usize = 35;
pub const GRID_HEIGHT: usize = 17;

/// One cell of the grid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Tile {
    /// Impassable and immutable; placed at the fixed parity pattern.
    Wall,
    /// No destructible content.
    Empty,
    /// Destructible content; becomes `Empty` the instant its hp reaches zero.
    Block(Block),
}

impl Tile {
    pub fn is_wall(&self) -> bool {
        matches!(self, Tile::Wall)
    }

    pub fn is_empty_tile(&self) -> bool {
        matches!(self, Tile::Empty)
    }

    pub fn block(&self) -> Option<&Block> {
        match self {
            Tile::Block(block) => Some(block),
            _ => None,
        }
    }
}

/// Reachable tile coordinates per axis direction from one cell.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CrossTiles {
    pub left: Vec<(usize, usize)>,
    pub right: Vec<(usize, usize)>,
    pub up: Vec<(usize, usize)>,
    pub down: Vec<(usize, usize)>,
}

/// Projected damage per axis direction from one cell.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CrossDamage {
    pub left: u32,
    pub right: u32,
    pub up: u32,
    pub down: u32,
}

impl CrossDamage {
    pub fn total(&self) -> u32 {
        self.left + self.right + self.up + self.down
    }
}

/// A candidate placement with its projected damage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Target {
    pub i: usize,
    pub j: usize,
    pub damage: u32,
}

/// The full tile matrix, derived from a flat block list plus the wall rule.
#[derive(Debug, Clone)]
pub struct Grid {
    tiles: Vec<Tile>,
}

impl Default for Grid {
    /// An unloaded grid: the static pattern with no blocks, zero total life.
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl Grid {
    /// Build the matrix from a block snapshot.
    ///
    /// Walls sit at `i odd && j odd`; blocks overwrite whatever the static
    /// pattern put at their coordinates.
    pub fn new(blocks: Vec<Block>) -> Self {
        let mut tiles: Vec<Tile> = (0..GRID_WIDTH * GRID_HEIGHT)
            .map(|k| {
                let (i, j) = (k % GRID_WIDTH, k / GRID_WIDTH);
                if Self::is_wall_cell(i, j) {
                    Tile::Wall
                } else {
                    Tile::Empty
                }
            })
            .collect();

        for block in blocks {
            if block.i < GRID_WIDTH && block.j < GRID_HEIGHT {
                let idx = Self::index(block.i, block.j);
                tiles[idx] = Tile::Block(block);
            }
        }

        Self { tiles }
    }

    pub fn is_wall_cell(i: usize, j: usize) -> bool {
        i % 2 == 1 && j % 2 == 1
    }

    fn index(i: usize, j: usize) -> usize {
        j * GRID_WIDTH + i
    }

    pub fn at(&self, i: usize, j: usize) -> Result<&Tile, DomainError> {
        if i >= GRID_WIDTH || j >= GRID_HEIGHT {
            return Err(DomainError::InvalidMapIndices(format!(
                "indices [{i}, {j}] are out of bounds"
            )));
        }
        Ok(&self.tiles[Self::index(i, j)])
    }

    pub fn blocks(&self) -> impl Iterator<Item = &Block> {
        self.tiles.iter().filter_map(Tile::block)
    }

    /// Sum of hp over all block tiles.
    pub fn total_life(&self) -> i64 {
        self.blocks().map(|block| i64::from(block.hp)).sum()
    }

    pub fn total_max_life(&self) -> i64 {
        self.blocks().map(|block| i64::from(block.max_hp)).sum()
    }

    /// The grid is harvested out once no block hp remains.
    pub fn is_depleted(&self) -> bool {
        self.total_life() <= 0
    }

    /// Apply a server-confirmed hp update to the block at `(i, j)`.
    ///
    /// The addressed tile must currently be a block. At hp zero the tile
    /// becomes `Empty` in the same operation; that is the only way a tile
    /// ever changes variant.
    pub fn apply_damage(&mut self, i: usize, j: usize, hp: i32) -> Result<(), DomainError> {
        self.at(i, j)?;
        let k = Self::index(i, j);

        match &mut self.tiles[k] {
            Tile::Block(block) => block.hp = hp,
            _ => {
                return Err(DomainError::InvalidMapIndices(format!(
                    "tile at [{i}, {j}] is not a block"
                )))
            }
        }
        if hp <= 0 {
            self.tiles[k] = Tile::Empty;
        }
        Ok(())
    }

    fn ray(
        &self,
        i: usize,
        j: usize,
        di: isize,
        dj: isize,
        range: u32,
        block_is_barrier: bool,
    ) -> Vec<(usize, usize)> {
        let mut out = Vec::new();
        for step in 1..=range as isize {
            let ni = i as isize + di * step;
            let nj = j as isize + dj * step;
            if ni < 0 || nj < 0 || ni >= GRID_WIDTH as isize || nj >= GRID_HEIGHT as isize {
                break;
            }
            let (ni, nj) = (ni as usize, nj as usize);
            match &self.tiles[Self::index(ni, nj)] {
                Tile::Wall => break,
                Tile::Block(_) => {
                    // The first block in a direction absorbs the hit; it only
                    // stops the ray when blocks count as barriers.
                    out.push((ni, nj));
                    if block_is_barrier {
                        break;
                    }
                }
                Tile::Empty => out.push((ni, nj)),
            }
        }
        out
    }

    /// Tiles reachable from `(i, j)` in the four axis directions, bounded by
    /// `range`, stopped by walls and (optionally) by blocks.
    pub fn cross_tiles(
        &self,
        range: u32,
        i: usize,
        j: usize,
        block_is_barrier: bool,
    ) -> Result<CrossTiles, DomainError> {
        self.at(i, j)?;
        Ok(CrossTiles {
            left: self.ray(i, j, -1, 0, range, block_is_barrier),
            right: self.ray(i, j, 1, 0, range, block_is_barrier),
            up: self.ray(i, j, 0, 1, range, block_is_barrier),
            down: self.ray(i, j, 0, -1, range, block_is_barrier),
        })
    }

    fn hp_along(&self, coords: &[(usize, usize)]) -> u32 {
        coords
            .iter()
            .filter_map(|(i, j)| self.tiles[Self::index(*i, *j)].block())
            .map(|block| block.hp.max(0) as u32)
            .sum()
    }

    /// Block hp reachable per direction from `(i, j)`.
    pub fn cross_hp(
        &self,
        range: u32,
        i: usize,
        j: usize,
        block_is_barrier: bool,
    ) -> Result<CrossDamage, DomainError> {
        let tiles = self.cross_tiles(range, i, j, block_is_barrier)?;
        Ok(CrossDamage {
            left: self.hp_along(&tiles.left),
            right: self.hp_along(&tiles.right),
            up: self.hp_along(&tiles.up),
            down: self.hp_along(&tiles.down),
        })
    }

    /// Damage `hero` would deal from the empty tile `(i, j)`.
    ///
    /// Each direction's total is capped at the hero's single-hit damage: a
    /// hero cannot deal more in one direction than its damage stat, no
    /// matter how much hp sits there.
    pub fn hero_damage_at(
        &self,
        hero: &Hero,
        i: usize,
        j: usize,
    ) -> Result<CrossDamage, DomainError> {
        if !self.at(i, j)?.is_empty_tile() {
            return Err(DomainError::InvalidMapIndices(format!(
                "tile at [{i}, {j}] is not empty"
            )));
        }

        let block_is_barrier = !hero.has_skill(Skill::BlockPiercing);
        let cross = self.cross_hp(hero.range(), i, j, block_is_barrier)?;
        let cap = hero.damage();
        Ok(CrossDamage {
            left: cross.left.min(cap),
            right: cross.right.min(cap),
            up: cross.up.min(cap),
            down: cross.down.min(cap),
        })
    }

    /// Every empty tile, ranked by projected damage, best first.
    pub fn rank_targets(&self, hero: &Hero) -> Vec<Target> {
        let mut targets: Vec<Target> = (0..self.tiles.len())
            .filter(|k| self.tiles[*k].is_empty_tile())
            .map(|k| {
                let (i, j) = (k % GRID_WIDTH, k / GRID_WIDTH);
                // Cannot fail: the tile was just checked to be empty.
                let damage = self
                    .hero_damage_at(hero, i, j)
                    .map(|cross| cross.total())
                    .unwrap_or(0);
                Target { i, j, damage }
            })
            .collect();
        targets.sort_by(|a, b| b.damage.cmp(&a.damage));
        targets
    }
}

impl fmt::Display for Grid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Map: {}/{}", self.total_life(), self.total_max_life())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::BlockKind;
    use crate::hero::{HeroState, HeroStats, Rarity, Skin};

    fn block(i: usize, j: usize, hp: i32) -> Block {
        Block {
            kind: BlockKind::Green,
            i,
            j,
            hp,
            max_hp: hp,
        }
    }

    fn hero(strength: u32, range: u32, skills: Vec<Skill>) -> Hero {
        let stats = HeroStats {
            index: 0,
            rarity: Rarity::Common,
            rarity_index: 0,
            level: 1,
            variant: 0,
            skin: Skin::Frog,
            stamina: 2,
            speed: 5,
            bomb_skin: 0,
            skill_count: skills.len() as u32,
            strength,
            range,
            capacity: 1,
            skills,
        };
        Hero::new(1, stats, HeroState::Work, 100, true)
    }

    #[test]
    fn walls_follow_the_parity_pattern() {
        let grid = Grid::new(Vec::new());
        assert!(grid.at(1, 1).expect("in bounds").is_wall());
        assert!(grid.at(2, 1).expect("in bounds").is_empty_tile());
        assert!(grid.at(1, 2).expect("in bounds").is_empty_tile());
    }

    #[test]
    fn out_of_bounds_lookup_fails() {
        let grid = Grid::new(Vec::new());
        assert!(matches!(
            grid.at(GRID_WIDTH, 0),
            Err(DomainError::InvalidMapIndices(_))
        ));
    }

    #[test]
    fn wall_blocks_the_ray_before_a_block_behind_it() {
        // Hero stands at (1, 0). Left: adjacent block of hp 5. Up: the parity
        // wall at (1, 1) hides a block of hp 9 at (1, 2).
        let grid = Grid::new(vec![block(0, 0, 5), block(1, 2, 9)]);
        let hero = hero(10, 3, Vec::new());

        let cross = grid.hero_damage_at(&hero, 1, 0).expect("empty tile");
        assert_eq!(cross.left, 5);
        assert_eq!(cross.up, 0);
        assert_eq!(cross.total(), 5);
    }

    #[test]
    fn directional_damage_is_capped_at_the_hero_stat() {
        let grid = Grid::new(vec![block(1, 0, 20)]);
        let hero = hero(3, 2, Vec::new());

        let cross = grid.hero_damage_at(&hero, 0, 0).expect("empty tile");
        assert_eq!(cross.right, 3);
    }

    #[test]
    fn piercing_reaches_past_the_first_block() {
        let grid = Grid::new(vec![block(1, 0, 2), block(2, 0, 2)]);

        let plain = hero(10, 3, Vec::new());
        let cross = grid.hero_damage_at(&plain, 0, 0).expect("empty tile");
        assert_eq!(cross.right, 2);

        let piercer = hero(10, 3, vec![Skill::BlockPiercing]);
        let cross = grid.hero_damage_at(&piercer, 0, 0).expect("empty tile");
        assert_eq!(cross.right, 4);
    }

    #[test]
    fn damage_on_a_non_empty_tile_is_rejected() {
        let grid = Grid::new(vec![block(1, 0, 2)]);
        let hero = hero(3, 2, Vec::new());
        assert!(matches!(
            grid.hero_damage_at(&hero, 1, 0),
            Err(DomainError::InvalidMapIndices(_))
        ));
    }

    #[test]
    fn depleting_a_block_empties_the_tile_and_total_life() {
        let mut grid = Grid::new(vec![block(0, 0, 5), block(2, 0, 7)]);
        assert_eq!(grid.total_life(), 12);

        grid.apply_damage(0, 0, 2).expect("block tile");
        assert_eq!(grid.total_life(), 9);

        grid.apply_damage(0, 0, 0).expect("block tile");
        assert!(grid.at(0, 0).expect("in bounds").is_empty_tile());
        assert_eq!(grid.total_life(), 7);

        // The transition is irreversible until a full reload.
        assert!(matches!(
            grid.apply_damage(0, 0, 3),
            Err(DomainError::InvalidMapIndices(_))
        ));
        assert!(!grid.is_depleted());

        grid.apply_damage(2, 0, 0).expect("block tile");
        assert!(grid.is_depleted());
    }

    #[test]
    fn rank_targets_orders_by_projected_damage() {
        // A fat block cluster near the origin, nothing elsewhere.
        let grid = Grid::new(vec![block(0, 0, 4), block(2, 0, 4), block(1, 2, 4)]);
        let hero = hero(10, 2, Vec::new());

        let ranked = grid.rank_targets(&hero);
        let best = ranked.first().expect("grid has empty tiles");
        // (1, 0) sees both row blocks; nothing beats it.
        assert_eq!((best.i, best.j), (1, 0));
        assert_eq!(best.damage, 8);
        assert!(ranked.windows(2).all(|w| w[0].damage >= w[1].damage));
    }
}
