//! Heroes: decoded stats plus the small mutable runtime state.

use std::fmt;

use crate::error::DomainError;
use crate::gen::GenBits;

pub type HeroId = u64;

/// Multiplier from the stamina stat to the energy ceiling.
const ENERGY_PER_STAMINA: i32 = 50;

// Bit offsets of the fixed-position stat fields (LSB-first, wire contract).
const GI_INDEX: usize = 30;
const GI_RARITY: usize = 40;
const GI_LEVEL: usize = 45;
const GI_VARIANT: usize = 50;
const GI_SKIN: usize = 55;
const GI_STAMINA: usize = 60;
const GI_SPEED: usize = 65;
const GI_BOMB_SKIN: usize = 70;
const GI_SKILL_COUNT: usize = 75;
const GI_STRENGTH: usize = 80;
const GI_RANGE: usize = 85;
const GI_CAPACITY: usize = 90;
const GI_SKILLS: usize = 95;

/// Where a hero currently is in its work/rest cycle.
///
/// Transitions happen only in reaction to confirmed server responses; the
/// client never predicts a transition locally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HeroState {
    Work,
    Sleep,
    Home,
    Unknown,
}

impl HeroState {
    pub fn from_stage(stage: u32) -> Self {
        match stage {
            0 => Self::Work,
            1 => Self::Sleep,
            2 => Self::Home,
            _ => Self::Unknown,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Rarity {
    Common,
    Rare,
    SuperRare,
    Epic,
    Legend,
    SuperLegend,
    Unknown,
}

impl Rarity {
    pub fn from_index(index: u32) -> Self {
        match index {
            0 => Self::Common,
            1 => Self::Rare,
            2 => Self::SuperRare,
            3 => Self::Epic,
            4 => Self::Legend,
            5 => Self::SuperLegend,
            _ => Self::Unknown,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Skin {
    Frog,
    Knight,
    Cowboy,
    Vampire,
    Witch,
    Doge,
    Pepe,
    Ninja,
    Unknown,
}

impl Skin {
    pub fn from_code(code: u32) -> Self {
        match code {
            1 => Self::Frog,
            2 => Self::Knight,
            3 => Self::Cowboy,
            4 => Self::Vampire,
            5 => Self::Witch,
            6 => Self::Doge,
            7 => Self::Pepe,
            8 => Self::Ninja,
            _ => Self::Unknown,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Skill {
    AdOnChestExplosion,
    AdOnCageExplosion,
    /// Blast rays pass through blocks; only walls stop them.
    BlockPiercing,
    EnergyShield,
    Battery,
    WalkThroughBomb,
    WalkThroughBlock,
    Unknown,
}

impl Skill {
    pub fn from_id(id: u32) -> Self {
        match id {
            1 => Self::AdOnChestExplosion,
            2 => Self::AdOnCageExplosion,
            3 => Self::BlockPiercing,
            4 => Self::EnergyShield,
            5 => Self::Battery,
            6 => Self::WalkThroughBomb,
            7 => Self::WalkThroughBlock,
            _ => Self::Unknown,
        }
    }
}

/// The immutable stat block decoded from a hero's gen id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeroStats {
    pub index: u32,
    pub rarity: Rarity,
    pub rarity_index: u32,
    pub level: u32,
    pub variant: u32,
    pub skin: Skin,
    pub stamina: u32,
    pub speed: u32,
    pub bomb_skin: u32,
    pub skill_count: u32,
    pub strength: u32,
    pub range: u32,
    pub capacity: u32,
    pub skills: Vec<Skill>,
}

impl HeroStats {
    /// Decode a hero gen id.
    ///
    /// Fails with `InvalidGenId` when the identifier is shorter than the
    /// fixed-position fields require; trailing 5-bit skill slices are read
    /// to the identifier's last significant bit.
    pub fn decode(gen_id: &str) -> Result<Self, DomainError> {
        let bits = GenBits::parse(gen_id)?;
        if bits.len() < GI_SKILLS {
            return Err(DomainError::InvalidGenId(gen_id.to_string()));
        }

        let rarity_index = bits.field(GI_RARITY, GI_LEVEL);
        let skills = bits
            .tail(GI_SKILLS, 5)
            .into_iter()
            .map(Skill::from_id)
            .collect();

        Ok(Self {
            index: bits.field(GI_INDEX, GI_RARITY),
            rarity: Rarity::from_index(rarity_index),
            rarity_index,
            level: bits.field(GI_LEVEL, GI_VARIANT),
            variant: bits.field(GI_VARIANT, GI_SKIN),
            skin: Skin::from_code(bits.field(GI_SKIN, GI_STAMINA)),
            stamina: bits.field(GI_STAMINA, GI_SPEED),
            speed: bits.field(GI_SPEED, GI_BOMB_SKIN),
            bomb_skin: bits.field(GI_BOMB_SKIN, GI_SKILL_COUNT),
            skill_count: bits.field(GI_SKILL_COUNT, GI_STRENGTH),
            strength: bits.field(GI_STRENGTH, GI_RANGE),
            range: bits.field(GI_RANGE, GI_CAPACITY),
            capacity: bits.field(GI_CAPACITY, GI_SKILLS),
            skills,
        })
    }
}

/// A hero: identity, stat block and runtime state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hero {
    id: HeroId,
    stats: HeroStats,
    state: HeroState,
    energy: i32,
    active: bool,
}

impl Hero {
    pub fn new(id: HeroId, stats: HeroStats, state: HeroState, energy: i32, active: bool) -> Self {
        Self {
            id,
            stats,
            state,
            energy,
            active,
        }
    }

    pub fn id(&self) -> HeroId {
        self.id
    }

    pub fn stats(&self) -> &HeroStats {
        &self.stats
    }

    pub fn state(&self) -> HeroState {
        self.state
    }

    pub fn active(&self) -> bool {
        self.active
    }

    pub fn max_energy(&self) -> i32 {
        self.stats.stamina as i32 * ENERGY_PER_STAMINA
    }

    /// Current energy, clamped to `[0, max_energy]`.
    ///
    /// An inactive hero always reports zero regardless of the stored value.
    pub fn energy(&self) -> i32 {
        if !self.active {
            return 0;
        }
        self.energy.clamp(0, self.max_energy())
    }

    pub fn energy_fraction(&self) -> f64 {
        let max = self.max_energy();
        if max == 0 {
            return 0.0;
        }
        f64::from(self.energy()) / f64::from(max)
    }

    /// Single-hit damage: strength plus one per level past the first.
    pub fn damage(&self) -> u32 {
        self.stats.strength + self.stats.level.saturating_sub(1)
    }

    pub fn speed(&self) -> u32 {
        self.stats.speed
    }

    pub fn range(&self) -> u32 {
        self.stats.range
    }

    pub fn capacity(&self) -> u32 {
        self.stats.capacity
    }

    pub fn has_skill(&self, skill: Skill) -> bool {
        self.stats.skills.contains(&skill)
    }

    /// Applied only from confirmed server responses.
    pub fn set_state(&mut self, state: HeroState) {
        self.state = state;
    }

    /// Applied only from confirmed server responses.
    pub fn set_energy(&mut self, energy: i32) {
        self.energy = energy;
    }
}

impl fmt::Display for Hero {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {:?}-{}-{:?} STA {} SPD {} STR {} RNG {} CAP {} HP {}/{} {:?}",
            self.id,
            self.stats.skin,
            self.stats.variant,
            self.stats.rarity,
            self.stats.stamina,
            self.stats.speed,
            self.stats.strength,
            self.stats.range,
            self.stats.capacity,
            self.energy(),
            self.max_energy(),
            self.state,
        )
    }
}
