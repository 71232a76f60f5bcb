//! Destructible blocks on the treasure grid.

use std::fmt;

/// What a block pays out when destroyed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockKind {
    Green,
    Rock,
    Cage,
    WoodChest,
    AmethystChest,
    GoldChest,
    DiamondChest,
    KeyChest,
    Unknown,
}

impl BlockKind {
    /// Map the wire's numeric block type; unmapped codes decode as `Unknown`.
    pub fn from_code(code: u32) -> Self {
        match code {
            0 => Self::Green,
            1 => Self::Rock,
            2 => Self::Cage,
            3 => Self::WoodChest,
            4 => Self::AmethystChest,
            5 => Self::GoldChest,
            6 => Self::DiamondChest,
            8 => Self::KeyChest,
            _ => Self::Unknown,
        }
    }
}

/// A destructible tile's payload: position, hit points and kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    pub kind: BlockKind,
    pub i: usize,
    pub j: usize,
    pub hp: i32,
    pub max_hp: i32,
}

impl fmt::Display for Block {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:?} [{}, {}] HP {}/{}",
            self.kind, self.i, self.j, self.hp, self.max_hp
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn block_codes_map_to_kinds() {
        assert_eq!(BlockKind::from_code(0), BlockKind::Green);
        assert_eq!(BlockKind::from_code(8), BlockKind::KeyChest);
        // 7 is unassigned on the wire
        assert_eq!(BlockKind::from_code(7), BlockKind::Unknown);
        assert_eq!(BlockKind::from_code(99), BlockKind::Unknown);
    }
}
