//! Side-quest ("adventure") progress as reported by the server.

use crate::hero::{HeroId, Rarity};

/// Levels past this are not offered by the server.
pub const MAX_STORY_LEVEL: u32 = 45;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StoryReward {
    pub rarity: Rarity,
    pub rarity_index: u32,
    pub first_win: f64,
    pub replay: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlayedHero {
    pub id: HeroId,
    pub remaining_time: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StoryDetails {
    pub is_new: bool,
    pub current_level: u32,
    pub max_level: u32,
    pub hero_id: HeroId,
    pub rewards: Vec<StoryReward>,
    pub played: Vec<PlayedHero>,
}

impl StoryDetails {
    /// The next level to attempt: one past the best cleared, capped.
    pub fn next_level(&self) -> u32 {
        (self.max_level + 1).min(MAX_STORY_LEVEL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn next_level_advances_and_caps() {
        let mut details = StoryDetails {
            is_new: false,
            current_level: 3,
            max_level: 3,
            hero_id: 1,
            rewards: Vec::new(),
            played: Vec::new(),
        };
        assert_eq!(details.next_level(), 4);

        details.max_level = 45;
        assert_eq!(details.next_level(), MAX_STORY_LEVEL);
    }
}
