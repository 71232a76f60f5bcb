//! The squad: a player's heroes, indexed for O(1) lookup.

use std::collections::HashMap;

use crate::error::DomainError;
use crate::hero::{Hero, HeroId, HeroState};

/// The set of a player's heroes.
///
/// Lookup by an unknown id is a hard failure, never a silent no-op: ids are
/// assumed to come from a prior successful roster load, so a miss means the
/// snapshot and the caller disagree.
#[derive(Debug, Default, Clone)]
pub struct Squad {
    heroes: Vec<Hero>,
    by_id: HashMap<HeroId, usize>,
}

impl Squad {
    pub fn new(heroes: Vec<Hero>) -> Self {
        let mut squad = Self::default();
        squad.replace(heroes);
        squad
    }

    /// Swap in a fresh roster snapshot, replacing all previous state.
    pub fn replace(&mut self, heroes: Vec<Hero>) {
        self.by_id = heroes
            .iter()
            .enumerate()
            .map(|(idx, hero)| (hero.id(), idx))
            .collect();
        self.heroes = heroes;
    }

    pub fn heroes(&self) -> &[Hero] {
        &self.heroes
    }

    pub fn len(&self) -> usize {
        self.heroes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heroes.is_empty()
    }

    pub fn active(&self) -> impl Iterator<Item = &Hero> {
        self.heroes.iter().filter(|hero| hero.active())
    }

    pub fn by_state(&self, state: HeroState) -> Vec<&Hero> {
        self.active().filter(|hero| hero.state() == state).collect()
    }

    /// Active heroes that are not currently working.
    pub fn not_working(&self) -> Vec<&Hero> {
        self.active()
            .filter(|hero| hero.state() != HeroState::Work)
            .collect()
    }

    /// The highest-rarity active hero, if any.
    pub fn rarest(&self) -> Option<&Hero> {
        self.active().max_by_key(|hero| hero.stats().rarity_index)
    }

    pub fn hero(&self, id: HeroId) -> Result<&Hero, DomainError> {
        self.by_id
            .get(&id)
            .map(|idx| &self.heroes[*idx])
            .ok_or(DomainError::InvalidHeroId(id))
    }

    pub fn hero_mut(&mut self, id: HeroId) -> Result<&mut Hero, DomainError> {
        match self.by_id.get(&id) {
            Some(idx) => Ok(&mut self.heroes[*idx]),
            None => Err(DomainError::InvalidHeroId(id)),
        }
    }

    /// Apply a server-confirmed energy update.
    pub fn apply_energy(&mut self, id: HeroId, energy: i32) -> Result<(), DomainError> {
        self.hero_mut(id)?.set_energy(energy);
        Ok(())
    }

    /// Apply a server-confirmed state transition.
    pub fn apply_state(&mut self, id: HeroId, state: HeroState) -> Result<(), DomainError> {
        self.hero_mut(id)?.set_state(state);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hero::{HeroStats, Rarity, Skin};

    fn stats(rarity_index: u32) -> HeroStats {
        HeroStats {
            index: 0,
            rarity: Rarity::from_index(rarity_index),
            rarity_index,
            level: 1,
            variant: 0,
            skin: Skin::Frog,
            stamina: 2,
            speed: 5,
            bomb_skin: 0,
            skill_count: 0,
            strength: 3,
            range: 2,
            capacity: 1,
            skills: Vec::new(),
        }
    }

    fn squad() -> Squad {
        Squad::new(vec![
            Hero::new(1, stats(0), HeroState::Work, 50, true),
            Hero::new(2, stats(4), HeroState::Sleep, 10, true),
            Hero::new(3, stats(2), HeroState::Home, 80, false),
        ])
    }

    #[test]
    fn unknown_id_is_a_hard_failure() {
        let squad = squad();
        assert!(matches!(
            squad.hero(99),
            Err(DomainError::InvalidHeroId(99))
        ));
    }

    #[test]
    fn inactive_heroes_are_excluded_from_views() {
        let squad = squad();
        assert_eq!(squad.by_state(HeroState::Home).len(), 0);
        assert_eq!(squad.not_working().len(), 1);
        assert_eq!(squad.not_working()[0].id(), 2);
    }

    #[test]
    fn rarest_picks_highest_rarity_index() {
        let squad = squad();
        assert_eq!(squad.rarest().map(Hero::id), Some(2));
    }

    #[test]
    fn confirmed_updates_mutate_the_hero() {
        let mut squad = squad();
        squad.apply_energy(2, 60).expect("known id");
        squad.apply_state(2, HeroState::Work).expect("known id");
        let hero = squad.hero(2).expect("known id");
        assert_eq!(hero.energy(), 60);
        assert_eq!(hero.state(), HeroState::Work);
    }

    #[test]
    fn replace_rebuilds_the_index() {
        let mut squad = squad();
        squad.replace(vec![Hero::new(7, stats(1), HeroState::Work, 5, true)]);
        assert!(squad.hero(1).is_err());
        assert_eq!(squad.hero(7).expect("known id").id(), 7);
    }
}
