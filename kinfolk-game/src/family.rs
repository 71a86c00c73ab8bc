//! Family registry: the arena that owns every character.
//!
//! All cross-character links are [`CharacterId`] indices into this registry,
//! which keeps spouse and parent/child cycles out of the ownership graph and
//! lets the whole family serialize as a flat list.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::character::{Character, RelationshipStatus};

/// Stable index of a character within its registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CharacterId(pub u32);

impl CharacterId {
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for CharacterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FamilyRegistry {
    members: Vec<Character>,
}

impl FamilyRegistry {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            members: Vec::new(),
        }
    }

    /// Register a character and hand back its id.
    pub fn insert(&mut self, character: Character) -> CharacterId {
        let id = CharacterId(u32::try_from(self.members.len()).unwrap_or(u32::MAX));
        self.members.push(character);
        id
    }

    #[must_use]
    pub fn get(&self, id: CharacterId) -> Option<&Character> {
        self.members.get(id.index())
    }

    pub fn get_mut(&mut self, id: CharacterId) -> Option<&mut Character> {
        self.members.get_mut(id.index())
    }

    /// Mutable access to two distinct characters at once.
    pub fn pair_mut(
        &mut self,
        first: CharacterId,
        second: CharacterId,
    ) -> Option<(&mut Character, &mut Character)> {
        let (a, b) = (first.index(), second.index());
        if a == b || a >= self.members.len() || b >= self.members.len() {
            return None;
        }
        if a < b {
            let (left, right) = self.members.split_at_mut(b);
            Some((&mut left[a], &mut right[0]))
        } else {
            let (left, right) = self.members.split_at_mut(a);
            Some((&mut right[0], &mut left[b]))
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.members.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = CharacterId> + '_ {
        (0..self.members.len()).map(|idx| CharacterId(u32::try_from(idx).unwrap_or(u32::MAX)))
    }

    pub fn iter(&self) -> impl Iterator<Item = (CharacterId, &Character)> + '_ {
        self.ids().zip(self.members.iter())
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (CharacterId, &mut Character)> + '_ {
        let count = self.members.len();
        (0..count)
            .map(|idx| CharacterId(u32::try_from(idx).unwrap_or(u32::MAX)))
            .zip(self.members.iter_mut())
    }

    pub fn living_ids(&self) -> Vec<CharacterId> {
        self.iter()
            .filter(|(_, character)| character.alive)
            .map(|(id, _)| id)
            .collect()
    }

    #[must_use]
    pub fn spouse_of(&self, id: CharacterId) -> Option<CharacterId> {
        self.get(id).and_then(|character| character.spouse)
    }

    /// Marry two characters, writing both sides of the link.
    pub fn link_spouses(&mut self, first: CharacterId, second: CharacterId) -> bool {
        let Some((a, b)) = self.pair_mut(first, second) else {
            return false;
        };
        a.spouse = Some(second);
        b.spouse = Some(first);
        a.relationship_status = RelationshipStatus::Married;
        b.relationship_status = RelationshipStatus::Married;
        true
    }

    /// Record `child` under each parent and each parent under `child`.
    pub fn link_child(&mut self, parents: &[CharacterId], child: CharacterId) {
        for &parent in parents {
            if parent == child {
                continue;
            }
            if let Some(record) = self.get_mut(parent)
                && !record.children.contains(&child)
            {
                record.children.push(child);
            }
            if let Some(record) = self.get_mut(child)
                && !record.parents.contains(&parent)
            {
                record.parents.push(parent);
            }
        }
    }

    /// Drop dangling ids and one-sided spouse links. Returns the number of repairs.
    pub fn repair_links(&mut self) -> usize {
        let len = self.members.len();
        let valid = |id: &CharacterId| id.index() < len;
        let spouses: Vec<Option<CharacterId>> = self.members.iter().map(|c| c.spouse).collect();
        let mut repairs = 0;
        for (idx, character) in self.members.iter_mut().enumerate() {
            let before = character.children.len() + character.parents.len();
            character.children.retain(valid);
            character.parents.retain(valid);
            repairs += before - (character.children.len() + character.parents.len());

            if let Some(partner) = character.spouse {
                let mutual = spouses
                    .get(partner.index())
                    .copied()
                    .flatten()
                    .is_some_and(|back| back.index() == idx);
                if !mutual {
                    character.spouse = None;
                    if character.relationship_status == RelationshipStatus::Married {
                        character.relationship_status = RelationshipStatus::Single;
                    }
                    repairs += 1;
                }
            }
        }
        repairs
    }

    /// True when every spouse link is mirrored.
    #[must_use]
    pub fn spouse_links_symmetric(&self) -> bool {
        self.iter().all(|(id, character)| {
            character
                .spouse
                .is_none_or(|partner| self.spouse_of(partner) == Some(id))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::character::Gender;

    fn couple() -> (FamilyRegistry, CharacterId, CharacterId) {
        let mut registry = FamilyRegistry::new();
        let a = registry.insert(Character::new("Rhea Lind", Gender::Female, 30));
        let b = registry.insert(Character::new("Otto Lind", Gender::Male, 32));
        (registry, a, b)
    }

    #[test]
    fn spouse_links_are_mutual() {
        let (mut registry, a, b) = couple();
        assert!(registry.link_spouses(a, b));
        assert_eq!(registry.spouse_of(a), Some(b));
        assert_eq!(registry.spouse_of(b), Some(a));
        assert!(registry.spouse_links_symmetric());
    }

    #[test]
    fn pair_mut_rejects_self_pairs() {
        let (mut registry, a, b) = couple();
        assert!(registry.pair_mut(a, a).is_none());
        let (first, second) = registry.pair_mut(b, a).unwrap();
        assert_eq!(first.name, "Otto Lind");
        assert_eq!(second.name, "Rhea Lind");
    }

    #[test]
    fn child_links_both_directions() {
        let (mut registry, a, b) = couple();
        let child = registry.insert(Character::new("Ila Lind", Gender::Female, 0));
        registry.link_child(&[a, b], child);
        registry.link_child(&[a], child);
        assert_eq!(registry.get(a).unwrap().children, vec![child]);
        assert_eq!(registry.get(child).unwrap().parents, vec![a, b]);
    }

    #[test]
    fn repair_drops_one_sided_links() {
        let (mut registry, a, b) = couple();
        registry.get_mut(a).unwrap().spouse = Some(b);
        registry.get_mut(a).unwrap().relationship_status = RelationshipStatus::Married;
        registry.get_mut(b).unwrap().children.push(CharacterId(99));
        assert_eq!(registry.repair_links(), 2);
        assert!(registry.get(a).unwrap().spouse.is_none());
        assert!(registry.get(b).unwrap().children.is_empty());
        assert!(registry.spouse_links_symmetric());
    }
}
