//! Channel membership and prefix ranks.

use smallvec::SmallVec;

use crate::def::{ModeId, ModeRegistry};

/// One granted rank: the rank value cached from the definition plus the
/// mode that granted it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Grant {
    rank: u32,
    id: ModeId,
}

/// The prefix-mode state of one user on one channel.
///
/// Created on join, destroyed on part/kick/quit along with the rest of
/// the member's channel state; it never outlives either endpoint.
///
/// Held ranks are kept sorted by descending rank, ties broken by mode
/// registration order, so the first element always carries the highest
/// rank currently granted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Membership {
    granted: SmallVec<[Grant; 4]>,
}

impl Membership {
    /// A membership holding no ranks.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Grant a rank. Returns false when already held.
    pub fn grant(&mut self, id: ModeId, rank: u32) -> bool {
        if self.holds(id) {
            return false;
        }
        self.granted.push(Grant { rank, id });
        self.granted
            .sort_by(|a, b| b.rank.cmp(&a.rank).then(a.id.cmp(&b.id)));
        true
    }

    /// Revoke a rank. Returns false when not held.
    pub fn revoke(&mut self, id: ModeId) -> bool {
        let before = self.granted.len();
        self.granted.retain(|g| g.id != id);
        self.granted.len() != before
    }

    /// Whether the given prefix mode is currently held.
    #[must_use]
    pub fn holds(&self, id: ModeId) -> bool {
        self.granted.iter().any(|g| g.id == id)
    }

    /// Highest rank currently held; 0 with none.
    #[must_use]
    pub fn top_rank(&self) -> u32 {
        self.granted.first().map_or(0, |g| g.rank)
    }

    /// Held prefix modes, highest rank first.
    pub fn ranks(&self) -> impl Iterator<Item = ModeId> + '_ {
        self.granted.iter().map(|g| g.id)
    }

    /// True when no rank is held.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.granted.is_empty()
    }

    /// All prefix symbols, highest first (multi-prefix rendering).
    #[must_use]
    pub fn symbols(&self, registry: &ModeRegistry) -> String {
        self.granted
            .iter()
            .filter_map(|g| registry.get(g.id).and_then(|d| d.as_prefix()).map(|p| p.symbol))
            .collect()
    }

    /// The single highest prefix symbol, for plain names lists.
    #[must_use]
    pub fn symbol(&self, registry: &ModeRegistry) -> Option<char> {
        self.symbols(registry).chars().next()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::def::ModeDef;

    fn prefix_registry() -> (ModeRegistry, ModeId, ModeId, ModeId) {
        let mut registry = ModeRegistry::new();
        let op = registry
            .register(ModeDef::prefix('o', "op", 10, '@', 10))
            .expect("fresh registry");
        let halfop = registry
            .register(ModeDef::prefix('h', "halfop", 5, '%', 10))
            .expect("fresh registry");
        let voice = registry
            .register(ModeDef::prefix('v', "voice", 1, '+', 5))
            .expect("fresh registry");
        (registry, op, halfop, voice)
    }

    #[test]
    fn ordering_is_descending_rank() {
        let (_, op, halfop, voice) = prefix_registry();
        let mut member = Membership::new();
        assert!(member.grant(voice, 1));
        assert!(member.grant(op, 10));
        assert!(member.grant(halfop, 5));

        let order: Vec<ModeId> = member.ranks().collect();
        assert_eq!(order, vec![op, halfop, voice]);
        assert_eq!(member.top_rank(), 10);
    }

    #[test]
    fn first_element_outranks_rest_after_any_sequence() {
        let (_, op, halfop, voice) = prefix_registry();
        let mut member = Membership::new();
        for step in 0..6u32 {
            match step % 3 {
                0 => {
                    member.grant(op, 10);
                }
                1 => {
                    member.grant(voice, 1);
                    member.revoke(op);
                }
                _ => {
                    member.grant(halfop, 5);
                }
            }
            let top = member.top_rank();
            assert!(member.granted.iter().all(|g| g.rank <= top));
        }
    }

    #[test]
    fn equal_rank_ties_break_by_registration_order() {
        let mut registry = ModeRegistry::new();
        let first = registry
            .register(ModeDef::prefix('o', "op", 10, '@', 10))
            .expect("fresh registry");
        let second = registry
            .register(ModeDef::prefix('O', "co-op", 10, '!', 10))
            .expect("fresh registry");

        let mut member = Membership::new();
        member.grant(second, 10);
        member.grant(first, 10);
        let order: Vec<ModeId> = member.ranks().collect();
        assert_eq!(order, vec![first, second]);
    }

    #[test]
    fn grant_held_and_revoke_unheld_are_noops() {
        let (_, op, _, _) = prefix_registry();
        let mut member = Membership::new();
        assert!(member.grant(op, 10));
        assert!(!member.grant(op, 10));
        assert!(member.revoke(op));
        assert!(!member.revoke(op));
    }

    #[test]
    fn grant_revoke_round_trip_restores_membership() {
        let (_, op, halfop, voice) = prefix_registry();
        let mut member = Membership::new();
        member.grant(voice, 1);
        member.grant(halfop, 5);
        let snapshot = member.clone();

        member.grant(op, 10);
        member.revoke(op);
        assert_eq!(member, snapshot);
    }

    #[test]
    fn symbols_render_highest_first() {
        let (registry, op, _, voice) = prefix_registry();
        let mut member = Membership::new();
        member.grant(voice, 1);
        member.grant(op, 10);
        assert_eq!(member.symbols(&registry), "@+");
        assert_eq!(member.symbol(&registry), Some('@'));

        let empty = Membership::new();
        assert_eq!(empty.symbols(&registry), "");
        assert_eq!(empty.symbol(&registry), None);
    }
}
