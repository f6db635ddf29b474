//! The mode definition registry.

use std::collections::HashMap;

use tracing::debug;

use super::{ModeDef, ModeId, ModeKind, TargetKind};
use crate::error::RegistryError;

/// Registry of mode definitions, keyed on `(letter, target kind)`.
///
/// Registration issues a dense [`ModeId`] used as the slot index for all
/// per-target state. Unregistering frees the `(letter, target)` key but
/// never reuses the slot, so stale handles held elsewhere cannot alias a
/// later definition. Iteration order is registration order, which is
/// observable: it breaks rank ties in memberships and fixes the display
/// order of derived mode strings.
#[derive(Debug, Default)]
pub struct ModeRegistry {
    slots: Vec<Option<ModeDef>>,
    by_key: HashMap<(char, TargetKind), ModeId>,
    by_symbol: HashMap<char, ModeId>,
}

impl ModeRegistry {
    /// An empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a definition.
    ///
    /// Fails with `DuplicateMode` when the `(letter, target)` pair is
    /// taken, or when a prefix mode's display symbol collides with an
    /// already-registered one.
    pub fn register(&mut self, def: ModeDef) -> Result<ModeId, RegistryError> {
        let key = (def.letter, def.target);
        if self.by_key.contains_key(&key) {
            return Err(RegistryError::DuplicateMode {
                letter: def.letter,
                target: def.target,
            });
        }
        if let ModeKind::Prefix(spec) = &def.kind {
            if self.by_symbol.contains_key(&spec.symbol) {
                return Err(RegistryError::DuplicateMode {
                    letter: def.letter,
                    target: def.target,
                });
            }
        }

        let id = ModeId(self.slots.len() as u32);
        if let ModeKind::Prefix(spec) = &def.kind {
            self.by_symbol.insert(spec.symbol, id);
        }
        self.by_key.insert(key, id);
        debug!(letter = %def.letter, kind = %def.target, name = %def.name, "mode registered");
        self.slots.push(Some(def));
        Ok(id)
    }

    /// Remove a definition, returning it.
    ///
    /// This only frees the registry entry. Stripping the mode from live
    /// targets is [`ModeEngine::retire_mode`](crate::engine::ModeEngine::retire_mode),
    /// which also produces the change records the removal must broadcast.
    pub fn unregister(&mut self, id: ModeId) -> Result<ModeDef, RegistryError> {
        let slot = self
            .slots
            .get_mut(id.index())
            .ok_or(RegistryError::UnknownModeDefinition)?;
        let def = slot.take().ok_or(RegistryError::UnknownModeDefinition)?;
        self.by_key.remove(&(def.letter, def.target));
        if let ModeKind::Prefix(spec) = &def.kind {
            self.by_symbol.remove(&spec.symbol);
        }
        debug!(letter = %def.letter, kind = %def.target, "mode unregistered");
        Ok(def)
    }

    /// Look up a definition by letter and target kind.
    #[must_use]
    pub fn find(&self, letter: char, target: TargetKind) -> Option<(ModeId, &ModeDef)> {
        let id = *self.by_key.get(&(letter, target))?;
        Some((id, self.get(id)?))
    }

    /// Look up a definition by handle.
    #[must_use]
    pub fn get(&self, id: ModeId) -> Option<&ModeDef> {
        self.slots.get(id.index())?.as_ref()
    }

    /// Look up a prefix mode by its display symbol (`@`, `+`, ...).
    #[must_use]
    pub fn find_prefix(&self, symbol: char) -> Option<(ModeId, &ModeDef)> {
        let id = *self.by_symbol.get(&symbol)?;
        Some((id, self.get(id)?))
    }

    /// Live definitions in registration order.
    pub fn iter(&self) -> impl Iterator<Item = (ModeId, &ModeDef)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, slot)| slot.as_ref().map(|def| (ModeId(i as u32), def)))
    }

    /// Number of slots ever issued; per-target arenas size to this.
    #[must_use]
    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::def::ModeDef;

    #[test]
    fn register_issues_dense_ids() {
        let mut registry = ModeRegistry::new();
        let b = registry
            .register(ModeDef::list('b', "ban", 5))
            .expect("fresh letter");
        let t = registry
            .register(ModeDef::flag('t', "topic-lock", TargetKind::Channel, 10))
            .expect("fresh letter");
        assert_eq!(b.index(), 0);
        assert_eq!(t.index(), 1);
        assert_eq!(registry.slot_count(), 2);
    }

    #[test]
    fn duplicate_letter_same_target_rejected() {
        let mut registry = ModeRegistry::new();
        registry
            .register(ModeDef::list('b', "ban", 5))
            .expect("fresh letter");
        let err = registry
            .register(ModeDef::flag('b', "other", TargetKind::Channel, 10))
            .expect_err("duplicate (letter, target)");
        assert_eq!(
            err,
            RegistryError::DuplicateMode {
                letter: 'b',
                target: TargetKind::Channel,
            }
        );
    }

    #[test]
    fn same_letter_different_target_is_distinct() {
        let mut registry = ModeRegistry::new();
        let chan = registry
            .register(ModeDef::flag('i', "invite-only", TargetKind::Channel, 10))
            .expect("channel i");
        let user = registry
            .register(ModeDef::flag('i', "invisible", TargetKind::User, 0))
            .expect("user i");
        assert_ne!(chan, user);
        assert_eq!(registry.find('i', TargetKind::Channel).map(|(id, _)| id), Some(chan));
        assert_eq!(registry.find('i', TargetKind::User).map(|(id, _)| id), Some(user));
    }

    #[test]
    fn prefix_symbol_lookup_and_collision() {
        let mut registry = ModeRegistry::new();
        let op = registry
            .register(ModeDef::prefix('o', "op", 10, '@', 10))
            .expect("fresh prefix");
        assert_eq!(registry.find_prefix('@').map(|(id, _)| id), Some(op));

        let err = registry
            .register(ModeDef::prefix('z', "fancy-op", 15, '@', 10))
            .expect_err("symbol collision");
        assert!(matches!(err, RegistryError::DuplicateMode { letter: 'z', .. }));
    }

    #[test]
    fn unregister_frees_key_but_not_slot() {
        let mut registry = ModeRegistry::new();
        let b = registry
            .register(ModeDef::list('b', "ban", 5))
            .expect("fresh letter");
        registry.unregister(b).expect("live definition");

        assert!(registry.find('b', TargetKind::Channel).is_none());
        assert!(registry.get(b).is_none());
        assert_eq!(
            registry.unregister(b),
            Err(RegistryError::UnknownModeDefinition)
        );

        // Letter is reusable, the old slot is not.
        let b2 = registry
            .register(ModeDef::list('b', "ban", 5))
            .expect("letter freed");
        assert_ne!(b, b2);
        assert_eq!(registry.slot_count(), 2);
    }
}
