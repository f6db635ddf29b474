//! Per-target mode storage.
//!
//! Definitions hold no target state. Everything mutable lives here, in an
//! arena of typed slots owned by the channel or user and indexed by the
//! [`ModeId`] issued at registration; lookup is an index, not a pointer
//! chase, and slot lifetime is the owning target's lifetime.

use std::collections::HashMap;

use crate::casemap;
use crate::def::{ModeId, ModeKind, ModeRegistry, ParamSpec, TargetKind};
use crate::list::ModeList;
use crate::member::Membership;
use crate::param::{Merge, ParamSlot, merge_remote};

/// One arena slot of target-local mode state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) enum Slot {
    /// Nothing set for this mode on this target.
    #[default]
    Vacant,
    /// A flag mode, currently set.
    Flag,
    /// A list mode's entries.
    List(ModeList),
    /// A parameter mode's live value.
    Param(ParamSlot),
}

/// Slot arena indexed by [`ModeId`]. Grows lazily as later registrations
/// touch targets that predate them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct SlotTable {
    slots: Vec<Slot>,
}

impl SlotTable {
    fn slot(&self, id: ModeId) -> Option<&Slot> {
        self.slots.get(id.index())
    }

    fn slot_mut(&mut self, id: ModeId) -> &mut Slot {
        if self.slots.len() <= id.index() {
            self.slots.resize_with(id.index() + 1, Slot::default);
        }
        &mut self.slots[id.index()]
    }

    pub(crate) fn is_flag_set(&self, id: ModeId) -> bool {
        matches!(self.slot(id), Some(Slot::Flag))
    }

    /// Returns true when the flag actually changed position.
    pub(crate) fn set_flag(&mut self, id: ModeId, on: bool) -> bool {
        let slot = self.slot_mut(id);
        match (on, matches!(slot, Slot::Flag)) {
            (true, true) | (false, false) => false,
            (true, false) => {
                *slot = Slot::Flag;
                true
            }
            (false, true) => {
                *slot = Slot::Vacant;
                true
            }
        }
    }

    pub(crate) fn list(&self, id: ModeId) -> Option<&ModeList> {
        match self.slot(id) {
            Some(Slot::List(list)) => Some(list),
            _ => None,
        }
    }

    pub(crate) fn list_mut(&mut self, id: ModeId) -> &mut ModeList {
        let slot = self.slot_mut(id);
        if !matches!(slot, Slot::List(_)) {
            *slot = Slot::List(ModeList::default());
        }
        match slot {
            Slot::List(list) => list,
            _ => unreachable!(),
        }
    }

    /// Like [`list_mut`](Self::list_mut) but never materializes a slot;
    /// removals from an untouched list must leave no trace.
    pub(crate) fn existing_list_mut(&mut self, id: ModeId) -> Option<&mut ModeList> {
        match self.slots.get_mut(id.index()) {
            Some(Slot::List(list)) => Some(list),
            _ => None,
        }
    }

    pub(crate) fn param(&self, id: ModeId) -> Option<&ParamSlot> {
        match self.slot(id) {
            Some(Slot::Param(param)) => Some(param),
            _ => None,
        }
    }

    pub(crate) fn set_param(&mut self, id: ModeId, param: ParamSlot) {
        *self.slot_mut(id) = Slot::Param(param);
    }

    /// Reconcile a remote assertion into the slot; an empty slot accepts
    /// the remote value outright.
    pub(crate) fn merge_param(
        &mut self,
        id: ModeId,
        spec: &ParamSpec,
        theirs: crate::def::ParamValue,
        their_by: &str,
        their_at: i64,
    ) -> Merge {
        let slot = self.slot_mut(id);
        if let Slot::Param(existing) = slot {
            merge_remote(existing, spec, &theirs, their_by, their_at)
        } else {
            *slot = Slot::Param(ParamSlot {
                value: theirs,
                set_by: their_by.to_string(),
                set_at: their_at,
            });
            Merge::Updated
        }
    }

    /// Empty the slot, returning whatever was in it.
    pub(crate) fn take(&mut self, id: ModeId) -> Slot {
        match self.slots.get_mut(id.index()) {
            Some(slot) => std::mem::take(slot),
            None => Slot::Vacant,
        }
    }
}

/// All mutable mode state owned by one channel: flags, lists, parameter
/// values, and the memberships of its current users.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelModes {
    name: String,
    store: SlotTable,
    members: HashMap<String, Membership>,
}

impl ChannelModes {
    /// Fresh state for a channel with no modes set and no members.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            store: SlotTable::default(),
            members: HashMap::new(),
        }
    }

    /// The channel name as created.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Create the membership for a joining user.
    pub fn join(&mut self, nick: &str) -> &mut Membership {
        self.members.entry(casemap::fold(nick)).or_default()
    }

    /// Drop the membership when a user leaves, returning it.
    pub fn part(&mut self, nick: &str) -> Option<Membership> {
        self.members.remove(&casemap::fold(nick))
    }

    /// A member's state, if present.
    #[must_use]
    pub fn member(&self, nick: &str) -> Option<&Membership> {
        self.members.get(&casemap::fold(nick))
    }

    /// A member's state, mutably.
    pub fn member_mut(&mut self, nick: &str) -> Option<&mut Membership> {
        self.members.get_mut(&casemap::fold(nick))
    }

    /// Current members as `(folded nick, membership)`.
    pub fn members(&self) -> impl Iterator<Item = (&str, &Membership)> {
        self.members.iter().map(|(nick, m)| (nick.as_str(), m))
    }

    /// Number of current members.
    #[must_use]
    pub fn member_count(&self) -> usize {
        self.members.len()
    }

    /// Whether a flag mode is currently set.
    #[must_use]
    pub fn is_flag_set(&self, id: ModeId) -> bool {
        self.store.is_flag_set(id)
    }

    /// A list mode's entries, if any exist.
    #[must_use]
    pub fn list(&self, id: ModeId) -> Option<&ModeList> {
        self.store.list(id)
    }

    /// A parameter mode's live value, if set.
    #[must_use]
    pub fn param(&self, id: ModeId) -> Option<&ParamSlot> {
        self.store.param(id)
    }

    /// Drop every entry of one list mode, returning the drained entries.
    pub fn remove_all(&mut self, id: ModeId) -> Vec<crate::list::ListEntry> {
        match self.store.take(id) {
            Slot::List(mut list) => list.remove_all(),
            _ => Vec::new(),
        }
    }

    /// Current channel modes as `+ntk key`-style letters plus parameters,
    /// in registration order. Lists and prefixes are not part of the
    /// summary; they have their own displays.
    #[must_use]
    pub fn mode_string(&self, registry: &ModeRegistry) -> String {
        mode_string(&self.store, registry, TargetKind::Channel)
    }

    pub(crate) fn store_mut(&mut self) -> &mut SlotTable {
        &mut self.store
    }

    pub(crate) fn members_mut(&mut self) -> &mut HashMap<String, Membership> {
        &mut self.members
    }
}

/// All mutable mode state owned by one user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserModes {
    nick: String,
    store: SlotTable,
}

impl UserModes {
    /// Fresh state for a user with no modes set.
    #[must_use]
    pub fn new(nick: impl Into<String>) -> Self {
        Self {
            nick: nick.into(),
            store: SlotTable::default(),
        }
    }

    /// The nickname this state belongs to.
    #[must_use]
    pub fn nick(&self) -> &str {
        &self.nick
    }

    /// Whether a flag mode is currently set.
    #[must_use]
    pub fn is_flag_set(&self, id: ModeId) -> bool {
        self.store.is_flag_set(id)
    }

    /// A parameter mode's live value, if set.
    #[must_use]
    pub fn param(&self, id: ModeId) -> Option<&ParamSlot> {
        self.store.param(id)
    }

    /// Current user modes as `+iw`-style letters, in registration order.
    #[must_use]
    pub fn mode_string(&self, registry: &ModeRegistry) -> String {
        mode_string(&self.store, registry, TargetKind::User)
    }

    pub(crate) fn store_mut(&mut self) -> &mut SlotTable {
        &mut self.store
    }
}

fn mode_string(store: &SlotTable, registry: &ModeRegistry, target: TargetKind) -> String {
    let mut letters = String::from("+");
    let mut params: Vec<String> = Vec::new();

    for (id, def) in registry.iter() {
        if def.target != target {
            continue;
        }
        match &def.kind {
            ModeKind::Flag => {
                if store.is_flag_set(id) {
                    letters.push(def.letter);
                }
            }
            ModeKind::Param(_) => {
                if let Some(param) = store.param(id) {
                    letters.push(def.letter);
                    params.push(param.value.to_string());
                }
            }
            ModeKind::List(_) | ModeKind::Prefix(_) => {}
        }
    }

    if params.is_empty() {
        letters
    } else {
        format!("{} {}", letters, params.join(" "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::def::{ModeDef, ParamSpec, ParamValue};

    fn registry() -> (ModeRegistry, ModeId, ModeId, ModeId) {
        let mut registry = ModeRegistry::new();
        let key = registry
            .register(ModeDef::param(
                'k',
                "key",
                TargetKind::Channel,
                crate::def::ParamPolicy::Always,
                10,
                ParamSpec {
                    validate: |raw| Ok(ParamValue::Str(raw.to_string())),
                    resolve: None,
                },
            ))
            .expect("fresh registry");
        let topic_lock = registry
            .register(ModeDef::flag('t', "topic-lock", TargetKind::Channel, 10))
            .expect("fresh registry");
        let no_external = registry
            .register(ModeDef::flag('n', "no-external", TargetKind::Channel, 10))
            .expect("fresh registry");
        (registry, key, topic_lock, no_external)
    }

    #[test]
    fn flags_toggle_and_report_change() {
        let (_, _, topic_lock, _) = registry();
        let mut chan = ChannelModes::new("#test");
        assert!(!chan.is_flag_set(topic_lock));
        assert!(chan.store_mut().set_flag(topic_lock, true));
        assert!(!chan.store_mut().set_flag(topic_lock, true));
        assert!(chan.is_flag_set(topic_lock));
        assert!(chan.store_mut().set_flag(topic_lock, false));
        assert!(!chan.store_mut().set_flag(topic_lock, false));
    }

    #[test]
    fn mode_string_follows_registration_order() {
        let (registry, key, topic_lock, no_external) = registry();
        let mut chan = ChannelModes::new("#test");
        chan.store_mut().set_flag(no_external, true);
        chan.store_mut().set_flag(topic_lock, true);
        chan.store_mut().set_param(
            key,
            ParamSlot {
                value: ParamValue::Str("sekrit".into()),
                set_by: "alice".into(),
                set_at: 0,
            },
        );

        assert_eq!(chan.mode_string(&registry), "+ktn sekrit");
    }

    #[test]
    fn mode_string_with_nothing_set() {
        let (registry, ..) = registry();
        let chan = ChannelModes::new("#test");
        assert_eq!(chan.mode_string(&registry), "+");
    }

    #[test]
    fn membership_keys_fold_case() {
        let mut chan = ChannelModes::new("#test");
        chan.join("Alice[1]");
        assert!(chan.member("alice{1}").is_some());
        assert_eq!(chan.member_count(), 1);
        assert!(chan.part("ALICE[1]").is_some());
        assert_eq!(chan.member_count(), 0);
    }

    #[test]
    fn take_on_unknown_slot_is_vacant() {
        let mut chan = ChannelModes::new("#test");
        assert_eq!(chan.store_mut().take(ModeId(7)), Slot::Vacant);
        assert!(chan.remove_all(ModeId(7)).is_empty());
    }
}
