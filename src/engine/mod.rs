//! The mode engine: one batch in, one change record out.
//!
//! Every invocation walks a fixed pipeline over the requested tuples:
//!
//! ```text
//! Received -> Validating -> AccessChecking -> Applying -> Finalized
//! ```
//!
//! Tuples are processed strictly in request order and later tuples
//! observe the effects of earlier ones, so `+o-o nick nick` nets to
//! nothing while still recording two applied changes. A tuple's failure
//! surfaces as its outcome and never aborts siblings; a batch with zero
//! applied tuples still finalizes with an (empty) record.
//!
//! The engine holds only the limit tables. The registry and the targets
//! are borrowed per invocation and nothing is cached across batches.

mod parse;
mod record;

pub use parse::{ParsedModes, RequestedChange, parse_mode_args};
pub use record::{ChangeRecord, Outcome, RecordItem};

use tracing::debug;

use crate::casemap;
use crate::config::{ListLimits, ListLimitsConfig};
use crate::def::{ModeDef, ModeId, ModeKind, ModeRegistry, ParamValue, TargetKind};
use crate::error::{ConfigError, RegistryError, RejectReason, SkipReason};
use crate::list::{AddError, NotPresent};
use crate::member::Membership;
use crate::param::{Merge, ParamSlot};
use crate::target::{ChannelModes, Slot, UserModes};

/// Who is asking for the change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin<'a> {
    /// A local user. Access checks apply unless `oper` is set; `nick` may
    /// be a bare nickname or a full `nick!user@host`, whichever form the
    /// caller wants recorded as the setter of list entries and values.
    Local {
        /// The acting user, also used for the rank lookup on channels.
        nick: &'a str,
        /// Operator override: bypasses rank checks.
        oper: bool,
    },
    /// A peer server. Pre-authorized on its side of the link, so access
    /// checks are skipped entirely.
    Peer {
        /// The asserting server's name.
        server: &'a str,
    },
}

impl Origin<'_> {
    fn display(&self) -> &str {
        match self {
            Self::Local { nick, .. } => nick,
            Self::Peer { server } => server,
        }
    }
}

/// The object a batch mutates. A batch targets a user xor a channel.
#[derive(Debug)]
pub enum Target<'a> {
    /// A channel's mode state.
    Channel(&'a mut ChannelModes),
    /// A user's mode state.
    User(&'a mut UserModes),
}

impl Target<'_> {
    /// The target kind, for definition lookups.
    #[must_use]
    pub fn kind(&self) -> TargetKind {
        match self {
            Self::Channel(_) => TargetKind::Channel,
            Self::User(_) => TargetKind::User,
        }
    }

    /// The channel name or nickname.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Channel(chan) => chan.name(),
            Self::User(user) => user.nick(),
        }
    }
}

/// A validated tuple waiting for application, or its early failure.
enum Step<'d> {
    Ready {
        id: ModeId,
        def: &'d ModeDef,
        value: Option<ParamValue>,
    },
    Fail(RejectReason),
}

/// Orchestrates validation, access control and application of mode-change
/// batches, and reconciles concurrent changes from peer servers.
#[derive(Debug)]
pub struct ModeEngine {
    limits: ListLimits,
}

impl ModeEngine {
    /// An engine over compiled limit tables.
    #[must_use]
    pub fn new(limits: ListLimits) -> Self {
        Self { limits }
    }

    /// Compile the given limit configuration and build an engine over it.
    pub fn with_config(config: &ListLimitsConfig) -> Result<Self, ConfigError> {
        Ok(Self::new(ListLimits::new(config)?))
    }

    /// The live limit tables.
    #[must_use]
    pub fn limits(&self) -> &ListLimits {
        &self.limits
    }

    /// Re-read the limit tables from configuration without disrupting
    /// in-flight state.
    pub fn rehash(&mut self, config: &ListLimitsConfig) -> Result<(), ConfigError> {
        self.limits.rehash(config)
    }

    /// Process one batch against a target and produce its change record.
    ///
    /// `now` stamps list entries and parameter values; it is also the
    /// change timestamp peer servers will compare during conflict
    /// resolution, so callers relay it unmodified.
    pub fn apply(
        &self,
        registry: &ModeRegistry,
        mut target: Target<'_>,
        origin: Origin<'_>,
        changes: &[RequestedChange],
        now: i64,
    ) -> ChangeRecord {
        let mut record = ChangeRecord::new(target.name());

        // Validating: resolve definitions and parameter policies.
        let mut steps: Vec<Step<'_>> = changes
            .iter()
            .map(|change| resolve_tuple(registry, target.kind(), change))
            .collect();

        // AccessChecking: local origins only; peers are pre-authorized.
        if let Origin::Local { nick, oper } = origin {
            if !oper {
                let (rank, self_target) = match &target {
                    Target::Channel(chan) => {
                        (chan.member(nick).map_or(0, Membership::top_rank), false)
                    }
                    Target::User(user) => (0, casemap::eq_fold(nick, user.nick())),
                };
                for (change, step) in changes.iter().zip(steps.iter_mut()) {
                    let Step::Ready { def, .. } = step else {
                        continue;
                    };
                    let denied = match def.target {
                        TargetKind::Channel => rank < def.rank_required,
                        TargetKind::User => !self_target,
                    };
                    if denied {
                        *step = Step::Fail(RejectReason::AccessDenied(change.letter));
                    }
                }
            }
        }

        // Applying: per-tuple dispatch; failures never abort siblings.
        for (change, step) in changes.iter().zip(steps) {
            let (outcome, shown) = match step {
                Step::Fail(reason) => (Outcome::Rejected(reason), change.param.clone()),
                Step::Ready { id, def, value } => {
                    let shown = match &value {
                        Some(value) => Some(value.to_string()),
                        None => change.param.clone(),
                    };
                    let outcome = self.apply_one(&mut target, origin, change, id, def, value, now);
                    (outcome, shown)
                }
            };
            if let Outcome::Rejected(reason) = &outcome {
                debug!(
                    on = %record.target(),
                    letter = %change.letter,
                    code = %reason.error_code(),
                    "mode tuple rejected"
                );
            }
            record.push(RecordItem {
                letter: change.letter,
                adding: change.adding,
                param: shown,
                outcome,
            });
        }

        // Finalized.
        record
    }

    /// [`apply`](Self::apply) stamped with the current wall clock.
    pub fn apply_now(
        &self,
        registry: &ModeRegistry,
        target: Target<'_>,
        origin: Origin<'_>,
        changes: &[RequestedChange],
    ) -> ChangeRecord {
        self.apply(registry, target, origin, changes, chrono::Utc::now().timestamp())
    }

    #[allow(clippy::too_many_arguments)]
    fn apply_one(
        &self,
        target: &mut Target<'_>,
        origin: Origin<'_>,
        change: &RequestedChange,
        id: ModeId,
        def: &ModeDef,
        value: Option<ParamValue>,
        now: i64,
    ) -> Outcome {
        match (&def.kind, &mut *target) {
            (ModeKind::Flag, Target::Channel(chan)) => {
                flag_outcome(chan.store_mut().set_flag(id, change.adding))
            }
            (ModeKind::Flag, Target::User(user)) => {
                flag_outcome(user.store_mut().set_flag(id, change.adding))
            }
            (ModeKind::List(spec), Target::Channel(chan)) => {
                let Some(mask) = change.param.as_deref() else {
                    return missing_param(def.letter);
                };
                if change.adding {
                    let limit = self.limits.resolve(def.letter, chan.name());
                    let list = chan.store_mut().list_mut(id);
                    match list.add(spec.canonical, mask, origin.display(), now, limit) {
                        Ok(()) => Outcome::Applied,
                        Err(AddError::AlreadyPresent) => {
                            Outcome::Skipped(SkipReason::AlreadyPresent)
                        }
                        Err(AddError::TooLong) => Outcome::Rejected(RejectReason::TooLong(def.letter)),
                    }
                } else {
                    match chan.store_mut().existing_list_mut(id) {
                        Some(list) => match list.remove(spec.canonical, mask) {
                            Ok(_) => Outcome::Applied,
                            Err(NotPresent) => Outcome::Skipped(SkipReason::NotPresent),
                        },
                        None => Outcome::Skipped(SkipReason::NotPresent),
                    }
                }
            }
            (ModeKind::Param(_), target_ref) => {
                let store = match target_ref {
                    Target::Channel(chan) => chan.store_mut(),
                    Target::User(user) => user.store_mut(),
                };
                if change.adding {
                    let Some(value) = value else {
                        return missing_param(def.letter);
                    };
                    store.set_param(
                        id,
                        ParamSlot {
                            value,
                            set_by: origin.display().to_string(),
                            set_at: now,
                        },
                    );
                    Outcome::Applied
                } else if store.param(id).is_some() {
                    store.take(id);
                    Outcome::Applied
                } else {
                    Outcome::Skipped(SkipReason::NoChange)
                }
            }
            (ModeKind::Prefix(spec), Target::Channel(chan)) => {
                let Some(nick) = change.param.as_deref() else {
                    return missing_param(def.letter);
                };
                let Some(member) = chan.member_mut(nick) else {
                    return Outcome::Rejected(RejectReason::BadParameter {
                        letter: def.letter,
                        detail: format!("{} is not on the channel", nick),
                    });
                };
                let changed = if change.adding {
                    member.grant(id, spec.rank)
                } else {
                    member.revoke(id)
                };
                if changed {
                    Outcome::Applied
                } else {
                    Outcome::Skipped(SkipReason::NoChange)
                }
            }
            // List and prefix state only exists on channels; a definition
            // can only reach here through a hand-built `ModeDef`.
            (ModeKind::List(_) | ModeKind::Prefix(_), Target::User(_)) => {
                Outcome::Rejected(RejectReason::UnknownMode(def.letter))
            }
        }
    }

    /// Reconcile a peer server's assertion of a parameter value.
    ///
    /// The newer change timestamp wins outright; the mode's resolver
    /// settles exact ties. Both sides of a race run the same comparison
    /// over the same two values and converge without renegotiation.
    /// Returns whether local state changed, so the caller knows whether
    /// to echo the result onward.
    pub fn merge_peer_param(
        &self,
        registry: &ModeRegistry,
        target: Target<'_>,
        letter: char,
        raw: &str,
        set_by: &str,
        set_at: i64,
    ) -> Result<Merge, RejectReason> {
        let kind = target.kind();
        let Some((id, def)) = registry.find(letter, kind) else {
            return Err(RejectReason::UnknownMode(letter));
        };
        let ModeKind::Param(spec) = &def.kind else {
            return Err(RejectReason::BadParameter {
                letter,
                detail: "not a parameter mode".to_string(),
            });
        };
        let value = (spec.validate)(raw).map_err(|detail| RejectReason::BadParameter {
            letter,
            detail,
        })?;

        let store = match target {
            Target::Channel(chan) => chan.store_mut(),
            Target::User(user) => user.store_mut(),
        };
        Ok(store.merge_param(id, spec, value, set_by, set_at))
    }

    /// Unregister a definition and strip its state from every live
    /// target, atomically from the caller's single-threaded view.
    ///
    /// Produces one change record per affected target so the removals can
    /// be relayed to peers like any other mode change.
    pub fn retire_mode<'c, 'u>(
        &self,
        registry: &mut ModeRegistry,
        id: ModeId,
        channels: impl IntoIterator<Item = &'c mut ChannelModes>,
        users: impl IntoIterator<Item = &'u mut UserModes>,
    ) -> Result<Vec<ChangeRecord>, RegistryError> {
        let def = registry.unregister(id)?;
        let mut records = Vec::new();
        for chan in channels {
            let stripped = strip_channel(chan, id, &def);
            if !stripped.is_noop() {
                records.push(stripped);
            }
        }
        for user in users {
            let stripped = strip_user(user, id, &def);
            if !stripped.is_noop() {
                records.push(stripped);
            }
        }
        debug!(letter = %def.letter, affected = records.len(), "mode retired");
        Ok(records)
    }
}

fn resolve_tuple<'d>(
    registry: &'d ModeRegistry,
    kind: TargetKind,
    change: &RequestedChange,
) -> Step<'d> {
    let Some((id, def)) = registry.find(change.letter, kind) else {
        return Step::Fail(RejectReason::UnknownMode(change.letter));
    };

    let wants_param = def.takes_param(change.adding);
    match (&change.param, wants_param) {
        (None, true) => {
            return Step::Fail(RejectReason::BadParameter {
                letter: change.letter,
                detail: "parameter required".to_string(),
            });
        }
        (Some(_), false) => {
            return Step::Fail(RejectReason::BadParameter {
                letter: change.letter,
                detail: "parameter not allowed".to_string(),
            });
        }
        _ => {}
    }

    let value = match (&def.kind, &change.param, change.adding) {
        (ModeKind::Param(spec), Some(raw), true) => match (spec.validate)(raw) {
            Ok(value) => Some(value),
            Err(detail) => {
                return Step::Fail(RejectReason::BadParameter {
                    letter: change.letter,
                    detail,
                });
            }
        },
        _ => None,
    };

    Step::Ready { id, def, value }
}

fn flag_outcome(changed: bool) -> Outcome {
    if changed {
        Outcome::Applied
    } else {
        Outcome::Skipped(SkipReason::NoChange)
    }
}

fn missing_param(letter: char) -> Outcome {
    Outcome::Rejected(RejectReason::BadParameter {
        letter,
        detail: "parameter required".to_string(),
    })
}

fn removal(letter: char, param: Option<String>) -> RecordItem {
    RecordItem {
        letter,
        adding: false,
        param,
        outcome: Outcome::Applied,
    }
}

fn strip_channel(chan: &mut ChannelModes, id: ModeId, def: &ModeDef) -> ChangeRecord {
    let mut record = ChangeRecord::new(chan.name());
    match &def.kind {
        ModeKind::Flag => {
            if chan.store_mut().set_flag(id, false) {
                record.push(removal(def.letter, None));
            }
        }
        ModeKind::List(_) => {
            for entry in chan.remove_all(id) {
                record.push(removal(def.letter, Some(entry.mask)));
            }
        }
        ModeKind::Param(_) => {
            if matches!(chan.store_mut().take(id), Slot::Param(_)) {
                record.push(removal(def.letter, None));
            }
        }
        ModeKind::Prefix(_) => {
            for (nick, member) in chan.members_mut().iter_mut() {
                if member.revoke(id) {
                    record.push(removal(def.letter, Some(nick.clone())));
                }
            }
        }
    }
    record
}

fn strip_user(user: &mut UserModes, id: ModeId, def: &ModeDef) -> ChangeRecord {
    let mut record = ChangeRecord::new(user.nick());
    match &def.kind {
        ModeKind::Flag => {
            if user.store_mut().set_flag(id, false) {
                record.push(removal(def.letter, None));
            }
        }
        ModeKind::Param(_) => {
            if matches!(user.store_mut().take(id), Slot::Param(_)) {
                record.push(removal(def.letter, None));
            }
        }
        ModeKind::List(_) | ModeKind::Prefix(_) => {}
    }
    record
}
