//! Mode definitions.
//!
//! A [`ModeDef`] is the immutable descriptor of one mode: its letter, the
//! kind of target it attaches to, its parameter policy, the rank needed to
//! change it, and its category. Categories are a closed set ([`ModeKind`])
//! so the engine's dispatch stays exhaustive and compiler-checked.
//!
//! Definitions are stateless singletons. All mutable state lives in
//! per-target storage indexed by the [`ModeId`] issued at registration.

mod registry;

pub use registry::ModeRegistry;

use std::fmt;

use crate::casemap;

/// Stable handle for a registered mode definition.
///
/// Issued once per registration and never reused within a registry. The
/// handle doubles as the slot index for per-target mode state, and its
/// ordering is the registration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ModeId(pub(crate) u32);

impl ModeId {
    /// Slot index in per-target arenas.
    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// What a mode attaches to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TargetKind {
    /// A connected user.
    User,
    /// A channel.
    Channel,
}

impl fmt::Display for TargetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::User => "user",
            Self::Channel => "channel",
        })
    }
}

/// When a mode consumes a parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamPolicy {
    /// Never takes a parameter.
    Never,
    /// Parameter required when setting, none when unsetting.
    WhenSetting,
    /// Parameter required both when setting and when unsetting.
    Always,
}

/// A single scalar mode value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamValue {
    /// Numeric value, e.g. a member limit.
    Int(i64),
    /// String value, e.g. a channel key.
    Str(String),
}

impl ParamValue {
    /// The numeric value, if this is one.
    #[must_use]
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(n) => Some(*n),
            Self::Str(_) => None,
        }
    }

    /// The string value, if this is one.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            Self::Int(_) => None,
        }
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(n) => write!(f, "{}", n),
            Self::Str(s) => f.write_str(s),
        }
    }
}

/// Mask canonicalization hook for list modes.
pub type CanonicalFn = fn(&str) -> String;

/// Parameter validation hook. Returns the normalized value or a
/// human-readable reason.
pub type ValidateFn = fn(&str) -> Result<ParamValue, String>;

/// Deterministic tie-break between two competing values.
///
/// Must be a pure, commutative function: `resolve(a, b)` and
/// `resolve(b, a)` return the same value, so two servers that run it
/// independently over the same pair converge. Only consulted on exact
/// change-timestamp ties; ordinary races are settled by timestamp alone.
pub type ResolveFn = fn(&ParamValue, &ParamValue) -> ParamValue;

/// Behavior specific to list modes.
#[derive(Debug, Clone, PartialEq)]
pub struct ListSpec {
    /// Mask equivalence: entries are unique by canonicalized mask.
    pub canonical: CanonicalFn,
}

impl Default for ListSpec {
    fn default() -> Self {
        Self {
            canonical: casemap::fold,
        }
    }
}

/// Behavior specific to parameter modes.
#[derive(Debug, Clone, PartialEq)]
pub struct ParamSpec {
    /// Normalizes and checks a raw parameter.
    pub validate: ValidateFn,
    /// Tie-break for concurrent assertions with equal timestamps.
    /// `None` falls back to an ordering over the rendered values; see
    /// [`crate::param::merge_remote`].
    pub resolve: Option<ResolveFn>,
}

/// Behavior specific to prefix (rank) modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PrefixSpec {
    /// Privilege ordering among prefix modes; higher outranks lower.
    pub rank: u32,
    /// Character shown before a nickname in a names list.
    pub symbol: char,
}

/// The closed set of mode categories.
#[derive(Debug, Clone, PartialEq)]
pub enum ModeKind {
    /// Simple on/off flag.
    Flag,
    /// Bounded per-channel mask list.
    List(ListSpec),
    /// Single scalar value per target.
    Param(ParamSpec),
    /// Per-membership rank grant.
    Prefix(PrefixSpec),
}

/// Immutable descriptor of one mode.
#[derive(Debug, Clone, PartialEq)]
pub struct ModeDef {
    /// The mode letter as it appears in mode strings.
    pub letter: char,
    /// Symbolic name, for logs and diagnostics.
    pub name: String,
    /// What this mode attaches to.
    pub target: TargetKind,
    /// When this mode consumes a parameter.
    pub policy: ParamPolicy,
    /// Minimum channel rank needed to change this mode locally.
    pub rank_required: u32,
    /// Category-specific behavior.
    pub kind: ModeKind,
}

impl ModeDef {
    /// A simple on/off flag.
    #[must_use]
    pub fn flag(letter: char, name: &str, target: TargetKind, rank_required: u32) -> Self {
        Self {
            letter,
            name: name.to_string(),
            target,
            policy: ParamPolicy::Never,
            rank_required,
            kind: ModeKind::Flag,
        }
    }

    /// A channel list mode with the default RFC 1459 mask equivalence.
    #[must_use]
    pub fn list(letter: char, name: &str, rank_required: u32) -> Self {
        Self::list_with(letter, name, rank_required, ListSpec::default())
    }

    /// A channel list mode with a custom canonicalization hook.
    #[must_use]
    pub fn list_with(letter: char, name: &str, rank_required: u32, spec: ListSpec) -> Self {
        Self {
            letter,
            name: name.to_string(),
            target: TargetKind::Channel,
            policy: ParamPolicy::Always,
            rank_required,
            kind: ModeKind::List(spec),
        }
    }

    /// A parameter mode on the given target kind.
    #[must_use]
    pub fn param(
        letter: char,
        name: &str,
        target: TargetKind,
        policy: ParamPolicy,
        rank_required: u32,
        spec: ParamSpec,
    ) -> Self {
        Self {
            letter,
            name: name.to_string(),
            target,
            policy,
            rank_required,
            kind: ModeKind::Param(spec),
        }
    }

    /// A channel prefix mode granting `rank`, shown as `symbol`.
    #[must_use]
    pub fn prefix(letter: char, name: &str, rank: u32, symbol: char, rank_required: u32) -> Self {
        Self {
            letter,
            name: name.to_string(),
            target: TargetKind::Channel,
            policy: ParamPolicy::Always,
            rank_required,
            kind: ModeKind::Prefix(PrefixSpec { rank, symbol }),
        }
    }

    /// Whether a change in the given direction consumes a parameter.
    #[must_use]
    pub fn takes_param(&self, adding: bool) -> bool {
        match self.policy {
            ParamPolicy::Never => false,
            ParamPolicy::WhenSetting => adding,
            ParamPolicy::Always => true,
        }
    }

    /// The prefix behavior, if this is a prefix mode.
    #[must_use]
    pub fn as_prefix(&self) -> Option<&PrefixSpec> {
        match &self.kind {
            ModeKind::Prefix(spec) => Some(spec),
            _ => None,
        }
    }

    /// The list behavior, if this is a list mode.
    #[must_use]
    pub fn as_list(&self) -> Option<&ListSpec> {
        match &self.kind {
            ModeKind::List(spec) => Some(spec),
            _ => None,
        }
    }

    /// The parameter behavior, if this is a parameter mode.
    #[must_use]
    pub fn as_param(&self) -> Option<&ParamSpec> {
        match &self.kind {
            ModeKind::Param(spec) => Some(spec),
            _ => None,
        }
    }
}
