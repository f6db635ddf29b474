//! The stock mode set.
//!
//! [`register_standard`] installs the letters every network expects, so a
//! freshly built registry is usable out of the box. Networks that want a
//! different repertoire register their own definitions instead; nothing
//! in the engine is special-cased on these.

use crate::def::{ModeDef, ModeId, ModeRegistry, ParamPolicy, ParamSpec, ParamValue, TargetKind};
use crate::error::RegistryError;
use crate::param::{resolve_lexicographic, resolve_numeric_max};

/// Handles for the modes installed by [`register_standard`].
#[derive(Debug, Clone, Copy)]
pub struct StandardModes {
    /// `+b` ban list.
    pub ban: ModeId,
    /// `+e` ban exceptions.
    pub except: ModeId,
    /// `+I` invite exceptions.
    pub invex: ModeId,
    /// `+k` channel key.
    pub key: ModeId,
    /// `+l` member limit.
    pub limit: ModeId,
    /// `+a` admin prefix (`&`).
    pub admin: ModeId,
    /// `+o` operator prefix (`@`).
    pub op: ModeId,
    /// `+h` half-operator prefix (`%`).
    pub halfop: ModeId,
    /// `+v` voice prefix (`+`).
    pub voice: ModeId,
    /// `+i` invite-only.
    pub invite_only: ModeId,
    /// `+m` moderated.
    pub moderated: ModeId,
    /// `+n` no external messages.
    pub no_external: ModeId,
    /// `+s` secret.
    pub secret: ModeId,
    /// `+t` only ops change the topic.
    pub topic_lock: ModeId,
    /// User `+i` invisible.
    pub invisible: ModeId,
    /// User `+w` wallops recipient.
    pub wallops: ModeId,
}

/// Channel key validation: no spaces or commas, at most 23 bytes.
fn validate_key(raw: &str) -> Result<ParamValue, String> {
    if raw.is_empty() || raw.len() > 23 || raw.contains(' ') || raw.contains(',') {
        return Err("invalid channel key".to_string());
    }
    Ok(ParamValue::Str(raw.to_string()))
}

/// Member limit validation: a number in 1..=10000.
fn validate_limit(raw: &str) -> Result<ParamValue, String> {
    match raw.parse::<i64>() {
        Ok(n) if (1..=10_000).contains(&n) => Ok(ParamValue::Int(n)),
        Ok(_) => Err("limit out of range".to_string()),
        Err(_) => Err("limit is not a number".to_string()),
    }
}

/// Install the standard mode set.
///
/// Fails only when a letter is already taken, e.g. when called twice on
/// the same registry.
pub fn register_standard(registry: &mut ModeRegistry) -> Result<StandardModes, RegistryError> {
    Ok(StandardModes {
        ban: registry.register(ModeDef::list('b', "ban", 5))?,
        except: registry.register(ModeDef::list('e', "ban-exception", 5))?,
        invex: registry.register(ModeDef::list('I', "invite-exception", 5))?,
        key: registry.register(ModeDef::param(
            'k',
            "key",
            TargetKind::Channel,
            ParamPolicy::Always,
            10,
            ParamSpec {
                validate: validate_key,
                resolve: Some(resolve_lexicographic),
            },
        ))?,
        limit: registry.register(ModeDef::param(
            'l',
            "limit",
            TargetKind::Channel,
            ParamPolicy::WhenSetting,
            10,
            ParamSpec {
                validate: validate_limit,
                resolve: Some(resolve_numeric_max),
            },
        ))?,
        admin: registry.register(ModeDef::prefix('a', "admin", 20, '&', 20))?,
        op: registry.register(ModeDef::prefix('o', "op", 10, '@', 10))?,
        halfop: registry.register(ModeDef::prefix('h', "halfop", 5, '%', 10))?,
        voice: registry.register(ModeDef::prefix('v', "voice", 1, '+', 5))?,
        invite_only: registry.register(ModeDef::flag('i', "invite-only", TargetKind::Channel, 10))?,
        moderated: registry.register(ModeDef::flag('m', "moderated", TargetKind::Channel, 10))?,
        no_external: registry.register(ModeDef::flag('n', "no-external", TargetKind::Channel, 10))?,
        secret: registry.register(ModeDef::flag('s', "secret", TargetKind::Channel, 10))?,
        topic_lock: registry.register(ModeDef::flag('t', "topic-lock", TargetKind::Channel, 10))?,
        invisible: registry.register(ModeDef::flag('i', "invisible", TargetKind::User, 0))?,
        wallops: registry.register(ModeDef::flag('w', "wallops", TargetKind::User, 0))?,
    })
}
