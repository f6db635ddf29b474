//! ISUPPORT tokens derived from the live registry.
//!
//! Servers advertise their mode repertoire to clients in `RPL_ISUPPORT`.
//! Deriving the tokens from the registry keeps the advertisement honest:
//! registering or retiring a mode changes what is announced with no
//! second bookkeeping site.

use crate::config::ListLimits;
use crate::def::{ModeKind, ModeRegistry, ParamPolicy, TargetKind};

/// The `CHANMODES=A,B,C,D` token.
///
/// Class A are list modes, B parameter modes whose parameter is always
/// present, C parameter modes whose parameter only appears when setting,
/// D plain flags. Prefix modes are advertised via [`prefix_token`] and
/// excluded here.
#[must_use]
pub fn chanmodes_token(registry: &ModeRegistry) -> String {
    let mut lists = String::new();
    let mut always = String::new();
    let mut setting = String::new();
    let mut flags = String::new();

    for (_, def) in registry.iter() {
        if def.target != TargetKind::Channel {
            continue;
        }
        match &def.kind {
            ModeKind::List(_) => lists.push(def.letter),
            ModeKind::Param(_) => match def.policy {
                ParamPolicy::Always => always.push(def.letter),
                ParamPolicy::WhenSetting | ParamPolicy::Never => setting.push(def.letter),
            },
            ModeKind::Flag => flags.push(def.letter),
            ModeKind::Prefix(_) => {}
        }
    }

    format!("CHANMODES={},{},{},{}", lists, always, setting, flags)
}

/// The `PREFIX=(letters)symbols` token, highest rank first.
#[must_use]
pub fn prefix_token(registry: &ModeRegistry) -> String {
    let mut prefixes: Vec<(u32, u32, char, char)> = registry
        .iter()
        .filter_map(|(id, def)| {
            def.as_prefix()
                .map(|spec| (spec.rank, id.index() as u32, def.letter, spec.symbol))
        })
        .collect();
    prefixes.sort_by(|a, b| b.0.cmp(&a.0).then(a.1.cmp(&b.1)));

    let letters: String = prefixes.iter().map(|p| p.2).collect();
    let symbols: String = prefixes.iter().map(|p| p.3).collect();
    format!("PREFIX=({}){}", letters, symbols)
}

/// The `MAXLIST=letters:limit` token, advertising the fallback limit for
/// every registered list mode. Channels matched by a configured rule may
/// get a different effective limit; ISUPPORT has no way to say so.
#[must_use]
pub fn maxlist_token(registry: &ModeRegistry, limits: &ListLimits) -> String {
    let letters: String = registry
        .iter()
        .filter(|(_, def)| matches!(def.kind, ModeKind::List(_)))
        .map(|(_, def)| def.letter)
        .collect();
    format!("MAXLIST={}:{}", letters, limits.default_limit())
}

/// All mode-related tokens in one pass, ready to splice into the 005
/// burst.
#[must_use]
pub fn isupport_tokens(registry: &ModeRegistry, limits: &ListLimits) -> Vec<String> {
    vec![
        chanmodes_token(registry),
        prefix_token(registry),
        maxlist_token(registry, limits),
    ]
}
