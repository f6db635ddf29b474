//! Mode-string parsing.
//!
//! The protocol layer hands over the raw `+ov-b`-style mode word plus the
//! ordered parameter list that followed it. This module pairs letters
//! with their arguments; resolving what the letters mean is the engine's
//! validation phase.

use crate::def::{ModeKind, ModeRegistry, TargetKind};
use crate::error::ParseError;

/// One requested change, before validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestedChange {
    /// True for `+`, false for `-`.
    pub adding: bool,
    /// The mode letter as received.
    pub letter: char,
    /// The argument paired with this letter, if any.
    pub param: Option<String>,
}

impl RequestedChange {
    /// A `+letter` request.
    #[must_use]
    pub fn add(letter: char, param: Option<&str>) -> Self {
        Self {
            adding: true,
            letter,
            param: param.map(String::from),
        }
    }

    /// A `-letter` request.
    #[must_use]
    pub fn remove(letter: char, param: Option<&str>) -> Self {
        Self {
            adding: false,
            letter,
            param: param.map(String::from),
        }
    }
}

/// Parsed request: changes to apply, plus list letters queried bare.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedModes {
    /// Tuples to hand to the engine.
    pub changes: Vec<RequestedChange>,
    /// List modes named with no argument left: display queries, answered
    /// from the query interface rather than applied.
    pub queries: Vec<char>,
}

/// Split `pieces` (the mode word first, then its parameters) into tuples.
///
/// A leading word without `+`/`-` is treated as adding. Unknown letters
/// pass through with no parameter so the engine can reject each one
/// individually without starving later modes of their arguments. A list
/// mode with no argument left is a query, not an error.
pub fn parse_mode_args(
    registry: &ModeRegistry,
    target: TargetKind,
    pieces: &[&str],
) -> Result<ParsedModes, ParseError> {
    let mut parsed = ParsedModes::default();
    let Some((word, rest)) = pieces.split_first() else {
        return Ok(parsed);
    };

    let mut args = rest.iter().copied().peekable();
    let mut adding = true;

    for c in word.chars() {
        match c {
            '+' => adding = true,
            '-' => adding = false,
            _ => {
                let def = registry.find(c, target).map(|(_, def)| def);
                let wants_param = def.is_some_and(|d| d.takes_param(adding));
                let is_list = def.is_some_and(|d| matches!(d.kind, ModeKind::List(_)));

                let param = if wants_param {
                    match args.next() {
                        Some(arg) => Some(arg.to_string()),
                        None if is_list => {
                            parsed.queries.push(c);
                            continue;
                        }
                        None => return Err(ParseError::MissingArgument(c)),
                    }
                } else {
                    None
                };
                parsed.changes.push(RequestedChange {
                    adding,
                    letter: c,
                    param,
                });
            }
        }
    }

    if args.peek().is_some() {
        return Err(ParseError::SurplusArguments);
    }
    Ok(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::register_standard;

    fn registry() -> ModeRegistry {
        let mut registry = ModeRegistry::new();
        register_standard(&mut registry).expect("fresh registry");
        registry
    }

    #[test]
    fn mixed_directions_pair_arguments_in_order() {
        let parsed = parse_mode_args(
            &registry(),
            TargetKind::Channel,
            &["+ov-b", "alice", "bob", "spam!*@*"],
        )
        .expect("well-formed");

        assert_eq!(
            parsed.changes,
            vec![
                RequestedChange::add('o', Some("alice")),
                RequestedChange::add('v', Some("bob")),
                RequestedChange::remove('b', Some("spam!*@*")),
            ]
        );
        assert!(parsed.queries.is_empty());
    }

    #[test]
    fn bare_list_mode_is_a_query() {
        let parsed =
            parse_mode_args(&registry(), TargetKind::Channel, &["+b"]).expect("well-formed");
        assert!(parsed.changes.is_empty());
        assert_eq!(parsed.queries, vec!['b']);
    }

    #[test]
    fn leading_word_without_sign_adds() {
        let parsed =
            parse_mode_args(&registry(), TargetKind::Channel, &["nt"]).expect("well-formed");
        assert_eq!(
            parsed.changes,
            vec![
                RequestedChange::add('n', None),
                RequestedChange::add('t', None),
            ]
        );
    }

    #[test]
    fn unknown_letters_consume_no_arguments() {
        let parsed = parse_mode_args(&registry(), TargetKind::Channel, &["+Xb", "mask!*@*"])
            .expect("well-formed");
        assert_eq!(
            parsed.changes,
            vec![
                RequestedChange::add('X', None),
                RequestedChange::add('b', Some("mask!*@*")),
            ]
        );
    }

    #[test]
    fn removing_when_setting_mode_needs_no_argument() {
        let parsed =
            parse_mode_args(&registry(), TargetKind::Channel, &["-l"]).expect("well-formed");
        assert_eq!(parsed.changes, vec![RequestedChange::remove('l', None)]);
    }

    #[test]
    fn missing_argument_for_prefix_is_an_error() {
        let err = parse_mode_args(&registry(), TargetKind::Channel, &["+o"])
            .expect_err("o needs a nick");
        assert_eq!(err, ParseError::MissingArgument('o'));
    }

    #[test]
    fn surplus_arguments_are_an_error() {
        let err = parse_mode_args(&registry(), TargetKind::Channel, &["+t", "stray"])
            .expect_err("t takes nothing");
        assert_eq!(err, ParseError::SurplusArguments);
    }

    #[test]
    fn empty_input_parses_to_nothing() {
        let parsed = parse_mode_args(&registry(), TargetKind::Channel, &[]).expect("empty");
        assert!(parsed.changes.is_empty());
        assert!(parsed.queries.is_empty());
    }
}
