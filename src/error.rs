//! Error taxonomy for the mode subsystem.
//!
//! Per-tuple failures ([`RejectReason`], [`SkipReason`]) are recovered
//! inside a batch and surface only as outcomes on the change record;
//! they never abort sibling tuples. Registry and configuration errors
//! are load-time failures that leave the running state untouched.

use thiserror::Error;

use crate::def::TargetKind;

/// Why a requested tuple was rejected outright.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RejectReason {
    /// No definition registered for this letter on this target kind.
    #[error("'{0}' is unknown mode char to me")]
    UnknownMode(char),

    /// Parameter missing, forbidden, or failed the mode's validation.
    #[error("bad parameter for mode '{letter}': {detail}")]
    BadParameter {
        /// The offending mode letter.
        letter: char,
        /// Human-readable validation detail.
        detail: String,
    },

    /// The acting user's rank is below the mode's requirement.
    #[error("insufficient privileges for mode '{0}'")]
    AccessDenied(char),

    /// The target list is at its resolved size limit.
    #[error("list for mode '{0}' is full")]
    TooLong(char),
}

impl RejectReason {
    /// Static label for logging and metrics.
    #[inline]
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::UnknownMode(_) => "unknown_mode",
            Self::BadParameter { .. } => "bad_parameter",
            Self::AccessDenied(_) => "access_denied",
            Self::TooLong(_) => "too_long",
        }
    }
}

/// Why a requested tuple was a harmless no-op.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SkipReason {
    /// An equivalent mask is already on the list.
    #[error("mask is already on the list")]
    AlreadyPresent,

    /// No equivalent mask is on the list.
    #[error("mask is not on the list")]
    NotPresent,

    /// The change would not alter state (flag already in the requested
    /// position, rank already granted or already absent).
    #[error("change has no effect")]
    NoChange,
}

impl SkipReason {
    /// Static label for logging and metrics.
    #[inline]
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::AlreadyPresent => "already_present",
            Self::NotPresent => "not_present",
            Self::NoChange => "no_change",
        }
    }
}

/// Registry-level failures, fatal to that registration only.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// The `(letter, target)` pair, or a prefix display symbol, is taken.
    #[error("mode '{letter}' is already registered for {target} targets")]
    DuplicateMode {
        /// The contested mode letter.
        letter: char,
        /// The target kind of the attempted registration.
        target: TargetKind,
    },

    /// The handle does not name a live definition.
    #[error("no such mode definition")]
    UnknownModeDefinition,
}

/// Configuration loading and validation failures.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("cannot read config: {0}")]
    Io(#[from] std::io::Error),

    /// The config file is not valid TOML for the expected shape.
    #[error("cannot parse config: {0}")]
    Parse(#[from] toml::de::Error),

    /// A limit table key is not a single mode letter.
    #[error("limit table key {key:?} is not a single mode letter")]
    BadModeKey {
        /// The offending table key.
        key: String,
    },

    /// A limit rule's channel pattern is not a valid glob.
    #[error("bad limit pattern {pattern:?} for mode '{letter}'")]
    BadPattern {
        /// The mode letter whose table holds the rule.
        letter: char,
        /// The pattern as written in the config.
        pattern: String,
        /// The underlying glob compile error.
        #[source]
        source: glob::PatternError,
    },
}

/// Mode-string parse failures.
///
/// These abort the whole parse: with positional parameters a missing or
/// surplus argument makes every later assignment ambiguous.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// A known mode needs an argument and none was left.
    #[error("mode '{0}' requires an argument but none was provided")]
    MissingArgument(char),

    /// Arguments remained after every mode letter was consumed.
    #[error("unused arguments after mode parsing")]
    SurplusArguments,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reject_error_codes() {
        assert_eq!(RejectReason::UnknownMode('X').error_code(), "unknown_mode");
        assert_eq!(RejectReason::AccessDenied('o').error_code(), "access_denied");
        assert_eq!(RejectReason::TooLong('b').error_code(), "too_long");
    }

    #[test]
    fn skip_error_codes() {
        assert_eq!(SkipReason::AlreadyPresent.error_code(), "already_present");
        assert_eq!(SkipReason::NoChange.error_code(), "no_change");
    }

    #[test]
    fn duplicate_mode_display_names_target() {
        let err = RegistryError::DuplicateMode {
            letter: 'b',
            target: TargetKind::Channel,
        };
        assert_eq!(
            err.to_string(),
            "mode 'b' is already registered for channel targets"
        );
    }
}
