//! Applied-change records.

use crate::error::{RejectReason, SkipReason};

/// Outcome of a single requested tuple.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// State changed as requested.
    Applied,
    /// Harmless no-op; state was already as requested.
    Skipped(SkipReason),
    /// The request was refused.
    Rejected(RejectReason),
}

impl Outcome {
    /// True for tuples that changed state.
    #[must_use]
    pub fn is_applied(&self) -> bool {
        matches!(self, Self::Applied)
    }

    /// Static label for logging and metrics.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Applied => "applied",
            Self::Skipped(reason) => reason.error_code(),
            Self::Rejected(reason) => reason.error_code(),
        }
    }
}

/// One processed tuple with its outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordItem {
    /// The mode letter.
    pub letter: char,
    /// True for `+`, false for `-`.
    pub adding: bool,
    /// The parameter as it should appear on the wire (normalized for
    /// parameter modes, as given otherwise).
    pub param: Option<String>,
    /// What happened to this tuple.
    pub outcome: Outcome,
}

/// The ordered record of one engine invocation.
///
/// This is the only artifact the protocol layer sees: the full per-tuple
/// outcomes drive numeric replies, the applied subset drives the local
/// echo and network relay.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeRecord {
    target: String,
    items: Vec<RecordItem>,
}

impl ChangeRecord {
    pub(crate) fn new(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            items: Vec::new(),
        }
    }

    pub(crate) fn push(&mut self, item: RecordItem) {
        self.items.push(item);
    }

    /// The channel name or nickname the batch targeted.
    #[must_use]
    pub fn target(&self) -> &str {
        &self.target
    }

    /// Every processed tuple, in request order.
    #[must_use]
    pub fn items(&self) -> &[RecordItem] {
        &self.items
    }

    /// Tuples that changed state, in request order.
    pub fn applied(&self) -> impl Iterator<Item = &RecordItem> {
        self.items.iter().filter(|item| item.outcome.is_applied())
    }

    /// Number of tuples that changed state.
    #[must_use]
    pub fn applied_count(&self) -> usize {
        self.applied().count()
    }

    /// True when nothing changed. Still a finalized record, not an error.
    #[must_use]
    pub fn is_noop(&self) -> bool {
        self.applied_count() == 0
    }

    /// Render the applied subset as a wire-style mode string.
    ///
    /// Consecutive same-direction changes share one `+`/`-` segment and
    /// parameters follow in change order: `+bo-v mask nick nick`. `None`
    /// when nothing was applied.
    #[must_use]
    pub fn mode_string(&self) -> Option<String> {
        let mut letters = String::new();
        let mut params: Vec<&str> = Vec::new();
        let mut direction = None;

        for item in self.applied() {
            if direction != Some(item.adding) {
                letters.push(if item.adding { '+' } else { '-' });
                direction = Some(item.adding);
            }
            letters.push(item.letter);
            if let Some(param) = &item.param {
                params.push(param);
            }
        }

        if letters.is_empty() {
            return None;
        }
        Some(if params.is_empty() {
            letters
        } else {
            format!("{} {}", letters, params.join(" "))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn applied(letter: char, adding: bool, param: Option<&str>) -> RecordItem {
        RecordItem {
            letter,
            adding,
            param: param.map(String::from),
            outcome: Outcome::Applied,
        }
    }

    #[test]
    fn mode_string_groups_directions() {
        let mut record = ChangeRecord::new("#test");
        record.push(applied('b', true, Some("spam!*@*")));
        record.push(applied('o', true, Some("alice")));
        record.push(applied('v', false, Some("bob")));
        record.push(applied('t', false, None));

        assert_eq!(
            record.mode_string().as_deref(),
            Some("+bo-vt spam!*@* alice bob")
        );
    }

    #[test]
    fn rejected_tuples_are_excluded_from_the_wire_form() {
        let mut record = ChangeRecord::new("#test");
        record.push(RecordItem {
            letter: 'X',
            adding: true,
            param: None,
            outcome: Outcome::Rejected(RejectReason::UnknownMode('X')),
        });
        record.push(applied('t', true, None));

        assert_eq!(record.items().len(), 2);
        assert_eq!(record.applied_count(), 1);
        assert_eq!(record.mode_string().as_deref(), Some("+t"));
    }

    #[test]
    fn empty_applied_set_renders_nothing() {
        let mut record = ChangeRecord::new("#test");
        record.push(RecordItem {
            letter: 'b',
            adding: false,
            param: Some("gone!*@*".into()),
            outcome: Outcome::Skipped(SkipReason::NotPresent),
        });
        assert!(record.is_noop());
        assert_eq!(record.mode_string(), None);
    }

    #[test]
    fn outcome_labels() {
        assert_eq!(Outcome::Applied.error_code(), "applied");
        assert_eq!(
            Outcome::Skipped(SkipReason::NotPresent).error_code(),
            "not_present"
        );
        assert_eq!(
            Outcome::Rejected(RejectReason::UnknownMode('X')).error_code(),
            "unknown_mode"
        );
    }
}
