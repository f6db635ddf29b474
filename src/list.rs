//! List-mode storage: bounded per-channel mask lists.

use crate::def::CanonicalFn;

/// One entry in a mask list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListEntry {
    /// The mask as originally given.
    pub mask: String,
    /// Who set the entry (nick or server name, caller's choice of form).
    pub set_by: String,
    /// Unix timestamp of the change.
    pub set_at: i64,
}

/// Failure modes of [`ModeList::add`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddError {
    /// The list is at its resolved size limit.
    TooLong,
    /// An equivalent mask is already present.
    AlreadyPresent,
}

/// Failure mode of [`ModeList::remove`]: no equivalent mask found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NotPresent;

/// An ordered, bounded collection of masks.
///
/// Insertion order is preserved for display only; membership is a set
/// keyed by the owning mode's canonicalized mask form. Entries keep the
/// mask exactly as given so displays match what the setter typed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModeList {
    entries: Vec<ListEntry>,
}

impl ModeList {
    /// Add a mask.
    ///
    /// An equivalent mask already present reports `AlreadyPresent` before
    /// the limit is consulted, so re-adding an existing entry stays
    /// idempotent even on a full list.
    pub fn add(
        &mut self,
        canonical: CanonicalFn,
        mask: &str,
        set_by: &str,
        set_at: i64,
        limit: usize,
    ) -> Result<(), AddError> {
        let key = canonical(mask);
        if self.entries.iter().any(|e| canonical(&e.mask) == key) {
            return Err(AddError::AlreadyPresent);
        }
        if self.entries.len() >= limit {
            return Err(AddError::TooLong);
        }
        self.entries.push(ListEntry {
            mask: mask.to_string(),
            set_by: set_by.to_string(),
            set_at,
        });
        Ok(())
    }

    /// Remove the entry equivalent to `mask`, returning it.
    pub fn remove(&mut self, canonical: CanonicalFn, mask: &str) -> Result<ListEntry, NotPresent> {
        let key = canonical(mask);
        match self.entries.iter().position(|e| canonical(&e.mask) == key) {
            Some(i) => Ok(self.entries.remove(i)),
            None => Err(NotPresent),
        }
    }

    /// Entries in insertion order, for display.
    #[must_use]
    pub fn entries(&self) -> &[ListEntry] {
        &self.entries
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when the list holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop every entry, returning them. Used when the owning channel or
    /// the mode itself goes away.
    pub fn remove_all(&mut self) -> Vec<ListEntry> {
        std::mem::take(&mut self.entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::casemap;

    fn add(list: &mut ModeList, mask: &str, limit: usize) -> Result<(), AddError> {
        list.add(casemap::fold, mask, "tester", 1_700_000_000, limit)
    }

    #[test]
    fn add_then_remove() {
        let mut list = ModeList::default();
        add(&mut list, "spam!*@*", 10).expect("room in list");
        assert_eq!(list.len(), 1);

        let removed = list.remove(casemap::fold, "SPAM!*@*").expect("equivalent mask");
        assert_eq!(removed.mask, "spam!*@*");
        assert!(list.is_empty());
    }

    #[test]
    fn equivalent_mask_is_rejected() {
        let mut list = ModeList::default();
        add(&mut list, "Evil[1]!*@*", 10).expect("room in list");
        assert_eq!(
            add(&mut list, "evil{1}!*@*", 10),
            Err(AddError::AlreadyPresent)
        );
        assert_eq!(list.len(), 1);
    }

    #[test]
    fn limit_is_enforced_after_every_add() {
        let mut list = ModeList::default();
        add(&mut list, "a!*@*", 1).expect("room in list");
        assert_eq!(add(&mut list, "b!*@*", 1), Err(AddError::TooLong));
        assert_eq!(list.len(), 1);
        assert_eq!(list.entries()[0].mask, "a!*@*");
    }

    #[test]
    fn readding_existing_mask_on_full_list_is_idempotent() {
        let mut list = ModeList::default();
        add(&mut list, "a!*@*", 1).expect("room in list");
        assert_eq!(add(&mut list, "A!*@*", 1), Err(AddError::AlreadyPresent));
    }

    #[test]
    fn remove_missing_is_idempotent() {
        let mut list = ModeList::default();
        add(&mut list, "a!*@*", 10).expect("room in list");

        assert_eq!(list.remove(casemap::fold, "b!*@*"), Err(NotPresent));
        let snapshot = list.clone();
        assert_eq!(list.remove(casemap::fold, "b!*@*"), Err(NotPresent));
        assert_eq!(list, snapshot);
    }

    #[test]
    fn remove_all_drains() {
        let mut list = ModeList::default();
        add(&mut list, "a!*@*", 10).expect("room in list");
        add(&mut list, "b!*@*", 10).expect("room in list");

        let drained = list.remove_all();
        assert_eq!(drained.len(), 2);
        assert!(list.is_empty());
    }
}
