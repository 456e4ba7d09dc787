use std::collections::HashSet;
use std::fmt;

use crate::record::RecordHandle;

/// Which set of a [`ChangeBatch`] a record was reported in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ChangeKind {
    Inserted,
    Updated,
    Deleted,
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Inserted => "inserted",
            Self::Updated => "updated",
            Self::Deleted => "deleted",
        };
        f.write_str(s)
    }
}

/// The payload of one change notification.
///
/// Each set is unordered. Subscribers only read a batch; it is owned by the
/// publisher for the duration of one dispatch.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ChangeBatch {
    pub inserted: HashSet<RecordHandle>,
    pub updated: HashSet<RecordHandle>,
    pub deleted: HashSet<RecordHandle>,
}

impl ChangeBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_inserted(mut self, records: impl IntoIterator<Item = RecordHandle>) -> Self {
        self.inserted.extend(records);
        self
    }

    pub fn with_updated(mut self, records: impl IntoIterator<Item = RecordHandle>) -> Self {
        self.updated.extend(records);
        self
    }

    pub fn with_deleted(mut self, records: impl IntoIterator<Item = RecordHandle>) -> Self {
        self.deleted.extend(records);
        self
    }

    /// The set of records reported as `kind`.
    pub fn records(&self, kind: ChangeKind) -> &HashSet<RecordHandle> {
        match kind {
            ChangeKind::Inserted => &self.inserted,
            ChangeKind::Updated => &self.updated,
            ChangeKind::Deleted => &self.deleted,
        }
    }

    pub fn contains(&self, kind: ChangeKind, record: &RecordHandle) -> bool {
        self.records(kind).contains(record)
    }

    pub fn is_empty(&self) -> bool {
        self.inserted.is_empty() && self.updated.is_empty() && self.deleted.is_empty()
    }

    /// Total number of record entries across all three sets.
    pub fn len(&self) -> usize {
        self.inserted.len() + self.updated.len() + self.deleted.len()
    }
}

impl fmt::Display for ChangeBatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "inserted={} updated={} deleted={}",
            self.inserted.len(),
            self.updated.len(),
            self.deleted.len()
        )
    }
}
