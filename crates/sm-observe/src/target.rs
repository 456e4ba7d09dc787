use std::fmt;

use sm_context::RecordHandle;
use sm_types::ScalarValue;

/// What an observer watches.
///
/// Fixed when the observer is constructed.
#[derive(Clone, Debug)]
pub enum WatchTarget {
    /// One specific record.
    ByIdentity(RecordHandle),
    /// Any record of `entity` whose `field` currently equals `value`.
    ByField {
        entity: String,
        field: String,
        value: ScalarValue,
    },
}

impl WatchTarget {
    pub fn identity(record: RecordHandle) -> Self {
        Self::ByIdentity(record)
    }

    pub fn field(
        entity: impl Into<String>,
        field: impl Into<String>,
        value: impl Into<ScalarValue>,
    ) -> Self {
        Self::ByField {
            entity: entity.into(),
            field: field.into(),
            value: value.into(),
        }
    }

    /// Returns `true` if `record` is the watched record.
    ///
    /// Field targets read the record's live value. A record of another
    /// entity, or one whose entity lacks the field, does not match.
    pub fn matches(&self, record: &RecordHandle) -> bool {
        match self {
            Self::ByIdentity(watched) => watched == record,
            Self::ByField {
                entity,
                field,
                value,
            } => {
                record.entity_name() == entity
                    && record
                        .field(field)
                        .map(|current| current.matches_scalar(value))
                        .unwrap_or(false)
            }
        }
    }
}

impl fmt::Display for WatchTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ByIdentity(record) => write!(f, "{record}"),
            Self::ByField {
                entity,
                field,
                value,
            } => write!(f, "{entity}[{field} == {value}]"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{context, insert_comment};

    #[test]
    fn identity_matches_only_that_record() {
        let ctx = context();
        let a = insert_comment(&ctx, "C1", "a");
        let b = insert_comment(&ctx, "C1", "b");
        let target = WatchTarget::identity(a.clone());
        assert!(target.matches(&a));
        assert!(target.matches(&a.clone()));
        assert!(!target.matches(&b));
    }

    #[test]
    fn field_matches_live_value() {
        let ctx = context();
        let a = insert_comment(&ctx, "C1", "a");
        let target = WatchTarget::field("Comment", "id", "C1");
        assert!(target.matches(&a));

        ctx.set(&a, "id", "C2").unwrap();
        assert!(!target.matches(&a));
    }

    #[test]
    fn field_target_ignores_other_entities() {
        let ctx = context();
        let d = crate::fixtures::insert_discussion(&ctx, "C1");
        assert!(!WatchTarget::field("Comment", "id", "C1").matches(&d));
        assert!(WatchTarget::field("Discussion", "id", "C1").matches(&d));
    }

    #[test]
    fn missing_field_never_matches() {
        let ctx = context();
        let a = insert_comment(&ctx, "C1", "a");
        assert!(!WatchTarget::field("Comment", "uuid", "C1").matches(&a));
        assert!(!WatchTarget::field("Author", "id", "C1").matches(&a));
    }

    #[test]
    fn display_names_the_target() {
        let target = WatchTarget::field("Comment", "id", "C1");
        assert_eq!(target.to_string(), "Comment[id == \"C1\"]");
    }
}
