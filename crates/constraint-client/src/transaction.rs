//! Per-call transaction records.

use crate::error::ClientError;
use constraint_domain::Change;
use std::fmt;
use time::OffsetDateTime;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Operation {
    AddTemplate,
    RemoveTemplate,
    AddConstraint,
    RemoveConstraint,
    AddData,
    RemoveData,
    Review,
    Audit,
    Reset,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::AddTemplate => "add_template",
            Operation::RemoveTemplate => "remove_template",
            Operation::AddConstraint => "add_constraint",
            Operation::RemoveConstraint => "remove_constraint",
            Operation::AddData => "add_data",
            Operation::RemoveData => "remove_data",
            Operation::Review => "review",
            Operation::Audit => "audit",
            Operation::Reset => "reset",
        }
    }

    pub fn is_mutation(&self) -> bool {
        !matches!(self, Operation::Review | Operation::Audit)
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What one client call did: the committed changes (empty for no-ops and evaluations), the
/// store generation it ended on, timing, and the error if the call failed.
#[derive(Clone, Debug, PartialEq)]
pub struct Transaction {
    op: Operation,
    changes: Vec<Change>,
    generation: u64,
    started_at: OffsetDateTime,
    finished_at: OffsetDateTime,
    error: Option<ClientError>,
}

impl Transaction {
    pub(crate) fn begin(op: Operation) -> Self {
        let now = OffsetDateTime::now_utc();
        Self {
            op,
            changes: Vec::new(),
            generation: 0,
            started_at: now,
            finished_at: now,
            error: None,
        }
    }

    pub(crate) fn commit(mut self, generation: u64, changes: Vec<Change>) -> Self {
        self.generation = generation;
        self.changes = changes;
        self.finished_at = OffsetDateTime::now_utc();
        self
    }

    pub(crate) fn fail(mut self, generation: u64, error: ClientError) -> Self {
        self.generation = generation;
        self.error = Some(error);
        self.finished_at = OffsetDateTime::now_utc();
        self
    }

    pub fn op(&self) -> Operation {
        self.op
    }

    pub fn changes(&self) -> &[Change] {
        &self.changes
    }

    /// The call committed at least one change.
    pub fn changed(&self) -> bool {
        !self.changes.is_empty()
    }

    /// Store generation after the call (or the snapshot generation an evaluation read).
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn started_at(&self) -> OffsetDateTime {
        self.started_at
    }

    pub fn finished_at(&self) -> OffsetDateTime {
        self.finished_at
    }

    pub fn duration_ms(&self) -> u64 {
        let ms = (self.finished_at - self.started_at).whole_milliseconds().max(0);
        u64::try_from(ms).unwrap_or(u64::MAX)
    }

    pub fn error(&self) -> Option<&ClientError> {
        self.error.as_ref()
    }

    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }

    pub fn into_result(self) -> Result<Vec<Change>, ClientError> {
        match self.error {
            Some(e) => Err(e),
            None => Ok(self.changes),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use constraint_types::Constraint;

    #[test]
    fn committed_transaction_reports_changes() {
        let key = Constraint::new("Foo", "ph").key();
        let tx = Transaction::begin(Operation::AddConstraint)
            .commit(3, vec![Change::ConstraintAdded(key.clone())]);

        assert!(tx.is_ok());
        assert!(tx.changed());
        assert_eq!(tx.generation(), 3);
        assert!(tx.finished_at() >= tx.started_at());
        assert_eq!(tx.into_result(), Ok(vec![Change::ConstraintAdded(key)]));
    }

    #[test]
    fn failed_transaction_carries_error() {
        let tx = Transaction::begin(Operation::Review).fail(1, ClientError::Canceled);
        assert!(!tx.is_ok());
        assert!(!tx.changed());
        assert_eq!(tx.error(), Some(&ClientError::Canceled));
        assert_eq!(tx.into_result(), Err(ClientError::Canceled));
    }

    #[test]
    fn operation_names() {
        assert_eq!(Operation::AddTemplate.to_string(), "add_template");
        assert!(Operation::Reset.is_mutation());
        assert!(!Operation::Audit.is_mutation());
    }
}
