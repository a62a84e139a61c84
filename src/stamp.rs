use chrono::{DateTime, Utc};
use sea_orm::ActiveValue::Set;
use uuid::Uuid;

use crate::entity::{dishes, setmeals};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationKind {
    Insert,
    Update,
}

/// Fills the bookkeeping columns of a row about to be written.
pub trait Stamp {
    fn stamp(&mut self, now: DateTime<Utc>, actor: Uuid, op: OperationKind);
}

impl Stamp for dishes::ActiveModel {
    fn stamp(&mut self, now: DateTime<Utc>, actor: Uuid, op: OperationKind) {
        if op == OperationKind::Insert {
            self.created_at = Set(now.into());
            self.created_by = Set(Some(actor));
        }
        self.updated_at = Set(now.into());
        self.updated_by = Set(Some(actor));
    }
}

impl Stamp for setmeals::ActiveModel {
    fn stamp(&mut self, now: DateTime<Utc>, actor: Uuid, op: OperationKind) {
        if op == OperationKind::Insert {
            self.created_at = Set(now.into());
            self.created_by = Set(Some(actor));
        }
        self.updated_at = Set(now.into());
        self.updated_by = Set(Some(actor));
    }
}
