//! LITEKV - Transaction Coordinator
//! Tracks which transaction, if any, is open on the store's connection and
//! decides when a write has to issue BEGIN and COMMIT.
//!
//! ## States
//! - `Idle`: SQLite is in autocommit mode.
//! - `Batch`: a write opened a transaction because auto-commit is off.
//!   It stays open until the caller commits.
//! - `Explicit`: the caller called `begin_transaction`.
//!
//! One-time keys consumed while a transaction is open are remembered so a
//! ROLLBACK cannot bring them back.

use std::cell::RefCell;
use std::mem;

use crate::error::{LiteKvError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxnState {
    Idle,
    Batch,
    Explicit,
}

/// How a single mutating call must be wrapped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteScope {
    /// BEGIN before the write, COMMIT right after (ROLLBACK on failure).
    AutoCommit,
    /// BEGIN before the write and leave the transaction open.
    OpenBatch,
    /// A transaction is already open; just write.
    Joined,
}

#[derive(Debug)]
pub struct TxnCoordinator {
    state: TxnState,
    auto_commit: bool,
    /// One-time keys deleted inside the open transaction.
    consumed: RefCell<Vec<String>>,
}

impl TxnCoordinator {
    pub fn new(auto_commit: bool) -> Self {
        Self {
            state: TxnState::Idle,
            auto_commit,
            consumed: RefCell::new(Vec::new()),
        }
    }

    pub fn state(&self) -> TxnState {
        self.state
    }

    pub fn is_open(&self) -> bool {
        self.state != TxnState::Idle
    }

    /// Caller-initiated begin. Returns `true` if a BEGIN must be issued;
    /// `false` when a pending batch is adopted as the caller's transaction.
    pub fn begin(&mut self) -> Result<bool> {
        match self.state {
            TxnState::Idle => {
                self.state = TxnState::Explicit;
                Ok(true)
            }
            TxnState::Batch => {
                self.state = TxnState::Explicit;
                Ok(false)
            }
            TxnState::Explicit => Err(LiteKvError::TransactionAlreadyOpen),
        }
    }

    /// Close the open transaction. Returns `true` if there was one, i.e.
    /// a COMMIT or ROLLBACK must be issued.
    pub fn finish(&mut self) -> bool {
        let was_open = self.is_open();
        self.state = TxnState::Idle;
        self.consumed.get_mut().clear();
        was_open
    }

    /// Remember a one-time key deleted by a read. Outside a transaction the
    /// delete is already durable, so nothing is recorded.
    pub fn note_consumed(&self, key: &str) {
        if self.is_open() {
            self.consumed.borrow_mut().push(key.to_string());
        }
    }

    /// Keys consumed in the open transaction, leaving the list empty.
    pub fn take_consumed(&mut self) -> Vec<String> {
        mem::take(self.consumed.get_mut())
    }

    /// Scope for the next mutating call. Moves Idle to Batch when
    /// auto-commit is off.
    pub fn write_scope(&mut self) -> WriteScope {
        match self.state {
            TxnState::Idle if self.auto_commit => WriteScope::AutoCommit,
            TxnState::Idle => {
                self.state = TxnState::Batch;
                WriteScope::OpenBatch
            }
            TxnState::Batch | TxnState::Explicit => WriteScope::Joined,
        }
    }

    /// Undo the Idle -> Batch transition when the BEGIN itself failed.
    pub fn abort_scope(&mut self, scope: WriteScope) {
        if scope == WriteScope::OpenBatch {
            self.state = TxnState::Idle;
        }
    }
}
