// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2025 Daniel Negri
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

//! # Splitledger
//!
//! This library provides a shared-expense engine: it derives each group
//! participant's signed net balance from an expense/split/payment ledger,
//! simplifies the balances into a small set of lender→debtor transfers, and
//! reconciles freshly computed transfers against previously persisted debt
//! rows so recorded payments are never lost when the ledger changes.
//!
//! ## Core Components
//!
//! - [`Engine`]: Per-group debt store running the full recomputation pipeline
//! - [`LedgerSnapshot`]: Immutable view of a group's expenses, splits, payments
//! - [`net_balances`]: Ledger → signed net balance per participant
//! - [`simplify`]: Balances → minimal transfer edges (greedy heuristic)
//! - [`reconcile`]: New edges + old rows → storage deltas, paid amounts kept
//!
//! ## Example
//!
//! ```
//! use splitledger_rs::{
//!     Engine, Expense, ExpenseId, GroupId, LedgerSnapshot, ParticipantId, SplitRule,
//! };
//! use rust_decimal_macros::dec;
//!
//! let engine = Engine::new();
//! let participants = [1, 2, 3, 4].map(ParticipantId);
//! let mut snapshot = LedgerSnapshot::new(GroupId(1), participants);
//!
//! // Participant 1 pays 40.00, split equally across the group.
//! let expense = Expense::new(
//!     ExpenseId(1),
//!     ParticipantId(1),
//!     dec!(40.00),
//!     SplitRule::Equal,
//! )
//! .unwrap();
//! snapshot.add_expense(expense, expense.split_equally(&participants));
//!
//! let outcome = engine.recompute(&snapshot);
//! assert_eq!(outcome.rows.len(), 3);
//! assert!(outcome.rows.iter().all(|row| row.debt_amount == dec!(10.00)));
//! ```
//!
//! ## Thread Safety
//!
//! The engine serializes recomputation per group while letting different
//! groups recompute in parallel. The pipeline stages themselves are pure
//! functions over an immutable snapshot.

pub mod balance;
mod base;
pub mod debt;
mod engine;
pub mod error;
pub mod ledger;
pub mod reconcile;
mod settlement_journal;
pub mod simplify;

pub use balance::net_balances;
pub use base::{EPSILON, ExpenseId, GroupId, ParticipantId, SettlementId};
pub use debt::DebtRow;
pub use engine::{Engine, RecomputeOutcome};
pub use error::{EngineError, LedgerError, LedgerWarning};
pub use ledger::{Expense, LedgerSnapshot, Payment, Split, SplitRule};
pub use reconcile::{DebtOp, Reconciliation, reconcile};
pub use settlement_journal::{Settlement, SettlementJournal};
pub use simplify::{Edge, simplify};
