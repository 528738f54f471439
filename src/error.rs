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

//! Error and warning types.
//!
//! Errors reject an operation outright. Warnings report recoverable
//! inconsistencies in the ledger; the engine collects them and still returns
//! a best-effort result, so balances stay visible even with slightly
//! inconsistent history.

use crate::base::{ExpenseId, ParticipantId};
use rust_decimal::Decimal;
use thiserror::Error;

/// Ledger construction errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    /// Expense or payment amount is zero or negative
    #[error("invalid amount (must be positive)")]
    NonPositiveAmount,

    /// Split owed amount is negative
    #[error("invalid owed amount (must not be negative)")]
    NegativeOwedAmount,

    /// Payment payer and payee are the same participant
    #[error("payer and payee must differ")]
    SelfTransfer,
}

/// Engine operation errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// No state exists for the referenced group
    #[error("group not found")]
    GroupNotFound,

    /// No debt row exists for the referenced (lender, debtor) pair
    #[error("no open debt between lender and debtor")]
    DebtNotFound,

    /// Settlement would push paid_amount above debt_amount
    #[error("settlement exceeds outstanding debt")]
    SettlementExceedsDebt,

    /// Settlement ID was already journaled
    #[error("duplicate settlement ID")]
    DuplicateSettlement,

    /// Settlement amount is zero or negative
    #[error("invalid settlement amount (must be positive)")]
    InvalidSettlementAmount,
}

/// Recoverable ledger inconsistencies, collected during recomputation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerWarning {
    /// An expense's splits do not sum to its amount within tolerance
    #[error("splits for expense {expense_id} sum to {actual}, expected {expected}")]
    SplitMismatch {
        expense_id: ExpenseId,
        expected: Decimal,
        actual: Decimal,
    },

    /// A split references an expense that is not in the snapshot
    #[error("split references unknown expense {expense_id}")]
    OrphanSplit { expense_id: ExpenseId },

    /// A ledger entry references a participant outside the group roster
    #[error("participant {participant_id} is not a member of the group")]
    UnknownParticipant { participant_id: ParticipantId },
}
