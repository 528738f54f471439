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

//! Debt rows and the settlement state machine.
//!
//! A [`DebtRow`] is one open transfer obligation derived by the simplifier
//! and persisted across recomputations, unique per (group, lender, debtor).
//!
//! # Example
//!
//! ```
//! use rust_decimal_macros::dec;
//! use splitledger_rs::{DebtRow, GroupId, ParticipantId};
//!
//! let row = DebtRow::new(GroupId(1), ParticipantId(1), ParticipantId(2), dec!(30.00));
//! assert_eq!(row.outstanding(), dec!(30.00));
//! ```

use crate::base::{EPSILON, GroupId, ParticipantId};
use crate::error::EngineError;
use rust_decimal::Decimal;
use serde::ser::{Serialize, SerializeStruct, Serializer};

/// One open obligation: `debtor` owes `lender` up to `debt_amount`, of which
/// `paid_amount` has already been handed over.
///
//  absent ──new edge──► open ──settlement──► open / settled
//                         │                     │
//                         │     reconciliation refreshes debt_amount,
//                         │     paid_amount is never touched
//                         │
//                         └──pair disappears──► removed, remaining
//                            paid_amount converted into a Payment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DebtRow {
    pub group_id: GroupId,
    pub lender: ParticipantId,
    pub debtor: ParticipantId,
    pub debt_amount: Decimal,
    pub paid_amount: Decimal,
}

impl DebtRow {
    const DECIMAL_PRECISION: u32 = 2;

    /// Creates a fresh row with nothing paid yet.
    pub fn new(
        group_id: GroupId,
        lender: ParticipantId,
        debtor: ParticipantId,
        debt_amount: Decimal,
    ) -> Self {
        let row = Self {
            group_id,
            lender,
            debtor,
            debt_amount,
            paid_amount: Decimal::ZERO,
        };
        row.assert_invariants();
        row
    }

    fn assert_invariants(&self) {
        debug_assert!(
            self.lender != self.debtor,
            "Invariant violated: debt row with lender == debtor: {}",
            self.lender
        );
        debug_assert!(
            self.paid_amount >= Decimal::ZERO && self.paid_amount <= self.debt_amount,
            "Invariant violated: paid_amount {} outside [0, {}]",
            self.paid_amount,
            self.debt_amount
        );
    }

    /// Returns `debt_amount - paid_amount`.
    pub fn outstanding(&self) -> Decimal {
        self.debt_amount - self.paid_amount
    }

    /// A row counts as settled once its outstanding amount is within ε.
    pub fn is_settled(&self) -> bool {
        self.outstanding() <= EPSILON
    }

    /// Records a payment against this row, increasing `paid_amount`.
    ///
    /// # Errors
    ///
    /// - [`EngineError::InvalidSettlementAmount`] if the amount is not
    ///   positive.
    /// - [`EngineError::SettlementExceedsDebt`] if the payment would push
    ///   `paid_amount` above `debt_amount`. The overshoot is reported, never
    ///   clamped: it signals a duplicate settlement or a reconciliation race,
    ///   and the row is left untouched.
    pub fn apply_settlement(&mut self, amount: Decimal) -> Result<(), EngineError> {
        if amount <= Decimal::ZERO {
            return Err(EngineError::InvalidSettlementAmount);
        }
        if self.paid_amount + amount > self.debt_amount {
            return Err(EngineError::SettlementExceedsDebt);
        }
        self.paid_amount += amount;
        self.assert_invariants();
        Ok(())
    }
}

impl Serialize for DebtRow {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut state = serializer.serialize_struct("DebtRow", 6)?;
        state.serialize_field("group", &self.group_id)?;
        state.serialize_field("lender", &self.lender)?;
        state.serialize_field("debtor", &self.debtor)?;
        state.serialize_field(
            "debt",
            &self.debt_amount.round_dp(DebtRow::DECIMAL_PRECISION),
        )?;
        state.serialize_field(
            "paid",
            &self.paid_amount.round_dp(DebtRow::DECIMAL_PRECISION),
        )?;
        state.serialize_field(
            "outstanding",
            &self.outstanding().round_dp(DebtRow::DECIMAL_PRECISION),
        )?;
        state.end()
    }
}
