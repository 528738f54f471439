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

//! Ledger entry types and the immutable group snapshot.
//!
//! A [`LedgerSnapshot`] is the value the engine consumes on every
//! recomputation: the group roster plus all expenses, splits, and payments.
//! It is built once per recomputation and passed into pure functions, never
//! mutated mid-pipeline.
//!
//! Editing an expense fully replaces its splits; deleting an expense deletes
//! them. Split consistency (lines summing to the expense amount) is checked
//! by [`LedgerSnapshot::check`] and reported as warnings, never as failures.

use crate::base::{EPSILON, ExpenseId, GroupId, ParticipantId};
use crate::error::{LedgerError, LedgerWarning};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// How an expense was divided among participants.
///
/// The rule is descriptive: the owed amounts on the [`Split`] lines are
/// authoritative, whichever rule produced them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SplitRule {
    Equal,
    Amount,
    Share,
    Percent,
}

/// One outlay paid by a single participant on behalf of the group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Expense {
    pub expense_id: ExpenseId,
    pub payer_id: ParticipantId,
    pub amount: Decimal,
    pub rule: SplitRule,
}

impl Expense {
    /// Creates an expense.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::NonPositiveAmount`] if the amount is not
    /// strictly positive.
    pub fn new(
        expense_id: ExpenseId,
        payer_id: ParticipantId,
        amount: Decimal,
        rule: SplitRule,
    ) -> Result<Self, LedgerError> {
        if amount <= Decimal::ZERO {
            return Err(LedgerError::NonPositiveAmount);
        }
        Ok(Self {
            expense_id,
            payer_id,
            amount,
            rule,
        })
    }

    /// Divides the expense equally among the given participants.
    ///
    /// Division happens in minor units: each participant gets the truncated
    /// equal share, and the leftover cents go to the earliest participants,
    /// so the splits always sum exactly to the expense amount.
    pub fn split_equally(&self, participants: &[ParticipantId]) -> Vec<Split> {
        if participants.is_empty() {
            return Vec::new();
        }
        let count = Decimal::from(participants.len());
        let base = (self.amount / count).round_dp_with_strategy(2, RoundingStrategy::ToZero);
        let mut leftover = self.amount - base * count;

        participants
            .iter()
            .map(|&participant_id| {
                let mut owed = base;
                if leftover >= EPSILON {
                    owed += EPSILON;
                    leftover -= EPSILON;
                }
                Split {
                    expense_id: self.expense_id,
                    participant_id,
                    owed,
                }
            })
            .collect()
    }
}

/// One line of an expense: what a single participant owes toward it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Split {
    pub expense_id: ExpenseId,
    pub participant_id: ParticipantId,
    pub owed: Decimal,
}

impl Split {
    /// Creates a split line.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::NegativeOwedAmount`] if the owed amount is
    /// negative. Zero is allowed: a participant can be on an expense without
    /// owing toward it.
    pub fn new(
        expense_id: ExpenseId,
        participant_id: ParticipantId,
        owed: Decimal,
    ) -> Result<Self, LedgerError> {
        if owed < Decimal::ZERO {
            return Err(LedgerError::NegativeOwedAmount);
        }
        Ok(Self {
            expense_id,
            participant_id,
            owed,
        })
    }
}

/// A direct transfer between two participants.
///
/// Payments net like transfers in the balance calculation: handing money to
/// another participant raises the payer's net balance and lowers the
/// payee's. They are independent of debt rows; the reconciler also emits
/// payments when it retires a row that still carries a paid amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payment {
    pub payer_id: ParticipantId,
    pub payee_id: ParticipantId,
    pub amount: Decimal,
}

impl Payment {
    /// Creates a payment.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::NonPositiveAmount`] if the amount is not positive.
    /// - [`LedgerError::SelfTransfer`] if payer and payee are the same.
    pub fn new(
        payer_id: ParticipantId,
        payee_id: ParticipantId,
        amount: Decimal,
    ) -> Result<Self, LedgerError> {
        if amount <= Decimal::ZERO {
            return Err(LedgerError::NonPositiveAmount);
        }
        if payer_id == payee_id {
            return Err(LedgerError::SelfTransfer);
        }
        Ok(Self {
            payer_id,
            payee_id,
            amount,
        })
    }
}

/// Immutable view of one group's ledger at a recomputation instant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerSnapshot {
    group_id: GroupId,
    participants: Vec<ParticipantId>,
    expenses: Vec<Expense>,
    splits: Vec<Split>,
    payments: Vec<Payment>,
}

impl LedgerSnapshot {
    /// Creates an empty snapshot for a group roster.
    ///
    /// Duplicate participant ids are collapsed; order follows ascending id.
    pub fn new(group_id: GroupId, participants: impl IntoIterator<Item = ParticipantId>) -> Self {
        let mut participants: Vec<ParticipantId> = participants.into_iter().collect();
        participants.sort_unstable();
        participants.dedup();
        Self {
            group_id,
            participants,
            expenses: Vec::new(),
            splits: Vec::new(),
            payments: Vec::new(),
        }
    }

    pub fn group_id(&self) -> GroupId {
        self.group_id
    }

    pub fn participants(&self) -> &[ParticipantId] {
        &self.participants
    }

    pub fn expenses(&self) -> &[Expense] {
        &self.expenses
    }

    pub fn splits(&self) -> &[Split] {
        &self.splits
    }

    pub fn payments(&self) -> &[Payment] {
        &self.payments
    }

    /// Adds a participant to the roster. Adding an existing id is a no-op.
    pub fn add_participant(&mut self, participant_id: ParticipantId) {
        if let Err(index) = self.participants.binary_search(&participant_id) {
            self.participants.insert(index, participant_id);
        }
    }

    /// Records an expense together with its split lines.
    ///
    /// If an expense with the same id already exists, it and all of its
    /// splits are fully replaced. Splits are never patched line by line.
    pub fn add_expense(&mut self, expense: Expense, splits: Vec<Split>) {
        self.remove_expense(expense.expense_id);
        self.expenses.push(expense);
        self.splits
            .extend(splits.into_iter().filter(|s| s.expense_id == expense.expense_id));
    }

    /// Appends a single split line.
    ///
    /// Ingestion paths use this when splits arrive separately from their
    /// expense; [`LedgerSnapshot::add_expense`] stays the replace-all path
    /// for edits. A split without a matching expense surfaces as an
    /// [`LedgerWarning::OrphanSplit`] from [`LedgerSnapshot::check`].
    pub fn add_split(&mut self, split: Split) {
        self.splits.push(split);
    }

    /// Deletes an expense and all of its splits. Unknown ids are a no-op.
    pub fn remove_expense(&mut self, expense_id: ExpenseId) {
        self.expenses.retain(|e| e.expense_id != expense_id);
        self.splits.retain(|s| s.expense_id != expense_id);
    }

    /// Records a direct payment between two participants.
    pub fn add_payment(&mut self, payment: Payment) {
        self.payments.push(payment);
    }

    /// Validates the snapshot, returning every inconsistency found.
    ///
    /// An empty result means the ledger is internally consistent. Warnings
    /// never stop a recomputation; the caller decides whether to surface or
    /// reject them upstream.
    pub fn check(&self) -> Vec<LedgerWarning> {
        let mut warnings = Vec::new();

        for expense in &self.expenses {
            let actual: Decimal = self
                .splits
                .iter()
                .filter(|s| s.expense_id == expense.expense_id)
                .map(|s| s.owed)
                .sum();
            if (actual - expense.amount).abs() > EPSILON {
                warnings.push(LedgerWarning::SplitMismatch {
                    expense_id: expense.expense_id,
                    expected: expense.amount,
                    actual,
                });
            }
            if !self.is_member(expense.payer_id) {
                warnings.push(LedgerWarning::UnknownParticipant {
                    participant_id: expense.payer_id,
                });
            }
        }

        for split in &self.splits {
            if !self.expenses.iter().any(|e| e.expense_id == split.expense_id) {
                warnings.push(LedgerWarning::OrphanSplit {
                    expense_id: split.expense_id,
                });
            }
            if !self.is_member(split.participant_id) {
                warnings.push(LedgerWarning::UnknownParticipant {
                    participant_id: split.participant_id,
                });
            }
        }

        for payment in &self.payments {
            for participant_id in [payment.payer_id, payment.payee_id] {
                if !self.is_member(participant_id) {
                    warnings.push(LedgerWarning::UnknownParticipant { participant_id });
                }
            }
        }

        warnings
    }

    fn is_member(&self, participant_id: ParticipantId) -> bool {
        self.participants.binary_search(&participant_id).is_ok()
    }
}
