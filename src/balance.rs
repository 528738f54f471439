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

//! Balance calculation.
//!
//! Converts a ledger snapshot into one signed net balance per participant:
//! positive means the participant is owed money, negative means they owe.
//!
//! Per participant:
//!
//! ```text
//! balance = Σ(expense amounts paid) − Σ(owed split amounts)
//!         + Σ(payment amounts made) − Σ(payment amounts received)
//! ```
//!
//! A payment made raises the payer's balance: handing money to another
//! participant reduces what you owe the group. Sums run at full [`Decimal`]
//! precision; rounding happens only at serialization, never mid-calculation,
//! so drift cannot accumulate across many small expenses.

use crate::base::ParticipantId;
use crate::ledger::LedgerSnapshot;
use rust_decimal::Decimal;
use std::collections::BTreeMap;

/// Computes the signed net balance of every participant in the snapshot.
///
/// Every roster participant appears in the result, with zero balance when
/// they have no activity. Empty input yields an empty map; this never fails.
/// The result is a [`BTreeMap`] so iteration order is deterministic, which
/// downstream stages rely on.
pub fn net_balances(snapshot: &LedgerSnapshot) -> BTreeMap<ParticipantId, Decimal> {
    let mut balances: BTreeMap<ParticipantId, Decimal> = snapshot
        .participants()
        .iter()
        .map(|&participant_id| (participant_id, Decimal::ZERO))
        .collect();

    for expense in snapshot.expenses() {
        *balances.entry(expense.payer_id).or_default() += expense.amount;
    }
    for split in snapshot.splits() {
        *balances.entry(split.participant_id).or_default() -= split.owed;
    }
    for payment in snapshot.payments() {
        *balances.entry(payment.payer_id).or_default() += payment.amount;
        *balances.entry(payment.payee_id).or_default() -= payment.amount;
    }

    balances
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::base::{ExpenseId, GroupId};
    use crate::ledger::{Expense, Payment, SplitRule};
    use rust_decimal_macros::dec;

    fn snapshot_with_equal_expense(amount: Decimal) -> LedgerSnapshot {
        let participants = [1, 2, 3, 4].map(ParticipantId);
        let mut snapshot = LedgerSnapshot::new(GroupId(1), participants);
        let expense =
            Expense::new(ExpenseId(1), ParticipantId(1), amount, SplitRule::Equal).unwrap();
        snapshot.add_expense(expense, expense.split_equally(&participants));
        snapshot
    }

    #[test]
    fn empty_snapshot_yields_zero_balances() {
        let snapshot = LedgerSnapshot::new(GroupId(1), [1, 2].map(ParticipantId));
        let balances = net_balances(&snapshot);

        assert_eq!(balances.len(), 2);
        assert!(balances.values().all(|b| *b == Decimal::ZERO));
    }

    #[test]
    fn payer_credited_others_debited() {
        let balances = net_balances(&snapshot_with_equal_expense(dec!(40.00)));

        assert_eq!(balances[&ParticipantId(1)], dec!(30.00));
        assert_eq!(balances[&ParticipantId(2)], dec!(-10.00));
        assert_eq!(balances[&ParticipantId(3)], dec!(-10.00));
        assert_eq!(balances[&ParticipantId(4)], dec!(-10.00));
    }

    #[test]
    fn payment_raises_payer_lowers_payee() {
        let mut snapshot = LedgerSnapshot::new(GroupId(1), [1, 2].map(ParticipantId));
        snapshot
            .add_payment(Payment::new(ParticipantId(2), ParticipantId(1), dec!(10.00)).unwrap());

        let balances = net_balances(&snapshot);
        assert_eq!(balances[&ParticipantId(2)], dec!(10.00));
        assert_eq!(balances[&ParticipantId(1)], dec!(-10.00));
    }

    #[test]
    fn balances_conserve_to_zero() {
        let mut snapshot = snapshot_with_equal_expense(dec!(39.99));
        snapshot
            .add_payment(Payment::new(ParticipantId(3), ParticipantId(1), dec!(5.00)).unwrap());

        let total: Decimal = net_balances(&snapshot).values().sum();
        assert_eq!(total, Decimal::ZERO);
    }

    #[test]
    fn uneven_split_keeps_full_precision() {
        let balances = net_balances(&snapshot_with_equal_expense(dec!(10.00)));

        // 10 over four participants: 2.50 each, payer nets 7.50.
        assert_eq!(balances[&ParticipantId(1)], dec!(7.50));

        let total: Decimal = balances.values().sum();
        assert_eq!(total, Decimal::ZERO);
    }
}
