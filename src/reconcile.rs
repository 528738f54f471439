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

//! Debt reconciliation.
//!
//! Merges a freshly simplified edge list with the debt rows persisted by the
//! previous recomputation, so money already paid is never forgotten:
//!
//! - every new edge maps to exactly one row carrying the new debt amount;
//! - a surviving (lender, debtor) pair keeps its `paid_amount` untouched,
//!   only `debt_amount` is refreshed;
//! - a pair that disappears does not take its paid history with it: the
//!   remaining `paid_amount` is converted into an explicit [`Payment`] from
//!   debtor to lender, which re-nets through the balance calculator on the
//!   next recomputation. The same conversion applies to the excess when a
//!   surviving pair's refreshed debt drops below what was already paid.
//!
//! The output is a delta list ([`DebtOp`]) for the store plus the resulting
//! row set; the reconciler itself never touches storage.

use crate::base::{EPSILON, GroupId, ParticipantId};
use crate::debt::DebtRow;
use crate::ledger::Payment;
use crate::simplify::Edge;
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::HashMap;

/// One storage instruction produced by reconciliation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DebtOp {
    /// A new (lender, debtor) pair appeared; persist this row.
    Insert(DebtRow),
    /// The pair survives with a changed debt amount; paid_amount is kept.
    SetAmount {
        lender: ParticipantId,
        debtor: ParticipantId,
        debt_amount: Decimal,
    },
    /// The pair has no edge in the new computation; drop its row.
    Remove {
        lender: ParticipantId,
        debtor: ParticipantId,
    },
}

/// Result of one reconciliation pass.
#[derive(Debug, Clone, Default)]
pub struct Reconciliation {
    /// The complete replacement row set, in edge order.
    pub rows: Vec<DebtRow>,
    /// Deltas to bring the store from the old row set to `rows`.
    pub ops: Vec<DebtOp>,
    /// Payments derived from retired paid amounts; they must be fed back
    /// into the ledger so the money re-nets on the next pass.
    pub carryovers: Vec<Payment>,
}

/// Reconciles new edges against previously persisted rows.
///
/// `edges` must carry distinct (lender, debtor) pairs, as [`simplify`]
/// produces. Both inputs are snapshots; the function is pure and emits
/// deltas rather than writing anywhere.
///
/// [`simplify`]: crate::simplify::simplify
pub fn reconcile(group_id: GroupId, edges: &[Edge], existing: &[DebtRow]) -> Reconciliation {
    let mut previous: HashMap<(ParticipantId, ParticipantId), DebtRow> = existing
        .iter()
        .map(|row| ((row.lender, row.debtor), *row))
        .collect();

    let mut result = Reconciliation::default();

    for edge in edges {
        match previous.remove(&(edge.lender, edge.debtor)) {
            Some(prev) => {
                let mut paid_amount = prev.paid_amount;
                if paid_amount > edge.amount {
                    // The refreshed debt fell below what was already paid;
                    // the excess becomes a payment so it is not lost.
                    result.carryovers.push(Payment {
                        payer_id: edge.debtor,
                        payee_id: edge.lender,
                        amount: paid_amount - edge.amount,
                    });
                    paid_amount = edge.amount;
                }
                if prev.debt_amount != edge.amount {
                    result.ops.push(DebtOp::SetAmount {
                        lender: edge.lender,
                        debtor: edge.debtor,
                        debt_amount: edge.amount,
                    });
                }
                result.rows.push(DebtRow {
                    group_id,
                    lender: edge.lender,
                    debtor: edge.debtor,
                    debt_amount: edge.amount,
                    paid_amount,
                });
            }
            None => {
                let row = DebtRow::new(group_id, edge.lender, edge.debtor, edge.amount);
                result.ops.push(DebtOp::Insert(row));
                result.rows.push(row);
            }
        }
    }

    // Pairs with no corresponding new edge enter the disappearance policy.
    let mut retired: Vec<DebtRow> = previous.into_values().collect();
    retired.sort_by_key(|row| (row.lender, row.debtor));
    for prev in retired {
        result.ops.push(DebtOp::Remove {
            lender: prev.lender,
            debtor: prev.debtor,
        });
        if prev.paid_amount > EPSILON {
            result.carryovers.push(Payment {
                payer_id: prev.debtor,
                payee_id: prev.lender,
                amount: prev.paid_amount,
            });
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    const GROUP: GroupId = GroupId(1);

    fn edge(lender: u32, debtor: u32, amount: Decimal) -> Edge {
        Edge {
            lender: ParticipantId(lender),
            debtor: ParticipantId(debtor),
            amount,
        }
    }

    fn row(lender: u32, debtor: u32, debt: Decimal, paid: Decimal) -> DebtRow {
        DebtRow {
            group_id: GROUP,
            lender: ParticipantId(lender),
            debtor: ParticipantId(debtor),
            debt_amount: debt,
            paid_amount: paid,
        }
    }

    #[test]
    fn new_edge_inserts_row() {
        let result = reconcile(GROUP, &[edge(1, 2, dec!(10.00))], &[]);

        assert_eq!(result.rows, vec![row(1, 2, dec!(10.00), dec!(0.00))]);
        assert_eq!(
            result.ops,
            vec![DebtOp::Insert(row(1, 2, dec!(10.00), dec!(0.00)))]
        );
        assert!(result.carryovers.is_empty());
    }

    #[test]
    fn surviving_pair_keeps_paid_amount() {
        let result = reconcile(
            GROUP,
            &[edge(1, 2, dec!(40.00))],
            &[row(1, 2, dec!(30.00), dec!(10.00))],
        );

        assert_eq!(result.rows, vec![row(1, 2, dec!(40.00), dec!(10.00))]);
        assert_eq!(
            result.ops,
            vec![DebtOp::SetAmount {
                lender: ParticipantId(1),
                debtor: ParticipantId(2),
                debt_amount: dec!(40.00),
            }]
        );
        assert!(result.carryovers.is_empty());
    }

    #[test]
    fn unchanged_pair_emits_no_op() {
        let result = reconcile(
            GROUP,
            &[edge(1, 2, dec!(30.00))],
            &[row(1, 2, dec!(30.00), dec!(10.00))],
        );

        assert_eq!(result.rows, vec![row(1, 2, dec!(30.00), dec!(10.00))]);
        assert!(result.ops.is_empty());
    }

    #[test]
    fn vanished_pair_converts_paid_into_payment() {
        let result = reconcile(GROUP, &[], &[row(1, 2, dec!(30.00), dec!(10.00))]);

        assert!(result.rows.is_empty());
        assert_eq!(
            result.ops,
            vec![DebtOp::Remove {
                lender: ParticipantId(1),
                debtor: ParticipantId(2),
            }]
        );
        assert_eq!(
            result.carryovers,
            vec![Payment {
                payer_id: ParticipantId(2),
                payee_id: ParticipantId(1),
                amount: dec!(10.00),
            }]
        );
    }

    #[test]
    fn vanished_unpaid_pair_is_just_removed() {
        let result = reconcile(GROUP, &[], &[row(1, 2, dec!(30.00), dec!(0.00))]);

        assert_eq!(result.ops.len(), 1);
        assert!(result.carryovers.is_empty());
    }

    #[test]
    fn shrinking_debt_converts_excess_paid() {
        let result = reconcile(
            GROUP,
            &[edge(1, 2, dec!(5.00))],
            &[row(1, 2, dec!(30.00), dec!(12.00))],
        );

        assert_eq!(result.rows, vec![row(1, 2, dec!(5.00), dec!(5.00))]);
        assert_eq!(
            result.carryovers,
            vec![Payment {
                payer_id: ParticipantId(2),
                payee_id: ParticipantId(1),
                amount: dec!(7.00),
            }]
        );
    }

    #[test]
    fn reversed_pair_counts_as_new() {
        // Direction matters: (2,1) is not the same obligation as (1,2).
        let result = reconcile(
            GROUP,
            &[edge(2, 1, dec!(10.00))],
            &[row(1, 2, dec!(25.00), dec!(25.00))],
        );

        assert_eq!(result.rows, vec![row(2, 1, dec!(10.00), dec!(0.00))]);
        assert_eq!(result.ops.len(), 2);
        assert_eq!(
            result.carryovers,
            vec![Payment {
                payer_id: ParticipantId(2),
                payee_id: ParticipantId(1),
                amount: dec!(25.00),
            }]
        );
    }

    #[test]
    fn removals_are_deterministically_ordered() {
        let existing = vec![
            row(3, 4, dec!(10.00), dec!(0.00)),
            row(1, 2, dec!(10.00), dec!(0.00)),
            row(1, 4, dec!(10.00), dec!(0.00)),
        ];
        let result = reconcile(GROUP, &[], &existing);

        assert_eq!(
            result.ops,
            vec![
                DebtOp::Remove {
                    lender: ParticipantId(1),
                    debtor: ParticipantId(2),
                },
                DebtOp::Remove {
                    lender: ParticipantId(1),
                    debtor: ParticipantId(4),
                },
                DebtOp::Remove {
                    lender: ParticipantId(3),
                    debtor: ParticipantId(4),
                },
            ]
        );
    }
}
