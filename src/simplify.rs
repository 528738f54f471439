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

//! Debt simplification.
//!
//! Converts net balances into a small set of lender→debtor transfer edges
//! that drive every balance to zero (within ε).
//!
//! The algorithm is greedy largest-vs-largest: repeatedly pair the largest
//! remaining creditor with the largest remaining debtor, emit an edge for
//! `min(credit, debt)`, and push back whichever side has a remainder above ε.
//! Sub-ε positions sit out of that pairing, but they are not discarded: once
//! one side runs dry, the other side's leftover is backed entirely by dust
//! on the opposite side, and a final pass settles it dust position by dust
//! position, overshooting each by at most ε. Ties break on ascending
//! participant id, so repeated runs over unchanged balances produce an
//! identical edge list — the reconciler's diff depends on that stability.
//! O(n log n) over two binary heaps.
//!
//! This heuristic keeps the edge count low in practice but is not a provably
//! minimal edge-count solution; exact minimization reduces to set partition
//! and is NP-hard. If exact minimality is ever needed, this module can be
//! swapped for a min-cost-flow formulation without touching the balance or
//! reconciliation stages.

use crate::base::{EPSILON, ParticipantId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::{BTreeMap, BinaryHeap};

/// One proposed transfer: `debtor` pays `lender` the given amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edge {
    pub lender: ParticipantId,
    pub debtor: ParticipantId,
    pub amount: Decimal,
}

/// Heap entry: an open position on either side of the pairing.
///
/// Ordered by amount, then by descending participant id, so the max-heap
/// pops the largest amount and breaks ties on the smallest id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Position {
    amount: Decimal,
    participant: ParticipantId,
}

impl Ord for Position {
    fn cmp(&self, other: &Self) -> Ordering {
        self.amount
            .cmp(&other.amount)
            .then_with(|| other.participant.cmp(&self.participant))
    }
}

impl PartialOrd for Position {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Simplifies net balances into transfer edges.
///
/// Every emitted edge has a distinct (lender, debtor) pair for a given run,
/// lender ≠ debtor, and amount > ε. Applying the edges leaves every
/// participant within ε of zero; a participant whose balance only exists as
/// sub-ε dust may be overshot by at most ε. A group with no creditors or no
/// debtors (including the degenerate single-participant group) yields an
/// empty list.
pub fn simplify(balances: &BTreeMap<ParticipantId, Decimal>) -> Vec<Edge> {
    let mut creditors = BinaryHeap::new();
    let mut debtors = BinaryHeap::new();
    // Positions in (0, ε] never pair on their own, but they still back real
    // money on the other side and must stay reachable for the final pass.
    let mut dust_creditors = BinaryHeap::new();
    let mut dust_debtors = BinaryHeap::new();

    for (&participant, &balance) in balances {
        let position = Position {
            amount: balance.abs(),
            participant,
        };
        if balance > EPSILON {
            creditors.push(position);
        } else if balance < -EPSILON {
            debtors.push(position);
        } else if balance > Decimal::ZERO {
            dust_creditors.push(position);
        } else if balance < Decimal::ZERO {
            dust_debtors.push(position);
        }
    }

    let mut edges = Vec::new();
    while let (Some(&credit), Some(&debt)) = (creditors.peek(), debtors.peek()) {
        creditors.pop();
        debtors.pop();
        let transfer = credit.amount.min(debt.amount);
        edges.push(Edge {
            lender: credit.participant,
            debtor: debt.participant,
            amount: transfer,
        });

        let credit_left = credit.amount - transfer;
        if credit_left > EPSILON {
            creditors.push(Position {
                amount: credit_left,
                participant: credit.participant,
            });
        } else if credit_left > Decimal::ZERO {
            dust_creditors.push(Position {
                amount: credit_left,
                participant: credit.participant,
            });
        }
        let debt_left = debt.amount - transfer;
        if debt_left > EPSILON {
            debtors.push(Position {
                amount: debt_left,
                participant: debt.participant,
            });
        } else if debt_left > Decimal::ZERO {
            dust_debtors.push(Position {
                amount: debt_left,
                participant: debt.participant,
            });
        }
    }

    // At most one heap survives the pairing above, and whatever it still
    // holds is covered entirely by dust on the other side. Consume each dust
    // position in full, overshooting it by at most ε so the edge amount
    // stays above ε while both parties land within ε of zero.
    while let (Some(&credit), Some(&debt)) = (creditors.peek(), dust_debtors.peek()) {
        creditors.pop();
        dust_debtors.pop();
        let transfer = credit.amount.min(debt.amount + EPSILON);
        edges.push(Edge {
            lender: credit.participant,
            debtor: debt.participant,
            amount: transfer,
        });

        let credit_left = credit.amount - transfer;
        if credit_left > EPSILON {
            creditors.push(Position {
                amount: credit_left,
                participant: credit.participant,
            });
        }
    }
    while let (Some(&debt), Some(&credit)) = (debtors.peek(), dust_creditors.peek()) {
        debtors.pop();
        dust_creditors.pop();
        let transfer = debt.amount.min(credit.amount + EPSILON);
        edges.push(Edge {
            lender: credit.participant,
            debtor: debt.participant,
            amount: transfer,
        });

        let debt_left = debt.amount - transfer;
        if debt_left > EPSILON {
            debtors.push(Position {
                amount: debt_left,
                participant: debt.participant,
            });
        }
    }

    edges
}
