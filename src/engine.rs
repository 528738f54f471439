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

//! Recomputation engine.
//!
//! The [`Engine`] owns the per-group debt store and runs the full pipeline
//! on every recomputation: validate the snapshot, derive net balances,
//! simplify them into edges, reconcile against the stored rows, then swap in
//! the replacement row set. Recomputation is full, not incremental — a
//! single edited expense can change every balance and therefore every edge.
//!
//! # Concurrency
//!
//! Each group's state sits behind its own [`Mutex`] inside a [`DashMap`],
//! giving the single-writer critical section recomputation needs: two
//! concurrent edits to the same group cannot interleave their
//! read-calculate-write cycles, while different groups proceed in parallel.
//! The pipeline itself is pure computation over the snapshot; the stored
//! state is replaced only after every stage has finished, so a recomputation
//! can never leave a partially replaced row set.

use crate::balance::net_balances;
use crate::base::{GroupId, ParticipantId};
use crate::debt::DebtRow;
use crate::error::{EngineError, LedgerWarning};
use crate::ledger::{LedgerSnapshot, Payment};
use crate::reconcile::{DebtOp, reconcile};
use crate::settlement_journal::{Settlement, SettlementJournal};
use crate::simplify::simplify;
use dashmap::DashMap;
use parking_lot::Mutex;
use rust_decimal::Decimal;
use std::sync::Arc;

/// Per-group persisted state.
#[derive(Debug, Default)]
struct GroupState {
    /// Current debt rows, unique per (lender, debtor).
    debts: Vec<DebtRow>,
    /// Payments derived by the reconciler's disappearance policy. They are
    /// folded into every balance calculation for the group so retired paid
    /// amounts keep netting.
    carryovers: Vec<Payment>,
}

/// Result of one full recomputation.
#[derive(Debug, Clone)]
pub struct RecomputeOutcome {
    /// The group's complete replacement row set.
    pub rows: Vec<DebtRow>,
    /// Storage deltas from the previous row set to `rows`.
    pub ops: Vec<DebtOp>,
    /// Payments newly derived from retired paid amounts during this pass.
    /// The engine retains them internally; they are exposed so callers can
    /// mirror them into their own records.
    pub carryovers: Vec<Payment>,
    /// Ledger inconsistencies found while validating the snapshot. The
    /// result is still best-effort complete; the caller decides whether to
    /// surface or reject them upstream.
    pub warnings: Vec<LedgerWarning>,
}

/// Debt recomputation engine managing per-group debt rows.
///
/// # Invariants
///
/// - Debt rows are unique per (group, lender, debtor); no row has
///   lender == debtor.
/// - After a recomputation, the signed sum of a group's rows reproduces
///   every participant's net balance within ε.
/// - `paid_amount` never exceeds `debt_amount` and survives recomputation
///   untouched while its pair persists; a disappearing pair converts its
///   paid amount into a carryover payment, never drops it.
pub struct Engine {
    /// Group states indexed by group id.
    groups: DashMap<GroupId, Mutex<GroupState>>,
    /// Global journal of applied settlements, for deduplication and history.
    journal: SettlementJournal,
}

impl Engine {
    /// Creates a new engine with no groups.
    pub fn new() -> Self {
        Engine {
            groups: DashMap::new(),
            journal: SettlementJournal::new(),
        }
    }

    /// Runs a full recomputation for the snapshot's group.
    ///
    /// Never fails: inconsistent ledgers produce warnings next to a
    /// best-effort result, and a degenerate group (fewer than two
    /// participants) simply yields no rows.
    pub fn recompute(&self, snapshot: &LedgerSnapshot) -> RecomputeOutcome {
        let group_id = snapshot.group_id();
        let state_ref = self.groups.entry(group_id).or_default();
        let mut state = state_ref.lock();

        let warnings = snapshot.check();

        // Carryover payments are part of the effective ledger even though
        // the caller's snapshot does not contain them.
        let balances = if state.carryovers.is_empty() {
            net_balances(snapshot)
        } else {
            let mut working = snapshot.clone();
            for &carryover in &state.carryovers {
                working.add_payment(carryover);
            }
            net_balances(&working)
        };

        let edges = simplify(&balances);
        let reconciliation = reconcile(group_id, &edges, &state.debts);

        // Write phase: all-or-nothing swap of the stored row set.
        state.debts = reconciliation.rows.clone();
        state.carryovers.extend(reconciliation.carryovers.iter().copied());

        RecomputeOutcome {
            rows: reconciliation.rows,
            ops: reconciliation.ops,
            carryovers: reconciliation.carryovers,
            warnings,
        }
    }

    /// Applies a settlement to its (lender, debtor) debt row.
    ///
    /// The settlement is validated against the current row before it is
    /// journaled, so a rejected settlement does not consume its id.
    ///
    /// # Errors
    ///
    /// - [`EngineError::InvalidSettlementAmount`] - Amount is not positive.
    /// - [`EngineError::GroupNotFound`] - No state exists for the group.
    /// - [`EngineError::DebtNotFound`] - No row for the (lender, debtor) pair.
    /// - [`EngineError::SettlementExceedsDebt`] - Payment would overshoot the
    ///   debt; signals a duplicate settlement or a reconciliation race.
    /// - [`EngineError::DuplicateSettlement`] - Settlement id already used.
    pub fn settle(&self, settlement: Settlement) -> Result<DebtRow, EngineError> {
        if settlement.amount <= Decimal::ZERO {
            return Err(EngineError::InvalidSettlementAmount);
        }

        let state_ref = self
            .groups
            .get(&settlement.group_id)
            .ok_or(EngineError::GroupNotFound)?;
        let mut state = state_ref.lock();

        let row = state
            .debts
            .iter_mut()
            .find(|row| row.lender == settlement.lender && row.debtor == settlement.debtor)
            .ok_or(EngineError::DebtNotFound)?;
        if row.paid_amount + settlement.amount > row.debt_amount {
            return Err(EngineError::SettlementExceedsDebt);
        }

        self.journal.push(Arc::new(settlement))?;
        row.apply_settlement(settlement.amount)?;
        Ok(*row)
    }

    /// Returns a group's debt rows, sorted by (lender, debtor).
    ///
    /// Unknown groups yield an empty list.
    pub fn debts(&self, group_id: GroupId) -> Vec<DebtRow> {
        let Some(state_ref) = self.groups.get(&group_id) else {
            return Vec::new();
        };
        let state = state_ref.lock();
        let mut rows = state.debts.clone();
        rows.sort_by_key(|row| (row.lender, row.debtor));
        rows
    }

    /// Looks up a single debt row.
    pub fn get_debt(
        &self,
        group_id: GroupId,
        lender: ParticipantId,
        debtor: ParticipantId,
    ) -> Option<DebtRow> {
        let state_ref = self.groups.get(&group_id)?;
        let state = state_ref.lock();
        state
            .debts
            .iter()
            .find(|row| row.lender == lender && row.debtor == debtor)
            .copied()
    }

    /// All known group ids, ascending.
    pub fn group_ids(&self) -> Vec<GroupId> {
        let mut ids: Vec<GroupId> = self.groups.iter().map(|entry| *entry.key()).collect();
        ids.sort_unstable();
        ids
    }

    /// The journal of every settlement applied through this engine.
    pub fn settlements(&self) -> &SettlementJournal {
        &self.journal
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}
