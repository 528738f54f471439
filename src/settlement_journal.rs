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

//! Thread-safe settlement journal with deduplication.
//!
//! Keeps every applied settlement so payment history survives debt
//! recomputations, and rejects duplicate settlement ids so the same payment
//! can never be applied twice.

use crate::base::{GroupId, ParticipantId, SettlementId};
use crate::error::EngineError;
use crossbeam::queue::SegQueue;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// A payment recorded against one (lender, debtor) debt row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settlement {
    pub settlement_id: SettlementId,
    pub group_id: GroupId,
    pub lender: ParticipantId,
    pub debtor: ParticipantId,
    pub amount: Decimal,
}

/// An append-only journal of settlements with duplicate detection.
///
/// Combines a [`DashMap`] for O(1) duplicate checking with a [`SegQueue`]
/// that feeds [`drain_in_order`](Self::drain_in_order) consumers in
/// application order. All operations are lock-free and safe for concurrent
/// access.
#[derive(Debug)]
pub struct SettlementJournal {
    /// Settlements indexed by id for O(1) duplicate detection.
    settlements: DashMap<SettlementId, Arc<Settlement>>,

    /// Queue of settlement ids maintaining application order.
    settlement_ids: SegQueue<SettlementId>,
}

impl SettlementJournal {
    /// Creates a new empty journal.
    pub fn new() -> Self {
        Self {
            settlements: DashMap::new(),
            settlement_ids: SegQueue::new(),
        }
    }

    /// Appends a settlement to the journal.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::DuplicateSettlement`] if a settlement with the
    /// same id was already journaled.
    pub fn push(&self, settlement: Arc<Settlement>) -> Result<(), EngineError> {
        let settlement_id = settlement.settlement_id;

        // Entry API gives atomic check-and-insert; two racing submissions of
        // the same id cannot both succeed.
        match self.settlements.entry(settlement_id) {
            Entry::Occupied(_) => Err(EngineError::DuplicateSettlement),
            Entry::Vacant(entry) => {
                entry.insert(settlement);
                self.settlement_ids.push(settlement_id);
                Ok(())
            }
        }
    }

    /// Looks up a journaled settlement by id.
    pub fn get(&self, settlement_id: &SettlementId) -> Option<Arc<Settlement>> {
        self.settlements
            .get(settlement_id)
            .map(|entry| Arc::clone(entry.value()))
    }

    /// Drains the application-order queue, oldest settlement first.
    ///
    /// Each settlement is yielded at most once across all drains. The id
    /// index is untouched, so duplicate detection still covers drained
    /// settlements.
    pub fn drain_in_order(&self) -> Vec<Arc<Settlement>> {
        let mut drained = Vec::with_capacity(self.settlement_ids.len());
        while let Some(settlement_id) = self.settlement_ids.pop() {
            if let Some(settlement) = self.get(&settlement_id) {
                drained.push(settlement);
            }
        }
        drained
    }

    /// Number of journaled settlements.
    pub fn len(&self) -> usize {
        self.settlements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.settlements.is_empty()
    }
}

impl Default for SettlementJournal {
    fn default() -> Self {
        Self::new()
    }
}
