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

//! Benchmarks for the splitledger engine.
//!
//! Run with: cargo bench
//!
//! Benchmarks include:
//! - Full recomputation for growing group sizes
//! - The simplifier in isolation
//! - Parallel recomputation across independent groups
//! - Settlement throughput

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use rayon::prelude::*;
use rust_decimal::Decimal;
use splitledger_rs::{
    Engine, Expense, ExpenseId, GroupId, LedgerSnapshot, ParticipantId, Settlement, SettlementId,
    SplitRule, net_balances, simplify,
};
use std::collections::BTreeMap;

// =============================================================================
// Helper Functions
// =============================================================================

/// Builds a snapshot with `participants` members and `expenses` equal-split
/// expenses rotating through the payers.
fn make_snapshot(group: u32, participants: u32, expenses: u32) -> LedgerSnapshot {
    let roster: Vec<ParticipantId> = (1..=participants).map(ParticipantId).collect();
    let mut snapshot = LedgerSnapshot::new(GroupId(group), roster.clone());

    for i in 0..expenses {
        let payer = roster[(i % participants) as usize];
        let amount = Decimal::new(1_000 + i as i64 * 37, 2);
        let expense = Expense::new(ExpenseId(i), payer, amount, SplitRule::Equal)
            .expect("positive amount");
        snapshot.add_expense(expense, expense.split_equally(&roster));
    }

    snapshot
}

fn make_balances(participants: u32) -> BTreeMap<ParticipantId, Decimal> {
    // Alternating creditors and debtors, conserving to zero.
    (1..=participants)
        .map(|id| {
            let amount = Decimal::new(if id % 2 == 0 { 2_500 } else { -2_500 }, 2);
            (ParticipantId(id), amount)
        })
        .collect()
}

// =============================================================================
// Benchmarks
// =============================================================================

fn bench_recompute(c: &mut Criterion) {
    let mut group = c.benchmark_group("recompute");

    for &participants in &[10u32, 50, 100] {
        let snapshot = make_snapshot(1, participants, participants * 2);
        group.throughput(Throughput::Elements(u64::from(participants * 2)));
        group.bench_with_input(
            BenchmarkId::from_parameter(participants),
            &snapshot,
            |b, snapshot| {
                let engine = Engine::new();
                b.iter(|| black_box(engine.recompute(snapshot)));
            },
        );
    }

    group.finish();
}

fn bench_simplify(c: &mut Criterion) {
    let mut group = c.benchmark_group("simplify");

    for &participants in &[10u32, 100, 1_000] {
        let balances = make_balances(participants);
        group.throughput(Throughput::Elements(u64::from(participants)));
        group.bench_with_input(
            BenchmarkId::from_parameter(participants),
            &balances,
            |b, balances| b.iter(|| black_box(simplify(balances))),
        );
    }

    group.finish();
}

fn bench_balance_calculation(c: &mut Criterion) {
    let snapshot = make_snapshot(1, 50, 200);

    c.bench_function("net_balances/50x200", |b| {
        b.iter(|| black_box(net_balances(&snapshot)))
    });
}

fn bench_parallel_groups(c: &mut Criterion) {
    let snapshots: Vec<LedgerSnapshot> =
        (1..=100).map(|group| make_snapshot(group, 20, 40)).collect();

    let mut group = c.benchmark_group("parallel_groups");
    group.throughput(Throughput::Elements(snapshots.len() as u64));

    group.bench_function("sequential", |b| {
        b.iter(|| {
            let engine = Engine::new();
            for snapshot in &snapshots {
                black_box(engine.recompute(snapshot));
            }
        })
    });

    group.bench_function("rayon", |b| {
        b.iter(|| {
            let engine = Engine::new();
            snapshots.par_iter().for_each(|snapshot| {
                black_box(engine.recompute(snapshot));
            });
        })
    });

    group.finish();
}

fn bench_settlements(c: &mut Criterion) {
    c.bench_function("settle/1000", |b| {
        let snapshot = make_snapshot(1, 2, 1);
        b.iter_with_setup(
            || {
                let engine = Engine::new();
                engine.recompute(&snapshot);
                engine
            },
            |engine| {
                let rows = engine.debts(GroupId(1));
                let row = rows[0];
                // Tiny settlements so a thousand of them fit into the debt.
                let amount = row.debt_amount / Decimal::from(1_000);
                for id in 0..1_000u32 {
                    let _ = engine.settle(Settlement {
                        settlement_id: SettlementId(id),
                        group_id: row.group_id,
                        lender: row.lender,
                        debtor: row.debtor,
                        amount,
                    });
                }
            },
        )
    });
}

criterion_group!(
    benches,
    bench_recompute,
    bench_simplify,
    bench_balance_calculation,
    bench_parallel_groups,
    bench_settlements
);
criterion_main!(benches);
