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

use clap::Parser;
use csv::{ReaderBuilder, Trim, Writer};
use rust_decimal::Decimal;
use serde::Deserialize;
use splitledger_rs::{
    Engine, Expense, ExpenseId, GroupId, LedgerSnapshot, ParticipantId, Payment, Settlement,
    SettlementId, Split, SplitRule,
};
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Read, Write};
use std::path::PathBuf;
use std::process;

/// Splitledger - Process shared-expense CSV ledgers
///
/// Reads a group ledger from a CSV file and outputs the simplified debt
/// rows to stdout. Supports participants, expenses, splits, payments, and
/// settlements against computed debts.
#[derive(Parser, Debug)]
#[command(name = "splitledger-rs")]
#[command(about = "A shared-expense engine that simplifies group debts", long_about = None)]
struct Args {
    /// Path to CSV file with ledger entries
    ///
    /// Expected format: type,group,a,b,amount
    /// Example: cargo run -- ledger.csv > debts.csv
    #[arg(value_name = "FILE")]
    input: PathBuf,
}

fn main() {
    // Parse command line arguments
    let args = Args::parse();

    // Open input file
    let file = match File::open(&args.input) {
        Ok(f) => f,
        Err(e) => {
            eprintln!("Error opening file '{}': {}", args.input.display(), e);
            process::exit(1);
        }
    };

    // Process ledger entries from CSV
    let engine = match process_ledger(BufReader::new(file)) {
        Ok(engine) => engine,
        Err(e) => {
            eprintln!("Error processing ledger: {}", e);
            process::exit(1);
        }
    };

    // Write results to stdout
    if let Err(e) = write_debts(&engine, std::io::stdout()) {
        eprintln!("Error writing output: {}", e);
        process::exit(1);
    }
}

/// Raw CSV record matching the input format.
///
/// Fields: `type, group, a, b, amount`. The meaning of `a` and `b` depends
/// on the record type; see [`CsvRecord::into_entry`].
#[derive(Debug, Deserialize)]
struct CsvRecord {
    #[serde(rename = "type")]
    entry_type: String,
    group: u32,
    #[serde(deserialize_with = "csv::invalid_option")]
    a: Option<u32>,
    #[serde(deserialize_with = "csv::invalid_option")]
    b: Option<u32>,
    #[serde(deserialize_with = "csv::invalid_option")]
    amount: Option<Decimal>,
}

/// One parsed ledger entry.
#[derive(Debug)]
enum LedgerEntry {
    Participant(ParticipantId),
    Expense(Expense),
    Split(Split),
    Payment(Payment),
    Settlement {
        lender: ParticipantId,
        debtor: ParticipantId,
        amount: Decimal,
    },
}

impl CsvRecord {
    /// Converts a CSV record to a ledger entry.
    ///
    /// | type       | a              | b              | amount   |
    /// |------------|----------------|----------------|----------|
    /// | participant| participant id | -              | -        |
    /// | expense    | expense id     | payer id       | required |
    /// | split      | expense id     | participant id | required |
    /// | payment    | payer id       | payee id       | required |
    /// | settlement | lender id      | debtor id      | required |
    ///
    /// Returns `None` for unknown types or missing required fields.
    fn into_entry(self) -> Option<(GroupId, LedgerEntry)> {
        let group_id = GroupId(self.group);

        let entry = match self.entry_type.to_lowercase().as_str() {
            "participant" => LedgerEntry::Participant(ParticipantId(self.a?)),
            "expense" => LedgerEntry::Expense(
                Expense::new(
                    ExpenseId(self.a?),
                    ParticipantId(self.b?),
                    self.amount?,
                    SplitRule::Amount,
                )
                .ok()?,
            ),
            "split" => LedgerEntry::Split(
                Split::new(ExpenseId(self.a?), ParticipantId(self.b?), self.amount?).ok()?,
            ),
            "payment" => LedgerEntry::Payment(
                Payment::new(ParticipantId(self.a?), ParticipantId(self.b?), self.amount?).ok()?,
            ),
            "settlement" => LedgerEntry::Settlement {
                lender: ParticipantId(self.a?),
                debtor: ParticipantId(self.b?),
                amount: self.amount?,
            },
            _ => return None,
        };
        Some((group_id, entry))
    }
}

/// Process ledger entries from a CSV reader.
///
/// Streaming parse; malformed rows and invalid entries are silently skipped.
/// Rows apply in file order, so an expense row must precede its split rows.
/// A settlement row first triggers a recomputation of its group (so it lands
/// on current debt rows) and is then applied; a final recomputation per group
/// runs at end of input.
///
/// # CSV Format
///
/// Expected columns: `type, group, a, b, amount`
///
/// ```csv
/// type,group,a,b,amount
/// participant,1,1,,
/// participant,1,2,,
/// expense,1,1,1,40.00
/// split,1,1,1,20.00
/// split,1,1,2,20.00
/// settlement,1,1,2,20.00
/// ```
///
/// # Errors
///
/// Returns a CSV error if the reader fails or the CSV structure is invalid.
/// Individual entry errors are logged in debug mode but don't stop processing.
pub fn process_ledger<R: Read>(reader: R) -> Result<Engine, csv::Error> {
    let engine = Engine::new();
    let mut ledgers: HashMap<GroupId, LedgerSnapshot> = HashMap::new();
    let mut next_settlement_id = 0u32;

    let mut rdr = ReaderBuilder::new()
        .trim(Trim::All)
        .flexible(true)
        .has_headers(true)
        .from_reader(reader);

    for result in rdr.deserialize::<CsvRecord>() {
        let record = match result {
            Ok(record) => record,
            Err(e) => {
                // Skip malformed rows
                #[cfg(debug_assertions)]
                eprintln!("Skipping malformed row: {}", e);
                let _ = e;
                continue;
            }
        };

        let Some((group_id, entry)) = record.into_entry() else {
            #[cfg(debug_assertions)]
            eprintln!("Skipping invalid ledger record");
            continue;
        };

        let ledger = ledgers
            .entry(group_id)
            .or_insert_with(|| LedgerSnapshot::new(group_id, []));

        match entry {
            LedgerEntry::Participant(participant_id) => ledger.add_participant(participant_id),
            LedgerEntry::Expense(expense) => ledger.add_expense(expense, Vec::new()),
            LedgerEntry::Split(split) => ledger.add_split(split),
            LedgerEntry::Payment(payment) => ledger.add_payment(payment),
            LedgerEntry::Settlement {
                lender,
                debtor,
                amount,
            } => {
                // Bring the group's debt rows up to date before settling.
                engine.recompute(ledger);
                let settlement = Settlement {
                    settlement_id: SettlementId(next_settlement_id),
                    group_id,
                    lender,
                    debtor,
                    amount,
                };
                next_settlement_id += 1;
                if let Err(e) = engine.settle(settlement) {
                    #[cfg(debug_assertions)]
                    eprintln!("Skipping settlement {}: {}", settlement.settlement_id, e);
                    let _ = e;
                }
            }
        }
    }

    // Final recomputation per group, in a stable order.
    let mut group_ids: Vec<GroupId> = ledgers.keys().copied().collect();
    group_ids.sort_unstable();
    for group_id in group_ids {
        if let Some(ledger) = ledgers.get(&group_id) {
            engine.recompute(ledger);
        }
    }

    Ok(engine)
}

/// Write debt rows to a CSV writer.
///
/// Outputs every group's rows sorted by (group, lender, debtor), amounts
/// rounded to 2 decimal places.
///
/// # CSV Format
///
/// Columns: `group, lender, debtor, debt, paid, outstanding`
///
/// ```csv
/// group,lender,debtor,debt,paid,outstanding
/// 1,1,2,10.00,0,10.00
/// ```
///
/// # Errors
///
/// Returns a CSV error if writing fails.
pub fn write_debts<W: Write>(engine: &Engine, writer: W) -> Result<(), csv::Error> {
    let mut wtr = Writer::from_writer(writer);

    for group_id in engine.group_ids() {
        for row in engine.debts(group_id) {
            wtr.serialize(&row)?;
        }
    }

    wtr.flush()?;
    Ok(())
}
