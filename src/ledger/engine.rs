//! The matching engine: transactional batch validation and balance propagation
//!
//! A batch is one subject header (being created or edited) plus its submitted
//! lines and match instructions. Validation runs against a consistent snapshot
//! of every header and match record the batch touches; nothing is applied
//! unless the whole batch passes. The engine itself performs no I/O - the
//! [`Ledger`](crate::ledger::core::Ledger) orchestrator assembles snapshots
//! and commits the resulting [`AppliedBatch`].

use std::collections::HashMap;

use bigdecimal::BigDecimal;

use crate::ledger::batch::Batch;
use crate::ledger::lines::normalize_lines;
use crate::types::{
    LedgerError, LedgerResult, LineItem, MatchRecord, TransactionHeader, ValidationErrors,
};
use crate::utils::money::{apply_sign_convention, format_amount, round_2dp, sorted_window};

pub(crate) const SELF_MATCH: &str = "Cannot match a transaction to itself.";
pub(crate) const VOID_MATCH: &str = "Cannot match to a void transaction.";
pub(crate) const LATER_PERIOD_MATCH: &str =
    "Cannot match to a transaction which is in a later period.";
pub(crate) const LINE_TOTAL_MISMATCH: &str =
    "The total of the lines does not equal the total you entered.";
pub(crate) const ZERO_VALUE_NO_MATCHES: &str =
    "You are trying to enter a zero value transaction without matching to anything.  \
     This isn't allowed because it is pointless.";

/// Snapshot of stored state read consistently before validating a batch
///
/// `counterparts` must hold every header named by a match instruction;
/// `subject_matches` must hold every match record where the subject sits on
/// either side, since unreferenced records still count towards the subject's
/// allocation total.
#[derive(Debug, Clone, Default)]
pub struct BatchSnapshot {
    counterparts: HashMap<String, TransactionHeader>,
    subject_matches: Vec<MatchRecord>,
}

impl BatchSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_counterpart(&mut self, header: TransactionHeader) {
        self.counterparts.insert(header.id.clone(), header);
    }

    pub fn add_match(&mut self, record: MatchRecord) {
        self.subject_matches.push(record);
    }

    pub fn counterpart(&self, id: &str) -> Option<&TransactionHeader> {
        self.counterparts.get(id)
    }

    pub fn counterparts(&self) -> impl Iterator<Item = &TransactionHeader> {
        self.counterparts.values()
    }

    pub fn subject_matches(&self) -> &[MatchRecord] {
        &self.subject_matches
    }

    fn record(&self, match_id: &str) -> Option<&MatchRecord> {
        self.subject_matches.iter().find(|m| m.id == match_id)
    }
}

/// A change to the match-record set produced by an applied batch
#[derive(Debug, Clone, PartialEq)]
pub enum MatchDelta {
    Create(MatchRecord),
    Update(MatchRecord),
    Delete(MatchRecord),
}

/// The full effect of a validated batch, ready to be committed atomically
#[derive(Debug, Clone, PartialEq)]
pub struct AppliedBatch {
    /// The subject header with recomputed paid and due
    pub header: TransactionHeader,
    /// Normalized, renumbered line items
    pub lines: Vec<LineItem>,
    /// Counterpart headers whose balances moved, in first-touched order
    pub counterparts: Vec<TransactionHeader>,
    /// Match record changes, in submission order
    pub match_deltas: Vec<MatchDelta>,
}

/// Validate a batch against a snapshot and compute its full effect
///
/// Every violation is collected into an ordered [`ValidationErrors`]; the
/// batch is rejected whole if any check fails. Structural problems on a match
/// instruction (self-match, void counterpart, later-period counterpart)
/// short-circuit the remaining checks for that instruction only. A missing counterpart or match record in
/// the snapshot is a caller error, reported as `HeaderNotFound` /
/// `MatchNotFound` rather than a validation message.
pub fn validate_batch(batch: &Batch, snapshot: &BatchSnapshot) -> LedgerResult<AppliedBatch> {
    let subject = &batch.header;
    let zero = BigDecimal::from(0);

    for counterpart in snapshot.counterparts.values() {
        counterpart.check_integrity()?;
    }

    let mut errors = ValidationErrors::new();

    // Step 1: effective total. Lines, when present, must agree with the
    // submitted header total.
    let normalized = normalize_lines(&batch.lines, &mut errors);
    let subject_total = round_2dp(&subject.total);
    if !normalized.is_empty() && normalized.total != subject_total {
        errors.push(LINE_TOTAL_MISMATCH);
    }

    // The allocation total starts from the subject's existing matches; edits
    // below adjust it record by record. Unreferenced records keep their
    // stored contribution.
    let mut match_total: BigDecimal = snapshot
        .subject_matches
        .iter()
        .map(|m| m.paid_contribution(&subject.id))
        .sum();

    // Running due per touched header, so several instructions against the
    // same counterpart cannot jointly push it through zero.
    let mut running_due: HashMap<String, BigDecimal> = HashMap::new();
    let mut paid_deltas: HashMap<String, BigDecimal> = HashMap::new();
    let mut touched: Vec<String> = Vec::new();
    let mut post_values: HashMap<String, BigDecimal> = HashMap::new();
    let mut deltas: Vec<MatchDelta> = Vec::new();

    for instruction in &batch.matches {
        // Structural checks short-circuit the rest for this instruction.
        if instruction.counterpart_id == subject.id {
            errors.push(SELF_MATCH);
            continue;
        }
        let counterpart = snapshot
            .counterpart(&instruction.counterpart_id)
            .ok_or_else(|| LedgerError::HeaderNotFound(instruction.counterpart_id.clone()))?;
        if counterpart.is_void() {
            errors.push(VOID_MATCH);
            continue;
        }

        let existing = match &instruction.match_id {
            Some(match_id) => {
                let record = snapshot
                    .record(match_id)
                    .ok_or_else(|| LedgerError::MatchNotFound(match_id.clone()))?;
                if record.other_side(&subject.id) != instruction.counterpart_id {
                    return Err(LedgerError::DataIntegrity(format!(
                        "match record {} does not link {} and {}",
                        match_id, subject.id, instruction.counterpart_id
                    )));
                }
                Some(record)
            }
            None => None,
        };

        let value = round_2dp(&instruction.value);
        let previous = existing.map(|m| m.value.clone()).unwrap_or_else(|| zero.clone());
        let inbound = existing.map(|m| m.matched_to == subject.id).unwrap_or(false);

        // An allocation can only reach backwards in time. Inbound edits are
        // exempt: the record was legally created by a later-period initiator.
        if !inbound && counterpart.period > subject.period {
            errors.push(LATER_PERIOD_MATCH);
            continue;
        }

        // Adjust the subject's allocation total for the edit before the
        // window checks, so an out-of-window value still shows up in the
        // aggregate check alongside its own error. Outbound matches
        // contribute -value, inbound matches +value.
        let old_contribution = existing
            .map(|m| m.paid_contribution(&subject.id))
            .unwrap_or_else(|| zero.clone());
        let new_contribution = if inbound { value.clone() } else { -value.clone() };
        match_total += &new_contribution - &old_contribution;

        if inbound {
            // The subject is the counterpart of a match created by another
            // header's batch; the edit must keep that header's due inside
            // its own sign-respecting window.
            let other = counterpart;
            let current_due = running_due
                .entry(other.id.clone())
                .or_insert_with(|| other.due.clone());
            let new_due = round_2dp(&(&*current_due + (&value - &previous)));
            let (low, high) = sorted_window(zero.clone(), other.total.clone());
            if new_due < low || new_due > high {
                errors.push(format!(
                    "Not allowed because it would mean a due of {} for this transaction \
                     when the total is {}",
                    format_amount(&new_due),
                    format_amount(&other.total)
                ));
                continue;
            }
            *current_due = new_due;
            *paid_deltas.entry(other.id.clone()).or_insert_with(|| zero.clone()) -=
                &value - &previous;
        } else {
            // Step 4: the counterpart's available window. The proposed value
            // may reclaim this match's previous allocation but can never push
            // the counterpart's due through zero or past its pre-match due.
            let current_due = running_due
                .entry(counterpart.id.clone())
                .or_insert_with(|| counterpart.due.clone());
            let due_excluding = round_2dp(&(&*current_due + &previous));
            let (low, high) = sorted_window(due_excluding.clone(), zero.clone());
            if value < low || value > high {
                let negative_class = counterpart.transaction_type.is_negative_class();
                let (ui_low, ui_high) = sorted_window(
                    apply_sign_convention(low, negative_class),
                    apply_sign_convention(high, negative_class),
                );
                errors.push(format!(
                    "Value must be between {} and {}",
                    format_amount(&ui_low),
                    format_amount(&ui_high)
                ));
                continue;
            }
            *current_due = round_2dp(&(&due_excluding - &value));
            *paid_deltas
                .entry(counterpart.id.clone())
                .or_insert_with(|| zero.clone()) += &value - &previous;
        }

        if !touched.contains(&counterpart.id) {
            touched.push(counterpart.id.clone());
        }

        match existing {
            Some(record) => {
                post_values.insert(record.id.clone(), value.clone());
                if value == zero {
                    deltas.push(MatchDelta::Delete(record.clone()));
                } else if value != record.value {
                    let mut updated = record.clone();
                    updated.value = value;
                    // Period propagation is batch-initiator-local: only
                    // records this subject created pick up its period.
                    if !inbound {
                        updated.period = subject.period.clone();
                    }
                    deltas.push(MatchDelta::Update(updated));
                }
            }
            None => {
                if value != zero {
                    deltas.push(MatchDelta::Create(MatchRecord::new(
                        subject.id.clone(),
                        counterpart.id.clone(),
                        value,
                        subject.period.clone(),
                    )));
                }
            }
        }
    }

    match_total = round_2dp(&match_total);

    // Step 5: the aggregate allocation check for the subject.
    if subject_total == zero {
        let surviving = snapshot
            .subject_matches
            .iter()
            .filter(|m| {
                post_values
                    .get(&m.id)
                    .map(|v| *v != zero)
                    .unwrap_or(m.value != zero)
            })
            .count()
            + deltas
                .iter()
                .filter(|d| matches!(d, MatchDelta::Create(_)))
                .count();
        if surviving == 0 && errors.is_empty() {
            errors.push(ZERO_VALUE_NO_MATCHES);
        } else if match_total != zero {
            errors.push(format!(
                "You are trying to match a total value of {}.  Because you are entering a \
                 zero value transaction the total amount to match must be zero also.",
                format_amount(&match_total)
            ));
        }
    } else {
        let (low, high) = sorted_window(zero.clone(), subject_total.clone());
        if match_total < low || match_total > high {
            errors.push(format!(
                "Please ensure the total of the transactions you are matching is \
                 between 0 and {}",
                format_amount(&subject_total)
            ));
        }
    }

    if !errors.is_empty() {
        return Err(LedgerError::Validation(errors));
    }

    // Step 6: propagate balances. The subject's paid accumulates exactly the
    // matched amount; due follows from the invariant.
    let mut header = subject.clone();
    header.total = subject_total;
    header.paid = match_total;
    header.due = round_2dp(&(&header.total - &header.paid));

    let counterparts = touched
        .into_iter()
        .filter_map(|id| {
            let delta = paid_deltas.get(&id)?;
            if *delta == zero {
                return None;
            }
            let mut updated = snapshot.counterparts.get(&id)?.clone();
            updated.paid = round_2dp(&(&updated.paid + delta));
            updated.due = round_2dp(&(&updated.total - &updated.paid));
            Some(updated)
        })
        .collect();

    tracing::debug!(
        subject = %header.id,
        matches = deltas.len(),
        paid = %header.paid,
        due = %header.due,
        "validated matching batch"
    );

    Ok(AppliedBatch {
        header,
        lines: normalized.lines,
        counterparts,
        match_deltas: deltas,
    })
}
