//! Ledger orchestrator tying the matching engine to a storage backend

use crate::ledger::batch::Batch;
use crate::ledger::engine::{validate_batch, AppliedBatch, BatchSnapshot, MatchDelta};
use crate::traits::{DefaultHeaderValidator, HeaderValidator, LedgerStore};
use crate::types::{LedgerError, LedgerResult, LineItem, MatchRecord, Period, TransactionHeader};
use crate::utils::money::round_2dp;

/// Purchase and sales ledger over a storage backend
///
/// All writes go through [`validate_and_apply_batch`](Ledger::validate_and_apply_batch)
/// or [`void_transaction`](Ledger::void_transaction); both are all-or-nothing
/// with respect to validation. Reads are thin pass-throughs to the store.
pub struct Ledger<S: LedgerStore> {
    store: S,
    header_validator: Box<dyn HeaderValidator>,
}

impl<S: LedgerStore> Ledger<S> {
    /// Create a new ledger with the given storage backend
    pub fn new(store: S) -> Self {
        Self {
            store,
            header_validator: Box::new(DefaultHeaderValidator),
        }
    }

    /// Create a new ledger with a custom header validator
    pub fn with_validator(store: S, header_validator: Box<dyn HeaderValidator>) -> Self {
        Self {
            store,
            header_validator,
        }
    }

    /// Validate a batch and commit its full effect
    ///
    /// On success the subject header is stored confirmed with its normalized
    /// lines, every touched counterpart's balances are updated and the match
    /// record set reflects the submitted instructions. On any validation
    /// failure nothing is written.
    ///
    /// The batch is validated twice: once against an initial snapshot and
    /// again against a fresh one immediately before the commit, since stored
    /// state can move between reads on a shared store.
    pub async fn validate_and_apply_batch(&mut self, batch: Batch) -> LedgerResult<AppliedBatch> {
        self.header_validator.validate_header(&batch.header)?;

        let existing = self.store.get_header(&batch.header.id).await?;
        if let Some(stored) = &existing {
            if stored.is_void() {
                return Err(LedgerError::Status(format!(
                    "cannot edit void transaction {}",
                    stored.id
                )));
            }
            self.integrity_checked(stored)?;
        }

        let snapshot = self.load_snapshot(&batch).await?;
        validate_batch(&batch, &snapshot)?;

        let snapshot = self.load_snapshot(&batch).await?;
        let mut applied = validate_batch(&batch, &snapshot).map_err(|e| {
            if let LedgerError::DataIntegrity(msg) = &e {
                tracing::error!(error = %msg, "batch rejected between validation and commit");
            }
            e
        })?;

        applied.header.confirm()?;
        if existing.is_some() {
            self.store.update_header(&applied.header).await?;
        } else {
            self.store.save_header(&applied.header).await?;
        }
        self.store
            .save_lines(&applied.header.id, &applied.lines)
            .await?;
        self.store.update_headers(&applied.counterparts).await?;
        for delta in &applied.match_deltas {
            match delta {
                MatchDelta::Create(record) => self.store.save_match(record).await?,
                MatchDelta::Update(record) => self.store.update_match(record).await?,
                MatchDelta::Delete(record) => self.store.delete_match(&record.id).await?,
            }
        }

        tracing::debug!(
            subject = %applied.header.id,
            counterparts = applied.counterparts.len(),
            deltas = applied.match_deltas.len(),
            "committed batch"
        );

        Ok(applied)
    }

    /// Void a transaction, unwinding every match it participates in
    ///
    /// Each counterpart gets back the allocation this transaction consumed;
    /// the voided header ends with paid zero and due equal to its total.
    pub async fn void_transaction(&mut self, header_id: &str) -> LedgerResult<TransactionHeader> {
        let mut header = self
            .store
            .get_header(header_id)
            .await?
            .ok_or_else(|| LedgerError::HeaderNotFound(header_id.to_string()))?;
        if header.is_void() {
            return Err(LedgerError::Status(format!(
                "transaction {} is already void",
                header_id
            )));
        }
        header.void()?;

        let matches = self.store.matches_for_header(header_id).await?;
        for record in &matches {
            let other_id = record.other_side(header_id);
            let mut other = self
                .store
                .get_header(other_id)
                .await?
                .ok_or_else(|| LedgerError::HeaderNotFound(other_id.to_string()))?;
            other.paid = round_2dp(&(&other.paid - record.paid_contribution(other_id)));
            other.due = round_2dp(&(&other.total - &other.paid));
            self.store.update_header(&other).await?;
            self.store.delete_match(&record.id).await?;
        }

        header.paid = bigdecimal::BigDecimal::from(0);
        header.due = header.total.clone();
        self.store.update_header(&header).await?;

        tracing::info!(
            header = %header_id,
            unwound = matches.len(),
            "voided transaction"
        );

        Ok(header)
    }

    /// Headers that were not fully matched as of the end of a period
    ///
    /// Only headers raised in or before the period are considered, and
    /// matches recorded in later periods are rolled back before the due
    /// balances are inspected, so the result reflects the position the ledger
    /// was in at the period cutoff. Void headers are excluded.
    pub async fn not_fully_matched_at_period(
        &self,
        period: &Period,
    ) -> LedgerResult<Vec<TransactionHeader>> {
        let zero = bigdecimal::BigDecimal::from(0);
        let mut headers: Vec<TransactionHeader> = self
            .store
            .list_headers()
            .await?
            .into_iter()
            .filter(|h| h.period <= *period)
            .collect();
        let later = self.store.matches_after_period(period).await?;

        for record in &later {
            for header in headers.iter_mut() {
                if header.id == record.matched_by {
                    header.due = round_2dp(&(&header.due - &record.value));
                } else if header.id == record.matched_to {
                    header.due = round_2dp(&(&header.due + &record.value));
                }
            }
        }

        Ok(headers
            .into_iter()
            .filter(|h| !h.is_void() && h.due != zero)
            .collect())
    }

    /// Get a header by ID
    pub async fn get_header(&self, header_id: &str) -> LedgerResult<Option<TransactionHeader>> {
        self.store.get_header(header_id).await
    }

    /// List all headers
    pub async fn list_headers(&self) -> LedgerResult<Vec<TransactionHeader>> {
        self.store.list_headers().await
    }

    /// Get a header's line items
    pub async fn get_lines(&self, header_id: &str) -> LedgerResult<Vec<LineItem>> {
        self.store.get_lines(header_id).await
    }

    /// All match records the header participates in, on either side
    pub async fn matches_for_header(&self, header_id: &str) -> LedgerResult<Vec<MatchRecord>> {
        self.store.matches_for_header(header_id).await
    }

    async fn load_snapshot(&self, batch: &Batch) -> LedgerResult<BatchSnapshot> {
        let mut snapshot = BatchSnapshot::new();
        for instruction in &batch.matches {
            if instruction.counterpart_id == batch.header.id {
                // Engine reports self-matches as a validation message.
                continue;
            }
            if snapshot.counterpart(&instruction.counterpart_id).is_some() {
                continue;
            }
            let counterpart = self
                .store
                .get_header(&instruction.counterpart_id)
                .await?
                .ok_or_else(|| {
                    LedgerError::HeaderNotFound(instruction.counterpart_id.clone())
                })?;
            snapshot.add_counterpart(counterpart);
        }
        for record in self.store.matches_for_header(&batch.header.id).await? {
            snapshot.add_match(record);
        }
        Ok(snapshot)
    }

    fn integrity_checked(&self, header: &TransactionHeader) -> LedgerResult<()> {
        header.check_integrity().map_err(|e| {
            if let LedgerError::DataIntegrity(msg) = &e {
                tracing::error!(error = %msg, "stored header failed integrity check");
            }
            e
        })
    }
}
