//! Traits for storage abstraction and extensibility

use async_trait::async_trait;

use crate::types::{
    LedgerError, LedgerResult, LineItem, MatchRecord, Period, TransactionHeader,
};

/// Storage abstraction for the matching core
///
/// This trait allows the ledger to work with any storage backend (PostgreSQL,
/// MySQL, SQLite, in-memory, etc.) by implementing these methods. Reads must
/// return consistent data between two calls within one batch; the orchestrator
/// re-validates against a fresh snapshot immediately before committing to
/// close the remaining window.
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Save a new transaction header
    async fn save_header(&mut self, header: &TransactionHeader) -> LedgerResult<()>;

    /// Get a header by ID
    async fn get_header(&self, header_id: &str) -> LedgerResult<Option<TransactionHeader>>;

    /// List all headers
    async fn list_headers(&self) -> LedgerResult<Vec<TransactionHeader>>;

    /// Update an existing header
    async fn update_header(&mut self, header: &TransactionHeader) -> LedgerResult<()>;

    /// Update several headers in one call
    ///
    /// The default falls back to per-header updates; backends with a cheaper
    /// bulk path should override it.
    async fn update_headers(&mut self, headers: &[TransactionHeader]) -> LedgerResult<()> {
        for header in headers {
            self.update_header(header).await?;
        }
        Ok(())
    }

    /// Replace a header's line items
    async fn save_lines(&mut self, header_id: &str, lines: &[LineItem]) -> LedgerResult<()>;

    /// Get a header's line items, ordered by line number
    async fn get_lines(&self, header_id: &str) -> LedgerResult<Vec<LineItem>>;

    /// Save a new match record
    async fn save_match(&mut self, record: &MatchRecord) -> LedgerResult<()>;

    /// Get a match record by ID
    async fn get_match(&self, match_id: &str) -> LedgerResult<Option<MatchRecord>>;

    /// Update an existing match record
    async fn update_match(&mut self, record: &MatchRecord) -> LedgerResult<()>;

    /// Delete a match record
    async fn delete_match(&mut self, match_id: &str) -> LedgerResult<()>;

    /// All match records where the header sits on either side
    async fn matches_for_header(&self, header_id: &str) -> LedgerResult<Vec<MatchRecord>>;

    /// All match records whose period sorts strictly after the given period
    async fn matches_after_period(&self, period: &Period) -> LedgerResult<Vec<MatchRecord>>;
}

/// Trait for implementing custom header validation rules
///
/// Runs before the matching engine; failures reject the batch with the same
/// error shape the engine uses.
pub trait HeaderValidator: Send + Sync {
    /// Validate a submitted header before the batch is evaluated
    fn validate_header(&self, header: &TransactionHeader) -> LedgerResult<()>;
}

/// Default header validator with basic field rules
pub struct DefaultHeaderValidator;

impl HeaderValidator for DefaultHeaderValidator {
    fn validate_header(&self, header: &TransactionHeader) -> LedgerResult<()> {
        let mut errors = crate::types::ValidationErrors::new();
        crate::utils::validation::validate_header_fields(header, &mut errors);
        if errors.is_empty() {
            Ok(())
        } else {
            Err(LedgerError::Validation(errors))
        }
    }
}
