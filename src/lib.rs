//! # Matching Core
//!
//! A purchase and sales ledger library providing transaction entry,
//! many-to-many matching between documents and running balance tracking.
//!
//! ## Features
//!
//! - **Transaction entry**: Invoices, credit notes, payments, refunds and
//!   their brought-forward equivalents, with itemized lines
//! - **Matching**: Allocate payments against invoices (and any other valid
//!   pairing) with full validation of every allocation window
//! - **Balance tracking**: `due = total - paid` maintained on every header
//!   through creates, edits and voids
//! - **Void workflow**: Unwind a transaction and every match it touches
//! - **Period reporting**: Reconstruct which documents were unmatched at a
//!   period cutoff
//! - **Storage abstraction**: Database-agnostic design with trait-based
//!   storage
//!
//! ## Quick Start
//!
//! ```rust
//! use matching_core::{BatchBuilder, Ledger, MemoryStore, Period, TransactionType};
//! use bigdecimal::BigDecimal;
//! use chrono::NaiveDate;
//! use matching_core::TransactionHeader;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), matching_core::LedgerError> {
//! let mut ledger = Ledger::new(MemoryStore::new());
//!
//! let payment = TransactionHeader::new(
//!     "pay-1".to_string(),
//!     "CHQ-100".to_string(),
//!     TransactionType::Payment,
//!     BigDecimal::from(1200),
//!     NaiveDate::from_ymd_opt(2026, 8, 1).unwrap(),
//!     None,
//!     Period::new("202608"),
//! );
//! ledger
//!     .validate_and_apply_batch(BatchBuilder::from_header(payment).build())
//!     .await?;
//!
//! let invoice = TransactionHeader::new(
//!     "inv-1".to_string(),
//!     "INV-100".to_string(),
//!     TransactionType::Invoice,
//!     BigDecimal::from(1200),
//!     NaiveDate::from_ymd_opt(2026, 8, 1).unwrap(),
//!     None,
//!     Period::new("202608"),
//! );
//! let applied = ledger
//!     .validate_and_apply_batch(
//!         BatchBuilder::from_header(invoice)
//!             .line("widgets", BigDecimal::from(1000), BigDecimal::from(200))
//!             .match_value("pay-1", BigDecimal::from(-1200))
//!             .build(),
//!     )
//!     .await?;
//! assert_eq!(applied.header.due, BigDecimal::from(0));
//! # Ok(())
//! # }
//! ```

pub mod ledger;
pub mod traits;
pub mod types;
pub mod utils;

// Re-export commonly used types
pub use ledger::*;
pub use traits::*;
pub use types::*;
pub use utils::memory_store::MemoryStore;
pub use utils::money::{format_amount, round_2dp};
