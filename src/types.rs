//! Core types and data structures for the matching ledger

use bigdecimal::BigDecimal;
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::utils::money::{apply_sign_convention, round_2dp};

/// Transaction types a purchase or sales ledger accepts
///
/// Brought-forward variants represent opening balances carried from a prior
/// system; they are exempt from nominal analysis but still take part in
/// matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransactionType {
    /// Invoice - a debit on the account
    Invoice,
    /// Opening balance invoice
    BroughtForwardInvoice,
    /// Credit note - reverses invoiced value
    CreditNote,
    /// Opening balance credit note
    BroughtForwardCreditNote,
    /// Payment - settles outstanding debit balances
    Payment,
    /// Opening balance payment
    BroughtForwardPayment,
    /// Refund - returns overpaid value
    Refund,
    /// Opening balance refund
    BroughtForwardRefund,
}

/// Which side of matching a transaction type occupies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SignClass {
    /// Stored with the natural sign (invoices, refunds)
    Positive,
    /// Stored with the negated natural sign (credit notes, payments)
    Negative,
}

/// Per-type behaviour, resolved through a lookup rather than a type hierarchy
///
/// Only `sign_class` is enforced here. The remaining flags are advisory for
/// downstream consumers (entry forms, nominal and cash book posting): the
/// matching engine accepts any type with or without lines, since brought
/// forward balances and adjustments legitimately arrive bare.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TypeProfile {
    pub sign_class: SignClass,
    /// Whether an entry form should collect line items for this type
    pub requires_lines: bool,
    /// Whether the transaction requires nominal analysis downstream
    pub requires_nominal: bool,
    /// Whether the transaction updates the cash book downstream
    pub payment_type: bool,
}

impl TransactionType {
    /// Behaviour profile for this transaction type
    pub fn profile(&self) -> TypeProfile {
        use TransactionType::*;
        match self {
            Invoice | CreditNote => TypeProfile {
                sign_class: self.sign_class(),
                requires_lines: true,
                requires_nominal: true,
                payment_type: false,
            },
            BroughtForwardInvoice | BroughtForwardCreditNote => TypeProfile {
                sign_class: self.sign_class(),
                requires_lines: true,
                requires_nominal: false,
                payment_type: false,
            },
            Payment | Refund => TypeProfile {
                sign_class: self.sign_class(),
                requires_lines: false,
                requires_nominal: true,
                payment_type: true,
            },
            BroughtForwardPayment | BroughtForwardRefund => TypeProfile {
                sign_class: self.sign_class(),
                requires_lines: false,
                requires_nominal: false,
                payment_type: true,
            },
        }
    }

    /// The sign convention this type stores values under
    pub fn sign_class(&self) -> SignClass {
        use TransactionType::*;
        match self {
            Invoice | BroughtForwardInvoice | Refund | BroughtForwardRefund => SignClass::Positive,
            CreditNote | BroughtForwardCreditNote | Payment | BroughtForwardPayment => {
                SignClass::Negative
            }
        }
    }

    /// True for credit-natured types whose stored value is the negated natural value
    pub fn is_negative_class(&self) -> bool {
        self.sign_class() == SignClass::Negative
    }

    /// Whether this type is an opening balance carried from a prior system
    pub fn is_brought_forward(&self) -> bool {
        use TransactionType::*;
        matches!(
            self,
            BroughtForwardInvoice
                | BroughtForwardCreditNote
                | BroughtForwardPayment
                | BroughtForwardRefund
        )
    }
}

/// Lifecycle status of a transaction header
///
/// Draft -> Confirmed is irreversible; Confirmed -> Void is terminal. A void
/// header is frozen: it cannot be edited and cannot be matched against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransactionStatus {
    Draft,
    Confirmed,
    Void,
}

impl TransactionStatus {
    /// Whether the lifecycle permits moving from this status to `next`
    pub fn can_transition_to(&self, next: TransactionStatus) -> bool {
        matches!(
            (self, next),
            (TransactionStatus::Draft, TransactionStatus::Confirmed)
                | (TransactionStatus::Confirmed, TransactionStatus::Void)
        )
    }
}

/// Opaque, totally-ordered accounting period token (e.g. "202608")
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Period(String);

impl Period {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Period {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Reported position of a header against its matches
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SettlementStatus {
    /// Paid equals total
    FullyMatched,
    /// Unallocated balance remains and the due date has not passed
    Outstanding,
    /// Unallocated balance remains past the due date
    Overdue,
    /// Unallocated balance remains and no due date was set
    NotFullyMatched,
    /// The header has been voided
    Void,
}

/// A financial document on the ledger: invoice, credit note, payment, refund
/// or a brought-forward equivalent
///
/// `total`, `paid` and `due` are held in ledger sign: positive-class types
/// store their natural value, negative-class types store the negated natural
/// value. `due = total - paid` is maintained as an invariant and is never set
/// independently.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionHeader {
    /// Unique identifier for the header
    pub id: String,
    /// User-facing document reference
    pub reference: String,
    /// Type of transaction, fixed at creation
    pub transaction_type: TransactionType,
    /// Signed document total, 2dp, ledger sign
    pub total: BigDecimal,
    /// Cumulative amount of `total` satisfied via matches
    pub paid: BigDecimal,
    /// Outstanding amount, always `total - paid`
    pub due: BigDecimal,
    /// Date of the transaction
    pub date: NaiveDate,
    /// Optional settlement deadline; payments do not need one
    pub due_date: Option<NaiveDate>,
    /// Accounting period the transaction belongs to
    pub period: Period,
    /// Lifecycle status
    pub status: TransactionStatus,
    /// When the header was created
    pub created_at: NaiveDateTime,
}

impl TransactionHeader {
    /// Create a new draft header from a natural (user-entered) total
    ///
    /// The sign convention for the transaction type is applied here, so a
    /// payment entered as 100.00 is stored with a total of -100.00.
    pub fn new(
        id: String,
        reference: String,
        transaction_type: TransactionType,
        natural_total: BigDecimal,
        date: NaiveDate,
        due_date: Option<NaiveDate>,
        period: Period,
    ) -> Self {
        let total = round_2dp(&apply_sign_convention(
            natural_total,
            transaction_type.is_negative_class(),
        ));
        Self {
            id,
            reference,
            transaction_type,
            due: total.clone(),
            total,
            paid: BigDecimal::from(0),
            date,
            due_date,
            period,
            status: TransactionStatus::Draft,
            created_at: chrono::Utc::now().naive_utc(),
        }
    }

    /// Total in the natural sign the user entered it with
    pub fn ui_total(&self) -> BigDecimal {
        apply_sign_convention(self.total.clone(), self.transaction_type.is_negative_class())
    }

    /// Paid amount in natural sign
    pub fn ui_paid(&self) -> BigDecimal {
        apply_sign_convention(self.paid.clone(), self.transaction_type.is_negative_class())
    }

    /// Due amount in natural sign
    pub fn ui_due(&self) -> BigDecimal {
        apply_sign_convention(self.due.clone(), self.transaction_type.is_negative_class())
    }

    pub fn is_void(&self) -> bool {
        self.status == TransactionStatus::Void
    }

    /// Move a draft header to confirmed
    pub fn confirm(&mut self) -> LedgerResult<()> {
        if self.status == TransactionStatus::Confirmed {
            return Ok(());
        }
        if !self.status.can_transition_to(TransactionStatus::Confirmed) {
            return Err(LedgerError::Status(format!(
                "cannot confirm transaction {} from status {:?}",
                self.id, self.status
            )));
        }
        self.status = TransactionStatus::Confirmed;
        Ok(())
    }

    /// Move a confirmed header to void
    pub fn void(&mut self) -> LedgerResult<()> {
        if !self.status.can_transition_to(TransactionStatus::Void) {
            return Err(LedgerError::Status(format!(
                "cannot void transaction {} from status {:?}",
                self.id, self.status
            )));
        }
        self.status = TransactionStatus::Void;
        Ok(())
    }

    /// Verify the balance invariant `due == round2(total - paid)`
    ///
    /// A breach means the stored data is corrupt; callers should treat it as
    /// a precondition failure, not a user error.
    pub fn check_integrity(&self) -> LedgerResult<()> {
        let expected = round_2dp(&(&self.total - &self.paid));
        if self.due != expected {
            return Err(LedgerError::DataIntegrity(format!(
                "transaction {}: due {} does not equal total {} minus paid {}",
                self.id, self.due, self.total, self.paid
            )));
        }
        Ok(())
    }

    /// Settlement position as of `today`
    pub fn settlement_status(&self, today: NaiveDate) -> SettlementStatus {
        if self.is_void() {
            return SettlementStatus::Void;
        }
        if self.total == self.paid {
            return SettlementStatus::FullyMatched;
        }
        match self.due_date {
            Some(due_date) if due_date >= today => SettlementStatus::Outstanding,
            Some(_) => SettlementStatus::Overdue,
            None => SettlementStatus::NotFullyMatched,
        }
    }
}

/// An edge in the many-to-many matching graph between two headers
///
/// `matched_by` is always the header whose create/edit batch recorded the
/// match; `matched_to` is the counterpart. `value` is stored in the
/// counterpart's ledger-sign perspective: it is the amount that was deducted
/// from the `matched_to` header's due and added to its paid when the match
/// was applied. The initiator's balances move by the same amount in the
/// opposite direction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchRecord {
    /// Unique identifier for the match
    pub id: String,
    /// Header whose batch created this match
    pub matched_by: String,
    /// Counterpart header
    pub matched_to: String,
    /// Signed allocation, 2dp, in the `matched_to` perspective
    pub value: BigDecimal,
    /// The initiator's period at the time of the batch
    pub period: Period,
    /// When the match was created
    pub created_at: NaiveDateTime,
}

impl MatchRecord {
    /// Create a new match record with a generated identifier
    pub fn new(matched_by: String, matched_to: String, value: BigDecimal, period: Period) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            matched_by,
            matched_to,
            value: round_2dp(&value),
            period,
            created_at: chrono::Utc::now().naive_utc(),
        }
    }

    /// Whether the given header sits on either side of this match
    pub fn involves(&self, header_id: &str) -> bool {
        self.matched_by == header_id || self.matched_to == header_id
    }

    /// Identifier of the header on the other side of the match
    pub fn other_side(&self, header_id: &str) -> &str {
        if self.matched_by == header_id {
            &self.matched_to
        } else {
            &self.matched_by
        }
    }

    /// Contribution of this match to the given header's `paid` balance
    ///
    /// The matched_to side gains `value`; the matched_by side loses it.
    pub fn paid_contribution(&self, header_id: &str) -> BigDecimal {
        if self.matched_to == header_id {
            self.value.clone()
        } else {
            -self.value.clone()
        }
    }

    /// The match value as a user viewing `header` would see it
    pub fn ui_value(&self, header: &TransactionHeader) -> BigDecimal {
        apply_sign_convention(
            self.value.clone(),
            header.transaction_type.is_negative_class(),
        )
    }
}

/// A submitted line, prior to normalization
///
/// Lines where every field is empty are dropped silently rather than
/// validated.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LineInput {
    pub description: String,
    pub goods: Option<BigDecimal>,
    pub vat: Option<BigDecimal>,
    /// Opaque reference to a nominal account, resolved downstream
    pub nominal_ref: Option<String>,
    /// Opaque reference to a VAT code, resolved downstream
    pub vat_code_ref: Option<String>,
}

impl LineInput {
    /// True when the user left every field empty
    pub fn is_blank(&self) -> bool {
        self.description.trim().is_empty()
            && self.goods.is_none()
            && self.vat.is_none()
            && self.nominal_ref.is_none()
            && self.vat_code_ref.is_none()
    }
}

/// Itemized breakdown of a header's goods and VAT
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    /// 1-based position, renumbered order-preserving on every save
    pub line_no: u32,
    pub description: String,
    pub goods: BigDecimal,
    pub vat: BigDecimal,
    pub nominal_ref: Option<String>,
    pub vat_code_ref: Option<String>,
}

impl LineItem {
    /// Line value contributed to the header total
    pub fn total(&self) -> BigDecimal {
        &self.goods + &self.vat
    }
}

/// Ordered set of user-facing validation messages for a rejected batch
///
/// The message strings are part of the public contract; callers may present
/// them verbatim.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidationErrors {
    messages: Vec<String>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, message: impl Into<String>) {
        self.messages.push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn messages(&self) -> &[String] {
        &self.messages
    }

    pub fn contains(&self, message: &str) -> bool {
        self.messages.iter().any(|m| m == message)
    }
}

impl std::fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.messages.join(" "))
    }
}

/// Errors that can occur in the matching ledger
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error("Storage error: {0}")]
    Storage(String),
    #[error("Transaction not found: {0}")]
    HeaderNotFound(String),
    #[error("Match record not found: {0}")]
    MatchNotFound(String),
    #[error("Validation failed: {0}")]
    Validation(ValidationErrors),
    #[error("Data integrity error: {0}")]
    DataIntegrity(String),
    #[error("Invalid status transition: {0}")]
    Status(String),
}

impl LedgerError {
    /// The validation messages, if this is a validation failure
    pub fn validation_errors(&self) -> Option<&ValidationErrors> {
        match self {
            LedgerError::Validation(errors) => Some(errors),
            _ => None,
        }
    }
}

/// Result type for ledger operations
pub type LedgerResult<T> = Result<T, LedgerError>;
