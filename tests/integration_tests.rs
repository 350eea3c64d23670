//! Integration tests for matching-core

use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use std::str::FromStr;

use matching_core::{
    BatchBuilder, Ledger, LedgerError, MemoryStore, Period, SettlementStatus, TransactionHeader,
    TransactionStatus, TransactionType, ValidationErrors,
};

fn dec(s: &str) -> BigDecimal {
    BigDecimal::from_str(s).unwrap()
}

fn header_in_period(
    id: &str,
    transaction_type: TransactionType,
    natural_total: &str,
    period: &str,
) -> TransactionHeader {
    TransactionHeader::new(
        id.to_string(),
        format!("REF-{id}"),
        transaction_type,
        dec(natural_total),
        NaiveDate::from_ymd_opt(2026, 8, 1).unwrap(),
        None,
        Period::new(period),
    )
}

fn header(id: &str, transaction_type: TransactionType, natural_total: &str) -> TransactionHeader {
    header_in_period(id, transaction_type, natural_total, "202608")
}

fn validation_errors(err: LedgerError) -> ValidationErrors {
    match err {
        LedgerError::Validation(errors) => errors,
        other => panic!("expected validation failure, got {other:?}"),
    }
}

#[tokio::test]
async fn test_complete_matching_workflow() {
    let mut ledger = Ledger::new(MemoryStore::new());

    // Enter a payment on its own, then an invoice matched against it.
    ledger
        .validate_and_apply_batch(
            BatchBuilder::from_header(header("pay", TransactionType::Payment, "2400")).build(),
        )
        .await
        .unwrap();

    let applied = ledger
        .validate_and_apply_batch(
            BatchBuilder::from_header(header("inv", TransactionType::Invoice, "2400"))
                .line("widgets", dec("2000"), dec("400"))
                .match_value("pay", dec("-2400"))
                .build(),
        )
        .await
        .unwrap();

    assert_eq!(applied.header.status, TransactionStatus::Confirmed);
    assert_eq!(applied.header.paid, dec("2400.00"));
    assert_eq!(applied.header.due, dec("0.00"));

    let invoice = ledger.get_header("inv").await.unwrap().unwrap();
    let payment = ledger.get_header("pay").await.unwrap().unwrap();
    assert_eq!(invoice.due, dec("0.00"));
    assert_eq!(payment.paid, dec("-2400.00"));
    assert_eq!(payment.due, dec("0.00"));
    assert_eq!(payment.ui_paid(), dec("2400.00"));

    let today = NaiveDate::from_ymd_opt(2026, 8, 15).unwrap();
    assert_eq!(invoice.settlement_status(today), SettlementStatus::FullyMatched);

    let lines = ledger.get_lines("inv").await.unwrap();
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0].line_no, 1);
    assert_eq!(lines[0].total(), dec("2400.00"));

    let matches = ledger.matches_for_header("inv").await.unwrap();
    assert_eq!(matches.len(), 1);
    assert_eq!(matches[0].matched_by, "inv");
    assert_eq!(matches[0].matched_to, "pay");
    assert_eq!(matches[0].value, dec("-2400.00"));
}

#[tokio::test]
async fn test_partial_match_then_edit() {
    let mut ledger = Ledger::new(MemoryStore::new());

    ledger
        .validate_and_apply_batch(
            BatchBuilder::from_header(header("inv", TransactionType::Invoice, "2400")).build(),
        )
        .await
        .unwrap();

    // Payment of 1200 allocates half of itself against the invoice.
    ledger
        .validate_and_apply_batch(
            BatchBuilder::from_header(header("pay", TransactionType::Payment, "1200"))
                .match_value("inv", dec("600"))
                .build(),
        )
        .await
        .unwrap();

    let invoice = ledger.get_header("inv").await.unwrap().unwrap();
    let payment = ledger.get_header("pay").await.unwrap().unwrap();
    assert_eq!(invoice.paid, dec("600.00"));
    assert_eq!(invoice.due, dec("1800.00"));
    assert_eq!(payment.paid, dec("-600.00"));
    assert_eq!(payment.due, dec("-600.00"));

    // Resubmit the payment raising the allocation to its full value.
    let match_id = ledger.matches_for_header("pay").await.unwrap()[0].id.clone();
    ledger
        .validate_and_apply_batch(
            BatchBuilder::from_header(header("pay", TransactionType::Payment, "1200"))
                .edit_match(&match_id, "inv", dec("1200"))
                .build(),
        )
        .await
        .unwrap();

    let invoice = ledger.get_header("inv").await.unwrap().unwrap();
    let payment = ledger.get_header("pay").await.unwrap().unwrap();
    assert_eq!(invoice.due, dec("1200.00"));
    assert_eq!(payment.due, dec("0.00"));
    assert_eq!(ledger.matches_for_header("pay").await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_rejected_batch_writes_nothing() {
    let mut ledger = Ledger::new(MemoryStore::new());

    ledger
        .validate_and_apply_batch(
            BatchBuilder::from_header(header("pay", TransactionType::Payment, "1200")).build(),
        )
        .await
        .unwrap();

    // Allocating 2500 against a 1200 payment fails both the window and the
    // aggregate check.
    let err = ledger
        .validate_and_apply_batch(
            BatchBuilder::from_header(header("inv", TransactionType::Invoice, "2400"))
                .match_value("pay", dec("-2500"))
                .build(),
        )
        .await
        .unwrap_err();
    let errors = validation_errors(err);
    assert!(errors.contains("Value must be between 0 and 1200.00"));

    assert!(ledger.get_header("inv").await.unwrap().is_none());
    let payment = ledger.get_header("pay").await.unwrap().unwrap();
    assert_eq!(payment.paid, dec("0.00"));
    assert_eq!(payment.due, dec("-1200.00"));
    assert!(ledger.matches_for_header("pay").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_all_errors_collected_in_submission_order() {
    let mut ledger = Ledger::new(MemoryStore::new());

    ledger
        .validate_and_apply_batch(
            BatchBuilder::from_header(header("pay", TransactionType::Payment, "100")).build(),
        )
        .await
        .unwrap();
    ledger.void_transaction("pay").await.unwrap();

    let err = ledger
        .validate_and_apply_batch(
            BatchBuilder::from_header(header("inv", TransactionType::Invoice, "100"))
                .line("nothing", dec("0"), dec("0"))
                .match_value("inv", dec("-50"))
                .match_value("pay", dec("-50"))
                .build(),
        )
        .await
        .unwrap_err();

    let errors = validation_errors(err);
    assert_eq!(
        errors.messages(),
        [
            "Goods and Vat cannot both be zero.",
            "Cannot match a transaction to itself.",
            "Cannot match to a void transaction.",
        ]
    );
}

#[tokio::test]
async fn test_line_total_must_equal_header_total() {
    let mut ledger = Ledger::new(MemoryStore::new());

    let err = ledger
        .validate_and_apply_batch(
            BatchBuilder::from_header(header("inv", TransactionType::Invoice, "100"))
                .line("widgets", dec("100"), dec("20"))
                .build(),
        )
        .await
        .unwrap_err();
    let errors = validation_errors(err);
    assert!(errors.contains("The total of the lines does not equal the total you entered."));
}

#[tokio::test]
async fn test_void_unwinds_every_match() {
    let mut ledger = Ledger::new(MemoryStore::new());

    ledger
        .validate_and_apply_batch(
            BatchBuilder::from_header(header("pay", TransactionType::Payment, "2400")).build(),
        )
        .await
        .unwrap();
    ledger
        .validate_and_apply_batch(
            BatchBuilder::from_header(header("inv", TransactionType::Invoice, "2400"))
                .match_value("pay", dec("-2400"))
                .build(),
        )
        .await
        .unwrap();

    let voided = ledger.void_transaction("inv").await.unwrap();
    assert_eq!(voided.status, TransactionStatus::Void);
    assert_eq!(voided.paid, dec("0.00"));
    assert_eq!(voided.due, voided.total);

    // The payment gets its allocation back and the match is gone.
    let payment = ledger.get_header("pay").await.unwrap().unwrap();
    assert_eq!(payment.paid, dec("0.00"));
    assert_eq!(payment.due, dec("-2400.00"));
    assert!(ledger.matches_for_header("inv").await.unwrap().is_empty());
    assert!(ledger.matches_for_header("pay").await.unwrap().is_empty());

    // Voiding twice fails, as does editing a void transaction.
    assert!(matches!(
        ledger.void_transaction("inv").await,
        Err(LedgerError::Status(_))
    ));
    let err = ledger
        .validate_and_apply_batch(
            BatchBuilder::from_header(header("inv", TransactionType::Invoice, "2400")).build(),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::Status(_)));
}

#[tokio::test]
async fn test_zero_value_transaction_rules() {
    let mut ledger = Ledger::new(MemoryStore::new());

    let err = ledger
        .validate_and_apply_batch(
            BatchBuilder::from_header(header("z", TransactionType::Invoice, "0")).build(),
        )
        .await
        .unwrap_err();
    let errors = validation_errors(err);
    assert!(errors.contains(
        "You are trying to enter a zero value transaction without matching to anything.  \
         This isn't allowed because it is pointless."
    ));

    // A zero value header is fine when its matches cancel out: here it knocks
    // an invoice off against a payment.
    ledger
        .validate_and_apply_batch(
            BatchBuilder::from_header(header("inv", TransactionType::Invoice, "100")).build(),
        )
        .await
        .unwrap();
    ledger
        .validate_and_apply_batch(
            BatchBuilder::from_header(header("pay", TransactionType::Payment, "100")).build(),
        )
        .await
        .unwrap();

    let applied = ledger
        .validate_and_apply_batch(
            BatchBuilder::from_header(header("z", TransactionType::Invoice, "0"))
                .match_value("inv", dec("100"))
                .match_value("pay", dec("-100"))
                .build(),
        )
        .await
        .unwrap();
    assert_eq!(applied.header.paid, dec("0.00"));
    assert_eq!(applied.header.due, dec("0.00"));

    let invoice = ledger.get_header("inv").await.unwrap().unwrap();
    let payment = ledger.get_header("pay").await.unwrap().unwrap();
    assert_eq!(invoice.due, dec("0.00"));
    assert_eq!(payment.due, dec("0.00"));
}

#[tokio::test]
async fn test_unchanged_resubmission_is_idempotent() {
    let mut ledger = Ledger::new(MemoryStore::new());

    ledger
        .validate_and_apply_batch(
            BatchBuilder::from_header(header("pay", TransactionType::Payment, "2400")).build(),
        )
        .await
        .unwrap();
    ledger
        .validate_and_apply_batch(
            BatchBuilder::from_header(header("inv", TransactionType::Invoice, "2400"))
                .match_value("pay", dec("-2400"))
                .build(),
        )
        .await
        .unwrap();

    let match_id = ledger.matches_for_header("inv").await.unwrap()[0].id.clone();
    let applied = ledger
        .validate_and_apply_batch(
            BatchBuilder::from_header(header("inv", TransactionType::Invoice, "2400"))
                .edit_match(&match_id, "pay", dec("-2400"))
                .build(),
        )
        .await
        .unwrap();

    assert!(applied.match_deltas.is_empty());
    assert!(applied.counterparts.is_empty());
    let matches = ledger.matches_for_header("inv").await.unwrap();
    assert_eq!(matches.len(), 1);
    assert_eq!(matches[0].id, match_id);
}

#[tokio::test]
async fn test_missing_counterpart_is_not_a_validation_error() {
    let mut ledger = Ledger::new(MemoryStore::new());

    let err = ledger
        .validate_and_apply_batch(
            BatchBuilder::from_header(header("inv", TransactionType::Invoice, "100"))
                .match_value("ghost", dec("-100"))
                .build(),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::HeaderNotFound(id) if id == "ghost"));
}

#[tokio::test]
async fn test_not_fully_matched_at_period_cutoff() {
    let mut ledger = Ledger::new(MemoryStore::new());

    // Invoice raised in August, settled by a September payment.
    ledger
        .validate_and_apply_batch(
            BatchBuilder::from_header(header_in_period(
                "inv",
                TransactionType::Invoice,
                "1200",
                "202608",
            ))
            .build(),
        )
        .await
        .unwrap();
    ledger
        .validate_and_apply_batch(
            BatchBuilder::from_header(header_in_period(
                "pay",
                TransactionType::Payment,
                "1200",
                "202609",
            ))
            .match_value("inv", dec("1200"))
            .build(),
        )
        .await
        .unwrap();

    // At the August cutoff the September match is rolled back and the
    // September payment did not exist yet, so only the invoice was open.
    let open = ledger
        .not_fully_matched_at_period(&Period::new("202608"))
        .await
        .unwrap();
    let ids: Vec<&str> = open.iter().map(|h| h.id.as_str()).collect();
    assert_eq!(ids, ["inv"]);
    assert_eq!(open[0].due, dec("1200.00"));

    // By September everything is settled.
    let open = ledger
        .not_fully_matched_at_period(&Period::new("202609"))
        .await
        .unwrap();
    assert!(open.is_empty());
}

#[tokio::test]
async fn test_period_report_excludes_headers_raised_after_cutoff() {
    let mut ledger = Ledger::new(MemoryStore::new());

    ledger
        .validate_and_apply_batch(
            BatchBuilder::from_header(header_in_period(
                "sep-inv",
                TransactionType::Invoice,
                "500",
                "202609",
            ))
            .build(),
        )
        .await
        .unwrap();

    // A document raised in September cannot have been outstanding in August.
    let open = ledger
        .not_fully_matched_at_period(&Period::new("202608"))
        .await
        .unwrap();
    assert!(open.is_empty());

    let open = ledger
        .not_fully_matched_at_period(&Period::new("202609"))
        .await
        .unwrap();
    assert_eq!(open.len(), 1);
    assert_eq!(open[0].id, "sep-inv");
}

#[tokio::test]
async fn test_header_field_validation() {
    let mut ledger = Ledger::new(MemoryStore::new());

    let mut bad = header("inv", TransactionType::Invoice, "100");
    bad.reference = "X".repeat(21);
    let err = ledger
        .validate_and_apply_batch(BatchBuilder::from_header(bad).build())
        .await
        .unwrap_err();
    let errors = validation_errors(err);
    assert!(errors.contains("Reference cannot exceed 20 characters"));
}

#[tokio::test]
async fn test_credit_note_offsets_invoice() {
    let mut ledger = Ledger::new(MemoryStore::new());

    ledger
        .validate_and_apply_batch(
            BatchBuilder::from_header(header("inv", TransactionType::Invoice, "600")).build(),
        )
        .await
        .unwrap();
    ledger
        .validate_and_apply_batch(
            BatchBuilder::from_header(header("cn", TransactionType::CreditNote, "600"))
                .match_value("inv", dec("600"))
                .build(),
        )
        .await
        .unwrap();

    let invoice = ledger.get_header("inv").await.unwrap().unwrap();
    let credit_note = ledger.get_header("cn").await.unwrap().unwrap();
    assert_eq!(invoice.due, dec("0.00"));
    assert_eq!(credit_note.total, dec("-600.00"));
    assert_eq!(credit_note.due, dec("0.00"));
    assert_eq!(credit_note.ui_due(), dec("0.00"));
}
