//! Enter a payment and an invoice, match them, then void the invoice.
//!
//! Run with `RUST_LOG=debug cargo run --example basic_matching` to see the
//! engine's tracing output.

use bigdecimal::BigDecimal;
use chrono::NaiveDate;

use matching_core::{
    BatchBuilder, Ledger, LedgerError, MemoryStore, Period, TransactionHeader, TransactionType,
};

#[tokio::main]
async fn main() -> Result<(), LedgerError> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let mut ledger = Ledger::new(MemoryStore::new());
    let date = NaiveDate::from_ymd_opt(2026, 8, 1).unwrap();
    let period = Period::new("202608");

    let payment = TransactionHeader::new(
        "pay-1".to_string(),
        "CHQ-1001".to_string(),
        TransactionType::Payment,
        BigDecimal::from(1200),
        date,
        None,
        period.clone(),
    );
    ledger
        .validate_and_apply_batch(BatchBuilder::from_header(payment).build())
        .await?;

    let invoice = TransactionHeader::new(
        "inv-1".to_string(),
        "INV-1001".to_string(),
        TransactionType::Invoice,
        BigDecimal::from(1200),
        date,
        Some(NaiveDate::from_ymd_opt(2026, 8, 31).unwrap()),
        period,
    );
    let applied = ledger
        .validate_and_apply_batch(
            BatchBuilder::from_header(invoice)
                .line("Consulting", BigDecimal::from(1000), BigDecimal::from(200))
                .match_value("pay-1", BigDecimal::from(-1200))
                .build(),
        )
        .await?;

    println!(
        "invoice {}: total {} paid {} due {}",
        applied.header.id, applied.header.total, applied.header.paid, applied.header.due
    );
    for counterpart in &applied.counterparts {
        println!(
            "counterpart {}: paid {} due {}",
            counterpart.id, counterpart.paid, counterpart.due
        );
    }

    // A rejected batch reports every problem at once.
    let oversized = TransactionHeader::new(
        "inv-2".to_string(),
        "INV-1002".to_string(),
        TransactionType::Invoice,
        BigDecimal::from(500),
        date,
        None,
        Period::new("202608"),
    );
    match ledger
        .validate_and_apply_batch(
            BatchBuilder::from_header(oversized)
                .match_value("pay-1", BigDecimal::from(-500))
                .build(),
        )
        .await
    {
        Err(LedgerError::Validation(errors)) => {
            for message in errors.messages() {
                println!("rejected: {message}");
            }
        }
        other => println!("unexpected: {other:?}"),
    }

    let voided = ledger.void_transaction("inv-1").await?;
    println!("voided {}: due restored to {}", voided.id, voided.due);
    let payment = ledger.get_header("pay-1").await?.unwrap();
    println!("payment due after void: {}", payment.due);

    Ok(())
}
