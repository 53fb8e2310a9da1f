//! Builders for domain values used across tests.

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use rust_decimal::Decimal;

use crate::domain::{BusinessTime, Direction, Transaction};
use crate::port::Credentials;

/// Parse `YYYY-mm-dd HH:MM:SS` as business-local civil time.
pub fn local(s: &str) -> NaiveDateTime {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").expect("valid local timestamp")
}

/// Parse `YYYY-mm-dd HH:MM:SS` as a UTC instant.
pub fn instant(s: &str) -> DateTime<Utc> {
    Utc.from_utc_datetime(&local(s))
}

/// UTC instant for a business-local civil time in the default timezone.
pub fn business_instant(s: &str) -> DateTime<Utc> {
    BusinessTime::default().to_utc(local(s))
}

pub fn credit(reference: &str, amount: i64, posted_at: &str) -> Transaction {
    transaction(reference, Direction::Credit, amount, posted_at)
}

pub fn debit(reference: &str, amount: i64, posted_at: &str) -> Transaction {
    transaction(reference, Direction::Debit, amount, posted_at)
}

pub fn transaction(
    reference: &str,
    direction: Direction,
    amount: i64,
    posted_at: &str,
) -> Transaction {
    Transaction {
        reference: reference.to_string(),
        direction,
        amount: Decimal::from(amount),
        posted_at: Some(local(posted_at)),
        counterparty: "ACME TRADING CO".to_string(),
        description: format!("transfer {reference}"),
    }
}

/// Attach a description to a transaction.
pub fn described(mut tx: Transaction, description: &str) -> Transaction {
    tx.description = description.to_string();
    tx
}

pub fn credentials() -> Credentials {
    Credentials {
        username: "operator".to_string(),
        password: "secret".to_string(),
        corp_id: "CORP01".to_string(),
    }
}
