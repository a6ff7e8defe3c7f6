//! Payment-record writes.
//!
//! The one surface in the core that fails fast: a negative amount at
//! record-construction time is a caller bug and must not reach a payment
//! map. Everything downstream (aggregation, status automation) is total and
//! degrades malformed data instead. The functions here only edit in-memory
//! maps; persisting the result is the hosted backend's job.

use crate::payment::round_money;
use crate::{Division, PaymentMap, PaymentRecord, Tournament};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaymentError {
    NegativeAmount(Decimal),
    UnknownDivision(String),
}

impl fmt::Display for PaymentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PaymentError::NegativeAmount(amount) => {
                write!(f, "payment amount may not be negative: {amount}")
            }
            PaymentError::UnknownDivision(id) => write!(f, "no division with id {id}"),
        }
    }
}

impl std::error::Error for PaymentError {}

/// Build a validated payment record. Rejects negative amounts and
/// normalizes the rest to cents; zero is allowed (a comped entry is still
/// a record).
pub fn create_payment_record(
    amount: Decimal,
    method: &str,
    notes: &str,
    recorded_by: &str,
    at: DateTime<Utc>,
) -> Result<PaymentRecord, PaymentError> {
    if amount < Decimal::ZERO {
        return Err(PaymentError::NegativeAmount(amount));
    }
    Ok(PaymentRecord {
        amount: round_money(amount),
        date: at,
        method: method.to_owned(),
        notes: notes.to_owned(),
        recorded_by: recorded_by.to_owned(),
    })
}

/// Record a payment for one participant. Last write wins: the model keeps a
/// single record per participant, so any prior record is replaced whole and
/// handed back.
pub fn record_payment(
    payment_data: &mut PaymentMap,
    participant_id: &str,
    record: PaymentRecord,
) -> Option<PaymentRecord> {
    payment_data.insert(participant_id.to_owned(), record)
}

/// Remove a participant's payment record outright, returning it if one
/// existed. The participant reads as unpaid afterward.
pub fn remove_payment(payment_data: &mut PaymentMap, participant_id: &str) -> Option<PaymentRecord> {
    payment_data.remove(participant_id)
}

/// Record a payment into one division of a tournament by id: the id-keyed
/// patch the storage layer applies, rather than rewriting the whole
/// divisions array.
pub fn record_division_payment(
    tournament: &mut Tournament,
    division_id: &str,
    participant_id: &str,
    record: PaymentRecord,
) -> Result<Option<PaymentRecord>, PaymentError> {
    let division = tournament
        .find_division_mut(division_id)
        .ok_or_else(|| PaymentError::UnknownDivision(division_id.to_owned()))?;
    Ok(record_payment(&mut division.payment_data, participant_id, record))
}

/// Drop payment records whose participant is no longer on the division's
/// list. Orphans are ignorable, not an error; this is the cleanup pass.
/// Returns how many records were dropped.
pub fn prune_orphaned_payments(division: &mut Division) -> usize {
    let participants = &division.participants;
    let before = division.payment_data.len();
    division.payment_data.retain(|id, _| participants.contains(id));
    before - division.payment_data.len()
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
