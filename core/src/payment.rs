//! Payment evaluation and aggregation.
//!
//! Pure functions from entity snapshots to summaries: a per-participant
//! classifier, one shared summary shape for divisions, tournaments, and
//! leagues, and a portfolio rollup across every event the club runs.
//! Re-invoked on every snapshot change; same input always yields the same
//! output, so callers may re-run freely without coordination.

use crate::{Division, League, PaymentMap, Roster, Tournament};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;

/// Round money to cents. Applied at every aggregate boundary so
/// floating-point drift never accumulates across summaries.
pub fn round_money(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

fn round_rate(rate: Decimal) -> Decimal {
    rate.round_dp_with_strategy(1, RoundingStrategy::MidpointAwayFromZero)
}

/// A free or empty event reports a 100% rate so it never reads as blocked.
const FULL_RATE: Decimal = Decimal::ONE_HUNDRED;

// ---------------------------------------------------------------------------
// Per-participant evaluation
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Unpaid,
    Partial,
    Paid,
    Overpaid,
}

impl PaymentStatus {
    pub fn label(&self) -> &'static str {
        match self {
            PaymentStatus::Unpaid => "Unpaid",
            PaymentStatus::Partial => "Partial",
            PaymentStatus::Paid => "Paid",
            PaymentStatus::Overpaid => "Overpaid",
        }
    }
}

/// Derived, never stored.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentStatusResult {
    pub status: PaymentStatus,
    pub amount_paid: Decimal,
    pub amount_owed: Decimal,
    pub overpaid_amount: Decimal,
}

/// Classify one participant's payment against a fixed fee.
///
/// Assumes `fee > 0`; free events are short-circuited by the aggregators
/// and never evaluated per participant. A missing record, or an amount
/// below zero, reads as nothing paid. Total over its input domain: no
/// error conditions.
pub fn evaluate_participant(
    participant_id: &str,
    payment_data: &PaymentMap,
    fee: Decimal,
) -> PaymentStatusResult {
    let amount_paid = payment_data
        .get(participant_id)
        .map(|record| record.amount)
        .filter(|amount| *amount >= Decimal::ZERO)
        .unwrap_or(Decimal::ZERO);
    let amount_paid = round_money(amount_paid);

    let (status, amount_owed, overpaid_amount) = if amount_paid == Decimal::ZERO {
        (PaymentStatus::Unpaid, round_money(fee), Decimal::ZERO)
    } else if amount_paid < fee {
        (PaymentStatus::Partial, round_money(fee - amount_paid), Decimal::ZERO)
    } else if amount_paid == fee {
        (PaymentStatus::Paid, Decimal::ZERO, Decimal::ZERO)
    } else {
        (PaymentStatus::Overpaid, Decimal::ZERO, round_money(amount_paid - fee))
    };

    PaymentStatusResult { status, amount_paid, amount_owed, overpaid_amount }
}

// ---------------------------------------------------------------------------
// Aggregate summaries
// ---------------------------------------------------------------------------

/// One summary shape for divisions, tournaments, and leagues.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentSummary {
    pub total_participants: usize,
    pub total_expected: Decimal,
    pub total_paid: Decimal,
    pub total_owed: Decimal,
    pub total_overpaid: Decimal,
    pub paid_count: usize,
    pub partial_count: usize,
    pub unpaid_count: usize,
    pub overpaid_count: usize,
    /// `total_owed == 0`. Free events are trivially fully paid.
    pub is_fully_paid: bool,
    /// Percent of participants paid exactly in full, one decimal. Overpaid
    /// participants intentionally do not count toward the rate.
    pub payment_rate: Decimal,
    pub has_payment_issues: bool,
}

impl PaymentSummary {
    /// Free or empty event: nothing expected, nothing owed, nothing to
    /// block a lifecycle transition on.
    fn free(participant_count: usize) -> Self {
        PaymentSummary {
            total_participants: participant_count,
            total_expected: Decimal::ZERO,
            total_paid: Decimal::ZERO,
            total_owed: Decimal::ZERO,
            total_overpaid: Decimal::ZERO,
            paid_count: 0,
            partial_count: 0,
            unpaid_count: participant_count,
            overpaid_count: 0,
            is_fully_paid: true,
            payment_rate: FULL_RATE,
            has_payment_issues: false,
        }
    }
}

/// Aggregate one flat participant list against one fee. The shared engine
/// behind the division and league summaries.
fn roster_summary(participants: &[String], payment_data: &PaymentMap, fee: Decimal) -> PaymentSummary {
    if fee <= Decimal::ZERO || participants.is_empty() {
        return PaymentSummary::free(participants.len());
    }

    let mut total_paid = Decimal::ZERO;
    let mut total_owed = Decimal::ZERO;
    let mut total_overpaid = Decimal::ZERO;
    let mut paid_count = 0;
    let mut partial_count = 0;
    let mut unpaid_count = 0;
    let mut overpaid_count = 0;

    for participant in participants {
        let result = evaluate_participant(participant, payment_data, fee);
        total_paid += result.amount_paid;
        total_owed += result.amount_owed;
        total_overpaid += result.overpaid_amount;
        match result.status {
            PaymentStatus::Paid => paid_count += 1,
            PaymentStatus::Partial => partial_count += 1,
            PaymentStatus::Unpaid => unpaid_count += 1,
            PaymentStatus::Overpaid => overpaid_count += 1,
        }
    }

    let total_participants = participants.len();
    let total_expected = round_money(fee * Decimal::from(total_participants as u64));
    let total_paid = round_money(total_paid);
    let total_owed = round_money(total_owed);
    let total_overpaid = round_money(total_overpaid);
    let payment_rate = round_rate(
        Decimal::from(paid_count as u64) * FULL_RATE / Decimal::from(total_participants as u64),
    );

    PaymentSummary {
        total_participants,
        total_expected,
        total_paid,
        total_owed,
        total_overpaid,
        paid_count,
        partial_count,
        unpaid_count,
        overpaid_count,
        is_fully_paid: total_owed == Decimal::ZERO,
        payment_rate,
        has_payment_issues: total_overpaid > Decimal::ZERO || total_paid > total_expected,
    }
}

/// Combine already-computed summaries into one; rate and flags are
/// recomputed from the combined totals.
fn combine_summaries<I>(parts: I) -> PaymentSummary
where
    I: IntoIterator<Item = PaymentSummary>,
{
    let mut combined = PaymentSummary::free(0);
    for part in parts {
        combined.total_participants += part.total_participants;
        combined.total_expected += part.total_expected;
        combined.total_paid += part.total_paid;
        combined.total_owed += part.total_owed;
        combined.total_overpaid += part.total_overpaid;
        combined.paid_count += part.paid_count;
        combined.partial_count += part.partial_count;
        combined.unpaid_count += part.unpaid_count;
        combined.overpaid_count += part.overpaid_count;
    }

    combined.total_expected = round_money(combined.total_expected);
    combined.total_paid = round_money(combined.total_paid);
    combined.total_owed = round_money(combined.total_owed);
    combined.total_overpaid = round_money(combined.total_overpaid);
    combined.is_fully_paid = combined.total_owed == Decimal::ZERO;
    combined.has_payment_issues = combined.total_overpaid > Decimal::ZERO
        || combined.total_paid > combined.total_expected;
    combined.payment_rate = if combined.total_participants == 0 {
        FULL_RATE
    } else {
        round_rate(
            Decimal::from(combined.paid_count as u64) * FULL_RATE
                / Decimal::from(combined.total_participants as u64),
        )
    };
    combined
}

pub fn division_summary(division: &Division) -> PaymentSummary {
    roster_summary(&division.participants, &division.payment_data, division.entry_fee)
}

pub fn league_summary(league: &League) -> PaymentSummary {
    roster_summary(&league.participants, &league.payment_data, league.registration_fee)
}

/// Tournament-level rollup. Dispatches once on the roster shape: legacy
/// flat tournaments aggregate like a league; division tournaments sum their
/// fee-bearing divisions only. Free divisions still count toward
/// [`Tournament::participant_count`], just not the money.
pub fn tournament_summary(tournament: &Tournament) -> PaymentSummary {
    match &tournament.roster {
        Roster::Flat(flat) => roster_summary(&flat.participants, &flat.payment_data, flat.entry_fee),
        Roster::Divisions { divisions } => combine_summaries(
            divisions
                .iter()
                .filter(|d| d.entry_fee > Decimal::ZERO)
                .map(division_summary),
        ),
    }
}

// ---------------------------------------------------------------------------
// Portfolio rollup
// ---------------------------------------------------------------------------

/// Cross-event aggregate: all tournaments (division-aware) plus all leagues.
/// Free events sit in `total_events` but stay out of the money rollup, so
/// the two event counts are the way to see how much of the portfolio the
/// financial summary actually covers.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioSummary {
    pub payments: PaymentSummary,
    /// Financial units: every division, flat tournament, and league.
    pub total_events: usize,
    /// Units with a fee, i.e. the ones feeding the money rollup.
    pub paid_events: usize,
    pub tournament_count: usize,
    pub league_count: usize,
}

pub fn portfolio_summary(tournaments: &[Tournament], leagues: &[League]) -> PortfolioSummary {
    let mut parts: Vec<PaymentSummary> = Vec::new();
    let mut total_events = 0;
    let mut paid_events = 0;

    for tournament in tournaments {
        match &tournament.roster {
            Roster::Divisions { divisions } => {
                for division in divisions {
                    total_events += 1;
                    if division.entry_fee > Decimal::ZERO {
                        paid_events += 1;
                        parts.push(division_summary(division));
                    }
                }
            }
            Roster::Flat(flat) => {
                total_events += 1;
                if flat.entry_fee > Decimal::ZERO {
                    paid_events += 1;
                    parts.push(roster_summary(&flat.participants, &flat.payment_data, flat.entry_fee));
                }
            }
        }
    }

    for league in leagues {
        total_events += 1;
        if league.registration_fee > Decimal::ZERO {
            paid_events += 1;
            parts.push(league_summary(league));
        }
    }

    PortfolioSummary {
        payments: combine_summaries(parts),
        total_events,
        paid_events,
        tournament_count: tournaments.len(),
        league_count: leagues.len(),
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{FlatRoster, PaymentRecord};
    use chrono::{TimeZone, Utc};

    fn dollars(amount: i64) -> Decimal {
        Decimal::from(amount)
    }

    fn record(amount: Decimal) -> PaymentRecord {
        PaymentRecord {
            amount,
            date: Utc.with_ymd_and_hms(2026, 5, 1, 9, 0, 0).unwrap(),
            method: "venmo".into(),
            notes: String::new(),
            recorded_by: "treasurer".into(),
        }
    }

    fn payment_map(entries: &[(&str, i64)]) -> PaymentMap {
        entries
            .iter()
            .map(|(id, amount)| (id.to_string(), record(dollars(*amount))))
            .collect()
    }

    fn names(ids: &[&str]) -> Vec<String> {
        ids.iter().map(|s| s.to_string()).collect()
    }

    fn division(fee: i64, participants: &[&str], payments: &[(&str, i64)]) -> Division {
        Division {
            id: "d1".into(),
            entry_fee: dollars(fee),
            participants: names(participants),
            payment_data: payment_map(payments),
            ..Default::default()
        }
    }

    #[test]
    fn missing_record_is_unpaid_for_full_fee() {
        let result = evaluate_participant("alice", &PaymentMap::new(), dollars(20));
        assert_eq!(result.status, PaymentStatus::Unpaid);
        assert_eq!(result.amount_paid, Decimal::ZERO);
        assert_eq!(result.amount_owed, dollars(20));
        assert_eq!(result.overpaid_amount, Decimal::ZERO);
    }

    #[test]
    fn exact_payment_is_paid_with_nothing_owed() {
        let data = payment_map(&[("alice", 20)]);
        let result = evaluate_participant("alice", &data, dollars(20));
        assert_eq!(result.status, PaymentStatus::Paid);
        assert_eq!(result.amount_owed, Decimal::ZERO);
        assert_eq!(result.overpaid_amount, Decimal::ZERO);
    }

    #[test]
    fn partial_payment_owes_the_difference() {
        let data = payment_map(&[("bob", 12)]);
        let result = evaluate_participant("bob", &data, dollars(20));
        assert_eq!(result.status, PaymentStatus::Partial);
        assert_eq!(result.amount_paid, dollars(12));
        assert_eq!(result.amount_owed, dollars(8));
    }

    #[test]
    fn overpayment_tracks_the_excess_and_owes_nothing() {
        let data = payment_map(&[("carol", 25)]);
        let result = evaluate_participant("carol", &data, dollars(20));
        assert_eq!(result.status, PaymentStatus::Overpaid);
        assert_eq!(result.overpaid_amount, dollars(5));
        assert_eq!(result.amount_owed, Decimal::ZERO);
    }

    #[test]
    fn negative_amount_reads_as_nothing_paid() {
        let data = payment_map(&[("dave", -5)]);
        let result = evaluate_participant("dave", &data, dollars(20));
        assert_eq!(result.status, PaymentStatus::Unpaid);
        assert_eq!(result.amount_owed, dollars(20));
    }

    #[test]
    fn removing_a_payment_returns_participant_to_unpaid() {
        // Scenario: $25 against a $20 fee, then the record is removed.
        let mut data = payment_map(&[("erin", 25)]);
        let result = evaluate_participant("erin", &data, dollars(20));
        assert_eq!(result.status, PaymentStatus::Overpaid);
        assert_eq!(result.overpaid_amount, dollars(5));

        data.remove("erin");
        let result = evaluate_participant("erin", &data, dollars(20));
        assert_eq!(result.status, PaymentStatus::Unpaid);
        assert_eq!(result.amount_owed, dollars(20));
    }

    #[test]
    fn division_summary_mixed_payment_states() {
        // $20 fee, three participants: paid in full, half, and nothing.
        let d = division(20, &["alice", "bob", "carol"], &[("alice", 20), ("bob", 10)]);
        let summary = division_summary(&d);
        assert_eq!(summary.total_participants, 3);
        assert_eq!(summary.total_expected, dollars(60));
        assert_eq!(summary.total_paid, dollars(30));
        assert_eq!(summary.total_owed, dollars(30));
        assert_eq!(summary.paid_count, 1);
        assert_eq!(summary.partial_count, 1);
        assert_eq!(summary.unpaid_count, 1);
        assert_eq!(summary.payment_rate, "33.3".parse::<Decimal>().unwrap());
        assert!(!summary.is_fully_paid);
        assert!(!summary.has_payment_issues);
    }

    #[test]
    fn free_division_is_trivially_fully_paid() {
        let d = division(0, &["alice", "bob"], &[]);
        let summary = division_summary(&d);
        assert_eq!(summary.total_expected, Decimal::ZERO);
        assert_eq!(summary.total_participants, 2);
        assert_eq!(summary.unpaid_count, 2);
        assert!(summary.is_fully_paid);
        assert_eq!(summary.payment_rate, FULL_RATE);
    }

    #[test]
    fn empty_division_is_trivially_fully_paid() {
        let d = division(20, &[], &[]);
        let summary = division_summary(&d);
        assert_eq!(summary.total_participants, 0);
        assert!(summary.is_fully_paid);
        assert_eq!(summary.payment_rate, FULL_RATE);
    }

    #[test]
    fn orphaned_payment_records_are_ignored() {
        // "ghost" paid but is no longer on the participant list.
        let d = division(20, &["alice"], &[("alice", 20), ("ghost", 20)]);
        let summary = division_summary(&d);
        assert_eq!(summary.total_participants, 1);
        assert_eq!(summary.total_paid, dollars(20));
        assert!(summary.is_fully_paid);
    }

    #[test]
    fn overpayment_raises_the_issue_flag_but_not_the_rate() {
        let d = division(20, &["alice", "bob"], &[("alice", 30), ("bob", 20)]);
        let summary = division_summary(&d);
        assert!(summary.has_payment_issues);
        assert_eq!(summary.total_overpaid, dollars(10));
        assert_eq!(summary.overpaid_count, 1);
        // Only the exact payer counts toward the rate.
        assert_eq!(summary.payment_rate, dollars(50));
        assert!(summary.is_fully_paid);
    }

    #[test]
    fn expected_total_is_fee_times_participants() {
        let d = division(35, &["a", "b", "c", "d"], &[]);
        let summary = division_summary(&d);
        assert_eq!(summary.total_expected, dollars(140));
    }

    #[test]
    fn cent_amounts_round_cleanly() {
        let mut d = division(20, &["alice"], &[]);
        d.entry_fee = "19.99".parse().unwrap();
        d.payment_data.insert("alice".into(), record("7.333".parse().unwrap()));
        let summary = division_summary(&d);
        assert_eq!(summary.total_paid, "7.33".parse::<Decimal>().unwrap());
        assert_eq!(summary.total_owed, "12.66".parse::<Decimal>().unwrap());
    }

    #[test]
    fn aggregation_is_idempotent() {
        let d = division(20, &["alice", "bob"], &[("alice", 20), ("bob", 5)]);
        assert_eq!(division_summary(&d), division_summary(&d));
    }

    #[test]
    fn flat_tournament_aggregates_like_a_league() {
        let t = Tournament {
            id: "t1".into(),
            roster: Roster::Flat(FlatRoster {
                entry_fee: dollars(15),
                participants: names(&["alice", "bob"]),
                payment_data: payment_map(&[("alice", 15), ("bob", 15)]),
            }),
            ..Default::default()
        };
        let summary = tournament_summary(&t);
        assert_eq!(summary.total_expected, dollars(30));
        assert!(summary.is_fully_paid);
        assert_eq!(summary.payment_rate, FULL_RATE);
    }

    #[test]
    fn tournament_summary_skips_free_divisions() {
        let paid = division(20, &["alice", "bob"], &[("alice", 20)]);
        let free = Division {
            id: "d2".into(),
            participants: names(&["carol", "dave", "erin"]),
            ..Default::default()
        };
        let t = Tournament {
            id: "t1".into(),
            roster: Roster::Divisions { divisions: vec![paid, free] },
            ..Default::default()
        };
        let summary = tournament_summary(&t);
        // Money covers the fee-bearing division only.
        assert_eq!(summary.total_participants, 2);
        assert_eq!(summary.total_expected, dollars(40));
        assert_eq!(summary.total_owed, dollars(20));
        // The free division still counts toward the tournament head count.
        assert_eq!(t.participant_count(), 5);
    }

    #[test]
    fn tournament_of_free_divisions_is_fully_paid() {
        let t = Tournament {
            id: "t1".into(),
            roster: Roster::Divisions {
                divisions: vec![Division {
                    id: "d1".into(),
                    participants: names(&["alice"]),
                    ..Default::default()
                }],
            },
            ..Default::default()
        };
        let summary = tournament_summary(&t);
        assert!(summary.is_fully_paid);
        assert_eq!(summary.total_participants, 0);
        assert_eq!(summary.payment_rate, FULL_RATE);
    }

    #[test]
    fn league_summary_uses_registration_fee() {
        let league = League {
            id: "l1".into(),
            registration_fee: dollars(40),
            participants: names(&["alice", "bob", "carol"]),
            payment_data: payment_map(&[("alice", 40), ("bob", 40), ("carol", 40)]),
            ..Default::default()
        };
        let summary = league_summary(&league);
        assert_eq!(summary.total_expected, dollars(120));
        assert_eq!(summary.paid_count, 3);
        assert!(summary.is_fully_paid);
        assert!(!summary.has_payment_issues);
    }

    #[test]
    fn portfolio_counts_free_events_but_not_their_money() {
        let tournaments = vec![
            Tournament {
                id: "t1".into(),
                roster: Roster::Divisions {
                    divisions: vec![
                        division(20, &["alice", "bob"], &[("alice", 20), ("bob", 20)]),
                        Division {
                            id: "d2".into(),
                            participants: names(&["carol"]),
                            ..Default::default()
                        },
                    ],
                },
                ..Default::default()
            },
            Tournament {
                id: "t2".into(),
                roster: Roster::Flat(FlatRoster {
                    entry_fee: dollars(10),
                    participants: names(&["dave"]),
                    payment_data: PaymentMap::new(),
                }),
                ..Default::default()
            },
        ];
        let leagues = vec![League {
            id: "l1".into(),
            participants: names(&["erin", "frank"]),
            ..Default::default()
        }];

        let portfolio = portfolio_summary(&tournaments, &leagues);
        assert_eq!(portfolio.total_events, 4); // two divisions + flat + league
        assert_eq!(portfolio.paid_events, 2); // the $20 division and the $10 flat
        assert_eq!(portfolio.tournament_count, 2);
        assert_eq!(portfolio.league_count, 1);
        assert_eq!(portfolio.payments.total_expected, dollars(50));
        assert_eq!(portfolio.payments.total_paid, dollars(40));
        assert_eq!(portfolio.payments.total_participants, 3);
        assert!(!portfolio.payments.is_fully_paid);
    }

    #[test]
    fn empty_portfolio_rolls_up_to_zero() {
        let portfolio = portfolio_summary(&[], &[]);
        assert_eq!(portfolio.total_events, 0);
        assert_eq!(portfolio.paid_events, 0);
        assert_eq!(portfolio.payments.total_expected, Decimal::ZERO);
        assert!(portfolio.payments.is_fully_paid);
    }
}
