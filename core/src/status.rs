//! Status automation.
//!
//! Deterministic first-match rules that compute the lifecycle status an
//! event *should* be in from its snapshot and the current time, plus
//! staleness checks for the persisted status. The engine never writes:
//! callers (the reconciliation report, a suggested-status banner) decide
//! whether to apply the suggestion. Absent or malformed dates degrade to
//! "no transition"; these functions never fail.

use crate::{League, LeagueStatus, Tournament, TournamentStatus, payment};
use chrono::{DateTime, Utc};
use log::debug;

/// Which rule produced a decision. Returned alongside the suggestion so
/// callers can explain a transition without log spelunking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusRule {
    /// Completed/archived are sticky; nothing overwrites them.
    Terminal,
    /// No event date, and no undated transition applied.
    NoEventDate,
    /// No event date, registration open, everyone paid: registration done.
    RegistrationComplete,
    /// Event date has passed with participants on board.
    EventDatePassed,
    /// Event date has passed but nobody registered; left alone.
    EmptyPastEvent,
    /// All fee-bearing divisions fully paid ahead of the event.
    PaymentComplete,
    /// Registration deadline has passed with participants on board.
    DeadlinePassed,
    /// Participants emptied out of an advanced state; back to registration.
    EmptiedReset,
    NoChange,
    /// League is missing a start or end date.
    MissingDates,
    /// League end date has passed.
    EndDatePassed,
    /// League is between its start and end dates.
    Started,
    /// League has not started yet; pre-start status is preserved.
    NotStarted,
}

impl StatusRule {
    pub fn label(&self) -> &'static str {
        match self {
            StatusRule::Terminal => "terminal status is sticky",
            StatusRule::NoEventDate => "no event date",
            StatusRule::RegistrationComplete => "registration complete",
            StatusRule::EventDatePassed => "event date passed",
            StatusRule::EmptyPastEvent => "event date passed with no participants",
            StatusRule::PaymentComplete => "all payments in",
            StatusRule::DeadlinePassed => "registration deadline passed",
            StatusRule::EmptiedReset => "participants emptied out",
            StatusRule::NoChange => "no rule matched",
            StatusRule::MissingDates => "missing start or end date",
            StatusRule::EndDatePassed => "end date passed",
            StatusRule::Started => "start date reached",
            StatusRule::NotStarted => "not started yet",
        }
    }
}

/// A status suggestion with its provenance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusDecision<S> {
    pub current: S,
    pub suggested: S,
    pub rule: StatusRule,
}

impl<S: PartialEq> StatusDecision<S> {
    /// The persisted status no longer matches what the rules say.
    pub fn is_stale(&self) -> bool {
        self.suggested != self.current
    }
}

// ---------------------------------------------------------------------------
// Tournament rules
// ---------------------------------------------------------------------------

/// Compute the status a tournament should hold at `now`, with the rule that
/// decided it. Rules are evaluated top to bottom; the first match wins.
///
/// Note the ordering quirk: with a future event date, payment completeness
/// is checked before the registration deadline, so a fully-paid tournament
/// suggests `registered` even after the deadline has passed. Ambiguous
/// intent upstream; preserved as observed behavior (see DESIGN.md).
pub fn decide_tournament_status(
    tournament: &Tournament,
    now: DateTime<Utc>,
) -> StatusDecision<TournamentStatus> {
    let (suggested, rule) = tournament_rules(tournament, now);
    let decision = StatusDecision { current: tournament.status, suggested, rule };
    debug!(
        "tournament {}: {} -> {} ({})",
        tournament.id,
        decision.current.label(),
        decision.suggested.label(),
        rule.label(),
    );
    decision
}

fn tournament_rules(tournament: &Tournament, now: DateTime<Utc>) -> (TournamentStatus, StatusRule) {
    let current = tournament.status;
    if current.is_terminal() {
        return (current, StatusRule::Terminal);
    }

    let has_participants = tournament.has_active_participants();
    let all_paid = payment::tournament_summary(tournament).is_fully_paid;

    let Some(event_date) = tournament.event_date else {
        // Undated tournaments only move one way: registration closes once
        // everyone is in and paid.
        if current == TournamentStatus::RegistrationOpen && all_paid && has_participants {
            return (TournamentStatus::Registered, StatusRule::RegistrationComplete);
        }
        return (current, StatusRule::NoEventDate);
    };

    if now >= event_date {
        if has_participants {
            return (TournamentStatus::Completed, StatusRule::EventDatePassed);
        }
        // An empty tournament is not completed just because its date passed.
        return (current, StatusRule::EmptyPastEvent);
    }

    if has_participants && all_paid {
        return (TournamentStatus::Registered, StatusRule::PaymentComplete);
    }

    if let Some(deadline) = tournament.registration_deadline
        && now >= deadline
        && has_participants
    {
        return (TournamentStatus::InProgress, StatusRule::DeadlinePassed);
    }

    if !has_participants
        && matches!(current, TournamentStatus::InProgress | TournamentStatus::Registered)
    {
        return (TournamentStatus::RegistrationOpen, StatusRule::EmptiedReset);
    }

    (current, StatusRule::NoChange)
}

pub fn suggest_tournament_status(tournament: &Tournament, now: DateTime<Utc>) -> TournamentStatus {
    decide_tournament_status(tournament, now).suggested
}

pub fn tournament_status_is_stale(tournament: &Tournament, now: DateTime<Utc>) -> bool {
    decide_tournament_status(tournament, now).is_stale()
}

// ---------------------------------------------------------------------------
// League rules
// ---------------------------------------------------------------------------

/// Compute the status a league should hold at `now`. Leagues move on dates
/// alone; payment state never gates a league transition.
pub fn decide_league_status(league: &League, now: DateTime<Utc>) -> StatusDecision<LeagueStatus> {
    let (suggested, rule) = league_rules(league, now);
    let decision = StatusDecision { current: league.status, suggested, rule };
    debug!(
        "league {}: {} -> {} ({})",
        league.id,
        decision.current.label(),
        decision.suggested.label(),
        rule.label(),
    );
    decision
}

fn league_rules(league: &League, now: DateTime<Utc>) -> (LeagueStatus, StatusRule) {
    let current = league.status;
    if current.is_terminal() {
        return (current, StatusRule::Terminal);
    }
    let (Some(start), Some(end)) = (league.start_date, league.end_date) else {
        return (current, StatusRule::MissingDates);
    };
    if now >= end {
        return (LeagueStatus::Completed, StatusRule::EndDatePassed);
    }
    if now >= start {
        return (LeagueStatus::Active, StatusRule::Started);
    }
    (current, StatusRule::NotStarted)
}

pub fn suggest_league_status(league: &League, now: DateTime<Utc>) -> LeagueStatus {
    decide_league_status(league, now).suggested
}

pub fn league_status_is_stale(league: &League, now: DateTime<Utc>) -> bool {
    decide_league_status(league, now).is_stale()
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
