use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use log::info;
use picklepoint_core::payment::{self, PaymentSummary};
use picklepoint_core::status;
use picklepoint_core::{ClubSnapshot, League, Tournament};

fn main() -> Result<()> {
    env_logger::init();

    let Some(path) = resolve_snapshot_path() else {
        return Ok(());
    };

    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("could not read snapshot {path}"))?;
    let snapshot: ClubSnapshot =
        serde_json::from_str(&content).with_context(|| format!("invalid snapshot json at {path}"))?;

    info!(
        "loaded {}: {} tournaments, {} leagues",
        path,
        snapshot.tournaments.len(),
        snapshot.leagues.len()
    );

    let now = Utc::now();
    print_report(&snapshot, now);
    Ok(())
}

/// Snapshot path from the command line, falling back to the
/// PICKLEPOINT_SNAPSHOT env var. Returns None when a flag already handled
/// the invocation (help/version).
fn resolve_snapshot_path() -> Option<String> {
    let mut args = std::env::args().skip(1);
    match args.next() {
        Some(arg) => match arg.as_str() {
            "-h" | "--help" => {
                println!("{}", usage_text());
                None
            }
            "-V" | "--version" => {
                println!("picklepoint {}", env!("CARGO_PKG_VERSION"));
                None
            }
            flag if flag.starts_with('-') => {
                eprintln!("Unknown argument: {flag}\n\n{}", usage_text());
                std::process::exit(2);
            }
            path => Some(path.to_owned()),
        },
        None => {
            if let Ok(path) = std::env::var("PICKLEPOINT_SNAPSHOT")
                && !path.trim().is_empty()
            {
                return Some(path);
            }
            eprintln!("Missing snapshot path.\n\n{}", usage_text());
            std::process::exit(2);
        }
    }
}

fn usage_text() -> &'static str {
    "picklepoint - payment reconciliation for pickleball tournaments and leagues

Usage:
  picklepoint <snapshot.json>
  picklepoint --help
  picklepoint --version

Environment:
  PICKLEPOINT_SNAPSHOT   Path to the club snapshot JSON (used when no path is given)
  RUST_LOG               Set to debug to see status-rule traces

The snapshot is a single JSON document with `tournaments` and `leagues`
arrays, in the shape the hosted database serves. The report is read-only:
applying a suggested status is up to the backend."
}

// ---------------------------------------------------------------------------
// Report
// ---------------------------------------------------------------------------

fn print_report(snapshot: &ClubSnapshot, now: DateTime<Utc>) {
    println!("picklepoint reconciliation - {}", now.format("%Y-%m-%d %H:%M UTC"));

    let portfolio = payment::portfolio_summary(&snapshot.tournaments, &snapshot.leagues);
    println!("\nPortfolio");
    println!(
        "  {} tournaments, {} leagues - {} events, {} fee-bearing",
        portfolio.tournament_count,
        portfolio.league_count,
        portfolio.total_events,
        portfolio.paid_events,
    );
    print_money_lines(&portfolio.payments);

    if !snapshot.tournaments.is_empty() {
        println!("\nTournaments");
        for tournament in &snapshot.tournaments {
            print_tournament(tournament);
        }
    }

    if !snapshot.leagues.is_empty() {
        println!("\nLeagues");
        for league in &snapshot.leagues {
            print_league(league);
        }
    }

    print_stale_section(snapshot, now);
}

fn print_tournament(tournament: &Tournament) {
    let summary = payment::tournament_summary(tournament);
    println!(
        "  {} [{}] - {} participants",
        display_name(&tournament.name, &tournament.id),
        tournament.status.label(),
        tournament.participant_count(),
    );
    print_money_lines(&summary);
}

fn print_league(league: &League) {
    let summary = payment::league_summary(league);
    println!(
        "  {} [{}] - {} participants",
        display_name(&league.name, &league.id),
        league.status.label(),
        league.participants.len(),
    );
    print_money_lines(&summary);
}

fn print_money_lines(summary: &PaymentSummary) {
    println!(
        "    expected ${:.2} | collected ${:.2} | outstanding ${:.2} | overpaid ${:.2}",
        summary.total_expected, summary.total_paid, summary.total_owed, summary.total_overpaid,
    );
    let mut flags = String::new();
    if summary.is_fully_paid {
        flags.push_str(" | fully paid");
    }
    if summary.has_payment_issues {
        flags.push_str(" | PAYMENT ISSUES");
    }
    println!(
        "    paid {} / partial {} / unpaid {} / overpaid {} - rate {:.1}%{}",
        summary.paid_count,
        summary.partial_count,
        summary.unpaid_count,
        summary.overpaid_count,
        summary.payment_rate,
        flags,
    );
}

/// Entities whose persisted status no longer matches the automation rules.
fn print_stale_section(snapshot: &ClubSnapshot, now: DateTime<Utc>) {
    let mut stale_lines = Vec::new();

    for tournament in &snapshot.tournaments {
        let decision = status::decide_tournament_status(tournament, now);
        if decision.is_stale() {
            stale_lines.push(format!(
                "  {}: {} -> {} ({})",
                display_name(&tournament.name, &tournament.id),
                decision.current.label(),
                decision.suggested.label(),
                decision.rule.label(),
            ));
        }
    }

    for league in &snapshot.leagues {
        let decision = status::decide_league_status(league, now);
        if decision.is_stale() {
            stale_lines.push(format!(
                "  {}: {} -> {} ({})",
                display_name(&league.name, &league.id),
                decision.current.label(),
                decision.suggested.label(),
                decision.rule.label(),
            ));
        }
    }

    if stale_lines.is_empty() {
        println!("\nStatuses: all up to date");
    } else {
        println!("\nSuggested status changes");
        for line in stale_lines {
            println!("{line}");
        }
    }
}

fn display_name<'a>(name: &'a str, id: &'a str) -> &'a str {
    if name.is_empty() { id } else { name }
}
