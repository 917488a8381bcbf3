//! Plain-text rendering of package views for the terminal.

use std::fmt::Write;

use services::{PackageListItem, PackageReport, PortfolioSummary};
use tutor_core::lifecycle::SlotState;
use tutor_core::model::ReportSettings;

fn slot_label(state: SlotState) -> &'static str {
    match state {
        SlotState::Open => "open",
        SlotState::Scheduled => "scheduled",
        SlotState::PendingConfirmation => "pending confirmation",
        SlotState::Completed => "completed",
    }
}

fn expiry_line(days: i64, past: bool) -> String {
    if past {
        let ago = days.unsigned_abs();
        if ago == 0 {
            return "expired today".to_owned();
        }
        return format!("expired {ago} day{} ago", if ago == 1 { "" } else { "s" });
    }
    match days {
        0 => "expires today".to_owned(),
        1 => "expires in 1 day".to_owned(),
        n => format!("expires in {n} days"),
    }
}

#[must_use]
pub fn report(report: &PackageReport) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Package {} [{}]", report.label(), report.status);
    let _ = writeln!(
        out,
        "  progress: {}/{} completed ({:.0}%), {}",
        report.progress.completed_sessions,
        report.session_count,
        report.progress_percent,
        report.remaining_text
    );
    let _ = writeln!(
        out,
        "  reserved: {} of {} ({:.0}%)",
        report.usage.sessions_used,
        report.usage.session_count,
        report.usage.usage_percent()
    );
    let mut expiry = format!(
        "  {} ({})",
        expiry_line(report.expiry.days_until_expiry, report.expiry.is_past_expiry),
        report.expires_at.format("%Y-%m-%d")
    );
    if report.expiry.is_expiring_soon {
        expiry.push_str(" - expiring soon");
    }
    let _ = writeln!(out, "{expiry}");
    if !report.savings.is_zero() {
        let _ = writeln!(
            out,
            "  savings: {} per session, {} total",
            report.savings.per_session, report.savings.total
        );
    }

    let _ = writeln!(out, "  sessions ({} open):", report.open_slots());
    for slot in &report.slots {
        let mut line = format!("    #{:<3} {}", slot.session_number, slot_label(slot.state));
        if let Some(start) = slot.start_time {
            let _ = write!(line, " at {}", start.format("%Y-%m-%d %H:%M UTC"));
        }
        if slot.can_schedule {
            line.push_str(" (can schedule)");
        }
        let _ = writeln!(out, "{line}");
    }
    if report.ignored_redemptions > 0 {
        let _ = writeln!(
            out,
            "  note: {} redemption(s) could not be placed on a session",
            report.ignored_redemptions
        );
    }
    out
}

#[must_use]
pub fn list(items: &[PackageListItem], summary: &PortfolioSummary) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{} packages: {} active, {} completed, {} closed, {} expiring soon, {} sessions left",
        summary.total,
        summary.active,
        summary.completed,
        summary.closed,
        summary.expiring_soon,
        summary.remaining_sessions
    );
    for item in items {
        let label = item
            .readable_id
            .as_ref()
            .map_or_else(|| item.package_id.to_string(), ToString::to_string);
        let _ = writeln!(
            out,
            "  {label:<20} {:<9} {}/{} done, {} left, {}{}",
            item.status.as_str(),
            item.completed_sessions,
            item.session_count,
            item.sessions_remaining,
            expiry_line(item.days_until_expiry, item.is_past_expiry),
            if item.is_expiring_soon { " *" } else { "" }
        );
    }
    out
}

#[must_use]
pub fn settings(settings: &ReportSettings) -> String {
    format!(
        "expiring soon window: {} days ({})\n",
        settings.expiring_soon_days(),
        settings.expiry_window()
    )
}
