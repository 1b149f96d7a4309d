//! Plain-text renderings of each screen.

use chrono::{DateTime, Utc};

use cupid_types::models::{Record, Session};

use crate::dashboard::PageCursor;
use crate::fetch::FetchState;

pub const TITLE: &str = "Cupid's Cal";
pub const DASHBOARD_HEADING: &str = "Submission Records Dashboard";
pub const LOADING: &str = "Loading submissions...";
pub const ACCESS_DENIED: &str = "Access Denied";
pub const ACCESS_DENIED_DETAIL: &str =
    "You do not have administrative privileges or your session has expired.";
pub const EMPTY: &str = "No Submissions Yet";
pub const PRANKED: &str = "YOU'VE BEEN PRANKED!";

const COLUMNS: [&str; 4] = ["#", "Submitter Name", "Crush Name", "Submission Date"];

pub fn navbar(session: &Session) -> String {
    match session.user() {
        Some(user) => format!(
            "{} | Admin Dashboard | Home | Admin: {} | Logout",
            TITLE, user.username
        ),
        None => format!("{} | Login As Admin | Login", TITLE),
    }
}

/// `Mon D, YYYY, HH:MM AM/PM` in UTC, or `N/A`.
pub fn format_date(date: Option<DateTime<Utc>>) -> String {
    match date {
        Some(date) => date.format("%b %-d, %Y, %I:%M %p").to_string(),
        None => "N/A".to_string(),
    }
}

/// The dashboard body for a given fetch state. Access Denied wins over any
/// error text; records and pager only show on a non-empty success.
pub fn dashboard(state: &FetchState, cursor: PageCursor, total_count: u64) -> String {
    let mut lines = vec![
        DASHBOARD_HEADING.to_string(),
        format!("Total Submissions: {}", total_count),
        String::new(),
    ];

    match state {
        FetchState::Idle | FetchState::Loading { .. } => lines.push(LOADING.to_string()),
        FetchState::Unauthorized(_) => {
            lines.push(ACCESS_DENIED.to_string());
            lines.push(ACCESS_DENIED_DETAIL.to_string());
        }
        FetchState::Failed(message) => lines.push(format!("Error: {}", message)),
        FetchState::Success(snapshot) if snapshot.records.is_empty() => {
            lines.push(EMPTY.to_string());
        }
        FetchState::Success(snapshot) => {
            lines.extend(table(&snapshot.records, cursor));
            lines.push(String::new());
            lines.push(pager(cursor));
        }
    }

    lines.join("\n")
}

fn table(records: &[Record], cursor: PageCursor) -> Vec<String> {
    let rows: Vec<[String; 4]> = records
        .iter()
        .enumerate()
        .map(|(i, record)| {
            [
                cursor.row_number(i).to_string(),
                record.submitter_name.clone(),
                record.target_name.clone(),
                format_date(record.created_at),
            ]
        })
        .collect();

    let mut widths = COLUMNS.map(str::len);
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let render = |cells: [&str; 4]| {
        cells
            .iter()
            .zip(widths)
            .map(|(cell, width)| format!("{:<width$}", cell, width = width))
            .collect::<Vec<_>>()
            .join("  ")
            .trim_end()
            .to_string()
    };

    let mut out = vec![render(COLUMNS)];
    out.push(render(widths.map(|w| "-".repeat(w)).each_ref().map(String::as_str)));
    out.extend(rows.iter().map(|row| render(row.each_ref().map(String::as_str))));
    out
}

fn pager(cursor: PageCursor) -> String {
    let previous = if cursor.has_previous() { "[p] Previous" } else { "    Previous" };
    let next = if cursor.has_next() { "Next [n]" } else { "Next" };
    format!("{}   Page {} of {}   {}", previous, cursor.current(), cursor.total(), next)
}

pub fn prank_modal() -> String {
    [
        PRANKED,
        "The love calculation is fake! But here is the catch:",
        "Your crush's name was just sent to Abreham!",
        "(And yes, the data was actually posted to the API)",
    ]
    .join("\n\n")
}
