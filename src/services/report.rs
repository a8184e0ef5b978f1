//! Printable HTML rendering of the aggregate ranking.

use std::fmt::{self, Write};

use time::Date;

use crate::dto::results::OverallStandingDto;

/// File name suggested to browsers downloading the report.
pub const REPORT_FILE_NAME: &str = "office-olympics-results.html";

/// Render the final ranking as a standalone HTML page.
pub fn render_results(standings: &[OverallStandingDto], generated_on: Date) -> String {
    let mut page = String::new();
    // writing into a String cannot fail
    let _ = write_page(&mut page, standings, generated_on);
    page
}

fn write_page(
    w: &mut impl Write,
    standings: &[OverallStandingDto],
    generated_on: Date,
) -> fmt::Result {
    writeln!(
        w,
        r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<title>Office Olympics Results</title>
<style>
  body{{font-family:Arial,sans-serif;margin:40px}}
  .header{{text-align:center;margin-bottom:40px}}
  .title{{font-size:28px;font-weight:bold;color:#1e293b;margin-bottom:10px}}
  .subtitle{{font-size:18px;color:#64748b}}
  .results-table{{width:100%;border-collapse:collapse;margin-top:30px}}
  .results-table th,.results-table td{{padding:15px;text-align:left;border-bottom:1px solid #e2e8f0}}
  .results-table th{{background-color:#f8fafc;font-weight:bold}}
  .winner{{background-color:#fef3c7}}
  .podium{{background-color:#f0f9ff}}
</style>
</head>
<body>
<div class="header">
  <div class="title">Office Olympics - Final Results</div>
  <div class="subtitle">Competition Results</div>
</div>
<table class="results-table">
<thead><tr><th>Position</th><th>Team Name</th><th>Total Time</th><th>Games Completed</th></tr></thead>
<tbody>"#
    )?;

    for standing in standings {
        let class = match standing.position {
            1 => "winner",
            2 | 3 => "podium",
            _ => "",
        };
        writeln!(
            w,
            r#"<tr class="{class}"><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>"#,
            standing.position,
            escape_html(&standing.team),
            standing.total_time,
            standing.games_completed,
        )?;
    }

    writeln!(
        w,
        r#"</tbody>
</table>
<div style="margin-top:40px;text-align:center;color:#64748b">Generated on {generated_on}</div>
</body>
</html>"#
    )
}

fn escape_html(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            other => escaped.push(other),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use time::Month;

    use super::*;

    fn standing(position: usize, team: &str, total_seconds: u64) -> OverallStandingDto {
        OverallStandingDto {
            position,
            team: team.into(),
            total_seconds,
            total_time: crate::state::results::format_clock(total_seconds),
            games_completed: 5,
        }
    }

    #[test]
    fn report_lists_teams_with_podium_classes() {
        let date = Date::from_calendar_date(2025, Month::December, 31).unwrap();
        let page = render_results(
            &[
                standing(1, "Alpha", 290),
                standing(2, "Beta", 305),
                standing(4, "Delta", 400),
            ],
            date,
        );
        assert!(page.contains(r#"<tr class="winner"><td>1</td><td>Alpha</td><td>4:50</td><td>5</td></tr>"#));
        assert!(page.contains(r#"<tr class="podium"><td>2</td><td>Beta</td><td>5:05</td>"#));
        assert!(page.contains(r#"<tr class=""><td>4</td><td>Delta</td>"#));
        assert!(page.contains("Generated on 2025-12-31"));
    }

    #[test]
    fn team_names_are_escaped() {
        let date = Date::from_calendar_date(2025, Month::January, 1).unwrap();
        let page = render_results(&[standing(1, "<R&D>", 60)], date);
        assert!(page.contains("&lt;R&amp;D&gt;"));
        assert!(!page.contains("<R&D>"));
    }
}
