//! HTML report generation with D3.js visualizations
//!
//! The page is a static template. All shaping happens in Rust; the script on
//! the page only draws the embedded payload and swaps between precomputed
//! frames when a control changes.

use super::{json, Report};
use crate::error::Result;
use crate::format;
use std::io::Write;

const PAGE: &str = include_str!("page.html");

pub fn write<W: Write>(writer: &mut W, report: &Report) -> Result<()> {
    let page = render(report)?;
    writer.write_all(page.as_bytes())?;
    Ok(())
}

/// The complete page as a string
pub fn render(report: &Report) -> Result<String> {
    let data = json::script_literal(report)?;

    let (leader, leader_points) = match report.leader() {
        Some(s) => (html_escape(&s.participant), format::integer(s.total_points)),
        None => ("-".to_string(), "-".to_string()),
    };
    let title = format!("Tourpool · stage {}", report.current_stage);

    Ok(PAGE
        .replace("{{TITLE}}", &html_escape(&title))
        .replace("{{CURRENT_STAGE}}", &report.current_stage.to_string())
        .replace("{{PARTICIPANTS}}", &report.wide.heatmap.participants.len().to_string())
        .replace("{{LEADER}}", &leader)
        .replace("{{LEADER_POINTS}}", &leader_points)
        .replace("{{GENERATED}}", &html_escape(&report.generated))
        .replace("{{DATA}}", &data))
}

fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}
