//! JSON report output

use super::Report;
use crate::error::Result;
use std::io::Write;

pub fn write<W: Write>(writer: &mut W, report: &Report) -> Result<()> {
    serde_json::to_writer_pretty(&mut *writer, report)?;
    writeln!(writer)?;
    Ok(())
}

/// Payload as a string that is safe to drop into a `<script>` element
pub fn script_literal(report: &Report) -> Result<String> {
    let json = serde_json::to_string(report)?;
    Ok(json.replace("</", "<\\/"))
}
