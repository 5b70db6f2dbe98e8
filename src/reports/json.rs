use crate::Result;
use core::fmt::Write;
use serde::Serialize;

/// Write any report as pretty-printed JSON.
pub fn generate<T: Serialize + ?Sized, W: Write>(report: &T, writer: &mut W) -> Result<()> {
    writeln!(writer, "{}", serde_json::to_string_pretty(report)?)?;
    Ok(())
}
