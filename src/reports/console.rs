use super::ColorMode;
use crate::Result;
use crate::facts::activity::WEEKDAYS;
use crate::facts::classify::{Status, Trend};
use crate::facts::telemetry::{EditDecisions, TelemetrySummary};
use crate::facts::{ArchivedReport, FleetSnapshot, ToolReport, WeekActivity};
use core::fmt::{self, Write};
use owo_colors::OwoColorize;
use std::collections::{BTreeMap, BTreeSet};
use std::io::{IsTerminal, stdout};
use terminal_size::{Width, terminal_size};

const DEFAULT_TERMINAL_WIDTH: usize = 120;
const TABLE_INDENT: usize = 4;
const COLUMN_GAP: usize = 2;
const MIN_DESCRIPTION_WIDTH: usize = 20;

const KIND_WIDTH: usize = 6;
const STATUS_WIDTH: usize = 8;
const TREND_WIDTH: usize = 6;
const ACTIVITY_WIDTH: usize = 7;
const NUMBER_WIDTH: usize = 7;

/// Render the fleet as a table of active tools followed by the archived ones.
pub fn generate_fleet<W: Write>(fleet: &FleetSnapshot, color: ColorMode, writer: &mut W) -> Result<()> {
    ConsoleReporter::new(writer, color).write_fleet(fleet)
}

/// Render telemetry headline numbers, and edit decisions when available.
pub fn generate_telemetry<W: Write>(summary: &TelemetrySummary, decisions: Option<&EditDecisions>, color: ColorMode, writer: &mut W) -> Result<()> {
    ConsoleReporter::new(writer, color).write_telemetry(summary, decisions)
}

struct ConsoleReporter<'a, W: Write> {
    writer: &'a mut W,
    colors: ColorScheme,
    terminal_width: usize,
}

impl<'a, W: Write> ConsoleReporter<'a, W> {
    fn new(writer: &'a mut W, color_mode: ColorMode) -> Self {
        Self {
            writer,
            colors: ColorScheme::new(color_mode),
            terminal_width: detect_terminal_width(),
        }
    }

    fn write_fleet(&mut self, fleet: &FleetSnapshot) -> Result<()> {
        let name_width = fleet
            .tool_fleet
            .iter()
            .map(|t| t.name.chars().count())
            .chain(fleet.archived.iter().map(|t| t.name.chars().count()))
            .max()
            .unwrap_or(0)
            .max("Tool".len());

        write!(self.writer, "Tool Fleet")?;
        writeln!(self.writer, " (updated {})", fleet.last_updated.format("%Y-%m-%d %H:%M UTC"))?;

        let fixed = TABLE_INDENT + name_width + KIND_WIDTH + STATUS_WIDTH + TREND_WIDTH + ACTIVITY_WIDTH + 3 * NUMBER_WIDTH + 8 * COLUMN_GAP;
        let description_width = self.terminal_width.saturating_sub(fixed).max(MIN_DESCRIPTION_WIDTH);
        let table_width = fixed + description_width;

        self.write_table_header(name_width, table_width)?;
        for tool in &fleet.tool_fleet {
            self.write_tool_row(tool, name_width, description_width)?;
        }

        if fleet.tool_fleet.is_empty() {
            self.colors.write_styled_text(self.writer, "    no tools configured", TextStyle::Dimmed)?;
            writeln!(self.writer)?;
        }

        if !fleet.archived.is_empty() {
            writeln!(self.writer)?;
            self.colors.write_styled_text(self.writer, "Archived", TextStyle::Bold)?;
            writeln!(self.writer)?;
            for tool in &fleet.archived {
                self.write_archived_row(tool, name_width)?;
            }
        }

        Ok(())
    }

    fn write_table_header(&mut self, name_width: usize, table_width: usize) -> Result<()> {
        self.colors.write_styled_line(self.writer, "─", table_width, TextStyle::Dimmed)?;
        writeln!(self.writer)?;

        let header = format!(
            "{:indent$}{:<name_width$}  {:<KIND_WIDTH$}  {:<STATUS_WIDTH$}  {:<TREND_WIDTH$}  {:<ACTIVITY_WIDTH$}  {:>NUMBER_WIDTH$}  {:>NUMBER_WIDTH$}  {:>NUMBER_WIDTH$}  {}",
            "",
            "Tool",
            "Type",
            "Status",
            "Trend",
            "Mon-Fri",
            "Commits",
            "Stars",
            "Users",
            "Description",
            indent = TABLE_INDENT,
        );
        self.colors.write_styled_text(self.writer, &header, TextStyle::Bold)?;
        writeln!(self.writer)?;

        self.colors.write_styled_line(self.writer, "─", table_width, TextStyle::Dimmed)?;
        writeln!(self.writer)?;
        Ok(())
    }

    fn write_tool_row(&mut self, tool: &ToolReport, name_width: usize, description_width: usize) -> Result<()> {
        write!(self.writer, "{:TABLE_INDENT$}{:<name_width$}  {:<KIND_WIDTH$}  ", "", tool.name, tool.kind.to_string())?;
        self.colors.write_status(self.writer, tool.status)?;
        write!(self.writer, "  ")?;
        self.colors.write_trend(self.writer, tool.trend)?;
        write!(self.writer, "  ")?;
        self.colors.write_activity(self.writer, tool.activity)?;
        write!(self.writer, "{:width$}  ", "", width = ACTIVITY_WIDTH - WEEKDAYS)?;

        let stars = tool.stats.as_ref().map_or_else(|| "-".to_string(), |s| s.stars.to_string());
        let users = tool.users.map_or_else(|| "-".to_string(), |u| u.to_string());
        write!(self.writer, "{:>NUMBER_WIDTH$}  {stars:>NUMBER_WIDTH$}  {users:>NUMBER_WIDTH$}  ", tool.recent_commits)?;

        writeln!(self.writer, "{}", truncate(&tool.description, description_width))?;
        Ok(())
    }

    fn write_archived_row(&mut self, tool: &ArchivedReport, name_width: usize) -> Result<()> {
        write!(self.writer, "{:TABLE_INDENT$}{:<name_width$}  {:<KIND_WIDTH$}  ", "", tool.name, tool.kind.to_string())?;
        let archived = format!("{:<STATUS_WIDTH$}", tool.status);
        self.colors.write_styled_text(self.writer, &archived, TextStyle::Dimmed)?;
        writeln!(self.writer, "  since {}  {}", tool.archived_date, tool.description)?;
        Ok(())
    }

    fn write_telemetry(&mut self, summary: &TelemetrySummary, decisions: Option<&EditDecisions>) -> Result<()> {
        self.colors.write_styled_text(self.writer, "Telemetry", TextStyle::Bold)?;
        writeln!(self.writer, " (updated {})", summary.last_updated.format("%Y-%m-%d %H:%M:%S UTC"))?;

        writeln!(self.writer, "  Sessions       : {}", format_number(summary.sessions))?;
        writeln!(self.writer, "  Tokens         : {}", format_number(summary.tokens.total))?;
        self.write_breakdown(&summary.tokens.by_type, format_number)?;
        writeln!(self.writer, "  Cost           : ${:.2}", summary.cost.total)?;
        self.write_breakdown(&summary.cost.by_model, |v| format!("${v:.2}"))?;
        writeln!(
            self.writer,
            "  Lines of code  : +{} / -{}",
            format_number(summary.lines_of_code.added),
            format_number(summary.lines_of_code.removed)
        )?;
        writeln!(self.writer, "  Commits        : {}", format_number(summary.commits))?;
        writeln!(self.writer, "  Pull requests  : {}", format_number(summary.pull_requests))?;
        writeln!(self.writer, "  Active time    : {}", format_duration(summary.active_time_seconds))?;

        if let Some(decisions) = decisions {
            writeln!(self.writer)?;
            self.colors.write_styled_text(self.writer, "Edit decisions", TextStyle::Bold)?;
            writeln!(self.writer)?;

            let tools: BTreeSet<&String> = decisions.accept.keys().chain(decisions.reject.keys()).collect();
            if tools.is_empty() {
                self.colors.write_styled_text(self.writer, "    none recorded", TextStyle::Dimmed)?;
                writeln!(self.writer)?;
            }

            for tool in tools {
                let accepted = decisions.accept.get(tool).copied().unwrap_or(0.0);
                let rejected = decisions.reject.get(tool).copied().unwrap_or(0.0);
                writeln!(
                    self.writer,
                    "    {tool:<14} accepted {:>8}  rejected {:>8}",
                    format_number(accepted),
                    format_number(rejected)
                )?;
            }
        }

        Ok(())
    }

    fn write_breakdown(&mut self, values: &BTreeMap<String, f64>, format: impl Fn(f64) -> String) -> Result<()> {
        for (label, value) in values {
            let line = format!("    {label:<12} {}", format(*value));
            self.colors.write_styled_text(self.writer, &line, TextStyle::Dimmed)?;
            writeln!(self.writer)?;
        }
        Ok(())
    }
}

#[derive(Copy, Clone)]
enum TextStyle {
    Bold,
    Dimmed,
}

struct ColorScheme {
    enabled: bool,
}

impl ColorScheme {
    fn new(color_mode: ColorMode) -> Self {
        let enabled = matches!(color_mode, ColorMode::Always) || (matches!(color_mode, ColorMode::Auto) && stdout().is_terminal());
        Self { enabled }
    }

    fn write_styled_text<W: Write>(&self, writer: &mut W, text: &str, style: TextStyle) -> fmt::Result {
        if !self.enabled {
            return write!(writer, "{text}");
        }
        match style {
            TextStyle::Bold => write!(writer, "{}", text.bold()),
            TextStyle::Dimmed => write!(writer, "{}", text.dimmed()),
        }
    }

    fn write_styled_line<W: Write>(&self, writer: &mut W, ch: &str, width: usize, style: TextStyle) -> fmt::Result {
        self.write_styled_text(writer, &ch.repeat(width), style)
    }

    fn write_status<W: Write>(&self, writer: &mut W, status: Status) -> fmt::Result {
        let text = format!("{:<STATUS_WIDTH$}", status.to_string());
        if !self.enabled {
            return write!(writer, "{text}");
        }
        match status {
            Status::Live => write!(writer, "{}", text.green()),
            Status::Beta => write!(writer, "{}", text.yellow()),
            Status::Maint => write!(writer, "{}", text.dimmed()),
        }
    }

    fn write_trend<W: Write>(&self, writer: &mut W, trend: Trend) -> fmt::Result {
        let text = format!("{:<TREND_WIDTH$}", trend.to_string());
        if !self.enabled {
            return write!(writer, "{text}");
        }
        match trend {
            Trend::Up => write!(writer, "{}", text.green()),
            Trend::Down => write!(writer, "{}", text.red()),
            Trend::Stable | Trend::Flat => write!(writer, "{text}"),
        }
    }

    fn write_activity<W: Write>(&self, writer: &mut W, activity: WeekActivity) -> fmt::Result {
        if !self.enabled {
            return write!(writer, "{activity}");
        }

        let glyphs = activity.to_string();
        for (active, glyph) in activity.days().iter().zip(glyphs.chars()) {
            if *active {
                write!(writer, "{}", glyph.green())?;
            } else {
                write!(writer, "{}", glyph.dimmed())?;
            }
        }
        Ok(())
    }
}

#[expect(clippy::cast_possible_truncation, reason = "Intentional rounding for display")]
fn format_number(value: f64) -> String {
    if value.fract().abs() < f64::EPSILON {
        format!("{}", value.round() as i64)
    } else {
        format!("{value:.2}")
    }
}

#[expect(clippy::cast_possible_truncation, reason = "Intentional rounding for display")]
#[expect(clippy::cast_sign_loss, reason = "Negative durations are clamped to zero")]
fn format_duration(seconds: f64) -> String {
    let total = seconds.max(0.0).round() as u64;
    let (hours, minutes) = (total / 3600, (total % 3600) / 60);
    if hours > 0 {
        format!("{hours}h {minutes}m")
    } else {
        format!("{minutes}m {}s", total % 60)
    }
}

fn truncate(text: &str, max_width: usize) -> String {
    if text.chars().count() <= max_width {
        return text.to_string();
    }

    let mut result: String = text.chars().take(max_width.saturating_sub(1)).collect();
    result.push('…');
    result
}

fn detect_terminal_width() -> usize {
    if stdout().is_terminal() {
        terminal_size().map_or(DEFAULT_TERMINAL_WIDTH, |(Width(w), _)| usize::from(w))
    } else {
        DEFAULT_TERMINAL_WIDTH
    }
}
