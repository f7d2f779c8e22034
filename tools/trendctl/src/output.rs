//! Table and JSON rendering

use clap::ValueEnum;
use colored::*;
use rollout_trends::{
    ComparativeTrendResult, Direction, MetricReport, Period, TrendReport, TrendResult,
};
use serde::Serialize;

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
}

/// Pretty JSON for any serializable result
pub fn to_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<String> {
    Ok(serde_json::to_string_pretty(value)?)
}

fn arrow(direction: Direction) -> ColoredString {
    match direction {
        Direction::Up => "▲ up".green(),
        Direction::Down => "▼ down".red(),
        Direction::Stable => "● stable".yellow(),
    }
}

fn signed(value: f64) -> String {
    if value > 0.0 {
        format!("+{:.2}", value)
    } else {
        format!("{:.2}", value)
    }
}

fn no_data() -> ColoredString {
    "no data".dimmed()
}

pub fn render_period(token: &str, period: Option<&Period>) -> String {
    match period {
        Some(p) => format!(
            "{}\n  start: {}\n  end:   {}\n  days:  {}",
            token.bold(),
            p.start.format(TIME_FORMAT),
            p.end.format(TIME_FORMAT),
            p.days()
        ),
        None => format!("{}: {}", token.bold(), "unknown period".yellow()),
    }
}

/// One-line trend: direction, previous -> current, change
pub fn render_trend(label: &str, trend: &TrendResult) -> String {
    if !trend.has_data {
        return format!("{:<24} {}", label, no_data());
    }
    format!(
        "{:<24} {:<10} {:>12.2} -> {:<12.2} {:>12} ({}%)",
        label,
        arrow(trend.direction),
        trend.previous_value,
        trend.current_value,
        signed(trend.change_value),
        signed(trend.change_percentage)
    )
}

/// One-line comparison of daily rates
pub fn render_comparative(label: &str, result: &ComparativeTrendResult) -> String {
    if !result.has_data {
        return format!("{:<24} {}", label, no_data());
    }
    format!(
        "{:<24} {:<10} {:>10.2}/day vs {:<10.2}/day  total {} vs {}  ({}%)",
        label,
        arrow(result.direction),
        result.current_daily_rate,
        result.previous_daily_rate,
        signed(result.current_total),
        signed(result.previous_total),
        signed(result.change_percentage)
    )
}

fn render_metric(report: &MetricReport) -> String {
    let mut lines = vec![format!("{}", report.metric.bold().underline())];
    lines.push(render_trend("  National", &report.national));
    if let Some(comparative) = &report.national_comparative {
        lines.push(render_comparative("  National (rate)", comparative));
    }
    for row in &report.entities {
        lines.push(render_trend(&format!("    {}", row.entity), &row.trend));
        if let Some(comparative) = &row.comparative {
            lines.push(render_comparative("      rate", comparative));
        }
    }

    let up = report.entities_moving(Direction::Up).count();
    let down = report.entities_moving(Direction::Down).count();
    lines.push(format!(
        "  {} up, {} down of {} entities",
        up.to_string().green(),
        down.to_string().red(),
        report.entities.len()
    ));
    lines.join("\n")
}

pub fn render_report(report: &TrendReport) -> String {
    let window = match &report.window {
        Some(p) => format!(
            "{} .. {}",
            p.start.format(TIME_FORMAT),
            p.end.format(TIME_FORMAT)
        ),
        None => "unresolved".yellow().to_string(),
    };
    let mut sections = vec![format!(
        "{} {} [{}]  generated {}",
        "Trend report".bright_blue().bold(),
        report.period,
        window,
        report.generated_at.format("%Y-%m-%d %H:%M:%S")
    )];
    if report.metrics.is_empty() {
        sections.push("No metrics in feed".dimmed().to_string());
    }
    sections.extend(report.metrics.iter().map(render_metric));
    sections.join("\n\n")
}
