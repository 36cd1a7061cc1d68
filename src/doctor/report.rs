//! Console rendering for the diagnostic run: step banners while checks
//! execute, then the end-of-run summary.

use super::Report;
use super::checks::CheckResult;
use console::style;

const RULE_WIDTH: usize = 62;

pub(crate) fn print_header() {
    let rule = "═".repeat(RULE_WIDTH);
    println!();
    println!("{}", style(&rule).blue());
    println!(
        "  {}",
        style("botmend  ·  bot wiring diagnostic").white().bold()
    );
    println!("  {}", chrono::Local::now().format("%Y-%m-%d %H:%M:%S"));
    println!("{}", style(&rule).blue());
}

pub(crate) fn print_step(current: u8, total: u8, title: &str) {
    println!();
    println!(
        "  {} {}",
        style(format!("[{current}/{total}]")).cyan().bold(),
        style(title).white().bold()
    );
}

pub(crate) fn print_check(result: &CheckResult) {
    if result.success {
        match &result.detail {
            Some(detail) => println!("  ✅ {detail}"),
            None => println!("  ✅ ok"),
        }
    } else {
        for issue in &result.issues {
            println!("  ❌ {}", style(issue).red());
        }
        if result.issues.is_empty() {
            if let Some(detail) = &result.detail {
                println!("  ❌ {detail}");
            }
        }
    }
    // Non-fatal findings on an otherwise-passing check still get shown.
    if result.success {
        for issue in &result.issues {
            println!("  ⚠️  {}", style(issue).yellow());
        }
    }
}

pub(crate) fn print_note(text: &str) {
    println!("  ℹ️  {text}");
}

pub(crate) fn print_skip(reason: &str) {
    println!("  {} skipped: {reason}", style("—").dim());
}

pub(crate) fn print_fatal(text: &str) {
    println!("  {} {}", style("✗").red().bold(), style(text).red());
}

pub(crate) fn render_summary(report: &Report) {
    let rule = "═".repeat(RULE_WIDTH);
    println!();
    println!("{}", style(&rule).blue());
    println!("  {}", style("SUMMARY").white().bold());
    println!("{}", style(&rule).blue());
    println!();

    for (name, ok) in &report.statuses {
        let marker = if *ok {
            style("✓").green()
        } else {
            style("✗").red()
        };
        println!("  {marker} {name}");
    }

    if report.issues.is_empty() {
        println!();
        println!(
            "  {}",
            style("No issues found. The wiring looks healthy.").green()
        );
    } else {
        println!();
        println!("  {}", style("Issues found:").yellow().bold());
        for issue in &report.issues {
            println!("  • {issue}");
        }
    }

    if !report.fixes_applied.is_empty() {
        println!();
        println!("  {}", style("Fixes applied:").green().bold());
        for fix in &report.fixes_applied {
            println!("  • {fix}");
        }
    }

    if !report.suggestions.is_empty() {
        println!();
        println!("  {}", style("Recommended actions:").cyan().bold());
        for (n, suggestion) in report.suggestions.iter().enumerate() {
            println!("  {}. {}", n + 1, style(&suggestion.title).bold());
            for line in &suggestion.lines {
                println!("     {line}");
            }
        }
    }

    println!();
}
