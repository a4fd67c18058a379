//! # sheetpivot-cli
//!
//! Command-line interface for sheetpivot.

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use sheetpivot_core::formula::SkipReason;
use sheetpivot_core::{run, InsertOutcome, PivotOutcome, RunReport, WorkflowConfig};
use sheetpivot_sheet::Book;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// sheetpivot - enrich an aging sheet and add a pivot summary
#[derive(Parser)]
#[command(name = "sheetpivot")]
#[command(author, version, about = "Derive bucket columns and add a pivot table to an Excel file", long_about = None)]
struct Cli {
    /// Excel file to process
    #[arg(value_name = "FILE")]
    file: Option<PathBuf>,

    /// Workflow configuration (JSON)
    #[arg(short = 'c', long = "config", value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Where to save the result (defaults to FILE)
    #[arg(short = 'o', long = "output", value_name = "OUTPUT")]
    output: Option<PathBuf>,

    /// Print the effective configuration as JSON and exit
    #[arg(long = "print-config")]
    print_config: bool,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logging
    if cli.verbose {
        tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
            )
            .init();
    }

    match execute(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {e:#}", "Error:".red().bold());
            ExitCode::FAILURE
        }
    }
}

fn execute(cli: &Cli) -> Result<()> {
    let config = load_config(cli.config.as_deref())?;

    if cli.print_config {
        println!("{}", config.to_json_pretty()?);
        return Ok(());
    }

    let Some(file) = cli.file.as_deref() else {
        // No file - show the hint and help
        println!("{}", "请将 Excel 文件拖到此程序上运行。".yellow());
        println!("{}", "(Drag an Excel file onto this program to run it.)".dimmed());
        Cli::parse_from(["sheetpivot", "--help"]);
        return Ok(());
    };

    let mut book =
        Book::open(file).with_context(|| format!("无法打开文件: {}", file.display()))?;

    let report = run(&mut book, &config)?;
    for line in render_report(&report) {
        println!("{line}");
    }

    let output = cli.output.as_deref().unwrap_or(file);
    book.save_as(output)
        .with_context(|| format!("Failed to save file: {}", output.display()))?;
    info!(path = %output.display(), "saved workbook");

    println!("{}", "Excel 处理完成".green().bold());
    Ok(())
}

fn load_config(path: Option<&Path>) -> Result<WorkflowConfig> {
    match path {
        Some(path) => WorkflowConfig::load(path)
            .with_context(|| format!("Failed to load config: {}", path.display())),
        None => Ok(WorkflowConfig::default()),
    }
}

/// Console lines for a finished run, in step order.
fn render_report(report: &RunReport) -> Vec<String> {
    let mut lines = Vec::new();

    for filled in &report.normalized.filled {
        lines.push(format!(
            "第{}列，第一行为空格，已赋值为: {}",
            filled.column, filled.value
        ));
    }

    match &report.insert {
        InsertOutcome::Inserted(insert) => {
            for header in &insert.overwritten {
                lines.push(format!(
                    "{} 第{}列原有表头 '{}' 已被覆盖",
                    "Warning:".yellow().bold(),
                    header.column,
                    header.previous
                ));
            }
            lines.push("列拼接和填充完成！".to_string());
        }
        InsertOutcome::AnchorNotFound(name) => {
            lines.push(format!("{} 未找到列 '{name}'", "Warning:".yellow().bold()));
        }
    }

    for skipped in &report.synthesis.skipped {
        let target = &skipped.target;
        let message = match &skipped.reason {
            SkipReason::TargetNotFound => format!("未找到目标列 '{target}'"),
            SkipReason::SourceNotFound(source) => {
                format!("未找到源列 '{source}'，目标列 '{target}' 未填充")
            }
            SkipReason::NoSources => format!("目标列 '{target}' 没有指定源列"),
        };
        lines.push(format!("{} {message}", "Warning:".yellow().bold()));
    }

    if report.pivot_sheet.created {
        lines.push(format!("新建{}表成功!", report.pivot_sheet.name));
    }
    lines.push(format!("数据范围为: {}", report.data_range));

    if let PivotOutcome::Rejected(reason) = &report.pivot {
        lines.push(format!("{} {reason}", "Error:".red().bold()));
    }

    lines
}
