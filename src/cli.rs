use std::{fmt::Write as _, future::Future, io::Write as _, path::PathBuf, time::Duration};

use clap::{Parser, Subcommand};
use serde::Serialize;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::debug;

use crate::{
    commands,
    core::{
        config::{AppConfig, ConfigOverrides},
        errors::{AppError, AppResult},
        fields::LogicalField,
        types::{Decision, PendingBatchView, View},
    },
    insights::CountEntry,
    workflow::{busy::BusyState, session::VerificationSession},
    AppState,
};

/// Intake desk for NCRP complaint documents.
///
/// Uploads documents for extraction, lets an operator verify the extracted
/// rows, and commits the approved ones.
#[derive(Debug, Parser)]
#[command(name = "ncrp-intake", version, about)]
pub struct Cli {
    /// Backend base address; overrides the one the backend advertises
    #[arg(long, global = true)]
    pub api_base: Option<String>,

    /// Directory holding local state (default: ./.ncrp)
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// Session handle the staged batch is stored under
    #[arg(long, global = true)]
    pub session: Option<String>,

    /// Print results as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Upload documents for extraction, then verify the rows
    Upload {
        files: Vec<PathBuf>,
        /// Stage the rows without opening the verification view
        #[arg(long)]
        no_verify: bool,
    },
    /// Review the staged rows interactively
    Verify,
    /// Print the staged rows
    Pending,
    /// Drop the staged rows
    Clear,
    /// List committed complaints
    Complaints {
        #[arg(long)]
        category: Option<String>,
    },
    /// Dashboard counters and crime type breakdown
    Stats,
    /// Chart series over committed complaints
    Analytics,
    /// Wait until the backend answers
    WaitReady {
        #[arg(long, default_value_t = 30)]
        timeout_secs: u64,
    },
}

pub async fn run(cli: Cli) -> AppResult<()> {
    crate::init_logging(cli.verbose);
    let config = AppConfig::load(ConfigOverrides {
        api_base: cli.api_base,
        data_dir: cli.data_dir,
        session: cli.session,
    })?;
    let mut state = AppState::initialize(config).await?;
    let json = cli.json;

    match cli.command {
        Command::Upload { files, no_verify } => {
            state.connect().await?;
            let staged = interruptible(&state.busy, commands::upload::upload_files(&state, &files)).await?;
            emit(json, &staged, || {
                if staged.row_count == 0 {
                    return "No rows were extracted from the uploaded files.".to_string();
                }
                format!(
                    "Extracted {} rows from {} file(s): {}",
                    staged.row_count,
                    staged.files.len(),
                    staged.files.join(", ")
                )
            })?;
            if staged.navigate_to == View::Verification && !no_verify && !json {
                verify(&state).await?;
            }
        }
        Command::Verify => {
            state.connect().await?;
            verify(&state).await?;
        }
        Command::Pending => match commands::verification::get_pending_batch(&state).await? {
            Some(view) => emit(json, &view, || render_batch(&view))?,
            None => emit(json, &serde_json::Value::Null, || AppError::NoPendingBatch.to_string())?,
        },
        Command::Clear => {
            let cleared = commands::verification::clear_pending(&state).await?;
            emit(json, &cleared, || {
                if cleared.cleared {
                    "Pending batch cleared".to_string()
                } else {
                    "Nothing to clear".to_string()
                }
            })?;
        }
        Command::Complaints { category } => {
            state.connect().await?;
            let listing = commands::complaints::list_complaints(&state, category.as_deref()).await?;
            emit(json, &listing, || {
                let mut out = format!("{} complaint(s)\n", listing.len());
                for entry in &listing {
                    let record = &entry.record;
                    let _ = writeln!(
                        out,
                        "{} | {} | {} | {} | {}",
                        record.id.as_deref().unwrap_or("-"),
                        record.complaint_date.as_deref().unwrap_or("-"),
                        record.cybercrime_type.as_deref().unwrap_or("-"),
                        record.total_amount_loss.as_deref().unwrap_or("-"),
                        entry.file_link.as_deref().unwrap_or("-"),
                    );
                }
                out
            })?;
        }
        Command::Stats => {
            state.connect().await?;
            let stats = commands::complaints::get_stats(&state).await?;
            emit(json, &stats, || {
                let mut out = format!(
                    "Total: {}\nHigh priority: {}\nLast 24h: {}\nMost common: {}\n",
                    stats.stats.total, stats.stats.high_priority, stats.stats.last_24h, stats.stats.most_common_type
                );
                out.push_str(&render_counts("Crime awareness", &stats.crime_awareness));
                out
            })?;
        }
        Command::Analytics => {
            state.connect().await?;
            let summary = commands::complaints::get_analytics(&state).await?;
            emit(json, &summary, || {
                [
                    render_counts("Crime types", &summary.crime_types),
                    render_counts("Platforms", &summary.platforms),
                    render_counts("Case status", &summary.statuses),
                    render_counts("Districts", &summary.districts),
                    render_counts("Monthly trend", &summary.monthly_trend),
                    render_counts("Amount lost", &summary.amount_buckets),
                ]
                .join("\n")
            })?;
        }
        Command::WaitReady { timeout_secs } => {
            state.connect().await?;
            let ready = commands::config::wait_ready(&state, Duration::from_secs(timeout_secs)).await?;
            emit(json, &ready, || format!("Backend ready at {}", ready.api_base))?;
        }
    }
    Ok(())
}

fn emit<T, F>(json: bool, value: &T, human: F) -> AppResult<()>
where
    T: Serialize,
    F: FnOnce() -> String,
{
    if json {
        println!("{}", serde_json::to_string_pretty(value)?);
    } else {
        println!("{}", human().trim_end());
    }
    Ok(())
}

/// Runs `operation`, intercepting Ctrl-C. While something is in flight the
/// first Ctrl-C only prints the leave warning; a second one aborts.
async fn interruptible<F, T>(busy: &BusyState, operation: F) -> AppResult<T>
where
    F: Future<Output = AppResult<T>>,
{
    tokio::pin!(operation);
    let mut warned = false;
    loop {
        tokio::select! {
            result = &mut operation => return result,
            signal = tokio::signal::ctrl_c() => {
                signal?;
                match busy.unload_warning() {
                    Some(warning) if !warned => {
                        eprintln!("{warning} (press Ctrl-C again to leave)");
                        warned = true;
                    }
                    _ => return Err(AppError::Interrupted),
                }
            }
        }
    }
}

const VERIFY_HELP: &str = "commands: show | allow <i> | deny <i> | allow-all | deny-all | \
edit <i> <field> <value...> | submit | clear | quit";

async fn verify(state: &AppState) -> AppResult<()> {
    let mut session = commands::verification::start_verification(state).await?;
    println!("{}", render_batch(&session.view(&state.config.session)));
    println!("{VERIFY_HELP}");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("verify> ");
        std::io::stdout().flush()?;
        let Some(line) = lines.next_line().await? else {
            println!();
            return Ok(());
        };
        let words: Vec<&str> = line.split_whitespace().collect();
        let Some((&command, args)) = words.split_first() else {
            continue;
        };
        debug!(command, "verification input");

        match command {
            "show" => println!("{}", render_batch(&session.view(&state.config.session))),
            "allow" | "deny" => {
                let decision: Decision = command.parse()?;
                let Some(index) = args.first().and_then(|raw| raw.parse::<usize>().ok()) else {
                    println!("usage: {command} <i>");
                    continue;
                };
                if session.decide(index, decision)? {
                    println!("row {index}: {decision} ({} allowed)", session.decisions().allowed_count());
                } else {
                    println!("no row {index}");
                }
            }
            "allow-all" | "deny-all" => {
                let decision = if command == "allow-all" { Decision::Allow } else { Decision::Deny };
                session.decide_all(decision)?;
                println!("all rows: {decision} ({} allowed)", session.decisions().allowed_count());
            }
            "edit" => edit_row(&mut session, args)?,
            "submit" => {
                let outcome = interruptible(
                    &state.busy,
                    commands::verification::submit_verification(state, &mut session),
                )
                .await;
                match outcome {
                    Ok(summary) => {
                        println!("{summary}");
                        if summary.is_partial() {
                            println!("Some rows were not saved; see the reasons above.");
                        }
                        return Ok(());
                    }
                    Err(AppError::NoRowsAllowed) => println!("{}", AppError::NoRowsAllowed),
                    Err(AppError::Interrupted) => return Err(AppError::Interrupted),
                    Err(err) if err.retryable() => {
                        println!("{err}\nRows are unchanged; adjust and submit again.")
                    }
                    Err(err) => return Err(err),
                }
            }
            "clear" => {
                session.clear(&state.pending_store()).await?;
                println!("Pending batch cleared");
                return Ok(());
            }
            "quit" | "exit" => {
                println!("Leaving verification; the batch stays staged.");
                return Ok(());
            }
            _ => println!("{VERIFY_HELP}"),
        }
    }
}

fn edit_row(session: &mut VerificationSession, args: &[&str]) -> AppResult<()> {
    let (Some(index), Some(field)) = (
        args.first().and_then(|raw| raw.parse::<usize>().ok()),
        args.get(1),
    ) else {
        println!("usage: edit <i> <field> <value...>");
        return Ok(());
    };
    let Some(field) = LogicalField::parse(field) else {
        let known: Vec<&str> = LogicalField::ALL
            .iter()
            .map(|field| field.aliases().first().copied().unwrap_or(field.name()))
            .collect();
        println!("unknown field {field}; known fields: {}", known.join(", "));
        return Ok(());
    };
    let value = args.get(2..).map(|rest| rest.join(" ")).unwrap_or_default();
    if session.edit(index, field, value.clone())? {
        println!("row {index}: {} = {value}", field.name());
    } else {
        println!("no row {index}");
    }
    Ok(())
}

fn render_batch(view: &PendingBatchView) -> String {
    let mut out = format!(
        "Session {} | files: {} | {} of {} rows allowed\n",
        view.session,
        view.files.join(", "),
        view.allowed,
        view.rows.len()
    );
    for row in &view.rows {
        let _ = writeln!(out, "[{}] {} {}", row.position, row.label, row.decision.as_str().to_uppercase());
        if let Some(error) = &row.extraction_error {
            let _ = writeln!(out, "    ! extraction failed: {error}");
        }
        for (name, value) in row.fields.iter().filter(|(_, value)| !value.is_empty()) {
            let _ = writeln!(out, "    {name}: {value}");
        }
    }
    out
}

fn render_counts(title: &str, entries: &[CountEntry]) -> String {
    let mut out = format!("{title}:\n");
    for entry in entries {
        let _ = writeln!(out, "  {}: {}", entry.label, entry.count);
    }
    out
}
