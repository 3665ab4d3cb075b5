use anyhow::{Context, Result};
use chrono::Utc;
use console::style;
use dialoguer::{Confirm, Input};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{info, warn};

use crate::HrAssistant;
use crate::config::Config;
use crate::database::Database;
use crate::database::sqlite::models::{DocumentFilter, DocumentType};
use crate::indexer::CoverageStats;
use crate::seed::{SeedOptions, seed_demo};

async fn open_database(config: &Config) -> Result<Database> {
    Database::initialize_from_config_dir(config.get_base_dir())
        .await
        .context("Failed to initialize database")
}

/// Create the demo organization
#[inline]
pub async fn seed(config: &Config, slug: String, name: String, days: u32) -> Result<()> {
    let database = open_database(config).await?;
    let options = SeedOptions {
        slug,
        name,
        days,
        today: Utc::now().date_naive(),
    };

    let summary = seed_demo(&database, &options).await?;

    println!(
        "{}",
        style(format!(
            "✓ Seeded {} ({})",
            summary.organization.name, summary.organization.slug
        ))
        .green()
    );
    println!("  Departments: {}", summary.departments);
    println!("  Employees: {}", summary.employees);
    println!("  Shifts: {}", summary.shifts);
    println!("  Shift allocations: {}", summary.shift_allocations);
    println!("  Attendance records: {}", summary.attendance_records);
    println!();
    println!(
        "Run 'hr-assist reindex --org {}' to embed the new records.",
        summary.organization.slug
    );

    Ok(())
}

/// List organizations in the HR database
#[inline]
pub async fn list_organizations(config: &Config) -> Result<()> {
    let database = open_database(config).await?;
    let organizations = database.list_organizations().await?;

    if organizations.is_empty() {
        println!("No organizations found.");
        println!("Use 'hr-assist seed' to create a demo organization.");
        return Ok(());
    }

    println!("Organizations ({} total):", organizations.len());
    println!();
    for organization in &organizations {
        println!("🏢 {} ({})", organization.name, style(&organization.slug).cyan());
        println!("   ID: {}", organization.id);
        println!(
            "   Created: {}",
            organization.created_at.format("%Y-%m-%d %H:%M:%S")
        );
    }

    Ok(())
}

fn progress_bar() -> Result<ProgressBar> {
    let bar = ProgressBar::new(0);
    bar.set_style(
        ProgressStyle::with_template("{msg:>10} [{bar:40.cyan/blue}] {pos}/{len} ({eta})")?
            .progress_chars("=> "),
    );
    Ok(bar)
}

/// Embed the documents of one organization
#[inline]
pub async fn reindex(
    config: Config,
    organization: &str,
    document_type: Option<DocumentType>,
    stale_only: bool,
) -> Result<()> {
    let assistant = HrAssistant::open(config).await?;
    let filter = DocumentFilter {
        stale_only,
        ..Default::default()
    };

    let bar = progress_bar()?;
    let summary = assistant
        .reindex(organization, document_type, &filter, |progress| {
            if progress.current == 1 {
                bar.reset();
                bar.set_message(progress.document_type.as_str());
            }
            bar.set_length(progress.total);
            bar.set_position(progress.current);
        })
        .await?;
    bar.finish_and_clear();

    info!(
        "Reindex completed: {} succeeded, {} failed",
        summary.success, summary.failed
    );
    println!(
        "{}",
        style(format!(
            "Reindexed {} documents: {} succeeded, {} failed",
            summary.processed(),
            summary.success,
            summary.failed
        ))
        .bold()
    );

    if !summary.failures.is_empty() {
        println!();
        println!("{}", style("Failures:").yellow());
        for failure in &summary.failures {
            println!(
                "  {} {}: {}",
                failure.document_type, failure.document_id, failure.reason
            );
        }
    }

    Ok(())
}

fn print_coverage(stats: &CoverageStats) {
    let percent = format!("{:.1}%", stats.coverage_percent);
    let percent = if stats.is_complete() {
        style(percent).green()
    } else {
        style(percent).yellow()
    };

    println!("📊 {} {}", style(stats.document_type).bold(), percent);
    println!("   Documents: {}", stats.total_documents);
    println!("   Embeddings: {}", stats.total_embeddings);
    println!("   Up to date: {}", stats.up_to_date);
    if stats.needs_indexing > 0 {
        println!("   Needs indexing: {}", stats.needs_indexing);
    }
    if stats.orphaned > 0 {
        println!(
            "   Orphaned: {} (run 'hr-assist purge' to remove)",
            stats.orphaned
        );
    }
    if let Some(last_updated) = stats.last_updated {
        println!(
            "   Last embedded: {}",
            last_updated.format("%Y-%m-%d %H:%M:%S")
        );
    }
}

/// Show embedding coverage per document type
#[inline]
pub async fn show_stats(
    config: Config,
    organization: &str,
    document_type: Option<DocumentType>,
) -> Result<()> {
    let assistant = HrAssistant::open_storage(config).await?;
    let name = assistant.resolve_organization(organization).await?.name;
    let stats = assistant
        .embedding_stats(organization, document_type)
        .await?;

    println!("Embedding coverage for {}:", name);
    println!();
    for stats in &stats {
        print_coverage(stats);
        println!();
    }

    Ok(())
}

/// Delete embeddings whose source records are gone
#[inline]
pub async fn purge(
    config: Config,
    organization: &str,
    document_type: Option<DocumentType>,
) -> Result<()> {
    let assistant = HrAssistant::open_storage(config).await?;
    let purged = assistant.purge_orphans(organization, document_type).await?;

    println!("Purged {} orphaned embeddings.", purged);
    Ok(())
}

/// Drop every embedding so the index can be rebuilt, e.g. after changing
/// the embedding model or its dimension
#[inline]
pub async fn reset(config: Config, yes: bool) -> Result<()> {
    if !yes
        && !Confirm::new()
            .with_prompt("Delete all embeddings of every organization?")
            .default(false)
            .interact()?
    {
        println!("Reset cancelled.");
        return Ok(());
    }

    let dimension = config.indexing.embedding_dimension;
    let (_, cleared) = HrAssistant::open_and_reset(config).await?;

    println!(
        "{}",
        style(format!(
            "✓ Cleared {} embeddings; vector table rebuilt with {} dimensions",
            cleared, dimension
        ))
        .green()
    );
    println!("Run 'hr-assist reindex --org <slug>' for each organization.");
    Ok(())
}

/// Answer one question, or run a REPL when `question` is `None`
#[inline]
pub async fn chat(config: Config, organization: &str, question: Option<String>) -> Result<()> {
    let assistant = HrAssistant::open(config).await?;
    let mut session = assistant.session(organization).await?;

    if let Some(question) = question {
        let answer = session.ask(&question).await?;
        println!("{}", answer);
        return Ok(());
    }

    eprintln!("{}", style("💬 HR Assistant").bold().cyan());
    eprintln!("Type a question, '/clear' to forget the conversation or '/exit' to quit.");
    eprintln!();

    loop {
        let line: String = Input::new()
            .with_prompt("You")
            .allow_empty(true)
            .interact_text()?;
        let line = line.trim();

        match line {
            "" => {}
            "/exit" | "/quit" => break,
            "/clear" => {
                session.clear();
                eprintln!("{}", style("Conversation cleared.").dim());
            }
            question => match session.ask(question).await {
                Ok(answer) => {
                    println!();
                    println!("{}", answer);
                    println!();
                }
                Err(e) => {
                    warn!("Chat request failed: {}", e);
                    eprintln!("{} {}", style("Error:").red(), e);
                }
            },
        }
    }

    Ok(())
}
