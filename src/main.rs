use clap::{Parser, Subcommand};
use hr_assist::Result;
use hr_assist::commands::{chat, list_organizations, purge, reindex, reset, seed, show_stats};
use hr_assist::config::{load_default, run_interactive_config, show_config};
use hr_assist::database::sqlite::models::DocumentType;
use hr_assist::seed::{DEMO_NAME, DEMO_SLUG};

#[derive(Parser)]
#[command(name = "hr-assist")]
#[command(about = "Embedding index and retrieval-augmented chat over HR records")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Configure the embedding and chat provider
    Config {
        /// Show current configuration
        #[arg(long)]
        show: bool,
    },
    /// Create a demo organization with employees, shifts and attendance
    Seed {
        #[arg(long, default_value = DEMO_SLUG)]
        slug: String,
        #[arg(long, default_value = DEMO_NAME)]
        name: String,
        /// Days of attendance and shift history to generate
        #[arg(long, default_value_t = 14)]
        days: u32,
    },
    /// List organizations
    Organizations,
    /// Embed HR records of an organization
    Reindex {
        /// Organization slug or ID
        #[arg(long)]
        org: String,
        /// Only this document type: employee, attendance or shift
        #[arg(long = "type")]
        document_type: Option<DocumentType>,
        /// Skip documents whose embedding is up to date
        #[arg(long)]
        stale_only: bool,
    },
    /// Show embedding coverage
    Stats {
        #[arg(long)]
        org: String,
        #[arg(long = "type")]
        document_type: Option<DocumentType>,
    },
    /// Ask questions about an organization
    Chat {
        #[arg(long)]
        org: String,
        /// Answer a single question instead of starting a session
        #[arg(long)]
        question: Option<String>,
    },
    /// Remove embeddings of deleted records
    Purge {
        #[arg(long)]
        org: String,
        #[arg(long = "type")]
        document_type: Option<DocumentType>,
    },
    /// Delete all embeddings and rebuild the vector table
    Reset {
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Config { show } => {
            if show {
                show_config()?;
            } else {
                run_interactive_config()?;
            }
        }
        Commands::Seed { slug, name, days } => {
            seed(&load_default()?, slug, name, days).await?;
        }
        Commands::Organizations => {
            list_organizations(&load_default()?).await?;
        }
        Commands::Reindex {
            org,
            document_type,
            stale_only,
        } => {
            reindex(load_default()?, &org, document_type, stale_only).await?;
        }
        Commands::Stats { org, document_type } => {
            show_stats(load_default()?, &org, document_type).await?;
        }
        Commands::Chat { org, question } => {
            chat(load_default()?, &org, question).await?;
        }
        Commands::Purge { org, document_type } => {
            purge(load_default()?, &org, document_type).await?;
        }
        Commands::Reset { yes } => {
            reset(load_default()?, yes).await?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::error::ErrorKind;

    #[test]
    fn organizations_command() {
        let cli = Cli::try_parse_from(["hr-assist", "organizations"]);
        assert!(cli.is_ok());

        if let Ok(parsed) = cli {
            assert!(matches!(parsed.command, Commands::Organizations));
        }
    }

    #[test]
    fn seed_defaults() {
        let cli = Cli::try_parse_from(["hr-assist", "seed"]).expect("should parse");

        if let Commands::Seed { slug, name, days } = cli.command {
            assert_eq!(slug, "demo-company");
            assert_eq!(name, "Demo Company");
            assert_eq!(days, 14);
        } else {
            panic!("expected seed command");
        }
    }

    #[test]
    fn reindex_with_type_and_stale_only() {
        let cli = Cli::try_parse_from([
            "hr-assist",
            "reindex",
            "--org",
            "demo-company",
            "--type",
            "attendance",
            "--stale-only",
        ])
        .expect("should parse");

        if let Commands::Reindex {
            org,
            document_type,
            stale_only,
        } = cli.command
        {
            assert_eq!(org, "demo-company");
            assert_eq!(document_type, Some(DocumentType::Attendance));
            assert!(stale_only);
        } else {
            panic!("expected reindex command");
        }
    }

    #[test]
    fn unknown_document_type_is_rejected() {
        let cli = Cli::try_parse_from([
            "hr-assist",
            "stats",
            "--org",
            "demo-company",
            "--type",
            "payroll",
        ]);
        assert!(cli.is_err());
    }

    #[test]
    fn reindex_requires_org() {
        let cli = Cli::try_parse_from(["hr-assist", "reindex"]);

        if let Err(err) = cli {
            assert_eq!(err.kind(), ErrorKind::MissingRequiredArgument);
        } else {
            panic!("expected missing --org error");
        }
    }

    #[test]
    fn chat_with_question() {
        let cli = Cli::try_parse_from([
            "hr-assist",
            "chat",
            "--org",
            "demo-company",
            "--question",
            "Siapa saja karyawan di Finance?",
        ])
        .expect("should parse");

        if let Commands::Chat { question, .. } = cli.command {
            assert_eq!(question.as_deref(), Some("Siapa saja karyawan di Finance?"));
        } else {
            panic!("expected chat command");
        }
    }

    #[test]
    fn reset_confirmation_flag() {
        let cli = Cli::try_parse_from(["hr-assist", "reset", "--yes"]).expect("should parse");
        assert!(matches!(cli.command, Commands::Reset { yes: true }));

        let cli = Cli::try_parse_from(["hr-assist", "reset"]).expect("should parse");
        assert!(matches!(cli.command, Commands::Reset { yes: false }));
    }

    #[test]
    fn config_show_flag() {
        let cli = Cli::try_parse_from(["hr-assist", "config", "--show"]).expect("should parse");

        if let Commands::Config { show } = cli.command {
            assert!(show);
        }
    }

    #[test]
    fn invalid_command() {
        let cli = Cli::try_parse_from(["hr-assist", "invalid"]);

        if let Err(err) = cli {
            assert_eq!(err.kind(), ErrorKind::InvalidSubcommand);
        } else {
            panic!("expected an error");
        }
    }
}
