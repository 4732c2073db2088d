use clap::{CommandFactory, Parser};
use clap_complete::{Generator, generate};
use colored::Colorize;
use oxmon::cli::{ArchiveAction, CheckCommand, Cli, Commands, GcmdCommand, TriggerCommand};
use oxmon::output::{self, Verbosity};
use oxmon::tasks::TaskError;
use oxmon::{OxmonContext, commands};
use std::io;
use std::process;
use tracing_subscriber::EnvFilter;

fn main() {
    let cli = Cli::parse();
    let verbosity = Verbosity::from_flags(cli.verbose, cli.quiet);
    output::set_verbosity(verbosity);

    if let Err(e) = run(cli, verbosity) {
        eprintln!("{} {}", "Error:".red().bold(), e);
        process::exit(e.exit_code());
    }
}

fn run(cli: Cli, verbosity: Verbosity) -> Result<(), TaskError> {
    match cli.command {
        Commands::Version => {
            println!("oxmon {}", oxmon::VERSION);
            return Ok(());
        }
        Commands::Completion { shell } => {
            print_completions(shell, &mut Cli::command());
            return Ok(());
        }
        _ => {}
    }

    let ctx = OxmonContext::new(cli.config.as_deref())?;
    init_logging(&ctx, verbosity);
    tracing::debug!(config = %ctx.config_path.display(), "configuration loaded");

    match cli.command {
        Commands::Trigger { trigger } => {
            let notifiers = commands::resolve_notifiers(&ctx, &cli.notifiers)?;
            match trigger {
                TriggerCommand::Fwatch(args) => commands::trigger::fwatch(&ctx, &args, &notifiers),
            }
        }
        Commands::Check { check } => {
            let notifiers = commands::resolve_notifiers(&ctx, &cli.notifiers)?;
            match check {
                CheckCommand::Filestatus(args) => commands::check::filestatus(args, &notifiers),
                CheckCommand::Disk(args) => commands::check::disk(&args, &notifiers),
            }
        }
        Commands::Gcmd { gcmd } => {
            let notifiers = commands::resolve_notifiers(&ctx, &cli.notifiers)?;
            match gcmd {
                GcmdCommand::Raw(args) => commands::gcmd::raw(args, &notifiers),
            }
        }
        Commands::Archive { action } => match action {
            ArchiveAction::List { archive } => commands::archive::list(&archive),
            ArchiveAction::Show {
                archive,
                fingerprint,
            } => commands::archive::show(&archive, &fingerprint),
            ArchiveAction::Verify { archive } => commands::archive::verify(&archive),
        },
        Commands::Version | Commands::Completion { .. } => Ok(()),
    }
}

/// `RUST_LOG` wins; otherwise `-v`/`-q`, then the configured level.
fn init_logging(ctx: &OxmonContext, verbosity: Verbosity) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = verbosity
            .log_directive()
            .unwrap_or(ctx.config.logging.level.as_str());
        EnvFilter::new(level)
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

fn print_completions<G: Generator>(g: G, cmd: &mut clap::Command) {
    generate(g, cmd, cmd.get_name().to_string(), &mut io::stdout());
}
