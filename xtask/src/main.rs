//! xtask for oxmon - build automation and tooling
//!
//! This binary provides development tasks like man page generation.

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "xtask", about = "Build automation for oxmon")]
enum Task {
    /// Generate man pages from clap definitions
    GenerateManPages {
        /// Output directory for man pages (default: ./man)
        #[arg(short, long, default_value = "man")]
        output: PathBuf,
    },
}

fn main() -> Result<()> {
    let task = Task::parse();

    match task {
        Task::GenerateManPages { output } => generate_man_pages(&output)?,
    }

    Ok(())
}

fn generate_man_pages(output_dir: &Path) -> Result<()> {
    println!("Generating man pages...");

    fs::create_dir_all(output_dir)
        .with_context(|| format!("Failed to create directory: {}", output_dir.display()))?;

    let cmd = oxmon::cli::Cli::command();
    let count = render_tree(&cmd, "oxmon", output_dir)?;

    println!(
        "\n{count} man page(s) generated in: {}",
        output_dir.display()
    );
    println!("\nTo view the main page:");
    println!("  man {}/oxmon.1", output_dir.display());

    Ok(())
}

/// Renders `cmd` as `<name>.1`, then every subcommand as `<name>-<sub>.1`.
fn render_tree(cmd: &clap::Command, name: &str, output_dir: &Path) -> Result<usize> {
    let man_path = output_dir.join(format!("{name}.1"));
    let man_file = fs::File::create(&man_path)
        .with_context(|| format!("Failed to create man page: {}", man_path.display()))?;

    clap_mangen::Man::new(cmd.clone().name(name.to_string()))
        .render(&mut std::io::BufWriter::new(man_file))?;
    println!("✓ Generated: {}", man_path.display());

    let mut count = 1;
    for sub in cmd.get_subcommands().filter(|s| s.get_name() != "help") {
        count += render_tree(sub, &format!("{name}-{}", sub.get_name()), output_dir)?;
    }
    Ok(count)
}
