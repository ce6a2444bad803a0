//! CLI surface and interactive menus
//!
//! Two-level interactive selection (book folder, then script folder) ending
//! in either one numbered script or a full run-all, plus a non-interactive
//! `run-all` subcommand for scripted use. The menus are a thin veneer: all
//! hard logic lives in [`crate::exec`], [`crate::status`] and
//! [`crate::report`].

use crate::config::config::PipelineConfig;
use crate::config::types::ScriptDescriptor;
use crate::discovery;
use crate::exec::batch::{self, BatchOutcome, BatchReport};
use crate::exec::runner::{self, RunnerConfig, ScriptRunner};
use crate::report::certificate;
use crate::status::store::StatusStore;
use crate::verdict::status_line::{canonicalize, VerdictIcon};
use anyhow::Result;
use clap::{Parser, Subcommand};
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Config file (default: ./proofgate.json, then ~/.config/proofgate/)
    #[arg(long)]
    config: Option<PathBuf>,
    /// Override paths.books_root from the config
    #[arg(long)]
    books_root: Option<PathBuf>,
    /// Override paths.scripts_root from the config
    #[arg(long)]
    scripts_root: Option<PathBuf>,
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run every script in a folder against one book folder, no menus
    RunAll {
        /// Book folder to check
        book_dir: PathBuf,
        /// Script folder (default: the configured scripts root)
        #[arg(long)]
        scripts: Option<PathBuf>,
    },
}

enum MenuNav {
    Back,
    Quit,
}

pub fn run() -> Result<()> {
    runner::install_interrupt_handler();
    env_logger::init();

    let cli = Cli::parse();
    let config = PipelineConfig::load(cli.config.as_deref())?;
    let script_runner = ScriptRunner::new(RunnerConfig {
        python_bin: config.interpreters.python.clone(),
        shell_bin: config.interpreters.shell.clone(),
    });

    match cli.command {
        Some(Commands::RunAll { book_dir, scripts }) => run_all_command(
            &config,
            &script_runner,
            &book_dir,
            scripts.as_deref(),
            cli.scripts_root.as_deref(),
        ),
        None => folder_menu(
            &config,
            &script_runner,
            cli.books_root.as_deref(),
            cli.scripts_root.as_deref(),
        ),
    }
}

fn run_all_command(
    config: &PipelineConfig,
    runner: &ScriptRunner,
    book_dir: &Path,
    scripts_override: Option<&Path>,
    scripts_root_flag: Option<&Path>,
) -> Result<()> {
    if !book_dir.is_dir() {
        anyhow::bail!("book folder does not exist: {}", book_dir.display());
    }
    let scripts_dir = match scripts_override {
        Some(dir) => dir.to_path_buf(),
        None => config.scripts_root(scripts_root_flag)?,
    };

    let scripts = discovery::list_scripts(&scripts_dir)?;
    if scripts.is_empty() {
        println!(
            "⚠️  No scripts found in 📁 {} (expected .py or .sh).",
            scripts_dir.display()
        );
        return Ok(());
    }

    let report = batch::run_all(runner, &scripts, book_dir, &config.informational);
    print_summary(&report);
    if report.outcome() == BatchOutcome::Clean {
        issue_certificate(book_dir, &report);
    }

    if report.outcome() == BatchOutcome::Failed {
        std::process::exit(1);
    }
    Ok(())
}

fn print_summary(report: &BatchReport) {
    println!("\n--- Summary ---");
    for entry in &report.entries {
        println!("- {}: {}", entry.name, entry.line);
    }
    match report.outcome() {
        BatchOutcome::Clean => println!("\n🎉 All scripts reported clean results."),
        BatchOutcome::NeedsReview => {
            println!("\n⚠️  Some checks suggest opening at least one report.")
        }
        BatchOutcome::Failed => println!("\n❌ One or more scripts failed - see output above."),
    }
}

/// Certificate issuance is best-effort: a clean run stays clean even when
/// no artifact can be produced.
fn issue_certificate(book_dir: &Path, report: &BatchReport) {
    match certificate::issue(book_dir, &report.entries) {
        Ok(path) => println!("🏅 Certificate written to {}", path.display()),
        Err(e) => {
            log::warn!("certificate not produced: {}", e);
            println!("⚠️  Certificate not produced: {}", e);
        }
    }
}

fn clear_terminal() {
    print!("\x1b[2J\x1b[H");
    let _ = io::stdout().flush();
}

/// Prompt on stdout, read one trimmed line. EOF reads as quit so piped
/// input terminates cleanly.
fn prompt(message: &str) -> String {
    print!("{}", message);
    let _ = io::stdout().flush();
    let mut line = String::new();
    match io::stdin().lock().read_line(&mut line) {
        Ok(0) | Err(_) => "q".to_string(),
        Ok(_) => line.trim().to_string(),
    }
}

fn pause(message: &str) {
    let _ = prompt(message);
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Top menu: pick a book folder. `q` quits with exit 0.
fn folder_menu(
    config: &PipelineConfig,
    runner: &ScriptRunner,
    books_root_flag: Option<&Path>,
    scripts_root_flag: Option<&Path>,
) -> Result<()> {
    let books_root = config.books_root(books_root_flag)?;

    loop {
        clear_terminal();
        println!("📚 Choose a book folder:");
        let folders = discovery::find_book_folders(&books_root)?;

        if folders.is_empty() {
            anyhow::bail!(
                "no valid book folders under {} (each must contain at least one .docx)",
                books_root.display()
            );
        }

        for (i, folder) in folders.iter().enumerate() {
            println!("{}. {}", i + 1, display_name(folder));
        }
        println!("\nq  Quit");

        let choice = prompt(&format!("\nSelect a folder (1-{}): ", folders.len()));
        if choice.eq_ignore_ascii_case("q") {
            return Ok(());
        }

        match choice.parse::<usize>() {
            Ok(index) if (1..=folders.len()).contains(&index) => {
                match script_folder_menu(config, runner, scripts_root_flag, &folders[index - 1])? {
                    MenuNav::Back => continue,
                    MenuNav::Quit => return Ok(()),
                }
            }
            Ok(_) => pause("Invalid number. Press Enter to continue..."),
            Err(_) => pause("Invalid input. Press Enter to continue..."),
        }
    }
}

/// Second menu: pick a script folder under the scripts root.
fn script_folder_menu(
    config: &PipelineConfig,
    runner: &ScriptRunner,
    scripts_root_flag: Option<&Path>,
    working_dir: &Path,
) -> Result<MenuNav> {
    let scripts_root = config.scripts_root(scripts_root_flag)?;

    loop {
        clear_terminal();
        println!("📁 Choose a script folder:");
        let folders = discovery::list_script_folders(&scripts_root)?;

        if folders.is_empty() {
            println!(
                "⚠️  No script folders found under {}.",
                scripts_root.display()
            );
            pause("\n⏎  Press Enter to return to the book-folder menu...");
            return Ok(MenuNav::Back);
        }

        for (i, folder) in folders.iter().enumerate() {
            println!("{}. {}", i + 1, display_name(folder));
        }
        println!("\nb  Back to book folders;   q  Quit");

        let choice = prompt(&format!("\nSelect a script folder (1-{}): ", folders.len()));
        if choice.eq_ignore_ascii_case("q") {
            return Ok(MenuNav::Quit);
        }
        if choice.eq_ignore_ascii_case("b") {
            return Ok(MenuNav::Back);
        }

        match choice.parse::<usize>() {
            Ok(index) if (1..=folders.len()).contains(&index) => {
                if let MenuNav::Quit =
                    script_menu(config, runner, working_dir, &folders[index - 1])?
                {
                    return Ok(MenuNav::Quit);
                }
            }
            Ok(_) => pause("Invalid number. Press Enter to continue..."),
            Err(_) => pause("Invalid input. Press Enter to continue..."),
        }
    }
}

/// Third menu: run one script, run all, or show a script's help. Discovery
/// and the status record are refreshed on every visit.
fn script_menu(
    config: &PipelineConfig,
    runner: &ScriptRunner,
    working_dir: &Path,
    scripts_dir: &Path,
) -> Result<MenuNav> {
    loop {
        clear_terminal();
        let scripts = discovery::list_scripts(scripts_dir)?;
        let record = StatusStore::load(working_dir);

        println!("?  Show flags;   b  Back to folder menu;   q  Quit");
        println!(
            "Available scripts for 📂 {} (from 📁 {}):",
            display_name(working_dir),
            display_name(scripts_dir)
        );

        if scripts.is_empty() {
            println!(
                "\n⚠️  No scripts found in 📁 {} (expected .py or .sh).",
                display_name(scripts_dir)
            );
            pause("\n⏎  Press Enter to return to the script-folder menu...");
            return Ok(MenuNav::Back);
        }

        println!("\n0. Run all scripts (sequentially)");
        for (i, script) in scripts.iter().enumerate() {
            let icon = record
                .get(&script.name)
                .map(String::as_str)
                .unwrap_or(VerdictIcon::NotRun.as_str());
            println!("{}. {} {}", i + 1, script.name, icon);
        }

        let choice = prompt(&format!(
            "\nChoose script to run in 📂 {} (0 = all): ",
            display_name(working_dir)
        ));

        if choice.eq_ignore_ascii_case("q") {
            return Ok(MenuNav::Quit);
        }
        if choice.eq_ignore_ascii_case("b") {
            return Ok(MenuNav::Back);
        }
        if choice == "?" {
            help_prompt(runner, &scripts);
            continue;
        }

        match choice.parse::<usize>() {
            Ok(0) => {
                clear_terminal();
                let report = batch::run_all(runner, &scripts, working_dir, &config.informational);
                print_summary(&report);
                if report.outcome() == BatchOutcome::Clean {
                    issue_certificate(working_dir, &report);
                }
                pause("\n⏎  Press Enter to return to the script menu...");
            }
            Ok(index) if (1..=scripts.len()).contains(&index) => {
                clear_terminal();
                run_single(config, runner, working_dir, &scripts[index - 1]);
                pause("\n⏎  Press Enter to return to the script menu...");
            }
            Ok(_) => pause("Invalid number. Press Enter to continue..."),
            Err(_) => pause("Invalid input. Press Enter to continue..."),
        }
    }
}

/// Run one script and persist only its own status entry.
fn run_single(
    config: &PipelineConfig,
    runner: &ScriptRunner,
    working_dir: &Path,
    script: &ScriptDescriptor,
) {
    println!("\n🔁 Running {}...", script.name);
    let result = runner.run(script, working_dir);
    let line = canonicalize(&script.name, result.exit_code, result.status_line.as_deref());
    StatusStore::update(
        working_dir,
        &script.name,
        result.exit_code,
        Some(&line),
        config.informational.contains(&script.name),
    );
    println!("\n{}", line);
}

fn help_prompt(runner: &ScriptRunner, scripts: &[ScriptDescriptor]) {
    let choice = prompt("Which script number to show help for? ");
    match choice.parse::<usize>() {
        Ok(index) if (1..=scripts.len()).contains(&index) => {
            runner.show_help(&scripts[index - 1]);
            pause("\n⏎  Press Enter to continue...");
        }
        Ok(_) => pause("Invalid number. Press Enter to continue..."),
        Err(_) => pause("Invalid input. Press Enter to continue..."),
    }
}
