use std::time::Instant;

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser, Subcommand};
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use shelf_app::books::models::BookId;
use shelf_kernel::settings::TelemetrySettings;

mod api;
mod app;
mod render;

use api::{BookApi, HttpBookApi};
use app::{CatalogApp, SubmitOutcome};

#[derive(Parser, Debug)]
#[command(name = "shelf", version, about = "Terminal client for the library catalog")]
struct CliArgs {
    /// Base URL of the books collection.
    #[arg(
        long,
        env = "SHELF_API_URL",
        default_value = "http://localhost:8080/api/books"
    )]
    api_url: String,

    /// Log filter used when RUST_LOG is not set.
    #[arg(long, default_value = "warn")]
    log_level: String,
}

#[derive(Parser)]
#[command(name = "")]
struct InnerCli {
    #[command(subcommand)]
    command: InnerCommand,
}

#[derive(Subcommand)]
enum InnerCommand {
    /// Shows the cached book list.
    List,

    /// Fetches the book list again from the server.
    Refresh,

    /// Opens the form for a new book.
    Add,

    /// Opens the form pre-filled with the given book.
    Edit { id: BookId },

    /// Deletes the given book after confirmation.
    Delete { id: BookId },

    /// Fetches a single book from the server.
    Show { id: BookId },

    /// Close this program.
    #[command(alias = "quit")]
    Exit,
}

enum CommandExecutionResult {
    Ok,
    Exit,
}

const PROMPT: &str = ">> ";

/// Ask a yes/no question; anything but `y`/`yes` counts as no.
fn confirm(rl: &mut DefaultEditor, question: &str) -> Result<bool> {
    match rl.readline(&format!("{} [y/N] ", question)) {
        Ok(answer) => Ok(matches!(answer.trim().to_lowercase().as_str(), "y" | "yes")),
        Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => Ok(false),
        Err(e) => Err(e.into()),
    }
}

/// Prompt for one form field, starting from its current value.
/// Returns `None` when the user interrupts.
fn read_field(rl: &mut DefaultEditor, label: &str, current: &str) -> Result<Option<String>> {
    match rl.readline_with_initial(&format!("{}: ", label), (current, "")) {
        Ok(value) => Ok(Some(value)),
        Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Drive the open form until it is saved or abandoned.
async fn run_form<A: BookApi>(app: &mut CatalogApp<A>, rl: &mut DefaultEditor) -> Result<()> {
    println!("(Ctrl-C cancels)");
    loop {
        print!("{}", render::screen(app));

        let Some(form) = app.form_mut() else {
            return Ok(());
        };
        let current = [
            ("Title", form.title.clone()),
            ("Author", form.author.clone()),
            ("Description", form.description.clone()),
        ];

        let mut values = Vec::with_capacity(current.len());
        for (label, value) in &current {
            match read_field(rl, label, value)? {
                Some(value) => values.push(value),
                None => {
                    app.cancel_form();
                    println!("Cancelled.");
                    return Ok(());
                }
            }
        }

        if let (Some(form), [title, author, description]) = (app.form_mut(), values.as_slice()) {
            form.title = title.clone();
            form.author = author.clone();
            form.description = description.clone();
        }

        match app.submit_form(Instant::now()).await {
            SubmitOutcome::Saved | SubmitOutcome::Ignored => {
                print!("{}", render::screen(app));
                return Ok(());
            }
            SubmitOutcome::Invalid => continue,
            SubmitOutcome::Failed => {
                if let Some(message) = app.error() {
                    eprintln!("Error: {}", message);
                }
                if !confirm(rl, "Try again?")? {
                    app.cancel_form();
                    return Ok(());
                }
            }
        }
    }
}

async fn execute_command<A: BookApi>(
    line: &str,
    app: &mut CatalogApp<A>,
    rl: &mut DefaultEditor,
) -> Result<CommandExecutionResult> {
    if line.trim().is_empty() {
        return Ok(CommandExecutionResult::Ok);
    }

    let args =
        shlex::split(line).unwrap_or_else(|| line.split_whitespace().map(String::from).collect());
    let argv = std::iter::once(" ").chain(args.iter().map(String::as_str));
    let cli = match InnerCli::try_parse_from(argv) {
        Ok(cli) => cli,
        Err(e) => {
            if e.print().is_err() {
                println!("{}", e);
            }
            return Ok(CommandExecutionResult::Ok);
        }
    };

    app.tick(Instant::now());
    match cli.command {
        InnerCommand::List => print!("{}", render::screen(app)),
        InnerCommand::Refresh => {
            app.fetch_books().await;
            print!("{}", render::screen(app));
        }
        InnerCommand::Add => {
            app.open_create_form();
            run_form(app, rl).await?;
        }
        InnerCommand::Edit { id } => {
            if app.open_edit_form(id) {
                run_form(app, rl).await?;
            } else {
                eprintln!("Error: no book with id {} in the list, try `refresh`.", id);
            }
        }
        InnerCommand::Delete { id } => match app.delete_prompt(id) {
            Some(question) => {
                let confirmed = confirm(rl, &question)?;
                app.delete_book(id, confirmed, Instant::now()).await;
                print!("{}", render::screen(app));
            }
            None => eprintln!("Error: no book with id {} in the list, try `refresh`.", id),
        },
        InnerCommand::Show { id } => match app.show_book(id).await {
            Ok(book) => print!("{}", render::card(&book)),
            Err(e) => eprintln!("Error: {}", e),
        },
        InnerCommand::Exit => return Ok(CommandExecutionResult::Exit),
    }
    Ok(CommandExecutionResult::Ok)
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli_args = CliArgs::parse();

    shelf_telemetry::init(&TelemetrySettings {
        log_level: cli_args.log_level.clone(),
        ..Default::default()
    })?;

    let api = HttpBookApi::new(cli_args.api_url);
    tracing::debug!(url = api.base_url(), "using books API");

    let mut app = CatalogApp::new(api);
    app.mount().await;

    InnerCli::command().print_long_help()?;
    println!();
    print!("{}", render::screen(&app));

    let mut rl = DefaultEditor::new().context("failed to start line editor")?;
    loop {
        match rl.readline(PROMPT) {
            Ok(line) => {
                let _ = rl.add_history_entry(line.as_str());
                match execute_command(&line, &mut app, &mut rl).await {
                    Ok(CommandExecutionResult::Ok) => {}
                    Ok(CommandExecutionResult::Exit) => break,
                    Err(e) => eprintln!("Error: {:#}", e),
                }
            }
            Err(ReadlineError::Interrupted) => {
                println!("CTRL-C");
                break;
            }
            Err(ReadlineError::Eof) => {
                println!("CTRL-D: exiting.");
                break;
            }
            Err(e) => {
                println!("Error: {:?}", e);
                break;
            }
        }
    }
    Ok(())
}
