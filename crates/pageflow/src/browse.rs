use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use colored::Colorize;
use pageflow_core::controller::{ControllerEvent, QueryStateController};
use pageflow_core::query::{Filter, QueryState};
use pageflow_core::range::PageToken;
use pageflow_core::view::ViewState;
use prettytable::{Cell, Row};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

use crate::coordinator::{FetchCoordinator, FetchOutcome};
use crate::prelude::{eprintln, println, *};
use crate::transport::HttpTransport;

const COLUMNS: &[(&str, &str)] = &[
    ("firstName", "Firstname"),
    ("lastName", "Lastname"),
    ("age", "Age"),
    ("visits", "Visits"),
    ("progress", "Progress"),
    ("status", "Status"),
];

#[derive(Debug, clap::Args)]
pub struct BrowseOptions {
    /// Endpoint answering paged queries
    #[arg(
        long,
        env = "PAGEFLOW_ENDPOINT",
        default_value = "http://127.0.0.1:3000/users"
    )]
    pub endpoint: String,

    /// Pagination settings file (TOML)
    #[arg(short, long, env = "PAGEFLOW_CONFIG")]
    pub config: Option<PathBuf>,

    /// Initial page size, overrides the settings file
    #[arg(short = 's', long)]
    pub page_size: Option<usize>,

    /// Pages shown on each side of the current page, overrides the settings file
    #[arg(short, long)]
    pub window: Option<usize>,

    /// Per-request timeout in milliseconds
    #[arg(long, env = "PAGEFLOW_TIMEOUT_MS", default_value = "5000")]
    pub timeout_ms: u64,
}

/// A line typed at the browse prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Next,
    Previous,
    First,
    Last,
    /// 1-based page number.
    Page(usize),
    Size(usize),
    Sort(String),
    Filter(String),
    Retry,
    Show,
    Help,
    Quit,
}

pub fn parse_command(line: &str) -> Result<Command, String> {
    let line = line.trim();
    let (name, arg) = match line.split_once(char::is_whitespace) {
        Some((name, arg)) => (name, arg.trim()),
        None => (line, ""),
    };

    let number = |what: &str| {
        arg.parse::<usize>()
            .ok()
            .filter(|&n| n > 0)
            .ok_or_else(|| format!("{what} expects a positive number, got '{arg}'"))
    };

    match name {
        "n" | "next" => Ok(Command::Next),
        "p" | "prev" | "previous" => Ok(Command::Previous),
        "first" => Ok(Command::First),
        "last" => Ok(Command::Last),
        "g" | "page" => number("page").map(Command::Page),
        "size" => number("size").map(Command::Size),
        "sort" if !arg.is_empty() => Ok(Command::Sort(arg.to_string())),
        "sort" => Err("sort expects a column name".to_string()),
        "f" | "filter" => Ok(Command::Filter(arg.to_string())),
        "retry" => Ok(Command::Retry),
        "" | "show" => Ok(Command::Show),
        "h" | "help" => Ok(Command::Help),
        "q" | "quit" | "exit" => Ok(Command::Quit),
        other => Err(format!("unknown command '{other}', type 'help'")),
    }
}

pub async fn run(options: BrowseOptions, global: crate::Global) -> Result<()> {
    let mut config = crate::settings::load_config(options.config.as_deref())?;
    if let Some(page_size) = options.page_size {
        config.initial_page_size = page_size;
    }
    if let Some(window) = options.window {
        config.pagination_window_size = window;
    }
    let window = config.pagination_window_size;

    let transport = HttpTransport::new(
        options.endpoint.clone(),
        Duration::from_millis(options.timeout_ms),
    )?;

    if global.verbose {
        eprintln!("Browsing {}", transport.endpoint());
        eprintln!("Page sizes: {:?}", config.page_size_options);
    }

    let mut controller = QueryStateController::new(config).map_err(|e| eyre!(e))?;
    let coordinator = Arc::new(FetchCoordinator::new(
        controller.store(),
        Arc::new(transport),
    ));

    let (render_tx, mut render_rx) = mpsc::unbounded_channel::<Arc<ViewState>>();
    controller.subscribe(move |event| match event {
        ControllerEvent::Fetch(intent) => {
            let fetch = coordinator.execute(intent);
            let render_tx = render_tx.clone();
            tokio::spawn(async move {
                match fetch.await {
                    Ok(FetchOutcome::Applied(view)) | Ok(FetchOutcome::Failed(view)) => {
                        let _ = render_tx.send(view);
                    }
                    Ok(FetchOutcome::Stale { .. }) => {}
                    Err(err) => log::error!("fetch rejected: {err}"),
                }
            });
        }
        ControllerEvent::PageReset(state) => {
            log::debug!("filter changed, back to page 1 (size {})", state.page_size);
        }
    });

    print_help();
    controller.start();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            Some(view) = render_rx.recv() => {
                println!("{}", render_view(&view, window));
            }
            line = lines.next_line() => {
                let Some(line) = line? else {
                    break; // EOF
                };

                match parse_command(&line) {
                    Ok(Command::Quit) => break,
                    Ok(command) => {
                        if let Err(message) = apply_command(&mut controller, command, window) {
                            eprintln!("{}", message.red());
                        }
                    }
                    Err(message) => eprintln!("{}", message.red()),
                }
            }
        }
    }

    Ok(())
}

fn apply_command(
    controller: &mut QueryStateController,
    command: Command,
    window: usize,
) -> Result<(), String> {
    match command {
        Command::Next => controller.next_page(),
        Command::Previous => controller.previous_page(),
        Command::First => controller.first_page(),
        Command::Last => controller.last_page(),
        Command::Page(page) => controller.go_to_page(page - 1),
        Command::Size(size) => {
            if !controller.config().page_size_options.contains(&size) {
                return Err(format!(
                    "page size must be one of {:?}",
                    controller.config().page_size_options
                ));
            }
            controller.set_page_size(size).map_err(|e| e.to_string())?;
        }
        Command::Sort(field) => {
            if !COLUMNS.iter().any(|(id, _)| *id == field) {
                return Err(format!("unknown column '{field}'"));
            }
            controller.toggle_sort(&field);
        }
        Command::Filter(text) => {
            controller.submit_filter(Filter::from([("q".to_string(), text)]));
        }
        Command::Retry => controller.retry(),
        Command::Show => println!("{}", render_view(&controller.store().snapshot(), window)),
        Command::Help => print_help(),
        Command::Quit => {}
    }
    Ok(())
}

fn print_help() {
    println!(
        "{}",
        "commands: next | prev | first | last | page N | size N | sort COLUMN | filter TEXT | retry | show | quit"
            .dimmed()
    );
}

/// Render the table, status line and pagination strip for one snapshot.
pub fn render_view(view: &ViewState, window: usize) -> String {
    let mut result = String::new();
    let mut table = new_table();

    table.set_titles(Row::new(
        COLUMNS
            .iter()
            .map(|(id, header)| Cell::new(&header_label(&view.query_state, id, header)))
            .collect(),
    ));

    if !view.loading {
        for record in &view.rows {
            table.add_row(Row::new(
                COLUMNS
                    .iter()
                    .map(|(id, _)| {
                        let value = match record.get(*id) {
                            Some(serde_json::Value::String(s)) => s.clone(),
                            Some(value) => value.to_string(),
                            None => String::new(),
                        };
                        Cell::new(&value)
                    })
                    .collect(),
            ));
        }
    }

    result.push_str(&table.to_string());

    if view.loading {
        result.push_str(&format!("{}\n", "Loading...".yellow()));
    } else if view.rows.is_empty() {
        result.push_str(&format!("{}\n", "Not Found...".yellow()));
    }

    if let Some(error) = &view.error {
        result.push_str(&format!("{} {}\n", "error:".red().bold(), error));
    }

    match view.page_range(window) {
        Ok(tokens) => result.push_str(&format!(
            "{}  page {} of {}\n",
            format_strip(&tokens, view.current_page()),
            view.current_page(),
            view.total_pages
        )),
        Err(err) => result.push_str(&format!("{}\n", err.to_string().red())),
    }

    result
}

/// Pagination strip with the current page in brackets, e.g. `1 ... [5] 6 ... 20`.
pub fn format_strip(tokens: &[PageToken], current_page: usize) -> String {
    tokens
        .iter()
        .map(|token| match token {
            PageToken::Number(n) if *n == current_page => format!("[{n}]"),
            token => token.to_string(),
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn header_label(query: &QueryState, id: &str, header: &str) -> String {
    match query.sort_by.iter().find(|rule| rule.field == id) {
        Some(rule) if rule.descending => format!("{header} v"),
        Some(_) => format!("{header} ^"),
        None => header.to_string(),
    }
}
