use clap::CommandFactory;
use colored::*;
use env_logger::{Builder, Env, Target};
use feedseek::config::Config;
use feedseek::error::{Result as FeedseekResult, SearchError};
use feedseek::output::{format_json, format_text};
use feedseek::{
    load_library, ChannelListener, Cli, Commands, Debouncer, GroupBy, ModelFeeder, OutputFormat,
    Parser, ResultsListModel, SearchEngine, SearchEvent, SearchMetrics,
};
use indicatif::{ProgressBar, ProgressStyle};
use log::info;
use parking_lot::Mutex;
use std::fs;
use std::io::{self, BufRead};
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

fn main() -> FeedseekResult<()> {
    let cli = Cli::parse();
    setup_logging(&cli)?;

    let start_time = Instant::now();
    let config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };

    match &cli.command {
        Commands::Search {
            library,
            query,
            pinned_only,
            group_by,
            format,
            metrics,
        } => {
            let group_by = group_by.unwrap_or(config.search.group_by);
            let pinned_only = *pinned_only || config.search.pinned_only;
            run_search(&config, library, query, pinned_only, group_by, *format, *metrics)?;
        }
        Commands::Interactive {
            library,
            pinned_only,
            group_by,
        } => {
            let group_by = group_by.unwrap_or(config.search.group_by);
            let pinned_only = *pinned_only || config.search.pinned_only;
            run_interactive(&config, library, pinned_only, group_by)?;
        }
        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            clap_complete::generate(*shell, &mut cmd, "feedseek", &mut io::stdout());
        }
    }

    info!(
        "Application finished. Total elapsed time: {:.2?}",
        start_time.elapsed()
    );
    Ok(())
}

fn run_search(
    config: &Config,
    library: &Path,
    query: &str,
    pinned_only: bool,
    group_by: GroupBy,
    format: OutputFormat,
    show_metrics: bool,
) -> FeedseekResult<()> {
    let guides = Arc::new(load_library(library)?);
    let metrics = SearchMetrics::new();
    let engine = SearchEngine::with_options(config.search.engine_options(), metrics.clone());
    let (listener, events) = ChannelListener::channel();
    engine.result().add_listener(listener);
    engine.set_guides_set(guides);

    let pb = ProgressBar::new_spinner().with_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} [{elapsed_precise}] {msg}")
            .map_err(|e| SearchError::Other(e.to_string()))?
            .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"),
    );
    pb.enable_steady_tick(Duration::from_millis(80));
    pb.set_message(format!("Searching for '{query}'..."));

    let start = Instant::now();
    engine.set_search_text(query, pinned_only);

    // This thread owns the model; the worker only talks to it through events.
    let mut model = ResultsListModel::new(group_by);
    for event in events.iter() {
        event.apply(&mut model);
        match event {
            SearchEvent::ItemAdded { .. } => pb.set_message(format!("{} matches", model.len())),
            SearchEvent::Finished { .. } => break,
            SearchEvent::ItemsRemoved => {}
        }
    }
    pb.finish_and_clear();
    let elapsed = start.elapsed();

    let max_items = config.display.max_items_per_group;
    match format {
        OutputFormat::Json => println!("{}", format_json(&model, max_items)?),
        OutputFormat::Text => {
            if model.is_empty() {
                println!("{}", "No matches found".yellow());
            } else {
                print!("{}", format_text(&model, max_items));
            }
            print_summary(config, model.len(), elapsed);
        }
    }

    if show_metrics {
        eprintln!("{}", metrics.gather());
    }
    Ok(())
}

fn run_interactive(
    config: &Config,
    library: &Path,
    pinned_only: bool,
    group_by: GroupBy,
) -> FeedseekResult<()> {
    let guides = Arc::new(load_library(library)?);
    let engine = Arc::new(SearchEngine::with_options(
        config.search.engine_options(),
        SearchMetrics::new(),
    ));
    let model = Arc::new(Mutex::new(ResultsListModel::new(group_by)));
    engine.result().add_listener(ModelFeeder::new(model.clone()));
    engine.set_guides_set(guides);

    println!("{}", "Interactive search. Type a query, empty line to search now,".green());
    println!(
        "{}",
        ":group flat|kind|date to regroup, :quit to exit".dimmed()
    );

    let max_items = config.display.max_items_per_group;
    let debouncer = {
        let engine = engine.clone();
        let model = model.clone();
        let show_summary = config.display.show_summary;
        Debouncer::new(config.search.debounce(), move |text| {
            let start = Instant::now();
            engine.set_search_text(&text, pinned_only);
            engine.wait_idle();
            let model = model.lock();
            print!("{}", format_text(&model, max_items));
            if show_summary {
                println!(
                    "{} {} results for '{}' in {:.2}ms",
                    "Found".green(),
                    model.len(),
                    text.yellow(),
                    start.elapsed().as_secs_f64() * 1000.0
                );
            }
        })
    };

    for line in io::stdin().lock().lines() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed == ":quit" {
            break;
        }
        if let Some(mode) = trimmed.strip_prefix(":group") {
            match <GroupBy as clap::ValueEnum>::from_str(mode.trim(), true) {
                Ok(mode) => {
                    let mut model = model.lock();
                    model.set_group_by(mode);
                    print!("{}", format_text(&model, max_items));
                }
                Err(_) => eprintln!("{}", format!("Unknown grouping '{}'", mode.trim()).red()),
            }
            continue;
        }
        if trimmed.is_empty() {
            debouncer.commit();
        } else {
            debouncer.push(trimmed);
        }
    }

    drop(debouncer);
    Ok(())
}

fn print_summary(config: &Config, total: usize, elapsed: Duration) {
    if !config.display.show_summary {
        return;
    }
    if config.display.show_timing {
        println!(
            "\n{} {} {} {:.2}ms",
            "Found".green(),
            total,
            "results in".green(),
            elapsed.as_secs_f64() * 1000.0
        );
    } else {
        println!("\n{} {} {}", "Found".green(), total, "results".green());
    }
}

fn setup_logging(cli: &Cli) -> FeedseekResult<()> {
    let default_filter = if cli.verbose { "debug" } else { "info" };
    let mut builder = Builder::from_env(Env::default().default_filter_or(default_filter));

    builder.format(|buf, record| {
        use std::io::Write;
        writeln!(
            buf,
            "{} [{}] [{}] {}",
            chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
            record.level(),
            record.module_path().unwrap_or("unknown"),
            record.args()
        )
    });

    if let Some(log_path) = &cli.log {
        if let Some(parent_dir) = log_path.parent() {
            if !parent_dir.as_os_str().is_empty() && !parent_dir.exists() {
                fs::create_dir_all(parent_dir).map_err(SearchError::Io)?;
            }
        }
        let log_file = fs::File::create(log_path).map_err(SearchError::Io)?;
        builder.target(Target::Pipe(Box::new(log_file)));
    } else {
        builder.target(Target::Stderr);
    }

    builder
        .try_init()
        .map_err(|e| SearchError::Other(e.to_string()))?;
    Ok(())
}
