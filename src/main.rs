use std::io::{self, BufRead, Write};
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use portal_notifications::config::Config;
use portal_notifications::infrastructure::http::HttpNotificationApi;
use portal_notifications::infrastructure::observability;
use portal_notifications::services::{
    ActionStatus, ContentSegment, DeleteOutcome, FeedPresenter, LoadOutcome, ManagementPresenter,
};
use portal_notifications::NotificationApi;

#[derive(Parser)]
#[command(name = "portal-notifications", about = "Browse and manage portal notifications")]
struct Cli {
    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the feed, one page at a time
    List {
        #[arg(long, default_value_t = 1)]
        pages: usize,
    },
    /// Show one notification in full
    Show { id: i64 },
    /// Publish a new notification
    Create {
        #[arg(long)]
        title: String,
        #[arg(long)]
        content: String,
    },
    /// Replace the title and content of a notification
    Update {
        id: i64,
        #[arg(long)]
        title: String,
        #[arg(long)]
        content: String,
    },
    /// Delete a notification
    Delete {
        id: i64,
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    observability::init_tracing(cli.verbose)
        .map_err(|e| anyhow::anyhow!("Failed to initialize tracing: {}", e))?;

    let config = Config::from_env().context("Failed to load configuration")?;
    tracing::debug!("Using notifications backend at {}", config.api_base_url);

    let api: Arc<dyn NotificationApi> =
        Arc::new(HttpNotificationApi::new(&config).context("Failed to build HTTP client")?);

    match cli.command {
        Command::List { pages } => list(api, &config, pages).await,
        Command::Show { id } => show(api, &config, id).await,
        Command::Create { title, content } => {
            let mut presenter =
                ManagementPresenter::new(api, config.page_size, config.display_timezone);
            let result = presenter.create(&title, &content).await;
            report(&presenter);
            let record = result.map_err(|e| anyhow::anyhow!(e.user_message()))?;
            println!("id: {}", record.id);
            print_feed(presenter.feed());
            Ok(())
        }
        Command::Update { id, title, content } => {
            let mut presenter =
                ManagementPresenter::new(api, config.page_size, config.display_timezone);
            let result = presenter.update(id, &title, &content).await;
            report(&presenter);
            result.map_err(|e| anyhow::anyhow!(e.user_message()))?;
            print_feed(presenter.feed());
            Ok(())
        }
        Command::Delete { id, yes } => {
            let mut presenter =
                ManagementPresenter::new(api, config.page_size, config.display_timezone);
            let result = presenter.delete(id, |id| yes || confirm_on_stdin(id)).await;
            report(&presenter);
            match result.map_err(|e| anyhow::anyhow!(e.user_message()))? {
                DeleteOutcome::Deleted => print_feed(presenter.feed()),
                DeleteOutcome::Cancelled => println!("Cancelled"),
            }
            Ok(())
        }
    }
}

async fn list(api: Arc<dyn NotificationApi>, config: &Config, pages: usize) -> anyhow::Result<()> {
    let presenter = FeedPresenter::new(api, config.page_size, config.display_timezone);
    presenter.mount().await;

    for _ in 1..pages.max(1) {
        if !presenter.can_load_more() {
            break;
        }
        if presenter.load_more().await == LoadOutcome::Failed {
            break;
        }
    }

    if let Some(error) = presenter.error() {
        anyhow::bail!(error.user_message());
    }

    print_feed(&presenter);
    if presenter.has_more() {
        println!("(more available, use --pages)");
    }
    Ok(())
}

async fn show(api: Arc<dyn NotificationApi>, config: &Config, id: i64) -> anyhow::Result<()> {
    let mut presenter = FeedPresenter::new(api, config.page_size, config.display_timezone);
    presenter.mount().await;

    // Page forward until the record turns up or the feed runs out
    while presenter.select(id).is_none() {
        if let Some(error) = presenter.error() {
            anyhow::bail!(error.user_message());
        }
        if !presenter.can_load_more() {
            anyhow::bail!("Notification {} not found", id);
        }
        presenter.load_more().await;
    }

    if let Some(detail) = presenter.selected() {
        println!("{}", detail.title);
        println!("Posted: {}", detail.created_at);
        if let Some(updated_at) = &detail.updated_at {
            println!("Edited: {}", updated_at);
        }
        println!();
        let body: String = detail
            .content
            .iter()
            .map(|segment| match segment {
                ContentSegment::Text(text) => text.clone(),
                ContentSegment::Link(url) => format!("<{}>", url),
            })
            .collect();
        println!("{}", body);
    }
    Ok(())
}

fn print_feed(presenter: &FeedPresenter) {
    let entries = presenter.entries();
    if entries.is_empty() {
        println!("No notifications");
        return;
    }
    for entry in entries {
        println!("[{}] {}  {}", entry.id, entry.created_at, entry.title);
        println!("     {}", entry.preview);
    }
}

fn report(presenter: &ManagementPresenter) {
    match presenter.action_status() {
        Some(ActionStatus::Succeeded { message, .. }) => println!("{}", message),
        Some(ActionStatus::Failed { action, message }) => {
            eprintln!("Could not {} notification: {}", action, message)
        }
        None => {}
    }
}

fn confirm_on_stdin(id: i64) -> bool {
    print!("Delete notification {}? [y/N] ", id);
    if io::stdout().flush().is_err() {
        return false;
    }
    let mut answer = String::new();
    if io::stdin().lock().read_line(&mut answer).is_err() {
        return false;
    }
    matches!(answer.trim().to_lowercase().as_str(), "y" | "yes")
}
