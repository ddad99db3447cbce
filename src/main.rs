//! Engagement Tracker
//!
//! Command-line front end for the engagement tracker: manages clients,
//! engagements, interactions and users, and reports client health.

use anyhow::Result;
use chrono::Utc;
use clap::Parser;
use engagement_tracker::analytics::{
    ClientMetrics, SortKey, TaskBuckets, compute_client_metrics, compute_user_metrics,
    filter_tasks, sort_metrics, summarize_tasks,
};
use engagement_tracker::cli::export::ExportArgs;
use engagement_tracker::cli::import::ImportArgs;
use engagement_tracker::cli::records::{
    ClientCommand, EngagementCommand, InteractionCommand, ReportCommand, UserCommand,
};
use engagement_tracker::cli::{Cli, Command};
use engagement_tracker::config::{Config, ConfigLoader, ConfigPaths};
use engagement_tracker::db::{Database, MemoryStore};
use engagement_tracker::domain::{NewEngagement, NewInteraction, NewTask};
use engagement_tracker::error::{CoreError, CoreResult};
use engagement_tracker::format::{
    OutputFormat, format_clients_markdown, format_metrics_markdown, format_report_markdown,
    format_summary_markdown, format_task_listing_markdown, format_user_metrics_markdown,
    format_users_markdown, render,
};
use engagement_tracker::interchange::{
    export_collection, import_collection, read_document, write_document,
};
use engagement_tracker::reports::ReportBook;
use engagement_tracker::session::Session;
use engagement_tracker::store::Store;
use engagement_tracker::types::Client;
use serde::Serialize;
use std::fs::OpenOptions;
use std::io::Write;
use std::time::Duration;
use tracing::{Level, debug, info};
use tracing_subscriber::FmtSubscriber;

/// Everything a command needs: the store, who is asking, and output settings.
struct App {
    store: Store<Database>,
    session: Session,
    config: Config,
    format: OutputFormat,
}

impl App {
    /// Client metrics over the records visible to this session, sorted.
    fn scorecard(&self, sort: SortKey) -> Vec<ClientMetrics> {
        let clients = self.store.clients();
        let engagements = self.session.scope_engagements(self.store.engagements());
        let interactions = self.session.scope_interactions(self.store.interactions());
        let mut metrics = compute_client_metrics(&clients, &engagements, &interactions, Utc::now());
        sort_metrics(&mut metrics, sort);
        metrics
    }

    /// Print `value` as JSON, or print `line` in markdown mode.
    fn emit<T: Serialize + ?Sized>(
        &self,
        value: &T,
        line: impl FnOnce(&T) -> String,
    ) -> CoreResult<()> {
        let text = render(value, self.format, line)?;
        println!("{}", text);
        Ok(())
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on --log option
    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    match cli.log.as_str() {
        "0" | "off" => {
            // No logging
        }
        "1" | "stdout" => {
            let subscriber = FmtSubscriber::builder()
                .with_max_level(level)
                .with_writer(std::io::stdout)
                .finish();
            tracing::subscriber::set_global_default(subscriber)?;
        }
        "2" | "stderr" => {
            let subscriber = FmtSubscriber::builder()
                .with_max_level(level)
                .with_writer(std::io::stderr)
                .finish();
            tracing::subscriber::set_global_default(subscriber)?;
        }
        filename => {
            // Log to file (append mode)
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(filename)?;
            let subscriber = FmtSubscriber::builder()
                .with_max_level(level)
                .with_writer(file)
                .with_ansi(false)
                .finish();
            tracing::subscriber::set_global_default(subscriber)?;
        }
    }

    let paths = ConfigPaths::discover().with_explicit_file(cli.config.clone());
    let mut config = ConfigLoader::load_with_paths(paths)?.into_config();
    if let Some(db_path) = &cli.database {
        config.store.db_path = db_path.clone();
    }

    let db = Database::open(&config.store.db_path)?;
    info!(db = %config.store.db_path.display(), "opened database");

    let store = Store::new(db);
    let session = Session::new(cli.user.clone(), cli.manager).resolve_user(&store.users());
    let app = App {
        store,
        session,
        format: cli.format.unwrap_or(config.output.format),
        config,
    };

    if let Err(e) = run(&app, cli.command).await {
        eprintln!(
            "{}",
            serde_json::to_string_pretty(&e).unwrap_or_else(|_| e.to_string())
        );
        std::process::exit(1);
    }
    Ok(())
}

async fn run(app: &App, command: Command) -> CoreResult<()> {
    match command {
        Command::Metrics { sort } => {
            let metrics = app.scorecard(sort.unwrap_or(app.config.analytics.default_sort));
            app.emit(&metrics, |m| format_metrics_markdown(m))
        }
        Command::Users => {
            let users = app.store.users();
            let engagements = app.session.scope_engagements(app.store.engagements());
            let interactions = app.session.scope_interactions(app.store.interactions());
            let metrics = compute_user_metrics(&users, &engagements, &interactions);
            app.emit(&metrics, |m| format_user_metrics_markdown(m))
        }
        Command::Summary { filter } => {
            let engagements = app.session.scope_engagements(app.store.engagements());
            match filter {
                Some(filter) => {
                    let listings = filter_tasks(&engagements, filter);
                    app.emit(&listings, |l| format_task_listing_markdown(l))
                }
                None => app.emit(&summarize_tasks(&engagements), format_summary_markdown),
            }
        }
        Command::Watch { interval, sort } => run_watch(app, interval, sort).await,
        Command::Import(args) => run_import(app, args),
        Command::Export(args) => run_export(app, args),
        Command::Client(cmd) => run_client(app, cmd),
        Command::Engagement(cmd) => run_engagement(app, cmd),
        Command::Interaction(cmd) => run_interaction(app, cmd),
        Command::User(cmd) => run_user(app, cmd),
        Command::Report(cmd) => run_report(app, cmd),
    }
}

/// Recompute and print the scorecard every interval until Ctrl-C.
async fn run_watch(app: &App, interval: Option<u64>, sort: Option<SortKey>) -> CoreResult<()> {
    let secs = interval
        .unwrap_or(app.config.analytics.refresh_interval_secs)
        .max(1);
    let sort = sort.unwrap_or(app.config.analytics.default_sort);
    let mut ticker = tokio::time::interval(Duration::from_secs(secs));
    info!(interval_secs = secs, sort = sort.as_str(), "watching client health");

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let metrics = app.scorecard(sort);
                debug!(clients = metrics.len(), "recomputed scorecard");
                app.emit(&metrics, |m| format_metrics_markdown(m))?;
            }
            _ = tokio::signal::ctrl_c() => {
                info!("watch stopped");
                return Ok(());
            }
        }
    }
}

/// Run the import command
fn run_import(app: &App, args: ImportArgs) -> CoreResult<()> {
    info!(
        collection = %args.collection,
        file = %args.file.display(),
        mode = args.import_mode(),
        gzipped = args.is_gzipped(),
        "importing"
    );
    let raw = read_document(&args.file)?;

    let outcome = if args.dry_run {
        // Import into a scratch copy so new-client counts are accurate.
        let scratch = Store::new(MemoryStore::new());
        scratch.save_clients(&app.store.clients())?;
        import_collection(&scratch, args.collection, &raw)?
    } else {
        import_collection(&app.store, args.collection, &raw)?
    };

    app.emit(&outcome, |o| {
        let mut line = o.message.clone();
        if args.dry_run {
            line.push_str(" (dry run, nothing written)");
        }
        for w in &o.warnings {
            line.push_str(&format!("\n- warning: {}", w));
        }
        line
    })
}

/// Run the export command
fn run_export(app: &App, args: ExportArgs) -> CoreResult<()> {
    let json_output = export_collection(&app.store, args.collection)?;
    let should_compress = args.should_compress(Some(json_output.len() as u64));

    match args.output {
        Some(ref path) => {
            write_document(path, &json_output, should_compress)?;
            if should_compress {
                eprintln!("Exported {} to {} (gzipped)", args.collection, path.display());
            } else {
                eprintln!("Exported {} to {}", args.collection, path.display());
            }
        }
        None if should_compress => {
            let stdout = std::io::stdout();
            let mut encoder =
                flate2::write::GzEncoder::new(stdout.lock(), flate2::Compression::default());
            encoder
                .write_all(json_output.as_bytes())
                .map_err(CoreError::storage)?;
            encoder.finish().map_err(CoreError::storage)?;
        }
        None => println!("{}", json_output),
    }
    Ok(())
}

fn run_client(app: &App, cmd: ClientCommand) -> CoreResult<()> {
    let store = &app.store;
    match cmd {
        ClientCommand::Ensure { name, contact } => {
            let id = store.ensure_client(&name, contact.as_deref())?;
            app.emit(&serde_json::json!({ "id": &id, "name": &name }), |_| id.clone())
        }
        ClientCommand::Rename { old_name, new_name } => {
            let existing = store
                .clients()
                .get(&old_name)
                .cloned()
                .ok_or_else(|| CoreError::client_not_found(&old_name))?;
            let renamed = Client {
                name: new_name.clone(),
                ..existing
            };
            let outcome = store.rename_client(&old_name, renamed)?;
            app.emit(&outcome, |o| {
                format!(
                    "Renamed {} to {} ({} engagement(s), {} interaction(s) updated)",
                    old_name, new_name, o.engagements, o.interactions
                )
            })
        }
        ClientCommand::Update {
            name,
            contact,
            notes,
        } => {
            let mut client = store
                .clients()
                .get(&name)
                .cloned()
                .ok_or_else(|| CoreError::client_not_found(&name))?;
            if contact.is_some() {
                client.primary_contact = contact;
            }
            if notes.is_some() {
                client.notes = notes;
            }
            let saved = store.save_client(client)?;
            app.emit(&saved, |c| format!("Updated client {}", c.name))
        }
        ClientCommand::Delete { name } => {
            let removed = store.delete_client(&name)?;
            app.emit(&removed, |c| format!("Deleted client {}", c.name))
        }
        ClientCommand::List => {
            let clients = store.clients();
            app.emit(clients.as_slice(), format_clients_markdown)
        }
    }
}

fn run_engagement(app: &App, cmd: EngagementCommand) -> CoreResult<()> {
    let store = &app.store;
    match cmd {
        EngagementCommand::Create {
            name,
            client,
            description,
        } => {
            let engagement = store.create_engagement(NewEngagement {
                name,
                description,
                client_name: client,
                owner_user_id: app.session.owner(),
            })?;
            app.emit(&engagement, |e| format!("Created engagement {} `{}`", e.name, e.id))
        }
        EngagementCommand::Delete { id } => {
            let removed = store.delete_engagement(&id)?;
            app.emit(&removed, |e| format!("Deleted engagement {}", e.name))
        }
        EngagementCommand::AddTask {
            engagement_id,
            title,
            description,
            due,
        } => {
            let task = store.add_task(
                &engagement_id,
                NewTask {
                    title,
                    description,
                    due_date: due,
                },
            )?;
            app.emit(&task, |t| format!("Added task {} `{}`", t.title, t.id))
        }
        EngagementCommand::SetTaskStatus {
            engagement_id,
            task_id,
            status,
        } => {
            let task = store.update_task_status(&engagement_id, &task_id, status)?;
            app.emit(&task, |t| format!("Task {} is now {}", t.title, t.status))
        }
        EngagementCommand::DeleteTask {
            engagement_id,
            task_id,
        } => {
            let removed = store.delete_task(&engagement_id, &task_id)?;
            app.emit(&removed, |t| format!("Deleted task {}", t.title))
        }
    }
}

fn run_interaction(app: &App, cmd: InteractionCommand) -> CoreResult<()> {
    let store = &app.store;
    match cmd {
        InteractionCommand::Create {
            client,
            contact,
            interaction_type,
            date,
            notes,
            status,
        } => {
            let mut input = NewInteraction::new(client, contact);
            input.interaction_type = interaction_type;
            input.date = date;
            input.notes = notes;
            input.status = status;
            input.owner_user_id = app.session.owner();
            let interaction = store.create_interaction(input)?;
            app.emit(&interaction, |i| {
                format!(
                    "Logged {} with {} `{}`",
                    i.interaction_type, i.client_name, i.id
                )
            })
        }
        InteractionCommand::SetStatus { id, status } => {
            let interaction = store.update_interaction_status(&id, status)?;
            app.emit(&interaction, |i| format!("Interaction {} is now {}", i.id, i.status))
        }
        InteractionCommand::Delete { id } => {
            let removed = store.delete_interaction(&id)?;
            app.emit(&removed, |i| format!("Deleted interaction {}", i.id))
        }
    }
}

fn run_user(app: &App, cmd: UserCommand) -> CoreResult<()> {
    let store = &app.store;
    match cmd {
        UserCommand::Add {
            first_name,
            last_name,
        } => {
            let user = store.add_user(&first_name, &last_name)?;
            app.emit(&user, |u| {
                format!("Added {} `{}` ({})", u.display_name(), u.id, u.external_id)
            })
        }
        UserCommand::Remove { id } => {
            let removed = store.remove_user(&id)?;
            app.emit(&removed, |u| format!("Removed {}", u.display_name()))
        }
        UserCommand::List => {
            let users = store.users();
            app.emit(users.as_slice(), format_users_markdown)
        }
    }
}

fn run_report(app: &App, cmd: ReportCommand) -> CoreResult<()> {
    match cmd {
        ReportCommand::Engagement { publish } => {
            let metrics = app.scorecard(app.config.analytics.default_sort);
            let engagements = app.session.scope_engagements(app.store.engagements());
            let buckets = TaskBuckets::from_engagements(&engagements);

            let mut book = ReportBook::new();
            let id = book
                .generate_engagement_report(&metrics, &buckets, Utc::now())
                .id
                .clone();
            let report = if publish {
                book.publish(&id)?
            } else {
                book.get(&id)
                    .ok_or_else(|| CoreError::report_not_found(&id))?
            };
            app.emit(report, format_report_markdown)
        }
    }
}
