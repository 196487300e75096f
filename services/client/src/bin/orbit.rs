//! services/client/src/bin/orbit.rs

use bytes::Bytes;
use clap::{Parser, Subcommand};
use client_lib::{
    app::{self, gamification, insights, opportunities, profile, session, tracker, AppState},
    app::state::BACKGROUND_FLUSH_TIMEOUT,
    config::Config,
    error::ClientError,
    view,
};
use futures::future::join_all;
use orbit_core::domain::{ApplicationStatus, OpportunityType, ProfileData};
use orbit_core::ports::PortError;
use orbit_core::scope::ViewScope;
use orbit_core::view::{Modal, Tab, ViewState};
use std::path::{Path, PathBuf};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{debug, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "orbit")]
#[command(about = "Find opportunities and check your eligibility", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Log in and remember the session.
    Login {
        email: String,
        #[arg(long)]
        password: Option<String>,
    },
    /// Create an account.
    Register {
        email: String,
        name: String,
        #[arg(long)]
        password: Option<String>,
    },
    Logout,
    #[command(subcommand)]
    Profile(ProfileCommand),
    /// Search for opportunities, optionally checking eligibility right away.
    Search {
        #[arg(required = true, num_args = 1..)]
        query: Vec<String>,
        #[arg(long = "type")]
        kind: Option<OpportunityType>,
        /// Opportunity ids to analyze once results arrive.
        #[arg(long)]
        analyze: Vec<String>,
        /// Analyze every result in one batch request.
        #[arg(long)]
        analyze_all: bool,
        /// Show the full roadmap for this opportunity.
        #[arg(long)]
        expand: Option<String>,
    },
    /// Browse recently discovered opportunities.
    Cached {
        #[arg(long, default_value_t = opportunities::DEFAULT_CACHED_LIMIT)]
        limit: u32,
        #[arg(long = "type")]
        kind: Option<OpportunityType>,
    },
    /// Search ideas based on your profile.
    Suggest,
    /// Check eligibility for specific opportunities.
    Analyze {
        #[arg(required = true, num_args = 1..)]
        ids: Vec<String>,
        #[arg(long)]
        expand: Option<String>,
    },
    /// Reopen an earlier eligibility analysis by its reference.
    Result { reasoning_id: String },
    Dashboard {
        /// tasks, achievements, leaderboard or resume
        #[arg(long)]
        modal: Option<String>,
    },
    Leaderboard {
        #[arg(long, default_value_t = gamification::DEFAULT_LEADERBOARD_SIZE)]
        top: u32,
    },
    #[command(subcommand)]
    Tracker(TrackerCommand),
    Analytics,
    Stories {
        #[arg(long, default_value_t = insights::DEFAULT_STORY_LIMIT)]
        limit: u32,
    },
    Peers,
    Health,
    /// Interactive session: results stay loaded between commands.
    Shell,
}

#[derive(Subcommand, Debug)]
enum ProfileCommand {
    Show,
    /// Create a profile from a JSON file.
    Create { file: PathBuf },
    /// Create a profile from a PDF resume.
    Upload { file: PathBuf },
    /// Print the current profile as editable JSON.
    Draft,
    /// Replace the profile with the contents of a JSON file.
    Update { file: PathBuf },
    /// Reload the profile from the server.
    Refresh,
    /// Show the last resume evaluation.
    Evaluation,
}

#[derive(Subcommand, Debug)]
enum TrackerCommand {
    /// Save an opportunity from the current results.
    Save { opportunity_id: String },
    List,
    Status {
        application_id: String,
        status: ApplicationStatus,
        #[arg(long)]
        notes: Option<String>,
    },
    Remove { application_id: String },
}

/// Lines typed into `orbit shell`.
#[derive(Parser, Debug)]
#[command(no_binary_name = true, disable_help_flag = true)]
struct ShellLine {
    #[command(subcommand)]
    command: ShellCommand,
}

#[derive(Subcommand, Debug)]
enum ShellCommand {
    #[command(flatten)]
    Run(Command),
    /// Toggle the roadmap of one result.
    Expand { opportunity_id: String },
    Tab { name: String },
    Open { modal: String },
    Close,
    Exit,
}

#[tokio::main]
async fn main() -> Result<(), ClientError> {
    let cli = Cli::parse();

    // --- 1. Load Configuration & Set Up Logging ---
    let config = Config::from_env()?;
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
    debug!("Configuration loaded: {:?}", config);

    // --- 2. Wire the gateway and local storage ---
    let app = AppState::from_config(config)?;

    // --- 3. Run ---
    let needs_mount = !matches!(
        cli.command,
        Command::Login { .. } | Command::Register { .. } | Command::Health
    );
    if needs_mount {
        app::mount(&app).await?;
    }
    let mut view_state = ViewState::new();
    let root = ViewScope::new();
    let result = run_cancellable(&app, &root, &mut view_state, cli.command).await;

    // --- 4. Let fire-and-forget reports reach the backend before exiting ---
    app.flush_background(BACKGROUND_FLUSH_TIMEOUT).await;
    result
}

/// Runs one command under a child scope that Ctrl-C cancels.
async fn run_cancellable(
    app: &AppState,
    root: &ViewScope,
    view_state: &mut ViewState,
    command: Command,
) -> Result<(), ClientError> {
    let scope = root.child();
    let watcher = {
        let scope = scope.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                scope.cancel();
            }
        })
    };
    let result = execute(app, &scope, view_state, command).await;
    watcher.abort();
    result
}

async fn execute(
    app: &AppState,
    scope: &ViewScope,
    view_state: &mut ViewState,
    command: Command,
) -> Result<(), ClientError> {
    match command {
        Command::Login { email, password } => {
            let password = password_or_prompt(password).await?;
            let session = session::login(app, &email, &password).await?;
            println!("Welcome back, {}!", session.name);
            app::mount(app).await?;
        }
        Command::Register {
            email,
            name,
            password,
        } => {
            let password = password_or_prompt(password).await?;
            let session = session::register(app, &email, &password, &name).await?;
            println!("Account created. Welcome, {}!", session.name);
            app::mount(app).await?;
        }
        Command::Logout => {
            session::logout(app).await?;
            println!("Logged out.");
        }
        Command::Profile(cmd) => execute_profile(app, cmd).await?,
        Command::Search {
            query,
            kind,
            analyze,
            analyze_all,
            expand,
        } => {
            view_state.select_tab(Tab::Opportunities);
            let query = query.join(" ");
            let found = opportunities::search(app, scope, &query, kind).await?;
            println!("Found {} opportunities for '{}'.", found.len(), query);
            if analyze_all {
                let ids: Vec<String> = found.iter().map(|o| o.opportunity_id.clone()).collect();
                report_batch(opportunities::analyze_batch(app, scope, &ids).await?);
            } else {
                analyze_many(app, scope, view_state, &analyze).await;
            }
            if let Some(id) = expand {
                view_state.toggle_expanded(&id);
            }
            println!("{}", view::render_opportunity_list(&app.store.snapshot(), view_state));
        }
        Command::Cached { limit, kind } => {
            view_state.select_tab(Tab::Opportunities);
            opportunities::cached(app, scope, limit, kind).await?;
            println!("{}", view::render_opportunity_list(&app.store.snapshot(), view_state));
        }
        Command::Suggest => {
            for suggestion in opportunities::suggestions(app, scope).await? {
                println!("  • {}", suggestion);
            }
        }
        Command::Analyze { ids, expand } => {
            view_state.select_tab(Tab::Opportunities);
            // Results from an earlier process are gone; load the requested ones first.
            for id in &ids {
                opportunities::load(app, scope, id).await?;
            }
            analyze_many(app, scope, view_state, &ids).await;
            if let Some(id) = expand {
                view_state.toggle_expanded(&id);
            }
            println!("{}", view::render_opportunity_list(&app.store.snapshot(), view_state));
        }
        Command::Result { reasoning_id } => {
            view_state.select_tab(Tab::Opportunities);
            let analysis = opportunities::fetch_result(app, scope, &reasoning_id).await?;
            view_state.toggle_expanded(&analysis.opportunity_id);
            let state = app.store.snapshot();
            if let Some(opportunity) = state.opportunity(&analysis.opportunity_id) {
                println!(
                    "{}",
                    view::render_opportunity_card(opportunity, Some(&analysis), view_state)
                );
            }
        }
        Command::Dashboard { modal } => {
            view_state.select_tab(Tab::Dashboard);
            if let Some(name) = modal {
                let modal = parse_modal(&name)?;
                if modal == Modal::Leaderboard {
                    gamification::leaderboard(app, gamification::DEFAULT_LEADERBOARD_SIZE).await?;
                }
                view_state.open_modal(modal);
            }
            println!("{}", view::render_dashboard(&app.store.snapshot(), view_state));
        }
        Command::Leaderboard { top } => {
            let board = gamification::leaderboard(app, top).await?;
            let me = app.store.session().map(|s| s.user_id);
            println!("{}", view::render_leaderboard(&board, me.as_deref()));
        }
        Command::Tracker(cmd) => {
            view_state.select_tab(Tab::Tracker);
            execute_tracker(app, cmd).await?;
        }
        Command::Analytics => {
            view_state.select_tab(Tab::Analytics);
            println!("{}", view::render_analytics(&insights::analytics(app).await?));
        }
        Command::Stories { limit } => {
            view_state.select_tab(Tab::Stories);
            println!("{}", view::render_stories(&insights::success_stories(app, limit).await?));
        }
        Command::Peers => {
            view_state.select_tab(Tab::Stories);
            println!("{}", view::render_peer_insights(&insights::peer_insights(app).await?));
        }
        Command::Health => {
            let status = insights::health(app).await?;
            println!("Backend status: {}", status);
        }
        // Boxed: the shell runs commands through `execute` again.
        Command::Shell => Box::pin(run_shell(app)).await?,
    }
    Ok(())
}

async fn execute_profile(app: &AppState, cmd: ProfileCommand) -> Result<(), ClientError> {
    match cmd {
        ProfileCommand::Show => match app.store.profile() {
            Some(p) => println!("{}", view::render_profile(&p)),
            None => println!("No profile yet. Use `orbit profile upload <resume.pdf>`."),
        },
        ProfileCommand::Create { file } => {
            let data = read_profile_file(&file).await?;
            let created = profile::create_manual(app, data).await?;
            println!("{}", view::render_profile(&created));
        }
        ProfileCommand::Upload { file } => {
            let contents = tokio::fs::read(&file).await?;
            let file_name = file
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            let parsed = profile::upload_resume(app, &file_name, Bytes::from(contents)).await?;
            println!("{}", view::render_profile(&parsed.profile));
            if let Some(evaluation) = &parsed.evaluation {
                println!("{}", view::render_resume_evaluation(evaluation));
            }
            if !parsed.suggestions.is_empty() {
                println!("Try searching for: {}", parsed.suggestions.join(" · "));
            }
        }
        ProfileCommand::Draft => {
            let draft = profile::edit_draft(app)?;
            println!("{}", serde_json::to_string_pretty(&draft)?);
        }
        ProfileCommand::Update { file } => {
            let data = read_profile_file(&file).await?;
            let updated = profile::update(app, data).await?;
            println!("{}", view::render_profile(&updated));
        }
        ProfileCommand::Refresh => {
            let id = app
                .store
                .profile()
                .map(|p| p.profile_id)
                .or_else(|| app.store.session().and_then(|s| s.profile_id))
                .ok_or(PortError::Validation("No profile to refresh.".to_string()))?;
            let fetched = profile::fetch(app, &id).await?;
            println!("{}", view::render_profile(&fetched));
        }
        ProfileCommand::Evaluation => {
            println!("{}", view::render_modal(&app.store.snapshot(), Modal::ResumeEvaluation));
        }
    }
    Ok(())
}

async fn execute_tracker(app: &AppState, cmd: TrackerCommand) -> Result<(), ClientError> {
    match cmd {
        TrackerCommand::Save { opportunity_id } => {
            let saved = tracker::save_listed(app, &opportunity_id).await?;
            println!("Saved '{}' ({}).", saved.opportunity_title, saved.id);
        }
        TrackerCommand::List => {
            println!("{}", view::render_applications(&tracker::list(app).await?));
        }
        TrackerCommand::Status {
            application_id,
            status,
            notes,
        } => {
            tracker::update_status(app, &application_id, status, notes.as_deref()).await?;
            println!("Updated {} to {}.", application_id, status.as_str());
        }
        TrackerCommand::Remove { application_id } => {
            tracker::remove(app, &application_id).await?;
            println!("Removed {}.", application_id);
        }
    }
    Ok(())
}

/// Analyzes the ids concurrently; each result lands on its own card.
async fn analyze_many(
    app: &AppState,
    scope: &ViewScope,
    view_state: &mut ViewState,
    ids: &[String],
) {
    for id in ids {
        view_state.start_analyzing(id);
    }
    let results = join_all(
        ids.iter()
            .map(|id| async move { (id, opportunities::analyze(app, scope, id).await) }),
    )
    .await;
    for (id, result) in results {
        view_state.finish_analyzing(id);
        if let Err(e) = result {
            eprintln!("Could not analyze {}: {}", id, e.user_message());
        }
    }
}

fn report_batch(items: Vec<orbit_core::domain::BatchItem>) {
    for item in items {
        if let Err(e) = item.outcome {
            eprintln!("Could not analyze {}: {}", item.opportunity_id, e);
        }
    }
}

async fn read_profile_file(path: &Path) -> Result<ProfileData, ClientError> {
    let raw = tokio::fs::read_to_string(path).await?;
    Ok(serde_json::from_str(&raw)?)
}

async fn password_or_prompt(password: Option<String>) -> Result<String, ClientError> {
    if let Some(password) = password {
        return Ok(password);
    }
    let mut stderr = tokio::io::stderr();
    stderr.write_all(b"Password: ").await?;
    stderr.flush().await?;
    let mut line = String::new();
    BufReader::new(tokio::io::stdin()).read_line(&mut line).await?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

fn parse_tab(name: &str) -> Result<Tab, ClientError> {
    match name.to_ascii_lowercase().as_str() {
        "dashboard" => Ok(Tab::Dashboard),
        "profile" => Ok(Tab::Profile),
        "opportunities" | "results" => Ok(Tab::Opportunities),
        "tracker" => Ok(Tab::Tracker),
        "analytics" => Ok(Tab::Analytics),
        "stories" => Ok(Tab::Stories),
        other => Err(PortError::Validation(format!("Unknown tab '{}'", other)).into()),
    }
}

fn parse_modal(name: &str) -> Result<Modal, ClientError> {
    match name.to_ascii_lowercase().as_str() {
        "tasks" => Ok(Modal::Tasks),
        "achievements" => Ok(Modal::Achievements),
        "leaderboard" => Ok(Modal::Leaderboard),
        "resume" | "evaluation" => Ok(Modal::ResumeEvaluation),
        other => Err(PortError::Validation(format!("Unknown view '{}'", other)).into()),
    }
}

//=========================================================================================
// Interactive shell
//=========================================================================================

/// One mount, many commands. Results and analyses stay in the store between lines.
async fn run_shell(app: &AppState) -> Result<(), ClientError> {
    let root = ViewScope::new();
    let mut view_state = ViewState::new();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    println!("{}", view::render_dashboard(&app.store.snapshot(), &view_state));
    info!("Shell started");

    loop {
        let mut stdout = tokio::io::stdout();
        stdout.write_all(b"orbit> ").await?;
        stdout.flush().await?;
        let Some(line) = lines.next_line().await? else {
            break;
        };
        let words: Vec<&str> = line.split_whitespace().collect();
        if words.is_empty() {
            continue;
        }
        let parsed = match ShellLine::try_parse_from(words) {
            Ok(parsed) => parsed,
            Err(e) => {
                eprintln!("{}", e);
                continue;
            }
        };
        let outcome = match parsed.command {
            ShellCommand::Exit => break,
            ShellCommand::Run(Command::Shell) => {
                println!("Already in the shell.");
                Ok(())
            }
            ShellCommand::Run(command) => {
                run_cancellable(app, &root, &mut view_state, command).await
            }
            ShellCommand::Expand { opportunity_id } => {
                view_state.toggle_expanded(&opportunity_id);
                println!("{}", view::render_opportunity_list(&app.store.snapshot(), &view_state));
                Ok(())
            }
            ShellCommand::Tab { name } => match parse_tab(&name) {
                Ok(tab) => {
                    view_state.select_tab(tab);
                    render_tab(app, &view_state).await
                }
                Err(e) => Err(e),
            },
            ShellCommand::Open { modal } => match parse_modal(&modal) {
                Ok(modal) => {
                    view_state.open_modal(modal);
                    println!("{}", view::render_modal(&app.store.snapshot(), modal));
                    Ok(())
                }
                Err(e) => Err(e),
            },
            ShellCommand::Close => {
                view_state.close_modal();
                Ok(())
            }
        };
        if let Err(e) = outcome {
            eprintln!("{}", e);
        }
    }
    root.cancel();
    info!("Shell closed");
    Ok(())
}

async fn render_tab(app: &AppState, view_state: &ViewState) -> Result<(), ClientError> {
    let state = app.store.snapshot();
    match view_state.active_tab {
        Tab::Dashboard => println!("{}", view::render_dashboard(&state, view_state)),
        Tab::Profile => match &state.profile {
            Some(p) => println!("{}", view::render_profile(p)),
            None => println!("No profile yet."),
        },
        Tab::Opportunities => println!("{}", view::render_opportunity_list(&state, view_state)),
        Tab::Tracker => println!("{}", view::render_applications(&tracker::list(app).await?)),
        Tab::Analytics => println!("{}", view::render_analytics(&insights::analytics(app).await?)),
        Tab::Stories => println!(
            "{}",
            view::render_stories(&insights::success_stories(app, insights::DEFAULT_STORY_LIMIT).await?)
        ),
    }
    Ok(())
}
