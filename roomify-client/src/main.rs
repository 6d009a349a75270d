//! roomify - command-line client for Roomify projects
//!
//! Uploads floor plans, drives render generation, and inspects saved
//! projects. Endpoints resolve CLI -> ENV -> TOML like the worker.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use roomify_client::export::write_export;
use roomify_client::{
    HttpRenderGenerator, ProjectActions, UploadConfig, UploadFile, UploadSession, UploadState,
    Visualizer,
};
use roomify_common::config::{load_toml_config, ClientSettings};
use roomify_common::project::ProjectDraft;
use roomify_common::time::now_millis;
use roomify_common::{Project, Visibility};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

#[derive(Parser, Debug)]
#[command(name = "roomify")]
#[command(about = "Roomify client: upload floor plans and visualize renders")]
#[command(version)]
struct Cli {
    /// Worker API base URL
    #[arg(long, global = true)]
    worker_url: Option<String>,

    /// Image hosting base URL
    #[arg(long, global = true)]
    hosting_url: Option<String>,

    /// Render generator endpoint
    #[arg(long, global = true)]
    render_url: Option<String>,

    /// Auth provider base URL
    #[arg(long, global = true)]
    auth_url: Option<String>,

    /// Bearer token of the signed-in user
    #[arg(long, global = true)]
    auth_token: Option<String>,

    /// Config file (default: <config dir>/roomify/roomify.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Upload a floor plan and generate its render
    Upload {
        file: PathBuf,

        /// Project name
        #[arg(long)]
        name: Option<String>,

        /// Directory to export the render into
        #[arg(long)]
        export: Option<PathBuf>,
    },

    /// Show one saved project
    Get { id: String },

    /// List saved projects
    List,

    /// Open a project in the visualizer, generating a render if needed
    Visualize {
        id: String,

        #[arg(long)]
        export: Option<PathBuf>,
    },

    /// Show the signed-in user
    Whoami,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let toml_config = load_toml_config(cli.config.as_deref())?;

    let default_filter = format!(
        "roomify={level},roomify_client={level}",
        level = toml_config.logging.level
    );
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let overrides = ClientSettings {
        worker_url: cli.worker_url.clone(),
        hosting_url: cli.hosting_url.clone(),
        render_url: cli.render_url.clone(),
        auth_url: cli.auth_url.clone(),
        auth_token: cli.auth_token.clone(),
    };
    let settings = ClientSettings::resolve(&overrides, &toml_config);
    let actions = Arc::new(ProjectActions::from_settings(&settings)?);

    match cli.command {
        Command::Upload { file, name, export } => {
            upload(&settings, actions, &file, name, export.as_deref()).await
        }
        Command::Get { id } => match actions.get_project(&id).await {
            Some(project) => print_json(&project),
            None => bail!("Project {} not found", id),
        },
        Command::List => print_json(&actions.list_projects().await),
        Command::Visualize { id, export } => {
            let mut visualizer = visualizer(&settings, actions)?;
            visualizer.load(&id, None).await;
            if visualizer.project().is_none() {
                bail!("Project {} not found", id);
            }
            visualizer.reconcile().await;
            finish(&visualizer, export.as_deref()).await
        }
        Command::Whoami => {
            let user = actions.sign_in().await.context("Sign-in failed")?;
            print_json(&user)
        }
    }
}

async fn upload(
    settings: &ClientSettings,
    actions: Arc<ProjectActions>,
    path: &Path,
    name: Option<String>,
    export: Option<&Path>,
) -> Result<()> {
    let mut visualizer = visualizer(settings, actions.clone())?;
    let file = UploadFile::from_path(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;

    let mut session = UploadSession::new(UploadConfig::default(), settings.auth_token.is_some());
    let mut states = session.subscribe();
    tokio::spawn(async move {
        while states.changed().await.is_ok() {
            if let UploadState::HasFile { name, progress } = &*states.borrow_and_update() {
                info!(file = %name, progress, "Uploading");
            }
        }
    });

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            on_interrupt.cancel();
        }
    });

    let id = Uuid::new_v4().to_string();
    let owner_id = actions.current_user().await.map(|user| user.uuid);
    let timestamp = now_millis();

    let (id_ref, name_ref, owner_ref, actions_ref) = (&id, &name, &owner_id, &actions);
    let data_url = session
        .process_file(
            file,
            |data_url| async move {
                let draft = ProjectDraft {
                    id: Some(id_ref.clone()),
                    owner_id: owner_ref.clone(),
                    name: name_ref.clone(),
                    source_image: Some(data_url),
                    timestamp: Some(timestamp),
                    ..Default::default()
                };
                Ok(actions_ref
                    .create_project(&draft, Visibility::Private)
                    .await
                    .is_some())
            },
            &cancel,
        )
        .await?;

    let mut navigation = Project::new(id.clone(), data_url);
    navigation.name = name;
    navigation.owner_id = owner_id;
    navigation.timestamp = Some(timestamp);

    visualizer.load(&id, Some(navigation)).await;
    visualizer.reconcile().await;
    finish(&visualizer, export).await
}

fn visualizer(settings: &ClientSettings, actions: Arc<ProjectActions>) -> Result<Visualizer> {
    let Some(render_url) = settings.render_url.as_deref() else {
        bail!("Render generator is not configured. Set ROOMIFY_RENDER_URL or render_url in roomify.toml");
    };
    let generator = HttpRenderGenerator::new(render_url)?;
    Ok(Visualizer::new(actions, Arc::new(generator)))
}

async fn finish(visualizer: &Visualizer, export: Option<&Path>) -> Result<()> {
    if let Some(project) = visualizer.project() {
        print_json(project)?;
    }

    match (visualizer.export(), export) {
        (Some(download), Some(dir)) => {
            let path = write_export(&download, dir, &reqwest::Client::new()).await?;
            println!("Exported {}", path.display());
        }
        (None, Some(_)) => warn!("No render to export"),
        _ => {}
    }
    Ok(())
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
