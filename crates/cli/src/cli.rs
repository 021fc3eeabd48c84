use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing::{debug, warn};

use rainwatch_core::client::DEFAULT_URL;
use rainwatch_core::view::TIME_ADDED;
use rainwatch_core::{
    request, resolve, ApiTransport, ClientConfig, Controller, HomeController, RainwatchClient,
    RefreshOutcome, Route, SortOrder, TorrentListController, View,
};
use serde_json::{json, Value};

use crate::output;

#[derive(Parser, Debug)]
#[command(name = "rainwatch", version, about = "Client for the rainwatch daemon")]
pub(crate) struct Cli {
    /// Daemon base URL
    #[arg(long, global = true, env = "RAINWATCH_URL", default_value = DEFAULT_URL)]
    url: String,
    /// Shared secret sent in the WWW-Authenticate header
    #[arg(
        long,
        global = true,
        env = "RAINWATCH_SHARED_KEY",
        hide_env_values = true,
        default_value = ""
    )]
    shared_key: String,
    #[arg(
        long = "output",
        alias = "format",
        global = true,
        value_enum,
        default_value_t = OutputFormat::Table,
        help = "Select output format"
    )]
    output: OutputFormat,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Open a route and render its view
    Open(OpenArgs),
    /// Daemon information; same as `open /`
    Info(WatchArgs),
    /// Torrent list; same as `open /torrents`
    Torrents(ListArgs),
    /// Move a torrent's data to another directory on the seedbox
    Move(MoveArgs),
    /// Queue a completed torrent for transfer
    Hook(HookArgs),
}

#[derive(Args, Debug)]
struct MoveArgs {
    /// Info hash of the torrent
    id: String,
    /// Destination directory
    dest: String,
}

#[derive(Args, Debug)]
struct HookArgs {
    /// Info hash of the completed torrent
    id: String,
    /// Move the torrent's data here before the transfer
    #[arg(long, value_name = "DIR")]
    move_to: Option<String>,
}

#[derive(Args, Debug)]
struct OpenArgs {
    /// Route path, e.g. `/` or `/torrents`
    path: String,
    #[command(flatten)]
    list: ListArgs,
}

#[derive(Args, Debug, Clone)]
struct ListArgs {
    /// Record field to sort the torrent list by
    #[arg(long, default_value = TIME_ADDED)]
    sort: String,
    /// Sort ascending instead of newest first
    #[arg(long)]
    asc: bool,
    #[command(flatten)]
    watch: WatchArgs,
}

impl Default for ListArgs {
    fn default() -> Self {
        Self {
            sort: TIME_ADDED.to_string(),
            asc: false,
            watch: WatchArgs::default(),
        }
    }
}

#[derive(Args, Debug, Clone, Copy, Default)]
struct WatchArgs {
    /// Refresh every SECS seconds until interrupted
    #[arg(long, value_name = "SECS", value_parser = clap::value_parser!(u64).range(1..))]
    watch: Option<u64>,
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, ValueEnum)]
pub(crate) enum OutputFormat {
    #[default]
    Table,
    Json,
}

/// What a command asks the daemon for.
#[derive(Debug)]
enum Target {
    /// Open a route and render its view.
    View(String, ListArgs),
    /// Fire a single request and report the outcome.
    Action(&'static str, Value),
}

impl Command {
    fn target(self) -> Target {
        match self {
            Command::Open(args) => Target::View(args.path, args.list),
            Command::Info(watch) => Target::View(
                Route::Home.path().to_string(),
                ListArgs {
                    watch,
                    ..ListArgs::default()
                },
            ),
            Command::Torrents(list) => Target::View(Route::Torrents.path().to_string(), list),
            Command::Move(args) => Target::Action(
                MOVE_ROUTE,
                json!({ "id": args.id, "dest": args.dest }),
            ),
            Command::Hook(args) => {
                let opts = match args.move_to {
                    Some(dir) => json!({ "moveto": dir }),
                    None => json!(false),
                };
                Target::Action(HOOK_ROUTE, json!({ "thash": args.id, "opts": opts }))
            }
        }
    }
}

const MOVE_ROUTE: &str = "/api/torrent/move";
const HOOK_ROUTE: &str = "/api/chook";

pub(crate) async fn run() -> Result<()> {
    dispatch(Cli::parse()).await
}

async fn dispatch(cli: Cli) -> Result<()> {
    let client = RainwatchClient::new(&ClientConfig {
        url: cli.url,
        shared_key: cli.shared_key,
    })
    .context("failed to build HTTP client")?;
    debug!(url = client.base_url(), "Using daemon");
    let transport: Arc<dyn ApiTransport> = Arc::new(client);

    match cli.command.target() {
        Target::View(path, list) => open(transport, &path, list, cli.output).await,
        Target::Action(route, body) => act(transport.as_ref(), route, &body, cli.output).await,
    }
}

async fn open(
    transport: Arc<dyn ApiTransport>,
    path: &str,
    list: ListArgs,
    format: OutputFormat,
) -> Result<()> {
    let resolution = resolve(path);
    if resolution.redirected {
        eprintln!("notice: no route for {path}, showing {}", resolution.route);
    }
    debug!(route = %resolution.route, template = resolution.route.template(), "Opening view");

    match resolution.route {
        Route::Home => {
            let view = View::new(HomeController, transport);
            show(view, format, list.watch.watch, output::render_info).await
        }
        Route::Torrents => {
            let order = if list.asc {
                SortOrder::Ascending
            } else {
                SortOrder::Descending
            };
            let controller = TorrentListController::new().sorted_by(list.sort, order);
            let view = View::new(controller, transport);
            show(view, format, list.watch.watch, |records, format| {
                output::render_torrents(records, format)
            })
            .await
        }
    }
}

/// Send one request and print what the daemon made of it.
async fn act(
    transport: &dyn ApiTransport,
    route: &str,
    body: &Value,
    format: OutputFormat,
) -> Result<()> {
    let delivery = request(transport, route, body)
        .await
        .with_context(|| format!("request to {route} failed"))?;
    println!("{}", output::render_action(&delivery.payload, format)?);
    Ok(())
}

type Renderer<M> = fn(&M, OutputFormat) -> Result<String>;

/// Load a view once, print it, then keep refreshing it when watching.
async fn show<C: Controller>(
    view: View<C>,
    format: OutputFormat,
    watch: Option<u64>,
    render: Renderer<C::Model>,
) -> Result<()> {
    view.refresh()
        .await
        .with_context(|| format!("failed to load {}", view.controller().route()))?;
    print_view(&view, format, render).await?;

    let Some(secs) = watch else {
        return Ok(());
    };

    let handle = view.refresh_handle();
    let mut ticker = tokio::time::interval(Duration::from_secs(secs));
    ticker.tick().await;

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            _ = &mut ctrl_c => break,
            _ = ticker.tick() => {
                match handle.trigger().await.context("refresh task failed")? {
                    Ok(RefreshOutcome::Applied) => print_view(&view, format, render).await?,
                    Ok(RefreshOutcome::Superseded) => {}
                    // The last good view stays on screen.
                    Err(err) => warn!("refresh failed: {err}"),
                }
            }
        }
    }

    Ok(())
}

async fn print_view<C: Controller>(
    view: &View<C>,
    format: OutputFormat,
    render: Renderer<C::Model>,
) -> Result<()> {
    let state = view.snapshot().await;
    let Some(data) = &state.data else {
        return Ok(());
    };
    if format == OutputFormat::Table {
        if let Some(status) = &state.status {
            println!("status: {status}");
        }
    }
    println!("{}", render(data, format)?);
    Ok(())
}
