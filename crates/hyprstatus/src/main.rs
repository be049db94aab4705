use anyhow::{Context, Result};
use clap::CommandFactory as _;
use paths::StatusPaths;
use std::time::Duration;

mod actions;
mod app;
mod app_groups;
mod application_lifecycle;
mod compositor;
mod config;
mod indicators;
mod opts;
mod paths;
mod server;
mod surface;
mod ui;
mod util;

fn main() {
    let opts: opts::Opt = opts::Opt::from_env();

    let log_level_filter = if opts.log_debug { log::LevelFilter::Debug } else { log::LevelFilter::Info };
    if std::env::var("RUST_LOG").is_ok() {
        pretty_env_logger::init_timed();
    } else {
        pretty_env_logger::formatted_timed_builder()
            .filter(Some("hyprstatus"), log_level_filter)
            .filter(Some("hypr_ipc"), log_level_filter)
            .filter(Some("notifier_host"), log_level_filter)
            .init();
    }

    if let opts::Action::ShellCompletions { shell } = opts.action {
        clap_complete::generate(shell, &mut opts::RawOpt::command(), "hyprstatus", &mut std::io::stdout());
        return;
    }

    if let Err(err) = run(opts) {
        log::error!("{:?}", err);
        std::process::exit(1);
    }
}

fn run(opts: opts::Opt) -> Result<()> {
    let paths = match &opts.config_path {
        Some(path) => StatusPaths::from_config_file(path)?,
        None => StatusPaths::default()?,
    };

    match opts.action {
        opts::Action::Run => server::initialize_server(paths),
        opts::Action::Groups => print_groups(&paths),
        opts::Action::Tray { wait_ms } => print_tray(Duration::from_millis(wait_ms)),
        opts::Action::ShellCompletions { .. } => Ok(()),
    }
}

fn print_groups(paths: &StatusPaths) -> Result<()> {
    let config = config::StatusConfig::read_or_default(paths.get_config_file());
    let client = hypr_ipc::HyprlandClient::from_env().context("Hyprland is not reachable")?;
    let windows = client.clients()?;
    let active_class = client.active_window()?.map(|window| window.class);
    let groups = app_groups::group_windows(&windows, active_class.as_deref(), &config.app_tracker.minimized_workspace);
    println!("{}", serde_json::to_string_pretty(&app_groups::sorted(&groups))?);
    Ok(())
}

fn print_tray(wait: Duration) -> Result<()> {
    let rt = tokio::runtime::Builder::new_multi_thread().enable_all().build().context("Failed to initialize tokio runtime")?;
    rt.block_on(async {
        let mut host = notifier_host::Host::connect(|| {}).await.context("Could not connect to the session bus")?;
        host.start().await?;
        if !host.is_available() {
            log::warn!("No StatusNotifierWatcher on the bus");
        }
        tokio::time::sleep(wait).await;
        println!("{}", serde_json::to_string_pretty(&host.items())?);
        host.stop().await;
        Ok::<_, anyhow::Error>(())
    })
}
