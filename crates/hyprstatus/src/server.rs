use std::io::BufRead;

use anyhow::{Context, Result};
use hypr_ipc::{events::kind, EventListener, HyprlandClient};
use notifier_host::Host;

use crate::{
    actions::UiAction,
    app::App,
    application_lifecycle,
    config::StatusConfig,
    surface::JsonSurface,
    ui::{self, Section, UiCommand, UiSender, UiThread},
    StatusPaths,
};

/// Compositor events and the sections they invalidate.
const EVENT_SECTIONS: &[(&str, &[Section])] = &[
    (kind::WORKSPACE, &[Section::Workspaces]),
    (kind::CREATE_WORKSPACE, &[Section::Workspaces]),
    (kind::DESTROY_WORKSPACE, &[Section::Workspaces]),
    (kind::ACTIVE_WINDOW, &[Section::WindowTitle]),
    (kind::WINDOW_TITLE, &[Section::WindowTitle]),
    (kind::CLOSE_WINDOW, &[Section::WindowTitle, Section::Apps]),
    (kind::OPEN_WINDOW, &[Section::Apps]),
];

pub fn initialize_server(paths: StatusPaths) -> Result<()> {
    log::info!("Loading paths: {}", &paths);
    let config = StatusConfig::read_or_default(paths.get_config_file());
    log::debug!("Using config: {:?}", config);

    let (ui_send, mut ui_recv) = ui::channel();
    let mut exit = application_lifecycle::exit_receiver();

    simple_signal::set_handler(&[simple_signal::Signal::Int, simple_signal::Signal::Term], move |_| {
        log::info!("Shutting down hyprstatus...");
        if let Err(e) = application_lifecycle::send_exit() {
            log::error!("Failed to send application shutdown event to workers: {:?}", e);
            std::process::exit(1);
        }
    });

    let compositor = if config.modules.needs_compositor() {
        match HyprlandClient::from_env() {
            Ok(client) => Some(client),
            Err(err) => {
                log::warn!("Hyprland is not reachable, compositor modules stay empty: {}", err);
                None
            }
        }
    } else {
        None
    };

    let mut listener = if compositor.is_some() { init_event_listener(&config, ui_send.clone()) } else { None };

    if config.modules.systray {
        init_tray(ui_send.clone());
    }
    init_action_reader(ui_send);

    let mut app = App::new(compositor, JsonSurface::new(std::io::stdout()), config.clone());

    let rt = tokio::runtime::Builder::new_current_thread().enable_all().build().context("Failed to initialize tokio runtime")?;
    rt.block_on(async {
        let ui = UiThread::claim();
        app.refresh_all(&ui);

        let poll_apps = config.modules.enabled(Section::Apps);
        let mut apps_tick = tokio::time::interval(config.intervals.app_tracker());
        apps_tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        crate::loop_select_exiting! {
            &mut exit,
            Some(cmd) = ui_recv.recv() => {
                app.handle_command(&ui, cmd);
            },
            _ = apps_tick.tick(), if poll_apps => {
                app.handle_command(&ui, UiCommand::Refresh(Section::Apps));
            },
            else => break,
        }
    });

    if let Some(listener) = listener.as_mut() {
        listener.stop();
    }
    log::info!("main application thread finished");
    Ok(())
}

/// Subscribe to the events of the enabled sections and start listening. Without a working
/// event socket the sections are still refreshed once at startup, and the app list keeps
/// polling.
fn init_event_listener(config: &StatusConfig, ui_send: UiSender) -> Option<EventListener> {
    let mut listener = match EventListener::connect_from_env() {
        Ok(listener) => listener,
        Err(err) => {
            log::warn!("Could not connect to the Hyprland event socket: {}", err);
            return None;
        }
    };

    for (event_kind, sections) in EVENT_SECTIONS {
        let sections: Vec<Section> = sections.iter().copied().filter(|s| config.modules.enabled(*s)).collect();
        if sections.is_empty() {
            continue;
        }
        let ui_send = ui_send.clone();
        listener.on(*event_kind, move |_| {
            for section in &sections {
                ui_send.refresh(*section);
            }
        });
    }

    match listener.start() {
        Ok(()) => Some(listener),
        Err(err) => {
            log::warn!("Could not start the Hyprland event listener: {}", err);
            None
        }
    }
}

/// Run the tray host on its own runtime, until exit or until it loses the bus.
fn init_tray(ui_send: UiSender) {
    let mut exit = application_lifecycle::exit_receiver();
    let spawned = std::thread::Builder::new().name("tray-host".to_string()).spawn(move || {
        let rt = match tokio::runtime::Builder::new_multi_thread().enable_all().build() {
            Ok(rt) => rt,
            Err(err) => {
                log::error!("Failed to initialize tokio runtime for the tray: {}", err);
                return;
            }
        };
        rt.block_on(async {
            let on_change = {
                let ui_send = ui_send.clone();
                move || ui_send.refresh(Section::Tray)
            };
            let mut host = match Host::connect(on_change).await {
                Ok(host) => host,
                Err(err) => {
                    log::warn!("Could not connect to the session bus, running without tray: {}", err);
                    return;
                }
            };
            if let Err(err) = host.start().await {
                log::warn!("Could not start the tray host: {}", err);
                return;
            }
            log::debug!("Tray host running as {}", host.bus_name().unwrap_or("<no name>"));
            ui_send.post(UiCommand::TrayReady(host.registry()));

            tokio::select! {
                _ = application_lifecycle::recv_exit(&mut exit) => {}
                _ = host.join() => {}
            }
            host.stop().await;
            log::debug!("Tray thread finished");
        });
    });
    if let Err(err) = spawned {
        log::error!("Failed to spawn the tray thread: {}", err);
    }
}

/// Read click actions, one JSON object per line, from stdin.
fn init_action_reader(ui_send: UiSender) {
    let spawned = std::thread::Builder::new().name("stdin-actions".to_string()).spawn(move || {
        for line in std::io::stdin().lock().lines() {
            let line = match line {
                Ok(line) => line,
                Err(err) => {
                    log::warn!("Failed to read from stdin: {}", err);
                    break;
                }
            };
            if line.trim().is_empty() {
                continue;
            }
            match UiAction::parse_line(&line) {
                Ok(action) => ui_send.post(UiCommand::Action(action)),
                Err(err) => log::warn!("{:?}", err),
            }
        }
        log::debug!("stdin closed, no more actions");
    });
    if let Err(err) = spawned {
        log::error!("Failed to spawn the stdin reader: {}", err);
    }
}
