use anyhow::Result;
use notifier_host::TrayRegistry;

use crate::{
    actions::UiAction,
    app_groups::{self, AppGroups},
    compositor::Compositor,
    config::StatusConfig,
    indicators::{self, WorkspaceButton},
    surface::Surface,
    ui::{Section, UiCommand, UiThread},
};

/// The display state, owned by the UI thread.
///
/// Everything that reads the compositor or the tray and writes to the surface happens here,
/// one [`UiCommand`] at a time. A missing compositor or tray just leaves its sections empty.
pub struct App<C, S> {
    compositor: Option<C>,
    surface: S,
    config: StatusConfig,
    /// Groups as of the last poll.
    groups: AppGroups,
    tray: Option<TrayRegistry>,
    last_title: Option<String>,
    last_workspaces: Option<Vec<WorkspaceButton>>,
}

impl<C: Compositor, S: Surface> App<C, S> {
    pub fn new(compositor: Option<C>, surface: S, config: StatusConfig) -> Self {
        Self {
            compositor,
            surface,
            config,
            groups: AppGroups::new(),
            tray: None,
            last_title: None,
            last_workspaces: None,
        }
    }

    pub fn handle_command(&mut self, ui: &UiThread, cmd: UiCommand) {
        log::trace!("Handling command: {:?}", &cmd);
        let result = match cmd {
            UiCommand::Refresh(section) => self.refresh(ui, section),
            UiCommand::Action(action) => self.run_action(ui, action),
            UiCommand::TrayReady(registry) => {
                self.tray = Some(registry);
                self.refresh(ui, Section::Tray)
            }
        };
        crate::print_result_err!("while updating the surface", result);
    }

    /// Refresh every enabled section.
    pub fn refresh_all(&mut self, ui: &UiThread) {
        for section in [Section::Workspaces, Section::WindowTitle, Section::Apps, Section::Tray] {
            crate::print_result_err!("while updating the surface", self.refresh(ui, section));
        }
    }

    pub fn refresh(&mut self, ui: &UiThread, section: Section) -> Result<()> {
        if !self.config.modules.enabled(section) {
            return Ok(());
        }
        match section {
            Section::Workspaces => self.refresh_workspaces(ui),
            Section::WindowTitle => self.refresh_window_title(ui),
            Section::Apps => self.refresh_apps(ui),
            Section::Tray => self.refresh_tray(ui),
        }
    }

    fn refresh_workspaces(&mut self, _ui: &UiThread) -> Result<()> {
        let Some(compositor) = &self.compositor else { return Ok(()) };
        let workspaces = match compositor.workspaces() {
            Ok(workspaces) => workspaces,
            Err(err) => {
                log::debug!("Could not query workspaces: {}", err);
                return Ok(());
            }
        };
        let active_id = match compositor.active_workspace() {
            Ok(active) => active.id,
            Err(err) => {
                log::debug!("Could not query the active workspace: {}", err);
                return Ok(());
            }
        };
        let buttons = indicators::workspace_buttons(&workspaces, active_id);
        if self.last_workspaces.as_ref() == Some(&buttons) {
            return Ok(());
        }
        self.surface.workspaces(&buttons)?;
        self.last_workspaces = Some(buttons);
        Ok(())
    }

    fn refresh_window_title(&mut self, _ui: &UiThread) -> Result<()> {
        let Some(compositor) = &self.compositor else { return Ok(()) };
        let active = compositor.active_window().unwrap_or_else(|err| {
            log::debug!("Could not query the active window: {}", err);
            None
        });
        let title = indicators::window_title(active.as_ref());
        if self.last_title.as_ref() == Some(&title) {
            return Ok(());
        }
        self.surface.window_title(&title)?;
        self.last_title = Some(title);
        Ok(())
    }

    fn refresh_apps(&mut self, _ui: &UiThread) -> Result<()> {
        let Some(compositor) = &self.compositor else { return Ok(()) };
        let windows = match compositor.clients() {
            Ok(windows) => windows,
            Err(err) => {
                log::debug!("Could not query clients: {}", err);
                return Ok(());
            }
        };
        let active_class = compositor.active_window().ok().flatten().map(|window| window.class);

        let marker = &self.config.app_tracker.minimized_workspace;
        let (next, changed) = app_groups::reconcile(&windows, active_class.as_deref(), &self.groups, marker);
        self.groups = next;

        let sorted = app_groups::sorted(&self.groups);
        if changed {
            log::debug!("App groups changed, rebuilding {} buttons", sorted.len());
            self.surface.rebuild_apps(&sorted)
        } else {
            self.surface.patch_apps(&sorted)
        }
    }

    fn refresh_tray(&mut self, _ui: &UiThread) -> Result<()> {
        let Some(registry) = &self.tray else { return Ok(()) };
        self.surface.tray(&registry.items(), registry.is_started() && registry.is_available())
    }

    fn run_action(&mut self, ui: &UiThread, action: UiAction) -> Result<()> {
        let Some(compositor) = &self.compositor else {
            log::debug!("No compositor connection, ignoring {:?}", action);
            return Ok(());
        };
        let active_address = compositor.active_window().ok().flatten().map(|window| window.address);
        let marker = &self.config.app_tracker.minimized_workspace;
        for dispatch in action.plan(&self.groups, active_address.as_deref(), marker) {
            if let Err(err) = compositor.dispatch(&dispatch) {
                log::debug!("Dispatch `{}` failed: {}", dispatch, err);
            }
        }
        if action.touches_apps() {
            self.refresh(ui, Section::Apps)
        } else {
            self.refresh(ui, Section::Workspaces)
        }
    }
}
