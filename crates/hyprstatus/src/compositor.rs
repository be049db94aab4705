use hypr_ipc::{Dispatch, HyprlandClient, Window, Workspace};

/// Read side of the compositor, polled by the UI thread.
pub trait WindowSource {
    fn clients(&self) -> hypr_ipc::Result<Vec<Window>>;
    fn active_window(&self) -> hypr_ipc::Result<Option<Window>>;
    fn workspaces(&self) -> hypr_ipc::Result<Vec<Workspace>>;
    fn active_workspace(&self) -> hypr_ipc::Result<Workspace>;
}

/// Write side of the compositor. Commands are fire-and-forget.
pub trait CommandSink {
    fn dispatch(&self, dispatch: &Dispatch) -> hypr_ipc::Result<()>;
}

pub trait Compositor: WindowSource + CommandSink {}
impl<T: WindowSource + CommandSink> Compositor for T {}

impl WindowSource for HyprlandClient {
    fn clients(&self) -> hypr_ipc::Result<Vec<Window>> {
        HyprlandClient::clients(self)
    }

    fn active_window(&self) -> hypr_ipc::Result<Option<Window>> {
        HyprlandClient::active_window(self)
    }

    fn workspaces(&self) -> hypr_ipc::Result<Vec<Workspace>> {
        HyprlandClient::workspaces(self)
    }

    fn active_workspace(&self) -> hypr_ipc::Result<Workspace> {
        HyprlandClient::active_workspace(self)
    }
}

impl CommandSink for HyprlandClient {
    fn dispatch(&self, dispatch: &Dispatch) -> hypr_ipc::Result<()> {
        HyprlandClient::dispatch(self, dispatch)
    }
}
