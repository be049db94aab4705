//! Grouping of open windows by application, and the diff that decides whether the app
//! buttons have to be rebuilt or can be patched in place.

use std::collections::HashMap;

use hypr_ipc::Window;
use itertools::Itertools;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupWindow {
    pub address: String,
    pub minimized: bool,
}

/// All windows of one application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AppGroup {
    /// Lower-cased window class.
    pub key: String,
    /// Class of the first window, in its original case.
    pub display_title: String,
    /// In the order the compositor listed them. Never empty.
    pub windows: Vec<GroupWindow>,
    pub focused: bool,
    pub all_minimized: bool,
}

pub type AppGroups = HashMap<String, AppGroup>;

/// What a left click on a group does.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Activation {
    Restore(String),
    Focus(String),
}

impl AppGroup {
    pub fn minimized_count(&self) -> usize {
        self.windows.iter().filter(|w| w.minimized).count()
    }

    pub fn visible_windows(&self) -> impl Iterator<Item = &GroupWindow> {
        self.windows.iter().filter(|w| !w.minimized)
    }

    pub fn tooltip(&self) -> String {
        match self.minimized_count() {
            0 => format!("{}\n{} window(s)\nClick: Focus | Right-click: Options", self.display_title, self.windows.len()),
            minimized => format!(
                "{}\n{} window(s) ({} minimized)\nClick: Focus/Restore | Right-click: Options",
                self.display_title,
                self.windows.len(),
                minimized
            ),
        }
    }

    /// If everything is minimized, the first window comes back. Otherwise clicking cycles
    /// through the visible windows, starting after the active one.
    pub fn activation_target(&self, active_address: Option<&str>) -> Option<Activation> {
        if self.all_minimized {
            return self.windows.first().map(|w| Activation::Restore(w.address.clone()));
        }
        let visible: Vec<&GroupWindow> = self.visible_windows().collect();
        let next = match visible.len() {
            0 => return None,
            1 => 0,
            len => match visible.iter().position(|w| Some(w.address.as_str()) == active_address) {
                Some(current) => (current + 1) % len,
                None => 0,
            },
        };
        Some(Activation::Focus(visible[next].address.clone()))
    }
}

/// Group windows by lower-cased class. Windows without a class are skipped.
pub fn group_windows(windows: &[Window], active_class: Option<&str>, minimized_marker: &str) -> AppGroups {
    let active_key = active_class.map(str::to_lowercase);
    let mut groups = AppGroups::new();
    for window in windows {
        if window.class.is_empty() {
            continue;
        }
        let key = window.class.to_lowercase();
        let group_window =
            GroupWindow { address: window.address.clone(), minimized: window.workspace.name.starts_with(minimized_marker) };
        groups
            .entry(key.clone())
            .or_insert_with(|| AppGroup {
                focused: active_key.as_deref() == Some(key.as_str()),
                display_title: window.class.clone(),
                key,
                windows: Vec::new(),
                all_minimized: false,
            })
            .windows
            .push(group_window);
    }
    for group in groups.values_mut() {
        group.all_minimized = group.windows.iter().all(|w| w.minimized);
    }
    groups
}

/// Whether the set of groups changed in a way that needs new elements: a different number
/// of groups, a new key, or a group whose window count or `all_minimized` differs.
///
/// Addresses and titles are not compared, so swapping one window for another of the same
/// class between two polls goes unnoticed.
pub fn has_structural_change(previous: &AppGroups, next: &AppGroups) -> bool {
    if previous.len() != next.len() {
        return true;
    }
    next.iter().any(|(key, group)| match previous.get(key) {
        None => true,
        Some(old) => old.windows.len() != group.windows.len() || old.all_minimized != group.all_minimized,
    })
}

/// Group a fresh poll and compare it against the previous one.
pub fn reconcile(
    windows: &[Window],
    active_class: Option<&str>,
    previous: &AppGroups,
    minimized_marker: &str,
) -> (AppGroups, bool) {
    let next = group_windows(windows, active_class, minimized_marker);
    let changed = has_structural_change(previous, &next);
    (next, changed)
}

/// Groups in display order, alphabetical by key.
pub fn sorted(groups: &AppGroups) -> Vec<&AppGroup> {
    groups.values().sorted_by(|a, b| a.key.cmp(&b.key)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use hypr_ipc::WorkspaceRef;
    use pretty_assertions::assert_eq;

    const MARKER: &str = "special:minimized";

    fn window(address: &str, class: &str, workspace: &str) -> Window {
        Window {
            address: address.to_string(),
            title: String::new(),
            class: class.to_string(),
            workspace: WorkspaceRef { id: 1, name: workspace.to_string() },
        }
    }

    fn gw(address: &str, minimized: bool) -> GroupWindow {
        GroupWindow { address: address.to_string(), minimized }
    }

    #[test]
    fn test_grouping() {
        let windows = vec![
            window("0x1", "Firefox", "1"),
            window("0x2", "kitty", "2"),
            window("0x3", "firefox", "special:minimized"),
            window("0x4", "", "1"),
        ];
        let groups = group_windows(&windows, Some("KITTY"), MARKER);

        assert_eq!(
            groups,
            maplit::hashmap! {
                "firefox".to_string() => AppGroup {
                    key: "firefox".to_string(),
                    display_title: "Firefox".to_string(),
                    windows: vec![gw("0x1", false), gw("0x3", true)],
                    focused: false,
                    all_minimized: false,
                },
                "kitty".to_string() => AppGroup {
                    key: "kitty".to_string(),
                    display_title: "kitty".to_string(),
                    windows: vec![gw("0x2", false)],
                    focused: true,
                    all_minimized: false,
                },
            }
        );
    }

    #[test]
    fn test_all_minimized_needs_every_window() {
        let windows = vec![window("0x1", "code", "special:minimized"), window("0x2", "code", "special:minimized-2")];
        assert!(group_windows(&windows, None, MARKER)["code"].all_minimized);

        let windows = vec![window("0x1", "code", "special:minimized"), window("0x2", "code", "3")];
        assert!(!group_windows(&windows, None, MARKER)["code"].all_minimized);

        assert!(group_windows(&[], None, MARKER).is_empty());
    }

    #[test]
    fn test_same_windows_unchanged() {
        let windows = vec![window("0x1", "firefox", "1"), window("0x2", "kitty", "1")];
        let (previous, changed) = reconcile(&windows, None, &AppGroups::new(), MARKER);
        assert!(changed);

        let (_, changed) = reconcile(&windows, Some("kitty"), &previous, MARKER);
        assert!(!changed);
    }

    #[test]
    fn test_third_window_changes() {
        let windows = vec![window("0x1", "firefox", "1"), window("0x2", "kitty", "1")];
        let (previous, _) = reconcile(&windows, None, &AppGroups::new(), MARKER);

        let mut more = windows.clone();
        more.push(window("0x3", "firefox", "2"));
        let (next, changed) = reconcile(&more, None, &previous, MARKER);
        assert!(changed);
        assert_eq!(next["firefox"].windows.len(), 2);
    }

    #[test]
    fn test_class_case_does_not_change_grouping() {
        let (previous, _) = reconcile(&[window("0x1", "Foo", "1")], None, &AppGroups::new(), MARKER);
        let (next, changed) = reconcile(&[window("0x1", "foo", "1")], None, &previous, MARKER);
        assert!(!changed);
        assert_eq!(next.keys().collect::<Vec<_>>(), vec!["foo"]);
    }

    #[test]
    fn test_replaced_key_with_same_size_changes() {
        let (previous, _) = reconcile(&[window("0x1", "foo", "1")], None, &AppGroups::new(), MARKER);
        let (_, changed) = reconcile(&[window("0x2", "bar", "1")], None, &previous, MARKER);
        assert!(changed);
    }

    #[test]
    fn test_minimizing_everything_changes() {
        let (previous, _) = reconcile(&[window("0x1", "foo", "1")], None, &AppGroups::new(), MARKER);
        let (_, changed) = reconcile(&[window("0x1", "foo", "special:minimized")], None, &previous, MARKER);
        assert!(changed);
    }

    #[test]
    fn test_focus_and_address_only_changes_are_patches() {
        let windows = vec![window("0x1", "foo", "1"), window("0x2", "foo", "special:minimized")];
        let (previous, _) = reconcile(&windows, None, &AppGroups::new(), MARKER);

        let swapped = vec![window("0x9", "foo", "special:minimized"), window("0x2", "foo", "1")];
        let (next, changed) = reconcile(&swapped, Some("foo"), &previous, MARKER);
        assert!(!changed);
        assert!(next["foo"].focused);
    }

    #[test]
    fn test_sorted_by_key() {
        let windows = vec![window("0x1", "zed", "1"), window("0x2", "Alacritty", "1"), window("0x3", "mpv", "1")];
        let groups = group_windows(&windows, None, MARKER);
        let keys: Vec<&str> = sorted(&groups).iter().map(|g| g.key.as_str()).collect();
        assert_eq!(keys, vec!["alacritty", "mpv", "zed"]);
    }

    #[test]
    fn test_tooltip() {
        let windows = vec![window("0x1", "Firefox", "1"), window("0x2", "firefox", "special:minimized")];
        let groups = group_windows(&windows, None, MARKER);
        assert_eq!(groups["firefox"].tooltip(), "Firefox\n2 window(s) (1 minimized)\nClick: Focus/Restore | Right-click: Options");

        let groups = group_windows(&windows[..1], None, MARKER);
        assert_eq!(groups["firefox"].tooltip(), "Firefox\n1 window(s)\nClick: Focus | Right-click: Options");
    }

    #[test]
    fn test_activation_target() {
        let minimized = vec![window("0x1", "foo", "special:minimized"), window("0x2", "foo", "special:minimized")];
        let groups = group_windows(&minimized, None, MARKER);
        assert_eq!(groups["foo"].activation_target(None), Some(Activation::Restore("0x1".to_string())));

        let single = vec![window("0x1", "foo", "special:minimized"), window("0x2", "foo", "1")];
        let groups = group_windows(&single, None, MARKER);
        assert_eq!(groups["foo"].activation_target(Some("0x2")), Some(Activation::Focus("0x2".to_string())));

        let several = vec![window("0x1", "foo", "1"), window("0x2", "foo", "special:minimized"), window("0x3", "foo", "2")];
        let group = &group_windows(&several, None, MARKER)["foo"];
        assert_eq!(group.activation_target(None), Some(Activation::Focus("0x1".to_string())));
        assert_eq!(group.activation_target(Some("0x1")), Some(Activation::Focus("0x3".to_string())));
        assert_eq!(group.activation_target(Some("0x3")), Some(Activation::Focus("0x1".to_string())));
        assert_eq!(group.activation_target(Some("0xother")), Some(Activation::Focus("0x1".to_string())));
    }
}
