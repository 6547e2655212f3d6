//! Session configuration.
//!
//! Everything that depends on the running desktop session (XDG base
//! directories, current desktop, menu prefix) is resolved once into a
//! [`SessionConfig`] that is passed by reference to every component.

use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::debug;

use crate::entry::Locale;

/// Fixed defaults.
pub struct Defaults;

impl Defaults {
    /// Basename suffix shared by every application menu.
    pub const MENU_SUFFIX: &'static str = "applications.menu";
    /// Root `<Name>` used when the system menu does not declare one.
    pub const ROOT_MENU_NAME: &'static str = "Applications";
    /// Fallback for `$XDG_CONFIG_DIRS`.
    pub const CONFIG_DIRS: &'static str = "/etc/xdg";
    /// Fallback for `$XDG_DATA_DIRS`.
    pub const DATA_DIRS: &'static str = "/usr/local/share:/usr/share";
    /// Fallback for `$PATH`.
    pub const SEARCH_PATH: &'static str = "/usr/local/bin:/usr/bin:/bin";
    /// Quiet period before a batch of mutations is written out.
    pub const WRITE_QUIET_PERIOD: Duration = Duration::from_millis(1000);
    /// Vendor prefix of the Xfce menu.
    pub const XFCE_PREFIX: &'static str = "xfce-";
    /// Prefixes probed when neither the environment nor the session name
    /// selects one.
    pub const KNOWN_PREFIXES: &'static [&'static str] = &[
        "", "gnome-", "xfce-", "kf5-", "kf6-", "mate-", "cinnamon-", "lxde-", "lxqt-",
        "budgie-", "enlightenment-",
    ];
}

/// Identity of the active application menu.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuFileDescriptor {
    /// Vendor prefix, e.g. `xfce-` or empty.
    pub prefix: String,
    /// `<prefix>applications.menu`.
    pub basename: String,
    /// First system file with that basename, if installed.
    pub system_path: Option<PathBuf>,
    /// User-writable overlay written by this crate.
    pub user_path: PathBuf,
}

/// Resolved per-session configuration.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// `$HOME`.
    pub home: PathBuf,
    /// `$XDG_CONFIG_HOME`.
    pub config_home: PathBuf,
    /// `$XDG_CONFIG_DIRS`, most important first.
    pub config_dirs: Vec<PathBuf>,
    /// `$XDG_DATA_HOME`.
    pub data_home: PathBuf,
    /// `$XDG_DATA_DIRS`, most important first.
    pub data_dirs: Vec<PathBuf>,
    /// `$XDG_CURRENT_DESKTOP` split on `:`.
    pub current_desktops: Vec<String>,
    /// Locale used to pick translated names.
    pub locale: Option<Locale>,
    /// Directories searched for `TryExec`/`Exec` programs.
    pub search_path: Vec<PathBuf>,
    /// The active menu.
    pub menu: MenuFileDescriptor,
    /// Command line of the installer, followed by the install arguments.
    pub install_command: Vec<String>,
    /// Fire-and-forget command run after every successful write.
    pub cache_refresh_command: Option<Vec<String>>,
    /// Quiet period for write coalescing.
    pub write_quiet_period: Duration,
}

impl SessionConfig {
    /// Reads the live process environment.
    pub fn from_env() -> Self {
        let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("/tmp"));
        Self::from_lookup(home, |key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary variable lookup.
    ///
    /// ```
    /// use std::path::PathBuf;
    /// use xdg_menu_tree::SessionConfig;
    ///
    /// let config = SessionConfig::from_lookup(PathBuf::from("/home/u"), |key| match key {
    ///     "XDG_MENU_PREFIX" => Some("xfce-".to_string()),
    ///     _ => None,
    /// });
    /// assert_eq!(config.menu.basename, "xfce-applications.menu");
    /// assert_eq!(config.config_home, PathBuf::from("/home/u/.config"));
    /// ```
    pub fn from_lookup(home: PathBuf, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_empty = |key: &str| lookup(key).filter(|value| !value.is_empty());

        let config_home = non_empty("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|| home.join(".config"));
        let data_home = non_empty("XDG_DATA_HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|| home.join(".local").join("share"));
        let config_dirs = split_paths(
            &non_empty("XDG_CONFIG_DIRS").unwrap_or_else(|| Defaults::CONFIG_DIRS.to_string()),
        );
        let data_dirs = split_paths(
            &non_empty("XDG_DATA_DIRS").unwrap_or_else(|| Defaults::DATA_DIRS.to_string()),
        );
        let search_path = split_paths(
            &non_empty("PATH").unwrap_or_else(|| Defaults::SEARCH_PATH.to_string()),
        );
        let current_desktops: Vec<String> = non_empty("XDG_CURRENT_DESKTOP")
            .map(|value| {
                value
                    .split(':')
                    .filter(|de| !de.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        let prefix = non_empty("XDG_MENU_PREFIX")
            .or_else(|| {
                current_desktops
                    .iter()
                    .find_map(|de| prefix_for_desktop(de))
                    .or_else(|| non_empty("DESKTOP_SESSION").and_then(|s| prefix_for_desktop(&s)))
                    .map(str::to_string)
                    .filter(|prefix| menu_exists(&config_home, &config_dirs, prefix))
            })
            .or_else(|| {
                Defaults::KNOWN_PREFIXES
                    .iter()
                    .find(|prefix| menu_exists(&config_home, &config_dirs, prefix))
                    .map(|prefix| prefix.to_string())
            })
            .unwrap_or_default();

        let menu = describe_menu(&prefix, &config_home, &config_dirs);
        debug!(
            "Session menu {} (system file {:?})",
            menu.basename, menu.system_path
        );

        Self {
            locale: Locale::from_lookup(&lookup),
            home,
            config_home,
            config_dirs,
            data_home,
            data_dirs,
            current_desktops,
            search_path,
            menu,
            install_command: vec![
                "xdg-desktop-menu".to_string(),
                "install".to_string(),
                "--noupdate".to_string(),
                "--novendor".to_string(),
            ],
            cache_refresh_command: Some(vec![
                "xdg-desktop-menu".to_string(),
                "forceupdate".to_string(),
            ]),
            write_quiet_period: Defaults::WRITE_QUIET_PERIOD,
        }
    }

    /// Switches to another menu prefix, re-deriving the menu descriptor.
    pub fn with_prefix(mut self, prefix: &str) -> Self {
        self.menu = describe_menu(prefix, &self.config_home, &self.config_dirs);
        self
    }

    /// The vendor prefix of the active menu.
    pub fn prefix(&self) -> &str {
        &self.menu.prefix
    }

    /// Config directories, user first.
    pub fn all_config_dirs(&self) -> Vec<PathBuf> {
        std::iter::once(self.config_home.clone())
            .chain(self.config_dirs.iter().cloned())
            .collect()
    }

    /// Data directories, user first.
    pub fn all_data_dirs(&self) -> Vec<PathBuf> {
        std::iter::once(self.data_home.clone())
            .chain(self.data_dirs.iter().cloned())
            .collect()
    }

    /// `$XDG_DATA_HOME/applications`.
    pub fn user_applications_dir(&self) -> PathBuf {
        self.data_home.join("applications")
    }

    /// `$XDG_DATA_HOME/desktop-directories`.
    pub fn user_directories_dir(&self) -> PathBuf {
        self.data_home.join("desktop-directories")
    }

    /// Where `xdg-desktop-menu` keeps its generated fragments.
    pub fn merged_fragments_dir(&self) -> PathBuf {
        self.config_home.join("menus").join("applications-merged")
    }

    /// System `applications` directories, most important first.
    pub fn system_applications_dirs(&self) -> Vec<PathBuf> {
        self.data_dirs.iter().map(|d| d.join("applications")).collect()
    }

    /// System `desktop-directories` directories, most important first.
    pub fn system_directories_dirs(&self) -> Vec<PathBuf> {
        self.data_dirs
            .iter()
            .map(|d| d.join("desktop-directories"))
            .collect()
    }

    /// Whether `path` lives under a system (non user-writable) data or
    /// config directory.
    pub fn is_system_path(&self, path: &Path) -> bool {
        if path.starts_with(&self.data_home) || path.starts_with(&self.config_home) {
            return false;
        }
        self.data_dirs
            .iter()
            .chain(self.config_dirs.iter())
            .any(|dir| path.starts_with(dir))
    }
}

fn split_paths(value: &str) -> Vec<PathBuf> {
    value
        .split(':')
        .filter(|p| !p.is_empty())
        .map(PathBuf::from)
        .collect()
}

/// Menu prefix conventionally used by a desktop environment.
pub fn prefix_for_desktop(desktop: &str) -> Option<&'static str> {
    let desktop = desktop.to_ascii_lowercase();
    let prefix = match desktop.as_str() {
        "xfce" | "xubuntu" => "xfce-",
        "gnome" | "gnome-classic" | "gnome-flashback" | "ubuntu" | "unity" | "pantheon" => {
            "gnome-"
        }
        "kde" | "plasma" => "kf5-",
        "mate" => "mate-",
        "x-cinnamon" | "cinnamon" => "cinnamon-",
        "lxde" => "lxde-",
        "lxqt" => "lxqt-",
        "budgie" | "budgie-desktop" => "budgie-",
        "enlightenment" => "enlightenment-",
        _ => return None,
    };
    Some(prefix)
}

fn menu_exists(config_home: &Path, config_dirs: &[PathBuf], prefix: &str) -> bool {
    let basename = format!("{}{}", prefix, Defaults::MENU_SUFFIX);
    std::iter::once(config_home)
        .chain(config_dirs.iter().map(PathBuf::as_path))
        .any(|dir| dir.join("menus").join(&basename).is_file())
}

fn describe_menu(prefix: &str, config_home: &Path, config_dirs: &[PathBuf]) -> MenuFileDescriptor {
    let basename = format!("{}{}", prefix, Defaults::MENU_SUFFIX);
    let system_path = config_dirs
        .iter()
        .map(|dir| dir.join("menus").join(&basename))
        .find(|path| path.is_file());
    MenuFileDescriptor {
        prefix: prefix.to_string(),
        user_path: config_home.join("menus").join(&basename),
        basename,
        system_path,
    }
}
