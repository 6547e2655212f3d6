//! Icon presence checks and fallback selection.
//!
//! Theme resolution proper belongs to the toolkit. The loader only needs to
//! know whether a name can be found, so it can swap in a fallback while
//! keeping the requested name for saving.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use tracing::debug;
use walkdir::WalkDir;

use crate::config::SessionConfig;

/// Fallbacks for directories.
pub const DIRECTORY_FALLBACKS: &[&str] = &["folder", "inode-directory", "folder-open"];
/// Fallbacks for applications.
pub const APPLICATION_FALLBACKS: &[&str] = &[
    "application-x-executable",
    "application-default-icon",
    "exec",
];
/// Fallbacks for links.
pub const LINK_FALLBACKS: &[&str] = &["text-html", "emblem-web", "applications-internet"];
/// Used when nothing else resolves.
pub const GENERIC_ICON: &str = "image-missing";

const ICON_EXTENSIONS: &[&str] = &["png", "svg", "svgz", "xpm"];

/// Answers whether an icon name or path can be displayed.
pub trait IconLookup {
    /// `true` when `name` is resolvable.
    fn has_icon(&self, name: &str) -> bool;
}

/// Which fallback list applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IconPurpose {
    /// A menu directory.
    Directory,
    /// An application launcher.
    Application,
    /// A URL link.
    Link,
}

impl IconPurpose {
    fn fallbacks(self) -> &'static [&'static str] {
        match self {
            Self::Directory => DIRECTORY_FALLBACKS,
            Self::Application => APPLICATION_FALLBACKS,
            Self::Link => LINK_FALLBACKS,
        }
    }
}

/// Requested icon plus the name actually usable for display.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct IconRef {
    /// Value of the `Icon` key, kept verbatim for saving.
    pub requested: Option<String>,
    /// Name or path to display.
    pub resolved: String,
    /// `true` when `resolved` is a fallback.
    pub missing: bool,
}

impl IconRef {
    /// Icon exactly as requested, assumed present.
    pub fn named(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            requested: Some(name.clone()),
            resolved: name,
            missing: false,
        }
    }
}

/// Picks the displayable icon for `requested`.
///
/// ```
/// use xdg_menu_tree::icon::{resolve, IconLookup, IconPurpose};
///
/// struct Only(&'static str);
/// impl IconLookup for Only {
///     fn has_icon(&self, name: &str) -> bool { name == self.0 }
/// }
///
/// let icon = resolve(Some("no-such-icon"), IconPurpose::Directory, &Only("folder"));
/// assert_eq!(icon.requested.as_deref(), Some("no-such-icon"));
/// assert_eq!(icon.resolved, "folder");
/// assert!(icon.missing);
/// ```
pub fn resolve(requested: Option<&str>, purpose: IconPurpose, lookup: &dyn IconLookup) -> IconRef {
    if let Some(name) = requested.filter(|name| lookup.has_icon(name)) {
        return IconRef::named(name);
    }
    let resolved = purpose
        .fallbacks()
        .iter()
        .find(|name| lookup.has_icon(name))
        .copied()
        .unwrap_or(GENERIC_ICON);
    IconRef {
        requested: requested.map(str::to_string),
        resolved: resolved.to_string(),
        missing: true,
    }
}

/// Icon names found in the icon and pixmap directories of the session.
#[derive(Debug, Default)]
pub struct IconIndex {
    names: HashSet<String>,
}

impl IconIndex {
    /// Scans `$XDG_DATA_DIRS/icons`, `~/.icons` and the pixmap dirs.
    pub fn scan(config: &SessionConfig) -> Self {
        let mut roots: Vec<PathBuf> = config
            .all_data_dirs()
            .iter()
            .flat_map(|dir| [dir.join("icons"), dir.join("pixmaps")])
            .collect();
        roots.push(config.home.join(".icons"));
        Self::scan_dirs(&roots)
    }

    /// Scans the given roots recursively.
    pub fn scan_dirs(roots: &[PathBuf]) -> Self {
        let mut names = HashSet::new();
        for root in roots.iter().filter(|root| root.is_dir()) {
            for entry in WalkDir::new(root).follow_links(true).into_iter().flatten() {
                let path = entry.path();
                let known = path
                    .extension()
                    .and_then(|ext| ext.to_str())
                    .is_some_and(|ext| ICON_EXTENSIONS.contains(&ext));
                if known {
                    if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                        names.insert(stem.to_string());
                    }
                }
            }
        }
        debug!("Indexed {} icon names", names.len());
        Self { names }
    }

    /// Index over an explicit set of names.
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: names.into_iter().map(Into::into).collect(),
        }
    }
}

impl IconLookup for IconIndex {
    fn has_icon(&self, name: &str) -> bool {
        if Path::new(name).is_absolute() {
            return Path::new(name).is_file();
        }
        let stem = ICON_EXTENSIONS
            .iter()
            .find_map(|ext| name.strip_suffix(&format!(".{}", ext)))
            .unwrap_or(name);
        self.names.contains(stem)
    }
}
