//! `.menu` document parsing and merging.
//!
//! Produces a [`MenuDef`] tree with every `<MergeFile>`, `<MergeDir>` and
//! `<DefaultMergeDirs>` spliced in place, relative paths made absolute, the
//! `Default*Dirs` shortcuts expanded, and same-named sibling menus folded
//! together.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use roxmltree::{Document, Node, ParsingOptions};
use tracing::{debug, warn};

use crate::config::SessionConfig;
use crate::error::LoadError;

/// A category/filename predicate from `<Include>`/`<Exclude>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Matcher {
    /// `<Filename>`: matches a desktop-file id.
    Filename(String),
    /// `<Category>`.
    Category(String),
    /// `<All/>`.
    All,
    /// `<And>`.
    And(Vec<Matcher>),
    /// `<Or>`.
    Or(Vec<Matcher>),
    /// `<Not>`: none of the children match.
    Not(Vec<Matcher>),
}

impl Matcher {
    /// Evaluates the predicate for an entry.
    pub fn matches(&self, desktop_id: &str, categories: &[String]) -> bool {
        match self {
            Self::Filename(name) => name == desktop_id,
            Self::Category(category) => categories.iter().any(|c| c == category),
            Self::All => true,
            Self::And(children) => children.iter().all(|m| m.matches(desktop_id, categories)),
            Self::Or(children) => children.iter().any(|m| m.matches(desktop_id, categories)),
            Self::Not(children) => !children.iter().any(|m| m.matches(desktop_id, categories)),
        }
    }
}

/// An `<Include>` or `<Exclude>` block; children are OR-ed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rule {
    /// Adds matching pool entries.
    Include(Vec<Matcher>),
    /// Removes matching entries from the result so far.
    Exclude(Vec<Matcher>),
}

/// Which items a `<Merge>` layout token stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeKind {
    /// Submenus only.
    Menus,
    /// Entries only.
    Files,
    /// Both, interleaved.
    All,
}

/// One element of a `<Layout>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LayoutItem {
    /// `<Menuname>`.
    Menuname(String),
    /// `<Filename>`.
    Filename(String),
    /// `<Separator/>`.
    Separator,
    /// `<Merge type=…/>`.
    Merge(MergeKind),
}

/// One `<Menu>` after merging.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MenuDef {
    /// `<Name>`.
    pub name: String,
    /// `<Directory>` values, in document order (the last resolvable wins).
    pub directories: Vec<String>,
    /// `<DirectoryDir>`s, lowest priority first.
    pub directory_dirs: Vec<PathBuf>,
    /// `<AppDir>`s, lowest priority first.
    pub app_dirs: Vec<PathBuf>,
    /// Include/exclude rules in document order.
    pub rules: Vec<Rule>,
    /// `<OnlyUnallocated/>` or `<NotOnlyUnallocated/>`, last one wins;
    /// `None` when neither appears.
    pub only_unallocated: Option<bool>,
    /// `<Deleted/>` or `<NotDeleted/>`, last one wins; `None` when neither
    /// appears.
    pub deleted: Option<bool>,
    /// `<Layout>`, if any.
    pub layout: Option<Vec<LayoutItem>>,
    /// `<DefaultLayout>`, if any.
    pub default_layout: Option<Vec<LayoutItem>>,
    /// Child menus.
    pub submenus: Vec<MenuDef>,
}

impl MenuDef {
    /// Whether the menu only takes entries no other menu claimed.
    pub fn is_only_unallocated(&self) -> bool {
        self.only_unallocated.unwrap_or(false)
    }

    /// Whether the menu is deleted.
    pub fn is_deleted(&self) -> bool {
        self.deleted.unwrap_or(false)
    }

    /// Folds `other` into `self`: `other`'s content is appended, so it wins
    /// wherever later definitions take priority.
    fn absorb(&mut self, other: MenuDef) {
        self.directories.extend(other.directories);
        self.directory_dirs.extend(other.directory_dirs);
        self.app_dirs.extend(other.app_dirs);
        self.rules.extend(other.rules);
        if other.only_unallocated.is_some() {
            self.only_unallocated = other.only_unallocated;
        }
        if other.deleted.is_some() {
            self.deleted = other.deleted;
        }
        if other.layout.is_some() {
            self.layout = other.layout;
        }
        if other.default_layout.is_some() {
            self.default_layout = other.default_layout;
        }
        self.submenus.extend(other.submenus);
    }

    /// Merges same-named sibling menus, recursively. The first occurrence
    /// keeps its position.
    fn consolidate(&mut self) {
        let mut merged: Vec<MenuDef> = Vec::with_capacity(self.submenus.len());
        for submenu in std::mem::take(&mut self.submenus) {
            match merged.iter_mut().find(|m| m.name == submenu.name) {
                Some(existing) => existing.absorb(submenu),
                None => merged.push(submenu),
            }
        }
        for submenu in &mut merged {
            submenu.consolidate();
        }
        self.submenus = merged;
    }
}

/// Tri-state flags so that merged documents can override each other.
#[derive(Default)]
struct Flags {
    only_unallocated: Option<bool>,
    deleted: Option<bool>,
}

/// Reads `.menu` files for one session.
pub struct MenuParser<'a> {
    config: &'a SessionConfig,
    active: HashSet<PathBuf>,
}

impl<'a> MenuParser<'a> {
    /// Parser bound to a session.
    pub fn new(config: &'a SessionConfig) -> Self {
        Self {
            config,
            active: HashSet::new(),
        }
    }

    /// Parses and merges the menu rooted at `path`.
    pub fn parse_file(&mut self, path: &Path) -> Result<MenuDef, LoadError> {
        let mut menu = self.read_root(path)?;
        menu.consolidate();
        Ok(menu)
    }

    fn read_root(&mut self, path: &Path) -> Result<MenuDef, LoadError> {
        let failed = |reason: String| LoadError::TreeLoadFailed {
            path: path.to_path_buf(),
            reason,
        };
        let content = std::fs::read_to_string(path).map_err(|e| failed(e.to_string()))?;
        let options = ParsingOptions {
            allow_dtd: true,
            ..ParsingOptions::default()
        };
        let document =
            Document::parse_with_options(&content, options).map_err(|e| failed(e.to_string()))?;
        let root = document.root_element();
        if root.tag_name().name() != "Menu" {
            return Err(failed(format!(
                "root element is <{}>, expected <Menu>",
                root.tag_name().name()
            )));
        }

        let canonical = canonical(path);
        self.active.insert(canonical.clone());
        let base_dir = path.parent().unwrap_or(Path::new("/")).to_path_buf();
        let mut menu = MenuDef::default();
        let mut flags = Flags::default();
        let result = self.read_menu(root, path, &base_dir, &mut menu, &mut flags);
        self.active.remove(&canonical);
        result?;
        apply_flags(&mut menu, flags);
        debug!("Parsed menu file {}", path.display());
        Ok(menu)
    }

    fn read_menu(
        &mut self,
        element: Node<'_, '_>,
        file: &Path,
        base_dir: &Path,
        menu: &mut MenuDef,
        flags: &mut Flags,
    ) -> Result<(), LoadError> {
        for child in element.children().filter(Node::is_element) {
            match child.tag_name().name() {
                "Name" => {
                    if menu.name.is_empty() {
                        menu.name = text(child);
                    }
                }
                "Directory" => menu.directories.push(text(child)),
                "AppDir" => menu.app_dirs.push(resolve(base_dir, &text(child))),
                "DirectoryDir" => menu.directory_dirs.push(resolve(base_dir, &text(child))),
                "DefaultAppDirs" => menu.app_dirs.extend(
                    self.config
                        .all_data_dirs()
                        .iter()
                        .rev()
                        .map(|dir| dir.join("applications")),
                ),
                "DefaultDirectoryDirs" => menu.directory_dirs.extend(
                    self.config
                        .all_data_dirs()
                        .iter()
                        .rev()
                        .map(|dir| dir.join("desktop-directories")),
                ),
                "OnlyUnallocated" => flags.only_unallocated = Some(true),
                "NotOnlyUnallocated" => flags.only_unallocated = Some(false),
                "Deleted" => flags.deleted = Some(true),
                "NotDeleted" => flags.deleted = Some(false),
                "Include" => menu.rules.push(Rule::Include(matchers(child))),
                "Exclude" => menu.rules.push(Rule::Exclude(matchers(child))),
                "Layout" => menu.layout = Some(layout(child)),
                "DefaultLayout" => menu.default_layout = Some(layout(child)),
                "Menu" => {
                    let mut submenu = MenuDef::default();
                    let mut sub_flags = Flags::default();
                    self.read_menu(child, file, base_dir, &mut submenu, &mut sub_flags)?;
                    apply_flags(&mut submenu, sub_flags);
                    menu.submenus.push(submenu);
                }
                "MergeFile" => {
                    let merge_type = child.attribute("type").unwrap_or("path");
                    let target = if merge_type == "parent" {
                        self.parent_menu_file(file)
                    } else {
                        Some(resolve(base_dir, &text(child)))
                    };
                    if let Some(target) = target {
                        self.merge_from(&target, menu, flags);
                    }
                }
                "MergeDir" => {
                    let dir = resolve(base_dir, &text(child));
                    self.merge_dir(&dir, menu, flags);
                }
                "DefaultMergeDirs" => {
                    let name = file
                        .file_stem()
                        .map(|s| s.to_string_lossy().into_owned())
                        .unwrap_or_default();
                    let name = name.strip_prefix(self.config.prefix()).unwrap_or(&name);
                    let merged = format!("{}-merged", name);
                    let dirs: Vec<PathBuf> = self
                        .config
                        .all_config_dirs()
                        .iter()
                        .rev()
                        .map(|dir| dir.join("menus").join(&merged))
                        .collect();
                    for dir in dirs {
                        self.merge_dir(&dir, menu, flags);
                    }
                }
                other => debug!("Ignoring <{}> in {}", other, file.display()),
            }
        }
        Ok(())
    }

    /// Splices the root `<Menu>` of `target` into `menu`. Missing files and
    /// merge loops are skipped.
    fn merge_from(&mut self, target: &Path, menu: &mut MenuDef, flags: &mut Flags) {
        if !target.is_file() {
            debug!("Merge file {} does not exist", target.display());
            return;
        }
        if self.active.contains(&canonical(target)) {
            warn!("Ignoring recursive merge of {}", target.display());
            return;
        }
        match self.read_root(target) {
            Ok(mut merged) => {
                merged.name.clear();
                if merged.only_unallocated.is_some() {
                    flags.only_unallocated = merged.only_unallocated;
                }
                if merged.deleted.is_some() {
                    flags.deleted = merged.deleted;
                }
                menu.absorb(merged);
            }
            Err(e) => warn!("Skipping merge file: {}", e),
        }
    }

    fn merge_dir(&mut self, dir: &Path, menu: &mut MenuDef, flags: &mut Flags) {
        let Ok(read_dir) = std::fs::read_dir(dir) else {
            return;
        };
        let mut files: Vec<PathBuf> = read_dir
            .flatten()
            .map(|entry| entry.path())
            .filter(|path| path.extension().is_some_and(|ext| ext == "menu"))
            .collect();
        files.sort();
        for file in files {
            self.merge_from(&file, menu, flags);
        }
    }

    /// The next file with the same path relative to a `menus` config dir,
    /// searching the config dirs after the one that holds `file`.
    fn parent_menu_file(&self, file: &Path) -> Option<PathBuf> {
        let dirs = self.config.all_config_dirs();
        let menus_dirs: Vec<PathBuf> = dirs.iter().map(|dir| dir.join("menus")).collect();
        let owner = menus_dirs
            .iter()
            .position(|dir| file.starts_with(dir))
            .map(|index| (index, file.strip_prefix(&menus_dirs[index]).ok()));
        match owner {
            Some((index, Some(relative))) => menus_dirs[index + 1..]
                .iter()
                .map(|dir| dir.join(relative))
                .find(|candidate| candidate.is_file()),
            _ => {
                let basename = file.file_name()?;
                let own = canonical(file);
                menus_dirs
                    .iter()
                    .map(|dir| dir.join(basename))
                    .find(|candidate| candidate.is_file() && canonical(candidate) != own)
            }
        }
    }
}

fn apply_flags(menu: &mut MenuDef, flags: Flags) {
    if flags.only_unallocated.is_some() {
        menu.only_unallocated = flags.only_unallocated;
    }
    if flags.deleted.is_some() {
        menu.deleted = flags.deleted;
    }
}

fn text(node: Node<'_, '_>) -> String {
    node.text().map(str::trim).unwrap_or_default().to_string()
}

fn resolve(base_dir: &Path, value: &str) -> PathBuf {
    let path = Path::new(value);
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base_dir.join(path)
    }
}

/// Canonical form of a path, or the path itself when it cannot be resolved.
pub fn canonical(path: &Path) -> PathBuf {
    std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}

fn matchers(element: Node<'_, '_>) -> Vec<Matcher> {
    element
        .children()
        .filter(Node::is_element)
        .filter_map(|child| match child.tag_name().name() {
            "Filename" => Some(Matcher::Filename(text(child))),
            "Category" => Some(Matcher::Category(text(child))),
            "All" => Some(Matcher::All),
            "And" => Some(Matcher::And(matchers(child))),
            "Or" => Some(Matcher::Or(matchers(child))),
            "Not" => Some(Matcher::Not(matchers(child))),
            _ => None,
        })
        .collect()
}

fn layout(element: Node<'_, '_>) -> Vec<LayoutItem> {
    element
        .children()
        .filter(Node::is_element)
        .filter_map(|child| match child.tag_name().name() {
            "Menuname" => Some(LayoutItem::Menuname(text(child))),
            "Filename" => Some(LayoutItem::Filename(text(child))),
            "Separator" => Some(LayoutItem::Separator),
            "Merge" => match child.attribute("type") {
                Some("menus") => Some(LayoutItem::Merge(MergeKind::Menus)),
                Some("files") => Some(LayoutItem::Merge(MergeKind::Files)),
                Some("all") => Some(LayoutItem::Merge(MergeKind::All)),
                _ => None,
            },
            _ => None,
        })
        .collect()
}
