//! Builds a [`MenuTree`] from the session's `.menu` files and the installed
//! entry files.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::rc::Rc;

use tracing::{debug, info};
use walkdir::WalkDir;

use crate::config::{Defaults, SessionConfig};
use crate::entry::{DesktopEntry, EntryType};
use crate::error::{Diagnostic, EntryError, LoadError};
use crate::icon::{self, IconLookup, IconPurpose};
use crate::menu_file::{self, LayoutItem, MenuDef, MenuParser, MergeKind, Rule};
use crate::tree::{
    ApplicationData, DirectoryData, DirectoryOrigin, LinkData, MenuNode, MenuTree, NodeId,
    NodeKind,
};

/// Result of a successful load.
#[derive(Debug, Clone)]
pub struct LoadedMenu {
    /// The menu tree.
    pub tree: MenuTree,
    /// `<Name>` of the root menu.
    pub root_name: String,
    /// The `.menu` file the tree was read from.
    pub menu_file: PathBuf,
    /// Entry files that were skipped, with reasons.
    pub diagnostics: Vec<Diagnostic>,
}

/// Loads menu trees for one session.
pub struct MenuTreeLoader<'a> {
    config: &'a SessionConfig,
    icons: &'a dyn IconLookup,
}

impl<'a> MenuTreeLoader<'a> {
    /// Loader bound to a session and an icon lookup.
    pub fn new(config: &'a SessionConfig, icons: &'a dyn IconLookup) -> Self {
        Self { config, icons }
    }

    /// First `menus/<basename>` in the config dirs, user overlay first.
    pub fn locate(&self, basename: &str) -> Option<PathBuf> {
        self.config
            .all_config_dirs()
            .into_iter()
            .map(|dir| dir.join("menus").join(basename))
            .find(|path| path.is_file())
    }

    /// Loads the session menu, falling back to the unprefixed one.
    pub fn load_default(&self) -> Result<LoadedMenu, LoadError> {
        let mut candidates = vec![self.config.menu.basename.clone()];
        if !self.config.prefix().is_empty() {
            candidates.push(Defaults::MENU_SUFFIX.to_string());
        }
        self.load_first(&candidates)
    }

    /// Loads the menu called `basename`.
    pub fn load(&self, basename: &str) -> Result<LoadedMenu, LoadError> {
        self.load_first(&[basename.to_string()])
    }

    fn load_first(&self, candidates: &[String]) -> Result<LoadedMenu, LoadError> {
        let path = candidates
            .iter()
            .find_map(|basename| self.locate(basename))
            .ok_or_else(|| LoadError::NoMenuFound {
                candidates: candidates.to_vec(),
            })?;
        self.load_file(&path)
    }

    /// Loads the menu rooted at an explicit file.
    pub fn load_file(&self, path: &Path) -> Result<LoadedMenu, LoadError> {
        let definition = MenuParser::new(self.config).parse_file(path)?;
        let root_name = if definition.name.is_empty() {
            Defaults::ROOT_MENU_NAME.to_string()
        } else {
            definition.name.clone()
        };

        let mut resolver = Resolver::new(self);
        let default_layout = vec![
            LayoutItem::Merge(MergeKind::Menus),
            LayoutItem::Merge(MergeKind::Files),
        ];
        let mut resolved = resolver
            .resolve(&definition, &[], &[], &default_layout)
            .ok_or_else(|| LoadError::TreeLoadFailed {
                path: path.to_path_buf(),
                reason: "root menu is deleted".to_string(),
            })?;

        let mut allocated = BTreeSet::new();
        resolved.collect_allocated(&mut allocated);
        resolved.allocate_remaining(&allocated);

        let mut tree = MenuTree::new(root_name.clone());
        let mut seen = HashSet::new();
        let root = tree.root();
        resolver.build(&resolved, &mut tree, root, &mut seen);

        info!(
            "Loaded menu {} ({} nodes, {} skipped files)",
            path.display(),
            tree.walk().len(),
            resolver.diagnostics.len()
        );
        Ok(LoadedMenu {
            tree,
            root_name,
            menu_file: path.to_path_buf(),
            diagnostics: resolver.diagnostics,
        })
    }

    /// Reads one entry file into a detached node.
    pub fn node_for_file(&self, path: &Path) -> Result<MenuNode, EntryError> {
        let entry = DesktopEntry::parse_file(path)?;
        Ok(self.node_from_entry(entry, path, None))
    }

    fn node_from_entry(
        &self,
        entry: DesktopEntry,
        path: &Path,
        desktop_id: Option<String>,
    ) -> MenuNode {
        let locale = self.config.locale.as_ref();
        let (kind, purpose) = match entry.entry_type {
            EntryType::Application => (
                NodeKind::Application(ApplicationData {
                    executable: entry.exec.clone(),
                    categories: dedup(&entry.categories),
                    desktop_id,
                }),
                IconPurpose::Application,
            ),
            EntryType::Link => (
                NodeKind::Link(LinkData {
                    url: entry.url.clone().unwrap_or_default(),
                    categories: dedup(&entry.categories),
                    desktop_id,
                }),
                IconPurpose::Link,
            ),
            EntryType::Directory => (
                NodeKind::Directory(DirectoryData {
                    origin: self.directory_origin(path),
                    children: Vec::new(),
                }),
                IconPurpose::Directory,
            ),
        };

        let mut node = match kind {
            NodeKind::Directory(_) => MenuNode::directory(""),
            _ => MenuNode::application(""),
        };
        node.kind = kind;
        node.display_name = entry.name.get(locale).to_string();
        node.comment = entry
            .comment
            .as_ref()
            .map(|comment| comment.get(locale).to_string())
            .filter(|comment| !comment.is_empty());
        node.icon = icon::resolve(entry.icon.as_deref(), purpose, self.icons);
        node.visible = entry.is_visible_in(&self.config.current_desktops);
        node.source_file = Some(path.to_path_buf());
        node.entry = Some(entry);
        node
    }

    fn directory_origin(&self, path: &Path) -> DirectoryOrigin {
        if !path.starts_with(self.config.user_directories_dir()) {
            return DirectoryOrigin::System;
        }
        let has_system_copy = path.file_name().is_some_and(|name| {
            self.config
                .system_directories_dirs()
                .iter()
                .any(|dir| dir.join(name).is_file())
        });
        if has_system_copy {
            DirectoryOrigin::UserOverride
        } else {
            DirectoryOrigin::Custom
        }
    }
}

/// Every `.desktop` file under an application dir with its desktop-file
/// id: the relative path with `/` turned into `-`.
pub fn desktop_files(dir: &Path) -> Vec<(String, PathBuf)> {
    let mut files = Vec::new();
    if !dir.is_dir() {
        return files;
    }
    for item in WalkDir::new(dir).follow_links(true).sort_by_file_name() {
        let Ok(item) = item else { continue };
        let path = item.path();
        if !item.file_type().is_file() || path.extension().is_none_or(|ext| ext != "desktop") {
            continue;
        }
        if let Ok(relative) = path.strip_prefix(dir) {
            files.push((desktop_id(relative), path.to_path_buf()));
        }
    }
    files
}

/// Desktop-file id of a path relative to its application dir.
pub fn desktop_id(relative: &Path) -> String {
    relative.to_string_lossy().replace('/', "-")
}

fn dedup(categories: &[String]) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(categories.len());
    for category in categories {
        if !out.contains(category) {
            out.push(category.clone());
        }
    }
    out
}

// ============================================================================
// Resolution
// ============================================================================

struct PoolEntry {
    path: PathBuf,
    entry: Rc<DesktopEntry>,
}

type Pool = BTreeMap<String, Rc<PoolEntry>>;

struct ResolvedMenu {
    name: String,
    directory: Option<(PathBuf, Rc<DesktopEntry>)>,
    pool: Rc<Pool>,
    rules: Vec<Rule>,
    only_unallocated: bool,
    included: BTreeSet<String>,
    layout: Vec<LayoutItem>,
    submenus: Vec<ResolvedMenu>,
}

impl ResolvedMenu {
    fn collect_allocated(&self, allocated: &mut BTreeSet<String>) {
        if !self.only_unallocated {
            allocated.extend(self.included.iter().cloned());
        }
        for submenu in &self.submenus {
            submenu.collect_allocated(allocated);
        }
    }

    fn allocate_remaining(&mut self, allocated: &BTreeSet<String>) {
        if self.only_unallocated {
            self.included = evaluate(&self.rules, &self.pool)
                .into_iter()
                .filter(|id| !allocated.contains(id))
                .collect();
        }
        for submenu in &mut self.submenus {
            submenu.allocate_remaining(allocated);
        }
    }

    fn sort_name(&self, locale: Option<&crate::entry::Locale>) -> String {
        self.directory
            .as_ref()
            .map(|(_, entry)| entry.name.get(locale).to_string())
            .unwrap_or_else(|| self.name.clone())
            .to_lowercase()
    }
}

fn evaluate(rules: &[Rule], pool: &Pool) -> BTreeSet<String> {
    let mut included = BTreeSet::new();
    for rule in rules {
        match rule {
            Rule::Include(matchers) => {
                for (id, item) in pool {
                    if matchers.iter().any(|m| m.matches(id, &item.entry.categories)) {
                        included.insert(id.clone());
                    }
                }
            }
            Rule::Exclude(matchers) => included.retain(|id| {
                let categories = pool
                    .get(id)
                    .map(|item| item.entry.categories.as_slice())
                    .unwrap_or(&[]);
                !matchers.iter().any(|m| m.matches(id, categories))
            }),
        }
    }
    included
}

enum Slot<'r> {
    Menu(&'r ResolvedMenu),
    Entry(Rc<PoolEntry>, String),
    Separator,
}

struct Resolver<'l, 'a> {
    loader: &'l MenuTreeLoader<'a>,
    entries: HashMap<PathBuf, Option<Rc<DesktopEntry>>>,
    scans: HashMap<PathBuf, Rc<Vec<(String, PathBuf)>>>,
    diagnostics: Vec<Diagnostic>,
}

impl<'l, 'a> Resolver<'l, 'a> {
    fn new(loader: &'l MenuTreeLoader<'a>) -> Self {
        Self {
            loader,
            entries: HashMap::new(),
            scans: HashMap::new(),
            diagnostics: Vec::new(),
        }
    }

    fn resolve(
        &mut self,
        def: &MenuDef,
        inherited_app_dirs: &[PathBuf],
        inherited_directory_dirs: &[PathBuf],
        inherited_default_layout: &[LayoutItem],
    ) -> Option<ResolvedMenu> {
        if def.is_deleted() {
            debug!("Menu {} is deleted", def.name);
            return None;
        }
        let app_dirs: Vec<PathBuf> = inherited_app_dirs
            .iter()
            .chain(def.app_dirs.iter())
            .cloned()
            .collect();
        let directory_dirs: Vec<PathBuf> = inherited_directory_dirs
            .iter()
            .chain(def.directory_dirs.iter())
            .cloned()
            .collect();
        let default_layout = def
            .default_layout
            .clone()
            .unwrap_or_else(|| inherited_default_layout.to_vec());

        let pool = Rc::new(self.pool(&app_dirs));
        let directory = self.directory(&def.directories, &directory_dirs);
        let included = if def.is_only_unallocated() {
            BTreeSet::new()
        } else {
            evaluate(&def.rules, &pool)
        };
        let submenus = def
            .submenus
            .iter()
            .filter_map(|sub| self.resolve(sub, &app_dirs, &directory_dirs, &default_layout))
            .collect();

        Some(ResolvedMenu {
            name: def.name.clone(),
            directory,
            pool,
            rules: def.rules.clone(),
            only_unallocated: def.is_only_unallocated(),
            included,
            layout: def.layout.clone().unwrap_or(default_layout),
            submenus,
        })
    }

    fn scan(&mut self, dir: &Path) -> Rc<Vec<(String, PathBuf)>> {
        if let Some(found) = self.scans.get(dir) {
            return Rc::clone(found);
        }
        let files = Rc::new(desktop_files(dir));
        self.scans.insert(dir.to_path_buf(), Rc::clone(&files));
        files
    }

    fn pool(&mut self, app_dirs: &[PathBuf]) -> Pool {
        let mut pool = Pool::new();
        for dir in app_dirs {
            for (id, path) in self.scan(dir).iter() {
                let Some(entry) = self.entry(path) else {
                    continue;
                };
                if entry.entry_type == EntryType::Directory {
                    continue;
                }
                pool.insert(
                    id.clone(),
                    Rc::new(PoolEntry {
                        path: path.clone(),
                        entry,
                    }),
                );
            }
        }
        pool
    }

    fn entry(&mut self, path: &Path) -> Option<Rc<DesktopEntry>> {
        if let Some(cached) = self.entries.get(path) {
            return cached.clone();
        }
        let parsed = DesktopEntry::parse_file(path).and_then(|entry| {
            entry.validate_for_lookup(&self.loader.config.search_path)?;
            Ok(entry)
        });
        let result = match parsed {
            Ok(entry) => Some(Rc::new(entry)),
            Err(e) => {
                debug!("Skipping {}: {}", path.display(), e);
                self.diagnostics.push(Diagnostic {
                    path: path.to_path_buf(),
                    reason: e.to_string(),
                });
                None
            }
        };
        self.entries.insert(path.to_path_buf(), result.clone());
        result
    }

    fn directory(
        &mut self,
        names: &[String],
        directory_dirs: &[PathBuf],
    ) -> Option<(PathBuf, Rc<DesktopEntry>)> {
        for name in names.iter().rev() {
            for dir in directory_dirs.iter().rev() {
                let path = dir.join(name);
                if !path.is_file() {
                    continue;
                }
                if let Some(entry) = self.entry(&path) {
                    return Some((path, entry));
                }
            }
        }
        None
    }

    fn layout<'r>(&self, menu: &'r ResolvedMenu) -> Vec<Slot<'r>> {
        let locale = self.loader.config.locale.as_ref();
        let mentioned_menus: HashSet<&str> = menu
            .layout
            .iter()
            .filter_map(|item| match item {
                LayoutItem::Menuname(name) => Some(name.as_str()),
                _ => None,
            })
            .collect();
        let mentioned_files: HashSet<&str> = menu
            .layout
            .iter()
            .filter_map(|item| match item {
                LayoutItem::Filename(id) => Some(id.as_str()),
                _ => None,
            })
            .collect();

        let mut placed_menus: HashSet<usize> = HashSet::new();
        let mut placed_files: HashSet<String> = HashSet::new();
        let mut slots = Vec::new();

        for item in &menu.layout {
            match item {
                LayoutItem::Menuname(name) => {
                    if let Some((index, submenu)) = menu
                        .submenus
                        .iter()
                        .enumerate()
                        .find(|(i, m)| m.name == *name && !placed_menus.contains(i))
                    {
                        placed_menus.insert(index);
                        slots.push(Slot::Menu(submenu));
                    }
                }
                LayoutItem::Filename(id) => {
                    if menu.included.contains(id) && !placed_files.contains(id) {
                        if let Some(item) = menu.pool.get(id) {
                            placed_files.insert(id.clone());
                            slots.push(Slot::Entry(Rc::clone(item), id.clone()));
                        }
                    }
                }
                LayoutItem::Separator => slots.push(Slot::Separator),
                LayoutItem::Merge(kind) => {
                    let mut pending: Vec<(String, Slot<'r>)> = Vec::new();
                    if matches!(kind, MergeKind::Menus | MergeKind::All) {
                        for (index, submenu) in menu.submenus.iter().enumerate() {
                            if placed_menus.contains(&index)
                                || mentioned_menus.contains(submenu.name.as_str())
                            {
                                continue;
                            }
                            placed_menus.insert(index);
                            pending.push((submenu.sort_name(locale), Slot::Menu(submenu)));
                        }
                    }
                    if matches!(kind, MergeKind::Files | MergeKind::All) {
                        for id in &menu.included {
                            if placed_files.contains(id) || mentioned_files.contains(id.as_str()) {
                                continue;
                            }
                            let Some(item) = menu.pool.get(id) else {
                                continue;
                            };
                            placed_files.insert(id.clone());
                            let name = item.entry.name.get(locale).to_lowercase();
                            pending.push((name, Slot::Entry(Rc::clone(item), id.clone())));
                        }
                    }
                    pending.sort_by(|a, b| a.0.cmp(&b.0));
                    slots.extend(pending.into_iter().map(|(_, slot)| slot));
                }
            }
        }
        slots
    }

    fn build(
        &mut self,
        menu: &ResolvedMenu,
        tree: &mut MenuTree,
        parent: NodeId,
        seen: &mut HashSet<PathBuf>,
    ) {
        for slot in self.layout(menu) {
            match slot {
                Slot::Separator => {
                    tree.append(parent, MenuNode::separator());
                }
                Slot::Entry(item, id) => {
                    let node =
                        self.loader
                            .node_from_entry((*item.entry).clone(), &item.path, Some(id));
                    tree.append(parent, node);
                }
                Slot::Menu(submenu) => {
                    let Some((path, entry)) = &submenu.directory else {
                        debug!("Dropping menu {} without a directory file", submenu.name);
                        continue;
                    };
                    let real = menu_file::canonical(path);
                    if !seen.insert(real) {
                        debug!("Dropping duplicate directory {}", path.display());
                        continue;
                    }
                    let node = self.loader.node_from_entry((**entry).clone(), path, None);
                    if let Some(id) = tree.append(parent, node) {
                        self.build(submenu, tree, id, seen);
                    }
                }
            }
        }
    }
}
