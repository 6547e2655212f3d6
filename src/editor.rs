//! Tree mutations driven by the editor.
//!
//! Every operation acts on the current selection and returns the list of
//! [`MutationEvent`]s it produced. Filesystem side effects are best effort:
//! a failure is logged and reported as [`MutationEvent::FileOpFailed`], and
//! the in-memory change still goes through.

use std::fmt::Display;
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use tracing::{debug, info, warn};

use crate::config::SessionConfig;
use crate::entry::{DesktopEntry, join_list};
use crate::error::MutationError;
use crate::history::{History, HistoryEntry};
use crate::icon::IconLookup;
use crate::install::MenuInstaller;
use crate::loader::{self, MenuTreeLoader};
use crate::menu_file;
use crate::policy;
use crate::tree::{DirectoryOrigin, FieldKey, MenuNode, MenuTree, NodeId, NodeKind};

/// Direction of [`MenuEditor::move_relative`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Towards the first child.
    Up,
    /// Towards the last child.
    Down,
}

/// Something a mutation did.
#[derive(Debug, Clone, PartialEq)]
pub enum MutationEvent {
    /// A node was added.
    Inserted {
        /// New node.
        node: NodeId,
        /// Its directory.
        parent: NodeId,
        /// Its position.
        index: usize,
    },
    /// A node and its subtree left the tree.
    Removed {
        /// Removed node.
        node: NodeId,
    },
    /// A node was reloaded from a system file instead of being removed.
    Reverted {
        /// Reverted node.
        node: NodeId,
        /// File it was reloaded from.
        source: PathBuf,
    },
    /// A node changed position.
    Moved {
        /// Moved node.
        node: NodeId,
        /// Previous directory.
        from_parent: NodeId,
        /// New directory.
        to_parent: NodeId,
        /// New position.
        index: usize,
    },
    /// The direct children of a directory were sorted.
    ChildrenSorted {
        /// Sorted directory.
        parent: NodeId,
    },
    /// Categories were rewritten to match a new position.
    CategoriesChanged {
        /// Affected node.
        node: NodeId,
        /// Categories before.
        before: Vec<String>,
        /// Categories after.
        after: Vec<String>,
    },
    /// An editable field changed.
    FieldEdited {
        /// Affected node.
        node: NodeId,
        /// Field.
        key: FieldKey,
        /// Value before.
        before: String,
        /// Value after.
        after: String,
    },
    /// A node was saved to a user file.
    EntrySaved {
        /// Saved node.
        node: NodeId,
        /// File written.
        path: PathBuf,
    },
    /// Files were registered under a custom directory chain.
    Installed {
        /// Affected node.
        node: NodeId,
        /// Directory chain, outermost first.
        chain: Vec<PathBuf>,
    },
    /// Files were removed from a custom directory chain.
    Uninstalled {
        /// Affected node.
        node: NodeId,
        /// Directory chain, outermost first.
        chain: Vec<PathBuf>,
    },
    /// A user file was deleted.
    FileDeleted {
        /// Deleted file.
        path: PathBuf,
    },
    /// A filesystem side effect failed; the tree was updated anyway.
    FileOpFailed {
        /// File involved, if any.
        path: Option<PathBuf>,
        /// What went wrong.
        reason: String,
    },
}

/// Events produced by one mutation.
pub type MutationLog = Vec<MutationEvent>;

/// Owns the tree while it is being edited.
pub struct MenuEditor {
    tree: MenuTree,
    config: SessionConfig,
    selection: Option<NodeId>,
    history: History,
    installer: Box<dyn MenuInstaller>,
    icons: Rc<dyn IconLookup>,
}

impl MenuEditor {
    /// Editor over a loaded tree.
    pub fn new(
        tree: MenuTree,
        config: SessionConfig,
        installer: Box<dyn MenuInstaller>,
        icons: Rc<dyn IconLookup>,
    ) -> Self {
        Self {
            tree,
            config,
            selection: None,
            history: History::new(),
            installer,
            icons,
        }
    }

    /// The tree.
    pub fn tree(&self) -> &MenuTree {
        &self.tree
    }

    /// The session.
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Undo history.
    pub fn history(&self) -> &History {
        &self.history
    }

    /// Currently selected node.
    pub fn selection(&self) -> Option<NodeId> {
        self.selection
    }

    /// Selects an attached node other than the root.
    pub fn select(&mut self, node: NodeId) -> Result<(), MutationError> {
        if node == self.tree.root() || !self.tree.is_attached(node) {
            return Err(MutationError::UnknownNode(node));
        }
        self.selection = Some(node);
        Ok(())
    }

    /// Clears the selection.
    pub fn clear_selection(&mut self) {
        self.selection = None;
    }

    /// Sets the expanded flag of a directory.
    pub fn set_expanded(&mut self, node: NodeId, expanded: bool) -> Result<(), MutationError> {
        self.attached(node)?;
        if !self.tree.node(node).is_directory() {
            return Err(MutationError::NotADirectory(node));
        }
        self.tree.node_mut(node).expanded = expanded;
        Ok(())
    }

    fn attached(&self, node: NodeId) -> Result<(), MutationError> {
        if self.tree.is_attached(node) {
            Ok(())
        } else {
            Err(MutationError::UnknownNode(node))
        }
    }

    fn selected(&self) -> Result<NodeId, MutationError> {
        let node = self.selection.ok_or(MutationError::NoSelection)?;
        self.attached(node)?;
        Ok(node)
    }

    // ========================================================================
    // Categories
    // ========================================================================

    /// Categories implied by placing an entry directly under `parent`.
    pub fn required_categories_under(&self, parent: NodeId) -> Vec<String> {
        if parent == self.tree.root() {
            return policy::required_categories(None, self.config.prefix());
        }
        match self.tree.get(parent).and_then(|dir| dir.source_file.as_deref()) {
            Some(file) => policy::required_categories(Some(file), self.config.prefix()),
            None => Vec::new(),
        }
    }

    /// Categories `node` must carry at its current position.
    pub fn required_categories_for(&self, node: NodeId) -> Vec<String> {
        match self.tree.parent(node) {
            Some(parent) => self.required_categories_under(parent),
            None => Vec::new(),
        }
    }

    fn in_custom_chain(&self, node: NodeId) -> bool {
        self.tree.ancestors(node).into_iter().any(|dir| {
            matches!(
                self.tree.node(dir).directory_data().map(|d| d.origin),
                Some(DirectoryOrigin::Custom)
            )
        })
    }

    // ========================================================================
    // Insertion
    // ========================================================================

    /// Inserts `node` right after the selection, or at the end of the top
    /// level when nothing is selected. The new node becomes the selection.
    ///
    /// A directory whose file already backs a node in the tree is refused
    /// with [`MutationError::DuplicateDirectory`]; the same holds for
    /// [`MenuEditor::insert_child`].
    pub fn insert_sibling(&mut self, node: MenuNode) -> Result<(NodeId, MutationLog), MutationError> {
        let (parent, index) = match self.selection {
            Some(selected) => {
                self.attached(selected)?;
                let parent = self
                    .tree
                    .parent(selected)
                    .ok_or(MutationError::UnknownNode(selected))?;
                let index = self.tree.index_in_parent(selected).unwrap_or(0) + 1;
                (parent, index)
            }
            None => {
                let root = self.tree.root();
                (root, self.tree.children(root).len())
            }
        };
        self.insert_at(parent, index, node)
    }

    /// Appends `node` to the selected directory.
    pub fn insert_child(&mut self, node: MenuNode) -> Result<(NodeId, MutationLog), MutationError> {
        let parent = self.selected()?;
        if !self.tree.node(parent).is_directory() {
            return Err(MutationError::NotADirectory(parent));
        }
        let index = self.tree.children(parent).len();
        let inserted = self.insert_at(parent, index, node)?;
        self.tree.node_mut(parent).expanded = true;
        Ok(inserted)
    }

    fn insert_at(
        &mut self,
        parent: NodeId,
        index: usize,
        mut node: MenuNode,
    ) -> Result<(NodeId, MutationLog), MutationError> {
        if let Some(path) = node.source_file.as_deref().filter(|_| node.is_directory()) {
            if let Some(existing) = self.directory_backed_by(path) {
                return Err(MutationError::DuplicateDirectory {
                    path: path.to_path_buf(),
                    existing,
                });
            }
        }
        let required = self.required_categories_under(parent);
        if let Some(categories) = node.categories_mut() {
            *categories = policy::reconcile_categories(categories, &[], &required);
            let categories = categories.clone();
            if let Some(entry) = &mut node.entry {
                entry.set_categories(&categories);
            }
        }
        let id = self
            .tree
            .insert(parent, index, node)
            .ok_or(MutationError::NotADirectory(parent))?;
        let index = self.tree.index_in_parent(id).unwrap_or(index);
        debug!("Inserted {:?} under {:?} at {}", id, parent, index);
        self.selection = Some(id);
        Ok((id, vec![MutationEvent::Inserted {
            node: id,
            parent,
            index,
        }]))
    }

    /// Attached directory whose file resolves to the same place as `path`.
    fn directory_backed_by(&self, path: &Path) -> Option<NodeId> {
        let wanted = menu_file::canonical(path);
        self.tree.walk().into_iter().find(|id| {
            let candidate = self.tree.node(*id);
            candidate.is_directory()
                && candidate
                    .source_file
                    .as_deref()
                    .is_some_and(|file| menu_file::canonical(file) == wanted)
        })
    }

    // ========================================================================
    // Removal
    // ========================================================================

    /// Removes the selection.
    ///
    /// With `ui_only` the node is only taken out of the tree. Otherwise its
    /// user file is deleted, and if a system file with the same relative
    /// name exists the node is reloaded from it in place instead of being
    /// removed. Entries backed by system files are never deleted; they are
    /// reloaded from their own file.
    pub fn remove_selected(&mut self, ui_only: bool) -> Result<MutationLog, MutationError> {
        let node = self.selected()?;
        let mut log = MutationLog::new();
        if ui_only {
            self.excise(node, &mut log);
            return Ok(log);
        }

        let source = self.tree.node(node).source_file.clone();
        let is_directory = self.tree.node(node).is_directory();
        let original = match &source {
            Some(path) if self.config.is_system_path(path) => Some(path.clone()),
            Some(path) => {
                if !is_directory && self.in_custom_chain(node) {
                    let chain = self.tree.directory_chain(node);
                    match self.installer.uninstall(&chain, std::slice::from_ref(path)) {
                        Ok(()) => log.push(MutationEvent::Uninstalled { node, chain }),
                        Err(e) => soft_fail(&mut log, path, e),
                    }
                }
                match fs::remove_file(path) {
                    Ok(()) => {
                        info!("Deleted {}", path.display());
                        log.push(MutationEvent::FileDeleted { path: path.clone() });
                    }
                    Err(e) => soft_fail(&mut log, path, e),
                }
                self.system_original(path, is_directory)
            }
            None => None,
        };

        match original {
            Some(original) => self.revert(node, &original, &mut log),
            None => self.excise(node, &mut log),
        }
        Ok(log)
    }

    /// System file shadowed by a user file. Directory files match on their
    /// relative path; entry files match on desktop-file id, so
    /// `kde4-kate.desktop` finds `kde4/kate.desktop`.
    fn system_original(&self, path: &Path, is_directory: bool) -> Option<PathBuf> {
        if is_directory {
            let relative = path.strip_prefix(self.config.user_directories_dir()).ok()?;
            return self
                .config
                .system_directories_dirs()
                .into_iter()
                .map(|root| root.join(relative))
                .find(|candidate| candidate.is_file());
        }
        let relative = path.strip_prefix(self.config.user_applications_dir()).ok()?;
        let id = loader::desktop_id(relative);
        self.config
            .system_applications_dirs()
            .into_iter()
            .find_map(|root| {
                let direct = root.join(relative);
                if direct.is_file() {
                    return Some(direct);
                }
                loader::desktop_files(&root)
                    .into_iter()
                    .find(|(candidate, _)| *candidate == id)
                    .map(|(_, file)| file)
            })
    }

    fn revert(&mut self, node: NodeId, original: &Path, log: &mut MutationLog) {
        let loader = MenuTreeLoader::new(&self.config, &*self.icons);
        let fresh = match loader.node_for_file(original) {
            Ok(fresh) => fresh,
            Err(e) => {
                soft_fail(log, original, e);
                self.excise(node, log);
                return;
            }
        };
        let desktop_id = match &self.tree.node(node).kind {
            NodeKind::Application(app) => app.desktop_id.clone(),
            NodeKind::Link(link) => link.desktop_id.clone(),
            _ => None,
        };
        let target = self.tree.node_mut(node);
        target.replace_contents(fresh);
        match &mut target.kind {
            NodeKind::Application(app) if app.desktop_id.is_none() => app.desktop_id = desktop_id,
            NodeKind::Link(link) if link.desktop_id.is_none() => link.desktop_id = desktop_id,
            _ => {}
        }
        self.history.forget(node);
        info!("Reverted {:?} to {}", node, original.display());
        log.push(MutationEvent::Reverted {
            node,
            source: original.to_path_buf(),
        });
    }

    fn excise(&mut self, node: NodeId, log: &mut MutationLog) {
        let next_selection = self
            .tree
            .sibling(node, 1)
            .or_else(|| self.tree.sibling(node, -1))
            .or_else(|| self.tree.containing_directory(node));
        for id in self.subtree(node) {
            self.history.forget(id);
        }
        if self.tree.detach(node).is_some() {
            debug!("Removed {:?}", node);
            log.push(MutationEvent::Removed { node });
        }
        self.selection = next_selection;
    }

    fn subtree(&self, node: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![node];
        while let Some(id) = stack.pop() {
            if out.contains(&id) {
                continue;
            }
            out.push(id);
            stack.extend(self.tree.children(id).iter().copied());
        }
        out
    }

    // ========================================================================
    // Moving and sorting
    // ========================================================================

    /// Moves the selection one step up or down.
    ///
    /// An entry moving past a directory that is expanded or empty enters
    /// it: at the end when moving up, at the start when moving down. Past a
    /// collapsed, populated directory it only swaps places. Without a
    /// sibling in that direction the node leaves its directory and lands
    /// right before (up) or after (down) it. At the edge of the top level
    /// nothing happens.
    pub fn move_relative(&mut self, direction: Direction) -> Result<MutationLog, MutationError> {
        let node = self.selected()?;
        let parent = self
            .tree
            .parent(node)
            .ok_or(MutationError::UnknownNode(node))?;
        let offset = match direction {
            Direction::Up => -1,
            Direction::Down => 1,
        };
        let mut log = MutationLog::new();

        match self.tree.sibling(node, offset) {
            Some(sibling) => {
                let target = self.tree.node(sibling);
                let enters = !self.tree.node(node).is_directory()
                    && target.is_directory()
                    && (target.expanded || self.tree.children(sibling).is_empty());
                if enters {
                    let index = match direction {
                        Direction::Up => self.tree.children(sibling).len(),
                        Direction::Down => 0,
                    };
                    self.reparent(node, sibling, index, &mut log);
                } else {
                    let index = self.tree.index_in_parent(node).unwrap_or(0);
                    let new_index = index.saturating_add_signed(offset);
                    self.tree.detach(node);
                    self.tree.attach(node, parent, new_index);
                    log.push(MutationEvent::Moved {
                        node,
                        from_parent: parent,
                        to_parent: parent,
                        index: new_index,
                    });
                }
            }
            None if parent == self.tree.root() => {
                debug!("{:?} is already at the edge of the top level", node);
            }
            None => {
                let grandparent = self
                    .tree
                    .parent(parent)
                    .ok_or(MutationError::UnknownNode(parent))?;
                let parent_index = self.tree.index_in_parent(parent).unwrap_or(0);
                let index = match direction {
                    Direction::Up => parent_index,
                    Direction::Down => parent_index + 1,
                };
                self.reparent(node, grandparent, index, &mut log);
            }
        }
        Ok(log)
    }

    fn reparent(&mut self, node: NodeId, new_parent: NodeId, index: usize, log: &mut MutationLog) {
        let Some(old_parent) = self.tree.parent(node) else {
            return;
        };
        let old_required = self.required_categories_under(old_parent);
        let new_required = self.required_categories_under(new_parent);
        let registered: Vec<(NodeId, Vec<PathBuf>, bool)> = self
            .subtree(node)
            .into_iter()
            .filter(|id| self.tree.node(*id).categories().is_some())
            .map(|id| (id, self.tree.directory_chain(id), self.in_custom_chain(id)))
            .collect();

        if !self.tree.reparent(node, new_parent, index) {
            warn!("Cannot move {:?} under {:?}", node, new_parent);
            return;
        }
        log.push(MutationEvent::Moved {
            node,
            from_parent: old_parent,
            to_parent: new_parent,
            index: self.tree.index_in_parent(node).unwrap_or(index),
        });

        if let Some(before) = self.tree.node(node).categories().map(<[String]>::to_vec) {
            let after = policy::reconcile_categories(&before, &old_required, &new_required);
            if after != before {
                self.tree
                    .set_field(node, FieldKey::Categories, &join_list(&after));
                log.push(MutationEvent::CategoriesChanged {
                    node,
                    before,
                    after,
                });
                if self.tree.node(node).source_file.is_some() {
                    self.write_user_copy(node, log);
                }
            }
        }

        for (entry, old_chain, was_custom) in registered {
            self.sync_registration(entry, old_chain, was_custom, log);
        }
    }

    /// Moves an entry's registration from `old_chain` to its current chain
    /// when either one runs through a custom directory.
    fn sync_registration(
        &mut self,
        node: NodeId,
        old_chain: Vec<PathBuf>,
        was_custom: bool,
        log: &mut MutationLog,
    ) {
        let new_chain = self.tree.directory_chain(node);
        let is_custom = self.in_custom_chain(node);
        let Some(file) = self.tree.node(node).source_file.clone() else {
            return;
        };
        if old_chain == new_chain || !(was_custom || is_custom) {
            return;
        }
        let files = [file];
        if was_custom {
            match self.installer.uninstall(&old_chain, &files) {
                Ok(()) => log.push(MutationEvent::Uninstalled {
                    node,
                    chain: old_chain,
                }),
                Err(e) => soft_fail(log, &files[0], e),
            }
        }
        if is_custom {
            match self.installer.install(&new_chain, &files) {
                Ok(true) => log.push(MutationEvent::Installed {
                    node,
                    chain: new_chain,
                }),
                Ok(false) => debug!("Install of {:?} skipped", node),
                Err(e) => soft_fail(log, &files[0], e),
            }
        }
    }

    /// Sorts the direct children of `parent` by display name, ignoring
    /// case. The top level is never reordered.
    pub fn sort_children_alphabetically(
        &mut self,
        parent: NodeId,
    ) -> Result<MutationLog, MutationError> {
        self.attached(parent)?;
        if parent == self.tree.root() {
            return Ok(MutationLog::new());
        }
        if !self.tree.node(parent).is_directory() {
            return Err(MutationError::NotADirectory(parent));
        }
        let mut order = self.tree.children(parent).to_vec();
        order.sort_by_cached_key(|id| self.tree.node(*id).display_name.to_lowercase());
        self.tree.set_children_order(parent, order);
        Ok(vec![MutationEvent::ChildrenSorted { parent }])
    }

    // ========================================================================
    // Fields and history
    // ========================================================================

    /// Sets a field as a user edit, recording it for undo.
    pub fn edit_field(
        &mut self,
        node: NodeId,
        key: FieldKey,
        value: &str,
    ) -> Result<MutationLog, MutationError> {
        self.attached(node)?;
        let before = self
            .tree
            .set_field(node, key, value)
            .ok_or(MutationError::NoSuchField(node, key))?;
        let after = self.tree.field(node, key).unwrap_or_default();
        self.history.record(HistoryEntry {
            node,
            key,
            before: before.clone(),
            after: after.clone(),
        });
        Ok(vec![MutationEvent::FieldEdited {
            node,
            key,
            before,
            after,
        }])
    }

    /// Sets a field without recording it, as when the editor is filled in
    /// from the tree.
    pub fn load_field(
        &mut self,
        node: NodeId,
        key: FieldKey,
        value: &str,
    ) -> Result<MutationLog, MutationError> {
        let _guard = self.history.suppress();
        self.edit_field(node, key, value)
    }

    /// Reverts the last edit.
    pub fn undo(&mut self) -> Result<MutationLog, MutationError> {
        match self.history.undo() {
            Some(change) => self.apply_change(change),
            None => Ok(MutationLog::new()),
        }
    }

    /// Re-applies the last undone edit.
    pub fn redo(&mut self) -> Result<MutationLog, MutationError> {
        match self.history.redo() {
            Some(change) => self.apply_change(change),
            None => Ok(MutationLog::new()),
        }
    }

    fn apply_change(&mut self, change: HistoryEntry) -> Result<MutationLog, MutationError> {
        let _guard = self.history.suppress();
        self.edit_field(change.node, change.key, &change.after)
    }

    /// Clears undo and redo.
    pub fn clear_history(&mut self) {
        self.history.clear();
    }

    // ========================================================================
    // Saving
    // ========================================================================

    /// Writes `node` to a user-owned file, creating one for unsaved nodes,
    /// and registers it when it sits under a custom directory.
    pub fn save_entry(&mut self, node: NodeId) -> Result<MutationLog, MutationError> {
        self.attached(node)?;
        if self.tree.node(node).is_separator() || node == self.tree.root() {
            return Err(MutationError::UnknownNode(node));
        }
        let mut log = MutationLog::new();
        let Some(path) = self.write_user_copy(node, &mut log) else {
            return Ok(log);
        };
        if !self.tree.node(node).is_directory() && self.in_custom_chain(node) {
            let chain = self.tree.directory_chain(node);
            match self.installer.install(&chain, std::slice::from_ref(&path)) {
                Ok(true) => log.push(MutationEvent::Installed { node, chain }),
                Ok(false) => debug!("Install of {:?} skipped", node),
                Err(e) => soft_fail(&mut log, &path, e),
            }
        }
        Ok(log)
    }

    /// Writes the node's entry to its user path and points the node at it.
    fn write_user_copy(&mut self, node: NodeId, log: &mut MutationLog) -> Option<PathBuf> {
        let path = self.user_path_for(node)?;
        let entry = self.entry_for(node)?;
        let written = path
            .parent()
            .map_or(Ok(()), fs::create_dir_all)
            .map_err(|e| e.to_string())
            .and_then(|()| entry.write_file(&path).map_err(|e| e.to_string()));
        if let Err(reason) = written {
            soft_fail(log, &path, reason);
            return None;
        }

        let desktop_id = path.file_name().map(|n| n.to_string_lossy().into_owned());
        let target = self.tree.node_mut(node);
        target.source_file = Some(path.clone());
        target.entry = Some(entry);
        match &mut target.kind {
            NodeKind::Application(app) if app.desktop_id.is_none() => app.desktop_id = desktop_id,
            NodeKind::Link(link) if link.desktop_id.is_none() => link.desktop_id = desktop_id,
            NodeKind::Directory(dir) if dir.origin == DirectoryOrigin::System => {
                dir.origin = DirectoryOrigin::UserOverride;
            }
            _ => {}
        }
        info!("Saved {:?} to {}", node, path.display());
        log.push(MutationEvent::EntrySaved {
            node,
            path: path.clone(),
        });
        Some(path)
    }

    /// User-owned path for a node: its current file when already user-owned,
    /// a same-named copy in the user dir for system files, and a fresh name
    /// for unsaved nodes.
    fn user_path_for(&self, node: NodeId) -> Option<PathBuf> {
        let current = self.tree.node(node);
        let (user_dir, extension) = if current.is_directory() {
            (self.config.user_directories_dir(), "directory")
        } else {
            (self.config.user_applications_dir(), "desktop")
        };
        match &current.source_file {
            Some(path) if !self.config.is_system_path(path) => Some(path.clone()),
            Some(path) => {
                let id = match &current.kind {
                    NodeKind::Application(app) => app.desktop_id.clone(),
                    NodeKind::Link(link) => link.desktop_id.clone(),
                    _ => None,
                };
                let name = id.or_else(|| path.file_name().map(|n| n.to_string_lossy().into_owned()))?;
                Some(user_dir.join(name))
            }
            None => Some(unique_path(&user_dir, &current.display_name, extension)),
        }
    }

    fn entry_for(&self, node: NodeId) -> Option<DesktopEntry> {
        let current = self.tree.node(node);
        if let Some(entry) = &current.entry {
            return Some(entry.clone());
        }
        let mut entry = DesktopEntry::new(current.entry_type()?, &current.display_name);
        if let Some(comment) = &current.comment {
            entry.set_string("Comment", comment);
        }
        if let Some(icon) = &current.icon.requested {
            entry.set_string("Icon", icon);
        }
        match &current.kind {
            NodeKind::Application(app) => {
                if let Some(exec) = &app.executable {
                    entry.set_string("Exec", exec);
                }
                entry.set_categories(&app.categories);
            }
            NodeKind::Link(link) => {
                entry.set_string("URL", &link.url);
                entry.set_categories(&link.categories);
            }
            _ => {}
        }
        Some(entry)
    }

    /// Replaces the tree after a reload. Selection and history refer to the
    /// old tree and are dropped.
    pub fn reset(&mut self, tree: MenuTree) {
        self.tree = tree;
        self.selection = None;
        self.history.clear();
    }

    /// Gives the tree back, ending the edit session.
    pub fn into_tree(self) -> MenuTree {
        self.tree
    }
}

/// `<dir>/custom-<slug>.<extension>`, numbered when taken.
fn unique_path(dir: &Path, display_name: &str, extension: &str) -> PathBuf {
    let slug: String = display_name
        .chars()
        .map(|c| {
            if c.is_alphanumeric() {
                c.to_ascii_lowercase()
            } else {
                '-'
            }
        })
        .collect::<String>()
        .split('-')
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("-");
    let slug = if slug.is_empty() { "entry".to_string() } else { slug };
    let mut candidate = dir.join(format!("custom-{}.{}", slug, extension));
    let mut counter = 1;
    while candidate.exists() {
        candidate = dir.join(format!("custom-{}-{}.{}", slug, counter, extension));
        counter += 1;
    }
    candidate
}

fn soft_fail(log: &mut MutationLog, path: &Path, reason: impl Display) {
    let reason = reason.to_string();
    warn!("File operation on {} failed: {}", path.display(), reason);
    log.push(MutationEvent::FileOpFailed {
        path: Some(path.to_path_buf()),
        reason,
    });
}
