//! The interface offered to a GUI: load, mutate, persist.
//!
//! [`MenuService`] owns the session, the editor and the write scheduler.
//! Mutations mark the menu dirty; the caller polls [`MenuService::tick`]
//! from its event loop and the service writes once the burst is over.

use std::path::PathBuf;
use std::rc::Rc;
use std::time::Instant;

use tracing::{debug, warn};

use crate::category;
use crate::config::{Defaults, SessionConfig};
use crate::editor::{Direction, MenuEditor, MutationLog};
use crate::error::{Diagnostic, ServiceError};
use crate::icon::{IconIndex, IconLookup};
use crate::install::{MenuInstaller, XdgInstaller};
use crate::loader::MenuTreeLoader;
use crate::scheduler::WriteScheduler;
use crate::tree::{FieldKey, MenuNode, MenuTree, NodeId};
use crate::writer::XdgMenuWriter;

/// A mutation request.
#[derive(Debug, Clone)]
pub enum Operation {
    /// Change the selection.
    Select(NodeId),
    /// Insert after the selection.
    InsertSibling(MenuNode),
    /// Append to the selected directory.
    InsertChild(MenuNode),
    /// Remove the selection.
    RemoveSelected {
        /// Leave the filesystem alone.
        ui_only: bool,
    },
    /// Move the selection.
    MoveRelative(Direction),
    /// Sort one directory.
    SortChildren(NodeId),
    /// Expand or collapse a directory.
    SetExpanded {
        /// Directory.
        node: NodeId,
        /// New state.
        expanded: bool,
    },
    /// Edit a field.
    EditField {
        /// Edited node.
        node: NodeId,
        /// Field.
        key: FieldKey,
        /// New value.
        value: String,
    },
    /// Save a node to a user file.
    Save(NodeId),
    /// Undo the last edit.
    Undo,
    /// Redo the last undone edit.
    Redo,
}

impl Operation {
    fn changes_menu(&self) -> bool {
        !matches!(self, Self::Select(_) | Self::SetExpanded { .. })
    }
}

/// Session-wide façade over loading, editing and writing.
pub struct MenuService {
    config: SessionConfig,
    icons: Rc<dyn IconLookup>,
    installer: Option<Box<dyn MenuInstaller>>,
    editor: Option<MenuEditor>,
    root_name: String,
    diagnostics: Vec<Diagnostic>,
    scheduler: WriteScheduler,
}

impl MenuService {
    /// Service over the live icon directories and `xdg-desktop-menu`.
    pub fn new(config: SessionConfig) -> Self {
        let icons: Rc<dyn IconLookup> = Rc::new(IconIndex::scan(&config));
        let installer = Box::new(XdgInstaller::new(config.clone()));
        Self::with_parts(config, icons, installer)
    }

    /// Service with explicit collaborators.
    pub fn with_parts(
        config: SessionConfig,
        icons: Rc<dyn IconLookup>,
        installer: Box<dyn MenuInstaller>,
    ) -> Self {
        let scheduler = WriteScheduler::new(config.write_quiet_period);
        Self {
            config,
            icons,
            installer: Some(installer),
            editor: None,
            root_name: Defaults::ROOT_MENU_NAME.to_string(),
            diagnostics: Vec::new(),
            scheduler,
        }
    }

    /// The session.
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// (Re)loads the session menu. Pending changes are discarded.
    pub fn load_tree(&mut self) -> Result<&MenuTree, ServiceError> {
        let loaded = MenuTreeLoader::new(&self.config, &*self.icons).load_default()?;
        self.root_name = loaded.root_name;
        self.diagnostics = loaded.diagnostics;
        self.scheduler = WriteScheduler::new(self.config.write_quiet_period);

        if let Some(editor) = self.editor.as_mut() {
            editor.reset(loaded.tree);
        } else {
            let installer = self.installer.take().ok_or(ServiceError::NotLoaded)?;
            self.editor = Some(MenuEditor::new(
                loaded.tree,
                self.config.clone(),
                installer,
                Rc::clone(&self.icons),
            ));
        }
        Ok(self.editor()?.tree())
    }

    /// The editor of the loaded tree.
    pub fn editor(&self) -> Result<&MenuEditor, ServiceError> {
        self.editor.as_ref().ok_or(ServiceError::NotLoaded)
    }

    /// The loaded tree.
    pub fn tree(&self) -> Result<&MenuTree, ServiceError> {
        Ok(self.editor()?.tree())
    }

    /// Files skipped by the last load.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Whether changes are waiting to be written.
    pub fn is_dirty(&self) -> bool {
        self.scheduler.is_pending()
    }

    /// Applies `operation` at time `now`.
    pub fn mutate(&mut self, operation: Operation, now: Instant) -> Result<MutationLog, ServiceError> {
        let changes_menu = operation.changes_menu();
        let editor = self.editor.as_mut().ok_or(ServiceError::NotLoaded)?;
        let log = match operation {
            Operation::Select(node) => {
                editor.select(node)?;
                MutationLog::new()
            }
            Operation::InsertSibling(node) => editor.insert_sibling(node)?.1,
            Operation::InsertChild(node) => editor.insert_child(node)?.1,
            Operation::RemoveSelected { ui_only } => editor.remove_selected(ui_only)?,
            Operation::MoveRelative(direction) => editor.move_relative(direction)?,
            Operation::SortChildren(parent) => editor.sort_children_alphabetically(parent)?,
            Operation::SetExpanded { node, expanded } => {
                editor.set_expanded(node, expanded)?;
                MutationLog::new()
            }
            Operation::EditField { node, key, value } => editor.edit_field(node, key, &value)?,
            Operation::Save(node) => editor.save_entry(node)?,
            Operation::Undo => editor.undo()?,
            Operation::Redo => editor.redo()?,
        };
        if changes_menu && !log.is_empty() {
            self.scheduler.mark_dirty(now);
        }
        Ok(log)
    }

    /// Where the user menu is written and which file it merges.
    pub fn targets(&self) -> (PathBuf, PathBuf) {
        let merge_file = self.config.menu.system_path.clone().unwrap_or_else(|| {
            self.config
                .config_dirs
                .first()
                .cloned()
                .unwrap_or_else(|| PathBuf::from(Defaults::CONFIG_DIRS))
                .join("menus")
                .join(&self.config.menu.basename)
        });
        (self.config.menu.user_path.clone(), merge_file)
    }

    /// Writes the user menu now.
    pub fn persist(&mut self) -> Result<(), ServiceError> {
        let editor = self.editor.as_ref().ok_or(ServiceError::NotLoaded)?;
        let (target, merge_file) = self.targets();
        if !self.scheduler.begin_write() {
            debug!("A write is already running");
            return Ok(());
        }
        let result = XdgMenuWriter::new(&self.config).write(
            editor.tree(),
            &target,
            &merge_file,
            &self.root_name,
        );
        self.scheduler.finish_write(result.is_ok(), Instant::now());
        if let Err(e) = &result {
            warn!("Writing {} failed: {}", target.display(), e);
        }
        Ok(result?)
    }

    /// Writes if the quiet period after the last mutation has elapsed.
    /// Returns whether a write happened.
    pub fn tick(&mut self, now: Instant) -> Result<bool, ServiceError> {
        if !self.scheduler.is_due(now) {
            return Ok(false);
        }
        self.persist()?;
        Ok(true)
    }

    /// Writes pending changes immediately.
    pub fn flush(&mut self) -> Result<(), ServiceError> {
        if self.scheduler.is_pending() {
            self.persist()?;
        }
        Ok(())
    }

    /// Categories `node` must carry at its current position.
    pub fn required_categories_for(&self, node: NodeId) -> Result<Vec<String>, ServiceError> {
        Ok(self.editor()?.required_categories_for(node))
    }

    /// Display label for a category token.
    pub fn describe_category(&self, token: &str) -> String {
        category::describe(token)
    }
}
