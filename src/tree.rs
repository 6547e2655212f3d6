//! The in-memory menu tree.
//!
//! Nodes live in an arena and are addressed by [`NodeId`]. Directory nodes
//! own the ordered list of their children; every attached node knows its
//! parent. The root is a synthetic directory standing for the top level of
//! the menu.

use std::path::{Path, PathBuf};

use crate::entry::{DesktopEntry, EntryType};
use crate::icon::IconRef;

/// Index of a node in a [`MenuTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    /// Raw arena index.
    pub fn index(self) -> usize {
        self.0
    }

    #[cfg(test)]
    pub(crate) fn from_index(index: usize) -> Self {
        Self(index)
    }
}

/// Where a directory comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirectoryOrigin {
    /// Installed by the system.
    System,
    /// A user copy overriding a system directory file.
    UserOverride,
    /// Created by the user, with no system counterpart.
    Custom,
}

/// Fields of an application launcher.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ApplicationData {
    /// `Exec` line.
    pub executable: Option<String>,
    /// `Categories`, ordered and free of duplicates.
    pub categories: Vec<String>,
    /// Desktop-file id within the menu.
    pub desktop_id: Option<String>,
}

/// Fields of a URL link.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LinkData {
    /// Target URL.
    pub url: String,
    /// `Categories`, ordered and free of duplicates.
    pub categories: Vec<String>,
    /// Desktop-file id within the menu.
    pub desktop_id: Option<String>,
}

/// Fields of a directory.
#[derive(Debug, Clone, PartialEq)]
pub struct DirectoryData {
    /// Provenance of the backing file.
    pub origin: DirectoryOrigin,
    /// Ordered children.
    pub children: Vec<NodeId>,
}

/// Kind-specific payload of a node.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    /// An application launcher.
    Application(ApplicationData),
    /// A link.
    Link(LinkData),
    /// A submenu.
    Directory(DirectoryData),
    /// A separator line.
    Separator,
}

/// A node of the menu tree.
#[derive(Debug, Clone, PartialEq)]
pub struct MenuNode {
    /// Kind and kind-specific fields.
    pub kind: NodeKind,
    /// Name shown in the menu.
    pub display_name: String,
    /// Tooltip.
    pub comment: Option<String>,
    /// Icon as requested and as resolved.
    pub icon: IconRef,
    /// Backing `.desktop`/`.directory` file.
    pub source_file: Option<PathBuf>,
    /// Whether the editor shows the directory expanded.
    pub expanded: bool,
    /// Result of Hidden/NoDisplay/OnlyShowIn/NotShowIn evaluation.
    pub visible: bool,
    /// Parsed backing file, kept for lossless saving.
    pub entry: Option<DesktopEntry>,
    parent: Option<NodeId>,
}

impl MenuNode {
    fn with_kind(kind: NodeKind, display_name: impl Into<String>) -> Self {
        Self {
            kind,
            display_name: display_name.into(),
            comment: None,
            icon: IconRef::default(),
            source_file: None,
            expanded: false,
            visible: true,
            entry: None,
            parent: None,
        }
    }

    /// A new, unsaved application.
    pub fn application(display_name: impl Into<String>) -> Self {
        Self::with_kind(
            NodeKind::Application(ApplicationData::default()),
            display_name,
        )
    }

    /// A new, unsaved link.
    pub fn link(display_name: impl Into<String>, url: impl Into<String>) -> Self {
        Self::with_kind(
            NodeKind::Link(LinkData {
                url: url.into(),
                ..LinkData::default()
            }),
            display_name,
        )
    }

    /// A new, unsaved directory created by the user.
    pub fn directory(display_name: impl Into<String>) -> Self {
        Self::with_kind(
            NodeKind::Directory(DirectoryData {
                origin: DirectoryOrigin::Custom,
                children: Vec::new(),
            }),
            display_name,
        )
    }

    /// A separator.
    pub fn separator() -> Self {
        Self::with_kind(NodeKind::Separator, "")
    }

    /// Sets the backing file.
    pub fn with_source(mut self, path: impl Into<PathBuf>) -> Self {
        self.source_file = Some(path.into());
        self
    }

    /// Sets the categories (ignored for directories and separators).
    pub fn with_categories<I, S>(mut self, categories: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        if let Some(target) = self.categories_mut() {
            *target = categories.into_iter().map(Into::into).collect();
        }
        self
    }

    /// Parent, or `None` for the root and detached nodes.
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// `true` for directories.
    pub fn is_directory(&self) -> bool {
        matches!(self.kind, NodeKind::Directory(_))
    }

    /// `true` for separators.
    pub fn is_separator(&self) -> bool {
        matches!(self.kind, NodeKind::Separator)
    }

    /// Entry type of the backing file, `None` for separators.
    pub fn entry_type(&self) -> Option<EntryType> {
        match self.kind {
            NodeKind::Application(_) => Some(EntryType::Application),
            NodeKind::Link(_) => Some(EntryType::Link),
            NodeKind::Directory(_) => Some(EntryType::Directory),
            NodeKind::Separator => None,
        }
    }

    /// Categories of applications and links.
    pub fn categories(&self) -> Option<&[String]> {
        match &self.kind {
            NodeKind::Application(app) => Some(&app.categories),
            NodeKind::Link(link) => Some(&link.categories),
            _ => None,
        }
    }

    /// Mutable categories of applications and links.
    pub fn categories_mut(&mut self) -> Option<&mut Vec<String>> {
        match &mut self.kind {
            NodeKind::Application(app) => Some(&mut app.categories),
            NodeKind::Link(link) => Some(&mut link.categories),
            _ => None,
        }
    }

    /// Directory payload.
    pub fn directory_data(&self) -> Option<&DirectoryData> {
        match &self.kind {
            NodeKind::Directory(dir) => Some(dir),
            _ => None,
        }
    }

    /// Copies the file-derived fields of `other`, keeping tree position,
    /// children and UI state.
    pub fn replace_contents(&mut self, other: MenuNode) {
        let children = match &self.kind {
            NodeKind::Directory(dir) => Some(dir.children.clone()),
            _ => None,
        };
        self.kind = other.kind;
        if let (Some(children), NodeKind::Directory(dir)) = (children, &mut self.kind) {
            dir.children = children;
        }
        self.display_name = other.display_name;
        self.comment = other.comment;
        self.icon = other.icon;
        self.source_file = other.source_file;
        self.visible = other.visible;
        self.entry = other.entry;
    }
}

/// Editable fields tracked by the undo history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKey {
    /// Display name.
    Name,
    /// Comment.
    Comment,
    /// Requested icon.
    Icon,
    /// `Exec` for applications, URL for links.
    Executable,
    /// Categories, `;`-joined.
    Categories,
}

impl FieldKey {
    /// Desktop-entry key the field is stored under.
    pub fn entry_key(self, kind: &NodeKind) -> &'static str {
        match self {
            Self::Name => "Name",
            Self::Comment => "Comment",
            Self::Icon => "Icon",
            Self::Executable if matches!(kind, NodeKind::Link(_)) => "URL",
            Self::Executable => "Exec",
            Self::Categories => "Categories",
        }
    }
}

/// Arena-backed menu tree.
#[derive(Debug, Clone, PartialEq)]
pub struct MenuTree {
    nodes: Vec<MenuNode>,
    root: NodeId,
}

impl MenuTree {
    /// An empty tree whose root is named `root_name`.
    pub fn new(root_name: impl Into<String>) -> Self {
        let mut root = MenuNode::directory(root_name);
        root.kind = NodeKind::Directory(DirectoryData {
            origin: DirectoryOrigin::System,
            children: Vec::new(),
        });
        root.expanded = true;
        Self {
            nodes: vec![root],
            root: NodeId(0),
        }
    }

    /// The synthetic top-level node.
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Node by id.
    ///
    /// # Panics
    ///
    /// Panics if `id` was not produced by this tree.
    pub fn node(&self, id: NodeId) -> &MenuNode {
        &self.nodes[id.0]
    }

    /// Mutable node by id.
    ///
    /// # Panics
    ///
    /// Panics if `id` was not produced by this tree.
    pub fn node_mut(&mut self, id: NodeId) -> &mut MenuNode {
        &mut self.nodes[id.0]
    }

    /// Node by id, `None` for foreign ids.
    pub fn get(&self, id: NodeId) -> Option<&MenuNode> {
        self.nodes.get(id.0)
    }

    /// Number of arena slots, detached nodes included.
    pub fn capacity(&self) -> usize {
        self.nodes.len()
    }

    /// Whether `id` is the root or hangs below it.
    pub fn is_attached(&self, id: NodeId) -> bool {
        let mut current = id;
        for _ in 0..=self.nodes.len() {
            if current == self.root {
                return true;
            }
            match self.get(current).and_then(MenuNode::parent) {
                Some(parent) => current = parent,
                None => return false,
            }
        }
        false
    }

    /// Children of a directory; empty for anything else.
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.get(id)
            .and_then(MenuNode::directory_data)
            .map(|dir| dir.children.as_slice())
            .unwrap_or(&[])
    }

    fn children_mut(&mut self, id: NodeId) -> Option<&mut Vec<NodeId>> {
        match &mut self.nodes.get_mut(id.0)?.kind {
            NodeKind::Directory(dir) => Some(&mut dir.children),
            _ => None,
        }
    }

    /// Parent of `id`.
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).and_then(MenuNode::parent)
    }

    /// Position of `id` among its siblings.
    pub fn index_in_parent(&self, id: NodeId) -> Option<usize> {
        let parent = self.parent(id)?;
        self.children(parent).iter().position(|child| *child == id)
    }

    /// Sibling before (`offset = -1`) or after (`offset = 1`) `id`.
    pub fn sibling(&self, id: NodeId, offset: isize) -> Option<NodeId> {
        let parent = self.parent(id)?;
        let index = self.index_in_parent(id)?;
        let target = index.checked_add_signed(offset)?;
        self.children(parent).get(target).copied()
    }

    /// Whether `ancestor` is `id` or one of its ancestors.
    pub fn is_ancestor_or_self(&self, ancestor: NodeId, id: NodeId) -> bool {
        let mut current = Some(id);
        let mut steps = 0;
        while let Some(node) = current {
            if node == ancestor {
                return true;
            }
            steps += 1;
            if steps > self.nodes.len() {
                return false;
            }
            current = self.parent(node);
        }
        false
    }

    /// Adds a detached node to the arena.
    pub fn alloc(&mut self, mut node: MenuNode) -> NodeId {
        node.parent = None;
        self.nodes.push(node);
        NodeId(self.nodes.len() - 1)
    }

    /// Adds `node` as the last child of `parent`.
    ///
    /// Returns `None` if `parent` is not a directory.
    pub fn append(&mut self, parent: NodeId, node: MenuNode) -> Option<NodeId> {
        let index = self.children(parent).len();
        self.insert(parent, index, node)
    }

    /// Adds `node` at `index` among the children of `parent`.
    pub fn insert(&mut self, parent: NodeId, index: usize, node: MenuNode) -> Option<NodeId> {
        self.children_mut(parent)?;
        let id = self.alloc(node);
        self.attach(id, parent, index).then_some(id)
    }

    /// Links a detached node under `parent` at `index` (clamped).
    ///
    /// Refuses to create a cycle or to attach below a non-directory.
    pub fn attach(&mut self, id: NodeId, parent: NodeId, index: usize) -> bool {
        if self.get(id).is_none() || self.parent(id).is_some() || id == self.root {
            return false;
        }
        if self.is_ancestor_or_self(id, parent) {
            return false;
        }
        let Some(children) = self.children_mut(parent) else {
            return false;
        };
        let index = index.min(children.len());
        children.insert(index, id);
        self.nodes[id.0].parent = Some(parent);
        true
    }

    /// Unlinks `id` from its parent. The node and its subtree stay in the
    /// arena and can be re-attached.
    pub fn detach(&mut self, id: NodeId) -> Option<(NodeId, usize)> {
        let parent = self.parent(id)?;
        let index = self.index_in_parent(id)?;
        if let Some(children) = self.children_mut(parent) {
            children.remove(index);
        }
        self.nodes[id.0].parent = None;
        Some((parent, index))
    }

    /// Moves `id` under `parent` at `index`.
    pub fn reparent(&mut self, id: NodeId, parent: NodeId, index: usize) -> bool {
        if self.is_ancestor_or_self(id, parent) || self.children_mut(parent).is_none() {
            return false;
        }
        let previous = self.detach(id);
        if self.attach(id, parent, index) {
            return true;
        }
        if let Some((old_parent, old_index)) = previous {
            self.attach(id, old_parent, old_index);
        }
        false
    }

    /// Reorders the children of `parent`.
    pub fn set_children_order(&mut self, parent: NodeId, order: Vec<NodeId>) -> bool {
        let Some(children) = self.children_mut(parent) else {
            return false;
        };
        let mut current = children.clone();
        let mut proposed = order.clone();
        current.sort();
        proposed.sort();
        if current != proposed {
            return false;
        }
        *children = order;
        true
    }

    /// Directory containing `id`, `None` at the top level.
    pub fn containing_directory(&self, id: NodeId) -> Option<NodeId> {
        self.parent(id).filter(|parent| *parent != self.root)
    }

    /// Directory ancestors of `id`, outermost first, root excluded.
    pub fn ancestors(&self, id: NodeId) -> Vec<NodeId> {
        let mut chain = Vec::new();
        let mut current = self.containing_directory(id);
        while let Some(dir) = current {
            if chain.contains(&dir) {
                break;
            }
            chain.push(dir);
            current = self.containing_directory(dir);
        }
        chain.reverse();
        chain
    }

    /// Backing files of the directories containing `id`, outermost first.
    pub fn directory_chain(&self, id: NodeId) -> Vec<PathBuf> {
        self.ancestors(id)
            .into_iter()
            .filter_map(|dir| self.node(dir).source_file.clone())
            .collect()
    }

    /// Backing file of the directory directly containing `id`.
    pub fn containing_directory_file(&self, id: NodeId) -> Option<&Path> {
        self.containing_directory(id)
            .and_then(|dir| self.node(dir).source_file.as_deref())
    }

    /// Attached nodes in depth-first pre-order, root first.
    pub fn walk(&self) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![self.root];
        while let Some(id) = stack.pop() {
            if out.contains(&id) {
                continue;
            }
            out.push(id);
            stack.extend(self.children(id).iter().rev().copied());
        }
        out
    }

    /// First attached node backed by `path`.
    pub fn find_by_source(&self, path: &Path) -> Option<NodeId> {
        self.walk()
            .into_iter()
            .find(|id| self.node(*id).source_file.as_deref() == Some(path))
    }

    /// First attached node with the given display name.
    pub fn find_by_name(&self, name: &str) -> Option<NodeId> {
        self.walk()
            .into_iter()
            .find(|id| *id != self.root && self.node(*id).display_name == name)
    }

    /// Current value of an editable field.
    pub fn field(&self, id: NodeId, key: FieldKey) -> Option<String> {
        let node = self.get(id)?;
        let value = match key {
            FieldKey::Name => node.display_name.clone(),
            FieldKey::Comment => node.comment.clone().unwrap_or_default(),
            FieldKey::Icon => node.icon.requested.clone().unwrap_or_default(),
            FieldKey::Executable => match &node.kind {
                NodeKind::Application(app) => app.executable.clone().unwrap_or_default(),
                NodeKind::Link(link) => link.url.clone(),
                _ => return None,
            },
            FieldKey::Categories => crate::entry::join_list(node.categories()?),
        };
        Some(value)
    }

    /// Sets an editable field, mirroring it into the backing entry.
    /// Returns the previous value.
    pub fn set_field(&mut self, id: NodeId, key: FieldKey, value: &str) -> Option<String> {
        let previous = self.field(id, key)?;
        let node = self.nodes.get_mut(id.0)?;
        match key {
            FieldKey::Name => node.display_name = value.to_string(),
            FieldKey::Comment => node.comment = Some(value.to_string()).filter(|v| !v.is_empty()),
            FieldKey::Icon => node.icon = IconRef::named(value),
            FieldKey::Executable => match &mut node.kind {
                NodeKind::Application(app) => app.executable = Some(value.to_string()),
                NodeKind::Link(link) => link.url = value.to_string(),
                _ => return None,
            },
            FieldKey::Categories => {
                let mut categories: Vec<String> = Vec::new();
                for category in crate::entry::split_list(value) {
                    if !categories.contains(&category) {
                        categories.push(category);
                    }
                }
                if let Some(entry) = &mut node.entry {
                    entry.set_categories(&categories);
                }
                *node.categories_mut()? = categories;
                return Some(previous);
            }
        }
        let entry_key = key.entry_key(&node.kind);
        if let Some(entry) = &mut node.entry {
            entry.set_string(entry_key, value);
        }
        Some(previous)
    }
}
