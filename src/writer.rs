//! Serialises a [`MenuTree`] into the user's `.menu` overlay.
//!
//! The document merges the system menu as its parent and then pins the
//! tree's order with one `<Layout>` per level. Output depends only on the
//! tree, so writing an unchanged tree twice gives identical bytes.

use std::collections::HashSet;
use std::fmt::Write as _;
use std::fs;
use std::io::Write as _;
use std::path::{Path, PathBuf};
use std::process::Command;

use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

use crate::config::SessionConfig;
use crate::error::WriteError;
use crate::menu_file;
use crate::policy;
use crate::tree::{DirectoryOrigin, MenuTree, NodeId, NodeKind};

const HEADER: &str = "<?xml version=\"1.0\" ?>\n\
<!DOCTYPE Menu PUBLIC \"-//freedesktop//DTD Menu 1.0//EN\"\n \
\"http://standards.freedesktop.org/menu-spec/menu-1.0.dtd\">\n";

/// Writes menu trees for one session.
pub struct XdgMenuWriter<'a> {
    config: &'a SessionConfig,
}

struct Pass<'t> {
    tree: &'t MenuTree,
    visited: HashSet<NodeId>,
    processed: HashSet<PathBuf>,
    out: String,
}

impl<'a> XdgMenuWriter<'a> {
    /// Writer bound to a session.
    pub fn new(config: &'a SessionConfig) -> Self {
        Self { config }
    }

    /// Renders the document for `tree`.
    pub fn render(
        &self,
        tree: &MenuTree,
        merge_file: &Path,
        menu_name: &str,
    ) -> Result<String, WriteError> {
        let mut pass = Pass {
            tree,
            visited: HashSet::new(),
            processed: HashSet::new(),
            out: String::from(HEADER),
        };
        pass.out.push_str("<Menu>\n");
        pass.line(1, &element("Name", menu_name));
        pass.line(
            1,
            &format!(
                "<MergeFile type=\"parent\">{}</MergeFile>",
                escape(&merge_file.display().to_string())
            ),
        );
        self.menu_body(&mut pass, tree.root(), 1, true)?;
        pass.out.push_str("</Menu>\n");
        Ok(pass.out)
    }

    /// Renders `tree` and atomically replaces `target` with it, then asks
    /// the desktop to refresh its menu cache.
    pub fn write(
        &self,
        tree: &MenuTree,
        target: &Path,
        merge_file: &Path,
        menu_name: &str,
    ) -> Result<(), WriteError> {
        let document = self.render(tree, merge_file, menu_name)?;
        let not_writable = |source| WriteError::NotWritable {
            path: target.to_path_buf(),
            source,
        };

        let parent = target.parent().unwrap_or_else(|| Path::new("."));
        fs::create_dir_all(parent).map_err(not_writable)?;
        let mut temp = NamedTempFile::new_in(parent).map_err(not_writable)?;
        temp.write_all(document.as_bytes()).map_err(not_writable)?;
        temp.as_file().sync_all().map_err(not_writable)?;
        temp.persist(target).map_err(|e| not_writable(e.error))?;
        info!("Wrote menu {} ({} bytes)", target.display(), document.len());

        self.refresh_cache();
        Ok(())
    }

    fn refresh_cache(&self) {
        let Some((program, args)) = self
            .config
            .cache_refresh_command
            .as_ref()
            .and_then(|command| command.split_first())
        else {
            return;
        };
        if let Err(e) = Command::new(program).args(args).spawn() {
            warn!("Menu cache refresh ({}) failed: {}", program, e);
        }
    }

    fn menu_body(
        &self,
        pass: &mut Pass<'_>,
        dir: NodeId,
        depth: usize,
        top_level: bool,
    ) -> Result<(), WriteError> {
        let tree = pass.tree;
        let node = tree
            .get(dir)
            .ok_or_else(|| WriteError::MalformedTree(format!("dangling node {:?}", dir)))?;
        let custom = matches!(
            node.directory_data().map(|d| d.origin),
            Some(DirectoryOrigin::Custom)
        ) && !top_level;

        let mut layout = Vec::new();
        let mut includes = Vec::new();
        for &child in tree.children(dir) {
            if !pass.visited.insert(child) {
                return Err(WriteError::MalformedTree(format!(
                    "node {:?} is reachable twice",
                    child
                )));
            }
            let child_node = tree
                .get(child)
                .ok_or_else(|| WriteError::MalformedTree(format!("dangling node {:?}", child)))?;
            if child_node.parent() != Some(dir) {
                return Err(WriteError::MalformedTree(format!(
                    "node {:?} does not point back to {:?}",
                    child, dir
                )));
            }
            match &child_node.kind {
                NodeKind::Separator => layout.push("<Separator/>".to_string()),
                NodeKind::Directory(_) => {
                    if let Some(source) = &child_node.source_file {
                        if !pass.processed.insert(menu_file::canonical(source)) {
                            debug!("Skipping duplicate directory {}", source.display());
                            continue;
                        }
                    }
                    let name = self.menu_name(tree, child);
                    self.submenu(pass, child, &name, depth)?;
                    layout.push(element("Menuname", &name));
                }
                NodeKind::Application(_) | NodeKind::Link(_) => {
                    let Some(id) = self.filename(tree, child) else {
                        debug!("Skipping unsaved entry {}", child_node.display_name);
                        continue;
                    };
                    let uncategorised = child_node.categories().is_none_or(|c| c.is_empty());
                    if (uncategorised || custom) && !includes.contains(&id) {
                        includes.push(id.clone());
                    }
                    layout.push(element("Filename", &id));
                }
            }
        }

        if !includes.is_empty() {
            pass.line(depth, "<Include>");
            for id in &includes {
                pass.line(depth + 1, &element("Filename", id));
            }
            pass.line(depth, "</Include>");
        }
        pass.line(depth, "<Layout>");
        if !top_level {
            pass.line(depth + 1, "<Merge type=\"menus\"/>");
        }
        for item in &layout {
            pass.line(depth + 1, item);
        }
        if !top_level {
            pass.line(depth + 1, "<Merge type=\"files\"/>");
        }
        pass.line(depth, "</Layout>");
        Ok(())
    }

    fn submenu(
        &self,
        pass: &mut Pass<'_>,
        dir: NodeId,
        name: &str,
        depth: usize,
    ) -> Result<(), WriteError> {
        let tree = pass.tree;
        let node = tree.node(dir);
        pass.line(depth, "<Menu>");
        pass.line(depth + 1, &element("Name", name));
        if let Some(source) = &node.source_file {
            if let Some(basename) = source.file_name() {
                pass.line(depth + 1, &element("Directory", &basename.to_string_lossy()));
            }
            let user_dir = self.config.user_directories_dir();
            if source.parent() == Some(user_dir.as_path()) {
                pass.line(
                    depth + 1,
                    &element("DirectoryDir", &user_dir.display().to_string()),
                );
            }
        }
        self.menu_body(pass, dir, depth + 1, false)?;
        pass.line(depth, "</Menu>");
        Ok(())
    }

    /// `<Name>` of a submenu: derived from its backing file, or the display
    /// name while unsaved.
    fn menu_name(&self, tree: &MenuTree, dir: NodeId) -> String {
        let node = tree.node(dir);
        match &node.source_file {
            Some(source) => policy::menu_name_for_directory(source, self.config.prefix()),
            None => node.display_name.clone(),
        }
    }

    /// Desktop-file id used to reference an entry.
    fn filename(&self, tree: &MenuTree, id: NodeId) -> Option<String> {
        let node = tree.node(id);
        let known = match &node.kind {
            NodeKind::Application(app) => app.desktop_id.clone(),
            NodeKind::Link(link) => link.desktop_id.clone(),
            _ => None,
        };
        known.or_else(|| qualified_basename(node.source_file.as_deref()?))
    }
}

/// Basename of an entry file, prefixed with its directory name unless it
/// sits directly in an `applications` dir.
pub fn qualified_basename(path: &Path) -> Option<String> {
    let basename = path.file_name()?.to_string_lossy().into_owned();
    let parent = path
        .parent()
        .and_then(Path::file_name)
        .map(|name| name.to_string_lossy().into_owned());
    match parent {
        Some(parent) if parent != "applications" => Some(format!("{}-{}", parent, basename)),
        _ => Some(basename),
    }
}

impl Pass<'_> {
    fn line(&mut self, depth: usize, text: &str) {
        for _ in 0..depth {
            self.out.push('\t');
        }
        let _ = writeln!(self.out, "{}", text);
    }
}

fn element(tag: &str, text: &str) -> String {
    format!("<{tag}>{}</{tag}>", escape(text))
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}
