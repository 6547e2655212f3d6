//! Error types for menu loading, writing and installation.
//!
//! Failures that must reach the caller are explicit enums. Problems with a
//! single entry file during a load are not errors at this level: they are
//! collected as [`Diagnostic`]s and the load carries on.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::tree::{FieldKey, NodeId};

/// Errors raised while parsing or validating a `.desktop`/`.directory` file.
#[derive(Debug, Error)]
pub enum EntryError {
    /// IO error while reading or writing the file.
    #[error("IO error at {path:?}: {source}")]
    Io {
        /// File being accessed.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: io::Error,
    },

    /// File is not valid UTF-8.
    #[error("file is not valid UTF-8")]
    InvalidUtf8,

    /// No `[Desktop Entry]` group at all.
    #[error("missing required [Desktop Entry] group")]
    MissingDesktopEntryGroup,

    /// The first group is not `[Desktop Entry]`.
    #[error("file does not start with [Desktop Entry] group (found [{0}])")]
    NotStartGroup(String),

    /// Group header appears twice.
    #[error("duplicate group: [{0}]")]
    DuplicateGroup(String),

    /// Line is neither comment, blank, group header nor `key=value`.
    #[error("invalid line {0}: {1}")]
    InvalidLine(usize, String),

    /// Malformed group header.
    #[error("invalid group header at line {0}: {1}")]
    InvalidGroupHeader(usize, String),

    /// Key name with characters outside `A-Za-z0-9-`.
    #[error("invalid key name at line {0}: '{1}'")]
    InvalidKeyName(usize, String),

    /// A required key is absent.
    #[error("missing required key: {0}")]
    MissingRequiredKey(String),

    /// A key carries a value that is not valid for it.
    #[error("invalid value for key '{0}': {1}")]
    InvalidValue(String, String),

    /// `TryExec` does not name an installed executable.
    #[error("TryExec program '{0}' not found in search path")]
    TryExecNotFound(String),

    /// The program in `Exec` cannot be found.
    #[error("Exec program '{0}' not found in search path")]
    ExecNotFound(String),
}

/// Result alias for entry codec operations.
pub type EntryResult<T> = std::result::Result<T, EntryError>;

/// Errors raised by the menu tree loader.
#[derive(Debug, Error)]
pub enum LoadError {
    /// None of the candidate menu basenames exist in the config dirs.
    #[error("no menu file found for {candidates:?}")]
    NoMenuFound {
        /// Basenames that were tried.
        candidates: Vec<String>,
    },

    /// The `.menu` document could not be read or parsed.
    #[error("failed to load menu tree from {path:?}: {reason}")]
    TreeLoadFailed {
        /// Menu file that failed.
        path: PathBuf,
        /// Human readable reason.
        reason: String,
    },
}

/// Errors raised while writing the user menu file.
#[derive(Debug, Error)]
pub enum WriteError {
    /// Target location cannot be created or written.
    #[error("menu file {path:?} is not writable: {source}")]
    NotWritable {
        /// Target file.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: io::Error,
    },

    /// The tree handed to the writer is not a proper tree.
    #[error("malformed menu tree: {0}")]
    MalformedTree(String),
}

/// Errors raised at the `xdg-desktop-menu` install boundary.
#[derive(Debug, Error)]
pub enum InstallError {
    /// The directory chain contains a system-owned file.
    #[error("refusing to install into system path {0:?}")]
    SystemPath(PathBuf),

    /// Directory file lives in a nested, non vendor-prefixed layout.
    #[error("directory file {0:?} uses a layout xdg-desktop-menu cannot address")]
    NonStandardLayout(PathBuf),

    /// The external install command failed to run or exited non-zero.
    #[error("command {command} failed: {reason}")]
    CommandFailed {
        /// Command line that was run.
        command: String,
        /// Exit status or spawn error.
        reason: String,
    },

    /// IO error while editing merged fragments.
    #[error("IO error at {path:?}: {source}")]
    Io {
        /// File being accessed.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: io::Error,
    },
}

/// A desktop file that was skipped during a load, with the reason.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// The offending file.
    pub path: PathBuf,
    /// Why it was skipped.
    pub reason: String,
}

/// Errors raised by tree mutations.
#[derive(Debug, Error)]
pub enum MutationError {
    /// The operation needs a selected node and there is none.
    #[error("no node is selected")]
    NoSelection,

    /// The target is not a directory.
    #[error("node {0:?} is not a directory")]
    NotADirectory(NodeId),

    /// The id does not name an attached node.
    #[error("unknown node {0:?}")]
    UnknownNode(NodeId),

    /// The node has no such editable field.
    #[error("node {0:?} has no field {1:?}")]
    NoSuchField(NodeId, FieldKey),

    /// A directory backed by the same file is already in the tree.
    #[error("directory file {path:?} already backs node {existing:?}")]
    DuplicateDirectory {
        /// The new node's directory file.
        path: PathBuf,
        /// Node already backed by it.
        existing: NodeId,
    },
}

/// Errors surfaced by [`crate::service::MenuService`].
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Loading failed.
    #[error(transparent)]
    Load(#[from] LoadError),

    /// Writing failed.
    #[error(transparent)]
    Write(#[from] WriteError),

    /// A mutation was rejected.
    #[error(transparent)]
    Mutation(#[from] MutationError),

    /// No tree has been loaded yet.
    #[error("no menu tree is loaded")]
    NotLoaded,
}
