#![doc = include_str!("../README.md")]
#![deny(missing_docs)]

pub mod category;
pub mod config;
pub mod editor;
pub mod entry;
pub mod error;
pub mod history;
pub mod icon;
pub mod install;
pub mod loader;
pub mod logging;
pub mod menu_file;
pub mod policy;
pub mod scheduler;
pub mod service;
pub mod tree;
pub mod writer;

pub use category::{CategorySpec, SectionGroup};
pub use config::{Defaults, MenuFileDescriptor, SessionConfig};
pub use editor::{Direction, MenuEditor, MutationEvent, MutationLog};
pub use entry::{DesktopEntry, EntryType, KeyFile, Locale, LocalizedString};
pub use error::{
    Diagnostic, EntryError, EntryResult, InstallError, LoadError, MutationError, ServiceError,
    WriteError,
};
pub use history::{History, HistoryEntry, SuppressGuard};
pub use icon::{IconIndex, IconLookup, IconPurpose, IconRef};
pub use install::{MenuInstaller, XdgInstaller};
pub use loader::{LoadedMenu, MenuTreeLoader};
pub use scheduler::WriteScheduler;
pub use service::{MenuService, Operation};
pub use tree::{DirectoryOrigin, FieldKey, MenuNode, MenuTree, NodeId, NodeKind};
pub use writer::XdgMenuWriter;
