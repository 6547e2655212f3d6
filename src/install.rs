//! Registering entries under custom directories with `xdg-desktop-menu`.
//!
//! Install goes through the external tool. Uninstall does not: the tool
//! cannot remove a single file from a multi-level fragment, so the fragments
//! in `applications-merged` are edited directly.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::{debug, info, warn};

use crate::config::SessionConfig;
use crate::error::InstallError;

/// Install boundary used by the editor.
pub trait MenuInstaller {
    /// Installs `files` under the directory `chain` (outermost first).
    ///
    /// Returns `Ok(true)` when the files are registered (or the chain needs
    /// no registration) and `Ok(false)` when the chain was skipped.
    fn install(&mut self, chain: &[PathBuf], files: &[PathBuf]) -> Result<bool, InstallError>;

    /// Removes `files` from the fragment registered for `chain`.
    fn uninstall(&mut self, chain: &[PathBuf], files: &[PathBuf]) -> Result<(), InstallError>;
}

/// Installer backed by `xdg-desktop-menu` and the merged fragments dir.
#[derive(Debug, Clone)]
pub struct XdgInstaller {
    config: SessionConfig,
}

impl XdgInstaller {
    /// Installer for the given session.
    pub fn new(config: SessionConfig) -> Self {
        Self { config }
    }

    /// Checks a chain before installing into it.
    ///
    /// `Err(SystemPath)` when any file is system-owned, wherever it sits in
    /// the chain. Otherwise `Err(NonStandardLayout)` for nested user
    /// directories the tool cannot address.
    pub fn check_chain(&self, chain: &[PathBuf]) -> Result<(), InstallError> {
        if let Some(system) = chain.iter().find(|file| self.config.is_system_path(file)) {
            return Err(InstallError::SystemPath(system.clone()));
        }
        let user_dir = self.config.user_directories_dir();
        for file in chain {
            let nested = file.starts_with(&user_dir) && file.parent() != Some(user_dir.as_path());
            let vendor_prefixed = file
                .file_name()
                .is_some_and(|name| name.to_string_lossy().contains('-'));
            if nested && !vendor_prefixed {
                return Err(InstallError::NonStandardLayout(file.clone()));
            }
        }
        Ok(())
    }

    /// Deletes fragments that reference a directory no longer present in
    /// the user desktop-directories dir. Returns the removed files.
    pub fn cleanup_stale_fragments(&self) -> Result<Vec<PathBuf>, InstallError> {
        let user_dir = self.config.user_directories_dir();
        let mut removed = Vec::new();
        for fragment in self.fragments()? {
            let Some(contents) = read_fragment(&fragment)? else {
                continue;
            };
            let stale = contents
                .directories
                .iter()
                .any(|name| !user_dir.join(name).is_file());
            if stale && !contents.directories.is_empty() {
                fs::remove_file(&fragment).map_err(|source| InstallError::Io {
                    path: fragment.clone(),
                    source,
                })?;
                info!("Removed stale menu fragment {}", fragment.display());
                removed.push(fragment);
            }
        }
        Ok(removed)
    }

    fn fragments(&self) -> Result<Vec<PathBuf>, InstallError> {
        let dir = self.config.merged_fragments_dir();
        if !dir.is_dir() {
            return Ok(Vec::new());
        }
        let read = fs::read_dir(&dir).map_err(|source| InstallError::Io {
            path: dir.clone(),
            source,
        })?;
        let mut fragments: Vec<PathBuf> = read
            .flatten()
            .map(|entry| entry.path())
            .filter(|path| path.extension().is_some_and(|ext| ext == "menu"))
            .collect();
        fragments.sort();
        Ok(fragments)
    }

    fn run(&self, chain: &[PathBuf], files: &[PathBuf]) -> Result<(), InstallError> {
        let Some((program, args)) = self.config.install_command.split_first() else {
            return Err(InstallError::CommandFailed {
                command: String::new(),
                reason: "no install command configured".to_string(),
            });
        };
        let command_line = || {
            std::iter::once(program.clone())
                .chain(args.iter().cloned())
                .chain(chain.iter().chain(files).map(|p| p.display().to_string()))
                .collect::<Vec<_>>()
                .join(" ")
        };
        debug!("Running {}", command_line());

        let output = Command::new(program)
            .args(args)
            .args(chain)
            .args(files)
            .output()
            .map_err(|e| InstallError::CommandFailed {
                command: command_line(),
                reason: e.to_string(),
            })?;
        if output.status.success() {
            Ok(())
        } else {
            Err(InstallError::CommandFailed {
                command: command_line(),
                reason: format!(
                    "{}: {}",
                    output.status,
                    String::from_utf8_lossy(&output.stderr).trim()
                ),
            })
        }
    }
}

impl MenuInstaller for XdgInstaller {
    fn install(&mut self, chain: &[PathBuf], files: &[PathBuf]) -> Result<bool, InstallError> {
        if chain.is_empty() || files.is_empty() {
            return Ok(true);
        }
        match self.check_chain(chain) {
            Ok(()) => {}
            Err(InstallError::SystemPath(path)) => {
                debug!("{} is system-owned, nothing to install", path.display());
                return Ok(true);
            }
            Err(InstallError::NonStandardLayout(path)) => {
                warn!("Skipping install under {}", path.display());
                return Ok(false);
            }
            Err(e) => return Err(e),
        }
        self.run(chain, files)?;
        info!("Installed {} file(s) under {} directories", files.len(), chain.len());
        Ok(true)
    }

    fn uninstall(&mut self, chain: &[PathBuf], files: &[PathBuf]) -> Result<(), InstallError> {
        let wanted: BTreeSet<String> = chain.iter().filter_map(|p| basename(p)).collect();
        let names: Vec<String> = files.iter().filter_map(|p| basename(p)).collect();
        if wanted.is_empty() || names.is_empty() {
            return Ok(());
        }

        for fragment in self.fragments()? {
            let Some(contents) = read_fragment(&fragment)? else {
                continue;
            };
            if contents.directories != wanted {
                continue;
            }
            let referenced: Vec<&String> = names
                .iter()
                .filter(|name| contents.filenames.contains(*name))
                .collect();
            if referenced.is_empty() {
                continue;
            }
            let rewritten: Vec<&str> = contents
                .text
                .lines()
                .filter(|line| {
                    !referenced
                        .iter()
                        .any(|name| line.trim() == format!("<Filename>{}</Filename>", name))
                })
                .collect();
            let mut output = rewritten.join("\n");
            output.push('\n');
            fs::write(&fragment, output).map_err(|source| InstallError::Io {
                path: fragment.clone(),
                source,
            })?;
            info!("Removed {:?} from {}", referenced, fragment.display());
        }
        Ok(())
    }
}

fn basename(path: &Path) -> Option<String> {
    path.file_name().map(|n| n.to_string_lossy().into_owned())
}

struct Fragment {
    text: String,
    directories: BTreeSet<String>,
    filenames: BTreeSet<String>,
}

fn read_fragment(path: &Path) -> Result<Option<Fragment>, InstallError> {
    let text = fs::read_to_string(path).map_err(|source| InstallError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let options = roxmltree::ParsingOptions {
        allow_dtd: true,
        ..roxmltree::ParsingOptions::default()
    };
    let (directories, filenames) = match roxmltree::Document::parse_with_options(&text, options) {
        Ok(doc) => {
            let values = |tag: &str| -> BTreeSet<String> {
                doc.descendants()
                    .filter(|n| n.has_tag_name(tag))
                    .filter_map(|n| n.text())
                    .map(|t| t.trim().to_string())
                    .collect()
            };
            (values("Directory"), values("Filename"))
        }
        Err(e) => {
            warn!("Ignoring unreadable fragment {}: {}", path.display(), e);
            return Ok(None);
        }
    };
    Ok(Some(Fragment {
        text,
        directories,
        filenames,
    }))
}
