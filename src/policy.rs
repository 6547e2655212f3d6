//! Required categories implied by a position in the menu hierarchy.
//!
//! Placing an entry under a directory implies a category (a "Games"
//! directory implies `Game`). The writer needs the opposite direction, to
//! turn a category back into the `<Name>` of a submenu. Both directions read
//! [`DIRECTORY_CATEGORY_REMAPS`]; if they ever disagree, entries vanish from
//! their submenu on the next load.

use std::path::Path;

use crate::category::{split_camel_case, unvendor};
use crate::config::Defaults;

/// Directory logical name ↔ category pairs that are not the identity.
pub const DIRECTORY_CATEGORY_REMAPS: &[(&str, &str)] = &[
    ("Accessories", "Utility"),
    ("Games", "Game"),
    ("Multimedia", "AudioVideo"),
];

/// Categories required at the top level of the menu.
pub const XFCE_TOPLEVEL_CATEGORIES: &[&str] = &["X-XFCE", "X-Xfce-Toplevel"];

/// Title-cases like Python's `str.title`: the first letter of every
/// alphabetic run is upper-cased, the rest lower-cased.
pub fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut in_word = false;
    for c in s.chars() {
        if c.is_alphabetic() {
            if in_word {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            in_word = true;
        } else {
            out.push(c);
            in_word = false;
        }
    }
    out
}

/// Logical name of a `.directory` file: its stem without the vendor
/// prefix, title-cased. `xfce-accessories.directory` gives `Accessories`.
pub fn logical_directory_name(directory_file: &Path, prefix: &str) -> String {
    let stem = directory_file
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name = if prefix.is_empty() {
        stem.as_str()
    } else {
        stem.strip_prefix(prefix).unwrap_or(&stem)
    };
    title_case(name)
}

/// Category implied by a directory logical name.
pub fn category_for_directory_name(name: &str) -> String {
    DIRECTORY_CATEGORY_REMAPS
        .iter()
        .find(|(directory, _)| *directory == name)
        .map(|(_, category)| category.to_string())
        .unwrap_or_else(|| name.to_string())
}

/// Directory display name for a category; the inverse of
/// [`category_for_directory_name`].
///
/// Vendor categories lose their vendor segment and are split on case
/// changes: `X-GNOME-SystemSettings` gives `System Settings`.
pub fn directory_name_for_category(category: &str) -> String {
    if let Some((directory, _)) = DIRECTORY_CATEGORY_REMAPS
        .iter()
        .find(|(_, remapped)| *remapped == category)
    {
        return directory.to_string();
    }
    if category.starts_with("X-") {
        let condensed = unvendor(category).unwrap_or(category);
        return split_camel_case(condensed);
    }
    category.to_string()
}

/// `<Name>` the writer emits for a directory backed by `directory_file`.
pub fn menu_name_for_directory(directory_file: &Path, prefix: &str) -> String {
    let logical = logical_directory_name(directory_file, prefix);
    directory_name_for_category(&category_for_directory_name(&logical))
}

/// Categories an entry must carry when placed in `containing_directory`
/// (`None` for the top level).
///
/// ```
/// use std::path::Path;
/// use xdg_menu_tree::policy::required_categories;
///
/// assert_eq!(
///     required_categories(Some(Path::new("/usr/share/desktop-directories/xfce-games.directory")), "xfce-"),
///     ["Game"],
/// );
/// assert_eq!(required_categories(None, "xfce-"), ["X-XFCE", "X-Xfce-Toplevel"]);
/// assert!(required_categories(None, "gnome-").is_empty());
/// ```
pub fn required_categories(containing_directory: Option<&Path>, prefix: &str) -> Vec<String> {
    match containing_directory {
        None if prefix == Defaults::XFCE_PREFIX => XFCE_TOPLEVEL_CATEGORIES
            .iter()
            .map(|c| c.to_string())
            .collect(),
        None => Vec::new(),
        Some(file) => {
            let name = logical_directory_name(file, prefix);
            if name.is_empty() {
                Vec::new()
            } else {
                vec![category_for_directory_name(&name)]
            }
        }
    }
}

/// Replaces `old_required` by `new_required` in `categories`, keeping the
/// order of everything that stays and appending what is new.
pub fn reconcile_categories(
    categories: &[String],
    old_required: &[String],
    new_required: &[String],
) -> Vec<String> {
    let mut out: Vec<String> = categories
        .iter()
        .filter(|c| !old_required.contains(c) || new_required.contains(c))
        .cloned()
        .collect();
    for category in new_required {
        if !out.contains(category) {
            out.push(category.clone());
        }
    }
    out
}
