//! Key-file codec for `.desktop` and `.directory` entries.
//!
//! Entries are kept as an ordered list of lines so that rewriting a single
//! key (for instance `Categories` after a move) leaves every other group,
//! translation and comment of the file untouched.

use std::collections::HashMap;
use std::fmt;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use crate::error::{EntryError, EntryResult};

/// Name of the main group every entry file must start with.
pub const DESKTOP_ENTRY_GROUP: &str = "Desktop Entry";

// ============================================================================
// Locale
// ============================================================================

/// A locale identifier in the format `lang_COUNTRY.ENCODING@MODIFIER`.
///
/// The `_COUNTRY`, `.ENCODING` and `@MODIFIER` parts are optional.
///
/// # Examples
///
/// ```
/// use xdg_menu_tree::Locale;
///
/// let locale = Locale::parse("sr_YU@Latn");
/// assert_eq!(locale.lang, "sr");
/// assert_eq!(locale.country.as_deref(), Some("YU"));
/// assert_eq!(locale.modifier.as_deref(), Some("Latn"));
///
/// let locale = Locale::parse("en_US.UTF-8");
/// assert_eq!(locale.encoding.as_deref(), Some("UTF-8"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Locale {
    /// Language code (e.g. "en", "fr").
    pub lang: String,
    /// Optional country code (e.g. "US").
    pub country: Option<String>,
    /// Optional encoding, ignored for matching.
    pub encoding: Option<String>,
    /// Optional modifier (e.g. "Latn", "euro").
    pub modifier: Option<String>,
}

impl Locale {
    /// Creates a locale with just a language code.
    pub fn new(lang: impl Into<String>) -> Self {
        Self {
            lang: lang.into(),
            country: None,
            encoding: None,
            modifier: None,
        }
    }

    /// Parses a string like `en_US.UTF-8@euro`.
    pub fn parse(s: &str) -> Self {
        let (base, modifier) = match s.rsplit_once('@') {
            Some((base, modifier)) => (base, Some(modifier.to_string())),
            None => (s, None),
        };
        let (base, encoding) = match base.rsplit_once('.') {
            Some((base, encoding)) => (base, Some(encoding.to_string())),
            None => (base, None),
        };
        let (lang, country) = match base.split_once('_') {
            Some((lang, country)) => (lang.to_string(), Some(country.to_string())),
            None => (base.to_string(), None),
        };

        Self {
            lang,
            country,
            encoding,
            modifier,
        }
    }

    /// Locale from `LC_ALL`, `LC_MESSAGES` or `LANG`, in that order.
    ///
    /// `C` and `POSIX` count as "no locale".
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Option<Self> {
        ["LC_ALL", "LC_MESSAGES", "LANG"]
            .iter()
            .filter_map(|var| lookup(var))
            .find(|value| !value.is_empty())
            .filter(|value| value != "C" && value != "POSIX" && !value.starts_with("C."))
            .map(|value| Self::parse(&value))
    }

    /// Keys to try, most specific first, per the entry matching rules:
    /// `lang_COUNTRY@MODIFIER`, `lang_COUNTRY`, `lang@MODIFIER`, `lang`.
    fn candidates(&self) -> Vec<Locale> {
        let mut out = Vec::with_capacity(4);
        let bare = |country: Option<&String>, modifier: Option<&String>| Locale {
            lang: self.lang.clone(),
            country: country.cloned(),
            encoding: None,
            modifier: modifier.cloned(),
        };
        if self.country.is_some() && self.modifier.is_some() {
            out.push(bare(self.country.as_ref(), self.modifier.as_ref()));
        }
        if self.country.is_some() {
            out.push(bare(self.country.as_ref(), None));
        }
        if self.modifier.is_some() {
            out.push(bare(None, self.modifier.as_ref()));
        }
        out.push(bare(None, None));
        out
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.lang)?;
        if let Some(country) = &self.country {
            write!(f, "_{}", country)?;
        }
        if let Some(encoding) = &self.encoding {
            write!(f, ".{}", encoding)?;
        }
        if let Some(modifier) = &self.modifier {
            write!(f, "@{}", modifier)?;
        }
        Ok(())
    }
}

// ============================================================================
// Localized values
// ============================================================================

/// A localizable string: the untranslated value plus its translations.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LocalizedString {
    /// The value of the key without locale suffix.
    pub default: String,
    /// Translations keyed by locale (encoding stripped).
    pub localized: HashMap<Locale, String>,
}

impl LocalizedString {
    /// Creates a value with no translations.
    pub fn new(default: impl Into<String>) -> Self {
        Self {
            default: default.into(),
            localized: HashMap::new(),
        }
    }

    /// Adds a translation.
    pub fn add_localized(&mut self, locale: Locale, value: String) {
        self.localized.insert(locale, value);
    }

    /// Picks the best translation for `locale`, falling back to the default.
    ///
    /// ```
    /// use xdg_menu_tree::{Locale, LocalizedString};
    ///
    /// let mut name = LocalizedString::new("Default");
    /// name.add_localized(Locale::parse("en"), "English".to_string());
    /// assert_eq!(name.get(Some(&Locale::parse("en_GB"))), "English");
    /// assert_eq!(name.get(Some(&Locale::parse("de"))), "Default");
    /// assert_eq!(name.get(None), "Default");
    /// ```
    pub fn get(&self, locale: Option<&Locale>) -> &str {
        locale
            .into_iter()
            .flat_map(Locale::candidates)
            .find_map(|candidate| self.localized.get(&candidate))
            .map(String::as_str)
            .unwrap_or(&self.default)
    }
}

// ============================================================================
// Value escaping
// ============================================================================

/// Resolves `\s`, `\n`, `\t`, `\r` and `\\` escapes in a string value.
pub fn unescape_value(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('s') => out.push(' '),
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('\\') => out.push('\\'),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}

/// Splits a `string(s)` value on unescaped `;`, dropping empty items.
pub fn split_list(raw: &str) -> Vec<String> {
    let mut items = Vec::new();
    let mut current = String::new();
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => match chars.next() {
                Some(';') => current.push(';'),
                Some(other) => {
                    current.push('\\');
                    current.push(other);
                }
                None => current.push('\\'),
            },
            ';' => {
                if !current.is_empty() {
                    items.push(unescape_value(&current));
                }
                current.clear();
            }
            _ => current.push(c),
        }
    }
    if !current.is_empty() {
        items.push(unescape_value(&current));
    }
    items
}

/// Joins list items into the on-disk form, with the trailing `;`.
pub fn join_list(items: &[String]) -> String {
    let mut out = String::new();
    for item in items {
        out.push_str(&item.replace(';', "\\;"));
        out.push(';');
    }
    out
}

// ============================================================================
// Key file
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
enum Line {
    Blank,
    Comment(String),
    Group(String),
    Entry {
        key: String,
        locale: Option<Locale>,
        value: String,
    },
}

/// An ordered, lossless key file.
///
/// ```
/// use xdg_menu_tree::KeyFile;
///
/// let mut file = KeyFile::parse("# keep me\n[Desktop Entry]\nName=Foo\nName[de]=Fu\n").unwrap();
/// file.set("Desktop Entry", "Categories", "Utility;");
/// let text = file.serialize();
/// assert!(text.starts_with("# keep me\n"));
/// assert!(text.contains("Name[de]=Fu\nCategories=Utility;\n"));
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
pub struct KeyFile {
    lines: Vec<Line>,
}

impl KeyFile {
    /// Parses key-file text.
    pub fn parse(content: &str) -> EntryResult<Self> {
        let mut lines = Vec::new();
        let mut seen_groups: Vec<String> = Vec::new();

        for (index, raw) in content.lines().enumerate() {
            let line_num = index + 1;
            let trimmed = raw.trim();

            if trimmed.is_empty() {
                lines.push(Line::Blank);
                continue;
            }
            if let Some(comment) = trimmed.strip_prefix('#') {
                lines.push(Line::Comment(comment.to_string()));
                continue;
            }
            if trimmed.starts_with('[') {
                let name = trimmed
                    .strip_prefix('[')
                    .and_then(|rest| rest.strip_suffix(']'))
                    .filter(|name| !name.contains(['[', ']']))
                    .ok_or_else(|| EntryError::InvalidGroupHeader(line_num, raw.to_string()))?;
                if seen_groups.iter().any(|seen| seen == name) {
                    return Err(EntryError::DuplicateGroup(name.to_string()));
                }
                seen_groups.push(name.to_string());
                lines.push(Line::Group(name.to_string()));
                continue;
            }

            let (key_part, value) = raw
                .split_once('=')
                .ok_or_else(|| EntryError::InvalidLine(line_num, raw.to_string()))?;
            let key_part = key_part.trim();
            let (key, locale) = match key_part.split_once('[') {
                Some((key, rest)) => {
                    let locale = rest
                        .strip_suffix(']')
                        .ok_or_else(|| EntryError::InvalidLine(line_num, raw.to_string()))?;
                    (key.trim(), Some(Locale::parse(locale)))
                }
                None => (key_part, None),
            };
            if key.is_empty() || !key.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
                return Err(EntryError::InvalidKeyName(line_num, key.to_string()));
            }
            if seen_groups.is_empty() {
                return Err(EntryError::InvalidLine(line_num, raw.to_string()));
            }

            lines.push(Line::Entry {
                key: key.to_string(),
                locale,
                value: value.trim_start().to_string(),
            });
        }

        Ok(Self { lines })
    }

    /// Name of the first group in the file.
    pub fn first_group(&self) -> Option<&str> {
        self.lines.iter().find_map(|line| match line {
            Line::Group(name) => Some(name.as_str()),
            _ => None,
        })
    }

    /// Whether `group` exists.
    pub fn has_group(&self, group: &str) -> bool {
        self.lines
            .iter()
            .any(|line| matches!(line, Line::Group(name) if name == group))
    }

    fn group_range(&self, group: &str) -> Option<std::ops::Range<usize>> {
        let start = self
            .lines
            .iter()
            .position(|line| matches!(line, Line::Group(name) if name == group))?;
        let end = self.lines[start + 1..]
            .iter()
            .position(|line| matches!(line, Line::Group(_)))
            .map(|offset| start + 1 + offset)
            .unwrap_or(self.lines.len());
        Some(start + 1..end)
    }

    fn entries<'a>(
        &'a self,
        group: &str,
    ) -> impl Iterator<Item = (&'a str, Option<&'a Locale>, &'a str)> + 'a {
        let range = self.group_range(group).unwrap_or(0..0);
        self.lines[range].iter().filter_map(|line| match line {
            Line::Entry { key, locale, value } => Some((key.as_str(), locale.as_ref(), value.as_str())),
            _ => None,
        })
    }

    /// Raw, unlocalized value of `key` in `group`.
    pub fn get(&self, group: &str, key: &str) -> Option<&str> {
        self.entries(group)
            .find(|(k, locale, _)| *k == key && locale.is_none())
            .map(|(_, _, value)| value)
    }

    /// Value of `key` with all its translations.
    pub fn get_localized(&self, group: &str, key: &str) -> Option<LocalizedString> {
        let mut found = false;
        let mut localized = LocalizedString::default();
        for (k, locale, value) in self.entries(group) {
            if k != key {
                continue;
            }
            found = true;
            match locale {
                Some(locale) => {
                    let mut locale = locale.clone();
                    locale.encoding = None;
                    localized.add_localized(locale, unescape_value(value));
                }
                None => localized.default = unescape_value(value),
            }
        }
        found.then_some(localized)
    }

    /// Boolean value of `key`; anything other than `true`/`false` is `None`.
    pub fn get_bool(&self, group: &str, key: &str) -> Option<bool> {
        match self.get(group, key)?.trim() {
            "true" => Some(true),
            "false" => Some(false),
            _ => None,
        }
    }

    /// List value of `key`.
    pub fn get_list(&self, group: &str, key: &str) -> Option<Vec<String>> {
        self.get(group, key).map(split_list)
    }

    /// Sets the unlocalized value of `key`, replacing it in place or
    /// appending it to the group. The group is created when missing.
    pub fn set(&mut self, group: &str, key: &str, value: &str) {
        let range = match self.group_range(group) {
            Some(range) => range,
            None => {
                if !self.lines.is_empty() && !matches!(self.lines.last(), Some(Line::Blank)) {
                    self.lines.push(Line::Blank);
                }
                self.lines.push(Line::Group(group.to_string()));
                let at = self.lines.len();
                at..at
            }
        };

        let existing = self.lines[range.clone()].iter().position(
            |line| matches!(line, Line::Entry { key: k, locale: None, .. } if k == key),
        );
        let entry = Line::Entry {
            key: key.to_string(),
            locale: None,
            value: value.to_string(),
        };
        match existing {
            Some(offset) => self.lines[range.start + offset] = entry,
            None => {
                // Insert after the last entry so trailing blank lines stay
                // between this group and the next.
                let insert_at = self.lines[range.clone()]
                    .iter()
                    .rposition(|line| matches!(line, Line::Entry { .. }))
                    .map(|offset| range.start + offset + 1)
                    .unwrap_or(range.start);
                self.lines.insert(insert_at, entry);
            }
        }
    }

    /// Removes `key` and all its translations from `group`.
    pub fn remove(&mut self, group: &str, key: &str) {
        let Some(range) = self.group_range(group) else {
            return;
        };
        let mut index = range.end;
        while index > range.start {
            index -= 1;
            if matches!(&self.lines[index], Line::Entry { key: k, .. } if k == key) {
                self.lines.remove(index);
            }
        }
    }

    /// Writes the file in its on-disk form.
    pub fn write_to<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        for line in &self.lines {
            match line {
                Line::Blank => writeln!(writer)?,
                Line::Comment(text) => writeln!(writer, "#{}", text)?,
                Line::Group(name) => writeln!(writer, "[{}]", name)?,
                Line::Entry {
                    key,
                    locale: Some(locale),
                    value,
                } => writeln!(writer, "{}[{}]={}", key, locale, value)?,
                Line::Entry {
                    key,
                    locale: None,
                    value,
                } => writeln!(writer, "{}={}", key, value)?,
            }
        }
        Ok(())
    }

    /// Serializes the file to a string.
    pub fn serialize(&self) -> String {
        let mut output = Vec::new();
        // Writing into a Vec cannot fail.
        let _ = self.write_to(&mut output);
        String::from_utf8_lossy(&output).into_owned()
    }
}

// ============================================================================
// Desktop entry
// ============================================================================

/// The `Type` of a desktop entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryType {
    /// A launchable application.
    Application,
    /// A link to a URL.
    Link,
    /// A menu directory (`.directory` files).
    Directory,
}

impl EntryType {
    /// Parses a `Type` value.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Application" => Some(Self::Application),
            "Link" => Some(Self::Link),
            "Directory" => Some(Self::Directory),
            _ => None,
        }
    }

    /// The on-disk spelling.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Application => "Application",
            Self::Link => "Link",
            Self::Directory => "Directory",
        }
    }
}

/// Typed view over the `[Desktop Entry]` group of a key file.
///
/// Only the keys the menu machinery reads are lifted into fields; the full
/// key file is kept in [`DesktopEntry::keys`] for lossless saving.
#[derive(Debug, Clone, PartialEq)]
pub struct DesktopEntry {
    /// Entry type.
    pub entry_type: EntryType,
    /// `Name`.
    pub name: LocalizedString,
    /// `GenericName`.
    pub generic_name: Option<LocalizedString>,
    /// `Comment`.
    pub comment: Option<LocalizedString>,
    /// `Icon`, as written.
    pub icon: Option<String>,
    /// `Hidden`.
    pub hidden: bool,
    /// `NoDisplay`.
    pub no_display: bool,
    /// `OnlyShowIn`.
    pub only_show_in: Option<Vec<String>>,
    /// `NotShowIn`.
    pub not_show_in: Option<Vec<String>>,
    /// `TryExec`.
    pub try_exec: Option<String>,
    /// `Exec`.
    pub exec: Option<String>,
    /// `URL` (links only).
    pub url: Option<String>,
    /// `Categories`, in file order.
    pub categories: Vec<String>,
    /// The complete key file this view was read from.
    pub keys: KeyFile,
}

impl DesktopEntry {
    /// Parses entry text.
    ///
    /// ```
    /// use xdg_menu_tree::{DesktopEntry, EntryType};
    ///
    /// let entry = DesktopEntry::parse("[Desktop Entry]\nType=Application\nName=Test\nExec=test\nCategories=Utility;Core;\n").unwrap();
    /// assert_eq!(entry.entry_type, EntryType::Application);
    /// assert_eq!(entry.categories, ["Utility", "Core"]);
    /// ```
    pub fn parse(content: &str) -> EntryResult<Self> {
        Self::from_key_file(KeyFile::parse(content)?)
    }

    /// Reads and parses an entry file.
    pub fn parse_file(path: impl AsRef<Path>) -> EntryResult<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|source| EntryError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let content = String::from_utf8(bytes).map_err(|_| EntryError::InvalidUtf8)?;
        Self::parse(&content)
    }

    /// Builds the typed view from a parsed key file.
    pub fn from_key_file(keys: KeyFile) -> EntryResult<Self> {
        if !keys.has_group(DESKTOP_ENTRY_GROUP) {
            return Err(EntryError::MissingDesktopEntryGroup);
        }
        let group = DESKTOP_ENTRY_GROUP;

        let type_value = keys
            .get(group, "Type")
            .ok_or_else(|| EntryError::MissingRequiredKey("Type".to_string()))?;
        let entry_type = EntryType::parse(type_value.trim())
            .ok_or_else(|| EntryError::InvalidValue("Type".to_string(), type_value.to_string()))?;
        let name = keys
            .get_localized(group, "Name")
            .ok_or_else(|| EntryError::MissingRequiredKey("Name".to_string()))?;

        Ok(Self {
            entry_type,
            name,
            generic_name: keys.get_localized(group, "GenericName"),
            comment: keys.get_localized(group, "Comment"),
            icon: keys
                .get(group, "Icon")
                .map(unescape_value)
                .filter(|icon| !icon.is_empty()),
            hidden: keys.get_bool(group, "Hidden").unwrap_or(false),
            no_display: keys.get_bool(group, "NoDisplay").unwrap_or(false),
            only_show_in: keys.get_list(group, "OnlyShowIn"),
            not_show_in: keys.get_list(group, "NotShowIn"),
            try_exec: keys.get(group, "TryExec").map(unescape_value),
            exec: keys.get(group, "Exec").map(str::to_string),
            url: keys.get(group, "URL").map(unescape_value),
            categories: keys.get_list(group, "Categories").unwrap_or_default(),
            keys,
        })
    }

    /// Creates a fresh entry that has never been on disk.
    pub fn new(entry_type: EntryType, name: &str) -> Self {
        let mut keys = KeyFile::default();
        keys.set(DESKTOP_ENTRY_GROUP, "Version", "1.0");
        keys.set(DESKTOP_ENTRY_GROUP, "Type", entry_type.as_str());
        keys.set(DESKTOP_ENTRY_GROUP, "Name", name);
        Self {
            entry_type,
            name: LocalizedString::new(name),
            generic_name: None,
            comment: None,
            icon: None,
            hidden: false,
            no_display: false,
            only_show_in: None,
            not_show_in: None,
            try_exec: None,
            exec: None,
            url: None,
            categories: Vec::new(),
            keys,
        }
    }

    /// Whether the entry should be shown when running under `desktops`
    /// (the `XDG_CURRENT_DESKTOP` list).
    pub fn is_visible_in(&self, desktops: &[String]) -> bool {
        if self.hidden || self.no_display {
            return false;
        }
        if let Some(only) = &self.only_show_in {
            if !only.iter().any(|de| desktops.contains(de)) {
                return false;
            }
        }
        if let Some(not) = &self.not_show_in {
            if not.iter().any(|de| desktops.contains(de)) {
                return false;
            }
        }
        true
    }

    /// Replaces the categories, both in the view and in the key file.
    pub fn set_categories(&mut self, categories: &[String]) {
        self.categories = categories.to_vec();
        if categories.is_empty() {
            self.keys.remove(DESKTOP_ENTRY_GROUP, "Categories");
        } else {
            self.keys
                .set(DESKTOP_ENTRY_GROUP, "Categories", &join_list(categories));
        }
    }

    /// Sets a plain string key, keeping the typed view in sync.
    pub fn set_string(&mut self, key: &str, value: &str) {
        match key {
            "Name" => self.name.default = value.to_string(),
            "Comment" => match &mut self.comment {
                Some(comment) => comment.default = value.to_string(),
                None => self.comment = Some(LocalizedString::new(value)),
            },
            "Icon" => self.icon = Some(value.to_string()).filter(|v| !v.is_empty()),
            "Exec" => self.exec = Some(value.to_string()),
            "URL" => self.url = Some(value.to_string()),
            _ => {}
        }
        self.keys.set(DESKTOP_ENTRY_GROUP, key, value);
    }

    /// Checks an entry the way the menu library does before showing it:
    /// start group, type validity, `TryExec` and `Exec` resolvability, and
    /// `URL` for links.
    pub fn validate_for_lookup(&self, search_path: &[PathBuf]) -> EntryResult<()> {
        match self.keys.first_group() {
            Some(DESKTOP_ENTRY_GROUP) => {}
            Some(other) => return Err(EntryError::NotStartGroup(other.to_string())),
            None => return Err(EntryError::MissingDesktopEntryGroup),
        }

        match self.entry_type {
            EntryType::Application => {
                if let Some(try_exec) = &self.try_exec {
                    if find_program(try_exec, search_path).is_none() {
                        return Err(EntryError::TryExecNotFound(try_exec.clone()));
                    }
                }
                let dbus = self
                    .keys
                    .get_bool(DESKTOP_ENTRY_GROUP, "DBusActivatable")
                    .unwrap_or(false);
                match self.exec.as_deref().and_then(exec_program) {
                    Some(program) => {
                        if find_program(&program, search_path).is_none() {
                            return Err(EntryError::ExecNotFound(program));
                        }
                    }
                    None if dbus => {}
                    None => return Err(EntryError::MissingRequiredKey("Exec".to_string())),
                }
            }
            EntryType::Link => {
                if self.url.is_none() {
                    return Err(EntryError::MissingRequiredKey("URL".to_string()));
                }
            }
            EntryType::Directory => {}
        }
        Ok(())
    }

    /// Writes the key file to `path`, creating parent directories.
    pub fn write_file(&self, path: &Path) -> EntryResult<()> {
        let io_err = |source| EntryError::Io {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(io_err)?;
        }
        std::fs::write(path, self.keys.serialize()).map_err(io_err)
    }
}

/// First word of an `Exec` line, with quoting and escapes removed.
pub fn exec_program(exec: &str) -> Option<String> {
    let exec = exec.trim_start();
    let program = if let Some(rest) = exec.strip_prefix('"') {
        let mut program = String::new();
        let mut chars = rest.chars();
        while let Some(c) = chars.next() {
            match c {
                '"' => break,
                '\\' => {
                    if let Some(escaped) = chars.next() {
                        program.push(escaped);
                    }
                }
                _ => program.push(c),
            }
        }
        program
    } else {
        exec.split_whitespace().next()?.to_string()
    };
    Some(unescape_value(&program)).filter(|p| !p.is_empty())
}

/// Resolves a program name to an executable file.
///
/// Absolute paths are checked directly; bare names are searched in
/// `search_path`.
pub fn find_program(program: &str, search_path: &[PathBuf]) -> Option<PathBuf> {
    let candidate = Path::new(program);
    if candidate.is_absolute() {
        return is_executable(candidate).then(|| candidate.to_path_buf());
    }
    if program.contains('/') {
        return None;
    }
    search_path
        .iter()
        .map(|dir| dir.join(program))
        .find(|path| is_executable(path))
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    std::fs::metadata(path)
        .map(|meta| meta.is_file() && meta.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}
