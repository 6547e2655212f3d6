use std::path::{Path, PathBuf};

use xdg_menu_tree::category::{self, SectionGroup};
use xdg_menu_tree::policy::{self, DIRECTORY_CATEGORY_REMAPS};
use xdg_menu_tree::{DesktopEntry, EntryError, EntryType, KeyFile, Locale};

#[test]
fn test_parse_minimal() {
    let entry = DesktopEntry::parse_file("tests/fixtures/valid/minimal.desktop").unwrap();

    assert_eq!(entry.entry_type, EntryType::Application);
    assert_eq!(entry.name.default, "Minimal App");
    assert_eq!(entry.exec.as_deref(), Some("minimal-app"));
    assert!(entry.categories.is_empty());
}

#[test]
fn test_parse_full_entry() {
    let entry = DesktopEntry::parse_file("tests/fixtures/valid/full_entry.desktop").unwrap();

    assert_eq!(entry.entry_type, EntryType::Application);
    assert_eq!(entry.name.default, "Full Featured Application");

    // Check localized names
    assert_eq!(
        entry.name.get(Some(&Locale::parse("es"))),
        "Aplicación Completa"
    );
    assert_eq!(
        entry.name.get(Some(&Locale::parse("fr_CA"))),
        "Application Complète"
    );
    assert_eq!(
        entry.comment.as_ref().unwrap().get(Some(&Locale::parse("de_DE.UTF-8"))),
        "Textdateien bearbeiten"
    );

    assert_eq!(entry.generic_name.as_ref().unwrap().default, "Text Editor");
    assert_eq!(entry.icon.as_deref(), Some("text-editor"));
    assert_eq!(entry.try_exec.as_deref(), Some("full-app"));
    assert_eq!(entry.exec.as_deref(), Some("full-app %F"));
    assert_eq!(entry.categories, ["Utility", "TextEditor"]);

    // Keys without a typed field stay in the key file
    assert_eq!(
        entry.keys.get("Desktop Entry", "StartupNotify"),
        Some("true")
    );
    assert!(entry.keys.has_group("Desktop Action new-window"));
}

#[test]
fn test_parse_link_entry() {
    let entry = DesktopEntry::parse_file("tests/fixtures/valid/link_entry.desktop").unwrap();

    assert_eq!(entry.entry_type, EntryType::Link);
    assert_eq!(entry.url.as_deref(), Some("https://example.com/"));
    assert!(entry.validate_for_lookup(&[]).is_ok());
}

#[test]
fn test_parse_directory_entry() {
    let entry = DesktopEntry::parse_file("tests/fixtures/valid/directory_entry.desktop").unwrap();

    assert_eq!(entry.entry_type, EntryType::Directory);
    assert_eq!(entry.name.get(Some(&Locale::parse("de"))), "Zubehör");
    assert!(entry.validate_for_lookup(&[]).is_ok());
}

#[test]
fn test_parse_hidden_app() {
    let entry = DesktopEntry::parse_file("tests/fixtures/valid/hidden_app.desktop").unwrap();

    assert!(entry.no_display);
    assert!(!entry.is_visible_in(&["XFCE".to_string()]));
}

#[test]
fn test_visibility_rules() {
    let only = DesktopEntry::parse(
        "[Desktop Entry]\nType=Application\nName=Only\nExec=x\nOnlyShowIn=KDE;\n",
    )
    .unwrap();
    assert!(!only.is_visible_in(&["XFCE".to_string()]));
    assert!(only.is_visible_in(&["KDE".to_string()]));

    let not = DesktopEntry::parse(
        "[Desktop Entry]\nType=Application\nName=Not\nExec=x\nNotShowIn=XFCE;\n",
    )
    .unwrap();
    assert!(!not.is_visible_in(&["XFCE".to_string()]));
    assert!(not.is_visible_in(&[]));

    let hidden =
        DesktopEntry::parse("[Desktop Entry]\nType=Application\nName=H\nExec=x\nHidden=true\n")
            .unwrap();
    assert!(!hidden.is_visible_in(&[]));
}

#[test]
fn test_missing_desktop_entry_group() {
    let result = DesktopEntry::parse_file("tests/fixtures/invalid/missing_desktop_entry.desktop");

    match result {
        Err(EntryError::MissingDesktopEntryGroup) => {}
        _ => panic!("Expected MissingDesktopEntryGroup error"),
    }
}

#[test]
fn test_duplicate_groups() {
    let result = DesktopEntry::parse_file("tests/fixtures/invalid/duplicate_groups.desktop");

    match result {
        Err(EntryError::DuplicateGroup(name)) => assert_eq!(name, "Desktop Entry"),
        _ => panic!("Expected DuplicateGroup error"),
    }
}

#[test]
fn test_invalid_key_name() {
    let result = DesktopEntry::parse_file("tests/fixtures/invalid/invalid_key_name.desktop");

    match result {
        Err(EntryError::InvalidKeyName(4, key)) => assert_eq!(key, "Exec_Path"),
        _ => panic!("Expected InvalidKeyName error"),
    }
}

#[test]
fn test_invalid_group_header() {
    let result = DesktopEntry::parse_file("tests/fixtures/invalid/invalid_group_header.desktop");

    match result {
        Err(EntryError::InvalidGroupHeader(1, _)) => {}
        _ => panic!("Expected InvalidGroupHeader error"),
    }
}

#[test]
fn test_invalid_type() {
    let result = DesktopEntry::parse_file("tests/fixtures/invalid/invalid_type.desktop");

    match result {
        Err(EntryError::InvalidValue(key, value)) => {
            assert_eq!(key, "Type");
            assert_eq!(value, "Service");
        }
        _ => panic!("Expected InvalidValue error"),
    }
}

#[test]
fn test_missing_name() {
    let result = DesktopEntry::parse_file("tests/fixtures/invalid/missing_name.desktop");

    match result {
        Err(EntryError::MissingRequiredKey(key)) => assert_eq!(key, "Name"),
        _ => panic!("Expected MissingRequiredKey error"),
    }
}

#[test]
fn test_missing_file() {
    let result = DesktopEntry::parse_file("tests/fixtures/valid/does_not_exist.desktop");

    match result {
        Err(EntryError::Io { path, .. }) => {
            assert!(path.ends_with("does_not_exist.desktop"))
        }
        _ => panic!("Expected Io error"),
    }
}

#[test]
fn test_lookup_rejects_late_start_group() {
    let entry = DesktopEntry::parse_file("tests/fixtures/invalid/not_start_group.desktop").unwrap();

    match entry.validate_for_lookup(&[]) {
        Err(EntryError::NotStartGroup(group)) => assert_eq!(group, "X-Vendor Extension"),
        _ => panic!("Expected NotStartGroup error"),
    }
}

#[test]
fn test_lookup_requires_try_exec() {
    let entry = DesktopEntry::parse_file("tests/fixtures/valid/full_entry.desktop").unwrap();

    match entry.validate_for_lookup(&[PathBuf::from("/nonexistent/bin")]) {
        Err(EntryError::TryExecNotFound(program)) => assert_eq!(program, "full-app"),
        _ => panic!("Expected TryExecNotFound error"),
    }
}

#[test]
fn test_lookup_requires_exec_unless_dbus() {
    let entry = DesktopEntry::new(EntryType::Application, "Test App");
    match entry.validate_for_lookup(&[]) {
        Err(EntryError::MissingRequiredKey(key)) => assert_eq!(key, "Exec"),
        _ => panic!("Expected MissingRequiredKey error"),
    }

    let mut entry = DesktopEntry::new(EntryType::Application, "Test App");
    entry.set_string("DBusActivatable", "true");
    assert!(entry.validate_for_lookup(&[]).is_ok());
}

#[test]
fn test_lookup_resolves_absolute_exec() {
    let entry = DesktopEntry::parse(
        "[Desktop Entry]\nType=Application\nName=Shell\nExec=\"/bin/sh\" -c true\n",
    )
    .unwrap();

    assert!(entry.validate_for_lookup(&[]).is_ok());
    assert_eq!(
        xdg_menu_tree::entry::exec_program("\"/opt/My App/run\" --flag").as_deref(),
        Some("/opt/My App/run")
    );
}

#[test]
fn test_link_without_url_fails_lookup() {
    let entry = DesktopEntry::new(EntryType::Link, "Test Link");

    match entry.validate_for_lookup(&[]) {
        Err(EntryError::MissingRequiredKey(key)) => assert_eq!(key, "URL"),
        _ => panic!("Expected MissingRequiredKey error"),
    }
}

#[test]
fn test_locale_parsing() {
    let locale = Locale::parse("en");
    assert_eq!(locale.lang, "en");
    assert_eq!(locale.country, None);
    assert_eq!(locale.encoding, None);
    assert_eq!(locale.modifier, None);

    let locale = Locale::parse("en_US.UTF-8@euro");
    assert_eq!(locale.lang, "en");
    assert_eq!(locale.country.as_deref(), Some("US"));
    assert_eq!(locale.encoding.as_deref(), Some("UTF-8"));
    assert_eq!(locale.modifier.as_deref(), Some("euro"));
    assert_eq!(locale.to_string(), "en_US.UTF-8@euro");
}

fn env(vars: &'static [(&'static str, &'static str)]) -> impl Fn(&str) -> Option<String> {
    move |key| {
        vars.iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.to_string())
    }
}

#[test]
fn test_locale_from_environment() {
    let locale = Locale::from_lookup(env(&[("LANG", "de_DE.UTF-8")])).unwrap();
    assert_eq!(locale.lang, "de");

    let locale = Locale::from_lookup(env(&[("LC_ALL", "fr_FR"), ("LANG", "de_DE")])).unwrap();
    assert_eq!(locale.lang, "fr");

    assert!(Locale::from_lookup(env(&[("LANG", "C.UTF-8")])).is_none());
    assert!(Locale::from_lookup(env(&[])).is_none());
}

#[test]
fn test_key_file_rewrite_is_lossless() {
    let original = std::fs::read_to_string("tests/fixtures/valid/full_entry.desktop").unwrap();
    let mut entry = DesktopEntry::parse(&original).unwrap();
    assert_eq!(entry.keys.serialize(), original);

    entry.set_categories(&["Game".to_string(), "Utility".to_string()]);
    let rewritten = entry.keys.serialize();

    assert!(rewritten.starts_with("# Installed by the full-app package\n"));
    assert!(rewritten.contains("Categories=Game;Utility;\n"));
    assert!(rewritten.contains("Name[fr]=Application Complète\n"));
    assert!(rewritten.contains("[Desktop Action new-window]\nName=New Window\n"));

    let reparsed = DesktopEntry::parse(&rewritten).unwrap();
    assert_eq!(reparsed.categories, ["Game", "Utility"]);
}

#[test]
fn test_key_file_set_and_remove() {
    let mut file = KeyFile::parse("[Desktop Entry]\nName=A\n\n[Other]\nX=1\n").unwrap();

    file.set("Desktop Entry", "Icon", "folder");
    file.remove("Other", "X");
    file.set("New Group", "Y", "2");

    assert_eq!(
        file.serialize(),
        "[Desktop Entry]\nName=A\nIcon=folder\n\n[Other]\n\n[New Group]\nY=2\n"
    );
}

#[test]
fn test_list_escaping() {
    let items = xdg_menu_tree::entry::split_list("A;B\\;C;;D");
    assert_eq!(items, ["A", "B;C", "D"]);
    assert_eq!(xdg_menu_tree::entry::join_list(&items), "A;B\\;C;D;");
}

#[test]
fn test_write_file_round_trip() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("nested").join("app.desktop");

    let mut entry = DesktopEntry::new(EntryType::Application, "Written");
    entry.set_string("Exec", "written %U");
    entry.set_categories(&["Utility".to_string()]);
    entry.write_file(&path).unwrap();

    let reread = DesktopEntry::parse_file(&path).unwrap();
    assert_eq!(reread.name.default, "Written");
    assert_eq!(reread.exec.as_deref(), Some("written %U"));
    assert_eq!(reread.categories, ["Utility"]);
}

// ============================================================================
// Categories
// ============================================================================

#[test]
fn test_describe_known_categories() {
    for spec in category::all() {
        let first = category::describe(spec.name);
        assert!(!first.is_empty(), "{} has no description", spec.name);
        assert_eq!(first, category::describe(spec.name));
    }
    assert_eq!(category::describe("AudioVideo"), "Multimedia");
}

#[test]
fn test_describe_fallbacks() {
    assert_eq!(category::describe("FooBarBaz"), "Foo Bar Baz");
    assert_eq!(
        category::describe("X-XFCE-SettingsDialog"),
        "Desktop Settings (X-XFCE-SettingsDialog)"
    );
    assert_eq!(category::describe("X-Red-Hat-Base"), "X-Red-Hat-Base");
    assert_eq!(category::describe("X-GNOME-Utility"), "Accessories (X-GNOME-Utility)");
    assert_eq!(category::describe("1234"), "Other");
}

#[test]
fn test_section_of() {
    assert_eq!(category::section_of("Game"), SectionGroup::Game);
    assert_eq!(category::section_of("NoSuchThing"), SectionGroup::Other);
}

// ============================================================================
// Required categories
// ============================================================================

#[test]
fn test_remap_pairs_are_inverse() {
    for (directory, category) in DIRECTORY_CATEGORY_REMAPS {
        let forward = policy::category_for_directory_name(directory);
        assert_eq!(forward, *category);
        assert_eq!(policy::directory_name_for_category(&forward), *directory);
    }
}

#[test]
fn test_required_categories_for_directories() {
    let accessories = Path::new("/usr/share/desktop-directories/xfce-accessories.directory");
    assert_eq!(
        policy::required_categories(Some(accessories), "xfce-"),
        ["Utility"]
    );

    let development = Path::new("/usr/share/desktop-directories/xfce-development.directory");
    assert_eq!(
        policy::required_categories(Some(development), "xfce-"),
        ["Development"]
    );

    let multimedia = Path::new("/usr/share/desktop-directories/gnome-multimedia.directory");
    assert_eq!(
        policy::required_categories(Some(multimedia), "gnome-"),
        ["AudioVideo"]
    );
}

#[test]
fn test_required_categories_at_top_level() {
    assert_eq!(
        policy::required_categories(None, "xfce-"),
        ["X-XFCE", "X-Xfce-Toplevel"]
    );
    assert!(policy::required_categories(None, "").is_empty());
}

#[test]
fn test_menu_name_for_directory() {
    assert_eq!(
        policy::menu_name_for_directory(Path::new("xfce-games.directory"), "xfce-"),
        "Games"
    );
    assert_eq!(
        policy::menu_name_for_directory(Path::new("xfce-multimedia.directory"), "xfce-"),
        "Multimedia"
    );
}

#[test]
fn test_reconcile_categories() {
    let categories = vec!["Utility".to_string(), "GTK".to_string()];
    let moved = policy::reconcile_categories(
        &categories,
        &["Utility".to_string()],
        &["Game".to_string()],
    );
    assert_eq!(moved, ["GTK", "Game"]);

    let unchanged =
        policy::reconcile_categories(&categories, &["Utility".to_string()], &["Utility".to_string()]);
    assert_eq!(unchanged, categories);
}
