#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::HashMap;
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use tempfile::TempDir;
use xdg_menu_tree::{IconIndex, InstallError, MenuInstaller, SessionConfig};

pub const XFCE_MENU: &str = r#"<!DOCTYPE Menu PUBLIC "-//freedesktop//DTD Menu 1.0//EN"
  "http://www.freedesktop.org/standards/menu-spec/1.0/menu.dtd">
<Menu>
  <Name>Xfce</Name>
  <DefaultAppDirs/>
  <DefaultDirectoryDirs/>
  <Include>
    <Category>X-Xfce-Toplevel</Category>
  </Include>
  <Menu>
    <Name>Accessories</Name>
    <Directory>xfce-accessories.directory</Directory>
    <Include>
      <Category>Utility</Category>
    </Include>
  </Menu>
  <Menu>
    <Name>Games</Name>
    <Directory>xfce-games.directory</Directory>
    <Include>
      <Category>Game</Category>
    </Include>
  </Menu>
  <Menu>
    <Name>Other</Name>
    <Directory>xfce-other.directory</Directory>
    <OnlyUnallocated/>
    <Include>
      <All/>
    </Include>
  </Menu>
</Menu>
"#;

/// A throwaway XDG layout: `home/` for the user, `etc/xdg` and `usr/share`
/// for the system, `bin/` on the search path.
pub struct Fixture {
    pub dir: TempDir,
}

impl Fixture {
    pub fn new() -> Self {
        let fixture = Self {
            dir: TempDir::new().unwrap(),
        };
        for dir in [
            fixture.home(),
            fixture.system_config(),
            fixture.system_data(),
            fixture.bin(),
        ] {
            fs::create_dir_all(dir).unwrap();
        }
        fixture.executable("fixture-app");
        fixture
    }

    /// The Xfce menu with a calculator, a game, an uncategorised tool and a
    /// top-level terminal installed.
    pub fn xfce() -> Self {
        let fixture = Self::new();
        fixture.system_menu("xfce-applications.menu", XFCE_MENU);
        fixture.system_directory("xfce-accessories.directory", "Accessories", None);
        fixture.system_directory("xfce-games.directory", "Games", None);
        fixture.system_directory("xfce-other.directory", "Other", None);
        fixture.system_app("calc.desktop", "Calculator", "Utility;");
        fixture.system_app("tetris.desktop", "Tetris", "Game;");
        fixture.system_app("misc.desktop", "Misc Tool", "");
        fixture.system_app("terminal.desktop", "Terminal", "X-XFCE;X-Xfce-Toplevel;");
        fixture
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn home(&self) -> PathBuf {
        self.root().join("home")
    }

    pub fn system_config(&self) -> PathBuf {
        self.root().join("etc").join("xdg")
    }

    pub fn system_data(&self) -> PathBuf {
        self.root().join("usr").join("share")
    }

    pub fn bin(&self) -> PathBuf {
        self.root().join("bin")
    }

    pub fn config(&self) -> SessionConfig {
        self.config_with(&[])
    }

    pub fn config_with(&self, extra: &[(&str, &str)]) -> SessionConfig {
        let mut vars: HashMap<String, String> = HashMap::new();
        vars.insert("XDG_MENU_PREFIX".into(), "xfce-".into());
        vars.insert("XDG_CURRENT_DESKTOP".into(), "XFCE".into());
        vars.insert(
            "XDG_CONFIG_DIRS".into(),
            self.system_config().display().to_string(),
        );
        vars.insert(
            "XDG_DATA_DIRS".into(),
            self.system_data().display().to_string(),
        );
        vars.insert("PATH".into(), self.bin().display().to_string());
        for (key, value) in extra {
            vars.insert(key.to_string(), value.to_string());
        }
        let mut config = SessionConfig::from_lookup(self.home(), |key| vars.get(key).cloned());
        config.cache_refresh_command = None;
        config.install_command = vec!["true".to_string()];
        config
    }

    pub fn icons(&self) -> IconIndex {
        IconIndex::from_names(["folder", "application-x-executable", "text-html"])
    }

    pub fn executable(&self, name: &str) -> PathBuf {
        let path = self.bin().join(name);
        fs::write(&path, "#!/bin/sh\n").unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    pub fn write(&self, path: &Path, content: &str) -> PathBuf {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
        path.to_path_buf()
    }

    pub fn system_menu(&self, basename: &str, content: &str) -> PathBuf {
        self.write(&self.system_config().join("menus").join(basename), content)
    }

    pub fn system_app(&self, file: &str, name: &str, categories: &str) -> PathBuf {
        self.write(
            &self.system_data().join("applications").join(file),
            &app_entry(name, categories),
        )
    }

    pub fn user_app(&self, file: &str, name: &str, categories: &str) -> PathBuf {
        self.write(
            &self.home().join(".local/share/applications").join(file),
            &app_entry(name, categories),
        )
    }

    pub fn system_directory(&self, file: &str, name: &str, icon: Option<&str>) -> PathBuf {
        self.write(
            &self.system_data().join("desktop-directories").join(file),
            &directory_entry(name, icon),
        )
    }

    pub fn user_directory(&self, file: &str, name: &str) -> PathBuf {
        self.write(
            &self.home().join(".local/share/desktop-directories").join(file),
            &directory_entry(name, None),
        )
    }

    pub fn fragments_dir(&self) -> PathBuf {
        self.home().join(".config/menus/applications-merged")
    }
}

pub fn app_entry(name: &str, categories: &str) -> String {
    let mut text = format!(
        "[Desktop Entry]\nType=Application\nName={}\nExec=fixture-app %U\nIcon=application-x-executable\n",
        name
    );
    if !categories.is_empty() {
        text.push_str(&format!("Categories={}\n", categories));
    }
    text
}

pub fn directory_entry(name: &str, icon: Option<&str>) -> String {
    format!(
        "[Desktop Entry]\nType=Directory\nName={}\nIcon={}\n",
        name,
        icon.unwrap_or("folder")
    )
}

/// Installer that records its calls instead of running anything.
#[derive(Clone, Default)]
pub struct RecordingInstaller {
    pub installs: Rc<RefCell<Vec<(Vec<PathBuf>, Vec<PathBuf>)>>>,
    pub uninstalls: Rc<RefCell<Vec<(Vec<PathBuf>, Vec<PathBuf>)>>>,
}

impl MenuInstaller for RecordingInstaller {
    fn install(&mut self, chain: &[PathBuf], files: &[PathBuf]) -> Result<bool, InstallError> {
        self.installs
            .borrow_mut()
            .push((chain.to_vec(), files.to_vec()));
        Ok(true)
    }

    fn uninstall(&mut self, chain: &[PathBuf], files: &[PathBuf]) -> Result<(), InstallError> {
        self.uninstalls
            .borrow_mut()
            .push((chain.to_vec(), files.to_vec()));
        Ok(())
    }
}
