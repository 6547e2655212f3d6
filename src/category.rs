//! Category registry and description lookup.
//!
//! A static table of freedesktop.org categories, each with the section group
//! it belongs to and a human readable description. Lookups are pure.

use std::fmt;

/// Top-level section a category is grouped under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SectionGroup {
    /// `AudioVideo`, `Audio`, `Video`.
    AudioVideo,
    /// `Development`.
    Development,
    /// `Education`.
    Education,
    /// `Game`.
    Game,
    /// `Graphics`.
    Graphics,
    /// `Network`.
    Network,
    /// `Office`.
    Office,
    /// `Science`.
    Science,
    /// `Settings`.
    Settings,
    /// `System`.
    System,
    /// `Utility`.
    Utility,
    /// Anything else, including desktop-specific categories.
    Other,
}

impl SectionGroup {
    /// Every section, in display order.
    pub const ALL: [SectionGroup; 12] = [
        Self::AudioVideo,
        Self::Development,
        Self::Education,
        Self::Game,
        Self::Graphics,
        Self::Network,
        Self::Office,
        Self::Science,
        Self::Settings,
        Self::System,
        Self::Utility,
        Self::Other,
    ];

    /// The section's main category token.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AudioVideo => "AudioVideo",
            Self::Development => "Development",
            Self::Education => "Education",
            Self::Game => "Game",
            Self::Graphics => "Graphics",
            Self::Network => "Network",
            Self::Office => "Office",
            Self::Science => "Science",
            Self::Settings => "Settings",
            Self::System => "System",
            Self::Utility => "Utility",
            Self::Other => "Other",
        }
    }
}

impl fmt::Display for SectionGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One row of the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CategorySpec {
    /// Category token as written in `Categories=`.
    pub name: &'static str,
    /// Default section for the token.
    pub section: SectionGroup,
    /// Human readable description.
    pub description: &'static str,
}

const fn spec(name: &'static str, section: SectionGroup, description: &'static str) -> CategorySpec {
    CategorySpec {
        name,
        section,
        description,
    }
}

use SectionGroup::*;

static CATEGORIES: &[CategorySpec] = &[
    // Main categories
    spec("AudioVideo", AudioVideo, "Multimedia"),
    spec("Audio", AudioVideo, "Audio"),
    spec("Video", AudioVideo, "Video"),
    spec("Development", Development, "Development"),
    spec("Education", Education, "Education"),
    spec("Game", Game, "Games"),
    spec("Graphics", Graphics, "Graphics"),
    spec("Network", Network, "Internet"),
    spec("Office", Office, "Office"),
    spec("Science", Science, "Science"),
    spec("Settings", Settings, "Settings"),
    spec("System", System, "System"),
    spec("Utility", Utility, "Accessories"),
    // Additional categories
    spec("Building", Development, "Building"),
    spec("Debugger", Development, "Debugger"),
    spec("IDE", Development, "IDE"),
    spec("GUIDesigner", Development, "GUI Designer"),
    spec("Profiling", Development, "Profiling"),
    spec("RevisionControl", Development, "Revision Control"),
    spec("Translation", Development, "Translation"),
    spec("WebDevelopment", Development, "Web Development"),
    spec("Calendar", Office, "Calendar"),
    spec("ContactManagement", Office, "Contact Management"),
    spec("Database", Office, "Database"),
    spec("Dictionary", Office, "Dictionary"),
    spec("Chart", Office, "Chart"),
    spec("Email", Office, "Email"),
    spec("Finance", Office, "Finance"),
    spec("FlowChart", Office, "Flow Chart"),
    spec("PDA", Office, "PDA"),
    spec("ProjectManagement", Office, "Project Management"),
    spec("Presentation", Office, "Presentation"),
    spec("Spreadsheet", Office, "Spreadsheet"),
    spec("WordProcessor", Office, "Word Processor"),
    spec("2DGraphics", Graphics, "2D Graphics"),
    spec("VectorGraphics", Graphics, "Vector Graphics"),
    spec("RasterGraphics", Graphics, "Raster Graphics"),
    spec("3DGraphics", Graphics, "3D Graphics"),
    spec("Scanning", Graphics, "Scanning"),
    spec("OCR", Graphics, "OCR"),
    spec("Photography", Graphics, "Photography"),
    spec("Publishing", Graphics, "Publishing"),
    spec("Viewer", Graphics, "Viewer"),
    spec("TextTools", Utility, "Text Tools"),
    spec("DesktopSettings", Settings, "Desktop Settings"),
    spec("HardwareSettings", Settings, "Hardware Settings"),
    spec("Printing", Settings, "Printing"),
    spec("PackageManager", System, "Package Manager"),
    spec("Dialup", Network, "Dialup"),
    spec("InstantMessaging", Network, "Instant Messaging"),
    spec("Chat", Network, "Chat"),
    spec("IRCClient", Network, "IRC Client"),
    spec("Feed", Network, "Feed"),
    spec("FileTransfer", Network, "File Transfer"),
    spec("HamRadio", Network, "Ham Radio"),
    spec("News", Network, "News"),
    spec("P2P", Network, "P2P"),
    spec("RemoteAccess", Network, "Remote Access"),
    spec("Telephony", Network, "Telephony"),
    spec("TelephonyTools", Utility, "Telephony Tools"),
    spec("VideoConference", Network, "Video Conference"),
    spec("WebBrowser", Network, "Web Browser"),
    spec("Midi", AudioVideo, "Midi"),
    spec("Mixer", AudioVideo, "Mixer"),
    spec("Sequencer", AudioVideo, "Sequencer"),
    spec("Tuner", AudioVideo, "Tuner"),
    spec("TV", AudioVideo, "TV"),
    spec("AudioVideoEditing", AudioVideo, "Audio Video Editing"),
    spec("Player", AudioVideo, "Player"),
    spec("Recorder", AudioVideo, "Recorder"),
    spec("DiscBurning", AudioVideo, "Disc Burning"),
    spec("ActionGame", Game, "Action Game"),
    spec("AdventureGame", Game, "Adventure Game"),
    spec("ArcadeGame", Game, "Arcade Game"),
    spec("BoardGame", Game, "Board Game"),
    spec("BlocksGame", Game, "Blocks Game"),
    spec("CardGame", Game, "Card Game"),
    spec("KidsGame", Game, "Kids Game"),
    spec("LogicGame", Game, "Logic Game"),
    spec("RolePlaying", Game, "Role Playing"),
    spec("Shooter", Game, "Shooter"),
    spec("Simulation", Game, "Simulation"),
    spec("SportsGame", Game, "Sports Game"),
    spec("StrategyGame", Game, "Strategy Game"),
    spec("Art", Education, "Art"),
    spec("Construction", Education, "Construction"),
    spec("Music", AudioVideo, "Music"),
    spec("Languages", Education, "Languages"),
    spec("ArtificialIntelligence", Science, "Artificial Intelligence"),
    spec("Astronomy", Science, "Astronomy"),
    spec("Biology", Science, "Biology"),
    spec("Chemistry", Science, "Chemistry"),
    spec("ComputerScience", Science, "Computer Science"),
    spec("DataVisualization", Science, "Data Visualization"),
    spec("Economy", Education, "Economy"),
    spec("Electricity", Science, "Electricity"),
    spec("Geography", Education, "Geography"),
    spec("Geology", Science, "Geology"),
    spec("Geoscience", Science, "Geoscience"),
    spec("History", Education, "History"),
    spec("Humanities", Education, "Humanities"),
    spec("ImageProcessing", Science, "Image Processing"),
    spec("Literature", Education, "Literature"),
    spec("Maps", Education, "Maps"),
    spec("Math", Science, "Math"),
    spec("NumericalAnalysis", Science, "Numerical Analysis"),
    spec("MedicalSoftware", Science, "Medical Software"),
    spec("Physics", Science, "Physics"),
    spec("Robotics", Science, "Robotics"),
    spec("Spirituality", Education, "Spirituality"),
    spec("Sports", Education, "Sports"),
    spec("ParallelComputing", Science, "Parallel Computing"),
    spec("Amusement", Game, "Amusement"),
    spec("Archiving", Utility, "Archiving"),
    spec("Compression", Utility, "Compression"),
    spec("Electronics", Science, "Electronics"),
    spec("Emulator", System, "Emulator"),
    spec("Engineering", Science, "Engineering"),
    spec("FileTools", Utility, "File Tools"),
    spec("FileManager", System, "File Manager"),
    spec("TerminalEmulator", System, "Terminal Emulator"),
    spec("Filesystem", System, "Filesystem"),
    spec("Monitor", System, "Monitor"),
    spec("Security", Settings, "Security"),
    spec("Accessibility", Utility, "Accessibility"),
    spec("Calculator", Utility, "Calculator"),
    spec("Clock", Utility, "Clock"),
    spec("TextEditor", Utility, "Text Editor"),
    spec("Documentation", Other, "Documentation"),
    spec("Adult", Other, "Adult"),
    spec("Core", Other, "Core"),
    spec("KDE", Other, "KDE"),
    spec("GNOME", Other, "GNOME"),
    spec("XFCE", Other, "XFCE"),
    spec("GTK", Other, "GTK"),
    spec("Qt", Other, "Qt"),
    spec("Motif", Other, "Motif"),
    spec("Java", Other, "Java"),
    spec("ConsoleOnly", Other, "Console Only"),
    // Desktop-specific categories, reached through unvendoring
    spec("SettingsDialog", Settings, "Desktop Settings"),
    spec("PersonalSettings", Settings, "Personal Settings"),
    spec("SystemSettings", Settings, "System Settings"),
    spec("Toplevel", Other, "Top Level"),
    spec("X-XFCE", Other, "Xfce Applications"),
];

/// Every registered category, in table order.
pub fn all() -> &'static [CategorySpec] {
    CATEGORIES
}

/// Registry row for an exact token.
pub fn lookup(token: &str) -> Option<&'static CategorySpec> {
    CATEGORIES.iter().find(|spec| spec.name == token)
}

/// Categories whose default section is `section`.
pub fn categories_in(section: SectionGroup) -> impl Iterator<Item = &'static CategorySpec> {
    CATEGORIES.iter().filter(move |spec| spec.section == section)
}

/// Removes the vendor segment of an `X-` token.
///
/// `X-Red-Hat-Base` gives `Base`, `X-XFCE-SettingsDialog` gives
/// `SettingsDialog`. Tokens that are not vendor-prefixed give `None`.
pub fn unvendor(token: &str) -> Option<&str> {
    if let Some(rest) = token.strip_prefix("X-Red-Hat-") {
        return Some(rest).filter(|rest| !rest.is_empty());
    }
    let rest = token.strip_prefix("X-")?;
    let (_vendor, name) = rest.split_once('-')?;
    Some(name).filter(|name| !name.is_empty())
}

/// Human readable description for a category token.
///
/// ```
/// use xdg_menu_tree::category::describe;
///
/// assert_eq!(describe("Utility"), "Accessories");
/// assert_eq!(describe("X-XFCE-SettingsDialog"), "Desktop Settings (X-XFCE-SettingsDialog)");
/// assert_eq!(describe("FooBarBaz"), "Foo Bar Baz");
/// assert_eq!(describe(""), "Other");
/// ```
pub fn describe(token: &str) -> String {
    if let Some(spec) = lookup(token) {
        return spec.description.to_string();
    }
    if let Some(spec) = unvendor(token).and_then(lookup) {
        return format!("{} ({})", spec.description, token);
    }
    if !token.chars().any(char::is_alphabetic) {
        return "Other".to_string();
    }
    split_camel_case(token)
}

/// Section a category token belongs to.
pub fn section_of(token: &str) -> SectionGroup {
    lookup(token)
        .or_else(|| unvendor(token).and_then(lookup))
        .map(|spec| spec.section)
        .unwrap_or(SectionGroup::Other)
}

/// Inserts a space before every run of capitals that follows a lowercase
/// letter or digit: `FooBarBaz` becomes `Foo Bar Baz`.
pub fn split_camel_case(token: &str) -> String {
    let mut out = String::with_capacity(token.len() + 4);
    let mut previous: Option<char> = None;
    for c in token.chars() {
        if c.is_uppercase()
            && previous.is_some_and(|p| p.is_lowercase() || p.is_ascii_digit())
        {
            out.push(' ');
        }
        out.push(c);
        previous = Some(c);
    }
    out
}
