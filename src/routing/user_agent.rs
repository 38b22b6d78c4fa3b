//! User-agent classification for `/api/download`.
//!
//! # Responsibilities
//! - Parse the operating system family (and version) out of a user agent
//! - Map the family to one of three download destinations
//!
//! # Design Decisions
//! - Rules are an ordered list; first match wins
//! - Compiled once at startup, read-only afterwards
//! - Total: anything unrecognised (including no header) is `Other`

use std::fmt;

use regex::Regex;

/// iOS app store listing.
pub const IOS_STORE_URL: &str =
    "https://itunes.apple.com/ca/app/brave-web-browser/id1052879175?mt=8#";
/// Google Play listing.
pub const ANDROID_STORE_URL: &str =
    "https://play.google.com/store/apps/details?id=com.linkbubble.playstore";
/// Desktop release page.
pub const RELEASES_URL: &str = "https://github.com/brave/browser-laptop/releases";

/// Operating system families we can tell apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OsFamily {
    Ios,
    Android,
    WindowsPhone,
    Windows,
    MacOsX,
    ChromeOs,
    Linux,
    Other,
}

impl OsFamily {
    pub fn name(self) -> &'static str {
        match self {
            OsFamily::Ios => "iOS",
            OsFamily::Android => "Android",
            OsFamily::WindowsPhone => "Windows Phone",
            OsFamily::Windows => "Windows",
            OsFamily::MacOsX => "Mac OS X",
            OsFamily::ChromeOs => "Chrome OS",
            OsFamily::Linux => "Linux",
            OsFamily::Other => "Other",
        }
    }
}

/// A parsed operating system. Displays as `"iOS 10.3"`, `"Android 7"`, `"Other"`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperatingSystem {
    pub family: OsFamily,
    pub major: Option<String>,
    pub minor: Option<String>,
}

impl OperatingSystem {
    fn other() -> Self {
        Self {
            family: OsFamily::Other,
            major: None,
            minor: None,
        }
    }
}

impl fmt::Display for OperatingSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.family.name())?;
        if let Some(major) = &self.major {
            write!(f, " {}", major)?;
            if let Some(minor) = &self.minor {
                write!(f, ".{}", minor)?;
            }
        }
        Ok(())
    }
}

/// Where `/api/download` sends a client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DownloadTarget {
    AppStore,
    PlayStore,
    Releases,
}

impl DownloadTarget {
    pub fn url(self) -> &'static str {
        match self {
            DownloadTarget::AppStore => IOS_STORE_URL,
            DownloadTarget::PlayStore => ANDROID_STORE_URL,
            DownloadTarget::Releases => RELEASES_URL,
        }
    }
}

struct OsRule {
    regex: Regex,
    family: OsFamily,
}

/// Ordered OS detection rules. Windows Phone precedes Android and iOS
/// precedes Mac OS X because their user agents mention the latter.
const RULES: &[(&str, OsFamily)] = &[
    (r"Windows Phone(?: OS)?[ /](\d+)(?:\.(\d+))?", OsFamily::WindowsPhone),
    (r"Windows Phone", OsFamily::WindowsPhone),
    (r"\((?:iPhone|iPad|iPod)(?: touch)?;.*? OS (\d+)[_.](\d+)", OsFamily::Ios),
    (r"\b(?:iPhone|iPad|iPod)\b", OsFamily::Ios),
    (r"CFNetwork/[\d.]+ Darwin/", OsFamily::Ios),
    (r"Android[ /-](\d+)(?:\.(\d+))?", OsFamily::Android),
    (r"Android", OsFamily::Android),
    (r"CrOS [^ ]+ (\d+)\.(\d+)", OsFamily::ChromeOs),
    (r"Mac OS X (\d+)[_.](\d+)", OsFamily::MacOsX),
    (r"Mac OS X|Macintosh", OsFamily::MacOsX),
    (r"Windows NT (\d+)\.(\d+)", OsFamily::Windows),
    (r"Windows", OsFamily::Windows),
    (r"Linux", OsFamily::Linux),
];

/// Maps user agents to download destinations.
pub struct UserAgentClassifier {
    rules: Vec<OsRule>,
}

impl UserAgentClassifier {
    /// Compile the detection rules.
    pub fn new() -> Result<Self, regex::Error> {
        let rules = RULES
            .iter()
            .map(|(pattern, family)| {
                Ok(OsRule {
                    regex: Regex::new(pattern)?,
                    family: *family,
                })
            })
            .collect::<Result<Vec<_>, regex::Error>>()?;
        Ok(Self { rules })
    }

    /// Parse the operating system out of a user agent.
    pub fn parse_os(&self, user_agent: &str) -> OperatingSystem {
        for rule in &self.rules {
            if let Some(caps) = rule.regex.captures(user_agent) {
                return OperatingSystem {
                    family: rule.family,
                    major: caps.get(1).map(|m| m.as_str().to_string()),
                    minor: caps.get(2).map(|m| m.as_str().to_string()),
                };
            }
        }
        OperatingSystem::other()
    }

    /// Pick the download destination for a (possibly missing) user agent.
    pub fn classify(&self, user_agent: Option<&str>) -> DownloadTarget {
        let os = match user_agent {
            Some(ua) => self.parse_os(ua),
            None => OperatingSystem::other(),
        };
        let name = os.to_string();

        let target = if name.starts_with("iOS") {
            DownloadTarget::AppStore
        } else if name.starts_with("Android") {
            DownloadTarget::PlayStore
        } else {
            DownloadTarget::Releases
        };
        tracing::debug!(os = %name, target = ?target, "Classified user agent");
        target
    }
}
