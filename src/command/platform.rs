// src/command/platform.rs

use std::fmt;

/// Operating-system family, as far as choosing a command interpreter goes.
///
/// Classification happens once (see [`Platform::current`]); everything
/// downstream branches on this closed set instead of on OS name strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Platform {
    /// Unix-like systems with a Bourne-compatible `/bin/sh`.
    Posix,
    /// NT-based Windows (`cmd.exe`).
    WindowsModern,
    /// DOS-based Windows (95/98/ME), which only ship `command.com`.
    WindowsLegacy,
    /// Anything we cannot classify.
    Unknown,
}

impl Platform {
    /// Classify the platform this binary was built for.
    pub fn current() -> Self {
        Self::from_os_name(std::env::consts::OS)
    }

    /// Classify an OS name.
    ///
    /// Accepts both Rust's `std::env::consts::OS` values (`"linux"`,
    /// `"windows"`, ...) and human-readable names such as `"Windows 98"` or
    /// `"Mac OS X"`. Matching is case-insensitive.
    pub fn from_os_name(name: &str) -> Self {
        let name = name.trim().to_lowercase();

        if name.starts_with("windows") {
            let rest = name.trim_start_matches("windows").trim();
            return match rest {
                "95" | "98" | "me" => Platform::WindowsLegacy,
                _ => Platform::WindowsModern,
            };
        }

        const POSIX_NAMES: &[&str] = &[
            "linux",
            "macos",
            "mac os x",
            "darwin",
            "freebsd",
            "openbsd",
            "netbsd",
            "dragonfly",
            "solaris",
            "sunos",
            "illumos",
            "aix",
            "hp-ux",
            "android",
            "ios",
            "haiku",
        ];

        if POSIX_NAMES.contains(&name.as_str()) {
            Platform::Posix
        } else {
            Platform::Unknown
        }
    }

    /// Default interpreter prefix for this platform, if it has one.
    pub fn interpreter_prefix(self) -> Option<&'static [&'static str]> {
        match self {
            Platform::Posix => Some(&["/bin/sh", "-c"]),
            Platform::WindowsModern => Some(&["cmd.exe", "/C"]),
            Platform::WindowsLegacy => Some(&["command.com", "/C"]),
            Platform::Unknown => None,
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Platform::Posix => "posix",
            Platform::WindowsModern => "windows",
            Platform::WindowsLegacy => "windows-legacy",
            Platform::Unknown => "unknown",
        };
        f.write_str(s)
    }
}
