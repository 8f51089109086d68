//! Build information module
//!
//! Compile-time build number and timestamp, surfaced in the startup banner,
//! the status tool and the outbound User-Agent header.

use serde::Serialize;

/// Build number, bumped by build.rs on every compile
pub const BUILD_NUMBER: u64 = match option_env!("AUTOCENTILE_BUILD_NUMBER") {
    Some(s) => match parse_u64(s) {
        Some(n) => n,
        None => 0,
    },
    None => 0,
};

/// ISO 8601, or "unknown" when built without build.rs
pub const BUILD_TIMESTAMP: &str = match option_env!("AUTOCENTILE_BUILD_TIMESTAMP") {
    Some(s) => s,
    None => "unknown",
};

/// Package version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Package name from Cargo.toml, also the User-Agent product token
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// Package description from Cargo.toml
pub const DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");

/// Compile-time u64 parse; empty or non-digit input yields `None`
const fn parse_u64(s: &str) -> Option<u64> {
    let bytes = s.as_bytes();
    if bytes.is_empty() {
        return None;
    }
    let mut result: u64 = 0;
    let mut i = 0;
    while i < bytes.len() {
        let b = bytes[i];
        if b < b'0' || b > b'9' {
            return None;
        }
        result = result * 10 + (b - b'0') as u64;
        i += 1;
    }
    Some(result)
}

/// Build information reported by the status tool and User-Agent
#[derive(Debug, Clone, Serialize)]
pub struct BuildInfo {
    pub name: &'static str,
    pub version: &'static str,
    pub build_number: u64,
    pub build_timestamp: &'static str,
}

impl BuildInfo {
    /// Build info of the running binary
    pub fn current() -> Self {
        Self {
            name: NAME,
            version: VERSION,
            build_number: BUILD_NUMBER,
            build_timestamp: BUILD_TIMESTAMP,
        }
    }

    /// Value sent as `User-Agent` to the growth API, e.g. `autocentile/1.0.0 (build 12)`
    pub fn user_agent(&self) -> String {
        format!("{}/{} (build {})", self.name, self.version, self.build_number)
    }
}

/// Print the startup banner to stderr
pub fn print_startup_banner() {
    let info = BuildInfo::current();
    eprintln!("===============================================");
    eprintln!("  Auto Centile Calculator");
    eprintln!("  Version: {} | Build: {}", info.version, info.build_number);
    eprintln!("  Compiled: {}", info.build_timestamp);
    eprintln!("  {}", DESCRIPTION);
    eprintln!("===============================================");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_u64() {
        assert_eq!(parse_u64("42"), Some(42));
        assert_eq!(parse_u64("0"), Some(0));
        assert_eq!(parse_u64(""), None);
        assert_eq!(parse_u64("4a"), None);
    }

    #[test]
    fn test_user_agent_names_package_and_build() {
        let ua = BuildInfo::current().user_agent();
        assert!(ua.starts_with("autocentile/"));
        assert!(ua.contains("(build "));
    }
}
