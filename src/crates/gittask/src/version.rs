//! Version information for gittask
//!
//! Build number, git commit and build timestamp are injected by `build.rs`.

/// Full version line printed by `gittask version`
///
/// # Example
///
/// ```
/// use gittask::version::full_version;
///
/// println!("{}", full_version());
/// // gittask v0.1.0 (build 42, commit abc123, built 2025-01-15T10:30:00Z)
/// ```
pub fn full_version() -> String {
    VersionInfo::get().to_string()
}

/// Version metadata as a struct
#[derive(Debug, Clone)]
pub struct VersionInfo {
    pub version: &'static str,
    pub build_number: &'static str,
    pub git_commit: &'static str,
    pub build_timestamp: &'static str,
}

impl VersionInfo {
    pub fn get() -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION"),
            build_number: env!("BUILD_NUMBER"),
            git_commit: env!("GIT_COMMIT"),
            build_timestamp: env!("BUILD_TIMESTAMP"),
        }
    }
}

impl std::fmt::Display for VersionInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "gittask v{} (build {}, commit {}, built {})",
            self.version, self.build_number, self.git_commit, self.build_timestamp
        )
    }
}
