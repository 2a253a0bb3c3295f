//! Host platform detection.

use crate::error::SvmError;
use std::fmt;

/// A platform the binaries mirror publishes `solc` builds for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Platform {
    /// 64-bit x86 Linux.
    LinuxAmd64,
    /// macOS (the amd64 builds also run on Apple silicon).
    MacosxAmd64,
    /// 64-bit Windows.
    WindowsAmd64,
}

impl Platform {
    /// Detects the platform of the running process.
    pub fn detect() -> Result<Self, SvmError> {
        Self::from_os_arch(std::env::consts::OS, std::env::consts::ARCH)
    }

    /// Maps an operating system and architecture pair to a platform.
    pub fn from_os_arch(os: &str, arch: &str) -> Result<Self, SvmError> {
        match (os, arch) {
            ("linux", "x86_64") => Ok(Platform::LinuxAmd64),
            ("macos", "x86_64" | "aarch64") => Ok(Platform::MacosxAmd64),
            ("windows", "x86_64" | "aarch64") => Ok(Platform::WindowsAmd64),
            _ => Err(SvmError::UnsupportedPlatform {
                os: os.to_string(),
                arch: arch.to_string(),
            }),
        }
    }

    /// The directory name used by the mirrors.
    pub fn as_str(self) -> &'static str {
        match self {
            Platform::LinuxAmd64 => "linux-amd64",
            Platform::MacosxAmd64 => "macosx-amd64",
            Platform::WindowsAmd64 => "windows-amd64",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_pairs() {
        assert_eq!(Platform::from_os_arch("linux", "x86_64").unwrap(), Platform::LinuxAmd64);
        assert_eq!(Platform::from_os_arch("macos", "aarch64").unwrap(), Platform::MacosxAmd64);
        assert_eq!(Platform::from_os_arch("windows", "x86_64").unwrap().to_string(), "windows-amd64");
    }

    #[test]
    fn linux_arm_unsupported() {
        let err = Platform::from_os_arch("linux", "aarch64").unwrap_err();
        assert_eq!(err.to_string(), "solc binaries are not available for linux-aarch64");
    }
}
