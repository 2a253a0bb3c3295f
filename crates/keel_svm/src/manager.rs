//! Installing, verifying, and removing compiler releases.

use crate::checksum;
use crate::error::SvmError;
use crate::listing::SolcBuilds;
use crate::platform::Platform;
use crate::source::{Progress, ReleaseSource};
use crate::unzip;
use keel_common::SemanticVersion;
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, LazyLock, Mutex};
use std::time::Duration;

/// The official binaries mirror.
pub const BINARIES_URL: &str = "https://binaries.soliditylang.org";
/// The GitHub mirror of the binaries repository.
pub const GITHUB_URL: &str = "https://raw.githubusercontent.com/ethereum/solc-bin/gh-pages";
/// Download attempts before an install gives up, alternating mirrors.
pub const INSTALL_RETRY_COUNT: usize = 5;

const LIST_TIMEOUT: Duration = Duration::from_millis(500);

static RELEASE_DIR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"-v(?P<version>\d+\.\d+\.\d+)\+commit\.").expect("release dir pattern is valid")
});

/// Manages `solc` releases under `{data}/compilers/`.
///
/// The release listing is cached at `compilers/solc.json`; each release lives
/// in `compilers/{dirname}/{filename}`.
pub struct SolcVersionManager {
    platform: Platform,
    compilers_dir: PathBuf,
    list_path: PathBuf,
    source: Arc<dyn ReleaseSource>,
    builds: Mutex<Option<Arc<SolcBuilds>>>,
    refreshed: AtomicBool,
}

impl SolcVersionManager {
    /// Creates a manager for the host platform.
    pub fn new(data_dir: &Path, source: Arc<dyn ReleaseSource>) -> Result<Self, SvmError> {
        Self::with_platform(data_dir, Platform::detect()?, source)
    }

    /// Creates a manager for an explicit platform.
    pub fn with_platform(
        data_dir: &Path,
        platform: Platform,
        source: Arc<dyn ReleaseSource>,
    ) -> Result<Self, SvmError> {
        let compilers_dir = data_dir.join("compilers");
        std::fs::create_dir_all(&compilers_dir).map_err(|e| SvmError::io(&compilers_dir, e))?;
        Ok(Self {
            platform,
            list_path: compilers_dir.join("solc.json"),
            compilers_dir,
            source,
            builds: Mutex::new(None),
            refreshed: AtomicBool::new(false),
        })
    }

    /// The platform binaries are fetched for.
    pub fn platform(&self) -> Platform {
        self.platform
    }

    /// The directory holding installed releases.
    pub fn compilers_dir(&self) -> &Path {
        &self.compilers_dir
    }

    fn list_urls(&self) -> [String; 2] {
        [
            format!("{BINARIES_URL}/{}/list.json", self.platform),
            format!("{GITHUB_URL}/{}/list.json", self.platform),
        ]
    }

    fn cached(&self) -> Option<Arc<SolcBuilds>> {
        self.builds.lock().ok().and_then(|guard| guard.clone())
    }

    fn store(&self, builds: SolcBuilds) -> Arc<SolcBuilds> {
        let builds = Arc::new(builds);
        if let Ok(mut guard) = self.builds.lock() {
            *guard = Some(Arc::clone(&builds));
        }
        builds
    }

    fn load_list_file(&self) -> Result<SolcBuilds, SvmError> {
        let bytes = std::fs::read(&self.list_path).map_err(|e| SvmError::io(&self.list_path, e))?;
        SolcBuilds::from_slice(&bytes)
    }

    /// Returns the release listing.
    ///
    /// Without `force` the in-memory or on-disk copy is used when present.
    /// Otherwise each mirror is tried in turn, and the on-disk copy is the
    /// last resort. A listing is downloaded at most once per manager.
    pub async fn builds(&self, force: bool) -> Result<Arc<SolcBuilds>, SvmError> {
        if let Some(builds) = self.cached() {
            if !force || self.refreshed.load(Ordering::Acquire) {
                return Ok(builds);
            }
        }
        if !force && self.list_path.is_file() {
            match self.load_list_file() {
                Ok(builds) => return Ok(self.store(builds)),
                Err(e) => tracing::debug!("ignoring cached release list: {e}"),
            }
        }

        let mut last_error = None;
        for url in self.list_urls() {
            tracing::debug!(%url, "downloading solc release list");
            let fetched = self.source.fetch(&url, LIST_TIMEOUT).await;
            match fetched.and_then(|bytes| SolcBuilds::from_slice(&bytes).map(|b| (bytes, b))) {
                Ok((bytes, builds)) => {
                    write_atomic(&self.list_path, &bytes)?;
                    self.refreshed.store(true, Ordering::Release);
                    return Ok(self.store(builds));
                }
                Err(e) => {
                    tracing::warn!("failed to download solc release list from {url}: {e}");
                    last_error = Some(e);
                }
            }
        }

        if self.list_path.is_file() {
            return Ok(self.store(self.load_list_file()?));
        }
        Err(SvmError::ListUnavailable {
            reason: last_error.map_or_else(|| "no mirrors".to_string(), |e| e.to_string()),
        })
    }

    /// Every release version for this platform, oldest first.
    pub async fn list_all(&self, force: bool) -> Result<Vec<SemanticVersion>, SvmError> {
        Ok(self.builds(force).await?.versions())
    }

    /// Maps a release file name to its install location.
    fn path_for(&self, filename: &str) -> PathBuf {
        let dirname = filename
            .strip_suffix(".exe")
            .or_else(|| filename.strip_suffix(".zip"))
            .unwrap_or(filename);
        let binary = match filename.strip_suffix(".zip") {
            Some(stem) => format!("{stem}.exe"),
            None => filename.to_string(),
        };
        self.compilers_dir.join(dirname).join(binary)
    }

    /// The path the binary of `version` is (or would be) installed at.
    pub async fn get_path(&self, version: &SemanticVersion) -> Result<PathBuf, SvmError> {
        let builds = self.builds(false).await?;
        Ok(self.path_for(builds.filename(version)?))
    }

    /// Returns `true` if `version` is installed and matches the listed
    /// checksums.
    pub async fn installed(&self, version: &SemanticVersion) -> Result<bool, SvmError> {
        let builds = self.builds(false).await?;
        let filename = builds.filename(version)?;
        let path = self.path_for(filename);
        if !path.is_file() {
            return Ok(false);
        }
        Ok(self.verify_installed(&builds, version, filename, &path))
    }

    fn verify_installed(
        &self,
        builds: &SolcBuilds,
        version: &SemanticVersion,
        filename: &str,
        path: &Path,
    ) -> bool {
        // Unpacked archives cannot be checked against the archive checksum.
        let target = if filename.ends_with(".zip") {
            let archive = path.with_file_name(filename);
            if !archive.is_file() {
                return true;
            }
            archive
        } else {
            path.to_path_buf()
        };
        match builds.build(version) {
            Some(info) => checksum::verify(&target, info).is_ok(),
            None => false,
        }
    }

    /// Installs `version`, returning the binary path.
    ///
    /// A present binary whose checksums verify is kept unless `force` is set.
    /// Downloads alternate between the two mirrors for up to
    /// [`INSTALL_RETRY_COUNT`] attempts.
    pub async fn install(
        &self,
        version: &SemanticVersion,
        force: bool,
        progress: Option<Progress<'_>>,
    ) -> Result<PathBuf, SvmError> {
        let mut builds = self.builds(false).await?;
        if !builds.releases.contains_key(version) {
            builds = self.builds(true).await?;
        }
        let filename = builds.filename(version)?.to_string();
        let path = self.path_for(&filename);
        if !force && path.is_file() && self.verify_installed(&builds, version, &filename, &path) {
            tracing::debug!(%version, "solc already installed");
            return Ok(path);
        }
        let info = builds
            .build(version)
            .ok_or_else(|| SvmError::UnknownVersion {
                version: version.clone(),
            })?;

        let dir = path.parent().unwrap_or(&self.compilers_dir).to_path_buf();
        std::fs::create_dir_all(&dir).map_err(|e| SvmError::io(&dir, e))?;
        let download_path = dir.join(&filename);

        let mut last_error = None;
        for attempt in 0..INSTALL_RETRY_COUNT {
            let mirror = if attempt % 2 == 0 { BINARIES_URL } else { GITHUB_URL };
            let url = format!("{mirror}/{}/{filename}", self.platform);
            tracing::info!(%version, %url, attempt, "downloading solc");
            let result = match self.source.download(&url, &download_path, progress).await {
                Ok(()) => checksum::verify(&download_path, info),
                Err(e) => Err(e),
            };
            match result {
                Ok(()) => {
                    last_error = None;
                    break;
                }
                Err(e) => {
                    tracing::warn!(%version, attempt, "solc download failed: {e}");
                    last_error = Some(e);
                }
            }
        }
        if let Some(e) = last_error {
            if download_path.exists() {
                let _ = std::fs::remove_file(&download_path);
            }
            return Err(e);
        }

        if filename.ends_with(".zip") {
            unzip::extract_solc(&download_path, &path)?;
        }
        make_executable(&path)?;
        tracing::info!(%version, path = %path.display(), "installed solc");
        Ok(path)
    }

    /// Deletes the installation directory of `version`.
    pub async fn remove(&self, version: &SemanticVersion) -> Result<(), SvmError> {
        let path = self.get_path(version).await?;
        let dir = path.parent().unwrap_or(&self.compilers_dir);
        if !dir.is_dir() || dir == self.compilers_dir {
            return Err(SvmError::NotInstalled {
                version: version.clone(),
            });
        }
        std::fs::remove_dir_all(dir).map_err(|e| SvmError::io(dir, e))
    }

    /// Versions with an installation directory holding a binary, sorted.
    ///
    /// Reads only the local layout; no listing is needed.
    pub fn installed_versions(&self) -> Result<Vec<SemanticVersion>, SvmError> {
        let entries = match std::fs::read_dir(&self.compilers_dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(SvmError::io(&self.compilers_dir, e)),
        };
        let mut versions = Vec::new();
        for entry in entries.flatten() {
            let dir = entry.path();
            let Some(name) = dir.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            let Some(version) = RELEASE_DIR
                .captures(name)
                .and_then(|c| c.name("version"))
                .and_then(|m| m.as_str().parse::<SemanticVersion>().ok())
            else {
                continue;
            };
            let has_binary = dir.join(name).is_file() || dir.join(format!("{name}.exe")).is_file();
            if has_binary {
                versions.push(version);
            }
        }
        versions.sort();
        versions.dedup();
        Ok(versions)
    }
}

fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), SvmError> {
    let tmp = path.with_extension("json.tmp");
    std::fs::write(&tmp, bytes).map_err(|e| SvmError::io(&tmp, e))?;
    std::fs::rename(&tmp, path).map_err(|e| SvmError::io(path, e))
}

#[cfg(unix)]
fn make_executable(path: &Path) -> Result<(), SvmError> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o775))
        .map_err(|e| SvmError::io(path, e))
}

#[cfg(not(unix))]
fn make_executable(_path: &Path) -> Result<(), SvmError> {
    Ok(())
}
