//! Where compiler binaries come from.

use std::path::PathBuf;

use async_trait::async_trait;
use keel_common::SemanticVersion;
use keel_svm::{SolcVersionManager, SvmError};

/// Supplies compiler releases to a build.
#[async_trait]
pub trait VersionProvider: Send + Sync {
    /// Every release that can be used, in any order. Implementations should
    /// consult the remote listing so new releases are seen.
    async fn available(&self) -> Result<Vec<SemanticVersion>, SvmError>;

    /// Makes `version` runnable, installing it if needed.
    async fn ensure(&self, version: &SemanticVersion) -> Result<(), SvmError>;

    /// The binary of `version`.
    async fn path(&self, version: &SemanticVersion) -> Result<PathBuf, SvmError>;
}

#[async_trait]
impl VersionProvider for SolcVersionManager {
    async fn available(&self) -> Result<Vec<SemanticVersion>, SvmError> {
        self.list_all(true).await
    }

    async fn ensure(&self, version: &SemanticVersion) -> Result<(), SvmError> {
        if self.installed(version).await? {
            return Ok(());
        }
        self.install(version, false, None).await.map(|_| ())
    }

    async fn path(&self, version: &SemanticVersion) -> Result<PathBuf, SvmError> {
        self.get_path(version).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use keel_svm::{Platform, Progress, ReleaseSource, SolcBuildInfo, SolcBuilds, BINARIES_URL};
    use std::collections::BTreeMap;
    use std::path::Path;
    use std::sync::Arc;
    use std::time::Duration;

    fn listing(versions: &[SemanticVersion]) -> Vec<u8> {
        let builds = versions
            .iter()
            .map(|v| SolcBuildInfo {
                path: format!("solc-linux-amd64-v{v}+commit.00000000"),
                version: v.clone(),
                build: "commit.00000000".into(),
                long_version: format!("{v}+commit.00000000"),
                keccak256: String::new(),
                sha256: String::new(),
                urls: vec![],
            })
            .collect::<Vec<_>>();
        let releases: BTreeMap<_, _> = builds
            .iter()
            .map(|b| (b.version.clone(), b.path.clone()))
            .collect();
        let latest = versions.last().map(ToString::to_string).unwrap_or_default();
        serde_json::to_vec(&SolcBuilds {
            builds,
            releases,
            latest_release: latest,
        })
        .unwrap()
    }

    struct Mirror(Vec<u8>);

    #[async_trait]
    impl ReleaseSource for Mirror {
        async fn fetch(&self, url: &str, _timeout: Duration) -> Result<Vec<u8>, SvmError> {
            if url == format!("{BINARIES_URL}/linux-amd64/list.json") {
                Ok(self.0.clone())
            } else {
                Err(SvmError::Download {
                    url: url.to_string(),
                    reason: "404 Not Found".into(),
                })
            }
        }

        async fn download(
            &self,
            url: &str,
            _dest: &Path,
            _progress: Option<Progress<'_>>,
        ) -> Result<(), SvmError> {
            Err(SvmError::Download {
                url: url.to_string(),
                reason: "offline".into(),
            })
        }
    }

    #[tokio::test]
    async fn available_sees_releases_newer_than_the_cached_list() {
        let dir = tempfile::tempdir().unwrap();
        let old = SemanticVersion::new(0, 8, 29);
        let new = SemanticVersion::new(0, 8, 30);
        std::fs::create_dir_all(dir.path().join("compilers")).unwrap();
        std::fs::write(
            dir.path().join("compilers/solc.json"),
            listing(std::slice::from_ref(&old)),
        )
        .unwrap();

        let mirror = Arc::new(Mirror(listing(&[old.clone(), new.clone()])));
        let manager =
            SolcVersionManager::with_platform(dir.path(), Platform::LinuxAmd64, mirror).unwrap();
        assert_eq!(manager.available().await.unwrap(), vec![old, new]);
    }
}
