//! The per-session build context.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use keel_common::SemanticVersion;
use keel_config::KeelConfig;
use keel_driver::PathArgs;
use keel_graph::{CompilationUnit, SourcePathLocator, SourceUnitNameResolver};
use tokio::sync::{Mutex, OnceCell, Semaphore};

use crate::provider::VersionProvider;

/// Directory under the project root holding the build cache.
pub const BUILD_DIR: &str = ".keel/build";

type InstallCell = Arc<OnceCell<Result<PathBuf, String>>>;

/// Everything one project session shares across builds.
///
/// Created once per CLI invocation or editor session and passed to every
/// [`Compiler`](crate::Compiler) explicitly.
pub struct BuildContext {
    config: KeelConfig,
    project_root: PathBuf,
    resolver: SourceUnitNameResolver,
    locator: SourcePathLocator,
    provider: Arc<dyn VersionProvider>,
    data_dir: PathBuf,
    tool_version: String,
    jobs: Arc<Semaphore>,
    installs: Mutex<HashMap<SemanticVersion, InstallCell>>,
}

impl BuildContext {
    /// Creates a context for the project at `project_root`.
    ///
    /// `bundled_path` is the library directory shipped with the tool, if
    /// any. At most `[build] jobs` compiler processes run at once, defaulting
    /// to the available parallelism.
    pub fn new(
        project_root: &Path,
        config: KeelConfig,
        data_dir: &Path,
        bundled_path: Option<PathBuf>,
        provider: Arc<dyn VersionProvider>,
    ) -> Self {
        let resolver = SourceUnitNameResolver::new(
            project_root.to_path_buf(),
            config.compiler.solc.include_paths.clone(),
            bundled_path,
            config.compiler.solc.remappings.clone(),
        );
        let locator = resolver.locator();
        let jobs = config
            .build
            .jobs
            .filter(|&n| n > 0)
            .unwrap_or_else(|| std::thread::available_parallelism().map_or(1, |n| n.get()));
        Self {
            config,
            project_root: project_root.to_path_buf(),
            resolver,
            locator,
            provider,
            data_dir: data_dir.to_path_buf(),
            tool_version: env!("CARGO_PKG_VERSION").to_string(),
            jobs: Arc::new(Semaphore::new(jobs)),
            installs: Mutex::new(HashMap::new()),
        }
    }

    /// Overrides the tool version recorded in the build cache.
    pub fn with_tool_version(mut self, version: &str) -> Self {
        self.tool_version = version.to_string();
        self
    }

    /// The project configuration.
    pub fn config(&self) -> &KeelConfig {
        &self.config
    }

    /// The project root.
    pub fn project_root(&self) -> &Path {
        &self.project_root
    }

    /// The source unit name resolver.
    pub fn resolver(&self) -> &SourceUnitNameResolver {
        &self.resolver
    }

    /// The source path locator over the resolver's roots.
    pub fn locator(&self) -> &SourcePathLocator {
        &self.locator
    }

    /// The global data directory.
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// The tool version recorded in the build cache.
    pub fn tool_version(&self) -> &str {
        &self.tool_version
    }

    /// `{project}/.keel/build`.
    pub fn build_dir(&self) -> PathBuf {
        self.project_root.join(BUILD_DIR)
    }

    /// The compiler version provider.
    pub fn provider(&self) -> &Arc<dyn VersionProvider> {
        &self.provider
    }

    /// The semaphore bounding concurrent compiler processes.
    pub fn jobs(&self) -> &Arc<Semaphore> {
        &self.jobs
    }

    /// Filesystem arguments for compiler invocations.
    pub fn path_args(&self) -> PathArgs {
        let solc = &self.config.compiler.solc;
        PathArgs {
            allow_paths: solc.allow_paths.clone(),
            include_paths: solc.include_paths.clone(),
            bundled: self.resolver.bundled_path().map(Path::to_path_buf),
        }
    }

    /// Returns `true` if every file of `unit` lives in the bundled library.
    pub fn is_bundled_only(&self, unit: &CompilationUnit) -> bool {
        match self.resolver.bundled_path() {
            Some(bundled) => !unit.files.is_empty() && unit.files.iter().all(|f| f.starts_with(bundled)),
            None => false,
        }
    }

    /// Installs `version` at most once per session and returns its binary.
    ///
    /// Concurrent callers for the same version wait for the first install.
    /// A failed install is forgotten so that a later build retries it.
    pub async fn ensure_version(&self, version: &SemanticVersion) -> Result<PathBuf, String> {
        let cell = {
            let mut installs = self.installs.lock().await;
            Arc::clone(installs.entry(version.clone()).or_default())
        };
        let result = cell
            .get_or_init(|| async {
                tracing::debug!(%version, "ensuring solc is installed");
                match self.provider.ensure(version).await {
                    Ok(()) => self.provider.path(version).await.map_err(|e| e.to_string()),
                    Err(e) => Err(e.to_string()),
                }
            })
            .await
            .clone();
        if result.is_err() {
            let mut installs = self.installs.lock().await;
            if installs.get(version).is_some_and(|c| Arc::ptr_eq(c, &cell)) {
                installs.remove(version);
            }
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use keel_svm::SvmError;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct CountingProvider {
        ensures: AtomicUsize,
        fail: bool,
    }

    #[async_trait]
    impl VersionProvider for CountingProvider {
        async fn available(&self) -> Result<Vec<SemanticVersion>, SvmError> {
            Ok(vec![SemanticVersion::new(0, 8, 24)])
        }

        async fn ensure(&self, version: &SemanticVersion) -> Result<(), SvmError> {
            self.ensures.fetch_add(1, Ordering::SeqCst);
            tokio::task::yield_now().await;
            if self.fail {
                return Err(SvmError::UnknownVersion {
                    version: version.clone(),
                });
            }
            Ok(())
        }

        async fn path(&self, version: &SemanticVersion) -> Result<PathBuf, SvmError> {
            Ok(PathBuf::from(format!("/solc-{version}")))
        }
    }

    fn context(provider: Arc<CountingProvider>) -> BuildContext {
        BuildContext::new(
            Path::new("/p"),
            KeelConfig::default(),
            Path::new("/data"),
            Some(PathBuf::from("/data/bundled")),
            provider,
        )
    }

    #[tokio::test]
    async fn concurrent_installs_are_deduplicated() {
        let provider = Arc::new(CountingProvider::default());
        let ctx = Arc::new(context(provider.clone()));
        let v = SemanticVersion::new(0, 8, 24);

        let mut tasks = tokio::task::JoinSet::new();
        for _ in 0..8 {
            let ctx = Arc::clone(&ctx);
            let v = v.clone();
            tasks.spawn(async move { ctx.ensure_version(&v).await });
        }
        while let Some(result) = tasks.join_next().await {
            assert_eq!(result.unwrap().unwrap(), PathBuf::from("/solc-0.8.24"));
        }
        assert_eq!(provider.ensures.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn failed_install_is_retried() {
        let provider = Arc::new(CountingProvider {
            fail: true,
            ..CountingProvider::default()
        });
        let ctx = context(provider.clone());
        let v = SemanticVersion::new(0, 8, 24);
        assert!(ctx.ensure_version(&v).await.is_err());
        assert!(ctx.ensure_version(&v).await.is_err());
        assert_eq!(provider.ensures.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn bundled_only_units() {
        let ctx = context(Arc::new(CountingProvider::default()));
        let mut unit = CompilationUnit {
            names: ["console.sol".to_string()].into(),
            files: [PathBuf::from("/data/bundled/console.sol")].into(),
            versions: "*".parse().unwrap(),
            hash: keel_common::ContentHash::ZERO,
        };
        assert!(ctx.is_bundled_only(&unit));
        unit.files.insert(PathBuf::from("/p/A.sol"));
        assert!(!ctx.is_bundled_only(&unit));
    }

    #[test]
    fn path_args_from_config() {
        let mut config = KeelConfig::default();
        config.compiler.solc.include_paths = vec![PathBuf::from("/p/node_modules")];
        let ctx = BuildContext::new(
            Path::new("/p"),
            config,
            Path::new("/data"),
            None,
            Arc::new(CountingProvider::default()),
        );
        let args = ctx.path_args();
        assert_eq!(args.include_paths, [PathBuf::from("/p/node_modules")]);
        assert!(args.bundled.is_none());
        assert_eq!(ctx.build_dir(), PathBuf::from("/p/.keel/build"));
    }
}
