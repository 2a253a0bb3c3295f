//! The build pipeline.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::PathBuf;
use std::sync::Arc;

use keel_cache::{
    detect_changes, files_to_rebuild, select_units, BuildArtifact, BuildCache, BuildFingerprint,
    BuildInfo, PreviousBuild, SourceUnitInfo, UnitBuildInfo,
};
use keel_common::SemanticVersion;
use keel_diagnostics::{Diagnostic, DiagnosticSink, SuppressionTable};
use keel_driver::{build_input, command_args, narrow_output_selection, SolcRunner, SolcSettings};
use keel_graph::{merge_units, partition, CompilationUnit, GraphBuilder, ImportGraph, Overrides};
use keel_source::ParseMode;
use keel_svm::select_version;
use rayon::prelude::*;
use serde_json::Value;
use tokio::task::JoinSet;

use crate::context::BuildContext;
use crate::error::CompileError;
use crate::failure::{FailureReason, UnitFailure};
use crate::result::{BuildResult, CompiledUnit};

/// First release that accepts a per-file output selection without
/// recompiling the whole unit.
const NARROW_SELECTION_SINCE: SemanticVersion = SemanticVersion::new(0, 8, 28);

/// One build request.
#[derive(Debug, Clone, Default)]
pub struct CompileRequest {
    /// Files to compile. Everything they import is pulled in.
    pub files: Vec<PathBuf>,
    /// In-memory contents taking precedence over the filesystem. Overridden
    /// files are compiled even if `files` does not name them.
    pub overrides: Overrides,
    /// Files known to have been deleted since the last build.
    pub deleted: BTreeSet<PathBuf>,
    /// Ignore the previous build.
    pub force: bool,
    /// Overrides `[build] incremental`.
    pub incremental: Option<bool>,
}

/// Runs builds on a shared [`BuildContext`].
pub struct Compiler {
    ctx: Arc<BuildContext>,
}

struct Plan {
    unit: CompilationUnit,
    version: SemanticVersion,
    settings: SolcSettings,
}

impl Compiler {
    /// Creates a compiler over `ctx`.
    pub fn new(ctx: Arc<BuildContext>) -> Self {
        Self { ctx }
    }

    /// The build context.
    pub fn context(&self) -> &Arc<BuildContext> {
        &self.ctx
    }

    /// Runs one build.
    ///
    /// Only project-wide problems are errors. Every unit that cannot be
    /// compiled is reported in [`BuildResult::failures`] and its siblings
    /// still compile. Dropping the returned future aborts running compiler
    /// processes and skips the cache write.
    pub async fn compile(&self, request: CompileRequest) -> Result<BuildResult, CompileError> {
        let ctx = &self.ctx;
        let solc = &ctx.config().compiler.solc;
        let svm = &ctx.config().svm;

        if let Some(target) = &solc.target_version {
            if *target < svm.min_version {
                return Err(CompileError::TargetBelowMinimum {
                    target: target.clone(),
                    min: svm.min_version.clone(),
                });
            }
            if *target > svm.max_version {
                return Err(CompileError::TargetAboveMaximum {
                    target: target.clone(),
                    max: svm.max_version.clone(),
                });
            }
        }
        let incremental = request
            .incremental
            .unwrap_or_else(|| ctx.config().build.is_incremental());

        let mut seeds = request.files.clone();
        seeds.extend(request.overrides.keys().cloned());
        seeds.sort();
        seeds.dedup();
        let (graph, _) =
            GraphBuilder::new(ctx.resolver()).build(&seeds, &request.overrides, ParseMode::Lenient)?;

        let mut units = partition(&graph);
        if !incremental {
            units = merge_units(&graph, units, &svm.min_version, solc.target_version.as_ref());
        }

        let settings = SolcSettings::from_config(solc);
        let fingerprint = BuildFingerprint {
            allow_paths: solc.allow_paths.clone(),
            exclude_paths: solc.exclude_paths.clone(),
            include_paths: solc.include_paths.clone(),
            settings: serde_json::to_value(&settings).unwrap_or(Value::Null),
            target_version: solc.target_version.clone(),
            incremental,
        };
        let cache = BuildCache::new(&ctx.build_dir(), ctx.data_dir(), ctx.tool_version());
        let previous = if request.force {
            None
        } else {
            cache.load(&fingerprint)
        };

        let changes = detect_changes(&graph, previous.as_ref().map(|p| &p.info));
        let mut deleted_paths = changes.deleted_paths.clone();
        deleted_paths.extend(request.deleted.iter().cloned());
        let (mut to_compile, reused) = match &previous {
            Some(prev) => {
                let (mut to_compile, reused) =
                    select_units(units.clone(), &changes, &deleted_paths, ctx.locator(), &graph);
                // Reuse needs the unit's recorded diagnostics.
                let (reused, unknown): (Vec<_>, Vec<_>) = reused
                    .into_iter()
                    .partition(|u| prev.info.unit(&u.hash).is_some());
                to_compile.extend(unknown);
                (to_compile, reused)
            }
            None => (units.clone(), Vec::new()),
        };
        to_compile.sort_by(|a, b| a.names.iter().next().cmp(&b.names.iter().next()));

        let rebuild = files_to_rebuild(&graph, &changes.dirty());
        tracing::info!(
            new = changes.new.len(),
            modified = changes.modified.len(),
            deleted = changes.deleted.len(),
            compile = to_compile.len(),
            reuse = reused.len(),
            "planned build"
        );

        let mut failures = Vec::new();
        let plans = self
            .plan_versions(to_compile, &settings, &rebuild, &mut failures)
            .await?;
        let sink = Arc::new(DiagnosticSink::new());
        let compiled = self
            .run_units(plans, &request.overrides, &graph, &sink, &mut failures)
            .await?;
        failures.sort_by(|a, b| a.names.iter().next().cmp(&b.names.iter().next()));

        let result = self.merge(
            graph,
            units,
            compiled,
            sink.drain(),
            failures,
            &reused,
            previous.as_ref(),
            &rebuild,
        );

        if !result.compiled.is_empty()
            || !result.failures.is_empty()
            || !changes.is_empty()
            || !deleted_paths.is_empty()
            || previous.is_none()
        {
            let (info, artifact) = self.record(&result, fingerprint, previous.as_ref());
            if let Err(e) = cache.store(&info, &artifact) {
                tracing::warn!("cannot write the build cache: {e}");
            }
        }
        Ok(result)
    }

    /// Picks a release and the settings for every unit to compile.
    async fn plan_versions(
        &self,
        units: Vec<CompilationUnit>,
        settings: &SolcSettings,
        rebuild: &BTreeSet<String>,
        failures: &mut Vec<UnitFailure>,
    ) -> Result<Vec<Plan>, CompileError> {
        let ctx = &self.ctx;
        let solc = &ctx.config().compiler.solc;
        let svm = &ctx.config().svm;

        let (empty, units): (Vec<_>, Vec<_>) = units.into_iter().partition(|u| u.versions.is_empty());
        failures.extend(
            empty
                .iter()
                .map(|u| UnitFailure::new(u, FailureReason::EmptyVersionRange)),
        );
        if units.is_empty() {
            return Ok(Vec::new());
        }

        let available = ctx
            .provider()
            .available()
            .await
            .map_err(CompileError::VersionList)?;

        let mut plans = Vec::new();
        for unit in units {
            let target = if ctx.is_bundled_only(&unit) {
                None
            } else {
                solc.target_version.as_ref()
            };
            let version = match select_version(
                &unit.versions,
                &available,
                target,
                &svm.min_version,
                &svm.max_version,
            ) {
                Ok(version) => version,
                Err(e) => {
                    tracing::debug!(files = %unit.describe_files(), "{e}");
                    failures.push(UnitFailure::new(&unit, e.into()));
                    continue;
                }
            };
            tracing::info!(%version, files = %unit.describe_files(), "selected solc");

            let unit_settings = if version >= NARROW_SELECTION_SINCE {
                let modified: BTreeSet<String> = unit.names.intersection(rebuild).cloned().collect();
                if modified.is_empty() {
                    settings.clone()
                } else {
                    narrow_output_selection(settings, &modified)
                }
            } else {
                settings.clone()
            };
            plans.push(Plan {
                unit,
                version,
                settings: unit_settings,
            });
        }
        Ok(plans)
    }

    /// Installs the needed releases, then compiles every planned unit.
    async fn run_units(
        &self,
        plans: Vec<Plan>,
        overrides: &Overrides,
        graph: &ImportGraph,
        sink: &Arc<DiagnosticSink>,
        failures: &mut Vec<UnitFailure>,
    ) -> Result<Vec<CompiledUnit>, CompileError> {
        let versions: BTreeSet<SemanticVersion> = plans.iter().map(|p| p.version.clone()).collect();
        let mut installs = JoinSet::new();
        for version in versions {
            let ctx = Arc::clone(&self.ctx);
            installs.spawn(async move {
                let binary = ctx.ensure_version(&version).await;
                (version, binary)
            });
        }
        let mut binaries: HashMap<SemanticVersion, Result<PathBuf, String>> = HashMap::new();
        while let Some(joined) = installs.join_next().await {
            let (version, binary) = joined.map_err(|e| CompileError::Task {
                reason: e.to_string(),
            })?;
            if let Err(reason) = &binary {
                tracing::warn!(%version, "cannot install solc: {reason}");
            }
            binaries.insert(version, binary);
        }

        let args = self.ctx.path_args();
        let mut tasks = JoinSet::new();
        for plan in plans {
            let binary = match binaries.get(&plan.version) {
                Some(Ok(binary)) => binary.clone(),
                Some(Err(reason)) => {
                    let reason = FailureReason::Install {
                        version: plan.version.clone(),
                        reason: reason.clone(),
                    };
                    failures.push(UnitFailure::new(&plan.unit, reason));
                    continue;
                }
                None => continue,
            };
            let input = build_input(&plan.unit, &plan.version, &plan.settings, overrides, graph);
            let cmd = command_args(&plan.version, &args);
            let runner = SolcRunner::new(binary, self.ctx.project_root());
            let jobs = Arc::clone(self.ctx.jobs());
            let sink = Arc::clone(sink);
            tasks.spawn(async move {
                let Ok(_permit) = jobs.acquire_owned().await else {
                    let reason = "the job queue was closed before solc could start".to_string();
                    return (plan.unit, plan.version, Err(reason));
                };
                tracing::debug!(
                    version = %plan.version,
                    sources = input.sources.len(),
                    "running solc"
                );
                let output = runner.run(&cmd, &input).await.map_err(|e| e.to_string());
                if let Ok(output) = &output {
                    let errors = sink.report(output.errors.iter().map(Diagnostic::from));
                    tracing::debug!(version = %plan.version, errors, "solc finished");
                }
                (plan.unit, plan.version, output)
            });
        }

        let mut compiled = Vec::new();
        while let Some(joined) = tasks.join_next().await {
            let (unit, version, output) = joined.map_err(|e| CompileError::Task {
                reason: e.to_string(),
            })?;
            match output {
                Ok(output) => compiled.push(CompiledUnit {
                    unit,
                    version,
                    output,
                }),
                Err(reason) => {
                    tracing::warn!(%version, files = %unit.describe_files(), "{reason}");
                    let reason = FailureReason::Compile { version, reason };
                    failures.push(UnitFailure::new(&unit, reason));
                }
            }
        }
        compiled.sort_by(|a, b| a.unit.names.iter().next().cmp(&b.unit.names.iter().next()));
        Ok(compiled)
    }

    /// Assembles per-file diagnostics and syntax trees from what the compile
    /// tasks reported and the reused part of the previous build.
    #[allow(clippy::too_many_arguments)]
    fn merge(
        &self,
        graph: ImportGraph,
        units: Vec<CompilationUnit>,
        compiled: Vec<CompiledUnit>,
        reported: Vec<Diagnostic>,
        failures: Vec<UnitFailure>,
        reused: &[CompilationUnit],
        previous: Option<&PreviousBuild>,
        rebuild: &BTreeSet<String>,
    ) -> BuildResult {
        let mut raw: BTreeMap<PathBuf, Vec<Diagnostic>> = graph
            .nodes()
            .map(|node| (node.path.clone(), Vec::new()))
            .collect();
        let mut global_diagnostics = Vec::new();
        let mut place = |diag: Diagnostic| {
            let path = diag
                .source_unit()
                .and_then(|name| graph.get(name))
                .map(|node| node.path.clone());
            match path {
                Some(path) => raw.entry(path).or_default().push(diag),
                None => global_diagnostics.push(diag),
            }
        };

        reported.into_iter().for_each(&mut place);
        if let Some(prev) = previous {
            for unit in reused {
                if let Some(info) = prev.info.unit(&unit.hash) {
                    info.errors.iter().cloned().for_each(&mut place);
                }
            }
        }
        for failure in &failures {
            let diag = failure.diagnostic();
            for file in &failure.files {
                raw.entry(file.clone()).or_default().push(diag.clone());
            }
        }

        let diagnostics: BTreeMap<PathBuf, Vec<Diagnostic>> = {
            let sources: HashMap<&PathBuf, _> = graph.nodes().map(|n| (&n.path, n)).collect();
            raw.into_par_iter()
                .map(|(path, diags)| {
                    let mut diags = match sources.get(&path) {
                        Some(node) => SuppressionTable::new(&node.directives, &node.source)
                            .filter(diags, &node.source),
                        None => diags,
                    };
                    sort_dedup(&mut diags);
                    (path, diags)
                })
                .collect()
        };
        sort_dedup(&mut global_diagnostics);

        let mut asts = BTreeMap::new();
        if let Some(prev) = previous {
            let reused_names: BTreeSet<&String> = reused.iter().flat_map(|u| u.names.iter()).collect();
            for (name, ast) in &prev.artifact.asts {
                if !reused_names.contains(name) {
                    continue;
                }
                match serde_json::from_str::<Value>(ast) {
                    Ok(ast) => {
                        asts.insert(name.clone(), ast);
                    }
                    Err(e) => tracing::warn!("discarding stored AST of {name}: {e}"),
                }
            }
        }
        for unit in &compiled {
            for (name, source) in &unit.output.sources {
                asts.insert(name.clone(), source.ast.clone());
            }
        }

        let files_to_rebuild = rebuild
            .iter()
            .filter_map(|name| graph.get(name))
            .map(|node| node.path.clone())
            .collect();

        BuildResult {
            graph,
            units,
            compiled,
            failures,
            diagnostics,
            global_diagnostics,
            files_to_rebuild,
            reused_units: reused.len(),
            asts,
        }
    }

    /// The build record and artifact persisted for the next build.
    ///
    /// Files of failed units and of units that reported errors are left out
    /// of the source table, so the next build treats them as new.
    fn record(
        &self,
        result: &BuildResult,
        fingerprint: BuildFingerprint,
        previous: Option<&PreviousBuild>,
    ) -> (BuildInfo, BuildArtifact) {
        let mut info = BuildInfo::new(self.ctx.tool_version(), fingerprint);

        let mut errored: BTreeSet<&String> = BTreeSet::new();
        for failure in &result.failures {
            errored.extend(failure.names.iter());
        }
        for unit in &result.compiled {
            let errors: Vec<Diagnostic> = unit.output.errors.iter().map(Diagnostic::from).collect();
            if errors.iter().any(|d| d.severity.is_error()) {
                errored.extend(unit.unit.names.iter());
            }
            info.compilation_units
                .insert(unit.unit.hash.to_hex(), UnitBuildInfo { errors });
        }
        if let Some(prev) = previous {
            for unit in &result.units {
                let key = unit.hash.to_hex();
                if info.compilation_units.contains_key(&key) {
                    continue;
                }
                if let Some(stored) = prev.info.compilation_units.get(&key) {
                    info.compilation_units.insert(key, stored.clone());
                }
            }
        }

        for node in result.graph.nodes() {
            if errored.contains(&node.name) {
                continue;
            }
            info.source_units.insert(
                node.name.clone(),
                SourceUnitInfo {
                    fs_path: node.path.clone(),
                    content_hash: node.content_hash,
                },
            );
        }

        let artifact = BuildArtifact {
            source_units: result.graph.name_to_path(),
            units: result.units.iter().map(|u| u.names.clone()).collect(),
            edges: result.graph.edges(),
            asts: result
                .asts
                .iter()
                .filter_map(|(name, ast)| serde_json::to_string(ast).ok().map(|s| (name.clone(), s)))
                .collect(),
        };
        (info, artifact)
    }
}

fn sort_dedup(diags: &mut Vec<Diagnostic>) {
    let mut unique: Vec<Diagnostic> = Vec::with_capacity(diags.len());
    for diag in diags.drain(..) {
        if !unique.contains(&diag) {
            unique.push(diag);
        }
    }
    unique.sort_by(|a, b| {
        let span = |d: &Diagnostic| d.location.as_ref().map(|l| (l.start, l.end));
        span(a)
            .cmp(&span(b))
            .then_with(|| b.severity.cmp(&a.severity))
            .then_with(|| a.message.cmp(&b.message))
    });
    *diags = unique;
}

#[cfg(test)]
mod tests {
    use super::*;
    use keel_diagnostics::SourceLocation;

    #[test]
    fn sort_dedup_orders_by_span() {
        let mut diags = vec![
            Diagnostic::warning("late").with_location(SourceLocation::new("A.sol", 50, 60)),
            Diagnostic::warning("early").with_location(SourceLocation::new("A.sol", 1, 5)),
            Diagnostic::warning("late").with_location(SourceLocation::new("A.sol", 50, 60)),
            Diagnostic::error("unlocated"),
        ];
        sort_dedup(&mut diags);
        let messages: Vec<&str> = diags.iter().map(|d| d.message.as_str()).collect();
        assert_eq!(messages, vec!["unlocated", "early", "late"]);
    }

    #[test]
    fn request_defaults() {
        let request = CompileRequest::default();
        assert!(!request.force);
        assert!(request.incremental.is_none());
        assert!(request.files.is_empty());
    }
}
