//! `keel compile`: build the project's contracts.
//!
//! 1. Find project root (walk up looking for `keel.toml`)
//! 2. Load config via `keel_config`
//! 3. Discover `.sol` files, or take the given paths
//! 4. Run one build through `keel_compiler`
//! 5. Render diagnostics

use std::sync::Arc;
use std::time::Instant;

use keel_compiler::{BuildContext, BuildResult, CompileRequest, Compiler};
use keel_diagnostics::{Diagnostic, DiagnosticRenderer, JsonRenderer, Severity, TerminalRenderer};

use crate::pipeline::{
    bundled_path, expand_paths, load_project_config, resolve_project_root, version_manager,
};
use crate::{CompileArgs, GlobalArgs, ReportFormat};

/// Runs the `keel compile` command.
///
/// Returns exit code 0 if the build has no errors, 1 otherwise.
pub async fn run(args: &CompileArgs, global: &GlobalArgs) -> Result<i32, Box<dyn std::error::Error>> {
    let project_dir = resolve_project_root(global)?;
    let config = load_project_config(&project_dir, global)?;

    let files = expand_paths(
        &project_dir,
        &args.paths,
        &config.compiler.solc.exclude_paths,
    )?;
    tracing::debug!(root = %project_dir.display(), files = files.len(), "discovered sources");
    if files.is_empty() {
        if !global.quiet {
            eprintln!(
                "warning: no Solidity files found in {}",
                project_dir.display()
            );
        }
        return Ok(0);
    }

    let data_dir = keel_config::data_dir()?;
    let manager = version_manager(&data_dir)?;
    let ctx = BuildContext::new(
        &project_dir,
        config,
        &data_dir,
        bundled_path(&data_dir),
        manager,
    );
    let compiler = Compiler::new(Arc::new(ctx));

    if !global.quiet && args.format == ReportFormat::Text {
        eprintln!("   Compiling {} files", files.len());
    }
    let start = Instant::now();
    let result = compiler
        .compile(CompileRequest {
            files,
            force: args.force,
            incremental: args.incremental(),
            ..CompileRequest::default()
        })
        .await?;

    let diagnostics = visible_diagnostics(&result, args.no_warnings);
    match args.format {
        ReportFormat::Text => {
            let renderer = TerminalRenderer::new(global.color);
            for diag in &diagnostics {
                eprintln!("{}", renderer.render(diag, &result.graph));
            }
        }
        ReportFormat::Json => {
            for diag in &diagnostics {
                println!("{}", JsonRenderer.render(diag, &result.graph));
            }
        }
    }

    let error_count = diagnostics.iter().filter(|d| d.severity.is_error()).count();
    let warning_count = diagnostics
        .iter()
        .filter(|d| d.severity == Severity::Warning)
        .count();

    if !global.quiet && args.format == ReportFormat::Text {
        eprintln!(
            "   Compiled {} unit(s), reused {}, failed {} in {:.2}s",
            result.compiled.len(),
            result.reused_units,
            result.failures.len(),
            start.elapsed().as_secs_f64()
        );
        eprintln!(
            "   Result: {} error(s), {} warning(s)",
            error_count, warning_count
        );
    }

    if result.has_errors() {
        Ok(1)
    } else {
        Ok(0)
    }
}

/// Every diagnostic of the build in file order, optionally errors only.
fn visible_diagnostics(result: &BuildResult, errors_only: bool) -> Vec<Diagnostic> {
    result
        .global_diagnostics
        .iter()
        .chain(result.diagnostics.values().flatten())
        .filter(|d| !errors_only || d.severity.is_error())
        .cloned()
        .collect()
}
