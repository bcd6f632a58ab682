//! Library interface for the parasol command line
//!
//! [`analyze`] runs the whole semantic pipeline on a resolved compilation:
//! type checking, external usage checking, and per-shader reachability and
//! ordering, and collects the results into an [`AnalysisReport`].

pub mod config;
pub mod report;

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info};

use parasol_checker::{check_compilation, Checked, TypeCheckerError};
use parasol_core::resolved::Compilation;
use parasol_core::{FlatName, NameError};
use parasol_graph::{check_externals, referenced, topology, ExternalsError};

pub use config::{AnalysisConfig, ConfigError, OutputFormat};
pub use report::{AnalysisReport, Attribute, ShaderReport};

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error(transparent)]
    TypeChecker(#[from] TypeCheckerError),

    #[error(transparent)]
    Externals(#[from] ExternalsError),

    #[error("The compilation has no shader named {0}")]
    UnknownShader(String),

    #[error("Invalid shader name: {0}")]
    ShaderName(#[from] NameError),

    #[error("Failed to access {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl AnalysisError {
    /// The diagnostic code, for errors about the analysed program
    pub fn code(&self) -> Option<&'static str> {
        match self {
            AnalysisError::TypeChecker(error) => Some(error.code()),
            AnalysisError::Externals(error) => Some(error.code()),
            _ => None,
        }
    }
}

/// Read a resolved compilation from a JSON file
pub fn load_compilation(path: &Path) -> Result<Compilation, AnalysisError> {
    let content = fs::read_to_string(path).map_err(|source| AnalysisError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let compilation: Compilation = serde_json::from_str(&content)?;
    debug!(
        "Loaded {} modules from {}",
        compilation.modules.len(),
        path.display()
    );
    Ok(compilation)
}

/// Check a compilation and report on the configured shaders
pub fn analyze(
    compilation: &Compilation,
    config: &AnalysisConfig,
) -> Result<AnalysisReport, AnalysisError> {
    let checked = check_compilation(compilation)?;
    analyze_checked(&checked, config)
}

/// Report on the configured shaders of an already checked compilation
pub fn analyze_checked(
    checked: &Checked,
    config: &AnalysisConfig,
) -> Result<AnalysisReport, AnalysisError> {
    if config.analysis.check_externals {
        check_externals(&checked.compilation, &checked.graphs)?;
    }

    let selected = select_shaders(checked, &config.analysis.shaders)?;
    info!("Analysing {} shaders", selected.len());

    let shaders = selected
        .iter()
        .map(|name| {
            let Some(shader) = checked.compilation.shader(name) else {
                panic!("internal error: selected shader {} was not checked", name);
            };
            let reached = referenced(&checked.graphs, name);
            let order = topology(&checked.graphs, name, &reached);
            ShaderReport::new(&checked.compilation, name, shader, &order)
        })
        .collect();

    Ok(AnalysisReport {
        modules: checked
            .compilation
            .checked_order
            .iter()
            .map(ToString::to_string)
            .collect(),
        shaders,
    })
}

/// The shaders named in the configuration, or every shader when none are
fn select_shaders(checked: &Checked, names: &[String]) -> Result<Vec<FlatName>, AnalysisError> {
    if names.is_empty() {
        return Ok(checked
            .compilation
            .shaders()
            .map(|(name, _)| name)
            .collect());
    }

    names
        .iter()
        .map(|text| {
            let name = FlatName::parse(text)?;
            if checked.compilation.shader(&name).is_none() {
                return Err(AnalysisError::UnknownShader(text.clone()));
            }
            Ok(name)
        })
        .collect()
}

/// Render a report in the requested format
pub fn render_report(
    report: &AnalysisReport,
    format: OutputFormat,
) -> Result<String, AnalysisError> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(report)?),
        OutputFormat::Text => Ok(report.to_string()),
    }
}

/// Write a rendered report or graph dump to a file
pub fn write_output(path: &Path, content: &str) -> Result<(), AnalysisError> {
    fs::write(path, content).map_err(|source| AnalysisError::Io {
        path: path.to_path_buf(),
        source,
    })
}
