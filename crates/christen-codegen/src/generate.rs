//! Artifact generation.
//!
//! Picks the candidate members of a [`SourceModule`], renders an adapter for
//! each eligible callable and writes the artifact atomically.

use std::collections::BTreeSet;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use tracing::{debug, info, instrument, trace, warn};

use crate::error::{GenerateError, Result};
use crate::params::Signature;
use crate::render::{SkipReason, WrapperCode, wrap_callable};
use crate::schema::SourceModule;

/// Generator configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    /// Module the entry point is imported from.
    pub entry_module: String,
    /// Function every adapter forwards to.
    pub entry_point: String,
    /// Name of the display-name parameter.
    pub name_param: String,
    /// Default given to the relocated name parameter.
    pub absent_marker: String,
    /// When set, every directory from here down to the destination's
    /// directory gets an empty `__init__.py`.
    pub package_root: Option<PathBuf>,
}

impl GeneratorConfig {
    /// Validate configuration values.
    pub fn validate(&self) -> Result<()> {
        for (field, value) in [
            ("entry_module", &self.entry_module),
            ("entry_point", &self.entry_point),
            ("name_param", &self.name_param),
            ("absent_marker", &self.absent_marker),
        ] {
            if value.trim().is_empty() {
                return Err(GenerateError::InvalidConfig(format!("{field} must not be empty")));
            }
        }
        Ok(())
    }
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            entry_module: "christen".to_string(),
            entry_point: "construct".to_string(),
            name_param: "name".to_string(),
            absent_marker: "None".to_string(),
            package_root: None,
        }
    }
}

/// A callable that got no adapter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Skipped {
    pub name: String,
    pub reason: SkipReason,
}

/// Rendered artifact, not yet written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub text: String,
    pub wrapped: Vec<String>,
    pub skipped: Vec<Skipped>,
}

/// Outcome of [`Generator::generate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationReport {
    pub destination: PathBuf,
    /// Adapters written, in discovery order.
    pub wrapped: Vec<String>,
    pub skipped: Vec<Skipped>,
}

/// Adapter generator.
#[derive(Debug, Clone, Default)]
pub struct Generator {
    config: GeneratorConfig,
}

impl Generator {
    /// Create a generator with a validated configuration.
    pub fn new(config: GeneratorConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// Render the artifact for `source`.
    ///
    /// `names = None` considers every member not starting with `_`; explicit
    /// names must all exist.
    pub fn render(&self, source: &SourceModule, names: Option<&[&str]>) -> Result<Artifact> {
        let mut wrappers: Vec<WrapperCode> = Vec::new();
        let mut skipped = Vec::new();

        for (name, signature) in self.candidates(source, names)? {
            let Some(signature) = signature else {
                trace!(member = name, "not callable");
                if names.is_some() {
                    skipped.push(Skipped {
                        name: name.to_string(),
                        reason: SkipReason::NotCallable,
                    });
                }
                continue;
            };

            match wrap_callable(source, name, signature, &self.config) {
                Ok(code) => wrappers.push(code),
                Err(reason) => {
                    match &reason {
                        SkipReason::Shadows { parameter } => {
                            warn!(callable = name, %parameter, "parameter shadows a name the adapter needs, skipping");
                        }
                        _ => debug!(callable = name, ?reason, "skipping"),
                    }
                    skipped.push(Skipped {
                        name: name.to_string(),
                        reason,
                    });
                }
            }
        }

        let imports: BTreeSet<&str> = wrappers
            .iter()
            .flat_map(|w| w.imports.iter().map(String::as_str))
            .collect();

        let mut text = format!(
            "from {} import {}\n",
            self.config.entry_module, self.config.entry_point
        );
        for module in imports {
            text.push_str(&format!("import {module}\n"));
        }
        text.push_str("\n\n");
        if !wrappers.is_empty() {
            let definitions: Vec<&str> = wrappers.iter().map(|w| w.definition.as_str()).collect();
            text.push_str(&definitions.join("\n\n\n"));
            text.push('\n');
        }

        Ok(Artifact {
            text,
            wrapped: wrappers.into_iter().map(|w| w.name).collect(),
            skipped,
        })
    }

    /// Render and write the artifact for `source` to `destination`.
    #[instrument(level = "debug", skip_all, fields(module = source.module(), destination = %destination.display()))]
    pub fn generate(
        &self,
        source: &SourceModule,
        destination: &Path,
        names: Option<&[&str]>,
    ) -> Result<GenerationReport> {
        let artifact = self.render(source, names)?;

        if let Some(root) = &self.config.package_root {
            ensure_packages(root, destination)?;
        }
        write_atomic(destination, &artifact.text)?;

        info!(
            wrapped = artifact.wrapped.len(),
            skipped = artifact.skipped.len(),
            "adapters written"
        );
        Ok(GenerationReport {
            destination: destination.to_path_buf(),
            wrapped: artifact.wrapped,
            skipped: artifact.skipped,
        })
    }

    fn candidates<'s>(
        &self,
        source: &'s SourceModule,
        names: Option<&[&'s str]>,
    ) -> Result<Vec<(&'s str, Option<&'s Signature>)>> {
        match names {
            None => Ok(source
                .members()
                .filter(|(name, _)| !name.starts_with('_'))
                .collect()),
            Some(names) => names
                .iter()
                .map(|&name| {
                    source
                        .get(name)
                        .map(|signature| (name, signature))
                        .ok_or_else(|| GenerateError::UnknownMember {
                            module: source.module().to_string(),
                            name: name.to_string(),
                        })
                })
                .collect(),
        }
    }
}

/// Generate adapters with the default configuration.
pub fn generate(
    source: &SourceModule,
    destination: impl AsRef<Path>,
    names: Option<&[&str]>,
) -> Result<GenerationReport> {
    Generator::default().generate(source, destination.as_ref(), names)
}

fn parent_dir(path: &Path) -> &Path {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    }
}

/// Temp file in the destination's directory, then rename over the destination.
fn write_atomic(destination: &Path, text: &str) -> Result<()> {
    let dir = parent_dir(destination);
    fs::create_dir_all(dir)?;

    let mut file = NamedTempFile::new_in(dir)?;
    file.write_all(text.as_bytes())?;
    file.flush()?;
    file.persist(destination).map_err(|e| e.error)?;

    debug!(bytes = text.len(), "artifact persisted");
    Ok(())
}

fn ensure_packages(root: &Path, destination: &Path) -> Result<()> {
    let dir = parent_dir(destination);
    let relative = dir
        .strip_prefix(root)
        .map_err(|_| GenerateError::OutsidePackage {
            destination: destination.to_path_buf(),
            root: root.to_path_buf(),
        })?;

    let mut package = root.to_path_buf();
    mark_package(&package)?;
    for component in relative.components() {
        package.push(component);
        mark_package(&package)?;
    }
    Ok(())
}

fn mark_package(dir: &Path) -> Result<()> {
    fs::create_dir_all(dir)?;
    let init = dir.join("__init__.py");
    if !init.exists() {
        fs::File::create(&init)?;
        debug!(path = %init.display(), "package marker created");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::{ParamKind, Parameter};

    fn sig(names: &[&str]) -> Signature {
        names
            .iter()
            .map(|n| Parameter::new(*n, ParamKind::PositionalOrKeyword))
            .collect()
    }

    fn stats() -> SourceModule {
        SourceModule::new("stats")
            .with_callable("Normal", sig(&["name", "mean", "std"]))
            .with_callable("helper", sig(&["x"]))
            .with_callable("_private", sig(&["name"]))
            .with_value("pi")
            .with_callable("Exponential", sig(&["name", "rate"]))
    }

    #[test]
    fn test_artifact_layout() {
        let artifact = Generator::default().render(&stats(), None).unwrap();
        assert_eq!(
            artifact.text,
            "from christen import construct\n\
             import stats\n\
             \n\
             \n\
             def Normal(mean, std, name=None):\n    return construct(stats.Normal, name, mean, std)\n\
             \n\
             \n\
             def Exponential(rate, name=None):\n    return construct(stats.Exponential, name, rate)\n"
        );
        assert_eq!(artifact.wrapped, vec!["Normal", "Exponential"]);
        assert_eq!(
            artifact.skipped,
            vec![Skipped {
                name: "helper".to_string(),
                reason: SkipReason::Ineligible
            }]
        );
    }

    #[test]
    fn test_explicit_names() {
        let artifact = Generator::default()
            .render(&stats(), Some(&["Exponential", "pi", "_private"][..]))
            .unwrap();
        assert_eq!(artifact.wrapped, vec!["Exponential", "_private"]);
        assert_eq!(artifact.skipped[0].reason, SkipReason::NotCallable);
    }

    #[test]
    fn test_unknown_name() {
        let err = Generator::default()
            .render(&stats(), Some(&["Gamma"][..]))
            .unwrap_err();
        assert!(matches!(err, GenerateError::UnknownMember { ref name, .. } if name == "Gamma"));
    }

    #[test]
    fn test_nothing_to_wrap() {
        let module = SourceModule::new("m").with_callable("helper", sig(&["x"]));
        let artifact = Generator::default().render(&module, None).unwrap();
        assert_eq!(artifact.text, "from christen import construct\n\n\n");
        assert!(artifact.wrapped.is_empty());
    }

    #[test]
    fn test_config_validation() {
        let config = GeneratorConfig {
            entry_point: " ".to_string(),
            ..GeneratorConfig::default()
        };
        assert!(matches!(
            Generator::new(config),
            Err(GenerateError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_config_from_json() {
        let config: GeneratorConfig =
            serde_json::from_str(r#"{"entry_module": "lib.naming"}"#).unwrap();
        assert_eq!(config.entry_module, "lib.naming");
        assert_eq!(config.entry_point, "construct");
    }
}
