//! Source module descriptions.
//!
//! A [`SourceModule`] is what the generator knows about a library module: its
//! import path and its public members in order, each either a callable with a
//! [`Signature`] or a plain value. Descriptions come from a JSON document or
//! from Rust source (see [`SourceModule::from_rust_source`]).
//!
//! # JSON format
//!
//! ```json
//! {
//!   "module": "stats",
//!   "members": [
//!     {"name": "Normal", "parameters": [
//!       {"name": "name", "kind": "POSITIONAL_OR_KEYWORD", "annotation": "str"},
//!       {"name": "mean", "kind": "POSITIONAL_OR_KEYWORD"},
//!       {"name": "std", "kind": "POSITIONAL_OR_KEYWORD", "default": "1"}
//!     ]},
//!     {"name": "pi"}
//!   ]
//! }
//! ```
//!
//! A member without `parameters` is not callable.

use std::fs;
use std::path::Path;

use indexmap::IndexMap;
use serde::Deserialize;
use tracing::debug;

use crate::error::{GenerateError, Result};
use crate::params::{ParamKind, Parameter, Signature};

/// A library module as seen by the generator.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceModule {
    module: String,
    members: IndexMap<String, Option<Signature>>,
}

impl SourceModule {
    /// Empty description of `module` (a dotted import path).
    pub fn new(module: impl Into<String>) -> Self {
        Self {
            module: module.into(),
            members: IndexMap::new(),
        }
    }

    /// Add a callable member.
    pub fn with_callable(mut self, name: impl Into<String>, signature: Signature) -> Self {
        self.members.insert(name.into(), Some(signature));
        self
    }

    /// Add a non-callable member.
    pub fn with_value(mut self, name: impl Into<String>) -> Self {
        self.members.insert(name.into(), None);
        self
    }

    /// Dotted import path.
    pub fn module(&self) -> &str {
        &self.module
    }

    /// First segment of the import path, the name the adapter body uses.
    pub fn root(&self) -> &str {
        self.module.split('.').next().unwrap_or(&self.module)
    }

    /// Members in declaration order; `None` marks a non-callable member.
    pub fn members(&self) -> impl Iterator<Item = (&str, Option<&Signature>)> {
        self.members.iter().map(|(name, sig)| (name.as_str(), sig.as_ref()))
    }

    /// Look up a member. The outer `None` means no such member.
    pub fn get(&self, name: &str) -> Option<Option<&Signature>> {
        self.members.get(name).map(Option::as_ref)
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Parse a JSON description.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let raw: RawModule = serde_json::from_str(json)?;
        let mut module = SourceModule::new(raw.module);
        for member in raw.members {
            match member.parameters {
                Some(parameters) => {
                    let signature = parameters
                        .into_iter()
                        .map(|p| p.into_parameter(&member.name))
                        .collect::<Result<Signature>>()?;
                    module = module.with_callable(member.name, signature);
                }
                None => module = module.with_value(member.name),
            }
        }
        debug!(module = %module.module, members = module.len(), "module description parsed");
        Ok(module)
    }

    /// Read a JSON description from disk.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let json = fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&json)
    }
}

#[derive(Deserialize)]
struct RawModule {
    module: String,
    #[serde(default)]
    members: Vec<RawMember>,
}

#[derive(Deserialize)]
struct RawMember {
    name: String,
    parameters: Option<Vec<RawParameter>>,
}

#[derive(Deserialize)]
struct RawParameter {
    name: String,
    kind: String,
    annotation: Option<String>,
    default: Option<String>,
}

impl RawParameter {
    fn into_parameter(self, callable: &str) -> Result<Parameter> {
        let kind = ParamKind::from_tag(&self.kind)
            .ok_or_else(|| GenerateError::unsupported(callable, &self.name, &self.kind))?;
        Ok(Parameter {
            name: self.name,
            kind,
            annotation: self.annotation,
            default: self.default,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const STATS: &str = r#"{
        "module": "stats",
        "members": [
            {"name": "Normal", "parameters": [
                {"name": "name", "kind": "POSITIONAL_OR_KEYWORD", "annotation": "str"},
                {"name": "mean", "kind": "POSITIONAL_OR_KEYWORD"},
                {"name": "std", "kind": "positional_or_keyword", "default": "1"}
            ]},
            {"name": "pi"},
            {"name": "reset", "parameters": []}
        ]
    }"#;

    #[test]
    fn test_parse_members_in_order() {
        let module = SourceModule::from_json_str(STATS).unwrap();
        assert_eq!(module.module(), "stats");
        let names: Vec<_> = module.members().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["Normal", "pi", "reset"]);
        assert_eq!(module.get("pi"), Some(None));
        assert!(module.get("reset").unwrap().unwrap().is_empty());
        assert!(module.get("missing").is_none());

        let normal = module.get("Normal").unwrap().unwrap();
        assert_eq!(normal.len(), 3);
        assert_eq!(normal.parameters()[2].default.as_deref(), Some("1"));
        assert_eq!(normal.parameters()[0].annotation.as_deref(), Some("str"));
    }

    #[test]
    fn test_unknown_kind_is_unsupported() {
        let json = r#"{"module": "m", "members": [
            {"name": "f", "parameters": [{"name": "x", "kind": "OPTIONAL"}]}
        ]}"#;
        let err = SourceModule::from_json_str(json).unwrap_err();
        assert!(matches!(
            err,
            GenerateError::UnsupportedParameterKind { ref callable, ref parameter, ref kind }
                if callable == "f" && parameter == "x" && kind == "OPTIONAL"
        ));
    }

    #[test]
    fn test_malformed_json() {
        let err = SourceModule::from_json_str("{\"members\": []}").unwrap_err();
        assert!(matches!(err, GenerateError::Schema(_)));
    }

    #[test]
    fn test_root_of_dotted_path() {
        assert_eq!(SourceModule::new("sympy.stats").root(), "sympy");
        assert_eq!(SourceModule::new("stats").root(), "stats");
    }
}
