//! Parameter descriptors and the eligibility rule.

use std::fmt;

use serde::{Deserialize, Serialize};

/// How a parameter binds at a call site.
///
/// Variants are declared in the order parameters must appear.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParamKind {
    PositionalOnly,
    PositionalOrKeyword,
    VarPositional,
    KeywordOnly,
    VarKeyword,
}

impl ParamKind {
    /// Parse a kind tag, accepting both `POSITIONAL_ONLY` and
    /// `positional_only` spellings.
    pub fn from_tag(tag: &str) -> Option<Self> {
        let kind = match tag.to_ascii_lowercase().as_str() {
            "positional_only" => ParamKind::PositionalOnly,
            "positional_or_keyword" => ParamKind::PositionalOrKeyword,
            "var_positional" => ParamKind::VarPositional,
            "keyword_only" => ParamKind::KeywordOnly,
            "var_keyword" => ParamKind::VarKeyword,
            _ => return None,
        };
        Some(kind)
    }

    /// Canonical tag.
    pub fn tag(self) -> &'static str {
        match self {
            ParamKind::PositionalOnly => "positional_only",
            ParamKind::PositionalOrKeyword => "positional_or_keyword",
            ParamKind::VarPositional => "var_positional",
            ParamKind::KeywordOnly => "keyword_only",
            ParamKind::VarKeyword => "var_keyword",
        }
    }

    /// `*args` or `**kwargs`.
    pub fn is_variadic(self) -> bool {
        matches!(self, ParamKind::VarPositional | ParamKind::VarKeyword)
    }
}

impl fmt::Display for ParamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// One parameter of a callable.
///
/// `annotation` and `default` are host-language source text, emitted as is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,
    pub kind: ParamKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub annotation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
}

impl Parameter {
    pub fn new(name: impl Into<String>, kind: ParamKind) -> Self {
        Self {
            name: name.into(),
            kind,
            annotation: None,
            default: None,
        }
    }

    pub fn with_annotation(mut self, annotation: impl Into<String>) -> Self {
        self.annotation = Some(annotation.into());
        self
    }

    pub fn with_default(mut self, default: impl Into<String>) -> Self {
        self.default = Some(default.into());
        self
    }

    /// Declaration text, e.g. `b=2`, `*c`, `x: float = 0.0`.
    pub fn declaration(&self) -> String {
        let prefix = match self.kind {
            ParamKind::VarPositional => "*",
            ParamKind::VarKeyword => "**",
            _ => "",
        };
        let mut out = format!("{prefix}{}", self.name);
        match (&self.annotation, &self.default) {
            (Some(annotation), Some(default)) => {
                out.push_str(&format!(": {annotation} = {default}"));
            }
            (Some(annotation), None) => out.push_str(&format!(": {annotation}")),
            (None, Some(default)) => out.push_str(&format!("={default}")),
            (None, None) => {}
        }
        out
    }
}

/// Ordered parameters of a callable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Signature {
    parameters: Vec<Parameter>,
}

impl Signature {
    pub fn new(parameters: Vec<Parameter>) -> Self {
        Self { parameters }
    }

    pub fn parameters(&self) -> &[Parameter] {
        &self.parameters
    }

    /// Parameters after the first, i.e. everything the adapter forwards.
    pub fn forwarded(&self) -> &[Parameter] {
        self.parameters.get(1..).unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.parameters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parameters.is_empty()
    }
}

impl FromIterator<Parameter> for Signature {
    fn from_iter<I: IntoIterator<Item = Parameter>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

/// Annotations accepted on the name parameter.
const TEXT_ANNOTATIONS: &[&str] = &["str", "builtins.str", "typing.Text", "Text"];

/// Check whether a callable takes a display name first.
///
/// The first parameter must be called `name_param`, must not be variadic, and
/// must be unannotated or annotated as text.
pub fn should_wrap(signature: &Signature, name_param: &str) -> bool {
    let Some(first) = signature.parameters().first() else {
        return false;
    };
    first.name == name_param
        && !first.kind.is_variadic()
        && first
            .annotation
            .as_deref()
            .is_none_or(|annotation| TEXT_ANNOTATIONS.contains(&annotation))
}
