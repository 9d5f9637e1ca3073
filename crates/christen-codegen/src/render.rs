//! Adapter text.
//!
//! An adapter for `f(name, a, b=2, *c, d, **e)` in module `m` reads
//!
//! ```text
//! def f(a, b=2, *c, name=None, d, **e):
//!     return construct(m.f, name, a, b, *c, d=d, **e)
//! ```
//!
//! `name` moves behind the positional parameters and becomes optional, so
//! callers can leave naming to the binding the result is assigned to.

use std::collections::BTreeSet;

use crate::generate::GeneratorConfig;
use crate::params::{ParamKind, Parameter, Signature, should_wrap};
use crate::schema::SourceModule;

/// One rendered adapter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrapperCode {
    /// Adapter name, same as the wrapped callable.
    pub name: String,
    /// Modules the definition refers to.
    pub imports: BTreeSet<String>,
    /// `def` statement without a trailing newline.
    pub definition: String,
}

/// Why a callable got no adapter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// Not callable.
    NotCallable,
    /// First parameter is not a display name.
    Ineligible,
    /// A parameter would shadow a name the adapter body needs.
    Shadows { parameter: String },
}

/// Render the adapter for `callable` of `source`.
pub fn wrap_callable(
    source: &SourceModule,
    callable: &str,
    signature: &Signature,
    config: &GeneratorConfig,
) -> Result<WrapperCode, SkipReason> {
    if !should_wrap(signature, &config.name_param) {
        return Err(SkipReason::Ineligible);
    }

    let forwarded = signature.forwarded();
    let root = source.root();
    if let Some(p) = forwarded
        .iter()
        .find(|p| p.name == config.entry_point || p.name == root)
    {
        return Err(SkipReason::Shadows {
            parameter: p.name.clone(),
        });
    }

    let args = ArgsRenderer::new(forwarded);
    let name_decl = format!("{}={}", config.name_param, config.absent_marker);

    let module = source.module();
    let mut call_args = vec![format!("{module}.{callable}"), config.name_param.clone()];
    call_args.extend(args.pass_positional());
    call_args.extend(args.pass_keyword());

    let definition = format!(
        "def {callable}({}):\n    return {}({})",
        args.declared(&name_decl).join(", "),
        config.entry_point,
        call_args.join(", "),
    );

    Ok(WrapperCode {
        name: callable.to_string(),
        imports: BTreeSet::from([module.to_string()]),
        definition,
    })
}

/// Declaration and forwarding lists over the forwarded parameters.
struct ArgsRenderer<'a> {
    parameters: &'a [Parameter],
}

impl<'a> ArgsRenderer<'a> {
    fn new(parameters: &'a [Parameter]) -> Self {
        Self { parameters }
    }

    fn of_kind(&self, kind: ParamKind) -> impl Iterator<Item = &'a Parameter> {
        self.parameters.iter().filter(move |p| p.kind == kind)
    }

    fn has(&self, kind: ParamKind) -> bool {
        self.of_kind(kind).next().is_some()
    }

    /// Declared parameters with `after_positional` slotted in after the
    /// positional parameters and any `*args`.
    fn declared(&self, after_positional: &str) -> Vec<String> {
        let mut out: Vec<String> = self
            .of_kind(ParamKind::PositionalOnly)
            .map(Parameter::declaration)
            .collect();
        if !out.is_empty() {
            out.push("/".to_string());
        }
        out.extend(self.of_kind(ParamKind::PositionalOrKeyword).map(Parameter::declaration));
        out.extend(self.of_kind(ParamKind::VarPositional).map(Parameter::declaration));
        out.push(after_positional.to_string());
        if self.has(ParamKind::KeywordOnly) && !self.has(ParamKind::VarPositional) {
            out.push("*".to_string());
        }
        out.extend(self.of_kind(ParamKind::KeywordOnly).map(Parameter::declaration));
        out.extend(self.of_kind(ParamKind::VarKeyword).map(Parameter::declaration));
        out
    }

    fn pass_positional(&self) -> Vec<String> {
        let mut out: Vec<String> = self
            .of_kind(ParamKind::PositionalOnly)
            .chain(self.of_kind(ParamKind::PositionalOrKeyword))
            .map(|p| p.name.clone())
            .collect();
        out.extend(self.of_kind(ParamKind::VarPositional).map(|p| format!("*{}", p.name)));
        out
    }

    fn pass_keyword(&self) -> Vec<String> {
        let mut out: Vec<String> = self
            .of_kind(ParamKind::KeywordOnly)
            .map(|p| format!("{0}={0}", p.name))
            .collect();
        out.extend(self.of_kind(ParamKind::VarKeyword).map(|p| format!("**{}", p.name)));
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn param(name: &str, kind: ParamKind) -> Parameter {
        Parameter::new(name, kind)
    }

    fn signature(rest: impl IntoIterator<Item = Parameter>) -> Signature {
        std::iter::once(param("name", ParamKind::PositionalOrKeyword))
            .chain(rest)
            .collect()
    }

    fn render(rest: impl IntoIterator<Item = Parameter>) -> String {
        wrap_callable(&SourceModule::new("m"), "f", &signature(rest), &GeneratorConfig::default())
            .unwrap()
            .definition
    }

    #[test]
    fn test_every_kind() {
        let code = render([
            param("a", ParamKind::PositionalOrKeyword),
            param("b", ParamKind::PositionalOrKeyword).with_default("2"),
            param("c", ParamKind::VarPositional),
            param("d", ParamKind::KeywordOnly),
            param("e", ParamKind::VarKeyword),
        ]);
        assert_eq!(
            code,
            "def f(a, b=2, *c, name=None, d, **e):\n    return construct(m.f, name, a, b, *c, d=d, **e)"
        );
    }

    #[test]
    fn test_positional_only_gets_slash() {
        let code = render([
            param("x", ParamKind::PositionalOnly),
            param("y", ParamKind::PositionalOrKeyword),
        ]);
        assert_eq!(
            code,
            "def f(x, /, y, name=None):\n    return construct(m.f, name, x, y)"
        );
    }

    #[test]
    fn test_bare_star_only_without_varargs() {
        let code = render([param("k", ParamKind::KeywordOnly).with_annotation("int")]);
        assert_eq!(
            code,
            "def f(name=None, *, k: int):\n    return construct(m.f, name, k=k)"
        );
    }

    #[test]
    fn test_varargs_alone_is_splatted() {
        let code = render([param("items", ParamKind::VarPositional)]);
        assert_eq!(
            code,
            "def f(*items, name=None):\n    return construct(m.f, name, *items)"
        );
    }

    #[test]
    fn test_name_only() {
        assert_eq!(render([]), "def f(name=None):\n    return construct(m.f, name)");
    }

    #[test]
    fn test_ineligible() {
        let sig: Signature = [param("x", ParamKind::PositionalOrKeyword)].into_iter().collect();
        let result = wrap_callable(&SourceModule::new("m"), "helper", &sig, &GeneratorConfig::default());
        assert_eq!(result, Err(SkipReason::Ineligible));
    }

    #[test]
    fn test_shadowing_parameters() {
        let config = GeneratorConfig::default();
        let source = SourceModule::new("sympy.stats");
        for shadow in ["construct", "sympy"] {
            let sig = signature([param(shadow, ParamKind::PositionalOrKeyword)]);
            let result = wrap_callable(&source, "f", &sig, &config);
            assert_eq!(
                result,
                Err(SkipReason::Shadows {
                    parameter: shadow.to_string()
                })
            );
        }
    }

    #[test]
    fn test_only_the_root_package_is_shadowed() {
        let source = SourceModule::new("sympy.stats");
        let sig = signature([param("stats", ParamKind::PositionalOrKeyword)]);
        let code = wrap_callable(&source, "f", &sig, &GeneratorConfig::default()).unwrap();
        assert_eq!(
            code.definition,
            "def f(stats, name=None):\n    return construct(sympy.stats.f, name, stats)"
        );
        assert!(code.imports.contains("sympy.stats"));
    }

    #[test]
    fn test_custom_entry_point() {
        let config = GeneratorConfig {
            entry_point: "defer".to_string(),
            name_param: "label".to_string(),
            ..GeneratorConfig::default()
        };
        let sig: Signature = [
            param("label", ParamKind::PositionalOrKeyword),
            param("x", ParamKind::PositionalOrKeyword),
        ]
        .into_iter()
        .collect();
        let code = wrap_callable(&SourceModule::new("lib"), "g", &sig, &config).unwrap();
        assert_eq!(
            code.definition,
            "def g(x, label=None):\n    return defer(lib.g, label, x)"
        );
        assert!(code.imports.contains("lib"));
    }
}
