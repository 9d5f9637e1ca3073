//! Module descriptions from Rust source.
//!
//! Public free functions become callables. Rust parameters bind by position
//! only in Rust, but the adapters are called from the host language, so every
//! parameter is described as positional-or-keyword; a trailing run of
//! `Option<_>` parameters defaults to the configured absent marker. Public
//! consts and statics become non-callable members. Everything else is ignored.
//!
//! Receivers, destructuring patterns and C variadics have no host spelling.
//! They only fail the description of a function that would be wrapped; any
//! other function is described as written and skipped later as ineligible.

use std::fs;
use std::path::Path;

use quote::ToTokens;
use syn::ext::IdentExt;
use syn::{FnArg, Item, Pat, Type, Visibility};
use tracing::{debug, trace};

use crate::error::{GenerateError, Result};
use crate::generate::GeneratorConfig;
use crate::params::{ParamKind, Parameter, Signature, should_wrap};
use crate::schema::SourceModule;

impl SourceModule {
    /// Describe a Rust module from its source text.
    ///
    /// `module` is the import path the adapters will use. The name parameter
    /// and the default of trailing `Option<_>` parameters come from `config`.
    pub fn from_rust_source(module: &str, source: &str, config: &GeneratorConfig) -> Result<Self> {
        let file = syn::parse_file(source)?;
        let mut described = SourceModule::new(module);

        for item in &file.items {
            match item {
                Item::Fn(func) if is_public(&func.vis) => {
                    let name = func.sig.ident.unraw().to_string();
                    let signature = describe_signature(&name, &func.sig, config)?;
                    trace!(callable = %name, parameters = signature.len(), "function described");
                    described = described.with_callable(name, signature);
                }
                Item::Const(item) if is_public(&item.vis) => {
                    described = described.with_value(item.ident.unraw().to_string());
                }
                Item::Static(item) if is_public(&item.vis) => {
                    described = described.with_value(item.ident.unraw().to_string());
                }
                _ => {}
            }
        }

        debug!(module, members = described.len(), "rust source described");
        Ok(described)
    }

    /// Describe a Rust module from a source file.
    pub fn from_rust_file(
        module: &str,
        path: impl AsRef<Path>,
        config: &GeneratorConfig,
    ) -> Result<Self> {
        let source = fs::read_to_string(path.as_ref())?;
        Self::from_rust_source(module, &source, config)
    }
}

fn is_public(vis: &Visibility) -> bool {
    matches!(vis, Visibility::Public(_))
}

/// First parameter without a host spelling: `(parameter text, kind)`.
type Unsupported = (String, &'static str);

fn describe_signature(
    callable: &str,
    sig: &syn::Signature,
    config: &GeneratorConfig,
) -> Result<Signature> {
    let mut unsupported: Option<Unsupported> = sig.variadic.as_ref().map(|variadic| {
        let parameter = variadic
            .pat
            .as_ref()
            .map(|(pat, _)| pat.to_token_stream().to_string())
            .unwrap_or_else(|| "...".to_string());
        (parameter, "c_variadic")
    });

    let mut parameters = Vec::with_capacity(sig.inputs.len());
    for input in &sig.inputs {
        let (parameter, optional) = match input {
            FnArg::Receiver(receiver) => {
                let text = receiver.to_token_stream().to_string();
                unsupported.get_or_insert_with(|| (text.clone(), "receiver"));
                (Parameter::new(text, ParamKind::PositionalOrKeyword), false)
            }
            FnArg::Typed(typed) => match typed.pat.as_ref() {
                Pat::Ident(ident) => {
                    let mut parameter = Parameter::new(
                        ident.ident.unraw().to_string(),
                        ParamKind::PositionalOrKeyword,
                    );
                    parameter.annotation = annotation(&typed.ty);
                    (parameter, option_inner(&typed.ty).is_some())
                }
                pat => {
                    let text = pat.to_token_stream().to_string();
                    unsupported.get_or_insert_with(|| (text.clone(), "pattern"));
                    (Parameter::new(text, ParamKind::PositionalOrKeyword), false)
                }
            },
        };
        parameters.push((parameter, optional));
    }

    // Only a trailing run of optional parameters can take a default.
    for (parameter, optional) in parameters.iter_mut().rev() {
        if !*optional {
            break;
        }
        parameter.default = Some(config.absent_marker.clone());
    }

    let signature: Signature = parameters.into_iter().map(|(parameter, _)| parameter).collect();
    match unsupported {
        Some((parameter, kind)) if should_wrap(&signature, &config.name_param) => {
            Err(GenerateError::unsupported(callable, parameter, kind))
        }
        Some((parameter, kind)) => {
            trace!(callable, %parameter, kind, "unsupported parameter on a callable that is not wrapped");
            Ok(signature)
        }
        None => Ok(signature),
    }
}

/// `T` of an `Option<T>`.
fn option_inner(ty: &Type) -> Option<&Type> {
    let Type::Path(path) = ty else {
        return None;
    };
    let segment = path.path.segments.last()?;
    if segment.ident != "Option" {
        return None;
    }
    let syn::PathArguments::AngleBracketed(args) = &segment.arguments else {
        return None;
    };
    match args.args.first()? {
        syn::GenericArgument::Type(inner) => Some(inner),
        _ => None,
    }
}

/// Host annotation for simple Rust types.
fn annotation(ty: &Type) -> Option<String> {
    match ty {
        Type::Reference(reference) => annotation(&reference.elem),
        Type::Paren(paren) => annotation(&paren.elem),
        Type::Path(path) => {
            if let Some(inner) = option_inner(ty) {
                return annotation(inner).map(|inner| format!("{inner} | None"));
            }
            let ident = path.path.segments.last()?.ident.to_string();
            let mapped = match ident.as_str() {
                "str" | "String" => "str",
                "f32" | "f64" => "float",
                "i8" | "i16" | "i32" | "i64" | "i128" | "isize" | "u8" | "u16" | "u32" | "u64"
                | "u128" | "usize" => "int",
                "bool" => "bool",
                _ => return None,
            };
            Some(mapped.to_string())
        }
        _ => None,
    }
}
