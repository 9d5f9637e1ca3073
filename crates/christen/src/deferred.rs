//! Deferred constructions and the wrapper factory.
//!
//! A [`Constructor`] is a library function whose first parameter is a display
//! name. Wrapping it in a [`Wrapper`] turns every call into a
//! [`DeferredConstruction`] node; the real call happens during resolution,
//! once the node's name is known.
//!
//! [`construct`] is the entry point generated adapters forward to.

use std::borrow::Cow;
use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;
use tracing::trace;

use crate::domain::Domain;
use crate::expr::{Expr, NodeKind};
use crate::term::{Resolved, Term};

/// Closure type behind a [`Constructor`]: `(name, positional, keyword)`.
pub type ConstructorImpl<D> = dyn Fn(
    &str,
    Vec<Resolved<<D as Domain>::Value>>,
    IndexMap<String, Resolved<<D as Domain>::Value>>,
) -> Result<<D as Domain>::Value, <D as Domain>::Error>;

/// Reference to a named constructor of the underlying library.
pub struct Constructor<D: Domain> {
    path: Cow<'static, str>,
    func: Rc<ConstructorImpl<D>>,
}

impl<D: Domain> Constructor<D> {
    /// Create a constructor reference.
    ///
    /// `path` is the qualified name of the library function, used in errors
    /// and logs (e.g. `"stats.Normal"`).
    pub fn new<F>(path: impl Into<Cow<'static, str>>, func: F) -> Self
    where
        F: Fn(
                &str,
                Vec<Resolved<D::Value>>,
                IndexMap<String, Resolved<D::Value>>,
            ) -> Result<D::Value, D::Error>
            + 'static,
    {
        Self {
            path: path.into(),
            func: Rc::new(func),
        }
    }

    /// Qualified name of the library function.
    pub fn path(&self) -> &str {
        &self.path
    }

    pub(crate) fn invoke(
        &self,
        name: &str,
        positional: Vec<Resolved<D::Value>>,
        keyword: IndexMap<String, Resolved<D::Value>>,
    ) -> Result<D::Value, D::Error> {
        (self.func)(name, positional, keyword)
    }
}

impl<D: Domain> Clone for Constructor<D> {
    fn clone(&self) -> Self {
        Self {
            path: self.path.clone(),
            func: Rc::clone(&self.func),
        }
    }
}

impl<D: Domain> fmt::Debug for Constructor<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Constructor").field(&self.path).finish()
    }
}

/// Positional and keyword arguments for a deferred call.
pub struct Arguments<D: Domain> {
    positional: Vec<Term<D>>,
    keyword: IndexMap<String, Term<D>>,
}

impl<D: Domain> Arguments<D> {
    /// No arguments.
    pub fn new() -> Self {
        Self {
            positional: Vec::new(),
            keyword: IndexMap::new(),
        }
    }

    /// Append a positional argument.
    pub fn arg(mut self, value: impl Into<Term<D>>) -> Self {
        self.positional.push(value.into());
        self
    }

    /// Append every item as a positional argument.
    pub fn args<I>(mut self, values: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Term<D>>,
    {
        self.positional.extend(values.into_iter().map(Into::into));
        self
    }

    /// Set a keyword argument. Setting the same keyword twice keeps the last
    /// value at the first position.
    pub fn kwarg(mut self, key: impl Into<String>, value: impl Into<Term<D>>) -> Self {
        let key = key.into();
        if self.keyword.insert(key.clone(), value.into()).is_some() {
            trace!(%key, "keyword argument overridden");
        }
        self
    }

    /// Set every entry as a keyword argument.
    pub fn kwargs<K, T, I>(mut self, entries: I) -> Self
    where
        K: Into<String>,
        T: Into<Term<D>>,
        I: IntoIterator<Item = (K, T)>,
    {
        for (key, value) in entries {
            self = self.kwarg(key, value);
        }
        self
    }

    /// Positional arguments.
    pub fn positional(&self) -> &[Term<D>] {
        &self.positional
    }

    /// Keyword arguments.
    pub fn keyword(&self) -> &IndexMap<String, Term<D>> {
        &self.keyword
    }
}

impl<D: Domain> Default for Arguments<D> {
    fn default() -> Self {
        Self::new()
    }
}

impl<D: Domain> Clone for Arguments<D> {
    fn clone(&self) -> Self {
        Self {
            positional: self.positional.clone(),
            keyword: self.keyword.clone(),
        }
    }
}

impl<D: Domain> fmt::Debug for Arguments<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Arguments")
            .field("positional", &self.positional)
            .field("keyword", &self.keyword)
            .finish()
    }
}

/// A pending constructor call waiting for its name.
pub struct DeferredConstruction<D: Domain> {
    pub(crate) constructor: Constructor<D>,
    pub(crate) arguments: Arguments<D>,
}

impl<D: Domain> DeferredConstruction<D> {
    /// The wrapped constructor.
    pub fn constructor(&self) -> &Constructor<D> {
        &self.constructor
    }

    /// The captured arguments.
    pub fn arguments(&self) -> &Arguments<D> {
        &self.arguments
    }
}

impl<D: Domain> fmt::Debug for DeferredConstruction<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeferredConstruction")
            .field("constructor", &self.constructor.path)
            .field("positional", &self.arguments.positional)
            .field("keyword", &self.arguments.keyword)
            .finish()
    }
}

/// Turns calls to a named constructor into deferred nodes.
///
/// # Examples
///
/// ```
/// use christen::symbolic::{Sym, Symbolic};
/// use christen::{Arguments, Constructor, Wrapper};
///
/// let normal = Wrapper::new(Constructor::<Symbolic>::new("stats.Normal", |name, _, _| {
///     Ok(Sym::symbol(name))
/// }));
/// let x = normal.call(Arguments::new().arg(0.0).arg(1.0));
/// assert!(x.name().is_none());
/// ```
pub struct Wrapper<D: Domain> {
    constructor: Constructor<D>,
}

impl<D: Domain> Wrapper<D> {
    /// Wrap a constructor.
    pub fn new(constructor: Constructor<D>) -> Self {
        Self { constructor }
    }

    /// The wrapped constructor.
    pub fn constructor(&self) -> &Constructor<D> {
        &self.constructor
    }

    /// Defer a call. Arity is not checked here; the constructor checks its own
    /// arguments when the node is resolved.
    pub fn call(&self, arguments: Arguments<D>) -> Expr<D> {
        construct(&self.constructor, None, arguments)
    }
}

impl<D: Domain> Clone for Wrapper<D> {
    fn clone(&self) -> Self {
        Self {
            constructor: self.constructor.clone(),
        }
    }
}

impl<D: Domain> fmt::Debug for Wrapper<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Wrapper").field(&self.constructor.path).finish()
    }
}

/// Build a deferred construction node.
///
/// `name = None` leaves the node to be named from the resolving scope;
/// `Some(name)` tags it explicitly. `Some("")` counts as `None`.
pub fn construct<D: Domain>(
    constructor: &Constructor<D>,
    name: Option<&str>,
    arguments: Arguments<D>,
) -> Expr<D> {
    let expr = Expr::from_kind(NodeKind::Deferred(DeferredConstruction {
        constructor: constructor.clone(),
        arguments,
    }));
    match name {
        Some(name) if !name.is_empty() => expr.named(name),
        _ => expr,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbolic::{Sym, Symbolic};

    fn recording() -> Constructor<Symbolic> {
        Constructor::new("test.Record", |name, _, _| Ok(Sym::symbol(name)))
    }

    #[test]
    fn test_wrapper_captures_arguments_without_validation() {
        let wrapper = Wrapper::new(recording());
        let x = wrapper.call(
            Arguments::new()
                .arg(1.0)
                .arg(2.0)
                .arg(3.0)
                .kwarg("scale", 4.0),
        );
        let NodeKind::Deferred(deferred) = x.kind() else {
            panic!("expected deferred construction");
        };
        assert_eq!(deferred.constructor().path(), "test.Record");
        assert_eq!(deferred.arguments().positional().len(), 3);
        assert!(deferred.arguments().keyword().contains_key("scale"));
        assert!(x.name().is_none());
    }

    #[test]
    fn test_construct_with_name_tags_node() {
        let x = construct(&recording(), Some("x"), Arguments::new());
        assert_eq!(x.name(), Some("x"));
    }

    #[test]
    fn test_construct_with_empty_name_leaves_node_untagged() {
        let x = construct(&recording(), Some(""), Arguments::new());
        assert!(x.name().is_none());
    }

    #[test]
    fn test_kwarg_override_keeps_single_key() {
        let args = Arguments::<Symbolic>::new()
            .kwarg("a", 1.0)
            .kwarg("b", 2.0)
            .kwarg("a", 3.0);
        let keys: Vec<_> = args.keyword().keys().cloned().collect();
        assert_eq!(keys, vec!["a", "b"]);
        assert!(matches!(
            args.keyword()["a"],
            Term::Value(Sym::Number(v)) if v == 3.0
        ));
    }

    #[test]
    fn test_each_call_is_a_distinct_node() {
        let wrapper = Wrapper::new(recording());
        let a = wrapper.call(Arguments::new());
        let b = wrapper.call(Arguments::new());
        assert!(!a.ptr_eq(&b));
    }
}
