//! Function registry.
//!
//! Templates call registered transforms by name: `${upper(name)}`. A call
//! resolves only when exactly one definition matches both name and arity.

use std::borrow::Cow;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use rustc_hash::{FxHashMap, FxHasher};
use thiserror::Error;

use crate::{Resolved, Ty, Value};

/// Implementation of a registered function.
///
/// Receives one value per declared parameter; absent arguments arrive as
/// [`Value::Null`].
pub type NativeFn = Arc<dyn for<'a> Fn(&[Value<'a>]) -> Value<'a> + Send + Sync>;

pub struct FunctionDef {
    pub name: String,
    pub arity: usize,
    /// Result type. Mark it nullable when the function can return null.
    pub returns: Resolved,
    body: NativeFn,
}

impl FunctionDef {
    pub fn body(&self) -> &NativeFn {
        &self.body
    }

    pub fn call<'a>(&self, args: &[Value<'a>]) -> Value<'a> {
        (self.body)(args)
    }
}

impl fmt::Debug for FunctionDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{} -> {}", self.name, self.arity, self.returns)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum FunctionError {
    #[error("function `{name}` with {arity} argument(s) is already registered")]
    Duplicate { name: String, arity: usize },
}

/// Supplies functions at start-up.
pub trait FunctionProvider {
    fn provide(&self, registry: &mut FunctionRegistry) -> Result<(), FunctionError>;
}

/// Functions keyed by `(name, arity)`.
#[derive(Debug, Default)]
pub struct FunctionRegistry {
    defs: FxHashMap<(String, usize), Arc<FunctionDef>>,
}

impl FunctionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry filled by each provider in order.
    pub fn from_providers(providers: &[&dyn FunctionProvider]) -> Result<Self, FunctionError> {
        let mut registry = Self::new();
        for provider in providers {
            provider.provide(&mut registry)?;
        }
        Ok(registry)
    }

    pub fn register<F>(
        &mut self,
        name: &str,
        arity: usize,
        returns: Resolved,
        f: F,
    ) -> Result<&mut Self, FunctionError>
    where
        F: for<'a> Fn(&[Value<'a>]) -> Value<'a> + Send + Sync + 'static,
    {
        let key = (name.to_owned(), arity);
        if self.defs.contains_key(&key) {
            return Err(FunctionError::Duplicate { name: key.0, arity });
        }
        let def = FunctionDef { name: name.to_owned(), arity, returns, body: Arc::new(f) };
        self.defs.insert(key, Arc::new(def));
        Ok(self)
    }

    pub fn lookup(&self, name: &str, arity: usize) -> Option<&Arc<FunctionDef>> {
        self.defs.get(&(name.to_owned(), arity))
    }

    /// Registered arities for `name`, ascending. Used for diagnostics.
    pub fn arities(&self, name: &str) -> Vec<usize> {
        let mut out: Vec<usize> =
            self.defs.keys().filter(|(n, _)| n == name).map(|&(_, a)| a).collect();
        out.sort_unstable();
        out
    }

    pub fn len(&self) -> usize {
        self.defs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.defs.is_empty()
    }

    /// Hash of every registered signature.
    pub fn fingerprint(&self) -> u64 {
        let mut sigs: Vec<_> = self.defs.values().map(|d| (&d.name, d.arity, &d.returns)).collect();
        sigs.sort_by(|a, b| a.0.cmp(b.0).then(a.1.cmp(&b.1)));
        let mut hasher = FxHasher::default();
        sigs.hash(&mut hasher);
        hasher.finish()
    }
}

/// Built-in string helpers.
///
/// | function | result |
/// |---|---|
/// | `upper(x)` / `lower(x)` | case-mapped text of `x` |
/// | `trim(x)` | text of `x` without surrounding whitespace |
/// | `len(x)` | characters of a string, elements of a list, bytes of a payload |
/// | `concat(a, b)` | text of `a` followed by text of `b`; null counts as empty |
/// | `coalesce(a, b)` | `a` unless null, else `b` |
///
/// Every function returns null when its input is null.
#[derive(Copy, Clone, Debug, Default)]
pub struct StdFunctions;

impl FunctionProvider for StdFunctions {
    fn provide(&self, registry: &mut FunctionRegistry) -> Result<(), FunctionError> {
        let text = || Resolved::new(Ty::Str).nullable();

        registry
            .register("upper", 1, text(), |args| map_text(&args[0], str::to_uppercase))?
            .register("lower", 1, text(), |args| map_text(&args[0], str::to_lowercase))?
            .register("trim", 1, text(), |args| trim(&args[0]))?
            .register("len", 1, Resolved::new(Ty::Int).nullable(), |args| len(&args[0]))?
            .register("concat", 2, text(), |args| {
                if args.iter().all(Value::is_null) {
                    return Value::Null;
                }
                let mut out = String::new();
                for arg in args {
                    if let Some(t) = arg.to_text() {
                        out.push_str(&t);
                    }
                }
                Value::Str(Cow::Owned(out))
            })?
            .register("coalesce", 2, Resolved::unknown(), |args| {
                args.iter().find(|v| !v.is_null()).cloned().unwrap_or(Value::Null)
            })?;
        Ok(())
    }
}

fn map_text<'a>(v: &Value<'a>, f: impl Fn(&str) -> String) -> Value<'a> {
    match v.to_text() {
        Some(t) => Value::Str(Cow::Owned(f(&t))),
        None => Value::Null,
    }
}

fn trim<'a>(v: &Value<'a>) -> Value<'a> {
    match v {
        Value::Str(Cow::Borrowed(s)) => Value::Str(Cow::Borrowed(s.trim())),
        other => match other.to_text() {
            Some(t) => Value::Str(Cow::Owned(t.trim().to_owned())),
            None => Value::Null,
        },
    }
}

fn len<'a>(v: &Value<'a>) -> Value<'a> {
    let n = match v {
        Value::Str(s) | Value::Enum(s) => s.chars().count(),
        Value::List(items) => items.len(),
        Value::Bytes(b) => b.len(),
        Value::Map(m) => m.len(),
        Value::Null => return Value::Null,
        other => other.to_text().map_or(0, |t| t.chars().count()),
    };
    Value::Int(i32::try_from(n).unwrap_or(i32::MAX))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn std_registry() -> FunctionRegistry {
        FunctionRegistry::from_providers(&[&StdFunctions]).unwrap_or_default()
    }

    #[test]
    fn test_lookup_requires_matching_arity() {
        let reg = std_registry();
        assert!(reg.lookup("upper", 1).is_some());
        assert!(reg.lookup("upper", 2).is_none());
        assert_eq!(reg.arities("concat"), vec![2]);
        assert_eq!(reg.arities("nope"), Vec::<usize>::new());
    }

    #[test]
    fn test_duplicate_registration() {
        let mut reg = std_registry();
        let err = reg.register("trim", 1, Resolved::new(Ty::Str), |_| Value::Null).err();
        assert_eq!(err, Some(FunctionError::Duplicate { name: "trim".into(), arity: 1 }));
        assert!(reg.register("trim", 2, Resolved::new(Ty::Str), |_| Value::Null).is_ok());
    }

    #[test]
    fn test_std_functions() {
        let reg = std_registry();
        let call = |name: &str, args: &[Value<'static>]| {
            reg.lookup(name, args.len()).map(|f| f.call(args)).unwrap_or(Value::Null)
        };
        let s = |v: &'static str| Value::Str(Cow::Borrowed(v));

        assert_eq!(call("upper", &[s("abc")]), s("ABC"));
        assert_eq!(call("lower", &[Value::Enum(Cow::Borrowed("RED"))]), s("red"));
        assert_eq!(call("trim", &[s("  x ")]), s("x"));
        assert_eq!(call("len", &[s("héllo")]), Value::Int(5));
        assert_eq!(call("len", &[Value::Null]), Value::Null);
        assert_eq!(call("concat", &[s("a"), Value::Int(1)]), s("a1"));
        assert_eq!(call("concat", &[Value::Null, s("b")]), s("b"));
        assert_eq!(call("coalesce", &[Value::Null, s("b")]), s("b"));
        assert_eq!(call("upper", &[Value::Null]), Value::Null);
    }

    #[test]
    fn test_fingerprint_is_order_independent() {
        let mut a = FunctionRegistry::new();
        let _ = a.register("x", 1, Resolved::new(Ty::Int), |_| Value::Null);
        let _ = a.register("y", 0, Resolved::new(Ty::Int), |_| Value::Null);
        let mut b = FunctionRegistry::new();
        let _ = b.register("y", 0, Resolved::new(Ty::Int), |_| Value::Null);
        let _ = b.register("x", 1, Resolved::new(Ty::Int), |_| Value::Null);
        assert_eq!(a.fingerprint(), b.fingerprint());
    }
}
