use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

/// Adapter supplied by the embedding host for opaque (non-JSON) objects bound
/// into the context. The engine never reflects over host types itself; it asks
/// the adapter to probe one path segment at a time.
///
/// Implementations are expected to try, in order: a field named exactly
/// `segment`, a zero-argument accessor `get<Segment>`, then the boolean
/// accessors `is<Segment>` and `has<Segment>`. Returning `None` makes the
/// whole path resolve to null.
pub trait HostObject: Send + Sync {
    fn probe(&self, segment: &str) -> Option<Bind>;
}

/// A context binding: either a plain JSON value or an opaque host object that
/// resolves its fields through the [`HostObject`] probe.
#[derive(Clone)]
pub enum Bind {
    Value(Value),
    Object(Arc<dyn HostObject>),
}

impl Bind {
    pub fn value(v: impl Into<Value>) -> Self {
        Bind::Value(v.into())
    }
}

impl std::fmt::Debug for Bind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Bind::Value(v) => write!(f, "Bind::Value({v})"),
            Bind::Object(_) => write!(f, "Bind::Object(..)"),
        }
    }
}

/// Identifier-to-value scope visible while processing a subtree.
///
/// Contexts are immutable overlays: directives that introduce bindings
/// (`for`, `set`, `as <id>`) build a child context and process their subtree
/// in it, so sibling branches never observe each other's bindings.
#[derive(Clone, Default)]
pub struct Context {
    vars: HashMap<String, Bind>,
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the root context from user data. Each top-level key of an object
    /// becomes a binding; any other root shape yields an empty context.
    pub fn from_data(data: &Value) -> Self {
        let mut vars = HashMap::new();
        if let Value::Object(map) = data {
            for (k, v) in map {
                vars.insert(k.clone(), Bind::Value(v.clone()));
            }
        }
        Self { vars }
    }

    pub fn get(&self, name: &str) -> Option<&Bind> {
        self.vars.get(name)
    }

    /// New overlay with one extra binding.
    pub fn with_bind(&self, name: &str, bind: Bind) -> Context {
        let mut child = self.clone();
        child.vars.insert(name.to_string(), bind);
        child
    }

    /// New overlay with several extra bindings (loop scopes).
    pub fn with_binds<I>(&self, binds: I) -> Context
    where
        I: IntoIterator<Item = (String, Bind)>,
    {
        let mut child = self.clone();
        for (k, v) in binds {
            child.vars.insert(k, v);
        }
        child
    }
}
