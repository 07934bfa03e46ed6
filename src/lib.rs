//! djson: dynamic JSON templating.
//!
//! Renders a JSON-shaped template against a data context: `{{ }}` path
//! interpolation, inline control directives (`@djson if/unless/else/exists/
//! for/match/set` object keys), and `@djson <fn>` transform pipelines,
//! producing a new JSON tree. Structural problems are reported by
//! [`Processor::validate`]; rendering itself is fail-open and degrades
//! missing data to null/0/empty instead of erroring.

pub mod context;
pub mod errors;
pub mod functions;

mod arith;
mod condition;
mod directives;
mod engine;
mod scan;
mod validate;
mod value;

use std::fs;
use std::path::Path;
use std::sync::Arc;

use serde_json::Value;

use context::{Bind, Context, HostObject};
use engine::Engine;
use errors::{Result, ValidationError};
use functions::{Function, Registry};

pub use functions::NamedFn;

/// The template processor. Owns the function registry; directive and
/// function tables are built at construction and read-only while rendering,
/// so registration takes `&mut self` and cannot race an in-flight `process`.
pub struct Processor {
    registry: Registry,
}

impl Default for Processor {
    fn default() -> Self {
        Self::new()
    }
}

impl Processor {
    pub fn new() -> Self {
        Self {
            registry: Registry::with_builtins(),
        }
    }

    /// Render a parsed template tree against root data.
    pub fn process(&self, template: &Value, data: &Value) -> Value {
        Engine::new(&self.registry).process(template, data)
    }

    /// Render, with opaque host objects bound into the root context
    /// alongside the data keys.
    pub fn process_with_objects(
        &self,
        template: &Value,
        data: &Value,
        objects: &[(&str, Arc<dyn HostObject>)],
    ) -> Value {
        let ctx = Context::from_data(data).with_binds(
            objects
                .iter()
                .map(|(name, obj)| (name.to_string(), Bind::Object(Arc::clone(obj)))),
        );
        Engine::new(&self.registry)
            .process_node(template, &ctx)
            .unwrap_or_else(|| Value::Object(serde_json::Map::new()))
    }

    /// Parse template text, then render.
    pub fn process_str(&self, template: &str, data: &Value) -> Result<Value> {
        let tree: Value = serde_json::from_str(template)?;
        Ok(self.process(&tree, data))
    }

    /// Read a template file, then render.
    pub fn process_file(&self, path: impl AsRef<Path>, data: &Value) -> Result<Value> {
        let text = fs::read_to_string(path)?;
        self.process_str(&text, data)
    }

    /// Render and serialize in one step.
    pub fn process_to_json(&self, template: &str, data: &Value, pretty: bool) -> Result<String> {
        let tree = self.process_str(template, data)?;
        Ok(serialize(&tree, pretty)?)
    }

    pub fn process_file_to_json(
        &self,
        path: impl AsRef<Path>,
        data: &Value,
        pretty: bool,
    ) -> Result<String> {
        let tree = self.process_file(path, data)?;
        Ok(serialize(&tree, pretty)?)
    }

    /// Collect every structural defect in a parsed template tree.
    pub fn validate(&self, template: &Value) -> Vec<ValidationError> {
        validate::validate(template, &self.registry)
    }

    /// Collect every structural defect in template text; malformed JSON is a
    /// single syntax error.
    pub fn validate_str(&self, template: &str) -> Vec<ValidationError> {
        validate::validate_str(template, &self.registry)
    }

    /// Install or override a named transform function.
    pub fn register<F: Function + 'static>(&mut self, f: F) {
        self.registry.register(f);
    }

    /// Closure-friendly registration shorthand.
    pub fn register_fn(
        &mut self,
        name: impl Into<String>,
        f: impl Fn(Value, &[Value]) -> Value + Send + Sync + 'static,
    ) {
        self.registry.register_fn(name, f);
    }
}

fn serialize(tree: &Value, pretty: bool) -> serde_json::Result<String> {
    if pretty {
        serde_json::to_string_pretty(tree)
    } else {
        serde_json::to_string(tree)
    }
}

/// Convenience: render template text with the built-in function catalog.
pub fn process(template: &str, data: &Value) -> Result<Value> {
    Processor::new().process_str(template, data)
}

/// Convenience: validate template text with the built-in function catalog.
pub fn validate(template: &str) -> Vec<ValidationError> {
    Processor::new().validate_str(template)
}
