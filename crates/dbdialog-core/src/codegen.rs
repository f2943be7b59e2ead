//! # Code Artifacts
//!
//! Every dialog has a companion source artifact exposing one handler per
//! query. Producing and loading that code is the job of an external
//! [`CodeArtifactGenerator`]; [`StubGenerator`] renders a deterministic
//! handler module and keeps the method registry in memory.

use crate::types::DialogError;
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

/// Produce and register companion code for dialogs.
pub trait CodeArtifactGenerator {
    /// Source text of the companion artifact of `object`.
    fn generate(&self, object: &str, methods: &[String]) -> Result<String, DialogError>;

    /// Register `method` on the class `qualified_name` (`{ds}.{object}`).
    fn add_method(&mut self, qualified_name: &str, method: &str) -> Result<(), DialogError>;

    /// Unregister a method by its full name (`{ds}.{object}.{method}`).
    fn remove_method(&mut self, qualified_name: &str) -> Result<(), DialogError>;

    /// Reload generated code.
    fn refresh(&mut self) -> Result<(), DialogError>;
}

// =============================================================================
// NAME MANGLING
// =============================================================================

/// `ReadByKey` -> `read_by_key`, `Title_xs` -> `title_xs`.
#[must_use]
pub fn to_snake_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    let mut prev_lower = false;
    for ch in name.chars() {
        if !ch.is_ascii_alphanumeric() {
            if !out.ends_with('_') && !out.is_empty() {
                out.push('_');
            }
            prev_lower = false;
            continue;
        }
        if ch.is_ascii_uppercase() {
            if prev_lower && !out.ends_with('_') {
                out.push('_');
            }
            out.push(ch.to_ascii_lowercase());
            prev_lower = false;
        } else {
            out.push(ch);
            prev_lower = true;
        }
    }
    out.trim_end_matches('_').to_string()
}

/// `AAA_Roles` -> `AaaRoles`, `order lines` -> `OrderLines`.
#[must_use]
pub fn to_pascal_case(name: &str) -> String {
    to_snake_case(name)
        .split('_')
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            chars.next().map_or_else(String::new, |first| {
                first.to_ascii_uppercase().to_string() + chars.as_str()
            })
        })
        .collect()
}

// =============================================================================
// STUB GENERATOR
// =============================================================================

/// Renders handler stubs and tracks registered methods per class.
#[derive(Debug, Clone, Default)]
pub struct StubGenerator {
    namespace: String,
    registry: BTreeMap<String, BTreeSet<String>>,
    refreshes: u64,
}

impl StubGenerator {
    #[must_use]
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            ..Self::default()
        }
    }

    /// Methods registered on `qualified_name` (`{ds}.{object}`).
    #[must_use]
    pub fn methods(&self, qualified_name: &str) -> Vec<String> {
        self.registry
            .get(qualified_name)
            .map(|set| set.iter().cloned().collect())
            .unwrap_or_default()
    }

    #[must_use]
    pub fn refresh_count(&self) -> u64 {
        self.refreshes
    }
}

impl CodeArtifactGenerator for StubGenerator {
    fn generate(&self, object: &str, methods: &[String]) -> Result<String, DialogError> {
        let type_name = to_pascal_case(object);
        if type_name.is_empty() {
            return Err(DialogError::CodeGen(format!(
                "object name '{}' has no identifier characters",
                object
            )));
        }

        let mut out = String::new();
        out.push_str("// @generated by dbdialog. Do not edit by hand.\n");
        out.push_str(&format!("// Handlers of {}.{}\n\n", self.namespace, object));
        out.push_str("use dbdialog_runtime::{Actor, ClientQuery, HandlerResult, exec};\n\n");
        out.push_str(&format!("pub struct {};\n\n", type_name));
        out.push_str(&format!("impl {} {{\n", type_name));
        for (i, method) in methods.iter().enumerate() {
            if i > 0 {
                out.push('\n');
            }
            out.push_str(&format!(
                "    pub fn {}(query: &ClientQuery, actor: Option<&Actor>) -> HandlerResult {{\n",
                to_snake_case(method)
            ));
            out.push_str(&format!(
                "        exec(\"{}\", \"{}\", \"{}\", query, actor)\n",
                self.namespace, object, method
            ));
            out.push_str("    }\n");
        }
        out.push_str("}\n");
        Ok(out)
    }

    fn add_method(&mut self, qualified_name: &str, method: &str) -> Result<(), DialogError> {
        debug!("Registering {}.{}", qualified_name, method);
        self.registry
            .entry(qualified_name.to_string())
            .or_default()
            .insert(method.to_string());
        Ok(())
    }

    fn remove_method(&mut self, qualified_name: &str) -> Result<(), DialogError> {
        let (class, method) = qualified_name.rsplit_once('.').ok_or_else(|| {
            DialogError::CodeGen(format!("'{}' is not a qualified method name", qualified_name))
        })?;
        debug!("Unregistering {}", qualified_name);
        if let Some(methods) = self.registry.get_mut(class) {
            methods.remove(method);
            if methods.is_empty() {
                self.registry.remove(class);
            }
        }
        Ok(())
    }

    fn refresh(&mut self) -> Result<(), DialogError> {
        self.refreshes = self.refreshes.saturating_add(1);
        debug!("Refreshed generated code ({} classes)", self.registry.len());
        Ok(())
    }
}

// =============================================================================
// TESTS
// =============================================================================
