//! Task-context handles.
//!
//! A TaskContext is a named task-interface definition living in a project's
//! namespace. The project model tracks its identity, the typekits its
//! interface pulls in, and the task libraries it depends on; generating the
//! task implementation itself is the renderer's job.

use std::collections::{BTreeMap, BTreeSet};

/// Direction of a data port.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PortDirection {
    Input,
    Output,
}

/// A data port of a task interface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Port {
    pub name: String,
    pub direction: PortDirection,
    /// Normalized type name.
    pub type_name: String,
}

/// A configuration property of a task interface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Property {
    pub name: String,
    /// Normalized type name.
    pub type_name: String,
    pub doc: Option<String>,
}

/// A callable operation of a task interface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Operation {
    pub name: String,
    /// Normalized return type name, if the operation returns a value.
    pub return_type: Option<String>,
    /// Arguments as (name, normalized type name) pairs.
    pub arguments: Vec<(String, String)>,
}

/// A named task-interface definition.
#[derive(Debug, Clone)]
pub struct TaskContext {
    /// Fully qualified name, `<project>::<local name>`.
    name: String,

    /// Fully qualified name of the superclass model, if any.
    superclass: Option<String>,

    /// Task library defining this task, None for tasks defined locally or
    /// shipped as standard models.
    origin: Option<String>,

    ports: Vec<Port>,
    properties: Vec<Property>,
    operations: Vec<Operation>,

    /// Whether the task declares its own extended state enumeration.
    extended_state_support: bool,

    /// Typekits whose types appear in this task's public interface,
    /// mapped to their virtual (header-only) flag.
    used_typekits: BTreeMap<String, bool>,

    /// Task libraries this task depends on (superclass provider).
    used_task_libraries: BTreeSet<String>,
}

impl TaskContext {
    /// Create an empty task model with the given fully qualified name.
    pub fn new(name: impl Into<String>) -> Self {
        TaskContext {
            name: name.into(),
            superclass: None,
            origin: None,
            ports: Vec::new(),
            properties: Vec::new(),
            operations: Vec::new(),
            extended_state_support: false,
            used_typekits: BTreeMap::new(),
            used_task_libraries: BTreeSet::new(),
        }
    }

    /// Tag the task as defined by the given task library.
    pub fn with_origin(mut self, origin: impl Into<String>) -> Self {
        self.origin = Some(origin.into());
        self
    }

    /// Fully qualified name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Local name, without the namespace.
    pub fn basename(&self) -> &str {
        self.name.rsplit("::").next().unwrap_or(&self.name)
    }

    /// Namespace part of the name, if any.
    pub fn namespace(&self) -> Option<&str> {
        self.name.rsplit_once("::").map(|(ns, _)| ns)
    }

    /// The task library this task was imported from, if any.
    pub fn origin(&self) -> Option<&str> {
        self.origin.as_deref()
    }

    /// The superclass model name, if one was declared.
    pub fn superclass(&self) -> Option<&str> {
        self.superclass.as_deref()
    }

    pub fn set_superclass(&mut self, name: impl Into<String>) {
        self.superclass = Some(name.into());
    }

    pub fn ports(&self) -> &[Port] {
        &self.ports
    }

    pub fn properties(&self) -> &[Property] {
        &self.properties
    }

    pub fn operations(&self) -> &[Operation] {
        &self.operations
    }

    pub fn add_port(&mut self, port: Port) {
        self.ports.push(port);
    }

    pub fn add_property(&mut self, property: Property) {
        self.properties.push(property);
    }

    pub fn add_operation(&mut self, operation: Operation) {
        self.operations.push(operation);
    }

    /// Enable the generation of a task-specific state enumeration.
    pub fn enable_extended_state_support(&mut self) {
        self.extended_state_support = true;
    }

    /// True if this task requests an extended state enumeration.
    pub fn extended_state_support(&self) -> bool {
        self.extended_state_support
    }

    /// Record that a typekit's types appear in this task's interface.
    pub fn record_used_typekit(&mut self, name: impl Into<String>, is_virtual: bool) {
        self.used_typekits.insert(name.into(), is_virtual);
    }

    /// Record a task library this task depends on.
    pub fn record_used_task_library(&mut self, name: impl Into<String>) {
        self.used_task_libraries.insert(name.into());
    }

    /// Typekits referenced by the interface, with their virtual flag.
    pub fn used_typekits(&self) -> impl Iterator<Item = (&str, bool)> {
        self.used_typekits
            .iter()
            .map(|(name, is_virtual)| (name.as_str(), *is_virtual))
    }

    /// Task libraries this task depends on.
    pub fn used_task_libraries(&self) -> impl Iterator<Item = &str> {
        self.used_task_libraries.iter().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_parts() {
        let task = TaskContext::new("cam::Grabber");
        assert_eq!(task.name(), "cam::Grabber");
        assert_eq!(task.basename(), "Grabber");
        assert_eq!(task.namespace(), Some("cam"));
    }

    #[test]
    fn test_unqualified_name() {
        let task = TaskContext::new("Grabber");
        assert_eq!(task.basename(), "Grabber");
        assert_eq!(task.namespace(), None);
    }

    #[test]
    fn test_used_typekits_dedup() {
        let mut task = TaskContext::new("cam::Grabber");
        task.record_used_typekit("base", false);
        task.record_used_typekit("base", false);
        assert_eq!(task.used_typekits().count(), 1);
    }

    #[test]
    fn test_origin() {
        let task = TaskContext::new("upstream::Base").with_origin("upstream");
        assert_eq!(task.origin(), Some("upstream"));
    }
}
