//! Standard task models and the base typekit.
//!
//! Every project starts out knowing the task models shipped with the RTT
//! and OCL, and the `rtt` typekit that exports the runtime's base types
//! (strings, vectors). These are built-in equivalents of the descriptions
//! an installation would provide.

use std::rc::Rc;

use crate::core::imported::ImportedTypekit;
use crate::core::task::TaskContext;
use crate::typelib::{TypeDef, TypeRegistry};

/// Name of the default superclass model for new task contexts.
pub const DEFAULT_TASK_SUPERCLASS: &str = "RTT::TaskContext";

/// Name of the logger model added by `default_logger` deployments.
pub const DEFAULT_LOGGER_MODEL: &str = "OCL::LoggingComponent";

/// The task models available in every project.
pub fn standard_tasks() -> Vec<Rc<TaskContext>> {
    ["RTT::TaskContext", "OCL::LoggingComponent", "OCL::TaskBrowser"]
        .into_iter()
        .map(|name| Rc::new(TaskContext::new(name)))
        .collect()
}

/// The mandatory base typekit, exporting the runtime's own types.
pub fn rtt_typekit() -> Rc<ImportedTypekit> {
    let mut registry = TypeRegistry::new();
    let types = [
        TypeDef::container("/std/string", "/std/string", "/char"),
        TypeDef::container("/std/vector</double>", "/std/vector", "/double"),
        TypeDef::container("/std/vector</int32_t>", "/std/vector", "/int32_t"),
        TypeDef::compound(
            "/RTT/ConnPolicy",
            &[("type", "/int32_t"), ("size", "/int32_t"), ("init", "/bool")],
        ),
    ];
    let mut typelist = String::new();
    for def in types {
        typelist.push_str(&def.name);
        typelist.push('\n');
        // A static, disjoint seed cannot conflict.
        let _ = registry.add(def);
    }

    let doc = registry.to_doc_string(&[]);
    let typekit = ImportedTypekit::from_raw_data("rtt", None, &doc, &typelist)
        .expect("the built-in rtt typekit description is well-formed");
    // The runtime's own types come with the runtime, not with a separate
    // typekit library.
    Rc::new(typekit.make_virtual())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_tasks_include_default_superclass() {
        let tasks = standard_tasks();
        assert!(tasks.iter().any(|t| t.name() == DEFAULT_TASK_SUPERCLASS));
        assert!(tasks.iter().any(|t| t.name() == DEFAULT_LOGGER_MODEL));
    }

    #[test]
    fn test_rtt_typekit_exports_base_types() {
        let typekit = rtt_typekit();
        assert_eq!(typekit.name(), "rtt");
        assert!(typekit.includes("/std/string"));
        assert!(typekit.is_interface_type("/std/vector</double>"));
        assert!(typekit.is_virtual());
    }
}
