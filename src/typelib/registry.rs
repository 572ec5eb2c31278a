//! Additive type database.
//!
//! The registry is the merge target for every typekit import: it only ever
//! grows, and a merge that would overwrite an existing type with a
//! structurally different definition is a hard error instead of a silent
//! clobber. Type names are absolute, `/`-separated paths
//! (`/base/Time`, `/std/vector</double>`).
//!
//! Parsing native type definitions out of headers is the job of the
//! type-introspection library and is not done here; registries are loaded
//! from already-normalized description documents.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Structural shape of a registered type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TypeKind {
    /// Plain numeric type (integers, floats, booleans).
    Numeric,
    /// A struct with named, typed fields.
    Compound { fields: Vec<Field> },
    /// An enumeration with named values.
    Enum { values: Vec<String> },
    /// A fixed-size array. Not usable on task interfaces.
    Array { element: String, size: usize },
    /// A dynamic container such as `/std/vector`.
    Container { container: String, element: String },
    /// An opaque type, marshalled through an intermediate.
    Opaque,
}

/// A named field of a compound type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
    pub name: String,
    #[serde(rename = "type")]
    pub type_name: String,
}

/// A single type definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeDef {
    pub name: String,
    #[serde(flatten)]
    pub kind: TypeKind,
}

impl TypeDef {
    /// A numeric type definition.
    pub fn numeric(name: impl Into<String>) -> Self {
        TypeDef {
            name: name.into(),
            kind: TypeKind::Numeric,
        }
    }

    /// A compound type definition from `(field, type)` pairs.
    pub fn compound(name: impl Into<String>, fields: &[(&str, &str)]) -> Self {
        TypeDef {
            name: name.into(),
            kind: TypeKind::Compound {
                fields: fields
                    .iter()
                    .map(|(n, t)| Field {
                        name: (*n).to_string(),
                        type_name: (*t).to_string(),
                    })
                    .collect(),
            },
        }
    }

    /// An enumeration definition.
    pub fn enumeration(name: impl Into<String>, values: &[&str]) -> Self {
        TypeDef {
            name: name.into(),
            kind: TypeKind::Enum {
                values: values.iter().map(|v| (*v).to_string()).collect(),
            },
        }
    }

    /// A container definition.
    pub fn container(name: impl Into<String>, container: &str, element: &str) -> Self {
        TypeDef {
            name: name.into(),
            kind: TypeKind::Container {
                container: container.to_string(),
                element: element.to_string(),
            },
        }
    }

    /// An opaque definition.
    pub fn opaque(name: impl Into<String>) -> Self {
        TypeDef {
            name: name.into(),
            kind: TypeKind::Opaque,
        }
    }

    /// True if this is a fixed-size array type.
    pub fn is_array(&self) -> bool {
        matches!(self.kind, TypeKind::Array { .. })
    }

    /// True if this is an opaque type.
    pub fn is_opaque(&self) -> bool {
        matches!(self.kind, TypeKind::Opaque)
    }

    /// Compact structural summary, used in conflict reports.
    fn summary(&self) -> String {
        match &self.kind {
            TypeKind::Numeric => "numeric".to_string(),
            TypeKind::Compound { fields } => {
                let fields: Vec<String> = fields
                    .iter()
                    .map(|f| format!("{}: {}", f.name, f.type_name))
                    .collect();
                format!("compound {{ {} }}", fields.join(", "))
            }
            TypeKind::Enum { values } => format!("enum {{ {} }}", values.join(", ")),
            TypeKind::Array { element, size } => format!("array [{}; {}]", element, size),
            TypeKind::Container { container, element } => {
                format!("container {}<{}>", container, element)
            }
            TypeKind::Opaque => "opaque".to_string(),
        }
    }
}

/// An opaque-type declaration: the opaque name plus the intermediate type
/// it is marshalled through.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpaqueDef {
    pub name: String,
    pub intermediate: String,
    #[serde(default)]
    pub needs_copy: bool,
}

/// A merge attempted to redefine a type with a different structure.
#[derive(Debug, Error)]
#[error("type definition mismatch for '{name}': registered as {existing}, redefined as {incoming}")]
pub struct MergeConflict {
    pub name: String,
    pub existing: String,
    pub incoming: String,
}

/// Registry document as stored in typekit description files.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RegistryDoc {
    #[serde(default)]
    pub types: Vec<TypeDef>,
    #[serde(default)]
    pub opaques: Vec<OpaqueDef>,
}

/// The merged type database.
#[derive(Debug, Clone, Default)]
pub struct TypeRegistry {
    types: BTreeMap<String, TypeDef>,
}

impl TypeRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        TypeRegistry {
            types: BTreeMap::new(),
        }
    }

    /// Create a registry pre-seeded with the standard C++ numeric types.
    pub fn with_standard_cxx_types() -> Self {
        let mut registry = TypeRegistry::new();
        for name in [
            "/bool", "/char", "/int8_t", "/uint8_t", "/int16_t", "/uint16_t", "/int32_t",
            "/uint32_t", "/int64_t", "/uint64_t", "/float", "/double",
        ] {
            // Seeding a fresh registry cannot conflict.
            let _ = registry.add(TypeDef::numeric(name));
        }
        registry
    }

    /// Normalize a type name: `::` separators become `/` and the name is
    /// made absolute.
    pub fn normalize_typename(name: &str) -> String {
        let name = name.trim().replace("::", "/");
        if name.starts_with('/') {
            name
        } else {
            format!("/{}", name)
        }
    }

    /// Register one type.
    ///
    /// Registering the same name twice is fine as long as the definitions
    /// are structurally identical; anything else is a [`MergeConflict`].
    pub fn add(&mut self, def: TypeDef) -> Result<(), MergeConflict> {
        let name = Self::normalize_typename(&def.name);
        let def = TypeDef { name: name.clone(), ..def };
        if let Some(existing) = self.types.get(&name) {
            if existing.kind != def.kind {
                return Err(MergeConflict {
                    name,
                    existing: existing.summary(),
                    incoming: def.summary(),
                });
            }
            return Ok(());
        }
        self.types.insert(name, def);
        Ok(())
    }

    /// Merge another registry into this one. Either every type of `other`
    /// ends up registered, or the first structural conflict is reported and
    /// this registry keeps the types merged before it.
    pub fn merge(&mut self, other: &TypeRegistry) -> Result<(), MergeConflict> {
        for def in other.types.values() {
            self.add(def.clone())?;
        }
        Ok(())
    }

    /// Look up a type by (possibly non-normalized) name.
    pub fn get(&self, name: &str) -> Option<&TypeDef> {
        self.types.get(&Self::normalize_typename(name))
    }

    /// True if the registry defines the given type.
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// True if the registry has any type under the given namespace.
    ///
    /// The namespace is interpreted as a toplevel one: `has_namespace("cam")`
    /// checks for types below `/cam/`.
    pub fn has_namespace(&self, namespace: &str) -> bool {
        let mut prefix = Self::normalize_typename(namespace);
        if !prefix.ends_with('/') {
            prefix.push('/');
        }
        self.types.keys().any(|name| name.starts_with(&prefix))
    }

    /// Iterate over all registered types in name order.
    pub fn iter(&self) -> impl Iterator<Item = &TypeDef> {
        self.types.values()
    }

    /// The subset of opaque type definitions, as its own registry.
    pub fn opaque_subset(&self) -> TypeRegistry {
        TypeRegistry {
            types: self
                .types
                .iter()
                .filter(|(_, def)| def.is_opaque())
                .map(|(name, def)| (name.clone(), def.clone()))
                .collect(),
        }
    }

    /// Number of registered types.
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// True if no type is registered.
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Parse a registry document. Returns the registry and the opaque
    /// declarations listed alongside it.
    pub fn from_doc_str(doc: &str) -> Result<(TypeRegistry, Vec<OpaqueDef>), toml::de::Error> {
        let doc: RegistryDoc = toml::from_str(doc)?;
        let mut registry = TypeRegistry::new();
        for def in doc.types {
            // A description document that conflicts with itself is treated
            // as defining the type once.
            let _ = registry.add(def);
        }
        Ok((registry, doc.opaques))
    }

    /// Serialize to a registry document.
    pub fn to_doc_string(&self, opaques: &[OpaqueDef]) -> String {
        let doc = RegistryDoc {
            types: self.types.values().cloned().collect(),
            opaques: opaques.to_vec(),
        };
        toml::to_string_pretty(&doc).unwrap_or_default()
    }
}
