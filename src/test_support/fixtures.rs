//! Fixture helpers installing package descriptions into a temp directory.

use std::path::Path;

use crate::core::naming;
use crate::locator::PkgInfo;
use crate::test_support::MockLocator;

/// Registry document of the `base` fixture typekit: two compound types.
pub const BASE_REGISTRY_DOC: &str = r#"
[[types]]
name = "/base/Time"
kind = "compound"
fields = [{ name = "seconds", type = "/int64_t" }, { name = "usecs", type = "/int32_t" }]

[[types]]
name = "/base/Joints"
kind = "compound"
fields = [{ name = "positions", type = "/std/vector</double>" }]
"#;

fn registry_doc_for(name: &str) -> String {
    BASE_REGISTRY_DOC.replace("/base/", &format!("/{}/", name))
}

fn typelist_for(name: &str) -> String {
    format!("/{0}/Time\n/{0}/Joints\n", name)
}

/// Install a typekit package exporting `/{name}/Time` and `/{name}/Joints`.
pub fn install_typekit(locator: &MockLocator, dir: &Path, name: &str, target: &str) -> PkgInfo {
    install_typekit_with(
        locator,
        dir,
        name,
        target,
        &registry_doc_for(name),
        &typelist_for(name),
    )
}

/// Install a typekit package with explicit registry and typelist contents.
pub fn install_typekit_with(
    locator: &MockLocator,
    dir: &Path,
    name: &str,
    target: &str,
    registry_doc: &str,
    typelist: &str,
) -> PkgInfo {
    let registry_path = dir.join(format!("{}.tlb", name));
    std::fs::write(&registry_path, registry_doc).expect("failed to write registry fixture");
    std::fs::write(dir.join(format!("{}.typelist", name)), typelist)
        .expect("failed to write typelist fixture");

    let mut pkg = PkgInfo::new(naming::typekit_pkg_name(name, target), dir);
    pkg.type_registry = Some(registry_path);
    locator.add(pkg.clone());
    pkg
}

/// Install an oroGen project package with the given description document.
pub fn install_project(locator: &MockLocator, dir: &Path, name: &str, spec_toml: &str) -> PkgInfo {
    let description_path = dir.join(format!("{}.orogen", name));
    std::fs::write(&description_path, spec_toml).expect("failed to write description fixture");

    let mut pkg = PkgInfo::new(naming::project_pkg_name(name), dir);
    pkg.description_path = Some(description_path);
    locator.add(pkg.clone());
    pkg
}

/// Install a task-library package defining one task `{name}::Base` and
/// declaring the given typekits as used.
pub fn install_task_library(
    locator: &MockLocator,
    dir: &Path,
    name: &str,
    _target: &str,
    used_typekits: &[&str],
) -> PkgInfo {
    let typekits = used_typekits
        .iter()
        .map(|tk| format!("\"{}\"", tk))
        .collect::<Vec<String>>()
        .join(", ");
    let spec = format!(
        r#"
name = "{name}"
version = "0.1"
typekits = [{typekits}]

[[tasks]]
name = "Base"
"#
    );
    install_project(locator, dir, name, &spec)
}
