//! Built-in plain renderer.
//!
//! The real template engine is an external collaborator; this renderer
//! implements the same contract with fixed text templates, enough for the
//! generated tree to be complete and for downstream naming to be exact.

use crate::gen::emitter::{required, Bindings, GenError, TemplateRenderer};

/// State names every extended-state enumeration starts from.
const TASK_STATE_NAMES: &[&str] = &[
    "INIT",
    "PRE_OPERATIONAL",
    "FATAL_ERROR",
    "EXCEPTION",
    "STOPPED",
    "RUNNING",
    "RUNTIME_ERROR",
];

/// Renderer producing plain, deterministic text.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainRenderer;

impl TemplateRenderer for PlainRenderer {
    fn render(&self, template_id: &str, bindings: &Bindings) -> Result<String, GenError> {
        match template_id {
            "project.pc" => {
                let name = required(bindings, template_id, "name")?;
                let version = required(bindings, template_id, "version")?;
                Ok(format!(
                    "prefix=@prefix@\n\
                     exec_prefix=@prefix@\n\
                     deffile=@prefix@/share/orogen/{name}.orogen\n\
                     \n\
                     Name: orogen-project-{name}\n\
                     Description: oroGen project {name}\n\
                     Version: {version}\n"
                ))
            }

            "tasks/tasks.pc" => {
                let name = required(bindings, template_id, "name")?;
                let version = required(bindings, template_id, "version")?;
                let target = required(bindings, template_id, "target")?;
                let requires = bindings.get("requires").cloned().unwrap_or_default();
                Ok(format!(
                    "prefix=@prefix@\n\
                     libdir=@prefix@/lib\n\
                     includedir=@prefix@/include\n\
                     \n\
                     Name: {name}-tasks-{target}\n\
                     Description: {name} task library\n\
                     Version: {version}\n\
                     Requires: {requires}\n\
                     Libs: -L${{libdir}} -l{name}-tasks-{target}\n\
                     Cflags: -I${{includedir}}\n"
                ))
            }

            "typekit/typekit.pc" => {
                let name = required(bindings, template_id, "name")?;
                let version = required(bindings, template_id, "version")?;
                let target = required(bindings, template_id, "target")?;
                Ok(format!(
                    "prefix=@prefix@\n\
                     libdir=@prefix@/lib\n\
                     includedir=@prefix@/include\n\
                     type_registry=@prefix@/share/orogen/{name}.tlb\n\
                     \n\
                     Name: {name}-typekit-{target}\n\
                     Description: {name} types marshalling support\n\
                     Version: {version}\n\
                     Libs: -L${{libdir}} -l{name}-typekit-{target}\n\
                     Cflags: -I${{includedir}}\n"
                ))
            }

            "tasks/TaskStates.hpp" => {
                let project = required(bindings, template_id, "project")?;
                let tasks = required(bindings, template_id, "tasks")?;
                let guard = format!("{}_TASK_STATES_HPP", project.to_uppercase());
                let mut out = format!("#ifndef {guard}\n#define {guard}\n\nnamespace {project} {{\n");
                for task in tasks.split(';').filter(|t| !t.is_empty()) {
                    out.push_str(&format!("    enum {task}_STATES {{\n"));
                    for state in TASK_STATE_NAMES {
                        out.push_str(&format!("        {task}_{state},\n"));
                    }
                    out.push_str("    };\n");
                }
                out.push_str(&format!("}}\n\n#endif // {guard}\n"));
                Ok(out)
            }

            "tasks/Task.hpp" => {
                let project = required(bindings, template_id, "project")?;
                let task = required(bindings, template_id, "task")?;
                let superclass = required(bindings, template_id, "superclass")?;
                let guard = format!(
                    "{}_{}_TASK_HPP",
                    project.to_uppercase(),
                    task.to_uppercase()
                );
                Ok(format!(
                    "#ifndef {guard}\n\
                     #define {guard}\n\
                     \n\
                     #include \"{project}/{task}Base.hpp\"\n\
                     \n\
                     namespace {project} {{\n\
                     \x20   class {task} : public {superclass} {{\n\
                     \x20   public:\n\
                     \x20       {task}(std::string const& name);\n\
                     \x20   }};\n\
                     }}\n\
                     \n\
                     #endif // {guard}\n"
                ))
            }

            "tasks/Task.cpp" => {
                let project = required(bindings, template_id, "project")?;
                let task = required(bindings, template_id, "task")?;
                Ok(format!(
                    "#include \"{task}.hpp\"\n\
                     \n\
                     using namespace {project};\n\
                     \n\
                     {task}::{task}(std::string const& name)\n\
                     \x20   : {task}Base(name) {{}}\n"
                ))
            }

            "tasks/DeployerComponent.cpp" => {
                let project = required(bindings, template_id, "project")?;
                let tasks = required(bindings, template_id, "tasks")?;
                let mut out = format!("// Deployer registration for the {project} task library\n");
                out.push_str("#include <rtt/Component.hpp>\n\n");
                for task in tasks.split(';').filter(|t| !t.is_empty()) {
                    out.push_str(&format!("#include \"{project}/{task}.hpp\"\n"));
                }
                out.push_str("\nORO_CREATE_COMPONENT_LIBRARY()\n");
                for task in tasks.split(';').filter(|t| !t.is_empty()) {
                    out.push_str(&format!("ORO_LIST_COMPONENT_TYPE({project}::{task})\n"));
                }
                Ok(out)
            }

            "typekit/Typekit.hpp" => {
                let name = required(bindings, template_id, "name")?;
                let guard = format!("{}_TYPEKIT_HPP", name.to_uppercase());
                let types = bindings.get("types").cloned().unwrap_or_default();
                let mut out = format!("#ifndef {guard}\n#define {guard}\n\n");
                out.push_str(&format!("// Types exported by the {name} typekit:\n"));
                for type_name in types.split(';').filter(|t| !t.is_empty()) {
                    out.push_str(&format!("//   {type_name}\n"));
                }
                out.push_str(&format!("\n#endif // {guard}\n"));
                Ok(out)
            }

            "typekit/Typekit.cpp" => {
                let name = required(bindings, template_id, "name")?;
                Ok(format!(
                    "#include \"{name}Typekit.hpp\"\n\
                     \n\
                     // Marshalling support for the {name} typekit.\n"
                ))
            }

            "deployment/main.cpp" => {
                let deployment = required(bindings, template_id, "deployment")?;
                let tasks = required(bindings, template_id, "tasks")?;
                let mut out = format!("// Deployment executable {deployment}\n");
                out.push_str("#include <rtt/os/main.h>\n\nint ORO_main(int argc, char** argv)\n{\n");
                for instance in tasks.split(';').filter(|t| !t.is_empty()) {
                    out.push_str(&format!("    // instantiates {instance}\n"));
                }
                out.push_str("    return 0;\n}\n");
                Ok(out)
            }

            "gitignore" => Ok(".orogen/\nbuild/\n*.pyc\n".to_string()),

            "Doxyfile.in" => {
                let name = required(bindings, template_id, "name")?;
                Ok(format!(
                    "PROJECT_NAME = {name}\n\
                     OUTPUT_DIRECTORY = @CMAKE_CURRENT_BINARY_DIR@/doc\n\
                     INPUT = @CMAKE_SOURCE_DIR@/tasks\n\
                     RECURSIVE = YES\n"
                ))
            }

            "config/OrogenPkgCheck.cmake" => Ok(
                "# Resolves a build dependency through pkg-config and exports\n\
                 # <VAR>_INCLUDE_DIRS / <VAR>_LIBRARIES for the generated targets.\n\
                 macro(orogen_pkg_check_modules VAR)\n\
                 \x20   pkg_check_modules(${VAR} ${ARGN})\n\
                 endmacro()\n"
                .to_string(),
            ),

            "config/Base.cmake" => {
                let project = required(bindings, template_id, "project")?;
                let version = required(bindings, template_id, "version")?;
                let target = required(bindings, template_id, "target")?;
                let dependencies = bindings.get("dependencies").cloned().unwrap_or_default();
                Ok(format!(
                    "# Generated base configuration for {project}\n\
                     set(PROJECT_NAME {project})\n\
                     set(PROJECT_VERSION {version})\n\
                     set(OROCOS_TARGET {target})\n\
                     find_package(PkgConfig REQUIRED)\n\
                     include(${{CMAKE_CURRENT_LIST_DIR}}/OrogenPkgCheck.cmake)\n\
                     {dependencies}"
                ))
            }

            "config/TaskLib.cmake" => {
                let project = required(bindings, template_id, "project")?;
                let target = required(bindings, template_id, "target")?;
                let include_vars = bindings.get("include_vars").cloned().unwrap_or_default();
                let link_vars = bindings.get("link_vars").cloned().unwrap_or_default();
                let mut out = format!("# Generated task library rules for {project}\n");
                out.push_str(&format!(
                    "add_library({project}-tasks-{target} SHARED ${{{}_TASKLIB_SOURCES}})\n",
                    project.to_uppercase()
                ));
                for var in include_vars.split(';').filter(|v| !v.is_empty()) {
                    out.push_str(&format!(
                        "target_include_directories({project}-tasks-{target} PUBLIC ${{{var}_INCLUDE_DIRS}})\n"
                    ));
                }
                for var in link_vars.split(';').filter(|v| !v.is_empty()) {
                    out.push_str(&format!(
                        "target_link_libraries({project}-tasks-{target} ${{{var}_LIBRARIES}})\n"
                    ));
                }
                Ok(out)
            }

            "CMakeLists.txt" => {
                let project = required(bindings, template_id, "project")?;
                let version = required(bindings, template_id, "version")?;
                Ok(format!(
                    "cmake_minimum_required(VERSION 3.10)\n\
                     project({project} VERSION {version})\n\
                     include(${{CMAKE_SOURCE_DIR}}/.orogen/config/{project}Base.cmake)\n"
                ))
            }

            "tasks/CMakeLists.txt" => {
                let project = required(bindings, template_id, "project")?;
                Ok(format!(
                    "include(${{CMAKE_SOURCE_DIR}}/.orogen/config/{project}TaskLib.cmake)\n"
                ))
            }

            _ => Err(GenError::UnknownTemplate {
                template_id: template_id.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gen::emitter::bindings;

    #[test]
    fn test_project_pc_names_the_package() {
        let renderer = PlainRenderer;
        let text = renderer
            .render(
                "project.pc",
                &bindings([
                    ("name", "cam".to_string()),
                    ("version", "0.1".to_string()),
                ]),
            )
            .unwrap();
        assert!(text.contains("Name: orogen-project-cam"));
        assert!(text.contains("Version: 0.1"));
    }

    #[test]
    fn test_task_states_enumerates_all_tasks() {
        let renderer = PlainRenderer;
        let text = renderer
            .render(
                "tasks/TaskStates.hpp",
                &bindings([
                    ("project", "cam".to_string()),
                    ("tasks", "Grabber;Monitor".to_string()),
                ]),
            )
            .unwrap();
        assert!(text.contains("enum Grabber_STATES"));
        assert!(text.contains("Grabber_RUNTIME_ERROR"));
        assert!(text.contains("enum Monitor_STATES"));
    }

    #[test]
    fn test_missing_binding_is_reported() {
        let renderer = PlainRenderer;
        let err = renderer.render("project.pc", &Bindings::new()).unwrap_err();
        assert!(matches!(err, GenError::MissingBinding { .. }));
    }

    #[test]
    fn test_unknown_template_is_an_error() {
        let renderer = PlainRenderer;
        let err = renderer.render("nope", &Bindings::new()).unwrap_err();
        assert!(matches!(err, GenError::UnknownTemplate { .. }));
    }
}
