//! Shader source loading: `#include` resolution, `#define`/`#if` macro
//! evaluation, and the `precision_float` token substitution (spec §4.3,
//! §6).
//!
//! This module only deals with *text*; compiling the resolved WGSL source
//! into a `wgpu::ShaderModule` and reflecting its bind groups is
//! [`crate::gpu::reflection`]'s job — shader *source* and shader
//! *reflection* are kept separate so the preprocessor can be unit-tested
//! without a device.

use std::collections::HashMap;
use std::sync::OnceLock;

use parking_lot::RwLock;

use crate::errors::{EngineError, Result};
use crate::name::Name;

/// A source file provider abstraction so the preprocessor can be tested
/// against an in-memory map instead of the filesystem. The host's real
/// shader directory is an external collaborator (spec §1) wired in through
/// this trait.
pub trait ShaderSource {
    /// Reads the file at `path`, trying each of `search_roots` in order and
    /// returning the first hit.
    fn read(&self, path: &str, search_roots: &[String]) -> Option<String>;
}

/// An in-memory [`ShaderSource`] used by tests and by hosts that embed
/// shader text at compile time (e.g. via `include_str!`).
#[derive(Default)]
pub struct MemorySource {
    files: HashMap<String, String>,
}

impl MemorySource {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, path: &str, contents: &str) {
        self.files.insert(path.to_string(), contents.to_string());
    }
}

impl ShaderSource for MemorySource {
    fn read(&self, path: &str, search_roots: &[String]) -> Option<String> {
        if let Some(s) = self.files.get(path) {
            return Some(s.clone());
        }
        for root in search_roots {
            let joined = format!("{root}/{path}");
            if let Some(s) = self.files.get(&joined) {
                return Some(s.clone());
            }
        }
        None
    }
}

/// Default `#include` search roots (spec §6).
#[must_use]
pub fn default_search_roots() -> Vec<String> {
    vec!["engine/shaders".to_string()]
}

/// Recursively resolves `#include "relative/path"` directives against
/// `search_roots`. Cycles are caller-avoided per spec §6 but this function
/// still detects and rejects them defensively rather than overflowing the
/// stack.
pub fn resolve_includes(
    entry_path: &str,
    source: &dyn ShaderSource,
    search_roots: &[String],
) -> Result<String> {
    let mut stack = vec![entry_path.to_string()];
    resolve_includes_inner(entry_path, source, search_roots, &mut stack)
}

fn resolve_includes_inner(
    path: &str,
    source: &dyn ShaderSource,
    search_roots: &[String],
    active_stack: &mut Vec<String>,
) -> Result<String> {
    let text = source
        .read(path, search_roots)
        .ok_or_else(|| EngineError::ShaderIncludeNotFound(path.to_string()))?;

    let mut out = String::with_capacity(text.len());
    for line in text.lines() {
        if let Some(included) = parse_include_directive(line) {
            if active_stack.iter().any(|p| p == &included) {
                return Err(EngineError::ShaderIncludeCycle(format!(
                    "{} -> {}",
                    active_stack.join(" -> "),
                    included
                )));
            }
            active_stack.push(included.clone());
            let resolved = resolve_includes_inner(&included, source, search_roots, active_stack)?;
            active_stack.pop();
            out.push_str(&resolved);
            out.push('\n');
        } else {
            out.push_str(line);
            out.push('\n');
        }
    }
    Ok(out)
}

fn parse_include_directive(line: &str) -> Option<String> {
    let trimmed = line.trim();
    let rest = trimmed.strip_prefix("#include")?;
    let rest = rest.trim();
    let rest = rest.strip_prefix('"')?;
    let end = rest.find('"')?;
    Some(rest[..end].to_string())
}

/// The `#define KEY [VAL]` map stripped out of shader source before
/// evaluating conditionals. A bare `#define KEY` (no value) maps to `"1"`.
pub type Defines = HashMap<String, String>;

/// Process-wide shader-define state (spec §5: "the Resource Cache, global
/// shader-define state, and the Mesh/Compute/ComputeRaster task queues are
/// process-wide singletons with exclusive mutation by the driver thread").
/// Entries here are merged under every shader's own `extra_defines` at
/// [`Shader::create`] time, so a host can flip a global quality toggle
/// (e.g. `SHADOWS_ENABLED`) without touching every call site that builds a
/// shader.
static GLOBAL_DEFINES: OnceLock<RwLock<Defines>> = OnceLock::new();

fn global_defines_lock() -> &'static RwLock<Defines> {
    GLOBAL_DEFINES.get_or_init(|| RwLock::new(Defines::new()))
}

/// Sets or clears a process-wide define, visible to every subsequent
/// [`Shader::create`] call regardless of which pass triggers it.
pub fn set_global_define(key: &str, value: &str) {
    global_defines_lock().write().insert(key.to_string(), value.to_string());
}

pub fn clear_global_define(key: &str) {
    global_defines_lock().write().remove(key);
}

#[must_use]
pub fn global_defines_snapshot() -> Defines {
    global_defines_lock().read().clone()
}

/// Strips `#define KEY [VAL]` lines out of `source`, returning the
/// remaining text and the accumulated defines map.
#[must_use]
pub fn strip_defines(source: &str, mut defines: Defines) -> (String, Defines) {
    let mut out = String::with_capacity(source.len());
    for line in source.lines() {
        let trimmed = line.trim();
        if let Some(rest) = trimmed.strip_prefix("#define") {
            let mut parts = rest.trim().splitn(2, char::is_whitespace);
            let key = parts.next().unwrap_or_default().to_string();
            let value = parts.next().unwrap_or_default().trim().to_string();
            defines.insert(key, if value.is_empty() { "1".to_string() } else { value });
        } else {
            out.push_str(line);
            out.push('\n');
        }
    }
    (out, defines)
}

/// Evaluates `#if KEY [VAL]` / `#ifndef KEY` / `#else` / `#endif` blocks
/// against `defines`, emitting only the lines whose branch is taken.
/// `#if KEY` (no value) is true iff `KEY` is defined; `#if KEY VAL` is true
/// iff `KEY` is defined and equals `VAL`; `#ifndef KEY` is true iff `KEY` is
/// not defined.
pub fn evaluate_conditionals(source: &str, defines: &Defines) -> Result<String> {
    // Stack of (branch_taken_so_far, currently_emitting).
    let mut stack: Vec<(bool, bool)> = Vec::new();
    let mut out = String::with_capacity(source.len());

    let currently_emitting = |stack: &[(bool, bool)]| stack.iter().all(|(_, emitting)| *emitting);

    for line in source.lines() {
        let trimmed = line.trim();
        if let Some(rest) = trimmed.strip_prefix("#ifndef") {
            let key = rest.trim();
            let cond = !defines.contains_key(key);
            let parent_emitting = currently_emitting(&stack);
            stack.push((cond, parent_emitting && cond));
        } else if let Some(rest) = trimmed.strip_prefix("#if") {
            let mut parts = rest.trim().splitn(2, char::is_whitespace);
            let key = parts.next().unwrap_or_default();
            let expected = parts.next().map(str::trim).filter(|s| !s.is_empty());
            let cond = match (defines.get(key), expected) {
                (Some(v), Some(expected)) => v == expected,
                (Some(_), None) => true,
                (None, _) => false,
            };
            let parent_emitting = currently_emitting(&stack);
            stack.push((cond, parent_emitting && cond));
        } else if trimmed == "#else" {
            let (taken, _) = stack.pop().ok_or_else(|| EngineError::MalformedShaderConditional {
                file: String::new(),
                reason: "#else without matching #if".to_string(),
            })?;
            let parent_emitting = currently_emitting(&stack);
            stack.push((true, parent_emitting && !taken));
        } else if trimmed == "#endif" {
            stack.pop().ok_or_else(|| EngineError::MalformedShaderConditional {
                file: String::new(),
                reason: "#endif without matching #if".to_string(),
            })?;
        } else if currently_emitting(&stack) {
            out.push_str(line);
            out.push('\n');
        }
    }

    if !stack.is_empty() {
        return Err(EngineError::MalformedShaderConditional {
            file: String::new(),
            reason: "unterminated #if block".to_string(),
        });
    }

    Ok(out)
}

/// Replaces the `precision_float` token with a half-float type if the
/// device advertises half-float support, else 32-bit float (spec §4.3).
#[must_use]
pub fn substitute_precision_float(source: &str, half_float_supported: bool) -> String {
    let replacement = if half_float_supported { "f16" } else { "f32" };
    source.replace("precision_float", replacement)
}

/// A compiled shader: resolved source, reflected bind groups, and the
/// compiled module. Held behind [`crate::cache::ResourceCache`] by `Name`.
pub struct Shader {
    pub name: Name,
    pub module: Option<wgpu::ShaderModule>,
    pub reflection: crate::gpu::reflection::ShaderReflection,
}

impl Shader {
    /// Full pipeline: resolve includes, strip defines, evaluate
    /// conditionals, substitute `precision_float`, then compile. A
    /// compile/load failure logs and yields `module: None`, which propagates
    /// a downstream binding error if the pass that uses it is enabled (spec
    /// §7).
    pub fn create(
        device: &wgpu::Device,
        name: &str,
        entry_path: &str,
        source: &dyn ShaderSource,
        search_roots: &[String],
        extra_defines: Defines,
        half_float_supported: bool,
    ) -> Result<Self> {
        let resolved = resolve_includes(entry_path, source, search_roots)?;
        let mut seeded = global_defines_snapshot();
        seeded.extend(extra_defines);
        let (stripped, defines) = strip_defines(&resolved, seeded);
        let evaluated = evaluate_conditionals(&stripped, &defines)?;
        let final_source = substitute_precision_float(&evaluated, half_float_supported);

        let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(name),
            source: wgpu::ShaderSource::Wgsl(final_source.clone().into()),
        });

        let reflection = crate::gpu::reflection::reflect(&final_source);

        Ok(Self {
            name: Name::new(name),
            module: Some(module),
            reflection,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn include_is_resolved_recursively() {
        let mut src = MemorySource::new();
        src.insert("a.wgsl", "A_TOP\n#include \"b.wgsl\"\nA_BOTTOM");
        src.insert("b.wgsl", "B_TOP\n#include \"c.wgsl\"\nB_BOTTOM");
        src.insert("c.wgsl", "C_BODY");

        let resolved = resolve_includes("a.wgsl", &src, &[]).unwrap();
        assert!(resolved.contains("A_TOP"));
        assert!(resolved.contains("B_TOP"));
        assert!(resolved.contains("C_BODY"));
        assert!(resolved.contains("B_BOTTOM"));
        assert!(resolved.contains("A_BOTTOM"));
    }

    #[test]
    fn include_search_roots_are_tried() {
        let mut src = MemorySource::new();
        src.insert("engine/shaders/common.wgsl", "COMMON");
        src.insert("main.wgsl", "#include \"common.wgsl\"");
        let roots = default_search_roots();
        let resolved = resolve_includes("main.wgsl", &src, &roots).unwrap();
        assert!(resolved.contains("COMMON"));
    }

    #[test]
    fn include_cycle_is_detected() {
        let mut src = MemorySource::new();
        src.insert("a.wgsl", "#include \"b.wgsl\"");
        src.insert("b.wgsl", "#include \"a.wgsl\"");
        let err = resolve_includes("a.wgsl", &src, &[]).unwrap_err();
        assert!(matches!(err, EngineError::ShaderIncludeCycle(_)));
    }

    #[test]
    fn missing_include_is_an_error() {
        let src = MemorySource::new();
        let err = resolve_includes("missing.wgsl", &src, &[]).unwrap_err();
        assert!(matches!(err, EngineError::ShaderIncludeNotFound(_)));
    }

    #[test]
    fn define_without_value_defaults_to_one() {
        let (_, defines) = strip_defines("#define GI_ENABLED\nbody", Defines::new());
        assert_eq!(defines.get("GI_ENABLED"), Some(&"1".to_string()));
    }

    #[test]
    fn define_with_value_is_captured() {
        let (_, defines) = strip_defines("#define MAX_LIGHTS 256\nbody", Defines::new());
        assert_eq!(defines.get("MAX_LIGHTS"), Some(&"256".to_string()));
    }

    #[test]
    fn if_defined_emits_true_branch_only() {
        let mut defines = Defines::new();
        defines.insert("GI_ENABLED".to_string(), "1".to_string());
        let src = "#if GI_ENABLED\nGI_CODE\n#else\nNO_GI_CODE\n#endif\n";
        let out = evaluate_conditionals(src, &defines).unwrap();
        assert!(out.contains("GI_CODE"));
        assert!(!out.contains("NO_GI_CODE"));
    }

    #[test]
    fn if_undefined_emits_else_branch() {
        let defines = Defines::new();
        let src = "#if SHADOWS_ENABLED\nYES\n#else\nNO\n#endif\n";
        let out = evaluate_conditionals(src, &defines).unwrap();
        assert!(out.contains("NO"));
        assert!(!out.contains("YES"));
    }

    #[test]
    fn if_with_expected_value_matches_exactly() {
        let mut defines = Defines::new();
        defines.insert("QUALITY".to_string(), "HIGH".to_string());
        let src = "#if QUALITY HIGH\nHIGH_PATH\n#endif\n#if QUALITY LOW\nLOW_PATH\n#endif\n";
        let out = evaluate_conditionals(src, &defines).unwrap();
        assert!(out.contains("HIGH_PATH"));
        assert!(!out.contains("LOW_PATH"));
    }

    #[test]
    fn ifndef_emits_when_not_defined() {
        let defines = Defines::new();
        let src = "#ifndef FOO\nBODY\n#endif\n";
        let out = evaluate_conditionals(src, &defines).unwrap();
        assert!(out.contains("BODY"));
    }

    #[test]
    fn nested_conditionals_respect_parent_branch() {
        let mut defines = Defines::new();
        defines.insert("OUTER".to_string(), "1".to_string());
        let src = "#if OUTER\n#if INNER\nINNER_BODY\n#else\nINNER_ELSE\n#endif\n#endif\n";
        let out = evaluate_conditionals(src, &defines).unwrap();
        assert!(out.contains("INNER_ELSE"));
        assert!(!out.contains("INNER_BODY"));
    }

    #[test]
    fn unterminated_if_is_an_error() {
        let defines = Defines::new();
        let err = evaluate_conditionals("#if FOO\nBODY", &defines).unwrap_err();
        assert!(matches!(err, EngineError::MalformedShaderConditional { .. }));
    }

    #[test]
    fn precision_float_substitutes_f16_when_supported() {
        let out = substitute_precision_float("var x: precision_float;", true);
        assert_eq!(out, "var x: f16;");
    }

    #[test]
    fn precision_float_substitutes_f32_when_unsupported() {
        let out = substitute_precision_float("var x: precision_float;", false);
        assert_eq!(out, "var x: f32;");
    }

    #[test]
    fn global_define_is_visible_in_a_fresh_snapshot() {
        set_global_define("NIGHTFORGE_TEST_DEFINE", "7");
        let snapshot = global_defines_snapshot();
        assert_eq!(snapshot.get("NIGHTFORGE_TEST_DEFINE"), Some(&"7".to_string()));
        clear_global_define("NIGHTFORGE_TEST_DEFINE");
        assert!(!global_defines_snapshot().contains_key("NIGHTFORGE_TEST_DEFINE"));
    }

    #[test]
    fn per_shader_extra_defines_override_global_ones() {
        set_global_define("NIGHTFORGE_TEST_OVERRIDE", "global");
        let mut extra = Defines::new();
        extra.insert("NIGHTFORGE_TEST_OVERRIDE".to_string(), "local".to_string());
        let mut seeded = global_defines_snapshot();
        seeded.extend(extra);
        assert_eq!(seeded.get("NIGHTFORGE_TEST_OVERRIDE"), Some(&"local".to_string()));
        clear_global_define("NIGHTFORGE_TEST_OVERRIDE");
    }
}
