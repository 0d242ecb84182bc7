//! Shader reflection.
//!
//! Rather than dispatching on `wgpu::naga`'s module IR at bind-group build
//! time, shaders are reflected once into a strong-typed tagged union
//! (`ShaderReflection` -> groups -> `BindingReflection`) that the
//! bind-group/pipeline-layout synthesis in [`crate::gpu::bind_group`] and
//! [`crate::gpu::pipeline`] consumes directly (spec §4.3, §9 redesign:
//! "Dynamic dispatch via reflection on shader modules -> strong-typed
//! `Reflection` tagged-union records").
//!
//! This module's own reflector is a small line-oriented WGSL binding-decl
//! scanner, not a full naga front end: it understands exactly the
//! `@group(N) @binding(M) var<...> name: Type;` declaration shape that the
//! rest of the engine's shaders are written in. A shader using any other
//! declaration shape silently contributes no bindings, which surfaces later
//! as a [`crate::errors::EngineError::MissingPassInput`] when the pass tries
//! to bind something the reflector never saw.

use std::collections::BTreeMap;

/// What kind of resource a binding refers to.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ResourceType {
    Uniform,
    Storage,
    Texture,
    StorageTexture,
    Sampler,
}

/// Read/write access mode, relevant for `storage`/`storage_texture` bindings.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum BindingAccess {
    Read,
    Write,
    ReadWrite,
}

/// One `@group(N) @binding(M)` declaration.
#[derive(Clone, Debug)]
pub struct BindingReflection {
    pub binding: u32,
    pub name: String,
    pub kind: ResourceType,
    pub access: BindingAccess,
    /// The WGSL texture/view-dimension token, e.g. `texture_2d_array`, empty
    /// for non-texture bindings.
    pub view_dimension_token: String,
    pub visibility: wgpu::ShaderStages,
}

/// All bindings of a shader module, grouped by `@group` index.
#[derive(Clone, Debug, Default)]
pub struct ShaderReflection {
    pub groups: BTreeMap<u32, Vec<BindingReflection>>,
}

impl ShaderReflection {
    #[must_use]
    pub fn bindings_in_group(&self, group: u32) -> &[BindingReflection] {
        self.groups.get(&group).map_or(&[], Vec::as_slice)
    }

    #[must_use]
    pub fn max_group(&self) -> Option<u32> {
        self.groups.keys().next_back().copied()
    }
}

/// Reflects `@group(N) @binding(M) var<space> name: Type;` declarations out
/// of resolved WGSL source. `@vertex`/`@fragment`/`@compute` entry points
/// preceding a binding's enclosing scope are not tracked; visibility is
/// conservatively set to `VERTEX_FRAGMENT | COMPUTE` since this reflector
/// doesn't track which entry point a binding is reachable from.
#[must_use]
pub fn reflect(source: &str) -> ShaderReflection {
    let mut reflection = ShaderReflection::default();

    for line in source.lines() {
        let trimmed = line.trim();
        if !trimmed.starts_with('@') {
            continue;
        }
        let Some((group, binding, rest)) = parse_group_binding(trimmed) else {
            continue;
        };
        let Some(decl) = parse_var_decl(rest) else {
            continue;
        };

        reflection
            .groups
            .entry(group)
            .or_default()
            .push(BindingReflection {
                binding,
                name: decl.name,
                kind: decl.kind,
                access: decl.access,
                view_dimension_token: decl.view_dimension_token,
                visibility: wgpu::ShaderStages::VERTEX_FRAGMENT | wgpu::ShaderStages::COMPUTE,
            });
    }

    reflection
}

fn parse_group_binding(line: &str) -> Option<(u32, u32, &str)> {
    let group_start = line.find("@group(")? + "@group(".len();
    let group_end = line[group_start..].find(')')? + group_start;
    let group: u32 = line[group_start..group_end].trim().parse().ok()?;

    let rest = &line[group_end..];
    let binding_start = rest.find("@binding(")? + "@binding(".len();
    let binding_end = rest[binding_start..].find(')')? + binding_start;
    let binding: u32 = rest[binding_start..binding_end].trim().parse().ok()?;

    let decl_start = binding_end + rest[binding_end..].find("var").unwrap_or(0);
    Some((group, binding, &rest[decl_start..]))
}

struct VarDecl {
    name: String,
    kind: ResourceType,
    access: BindingAccess,
    view_dimension_token: String,
}

fn parse_var_decl(rest: &str) -> Option<VarDecl> {
    let var_pos = rest.find("var")?;
    let after_var = &rest[var_pos + 3..];

    let (address_space, after_space) = if let Some(stripped) = after_var.trim_start().strip_prefix('<') {
        let close = stripped.find('>')?;
        (Some(stripped[..close].to_string()), &stripped[close + 1..])
    } else {
        (None, after_var)
    };

    let colon = after_space.find(':')?;
    let name = after_space[..colon].trim().trim_start_matches(',').trim().to_string();
    let type_part = after_space[colon + 1..].trim().trim_end_matches(';').trim();

    let (kind, access, view_dimension_token) = classify_type(type_part, address_space.as_deref());

    Some(VarDecl {
        name,
        kind,
        access,
        view_dimension_token,
    })
}

fn classify_type(type_part: &str, address_space: Option<&str>) -> (ResourceType, BindingAccess, String) {
    if type_part.starts_with("sampler") {
        return (ResourceType::Sampler, BindingAccess::Read, String::new());
    }
    if type_part.starts_with("texture_storage") {
        let access = match address_space {
            Some(s) if s.contains("read_write") => BindingAccess::ReadWrite,
            Some(s) if s.contains("write") => BindingAccess::Write,
            _ => BindingAccess::Read,
        };
        let token = type_part.split(['<', ',']).next().unwrap_or(type_part).to_string();
        return (ResourceType::StorageTexture, access, token);
    }
    if type_part.starts_with("texture") {
        let token = type_part.split('<').next().unwrap_or(type_part).trim().to_string();
        return (ResourceType::Texture, BindingAccess::Read, token);
    }
    match address_space {
        Some(s) if s.starts_with("uniform") => (ResourceType::Uniform, BindingAccess::Read, String::new()),
        Some(s) if s.contains("read_write") => (ResourceType::Storage, BindingAccess::ReadWrite, String::new()),
        Some(s) if s.contains("storage") && s.contains("read") => {
            (ResourceType::Storage, BindingAccess::Read, String::new())
        }
        _ => (ResourceType::Storage, BindingAccess::Read, String::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reflects_uniform_binding() {
        let src = "@group(0) @binding(0) var<uniform> camera: CameraUniform;";
        let r = reflect(src);
        let b = &r.bindings_in_group(0)[0];
        assert_eq!(b.binding, 0);
        assert_eq!(b.kind, ResourceType::Uniform);
        assert_eq!(b.name, "camera");
    }

    #[test]
    fn reflects_storage_read_write_binding() {
        let src = "@group(1) @binding(2) var<storage, read_write> instances: array<Instance>;";
        let r = reflect(src);
        let b = &r.bindings_in_group(1)[0];
        assert_eq!(b.binding, 2);
        assert_eq!(b.kind, ResourceType::Storage);
        assert_eq!(b.access, BindingAccess::ReadWrite);
    }

    #[test]
    fn reflects_texture_2d_array_binding() {
        let src = "@group(2) @binding(0) var shadow_atlas: texture_2d_array<f32>;";
        let r = reflect(src);
        let b = &r.bindings_in_group(2)[0];
        assert_eq!(b.kind, ResourceType::Texture);
        assert_eq!(b.view_dimension_token, "texture_2d_array");
    }

    #[test]
    fn reflects_storage_texture_write_binding() {
        let src = "@group(0) @binding(5) var hzb_mip: texture_storage_2d<r32float, write>;";
        let r = reflect(src);
        let b = &r.bindings_in_group(0)[0];
        assert_eq!(b.kind, ResourceType::StorageTexture);
        assert_eq!(b.access, BindingAccess::Write);
    }

    #[test]
    fn reflects_sampler_binding() {
        let src = "@group(0) @binding(1) var linear_sampler: sampler;";
        let r = reflect(src);
        let b = &r.bindings_in_group(0)[0];
        assert_eq!(b.kind, ResourceType::Sampler);
    }

    #[test]
    fn groups_are_independent() {
        let src = "\
@group(0) @binding(0) var<uniform> a: A;
@group(1) @binding(0) var<uniform> b: B;
@group(1) @binding(1) var<storage> c: array<u32>;
";
        let r = reflect(src);
        assert_eq!(r.bindings_in_group(0).len(), 1);
        assert_eq!(r.bindings_in_group(1).len(), 2);
        assert_eq!(r.max_group(), Some(1));
    }

    #[test]
    fn non_binding_lines_are_ignored() {
        let src = "fn vs_main() -> @builtin(position) vec4<f32> { return vec4(0.0); }";
        let r = reflect(src);
        assert!(r.groups.is_empty());
    }
}
