//! Dynamic Diffuse Global Illumination probe volume (spec §4.11).

use glam::{Quat, Vec3};

use crate::graph::graph::RenderGraph;
use crate::graph::pass::PassFlags;
use crate::name::Name;

/// The six cubemap face directions a probe renders into, in atlas-layer
/// order.
pub const FACE_DIRECTIONS: [Vec3; 6] = [
    Vec3::new(1.0, 0.0, 0.0),
    Vec3::new(-1.0, 0.0, 0.0),
    Vec3::new(0.0, 1.0, 0.0),
    Vec3::new(0.0, -1.0, 0.0),
    Vec3::new(0.0, 0.0, 1.0),
    Vec3::new(0.0, 0.0, -1.0),
];

/// Resolution (in texels) of one cubemap-face render target per probe.
pub const PROBE_FACE_RESOLUTION: u32 = 16;

/// `gi_params` uniform contents written once per probe before its six faces
/// are rendered: probe world position, spacing, grid dims, linear index.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GiParams {
    pub probe_world_pos: Vec3,
    pub spacing: f32,
    pub dims: [u32; 3],
    pub probe_index: u32,
}

/// Grid placement and update-cursor state for one DDGI probe volume.
pub struct DdgiVolume {
    pub origin: Vec3,
    pub dims: (u32, u32, u32),
    pub spacing: f32,
    pub probes_per_frame: u32,
    pub blend_factor: f32,
    current_probe_index: u32,
}

impl DdgiVolume {
    #[must_use]
    pub fn new(origin: Vec3, dims: (u32, u32, u32), spacing: f32, probes_per_frame: u32, blend_factor: f32) -> Self {
        Self {
            origin,
            dims,
            spacing,
            probes_per_frame,
            blend_factor,
            current_probe_index: 0,
        }
    }

    #[must_use]
    pub const fn probe_count(&self) -> u32 {
        self.dims.0 * self.dims.1 * self.dims.2
    }

    /// View-handle count needed for the current grid: `probe_count × 6`.
    /// Per spec, initially allocated as `probes_per_frame × 6` and resized
    /// (discarding old views first) only when dims change.
    #[must_use]
    pub fn required_view_count(&self) -> u32 {
        self.probe_count() * 6
    }

    #[must_use]
    pub const fn current_probe_index(&self) -> u32 {
        self.current_probe_index
    }

    /// World position of probe `index` on the regular grid.
    #[must_use]
    pub fn probe_world_position(&self, index: u32) -> Vec3 {
        let (nx, ny, _nz) = self.dims;
        let x = index % nx;
        let y = (index / nx) % ny;
        let z = index / (nx * ny);
        self.origin + Vec3::new(x as f32, y as f32, z as f32) * self.spacing
    }

    /// Returns the `probes_per_frame` probe indices to update this frame and
    /// advances the monotone cursor modulo `probe_count` (spec §4.11:
    /// "`current_probe_index` (monotone cursor modulo `probe_count`)").
    pub fn advance(&mut self) -> Vec<u32> {
        let count = self.probe_count().max(1);
        let n = self.probes_per_frame.min(count);
        let indices: Vec<u32> = (0..n).map(|i| (self.current_probe_index + i) % count).collect();
        self.current_probe_index = (self.current_probe_index + n) % count;
        indices
    }

    /// Registers this frame's probe-update passes: per probe, a
    /// `gi_params` write plus six `ddgi_raster_{i}_face_{f}` graphics passes
    /// and one `ddgi_accum_{i}` compute convolution pass (spec §4.11).
    pub fn compile_passes(&mut self, graph: &mut RenderGraph) {
        let irradiance = Name::new("ddgi_irradiance_volume");
        let depth_volume = Name::new("ddgi_depth_volume");
        let cubemap = Name::new("ddgi_probe_cubemap");

        for probe_index in self.advance() {
            for face in 0..6u32 {
                let pass_name = Name::new(&format!("ddgi_raster_{probe_index}_face_{face}"));
                graph.add_pass(pass_name, PassFlags::GRAPHICS | PassFlags::GRAPH_LOCAL, &[], &[cubemap]);
            }
            let accum_pass = Name::new(&format!("ddgi_accum_{probe_index}"));
            graph.add_pass(accum_pass, PassFlags::COMPUTE, &[cubemap], &[irradiance, depth_volume]);
        }
    }

    /// The rotation that orients a probe view's local `+Z` towards
    /// `face_dir`, used to point each of the six render targets (spec
    /// §4.11: "`rotationTo([0,0,1], face_dir)`").
    #[must_use]
    pub fn face_rotation(face_dir: Vec3) -> Quat {
        Quat::from_rotation_arc(Vec3::Z, face_dir)
    }
}
