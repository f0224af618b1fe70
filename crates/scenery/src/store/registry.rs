use crate::graph::PassParam;

use super::handle::{Handle, ResourceKind};
use super::table::{StoreError, Table};

/// Types that live in a [`Store`] table.
pub trait Stored: Sized {
    const KIND: ResourceKind;

    fn table(store: &Store) -> &Table<Self>;
    fn table_mut(store: &mut Store) -> &mut Table<Self>;
}

macro_rules! stored {
    ($ty:ty, $field:ident, $kind:ident) => {
        impl Stored for $ty {
            const KIND: ResourceKind = ResourceKind::$kind;

            fn table(store: &Store) -> &Table<Self> {
                &store.$field
            }

            fn table_mut(store: &mut Store) -> &mut Table<Self> {
                &mut store.$field
            }
        }
    };
}

/// One table per resource kind.
pub struct Store {
    buffers: Table<wgpu::Buffer>,
    textures: Table<wgpu::Texture>,
    samplers: Table<wgpu::Sampler>,
    bind_groups: Table<wgpu::BindGroup>,
    bind_group_layouts: Table<wgpu::BindGroupLayout>,
    render_pipelines: Table<wgpu::RenderPipeline>,
    compute_pipelines: Table<wgpu::ComputePipeline>,
    color_target_states: Table<wgpu::ColorTargetState>,
    pass_params: Table<PassParam>,
}

stored!(wgpu::Buffer, buffers, Buffer);
stored!(wgpu::Texture, textures, Texture);
stored!(wgpu::Sampler, samplers, Sampler);
stored!(wgpu::BindGroup, bind_groups, BindGroup);
stored!(wgpu::BindGroupLayout, bind_group_layouts, BindGroupLayout);
stored!(wgpu::RenderPipeline, render_pipelines, RenderPipeline);
stored!(wgpu::ComputePipeline, compute_pipelines, ComputePipeline);
stored!(wgpu::ColorTargetState, color_target_states, ColorTargetState);
stored!(PassParam, pass_params, PassParam);

impl Store {
    pub fn new() -> Self {
        Self {
            buffers: Table::new(ResourceKind::Buffer),
            textures: Table::new(ResourceKind::Texture),
            samplers: Table::new(ResourceKind::Sampler),
            bind_groups: Table::new(ResourceKind::BindGroup),
            bind_group_layouts: Table::new(ResourceKind::BindGroupLayout),
            render_pipelines: Table::new(ResourceKind::RenderPipeline),
            compute_pipelines: Table::new(ResourceKind::ComputePipeline),
            color_target_states: Table::new(ResourceKind::ColorTargetState),
            pass_params: Table::new(ResourceKind::PassParam),
        }
    }

    pub fn register<T: Stored>(&mut self, obj: T) -> Handle<T> {
        let handle = T::table_mut(self).register(obj);
        log::trace!("store: registered {} #{}", T::KIND, handle.index());
        handle
    }

    pub fn declare<T: Stored>(&mut self) -> Handle<T> {
        T::table_mut(self).declare()
    }

    pub fn materialize<T: Stored>(&mut self, handle: Handle<T>, obj: T) -> Result<(), StoreError> {
        T::table_mut(self).materialize(handle, obj)
    }

    pub fn get<T: Stored>(&self, handle: Handle<T>) -> Result<&T, StoreError> {
        T::table(self).get(handle)
    }

    pub fn get_mut<T: Stored>(&mut self, handle: Handle<T>) -> Result<&mut T, StoreError> {
        T::table_mut(self).get_mut(handle)
    }

    pub fn update<T: Stored>(&mut self, handle: Handle<T>, obj: T) -> Result<(), StoreError> {
        T::table_mut(self).update(handle, obj)
    }

    pub fn len<T: Stored>(&self) -> usize {
        T::table(self).len()
    }

    pub fn table<T: Stored>(&self) -> &Table<T> {
        T::table(self)
    }
}

impl Default for Store {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{ComputeCommand, RenderCommand};

    #[test]
    fn tables_are_independent_per_kind() {
        let mut store = Store::new();
        let r = store.register(PassParam::Render(vec![RenderCommand::Draw {
            vertices: 0..3,
            instances: 0..1,
        }]));
        let c = store.register(PassParam::Compute(vec![ComputeCommand::DispatchWorkgroups {
            x: 1,
            y: 1,
            z: 1,
        }]));

        assert_eq!((r.index(), c.index()), (0, 1));
        assert_eq!(store.len::<PassParam>(), 2);
        assert_eq!(store.len::<wgpu::Buffer>(), 0);
        assert!(store.get(r).unwrap().is_render());
        assert!(!store.get(c).unwrap().is_render());
    }

    #[test]
    fn unknown_buffer_is_typed_not_found() {
        let store = Store::new();
        let err = store.get::<wgpu::Buffer>(Handle::new(2)).unwrap_err();
        assert_eq!(
            err,
            StoreError::NotFound {
                kind: ResourceKind::Buffer,
                index: 2,
                len: 0
            }
        );
    }

    #[test]
    fn declared_pass_param_can_be_filled_later() {
        let mut store = Store::new();
        let h: Handle<PassParam> = store.declare();
        assert!(matches!(store.get(h), Err(StoreError::Pending { .. })));
        store.materialize(h, PassParam::Render(Vec::new())).unwrap();
        assert!(store.get(h).unwrap().is_empty());
    }
}
