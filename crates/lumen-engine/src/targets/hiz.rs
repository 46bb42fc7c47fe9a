use crate::backend::{Backend, Binding, StorageAccess, TableDesc, TextureView};
use crate::command::CommandList;
use crate::error::GpuResult;
use crate::resource::{
    Format, PipelineId, ResourceState, TableId, TextureDesc, TextureId, TextureUsage,
    TrackedTexture,
};

/// Threads per workgroup along each axis of the Hi-Z shaders.
pub const HIZ_GROUP_SIZE: u32 = 8;

/// Number of mips down to 1x1: one plus the number of halvings.
pub fn mip_count(width: u32, height: u32) -> u32 {
    let (mut w, mut h, mut levels) = (width.max(1), height.max(1), 1);
    while w > 1 || h > 1 {
        w = (w / 2).max(1);
        h = (h / 2).max(1);
        levels += 1;
    }
    levels
}

/// Size of mip `mip` of a `width` x `height` texture.
pub fn mip_extent(width: u32, height: u32, mip: u32) -> (u32, u32) {
    ((width >> mip).max(1), (height >> mip).max(1))
}

/// Workgroups covering a `width` x `height` mip.
pub fn dispatch_size(width: u32, height: u32) -> (u32, u32) {
    (width.div_ceil(HIZ_GROUP_SIZE), height.div_ceil(HIZ_GROUP_SIZE))
}

/// Hierarchical depth pyramid (R32Float, full mip chain).
///
/// Mip 0 is copied from the depth buffer, every further mip reduces the one
/// above it. Each mip has its own binding table.
#[derive(Debug)]
pub struct HiZ {
    width: u32,
    height: u32,
    mips: u32,
    texture: TrackedTexture,
    /// `tables[0]` reads depth; `tables[i]` reads mip `i - 1`. Both write mip `i`.
    tables: Vec<TableId>,
}

impl HiZ {
    pub fn new<B: Backend + ?Sized>(
        backend: &mut B,
        width: u32,
        height: u32,
        depth: TextureId,
    ) -> GpuResult<Self> {
        let mips = mip_count(width, height);
        let id = backend.create_texture(
            &TextureDesc::d2(
                "hi-z",
                Format::R32Float,
                width,
                height,
                TextureUsage::STORAGE | TextureUsage::SAMPLED,
                ResourceState::ShaderRead,
            )
            .with_mips(mips),
        )?;

        let mut tables = Vec::with_capacity(mips as usize);
        for mip in 0..mips {
            let source = if mip == 0 {
                Binding::Texture {
                    texture: depth,
                    view: TextureView::Depth,
                }
            } else {
                Binding::StorageTexture {
                    texture: id,
                    format: Format::R32Float,
                    mip: mip - 1,
                    access: StorageAccess::Read,
                }
            };
            tables.push(backend.create_table(&TableDesc {
                label: format!("hi-z mip {mip}"),
                entries: vec![
                    source,
                    Binding::StorageTexture {
                        texture: id,
                        format: Format::R32Float,
                        mip,
                        access: StorageAccess::Write,
                    },
                ],
            })?);
        }

        log::debug!("hi-z: {width}x{height}, {mips} mips");
        Ok(Self {
            width,
            height,
            mips,
            texture: TrackedTexture::new(id, ResourceState::ShaderRead),
            tables,
        })
    }

    pub fn mips(&self) -> u32 {
        self.mips
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn texture(&self) -> &TrackedTexture {
        &self.texture
    }

    /// Rebuilds the pyramid for a new depth buffer size. Returns `false` and
    /// keeps everything when the size is unchanged.
    pub fn on_resize<B: Backend + ?Sized>(
        &mut self,
        backend: &mut B,
        width: u32,
        height: u32,
        depth: TextureId,
    ) -> GpuResult<bool> {
        if (self.width, self.height) == (width, height) {
            return Ok(false);
        }
        let rebuilt = Self::new(backend, width, height, depth)?;
        std::mem::replace(self, rebuilt).release(backend);
        Ok(true)
    }

    /// Records mip generation. `depth` must hold the finished frame depth; it
    /// is left in `ShaderRead`.
    pub fn record(
        &mut self,
        list: &mut CommandList,
        depth: &mut TrackedTexture,
        first_mip: PipelineId,
        reduce: PipelineId,
    ) {
        depth.transition_to(list, ResourceState::ShaderRead);
        self.texture.transition_to(list, ResourceState::UnorderedAccess);

        list.begin_compute_pass("hi-z");
        for mip in 0..self.mips {
            list.set_pipeline(if mip == 0 { first_mip } else { reduce });
            list.set_table(0, self.tables[mip as usize], None);
            let (w, h) = mip_extent(self.width, self.height, mip);
            let (x, y) = dispatch_size(w, h);
            list.dispatch(x, y, 1);
            self.texture.uav_barrier(list);
        }
        list.end_compute_pass();

        self.texture.transition_to(list, ResourceState::ShaderRead);
    }

    fn release<B: Backend + ?Sized>(self, backend: &mut B) {
        for table in self.tables {
            backend.destroy_table(table);
        }
        backend.destroy_texture(self.texture.id());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{Completion, HeadlessBackend};
    use crate::command::Command;
    use crate::resource::Handle;

    #[test]
    fn mip_counts() {
        assert_eq!(mip_count(1920, 1080), 11);
        assert_eq!(mip_count(256, 256), 9);
        assert_eq!(mip_count(1, 1), 1);
        assert_eq!(mip_count(1, 4), 3);
    }

    #[test]
    fn dispatch_rounds_up_to_whole_groups() {
        assert_eq!(dispatch_size(1920, 1080), (240, 135));
        assert_eq!(dispatch_size(9, 1), (2, 1));
        assert_eq!(mip_extent(1920, 1080, 10), (1, 1));
    }

    #[test]
    fn records_one_dispatch_and_barrier_per_mip() {
        let mut backend = HeadlessBackend::new(16, 8, Completion::Immediate);
        let depth_id = backend
            .create_texture(&TextureDesc::d2(
                "depth",
                Format::Depth32Float,
                16,
                8,
                TextureUsage::DEPTH | TextureUsage::SAMPLED,
                ResourceState::DepthWrite,
            ))
            .unwrap();
        let mut depth = TrackedTexture::new(depth_id, ResourceState::DepthWrite);
        let mut hiz = HiZ::new(&mut backend, 16, 8, depth_id).unwrap();
        assert_eq!(hiz.mips(), 5);

        let mut list = CommandList::new("hi-z");
        let (p0, p1) = (PipelineId::from_raw(0), PipelineId::from_raw(1));
        hiz.record(&mut list, &mut depth, p0, p1);
        list.close();
        backend.execute(&list).unwrap();

        let dispatches: Vec<_> = list
            .commands()
            .iter()
            .filter_map(|c| match c {
                Command::Dispatch { x, y, .. } => Some((*x, *y)),
                _ => None,
            })
            .collect();
        assert_eq!(dispatches, [(2, 1), (1, 1), (1, 1), (1, 1), (1, 1)]);

        let barriers = list
            .commands()
            .iter()
            .filter(|c| matches!(c, Command::UavBarrier { .. }))
            .count();
        assert_eq!(barriers, 5);
        assert_eq!(backend.texture_state(hiz.texture().id()), Some(ResourceState::ShaderRead));
        assert_eq!(depth.state(), ResourceState::ShaderRead);
    }

    #[test]
    fn resize_rebuilds_tables_only_on_change() {
        let mut backend = HeadlessBackend::new(16, 8, Completion::Immediate);
        let depth = backend
            .create_texture(&TextureDesc::d2(
                "depth",
                Format::Depth32Float,
                16,
                8,
                TextureUsage::DEPTH | TextureUsage::SAMPLED,
                ResourceState::ShaderRead,
            ))
            .unwrap();
        let mut hiz = HiZ::new(&mut backend, 16, 8, depth).unwrap();
        let live = backend.live_textures();

        assert!(!hiz.on_resize(&mut backend, 16, 8, depth).unwrap());
        assert!(hiz.on_resize(&mut backend, 4, 4, depth).unwrap());
        assert_eq!(hiz.mips(), 3);
        assert_eq!(backend.live_textures(), live);
    }
}
