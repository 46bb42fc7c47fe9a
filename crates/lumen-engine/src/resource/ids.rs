//! Typed resource handles.
//!
//! Handles are plain indices into a backend-owned [`Arena`](super::Arena).
//! They carry no lifetime; using a handle after its resource was destroyed is
//! caught by the backend lookup.

macro_rules! define_handle {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, PartialOrd, Ord)]
        pub struct $name(u32);

        impl super::arena::Handle for $name {
            fn from_raw(raw: u32) -> Self {
                Self(raw)
            }

            fn raw(self) -> u32 {
                self.0
            }
        }
    };
}

define_handle!(
    /// Texture (render target, depth buffer, sampled image, back buffer).
    TextureId
);
define_handle!(
    /// Linear GPU buffer.
    BufferId
);
define_handle!(
    /// Vertex + index buffer pair.
    MeshId
);
define_handle!(
    /// Render or compute pipeline.
    PipelineId
);
define_handle!(
    /// Binding table: an ordered set of buffers, textures and samplers bound
    /// together as one group.
    TableId
);
