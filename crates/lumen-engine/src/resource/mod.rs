//! GPU resource handles, descriptors and state tracking.

mod arena;
mod desc;
mod ids;
mod state;

pub use arena::{Arena, Handle};
pub use desc::{BufferDesc, BufferUsage, Dimension, Format, TextureDesc, TextureUsage};
pub use ids::{BufferId, MeshId, PipelineId, TableId, TextureId};
pub use state::{ResourceState, TrackedTexture};
