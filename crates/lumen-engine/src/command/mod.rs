//! Command recording and validation.

mod list;
mod validate;

pub use list::{ColorAttachment, Command, CommandList, DepthAttachment, ScissorRect, Viewport};
pub use validate::StateValidator;
