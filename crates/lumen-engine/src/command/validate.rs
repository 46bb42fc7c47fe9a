//! Replays command lists against tracked resource states.
//!
//! Backends feed every executed list through a [`StateValidator`]. It mirrors
//! what the GPU will see: textures start in their creation state and move
//! only through recorded transitions. Any use in the wrong state is reported
//! as an [`ErrorCode::Validation`] error naming the offending command.

use std::collections::HashMap;

use crate::backend::Binding;
use crate::error::{ErrorCode, GpuError, GpuResult};
use crate::resource::{ResourceState, TableId, TextureId};

use super::{Command, CommandList};

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
enum PassScope {
    None,
    Render,
    Compute,
}

#[derive(Debug, Default)]
pub struct StateValidator {
    textures: HashMap<TextureId, ResourceState>,
    /// Required state of every texture a table references.
    tables: HashMap<TableId, Vec<(TextureId, ResourceState)>>,
}

impl StateValidator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn track_texture(&mut self, id: TextureId, state: ResourceState) {
        self.textures.insert(id, state);
    }

    pub fn forget_texture(&mut self, id: TextureId) {
        self.textures.remove(&id);
    }

    pub fn track_table(&mut self, id: TableId, entries: &[Binding]) {
        let uses = entries
            .iter()
            .filter_map(|b| match *b {
                Binding::Texture { texture, .. } => Some((texture, ResourceState::ShaderRead)),
                Binding::StorageTexture { texture, .. } => {
                    Some((texture, ResourceState::UnorderedAccess))
                }
                _ => None,
            })
            .collect();
        self.tables.insert(id, uses);
    }

    pub fn forget_table(&mut self, id: TableId) {
        self.tables.remove(&id);
    }

    pub fn state(&self, id: TextureId) -> Option<ResourceState> {
        self.textures.get(&id).copied()
    }

    /// Checks that `texture` may be handed to the presentation engine.
    pub fn check_present(&self, texture: TextureId) -> GpuResult<()> {
        match self.state(texture) {
            Some(ResourceState::Present) => Ok(()),
            other => Err(GpuError::new(ErrorCode::Validation, "present")
                .with_detail(format!("{texture:?} is in {other:?}, expected Present"))),
        }
    }

    /// Validates `list` and applies its transitions to the tracked states.
    ///
    /// Transitions are staged while the list is checked and only committed
    /// when every command passes; a rejected list leaves states untouched.
    pub fn validate(&mut self, list: &CommandList) -> GpuResult<()> {
        if !list.is_closed() {
            return Err(GpuError::new(ErrorCode::Validation, "execute")
                .with_detail(format!("command list `{}` is still open", list.label())));
        }

        let mut scope = PassScope::None;
        let mut bound: HashMap<u32, TableId> = HashMap::new();
        let mut staged: HashMap<TextureId, ResourceState> = HashMap::new();

        for (index, cmd) in list.commands().iter().enumerate() {
            let fail = |msg: String| {
                GpuError::new(ErrorCode::Validation, "execute")
                    .with_detail(format!("`{}` #{index} {cmd:?}: {msg}", list.label()))
            };

            match cmd {
                Command::Transition { texture, from, to } => {
                    if scope != PassScope::None {
                        return Err(fail("transition inside a pass".into()));
                    }
                    if from == to {
                        return Err(fail("redundant transition".into()));
                    }
                    let current = self.current(&staged, *texture).map_err(fail)?;
                    if current != *from {
                        return Err(fail(format!("texture is in {current:?}")));
                    }
                    staged.insert(*texture, *to);
                }

                Command::UavBarrier { texture } => {
                    self.require(&staged, *texture, ResourceState::UnorderedAccess)
                        .map_err(fail)?;
                }

                Command::BeginRenderPass { color, depth, .. } => {
                    if scope != PassScope::None {
                        return Err(fail("nested pass".into()));
                    }
                    if let Some(color) = color {
                        self.require(&staged, color.texture, ResourceState::RenderTarget)
                            .map_err(fail)?;
                    }
                    if let Some(depth) = depth {
                        self.require(&staged, depth.texture, ResourceState::DepthWrite)
                            .map_err(fail)?;
                    }
                    scope = PassScope::Render;
                    bound.clear();
                }

                Command::BeginComputePass { .. } => {
                    if scope != PassScope::None {
                        return Err(fail("nested pass".into()));
                    }
                    scope = PassScope::Compute;
                    bound.clear();
                }

                Command::EndRenderPass => {
                    if scope != PassScope::Render {
                        return Err(fail("no render pass open".into()));
                    }
                    scope = PassScope::None;
                }

                Command::EndComputePass => {
                    if scope != PassScope::Compute {
                        return Err(fail("no compute pass open".into()));
                    }
                    scope = PassScope::None;
                }

                Command::SetViewport(_) | Command::SetScissor(_) => {
                    if scope != PassScope::Render {
                        return Err(fail("outside a render pass".into()));
                    }
                }

                Command::SetPipeline(_) => {
                    if scope == PassScope::None {
                        return Err(fail("outside a pass".into()));
                    }
                }

                Command::SetTable { group, table, .. } => {
                    if scope == PassScope::None {
                        return Err(fail("outside a pass".into()));
                    }
                    if !self.tables.contains_key(table) {
                        return Err(fail("unknown table".into()));
                    }
                    bound.insert(*group, *table);
                }

                Command::DrawIndexed { .. } | Command::Draw { .. } => {
                    if scope != PassScope::Render {
                        return Err(fail("draw outside a render pass".into()));
                    }
                    self.check_bound(&staged, &bound).map_err(fail)?;
                }

                Command::Dispatch { .. } => {
                    if scope != PassScope::Compute {
                        return Err(fail("dispatch outside a compute pass".into()));
                    }
                    self.check_bound(&staged, &bound).map_err(fail)?;
                }
            }
        }

        if scope != PassScope::None {
            return Err(GpuError::new(ErrorCode::Validation, "execute")
                .with_detail(format!("`{}` ends inside a pass", list.label())));
        }
        self.textures.extend(staged);
        Ok(())
    }

    fn current(
        &self,
        staged: &HashMap<TextureId, ResourceState>,
        texture: TextureId,
    ) -> Result<ResourceState, String> {
        staged
            .get(&texture)
            .copied()
            .or_else(|| self.state(texture))
            .ok_or_else(|| format!("unknown texture {texture:?}"))
    }

    fn require(
        &self,
        staged: &HashMap<TextureId, ResourceState>,
        texture: TextureId,
        required: ResourceState,
    ) -> Result<(), String> {
        let current = self.current(staged, texture)?;
        if current != required {
            return Err(format!(
                "{texture:?} is in {current:?}, expected {required:?}"
            ));
        }
        Ok(())
    }

    fn check_bound(
        &self,
        staged: &HashMap<TextureId, ResourceState>,
        bound: &HashMap<u32, TableId>,
    ) -> Result<(), String> {
        for table in bound.values() {
            let Some(uses) = self.tables.get(table) else {
                return Err(format!("{table:?} was destroyed"));
            };
            for &(texture, required) in uses {
                self.require(staged, texture, required)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::TextureView;
    use crate::command::ColorAttachment;
    use crate::resource::Handle;

    fn setup() -> (StateValidator, TextureId, TextureId, TableId) {
        let mut v = StateValidator::new();
        let target = TextureId::from_raw(0);
        let sampled = TextureId::from_raw(1);
        let table = TableId::from_raw(0);
        v.track_texture(target, ResourceState::ShaderRead);
        v.track_texture(sampled, ResourceState::ShaderRead);
        v.track_table(
            table,
            &[Binding::Texture {
                texture: sampled,
                view: TextureView::D2,
            }],
        );
        (v, target, sampled, table)
    }

    fn color(texture: TextureId) -> Option<ColorAttachment> {
        Some(ColorAttachment {
            texture,
            layer: 0,
            clear: None,
        })
    }

    #[test]
    fn accepts_correctly_transitioned_pass() {
        let (mut v, target, _, table) = setup();
        let mut list = CommandList::new("ok");
        list.transition(target, ResourceState::ShaderRead, ResourceState::RenderTarget);
        list.begin_render_pass("p", color(target), None);
        list.set_table(0, table, None);
        list.draw_fullscreen();
        list.end_render_pass();
        list.transition(target, ResourceState::RenderTarget, ResourceState::ShaderRead);
        list.close();

        v.validate(&list).unwrap();
        assert_eq!(v.state(target), Some(ResourceState::ShaderRead));
    }

    #[test]
    fn rejects_render_target_in_wrong_state() {
        let (mut v, target, _, _) = setup();
        let mut list = CommandList::new("bad");
        list.begin_render_pass("p", color(target), None);
        list.end_render_pass();
        list.close();

        let err = v.validate(&list).unwrap_err();
        assert_eq!(err.code, ErrorCode::Validation);
        assert!(err.detail.unwrap().contains("expected RenderTarget"));
    }

    #[test]
    fn rejects_sampling_a_texture_left_as_render_target() {
        let (mut v, target, sampled, table) = setup();
        let mut list = CommandList::new("bad");
        list.transition(sampled, ResourceState::ShaderRead, ResourceState::RenderTarget);
        list.transition(target, ResourceState::ShaderRead, ResourceState::RenderTarget);
        list.begin_render_pass("p", color(target), None);
        list.set_table(0, table, None);
        list.draw_fullscreen();
        list.end_render_pass();
        list.close();

        let err = v.validate(&list).unwrap_err();
        assert!(err.detail.unwrap().contains("expected ShaderRead"));
    }

    #[test]
    fn rejects_transition_with_stale_source_state() {
        let (mut v, target, _, _) = setup();
        let mut list = CommandList::new("bad");
        list.transition(target, ResourceState::Common, ResourceState::DepthWrite);
        list.close();

        assert!(v.validate(&list).is_err());
    }

    #[test]
    fn rejected_list_leaves_tracked_states_untouched() {
        let (mut v, target, _, _) = setup();
        let mut list = CommandList::new("bad");
        list.transition(target, ResourceState::ShaderRead, ResourceState::RenderTarget);
        list.draw_fullscreen();
        list.close();

        assert!(v.validate(&list).is_err());
        assert_eq!(v.state(target), Some(ResourceState::ShaderRead));
    }

    #[test]
    fn rejects_open_list() {
        let (mut v, ..) = setup();
        let list = CommandList::new("open");
        assert!(v.validate(&list).is_err());
    }

    #[test]
    fn present_requires_present_state() {
        let (mut v, target, _, _) = setup();
        assert!(v.check_present(target).is_err());

        let mut list = CommandList::new("present");
        list.transition(target, ResourceState::ShaderRead, ResourceState::Present);
        list.close();
        v.validate(&list).unwrap();
        v.check_present(target).unwrap();
    }
}
