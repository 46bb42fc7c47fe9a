use crate::command::CommandList;

use super::TextureId;

/// Usage state of a GPU resource.
///
/// A resource may only be used in the state its use requires; moving between
/// states is an explicit transition recorded into a command list.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum ResourceState {
    Common,
    RenderTarget,
    ShaderRead,
    DepthWrite,
    UnorderedAccess,
    Present,
}

/// A texture handle paired with the state the recorded commands leave it in.
///
/// The tracked state is the state at the *end* of everything recorded so far,
/// which is also the state the GPU will see once those lists execute.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct TrackedTexture {
    id: TextureId,
    state: ResourceState,
}

impl TrackedTexture {
    pub fn new(id: TextureId, state: ResourceState) -> Self {
        Self { id, state }
    }

    pub fn id(&self) -> TextureId {
        self.id
    }

    pub fn state(&self) -> ResourceState {
        self.state
    }

    /// Records a transition into `to`. Nothing is recorded when the texture
    /// is already there.
    ///
    /// Returns whether a barrier was emitted.
    pub fn transition_to(&mut self, list: &mut CommandList, to: ResourceState) -> bool {
        if self.state == to {
            return false;
        }
        list.transition(self.id, self.state, to);
        self.state = to;
        true
    }

    /// Records an unordered-access barrier between dependent compute writes.
    pub fn uav_barrier(&self, list: &mut CommandList) {
        assert_eq!(
            self.state,
            ResourceState::UnorderedAccess,
            "uav barrier on a texture that is not in unordered access"
        );
        list.uav_barrier(self.id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::Command;
    use crate::resource::arena::Handle;

    fn tex() -> TrackedTexture {
        TrackedTexture::new(TextureId::from_raw(3), ResourceState::ShaderRead)
    }

    #[test]
    fn transition_emits_barrier_only_when_state_differs() {
        let mut list = CommandList::new("test");
        let mut t = tex();

        assert!(!t.transition_to(&mut list, ResourceState::ShaderRead));
        assert!(list.commands().is_empty());

        assert!(t.transition_to(&mut list, ResourceState::RenderTarget));
        assert!(!t.transition_to(&mut list, ResourceState::RenderTarget));
        assert!(t.transition_to(&mut list, ResourceState::ShaderRead));

        let transitions: Vec<_> = list
            .commands()
            .iter()
            .map(|c| match c {
                Command::Transition { from, to, .. } => (*from, *to),
                other => panic!("unexpected command {other:?}"),
            })
            .collect();
        assert_eq!(
            transitions,
            [
                (ResourceState::ShaderRead, ResourceState::RenderTarget),
                (ResourceState::RenderTarget, ResourceState::ShaderRead),
            ]
        );
        assert_eq!(t.state(), ResourceState::ShaderRead);
    }

    #[test]
    #[should_panic(expected = "not in unordered access")]
    fn uav_barrier_requires_unordered_access() {
        let mut list = CommandList::new("test");
        tex().uav_barrier(&mut list);
    }
}
