/// Response to a failed back-buffer acquire.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum SurfaceErrorAction {
    /// The surface must be reconfigured; skip this frame.
    Reconfigure,
    /// Transient error; skip the current frame.
    SkipFrame,
    /// Unrecoverable (commonly OOM).
    Fatal,
}
