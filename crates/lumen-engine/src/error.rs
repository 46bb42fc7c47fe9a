//! Structured GPU errors.
//!
//! Every failing device/queue call is fatal for the pipeline. The error keeps
//! enough context (code, operation, call site) for the top-level driver to
//! print a useful diagnostic before exiting.

use std::borrow::Cow;
use std::fmt;
use std::panic::Location;

/// Classification of a fatal GPU failure.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum ErrorCode {
    /// The device was removed or reset; all objects are invalid.
    DeviceLost,
    /// A resource allocation failed.
    OutOfMemory,
    /// The presentation surface can no longer be used.
    SurfaceLost,
    /// A command or resource violated the API contract.
    Validation,
    /// The adapter lacks a required capability.
    Unsupported,
    /// A bounded wait expired before the GPU reached the target.
    Timeout,
    /// Anything not covered above.
    Internal,
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorCode::DeviceLost => "device lost",
            ErrorCode::OutOfMemory => "out of memory",
            ErrorCode::SurfaceLost => "surface lost",
            ErrorCode::Validation => "validation error",
            ErrorCode::Unsupported => "unsupported",
            ErrorCode::Timeout => "timed out",
            ErrorCode::Internal => "internal error",
        };
        f.write_str(s)
    }
}

/// A fatal GPU error with its call site.
#[derive(Debug, Clone, thiserror::Error)]
pub struct GpuError {
    pub code: ErrorCode,
    pub operation: Cow<'static, str>,
    pub location: &'static Location<'static>,
    pub detail: Option<String>,
}

impl GpuError {
    /// Creates an error attributed to the caller's source location.
    #[track_caller]
    pub fn new(code: ErrorCode, operation: impl Into<Cow<'static, str>>) -> Self {
        Self {
            code,
            operation: operation.into(),
            location: Location::caller(),
            detail: None,
        }
    }

    /// Attaches a free-form detail message (usually the backend's own text).
    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    /// Returns true if the device must be torn down.
    pub fn is_device_lost(&self) -> bool {
        self.code == ErrorCode::DeviceLost
    }
}

impl fmt::Display for GpuError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} failed in {}; line {}; error: {}",
            self.operation,
            self.location.file(),
            self.location.line(),
            self.code
        )?;
        if let Some(detail) = &self.detail {
            write!(f, " ({detail})")?;
        }
        Ok(())
    }
}

pub type GpuResult<T> = std::result::Result<T, GpuError>;

/// Converts foreign errors into [`GpuError`] at the failing call site.
pub trait ResultExt<T> {
    fn gpu_context(self, code: ErrorCode, operation: &'static str) -> GpuResult<T>;
}

impl<T, E: fmt::Display> ResultExt<T> for std::result::Result<T, E> {
    #[track_caller]
    fn gpu_context(self, code: ErrorCode, operation: &'static str) -> GpuResult<T> {
        match self {
            Ok(v) => Ok(v),
            Err(e) => Err(GpuError::new(code, operation).with_detail(e.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_caller_location() {
        let line = line!() + 1;
        let err = GpuError::new(ErrorCode::OutOfMemory, "create_texture");
        assert_eq!(err.location.line(), line);
        assert!(err.location.file().ends_with("error.rs"));
    }

    #[test]
    fn display_names_operation_and_code() {
        let err = GpuError::new(ErrorCode::DeviceLost, "queue.submit").with_detail("removed");
        let text = err.to_string();
        assert!(text.starts_with("queue.submit failed in "));
        assert!(text.contains("device lost"));
        assert!(text.ends_with("(removed)"));
    }

    #[test]
    fn gpu_context_tracks_adapter_call_site() {
        let res: Result<(), &str> = Err("boom");
        let line = line!() + 1;
        let err = res.gpu_context(ErrorCode::Internal, "poll").unwrap_err();
        assert_eq!(err.location.line(), line);
        assert_eq!(err.detail.as_deref(), Some("boom"));
    }
}
