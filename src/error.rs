//! Error types for pagination and markup splitting.

use core::fmt;

/// Structured error for pagination operations.
///
/// Construction failures are fatal: no partial paginator is usable.
/// Out-of-range navigation is deliberately not an error; navigation
/// methods return `bool` results instead.
#[derive(Clone, Debug, PartialEq)]
pub enum PageflowError {
    /// The backend could not resolve or attach its container/content
    /// surface.
    SurfaceUnavailable {
        /// Stable machine-readable code.
        code: &'static str,
        /// Human-readable message.
        message: Box<str>,
    },
    /// The container reported a zero or unmeasurable height at
    /// construction time.
    DegenerateViewport {
        /// Measured viewport height.
        height: f32,
    },
    /// Chapter markup could not be split into top-level blocks.
    Markup {
        /// Human-readable message.
        message: Box<str>,
        /// Byte offset into the source markup, where known.
        offset: Option<usize>,
    },
    /// A markup limit was exceeded during block splitting.
    LimitExceeded {
        /// Limit kind (e.g. `"max_blocks"`).
        kind: &'static str,
        /// Observed value.
        actual: usize,
        /// Configured limit.
        limit: usize,
    },
}

impl PageflowError {
    pub(crate) fn surface_unavailable(code: &'static str, message: impl Into<String>) -> Self {
        Self::SurfaceUnavailable {
            code,
            message: message.into().into_boxed_str(),
        }
    }

    pub(crate) fn markup(message: impl Into<String>, offset: Option<usize>) -> Self {
        Self::Markup {
            message: message.into().into_boxed_str(),
            offset,
        }
    }

    /// Build a surface-resolution error.
    ///
    /// Exposed for backend crates implementing [`crate::RenderSurface`].
    pub fn new_surface_unavailable(code: &'static str, message: impl Into<String>) -> Self {
        Self::surface_unavailable(code, message)
    }
}

impl fmt::Display for PageflowError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SurfaceUnavailable { code, message } => {
                write!(f, "surface unavailable: {}: {}", code, message)
            }
            Self::DegenerateViewport { height } => {
                write!(f, "degenerate viewport height: {}", height)
            }
            Self::Markup { message, offset } => {
                write!(f, "markup split failed: {}", message)?;
                if let Some(offset) = offset {
                    write!(f, " [offset={}]", offset)?;
                }
                Ok(())
            }
            Self::LimitExceeded {
                kind,
                actual,
                limit,
            } => write!(
                f,
                "markup limit exceeded: {} (actual={} limit={})",
                kind, actual, limit
            ),
        }
    }
}

impl std::error::Error for PageflowError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_includes_offset() {
        let err = PageflowError::markup("unexpected end tag", Some(42));
        assert_eq!(
            err.to_string(),
            "markup split failed: unexpected end tag [offset=42]"
        );
    }

    #[test]
    fn test_display_limit_shape() {
        let err = PageflowError::LimitExceeded {
            kind: "max_blocks",
            actual: 5000,
            limit: 4096,
        };
        assert_eq!(
            err.to_string(),
            "markup limit exceeded: max_blocks (actual=5000 limit=4096)"
        );
    }
}
