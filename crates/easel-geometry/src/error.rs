//! Errors reported for tessellation contract violations.

/// Errors produced when a tessellation request violates its contract.
///
/// These are programmer errors, fatal for the offending call and surfaced
/// immediately. Geometry problems inside the sweep tessellator (degenerate or
/// self-intersecting input it cannot resolve) are not represented here; they
/// are reported as warnings and leave the affected fill incomplete.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GeometryError {
    /// An explicit triangle index referenced a vertex outside the input range.
    IndexOutOfRange { index: u32, vertex_count: usize },
    /// An explicit index list does not describe whole triangles.
    PartialTriangle { index_count: usize },
    /// A curve vertex was appended before any starting vertex existed.
    NoCurrentVertex { operation: &'static str },
}

impl std::fmt::Display for GeometryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::IndexOutOfRange {
                index,
                vertex_count,
            } => write!(
                f,
                "Vertex index {} is out of range for {} input vertices",
                index, vertex_count
            ),
            Self::PartialTriangle { index_count } => write!(
                f,
                "Index list length {} is not a multiple of three",
                index_count
            ),
            Self::NoCurrentVertex { operation } => {
                write!(f, "{} requires a preceding vertex", operation)
            }
        }
    }
}

impl std::error::Error for GeometryError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_messages() {
        let err = GeometryError::IndexOutOfRange {
            index: 9,
            vertex_count: 4,
        };
        assert!(err.to_string().contains("out of range"));

        let err = GeometryError::PartialTriangle { index_count: 4 };
        assert!(err.to_string().contains("multiple of three"));
    }
}
