use derive_more::{Display, Error};
use crate::resource::ResourceId;
use crate::version::Version;

/// Structural errors found while building or linking a frame graph.
///
/// None of them is recoverable mid-construction: the frame's schedule should be dropped.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum FrameGraphError {
    #[display("dependency of pass [{to}] on pass [{from}] closes a cycle")]
    CycleDetected {
        from: String,
        to: String,
    },
    #[display("pass [{pass}] reads [{resource}] at {version}, but no pass produces that version")]
    UnresolvedResourceVersion {
        pass: String,
        resource: String,
        version: Version,
    },
    #[display("pass [{pass}] reads [{resource}] before any pass wrote it")]
    UnwrittenResourceRead {
        pass: String,
        resource: String,
    },
    #[display("pass [{pass}] uses resource {resource}, which was not declared in this graph")]
    UnknownResource {
        pass: String,
        resource: ResourceId,
    },
}

pub type Result<T, E = FrameGraphError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = FrameGraphError::CycleDetected {
            from: "lighting".to_owned(),
            to: "gbuffer".to_owned(),
        };
        assert_eq!(err.to_string(), "dependency of pass [gbuffer] on pass [lighting] closes a cycle");

        let err = FrameGraphError::UnresolvedResourceVersion {
            pass: "tonemap".to_owned(),
            resource: "hdr".to_owned(),
            version: Version::new(3),
        };
        assert_eq!(err.to_string(), "pass [tonemap] reads [hdr] at v3, but no pass produces that version");
    }

    #[test]
    fn converts_into_anyhow() {
        let err: anyhow::Error = FrameGraphError::UnknownResource {
            pass: "ui".to_owned(),
            resource: ResourceId(9),
        }.into();
        assert!(err.to_string().contains("#9"));
    }
}
