//! Module handles: the result of a successful load.

use std::path::{Path, PathBuf};
use uuid::Uuid;

/// One resolved resource inside a module handle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceDescriptor {
    path: PathBuf,
}

impl ResourceDescriptor {
    /// Wrap a resolved path.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The name this resource is discovered under: relative to the script
    /// root when the resource lives below it, the full resolved path
    /// otherwise.
    pub fn display_name(&self, script_root: Option<&Path>) -> String {
        let relative = script_root.and_then(|root| self.path.strip_prefix(root).ok());
        match relative {
            Some(rel) => rel.to_string_lossy().into_owned(),
            None => self.path.to_string_lossy().into_owned(),
        }
    }
}

/// The opaque result of a successful load: an ordered collection of
/// resolved resource descriptors from one backend.
///
/// Handles are created atomically — a load that resolves nothing produces
/// no handle — and are immutable afterward. The caller that received a
/// handle owns it exclusively until passing it to `discover` or `clear`;
/// the owning vector releases the descriptors on every exit path.
#[derive(Debug)]
pub struct ModuleHandle {
    id: Uuid,
    tag: String,
    resources: Vec<ResourceDescriptor>,
}

impl ModuleHandle {
    /// Build a handle from resolved resources. Returns `None` when the
    /// collection is empty: an empty handle is an overall load failure,
    /// never a value.
    pub fn new(tag: impl Into<String>, resources: Vec<ResourceDescriptor>) -> Option<Self> {
        if resources.is_empty() {
            return None;
        }

        Some(Self {
            id: Uuid::new_v4(),
            tag: tag.into(),
            resources,
        })
    }

    /// Unique identity of this handle.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Tag of the backend that issued this handle; routing key for
    /// `discover` and `clear`.
    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn resources(&self) -> &[ResourceDescriptor] {
        &self.resources
    }

    pub fn resource_count(&self) -> usize {
        self.resources.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_handle_is_rejected() {
        assert!(ModuleHandle::new("file", vec![]).is_none());
    }

    #[test]
    fn test_handle_preserves_resource_order() {
        let handle = ModuleHandle::new(
            "file",
            vec![
                ResourceDescriptor::new("/srv/a.dat"),
                ResourceDescriptor::new("/srv/b.dat"),
            ],
        )
        .unwrap();

        assert_eq!(handle.tag(), "file");
        assert_eq!(handle.resource_count(), 2);
        assert_eq!(handle.resources()[0].path(), Path::new("/srv/a.dat"));
        assert_eq!(handle.resources()[1].path(), Path::new("/srv/b.dat"));
    }

    #[test]
    fn test_handles_have_distinct_ids() {
        let a = ModuleHandle::new("file", vec![ResourceDescriptor::new("/x")]).unwrap();
        let b = ModuleHandle::new("file", vec![ResourceDescriptor::new("/x")]).unwrap();
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn test_display_name_relative_to_script_root() {
        let descriptor = ResourceDescriptor::new("/srv/scripts/jobs/run.dat");

        assert_eq!(
            descriptor.display_name(Some(Path::new("/srv/scripts"))),
            "jobs/run.dat"
        );
        assert_eq!(
            descriptor.display_name(None),
            "/srv/scripts/jobs/run.dat"
        );
        // A root that is not a prefix falls back to the full path.
        assert_eq!(
            descriptor.display_name(Some(Path::new("/other"))),
            "/srv/scripts/jobs/run.dat"
        );
    }
}
