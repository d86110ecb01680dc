//! Helpers shared by the integration tests.
#![allow(dead_code)]

use std::path::{Path, PathBuf};

use mockloader::{
    classfile::{class_resource_path, ClassFileBuilder},
    loader::{ClassLoader, ClassRef, LoaderId},
    resource::{ResourceIter, ResourceUrl},
    Error, Result,
};

/// Writes a minimal public class under a class path root.
pub fn write_class(root: &Path, class_name: &str) -> Vec<u8> {
    let path = root.join(class_resource_path(class_name));
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    let bytes = ClassFileBuilder::new(class_name).build();
    std::fs::write(&path, &bytes).unwrap();
    bytes
}

/// Writes a resource file under a root, creating parent directories.
pub fn write_resource(root: &Path, path: &str, contents: &[u8]) -> PathBuf {
    let full = root.join(path);
    std::fs::create_dir_all(full.parent().unwrap()).unwrap();
    std::fs::write(&full, contents).unwrap();
    full
}

/// Loader that knows no classes and serves resources from `<root>/<prefix><path>`.
///
/// Installed as a mock loader's deferred loader it exposes resources the mock loader's own
/// class path does not hold, under a different search root.
pub struct ResourcePrefixLoader {
    id: LoaderId,
    root: PathBuf,
    prefix: String,
}

impl ResourcePrefixLoader {
    pub fn new(root: &Path, prefix: &str) -> Self {
        ResourcePrefixLoader {
            id: LoaderId::next(),
            root: root.to_path_buf(),
            prefix: prefix.to_string(),
        }
    }
}

impl ClassLoader for ResourcePrefixLoader {
    fn id(&self) -> LoaderId {
        self.id
    }

    fn load_class(&self, class_name: &str) -> Result<ClassRef> {
        Err(Error::ClassNotFound(class_name.to_string()))
    }

    fn resource(&self, path: &str) -> Option<ResourceUrl> {
        ResourceUrl::file(&self.root.join(format!("{}{}", self.prefix, path)))
    }

    fn resources(&self, path: &str) -> ResourceIter<'_> {
        Box::new(self.resource(path).into_iter())
    }
}
