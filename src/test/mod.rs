//! Shared helpers for unit tests.

use std::{
    path::Path,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Mutex,
    },
};

use crate::{
    classfile::{class_resource_path, AccessFlags, ClassFile, ClassFileBuilder},
    transform::{ClassTransformer, TransformContext},
    Result,
};

/// Writes a minimal class `class_name` extending `super_name` under a class path root.
pub fn write_class(root: &Path, class_name: &str, super_name: &str) {
    let path = root.join(class_resource_path(class_name));
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    let bytes = ClassFileBuilder::new(class_name)
        .super_class(super_name)
        .build();
    std::fs::write(path, bytes).unwrap();
}

/// Appends `<name>:<class>` to a shared log for every class it sees, with a `:suppress`
/// suffix when the static initializer is to be suppressed.
pub struct RecordingTransformer {
    name: &'static str,
    log: Arc<Mutex<Vec<String>>>,
}

impl RecordingTransformer {
    pub fn new(name: &'static str, log: Arc<Mutex<Vec<String>>>) -> Self {
        RecordingTransformer { name, log }
    }
}

impl ClassTransformer for RecordingTransformer {
    fn name(&self) -> &'static str {
        self.name
    }

    fn transform(&self, class: ClassFile, ctx: &TransformContext) -> Result<ClassFile> {
        let mut entry = format!("{}:{}", self.name, ctx.class_name());
        if ctx.suppress_static_initializer() {
            entry.push_str(":suppress");
        }
        self.log.lock().unwrap().push(entry);
        Ok(class)
    }
}

/// Counts invocations.
#[derive(Default)]
pub struct CountingTransformer {
    count: AtomicUsize,
}

impl CountingTransformer {
    pub fn count(&self) -> usize {
        self.count.load(Ordering::SeqCst)
    }
}

impl ClassTransformer for CountingTransformer {
    fn name(&self) -> &'static str {
        "counting"
    }

    fn transform(&self, class: ClassFile, _ctx: &TransformContext) -> Result<ClassFile> {
        self.count.fetch_add(1, Ordering::SeqCst);
        Ok(class)
    }
}

/// Rejects every class.
pub struct FailingTransformer;

impl ClassTransformer for FailingTransformer {
    fn name(&self) -> &'static str {
        "failing"
    }

    fn transform(&self, _class: ClassFile, ctx: &TransformContext) -> Result<ClassFile> {
        Err(malformed_error!("cannot rewrite {}", ctx.class_name()))
    }
}

/// Sets an access flag.
pub struct FlagTransformer {
    flag: AccessFlags,
}

impl FlagTransformer {
    pub fn new(flag: AccessFlags) -> Self {
        FlagTransformer { flag }
    }
}

impl ClassTransformer for FlagTransformer {
    fn name(&self) -> &'static str {
        "flag"
    }

    fn transform(&self, mut class: ClassFile, _ctx: &TransformContext) -> Result<ClassFile> {
        let flags = class.access_flags() | self.flag;
        class.set_access_flags(flags)?;
        Ok(class)
    }
}
