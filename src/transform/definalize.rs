use crate::{
    classfile::{AccessFlags, ClassFile},
    transform::{ClassTransformer, TransformContext},
    Result,
};

/// Clears `ACC_FINAL` on a class so that mock subclasses can extend it.
///
/// Interfaces and annotations are never final and are left alone, as are classes that are
/// not final to begin with.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefinalizeTransformer;

impl ClassTransformer for DefinalizeTransformer {
    fn name(&self) -> &'static str {
        "definalize"
    }

    fn should_transform(&self, class: &ClassFile, _ctx: &TransformContext) -> bool {
        let flags = class.access_flags();
        flags.contains(AccessFlags::FINAL) && !flags.contains(AccessFlags::INTERFACE)
    }

    fn transform(&self, mut class: ClassFile, _ctx: &TransformContext) -> Result<ClassFile> {
        let flags = class.access_flags() - AccessFlags::FINAL;
        class.set_access_flags(flags)?;
        Ok(class)
    }

    fn description(&self) -> &'static str {
        "Removes the final modifier from classes"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{classfile::ClassFileBuilder, loader::LoaderId};

    #[test]
    fn clears_final_only() {
        let bytes = ClassFileBuilder::new("a.Sealed")
            .access_flags(AccessFlags::PUBLIC | AccessFlags::FINAL | AccessFlags::SUPER)
            .build();
        let class = ClassFile::parse(bytes).unwrap();
        let ctx = TransformContext::new("a.Sealed", LoaderId::next(), false);

        assert!(DefinalizeTransformer.should_transform(&class, &ctx));
        let out = DefinalizeTransformer.transform(class, &ctx).unwrap();
        assert_eq!(out.access_flags(), AccessFlags::PUBLIC | AccessFlags::SUPER);

        let reparsed = ClassFile::parse(out.into_bytes()).unwrap();
        assert_eq!(reparsed.access_flags(), AccessFlags::PUBLIC | AccessFlags::SUPER);
    }

    #[test]
    fn skips_open_classes() {
        let class = ClassFile::parse(ClassFileBuilder::new("a.Open").build()).unwrap();
        let ctx = TransformContext::new("a.Open", LoaderId::next(), false);
        assert!(!DefinalizeTransformer.should_transform(&class, &ctx));
    }
}
