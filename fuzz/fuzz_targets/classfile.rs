#![no_main]

use libfuzzer_sys::fuzz_target;
use mockloader::classfile::{AccessFlags, ClassFile};

fuzz_target!(|data: &[u8]| {
    if let Ok(mut class) = ClassFile::from_slice(data) {
        let flags = class.access_flags() - AccessFlags::FINAL;
        let _ = class.set_access_flags(flags);
        let _ = ClassFile::parse(class.into_bytes());
    }
});
