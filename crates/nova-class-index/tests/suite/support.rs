use std::sync::Once;

use nova_class_index::Name;
use nova_classfile::ClassFile;
use tracing_subscriber::EnvFilter;

/// Route `tracing` output to the test writer, filtered by `RUST_LOG`.
pub fn init_tracing() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

pub fn class(name: &str) -> ClassFile {
    ClassFile::new(name)
}

pub fn interface(name: &str) -> ClassFile {
    ClassFile::interface(name)
}

/// Dotted names, sorted, for order-insensitive comparisons.
pub fn sorted<'a>(names: impl IntoIterator<Item = &'a Name>) -> Vec<String> {
    let mut out: Vec<String> = names.into_iter().map(Name::to_dotted).collect();
    out.sort();
    out
}
