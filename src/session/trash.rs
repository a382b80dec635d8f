use std::path::Path;

/// The one OS primitive the engine calls: move a path to the trash.
///
/// Failures carry the system's own message, which is surfaced verbatim.
pub trait Trasher: Send + Sync {
    fn trash(&self, path: &Path) -> Result<(), String>;
}

/// Desktop trash / recycle bin via the `trash` crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemTrash;

impl Trasher for SystemTrash {
    fn trash(&self, path: &Path) -> Result<(), String> {
        trash::delete(path).map_err(|err| err.to_string())
    }
}
