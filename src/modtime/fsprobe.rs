use std::os::unix::fs::MetadataExt;

use crate::error::MakeError;
use crate::symtab::ModTime;

/// Stat `path` and return its modification time, or `None` if it doesn't
/// exist. `std::os::unix::fs::MetadataExt` gives nanosecond resolution
/// directly, so no `chrono` dependency is needed here (see DESIGN.md
/// "Dependency drops").
pub fn stat_mtime(path: &str) -> Result<Option<ModTime>, MakeError> {
    match std::fs::metadata(path) {
        Ok(meta) => Ok(Some(ModTime {
            sec: meta.mtime(),
            nsec: meta.mtime_nsec(),
        })),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(MakeError::CantOpen(path.to_string(), e.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_is_none() {
        assert!(stat_mtime("/no/such/path/for/rumake/tests").unwrap().is_none());
    }

    #[test]
    fn existing_file_has_a_time() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("f");
        std::fs::write(&path, b"x").unwrap();
        let mtime = stat_mtime(path.to_str().unwrap()).unwrap();
        assert!(mtime.is_some());
    }
}
