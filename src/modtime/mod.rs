//! Modification-time probing for plain files and archive members.
//!
//! Grounded on `modtime.c`. See DESIGN.md "Modtime & archive probe (C6)".

mod archive;
mod fsprobe;

pub use archive::archive_member_mtime;
pub use fsprobe::stat_mtime;

use crate::error::MakeError;
use crate::symtab::ModTime;

/// If `name` is of the form `lib(member)`, split it. Otherwise return
/// `(name, None)`. Grounded on `modtime.c`'s `splitlib`.
pub fn splitlib(name: &str) -> Result<(String, Option<String>), MakeError> {
    let Some(open) = name.find('(') else {
        return Ok((name.to_string(), None));
    };
    if !name.ends_with(')') || open == 0 {
        return Err(MakeError::InvalidName(name.to_string()));
    }
    let lib = name[..open].to_string();
    let member = name[open + 1..name.len() - 1].to_string();
    if member.is_empty() {
        return Err(MakeError::InvalidName(name.to_string()));
    }
    Ok((lib, Some(member)))
}

/// Get the modification time of a target name, whether a plain file or
/// an `archive(member)` reference. Returns `ModTime::UNKNOWN` if the
/// file/member doesn't exist, matching `modtime.c`'s "set it to 0"
/// behavior (translated to our "unknown" sentinel).
pub fn probe(name: &str) -> Result<ModTime, MakeError> {
    let (base, member) = splitlib(name)?;
    match member {
        Some(member) => Ok(archive_member_mtime(&base, &member)?.unwrap_or(ModTime::UNKNOWN)),
        None => Ok(stat_mtime(&base)?.unwrap_or(ModTime::UNKNOWN)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splitlib_plain_name() {
        let (base, member) = splitlib("foo.o").unwrap();
        assert_eq!(base, "foo.o");
        assert!(member.is_none());
    }

    #[test]
    fn splitlib_archive_member() {
        let (base, member) = splitlib("lib.a(foo.o)").unwrap();
        assert_eq!(base, "lib.a");
        assert_eq!(member.as_deref(), Some("foo.o"));
    }

    #[test]
    fn splitlib_rejects_malformed() {
        assert!(splitlib("lib.a(foo.o").is_err());
    }
}
