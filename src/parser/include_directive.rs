use crate::error::MakeError;

/// Split an `include`/`-include` directive's (already macro-expanded)
/// operand text into the list of file names to read, in order. Grounded
/// on `input.c`'s handling of the `include` keyword, which takes exactly
/// one file per the base spec but is generalized here to accept several
/// names on one line, matching common `make` extensions.
pub fn split_include_files(expanded: &str) -> Result<Vec<String>, MakeError> {
    let files: Vec<String> = expanded.split_whitespace().map(str::to_string).collect();
    if files.is_empty() {
        return Err(MakeError::NoIncludeFile);
    }
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_multiple_files() {
        assert_eq!(
            split_include_files("a.mk b.mk").unwrap(),
            vec!["a.mk".to_string(), "b.mk".to_string()]
        );
    }

    #[test]
    fn empty_is_an_error() {
        assert!(split_include_files("   ").is_err());
    }
}
