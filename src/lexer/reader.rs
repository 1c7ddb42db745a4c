use std::io::BufRead;

use crate::error::MakeError;

/// One logical (continuation-joined) line, with the physical line number
/// its first character started on.
#[derive(Debug, Clone)]
pub struct LogicalLine {
    pub text: String,
    pub line: u32,
    /// `true` if the line started with a tab: a command line when inside
    /// a rule body, per POSIX make's long-standing convention.
    pub tab_prefixed: bool,
}

/// Joins backslash-continued physical lines into logical ones, strips
/// trailing `\r` (so CRLF makefiles read the same as LF ones), and keeps
/// a running physical line counter for diagnostics.
pub struct LineReader<R> {
    inner: R,
    line_no: u32,
}

impl<R: BufRead> LineReader<R> {
    pub fn new(inner: R) -> Self {
        LineReader { inner, line_no: 0 }
    }

    fn read_physical(&mut self) -> Result<Option<String>, MakeError> {
        let mut buf = String::new();
        let n = self
            .inner
            .read_line(&mut buf)
            .map_err(|e| MakeError::Other(e.to_string()))?;
        if n == 0 {
            return Ok(None);
        }
        self.line_no += 1;
        if buf.ends_with('\n') {
            buf.pop();
        }
        if buf.ends_with('\r') {
            buf.pop();
        }
        Ok(Some(buf))
    }

    /// Read the next logical line, joining `\`-terminated physical lines.
    /// Returns `None` at end of input.
    pub fn next_logical_line(&mut self) -> Result<Option<LogicalLine>, MakeError> {
        let Some(first) = self.read_physical()? else {
            return Ok(None);
        };
        let start_line = self.line_no;
        let tab_prefixed = first.starts_with('\t');
        let mut text = first;

        while text.ends_with('\\') {
            let Some(cont) = self.read_physical()? else {
                break;
            };
            text.pop();
            text.push_str(&cont);
        }

        Ok(Some(LogicalLine {
            text,
            line: start_line,
            tab_prefixed,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn joins_backslash_continuations() {
        let src = "foo: bar \\\n    baz\nqux: quux\n";
        let mut r = LineReader::new(Cursor::new(src));
        let l1 = r.next_logical_line().unwrap().unwrap();
        assert_eq!(l1.text, "foo: bar     baz");
        assert_eq!(l1.line, 1);
        let l2 = r.next_logical_line().unwrap().unwrap();
        assert_eq!(l2.text, "qux: quux");
        assert_eq!(l2.line, 3);
        assert!(r.next_logical_line().unwrap().is_none());
    }

    #[test]
    fn strips_carriage_return() {
        let src = "all: foo\r\n";
        let mut r = LineReader::new(Cursor::new(src));
        let l = r.next_logical_line().unwrap().unwrap();
        assert_eq!(l.text, "all: foo");
    }

    #[test]
    fn tab_prefix_is_reported() {
        let src = "\techo hi\n";
        let mut r = LineReader::new(Cursor::new(src));
        let l = r.next_logical_line().unwrap().unwrap();
        assert!(l.tab_prefixed);
    }
}
