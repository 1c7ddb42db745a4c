use std::io::Read;

use crate::error::MakeError;
use crate::symtab::ModTime;

const HEADER_LEN: usize = 60;
const MAGIC: &[u8; 8] = b"!<arch>\n";

/// Search a SysV/GNU `ar` archive for `member` and return its
/// modification time, or `None` if the member isn't present. Grounded on
/// `modtime.c`'s `artime`/`arsearch`: 60-byte headers terminated by
/// `` `\n``, an optional `//` extended-filename table referenced by
/// `/<offset>` headers, and the `/ ` symbol-table-skip case. See
/// SPEC_FULL.md §3.
pub fn archive_member_mtime(archive: &str, member: &str) -> Result<Option<ModTime>, MakeError> {
    let mut file = match std::fs::File::open(archive) {
        Ok(f) => f,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(MakeError::CantOpen(archive.to_string(), e.to_string())),
    };

    let mut magic = [0u8; 8];
    if file.read_exact(&mut magic).is_err() || &magic != MAGIC {
        return Err(MakeError::NotAnArchive(archive.to_string()));
    }

    let mut names_table: Option<Vec<u8>> = None;
    let mut header = [0u8; HEADER_LEN];

    loop {
        match file.read_exact(&mut header) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => return Ok(None),
            Err(e) => return Err(MakeError::CantOpen(archive.to_string(), e.to_string())),
        }
        if header[58] != b'`' || header[59] != b'\n' {
            return Err(MakeError::InvalidArchive);
        }

        let mut size = parse_header_number(&header[48..58])?;
        if size % 2 == 1 {
            size += 1;
        }

        if header[0] == b'/' {
            if header[1] == b' ' {
                skip(&mut file, size)?;
                continue;
            } else if header[1] == b'/' && names_table.is_none() {
                let mut buf = vec![0u8; size];
                file.read_exact(&mut buf).map_err(|_| MakeError::InvalidArchive)?;
                for b in buf.iter_mut() {
                    if *b == b'\n' {
                        *b = 0;
                    }
                }
                names_table = Some(buf);
                continue;
            } else if header[1].is_ascii_digit() && names_table.is_some() {
                let offset = parse_header_number(&header[1..16])?;
                let table = names_table.as_ref().unwrap();
                if offset >= table.len() {
                    return Err(MakeError::InvalidArchive);
                }
                let name = read_cstr(&table[offset..]);
                if name.trim_end_matches('/') == member {
                    let mtime = parse_header_number(&header[16..28])?;
                    return Ok(Some(ModTime {
                        sec: mtime as i64,
                        nsec: 0,
                    }));
                }
                skip(&mut file, size)?;
                continue;
            } else {
                return Err(MakeError::InvalidArchive);
            }
        }

        let name = read_cstr(&header[0..16]);
        let name = name.trim_end_matches('/');
        if name == member {
            let mtime = parse_header_number(&header[16..28])?;
            return Ok(Some(ModTime {
                sec: mtime as i64,
                nsec: 0,
            }));
        }
        skip(&mut file, size)?;
    }
}

fn skip(file: &mut std::fs::File, n: usize) -> Result<(), MakeError> {
    use std::io::Seek;
    file.seek(std::io::SeekFrom::Current(n as i64))
        .map_err(|e| MakeError::Other(e.to_string()))?;
    Ok(())
}

fn read_cstr(bytes: &[u8]) -> String {
    let end = bytes
        .iter()
        .position(|&b| b == 0 || b == b'\n')
        .unwrap_or(bytes.len());
    String::from_utf8_lossy(&bytes[..end]).trim_end().to_string()
}

fn parse_header_number(field: &[u8]) -> Result<usize, MakeError> {
    let text = std::str::from_utf8(field).map_err(|_| MakeError::InvalidArchive)?;
    let digits: String = text.chars().take_while(|c| c.is_ascii_digit()).collect();
    digits.parse::<usize>().map_err(|_| MakeError::InvalidArchive)
}
