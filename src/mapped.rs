//! Memory-mapped line access for re-reading a finished output file

use memmap2::Mmap;
use std::fs::File;
use std::path::Path;
use std::io;

/// A read-only file mapping split into lines.
///
/// Lines are byte slices borrowed from the mapping, so line length is
/// bounded only by the file itself.
pub struct MappedFile {
    mmap: Option<Mmap>,
}

impl MappedFile {
    /// Map the file at `path`
    pub fn new(path: &Path) -> io::Result<Self> {
        let file = File::open(path)?;
        if file.metadata()?.len() == 0 {
            return Ok(Self { mmap: None });
        }
        // SAFETY: the sink has closed the file and nothing else writes it
        // while the mapping is alive.
        let mmap = unsafe { Mmap::map(&file)? };
        Ok(Self { mmap: Some(mmap) })
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.mmap.as_deref().unwrap_or(&[])
    }

    pub fn is_empty(&self) -> bool {
        self.as_bytes().is_empty()
    }

    /// Iterate over lines without their terminators
    pub fn lines(&self) -> Lines<'_> {
        Lines {
            data: self.as_bytes(),
        }
    }
}

/// Iterator over `\n` terminated lines; a trailing `\r` is stripped
pub struct Lines<'a> {
    data: &'a [u8],
}

impl<'a> Iterator for Lines<'a> {
    type Item = &'a [u8];

    fn next(&mut self) -> Option<Self::Item> {
        if self.data.is_empty() {
            return None;
        }
        let (line, rest) = match self.data.iter().position(|&b| b == b'\n') {
            Some(pos) => (&self.data[..pos], &self.data[pos + 1..]),
            // Last line without a newline
            None => (self.data, &self.data[self.data.len()..]),
        };
        self.data = rest;
        Some(line.strip_suffix(b"\r").unwrap_or(line))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_lines() -> io::Result<()> {
        let temp_dir = TempDir::new()?;
        let path = temp_dir.path().join("scan.csv");
        fs::write(&path, "a,1\r\nb,2\n\nc,3")?;

        let mapped = MappedFile::new(&path)?;
        let lines: Vec<&[u8]> = mapped.lines().collect();
        assert_eq!(lines, vec![&b"a,1"[..], &b"b,2"[..], &b""[..], &b"c,3"[..]]);
        Ok(())
    }

    #[test]
    fn test_empty_file() -> io::Result<()> {
        let temp_dir = TempDir::new()?;
        let path = temp_dir.path().join("empty.csv");
        fs::write(&path, "")?;

        let mapped = MappedFile::new(&path)?;
        assert!(mapped.is_empty());
        assert_eq!(mapped.lines().count(), 0);
        Ok(())
    }

    #[test]
    fn test_long_line() -> io::Result<()> {
        let temp_dir = TempDir::new()?;
        let path = temp_dir.path().join("long.csv");
        let long = "x".repeat(64 * 1024);
        fs::write(&path, format!("10.0.0.1,7,{long}\n"))?;

        let mapped = MappedFile::new(&path)?;
        let line = mapped.lines().next().expect("one line");
        assert_eq!(line.len(), long.len() + "10.0.0.1,7,".len());
        Ok(())
    }
}
