//! Read-only byte window backing all parsing.
//!
//! A [`ByteSource`] is the immutable image of the whole PDF file. It is
//! obtained by memory-mapping a file, by copying caller bytes into the
//! process, or by borrowing caller-owned memory whose lifetime the caller
//! guarantees to exceed the document's. Release happens per-variant on drop:
//! unmap, free, or leave alone.

use crate::error::Result;
use std::fs::File;
use std::path::Path;

/// The byte window variants.
enum Backing {
    /// Page-cache-backed mapping of the file.
    Mapped(memmap2::Mmap),
    /// In-process copy.
    Owned(Vec<u8>),
    /// Caller-lent memory. The caller guarantees the bytes outlive the
    /// document; nothing is released on drop.
    Borrowed { ptr: *const u8, len: usize },
}

/// Immutable, indexable range of bytes representing the entire file image.
pub struct ByteSource {
    backing: Backing,
}

impl ByteSource {
    /// Memory-map a file. Falls back to reading the file into an owned
    /// buffer when mapping fails (e.g. zero-length or special files).
    pub fn map_file(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path.as_ref())?;
        // Mapping an empty file is an error on some platforms; read instead.
        match unsafe { memmap2::Mmap::map(&file) } {
            Ok(map) => Ok(Self {
                backing: Backing::Mapped(map),
            }),
            Err(e) => {
                log::debug!("mmap failed ({}), reading file into memory", e);
                let data = std::fs::read(path.as_ref())?;
                Ok(Self {
                    backing: Backing::Owned(data),
                })
            },
        }
    }

    /// Copy the given bytes into an owned buffer.
    pub fn copied(data: &[u8]) -> Self {
        Self {
            backing: Backing::Owned(data.to_vec()),
        }
    }

    /// Take ownership of an existing buffer.
    pub fn owned(data: Vec<u8>) -> Self {
        Self {
            backing: Backing::Owned(data),
        }
    }

    /// Borrow caller-lent memory without copying.
    ///
    /// # Safety
    ///
    /// `ptr` must point to `len` readable bytes that remain valid and
    /// unmodified for the entire lifetime of the returned source.
    pub unsafe fn borrowed(ptr: *const u8, len: usize) -> Self {
        Self {
            backing: Backing::Borrowed { ptr, len },
        }
    }

    /// The full byte window.
    pub fn bytes(&self) -> &[u8] {
        match &self.backing {
            Backing::Mapped(map) => map,
            Backing::Owned(vec) => vec,
            Backing::Borrowed { ptr, len } => unsafe { std::slice::from_raw_parts(*ptr, *len) },
        }
    }

    /// Length of the window in bytes.
    pub fn len(&self) -> usize {
        self.bytes().len()
    }

    /// Whether the window is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// The raw-pointer variant is only reachable through the unsafe constructor,
// whose contract requires the memory to stay valid and unmodified.
unsafe impl Send for ByteSource {}

impl std::fmt::Debug for ByteSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let tag = match &self.backing {
            Backing::Mapped(_) => "mapped",
            Backing::Owned(_) => "owned",
            Backing::Borrowed { .. } => "borrowed",
        };
        write!(f, "ByteSource({}, {} bytes)", tag, self.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_copied_source() {
        let src = ByteSource::copied(b"%PDF-1.4");
        assert_eq!(src.bytes(), b"%PDF-1.4");
        assert_eq!(src.len(), 8);
        assert!(!src.is_empty());
    }

    #[test]
    fn test_owned_source() {
        let src = ByteSource::owned(vec![1, 2, 3]);
        assert_eq!(src.bytes(), &[1, 2, 3]);
    }

    #[test]
    fn test_borrowed_source_no_copy() {
        let data = b"hello world".to_vec();
        let src = unsafe { ByteSource::borrowed(data.as_ptr(), data.len()) };
        assert_eq!(src.bytes().as_ptr(), data.as_ptr());
        assert_eq!(src.bytes(), b"hello world");
        drop(src);
        // the lent buffer must still be intact after drop
        assert_eq!(data, b"hello world");
    }

    #[test]
    fn test_map_file() {
        let mut tmp = tempfile::NamedTempFile::new().unwrap();
        tmp.write_all(b"%PDF-1.7 test").unwrap();
        tmp.flush().unwrap();
        let src = ByteSource::map_file(tmp.path()).unwrap();
        assert_eq!(src.bytes(), b"%PDF-1.7 test");
    }

    #[test]
    fn test_map_missing_file_fails() {
        assert!(ByteSource::map_file("/nonexistent/definitely/missing.pdf").is_err());
    }
}
