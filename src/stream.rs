// src/stream.rs

//! Non-closing stream adapters
//!
//! A nested archive is migrated while its enclosing archive is still being
//! read and written. The nested codec gets a lent view of the outer entry
//! streams: it may read, write and flush through the view, and releasing the
//! view never releases the underlying stream. The outermost owner (the file
//! handles opened by the orchestrator) closes the real resource when its own
//! scope ends.

use std::io::{self, Read, Write};

/// Read-side view that cannot close the stream it borrows
pub struct NonClosingReader<'a, R: Read + ?Sized> {
    inner: &'a mut R,
    bytes_read: u64,
}

impl<'a, R: Read + ?Sized> NonClosingReader<'a, R> {
    pub fn new(inner: &'a mut R) -> Self {
        Self {
            inner,
            bytes_read: 0,
        }
    }

    /// Number of bytes read through this view
    pub fn bytes_read(&self) -> u64 {
        self.bytes_read
    }

    /// Release the view; the borrowed stream stays open
    pub fn close(self) {}
}

impl<R: Read + ?Sized> Read for NonClosingReader<'_, R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.inner.read(buf)?;
        self.bytes_read += n as u64;
        Ok(n)
    }
}

/// Write-side view that cannot close the stream it borrows
pub struct NonClosingWriter<'a, W: Write + ?Sized> {
    inner: &'a mut W,
    bytes_written: u64,
}

impl<'a, W: Write + ?Sized> NonClosingWriter<'a, W> {
    pub fn new(inner: &'a mut W) -> Self {
        Self {
            inner,
            bytes_written: 0,
        }
    }

    /// Number of bytes written through this view
    pub fn bytes_written(&self) -> u64 {
        self.bytes_written
    }

    /// Release the view, flushing pending bytes; the borrowed stream stays open
    pub fn close(self) -> io::Result<()> {
        self.inner.flush()
    }
}

impl<W: Write + ?Sized> Write for NonClosingWriter<'_, W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = self.inner.write(buf)?;
        self.bytes_written += n as u64;
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}
