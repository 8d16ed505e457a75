use crate::Tracee;
use nix::errno::Errno;
use nix::sys::uio::{pread, pwrite};
use std::os::unix::io::AsRawFd;

impl Tracee {
    /// Reads the data at the virtual address from the traced process.
    pub fn read_memory(&self, address: u64, data: &mut [u8]) -> nix::Result<usize> {
        pread(self.file.as_raw_fd(), data, address as _)
    }

    /// Writes the data to the virtual address of the traced process.
    pub fn write_memory(&mut self, address: u64, data: &[u8]) -> nix::Result<usize> {
        pwrite(self.file.as_raw_fd(), data, address as _)
    }

    /// Fills `data` from the virtual address, failing with `EIO` if the range runs into an
    /// unmapped page.
    pub(crate) fn read_exact(&self, address: u64, data: &mut [u8]) -> nix::Result<()> {
        match self.read_memory(address, data)? {
            size if size == data.len() => Ok(()),
            _ => Err(Errno::EIO),
        }
    }

    /// Writes all of `data` to the virtual address, failing with `EIO` on a short write.
    pub(crate) fn write_all(&mut self, address: u64, data: &[u8]) -> nix::Result<()> {
        match self.write_memory(address, data)? {
            size if size == data.len() => Ok(()),
            _ => Err(Errno::EIO),
        }
    }
}
