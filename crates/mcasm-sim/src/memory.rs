//! Flat little-endian memory with an unmapped guard area at the bottom.

use crate::error::SimError;

/// Accesses below this address fault.
pub const GUARD_SIZE: u64 = 0x1000;

/// Byte-addressed simulated memory covering `[GUARD_SIZE, size)`.
#[derive(Debug, Clone)]
pub struct Memory {
    bytes: Vec<u8>,
}

impl Memory {
    /// Zeroed memory whose highest address is `size - 1`.
    pub fn new(size: usize) -> Self {
        Self { bytes: vec![0; size] }
    }

    /// One past the highest mapped address.
    pub fn end(&self) -> u64 {
        self.bytes.len() as u64
    }

    fn range(&self, addr: u64, size: usize) -> Result<core::ops::Range<usize>, SimError> {
        let fault = SimError::MemoryFault { addr, size };
        if addr < GUARD_SIZE {
            return Err(fault);
        }
        let end = addr.checked_add(size as u64).ok_or_else(|| fault.clone())?;
        if end > self.end() {
            return Err(fault);
        }
        Ok(addr as usize..end as usize)
    }

    /// Borrow `size` bytes at `addr`.
    pub fn slice(&self, addr: u64, size: usize) -> Result<&[u8], SimError> {
        let r = self.range(addr, size)?;
        Ok(&self.bytes[r])
    }

    /// Copy `data` to `addr`.
    pub fn write_bytes(&mut self, addr: u64, data: &[u8]) -> Result<(), SimError> {
        let r = self.range(addr, data.len())?;
        self.bytes[r].copy_from_slice(data);
        Ok(())
    }

    /// Zero-extended little-endian load of `size` (1, 2, 4 or 8) bytes.
    pub fn load(&self, addr: u64, size: usize) -> Result<u64, SimError> {
        let bytes = self.slice(addr, size)?;
        let mut buf = [0u8; 8];
        buf[..size].copy_from_slice(bytes);
        Ok(u64::from_le_bytes(buf))
    }

    /// Little-endian store of the low `size` bytes of `value`.
    pub fn store(&mut self, addr: u64, size: usize, value: u64) -> Result<(), SimError> {
        let bytes = value.to_le_bytes();
        self.write_bytes(addr, &bytes[..size])
    }

    /// Up to four bytes at `addr`, fewer if memory ends first.
    pub fn fetch(&self, addr: u64) -> Result<&[u8], SimError> {
        let avail = self.end().saturating_sub(addr).min(4) as usize;
        if avail < 2 {
            return Err(SimError::MemoryFault { addr, size: 2 });
        }
        self.slice(addr, avail)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn little_endian_round_trip() {
        let mut mem = Memory::new(0x2000);
        mem.store(0x1000, 8, 0x0102_0304_0506_0708).unwrap();
        assert_eq!(mem.slice(0x1000, 2).unwrap(), &[0x08, 0x07]);
        assert_eq!(mem.load(0x1004, 4).unwrap(), 0x0102_0304);
        assert_eq!(mem.load(0x1001, 1).unwrap(), 0x07);
    }

    #[test]
    fn guard_and_end_fault() {
        let mut mem = Memory::new(0x2000);
        assert_eq!(mem.load(0x10, 4), Err(SimError::MemoryFault { addr: 0x10, size: 4 }));
        assert!(mem.store(0x1FFC, 8, 0).is_err());
        assert!(mem.load(u64::MAX - 2, 4).is_err());
        assert_eq!(mem.fetch(0x1FFE).unwrap().len(), 2);
        assert!(mem.fetch(0x1FFF).is_err());
    }
}
