//! Integer return convention for the packet syscalls.
//!
//! A non-negative value is a byte count; a negative value is `-errno`.

use crate::error::PacketError;

/// Invalid parameter.
pub const E_INVAL: i32 = 3;
/// Transmit ring full.
pub const E_BUF_FULL: i32 = 16;
/// Receive ring empty.
pub const E_BUF_EMPTY: i32 = 17;

impl PacketError {
    /// Positive error number for this error.
    pub fn errno(&self) -> i32 {
        match self {
            PacketError::BufFull => E_BUF_FULL,
            PacketError::BufEmpty => E_BUF_EMPTY,
            PacketError::InvalidArgument => E_INVAL,
        }
    }

    pub fn from_errno(errno: i32) -> Option<Self> {
        match errno {
            E_BUF_FULL => Some(PacketError::BufFull),
            E_BUF_EMPTY => Some(PacketError::BufEmpty),
            E_INVAL => Some(PacketError::InvalidArgument),
            _ => None,
        }
    }
}

/// Encode a driver result as a syscall return value.
pub fn encode(result: Result<usize, PacketError>) -> isize {
    match result {
        Ok(len) => len as isize,
        Err(e) => -(e.errno() as isize),
    }
}

/// Decode a syscall return value.
///
/// Unknown negative codes map to `InvalidArgument`.
pub fn decode(ret: isize) -> Result<usize, PacketError> {
    if ret >= 0 {
        return Ok(ret as usize);
    }
    let errno = i32::try_from(ret.unsigned_abs()).unwrap_or(i32::MAX);
    Err(PacketError::from_errno(errno).unwrap_or(PacketError::InvalidArgument))
}
