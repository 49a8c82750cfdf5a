// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

// Copyright 2026 Oxide Computer Company

//! Match values.
//!
//! A [`Value`] is tagged by its [`ValueFormat`], which fixes both the
//! accepted numeric range and the width of the field the generator
//! compares it against.

use crate::api::Ipv4Addr;
use crate::api::Ipv6Addr;
use crate::api::MacAddr;
use crate::api::check_uint;
use alloc::string::String;
use core::fmt;
use core::fmt::Display;
use serde::Deserialize;
use serde::Serialize;

/// The length of the raw value, mask, and range buffers of a match.
pub const RAW_LEN: usize = 16;

/// The encoding of a [`Value`].
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub enum ValueFormat {
    Bit,
    Uint3,
    Uint6,
    Uint8,
    Uint12,
    Uint16,
    Uint20,
    Uint32,
    Mac,
    Ipv4,
    Ipv6,
}

impl ValueFormat {
    /// The width of the field, in bits.
    pub fn bits(&self) -> u8 {
        match self {
            Self::Bit => 1,
            Self::Uint3 => 3,
            Self::Uint6 => 6,
            Self::Uint8 => 8,
            Self::Uint12 => 12,
            Self::Uint16 => 16,
            Self::Uint20 => 20,
            Self::Uint32 => 32,
            Self::Mac => MacAddr::BITS,
            Self::Ipv4 => 32,
            Self::Ipv6 => 128,
        }
    }

    /// The number of bytes the value occupies in its raw form.
    pub fn byte_len(&self) -> usize {
        match self {
            Self::Bit | Self::Uint3 | Self::Uint6 | Self::Uint8 => 1,
            Self::Uint12 | Self::Uint16 => 2,
            Self::Uint20 | Self::Uint32 | Self::Ipv4 => 4,
            Self::Mac => 6,
            Self::Ipv6 => 16,
        }
    }

    pub fn is_uint(&self) -> bool {
        !matches!(self, Self::Mac | Self::Ipv4 | Self::Ipv6)
    }
}

impl Display for ValueFormat {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let s = match self {
            Self::Bit => "bit",
            Self::Uint3 => "u3",
            Self::Uint6 => "u6",
            Self::Uint8 => "u8",
            Self::Uint12 => "u12",
            Self::Uint16 => "u16",
            Self::Uint20 => "u20",
            Self::Uint32 => "u32",
            Self::Mac => "mac",
            Self::Ipv4 => "ipv4",
            Self::Ipv6 => "ipv6",
        };
        write!(f, "{s}")
    }
}

/// A single match value.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum Value {
    Bit(bool),
    Uint3(u8),
    Uint6(u8),
    Uint8(u8),
    Uint12(u16),
    Uint16(u16),
    Uint20(u32),
    Uint32(u32),
    Mac(MacAddr),
    Ipv4(Ipv4Addr),
    Ipv6(Ipv6Addr),
}

impl Value {
    /// Build an integer value of the given format, checking that it
    /// fits the format's width.
    pub fn from_uint(format: ValueFormat, val: u64) -> Result<Self, String> {
        // The casts below cannot truncate, `check_uint` bounds the
        // value to the width of the format before any of them runs.
        let ctor: fn(u32) -> Self = match format {
            ValueFormat::Bit => |v| Self::Bit(v == 1),
            ValueFormat::Uint3 => |v| Self::Uint3(v as u8),
            ValueFormat::Uint6 => |v| Self::Uint6(v as u8),
            ValueFormat::Uint8 => |v| Self::Uint8(v as u8),
            ValueFormat::Uint12 => |v| Self::Uint12(v as u16),
            ValueFormat::Uint16 => |v| Self::Uint16(v as u16),
            ValueFormat::Uint20 => Self::Uint20,
            ValueFormat::Uint32 => Self::Uint32,
            ValueFormat::Mac | ValueFormat::Ipv4 | ValueFormat::Ipv6 => {
                return Err(format!("{format} is not an integer format"));
            }
        };

        Ok(ctor(check_uint(val, format.bits())?))
    }

    pub fn format(&self) -> ValueFormat {
        match self {
            Self::Bit(_) => ValueFormat::Bit,
            Self::Uint3(_) => ValueFormat::Uint3,
            Self::Uint6(_) => ValueFormat::Uint6,
            Self::Uint8(_) => ValueFormat::Uint8,
            Self::Uint12(_) => ValueFormat::Uint12,
            Self::Uint16(_) => ValueFormat::Uint16,
            Self::Uint20(_) => ValueFormat::Uint20,
            Self::Uint32(_) => ValueFormat::Uint32,
            Self::Mac(_) => ValueFormat::Mac,
            Self::Ipv4(_) => ValueFormat::Ipv4,
            Self::Ipv6(_) => ValueFormat::Ipv6,
        }
    }

    /// The value as an integer, if it has an integer format.
    pub fn as_uint(&self) -> Option<u32> {
        match self {
            Self::Bit(b) => Some(u32::from(*b)),
            Self::Uint3(v) | Self::Uint6(v) | Self::Uint8(v) => {
                Some(u32::from(*v))
            }
            Self::Uint12(v) | Self::Uint16(v) => Some(u32::from(*v)),
            Self::Uint20(v) | Self::Uint32(v) => Some(*v),
            Self::Mac(_) | Self::Ipv4(_) | Self::Ipv6(_) => None,
        }
    }

    /// Verify that the stored integer fits the width of the variant.
    ///
    /// The variants are public, so a value built by hand or read back
    /// from a saved filter may carry, say, a 200 in a `Uint3`.
    pub fn validate(&self) -> Result<(), String> {
        match self.as_uint() {
            Some(v) => check_uint(u64::from(v), self.format().bits())
                .map(|_| ()),
            None => Ok(()),
        }
    }

    /// The raw, big-endian bytes of the value, left-aligned in a
    /// zero-padded buffer.
    pub fn to_raw(&self) -> [u8; RAW_LEN] {
        let mut raw = [0u8; RAW_LEN];
        match self {
            Self::Bit(b) => raw[0] = u8::from(*b),
            Self::Uint3(v) | Self::Uint6(v) | Self::Uint8(v) => raw[0] = *v,
            Self::Uint12(v) | Self::Uint16(v) => {
                raw[..2].copy_from_slice(&v.to_be_bytes())
            }
            Self::Uint20(v) | Self::Uint32(v) => {
                raw[..4].copy_from_slice(&v.to_be_bytes())
            }
            Self::Mac(mac) => raw[..6].copy_from_slice(&mac.bytes()),
            Self::Ipv4(ip) => raw[..4].copy_from_slice(&ip.bytes()),
            Self::Ipv6(ip) => raw.copy_from_slice(&ip.bytes()),
        }
        raw
    }

    /// Read back a value of `format` from its raw form.
    pub fn from_raw(
        format: ValueFormat,
        raw: &[u8; RAW_LEN],
    ) -> Result<Self, String> {
        match format {
            ValueFormat::Mac => {
                let mut bytes = [0u8; 6];
                bytes.copy_from_slice(&raw[..6]);
                Ok(Self::Mac(MacAddr::from(bytes)))
            }

            ValueFormat::Ipv4 => {
                let mut bytes = [0u8; 4];
                bytes.copy_from_slice(&raw[..4]);
                Ok(Self::Ipv4(Ipv4Addr::from(bytes)))
            }

            ValueFormat::Ipv6 => Ok(Self::Ipv6(Ipv6Addr::from(*raw))),

            _ => {
                let val = raw[..format.byte_len()]
                    .iter()
                    .fold(0u64, |acc, b| (acc << 8) | u64::from(*b));
                Self::from_uint(format, val)
            }
        }
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Bit(b) => write!(f, "{}", u8::from(*b)),
            Self::Mac(mac) => write!(f, "{mac}"),
            Self::Ipv4(ip) => write!(f, "{ip}"),
            Self::Ipv6(ip) => write!(f, "{ip}"),
            _ => match self.as_uint() {
                Some(v) => write!(f, "{v}"),
                None => Ok(()),
            },
        }
    }
}

impl From<MacAddr> for Value {
    fn from(mac: MacAddr) -> Self {
        Self::Mac(mac)
    }
}

impl From<Ipv4Addr> for Value {
    fn from(ip: Ipv4Addr) -> Self {
        Self::Ipv4(ip)
    }
}

impl From<Ipv6Addr> for Value {
    fn from(ip: Ipv6Addr) -> Self {
        Self::Ipv6(ip)
    }
}
