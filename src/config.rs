//! Mount option parsing
//!
//! The `data` argument of a mount request is either the classic
//! comma-separated `key=value` list (`uid=1000,gid=100,mode=0700`) or a JSON
//! object with the same keys. Empty data yields the defaults.

use core::str;

use serde::{Deserialize, Serialize};

use crate::common::{UserfsError, UserfsPermission, UserfsResult};

/// Default permission bits of the root directory
pub const USERFS_DEFAULT_MODE: u16 = 0o755;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MountOptions {
    /// Owner of objects created without a parent
    pub uid: u32,
    /// Group of objects created without a parent
    pub gid: u32,
    /// Permission bits of objects created without a parent
    pub mode: u16,
}

impl Default for MountOptions {
    fn default() -> Self {
        Self {
            uid: 0,
            gid: 0,
            mode: USERFS_DEFAULT_MODE,
        }
    }
}

impl MountOptions {
    pub fn parse(data: &[u8]) -> UserfsResult<Self> {
        let text = str::from_utf8(data).map_err(|_| UserfsError::InvalidMountOption)?;
        let text = text.trim_matches(|c: char| c == '\0' || c.is_whitespace());

        let options = if text.is_empty() {
            Self::default()
        } else if text.starts_with('{') {
            serde_json::from_str(text).map_err(|_| UserfsError::InvalidMountOption)?
        } else {
            Self::parse_list(text)?
        };

        if options.mode & !UserfsPermission::PERM_MASK != 0 {
            return Err(UserfsError::InvalidMountOption);
        }
        Ok(options)
    }

    fn parse_list(text: &str) -> UserfsResult<Self> {
        let mut options = Self::default();
        for opt in text.split(',').filter(|opt| !opt.is_empty()) {
            let (key, value) = opt.split_once('=').ok_or(UserfsError::InvalidMountOption)?;
            match key.trim() {
                "uid" => options.uid = parse_u32(value)?,
                "gid" => options.gid = parse_u32(value)?,
                "mode" => {
                    options.mode = u16::from_str_radix(value.trim(), 8)
                        .map_err(|_| UserfsError::InvalidMountOption)?
                }
                _ => return Err(UserfsError::InvalidMountOption),
            }
        }
        Ok(options)
    }

    /// Permission bits applied to objects created without a parent
    pub fn permission(&self) -> UserfsPermission {
        UserfsPermission::from_bits_truncate(self.mode).perm()
    }
}

fn parse_u32(value: &str) -> UserfsResult<u32> {
    value.trim().parse::<u32>().map_err(|_| UserfsError::InvalidMountOption)
}
