//! userfs: a minimal block-device backed filesystem
//!
//! The crate registers the `userfs` filesystem type with a host registry,
//! mounts it through the host's block device helper and builds the root
//! directory of each mount. The root is the only object userfs can
//! materialize for now.
#![cfg_attr(not(test), no_std)]
extern crate alloc;

pub mod common;
pub mod config;
pub mod fstype;
pub mod inode;
pub mod inode_common;
pub mod module;
pub mod superblock;
pub mod vfs;


pub use common::{InodeKind, UserfsError, UserfsResult};
pub use module::{userfs_exit, userfs_init, UserfsModule, USERFS_FS_TYPE};
pub use superblock::USERFS_MAGIC;
