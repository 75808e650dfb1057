use alloc::sync::Arc;

use log::{debug, error, info};

use crate::{
    common::UserfsResult,
    superblock::userfs_fill_super,
    vfs::{BlockDeviceMounter, Dentry, FileSystemType, MountFlags, SuperBlock},
};

/// Mount userfs from the block device `dev_name`, returning the root of the filesystem
///
/// Device lookup and superblock bookkeeping are left to the host's block
/// device helper, which calls back into [`userfs_fill_super`]. Failures are
/// reported once and handed straight back, there is no retry.
pub fn userfs_mount(
    host: &dyn BlockDeviceMounter,
    fs_type: &'static FileSystemType,
    flags: MountFlags,
    dev_name: &str,
    data: &[u8],
) -> UserfsResult<Arc<Dentry>> {
    match host.mount_bdev(fs_type, flags, dev_name, data, userfs_fill_super) {
        Ok(root) => {
            info!("userfs is successfully mounted on [{}]", dev_name);
            Ok(root)
        }
        Err(e) => {
            error!("Error mounting userfs on [{}]: {}", dev_name, e);
            Err(e)
        }
    }
}

/// Tear down a userfs superblock
pub fn userfs_kill_sb(host: &dyn BlockDeviceMounter, sb: SuperBlock) {
    debug!("userfs: unmounting [{}]", sb.dev_name());
    host.kill_block_super(sb);
}
