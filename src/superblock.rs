use log::{debug, error};

use crate::{
    common::{DeviceId, InodeKind, UserfsError, UserfsPermission, UserfsResult},
    config::MountOptions,
    inode::userfs_get_inode,
    vfs::{MountEnv, SuperBlock},
};

/// Magic number identifying a userfs superblock
pub const USERFS_MAGIC: u32 = 0x10032013;

/// Fill and validate a superblock the host has bound to a block device
///
/// On error nothing set here may be relied upon; the host discards the
/// whole superblock.
pub fn userfs_fill_super(
    sb: &mut SuperBlock,
    env: &MountEnv<'_>,
    data: &[u8],
    silent: bool,
) -> UserfsResult<()> {
    let options = MountOptions::parse(data).map_err(|e| {
        if !silent {
            error!("userfs: bad mount options on [{}]", sb.dev_name());
        }
        e
    })?;
    sb.set_options(options);
    sb.set_magic(USERFS_MAGIC);

    let inode = userfs_get_inode(
        env,
        sb,
        None,
        InodeKind::Directory,
        UserfsPermission::empty(),
        DeviceId::NONE,
    )
    .map_err(|_| UserfsError::OutOfMemory)?;
    debug!("userfs: root inode {} on [{}]", inode.ino(), sb.dev_name());

    let root = env.cache.make_root(inode).ok_or(UserfsError::OutOfMemory)?;
    sb.set_root(root);
    Ok(())
}
