//! userfs inode construction
//!
//! userfs has no block mapping and no directory content yet, so the only
//! object it can give meaning to is a directory: the root of a mount.

use alloc::sync::Arc;

use log::error;

use crate::{
    common::{DeviceId, InodeKind, UserfsError, UserfsPermission, UserfsResult},
    vfs::{Inode, MountEnv, SuperBlock},
};

/// Create, configure and return an inode of `kind` under `dir` on the mount `sb`
///
/// `perm` supplies the permission bits, the file type comes from `kind`. The
/// kind is checked before anything is drawn from the inode cache or the
/// inode number counter, so a refused request consumes neither.
pub fn userfs_get_inode(
    env: &MountEnv<'_>,
    sb: &SuperBlock,
    dir: Option<&Inode>,
    kind: InodeKind,
    perm: UserfsPermission,
    dev: DeviceId,
) -> UserfsResult<Arc<Inode>> {
    match kind {
        InodeKind::Directory => {}
        InodeKind::RegularFile | InodeKind::SymbolicLink | InodeKind::Other(_) => {
            error!(
                "userfs can create meaningful inode for only root directory at the moment, refused {}",
                kind
            );
            return Err(UserfsError::UnsupportedInodeKind(kind));
        }
    }

    let mut inode = env.cache.new_inode(sb).ok_or(UserfsError::AllocationFailed)?;
    inode.set_ino(env.inode_numbers.next_ino());

    let options = sb.options();
    let perm = match dir {
        Some(_) => perm.perm(),
        None if perm.perm().is_empty() => options.permission(),
        None => perm.perm(),
    };
    inode.init_owner(dir, kind.type_bits() | perm, (options.uid, options.gid));
    inode.set_rdev(dev);

    let now = env.cache.current_time();
    inode.set_times(now);

    // "." of a directory
    inode.inc_nlink();

    Ok(Arc::new(inode))
}
