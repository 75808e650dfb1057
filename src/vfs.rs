//! Host VFS objects and the interfaces userfs is driven through
//!
//! The host owns the inode cache, the dentry tree, block device lookup and
//! the filesystem-type registry. userfs only consumes these through the
//! traits below and hands back plain function references for the host to
//! call on mount and teardown.

use alloc::{string::String, string::ToString, sync::Arc, vec::Vec};
use core::ptr;

use bitflags::bitflags;
use spin::Mutex;

use crate::{
    common::{
        DeviceId, Errno, InodeKind, UserfsPermission, UserfsResult, UserfsTimeSpec, EBUSY, EINVAL,
    },
    config::MountOptions,
    inode_common::InodeNumberAllocator,
};

bitflags! {
    /// Capability flags of a filesystem type
    pub struct FileSystemFlags: u32 {
        /// Can only be mounted on top of a block device
        const REQUIRES_DEV = 1;
        const BINARY_MOUNTDATA = 2;
        const HAS_SUBTYPE = 4;
        const USERNS_MOUNT = 8;
    }
}

bitflags! {
    /// Generic flags of a mount request
    pub struct MountFlags: u32 {
        const RDONLY = 1;
        const NOSUID = 2;
        const NODEV = 4;
        const NOEXEC = 8;
        const SYNCHRONOUS = 16;
        const SILENT = 32768;
    }
}

/// In-memory inode record
#[derive(Debug, Clone)]
pub struct Inode {
    ino: usize,
    mode: UserfsPermission,
    uid: u32,
    gid: u32,
    nlink: u32,
    atime: UserfsTimeSpec,
    mtime: UserfsTimeSpec,
    ctime: UserfsTimeSpec,
    rdev: DeviceId,
    dev: DeviceId,
}

impl Inode {
    /// A freshly allocated inode on device `dev`, as handed out by an inode cache
    pub fn new(dev: DeviceId) -> Self {
        Self {
            ino: 0,
            mode: UserfsPermission::empty(),
            uid: 0,
            gid: 0,
            nlink: 1,
            atime: UserfsTimeSpec::default(),
            mtime: UserfsTimeSpec::default(),
            ctime: UserfsTimeSpec::default(),
            rdev: DeviceId::NONE,
            dev,
        }
    }

    pub fn ino(&self) -> usize {
        self.ino
    }

    pub fn set_ino(&mut self, ino: usize) {
        self.ino = ino;
    }

    pub fn mode(&self) -> UserfsPermission {
        self.mode
    }

    pub fn kind(&self) -> InodeKind {
        InodeKind::from_mode(self.mode)
    }

    pub fn is_dir(&self) -> bool {
        self.kind() == InodeKind::Directory
    }

    pub fn uid(&self) -> u32 {
        self.uid
    }

    pub fn gid(&self) -> u32 {
        self.gid
    }

    /// Initialize owner, group and mode of a new inode
    ///
    /// With a parent directory both ids are inherited from it, and a
    /// set-group-id parent passes the bit on to new directories. Without a
    /// parent `owner` supplies the ids.
    pub fn init_owner(&mut self, dir: Option<&Inode>, mode: UserfsPermission, owner: (u32, u32)) {
        let mut mode = mode;
        match dir {
            Some(dir) => {
                self.uid = dir.uid;
                self.gid = dir.gid;
                if dir.mode.contains(UserfsPermission::S_ISGID)
                    && InodeKind::from_mode(mode) == InodeKind::Directory
                {
                    mode |= UserfsPermission::S_ISGID;
                }
            }
            None => {
                (self.uid, self.gid) = owner;
            }
        }
        self.mode = mode;
    }

    pub fn nlink(&self) -> u32 {
        self.nlink
    }

    pub fn inc_nlink(&mut self) {
        self.nlink += 1;
    }

    pub fn atime(&self) -> UserfsTimeSpec {
        self.atime
    }

    pub fn mtime(&self) -> UserfsTimeSpec {
        self.mtime
    }

    pub fn ctime(&self) -> UserfsTimeSpec {
        self.ctime
    }

    /// Stamp access, modify and change time with the same instant
    pub fn set_times(&mut self, now: UserfsTimeSpec) {
        self.atime = now;
        self.mtime = now;
        self.ctime = now;
    }

    pub fn rdev(&self) -> DeviceId {
        self.rdev
    }

    pub fn set_rdev(&mut self, rdev: DeviceId) {
        self.rdev = rdev;
    }

    /// Device the inode lives on
    pub fn dev(&self) -> DeviceId {
        self.dev
    }
}

/// Directory entry
#[derive(Debug)]
pub struct Dentry {
    name: String,
    inode: Arc<Inode>,
}

impl Dentry {
    /// The `/` entry of a mount
    pub fn root(inode: Arc<Inode>) -> Self {
        Self {
            name: "/".to_string(),
            inode,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn inode(&self) -> Arc<Inode> {
        self.inode.clone()
    }
}

/// Per-mount state
#[derive(Debug)]
pub struct SuperBlock {
    fs_type: &'static FileSystemType,
    dev: DeviceId,
    dev_name: String,
    flags: MountFlags,
    magic: u32,
    options: MountOptions,
    root: Option<Arc<Dentry>>,
}

impl SuperBlock {
    /// A blank superblock bound to a block device, before the filesystem fills it
    pub fn new(
        fs_type: &'static FileSystemType,
        dev: DeviceId,
        dev_name: &str,
        flags: MountFlags,
    ) -> Self {
        Self {
            fs_type,
            dev,
            dev_name: dev_name.to_string(),
            flags,
            magic: 0,
            options: MountOptions::default(),
            root: None,
        }
    }

    pub fn fs_type(&self) -> &'static FileSystemType {
        self.fs_type
    }

    pub fn dev(&self) -> DeviceId {
        self.dev
    }

    pub fn dev_name(&self) -> &str {
        &self.dev_name
    }

    pub fn flags(&self) -> MountFlags {
        self.flags
    }

    pub fn magic(&self) -> u32 {
        self.magic
    }

    pub fn set_magic(&mut self, magic: u32) {
        self.magic = magic;
    }

    pub fn options(&self) -> &MountOptions {
        &self.options
    }

    pub fn set_options(&mut self, options: MountOptions) {
        self.options = options;
    }

    pub fn root(&self) -> Option<Arc<Dentry>> {
        self.root.clone()
    }

    pub fn set_root(&mut self, root: Arc<Dentry>) {
        self.root = Some(root);
    }

    /// A mount is only usable once it has a root
    pub fn is_valid(&self) -> bool {
        self.root.is_some()
    }
}

/// Host inode cache services
pub trait InodeCache: Send + Sync {
    /// Allocate a blank inode for `sb`, `None` when the cache is exhausted
    fn new_inode(&self, sb: &SuperBlock) -> Option<Inode>;
    fn current_time(&self) -> UserfsTimeSpec;
    /// Build the root dentry of a mount from its root inode
    fn make_root(&self, inode: Arc<Inode>) -> Option<Arc<Dentry>>;
}

/// What the host hands to a fill callback
pub struct MountEnv<'a> {
    pub cache: &'a dyn InodeCache,
    pub inode_numbers: &'a InodeNumberAllocator,
}

/// Fill a superblock bound to a device: `(sb, env, data, silent)`
pub type FillSuperFn = fn(&mut SuperBlock, &MountEnv<'_>, &[u8], bool) -> UserfsResult<()>;

/// Host block device mounting services
pub trait BlockDeviceMounter: Send + Sync {
    /// Look up `dev_name`, bind a new superblock to it and let `fill_super`
    /// populate it. Returns the root of the mount.
    fn mount_bdev(
        &self,
        fs_type: &'static FileSystemType,
        flags: MountFlags,
        dev_name: &str,
        data: &[u8],
        fill_super: FillSuperFn,
    ) -> UserfsResult<Arc<Dentry>>;

    /// Generic teardown of a block-device backed superblock
    fn kill_block_super(&self, sb: SuperBlock);
}

pub type MountFn = fn(
    &dyn BlockDeviceMounter,
    &'static FileSystemType,
    MountFlags,
    &str,
    &[u8],
) -> UserfsResult<Arc<Dentry>>;

pub type KillSbFn = fn(&dyn BlockDeviceMounter, SuperBlock);

/// Filesystem type descriptor registered with the host
pub struct FileSystemType {
    pub name: &'static str,
    pub fs_flags: FileSystemFlags,
    pub mount: MountFn,
    pub kill_sb: KillSbFn,
}

impl FileSystemType {
    pub fn mount(
        &'static self,
        host: &dyn BlockDeviceMounter,
        flags: MountFlags,
        dev_name: &str,
        data: &[u8],
    ) -> UserfsResult<Arc<Dentry>> {
        (self.mount)(host, self, flags, dev_name, data)
    }

    pub fn kill_sb(&self, host: &dyn BlockDeviceMounter, sb: SuperBlock) {
        (self.kill_sb)(host, sb)
    }

    pub fn requires_dev(&self) -> bool {
        self.fs_flags.contains(FileSystemFlags::REQUIRES_DEV)
    }
}

impl core::fmt::Debug for FileSystemType {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("FileSystemType")
            .field("name", &self.name)
            .field("fs_flags", &self.fs_flags)
            .finish()
    }
}

/// Host filesystem-type registry
pub trait FsRegistry: Send + Sync {
    fn register_filesystem(&self, fs: &'static FileSystemType) -> Result<(), Errno>;
    fn unregister_filesystem(&self, fs: &'static FileSystemType) -> Result<(), Errno>;
}

/// In-memory filesystem-type registry
///
/// Entries are keyed by descriptor identity, names must be unique.
#[derive(Default)]
pub struct FsTypeTable {
    types: Mutex<Vec<&'static FileSystemType>>,
}

impl FsTypeTable {
    pub const fn new() -> Self {
        Self {
            types: Mutex::new(Vec::new()),
        }
    }

    pub fn find(&self, name: &str) -> Option<&'static FileSystemType> {
        self.types.lock().iter().copied().find(|fs| fs.name == name)
    }

    pub fn contains(&self, fs: &'static FileSystemType) -> bool {
        self.types.lock().iter().any(|t| ptr::eq(*t, fs))
    }

    pub fn len(&self) -> usize {
        self.types.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl FsRegistry for FsTypeTable {
    fn register_filesystem(&self, fs: &'static FileSystemType) -> Result<(), Errno> {
        let mut types = self.types.lock();
        if types.iter().any(|t| t.name == fs.name) {
            return Err(-EBUSY);
        }
        types.push(fs);
        Ok(())
    }

    fn unregister_filesystem(&self, fs: &'static FileSystemType) -> Result<(), Errno> {
        let mut types = self.types.lock();
        let pos = types
            .iter()
            .position(|t| ptr::eq(*t, fs))
            .ok_or(-EINVAL)?;
        types.remove(pos);
        Ok(())
    }
}
