//! Common userfs definitions shared by the inode, superblock and mount code

use core::fmt;

use bitflags::bitflags;

/// Numeric status code as reported by the host
pub type Errno = i32;

pub const ENXIO: Errno = 6;
pub const ENOMEM: Errno = 12;
pub const EBUSY: Errno = 16;
pub const ENODEV: Errno = 19;
pub const EINVAL: Errno = 22;

pub type UserfsResult<T> = Result<T, UserfsError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, onlyerror::Error)]
pub enum UserfsError {
    #[error("inode cache exhausted")]
    AllocationFailed,
    #[error("cannot create inode of kind {0}")]
    UnsupportedInodeKind(InodeKind),
    #[error("out of memory while filling superblock")]
    OutOfMemory,
    #[error("block device mount failed with errno {0}")]
    MountHelperFailed(Errno),
    #[error("filesystem registration failed with errno {0}")]
    RegistrationFailed(Errno),
    #[error("filesystem unregistration failed with errno {0}")]
    UnregistrationFailed(Errno),
    #[error("invalid mount option")]
    InvalidMountOption,
}

impl UserfsError {
    /// Negative errno handed back to the host for this error
    pub fn errno(&self) -> Errno {
        let code = match *self {
            UserfsError::AllocationFailed | UserfsError::OutOfMemory => ENOMEM,
            UserfsError::UnsupportedInodeKind(_) | UserfsError::InvalidMountOption => EINVAL,
            UserfsError::MountHelperFailed(code)
            | UserfsError::RegistrationFailed(code)
            | UserfsError::UnregistrationFailed(code) => code.abs(),
        };
        -code
    }
}

bitflags! {
    /// Mode bits of an inode: file type in `S_IFMT`, permissions below it
    pub struct UserfsPermission: u16 {
        const S_IFMT = 0o170000;
        const S_IFSOCK = 0o140000;
        const S_IFLNK = 0o120000;
        const S_IFREG = 0o100000;
        const S_IFBLK = 0o060000;
        const S_IFDIR = 0o040000;
        const S_IFCHR = 0o020000;
        const S_IFIFO = 0o010000;

        const S_ISUID = 0o4000;
        const S_ISGID = 0o2000;
        const S_ISVTX = 0o1000;

        const S_IRWXU = 0o700;
        const S_IRUSR = 0o400;
        const S_IWUSR = 0o200;
        const S_IXUSR = 0o100;

        const S_IRWXG = 0o070;
        const S_IRGRP = 0o040;
        const S_IWGRP = 0o020;
        const S_IXGRP = 0o010;

        const S_IRWXO = 0o007;
        const S_IROTH = 0o004;
        const S_IWOTH = 0o002;
        const S_IXOTH = 0o001;
    }
}

impl UserfsPermission {
    /// Everything below the file type bits
    pub const PERM_MASK: u16 = 0o7777;

    /// Permission bits only, file type stripped
    pub fn perm(&self) -> Self {
        Self::from_bits_truncate(self.bits() & Self::PERM_MASK)
    }
}

/// Kind of object an inode represents
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InodeKind {
    Directory,
    RegularFile,
    SymbolicLink,
    /// Any other file type, carrying its raw `S_IFMT` bits
    Other(u16),
}

impl InodeKind {
    pub fn from_mode(mode: UserfsPermission) -> Self {
        let ty = mode.bits() & UserfsPermission::S_IFMT.bits();
        match ty {
            t if t == UserfsPermission::S_IFDIR.bits() => InodeKind::Directory,
            t if t == UserfsPermission::S_IFREG.bits() => InodeKind::RegularFile,
            t if t == UserfsPermission::S_IFLNK.bits() => InodeKind::SymbolicLink,
            t => InodeKind::Other(t),
        }
    }

    /// The `S_IFMT` bits of this kind
    pub fn type_bits(&self) -> UserfsPermission {
        match *self {
            InodeKind::Directory => UserfsPermission::S_IFDIR,
            InodeKind::RegularFile => UserfsPermission::S_IFREG,
            InodeKind::SymbolicLink => UserfsPermission::S_IFLNK,
            InodeKind::Other(bits) => {
                UserfsPermission::from_bits_truncate(bits) & UserfsPermission::S_IFMT
            }
        }
    }
}

impl fmt::Display for InodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InodeKind::Directory => f.write_str("directory"),
            InodeKind::RegularFile => f.write_str("regular file"),
            InodeKind::SymbolicLink => f.write_str("symbolic link"),
            InodeKind::Other(bits) => write!(f, "type {:#o}", bits),
        }
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct UserfsTimeSpec {
    pub sec: u64,
    pub nsec: u64,
}

impl UserfsTimeSpec {
    pub fn new(sec: u64, nsec: u64) -> Self {
        Self { sec, nsec }
    }
}

/// Device number, `major:minor` packed the classic 12/20 way
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DeviceId(u32);

impl DeviceId {
    pub const NONE: DeviceId = DeviceId(0);

    pub const fn new(major: u32, minor: u32) -> Self {
        Self((major << 20) | (minor & 0xfffff))
    }

    pub fn major(&self) -> u32 {
        self.0 >> 20
    }

    pub fn minor(&self) -> u32 {
        self.0 & 0xfffff
    }
}
