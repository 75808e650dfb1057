//! Load, mount, unmount and unload userfs against an in-memory host

use std::sync::{Arc, Mutex};

use userfs::{
    common::{DeviceId, UserfsError, UserfsTimeSpec, ENXIO},
    inode_common::InodeNumberAllocator,
    module::ModuleState,
    userfs_exit, userfs_init,
    vfs::{
        BlockDeviceMounter, Dentry, FileSystemType, FillSuperFn, FsRegistry, FsTypeTable, Inode,
        InodeCache, MountEnv, MountFlags, SuperBlock,
    },
    USERFS_FS_TYPE, USERFS_MAGIC,
};

struct MemHost {
    inode_numbers: InodeNumberAllocator,
    mounts: Mutex<Vec<SuperBlock>>,
}

impl MemHost {
    fn new() -> Self {
        Self {
            inode_numbers: InodeNumberAllocator::default(),
            mounts: Mutex::new(Vec::new()),
        }
    }

    fn umount(&self, dev_name: &str) {
        let sb = {
            let mut mounts = self.mounts.lock().unwrap();
            let pos = mounts.iter().position(|sb| sb.dev_name() == dev_name).unwrap();
            mounts.remove(pos)
        };
        sb.fs_type().kill_sb(self, sb);
    }
}

impl InodeCache for MemHost {
    fn new_inode(&self, sb: &SuperBlock) -> Option<Inode> {
        Some(Inode::new(sb.dev()))
    }

    fn current_time(&self) -> UserfsTimeSpec {
        UserfsTimeSpec::new(1_383_264_000, 0)
    }

    fn make_root(&self, inode: Arc<Inode>) -> Option<Arc<Dentry>> {
        Some(Arc::new(Dentry::root(inode)))
    }
}

impl BlockDeviceMounter for MemHost {
    fn mount_bdev(
        &self,
        fs_type: &'static FileSystemType,
        flags: MountFlags,
        dev_name: &str,
        data: &[u8],
        fill_super: FillSuperFn,
    ) -> Result<Arc<Dentry>, UserfsError> {
        let minor = dev_name
            .strip_prefix("loop")
            .and_then(|n| n.parse::<u32>().ok())
            .ok_or(UserfsError::MountHelperFailed(-ENXIO))?;

        let mut sb = SuperBlock::new(fs_type, DeviceId::new(7, minor), dev_name, flags);
        let env = MountEnv {
            cache: self,
            inode_numbers: &self.inode_numbers,
        };
        if let Err(e) = fill_super(&mut sb, &env, data, flags.contains(MountFlags::SILENT)) {
            fs_type.kill_sb(self, sb);
            return Err(e);
        }
        let root = sb.root().ok_or(UserfsError::OutOfMemory)?;
        self.mounts.lock().unwrap().push(sb);
        Ok(root)
    }

    fn kill_block_super(&self, _sb: SuperBlock) {}
}

#[test]
fn full_lifecycle() {
    let _ = env_logger::builder().is_test(true).try_init();

    let registry = FsTypeTable::new();
    let host = MemHost::new();

    let module = userfs_init(&registry).unwrap();
    assert_eq!(module.state(), ModuleState::Registered);

    let fs = registry.find("userfs").unwrap();
    assert!(std::ptr::eq(fs, &USERFS_FS_TYPE));
    assert!(fs.requires_dev());

    let root = fs.mount(&host, MountFlags::empty(), "loop0", b"mode=0750").unwrap();
    let inode = root.inode();
    assert!(inode.is_dir());
    assert_eq!(inode.nlink(), 2);
    assert_eq!(inode.mode().perm().bits(), 0o750);
    assert_eq!(inode.atime(), inode.ctime());
    {
        let mounts = host.mounts.lock().unwrap();
        assert_eq!(mounts[0].magic(), USERFS_MAGIC);
        assert!(mounts[0].is_valid());
    }

    let second = fs.mount(&host, MountFlags::RDONLY, "loop1", b"").unwrap();
    assert_ne!(second.inode().ino(), inode.ino());

    assert_eq!(
        fs.mount(&host, MountFlags::empty(), "sda", b"").unwrap_err(),
        UserfsError::MountHelperFailed(-ENXIO)
    );

    host.umount("loop0");
    host.umount("loop1");
    assert!(host.mounts.lock().unwrap().is_empty());

    userfs_exit(module).unwrap();
    assert!(registry.is_empty());

    // nothing left behind in the registry
    let module = userfs_init(&registry).unwrap();
    assert_eq!(module.state(), ModuleState::Registered);
    registry.unregister_filesystem(&USERFS_FS_TYPE).unwrap();
}
