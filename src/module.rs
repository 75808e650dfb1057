//! Registration of userfs with the host's filesystem-type registry

use log::{error, info};

use crate::{
    common::{UserfsError, UserfsResult},
    fstype::{userfs_kill_sb, userfs_mount},
    vfs::{FileSystemFlags, FileSystemType, FsRegistry},
};

/// The userfs filesystem type
///
/// Registration and unregistration must both name this very instance.
pub static USERFS_FS_TYPE: FileSystemType = FileSystemType {
    name: "userfs",
    // needs a disk to operate on
    fs_flags: FileSystemFlags::REQUIRES_DEV,
    mount: userfs_mount,
    kill_sb: userfs_kill_sb,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModuleState {
    Unregistered,
    Registered,
}

/// Module load/unload lifecycle
///
/// Calling [`activate`](Self::activate) and [`deactivate`](Self::deactivate)
/// once each is the supported usage; repeated calls simply reach the
/// registry again.
pub struct UserfsModule<'r> {
    registry: &'r dyn FsRegistry,
    fs_type: &'static FileSystemType,
    state: ModuleState,
}

impl<'r> UserfsModule<'r> {
    pub fn new(registry: &'r dyn FsRegistry) -> Self {
        Self::with_fs_type(registry, &USERFS_FS_TYPE)
    }

    pub fn with_fs_type(registry: &'r dyn FsRegistry, fs_type: &'static FileSystemType) -> Self {
        Self {
            registry,
            fs_type,
            state: ModuleState::Unregistered,
        }
    }

    pub fn state(&self) -> ModuleState {
        self.state
    }

    pub fn fs_type(&self) -> &'static FileSystemType {
        self.fs_type
    }

    /// Register the filesystem so the host recognizes it
    pub fn activate(&mut self) -> UserfsResult<()> {
        match self.registry.register_filesystem(self.fs_type) {
            Ok(()) => {
                info!("Successfully registered {}", self.fs_type.name);
                self.state = ModuleState::Registered;
                Ok(())
            }
            Err(code) => {
                error!("Failed to register {}. Error:[{}]", self.fs_type.name, code);
                Err(UserfsError::RegistrationFailed(code))
            }
        }
    }

    /// Unregister the filesystem
    ///
    /// The registry no longer holds the descriptor afterwards whatever the
    /// outcome, so the module always ends up unregistered.
    pub fn deactivate(&mut self) -> UserfsResult<()> {
        let res = self.registry.unregister_filesystem(self.fs_type);
        self.state = ModuleState::Unregistered;
        match res {
            Ok(()) => {
                info!("Successfully unregistered {}", self.fs_type.name);
                Ok(())
            }
            Err(code) => {
                error!("Failed to unregister {}. Error:[{}]", self.fs_type.name, code);
                Err(UserfsError::UnregistrationFailed(code))
            }
        }
    }
}

/// Module load: a failed registration fails the load
pub fn userfs_init(registry: &dyn FsRegistry) -> UserfsResult<UserfsModule<'_>> {
    let mut module = UserfsModule::new(registry);
    module.activate()?;
    Ok(module)
}

/// Module unload
pub fn userfs_exit(mut module: UserfsModule<'_>) -> UserfsResult<()> {
    module.deactivate()
}
