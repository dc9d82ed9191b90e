mod config;
mod dispatch;
mod error;
mod fs_utils;
mod launchers;
mod layout;
mod lock;
mod manifest;
mod package_manager;
mod provision;
mod state_store;
mod sync;
mod update;

pub use config::{
    RuntimeConfig, AUTO_UPDATE_ENV, PYTHON_ENV, SELF_INSTALL_SOURCE_ENV, SELF_PACKAGE_NAME,
    UPDATE_TIMEOUT_ENV,
};
pub use dispatch::{
    run_launcher, CallableRegistry, CallableRunner, LaunchRequest, PythonCallableRunner,
    ResolvedCommand,
};
pub use error::{
    DispatchError, InstallationFailure, ProvisionError, StateError, SyncError, UpdateError,
};
pub use launchers::{
    is_valid_command_name, launcher_name_from_path, launcher_path, render_launcher,
    LauncherTemplate, LAUNCHER_SUFFIX,
};
pub use layout::{EnvironmentLayout, InstallLayout, ENVIRONMENT_SUBDIR, STATE_FILE_NAME};
pub use lock::EnvironmentLock;
pub use manifest::{
    find_distribution, parse_console_scripts, read_command_manifest, CommandDeclaration,
    InstalledDistribution,
};
pub use package_manager::{InstallRequest, PackageManager, PipPackageManager};
pub use provision::{EnvironmentProvisioner, VenvProvisioner};
pub use state_store::{load_state, save_state};
pub use sync::{synchronize, SyncReport};
pub use update::{refresh, RefreshOutcome, UpdateContext};
