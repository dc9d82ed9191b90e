use clap::error::ErrorKind;
use upscript_core::InvalidPackageName;
use upscript_installer::{
    DispatchError, InstallationFailure, ProvisionError, StateError, SyncError, UpdateError,
};

pub(crate) const EXIT_FAILURE: u8 = 1;
pub(crate) const EXIT_USAGE: u8 = 10;
pub(crate) const EXIT_INVALID_PACKAGE_NAME: u8 = 11;
pub(crate) const EXIT_INSTALL_FAILED: u8 = 12;
pub(crate) const EXIT_ENTRY_POINT_NOT_FOUND: u8 = 13;
pub(crate) const EXIT_BAD_STATE: u8 = 14;

pub(crate) fn usage_exit_code(err: &clap::Error) -> u8 {
    match err.kind() {
        ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => 0,
        _ => EXIT_USAGE,
    }
}

/// Exit code for a failed command, taken from the most specific typed error
/// found in the chain.
pub(crate) fn exit_code_for_error(err: &anyhow::Error) -> u8 {
    if err.chain().any(|cause| is_bad_state(cause)) {
        return EXIT_BAD_STATE;
    }

    for cause in err.chain() {
        if cause.is::<InvalidPackageName>() {
            return EXIT_INVALID_PACKAGE_NAME;
        }
        if let Some(DispatchError::EntryPointNotFound { .. }) =
            cause.downcast_ref::<DispatchError>()
        {
            return EXIT_ENTRY_POINT_NOT_FOUND;
        }
        if cause.is::<UpdateError>()
            || cause.is::<SyncError>()
            || cause.is::<ProvisionError>()
            || cause.is::<InstallationFailure>()
        {
            return EXIT_INSTALL_FAILED;
        }
    }
    EXIT_FAILURE
}

pub(crate) fn find_installation_failure(err: &anyhow::Error) -> Option<&InstallationFailure> {
    err.chain().find_map(|cause| {
        cause.downcast_ref::<InstallationFailure>().or_else(|| {
            cause
                .downcast_ref::<UpdateError>()
                .and_then(UpdateError::installation_failure)
        })
    })
}

/// Child exit codes outside a byte collapse to a generic failure.
pub(crate) fn exit_status_byte(code: i32) -> u8 {
    u8::try_from(code).unwrap_or(EXIT_FAILURE)
}

// The wrapping variants are transparent, so the inner state error never shows
// up in the chain on its own.
fn is_bad_state(cause: &(dyn std::error::Error + 'static)) -> bool {
    let state = cause
        .downcast_ref::<StateError>()
        .or_else(|| match cause.downcast_ref::<UpdateError>() {
            Some(UpdateError::State(state)) => Some(state),
            _ => None,
        })
        .or_else(|| match cause.downcast_ref::<SyncError>() {
            Some(SyncError::State(state)) => Some(state),
            _ => None,
        })
        .or_else(|| match cause.downcast_ref::<DispatchError>() {
            Some(DispatchError::State(state)) => Some(state),
            _ => None,
        });
    matches!(
        state,
        Some(StateError::CorruptState { .. } | StateError::UnsupportedSchema { .. })
    )
}
