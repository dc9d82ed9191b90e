mod callable;
mod name;
mod state;

pub use callable::{Callable, InvalidCallableRef};
pub use name::{normalize_package_name, InvalidPackageName, PackageName};
pub use state::{
    parse_state_document, render_state_document, ClientPackage, EntryPointRecord, StateDocument,
    StateParseError, STATE_SCHEMA_VERSION,
};
