mod builder;
mod fetch;
mod selection;
mod snapshot;
mod types;

pub use builder::build_catalog;
pub use fetch::{fetch_patch_list, inflate_patch_list, parse_patch_list};
pub use selection::{available_versions, select_versions};
pub use snapshot::save_snapshot;
pub use types::{PatchList, PatchListEntry};
