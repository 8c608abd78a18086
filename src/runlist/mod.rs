//! Run lists: the concrete commands each pipeline phase executes.

mod builder;
mod entry;
mod resolve;

pub use builder::{build_entry, build_run_list, flags_from_list, parse_arguments, ARGS};
pub use entry::{Phase, RunList, RunListEntry, Status};
pub use resolve::resolve_path;
