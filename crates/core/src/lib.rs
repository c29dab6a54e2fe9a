pub mod batch;
pub mod fetch;
pub mod inventory;
pub mod manager;
pub mod package;
pub mod process;
pub mod requirements;

pub use batch::{run_batch, BatchEvent, BatchReport};
pub use fetch::{fetch_descriptions, DescribePackage, DEFAULT_FETCH_CONCURRENCY};
pub use inventory::{installed_with_descriptions, Inventory};
pub use manager::PackageManager;
pub use package::{OutdatedEntry, OutdatedIndex, PackageRecord, PinnedPackage, Scope, NO_DESCRIPTION};
pub use process::{CommandOutput, CommandRunner, SystemRunner, DEFAULT_COMMAND_TIMEOUT};
pub use requirements::{find_requirements_files, normalize_name, read_requirements, RequirementSpec};
