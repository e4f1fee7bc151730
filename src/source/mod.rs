pub mod launchpad;
pub mod traits;

pub use launchpad::LaunchpadSource;
pub use traits::{default_series, BugSource};
