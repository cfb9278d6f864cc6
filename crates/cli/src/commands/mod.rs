pub mod consolidate;
pub mod handle;
pub mod markings;
pub mod preview;
pub mod project;
pub mod runs;
pub mod scan;
pub mod util;

pub use consolidate::*;
pub use handle::*;
pub use markings::*;
pub use preview::*;
pub use project::*;
pub use runs::*;
pub use scan::*;
pub use util::*;
