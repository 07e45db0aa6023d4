mod config;
mod metadata;
mod record;
mod region;

pub use config::Config;
pub use metadata::{MetaValue, Metadata};
pub use record::{Record, Strand};
pub use region::Region;
