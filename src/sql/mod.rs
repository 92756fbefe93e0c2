//! Safe SQL builder: identifiers from static schema tables only, values as parameters.

mod builder;
mod params;
pub use builder::*;
pub use params::*;
