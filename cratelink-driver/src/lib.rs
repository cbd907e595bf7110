mod connection;
pub use connection::*;
mod driver;
pub use driver::*;
mod error;
pub use error::*;
mod registry;
pub use registry::*;
mod url;
pub use url::*;
