/// Error handling across the workspace is based on anyhow
pub use anyhow::{anyhow, bail, ensure, Context, Error, Result};
