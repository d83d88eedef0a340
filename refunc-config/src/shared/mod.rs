mod base;
mod lambda;
mod refunc;
mod s3;
mod sentry;

pub use base::*;
pub use lambda::*;
pub use refunc::*;
pub use s3::*;
pub use sentry::*;
