//! Resolution of the AWS service endpoints the emulator talks to.

mod aws;
mod url;

pub use aws::*;
pub use url::*;
