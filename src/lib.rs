// Library root
// -----------
// catsnap keeps funny pictures in an S3 bucket and their tags in DynamoDB.
// The binary (`main.rs`) is a thin CLI over this library.
//
// Module responsibilities:
// - `config`: the session object. Bootstraps the config files on first run
//   and hands out memoized service, bucket and table handles.
// - `prompt`: console prompts used by the first-run flow.
// - `backend`: traits the session uses to reach the cloud services.
// - `aws`: the real backend, over the AWS SDK.
// - `document`: table-backed document kinds (`Tag`, `Image`).
// - `ini`, `error`: small supporting pieces.
pub mod aws;
pub mod backend;
pub mod config;
pub mod document;
pub mod error;
pub mod ini;
pub mod prompt;

#[cfg(test)]
mod testing;

pub use config::{Config, ConfigPaths};
pub use error::{Error, Result};
