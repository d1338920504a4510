//! Standard exit codes for CLI operations
//!
//! These exit codes follow Unix conventions and sysexits.h where applicable.

/// Success - deployment published or already up to date
pub const SUCCESS: i32 = 0;

/// General error - unspecified failure
pub const ERROR: i32 = 1;

/// Invalid input - missing or malformed parameters or configuration file
pub const INVALID_INPUT: i32 = 2;

/// Deployment failed - the attempt ended with a `Failed` outcome
pub const DEPLOYMENT_FAILED: i32 = 3;

/// Credential error - the identity provider or the store rejected the credential
pub const CREDENTIAL_ERROR: i32 = 4;

/// Usage error - invalid arguments or options (following sysexits.h convention)
pub const USAGE_ERROR: i32 = 64;
