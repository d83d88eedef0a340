use thiserror::Error;

/// Configuration validation errors.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// The lambda port must be a bindable, non-zero port.
    #[error("`lambda.port` cannot be zero")]
    LambdaPortZero,
    /// The invoke binary must name something to execute.
    #[error("`lambda.invoke_binary` cannot be empty")]
    EmptyInvokeBinary,
    /// An S3 override was configured without an endpoint.
    #[error("Invalid S3 config: `endpoint` must be set when the `s3` section is present")]
    EmptyS3Endpoint,
}
