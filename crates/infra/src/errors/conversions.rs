//! Conversions from external infrastructure errors into domain errors.

use courier_domain::CourierError;
use reqwest::Error as HttpError;

/// Error newtype that keeps conversions on the infrastructure side and can be
/// converted back into the domain error.
#[derive(Debug)]
pub struct InfraError(pub CourierError);

impl From<InfraError> for CourierError {
    fn from(value: InfraError) -> Self {
        value.0
    }
}

impl From<CourierError> for InfraError {
    fn from(value: CourierError) -> Self {
        Self(value)
    }
}

/// Extension trait to make the conversion logic explicit in tests and within
/// this module.
trait IntoCourierError {
    fn into_courier(self) -> CourierError;
}

/* -------------------------------------------------------------------------- */
/* reqwest::Error → CourierError */
/* -------------------------------------------------------------------------- */

impl IntoCourierError for HttpError {
    fn into_courier(self) -> CourierError {
        if self.is_timeout() {
            return CourierError::Network("HTTP request timed out".into());
        }

        #[cfg(not(target_arch = "wasm32"))]
        if self.is_connect() {
            return CourierError::Network("HTTP connection failure".into());
        }

        if self.is_decode() {
            return CourierError::Decode(format!("HTTP body could not be decoded: {self}"));
        }

        if self.is_builder() {
            return CourierError::Config(format!("invalid HTTP request: {self}"));
        }

        if let Some(status) = self.status() {
            return CourierError::Network(format!(
                "HTTP {} {}",
                status.as_u16(),
                status.canonical_reason().unwrap_or("unknown status")
            ));
        }

        CourierError::Network(self.to_string())
    }
}

impl From<HttpError> for InfraError {
    fn from(value: HttpError) -> Self {
        Self(value.into_courier())
    }
}

/* -------------------------------------------------------------------------- */
/* std::io::Error → CourierError */
/* -------------------------------------------------------------------------- */

impl IntoCourierError for std::io::Error {
    fn into_courier(self) -> CourierError {
        CourierError::Config(format!("I/O failure: {self}"))
    }
}

impl From<std::io::Error> for InfraError {
    fn from(value: std::io::Error) -> Self {
        Self(value.into_courier())
    }
}

/* -------------------------------------------------------------------------- */
/* Tests */
/* -------------------------------------------------------------------------- */
