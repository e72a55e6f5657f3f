use crate::transport::FetchError;

/// A stage result that always carries a usable value.
///
/// `Degraded` holds the default the stage fell back to along with the cause,
/// so callers can keep going while tests can still inspect what went wrong.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome<T> {
    Ok(T),
    Degraded { value: T, cause: FetchError },
}

impl<T> Outcome<T> {
    pub fn from_result(result: Result<T, FetchError>, fallback: impl FnOnce() -> T) -> Self {
        match result {
            Ok(value) => Outcome::Ok(value),
            Err(cause) => Outcome::Degraded {
                value: fallback(),
                cause,
            },
        }
    }

    pub fn cause(&self) -> Option<&FetchError> {
        match self {
            Outcome::Ok(_) => None,
            Outcome::Degraded { cause, .. } => Some(cause),
        }
    }

    pub fn into_value(self) -> T {
        match self {
            Outcome::Ok(value) | Outcome::Degraded { value, .. } => value,
        }
    }
}
