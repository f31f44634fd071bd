use std::fmt::{Display, Formatter};

pub type DynError = Box<dyn std::error::Error + Send + Sync + 'static>;
pub type Result<T> = std::result::Result<T, DynError>;

/// Attach a lazily built message to a failing result.
pub trait Context<T> {
    fn with_ctx<F: FnOnce() -> String>(self, f: F) -> Result<T>;
}

#[derive(Debug)]
pub struct WithContextError {
    pub context: String,
    pub source: DynError,
}

impl Display for WithContextError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.context, self.source)
    }
}

impl std::error::Error for WithContextError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&*self.source)
    }
}

impl<T, E> Context<T> for std::result::Result<T, E>
where
    E: std::error::Error + Send + Sync + 'static,
{
    fn with_ctx<F: FnOnce() -> String>(self, f: F) -> Result<T> {
        self.map_err(|e| {
            Box::new(WithContextError {
                context: f(),
                source: e.into(),
            }) as DynError
        })
    }
}

#[derive(Debug)]
pub struct SimpleError(pub String);

impl SimpleError {
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }
}

impl std::fmt::Display for SimpleError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for SimpleError {}

pub fn simple_error(msg: impl Into<String>) -> DynError {
    Box::new(SimpleError::new(msg))
}

/// The input stream closed while a value was still expected.
#[derive(Debug)]
pub struct EndOfInput;

impl Display for EndOfInput {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "end of input")
    }
}

impl std::error::Error for EndOfInput {}

/// True when `err` (or a context wrapper around it) reports a closed input stream.
pub fn is_end_of_input(err: &DynError) -> bool {
    if err.downcast_ref::<EndOfInput>().is_some() {
        return true;
    }
    match err.downcast_ref::<WithContextError>() {
        Some(wrapped) => is_end_of_input(&wrapped.source),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn context_prefixes_message_and_keeps_source() {
        let res: std::result::Result<(), std::io::Error> =
            Err(std::io::Error::new(std::io::ErrorKind::Other, "disk gone"));
        let err = res.with_ctx(|| "read theme".to_string()).unwrap_err();
        assert_eq!(err.to_string(), "read theme: disk gone");
        assert!(err.source().is_some());
    }

    #[test]
    fn end_of_input_is_detected_through_context() {
        let plain: DynError = Box::new(EndOfInput);
        assert!(is_end_of_input(&plain));

        let wrapped: std::result::Result<(), EndOfInput> = Err(EndOfInput);
        let wrapped = wrapped.with_ctx(|| "student name".to_string()).unwrap_err();
        assert!(is_end_of_input(&wrapped));

        assert!(!is_end_of_input(&simple_error("nope")));
    }
}
