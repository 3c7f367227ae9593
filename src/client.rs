//! HTTP client integration point.
//!
//! This crate is not an HTTP client. [`ResponseSource`] is the seam a client
//! implements so that [`ResponseInterceptor`] can classify its error
//! responses before the caller consumes them.

use crate::error::{default_parser, ErrorParser, IdentityError, TierSelection};

/// A received response that can be classified.
pub trait ResponseSource {
    /// The client's error type; classified errors convert into it.
    type Error: From<IdentityError>;

    /// The response status code.
    fn status_code(&self) -> u16;

    /// Reads the body as text.
    ///
    /// Implementations that stream the body should buffer it, since
    /// [`ResponseInterceptor::exchange`] hands the same response on after
    /// classification.
    fn body_text(&mut self) -> Result<String, Self::Error>;
}

/// Classifies responses with a parser it was given.
#[derive(Clone, Copy, Debug)]
pub struct ResponseInterceptor<'a> {
    parser: &'a ErrorParser,
    selection: TierSelection,
}

impl<'a> ResponseInterceptor<'a> {
    /// Creates an interceptor consulting both tiers of `parser`.
    pub fn new(parser: &'a ErrorParser) -> Self {
        Self {
            parser,
            selection: TierSelection::Any,
        }
    }

    /// Restricts the tiers consulted.
    pub fn with_selection(mut self, selection: TierSelection) -> Self {
        self.selection = selection;
        self
    }

    /// The parser in use.
    pub fn parser(&self) -> &'a ErrorParser {
        self.parser
    }

    /// Raises the classified error for `response`, if any.
    ///
    /// # Errors
    /// Returns the classified error, or the response's own body-read error.
    pub fn check<R: ResponseSource>(&self, response: &mut R) -> Result<(), R::Error> {
        let status_code = response.status_code();
        self.parser
            .process(self.selection, status_code, || response.body_text())
    }

    /// Checks `response`, then hands it to `exchange`.
    ///
    /// # Errors
    /// Returns the classification or body-read error without calling
    /// `exchange`, or whatever `exchange` returns.
    pub fn exchange<R, T, F>(&self, mut response: R, exchange: F) -> Result<T, R::Error>
    where
        R: ResponseSource,
        F: FnOnce(R) -> Result<T, R::Error>,
    {
        self.check(&mut response)?;
        exchange(response)
    }
}

impl ResponseInterceptor<'static> {
    /// Creates an interceptor backed by the process-wide default parser.
    pub fn global() -> Self {
        Self::new(default_parser())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ApiErrorKind, ErrorCategory, IdsErrorKind};

    #[derive(Debug, PartialEq)]
    enum ClientError {
        Identity(IdentityError),
        Read(String),
    }

    impl From<IdentityError> for ClientError {
        fn from(error: IdentityError) -> Self {
            ClientError::Identity(error)
        }
    }

    struct StubResponse {
        status: u16,
        body: Result<String, String>,
        reads: usize,
    }

    impl StubResponse {
        fn new(status: u16, body: &str) -> Self {
            Self {
                status,
                body: Ok(body.to_string()),
                reads: 0,
            }
        }

        fn failing(status: u16, reason: &str) -> Self {
            Self {
                status,
                body: Err(reason.to_string()),
                reads: 0,
            }
        }
    }

    impl ResponseSource for StubResponse {
        type Error = ClientError;

        fn status_code(&self) -> u16 {
            self.status
        }

        fn body_text(&mut self) -> Result<String, ClientError> {
            self.reads += 1;
            self.body.clone().map_err(ClientError::Read)
        }
    }

    #[test]
    fn test_check_raises_classified_error() {
        let parser = ErrorParser::new();
        let interceptor = ResponseInterceptor::new(&parser);
        let mut response = StubResponse::new(400, "User is locked out");

        let result = interceptor.check(&mut response);
        match result {
            Err(ClientError::Identity(error)) => {
                assert_eq!(error.category(), ErrorCategory::Ids(IdsErrorKind::LockedAccount));
                assert_eq!(error.status_code(), Some(400));
            }
            other => panic!("expected classified error, got {:?}", other),
        }
        assert_eq!(response.reads, 1);
    }

    #[test]
    fn test_check_passes_unclassified_response() {
        let parser = ErrorParser::new();
        let interceptor = ResponseInterceptor::new(&parser);
        let mut response = StubResponse::new(500, "Database connection refused");

        assert_eq!(interceptor.check(&mut response), Ok(()));
    }

    #[test]
    fn test_check_propagates_read_error() {
        let parser = ErrorParser::new();
        let interceptor = ResponseInterceptor::new(&parser);
        let mut response = StubResponse::failing(400, "stream exhausted");

        assert_eq!(
            interceptor.check(&mut response),
            Err(ClientError::Read("stream exhausted".to_string()))
        );
    }

    #[test]
    fn test_selection_limits_tiers() {
        let parser = ErrorParser::new();
        let interceptor = ResponseInterceptor::new(&parser).with_selection(TierSelection::Ids);
        let mut response = StubResponse::new(409, "User_Already_Exists");

        assert_eq!(interceptor.check(&mut response), Ok(()));
    }

    #[test]
    fn test_exchange_runs_after_clean_check() {
        let parser = ErrorParser::new();
        let interceptor = ResponseInterceptor::new(&parser);
        let response = StubResponse::new(200, "{\"id\":1}");

        let body = interceptor
            .exchange(response, |mut response| response.body_text())
            .unwrap();
        assert_eq!(body, "{\"id\":1}");
    }

    #[test]
    fn test_exchange_skipped_on_classified_error() {
        let parser = ErrorParser::new();
        let interceptor = ResponseInterceptor::new(&parser);
        let response = StubResponse::new(409, "User_Already_Exists");

        let result: Result<(), ClientError> =
            interceptor.exchange(response, |_| panic!("exchange must not run"));
        match result {
            Err(ClientError::Identity(error)) => assert_eq!(
                error.category(),
                ErrorCategory::Api(ApiErrorKind::ProfileAlreadyExists)
            ),
            other => panic!("expected classified error, got {:?}", other),
        }
    }

    #[test]
    fn test_global_interceptor_uses_default_catalog() {
        let interceptor = ResponseInterceptor::global();
        assert!(!interceptor.parser().ids_rules().is_empty());
    }
}
