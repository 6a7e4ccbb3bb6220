//! Result assertions shared by the integration tests

/// Unwrap an `Ok`, failing the test with the error otherwise
macro_rules! assert_ok {
    ($result:expr) => {
        match $result {
            Ok(value) => value,
            Err(e) => panic!("operation failed: {:?}", e),
        }
    };
}

/// Expect a `BackendError` carrying the given client-facing code
///
/// The code is what HTTP bodies and socket `error` events report.
macro_rules! assert_code {
    ($result:expr, $code:expr) => {
        match $result {
            Ok(value) => panic!("expected `{}`, operation succeeded with {:?}", $code, value),
            Err(e) => assert_eq!(e.code(), $code, "unexpected error: {:?}", e),
        }
    };
}
