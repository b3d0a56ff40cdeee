/// Returns early with `$error` unless `$predicate` holds.
///
/// ```ignore
/// ensure!(length <= max_size, ParseError::body_too_large(length, max_size));
/// ```
macro_rules! ensure {
    ($predicate:expr, $error:expr) => {
        if !$predicate {
            return Err($error);
        }
    };
}

pub(crate) use ensure;
