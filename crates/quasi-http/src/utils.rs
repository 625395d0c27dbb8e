//! Utility macros shared by the codec and protocol modules.

/// Returns early with an error if a condition is not met.
///
/// Works like `assert!`, but produces an `Err` instead of panicking. Used for
/// validation checks while encoding or decoding wire data.
///
/// # Example
///
/// ```ignore
/// ensure!(tag > 0, StreamError::InvalidTag(tag));
/// ```
macro_rules! ensure {
    ($predicate:expr, $error:expr) => {
        if !$predicate {
            return Err($error);
        }
    };
}

pub(crate) use ensure;
