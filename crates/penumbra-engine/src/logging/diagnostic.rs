/// Logs at `info` when `$verbose` is set, `debug` otherwise.
///
/// Used for engine diagnostics that the `debug` configuration flag promotes.
macro_rules! diagnostic {
    ($verbose:expr, $($arg:tt)+) => {
        if $verbose {
            log::info!($($arg)+)
        } else {
            log::debug!($($arg)+)
        }
    };
}

pub(crate) use diagnostic;
