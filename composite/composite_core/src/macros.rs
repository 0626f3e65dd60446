//! Convenience macros.

/// Log an event at a level chosen at runtime.
///
/// `tracing` callsites need a constant level, so the macro dispatches on a
/// [`LogLevel`](crate::utils::LogLevel) to the matching `tracing` macro.
/// Fields are passed through as structured key/value pairs.
///
/// # Examples
///
/// ```
/// use composite_core::log_event;
/// use composite_core::utils::LogLevel;
///
/// log_event!(LogLevel::Info, "composite installed");
///
/// log_event!(LogLevel::Debug, "visibility decided",
///     client => 4,
///     visible => false,
/// );
/// ```
#[macro_export]
macro_rules! log_event {
    ($level:expr, $message:expr) => {
        {
            use $crate::utils::LogLevel;
            match $level {
                LogLevel::Error => tracing::error!("{}", $message),
                LogLevel::Warning => tracing::warn!("{}", $message),
                LogLevel::Info => tracing::info!("{}", $message),
                LogLevel::Debug => tracing::debug!("{}", $message),
                LogLevel::Trace => tracing::trace!("{}", $message),
            }
        }
    };

    ($level:expr, $message:expr, $($key:ident => $value:expr),+ $(,)?) => {
        {
            use $crate::utils::LogLevel;
            match $level {
                LogLevel::Error => tracing::error!($($key = %$value),+, "{}", $message),
                LogLevel::Warning => tracing::warn!($($key = %$value),+, "{}", $message),
                LogLevel::Info => tracing::info!($($key = %$value),+, "{}", $message),
                LogLevel::Debug => tracing::debug!($($key = %$value),+, "{}", $message),
                LogLevel::Trace => tracing::trace!($($key = %$value),+, "{}", $message),
            }
        }
    };
}
