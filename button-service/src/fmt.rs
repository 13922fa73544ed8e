//! Button log records
//!
//! Transitions are logged at `debug`, discarded samples at `trace`, creation and
//! teardown at `info`, and steady-state failures at `warn` or `error`. The
//! `defmt` and `log` features pick the backend; without either the records
//! compile away.

#[cfg(all(feature = "log", feature = "defmt", not(doc)))]
compile_error!("features `log` and `defmt` are mutually exclusive");

#[cfg(all(not(doc), feature = "defmt"))]
mod defmt {
    /// `defmt` backend for trace records
    #[macro_export]
    #[collapse_debuginfo(yes)]
    macro_rules! trace {
        ($s:literal $(, $x:expr)* $(,)?) => {
            ::defmt::trace!($s $(, $x)*)
        };
    }

    /// `defmt` backend for debug records
    #[macro_export]
    #[collapse_debuginfo(yes)]
    macro_rules! debug {
        ($s:literal $(, $x:expr)* $(,)?) => {
            ::defmt::debug!($s $(, $x)*)
        };
    }

    /// `defmt` backend for info records
    #[macro_export]
    #[collapse_debuginfo(yes)]
    macro_rules! info {
        ($s:literal $(, $x:expr)* $(,)?) => {
            ::defmt::info!($s $(, $x)*)
        };
    }

    /// `defmt` backend for warnings
    #[macro_export]
    #[collapse_debuginfo(yes)]
    macro_rules! warn {
        ($s:literal $(, $x:expr)* $(,)?) => {
            ::defmt::warn!($s $(, $x)*)
        };
    }

    /// `defmt` backend for errors
    #[macro_export]
    #[collapse_debuginfo(yes)]
    macro_rules! error {
        ($s:literal $(, $x:expr)* $(,)?) => {
            ::defmt::error!($s $(, $x)*)
        };
    }
}

#[cfg(all(not(doc), feature = "log"))]
mod log {
    /// `log` backend for trace records
    #[macro_export]
    #[collapse_debuginfo(yes)]
    macro_rules! trace {
        ($s:literal $(, $x:expr)* $(,)?) => {
            ::log::trace!($s $(, $x)*)
        };
    }

    /// `log` backend for debug records
    #[macro_export]
    #[collapse_debuginfo(yes)]
    macro_rules! debug {
        ($s:literal $(, $x:expr)* $(,)?) => {
            ::log::debug!($s $(, $x)*)
        };
    }

    /// `log` backend for info records
    #[macro_export]
    #[collapse_debuginfo(yes)]
    macro_rules! info {
        ($s:literal $(, $x:expr)* $(,)?) => {
            ::log::info!($s $(, $x)*)
        };
    }

    /// `log` backend for warnings
    #[macro_export]
    #[collapse_debuginfo(yes)]
    macro_rules! warn {
        ($s:literal $(, $x:expr)* $(,)?) => {
            ::log::warn!($s $(, $x)*)
        };
    }

    /// `log` backend for errors
    #[macro_export]
    #[collapse_debuginfo(yes)]
    macro_rules! error {
        ($s:literal $(, $x:expr)* $(,)?) => {
            ::log::error!($s $(, $x)*)
        };
    }
}

// `cargo doc` documents this set
#[cfg(any(doc, not(any(feature = "defmt", feature = "log"))))]
mod none {
    /// Trace records compiled out, arguments only borrowed
    #[macro_export]
    #[collapse_debuginfo(yes)]
    macro_rules! trace {
        ($s:literal $(, $x:expr)* $(,)?) => {{
            let _ = ($( & $x ),*);
        }};
    }

    /// Debug records compiled out, arguments only borrowed
    #[macro_export]
    #[collapse_debuginfo(yes)]
    macro_rules! debug {
        ($s:literal $(, $x:expr)* $(,)?) => {{
            let _ = ($( & $x ),*);
        }};
    }

    /// Info records compiled out, arguments only borrowed
    #[macro_export]
    #[collapse_debuginfo(yes)]
    macro_rules! info {
        ($s:literal $(, $x:expr)* $(,)?) => {{
            let _ = ($( & $x ),*);
        }};
    }

    /// Warnings compiled out, arguments only borrowed
    #[macro_export]
    #[collapse_debuginfo(yes)]
    macro_rules! warn {
        ($s:literal $(, $x:expr)* $(,)?) => {{
            let _ = ($( & $x ),*);
        }};
    }

    /// Errors compiled out, arguments only borrowed
    #[macro_export]
    #[collapse_debuginfo(yes)]
    macro_rules! error {
        ($s:literal $(, $x:expr)* $(,)?) => {{
            let _ = ($( & $x ),*);
        }};
    }
}
