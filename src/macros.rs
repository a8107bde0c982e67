#[cfg(feature = "trace_bt")]
extern crate backtrace;

#[cfg(feature = "trace_bt")]
#[macro_export]
#[doc(hidden)]
macro_rules! render_trace {
    ($fmt:expr) => {
         let bt = ::backtrace::Backtrace::new();
         ::log::trace!( concat!($fmt, " at {:?}"), bt );
    };
    ($fmt:expr, $( $args:expr ),*) => {
         let bt = ::backtrace::Backtrace::new();
         ::log::trace!( concat!($fmt, " at {:?}"), $( $args ),* , bt );
    };
}
#[cfg(not(feature = "trace_bt"))]
#[macro_export]
#[doc(hidden)]
macro_rules! render_trace {
    ($fmt:expr) => { ::log::trace!($fmt); };
    ($fmt:expr, $( $args:expr ),*) => { ::log::trace!($fmt, $( $args ),*); };
}

/// Like `render_trace!`, but never attaches a backtrace.
#[macro_export]
#[doc(hidden)]
macro_rules! render_trace_quiet {
    ($fmt:expr) => { ::log::trace!($fmt); };
    ($fmt:expr, $( $args:expr ),*) => { ::log::trace!($fmt, $( $args ),*); };
}
