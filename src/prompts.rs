//! Colored status output macros
//!
//! Every macro writes to stderr: stdout carries only the text captured from
//! `security`, so callers can pipe it. Termcolor errors are ignored with
//! `let _ =`; a closed stderr must not abort provisioning.

#[doc(hidden)]
#[macro_export]
macro_rules! __status_line {
    ($color:ident, $prefix:expr, $($arg:tt)*) => {{
        use ::std::io::Write as _;
        use ::termcolor::WriteColor as _;
        let bufwtr = ::termcolor::BufferWriter::stderr(::termcolor::ColorChoice::Auto);
        let mut buffer = bufwtr.buffer();
        let _ = buffer.set_color(
            ::termcolor::ColorSpec::new().set_fg(Some(::termcolor::Color::$color)),
        );
        let _ = write!(&mut buffer, "{}", $prefix);
        let _ = buffer.reset();
        let _ = writeln!(&mut buffer, $($arg)*);
        let _ = bufwtr.print(&buffer);
    }};
}

/// Warning, yellow
#[macro_export]
macro_rules! warn {
    ($($arg:tt)*) => { $crate::__status_line!(Yellow, "⚠️  ", $($arg)*) };
}

/// Error, red
#[macro_export]
macro_rules! error {
    ($($arg:tt)*) => { $crate::__status_line!(Red, "❌ ", $($arg)*) };
}

/// Success, green
#[macro_export]
macro_rules! success {
    ($($arg:tt)*) => { $crate::__status_line!(Green, "✓ ", $($arg)*) };
}

/// Progress line, blue
#[macro_export]
macro_rules! step {
    ($($arg:tt)*) => { $crate::__status_line!(Blue, "→ ", $($arg)*) };
}
