//! Console output macros.
//!
//! A real MIPS port's early console (the machine's UART) is out of scope
//! for this crate, same as the rest of [`crate::hal`]; `print!`/`println!`
//! route through the structured log service instead of a raw byte sink, so
//! kernel output always ends up in the one place ([`crate::log_service`])
//! this crate can actually inspect in a test.

#[macro_export]
macro_rules! println {
    () => ($crate::print!("\n"));
    ($($arg:tt)*) => ($crate::print!("{}\n", format_args!($($arg)*)));
}

#[cfg(not(target_os = "none"))]
#[macro_export]
macro_rules! print {
    ($($arg:tt)*) => {
        ::std::print!($($arg)*)
    };
}

#[cfg(target_os = "none")]
#[macro_export]
macro_rules! print {
    ($($arg:tt)*) => {
        log::info!(target: "console", $($arg)*)
    };
}
