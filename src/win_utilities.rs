use std::ffi::OsStr; // OS string
use std::iter::once;
use std::os::windows::ffi::OsStrExt; // OS String Extended (wide character)

/// Nul-terminated UTF-16 for the `W` family of Win32 calls.
pub fn win32_string( value : &str ) -> Vec<u16>
{
	OsStr::new( value ).encode_wide().chain( once( 0 ) ).collect()
}
