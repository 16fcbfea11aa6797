use thiserror::Error;

/// Native status code returned by COM methods and D3D exports.
#[allow(non_camel_case_types)]
pub type HRESULT = i32;

pub const S_OK : HRESULT = 0;
pub const E_FAIL : HRESULT = 0x8000_4005_u32 as HRESULT;
pub const E_NOINTERFACE : HRESULT = 0x8000_4002_u32 as HRESULT;
pub const DXGI_ERROR_NOT_FOUND : HRESULT = 0x887A_0002_u32 as HRESULT;
pub const DXGI_ERROR_SDK_COMPONENT_MISSING : HRESULT = 0x887A_002D_u32 as HRESULT;

#[derive(Error, Debug)]
pub enum Error
{
	/// The text is not a canonical 8-4-4-4-12 hexadecimal identifier.
	#[error("malformed interface identifier: {0:?}")]
	MalformedIdentifier(String),

	#[error("{operation} failed: 0x{hresult:08X}")]
	Native
	{
		operation : &'static str,
		hresult : HRESULT,
	},

	/// A method was called through a handle that was never created or was already released.
	#[error("native handle is null")]
	NullHandle,

	#[error("all {tried} candidates failed; last failure: {last_failure}")]
	AllCandidatesFailed
	{
		tried : usize,
		last_failure : String,
	},

	#[error("no plausible result from vtable slots {candidates:?}")]
	SlotProbeFailed
	{
		candidates : Vec<usize>,
	},

	#[error("failed to load {name}: {source}")]
	LibraryLoad
	{
		name : &'static str,
		#[source]
		source : libloading::Error,
	},

	#[error("{library} does not export {symbol}: {source}")]
	MissingExport
	{
		library : &'static str,
		symbol : &'static str,
		#[source]
		source : libloading::Error,
	},

	#[error("failed to read shader source {path}: {source}")]
	ShaderSource
	{
		path : String,
		#[source]
		source : std::io::Error,
	},

	#[error("shader compilation failed for {entry_point}: {message}")]
	ShaderCompile
	{
		entry_point : String,
		message : String,
	},

	#[error("window creation failed: {0}")]
	Window(#[source] std::io::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

pub fn succeeded(hr : HRESULT) -> bool
{
	hr >= 0
}

pub fn failed(hr : HRESULT) -> bool
{
	hr < 0
}

/// Turns a failing status into `Error::Native`, passing success codes (including `S_FALSE`) through.
pub fn check(hr : HRESULT, operation : &'static str) -> Result<HRESULT>
{
	if succeeded(hr)
	{
		Ok(hr)
	}
	else
	{
		Err(Error::Native { operation, hresult : hr })
	}
}

/// `HRESULT_FROM_WIN32`: wraps a Win32 error code in the `FACILITY_WIN32` failure space.
pub fn hresult_from_win32(code : u32) -> HRESULT
{
	if code as HRESULT <= 0
	{
		code as HRESULT
	}
	else
	{
		((code & 0x0000_FFFF) | 0x8007_0000) as HRESULT
	}
}

/// `Error::Native` for a failed Win32 call, built from the thread's last error.
pub fn last_os_error(operation : &'static str) -> Error
{
	let code = std::io::Error::last_os_error().raw_os_error().unwrap_or(0);
	Error::Native { operation, hresult : hresult_from_win32(code as u32) }
}

#[cfg(test)]
mod tests
{
	use super::*;

	#[test]
	fn check_passes_success_codes_through()
	{
		assert_eq!(check(S_OK, "Present").unwrap(), S_OK);
		assert_eq!(check(1, "Present").unwrap(), 1);
	}

	#[test]
	fn check_reports_operation_and_status()
	{
		let err = check(E_FAIL, "CreateCommandQueue").unwrap_err();
		match err
		{
			Error::Native { operation, hresult } =>
			{
				assert_eq!(operation, "CreateCommandQueue");
				assert_eq!(hresult, E_FAIL);
			},
			other => panic!("unexpected error {:?}", other),
		}
	}

	#[test]
	fn native_error_formats_as_unsigned_hex()
	{
		let err = Error::Native { operation : "CreateSwapChain", hresult : DXGI_ERROR_SDK_COMPONENT_MISSING };
		assert_eq!(err.to_string(), "CreateSwapChain failed: 0x887A002D");
	}

	#[test]
	fn failed_is_the_sign_bit()
	{
		assert!(failed(E_NOINTERFACE));
		assert!(failed(DXGI_ERROR_NOT_FOUND));
		assert!(!failed(S_OK));
	}

	#[test]
	fn win32_codes_map_into_facility_win32()
	{
		assert_eq!(hresult_from_win32(0), S_OK);
		assert_eq!(hresult_from_win32(5), 0x8007_0005_u32 as HRESULT);
		assert!(failed(hresult_from_win32(6)));
	}
}
