//! HLSL compilation through `d3dcompiler_47.dll`, plus `ID3DBlob` access.

use std::{
	ffi::{c_char, c_void, CString},
	fs,
	path::Path,
	ptr, slice,
};

use bitflags::bitflags;

use crate::{
	com::ComPtr,
	error::{Error, Result, HRESULT, succeeded},
	native::NativeLibrary,
};

pub const LIBRARY : &str = "d3dcompiler_47.dll";

pub mod slot
{
	// ID3DBlob
	pub const BLOB_GET_BUFFER_POINTER : usize = 3;
	pub const BLOB_GET_BUFFER_SIZE : usize = 4;
}

bitflags! {
	pub struct CompileFlags : u32 {
		const DEBUG = 0x1;
		const SKIP_VALIDATION = 0x2;
		const SKIP_OPTIMIZATION = 0x4;
		const ENABLE_STRICTNESS = 0x800;
		const WARNINGS_ARE_ERRORS = 0x40000;
	}
}

impl CompileFlags
{
	/// Strict compilation, with debug info and no optimization in debug builds.
	pub fn for_build() -> Self
	{
		if cfg!(debug_assertions)
		{
			CompileFlags::ENABLE_STRICTNESS | CompileFlags::DEBUG | CompileFlags::SKIP_OPTIMIZATION
		}
		else
		{
			CompileFlags::ENABLE_STRICTNESS
		}
	}
}

pub type D3DCompileFn = unsafe extern "system" fn(
	src_data : *const c_void,
	src_data_size : usize,
	source_name : *const c_char,
	defines : *const c_void,
	include : *mut c_void,
	entry_point : *const c_char,
	target : *const c_char,
	flags1 : u32,
	flags2 : u32,
	code : *mut *mut c_void,
	error_msgs : *mut *mut c_void) -> HRESULT;

/// `ID3DBlob::GetBufferPointer`.
///
/// # Safety
///
/// `blob` must be an `ID3DBlob`.
pub unsafe fn blob_pointer(blob : &ComPtr) -> Result<*mut c_void>
{
	blob.call::<*mut c_void, _>(slot::BLOB_GET_BUFFER_POINTER, ())
}

/// `ID3DBlob::GetBufferSize`.
///
/// # Safety
///
/// `blob` must be an `ID3DBlob`.
pub unsafe fn blob_size(blob : &ComPtr) -> Result<usize>
{
	blob.call::<usize, _>(slot::BLOB_GET_BUFFER_SIZE, ())
}

/// The blob contents, borrowed for as long as the handle is.
///
/// # Safety
///
/// `blob` must be an `ID3DBlob`.
pub unsafe fn blob_bytes(blob : &ComPtr) -> Result<&[u8]>
{
	let data = blob_pointer(blob)?;
	let size = blob_size(blob)?;
	if data.is_null() || size == 0
	{
		return Ok(&[]);
	}
	Ok(slice::from_raw_parts(data as *const u8, size))
}

/// Compiler output text, trimmed at the first nul.
///
/// # Safety
///
/// `blob` must be an `ID3DBlob`.
pub unsafe fn blob_text(blob : &ComPtr) -> Result<String>
{
	let bytes = blob_bytes(blob)?;
	let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
	Ok(String::from_utf8_lossy(&bytes[..end]).trim_end().to_owned())
}

/// `d3dcompiler_47.dll` with its `D3DCompile` export.
pub struct ShaderCompiler
{
	_library : NativeLibrary,
	compile : D3DCompileFn,
}

impl ShaderCompiler
{
	pub fn load() -> Result<Self>
	{
		let library = NativeLibrary::load(LIBRARY)?;
		let compile = unsafe { library.function::<D3DCompileFn>("D3DCompile")? };
		Ok(ShaderCompiler { _library : library, compile })
	}

	/// Reads HLSL from `path` and compiles one entry point. Returns the bytecode blob.
	pub fn compile_file(&self, path : &Path, entry_point : &str, target : &str, flags : CompileFlags) -> Result<ComPtr>
	{
		let source = fs::read_to_string(path).map_err(|source| Error::ShaderSource { path : path.display().to_string(), source })?;
		self.compile(&source, &path.display().to_string(), entry_point, target, flags)
	}

	pub fn compile(&self, source : &str, source_name : &str, entry_point : &str, target : &str, flags : CompileFlags) -> Result<ComPtr>
	{
		let c_string = |text : &str| CString::new(text).map_err(|_| Error::ShaderCompile
		{
			entry_point : entry_point.to_owned(),
			message : format!("{:?} contains a nul byte", text),
		});
		let source_name = c_string(source_name)?;
		let entry = c_string(entry_point)?;
		let target = c_string(target)?;

		let mut code = ComPtr::null();
		let mut errors = ComPtr::null();
		let hr = unsafe
		{
			(self.compile)(
				source.as_ptr() as *const c_void,
				source.len(),
				source_name.as_ptr(),
				ptr::null(),
				ptr::null_mut(),
				entry.as_ptr(),
				target.as_ptr(),
				flags.bits(),
				0,
				code.mut_void(),
				errors.mut_void())
		};

		let diagnostics = if errors.is_null() { String::new() } else { unsafe { blob_text(&errors) }.unwrap_or_default() };
		errors.release();

		if !succeeded(hr) || code.is_null()
		{
			code.release();
			let message = if diagnostics.is_empty() { format!("D3DCompile failed: 0x{:08X}", hr) } else { diagnostics };
			return Err(Error::ShaderCompile { entry_point : entry_point.to_owned(), message });
		}

		if !diagnostics.is_empty()
		{
			log::warn!("{}: {}", entry_point, diagnostics);
		}
		log::debug!("compiled {} for {}", entry_point, target.to_string_lossy());
		Ok(code)
	}
}
