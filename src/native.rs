use libloading::Library;

use crate::error::{Error, Result};

/// A system library resolved by name, kept loaded for as long as this value lives.
pub struct NativeLibrary
{
	name : &'static str,
	library : Library,
}

impl NativeLibrary
{
	pub fn load(name : &'static str) -> Result<Self>
	{
		let library = unsafe { Library::new(name) }.map_err(|source| Error::LibraryLoad { name, source })?;
		log::debug!("loaded {}", name);
		Ok(NativeLibrary { name, library })
	}

	pub fn name(&self) -> &'static str
	{
		self.name
	}

	/// Looks up an exported function and copies its pointer out.
	///
	/// # Safety
	///
	/// `F` must be the `extern "system" fn` type of the export, and the pointer
	/// must not be called after this library is dropped.
	pub unsafe fn function<F : Copy>(&self, symbol : &'static str) -> Result<F>
	{
		let name = format!("{}\0", symbol);
		let function = self.library.get::<F>(name.as_bytes())
			.map_err(|source| Error::MissingExport { library : self.name, symbol, source })?;
		Ok(*function)
	}
}

#[cfg(test)]
mod tests
{
	use super::*;

	#[test]
	fn missing_library_names_itself()
	{
		match NativeLibrary::load("definitely_not_a_real_library_0x887a.dll")
		{
			Err(Error::LibraryLoad { name, .. }) => assert_eq!(name, "definitely_not_a_real_library_0x887a.dll"),
			Err(other) => panic!("unexpected error {:?}", other),
			Ok(_) => panic!("loaded a library that does not exist"),
		}
	}
}
