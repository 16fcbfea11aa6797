use std::{ffi::c_void, fmt, ptr};

use crate::{
	error::{check, Error, Result, HRESULT},
	guid::Guid,
	vtable::{self, Arguments, RawObject, StructReturn},
};

/// `IUnknown` slots, shared by every COM interface.
pub mod slot
{
	pub const QUERY_INTERFACE : usize = 0;
	pub const ADD_REF : usize = 1;
	pub const RELEASE : usize = 2;
}

/// An owned, nullable reference to a COM object.
///
/// The handle starts null, is filled by exactly one creating call (usually
/// through [`ComPtr::mut_void`]), and is released explicitly during teardown.
/// Releasing nulls the handle, so a second release is a no-op.
pub struct ComPtr
{
	raw : *mut c_void,
}

impl ComPtr
{
	pub fn null() -> Self
	{
		ComPtr { raw : ptr::null_mut() }
	}

	/// Takes ownership of one reference.
	///
	/// # Safety
	///
	/// `raw` must be null or a live COM object whose reference the caller hands over.
	pub unsafe fn from_raw(raw : *mut c_void) -> Self
	{
		ComPtr { raw }
	}

	pub fn is_null(&self) -> bool
	{
		self.raw.is_null()
	}

	pub fn as_raw(&self) -> *mut c_void
	{
		self.raw
	}

	/// Out-parameter target for the `void**` of a creating call.
	pub fn mut_void(&mut self) -> *mut *mut c_void
	{
		debug_assert!(self.raw.is_null(), "overwriting a live handle leaks it");
		&mut self.raw
	}

	pub fn object(&self) -> Result<RawObject>
	{
		RawObject::from_raw(self.raw).ok_or(Error::NullHandle)
	}

	/// # Safety
	///
	/// `slot` and `args` must match the native method, see [`vtable::invoke`].
	pub unsafe fn call<R, A : Arguments>(&self, slot : usize, args : A) -> Result<R>
	{
		Ok(vtable::invoke::<R, A>(self.object()?, slot, args))
	}

	/// Raw status, failures included.
	///
	/// # Safety
	///
	/// See [`ComPtr::call`].
	pub unsafe fn call_status<A : Arguments>(&self, slot : usize, args : A) -> Result<HRESULT>
	{
		Ok(vtable::invoke_returning_status(self.object()?, slot, args))
	}

	/// Status checked with [`check`], so a failing call becomes `Error::Native`.
	///
	/// # Safety
	///
	/// See [`ComPtr::call`].
	pub unsafe fn call_checked<A : Arguments>(&self, slot : usize, operation : &'static str, args : A) -> Result<HRESULT>
	{
		check(self.call_status(slot, args)?, operation)
	}

	/// # Safety
	///
	/// See [`ComPtr::call`].
	pub unsafe fn call_nothing<A : Arguments>(&self, slot : usize, args : A) -> Result<()>
	{
		vtable::invoke_returning_nothing(self.object()?, slot, args);
		Ok(())
	}

	/// # Safety
	///
	/// See [`vtable::invoke_returning_struct_by_value`].
	pub unsafe fn call_struct<T : Copy, A : Arguments>(&self, slot : usize, strategy : StructReturn, args : A) -> Result<T>
	{
		Ok(vtable::invoke_returning_struct_by_value(self.object()?, slot, strategy, args))
	}

	/// Calls a creating method whose last parameter is `void**` and wraps the result.
	///
	/// # Safety
	///
	/// `slot` and `args` must match the native method minus its trailing out-parameter.
	pub unsafe fn create<A : Arguments>(&self, slot : usize, operation : &'static str, args : A) -> Result<ComPtr>
		where (A, *mut *mut c_void) : Flatten
	{
		let mut created = ComPtr::null();
		let args = (args, created.mut_void()).flatten();
		check(vtable::invoke_returning_status(self.object()?, slot, args), operation)?;
		if created.is_null()
		{
			return Err(Error::Native { operation, hresult : crate::error::E_FAIL });
		}
		Ok(created)
	}

	/// `IUnknown::QueryInterface`.
	pub fn query_interface(&self, iid : &Guid) -> Result<ComPtr>
	{
		unsafe { self.create(slot::QUERY_INTERFACE, "QueryInterface", (iid as *const Guid,)) }
	}

	/// `IUnknown::AddRef`, returning the new reference count.
	pub fn add_ref(&self) -> Result<u32>
	{
		unsafe { self.call::<u32, _>(slot::ADD_REF, ()) }
	}

	/// `IUnknown::Release`. Null handles are skipped; the handle is null afterwards.
	pub fn release(&mut self) -> u32
	{
		let remaining = match RawObject::from_raw(self.raw)
		{
			Some(object) => unsafe { vtable::invoke::<u32, _>(object, slot::RELEASE, ()) },
			None => return 0,
		};
		self.raw = ptr::null_mut();
		remaining
	}
}

impl Default for ComPtr
{
	fn default() -> Self
	{
		ComPtr::null()
	}
}

impl fmt::Debug for ComPtr
{
	fn fmt(&self, f : &mut fmt::Formatter<'_>) -> fmt::Result
	{
		write!(f, "ComPtr({:p})", self.raw)
	}
}

/// Appends a trailing out-parameter to an argument tuple.
pub trait Flatten
{
	type Output : Arguments;
	fn flatten(self) -> Self::Output;
}

macro_rules! impl_flatten {
	($($arg:ident : $ty:ident),*) => {
		impl<$($ty : Copy,)* Z : Copy> Flatten for (($($ty,)*), Z)
		{
			type Output = ($($ty,)* Z,);

			#[inline]
			fn flatten(self) -> Self::Output
			{
				let (($($arg,)*), z) = self;
				($($arg,)* z,)
			}
		}
	};
}

impl_flatten!();
impl_flatten!(a : A);
impl_flatten!(a : A, b : B);
impl_flatten!(a : A, b : B, c : C);
impl_flatten!(a : A, b : B, c : C, d : D);
impl_flatten!(a : A, b : B, c : C, d : D, e : E);
impl_flatten!(a : A, b : B, c : C, d : D, e : E, f : F);
impl_flatten!(a : A, b : B, c : C, d : D, e : E, f : F, g : G);
impl_flatten!(a : A, b : B, c : C, d : D, e : E, f : F, g : G, h : H);
impl_flatten!(a : A, b : B, c : C, d : D, e : E, f : F, g : G, h : H, i : I);
impl_flatten!(a : A, b : B, c : C, d : D, e : E, f : F, g : G, h : H, i : I, j : J);

#[cfg(test)]
mod tests
{
	use super::*;
	use crate::error::E_NOINTERFACE;
	use std::cell::Cell;

	#[repr(C)]
	struct Unknown
	{
		vtable : *const *const c_void,
		references : Cell<u32>,
		accepted : Guid,
	}

	unsafe fn unknown<'a>(this : *mut c_void) -> &'a Unknown
	{
		&*(this as *const Unknown)
	}

	unsafe extern "system" fn query_interface(this : *mut c_void, iid : *const Guid, out : *mut *mut c_void) -> HRESULT
	{
		let object = unknown(this);
		if *iid == object.accepted
		{
			object.references.set(object.references.get() + 1);
			*out = this;
			0
		}
		else
		{
			*out = ptr::null_mut();
			E_NOINTERFACE
		}
	}

	unsafe extern "system" fn add_ref(this : *mut c_void) -> u32
	{
		let object = unknown(this);
		object.references.set(object.references.get() + 1);
		object.references.get()
	}

	unsafe extern "system" fn release(this : *mut c_void) -> u32
	{
		let object = unknown(this);
		object.references.set(object.references.get() - 1);
		object.references.get()
	}

	fn vtable() -> [*const c_void; 3]
	{
		[query_interface as *const c_void, add_ref as *const c_void, release as *const c_void]
	}

	const ACCEPTED : Guid = Guid::from_values(0x1, 0x2, 0x3, [4, 5, 6, 7, 8, 9, 10, 11]);

	#[test]
	fn release_nulls_the_handle_once()
	{
		let table = vtable();
		let mut object = Unknown { vtable : table.as_ptr(), references : Cell::new(1), accepted : ACCEPTED };
		let mut handle = unsafe { ComPtr::from_raw(&mut object as *mut Unknown as *mut c_void) };

		assert_eq!(handle.release(), 0);
		assert!(handle.is_null());
		assert_eq!(handle.release(), 0);
		assert_eq!(object.references.get(), 0);
	}

	#[test]
	fn query_interface_hands_out_a_new_reference()
	{
		let table = vtable();
		let mut object = Unknown { vtable : table.as_ptr(), references : Cell::new(1), accepted : ACCEPTED };
		let handle = unsafe { ComPtr::from_raw(&mut object as *mut Unknown as *mut c_void) };

		let mut other = handle.query_interface(&ACCEPTED).unwrap();
		assert_eq!(other.as_raw(), handle.as_raw());
		assert_eq!(object.references.get(), 2);
		other.release();
		assert_eq!(object.references.get(), 1);
	}

	#[test]
	fn query_interface_reports_missing_interfaces()
	{
		let table = vtable();
		let mut object = Unknown { vtable : table.as_ptr(), references : Cell::new(1), accepted : ACCEPTED };
		let handle = unsafe { ComPtr::from_raw(&mut object as *mut Unknown as *mut c_void) };

		match handle.query_interface(&Guid::default())
		{
			Err(Error::Native { operation, hresult }) =>
			{
				assert_eq!(operation, "QueryInterface");
				assert_eq!(hresult, E_NOINTERFACE);
			},
			other => panic!("unexpected {:?}", other),
		}
		assert_eq!(object.references.get(), 1);
	}

	#[test]
	fn add_ref_counts_up()
	{
		let table = vtable();
		let mut object = Unknown { vtable : table.as_ptr(), references : Cell::new(1), accepted : ACCEPTED };
		let handle = unsafe { ComPtr::from_raw(&mut object as *mut Unknown as *mut c_void) };
		assert_eq!(handle.add_ref().unwrap(), 2);
	}

	#[test]
	fn null_handle_refuses_calls()
	{
		let handle = ComPtr::null();
		assert!(matches!(handle.add_ref(), Err(Error::NullHandle)));
		assert!(matches!(handle.query_interface(&ACCEPTED), Err(Error::NullHandle)));
	}
}
