//! Calls into native objects through their virtual method tables.
//!
//! A COM-style object stores a pointer to an array of function pointers at
//! offset 0. Every method is a fixed slot in that array and receives the object
//! itself as its first argument. The functions here resolve a slot and call it
//! with the platform COM calling convention (`extern "system"`: stdcall on
//! 32-bit Windows, the Microsoft x64 convention on 64-bit Windows, the C
//! convention elsewhere).
//!
//! # Safety
//!
//! Nothing here can check that an object really has a vtable or that a slot
//! index lies inside it. A wrong object, a wrong slot, or an argument tuple that
//! does not match the native signature is undefined behavior: the process may
//! crash, silently corrupt memory, or call a different method that happens to
//! succeed. These are programming errors and are never retried.

use std::{
	ffi::c_void,
	fmt,
	mem::{self, MaybeUninit},
	ptr::{self, NonNull},
};

use crate::error::HRESULT;

pub const POINTER_WIDTH : usize = mem::size_of::<usize>();

/// Largest struct that can come back through the integer return registers.
pub const REGISTER_RETURN_LIMIT : usize = mem::size_of::<u64>();

/// Address of a native object whose first machine word points to its vtable.
#[repr(transparent)]
#[derive(Copy, Clone, PartialEq, Eq, Hash)]
pub struct RawObject(NonNull<c_void>);

impl RawObject
{
	/// `None` for null.
	pub fn from_raw(ptr : *mut c_void) -> Option<Self>
	{
		NonNull::new(ptr).map(RawObject)
	}

	pub fn as_raw(self) -> *mut c_void
	{
		self.0.as_ptr()
	}

	/// Reads `*(vtable_base + slot * POINTER_WIDTH)`.
	///
	/// # Safety
	///
	/// The object must be live and `slot` must be inside its vtable.
	pub unsafe fn entry(self, slot : usize) -> *const c_void
	{
		let vtable = *(self.0.as_ptr() as *const *const *const c_void);
		*vtable.add(slot)
	}
}

impl fmt::Debug for RawObject
{
	fn fmt(&self, f : &mut fmt::Formatter<'_>) -> fmt::Result
	{
		write!(f, "RawObject({:p})", self.0.as_ptr())
	}
}

/// An argument list that can be forwarded to a vtable entry.
///
/// Implemented for tuples of up to twelve `Copy` values. Each element must have
/// the exact size and representation the native parameter expects: integers of
/// the right width, raw pointers, or `#[repr(C)]` structs passed by value.
///
/// # Safety
///
/// Implementations must forward every element, in order, after the object.
pub unsafe trait Arguments : Copy
{
	/// Calls `entry(object, args...)` and returns its result as `R`.
	unsafe fn call<R>(self, object : RawObject, entry : *const c_void) -> R;

	/// Calls `entry(object, out, args...)`, the member-function form of a
	/// by-value struct return where the caller owns the result buffer.
	unsafe fn call_with_out<T>(self, object : RawObject, out : *mut T, entry : *const c_void) -> *mut T;
}

macro_rules! impl_arguments {
	($($arg:ident : $ty:ident),*) => {
		unsafe impl<$($ty : Copy),*> Arguments for ($($ty,)*)
		{
			#[inline]
			unsafe fn call<R>(self, object : RawObject, entry : *const c_void) -> R
			{
				let ($($arg,)*) = self;
				let function : unsafe extern "system" fn(*mut c_void $(, $ty)*) -> R = mem::transmute_copy(&entry);
				function(object.as_raw() $(, $arg)*)
			}

			#[inline]
			unsafe fn call_with_out<T>(self, object : RawObject, out : *mut T, entry : *const c_void) -> *mut T
			{
				let ($($arg,)*) = self;
				let function : unsafe extern "system" fn(*mut c_void, *mut T $(, $ty)*) -> *mut T = mem::transmute_copy(&entry);
				function(object.as_raw(), out $(, $arg)*)
			}
		}
	};
}

impl_arguments!();
impl_arguments!(a : A);
impl_arguments!(a : A, b : B);
impl_arguments!(a : A, b : B, c : C);
impl_arguments!(a : A, b : B, c : C, d : D);
impl_arguments!(a : A, b : B, c : C, d : D, e : E);
impl_arguments!(a : A, b : B, c : C, d : D, e : E, f : F);
impl_arguments!(a : A, b : B, c : C, d : D, e : E, f : F, g : G);
impl_arguments!(a : A, b : B, c : C, d : D, e : E, f : F, g : G, h : H);
impl_arguments!(a : A, b : B, c : C, d : D, e : E, f : F, g : G, h : H, i : I);
impl_arguments!(a : A, b : B, c : C, d : D, e : E, f : F, g : G, h : H, i : I, j : J);
impl_arguments!(a : A, b : B, c : C, d : D, e : E, f : F, g : G, h : H, i : I, j : J, k : K);
impl_arguments!(a : A, b : B, c : C, d : D, e : E, f : F, g : G, h : H, i : I, j : J, k : K, l : L);

/// How a callee hands back a small struct "by value".
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum StructReturn
{
	/// Pick from the struct size: 1, 2, 4 or 8 bytes use `Register`, anything else `OutPointer`.
	Auto,
	/// The struct travels in the integer return register(s), RAX or EDX:EAX.
	Register,
	/// The caller passes a buffer right after the object and the callee fills it.
	/// COM methods compiled as C++ members always use this form, whatever the size.
	OutPointer,
}

impl StructReturn
{
	pub fn resolve<T>(self) -> StructReturn
	{
		match self
		{
			StructReturn::Auto if fits_in_register::<T>() => StructReturn::Register,
			StructReturn::Auto => StructReturn::OutPointer,
			explicit => explicit,
		}
	}
}

pub const fn fits_in_register<T>() -> bool
{
	let size = mem::size_of::<T>();
	size <= REGISTER_RETURN_LIMIT && size.is_power_of_two()
}

/// Resolves `slot` on `object` and calls it with `object` prepended to `args`.
///
/// # Safety
///
/// See the module documentation: the slot, the argument tuple and `R` must
/// match the native method exactly.
#[inline]
pub unsafe fn invoke<R, A : Arguments>(object : RawObject, slot : usize, args : A) -> R
{
	let entry = object.entry(slot);
	args.call(object, entry)
}

/// For methods returning an `HRESULT`. The value comes back untouched, failures included.
///
/// # Safety
///
/// See [`invoke`].
#[inline]
pub unsafe fn invoke_returning_status<A : Arguments>(object : RawObject, slot : usize, args : A) -> HRESULT
{
	invoke::<HRESULT, A>(object, slot, args)
}

/// For methods returning an address-sized value.
///
/// # Safety
///
/// See [`invoke`].
#[inline]
pub unsafe fn invoke_returning_pointer<A : Arguments>(object : RawObject, slot : usize, args : A) -> *mut c_void
{
	invoke::<*mut c_void, A>(object, slot, args)
}

/// For setters and actions. Whatever the callee leaves in the return register is ignored.
///
/// # Safety
///
/// See [`invoke`].
#[inline]
pub unsafe fn invoke_returning_nothing<A : Arguments>(object : RawObject, slot : usize, args : A)
{
	invoke::<(), A>(object, slot, args)
}

/// For methods that return a small struct by value.
///
/// `T` must be a plain `#[repr(C)]` aggregate that is valid for any bit pattern.
///
/// # Safety
///
/// See [`invoke`]. In addition `strategy` must match how the native method
/// really returns the struct; when in doubt use `StructReturn::OutPointer`.
/// `StructReturn::Register` with a struct larger than eight bytes panics.
pub unsafe fn invoke_returning_struct_by_value<T : Copy, A : Arguments>(
	object : RawObject,
	slot : usize,
	strategy : StructReturn,
	args : A) -> T
{
	match strategy.resolve::<T>()
	{
		StructReturn::Register =>
		{
			let size = mem::size_of::<T>();
			assert!(size <= REGISTER_RETURN_LIMIT, "{} bytes cannot be returned in registers", size);

			let carrier = invoke::<u64, A>(object, slot, args).to_le_bytes();
			let mut value = MaybeUninit::<T>::zeroed();
			ptr::copy_nonoverlapping(carrier.as_ptr(), value.as_mut_ptr() as *mut u8, size);
			value.assume_init()
		},
		_ =>
		{
			let mut value = MaybeUninit::<T>::zeroed();
			let entry = object.entry(slot);
			args.call_with_out(object, value.as_mut_ptr(), entry);
			value.assume_init()
		},
	}
}

#[cfg(test)]
mod tests
{
	use super::*;
	use std::cell::Cell;

	#[repr(C)]
	struct Fake
	{
		vtable : *const *const c_void,
		last_slot : Cell<usize>,
		calls : Cell<u32>,
	}

	impl Fake
	{
		fn new(vtable : &[*const c_void]) -> Self
		{
			Fake { vtable : vtable.as_ptr(), last_slot : Cell::new(usize::MAX), calls : Cell::new(0) }
		}

		fn object(&mut self) -> RawObject
		{
			RawObject::from_raw(self as *mut Fake as *mut c_void).unwrap()
		}
	}

	unsafe fn fake<'a>(this : *mut c_void) -> &'a Fake
	{
		&*(this as *const Fake)
	}

	macro_rules! slot_stub {
		($name:ident, $slot:expr) => {
			unsafe extern "system" fn $name(this : *mut c_void) -> HRESULT
			{
				let fake = fake(this);
				fake.last_slot.set($slot);
				fake.calls.set(fake.calls.get() + 1);
				0x100 + $slot
			}
		};
	}

	slot_stub!(slot0, 0);
	slot_stub!(slot1, 1);
	slot_stub!(slot2, 2);
	slot_stub!(slot3, 3);
	slot_stub!(slot4, 4);

	#[test]
	fn each_slot_reaches_its_own_stub()
	{
		let vtable = [slot0 as *const c_void, slot1 as *const c_void, slot2 as *const c_void, slot3 as *const c_void, slot4 as *const c_void];
		let mut fake = Fake::new(&vtable);
		let object = fake.object();

		for slot in 0..vtable.len()
		{
			let status = unsafe { invoke_returning_status(object, slot, ()) };
			assert_eq!(status, 0x100 + slot as HRESULT);
			assert_eq!(fake.last_slot.get(), slot);
		}
		assert_eq!(fake.calls.get(), vtable.len() as u32);
	}

	#[repr(C)]
	#[derive(Copy, Clone, Debug, PartialEq)]
	struct Extent
	{
		width : u32,
		height : u32,
	}

	#[repr(C)]
	#[derive(Copy, Clone, Debug, PartialEq)]
	struct Echo
	{
		this : usize,
		small : u8,
		wide : u64,
		pointer : usize,
		extent : Extent,
		signed : i32,
	}

	static mut ECHO : Echo = Echo { this : 0, small : 0, wide : 0, pointer : 0, extent : Extent { width : 0, height : 0 }, signed : 0 };

	unsafe extern "system" fn echo_stub(this : *mut c_void, small : u8, wide : u64, pointer : *const u32, extent : Extent, signed : i32) -> HRESULT
	{
		ECHO = Echo { this : this as usize, small, wide, pointer : pointer as usize, extent, signed };
		0
	}

	#[test]
	fn arguments_arrive_in_order_and_unchanged()
	{
		let vtable = [echo_stub as *const c_void];
		let mut fake = Fake::new(&vtable);
		let object = fake.object();
		let target = 7_u32;
		let extent = Extent { width : 640, height : 480 };

		let status = unsafe { invoke_returning_status(object, 0, (0xAB_u8, 0x0123_4567_89AB_CDEF_u64, &target as *const u32, extent, -5_i32)) };
		assert_eq!(status, 0);

		let echo = unsafe { ECHO };
		assert_eq!(echo.this, object.as_raw() as usize);
		assert_eq!(echo.small, 0xAB);
		assert_eq!(echo.wide, 0x0123_4567_89AB_CDEF);
		assert_eq!(echo.pointer, &target as *const u32 as usize);
		assert_eq!(echo.extent, extent);
		assert_eq!(echo.signed, -5);
	}

	unsafe extern "system" fn failing_stub(_this : *mut c_void) -> HRESULT
	{
		0x887A_0002_u32 as HRESULT
	}

	unsafe extern "system" fn pointer_stub(this : *mut c_void, offset : usize) -> *mut c_void
	{
		(this as *mut u8).add(offset) as *mut c_void
	}

	unsafe extern "system" fn counting_stub(this : *mut c_void) -> HRESULT
	{
		let fake = fake(this);
		fake.calls.set(fake.calls.get() + 1);
		-1
	}

	#[test]
	fn status_keeps_failure_codes()
	{
		let vtable = [failing_stub as *const c_void];
		let mut fake = Fake::new(&vtable);
		let status = unsafe { invoke_returning_status(fake.object(), 0, ()) };
		assert_eq!(status, 0x887A_0002_u32 as HRESULT);
		assert!(status < 0);
	}

	#[test]
	fn pointer_comes_back_exactly()
	{
		let vtable = [pointer_stub as *const c_void];
		let mut fake = Fake::new(&vtable);
		let object = fake.object();
		let returned = unsafe { invoke_returning_pointer(object, 0, (24_usize,)) };
		assert_eq!(returned as usize, object.as_raw() as usize + 24);
	}

	#[test]
	fn nothing_ignores_a_returned_value()
	{
		let vtable = [counting_stub as *const c_void];
		let mut fake = Fake::new(&vtable);
		let object = fake.object();
		unsafe { invoke_returning_nothing(object, 0, ()) };
		unsafe { invoke_returning_nothing(object, 0, ()) };
		assert_eq!(fake.calls.get(), 2);
	}

	unsafe extern "system" fn extent_in_register(_this : *mut c_void) -> u64
	{
		(480_u64 << 32) | 640
	}

	#[repr(C)]
	#[derive(Copy, Clone, Debug, PartialEq)]
	struct HeapDesc
	{
		kind : u32,
		count : u32,
		flags : u32,
		node_mask : u32,
	}

	unsafe extern "system" fn heap_desc_out(_this : *mut c_void, out : *mut HeapDesc, node_mask : u32) -> *mut HeapDesc
	{
		*out = HeapDesc { kind : 2, count : 3, flags : 0, node_mask };
		out
	}

	#[test]
	fn eight_byte_struct_uses_the_register_path()
	{
		let vtable = [extent_in_register as *const c_void];
		let mut fake = Fake::new(&vtable);
		let extent : Extent = unsafe { invoke_returning_struct_by_value(fake.object(), 0, StructReturn::Auto, ()) };
		assert_eq!(extent, Extent { width : 640, height : 480 });
	}

	#[test]
	fn larger_struct_uses_the_out_pointer_path()
	{
		let vtable = [heap_desc_out as *const c_void];
		let mut fake = Fake::new(&vtable);
		let desc : HeapDesc = unsafe { invoke_returning_struct_by_value(fake.object(), 0, StructReturn::Auto, (1_u32,)) };
		assert_eq!(desc, HeapDesc { kind : 2, count : 3, flags : 0, node_mask : 1 });
	}

	unsafe extern "system" fn dirty_high_half(_this : *mut c_void) -> u64
	{
		0xDEAD_BEEF_0000_0000 | 0x1234_5678
	}

	#[test]
	fn four_byte_struct_keeps_only_the_low_bytes()
	{
		#[repr(C)]
		#[derive(Copy, Clone, Debug, PartialEq)]
		struct Packed
		{
			value : u32,
		}

		let vtable = [dirty_high_half as *const c_void];
		let mut fake = Fake::new(&vtable);
		let packed : Packed = unsafe { invoke_returning_struct_by_value(fake.object(), 0, StructReturn::Register, ()) };
		assert_eq!(packed, Packed { value : 0x1234_5678 });
	}

	#[test]
	#[should_panic(expected = "cannot be returned in registers")]
	fn register_path_rejects_large_structs()
	{
		let vtable = [heap_desc_out as *const c_void];
		let mut fake = Fake::new(&vtable);
		let _ : HeapDesc = unsafe { invoke_returning_struct_by_value(fake.object(), 0, StructReturn::Register, (1_u32,)) };
	}

	#[test]
	fn auto_prefers_out_pointer_for_odd_sizes()
	{
		assert_eq!(StructReturn::Auto.resolve::<u64>(), StructReturn::Register);
		assert_eq!(StructReturn::Auto.resolve::<Extent>(), StructReturn::Register);
		assert_eq!(StructReturn::Auto.resolve::<[u8; 3]>(), StructReturn::OutPointer);
		assert_eq!(StructReturn::Auto.resolve::<HeapDesc>(), StructReturn::OutPointer);
		assert_eq!(StructReturn::OutPointer.resolve::<u32>(), StructReturn::OutPointer);
	}

	#[test]
	fn null_is_not_an_object()
	{
		assert!(RawObject::from_raw(ptr::null_mut()).is_none());
	}
}
