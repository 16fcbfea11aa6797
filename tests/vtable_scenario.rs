use std::{cell::Cell, ffi::c_void, ptr};

use rust_com_triangle::vtable::{self, RawObject, StructReturn};

const RELEASE : usize = 0;
const CREATE_CHILD : usize = 1;
const GET_SIZE : usize = 2;

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
struct Size
{
	width : u32,
	height : u32,
}

#[repr(C)]
struct FakeObject
{
	vtable : *const *const c_void,
	releases : Cell<u32>,
	child : *mut FakeObject,
}

unsafe extern "system" fn release(this : *mut c_void) -> u32
{
	let object = &*(this as *const FakeObject);
	object.releases.set(object.releases.get() + 1);
	0
}

unsafe extern "system" fn create_child(this : *mut c_void) -> *mut c_void
{
	(*(this as *const FakeObject)).child as *mut c_void
}

unsafe extern "system" fn get_size(_this : *mut c_void) -> u64
{
	640 | (480_u64 << 32)
}

fn vtable() -> [*const c_void; 3]
{
	let mut table = [ptr::null(); 3];
	table[RELEASE] = release as *const c_void;
	table[CREATE_CHILD] = create_child as *const c_void;
	table[GET_SIZE] = get_size as *const c_void;
	table
}

#[test]
fn acquire_query_release()
{
	let table = vtable();
	let mut child = FakeObject { vtable : table.as_ptr(), releases : Cell::new(0), child : ptr::null_mut() };
	let mut parent = FakeObject { vtable : table.as_ptr(), releases : Cell::new(0), child : &mut child };

	let parent_object = RawObject::from_raw(&mut parent as *mut FakeObject as *mut c_void).unwrap();

	let acquired = unsafe { vtable::invoke_returning_pointer(parent_object, CREATE_CHILD, ()) };
	assert_eq!(acquired, &mut child as *mut FakeObject as *mut c_void);
	let child_object = RawObject::from_raw(acquired).unwrap();

	let size : Size = unsafe { vtable::invoke_returning_struct_by_value(child_object, GET_SIZE, StructReturn::Register, ()) };
	assert_eq!((size.width, size.height), (640, 480));

	let remaining : u32 = unsafe { vtable::invoke(child_object, RELEASE, ()) };
	assert_eq!(remaining, 0);

	assert_eq!(child.releases.get(), 1);
	assert_eq!(parent.releases.get(), 0);
}

#[test]
fn automatic_strategy_picks_the_register_for_eight_bytes()
{
	let table = vtable();
	let mut object = FakeObject { vtable : table.as_ptr(), releases : Cell::new(0), child : ptr::null_mut() };
	let raw = RawObject::from_raw(&mut object as *mut FakeObject as *mut c_void).unwrap();

	let size : Size = unsafe { vtable::invoke_returning_struct_by_value(raw, GET_SIZE, StructReturn::Auto, ()) };
	assert_eq!(size, Size { width : 640, height : 480 });
	assert_eq!(object.releases.get(), 0);
}
