//! Direct3D 10 device creation and the device methods of the triangle demo.
//!
//! D3D10 has no separate device context: state setters and draw calls live on
//! `ID3D10Device` itself, after the resource creation methods in slot order.

use std::{ffi::c_void, ptr};

use lazy_static::lazy_static;

use crate::{
	com::ComPtr,
	error::{check, Result, HRESULT},
	fallback,
	guid::{interface_id, Guid},
	layout::{D3d10BufferDesc, D3d10Viewport, InputElementDesc, SubresourceData, SwapChainDesc},
	native::NativeLibrary,
};

#[cfg(windows)]
pub mod renderer;

pub const LIBRARY : &str = "d3d10.dll";

pub const SDK_VERSION : u32 = 29;
pub const USAGE_DEFAULT : u32 = 0;
pub const BIND_VERTEX_BUFFER : u32 = 0x1;
pub const PRIMITIVE_TOPOLOGY_TRIANGLELIST : u32 = 4;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[repr(u32)]
pub enum DriverType
{
	Hardware = 1,
	Warp = 2,
	Reference = 3,
}

impl DriverType
{
	/// Preference order for device creation.
	pub const FALLBACK_ORDER : [DriverType; 3] = [DriverType::Hardware, DriverType::Warp, DriverType::Reference];
}

pub mod slot
{
	pub mod device
	{
		pub const PS_SET_SHADER : usize = 5;
		pub const VS_SET_SHADER : usize = 7;
		pub const DRAW : usize = 9;
		pub const IA_SET_INPUT_LAYOUT : usize = 11;
		pub const IA_SET_VERTEX_BUFFERS : usize = 12;
		pub const IA_SET_PRIMITIVE_TOPOLOGY : usize = 18;
		pub const OM_SET_RENDER_TARGETS : usize = 24;
		pub const RS_SET_VIEWPORTS : usize = 30;
		pub const CLEAR_RENDER_TARGET_VIEW : usize = 35;
		pub const CLEAR_STATE : usize = 69;
		pub const CREATE_BUFFER : usize = 71;
		pub const CREATE_RENDER_TARGET_VIEW : usize = 76;
		pub const CREATE_INPUT_LAYOUT : usize = 78;
		pub const CREATE_VERTEX_SHADER : usize = 79;
		pub const CREATE_PIXEL_SHADER : usize = 82;
	}
}

lazy_static! {
	pub static ref IID_ID3D10_TEXTURE2D : Guid = interface_id("9b7e4c04-342c-4106-a19f-4f2704f689f0");
}

pub type D3D10CreateDeviceAndSwapChainFn = unsafe extern "system" fn(
	adapter : *mut c_void,
	driver_type : u32,
	software : *mut c_void,
	flags : u32,
	sdk_version : u32,
	swap_chain_desc : *const SwapChainDesc,
	swap_chain : *mut *mut c_void,
	device : *mut *mut c_void) -> HRESULT;

/// Handles produced together by `D3D10CreateDeviceAndSwapChain`.
#[derive(Debug)]
pub struct DeviceAndSwapChain
{
	pub device : ComPtr,
	pub swap_chain : ComPtr,
}

impl DeviceAndSwapChain
{
	pub fn release(&mut self)
	{
		self.swap_chain.release();
		self.device.release();
	}
}

/// `d3d10.dll` and its device creation export.
pub struct D3d10
{
	_library : NativeLibrary,
	create_device_and_swap_chain : D3D10CreateDeviceAndSwapChainFn,
}

impl D3d10
{
	pub fn load() -> Result<Self>
	{
		let library = NativeLibrary::load(LIBRARY)?;
		let create_device_and_swap_chain = unsafe { library.function("D3D10CreateDeviceAndSwapChain")? };
		Ok(D3d10 { _library : library, create_device_and_swap_chain })
	}

	/// One `D3D10CreateDeviceAndSwapChain` call. There is no feature level to ask for.
	pub fn create_device_and_swap_chain(&self, driver_type : DriverType, flags : u32, desc : &SwapChainDesc) -> Result<DeviceAndSwapChain>
	{
		let mut created = DeviceAndSwapChain { device : ComPtr::null(), swap_chain : ComPtr::null() };

		let hr = unsafe
		{
			(self.create_device_and_swap_chain)(
				ptr::null_mut(),
				driver_type as u32,
				ptr::null_mut(),
				flags,
				SDK_VERSION,
				desc,
				created.swap_chain.mut_void(),
				created.device.mut_void())
		};

		if let Err(err) = check(hr, "D3D10CreateDeviceAndSwapChain")
		{
			created.release();
			return Err(err);
		}
		Ok(created)
	}

	/// Walks [`DriverType::FALLBACK_ORDER`] without creation flags.
	pub fn create_with_fallback(&self, desc : &SwapChainDesc) -> Result<(DriverType, DeviceAndSwapChain)>
	{
		fallback::first_success(DriverType::FALLBACK_ORDER, |driver_type| self.create_device_and_swap_chain(driver_type, 0, desc))
	}
}

/// `ID3D10Device::CreateBuffer`.
///
/// # Safety
///
/// `device` must be an `ID3D10Device`; the same holds for every `device` parameter in this module.
pub unsafe fn create_buffer(device : &ComPtr, desc : &D3d10BufferDesc, initial_data : &SubresourceData) -> Result<ComPtr>
{
	device.create(slot::device::CREATE_BUFFER, "ID3D10Device::CreateBuffer",
		(desc as *const D3d10BufferDesc, initial_data as *const SubresourceData))
}

/// `ID3D10Device::CreateRenderTargetView` with a default view description.
///
/// # Safety
///
/// See [`create_buffer`]. `resource` must be a texture.
pub unsafe fn create_render_target_view(device : &ComPtr, resource : &ComPtr) -> Result<ComPtr>
{
	device.create(slot::device::CREATE_RENDER_TARGET_VIEW, "ID3D10Device::CreateRenderTargetView",
		(resource.as_raw(), ptr::null::<c_void>()))
}

/// `ID3D10Device::CreateInputLayout`, validated against the vertex shader bytecode.
///
/// # Safety
///
/// See [`create_buffer`].
pub unsafe fn create_input_layout(device : &ComPtr, elements : &[InputElementDesc], vertex_shader_bytecode : &[u8]) -> Result<ComPtr>
{
	device.create(slot::device::CREATE_INPUT_LAYOUT, "ID3D10Device::CreateInputLayout",
		(elements.as_ptr(), elements.len() as u32, vertex_shader_bytecode.as_ptr() as *const c_void, vertex_shader_bytecode.len()))
}

/// `ID3D10Device::CreateVertexShader`. D3D10 has no class linkage parameter.
///
/// # Safety
///
/// See [`create_buffer`].
pub unsafe fn create_vertex_shader(device : &ComPtr, bytecode : &[u8]) -> Result<ComPtr>
{
	device.create(slot::device::CREATE_VERTEX_SHADER, "ID3D10Device::CreateVertexShader",
		(bytecode.as_ptr() as *const c_void, bytecode.len()))
}

/// `ID3D10Device::CreatePixelShader`.
///
/// # Safety
///
/// See [`create_buffer`].
pub unsafe fn create_pixel_shader(device : &ComPtr, bytecode : &[u8]) -> Result<ComPtr>
{
	device.create(slot::device::CREATE_PIXEL_SHADER, "ID3D10Device::CreatePixelShader",
		(bytecode.as_ptr() as *const c_void, bytecode.len()))
}

// Pipeline state and draw calls; `device` is an `ID3D10Device` throughout.

pub unsafe fn set_pixel_shader(device : &ComPtr, shader : &ComPtr) -> Result<()>
{
	device.call_nothing(slot::device::PS_SET_SHADER, (shader.as_raw(),))
}

pub unsafe fn set_vertex_shader(device : &ComPtr, shader : &ComPtr) -> Result<()>
{
	device.call_nothing(slot::device::VS_SET_SHADER, (shader.as_raw(),))
}

pub unsafe fn draw(device : &ComPtr, vertex_count : u32, start_vertex : u32) -> Result<()>
{
	device.call_nothing(slot::device::DRAW, (vertex_count, start_vertex))
}

pub unsafe fn set_input_layout(device : &ComPtr, layout : &ComPtr) -> Result<()>
{
	device.call_nothing(slot::device::IA_SET_INPUT_LAYOUT, (layout.as_raw(),))
}

/// Binds `buffers` from `start_slot` on; `strides` and `offsets` run parallel to it.
pub unsafe fn set_vertex_buffers(device : &ComPtr, start_slot : u32, buffers : &[*mut c_void], strides : &[u32], offsets : &[u32]) -> Result<()>
{
	debug_assert!(buffers.len() == strides.len() && buffers.len() == offsets.len());
	device.call_nothing(slot::device::IA_SET_VERTEX_BUFFERS,
		(start_slot, buffers.len() as u32, buffers.as_ptr(), strides.as_ptr(), offsets.as_ptr()))
}

pub unsafe fn set_primitive_topology(device : &ComPtr, topology : u32) -> Result<()>
{
	device.call_nothing(slot::device::IA_SET_PRIMITIVE_TOPOLOGY, (topology,))
}

pub unsafe fn set_render_targets(device : &ComPtr, views : &[*mut c_void]) -> Result<()>
{
	device.call_nothing(slot::device::OM_SET_RENDER_TARGETS, (views.len() as u32, views.as_ptr(), ptr::null_mut::<c_void>()))
}

pub unsafe fn set_viewports(device : &ComPtr, viewports : &[D3d10Viewport]) -> Result<()>
{
	device.call_nothing(slot::device::RS_SET_VIEWPORTS, (viewports.len() as u32, viewports.as_ptr()))
}

pub unsafe fn clear_render_target_view(device : &ComPtr, view : &ComPtr, color : &[f32; 4]) -> Result<()>
{
	device.call_nothing(slot::device::CLEAR_RENDER_TARGET_VIEW, (view.as_raw(), color as *const [f32; 4]))
}

pub unsafe fn clear_state(device : &ComPtr) -> Result<()>
{
	device.call_nothing(slot::device::CLEAR_STATE, ())
}

#[cfg(test)]
mod tests
{
	use super::*;
	use crate::error::{Error, E_FAIL};
	use std::cell::RefCell;

	#[test]
	fn texture_identifier_matches_its_canonical_text()
	{
		assert_eq!(IID_ID3D10_TEXTURE2D.to_string(), "9b7e4c04-342c-4106-a19f-4f2704f689f0");
	}

	#[test]
	fn reference_driver_is_the_last_resort()
	{
		let mut attempts = Vec::new();
		let (driver, _) = fallback::first_success(DriverType::FALLBACK_ORDER, |driver|
		{
			attempts.push(driver);
			match driver
			{
				DriverType::Reference => Ok(()),
				_ => Err(Error::Native { operation : "D3D10CreateDeviceAndSwapChain", hresult : E_FAIL }),
			}
		}).unwrap();

		assert_eq!(driver, DriverType::Reference);
		assert_eq!(attempts, DriverType::FALLBACK_ORDER.to_vec());
	}

	/// An `ID3D10Device` that records the pipeline calls of one frame.
	#[repr(C)]
	struct FakeDevice
	{
		vtable : *const *const c_void,
		calls : RefCell<Vec<&'static str>>,
		draws : RefCell<Vec<(u32, u32)>>,
		viewport : RefCell<Option<D3d10Viewport>>,
		vertex_shader : RefCell<Option<usize>>,
	}

	unsafe fn fake<'a>(this : *mut c_void) -> &'a FakeDevice
	{
		&*(this as *const FakeDevice)
	}

	unsafe extern "system" fn unused(_this : *mut c_void) {}

	unsafe extern "system" fn fake_set_vertex_shader(this : *mut c_void, shader : *mut c_void)
	{
		fake(this).calls.borrow_mut().push("VSSetShader");
		*fake(this).vertex_shader.borrow_mut() = Some(shader as usize);
	}

	unsafe extern "system" fn fake_draw(this : *mut c_void, count : u32, start : u32)
	{
		fake(this).calls.borrow_mut().push("Draw");
		fake(this).draws.borrow_mut().push((count, start));
	}

	unsafe extern "system" fn fake_set_viewports(this : *mut c_void, count : u32, viewports : *const D3d10Viewport)
	{
		fake(this).calls.borrow_mut().push("RSSetViewports");
		assert_eq!(count, 1);
		*fake(this).viewport.borrow_mut() = Some(*viewports);
	}

	unsafe extern "system" fn fake_clear_state(this : *mut c_void)
	{
		fake(this).calls.borrow_mut().push("ClearState");
	}

	unsafe extern "system" fn fake_create_vertex_shader(_this : *mut c_void, bytecode : *const c_void, length : usize, shader : *mut *mut c_void) -> HRESULT
	{
		*shader = (bytecode as usize + length) as *mut c_void;
		0
	}

	fn device_vtable() -> Vec<*const c_void>
	{
		let mut table = vec![unused as *const c_void; slot::device::CREATE_PIXEL_SHADER + 1];
		table[slot::device::VS_SET_SHADER] = fake_set_vertex_shader as *const c_void;
		table[slot::device::DRAW] = fake_draw as *const c_void;
		table[slot::device::RS_SET_VIEWPORTS] = fake_set_viewports as *const c_void;
		table[slot::device::CLEAR_STATE] = fake_clear_state as *const c_void;
		table[slot::device::CREATE_VERTEX_SHADER] = fake_create_vertex_shader as *const c_void;
		table
	}

	#[test]
	fn device_calls_reach_their_slots()
	{
		let table = device_vtable();
		let mut object = FakeDevice
		{
			vtable : table.as_ptr(),
			calls : RefCell::new(Vec::new()),
			draws : RefCell::new(Vec::new()),
			viewport : RefCell::new(None),
			vertex_shader : RefCell::new(None),
		};
		let device = unsafe { ComPtr::from_raw(&mut object as *mut FakeDevice as *mut c_void) };
		let shader = unsafe { ComPtr::from_raw(0x40 as *mut c_void) };
		let viewport = D3d10Viewport { width : 640, height : 480, max_depth : 1.0, ..D3d10Viewport::default() };

		unsafe
		{
			set_viewports(&device, &[viewport]).unwrap();
			set_vertex_shader(&device, &shader).unwrap();
			draw(&device, 3, 0).unwrap();
			clear_state(&device).unwrap();
		}

		assert_eq!(*object.calls.borrow(), vec!["RSSetViewports", "VSSetShader", "Draw", "ClearState"]);
		assert_eq!(*object.draws.borrow(), vec![(3, 0)]);
		assert_eq!(*object.viewport.borrow(), Some(viewport));
		assert_eq!(*object.vertex_shader.borrow(), Some(0x40));
	}

	#[test]
	fn vertex_shader_takes_no_class_linkage()
	{
		let table = device_vtable();
		let mut object = FakeDevice
		{
			vtable : table.as_ptr(),
			calls : RefCell::new(Vec::new()),
			draws : RefCell::new(Vec::new()),
			viewport : RefCell::new(None),
			vertex_shader : RefCell::new(None),
		};
		let device = unsafe { ComPtr::from_raw(&mut object as *mut FakeDevice as *mut c_void) };
		let bytecode = [0_u8; 16];

		let shader = unsafe { create_vertex_shader(&device, &bytecode) }.unwrap();
		assert_eq!(shader.as_raw() as usize, bytecode.as_ptr() as usize + 16);
	}
}
