//! Direct3D 11 device creation and the device/context methods of the triangle demo.

use std::{ffi::c_void, ptr};

use lazy_static::lazy_static;

use crate::{
	com::ComPtr,
	error::{check, Error, Result, DXGI_ERROR_SDK_COMPONENT_MISSING, HRESULT},
	fallback,
	guid::{interface_id, Guid},
	layout::{BufferDesc, InputElementDesc, SubresourceData, SwapChainDesc},
	native::NativeLibrary,
};

#[cfg(windows)]
pub mod renderer;

pub const LIBRARY : &str = "d3d11.dll";

pub const SDK_VERSION : u32 = 7;
pub const FEATURE_LEVEL_11_0 : u32 = 0xb000;
pub const CREATE_DEVICE_DEBUG : u32 = 0x2;
pub const RLDO_DETAIL : u32 = 0x2;
pub const USAGE_DEFAULT : u32 = 0;
pub const BIND_VERTEX_BUFFER : u32 = 0x1;
pub const INPUT_PER_VERTEX_DATA : u32 = 0;
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
		pub const CREATE_BUFFER : usize = 3;
		pub const CREATE_RENDER_TARGET_VIEW : usize = 9;
		pub const CREATE_INPUT_LAYOUT : usize = 11;
		pub const CREATE_VERTEX_SHADER : usize = 12;
		pub const CREATE_PIXEL_SHADER : usize = 15;
	}

	pub mod context
	{
		pub const PS_SET_SHADER : usize = 9;
		pub const VS_SET_SHADER : usize = 11;
		pub const DRAW : usize = 13;
		pub const IA_SET_INPUT_LAYOUT : usize = 17;
		pub const IA_SET_VERTEX_BUFFERS : usize = 18;
		pub const IA_SET_PRIMITIVE_TOPOLOGY : usize = 24;
		pub const OM_SET_RENDER_TARGETS : usize = 33;
		pub const RS_SET_VIEWPORTS : usize = 44;
		pub const CLEAR_RENDER_TARGET_VIEW : usize = 50;
		pub const CLEAR_STATE : usize = 110;
	}

	pub mod debug
	{
		pub const REPORT_LIVE_DEVICE_OBJECTS : usize = 10;
	}
}

lazy_static! {
	pub static ref IID_ID3D11_TEXTURE2D : Guid = interface_id("6f15aaf2-d208-4e89-9ab4-489535d34f9c");
	pub static ref IID_ID3D11_DEBUG : Guid = interface_id("79cf2233-7536-4948-9d36-1e4692dc5760");
	pub static ref IID_ID3D11_INFO_QUEUE : Guid = interface_id("6543dbb6-1b48-42f5-ab82-e97ec74326f6");
}

pub type D3D11CreateDeviceAndSwapChainFn = unsafe extern "system" fn(
	adapter : *mut c_void,
	driver_type : u32,
	software : *mut c_void,
	flags : u32,
	feature_levels : *const u32,
	num_feature_levels : u32,
	sdk_version : u32,
	swap_chain_desc : *const SwapChainDesc,
	swap_chain : *mut *mut c_void,
	device : *mut *mut c_void,
	feature_level : *mut u32,
	immediate_context : *mut *mut c_void) -> HRESULT;

/// Handles produced together by `D3D11CreateDeviceAndSwapChain`.
#[derive(Debug)]
pub struct DeviceAndSwapChain
{
	pub device : ComPtr,
	pub context : ComPtr,
	pub swap_chain : ComPtr,
	pub feature_level : u32,
	pub debug_layer : bool,
}

impl DeviceAndSwapChain
{
	pub fn release(&mut self)
	{
		self.swap_chain.release();
		self.context.release();
		self.device.release();
	}
}

/// `d3d11.dll` and its device creation export.
pub struct D3d11
{
	_library : NativeLibrary,
	create_device_and_swap_chain : D3D11CreateDeviceAndSwapChainFn,
}

impl D3d11
{
	pub fn load() -> Result<Self>
	{
		let library = NativeLibrary::load(LIBRARY)?;
		let create_device_and_swap_chain = unsafe { library.function("D3D11CreateDeviceAndSwapChain")? };
		Ok(D3d11 { _library : library, create_device_and_swap_chain })
	}

	/// One `D3D11CreateDeviceAndSwapChain` call for feature level 11.0.
	pub fn create_device_and_swap_chain(&self, driver_type : DriverType, flags : u32, desc : &SwapChainDesc) -> Result<DeviceAndSwapChain>
	{
		let feature_levels = [FEATURE_LEVEL_11_0];
		let mut created = DeviceAndSwapChain
		{
			device : ComPtr::null(),
			context : ComPtr::null(),
			swap_chain : ComPtr::null(),
			feature_level : 0,
			debug_layer : flags & CREATE_DEVICE_DEBUG != 0,
		};

		let hr = unsafe
		{
			(self.create_device_and_swap_chain)(
				ptr::null_mut(),
				driver_type as u32,
				ptr::null_mut(),
				flags,
				feature_levels.as_ptr(),
				feature_levels.len() as u32,
				SDK_VERSION,
				desc,
				created.swap_chain.mut_void(),
				created.device.mut_void(),
				&mut created.feature_level,
				created.context.mut_void())
		};

		if let Err(err) = check(hr, "D3D11CreateDeviceAndSwapChain")
		{
			created.release();
			return Err(err);
		}
		Ok(created)
	}

	/// Walks [`DriverType::FALLBACK_ORDER`], preferring the debug layer on each driver.
	pub fn create_with_fallback(&self, desc : &SwapChainDesc) -> Result<(DriverType, DeviceAndSwapChain)>
	{
		fallback::first_success(DriverType::FALLBACK_ORDER, |driver_type|
		{
			prefer_debug_layer(|flags| self.create_device_and_swap_chain(driver_type, flags, desc))
		})
	}
}

/// Calls `create` with `CREATE_DEVICE_DEBUG`, retrying without it when the SDK layers are missing.
///
/// Any other failure is returned as-is so the caller can move on to the next driver.
pub fn prefer_debug_layer<T, F>(mut create : F) -> Result<T>
	where F : FnMut(u32) -> Result<T>
{
	match create(CREATE_DEVICE_DEBUG)
	{
		Err(Error::Native { hresult : DXGI_ERROR_SDK_COMPONENT_MISSING, .. }) =>
		{
			log::warn!("D3D11 debug layer is not installed, continuing without it");
			create(0)
		},
		other => other,
	}
}

/// `ID3D11Device::CreateBuffer`.
///
/// # Safety
///
/// `device` must be an `ID3D11Device`; the same holds for every `device` parameter below.
pub unsafe fn create_buffer(device : &ComPtr, desc : &BufferDesc, initial_data : &SubresourceData) -> Result<ComPtr>
{
	device.create(slot::device::CREATE_BUFFER, "ID3D11Device::CreateBuffer",
		(desc as *const BufferDesc, initial_data as *const SubresourceData))
}

/// `ID3D11Device::CreateRenderTargetView` with a default view description.
///
/// # Safety
///
/// See [`create_buffer`]. `resource` must be a texture.
pub unsafe fn create_render_target_view(device : &ComPtr, resource : &ComPtr) -> Result<ComPtr>
{
	device.create(slot::device::CREATE_RENDER_TARGET_VIEW, "ID3D11Device::CreateRenderTargetView",
		(resource.as_raw(), ptr::null::<c_void>()))
}

/// `ID3D11Device::CreateInputLayout`, validated against the vertex shader bytecode.
///
/// # Safety
///
/// See [`create_buffer`].
pub unsafe fn create_input_layout(device : &ComPtr, elements : &[InputElementDesc], vertex_shader_bytecode : &[u8]) -> Result<ComPtr>
{
	device.create(slot::device::CREATE_INPUT_LAYOUT, "ID3D11Device::CreateInputLayout",
		(elements.as_ptr(), elements.len() as u32, vertex_shader_bytecode.as_ptr() as *const c_void, vertex_shader_bytecode.len()))
}

/// `ID3D11Device::CreateVertexShader` without class linkage.
///
/// # Safety
///
/// See [`create_buffer`].
pub unsafe fn create_vertex_shader(device : &ComPtr, bytecode : &[u8]) -> Result<ComPtr>
{
	device.create(slot::device::CREATE_VERTEX_SHADER, "ID3D11Device::CreateVertexShader",
		(bytecode.as_ptr() as *const c_void, bytecode.len(), ptr::null_mut::<c_void>()))
}

/// `ID3D11Device::CreatePixelShader` without class linkage.
///
/// # Safety
///
/// See [`create_buffer`].
pub unsafe fn create_pixel_shader(device : &ComPtr, bytecode : &[u8]) -> Result<ComPtr>
{
	device.create(slot::device::CREATE_PIXEL_SHADER, "ID3D11Device::CreatePixelShader",
		(bytecode.as_ptr() as *const c_void, bytecode.len(), ptr::null_mut::<c_void>()))
}

/// `ID3D11Debug::ReportLiveDeviceObjects`.
///
/// # Safety
///
/// `debug` must be an `ID3D11Debug`.
pub unsafe fn report_live_device_objects(debug : &ComPtr, flags : u32) -> Result<HRESULT>
{
	debug.call_checked(slot::debug::REPORT_LIVE_DEVICE_OBJECTS, "ID3D11Debug::ReportLiveDeviceObjects", (flags,))
}

/// `ID3D11DeviceContext` state setters and draw calls.
///
/// # Safety
///
/// Every function takes an `ID3D11DeviceContext` as `context`.
pub mod context
{
	use std::{ffi::c_void, ptr};

	use super::slot;
	use crate::{com::ComPtr, error::Result, layout::Viewport};

	pub unsafe fn set_pixel_shader(context : &ComPtr, shader : &ComPtr) -> Result<()>
	{
		context.call_nothing(slot::context::PS_SET_SHADER, (shader.as_raw(), ptr::null::<*mut c_void>(), 0_u32))
	}

	pub unsafe fn set_vertex_shader(context : &ComPtr, shader : &ComPtr) -> Result<()>
	{
		context.call_nothing(slot::context::VS_SET_SHADER, (shader.as_raw(), ptr::null::<*mut c_void>(), 0_u32))
	}

	pub unsafe fn draw(context : &ComPtr, vertex_count : u32, start_vertex : u32) -> Result<()>
	{
		context.call_nothing(slot::context::DRAW, (vertex_count, start_vertex))
	}

	pub unsafe fn set_input_layout(context : &ComPtr, layout : &ComPtr) -> Result<()>
	{
		context.call_nothing(slot::context::IA_SET_INPUT_LAYOUT, (layout.as_raw(),))
	}

	/// Binds `buffers` from `start_slot` on; `strides` and `offsets` run parallel to it.
	pub unsafe fn set_vertex_buffers(context : &ComPtr, start_slot : u32, buffers : &[*mut c_void], strides : &[u32], offsets : &[u32]) -> Result<()>
	{
		debug_assert!(buffers.len() == strides.len() && buffers.len() == offsets.len());
		context.call_nothing(slot::context::IA_SET_VERTEX_BUFFERS,
			(start_slot, buffers.len() as u32, buffers.as_ptr(), strides.as_ptr(), offsets.as_ptr()))
	}

	pub unsafe fn set_primitive_topology(context : &ComPtr, topology : u32) -> Result<()>
	{
		context.call_nothing(slot::context::IA_SET_PRIMITIVE_TOPOLOGY, (topology,))
	}

	pub unsafe fn set_render_targets(context : &ComPtr, views : &[*mut c_void]) -> Result<()>
	{
		context.call_nothing(slot::context::OM_SET_RENDER_TARGETS, (views.len() as u32, views.as_ptr(), ptr::null_mut::<c_void>()))
	}

	pub unsafe fn set_viewports(context : &ComPtr, viewports : &[Viewport]) -> Result<()>
	{
		context.call_nothing(slot::context::RS_SET_VIEWPORTS, (viewports.len() as u32, viewports.as_ptr()))
	}

	pub unsafe fn clear_render_target_view(context : &ComPtr, view : &ComPtr, color : &[f32; 4]) -> Result<()>
	{
		context.call_nothing(slot::context::CLEAR_RENDER_TARGET_VIEW, (view.as_raw(), color as *const [f32; 4]))
	}

	pub unsafe fn clear_state(context : &ComPtr) -> Result<()>
	{
		context.call_nothing(slot::context::CLEAR_STATE, ())
	}
}
