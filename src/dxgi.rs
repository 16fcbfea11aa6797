//! DXGI factory and swap chain methods used by the demos.

use std::ffi::c_void;

use lazy_static::lazy_static;

use crate::{
	com::ComPtr,
	error::{check, Result, HRESULT},
	guid::{interface_id, Guid},
	layout::SwapChainDesc,
	native::NativeLibrary,
};

pub const LIBRARY : &str = "dxgi.dll";

pub const FORMAT_UNKNOWN : u32 = 0;
pub const FORMAT_R32G32B32A32_FLOAT : u32 = 2;
pub const FORMAT_R32G32B32_FLOAT : u32 = 6;
pub const FORMAT_R8G8B8A8_UNORM : u32 = 28;

pub const USAGE_RENDER_TARGET_OUTPUT : u32 = 0x20;

pub const SWAP_EFFECT_DISCARD : u32 = 0;
pub const SWAP_EFFECT_FLIP_DISCARD : u32 = 4;

/// Vtable slots, counted from `IUnknown` through each interface's bases.
pub mod slot
{
	// IDXGIFactory
	pub const FACTORY_CREATE_SWAP_CHAIN : usize = 10;
	// IDXGIFactory4
	pub const FACTORY4_ENUM_WARP_ADAPTER : usize = 27;

	// IDXGISwapChain
	pub const SWAP_CHAIN_PRESENT : usize = 8;
	pub const SWAP_CHAIN_GET_BUFFER : usize = 9;
	// IDXGISwapChain3
	pub const SWAP_CHAIN3_GET_CURRENT_BACK_BUFFER_INDEX : usize = 36;
}

lazy_static! {
	pub static ref IID_IDXGI_FACTORY4 : Guid = interface_id("1bc6ea02-ef36-464f-bf0c-21ca39e5168a");
	pub static ref IID_IDXGI_ADAPTER : Guid = interface_id("2411e7e1-12ac-4ccf-bd14-9798e8534dc0");
	pub static ref IID_IDXGI_SWAP_CHAIN3 : Guid = interface_id("94d99bdb-f1f8-4ab0-b236-7da0170edab1");
}

pub type CreateDxgiFactory1Fn = unsafe extern "system" fn(riid : *const Guid, factory : *mut *mut c_void) -> HRESULT;

/// `dxgi.dll` and the one export the demos need from it.
pub struct Dxgi
{
	_library : NativeLibrary,
	create_factory1 : CreateDxgiFactory1Fn,
}

impl Dxgi
{
	pub fn load() -> Result<Self>
	{
		let library = NativeLibrary::load(LIBRARY)?;
		let create_factory1 = unsafe { library.function::<CreateDxgiFactory1Fn>("CreateDXGIFactory1")? };
		Ok(Dxgi { _library : library, create_factory1 })
	}

	/// `CreateDXGIFactory1`, asking for `IDXGIFactory4`.
	pub fn create_factory(&self) -> Result<ComPtr>
	{
		let mut factory = ComPtr::null();
		check(unsafe { (self.create_factory1)(&*IID_IDXGI_FACTORY4, factory.mut_void()) }, "CreateDXGIFactory1")?;
		Ok(factory)
	}
}

/// `IDXGIFactory::CreateSwapChain`. For D3D12 `device` is the command queue.
///
/// # Safety
///
/// `factory` must be an `IDXGIFactory` and `device` a device or command queue.
pub unsafe fn create_swap_chain(factory : &ComPtr, device : &ComPtr, desc : &SwapChainDesc) -> Result<ComPtr>
{
	factory.create(slot::FACTORY_CREATE_SWAP_CHAIN, "IDXGIFactory::CreateSwapChain", (device.as_raw(), desc as *const SwapChainDesc))
}

/// `IDXGIFactory4::EnumWarpAdapter`.
///
/// # Safety
///
/// `factory` must be an `IDXGIFactory4`.
pub unsafe fn enum_warp_adapter(factory : &ComPtr) -> Result<ComPtr>
{
	factory.create(slot::FACTORY4_ENUM_WARP_ADAPTER, "IDXGIFactory4::EnumWarpAdapter", (&*IID_IDXGI_ADAPTER as *const Guid,))
}

/// `IDXGISwapChain::Present`. Success codes such as `DXGI_STATUS_OCCLUDED` come back as-is.
///
/// # Safety
///
/// `swap_chain` must be an `IDXGISwapChain`.
pub unsafe fn present(swap_chain : &ComPtr, sync_interval : u32, flags : u32) -> Result<HRESULT>
{
	swap_chain.call_checked(slot::SWAP_CHAIN_PRESENT, "IDXGISwapChain::Present", (sync_interval, flags))
}

/// `IDXGISwapChain::GetBuffer`.
///
/// # Safety
///
/// `swap_chain` must be an `IDXGISwapChain`.
pub unsafe fn get_buffer(swap_chain : &ComPtr, index : u32, iid : &Guid) -> Result<ComPtr>
{
	swap_chain.create(slot::SWAP_CHAIN_GET_BUFFER, "IDXGISwapChain::GetBuffer", (index, iid as *const Guid))
}

/// `IDXGISwapChain3::GetCurrentBackBufferIndex`.
///
/// # Safety
///
/// `swap_chain` must be an `IDXGISwapChain3`.
pub unsafe fn current_back_buffer_index(swap_chain : &ComPtr) -> Result<u32>
{
	swap_chain.call::<u32, _>(slot::SWAP_CHAIN3_GET_CURRENT_BACK_BUFFER_INDEX, ())
}
