//! Direct3D 12 exports and the interface methods the triangle demo calls.
//!
//! Every wrapper takes the interface it documents as an untyped [`ComPtr`];
//! passing a handle of another interface is undefined behavior, which is why
//! the wrappers are `unsafe`.

use std::ffi::c_void;

use lazy_static::lazy_static;

use crate::{
	com::ComPtr,
	error::{check, Result, HRESULT},
	guid::{interface_id, Guid},
	layout::{
		CommandQueueDesc, CpuDescriptorHandle, DescriptorHeapDesc, GraphicsPipelineStateDesc,
		HeapProperties, Range, ResourceDesc, RootSignatureDesc,
	},
	native::NativeLibrary,
	probe,
	vtable::StructReturn,
};

#[cfg(windows)]
pub mod renderer;

pub const LIBRARY : &str = "d3d12.dll";

pub const FEATURE_LEVEL_11_0 : u32 = 0xb000;
pub const FEATURE_LEVEL_12_0 : u32 = 0xc000;

pub const COMMAND_LIST_TYPE_DIRECT : u32 = 0;
pub const DESCRIPTOR_HEAP_TYPE_RTV : u32 = 2;
pub const DESCRIPTOR_HEAP_FLAG_NONE : u32 = 0;
pub const HEAP_TYPE_UPLOAD : u32 = 2;
pub const HEAP_FLAG_NONE : u32 = 0;
pub const RESOURCE_DIMENSION_BUFFER : u32 = 1;
pub const TEXTURE_LAYOUT_ROW_MAJOR : u32 = 1;
pub const RESOURCE_STATE_PRESENT : u32 = 0;
pub const RESOURCE_STATE_RENDER_TARGET : u32 = 0x4;
pub const RESOURCE_STATE_GENERIC_READ : u32 = 0xAC3;
pub const ROOT_SIGNATURE_VERSION_1 : u32 = 1;
pub const ROOT_SIGNATURE_FLAG_ALLOW_INPUT_ASSEMBLER_INPUT_LAYOUT : u32 = 0x1;
pub const PRIMITIVE_TOPOLOGY_TYPE_TRIANGLE : u32 = 3;
pub const INPUT_CLASSIFICATION_PER_VERTEX_DATA : u32 = 0;
pub const FENCE_FLAG_NONE : u32 = 0;
pub const PRIMITIVE_TOPOLOGY_TRIANGLELIST : u32 = 4;

/// Vtable slots. Each interface inherits `IUnknown` (0-2), `ID3D12Object` (3-6)
/// and, for device children, `ID3D12DeviceChild::GetDevice` (7).
pub mod slot
{
	pub mod debug
	{
		pub const ENABLE_DEBUG_LAYER : usize = 3;
	}

	pub mod device
	{
		pub const CREATE_COMMAND_QUEUE : usize = 8;
		pub const CREATE_COMMAND_ALLOCATOR : usize = 9;
		pub const CREATE_GRAPHICS_PIPELINE_STATE : usize = 10;
		pub const CREATE_COMMAND_LIST : usize = 12;
		pub const CREATE_DESCRIPTOR_HEAP : usize = 14;
		pub const GET_DESCRIPTOR_HANDLE_INCREMENT_SIZE : usize = 15;
		pub const CREATE_ROOT_SIGNATURE : usize = 16;
		pub const CREATE_RENDER_TARGET_VIEW : usize = 20;
		pub const CREATE_COMMITTED_RESOURCE : usize = 27;
		pub const CREATE_FENCE : usize = 36;
	}

	pub mod descriptor_heap
	{
		/// Nominal; the demo probes around it, see [`super::super::resolve_heap_desc_slot`].
		pub const GET_DESC : usize = 8;
		pub const GET_CPU_DESCRIPTOR_HANDLE_FOR_HEAP_START : usize = 9;
	}

	pub mod command_allocator
	{
		pub const RESET : usize = 8;
	}

	pub mod command_queue
	{
		pub const EXECUTE_COMMAND_LISTS : usize = 10;
		pub const SIGNAL : usize = 14;
	}

	pub mod fence
	{
		pub const GET_COMPLETED_VALUE : usize = 8;
		pub const SET_EVENT_ON_COMPLETION : usize = 9;
	}

	pub mod resource
	{
		pub const MAP : usize = 8;
		pub const UNMAP : usize = 9;
		pub const GET_GPU_VIRTUAL_ADDRESS : usize = 11;
	}

	pub mod graphics_command_list
	{
		pub const CLOSE : usize = 9;
		pub const RESET : usize = 10;
		pub const DRAW_INSTANCED : usize = 12;
		pub const IA_SET_PRIMITIVE_TOPOLOGY : usize = 20;
		pub const RS_SET_VIEWPORTS : usize = 21;
		pub const RS_SET_SCISSOR_RECTS : usize = 22;
		pub const RESOURCE_BARRIER : usize = 26;
		pub const SET_GRAPHICS_ROOT_SIGNATURE : usize = 30;
		pub const IA_SET_VERTEX_BUFFERS : usize = 44;
		pub const OM_SET_RENDER_TARGETS : usize = 46;
		pub const CLEAR_RENDER_TARGET_VIEW : usize = 48;
	}
}

lazy_static! {
	pub static ref IID_ID3D12_DEVICE : Guid = interface_id("189819f1-1db6-4b57-be54-1821339b85f7");
	pub static ref IID_ID3D12_COMMAND_QUEUE : Guid = interface_id("0ec870a6-5d7e-4c22-8cfc-5baae07616ed");
	pub static ref IID_ID3D12_DESCRIPTOR_HEAP : Guid = interface_id("8efb471d-616c-4f49-90f7-127bb763fa51");
	pub static ref IID_ID3D12_RESOURCE : Guid = interface_id("696442be-a72e-4059-bc79-5b5c98040fad");
	pub static ref IID_ID3D12_COMMAND_ALLOCATOR : Guid = interface_id("6102dee4-af59-4b09-b999-b44d73f09b24");
	pub static ref IID_ID3D12_GRAPHICS_COMMAND_LIST : Guid = interface_id("5b160d0f-ac1b-4185-8ba8-b3ae42a5a455");
	pub static ref IID_ID3D12_FENCE : Guid = interface_id("0a753dcf-c4d8-4b91-adf6-be5a60d95a76");
	pub static ref IID_ID3D12_ROOT_SIGNATURE : Guid = interface_id("c54a6b66-72df-4ee8-8be5-a946a1429214");
	pub static ref IID_ID3D12_PIPELINE_STATE : Guid = interface_id("765a30f3-f624-4c6f-a828-ace948622445");
	pub static ref IID_ID3D12_DEBUG : Guid = interface_id("344488b7-6846-474b-b989-f027448245e0");
	pub static ref IID_ID3D12_INFO_QUEUE : Guid = interface_id("0742a90b-c387-483f-b946-30a7e4e61458");
}

pub type D3D12CreateDeviceFn = unsafe extern "system" fn(adapter : *mut c_void, minimum_feature_level : u32, riid : *const Guid, device : *mut *mut c_void) -> HRESULT;
pub type D3D12GetDebugInterfaceFn = unsafe extern "system" fn(riid : *const Guid, debug : *mut *mut c_void) -> HRESULT;
pub type D3D12SerializeRootSignatureFn = unsafe extern "system" fn(desc : *const RootSignatureDesc, version : u32, blob : *mut *mut c_void, error_blob : *mut *mut c_void) -> HRESULT;

/// `d3d12.dll` and its exports.
pub struct D3d12
{
	_library : NativeLibrary,
	create_device : D3D12CreateDeviceFn,
	get_debug_interface : D3D12GetDebugInterfaceFn,
	serialize_root_signature : D3D12SerializeRootSignatureFn,
}

impl D3d12
{
	pub fn load() -> Result<Self>
	{
		let library = NativeLibrary::load(LIBRARY)?;
		unsafe
		{
			Ok(D3d12
			{
				create_device : library.function("D3D12CreateDevice")?,
				get_debug_interface : library.function("D3D12GetDebugInterface")?,
				serialize_root_signature : library.function("D3D12SerializeRootSignature")?,
				_library : library,
			})
		}
	}

	/// `D3D12CreateDevice`. A null `adapter` selects the default hardware adapter.
	pub fn create_device(&self, adapter : &ComPtr, minimum_feature_level : u32) -> Result<ComPtr>
	{
		let mut device = ComPtr::null();
		check(unsafe { (self.create_device)(adapter.as_raw(), minimum_feature_level, &*IID_ID3D12_DEVICE, device.mut_void()) }, "D3D12CreateDevice")?;
		Ok(device)
	}

	/// `D3D12GetDebugInterface` for `ID3D12Debug`. Fails when the SDK layers are not installed.
	pub fn debug_interface(&self) -> Result<ComPtr>
	{
		let mut debug = ComPtr::null();
		check(unsafe { (self.get_debug_interface)(&*IID_ID3D12_DEBUG, debug.mut_void()) }, "D3D12GetDebugInterface")?;
		Ok(debug)
	}

	/// `D3D12SerializeRootSignature`. Returns the serialized blob.
	pub fn serialize_root_signature(&self, desc : &RootSignatureDesc) -> Result<ComPtr>
	{
		let mut blob = ComPtr::null();
		let mut error_blob = ComPtr::null();
		let hr = unsafe { (self.serialize_root_signature)(desc, ROOT_SIGNATURE_VERSION_1, blob.mut_void(), error_blob.mut_void()) };
		if !error_blob.is_null()
		{
			if let Ok(message) = unsafe { crate::d3dcompiler::blob_text(&error_blob) }
			{
				log::warn!("root signature serialization: {}", message);
			}
			error_blob.release();
		}
		check(hr, "D3D12SerializeRootSignature")?;
		Ok(blob)
	}
}

/// `ID3D12Debug::EnableDebugLayer`.
///
/// # Safety
///
/// `debug` must be an `ID3D12Debug`.
pub unsafe fn enable_debug_layer(debug : &ComPtr) -> Result<()>
{
	debug.call_nothing(slot::debug::ENABLE_DEBUG_LAYER, ())
}

/// `ID3D12Device::CreateCommandQueue`.
///
/// # Safety
///
/// `device` must be an `ID3D12Device`; the same holds for every `device` parameter below.
pub unsafe fn create_command_queue(device : &ComPtr, desc : &CommandQueueDesc) -> Result<ComPtr>
{
	device.create(slot::device::CREATE_COMMAND_QUEUE, "ID3D12Device::CreateCommandQueue",
		(desc as *const CommandQueueDesc, &*IID_ID3D12_COMMAND_QUEUE as *const Guid))
}

/// `ID3D12Device::CreateCommandAllocator`.
///
/// # Safety
///
/// See [`create_command_queue`].
pub unsafe fn create_command_allocator(device : &ComPtr, list_type : u32) -> Result<ComPtr>
{
	device.create(slot::device::CREATE_COMMAND_ALLOCATOR, "ID3D12Device::CreateCommandAllocator",
		(list_type, &*IID_ID3D12_COMMAND_ALLOCATOR as *const Guid))
}

/// `ID3D12Device::CreateGraphicsPipelineState`.
///
/// # Safety
///
/// See [`create_command_queue`]. Every pointer inside `desc` must be live for the call.
pub unsafe fn create_graphics_pipeline_state(device : &ComPtr, desc : &GraphicsPipelineStateDesc) -> Result<ComPtr>
{
	device.create(slot::device::CREATE_GRAPHICS_PIPELINE_STATE, "ID3D12Device::CreateGraphicsPipelineState",
		(desc as *const GraphicsPipelineStateDesc, &*IID_ID3D12_PIPELINE_STATE as *const Guid))
}

/// `ID3D12Device::CreateCommandList`, asking for `ID3D12GraphicsCommandList`.
///
/// # Safety
///
/// See [`create_command_queue`].
pub unsafe fn create_command_list(device : &ComPtr, node_mask : u32, list_type : u32, allocator : &ComPtr, initial_state : &ComPtr) -> Result<ComPtr>
{
	device.create(slot::device::CREATE_COMMAND_LIST, "ID3D12Device::CreateCommandList",
		(node_mask, list_type, allocator.as_raw(), initial_state.as_raw(), &*IID_ID3D12_GRAPHICS_COMMAND_LIST as *const Guid))
}

/// `ID3D12Device::CreateDescriptorHeap`.
///
/// # Safety
///
/// See [`create_command_queue`].
pub unsafe fn create_descriptor_heap(device : &ComPtr, desc : &DescriptorHeapDesc) -> Result<ComPtr>
{
	device.create(slot::device::CREATE_DESCRIPTOR_HEAP, "ID3D12Device::CreateDescriptorHeap",
		(desc as *const DescriptorHeapDesc, &*IID_ID3D12_DESCRIPTOR_HEAP as *const Guid))
}

/// `ID3D12Device::GetDescriptorHandleIncrementSize`.
///
/// # Safety
///
/// See [`create_command_queue`].
pub unsafe fn descriptor_handle_increment_size(device : &ComPtr, heap_type : u32) -> Result<u32>
{
	device.call::<u32, _>(slot::device::GET_DESCRIPTOR_HANDLE_INCREMENT_SIZE, (heap_type,))
}

/// `ID3D12Device::CreateRootSignature` from serialized bytes.
///
/// # Safety
///
/// See [`create_command_queue`]. `blob` must point to `blob_length` readable bytes.
pub unsafe fn create_root_signature(device : &ComPtr, node_mask : u32, blob : *const c_void, blob_length : usize) -> Result<ComPtr>
{
	device.create(slot::device::CREATE_ROOT_SIGNATURE, "ID3D12Device::CreateRootSignature",
		(node_mask, blob, blob_length, &*IID_ID3D12_ROOT_SIGNATURE as *const Guid))
}

/// `ID3D12Device::CreateRenderTargetView` with a default view description.
///
/// # Safety
///
/// See [`create_command_queue`]. `resource` must be an `ID3D12Resource` and `destination` a live descriptor.
pub unsafe fn create_render_target_view(device : &ComPtr, resource : &ComPtr, destination : CpuDescriptorHandle) -> Result<()>
{
	device.call_nothing(slot::device::CREATE_RENDER_TARGET_VIEW, (resource.as_raw(), std::ptr::null::<c_void>(), destination))
}

/// `ID3D12Device::CreateCommittedResource` without an optimized clear value.
///
/// # Safety
///
/// See [`create_command_queue`].
pub unsafe fn create_committed_resource(device : &ComPtr, heap : &HeapProperties, heap_flags : u32, desc : &ResourceDesc, initial_state : u32) -> Result<ComPtr>
{
	device.create(slot::device::CREATE_COMMITTED_RESOURCE, "ID3D12Device::CreateCommittedResource",
		(heap as *const HeapProperties, heap_flags, desc as *const ResourceDesc, initial_state, std::ptr::null::<c_void>(), &*IID_ID3D12_RESOURCE as *const Guid))
}

/// `ID3D12Device::CreateFence`.
///
/// # Safety
///
/// See [`create_command_queue`].
pub unsafe fn create_fence(device : &ComPtr, initial_value : u64, flags : u32) -> Result<ComPtr>
{
	device.create(slot::device::CREATE_FENCE, "ID3D12Device::CreateFence",
		(initial_value, flags, &*IID_ID3D12_FENCE as *const Guid))
}

/// Range checks for a descriptor heap description read through a probed slot.
pub fn plausible_heap_desc(desc : &DescriptorHeapDesc) -> bool
{
	desc.heap_type <= 4
		&& (1..=8192).contains(&desc.num_descriptors)
		&& desc.flags <= 0xFF
		&& desc.node_mask <= 0xFF
}

/// `ID3D12DescriptorHeap::GetDesc` called through `slot`, which returns the struct through a hidden out-pointer.
///
/// # Safety
///
/// `heap` must be an `ID3D12DescriptorHeap` and `slot` a method with the `GetDesc` shape.
pub unsafe fn heap_desc_at(heap : &ComPtr, slot : usize) -> Result<DescriptorHeapDesc>
{
	heap.call_struct::<DescriptorHeapDesc, _>(slot, StructReturn::OutPointer, ())
}

/// Finds the `GetDesc` slot of a descriptor heap by probing around the nominal one.
///
/// Slots 8, 9 and 7 are tried in that order. The CPU-handle method is the
/// slot after the one that answers. Slot 9 shares the out-pointer shape, but
/// slot 7 is `ID3D12DeviceChild::GetDevice(REFIID, void**)`: reaching it passes
/// the scratch buffer as the IID and leaves the `void**` argument unset, so the
/// callee writes through whatever that register holds. It is only called once
/// 8 and 9 have both come back implausible.
///
/// # Safety
///
/// `heap` must be an `ID3D12DescriptorHeap`.
pub unsafe fn resolve_heap_desc_slot(heap : &ComPtr) -> Result<(usize, DescriptorHeapDesc)>
{
	let candidates = probe::candidates_around(slot::descriptor_heap::GET_DESC);
	probe::probe_slot(&candidates, |slot| heap_desc_at(heap, slot), plausible_heap_desc)
}

/// `ID3D12DescriptorHeap::GetCPUDescriptorHandleForHeapStart`, found right after `desc_slot`.
///
/// # Safety
///
/// `heap` must be an `ID3D12DescriptorHeap` and `desc_slot` its resolved `GetDesc` slot.
pub unsafe fn cpu_descriptor_handle_for_heap_start(heap : &ComPtr, desc_slot : usize) -> Result<CpuDescriptorHandle>
{
	heap.call_struct::<CpuDescriptorHandle, _>(desc_slot + 1, StructReturn::OutPointer, ())
}

/// `ID3D12CommandAllocator::Reset`.
///
/// # Safety
///
/// `allocator` must be an `ID3D12CommandAllocator`.
pub unsafe fn reset_command_allocator(allocator : &ComPtr) -> Result<HRESULT>
{
	allocator.call_checked(slot::command_allocator::RESET, "ID3D12CommandAllocator::Reset", ())
}

/// `ID3D12CommandQueue::ExecuteCommandLists`.
///
/// # Safety
///
/// `queue` must be an `ID3D12CommandQueue` and every list a closed command list.
pub unsafe fn execute_command_lists(queue : &ComPtr, lists : &[*mut c_void]) -> Result<()>
{
	queue.call_nothing(slot::command_queue::EXECUTE_COMMAND_LISTS, (lists.len() as u32, lists.as_ptr()))
}

/// `ID3D12CommandQueue::Signal`.
///
/// # Safety
///
/// `queue` must be an `ID3D12CommandQueue` and `fence` an `ID3D12Fence`.
pub unsafe fn signal(queue : &ComPtr, fence : &ComPtr, value : u64) -> Result<HRESULT>
{
	queue.call_checked(slot::command_queue::SIGNAL, "ID3D12CommandQueue::Signal", (fence.as_raw(), value))
}

/// `ID3D12Fence::GetCompletedValue`.
///
/// # Safety
///
/// `fence` must be an `ID3D12Fence`.
pub unsafe fn completed_value(fence : &ComPtr) -> Result<u64>
{
	fence.call::<u64, _>(slot::fence::GET_COMPLETED_VALUE, ())
}

/// `ID3D12Fence::SetEventOnCompletion`.
///
/// # Safety
///
/// `fence` must be an `ID3D12Fence` and `event` a live event handle.
pub unsafe fn set_event_on_completion(fence : &ComPtr, value : u64, event : *mut c_void) -> Result<HRESULT>
{
	fence.call_checked(slot::fence::SET_EVENT_ON_COMPLETION, "ID3D12Fence::SetEventOnCompletion", (value, event))
}

/// `ID3D12Resource::Map` of subresource 0. A null range means the CPU reads nothing back.
///
/// # Safety
///
/// `resource` must be a CPU-visible `ID3D12Resource`.
pub unsafe fn map(resource : &ComPtr, read_range : Option<&Range>) -> Result<*mut c_void>
{
	let mut data = std::ptr::null_mut::<c_void>();
	let range = read_range.map_or(std::ptr::null(), |range| range as *const Range);
	resource.call_checked(slot::resource::MAP, "ID3D12Resource::Map", (0_u32, range, &mut data as *mut *mut c_void))?;
	Ok(data)
}

/// `ID3D12Resource::Unmap` of subresource 0.
///
/// # Safety
///
/// `resource` must be a mapped `ID3D12Resource`.
pub unsafe fn unmap(resource : &ComPtr, written_range : &Range) -> Result<()>
{
	resource.call_nothing(slot::resource::UNMAP, (0_u32, written_range as *const Range))
}

/// `ID3D12Resource::GetGPUVirtualAddress`.
///
/// # Safety
///
/// `resource` must be a buffer `ID3D12Resource`.
pub unsafe fn gpu_virtual_address(resource : &ComPtr) -> Result<u64>
{
	resource.call::<u64, _>(slot::resource::GET_GPU_VIRTUAL_ADDRESS, ())
}

/// Recording methods of `ID3D12GraphicsCommandList`.
///
/// # Safety
///
/// Every function takes an `ID3D12GraphicsCommandList` as `list`.
pub mod command_list
{
	use super::slot;
	use crate::{
		com::ComPtr,
		error::{Result, HRESULT},
		layout::{Bool, CpuDescriptorHandle, Rect, ResourceBarrier, VertexBufferView, Viewport, FALSE},
	};

	pub unsafe fn close(list : &ComPtr) -> Result<HRESULT>
	{
		list.call_checked(slot::graphics_command_list::CLOSE, "ID3D12GraphicsCommandList::Close", ())
	}

	pub unsafe fn reset(list : &ComPtr, allocator : &ComPtr, initial_state : &ComPtr) -> Result<HRESULT>
	{
		list.call_checked(slot::graphics_command_list::RESET, "ID3D12GraphicsCommandList::Reset", (allocator.as_raw(), initial_state.as_raw()))
	}

	pub unsafe fn draw_instanced(list : &ComPtr, vertex_count : u32, instance_count : u32, start_vertex : u32, start_instance : u32) -> Result<()>
	{
		list.call_nothing(slot::graphics_command_list::DRAW_INSTANCED, (vertex_count, instance_count, start_vertex, start_instance))
	}

	pub unsafe fn set_primitive_topology(list : &ComPtr, topology : u32) -> Result<()>
	{
		list.call_nothing(slot::graphics_command_list::IA_SET_PRIMITIVE_TOPOLOGY, (topology,))
	}

	pub unsafe fn set_viewports(list : &ComPtr, viewports : &[Viewport]) -> Result<()>
	{
		list.call_nothing(slot::graphics_command_list::RS_SET_VIEWPORTS, (viewports.len() as u32, viewports.as_ptr()))
	}

	pub unsafe fn set_scissor_rects(list : &ComPtr, rects : &[Rect]) -> Result<()>
	{
		list.call_nothing(slot::graphics_command_list::RS_SET_SCISSOR_RECTS, (rects.len() as u32, rects.as_ptr()))
	}

	pub unsafe fn resource_barrier(list : &ComPtr, barriers : &[ResourceBarrier]) -> Result<()>
	{
		list.call_nothing(slot::graphics_command_list::RESOURCE_BARRIER, (barriers.len() as u32, barriers.as_ptr()))
	}

	pub unsafe fn set_graphics_root_signature(list : &ComPtr, root_signature : &ComPtr) -> Result<()>
	{
		list.call_nothing(slot::graphics_command_list::SET_GRAPHICS_ROOT_SIGNATURE, (root_signature.as_raw(),))
	}

	pub unsafe fn set_vertex_buffers(list : &ComPtr, start_slot : u32, views : &[VertexBufferView]) -> Result<()>
	{
		list.call_nothing(slot::graphics_command_list::IA_SET_VERTEX_BUFFERS, (start_slot, views.len() as u32, views.as_ptr()))
	}

	pub unsafe fn set_render_targets(list : &ComPtr, render_targets : &[CpuDescriptorHandle]) -> Result<()>
	{
		let single_handle_to_range : Bool = FALSE;
		list.call_nothing(slot::graphics_command_list::OM_SET_RENDER_TARGETS,
			(render_targets.len() as u32, render_targets.as_ptr(), single_handle_to_range, std::ptr::null::<CpuDescriptorHandle>()))
	}

	pub unsafe fn clear_render_target_view(list : &ComPtr, view : CpuDescriptorHandle, color : &[f32; 4]) -> Result<()>
	{
		list.call_nothing(slot::graphics_command_list::CLEAR_RENDER_TARGET_VIEW, (view, color as *const [f32; 4], 0_u32, std::ptr::null::<Rect>()))
	}
}

#[cfg(test)]
mod tests
{
	use super::*;
	use crate::error::Error;
	use std::cell::{Cell, RefCell};

	#[test]
	fn identifiers_match_their_canonical_text()
	{
		assert_eq!(IID_ID3D12_DEVICE.to_string(), "189819f1-1db6-4b57-be54-1821339b85f7");
		assert_eq!(IID_ID3D12_GRAPHICS_COMMAND_LIST.to_string(), "5b160d0f-ac1b-4185-8ba8-b3ae42a5a455");
		assert_eq!(IID_ID3D12_INFO_QUEUE.data1, 0x0742a90b);
	}

	#[test]
	fn heap_desc_sanity_bounds()
	{
		let rtv = DescriptorHeapDesc { heap_type : DESCRIPTOR_HEAP_TYPE_RTV, num_descriptors : 2, flags : 0, node_mask : 0 };
		assert!(plausible_heap_desc(&rtv));
		assert!(!plausible_heap_desc(&DescriptorHeapDesc { heap_type : 5, ..rtv }));
		assert!(!plausible_heap_desc(&DescriptorHeapDesc { num_descriptors : 0, ..rtv }));
		assert!(!plausible_heap_desc(&DescriptorHeapDesc { num_descriptors : 8193, ..rtv }));
		assert!(!plausible_heap_desc(&DescriptorHeapDesc { flags : 0x100, ..rtv }));
		assert!(!plausible_heap_desc(&DescriptorHeapDesc { node_mask : 0x100, ..rtv }));
	}

	/// A descriptor heap whose `GetDesc` may sit one slot later than nominal.
	#[repr(C)]
	struct FakeHeap
	{
		vtable : *const *const c_void,
		heap_start : usize,
	}

	unsafe extern "system" fn unused(_this : *mut c_void) -> HRESULT
	{
		-1
	}

	unsafe extern "system" fn garbage_desc(_this : *mut c_void, out : *mut DescriptorHeapDesc) -> *mut DescriptorHeapDesc
	{
		*out = DescriptorHeapDesc { heap_type : 0xFFFF_FFFF, num_descriptors : 0, flags : 0xFFFF_FFFF, node_mask : 0xFFFF_FFFF };
		out
	}

	unsafe extern "system" fn rtv_desc(_this : *mut c_void, out : *mut DescriptorHeapDesc) -> *mut DescriptorHeapDesc
	{
		*out = DescriptorHeapDesc { heap_type : DESCRIPTOR_HEAP_TYPE_RTV, num_descriptors : 2, flags : 0, node_mask : 0 };
		out
	}

	unsafe extern "system" fn heap_start(this : *mut c_void, out : *mut CpuDescriptorHandle) -> *mut CpuDescriptorHandle
	{
		*out = CpuDescriptorHandle { ptr : (*(this as *const FakeHeap)).heap_start };
		out
	}

	fn heap_vtable(desc_slot : usize) -> Vec<*const c_void>
	{
		let mut table = vec![unused as *const c_void; 12];
		for slot in 7..desc_slot
		{
			table[slot] = garbage_desc as *const c_void;
		}
		table[desc_slot] = rtv_desc as *const c_void;
		table[desc_slot + 1] = heap_start as *const c_void;
		table
	}

	#[test]
	fn nominal_heap_layout_resolves_directly()
	{
		let table = heap_vtable(slot::descriptor_heap::GET_DESC);
		let mut object = FakeHeap { vtable : table.as_ptr(), heap_start : 0x7000 };
		let heap = unsafe { ComPtr::from_raw(&mut object as *mut FakeHeap as *mut c_void) };

		let (desc_slot, desc) = unsafe { resolve_heap_desc_slot(&heap) }.unwrap();
		assert_eq!(desc_slot, slot::descriptor_heap::GET_DESC);
		assert_eq!(desc.num_descriptors, 2);
		assert_eq!(desc_slot + 1, slot::descriptor_heap::GET_CPU_DESCRIPTOR_HANDLE_FOR_HEAP_START);
		assert_eq!(unsafe { cpu_descriptor_handle_for_heap_start(&heap, desc_slot) }.unwrap().ptr, 0x7000);
	}

	#[test]
	fn shifted_heap_layout_is_found_one_slot_later()
	{
		let table = heap_vtable(slot::descriptor_heap::GET_DESC + 1);
		let mut object = FakeHeap { vtable : table.as_ptr(), heap_start : 0x9000 };
		let heap = unsafe { ComPtr::from_raw(&mut object as *mut FakeHeap as *mut c_void) };

		let (desc_slot, _) = unsafe { resolve_heap_desc_slot(&heap) }.unwrap();
		assert_eq!(desc_slot, 9);
		assert_eq!(unsafe { cpu_descriptor_handle_for_heap_start(&heap, desc_slot) }.unwrap().ptr, 0x9000);
	}

	#[test]
	fn implausible_heap_reports_probed_slots()
	{
		let mut table = vec![unused as *const c_void; 12];
		for slot in 7..=9
		{
			table[slot] = garbage_desc as *const c_void;
		}
		let mut object = FakeHeap { vtable : table.as_ptr(), heap_start : 0 };
		let heap = unsafe { ComPtr::from_raw(&mut object as *mut FakeHeap as *mut c_void) };

		match unsafe { resolve_heap_desc_slot(&heap) }
		{
			Err(Error::SlotProbeFailed { candidates }) => assert_eq!(candidates, vec![8, 9, 7]),
			other => panic!("unexpected {:?}", other),
		}
	}

	#[test]
	fn slot_before_nominal_is_tried_last()
	{
		let table = heap_vtable(slot::descriptor_heap::GET_DESC - 1);
		let mut object = FakeHeap { vtable : table.as_ptr(), heap_start : 0x5000 };
		let heap = unsafe { ComPtr::from_raw(&mut object as *mut FakeHeap as *mut c_void) };

		let (desc_slot, desc) = unsafe { resolve_heap_desc_slot(&heap) }.unwrap();
		assert_eq!(desc_slot, 7);
		assert_eq!(desc.heap_type, DESCRIPTOR_HEAP_TYPE_RTV);
	}

	/// Records what reaches the command queue and fence slots.
	#[repr(C)]
	struct FakeQueue
	{
		vtable : *const *const c_void,
		signaled : Cell<u64>,
		executed : RefCell<Vec<usize>>,
	}

	unsafe fn queue<'a>(this : *mut c_void) -> &'a FakeQueue
	{
		&*(this as *const FakeQueue)
	}

	unsafe extern "system" fn fake_signal(this : *mut c_void, _fence : *mut c_void, value : u64) -> HRESULT
	{
		queue(this).signaled.set(value);
		0
	}

	unsafe extern "system" fn fake_completed_value(this : *mut c_void) -> u64
	{
		queue(this).signaled.get()
	}

	unsafe extern "system" fn fake_execute(this : *mut c_void, count : u32, lists : *const *mut c_void)
	{
		let lists = std::slice::from_raw_parts(lists, count as usize);
		queue(this).executed.borrow_mut().extend(lists.iter().map(|&list| list as usize));
	}

	#[test]
	fn signal_value_round_trips_through_the_fence()
	{
		let mut table = vec![unused as *const c_void; 16];
		table[slot::command_queue::SIGNAL] = fake_signal as *const c_void;
		table[slot::fence::GET_COMPLETED_VALUE] = fake_completed_value as *const c_void;
		table[slot::command_queue::EXECUTE_COMMAND_LISTS] = fake_execute as *const c_void;
		let mut object = FakeQueue { vtable : table.as_ptr(), signaled : Cell::new(0), executed : RefCell::new(Vec::new()) };
		let handle = unsafe { ComPtr::from_raw(&mut object as *mut FakeQueue as *mut c_void) };

		unsafe
		{
			signal(&handle, &handle, 0x1_0000_0001).unwrap();
			assert_eq!(completed_value(&handle).unwrap(), 0x1_0000_0001);
			execute_command_lists(&handle, &[0x10 as *mut c_void, 0x20 as *mut c_void]).unwrap();
		}
		assert_eq!(*object.executed.borrow(), vec![0x10, 0x20]);
	}
}
