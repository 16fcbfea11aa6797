//! Native value structs shared by the D3D10, D3D11, D3D12 and DXGI wrappers.
//!
//! Field order, widths and padding follow the Windows SDK headers. Sizes and the
//! offsets most likely to drift are pinned with compile-time assertions; the
//! pointer-carrying structs are pinned for 64-bit targets.

#![allow(dead_code)]

use std::{
	ffi::{c_char, c_void},
	mem::{offset_of, size_of},
	ptr,
};

pub type Bool = i32;
pub const FALSE : Bool = 0;
pub const TRUE : Bool = 1;

macro_rules! assert_layout {
	($ty:ty, size = $size:expr $(, $field:ident = $offset:expr)*) => {
		const _ : () = assert!(size_of::<$ty>() == $size);
		$( const _ : () = assert!(offset_of!($ty, $field) == $offset); )*
	};
}

#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Rect
{
	pub left : i32,
	pub top : i32,
	pub right : i32,
	pub bottom : i32,
}
assert_layout!(Rect, size = 16, right = 8);

#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Viewport
{
	pub top_left_x : f32,
	pub top_left_y : f32,
	pub width : f32,
	pub height : f32,
	pub min_depth : f32,
	pub max_depth : f32,
}
assert_layout!(Viewport, size = 24, width = 8, max_depth = 20);

#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct CpuDescriptorHandle
{
	pub ptr : usize,
}
assert_layout!(CpuDescriptorHandle, size = size_of::<usize>());

impl CpuDescriptorHandle
{
	pub fn offset(self, index : u32, increment_size : u32) -> Self
	{
		CpuDescriptorHandle { ptr : self.ptr + index as usize * increment_size as usize }
	}
}

#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct DescriptorHeapDesc
{
	pub heap_type : u32,
	pub num_descriptors : u32,
	pub flags : u32,
	pub node_mask : u32,
}
assert_layout!(DescriptorHeapDesc, size = 16, flags = 8);

#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct CommandQueueDesc
{
	pub list_type : u32,
	pub priority : i32,
	pub flags : u32,
	pub node_mask : u32,
}
assert_layout!(CommandQueueDesc, size = 16);

#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Rational
{
	pub numerator : u32,
	pub denominator : u32,
}

#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct ModeDesc
{
	pub width : u32,
	pub height : u32,
	pub refresh_rate : Rational,
	pub format : u32,
	pub scanline_ordering : u32,
	pub scaling : u32,
}
assert_layout!(ModeDesc, size = 28, format = 16, scaling = 24);

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct SampleDesc
{
	pub count : u32,
	pub quality : u32,
}
assert_layout!(SampleDesc, size = 8);

impl Default for SampleDesc
{
	fn default() -> Self
	{
		SampleDesc { count : 1, quality : 0 }
	}
}

/// `DXGI_SWAP_CHAIN_DESC`.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct SwapChainDesc
{
	pub buffer_desc : ModeDesc,
	pub sample_desc : SampleDesc,
	pub buffer_usage : u32,
	pub buffer_count : u32,
	pub output_window : *mut c_void,
	pub windowed : Bool,
	pub swap_effect : u32,
	pub flags : u32,
}
#[cfg(target_pointer_width = "64")]
assert_layout!(SwapChainDesc, size = 72, sample_desc = 28, buffer_count = 40, output_window = 48, windowed = 56, flags = 64);
#[cfg(target_pointer_width = "32")]
assert_layout!(SwapChainDesc, size = 60, output_window = 44, flags = 56);

#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct HeapProperties
{
	pub heap_type : u32,
	pub cpu_page_property : u32,
	pub memory_pool_preference : u32,
	pub creation_node_mask : u32,
	pub visible_node_mask : u32,
}
assert_layout!(HeapProperties, size = 20);

/// `D3D12_RESOURCE_DESC`.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct ResourceDesc
{
	pub dimension : u32,
	pub alignment : u64,
	pub width : u64,
	pub height : u32,
	pub depth_or_array_size : u16,
	pub mip_levels : u16,
	pub format : u32,
	pub sample_desc : SampleDesc,
	pub layout : u32,
	pub flags : u32,
}
#[cfg(target_pointer_width = "64")]
assert_layout!(ResourceDesc, size = 56, alignment = 8, height = 24, format = 32, layout = 44, flags = 48);

#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Range
{
	pub begin : usize,
	pub end : usize,
}
#[cfg(target_pointer_width = "64")]
assert_layout!(Range, size = 16);

#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct VertexBufferView
{
	pub buffer_location : u64,
	pub size_in_bytes : u32,
	pub stride_in_bytes : u32,
}
assert_layout!(VertexBufferView, size = 16, size_in_bytes = 8, stride_in_bytes = 12);

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ResourceTransitionBarrier
{
	pub resource : *mut c_void,
	pub subresource : u32,
	pub state_before : u32,
	pub state_after : u32,
}
#[cfg(target_pointer_width = "64")]
assert_layout!(ResourceTransitionBarrier, size = 24, subresource = 8);

pub const RESOURCE_BARRIER_TYPE_TRANSITION : u32 = 0;
pub const RESOURCE_BARRIER_FLAG_NONE : u32 = 0;
pub const RESOURCE_BARRIER_ALL_SUBRESOURCES : u32 = 0xFFFF_FFFF;

/// `D3D12_RESOURCE_BARRIER` holding the transition arm of its union, which is also the largest arm.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ResourceBarrier
{
	pub barrier_type : u32,
	pub flags : u32,
	pub transition : ResourceTransitionBarrier,
}
#[cfg(target_pointer_width = "64")]
assert_layout!(ResourceBarrier, size = 32, transition = 8);

impl ResourceBarrier
{
	pub fn transition(resource : *mut c_void, state_before : u32, state_after : u32) -> Self
	{
		ResourceBarrier
		{
			barrier_type : RESOURCE_BARRIER_TYPE_TRANSITION,
			flags : RESOURCE_BARRIER_FLAG_NONE,
			transition : ResourceTransitionBarrier
			{
				resource,
				subresource : RESOURCE_BARRIER_ALL_SUBRESOURCES,
				state_before,
				state_after,
			},
		}
	}
}

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ShaderBytecode
{
	pub bytecode : *const c_void,
	pub length : usize,
}
#[cfg(target_pointer_width = "64")]
assert_layout!(ShaderBytecode, size = 16, length = 8);

impl Default for ShaderBytecode
{
	fn default() -> Self
	{
		ShaderBytecode { bytecode : ptr::null(), length : 0 }
	}
}

/// `D3D11_INPUT_ELEMENT_DESC` and `D3D12_INPUT_ELEMENT_DESC` share this layout.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct InputElementDesc
{
	pub semantic_name : *const c_char,
	pub semantic_index : u32,
	pub format : u32,
	pub input_slot : u32,
	pub aligned_byte_offset : u32,
	pub input_slot_class : u32,
	pub instance_data_step_rate : u32,
}
#[cfg(target_pointer_width = "64")]
assert_layout!(InputElementDesc, size = 32, semantic_index = 8, aligned_byte_offset = 20, instance_data_step_rate = 28);

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct InputLayoutDesc
{
	pub input_element_descs : *const InputElementDesc,
	pub num_elements : u32,
}
#[cfg(target_pointer_width = "64")]
assert_layout!(InputLayoutDesc, size = 16);

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct StreamOutputDesc
{
	pub so_declaration : *const c_void,
	pub num_entries : u32,
	pub buffer_strides : *const u32,
	pub num_strides : u32,
	pub rasterized_stream : u32,
}
#[cfg(target_pointer_width = "64")]
assert_layout!(StreamOutputDesc, size = 32, buffer_strides = 16, rasterized_stream = 28);

impl Default for StreamOutputDesc
{
	fn default() -> Self
	{
		StreamOutputDesc { so_declaration : ptr::null(), num_entries : 0, buffer_strides : ptr::null(), num_strides : 0, rasterized_stream : 0 }
	}
}

pub const BLEND_ZERO : u32 = 1;
pub const BLEND_ONE : u32 = 2;
pub const BLEND_OP_ADD : u32 = 1;
pub const LOGIC_OP_NOOP : u32 = 4;
pub const COLOR_WRITE_ENABLE_ALL : u8 = 0x0F;

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct RenderTargetBlendDesc
{
	pub blend_enable : Bool,
	pub logic_op_enable : Bool,
	pub src_blend : u32,
	pub dest_blend : u32,
	pub blend_op : u32,
	pub src_blend_alpha : u32,
	pub dest_blend_alpha : u32,
	pub blend_op_alpha : u32,
	pub logic_op : u32,
	pub render_target_write_mask : u8,
}
assert_layout!(RenderTargetBlendDesc, size = 40, render_target_write_mask = 36);

impl RenderTargetBlendDesc
{
	pub const OPAQUE : RenderTargetBlendDesc = RenderTargetBlendDesc
	{
		blend_enable : FALSE,
		logic_op_enable : FALSE,
		src_blend : BLEND_ONE,
		dest_blend : BLEND_ZERO,
		blend_op : BLEND_OP_ADD,
		src_blend_alpha : BLEND_ONE,
		dest_blend_alpha : BLEND_ZERO,
		blend_op_alpha : BLEND_OP_ADD,
		logic_op : LOGIC_OP_NOOP,
		render_target_write_mask : COLOR_WRITE_ENABLE_ALL,
	};
}

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct BlendDesc
{
	pub alpha_to_coverage_enable : Bool,
	pub independent_blend_enable : Bool,
	pub render_target : [RenderTargetBlendDesc; 8],
}
assert_layout!(BlendDesc, size = 328, render_target = 8);

impl BlendDesc
{
	pub fn opaque() -> Self
	{
		BlendDesc
		{
			alpha_to_coverage_enable : FALSE,
			independent_blend_enable : FALSE,
			render_target : [RenderTargetBlendDesc::OPAQUE; 8],
		}
	}
}

pub const FILL_MODE_SOLID : u32 = 3;
pub const CULL_MODE_BACK : u32 = 3;

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct RasterizerDesc
{
	pub fill_mode : u32,
	pub cull_mode : u32,
	pub front_counter_clockwise : Bool,
	pub depth_bias : i32,
	pub depth_bias_clamp : f32,
	pub slope_scaled_depth_bias : f32,
	pub depth_clip_enable : Bool,
	pub multisample_enable : Bool,
	pub antialiased_line_enable : Bool,
	pub forced_sample_count : u32,
	pub conservative_raster : u32,
}
assert_layout!(RasterizerDesc, size = 44, depth_bias_clamp = 16, conservative_raster = 40);

impl RasterizerDesc
{
	pub fn default_solid_back() -> Self
	{
		RasterizerDesc
		{
			fill_mode : FILL_MODE_SOLID,
			cull_mode : CULL_MODE_BACK,
			front_counter_clockwise : FALSE,
			depth_bias : 0,
			depth_bias_clamp : 0.0,
			slope_scaled_depth_bias : 0.0,
			depth_clip_enable : TRUE,
			multisample_enable : FALSE,
			antialiased_line_enable : FALSE,
			forced_sample_count : 0,
			conservative_raster : 0,
		}
	}
}

#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct DepthStencilOpDesc
{
	pub stencil_fail_op : u32,
	pub stencil_depth_fail_op : u32,
	pub stencil_pass_op : u32,
	pub stencil_func : u32,
}
assert_layout!(DepthStencilOpDesc, size = 16);

#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct DepthStencilDesc
{
	pub depth_enable : Bool,
	pub depth_write_mask : u32,
	pub depth_func : u32,
	pub stencil_enable : Bool,
	pub stencil_read_mask : u8,
	pub stencil_write_mask : u8,
	pub front_face : DepthStencilOpDesc,
	pub back_face : DepthStencilOpDesc,
}
assert_layout!(DepthStencilDesc, size = 52, stencil_read_mask = 16, front_face = 20, back_face = 36);

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct CachedPipelineState
{
	pub cached_blob : *const c_void,
	pub cached_blob_size_in_bytes : usize,
}
#[cfg(target_pointer_width = "64")]
assert_layout!(CachedPipelineState, size = 16);

impl Default for CachedPipelineState
{
	fn default() -> Self
	{
		CachedPipelineState { cached_blob : ptr::null(), cached_blob_size_in_bytes : 0 }
	}
}

/// `D3D12_GRAPHICS_PIPELINE_STATE_DESC`. Shader stages are declared VS, PS, DS, HS, GS as in the SDK.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct GraphicsPipelineStateDesc
{
	pub root_signature : *mut c_void,
	pub vs : ShaderBytecode,
	pub ps : ShaderBytecode,
	pub ds : ShaderBytecode,
	pub hs : ShaderBytecode,
	pub gs : ShaderBytecode,
	pub stream_output : StreamOutputDesc,
	pub blend_state : BlendDesc,
	pub sample_mask : u32,
	pub rasterizer_state : RasterizerDesc,
	pub depth_stencil_state : DepthStencilDesc,
	pub input_layout : InputLayoutDesc,
	pub ib_strip_cut_value : u32,
	pub primitive_topology_type : u32,
	pub num_render_targets : u32,
	pub rtv_formats : [u32; 8],
	pub dsv_format : u32,
	pub sample_desc : SampleDesc,
	pub node_mask : u32,
	pub cached_pso : CachedPipelineState,
	pub flags : u32,
}
#[cfg(target_pointer_width = "64")]
assert_layout!(GraphicsPipelineStateDesc, size = 656,
	vs = 8, gs = 72, stream_output = 88, blend_state = 120, sample_mask = 448,
	rasterizer_state = 452, depth_stencil_state = 496, input_layout = 552,
	ib_strip_cut_value = 568, num_render_targets = 576, rtv_formats = 580,
	dsv_format = 612, sample_desc = 616, node_mask = 624, cached_pso = 632, flags = 648);

/// `D3D12_ROOT_SIGNATURE_DESC` without parameters or samplers support beyond raw pointers.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct RootSignatureDesc
{
	pub num_parameters : u32,
	pub parameters : *const c_void,
	pub num_static_samplers : u32,
	pub static_samplers : *const c_void,
	pub flags : u32,
}
#[cfg(target_pointer_width = "64")]
assert_layout!(RootSignatureDesc, size = 40, parameters = 8, num_static_samplers = 16, static_samplers = 24, flags = 32);

impl RootSignatureDesc
{
	pub fn empty(flags : u32) -> Self
	{
		RootSignatureDesc { num_parameters : 0, parameters : ptr::null(), num_static_samplers : 0, static_samplers : ptr::null(), flags }
	}
}

/// `D3D11_BUFFER_DESC`.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct BufferDesc
{
	pub byte_width : u32,
	pub usage : u32,
	pub bind_flags : u32,
	pub cpu_access_flags : u32,
	pub misc_flags : u32,
	pub structure_byte_stride : u32,
}
assert_layout!(BufferDesc, size = 24);

/// `D3D10_BUFFER_DESC`, which has no structure stride.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct D3d10BufferDesc
{
	pub byte_width : u32,
	pub usage : u32,
	pub bind_flags : u32,
	pub cpu_access_flags : u32,
	pub misc_flags : u32,
}
assert_layout!(D3d10BufferDesc, size = 20, misc_flags = 16);

/// `D3D10_VIEWPORT`: integer origin and extent, float depth range.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct D3d10Viewport
{
	pub top_left_x : i32,
	pub top_left_y : i32,
	pub width : u32,
	pub height : u32,
	pub min_depth : f32,
	pub max_depth : f32,
}
assert_layout!(D3d10Viewport, size = 24, width = 8, min_depth = 16);

impl From<Viewport> for D3d10Viewport
{
	fn from(viewport : Viewport) -> Self
	{
		D3d10Viewport
		{
			top_left_x : viewport.top_left_x as i32,
			top_left_y : viewport.top_left_y as i32,
			width : viewport.width as u32,
			height : viewport.height as u32,
			min_depth : viewport.min_depth,
			max_depth : viewport.max_depth,
		}
	}
}

/// `D3D11_SUBRESOURCE_DATA`, identical to `D3D10_SUBRESOURCE_DATA`.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct SubresourceData
{
	pub sys_mem : *const c_void,
	pub sys_mem_pitch : u32,
	pub sys_mem_slice_pitch : u32,
}
#[cfg(target_pointer_width = "64")]
assert_layout!(SubresourceData, size = 16, sys_mem_pitch = 8);

#[cfg(test)]
mod tests
{
	use super::*;

	#[test]
	fn descriptor_handles_step_by_increment()
	{
		let start = CpuDescriptorHandle { ptr : 0x1000 };
		assert_eq!(start.offset(0, 32), start);
		assert_eq!(start.offset(3, 32).ptr, 0x1060);
	}

	#[test]
	fn transition_barrier_covers_all_subresources()
	{
		let resource = 0x40 as *mut c_void;
		let barrier = ResourceBarrier::transition(resource, 0, 4);
		assert_eq!(barrier.barrier_type, RESOURCE_BARRIER_TYPE_TRANSITION);
		assert_eq!(barrier.transition.resource, resource);
		assert_eq!(barrier.transition.subresource, RESOURCE_BARRIER_ALL_SUBRESOURCES);
		assert_eq!((barrier.transition.state_before, barrier.transition.state_after), (0, 4));
	}

	#[test]
	fn d3d10_viewport_keeps_whole_pixels()
	{
		let viewport = D3d10Viewport::from(Viewport { width : 640.0, height : 480.0, max_depth : 1.0, ..Viewport::default() });
		assert_eq!((viewport.top_left_x, viewport.width, viewport.height), (0, 640, 480));
		assert_eq!((viewport.min_depth, viewport.max_depth), (0.0, 1.0));
	}

	#[test]
	fn opaque_blend_writes_every_channel()
	{
		let blend = BlendDesc::opaque();
		assert!(blend.render_target.iter().all(|target| target.render_target_write_mask == COLOR_WRITE_ENABLE_ALL));
		assert_eq!(blend.render_target[0].blend_enable, FALSE);
	}
}
