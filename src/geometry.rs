use std::{mem, slice};

use cgmath::Vector3;
use cgmath::Vector4;

use crate::dxgi::{FORMAT_R32G32B32A32_FLOAT, FORMAT_R32G32B32_FLOAT};
use crate::layout::InputElementDesc;

/// One vertex of the demo triangle: `float3 POSITION`, then `float4 COLOR`.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ColoredVertex
{
	pub position : Vector3<f32>,
	pub color : Vector4<f32>
}

pub const COLOR_OFFSET : u32 = mem::size_of::<Vector3<f32>>() as u32;
pub const STRIDE : u32 = mem::size_of::<ColoredVertex>() as u32;

pub fn sample_colored_triangle_vertices() -> [ColoredVertex; 3]
{
	[
		ColoredVertex
		{
			position : Vector3::new(0.0, 0.5, 0.0),
			color : Vector4::new(1.0, 0.0, 0.0, 1.0)
		},
		ColoredVertex
		{
			position : Vector3::new(0.5, -0.5, 0.0),
			color : Vector4::new(0.0, 1.0, 0.0, 1.0)
		},
		ColoredVertex
		{
			position : Vector3::new(-0.5, -0.5, 0.0),
			color : Vector4::new(0.0, 0.0, 1.0, 1.0)
		},
	]
}

/// Input layout matching [`ColoredVertex`], shared by every pipeline.
pub fn input_element_descs() -> [InputElementDesc; 2]
{
	let per_vertex = |semantic_name : *const std::ffi::c_char, format : u32, aligned_byte_offset : u32| InputElementDesc
	{
		semantic_name,
		semantic_index : 0,
		format,
		input_slot : 0,
		aligned_byte_offset,
		input_slot_class : 0, // per-vertex data
		instance_data_step_rate : 0,
	};
	[
		per_vertex(c"POSITION".as_ptr(), FORMAT_R32G32B32_FLOAT, 0),
		per_vertex(c"COLOR".as_ptr(), FORMAT_R32G32B32A32_FLOAT, COLOR_OFFSET),
	]
}

/// The vertices as the bytes a vertex buffer expects.
pub fn as_bytes(vertices : &[ColoredVertex]) -> &[u8]
{
	// ColoredVertex is repr(C) over f32 only, so it has no padding.
	unsafe { slice::from_raw_parts(vertices.as_ptr() as *const u8, mem::size_of_val(vertices)) }
}

#[cfg(test)]
mod tests
{
	use super::*;

	#[test]
	fn triangle_is_84_bytes_with_a_28_byte_stride()
	{
		let vertices = sample_colored_triangle_vertices();
		assert_eq!(STRIDE, 28);
		assert_eq!(COLOR_OFFSET, 12);
		assert_eq!(as_bytes(&vertices).len(), 84);
	}

	#[test]
	fn input_layout_follows_the_vertex()
	{
		let [position, color] = input_element_descs();
		assert_eq!((position.format, position.aligned_byte_offset), (FORMAT_R32G32B32_FLOAT, 0));
		assert_eq!((color.format, color.aligned_byte_offset), (FORMAT_R32G32B32A32_FLOAT, 12));
		assert_eq!(unsafe { std::ffi::CStr::from_ptr(color.semantic_name) }.to_str().unwrap(), "COLOR");
	}

	#[test]
	fn bytes_start_with_the_top_vertex()
	{
		let vertices = sample_colored_triangle_vertices();
		let bytes = as_bytes(&vertices);
		let y = f32::from_ne_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]);
		let red = f32::from_ne_bytes([bytes[12], bytes[13], bytes[14], bytes[15]]);
		assert_eq!((y, red), (0.5, 1.0));
	}
}
