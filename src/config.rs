use crate::layout::{Rect, Viewport};

/// Fixed settings of the triangle demos.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct DemoConfig
{
	pub title : &'static str,
	pub width : u32,
	pub height : u32,
	pub shader_path : &'static str,
	pub vertex_entry_point : &'static str,
	pub pixel_entry_point : &'static str,
	pub back_buffer_count : u32,
	pub clear_color : [f32; 4],
	/// Present on vertical blank instead of immediately.
	pub vsync : bool,
}

impl DemoConfig
{
	pub const DEFAULT : DemoConfig = DemoConfig
	{
		title : "Hello, World!",
		width : 640,
		height : 480,
		shader_path : "hello.hlsl",
		vertex_entry_point : "VSMain",
		pixel_entry_point : "PSMain",
		back_buffer_count : 2,
		clear_color : [1.0, 1.0, 1.0, 1.0],
		vsync : true,
	};

	pub fn aspect_ratio(&self) -> f32
	{
		self.width as f32 / self.height as f32
	}

	/// Full-window viewport with the standard 0..1 depth range.
	pub fn viewport(&self) -> Viewport
	{
		Viewport
		{
			top_left_x : 0.0,
			top_left_y : 0.0,
			width : self.width as f32,
			height : self.height as f32,
			min_depth : 0.0,
			max_depth : 1.0,
		}
	}

	pub fn scissor_rect(&self) -> Rect
	{
		Rect { left : 0, top : 0, right : self.width as i32, bottom : self.height as i32 }
	}
}

impl Default for DemoConfig
{
	fn default() -> Self
	{
		DemoConfig::DEFAULT
	}
}

#[cfg(test)]
mod tests
{
	use super::*;

	#[test]
	fn default_window_is_640_by_480()
	{
		let config = DemoConfig::default();
		assert_eq!((config.width, config.height), (640, 480));
		assert_eq!(config.title, "Hello, World!");
		assert!((config.aspect_ratio() - 4.0 / 3.0).abs() < f32::EPSILON);
	}

	#[test]
	fn viewport_and_scissor_cover_the_client_area()
	{
		let config = DemoConfig::DEFAULT;
		let viewport = config.viewport();
		assert_eq!((viewport.width, viewport.height), (640.0, 480.0));
		assert_eq!(viewport.max_depth, 1.0);
		assert_eq!(config.scissor_rect(), Rect { left : 0, top : 0, right : 640, bottom : 480 });
	}
}
