use std::{ffi::c_void, path::Path};

use super::*;
use crate::{
	com::ComPtr,
	config::DemoConfig,
	d3dcompiler::{self, CompileFlags, ShaderCompiler},
	dxgi,
	error::Result,
	geometry,
	layout::{D3d10BufferDesc, D3d10Viewport, ModeDesc, Rational, SampleDesc, SubresourceData, SwapChainDesc, TRUE},
	logging::{debug, info, warn},
	win_window::Window,
};

pub struct Renderer
{
	config : DemoConfig,
	viewport : D3d10Viewport,
	device : ComPtr,
	swap_chain : ComPtr,
	render_target_view : ComPtr,
	vertex_shader : ComPtr,
	pixel_shader : ComPtr,
	input_layout : ComPtr,
	vertex_buffer : ComPtr,
	compiler : ShaderCompiler,
	d3d10 : D3d10,
}

impl Renderer
{

/// Loads the native libraries. No device exists until [`Renderer::init`].
pub fn new(config : DemoConfig) -> Result<Self>
{
	Ok(Self
	{
		config,
		viewport : D3d10Viewport::from(config.viewport()),
		device : ComPtr::null(),
		swap_chain : ComPtr::null(),
		render_target_view : ComPtr::null(),
		vertex_shader : ComPtr::null(),
		pixel_shader : ComPtr::null(),
		input_layout : ComPtr::null(),
		vertex_buffer : ComPtr::null(),
		compiler : ShaderCompiler::load()?,
		d3d10 : D3d10::load()?,
	})
}

/// Creates the device and swap chain for `window`, then every resource the triangle needs.
pub fn init(&mut self, window : &Window) -> Result<()>
{
	let swap_chain_desc = SwapChainDesc
	{
		buffer_desc : ModeDesc
		{
			width : self.config.width,
			height : self.config.height,
			refresh_rate : Rational { numerator : 60, denominator : 1 },
			format : dxgi::FORMAT_R8G8B8A8_UNORM,
			..ModeDesc::default()
		},
		sample_desc : SampleDesc::default(),
		buffer_usage : dxgi::USAGE_RENDER_TARGET_OUTPUT,
		buffer_count : 1,
		output_window : window.handle as *mut c_void,
		windowed : TRUE,
		swap_effect : dxgi::SWAP_EFFECT_DISCARD,
		flags : 0,
	};

	let (driver_type, created) = self.d3d10.create_with_fallback(&swap_chain_desc)?;
	info!("D3D10 device created with {:?} driver", driver_type);
	self.device = created.device;
	self.swap_chain = created.swap_chain;

	unsafe
	{
		let mut back_buffer = dxgi::get_buffer(&self.swap_chain, 0, &IID_ID3D10_TEXTURE2D)?;
		let render_target_view = create_render_target_view(&self.device, &back_buffer);
		back_buffer.release();
		self.render_target_view = render_target_view?;
	}

	self.load_shaders()?;
	self.create_vertex_buffer()?;
	self.bind_pipeline()
}

/// Shader model 4 versions of the shared shaders, and the input layout validated against the vertex shader.
fn load_shaders(&mut self) -> Result<()>
{
	let shader_path = Path::new(self.config.shader_path);
	let mut vertex_blob = self.compiler.compile_file(shader_path, self.config.vertex_entry_point, "vs_4_0", CompileFlags::for_build())?;
	let created = unsafe
	{
		d3dcompiler::blob_bytes(&vertex_blob).and_then(|bytecode|
		{
			self.vertex_shader = create_vertex_shader(&self.device, bytecode)?;
			self.input_layout = create_input_layout(&self.device, &geometry::input_element_descs(), bytecode)?;
			Ok(())
		})
	};
	vertex_blob.release();
	created?;

	let mut pixel_blob = self.compiler.compile_file(shader_path, self.config.pixel_entry_point, "ps_4_0", CompileFlags::for_build())?;
	let pixel_shader = unsafe { d3dcompiler::blob_bytes(&pixel_blob).and_then(|bytecode| create_pixel_shader(&self.device, bytecode)) };
	pixel_blob.release();
	self.pixel_shader = pixel_shader?;
	Ok(())
}

fn create_vertex_buffer(&mut self) -> Result<()>
{
	let triangle_vertices = geometry::sample_colored_triangle_vertices();
	let bytes = geometry::as_bytes(&triangle_vertices);

	let buffer_desc = D3d10BufferDesc
	{
		byte_width : bytes.len() as u32,
		usage : USAGE_DEFAULT,
		bind_flags : BIND_VERTEX_BUFFER,
		..D3d10BufferDesc::default()
	};
	let initial_data = SubresourceData
	{
		sys_mem : bytes.as_ptr() as *const c_void,
		sys_mem_pitch : 0,
		sys_mem_slice_pitch : 0,
	};

	self.vertex_buffer = unsafe { create_buffer(&self.device, &buffer_desc, &initial_data)? };
	debug!("vertex buffer of {} bytes", bytes.len());
	Ok(())
}

/// Output merger, rasterizer and input assembler state, all set on the device.
fn bind_pipeline(&self) -> Result<()>
{
	unsafe
	{
		set_render_targets(&self.device, &[self.render_target_view.as_raw()])?;
		set_viewports(&self.device, &[self.viewport])?;
		set_input_layout(&self.device, &self.input_layout)?;
		set_vertex_buffers(&self.device, 0, &[self.vertex_buffer.as_raw()], &[geometry::STRIDE], &[0])?;
		set_primitive_topology(&self.device, PRIMITIVE_TOPOLOGY_TRIANGLELIST)
	}
}

pub fn render(&mut self) -> Result<()>
{
	unsafe
	{
		clear_render_target_view(&self.device, &self.render_target_view, &self.config.clear_color)?;
	}

	self.bind_pipeline()?;

	unsafe
	{
		set_vertex_shader(&self.device, &self.vertex_shader)?;
		set_pixel_shader(&self.device, &self.pixel_shader)?;
		draw(&self.device, 3, 0)?;

		let sync_interval = if self.config.vsync { 1 } else { 0 };
		dxgi::present(&self.swap_chain, sync_interval, 0)?;
	}
	Ok(())
}

/// Clears device state and releases everything. Safe to call twice.
pub fn destroy(&mut self)
{
	if !self.device.is_null()
	{
		if let Err(err) = unsafe { clear_state(&self.device) }
		{
			warn!("ClearState failed: {}", err);
		}
	}

	self.vertex_buffer.release();
	self.input_layout.release();
	self.vertex_shader.release();
	self.pixel_shader.release();
	self.render_target_view.release();
	self.swap_chain.release();
	self.device.release();
}

}

impl Drop for Renderer
{
	fn drop(&mut self)
	{
		self.destroy();
	}
}
