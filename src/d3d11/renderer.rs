use std::{ffi::c_void, path::Path};

use super::{context, *};
use crate::{
	com::ComPtr,
	config::DemoConfig,
	d3dcompiler::{self, CompileFlags, ShaderCompiler},
	dxgi,
	error::Result,
	geometry,
	layout::{BufferDesc, ModeDesc, Rational, SampleDesc, SubresourceData, SwapChainDesc, Viewport, TRUE},
	logging::{debug, info, warn},
	win_window::Window,
};

pub struct Renderer
{
	config : DemoConfig,
	viewport : Viewport,
	debug : ComPtr,
	info_queue : ComPtr,
	device : ComPtr,
	context : ComPtr,
	swap_chain : ComPtr,
	render_target_view : ComPtr,
	vertex_shader : ComPtr,
	pixel_shader : ComPtr,
	input_layout : ComPtr,
	vertex_buffer : ComPtr,
	compiler : ShaderCompiler,
	d3d11 : D3d11,
}

impl Renderer
{

/// Loads the native libraries. No device exists until [`Renderer::init`].
pub fn new(config : DemoConfig) -> Result<Self>
{
	Ok(Self
	{
		config,
		viewport : config.viewport(),
		debug : ComPtr::null(),
		info_queue : ComPtr::null(),
		device : ComPtr::null(),
		context : ComPtr::null(),
		swap_chain : ComPtr::null(),
		render_target_view : ComPtr::null(),
		vertex_shader : ComPtr::null(),
		pixel_shader : ComPtr::null(),
		input_layout : ComPtr::null(),
		vertex_buffer : ComPtr::null(),
		compiler : ShaderCompiler::load()?,
		d3d11 : D3d11::load()?,
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

	let (driver_type, created) = self.d3d11.create_with_fallback(&swap_chain_desc)?;
	info!("D3D11 device created with {:?} driver, feature level 0x{:x}, debug layer {}",
		driver_type, created.feature_level, created.debug_layer);
	self.device = created.device;
	self.context = created.context;
	self.swap_chain = created.swap_chain;

	if created.debug_layer
	{
		match self.device.query_interface(&IID_ID3D11_DEBUG)
		{
			Ok(debug) => self.debug = debug,
			Err(err) => debug!("no ID3D11Debug: {}", err),
		}
		match self.device.query_interface(&IID_ID3D11_INFO_QUEUE)
		{
			Ok(info_queue) => self.info_queue = info_queue,
			Err(err) => debug!("no ID3D11InfoQueue: {}", err),
		}
	}

	unsafe
	{
		// Render target view of the single back buffer
		let mut back_buffer = dxgi::get_buffer(&self.swap_chain, 0, &IID_ID3D11_TEXTURE2D)?;
		let render_target_view = create_render_target_view(&self.device, &back_buffer);
		back_buffer.release();
		self.render_target_view = render_target_view?;
	}

	self.load_shaders()?;
	self.create_vertex_buffer()?;
	self.bind_pipeline()
}

/// Vertex shader, pixel shader and the input layout validated against the vertex shader.
fn load_shaders(&mut self) -> Result<()>
{
	let shader_path = Path::new(self.config.shader_path);
	let mut vertex_blob = self.compiler.compile_file(shader_path, self.config.vertex_entry_point, "vs_5_0", CompileFlags::for_build())?;
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

	let mut pixel_blob = self.compiler.compile_file(shader_path, self.config.pixel_entry_point, "ps_5_0", CompileFlags::for_build())?;
	let pixel_shader = unsafe { d3dcompiler::blob_bytes(&pixel_blob).and_then(|bytecode| create_pixel_shader(&self.device, bytecode)) };
	pixel_blob.release();
	self.pixel_shader = pixel_shader?;
	Ok(())
}

/// Default-usage vertex buffer initialized with the triangle.
fn create_vertex_buffer(&mut self) -> Result<()>
{
	let triangle_vertices = geometry::sample_colored_triangle_vertices();
	let bytes = geometry::as_bytes(&triangle_vertices);

	let buffer_desc = BufferDesc
	{
		byte_width : bytes.len() as u32,
		usage : USAGE_DEFAULT,
		bind_flags : BIND_VERTEX_BUFFER,
		..BufferDesc::default()
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

/// Output merger, rasterizer and input assembler state shared by every frame.
fn bind_pipeline(&self) -> Result<()>
{
	unsafe
	{
		context::set_render_targets(&self.context, &[self.render_target_view.as_raw()])?;
		context::set_viewports(&self.context, &[self.viewport])?;
		context::set_input_layout(&self.context, &self.input_layout)?;
		context::set_vertex_buffers(&self.context, 0, &[self.vertex_buffer.as_raw()], &[geometry::STRIDE], &[0])?;
		context::set_primitive_topology(&self.context, PRIMITIVE_TOPOLOGY_TRIANGLELIST)
	}
}

pub fn render(&mut self) -> Result<()>
{
	unsafe
	{
		context::clear_render_target_view(&self.context, &self.render_target_view, &self.config.clear_color)?;
	}

	// Present can unbind the render target
	self.bind_pipeline()?;

	unsafe
	{
		context::set_vertex_shader(&self.context, &self.vertex_shader)?;
		context::set_pixel_shader(&self.context, &self.pixel_shader)?;
		context::draw(&self.context, 3, 0)?;

		let sync_interval = if self.config.vsync { 1 } else { 0 };
		dxgi::present(&self.swap_chain, sync_interval, 0)?;
	}
	Ok(())
}

/// Clears context state and releases everything, reporting leaks through the debug layer. Safe to call twice.
pub fn destroy(&mut self)
{
	if !self.context.is_null()
	{
		if let Err(err) = unsafe { context::clear_state(&self.context) }
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
	self.context.release();

	if !self.debug.is_null()
	{
		if let Err(err) = unsafe { report_live_device_objects(&self.debug, RLDO_DETAIL) }
		{
			warn!("ReportLiveDeviceObjects failed: {}", err);
		}
	}

	self.device.release();
	self.info_queue.release();
	self.debug.release();
}

}

impl Drop for Renderer
{
	fn drop(&mut self)
	{
		self.destroy();
	}
}
