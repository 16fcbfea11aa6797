use std::{ffi::c_void, path::Path, ptr};

use winapi::{
	shared::minwindef::FALSE,
	shared::ntdef::HANDLE,
	um::{
		handleapi::CloseHandle,
		synchapi::{CreateEventW, WaitForSingleObject},
		winbase::{INFINITE, WAIT_FAILED, WAIT_OBJECT_0},
	},
};

use super::{command_list, *};
use crate::{
	com::ComPtr,
	config::DemoConfig,
	d3dcompiler::{self, CompileFlags, ShaderCompiler},
	dxgi::{self, Dxgi},
	error::{last_os_error, Result},
	fallback,
	geometry,
	layout::{
		BlendDesc, CommandQueueDesc, CpuDescriptorHandle, DepthStencilDesc, DescriptorHeapDesc,
		GraphicsPipelineStateDesc, HeapProperties, InputLayoutDesc, ModeDesc, RasterizerDesc, Range,
		Rect, ResourceBarrier, ResourceDesc, RootSignatureDesc, SampleDesc, ShaderBytecode,
		SwapChainDesc, VertexBufferView, Viewport, TRUE,
	},
	logging::{debug, info, warn},
	win_window::Window,
};

static G_SINGLE_NODEMASK : u32 = 0;

/// Where the device came from.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum AdapterChoice
{
	DefaultHardware,
	Warp,
}

pub struct Renderer
{
	config : DemoConfig,
	viewport : Viewport,
	scissor_rect : Rect,
	debug_controller : ComPtr,
	info_queue : ComPtr,
	factory : ComPtr,
	device : ComPtr,
	command_queue : ComPtr,
	swap_chain : ComPtr,
	rtv_descriptor_heap : ComPtr,
	rtv_descriptor_size : u32,
	rtv_heap_start : CpuDescriptorHandle,
	command_allocator : ComPtr,
	command_list : ComPtr,
	render_targets : Vec<ComPtr>,
	root_signature : ComPtr,
	pipeline_state : ComPtr,
	frame_index : u32,
	vertex_buffer : ComPtr,
	vertex_buffer_view : VertexBufferView,
	fence : ComPtr,
	fence_value : u64,
	fence_event : HANDLE,
	compiler : ShaderCompiler,
	d3d12 : D3d12,
	dxgi : Dxgi,
}

impl Renderer
{

/// Loads the native libraries. No device exists until [`Renderer::load_pipeline`].
pub fn new(config : DemoConfig) -> Result<Self>
{
	Ok(Self
	{
		config,
		viewport : config.viewport(),
		scissor_rect : config.scissor_rect(),
		debug_controller : ComPtr::null(),
		info_queue : ComPtr::null(),
		factory : ComPtr::null(),
		device : ComPtr::null(),
		command_queue : ComPtr::null(),
		swap_chain : ComPtr::null(),
		rtv_descriptor_heap : ComPtr::null(),
		rtv_descriptor_size : 0,
		rtv_heap_start : CpuDescriptorHandle::default(),
		command_allocator : ComPtr::null(),
		command_list : ComPtr::null(),
		render_targets : Vec::new(),
		root_signature : ComPtr::null(),
		pipeline_state : ComPtr::null(),
		frame_index : 0,
		vertex_buffer : ComPtr::null(),
		vertex_buffer_view : VertexBufferView::default(),
		fence : ComPtr::null(),
		fence_value : 0,
		fence_event : ptr::null_mut(),
		compiler : ShaderCompiler::load()?,
		d3d12 : D3d12::load()?,
		dxgi : Dxgi::load()?,
	})
}

/// Device, queue, swap chain and render target views.
pub fn load_pipeline(&mut self, window : &Window) -> Result<()>
{
	if cfg!(debug_assertions)
	{
		match self.d3d12.debug_interface()
		{
			Ok(debug_controller) =>
			{
				unsafe { enable_debug_layer(&debug_controller)? };
				self.debug_controller = debug_controller;
				info!("D3D12 debug layer enabled");
			},
			Err(err) => warn!("D3D12 debug layer unavailable: {}", err),
		}
	}

	self.factory = self.dxgi.create_factory()?;

	let (choice, device) = fallback::first_success([AdapterChoice::DefaultHardware, AdapterChoice::Warp], |choice| match choice
	{
		AdapterChoice::DefaultHardware => self.d3d12.create_device(&ComPtr::null(), FEATURE_LEVEL_11_0),
		AdapterChoice::Warp =>
		{
			let mut adapter = unsafe { dxgi::enum_warp_adapter(&self.factory)? };
			let device = self.d3d12.create_device(&adapter, FEATURE_LEVEL_11_0);
			adapter.release();
			device
		},
	})?;
	info!("D3D12 device created on {:?}", choice);
	self.device = device;

	if !self.debug_controller.is_null()
	{
		match self.device.query_interface(&IID_ID3D12_INFO_QUEUE)
		{
			Ok(info_queue) => self.info_queue = info_queue,
			Err(err) => debug!("no ID3D12InfoQueue: {}", err),
		}
	}

	unsafe
	{
		// Describe and Create the command queue.
		let queue_desc = CommandQueueDesc { list_type : COMMAND_LIST_TYPE_DIRECT, node_mask : G_SINGLE_NODEMASK, ..CommandQueueDesc::default() };
		self.command_queue = create_command_queue(&self.device, &queue_desc)?;

		// Create the Swap Chain
		let swap_chain_desc = SwapChainDesc
		{
			buffer_desc : ModeDesc
			{
				width : self.config.width,
				height : self.config.height,
				format : dxgi::FORMAT_R8G8B8A8_UNORM,
				..ModeDesc::default()
			},
			sample_desc : SampleDesc::default(),
			buffer_usage : dxgi::USAGE_RENDER_TARGET_OUTPUT,
			buffer_count : self.config.back_buffer_count,
			output_window : window.handle as *mut c_void,
			windowed : TRUE,
			swap_effect : dxgi::SWAP_EFFECT_FLIP_DISCARD,
			flags : 0,
		};
		let mut swap_chain = dxgi::create_swap_chain(&self.factory, &self.command_queue, &swap_chain_desc)?;
		let swap_chain3 = swap_chain.query_interface(&dxgi::IID_IDXGI_SWAP_CHAIN3);
		swap_chain.release();
		self.swap_chain = swap_chain3?;
		self.frame_index = dxgi::current_back_buffer_index(&self.swap_chain)?;

		// Create Descriptor Heaps
		let heap_desc = DescriptorHeapDesc
		{
			heap_type : DESCRIPTOR_HEAP_TYPE_RTV,
			num_descriptors : self.config.back_buffer_count,
			flags : DESCRIPTOR_HEAP_FLAG_NONE,
			node_mask : G_SINGLE_NODEMASK,
		};
		self.rtv_descriptor_heap = create_descriptor_heap(&self.device, &heap_desc)?;
		self.rtv_descriptor_size = descriptor_handle_increment_size(&self.device, DESCRIPTOR_HEAP_TYPE_RTV)?;

		let (desc_slot, reported) = resolve_heap_desc_slot(&self.rtv_descriptor_heap)?;
		if reported != heap_desc
		{
			warn!("descriptor heap reports {:?}, created with {:?}", reported, heap_desc);
		}
		self.rtv_heap_start = cpu_descriptor_handle_for_heap_start(&self.rtv_descriptor_heap, desc_slot)?;

		for n in 0..self.config.back_buffer_count
		{
			let render_target = dxgi::get_buffer(&self.swap_chain, n, &IID_ID3D12_RESOURCE)?;
			self.render_targets.push(render_target);
			create_render_target_view(&self.device, &self.render_targets[n as usize], self.rtv_heap_start.offset(n, self.rtv_descriptor_size))?;
		}

		// Create Command Allocator
		self.command_allocator = create_command_allocator(&self.device, COMMAND_LIST_TYPE_DIRECT)?;
	}
	Ok(())
}

/// Command list, root signature, pipeline state, vertex buffer and fence.
pub fn load_assets(&mut self) -> Result<()>
{
	unsafe
	{
		// Command lists are created in the recording state; render expects it closed.
		self.command_list = create_command_list(&self.device, G_SINGLE_NODEMASK, COMMAND_LIST_TYPE_DIRECT, &self.command_allocator, &ComPtr::null())?;
		command_list::close(&self.command_list)?;

		// Create an empty Root Signature
		let mut signature = self.d3d12.serialize_root_signature(&RootSignatureDesc::empty(ROOT_SIGNATURE_FLAG_ALLOW_INPUT_ASSEMBLER_INPUT_LAYOUT))?;
		let root_signature = d3dcompiler::blob_bytes(&signature)
			.and_then(|bytes| create_root_signature(&self.device, G_SINGLE_NODEMASK, bytes.as_ptr() as *const c_void, bytes.len()));
		signature.release();
		self.root_signature = root_signature?;
	}

	let shader_path = Path::new(self.config.shader_path);
	let mut vertex_shader = self.compiler.compile_file(shader_path, self.config.vertex_entry_point, "vs_5_0", CompileFlags::for_build())?;
	let mut pixel_shader = match self.compiler.compile_file(shader_path, self.config.pixel_entry_point, "ps_5_0", CompileFlags::for_build())
	{
		Ok(pixel_shader) => pixel_shader,
		Err(err) =>
		{
			vertex_shader.release();
			return Err(err);
		},
	};
	let pipeline_state = self.create_pipeline_state(&vertex_shader, &pixel_shader);
	vertex_shader.release();
	pixel_shader.release();
	self.pipeline_state = pipeline_state?;

	self.create_vertex_buffer()?;

	// Create synchronization objects and wait until assets have been uploaded to the GPU.
	unsafe
	{
		self.fence = create_fence(&self.device, 0, FENCE_FLAG_NONE)?;
		self.fence_value = 1;

		self.fence_event = CreateEventW(ptr::null_mut(), FALSE, FALSE, ptr::null());
		if self.fence_event.is_null()
		{
			return Err(last_os_error("CreateEventW"));
		}
	}
	self.wait_for_previous_frame()
}

fn create_pipeline_state(&self, vertex_shader : &ComPtr, pixel_shader : &ComPtr) -> Result<ComPtr>
{
	let input_element_descs = geometry::input_element_descs();
	let bytecode = |blob : &ComPtr| -> Result<ShaderBytecode>
	{
		let bytes = unsafe { d3dcompiler::blob_bytes(blob)? };
		Ok(ShaderBytecode { bytecode : bytes.as_ptr() as *const c_void, length : bytes.len() })
	};

	let mut rtv_formats = [dxgi::FORMAT_UNKNOWN; 8];
	rtv_formats[0] = dxgi::FORMAT_R8G8B8A8_UNORM;

	// Setup pipeline description
	let pso_desc = GraphicsPipelineStateDesc
	{
		root_signature : self.root_signature.as_raw(),
		vs : bytecode(vertex_shader)?,
		ps : bytecode(pixel_shader)?,
		ds : ShaderBytecode::default(),
		hs : ShaderBytecode::default(),
		gs : ShaderBytecode::default(),
		stream_output : Default::default(),
		blend_state : BlendDesc::opaque(),
		sample_mask : u32::MAX,
		rasterizer_state : RasterizerDesc::default_solid_back(),
		depth_stencil_state : DepthStencilDesc::default(),
		input_layout : InputLayoutDesc
		{
			input_element_descs : input_element_descs.as_ptr(),
			num_elements : input_element_descs.len() as u32,
		},
		ib_strip_cut_value : 0,
		primitive_topology_type : PRIMITIVE_TOPOLOGY_TYPE_TRIANGLE,
		num_render_targets : 1,
		rtv_formats,
		dsv_format : dxgi::FORMAT_UNKNOWN,
		sample_desc : SampleDesc::default(),
		node_mask : G_SINGLE_NODEMASK,
		cached_pso : Default::default(),
		flags : 0,
	};

	unsafe { create_graphics_pipeline_state(&self.device, &pso_desc) }
}

/// Uploads the triangle into an upload-heap buffer and records its view.
fn create_vertex_buffer(&mut self) -> Result<()>
{
	let triangle_vertices = geometry::sample_colored_triangle_vertices();
	let bytes = geometry::as_bytes(&triangle_vertices);

	let upload_heap_properties = HeapProperties
	{
		heap_type : HEAP_TYPE_UPLOAD,
		creation_node_mask : G_SINGLE_NODEMASK,
		visible_node_mask : G_SINGLE_NODEMASK,
		..HeapProperties::default()
	};

	let vertex_buffer_resource_desc = ResourceDesc
	{
		dimension : RESOURCE_DIMENSION_BUFFER,
		alignment : 0,
		width : bytes.len() as u64,
		height : 1,
		depth_or_array_size : 1,
		mip_levels : 1,
		format : dxgi::FORMAT_UNKNOWN,
		sample_desc : SampleDesc::default(),
		layout : TEXTURE_LAYOUT_ROW_MAJOR,
		flags : 0,
	};

	unsafe
	{
		self.vertex_buffer = create_committed_resource(
			&self.device,
			&upload_heap_properties,
			HEAP_FLAG_NONE,
			&vertex_buffer_resource_desc,
			RESOURCE_STATE_GENERIC_READ)?;

		// The CPU never reads this buffer back
		let data = map(&self.vertex_buffer, None)?;
		ptr::copy_nonoverlapping(bytes.as_ptr(), data as *mut u8, bytes.len());
		unmap(&self.vertex_buffer, &Range { begin : 0, end : bytes.len() })?;

		self.vertex_buffer_view = VertexBufferView
		{
			buffer_location : gpu_virtual_address(&self.vertex_buffer)?,
			size_in_bytes : bytes.len() as u32,
			stride_in_bytes : geometry::STRIDE,
		};
	}
	debug!("vertex buffer {:?}", self.vertex_buffer_view);
	Ok(())
}

pub fn render(&mut self) -> Result<()>
{
	self.populate_command_list()?;

	unsafe
	{
		execute_command_lists(&self.command_queue, &[self.command_list.as_raw()])?;

		let sync_interval = if self.config.vsync { 1 } else { 0 };
		dxgi::present(&self.swap_chain, sync_interval, 0)?;
	}

	self.wait_for_previous_frame()
}

fn populate_command_list(&mut self) -> Result<()>
{
	let render_target = self.render_targets[self.frame_index as usize].as_raw();
	let rtv_handle = self.rtv_heap_start.offset(self.frame_index, self.rtv_descriptor_size);

	unsafe
	{
		reset_command_allocator(&self.command_allocator)?;
		command_list::reset(&self.command_list, &self.command_allocator, &self.pipeline_state)?;

		command_list::set_graphics_root_signature(&self.command_list, &self.root_signature)?;
		command_list::set_viewports(&self.command_list, &[self.viewport])?;
		command_list::set_scissor_rects(&self.command_list, &[self.scissor_rect])?;

		command_list::resource_barrier(&self.command_list,
			&[ResourceBarrier::transition(render_target, RESOURCE_STATE_PRESENT, RESOURCE_STATE_RENDER_TARGET)])?;

		command_list::set_render_targets(&self.command_list, &[rtv_handle])?;
		command_list::clear_render_target_view(&self.command_list, rtv_handle, &self.config.clear_color)?;

		command_list::set_primitive_topology(&self.command_list, PRIMITIVE_TOPOLOGY_TRIANGLELIST)?;
		command_list::set_vertex_buffers(&self.command_list, 0, &[self.vertex_buffer_view])?;
		command_list::draw_instanced(&self.command_list, 3, 1, 0, 0)?;

		command_list::resource_barrier(&self.command_list,
			&[ResourceBarrier::transition(render_target, RESOURCE_STATE_RENDER_TARGET, RESOURCE_STATE_PRESENT)])?;

		command_list::close(&self.command_list)?;
	}
	Ok(())
}

/// Blocks until the GPU has finished the frame just submitted.
pub fn wait_for_previous_frame(&mut self) -> Result<()>
{
	// Signal and increment the fence value.
	let current_fence_value = self.fence_value;
	unsafe
	{
		signal(&self.command_queue, &self.fence, current_fence_value)?;
		self.fence_value += 1;

		if completed_value(&self.fence)? < current_fence_value
		{
			set_event_on_completion(&self.fence, current_fence_value, self.fence_event as *mut c_void)?;

			match WaitForSingleObject(self.fence_event, INFINITE)
			{
				WAIT_OBJECT_0 => (),
				WAIT_FAILED => return Err(last_os_error("WaitForSingleObject")),
				other => warn!("wait_for_previous_frame: wait returned 0x{:x}", other),
			}
		}

		// Swap backbuffer index for the new frame
		self.frame_index = dxgi::current_back_buffer_index(&self.swap_chain)?;
	}
	Ok(())
}

/// Waits for the GPU, then releases everything in reverse creation order. Safe to call twice.
pub fn destroy(&mut self)
{
	if !self.fence.is_null() && !self.command_queue.is_null() && !self.fence_event.is_null()
	{
		if let Err(err) = self.wait_for_previous_frame()
		{
			warn!("final GPU wait failed: {}", err);
		}
	}

	if !self.fence_event.is_null()
	{
		unsafe { CloseHandle(self.fence_event); }
		self.fence_event = ptr::null_mut();
	}

	self.vertex_buffer.release();
	for render_target in self.render_targets.iter_mut().rev()
	{
		render_target.release();
	}
	self.render_targets.clear();
	self.command_list.release();
	self.command_allocator.release();
	self.rtv_descriptor_heap.release();
	self.pipeline_state.release();
	self.root_signature.release();
	self.fence.release();
	self.command_queue.release();
	self.swap_chain.release();
	self.factory.release();
	self.info_queue.release();
	self.debug_controller.release();
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
