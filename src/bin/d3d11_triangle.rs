//! Draws the demo triangle with Direct3D 11.

use rust_com_triangle::logging;

#[cfg(windows)]
fn run() -> rust_com_triangle::Result<()>
{
	use rust_com_triangle::{config::DemoConfig, d3d11::renderer::Renderer, win_platform, win_window};

	let config = DemoConfig::DEFAULT;
	let window = win_window::create_window(&config)?;

	let mut renderer = Renderer::new(config)?;
	renderer.init(&window)?;
	win_window::show_window(window);

	let result = win_platform::message_handle_loop(|| renderer.render());
	renderer.destroy();
	result
}

#[cfg(windows)]
fn main()
{
	logging::init();

	if let Err(err) = run()
	{
		logging::error!("d3d11_triangle: {}", err);
	}
}

#[cfg(not(windows))]
fn main()
{
	logging::init();
	logging::warn!("d3d11_triangle needs Windows with Direct3D 11; nothing to do on this platform");
}
