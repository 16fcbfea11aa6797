use std::io::Error as IoError; // Err / Ok
use std::ptr::null_mut; // nullptr

use winapi::shared::minwindef::FALSE;
use winapi::shared::windef::{HWND, RECT};
use winapi::um::libloaderapi::GetModuleHandleW;
use winapi::um::winuser::{
	WNDCLASSW,
	CS_OWNDC,
	CS_HREDRAW,
	CS_VREDRAW,
	CW_USEDEFAULT,
	SW_SHOW,
	WS_OVERLAPPEDWINDOW,
	AdjustWindowRect,
	RegisterClassW,
	CreateWindowExW,
	ShowWindow,
	UpdateWindow
};

use crate::config::DemoConfig;
use crate::error::{Error, Result};
use crate::win_utilities::win32_string;
use crate::win_platform::window_proc;

#[derive(Copy, Clone, Debug)]
pub struct Window
{
	pub handle : HWND,
}

/// Registers the demo window class and creates a window whose client area matches `config`.
pub fn create_window( config : &DemoConfig ) -> Result<Window>
{
	let name = win32_string("rust_com_triangle");
	let title = win32_string(config.title);

	let style = WS_OVERLAPPEDWINDOW;

	// Grow the outer rectangle so the client area is exactly width x height
	let mut bounds = RECT { left : 0, top : 0, right : config.width as i32, bottom : config.height as i32 };

	unsafe
	{
		let hinstance = GetModuleHandleW( null_mut() );

		let wnd_class = WNDCLASSW
		{
			style : CS_OWNDC | CS_HREDRAW | CS_VREDRAW,
			lpfnWndProc : Some(window_proc),
			hInstance : hinstance,
			lpszClassName : name.as_ptr(),
			cbClsExtra : 0,
			cbWndExtra : 0,
			hIcon: null_mut(),
			hCursor: null_mut(),
			hbrBackground: null_mut(),
			lpszMenuName: null_mut(),
		};

		// A second demo in the same process finds the class already registered
		if RegisterClassW(&wnd_class) == 0
		{
			log::debug!("RegisterClassW: {}", IoError::last_os_error());
		}

		if AdjustWindowRect(&mut bounds, style, FALSE) == 0
		{
			return Err(Error::Window(IoError::last_os_error()));
		}

		let h_window_handle : HWND = CreateWindowExW(
			0,								// dwExStyle: DWORD
			name.as_ptr(),					// lpClassName: LPCWSTR,
			title.as_ptr(),					// lpWindowName: LPCWSTR,
			style,							// dwStyle: DWORD,
			CW_USEDEFAULT,					// x: c_int,
			CW_USEDEFAULT,					// y: c_int,
			bounds.right - bounds.left,		// nWidth: c_int,
			bounds.bottom - bounds.top,		// nHeight: c_int,
			null_mut(),						// hWndParent: HWND,
			null_mut(),						// hMenu: HMENU,
			hinstance,						// hInstance: HINSTANCE,
			null_mut(),						// lpParam: LPVOID,
		);

		if h_window_handle.is_null()
		{
			return Err(Error::Window(IoError::last_os_error()));
		}

		log::info!("created {}x{} window {:?}", config.width, config.height, h_window_handle);
		Ok( Window { handle : h_window_handle } )
	}
}

pub fn show_window( window : Window )
{
	unsafe
	{
		ShowWindow(window.handle, SW_SHOW);
		UpdateWindow(window.handle);
	}
}
