use std::mem;

use winapi::shared::minwindef::{LPARAM, LRESULT, UINT, WPARAM};
use winapi::shared::windef::HWND;
use winapi::um::winuser::{
	MSG,
	PM_REMOVE,
	WM_DESTROY,
	WM_QUIT,
	DefWindowProcW,
	DispatchMessageW,
	PeekMessageW,
	PostQuitMessage,
	TranslateMessage,
};

use crate::error::Result;

/// Ends the message loop when the window is closed.
pub unsafe extern "system" fn window_proc( hwnd : HWND, message : UINT, wparam : WPARAM, lparam : LPARAM ) -> LRESULT
{
	match message
	{
		WM_DESTROY =>
		{
			PostQuitMessage(0);
			0
		},
		_ => DefWindowProcW(hwnd, message, wparam, lparam),
	}
}

/// What one pass over the message queue found.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Pump
{
	Dispatched,
	Idle,
	Quit,
}

/// Dispatches at most one pending message without blocking.
pub fn handle_message() -> Pump
{
	let mut message = mem::MaybeUninit::<MSG>::uninit();

	// Thread-wide, so WM_QUIT posted by the window procedure is seen
	let has_message =
		unsafe { PeekMessageW(message.as_mut_ptr(), std::ptr::null_mut(), 0, 0, PM_REMOVE) };

	if has_message == 0
	{
		return Pump::Idle;
	}

	let message = unsafe { message.assume_init() };
	if message.message == WM_QUIT
	{
		return Pump::Quit;
	}

	unsafe
	{
		TranslateMessage(&message);
		DispatchMessageW(&message);
	}
	Pump::Dispatched
}

/// Pumps messages until the window closes, calling `frame` whenever the queue is empty.
///
/// The first error returned by `frame` stops the loop.
pub fn message_handle_loop<F>( mut frame : F ) -> Result<()>
	where F : FnMut() -> Result<()>
{
	loop
	{
		match handle_message()
		{
			Pump::Quit => return Ok(()),
			Pump::Dispatched => {},
			Pump::Idle => frame()?,
		}
	}
}
