//! Calls COM interface methods by vtable slot without generated bindings,
//! and draws a colored triangle through Direct3D 12, 11 and 10 with it.

pub mod error;
pub mod logging;
pub mod config;
pub mod native;

pub mod vtable;
pub mod guid;
pub mod com;
pub mod layout;
pub mod fallback;
pub mod probe;

pub mod dxgi;
pub mod d3dcompiler;
pub mod d3d12;
pub mod d3d11;
pub mod d3d10;

pub mod geometry;

#[cfg(windows)]
pub mod win_utilities;
#[cfg(windows)]
pub mod win_window;
#[cfg(windows)]
pub mod win_platform;

pub use com::ComPtr;
pub use error::{Error, Result};
pub use guid::Guid;
