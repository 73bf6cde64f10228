mod buffer;
#[cfg(target_os = "windows")]
mod module;
mod view;

#[cfg(test)]
pub mod mock;

pub use buffer::ByteBuffer;
#[cfg(target_os = "windows")]
pub use module::LoadedModule;
pub use view::{CodeView, CodeWriter};

#[cfg(test)]
pub use mock::MockCodeBuilder;
