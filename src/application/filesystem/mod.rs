pub mod filesystem_view;
pub mod provider;

pub use filesystem_view::{FileNode, FilesystemView};
pub use provider::LightweightFilesystemProvider;
