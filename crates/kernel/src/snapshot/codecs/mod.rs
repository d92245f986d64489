//! Codecs shipped with the kernel.

pub mod gallery;
pub mod text;

pub use gallery::GalleryCodec;
pub use text::TextCodec;
