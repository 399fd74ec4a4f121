//! Text rendering utilities.
//!
//! - [`render_markup`] - Convert a formatted message to styled ratatui Lines
//! - [`MarkupStyles`] - Style configuration for markup elements
//! - [`wrap_lines`] - Word wrapping that preserves styling

mod markup;
mod styles;
mod wrap;

pub use markup::render_markup;
pub use styles::MarkupStyles;
pub use wrap::wrap_lines;
