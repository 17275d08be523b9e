//! PDF rendering of quotes.
//!
//! [`QuoteDocument`] lays out the printed content of a [`domain::QuoteSheet`]
//! without touching any I/O; [`render_pdf`] turns that layout into PDF bytes.
//! [`Renderer`] ties both together with the company logo read from the
//! media root.

pub mod document;
pub mod error;
pub mod format;
pub mod logo;
pub mod pdf;

pub use document::{ACCEPTANCE_CLAUSE, ItemLine, QuoteDocument, SIGNATURE_CAPTION};
pub use error::RenderError;
pub use logo::{Logo, LogoStore};
pub use pdf::{Renderer, render_pdf};
