//! Pipeline stages for first-page conversion.
//!
//! Each submodule implements exactly one step, so each can be tested on its
//! own and the rendering backend can change without touching the others.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ render ──▶ encode
//! (bytes)   (canvas)   (PNG)
//! ```
//!
//! 1. [`input`]: read the caller's PDF into memory
//! 2. [`render`]: open page one, size a [`render::Canvas`] to its 4× viewport
//!    and draw it; blocking, so it runs in `spawn_blocking`
//! 3. [`encode`]: turn the canvas into image bytes via an
//!    [`encode::ImageEncoder`]

pub mod encode;
pub mod input;
pub mod render;
