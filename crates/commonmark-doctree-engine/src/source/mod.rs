//! Event sources feeding the tree builder.
//!
//! Both pipelines produce the same [`Located`](crate::events::Located)
//! stream: the markdown source maps pulldown-cmark events one to one, the
//! HTML source goes through rendered HTML and yields element events that the
//! builder disambiguates.

pub mod html;
pub mod markdown;

pub use html::{html_events, html_pipeline_events, render_html};
pub use markdown::{LineIndex, markdown_events};
