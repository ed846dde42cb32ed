//! CSS Custom Highlight API — highlight registry and style resolution.
//! Spec: <https://drafts.csswg.org/css-highlight-api-1/>
//! Spec: <https://drafts.csswg.org/css-pseudo-4/#highlight-pseudos>
//!
//! A [`HighlightsMap`] holds named groups of entries for one document. Each
//! entry is a live range with an optional inline style and a priority. When a
//! text run is painted, the [`HighlightResolver`] collects the entries whose
//! ranges intersect it and layers cascaded group styles and inline styles in
//! priority order into one [`ResolvedHighlightStyle`].

#![forbid(unsafe_code)]

mod allow_list;
mod config;
mod entry;
mod error;
mod invalidation;
mod map;
mod range;
mod resolver;
mod view;

pub use allow_list::{HighlightAllowList, HighlightableProperties};
pub use config::ResolverConfig;
pub use entry::{EntryId, HighlightEntry};
pub use error::HighlightError;
pub use invalidation::{InvalidationPlanner, InvalidationRequest, Invalidator, flush};
pub use map::{CreationOrder, HighlightGroup, HighlightsMap, HighlightsSnapshot};
pub use range::{LiveRange, TextRun};
pub use resolver::{HighlightResolver, ResolvedHighlightStyle};
pub use view::HighlightView;
