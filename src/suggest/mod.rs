mod client;
mod parse;
mod source;

pub use client::{SuggestClient, SuggestError, SuggestionSource};
pub use source::Source;
