//! Percent-encoding for URL path segments.
//!
//! Asset tags, attribute names, and asset-type names are embedded directly
//! in API paths (`/api/asset/{tag}`). Collins keeps these alphanumeric in
//! practice, but the client must not produce a malformed URL when handed a
//! tag containing a space, slash, or query metacharacter.

use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};

/// Characters that must be percent-encoded inside a path segment.
const PATH_SEGMENT_ESCAPE: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'<')
    .add(b'>')
    .add(b'`')
    .add(b'?')
    .add(b'{')
    .add(b'}')
    .add(b'/')
    .add(b'\\');

/// Percent-encode a value for use as a single URL path segment.
#[must_use]
pub fn encode_path_segment(segment: &str) -> String {
    utf8_percent_encode(segment, PATH_SEGMENT_ESCAPE).to_string()
}
