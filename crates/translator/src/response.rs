//! Translator V2 response decoding
//!
//! The endpoint answers with a bare `<string>` element and no document root,
//! e.g. `<string xmlns="http://schemas.microsoft.com/2003/10/Serialization/">Bonjour</string>`.
//! The body is wrapped in `<result>...</result>` so it parses as one document,
//! and the text of the first `<string>` child of that root is the translation.

use quick_xml::Reader;
use quick_xml::events::Event;

use crate::error::{Error, Result};

const ROOT_OPEN: &str = "<result>";
const ROOT_CLOSE: &str = "</result>";

/// Give the bare response body a document root.
pub fn wrap_response(body: &str) -> String {
    let mut wrapped = String::with_capacity(ROOT_OPEN.len() + body.len() + ROOT_CLOSE.len());
    wrapped.push_str(ROOT_OPEN);
    wrapped.push_str(body);
    wrapped.push_str(ROOT_CLOSE);
    wrapped
}

/// Extract the translated text from a raw response body.
///
/// Fails with `Error::Decode` when the wrapped body is not well-formed XML or
/// has no `<string>` element directly under the root.
pub fn decode_translation(body: &str) -> Result<String> {
    let wrapped = wrap_response(body);
    let mut reader = Reader::from_str(&wrapped);

    let mut depth = 0usize;
    let mut capturing = false;
    let mut found = false;
    let mut text = String::new();

    loop {
        let event = reader
            .read_event()
            .map_err(|e| Error::Decode(format!("at byte {}: {e}", reader.buffer_position())))?;
        match event {
            Event::Start(e) => {
                depth += 1;
                if !found && depth == 2 && e.local_name().as_ref() == b"string" {
                    capturing = true;
                }
            }
            Event::End(_) => {
                if capturing && depth == 2 {
                    capturing = false;
                    found = true;
                }
                depth = depth.saturating_sub(1);
            }
            Event::Empty(e) => {
                if !found && depth == 1 && e.local_name().as_ref() == b"string" {
                    found = true;
                }
            }
            // Text of nested child elements is not part of the translation
            Event::Text(e) if capturing && depth == 2 => {
                let unescaped = e.unescape().map_err(|e| Error::Decode(e.to_string()))?;
                text.push_str(&unescaped);
            }
            Event::CData(e) if capturing && depth == 2 => {
                let raw = std::str::from_utf8(&e).map_err(|e| Error::Decode(e.to_string()))?;
                text.push_str(raw);
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if depth != 0 {
        return Err(Error::Decode("unexpected end of document".into()));
    }
    if !found {
        return Err(Error::Decode("response has no <string> element".into()));
    }
    Ok(text)
}
