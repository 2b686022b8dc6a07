//! Finding a shader's name in its GLSL source.
//!
//! Engines like three.js and Babylon.js name their shaders with a directive
//! in the source:
//!
//! ```glsl
//! #define SHADER_NAME MeshStandardMaterial
//! ```
//!
//! Names that aren't plain tokens can be given percent-encoded and then
//! base64-encoded:
//!
//! ```glsl
//! #define SHADER_NAME_B64 44K344Kn44O844OA44O8
//! ```
//!
//! Both directive keywords are matched without regard to case, and the name
//! must be the last thing on its line.

use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use base64::Engine;
use percent_encoding::percent_decode;

/// An error encountered decoding a `SHADER_NAME_B64` directive.
#[derive(Debug, PartialEq, thiserror::Error)]
pub enum ShaderNameError {
    #[error("invalid base64 in SHADER_NAME_B64 directive: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("malformed percent escape at byte {0} of decoded shader name")]
    PercentEscape(usize),

    #[error("decoded shader name is not UTF-8: {0}")]
    Utf8(#[from] std::str::Utf8Error),
}

/// Base64 as browsers' `atob` accepts it: padding is optional, and stray bits
/// in the last character are ignored.
const FORGIVING: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new()
        .with_decode_padding_mode(DecodePaddingMode::Indifferent)
        .with_decode_allow_trailing_bits(true),
);

/// Return the name `source` gives its shader, or `None` if it doesn't name
/// it, or the name can't be decoded.
///
/// Decoding failures are logged, never returned: a badly named shader
/// shouldn't keep its draw calls from being recorded.
pub fn shader_name(source: &str) -> Option<String> {
    parse_shader_name(source).unwrap_or_else(|err| {
        log::debug!("ignoring shader name: {}", err);
        None
    })
}

/// Return the name `source` gives its shader, if any.
///
/// A `SHADER_NAME` directive takes precedence over `SHADER_NAME_B64`. Only the
/// first directive of each sort counts. A name that decodes to the empty
/// string is no name at all.
pub fn parse_shader_name(source: &str) -> Result<Option<String>, ShaderNameError> {
    if let Some(name) = find_directive(source, "SHADER_NAME") {
        return Ok(Some(name.to_string()));
    }

    let encoded = match find_directive(source, "SHADER_NAME_B64") {
        Some(encoded) => encoded,
        None => return Ok(None),
    };

    let escaped = FORGIVING.decode(encoded)?;
    check_escapes(&escaped)?;
    let name = percent_decode(&escaped).decode_utf8()?;
    if name.is_empty() {
        return Ok(None);
    }

    Ok(Some(name.into_owned()))
}

/// Find the first `#define <keyword> <token>` in `source`, and return the
/// token.
///
/// The keywords may be separated by any whitespace, including newlines. The
/// token runs to the next whitespace character, which must be a newline, or
/// the end of `source`; otherwise that `#define` doesn't count.
fn find_directive<'a>(source: &'a str, keyword: &str) -> Option<&'a str> {
    const DEFINE: &str = "#define";

    // ASCII lowercasing leaves byte offsets unchanged.
    let lower = source.to_ascii_lowercase();
    let mut from = 0;
    while let Some(found) = lower[from..].find(DEFINE) {
        let start = from + found;
        from = start + DEFINE.len();
        if let Some(token) = directive_token(&source[from..], keyword) {
            return Some(token);
        }
    }

    None
}

/// Match `<space> <keyword> <space> <token>` at the start of `text`, where
/// `<token>` is followed by a newline or the end of `text`.
fn directive_token<'a>(text: &'a str, keyword: &str) -> Option<&'a str> {
    let text = skip_space(text)?;
    match text.get(..keyword.len()) {
        Some(word) if word.eq_ignore_ascii_case(keyword) => (),
        _ => return None,
    }

    let text = skip_space(&text[keyword.len()..])?;
    let end = text.find(char::is_whitespace).unwrap_or(text.len());
    let (token, rest) = text.split_at(end);
    if token.is_empty() || !(rest.is_empty() || rest.starts_with('\n')) {
        return None;
    }

    Some(token)
}

/// Strip leading whitespace from `text`, or return `None` if there isn't any.
fn skip_space(text: &str) -> Option<&str> {
    let trimmed = text.trim_start();
    if trimmed.len() == text.len() {
        None
    } else {
        Some(trimmed)
    }
}

/// Check that every `%` in `escaped` begins a two-digit hex escape.
///
/// `percent_decode` passes malformed escapes through unchanged, but a name
/// containing them wasn't produced by percent-encoding anything.
fn check_escapes(escaped: &[u8]) -> Result<(), ShaderNameError> {
    for (i, _) in escaped.iter().enumerate().filter(|&(_, &byte)| byte == b'%') {
        let digits = escaped.get(i + 1..i + 3).unwrap_or(&[]);
        if digits.len() != 2 || !digits.iter().all(u8::is_ascii_hexdigit) {
            return Err(ShaderNameError::PercentEscape(i));
        }
    }
    Ok(())
}

#[test]
fn test_plain_name() {
    let source = "precision highp float;\n#define SHADER_NAME foo\nvoid main() {}\n";
    assert_eq!(shader_name(source), Some("foo".to_string()));

    // At the very end, with no newline.
    assert_eq!(shader_name("#define SHADER_NAME MeshBasicMaterial"),
               Some("MeshBasicMaterial".to_string()));

    // Case doesn't matter, and any whitespace separates.
    assert_eq!(shader_name("#DEFINE\tshader_name\n  Outline\n"), Some("Outline".to_string()));

    // Only the first directive counts.
    assert_eq!(shader_name("#define SHADER_NAME one\n#define SHADER_NAME two\n"),
               Some("one".to_string()));
}

#[test]
fn test_name_must_end_line() {
    assert_eq!(shader_name("#define SHADER_NAME foo bar\n"), None);
    assert_eq!(shader_name("#define SHADER_NAME foo \n"), None);

    // A later directive that does end its line is found.
    assert_eq!(shader_name("#define SHADER_NAME foo bar\n#define SHADER_NAME baz\n"),
               Some("baz".to_string()));
}

#[test]
fn test_base64_name() {
    // base64 of "h%C3%A9llo", the percent-encoding of "héllo".
    assert_eq!(shader_name("#define SHADER_NAME_B64 aCVDMyVBOWxsbw==\n"),
               Some("héllo".to_string()));

    // Padding is optional.
    assert_eq!(shader_name("#define SHADER_NAME_B64 aCVDMyVBOWxsbw\n"),
               Some("héllo".to_string()));

    // Unescaped UTF-8 passes through.
    assert_eq!(shader_name("#define SHADER_NAME_B64 44K344Kn44O844OA44O8"),
               Some("シェーダー".to_string()));
    assert_eq!(shader_name("#define SHADER_NAME_B64 8J+YjvCfmIE="),
               Some("😎😁".to_string()));

    // The plain form wins.
    assert_eq!(shader_name("#define SHADER_NAME_B64 aCVDMyVBOWxsbw==\n#define SHADER_NAME plain\n"),
               Some("plain".to_string()));
}

#[test]
fn test_no_name() {
    assert_eq!(shader_name(""), None);
    assert_eq!(shader_name("void main() { gl_FragColor = vec4(1.0); }"), None);
    assert_eq!(shader_name("#define SHADER_NAME\n"), None);
    assert_eq!(shader_name("#define NAME foo\n"), None);
    assert_eq!(parse_shader_name("#define SHADER_NAME_B64 \n"), Ok(None));
}

#[test]
fn test_malformed_names() {
    assert!(matches!(parse_shader_name("#define SHADER_NAME_B64 !!!!\n"),
                     Err(ShaderNameError::Base64(_))));
    assert_eq!(shader_name("#define SHADER_NAME_B64 !!!!\n"), None);

    // base64 of "%E0%A4%A": a truncated escape.
    assert_eq!(parse_shader_name("#define SHADER_NAME_B64 JUUwJUE0JUE=\n"),
               Err(ShaderNameError::PercentEscape(6)));

    // base64 of "%E0%A4": well-formed escapes, but not UTF-8.
    assert!(matches!(parse_shader_name("#define SHADER_NAME_B64 JUUwJUE0\n"),
                     Err(ShaderNameError::Utf8(_))));
    assert_eq!(shader_name("#define SHADER_NAME_B64 JUUwJUE0\n"), None);
}
