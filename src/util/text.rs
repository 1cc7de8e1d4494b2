use std::borrow::Cow;

use unicode_width::UnicodeWidthChar;

const ELLIPSIS: &str = "...";
const ELLIPSIS_WIDTH: usize = 3;

/// Truncates a string to fit within a maximum display width in terminal
/// columns, appending "..." when text was cut off.
///
/// Width is Unicode-aware (CJK and emoji count as two columns). Widths of 3
/// or less leave no room for an ellipsis, so as many characters as fit are
/// returned without one.
///
/// # Examples
///
/// ```
/// use blackbird::util::truncate_to_width;
///
/// assert_eq!(truncate_to_width("Short", 10), "Short");
/// assert_eq!(truncate_to_width("Hello World", 8), "Hello...");
/// assert_eq!(truncate_to_width("Test", 2), "Te");
/// ```
pub fn truncate_to_width(s: &str, max_width: usize) -> Cow<'_, str> {
    if max_width == 0 {
        return Cow::Borrowed("");
    }

    let budget = if max_width <= ELLIPSIS_WIDTH {
        max_width
    } else {
        max_width - ELLIPSIS_WIDTH
    };

    let mut width = 0;
    let mut cut = None;
    for (idx, c) in s.char_indices() {
        let char_width = UnicodeWidthChar::width(c).unwrap_or(0);
        if cut.is_none() && width + char_width > budget {
            cut = Some(idx);
        }
        if width + char_width > max_width {
            let cut = cut.unwrap_or(idx);
            return if max_width <= ELLIPSIS_WIDTH {
                Cow::Owned(s[..cut].to_string())
            } else {
                Cow::Owned(format!("{}{}", &s[..cut], ELLIPSIS))
            };
        }
        width += char_width;
    }

    Cow::Borrowed(s)
}

/// Strip terminal control characters and ANSI escape sequences from text.
///
/// Feed titles and author names are attacker-controlled and end up printed by
/// the CLI, so they are sanitized during normalization.
///
/// Strips ASCII control chars (except tab, newline, carriage return), DEL,
/// ANSI CSI sequences (`\x1b[` ... final byte), OSC sequences (`\x1b]` ... BEL
/// or ST) and bare ESC.
///
/// Returns `Cow::Borrowed` when the input contains no control characters.
pub fn strip_control_chars(s: &str) -> Cow<'_, str> {
    let bytes = s.as_bytes();
    let len = bytes.len();

    if !bytes.iter().any(|&b| is_stripped(b)) {
        return Cow::Borrowed(s);
    }

    let mut out = String::with_capacity(len);
    let mut i = 0;

    while i < len {
        let b = bytes[i];

        if b == 0x1b {
            match bytes.get(i + 1) {
                Some(b'[') => {
                    // CSI: parameter/intermediate bytes until the final byte
                    i += 2;
                    while i < len {
                        let c = bytes[i];
                        i += 1;
                        if (0x40..=0x7e).contains(&c) {
                            break;
                        }
                    }
                }
                Some(b']') => {
                    // OSC: until BEL or ST (\x1b\\)
                    i += 2;
                    while i < len {
                        if bytes[i] == 0x07 {
                            i += 1;
                            break;
                        }
                        if bytes[i] == 0x1b && bytes.get(i + 1) == Some(&b'\\') {
                            i += 2;
                            break;
                        }
                        i += 1;
                    }
                }
                _ => i += 1,
            }
        } else if is_stripped(b) {
            i += 1;
        } else {
            let start = i;
            i += 1;
            while i < len && !is_stripped(bytes[i]) {
                i += 1;
            }
            // SAFETY: we only break on ASCII control bytes, which cannot appear
            // mid-codepoint in valid UTF-8, so s[start..i] is valid UTF-8.
            out.push_str(&s[start..i]);
        }
    }

    Cow::Owned(out)
}

fn is_stripped(b: u8) -> bool {
    b == 0x1b || b == 0x7f || (b < 0x20 && b != 0x09 && b != 0x0a && b != 0x0d)
}

/// Cleans a single-line display string from a feed: control characters
/// stripped, surrounding whitespace trimmed. Blank input yields `None`.
pub fn clean_line(s: &str) -> Option<String> {
    let stripped = strip_control_chars(s);
    let trimmed = stripped.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_owned())
}

/// Counts whitespace-separated words.
///
/// Markup is not stripped first: `<p>Hello world</p>` is two words.
pub fn word_count(s: &str) -> usize {
    s.split_whitespace().count()
}
