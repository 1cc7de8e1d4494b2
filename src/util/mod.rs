//! Utility functions shared by the feed pipeline and the CLI.
//!
//! - **URL validation**: Security-focused validation to prevent SSRF attacks
//! - **Link resolution**: Resolving hrefs found in pages and feed documents
//! - **HTML scanning**: Attribute extraction from `<link>` and `<img>` tags
//! - **Text processing**: Control-character stripping, word counts, truncation
//! - **Image sniffing**: Recognizing image payloads by signature
//!
//! # Examples
//!
//! ```
//! use blackbird::util::{first_img_src, resolve_href, validate_url};
//!
//! let site = validate_url("https://example.com/blog/", false).unwrap();
//! let icon = resolve_href("/static/icon.png", &site).unwrap();
//! assert_eq!(icon.as_str(), "https://example.com/static/icon.png");
//!
//! assert_eq!(first_img_src(r#"<img src="/a.png">"#), Some("/a.png"));
//! ```

mod html;
mod image;
mod links;
mod text;
mod url_validator;

pub use html::{attr_value, first_img_src, has_token, start_tags, StartTags};
pub use image::{sniff_image, ImageKind};
pub use links::{has_file_extension, https_root, resolve_document_url, resolve_href, site_root};
pub use text::{clean_line, strip_control_chars, truncate_to_width, word_count};
pub use url_validator::{check_url, validate_url, UrlValidationError};
