mod text;

pub use text::{clean_optional, parse_tag_input, split_paragraph_blocks};
