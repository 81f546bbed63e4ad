pub const BYTES_IN_1_MEGABYTE: usize = 1024 * 1024;
// margin of safety below the 1MB CI limit
pub const MAX_STEP_OUTPUT_SIZE: usize = BYTES_IN_1_MEGABYTE - 200 * 1024;

const TRUNCATION_GLUE: &str = "\n[...snip...]\n";

/// Make step output safe to embed as XML character data and bound its size.
///
/// Code points that are illegal in XML are replaced with U+FFFD. Output over
/// `MAX_STEP_OUTPUT_SIZE` is truncated, keeping the tail where the failure
/// context usually lives.
pub fn sanitize_output_for_xml(output: &str) -> String {
  if output.is_empty() {
    return String::new();
  }

  let output: String = output
    .chars()
    .map(|c| if valid_xml_char(c) { c } else { '\u{FFFD}' })
    .collect();

  if output.len() <= MAX_STEP_OUTPUT_SIZE {
    return output;
  }

  let truncated = truncate_text_to_approximate_size(&output, MAX_STEP_OUTPUT_SIZE, 0.0);
  format!("truncated output to 1MB:\n{}", truncated)
}

fn valid_xml_char(c: char) -> bool {
  matches!(
    c,
    '\u{09}'
      | '\u{0A}'
      | '\u{0D}'
      | '\u{20}'..='\u{D7FF}'
      | '\u{E000}'..='\u{FFFD}'
      | '\u{10000}'..='\u{10FFFF}'
  )
}

/// Truncate `text` to at most `max_bytes` bytes, keeping `front_weight`
/// (0.0 to 1.0) of the budget at the front and the rest at the back, joined
/// by a snip marker. Returns the input unchanged when it already fits.
pub fn truncate_text_to_approximate_size(text: &str, max_bytes: usize, front_weight: f64) -> String {
  assert!((0.0..=1.0).contains(&front_weight));

  if text.len() <= max_bytes {
    return text.to_string();
  }

  let budget = max_bytes.saturating_sub(TRUNCATION_GLUE.len());
  let front_bytes = (budget as f64 * front_weight).floor() as usize;
  let back_bytes = budget - front_bytes;

  let front = &text[..floor_char_boundary(text, front_bytes)];
  let back = &text[ceil_char_boundary(text, text.len() - back_bytes)..];

  format!("{}{}{}", front, TRUNCATION_GLUE, back)
}

pub(crate) fn floor_char_boundary(text: &str, mut index: usize) -> usize {
  if index >= text.len() {
    return text.len();
  }

  while !text.is_char_boundary(index) {
    index -= 1;
  }

  index
}

fn ceil_char_boundary(text: &str, mut index: usize) -> usize {
  while index < text.len() && !text.is_char_boundary(index) {
    index += 1;
  }

  index
}
