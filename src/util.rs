//! Small utility helpers used across modules.

/// Log-safe truncation for large strings.
/// Avoids spamming logs with huge upstream payloads.
pub fn trunc_for_log(s: &str, max: usize) -> String {
  if s.len() <= max {
    return s.to_string();
  }
  let mut end = max;
  while !s.is_char_boundary(end) {
    end -= 1;
  }
  format!("{}… ({} bytes total)", &s[..end], s.len())
}

/// Split a comma separated query value, dropping blanks.
pub fn split_csv(s: &str) -> Vec<&str> {
  s.split(',').map(str::trim).filter(|p| !p.is_empty()).collect()
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn truncation_respects_char_boundaries() {
    let s = "αβγδε";
    let out = trunc_for_log(s, 3);
    assert!(out.starts_with("α…"));
    assert_eq!(trunc_for_log("short", 10), "short");
  }

  #[test]
  fn csv_drops_blanks() {
    assert_eq!(split_csv("A, B,,C "), vec!["A", "B", "C"]);
    assert!(split_csv(" ").is_empty());
  }
}
