/// Split text into terms on runs of whitespace.
///
/// Terms keep their case and any attached punctuation, so `"Timeout,"` and
/// `"timeout"` are different terms. Documents and queries must both go through
/// this function or term lookups will not line up.
pub fn tokenize(text: &str) -> Vec<String> {
    text.split_whitespace().map(str::to_owned).collect()
}
