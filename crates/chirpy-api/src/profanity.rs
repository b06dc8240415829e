/// Words masked out of chirp bodies.
const BAD_WORDS: &[&str] = &["kerfuffle", "sharbert", "fornax"];

const MASK: &str = "****";

/// Replace every space-separated word that matches a banned word
/// (case-insensitively) with `****`. Punctuation attached to a word keeps it
/// from matching, and spacing is preserved exactly.
pub fn clean_body(body: &str) -> String {
    body.split(' ')
        .map(|word| {
            if BAD_WORDS.contains(&word.to_lowercase().as_str()) {
                MASK
            } else {
                word
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
