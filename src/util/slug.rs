/// Turns a post title into the name part of a post file name:
/// ascii only, lowercase, words joined by `-`
pub fn slug_from_title(title: &str) -> String {
    let ascii = unidecode::unidecode(title);
    let mut slug = String::with_capacity(ascii.len());
    let mut prev_dash = true;

    for c in ascii.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
            prev_dash = false;
        } else if !prev_dash {
            slug.push('-');
            prev_dash = true;
        }
    }

    if slug.ends_with('-') {
        slug.pop();
    }
    slug
}
