/// ASCII spelling of the accented Latin letters common in course names.
fn fold_to_ascii(c: char) -> Option<&'static str> {
    let folded = match c {
        'à' | 'á' | 'â' | 'ã' | 'ä' | 'å' | 'À' | 'Á' | 'Â' | 'Ã' | 'Ä' | 'Å' => "a",
        'æ' | 'Æ' => "ae",
        'ç' | 'Ç' => "c",
        'è' | 'é' | 'ê' | 'ë' | 'È' | 'É' | 'Ê' | 'Ë' => "e",
        'ğ' | 'Ğ' => "g",
        'ì' | 'í' | 'î' | 'ï' | 'ı' | 'Ì' | 'Í' | 'Î' | 'Ï' | 'İ' => "i",
        'ñ' | 'Ñ' => "n",
        'ò' | 'ó' | 'ô' | 'õ' | 'ö' | 'ø' | 'Ò' | 'Ó' | 'Ô' | 'Õ' | 'Ö' | 'Ø' => "o",
        'œ' | 'Œ' => "oe",
        'ş' | 'Ş' => "s",
        'ß' => "ss",
        'ù' | 'ú' | 'û' | 'ü' | 'Ù' | 'Ú' | 'Û' | 'Ü' => "u",
        'ý' | 'ÿ' | 'Ý' => "y",
        _ => return None,
    };
    Some(folded)
}

/// Derives a URL-safe slug from a display name: lowercase ASCII alphanumerics,
/// accented Latin letters folded to ASCII, every other run of characters
/// collapsed into a single `-`.
pub fn slugify(name: &str, fallback: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_dash = false;
    for c in name.chars() {
        let folded = if c.is_ascii_alphanumeric() {
            None
        } else {
            match fold_to_ascii(c) {
                Some(ascii) => Some(ascii),
                None => {
                    pending_dash = true;
                    continue;
                }
            }
        };
        if pending_dash && !slug.is_empty() {
            slug.push('-');
        }
        pending_dash = false;
        match folded {
            Some(ascii) => slug.push_str(ascii),
            None => slug.push(c.to_ascii_lowercase()),
        }
    }
    if slug.is_empty() {
        fallback.to_string()
    } else {
        slug
    }
}

/// Returns `base`, or `base-N` with the smallest N >= 2 for which `is_taken` is false.
pub fn unique_slug<F>(base: &str, mut is_taken: F) -> anyhow::Result<String>
where
    F: FnMut(&str) -> anyhow::Result<bool>,
{
    if !is_taken(base)? {
        return Ok(base.to_string());
    }
    let mut suffix = 2;
    loop {
        let candidate = format!("{}-{}", base, suffix);
        if !is_taken(&candidate)? {
            return Ok(candidate);
        }
        suffix += 1;
    }
}
