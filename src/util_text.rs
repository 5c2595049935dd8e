//! Text helpers for the presentation layer.

/// Artwork URL for an item: `<image_base><id>.png`
pub fn image_url(image_base: &str, id: &str) -> String {
    format!("{image_base}{id}.png")
}

/// Name as shown on a card: first character upper-cased
pub fn display_name(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Catalog number as shown on a card: `#` + id zero-padded to 3
pub fn display_number(id: &str) -> String {
    format!("#{id:0>3}")
}

/// Truncate to `max` chars, marking the cut with an ellipsis
pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    if max == 0 {
        return String::new();
    }
    let mut out: String = s.chars().take(max - 1).collect();
    out.push('…');
    out
}

/// Decimetres → metres, hectograms → kilograms (the API's units)
pub fn format_height(dm: u32) -> String {
    format!("{:.1} m", dm as f64 / 10.0)
}

pub fn format_weight(hg: u32) -> String {
    format!("{:.1} kg", hg as f64 / 10.0)
}
