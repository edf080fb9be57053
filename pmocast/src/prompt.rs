//! Invites interactives du binaire.
//!
//! Tout passe par stdin/stdout; les logs restent sur stderr pour ne pas
//! casser la ligne de statut.

use std::io::{self, Write};

use pmocastcontrol::RendererInfo;

/// Print the renderer list with selection indexes.
pub fn print_renderers(renderers: &[RendererInfo]) {
    for (idx, info) in renderers.iter().enumerate() {
        println!(
            "  [{}] {} | model={} | manufacturer={}",
            idx, info.friendly_name, info.model_name, info.manufacturer
        );
    }
}

/// Interactive renderer selection. Returns `None` on end of input
/// (stdin closed before a valid selection).
pub fn select_renderer_index(count: usize) -> io::Result<Option<usize>> {
    loop {
        print!("\nSelect device [0-{}]: ", count - 1);
        io::stdout().flush()?;

        let mut input = String::new();
        if io::stdin().read_line(&mut input)? == 0 {
            return Ok(None);
        }

        match parse_selection(&input, count) {
            Some(idx) => return Ok(Some(idx)),
            None => {
                println!(
                    "Invalid selection. Please enter a number between 0 and {}",
                    count - 1
                );
            }
        }
    }
}

/// Asks for a media source (URL or local path) until a non-empty line
/// comes in. Returns `None` on end of input.
pub fn prompt_media_source() -> io::Result<Option<String>> {
    loop {
        print!("Enter a media URL (http/https) or a local file path: ");
        io::stdout().flush()?;

        let mut input = String::new();
        if io::stdin().read_line(&mut input)? == 0 {
            return Ok(None);
        }

        let trimmed = input.trim();
        if !trimmed.is_empty() {
            return Ok(Some(trimmed.to_string()));
        }
    }
}

fn parse_selection(input: &str, count: usize) -> Option<usize> {
    match input.trim().parse::<usize>() {
        Ok(idx) if idx < count => Some(idx),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_indexes_inside_the_list() {
        assert_eq!(parse_selection("0", 3), Some(0));
        assert_eq!(parse_selection("2\n", 3), Some(2));
        assert_eq!(parse_selection("  1  ", 3), Some(1));
    }

    #[test]
    fn rejects_out_of_range_indexes() {
        assert_eq!(parse_selection("3", 3), None);
        assert_eq!(parse_selection("99", 3), None);
    }

    #[test]
    fn rejects_non_numeric_input() {
        assert_eq!(parse_selection("", 3), None);
        assert_eq!(parse_selection("\n", 3), None);
        assert_eq!(parse_selection("abc", 3), None);
        assert_eq!(parse_selection("-1", 3), None);
        assert_eq!(parse_selection("1.5", 3), None);
    }

    #[test]
    fn single_entry_list_only_accepts_zero() {
        assert_eq!(parse_selection("0", 1), Some(0));
        assert_eq!(parse_selection("1", 1), None);
    }
}
