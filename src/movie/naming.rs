/// Characters a media server or file system may choke on in folder names
const FORBIDDEN_CHARS: &[char] = &['\\', ':', '*', '?', '"', '<', '>', '|', '.', '/', '!'];

pub fn sanitize_title(title: &str) -> String {
    title.chars().filter(|c| !FORBIDDEN_CHARS.contains(c)).collect()
}

/// Build a Jellyfin style folder name, e.g.
/// `The Shawshank Redemption (1994) [imdbid-0111161]`
pub fn folder_name(title: &str, year: i32, external_id: Option<&str>) -> String {
    let base = format!("{} ({})", sanitize_title(title), year);
    match external_id.filter(|id| !id.is_empty()) {
        Some(id) => format!("{} [imdbid-{}]", base, id),
        None => base,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_strips_every_forbidden_char() {
        assert_eq!(sanitize_title(r#"a\b:c*d?e"f<g>h|i.j/k!l"#), "abcdefghijkl");
    }

    #[test]
    fn test_sanitize_keeps_apostrophes_and_spaces() {
        assert_eq!(
            sanitize_title("Se7en: Director's Cut"),
            "Se7en Director's Cut"
        );
        assert_eq!(sanitize_title("Mr. & Mrs. Smith"), "Mr & Mrs Smith");
        assert_eq!(sanitize_title("Amélie"), "Amélie");
    }

    #[test]
    fn test_folder_name_with_id() {
        assert_eq!(
            folder_name("The Shawshank Redemption", 1994, Some("0111161")),
            "The Shawshank Redemption (1994) [imdbid-0111161]"
        );
        assert_eq!(
            folder_name("Inception", 2010, Some("1375666")),
            "Inception (2010) [imdbid-1375666]"
        );
    }

    #[test]
    fn test_folder_name_without_id() {
        assert_eq!(folder_name("Heat", 1995, None), "Heat (1995)");
        assert_eq!(folder_name("Heat", 1995, Some("")), "Heat (1995)");
    }

    #[test]
    fn test_folder_name_sanitizes_title() {
        assert_eq!(
            folder_name("What?! A Movie.", 2001, Some("1")),
            "What A Movie (2001) [imdbid-1]"
        );
    }
}
