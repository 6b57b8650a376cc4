use crate::tokenizer::{Token, TokenKind};

/// Extract the anime title: the first run of unidentified free text.
///
/// Returns the index of the first title token along with the title.
pub fn extract_title(tokens: &[Token], identified: &[bool]) -> Option<(usize, String)> {
    collect_run(tokens, identified, 0)
}

/// Extract the episode title: the first run of unidentified free text after
/// the episode token.
pub fn extract_episode_title(
    tokens: &[Token],
    identified: &[bool],
    episode_index: Option<usize>,
) -> Option<String> {
    collect_run(tokens, identified, episode_index? + 1).map(|(_, title)| title)
}

fn collect_run(tokens: &[Token], identified: &[bool], from: usize) -> Option<(usize, String)> {
    let mut parts: Vec<&str> = Vec::new();
    let mut first = None;

    for (i, token) in tokens.iter().enumerate().skip(from) {
        let started = first.is_some();
        if identified[i] {
            if started {
                break;
            }
            continue;
        }

        match token.kind {
            TokenKind::FreeText if token.is_dash() => {
                if started {
                    break;
                }
            }
            TokenKind::FreeText => {
                first.get_or_insert(i);
                parts.push(&token.text);
            }
            TokenKind::Delimiter if started => parts.push(" "),
            _ => {
                if started {
                    break;
                }
            }
        }
    }

    let title = parts.concat().trim().to_string();
    match first {
        Some(index) if !title.is_empty() => Some((index, title)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokenizer::tokenize;

    #[test]
    fn test_title_stops_at_identified_token() {
        let (tokens, _) = tokenize("[Group] Sousou no Frieren - 05");
        let mut identified = vec![false; tokens.len()];
        identified[0] = true;
        let last = tokens.len() - 1;
        identified[last] = true;

        let (index, title) = extract_title(&tokens, &identified).unwrap();
        assert_eq!(index, 2);
        assert_eq!(title, "Sousou no Frieren");
    }

    #[test]
    fn test_episode_title_after_episode() {
        let (tokens, _) = tokenize("Frieren - 05 - The Journey's End");
        let episode_index = tokens.iter().position(|t| t.text == "05").unwrap();
        let mut identified = vec![false; tokens.len()];
        identified[episode_index] = true;

        let title = extract_episode_title(&tokens, &identified, Some(episode_index));
        assert_eq!(title.as_deref(), Some("The Journey's End"));
    }

    #[test]
    fn test_no_title() {
        let (tokens, _) = tokenize("[Group] - [720p]");
        let identified = vec![false; tokens.len()];
        assert!(extract_title(&tokens, &identified).is_none());
    }
}
