//! `[Source i]` labels used to ground answers in retrieved evidence.

use std::sync::LazyLock;

use regex::Regex;

static CITATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\[source\s+(\d+)\]").expect("citation pattern is valid"));

/// Label placed in front of the `index`-th evidence passage.
pub fn source_label(index: usize) -> String {
    format!("[Source {index}]")
}

/// Distinct cited indices in order of first appearance.
pub fn extract_citations(text: &str) -> Vec<usize> {
    let mut cited = Vec::new();
    for caps in CITATION.captures_iter(text) {
        let Some(index) = caps.get(1).and_then(|m| m.as_str().parse::<usize>().ok()) else {
            continue;
        };
        if !cited.contains(&index) {
            cited.push(index);
        }
    }
    cited
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_in_order_without_duplicates() {
        let text = "Refunds take 14 days [Source 1]. Store credit is offered [Source 0] [source 1].";
        assert_eq!(extract_citations(text), vec![1, 0]);
    }

    #[test]
    fn ignores_malformed_labels() {
        assert!(extract_citations("[Source x] [Src 2] Source 3").is_empty());
    }

    #[test]
    fn label_round_trips() {
        assert_eq!(extract_citations(&source_label(7)), vec![7]);
    }
}
