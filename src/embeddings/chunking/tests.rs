use super::*;

fn numbered_words(count: usize) -> String {
    (0..count)
        .map(|i| format!("w{}", i))
        .collect::<Vec<_>>()
        .join(" ")
}

#[test]
fn short_text_is_single_normalized_chunk() {
    let text = "  Hostel fees are\n\teighty   thousand rupees per year.  ";
    let chunks = chunk_text(text, 500, 50);

    assert_eq!(
        chunks,
        vec!["Hostel fees are eighty thousand rupees per year.".to_string()]
    );
}

#[test]
fn text_of_exactly_chunk_size_is_one_chunk() {
    let text = numbered_words(500);
    let chunks = chunk_text(&text, 500, 50);

    assert_eq!(chunks.len(), 1);
    assert_eq!(chunks[0], text);
}

#[test]
fn thousand_words_yield_three_windows() {
    let text = numbered_words(1000);
    let chunks = chunk_content(&text, &ChunkingConfig::default());

    let offsets: Vec<usize> = chunks.iter().map(|c| c.word_offset).collect();
    assert_eq!(offsets, vec![0, 450, 900]);

    assert!(chunks[0].content.starts_with("w0 "));
    assert!(chunks[1].content.starts_with("w450 "));
    assert!(chunks[2].content.starts_with("w900 "));
    assert!(chunks[2].content.ends_with("w999"));

    assert_eq!(chunks[0].content.split_whitespace().count(), 500);
    assert_eq!(chunks[2].content.split_whitespace().count(), 100);

    let indices: Vec<usize> = chunks.iter().map(|c| c.chunk_index).collect();
    assert_eq!(indices, vec![0, 1, 2]);
}

#[test]
fn consecutive_chunks_share_overlap_words() {
    let text = numbered_words(30);
    let chunks = chunk_text(&text, 10, 3);

    for pair in chunks.windows(2) {
        let first: Vec<&str> = pair[0].split_whitespace().collect();
        let second: Vec<&str> = pair[1].split_whitespace().collect();
        if first.len() == 10 {
            assert_eq!(&first[7..], &second[..3]);
        }
    }
}

#[test]
fn chunk_count_matches_window_formula() {
    for n in [1, 49, 50, 451, 499, 500, 501, 950, 951, 1000, 1401, 2000] {
        let text = numbered_words(n);
        let chunks = chunk_text(&text, 500, 50);
        let expected = n.saturating_sub(50).div_ceil(450).max(1);
        assert_eq!(chunks.len(), expected, "word count {}", n);
    }
}

#[test]
fn empty_text_returned_unchanged() {
    assert_eq!(chunk_text("", 500, 50), vec![String::new()]);
    assert_eq!(chunk_text("   \n ", 500, 50), vec!["   \n ".to_string()]);
}

#[test]
fn overlap_not_smaller_than_chunk_size_clamps_step() {
    let text = numbered_words(5);

    let chunks = chunk_text(&text, 3, 3);
    assert_eq!(chunks, vec!["w0 w1 w2", "w1 w2 w3", "w2 w3 w4"]);

    let chunks = chunk_text(&text, 3, 10);
    assert_eq!(chunks.len(), 3);
}

#[test]
fn zero_chunk_size_treated_as_one_word() {
    let chunks = chunk_text("a b c", 0, 0);
    assert_eq!(chunks, vec!["a", "b", "c"]);
}

#[test]
fn step_is_clamped() {
    let config = ChunkingConfig {
        chunk_size: 10,
        overlap: 12,
        ..ChunkingConfig::default()
    };
    assert_eq!(config.step(), 1);
    assert_eq!(ChunkingConfig::default().step(), 450);
}

#[test]
fn min_length_filter() {
    let config = ChunkingConfig::default();

    assert!(!config.is_indexable("tiny chunk"));
    assert!(!config.is_indexable(&format!("  {}  ", "x".repeat(50))));
    assert!(config.is_indexable(&"x".repeat(51)));
}
