use docrag_core::chunker::chunk_with_window;
use docrag_core::config::expand_path;

#[test]
fn boundary_window_is_tunable() {
    // A period sits 150 chars before the cut; the default 100-char scan
    // would miss it, a 200-char scan finds it.
    let mut text = "Lead sentence ends here.".to_string();
    text.push_str(&"x".repeat(150));
    text.push_str(&"y".repeat(200));

    let narrow = chunk_with_window(&text, 170, 0, 100).expect("chunk");
    assert_eq!(narrow[0].end, 170, "hard cut when the scan misses the period");

    let wide = chunk_with_window(&text, 170, 0, 200).expect("chunk");
    assert_eq!(wide[0].end, 24, "cut snaps to just past the period");
    assert!(wide[0].text.ends_with('.'));
}

#[test]
fn expand_path_passes_plain_paths_through() {
    assert_eq!(expand_path("relative/dir"), std::path::PathBuf::from("relative/dir"));
    assert_eq!(expand_path("/abs/dir"), std::path::PathBuf::from("/abs/dir"));
}
