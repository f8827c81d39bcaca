use beamer_reveal::{
    convert_document, convert_document_with, convert_glob, render_page, BeamerError, ChartMap, Config,
    ConvertOptions, LatexTreeBuilder, Node, OutputFormat, Result, TreeBuilder, TITLE_SLIDE,
};
use std::fs;
use std::sync::atomic::{AtomicUsize, Ordering};
use tempfile::TempDir;

/// Delegates to the bundled builder and counts calls.
struct CountingBuilder {
    calls: AtomicUsize,
}

impl TreeBuilder for CountingBuilder {
    fn build(&self, source: &str) -> Result<Vec<Node>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        LatexTreeBuilder.build(source)
    }
}

fn numbered_deck(frames: usize) -> String {
    let mut deck = String::from("\\title{Numbers}\n\\begin{document}\n\\begin{frame}\\titlepage\\end{frame}\n");
    for i in 1..=frames {
        deck.push_str(&format!(
            "\\begin{{frame}}{{Frame {i}}}\n\\begin{{itemize}}\\item value $x_{{{i}}}$\\end{{itemize}}\n\\end{{frame}}\n"
        ));
    }
    deck.push_str("\\end{document}\n");
    deck
}

#[test]
fn test_large_deck_keeps_source_order() {
    let result = convert_document(&numbered_deck(40), &ConvertOptions::default());

    assert_eq!(result.metadata.title, "Numbers");
    assert_eq!(result.sections.len(), 41);
    assert_eq!(result.sections[0], TITLE_SLIDE);
    for i in 1..=40 {
        let section = &result.sections[i];
        assert!(section.contains(&format!("<h2>Frame {}</h2>", i)), "out of order: {}", section);
        assert!(section.contains(&format!("\\(x_{{{}}}\\)", i)));
    }
}

#[test]
fn test_custom_tree_builder_is_plugged_in() {
    let builder = CountingBuilder {
        calls: AtomicUsize::new(0),
    };
    let result = convert_document_with(&numbered_deck(3), &ConvertOptions::default(), &builder);

    assert_eq!(result.sections.len(), 4);
    assert!(builder.calls.load(Ordering::SeqCst) >= 1);
}

#[test]
fn test_batch_and_page_assembly() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    for (lecture, frames) in [("L01", 2), ("L02", 5), ("L03", 1)] {
        let dir = temp_dir.path().join(lecture);
        fs::create_dir_all(&dir).expect("Failed to create lecture dir");
        fs::write(dir.join("slides.tex"), numbered_deck(frames)).expect("Failed to write deck");
    }

    let config = Config::default();
    let pattern = format!("{}/*/slides.tex", temp_dir.path().display());
    let items = convert_glob(&pattern, &config, &ChartMap::new()).expect("batch runs");

    let counts: Vec<usize> = items
        .iter()
        .map(|item| item.outcome.as_ref().expect("converted").sections.len())
        .collect();
    assert_eq!(counts, vec![3, 6, 2]);

    let result = items[1].outcome.as_ref().expect("converted");
    let page = render_page(result, &config.get_page_options());
    assert!(page.contains("<h1>Numbers</h1>"));
    assert!(!page.contains(TITLE_SLIDE));
    assert_eq!(OutputFormat::Html.extension(), "html");
}

#[test]
fn test_broken_file_does_not_block_batch() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    fs::write(temp_dir.path().join("a.tex"), numbered_deck(1)).expect("Failed to write deck");
    fs::write(
        temp_dir.path().join("b.tex"),
        "\\begin{frame}{Broken}\\textbf{oops\\end{frame}\n\\begin{frame}{Fine}ok\\end{frame}",
    )
    .expect("Failed to write deck");

    let pattern = format!("{}/*.tex", temp_dir.path().display());
    let items = convert_glob(&pattern, &Config::default(), &ChartMap::new()).expect("batch runs");

    assert_eq!(items.len(), 2);
    let broken = items[1].outcome.as_ref().expect("fallback still converts");
    assert!(broken.degraded);
    assert_eq!(broken.sections.len(), 2);
    assert!(broken.sections[1].contains("<h2>Fine</h2>"));
}

#[test]
fn test_invalid_chart_map_is_reported() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let chart_map = temp_dir.path().join("charts.json");
    fs::write(&chart_map, "[1, 2").expect("Failed to write chart map");

    let err = Config::default().load_chart_map(Some(&chart_map)).unwrap_err();
    assert!(matches!(err, BeamerError::JsonError(_)));
}
