use folio::build::{build_site, Error};
use folio::config::Config;
use folio::search::SearchEntry;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

const LISTING: &str = r#"<!DOCTYPE html>
<html lang="en">
<head><title>Articles | Jane Doe</title></head>
<body>
<section class="articles-section">
    <h1>Articles</h1>
    <div class="articles-grid">
    </div>
</section>
</body>
</html>"#;

fn document(title: &str, date: &str, head: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="UTF-8">
<title>{title} | Jane Doe</title>
<meta name="description" content="About {title}.">
{head}
</head>
<body>
<article class="article-body">
<h1>{title}</h1>
<div class="article-meta-small">{date} • 5 min read</div>
<p>The body of the article goes on for a while.</p>
</article>
</body>
</html>"#,
        title = title,
        date = date,
        head = head
    )
}

/// Lays out a site with `n` dated articles (`Jan 01, 2024` onwards), one
/// unlisted article, and the authoring template.
fn site(n: usize) -> (TempDir, Config) {
    let dir = TempDir::new().unwrap();
    let root = dir.path();
    let articles = root.join("articles");
    fs::create_dir_all(&articles).unwrap();
    fs::write(root.join("folio.yaml"), "author: Jane Doe\n").unwrap();
    fs::write(root.join("articles.html"), LISTING).unwrap();
    fs::write(
        articles.join("template.html"),
        document("Article Title", "Jan 01, 2000", ""),
    )
    .unwrap();
    for i in 0..n {
        fs::write(
            articles.join(format!("article-{:02}.html", i)),
            document(&format!("Article {}", i), &format!("Jan {:02}, 2024", i + 1), ""),
        )
        .unwrap();
    }
    fs::write(
        articles.join("hidden.html"),
        document(
            "Hidden",
            "Dec 31, 2024",
            r#"<meta name="visibility" content="unlisted">"#,
        ),
    )
    .unwrap();
    let config = Config::from_directory(root).unwrap();
    (dir, config)
}

fn read(path: &Path) -> String {
    fs::read_to_string(path).unwrap()
}

fn index(config: &Config) -> Vec<SearchEntry> {
    serde_json::from_str(&read(&config.search_index)).unwrap()
}

#[test]
fn test_build_paginates_and_indexes() -> Result<(), Error> {
    let (dir, config) = site(11);
    let report = build_site(&config)?;
    assert_eq!(11, report.articles);
    assert_eq!(2, report.pages.len());

    let first = read(&dir.path().join("articles.html"));
    let second = read(&dir.path().join("articles-2.html"));
    assert_eq!(9, first.matches(r#"<article class="article-card">"#).count());
    assert_eq!(2, second.matches(r#"<article class="article-card">"#).count());
    assert!(first.contains("Page 1 of 2"));
    assert!(second.contains("Page 2 of 2"));
    assert!(first.contains(r#"href="articles-2.html""#));
    assert!(second.contains(r#"href="articles.html""#));

    // Newest first.
    let newest = first.find("<h3>Article 10</h3>").unwrap();
    let older = first.find("<h3>Article 9</h3>").unwrap();
    assert!(newest < older);
    assert!(second.contains("<h3>Article 0</h3>"));

    assert!(!first.contains("Hidden") && !second.contains("Hidden"));
    assert!(!first.contains("Article Title"));

    let entries = index(&config);
    assert_eq!(11 + config.search_extra.len(), entries.len());
    assert!(entries.iter().all(|entry| entry.title != "Hidden"));
    assert_eq!("articles/article-00.html", entries[0].url);
    assert_eq!("About Article 0.", entries[0].description);
    assert_eq!("Jan 01, 2024", entries[0].date);
    Ok(())
}

#[test]
fn test_rebuild_is_byte_identical() -> Result<(), Error> {
    let (dir, config) = site(11);
    build_site(&config)?;
    let first = read(&dir.path().join("articles.html"));
    let second = read(&dir.path().join("articles-2.html"));
    let search = read(&config.search_index);

    build_site(&config)?;
    assert_eq!(first, read(&dir.path().join("articles.html")));
    assert_eq!(second, read(&dir.path().join("articles-2.html")));
    assert_eq!(search, read(&config.search_index));
    assert_eq!(1, first.matches("Page 1 of 2").count());
    Ok(())
}

#[test]
fn test_shrinking_corpus_removes_stale_pages() -> Result<(), Error> {
    let (dir, config) = site(11);
    build_site(&config)?;
    assert!(dir.path().join("articles-2.html").exists());

    fs::remove_file(config.articles_directory.join("article-10.html")).unwrap();
    fs::remove_file(config.articles_directory.join("article-09.html")).unwrap();
    let report = build_site(&config)?;
    assert_eq!(1, report.pages.len());
    assert!(!dir.path().join("articles-2.html").exists());
    Ok(())
}

#[test]
fn test_empty_corpus() -> Result<(), Error> {
    let (dir, config) = site(0);
    let report = build_site(&config)?;
    assert_eq!(0, report.articles);
    assert_eq!(1, report.pages.len());

    let page = read(&dir.path().join("articles.html"));
    assert!(page.contains("Page 1 of 1"));
    assert!(!page.contains(r#"<article class="article-card">"#));
    assert!(!page.contains(">Previous<") && !page.contains(">Next<"));
    assert_eq!(config.search_extra, index(&config));
    Ok(())
}

#[test]
fn test_missing_template_writes_nothing() {
    let (dir, config) = site(3);
    fs::remove_file(dir.path().join("articles.html")).unwrap();

    assert!(build_site(&config).is_err());
    assert!(!dir.path().join("articles.html").exists());
    assert!(!config.search_index.exists());
}

#[test]
fn test_template_without_grid_writes_nothing() {
    let (dir, config) = site(3);
    fs::write(
        dir.path().join("articles.html"),
        "<html><body><p>No grid here.</p></body></html>",
    )
    .unwrap();

    assert!(matches!(build_site(&config), Err(Error::Render(_))));
    assert!(!config.search_index.exists());
}
