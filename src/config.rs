//! Loads the `folio.yaml` project file and resolves it into a [`Config`].
//! Every key in the project file is optional; a site laid out the way the
//! defaults expect can use an empty file.

use crate::search::SearchEntry;
use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// The name of the project file searched for by [`Config::from_directory`].
pub const PROJECT_FILE: &str = "folio.yaml";

#[derive(Deserialize)]
struct PageSize(usize);
impl Default for PageSize {
    fn default() -> Self {
        PageSize(9)
    }
}

#[derive(Deserialize, Default)]
#[serde(default, deny_unknown_fields)]
struct Theme {
    card_template: Option<PathBuf>,
    pagination_template: Option<PathBuf>,
}

#[derive(Deserialize, Default)]
#[serde(default, deny_unknown_fields)]
struct Project {
    articles_directory: Option<String>,
    projects_directory: Option<PathBuf>,
    drafts_directory: Option<PathBuf>,
    backups_directory: Option<PathBuf>,
    article_template: Option<PathBuf>,
    listing_page: Option<String>,
    listing_template: Option<PathBuf>,
    home_page: Option<PathBuf>,
    search_index: Option<PathBuf>,
    index_page_size: PageSize,
    author: String,
    theme: Theme,
    search_extra: Option<Vec<SearchEntry>>,
}

/// Resolved configuration for one site. Built once by the binary and passed
/// by reference into every component; all paths are absolute (or relative to
/// the process working directory when the root was given that way).
#[derive(Clone, Debug)]
pub struct Config {
    /// The site root. Listing pages and the search index are written here.
    pub root_directory: PathBuf,

    /// The directory holding public article documents (the corpus).
    pub articles_directory: PathBuf,

    /// Site-root-relative prefix for article links, e.g. `articles`.
    pub article_url_prefix: String,

    /// The directory holding public project pages.
    pub projects_directory: PathBuf,

    /// Private (unpublished) articles.
    pub article_drafts_directory: PathBuf,

    /// Private (unpublished) project pages.
    pub project_drafts_directory: PathBuf,

    /// Where `folio backup` writes its archives of the drafts.
    pub backups_directory: PathBuf,

    /// The authoring template. It lives in the articles directory and is
    /// never treated as an article.
    pub article_template: PathBuf,

    /// The document the listing pages are rendered from.
    pub listing_template: PathBuf,

    /// File name of the first listing page. Later pages insert `-N` before
    /// the extension.
    pub listing_page: String,

    /// The site's home page, used by section toggling.
    pub home_page: PathBuf,

    /// Output path of the search index.
    pub search_index: PathBuf,

    /// Number of cards per listing page.
    pub index_page_size: usize,

    /// Appended to new article titles as `{title} | {author}`.
    pub author: String,

    /// Optional theme override for the card fragment template.
    pub card_template: Option<PathBuf>,

    /// Optional theme override for the pagination fragment template.
    pub pagination_template: Option<PathBuf>,

    /// Search entries for pages that aren't articles.
    pub search_extra: Vec<SearchEntry>,
}

impl Config {
    /// Searches `dir` and then each of its ancestors for a `folio.yaml` and
    /// loads the first one found.
    pub fn from_directory(dir: &Path) -> Result<Config> {
        let path = dir.join(PROJECT_FILE);
        if path.exists() {
            Config::from_project_file(&path)
                .with_context(|| format!("Loading configuration `{}`", path.display()))
        } else {
            match dir.parent() {
                Some(parent) => Config::from_directory(parent),
                None => Err(anyhow!(
                    "Could not find `{}` in any parent directory",
                    PROJECT_FILE
                )),
            }
        }
    }

    /// Loads a specific project file. The file's directory is the site root.
    pub fn from_project_file(path: &Path) -> Result<Config> {
        use crate::util::read_to_string;
        let contents = read_to_string(path, "project")?;
        let project: Project = match contents.trim().is_empty() {
            true => Project::default(),
            false => serde_yaml::from_str(&contents)?,
        };
        match path.parent() {
            None => Err(anyhow!(
                "Can't get parent directory for provided project file path '{:?}'",
                path
            )),
            Some(root) => Config::resolve(root, project),
        }
    }

    /// The configuration for a site at `root` with every setting at its
    /// default.
    pub fn with_root(root: &Path) -> Result<Config> {
        Config::resolve(root, Project::default())
    }

    fn resolve(root: &Path, project: Project) -> Result<Config> {
        let articles = project
            .articles_directory
            .unwrap_or_else(|| String::from("articles"));
        let article_url_prefix = articles.trim_matches('/').to_owned();
        let articles_directory = root.join(&article_url_prefix);
        let drafts_directory = root.join(
            project
                .drafts_directory
                .unwrap_or_else(|| PathBuf::from("backend/drafts")),
        );
        let listing_page = project
            .listing_page
            .unwrap_or_else(|| String::from("articles.html"));
        if !listing_page.ends_with(".html") || listing_page.len() == ".html".len() {
            return Err(anyhow!(
                "`listing_page` must be an `.html` file name, got `{}`",
                listing_page
            ));
        }
        if project.index_page_size.0 < 1 {
            return Err(anyhow!("`index_page_size` must be at least 1"));
        }

        Ok(Config {
            root_directory: root.to_owned(),
            article_template: match project.article_template {
                Some(path) => root.join(path),
                None => articles_directory.join(crate::parser::TEMPLATE_FILE_NAME),
            },
            articles_directory,
            article_url_prefix,
            projects_directory: root.join(
                project
                    .projects_directory
                    .unwrap_or_else(|| PathBuf::from("projects")),
            ),
            article_drafts_directory: drafts_directory.join("articles"),
            project_drafts_directory: drafts_directory.join("projects"),
            backups_directory: root.join(
                project
                    .backups_directory
                    .unwrap_or_else(|| PathBuf::from("backend/backups")),
            ),
            listing_template: root.join(
                project
                    .listing_template
                    .unwrap_or_else(|| PathBuf::from(&listing_page)),
            ),
            listing_page,
            home_page: root.join(
                project
                    .home_page
                    .unwrap_or_else(|| PathBuf::from("index.html")),
            ),
            search_index: root.join(
                project
                    .search_index
                    .unwrap_or_else(|| PathBuf::from("search.json")),
            ),
            index_page_size: project.index_page_size.0,
            author: project.author,
            card_template: project.theme.card_template.map(|p| root.join(p)),
            pagination_template: project
                .theme
                .pagination_template
                .map(|p| root.join(p)),
            search_extra: project
                .search_extra
                .unwrap_or_else(crate::search::default_extra_entries),
        })
    }
}
