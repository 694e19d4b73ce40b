use anyhow::{anyhow, Result};
use clap::{crate_version, App, AppSettings, Arg, ArgGroup, ArgMatches, SubCommand};
use folio::article::DATE_FORMAT;
use folio::build::build_site;
use folio::config::Config;
use folio::manage::{self, NewArticle, Status};
use folio::util;
use std::path::Path;
use tracing::info;

fn app<'a, 'b>() -> App<'a, 'b> {
    let file_arg = Arg::with_name("FILE")
        .help("A document path, or a bare file name to look up in the managed directories")
        .required(true);
    App::new("folio")
        .version(crate_version!())
        .about("Regenerates the article listing and search index of a static portfolio site")
        .setting(AppSettings::SubcommandRequiredElseHelp)
        .arg(
            Arg::with_name("project")
                .long("project")
                .takes_value(true)
                .global(true)
                .help("Directory to search for folio.yaml (defaults to the working directory)"),
        )
        .subcommand(
            SubCommand::with_name("build").about("Rebuilds the listing pages and the search index"),
        )
        .subcommand(
            SubCommand::with_name("status").about("Lists articles and projects with their visibility"),
        )
        .subcommand(
            SubCommand::with_name("publish")
                .about("Makes a document public")
                .arg(file_arg.clone()),
        )
        .subcommand(
            SubCommand::with_name("unlist")
                .about("Keeps a document online but out of the listing and search")
                .arg(file_arg.clone()),
        )
        .subcommand(
            SubCommand::with_name("draft")
                .about("Moves a document into the drafts directory")
                .arg(file_arg),
        )
        .subcommand(
            SubCommand::with_name("new")
                .about("Creates a draft article from the authoring template")
                .arg(
                    Arg::with_name("title")
                        .long("title")
                        .takes_value(true)
                        .required(true),
                )
                .arg(
                    Arg::with_name("date")
                        .long("date")
                        .takes_value(true)
                        .help("Display date such as `Dec 05, 2025` (defaults to today)"),
                )
                .arg(
                    Arg::with_name("description")
                        .long("description")
                        .takes_value(true),
                )
                .arg(
                    Arg::with_name("MARKDOWN")
                        .help("The markdown file holding the article body")
                        .required(true),
                ),
        )
        .subcommand(
            SubCommand::with_name("backup").about("Archives the drafts directories into a zip file"),
        )
        .subcommand(
            SubCommand::with_name("section")
                .about("Hides or shows a section of the home page")
                .arg(Arg::with_name("ID").required(true))
                .arg(Arg::with_name("hide").long("hide"))
                .arg(Arg::with_name("show").long("show"))
                .group(
                    ArgGroup::with_name("mode")
                        .args(&["hide", "show"])
                        .required(true),
                ),
        )
}

fn load_config(matches: &ArgMatches) -> Result<Config> {
    // `--project` may come before or after the subcommand.
    let project = matches
        .value_of("project")
        .or_else(|| matches.subcommand().1.and_then(|m| m.value_of("project")));
    match project {
        Some(dir) => Config::from_directory(Path::new(dir)),
        None => Config::from_directory(&std::env::current_dir()?),
    }
}

fn required<'a>(matches: &'a ArgMatches, name: &str) -> Result<&'a str> {
    matches
        .value_of(name)
        .ok_or_else(|| anyhow!("Missing argument `{}`", name))
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let matches = app().get_matches();
    let config = load_config(&matches)?;

    match matches.subcommand() {
        ("build", _) => {
            let report = build_site(&config)?;
            info!(
                articles = report.articles,
                pages = report.pages.len(),
                index_entries = report.index_entries,
                "build complete"
            );
        }
        ("status", _) => {
            for entry in manage::status(&config)? {
                println!(
                    "{:<8} {:<8} {}  ({})",
                    entry.kind.to_string(),
                    entry.status.to_string(),
                    entry.title,
                    entry.path.display()
                );
            }
        }
        ("publish", Some(m)) => {
            manage::set_visibility(&config, Path::new(required(m, "FILE")?), Status::Public)?;
        }
        ("unlist", Some(m)) => {
            manage::set_visibility(&config, Path::new(required(m, "FILE")?), Status::Unlisted)?;
        }
        ("draft", Some(m)) => {
            manage::set_visibility(&config, Path::new(required(m, "FILE")?), Status::Private)?;
        }
        ("new", Some(m)) => {
            let markdown = util::read_to_string(Path::new(required(m, "MARKDOWN")?), "markdown")?;
            let path = manage::create_article(
                &config,
                &NewArticle {
                    title: required(m, "title")?.to_owned(),
                    description: m.value_of("description").unwrap_or_default().to_owned(),
                    date: match m.value_of("date") {
                        Some(date) => date.to_owned(),
                        None => chrono::Local::now().format(DATE_FORMAT).to_string(),
                    },
                    markdown,
                },
            )?;
            println!("{}", path.display());
        }
        ("backup", _) => {
            println!("{}", manage::backup_drafts(&config)?.display());
        }
        ("section", Some(m)) => {
            manage::toggle_section(&config, required(m, "ID")?, m.is_present("hide"))?;
        }
        (name, _) => return Err(anyhow!("Unknown command `{}`", name)),
    }
    Ok(())
}
