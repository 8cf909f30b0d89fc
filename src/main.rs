use clap::Parser;
use indexmap::IndexMap;
use std::path::PathBuf;
use std::sync::Arc;
use vitrine::{DEFAULT_GROUP, PatternUrlBuilder, Pi, Toc, TocEntry, TocServiceBuilder, ViewerError};

// Mimalloc keeps allocation cheap for the many small strings a large TOC holds.
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

/// Prints the table of contents of a record from a JSON dump of index documents.
#[derive(Parser, Debug)]
#[command(name = "vitrine", version, about)]
struct Args {
    /// JSON file holding an array of index documents.
    #[arg(long)]
    index: PathBuf,

    /// JSON file with the TOC configuration.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Persistent identifier of the record.
    #[arg(long)]
    pi: String,

    /// Page of volumes to show for anchors.
    #[arg(long, default_value_t = 1)]
    page: usize,

    /// Include sibling branches that are not on the path to the record.
    #[arg(long)]
    all_siblings: bool,

    /// Expand every entry before printing.
    #[arg(long)]
    expand_all: bool,

    /// Print the entries as JSON instead of an outline.
    #[arg(long)]
    json: bool,

    /// Label language for the outline.
    #[arg(long)]
    lang: Option<String>,

    /// Prefix for entry URLs.
    #[arg(long, default_value = "")]
    base_url: String,
}

fn main() -> Result<(), ViewerError> {
    env_logger::init();
    let args = Args::parse();

    let mut builder = TocServiceBuilder::new()
        .with_records_file(&args.index)?
        .with_urls(Arc::new(PatternUrlBuilder::new(args.base_url.as_str())));
    if let Some(config) = &args.config {
        builder = builder.with_config_file(config)?;
    }
    let service = builder.build();

    let toc = service.generate_toc_for_pi(&Pi::new(args.pi.as_str()), args.all_siblings, None, args.page)?;
    if args.expand_all {
        toc.expand_all();
    }

    if args.json {
        let mut groups: IndexMap<String, Vec<TocEntry>> = IndexMap::new();
        for name in toc.group_names() {
            let entries = toc.tree_view(&name)?;
            groups.insert(name, entries);
        }
        println!("{}", serde_json::to_string_pretty(&groups)?);
    } else {
        print_outline(&toc, args.lang.as_deref())?;
    }
    Ok(())
}

fn print_outline(toc: &Toc, lang: Option<&str>) -> Result<(), ViewerError> {
    for name in toc.group_names() {
        let entries = toc.visible_entries(&name)?;
        if name != DEFAULT_GROUP {
            println!("[{}]", name);
        } else if entries.is_empty() {
            println!("(empty)");
        }
        for entry in entries {
            let marker = match (entry.has_child, entry.expanded) {
                (false, _) => ' ',
                (true, true) => '-',
                (true, false) => '+',
            };
            let label = match lang {
                Some(lang) => entry.label_for(lang),
                None => entry.label.default_value(),
            };
            let page = entry
                .page_no_label
                .clone()
                .or_else(|| entry.page_no.map(|p| p.to_string()))
                .unwrap_or_default();
            println!(
                "{}{} {}  {}  {}",
                "  ".repeat(entry.level as usize),
                marker,
                label,
                page,
                entry.url
            );
        }
    }
    if toc.num_pages() > 1 {
        println!("page {} of {}", toc.current_page(), toc.num_pages());
    }
    Ok(())
}
