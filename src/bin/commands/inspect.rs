use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use prettytable::{Table, format, row};

use surface_forge::bundle::{Bundle, BundleArray, load_adjacency};

/// Report-only command listing the contents of a bundle.
#[derive(Debug, Args)]
pub struct InspectArgs {
    /// Bundle archive (`<id>_data.npz`).
    #[arg(value_name = "BUNDLE")]
    pub bundle: PathBuf,
}

pub fn run(args: &InspectArgs) -> Result<()> {
    let bundle = Bundle::load(&args.bundle)
        .with_context(|| format!("Failed to read bundle {}", args.bundle.display()))?;
    let mut stdout = io::stdout().lock();

    print_boxed_label(&mut stdout, &format!("Bundle '{}'", bundle.name()))?;

    let mut arrays = Table::new();
    arrays.set_format(*format::consts::FORMAT_BOX_CHARS);
    arrays.set_titles(row!["Array", "Type", "Shape", "Preview"]);
    for (key, array) in bundle.iter() {
        arrays.add_row(row![key, array.dtype(), format!("{:?}", array.shape()), preview(array)]);
    }
    arrays.print(&mut stdout).context("Failed to render array table")?;
    writeln!(&mut stdout)?;

    let mut summary = Table::new();
    summary.set_format(*format::consts::FORMAT_BOX_CHARS);
    summary.set_titles(row!["Group", "Summary"]);
    match bundle.num_vertices() {
        Some(n) => summary.add_row(row!["Vertices", n]),
        None => summary.add_row(row!["Geometry", "absent"]),
    };
    if let Some(features) = bundle.features()? {
        summary.add_row(row!["Features", features.names().join(", ")]);
    }
    for name in bundle.label_names() {
        if let Some(labels) = bundle.labels(&name)? {
            let counts: Vec<String> = labels
                .classes
                .iter()
                .zip(labels.class_counts())
                .map(|(class, count)| format!("{}={}", class, count))
                .collect();
            summary.add_row(row![
                format!("Labels {}", name),
                format!("{}; masked={}", counts.join(", "), labels.num_masked())
            ]);
        }
    }
    if let Some(path) = adjacency_sibling(&args.bundle)
        && path.exists()
    {
        let neighbors = load_adjacency(&path)
            .with_context(|| format!("Failed to read adjacency {}", path.display()))?;
        let edges: usize = neighbors.iter().map(Vec::len).sum::<usize>() / 2;
        summary.add_row(row!["Adjacency", format!("{} vertices, {} edges", neighbors.len(), edges)]);
    }
    summary.print(&mut stdout).context("Failed to render summary table")?;

    Ok(())
}

/// `<id>_adj.npz` next to `<id>_data.npz`.
fn adjacency_sibling(bundle: &std::path::Path) -> Option<PathBuf> {
    let name = bundle.file_name()?.to_str()?;
    let stem = name.strip_suffix("_data.npz")?;
    Some(bundle.with_file_name(format!("{}_adj.npz", stem)))
}

fn preview(array: &BundleArray) -> String {
    const MAX_CHARS: usize = 48;
    let text = match array {
        BundleArray::Text(s) => s.lines().collect::<Vec<_>>().join(", "),
        _ => return String::new(),
    };
    if text.chars().count() > MAX_CHARS {
        format!("{}…", text.chars().take(MAX_CHARS).collect::<String>())
    } else {
        text
    }
}

fn print_boxed_label<W: Write>(writer: &mut W, title: &str) -> io::Result<()> {
    let inner = format!(" {title} ");
    let width = inner.chars().count();
    writeln!(writer, "╭{}╮", "─".repeat(width))?;
    writeln!(writer, "│{}│", inner)?;
    writeln!(writer, "╰{}╯", "─".repeat(width))?;
    Ok(())
}
