use clap::Parser;
use rayon::prelude::*;
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use stylesnap_lib::{transform, JsonExtraction, Preprocessor, TransformOptions};

const STYLESNAP_INTRO: &str = r#"
       _         _
   ___| |_ _   _| | ___  ___ _ __   __ _ _ __
  / __| __| | | | |/ _ \/ __| '_ \ / _` | '_ \
  \__ \ |_| |_| | |  __/\__ \ | | | (_| | |_) |
  |___/\__|\__, |_|\___||___/_| |_|\__,_| .__/
           |___/                        |_|

    stylesnap - zero-runtime CSS extraction
"#;

#[derive(Parser)]
#[command(name = "stylesnap")]
#[command(about = "Write the styles extracted from source files out as stylesheets")]
struct Args {
    /// Source files to process.
    #[arg(required = true)]
    sources: Vec<PathBuf>,

    /// Directory the stylesheets and rewritten sources are written to.
    #[arg(short, long, default_value = "dist")]
    out_dir: PathBuf,

    /// `nesting` (default) or `none`.
    #[arg(short, long, default_value = "nesting")]
    preprocessor: Preprocessor,

    /// Suffix of the extraction document saved next to each source file.
    #[arg(long, default_value = ".styles.json")]
    extraction_suffix: String,

    /// Don't print the banner.
    #[arg(short, long)]
    quiet: bool,
}

enum Outcome {
    Extracted { rules: usize, css: PathBuf },
    Skipped,
}

/// Where one source's stylesheet, map and rewritten code go.
#[derive(Debug, Clone, PartialEq, Eq)]
struct OutputPaths {
    css: PathBuf,
    css_map: PathBuf,
    code: PathBuf,
}

impl OutputPaths {
    fn for_source(source: &Path, out_dir: &Path) -> Result<Self, String> {
        let file_name = source
            .file_name()
            .ok_or_else(|| "source path has no file name".to_string())?;
        let code = out_dir.join(file_name);
        let css = code.with_extension("css");
        Ok(OutputPaths {
            css_map: css.with_extension("css.map"),
            css,
            code,
        })
    }

    fn all(&self) -> [&PathBuf; 3] {
        [&self.css, &self.css_map, &self.code]
    }
}

/// Works out every source's outputs up front.
///
/// A source is refused when one of its outputs is an input file, or when another source
/// would write the same output. `canonical` resolves a path for comparison.
fn plan_outputs<F>(sources: &[PathBuf], out_dir: &Path, canonical: F) -> Vec<Result<OutputPaths, String>>
where
    F: Fn(&Path) -> PathBuf,
{
    let inputs: HashSet<PathBuf> = sources.iter().map(|source| canonical(source)).collect();
    let out_dir = canonical(out_dir);

    let planned: Vec<Result<OutputPaths, String>> = sources
        .iter()
        .map(|source| OutputPaths::for_source(source, &out_dir))
        .collect();

    let mut writers: HashMap<&PathBuf, usize> = HashMap::new();
    for paths in planned.iter().flatten() {
        for path in paths.all() {
            *writers.entry(path).or_default() += 1;
        }
    }

    planned
        .iter()
        .map(|paths| {
            let paths = paths.clone()?;
            for path in paths.all() {
                if inputs.contains(path) {
                    return Err(format!("refusing to overwrite input {}", path.display()));
                }
                if writers.get(path).copied().unwrap_or_default() > 1 {
                    return Err(format!("{} would also be written for another input", path.display()));
                }
            }
            Ok(paths)
        })
        .collect()
}

/// Points the stylesheet at its map so browsers and devtools pick it up.
fn link_source_map(css: &str, map_path: &Path) -> String {
    let map_name = map_path
        .file_name()
        .map(|name| name.to_string_lossy())
        .unwrap_or_default();
    format!("{}/*# sourceMappingURL={} */\n", css, map_name)
}

fn main() {
    env_logger::init();

    // parse the args given in terminal
    let args: Args = Args::parse();
    if !args.quiet {
        println!("{}", STYLESNAP_INTRO);
    }

    if let Err(e) = fs::create_dir_all(&args.out_dir) {
        eprintln!("Error creating {}: {}", args.out_dir.display(), e);
        std::process::exit(1);
    }

    let plans = plan_outputs(&args.sources, &args.out_dir, |path| {
        fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
    });

    // Every file gets its own options, so parallel runs never share rebasing state.
    let outcomes: Vec<(&PathBuf, Result<Outcome, String>)> = args
        .sources
        .par_iter()
        .zip(plans.par_iter())
        .map(|(source, plan)| {
            let outcome = plan
                .clone()
                .and_then(|paths| process_file(source, &paths, &args));
            (source, outcome)
        })
        .collect();

    let mut failed = 0;
    for (source, outcome) in outcomes {
        match outcome {
            Ok(Outcome::Extracted { rules, css }) => {
                println!("{}: {} rules -> {}", source.display(), rules, css.display())
            }
            Ok(Outcome::Skipped) => println!("{}: nothing to extract", source.display()),
            Err(e) => {
                failed += 1;
                log::error!("{}: {}", source.display(), e);
                eprintln!("Error processing {}: {}", source.display(), e);
            }
        }
    }

    if failed > 0 {
        std::process::exit(1);
    }
}

fn process_file(source: &Path, paths: &OutputPaths, args: &Args) -> Result<Outcome, String> {
    let code = fs::read_to_string(source).map_err(|e| format!("reading source: {}", e))?;

    let extraction_path = PathBuf::from(format!("{}{}", source.display(), args.extraction_suffix));
    let document = match fs::read_to_string(&extraction_path) {
        Ok(document) => document,
        // No document means the syntax transform found nothing in this file.
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => "null".to_string(),
        Err(e) => return Err(format!("reading {}: {}", extraction_path.display(), e)),
    };

    let options = TransformOptions::new(source.to_string_lossy())
        .output_filename(paths.css.to_string_lossy())
        .preprocessor(args.preprocessor.clone());

    let result = transform(&code, &options, &JsonExtraction::new(document))
        .map_err(|e| e.to_string())?;
    if !result.is_extracted() {
        return Ok(Outcome::Skipped);
    }

    let write = |path: &Path, contents: &str| {
        fs::write(path, contents).map_err(|e| format!("writing {}: {}", path.display(), e))
    };

    let css_map = result.css_source_map().map_err(|e| e.to_string())?;
    if css_map.is_empty() {
        write(&paths.css, result.css_text())?;
    } else {
        write(&paths.css, &link_source_map(result.css_text(), &paths.css_map))?;
        write(&paths.css_map, &css_map)?;
    }
    write(&paths.code, &result.code)?;

    Ok(Outcome::Extracted {
        rules: result.rules.len(),
        css: paths.css.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plan(sources: &[&str], out_dir: &str) -> Vec<Result<OutputPaths, String>> {
        let sources: Vec<PathBuf> = sources.iter().map(PathBuf::from).collect();
        plan_outputs(&sources, Path::new(out_dir), Path::to_path_buf)
    }

    #[test]
    fn test_outputs_land_in_out_dir() {
        let plans = plan(&["/proj/src/card.js"], "/proj/dist");
        assert_eq!(
            plans,
            vec![Ok(OutputPaths {
                css: PathBuf::from("/proj/dist/card.css"),
                css_map: PathBuf::from("/proj/dist/card.css.map"),
                code: PathBuf::from("/proj/dist/card.js"),
            })]
        );
    }

    #[test]
    fn test_refuses_to_overwrite_the_source() {
        let plans = plan(&["/proj/src/card.js"], "/proj/src");
        assert_eq!(
            plans,
            vec![Err("refusing to overwrite input /proj/src/card.js".to_string())]
        );
    }

    #[test]
    fn test_same_file_name_from_two_directories_is_refused() {
        let plans = plan(&["/proj/src/a.js", "/proj/lib/a.js", "/proj/src/b.js"], "/proj/out");
        assert!(plans[0].is_err(), "got {:?}", plans[0]);
        assert!(plans[1].is_err(), "got {:?}", plans[1]);
        assert!(plans[2].is_ok(), "got {:?}", plans[2]);
    }

    #[test]
    fn test_stylesheet_links_its_map() {
        let css = link_source_map(".a{color:red}\n", Path::new("/proj/dist/card.css.map"));
        assert_eq!(css, ".a{color:red}\n/*# sourceMappingURL=card.css.map */\n");
    }
}
