use std::fs;
use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

use metatree::{match_pattern, quote, subst, Binding, Env, Error, Tag, Tree};

#[derive(Parser)]
#[command(
    name = "metatree",
    version,
    about = "Syntax-tree templates: parse fragments, substitute, match"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Parse a source fragment and print its trees
    Parse {
        /// Input file with fragment text
        input: Option<PathBuf>,
        /// Inline fragment text instead of a file
        #[arg(short, long)]
        expr: Option<String>,
        /// Print trees as JSON
        #[arg(long)]
        json: bool,
    },
    /// Match a subject fragment against a pattern and print bindings
    Match {
        /// Pattern fragment with metavariables
        #[arg(short, long)]
        pattern: String,
        /// Input file with the subject fragment
        input: Option<PathBuf>,
        /// Inline subject text instead of a file
        #[arg(short, long)]
        expr: Option<String>,
        /// Print bindings as JSON
        #[arg(long)]
        json: bool,
    },
    /// Substitute bindings into a template fragment
    Subst {
        /// Template fragment with metavariables
        #[arg(short, long)]
        template: String,
        /// Bindings, `name=fragment` (prefix the name with '@' to bind
        /// the fragment's whole tree sequence as a group value)
        #[arg(value_name = "NAME=FRAGMENT")]
        bindings: Vec<String>,
        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() {
    let cli = Cli::parse();
    match cli.command {
        Command::Parse { input, expr, json } => {
            let (name, source) = read_source(input, expr);
            let trees = parse_or_exit(&source, &name);
            print_trees(&trees, json);
        }
        Command::Match {
            pattern,
            input,
            expr,
            json,
        } => {
            let pattern_tree = single(parse_or_exit(&pattern, "<pattern>"), "<pattern>");
            let (name, source) = read_source(input, expr);
            let subject = single(parse_or_exit(&source, &name), &name);
            match match_pattern(&pattern_tree, &subject) {
                Ok(Some(bindings)) => print_bindings(&bindings, json),
                Ok(None) => {
                    eprintln!("no match");
                    process::exit(1);
                }
                Err(e) => fail(e),
            }
        }
        Command::Subst {
            template,
            bindings,
            json,
        } => {
            let template_tree = single(parse_or_exit(&template, "<template>"), "<template>");
            let mut env = Env::new();
            for spec in &bindings {
                let (tag, binding) = parse_binding(spec);
                env.insert(tag, binding);
            }
            match subst(&template_tree, &env) {
                Ok(tree) => print_trees(std::slice::from_ref(&tree), json),
                Err(e) => fail(e),
            }
        }
    }
}

fn read_source(input: Option<PathBuf>, expr: Option<String>) -> (String, String) {
    match (input, expr) {
        (Some(path), None) => match fs::read_to_string(&path) {
            Ok(text) => (path.display().to_string(), text),
            Err(e) => {
                eprintln!("error: cannot read {}: {}", path.display(), e);
                process::exit(1);
            }
        },
        (None, Some(text)) => ("<expr>".to_string(), text),
        _ => {
            eprintln!("error: provide either an input file or --expr, not both");
            process::exit(1);
        }
    }
}

fn parse_or_exit(source: &str, name: &str) -> Vec<Tree> {
    match quote(source) {
        Ok(trees) => trees,
        Err(Error::Parse(e)) => {
            e.render(name, source);
            process::exit(1);
        }
        Err(e) => fail(e),
    }
}

fn single(mut trees: Vec<Tree>, name: &str) -> Tree {
    if trees.len() != 1 {
        eprintln!("error: {} must contain exactly one tree", name);
        process::exit(1);
    }
    trees.remove(0)
}

/// `name=fragment`, or `@name=fragment` for a group binding holding the
/// fragment's whole tree sequence.
fn parse_binding(spec: &str) -> (Tag, Binding) {
    let Some((name, fragment)) = spec.split_once('=') else {
        eprintln!("error: binding '{}' is not of the form name=fragment", spec);
        process::exit(1);
    };
    let (name, is_group) = match name.strip_prefix('@') {
        Some(rest) => (rest, true),
        None => (name, false),
    };
    let tag = match name.parse::<u64>() {
        Ok(n) => Tag::Num(n),
        Err(_) => Tag::Name(name.to_string()),
    };
    let trees = parse_or_exit(fragment, "<binding>");
    if is_group {
        (tag, Binding::Seq(trees))
    } else {
        (tag, Binding::One(single(trees, spec)))
    }
}

fn print_trees(trees: &[Tree], json: bool) {
    if json {
        println!("{}", serde_json::to_string_pretty(trees).expect("trees serialize"));
    } else {
        for tree in trees {
            println!("{}", tree);
        }
    }
}

fn print_bindings(bindings: &Env, json: bool) {
    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(bindings).expect("bindings serialize")
        );
    } else {
        for (tag, binding) in bindings.iter() {
            println!("{} = {}", tag, binding);
        }
    }
}

fn fail(e: Error) -> ! {
    eprintln!("error: {}", e);
    process::exit(1);
}
