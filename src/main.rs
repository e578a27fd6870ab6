//! Formula evolution CLI - Evolve, validate and analyze name-to-visual formulas.

#[cfg(feature = "dhat-heap")]
#[global_allocator]
static ALLOC: dhat::Alloc = dhat::Alloc;

use std::fmt::Display;
use std::path::Path;
use std::process;
use std::time::Instant;

use serde::Serialize;

use formula_evolution::{
    compute::{
        ConvergenceAnalyzer, FormulaEngine, FormulaValidator, RunArchive,
        evolution::{evolve_with_callback, load_history},
    },
    domain::{DomainLoader, InMemoryDomains, JsonDomainLoader, SyntheticDomain},
    schema::{
        EvolutionConfig, EvolutionHistory, FormulaFamily, PopulationConfig, ValidationConfig, keys,
    },
};

fn main() {
    #[cfg(feature = "dhat-heap")]
    let _profiler = dhat::Profiler::new_heap();

    env_logger::init();

    let args: Vec<String> = std::env::args().collect();

    match args.get(1).map(String::as_str) {
        Some("--example") => print_json(&EvolutionConfig::default()),
        Some("evolve") if args.len() >= 4 => run_evolve(&args[2..]),
        Some("validate") if args.len() >= 4 => run_validate(&args[2], &args[3]),
        Some("analyze") if args.len() >= 3 => run_analyze(&args[2]),
        Some("compare") if args.len() >= 3 => run_compare(&args[2..]),
        Some("demo") => run_demo(),
        _ => {
            print_usage(&args[0]);
            process::exit(1);
        }
    }
}

fn print_usage(program: &str) {
    eprintln!("Usage: {program} <command> [args]");
    eprintln!();
    eprintln!("Evolve, validate and analyze name-to-visual formulas.");
    eprintln!();
    eprintln!("Commands:");
    eprintln!("  evolve <family> <domains-dir> [population] [generations]");
    eprintln!("                              Evolve a formula family (default 50 x 50)");
    eprintln!("  validate <formula-id> <domains-dir>");
    eprintln!("                              Cross-domain report for a canonical formula");
    eprintln!("  analyze <history.json>      Convergence signature of one run");
    eprintln!("  compare <history.json>...   Patterns shared across formula types");
    eprintln!("  demo                        Evolve and analyze on synthetic domains");
    eprintln!("  --example                   Print the default evolution configuration");
    eprintln!();
    eprintln!("Domain directories hold one <domain>.json array of entities per domain.");
    eprintln!("Results are printed as JSON on stdout; RUST_LOG controls log output.");
}

/// Print an error and exit.
fn fail(context: &str, error: impl Display) -> ! {
    eprintln!("Error {context}: {error}");
    process::exit(1);
}

fn print_json<T: Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{json}"),
        Err(e) => fail("serializing output", e),
    }
}

fn domains_in(loader: &JsonDomainLoader) -> Vec<String> {
    let domains = loader
        .available()
        .unwrap_or_else(|e| fail("listing domains", e));
    if domains.is_empty() {
        fail("listing domains", format!("no *.json files in {}", loader.dir().display()));
    }
    domains
}

fn run_evolve(args: &[String]) {
    let family: FormulaFamily = args[0]
        .parse()
        .unwrap_or_else(|e| fail("parsing family", e));
    let loader = JsonDomainLoader::new(&args[1]);
    let defaults = PopulationConfig::default();
    let size = args.get(2).and_then(|s| s.parse().ok()).unwrap_or(defaults.size);
    let max_generations = args
        .get(3)
        .and_then(|s| s.parse().ok())
        .unwrap_or(defaults.max_generations);

    let config = EvolutionConfig {
        family,
        domains: domains_in(&loader),
        population: PopulationConfig {
            size,
            max_generations,
        },
        ..Default::default()
    };

    let history = evolve_and_report(config, &loader);
    print_json(&history);
}

/// Run evolution with progress lines on stderr.
fn evolve_and_report(config: EvolutionConfig, loader: &dyn DomainLoader) -> EvolutionHistory {
    eprintln!(
        "Evolving {} over {} domain(s): population {}, up to {} generations",
        config.family,
        config.domains.len(),
        config.population.size,
        config.population.max_generations
    );
    let start = Instant::now();

    let history = evolve_with_callback(config, loader, |progress| {
        eprintln!(
            "  Generation {}/{}: best={:.4} mean={:.4} stall={}",
            progress.generation + 1,
            progress.total_generations,
            progress.generation_best,
            progress.mean_fitness,
            progress.stall_count
        );
    })
    .unwrap_or_else(|e| fail("in evolution config", e));

    eprintln!(
        "Stopped ({:?}) after {} generations, best fitness {:.4}, {:.2}s",
        history.stop_reason,
        history.generations.len(),
        history.best_fitness,
        start.elapsed().as_secs_f32()
    );
    history
}

fn run_validate(formula_id: &str, dir: &str) {
    let engine = FormulaEngine::new();
    let loader = JsonDomainLoader::new(dir);
    let domains = domains_in(&loader);
    let config = ValidationConfig::default();
    let limit = config.limit_per_domain;
    let validator = FormulaValidator::new(&engine, &loader, config);

    let report = validator
        .validate_formula(formula_id, &domains, limit)
        .unwrap_or_else(|e| fail("validating", e));
    print_json(&report);
}

fn read_history(path: &str) -> EvolutionHistory {
    load_history(Path::new(path)).unwrap_or_else(|e| fail(&format!("reading {path}"), e))
}

fn run_analyze(path: &str) {
    let signature = ConvergenceAnalyzer::default().analyze(&read_history(path));
    print_json(&signature);
}

fn run_compare(paths: &[String]) {
    let mut archive = RunArchive::new();
    for path in paths {
        archive.add(read_history(path));
    }
    print_json(&archive.compare(&ConvergenceAnalyzer::default()));
}

/// Evolve every family on three synthetic domains and compare.
fn run_demo() {
    let synthetic = [
        SyntheticDomain::new("startups", 120, 1)
            .with_term(keys::HARSHNESS, 0.8)
            .with_term(keys::MEMORABILITY, 0.4)
            .with_noise(10.0),
        SyntheticDomain::new("bands", 120, 2)
            .with_term(keys::HARSHNESS, 0.6)
            .with_term(keys::SYLLABLES, -4.0)
            .with_noise(8.0),
        SyntheticDomain::new("pharma", 120, 3)
            .with_term(keys::VOWEL_RATIO, 40.0)
            .with_term(keys::PRESTIGE, 0.3)
            .with_noise(6.0)
            .with_success_flags(),
    ];

    let mut loader = InMemoryDomains::new();
    for domain in &synthetic {
        let entities = domain
            .generate()
            .unwrap_or_else(|e| fail("generating synthetic domain", e));
        loader.insert(domain.name(), entities);
    }
    let domains: Vec<String> = synthetic.iter().map(|d| d.name().to_string()).collect();

    let mut archive = RunArchive::new();
    for family in FormulaFamily::ALL {
        let config = EvolutionConfig {
            family,
            domains: domains.clone(),
            population: PopulationConfig {
                size: 20,
                max_generations: 10,
            },
            random_seed: Some(42),
            ..Default::default()
        };
        archive.add(evolve_and_report(config, &loader));
    }

    let analyzer = ConvergenceAnalyzer::default();
    print_json(&archive.analyze_all(&analyzer));
    print_json(&archive.compare(&analyzer));
}
