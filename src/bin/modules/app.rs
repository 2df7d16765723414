use super::cli::{Cli, Task};
use super::error::CliError;
use super::io::{self, Outcome, Report};
use indicatif::{ProgressBar, ProgressStyle};
use nucrep::{Differentiator, EngineOptions, Expression, System, Variable};
use tracing::{debug, info};

pub fn run(args: Cli) -> Result<(), CliError> {
    let mut options = match &args.engine.config {
        Some(path) => EngineOptions::load_from_file(path)?,
        None => EngineOptions::default(),
    };
    if let Some(max_terms) = args.engine.max_terms {
        options.max_terms = Some(max_terms);
    }
    if let Some(threshold) = args.engine.parallel_threshold {
        options.parallel_threshold = threshold;
    }
    debug!(?options, "engine options resolved");
    let engine = Differentiator::new().with_options(options);

    let variables: Vec<Variable> = args
        .derivative
        .wrt
        .iter()
        .map(|spec| spec.parse::<Variable>())
        .collect::<Result<_, _>>()?;

    let (atoms, comment) = io::read_atoms(&args.input)?;
    let system = System::from_atoms(&atoms);

    let source_name = if args.input == "-" {
        "stdin".to_string()
    } else {
        args.input.clone()
    };
    info!(source = %source_name, atoms = atoms.len(), "loaded geometry");

    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.enable_steady_tick(std::time::Duration::from_millis(100));

    pb.set_message("Evaluating repulsion energy...");
    let energy = engine.energy(&system)?;

    let outcome = match args.derivative.task {
        Task::Derivative => {
            pb.set_message(format!("Expanding order-{} derivative...", variables.len()));
            let seed = Expression::for_system(&system)?;
            let expression = engine.differentiate_by(&seed, &variables)?;
            info!(
                order = variables.len(),
                terms = expression.len(),
                "expanded derivative expression"
            );
            let value = expression.evaluate(&system)?;
            Outcome::Derivative {
                latex: args.derivative.latex.then(|| expression.to_latex()),
                terms: expression.len(),
                variables,
                value,
            }
        }
        Task::Gradient => {
            pb.set_message("Computing gradient...");
            Outcome::Gradient(engine.gradient(&system)?)
        }
        Task::Hessian => {
            pb.set_message("Computing Hessian...");
            Outcome::Hessian(engine.hessian(&system)?)
        }
    };

    pb.finish_and_clear();

    let report = Report {
        source_name: &source_name,
        comment: &comment,
        atoms: &atoms,
        energy,
        outcome,
    };

    let writer = io::get_writer(&args.output.output)?;
    io::write_report(writer, &report, &args.output.format, args.output.precision)?;

    Ok(())
}
