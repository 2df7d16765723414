use super::cli::OutputFormat;
use super::error::CliError;
use nucrep::{Atom, Variable};
use prettytable::*;
use serde_json::json;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::PathBuf;

/// Element symbols indexed by atomic number minus one.
const ELEMENT_SYMBOLS: [&str; 54] = [
    "H", "He", "Li", "Be", "B", "C", "N", "O", "F", "Ne", "Na", "Mg", "Al", "Si", "P", "S", "Cl",
    "Ar", "K", "Ca", "Sc", "Ti", "V", "Cr", "Mn", "Fe", "Co", "Ni", "Cu", "Zn", "Ga", "Ge", "As",
    "Se", "Br", "Kr", "Rb", "Sr", "Y", "Zr", "Nb", "Mo", "Tc", "Ru", "Rh", "Pd", "Ag", "Cd", "In",
    "Sn", "Sb", "Te", "I", "Xe",
];

/// What was computed for the molecule.
pub enum Outcome {
    Derivative {
        variables: Vec<Variable>,
        value: f64,
        terms: usize,
        latex: Option<String>,
    },
    Gradient(Vec<f64>),
    Hessian(Vec<Vec<f64>>),
}

impl Outcome {
    fn task_label(&self) -> String {
        match self {
            Outcome::Derivative { variables, .. } if variables.is_empty() => "energy".to_string(),
            Outcome::Derivative { variables, .. } => format!("derivative (order {})", variables.len()),
            Outcome::Gradient(_) => "gradient".to_string(),
            Outcome::Hessian(_) => "hessian".to_string(),
        }
    }
}

/// Everything written to the output for one run.
pub struct Report<'a> {
    pub source_name: &'a str,
    pub comment: &'a str,
    pub atoms: &'a [Atom],
    pub energy: f64,
    pub outcome: Outcome,
}

pub fn read_atoms(input_spec: &str) -> Result<(Vec<Atom>, String), CliError> {
    let reader: Box<dyn BufRead> = if input_spec == "-" {
        Box::new(BufReader::new(io::stdin()))
    } else {
        let file = std::fs::File::open(input_spec).map_err(|e| CliError::Io {
            path: PathBuf::from(input_spec),
            source: e,
        })?;
        Box::new(BufReader::new(file))
    };

    parse_xyz(reader, input_spec)
}

fn parse_xyz<R: BufRead>(reader: R, source_name: &str) -> Result<(Vec<Atom>, String), CliError> {
    let parse_error = |details: String| CliError::XyzParse {
        source_name: source_name.to_string(),
        details,
    };

    let mut lines = reader.lines();

    let count_line = lines
        .next()
        .ok_or_else(|| parse_error("Missing number of atoms line".to_string()))??;
    let num_atoms: usize = count_line
        .trim()
        .parse()
        .map_err(|_| parse_error(format!("Invalid number of atoms: {}", count_line.trim())))?;

    let comment = lines
        .next()
        .ok_or_else(|| parse_error("Missing comment line".to_string()))??;

    let mut atoms = Vec::with_capacity(num_atoms);
    for (i, line) in lines.take(num_atoms).enumerate() {
        let line_no = i + 3;
        let line = line?;
        let fields: Vec<&str> = line.split_whitespace().collect();
        let [symbol, x, y, z, ..] = fields.as_slice() else {
            return Err(parse_error(format!(
                "Line {}: expected an element and three coordinates, got {} fields",
                line_no,
                fields.len()
            )));
        };

        let atomic_number = parse_element(symbol)
            .ok_or_else(|| parse_error(format!("Line {}: unknown element '{}'", line_no, symbol)))?;

        let mut position = [0.0; 3];
        for (slot, (field, label)) in position.iter_mut().zip([(x, 'x'), (y, 'y'), (z, 'z')]) {
            *slot = field.parse().map_err(|_| {
                parse_error(format!(
                    "Line {}: invalid {} coordinate '{}'",
                    line_no, label, field
                ))
            })?;
        }

        atoms.push(Atom {
            atomic_number,
            position,
        });
    }

    if atoms.len() != num_atoms {
        return Err(parse_error(format!(
            "Expected {} atoms, got {}",
            num_atoms,
            atoms.len()
        )));
    }

    Ok((atoms, comment))
}

fn parse_element(s: &str) -> Option<u8> {
    if let Ok(num) = s.parse::<u8>() {
        return (num >= 1).then_some(num);
    }
    ELEMENT_SYMBOLS
        .iter()
        .position(|symbol| symbol.eq_ignore_ascii_case(s))
        .map(|index| index as u8 + 1)
}

fn element_symbol(atomic_number: u8) -> &'static str {
    usize::from(atomic_number)
        .checked_sub(1)
        .and_then(|index| ELEMENT_SYMBOLS.get(index))
        .copied()
        .unwrap_or("??")
}

pub fn get_writer(output_path: &Option<PathBuf>) -> Result<Box<dyn Write>, CliError> {
    match output_path {
        Some(path) => {
            let file = std::fs::File::create(path).map_err(|e| CliError::Io {
                path: path.clone(),
                source: e,
            })?;
            Ok(Box::new(BufWriter::new(file)))
        }
        None => Ok(Box::new(io::stdout())),
    }
}

pub fn write_report(
    mut writer: Box<dyn Write>,
    report: &Report,
    format: &OutputFormat,
    precision: usize,
) -> Result<(), CliError> {
    match format {
        OutputFormat::Pretty => write_pretty(&mut writer, report, precision)?,
        OutputFormat::Csv => write_csv(&mut writer, report, precision)?,
        OutputFormat::Json => write_json(&mut writer, report)?,
    }
    writer.flush()?;
    Ok(())
}

fn table_formats() -> (format::TableFormat, format::TableFormat) {
    let top = format::LineSeparator::new('─', '┬', '╭', '╮');
    let bottom = format::LineSeparator::new('─', '┴', '╰', '╯');

    let boxed = format::FormatBuilder::new()
        .column_separator('│')
        .borders('│')
        .separators(&[format::LinePosition::Top], top)
        .separators(
            &[format::LinePosition::Title],
            format::LineSeparator::new('═', '╪', '╞', '╡'),
        )
        .separators(
            &[format::LinePosition::Intern],
            format::LineSeparator::new('─', '┼', '├', '┤'),
        )
        .separators(&[format::LinePosition::Bottom], bottom)
        .padding(1, 1)
        .build();

    let plain = format::FormatBuilder::new()
        .column_separator('│')
        .borders('│')
        .separators(&[format::LinePosition::Top], top)
        .separators(&[format::LinePosition::Bottom], bottom)
        .padding(1, 1)
        .build();

    (boxed, plain)
}

fn write_pretty(writer: &mut dyn Write, report: &Report, precision: usize) -> Result<(), CliError> {
    let (boxed, plain) = table_formats();
    let fmt = |value: f64| format!("{:.prec$}", value, prec = precision);

    let mut title_table = Table::new();
    title_table.set_format(boxed);
    title_table.add_row(row![bc->"Nuclear Repulsion Derivatives"]);
    title_table.print(writer)?;
    writeln!(writer)?;

    let mut summary_table = Table::new();
    summary_table.set_format(plain);
    summary_table.add_row(row![b->"Source File:", report.source_name]);
    if !report.comment.trim().is_empty() {
        summary_table.add_row(row![b->"Comment:", report.comment.trim()]);
    }
    summary_table.add_row(row![b->"Total Atoms:", report.atoms.len()]);
    summary_table.add_row(row![b->"Repulsion Energy:", fmt(report.energy)]);
    summary_table.add_row(row![b->"Task:", report.outcome.task_label()]);
    if let Outcome::Derivative { variables, terms, .. } = &report.outcome {
        if !variables.is_empty() {
            summary_table.add_row(row![b->"Variables:", join_variables(variables, " ")]);
            summary_table.add_row(row![b->"Expanded Terms:", terms]);
        }
    }
    summary_table.print(writer)?;
    writeln!(writer)?;

    let mut data_table = Table::new();
    data_table.set_format(boxed);

    match &report.outcome {
        Outcome::Derivative { value, latex, .. } => {
            data_table.set_titles(row![bc->"Quantity", bc->"Value"]);
            data_table.add_row(row![l->"Value", r->fmt(*value)]);
            data_table.print(writer)?;
            if let Some(latex) = latex {
                writeln!(writer)?;
                writeln!(writer, "{}", latex)?;
            }
        }
        Outcome::Gradient(gradient) => {
            data_table.set_titles(
                row![bc->"Index", bc->"Element", bc->"dE/dx", bc->"dE/dy", bc->"dE/dz"],
            );
            for (i, (atom, g)) in report.atoms.iter().zip(gradient.chunks(3)).enumerate() {
                data_table.add_row(row![
                    r->i,
                    l->element_symbol(atom.atomic_number),
                    r->fmt(g[0]),
                    r->fmt(g[1]),
                    r->fmt(g[2])
                ]);
            }
            data_table.print(writer)?;
        }
        Outcome::Hessian(hessian) => {
            let labels: Vec<String> = Variable::all(report.atoms.len())
                .map(|v| v.to_string())
                .collect();
            let mut titles = Row::new(vec![Cell::new("").style_spec("bc")]);
            for label in &labels {
                titles.add_cell(Cell::new(label).style_spec("bc"));
            }
            data_table.set_titles(titles);
            for (label, values) in labels.iter().zip(hessian) {
                let mut row = Row::new(vec![Cell::new(label).style_spec("b")]);
                for value in values {
                    row.add_cell(Cell::new(&fmt(*value)).style_spec("r"));
                }
                data_table.add_row(row);
            }
            data_table.print(writer)?;
        }
    }

    Ok(())
}

fn write_csv(writer: &mut dyn Write, report: &Report, precision: usize) -> Result<(), CliError> {
    match &report.outcome {
        Outcome::Derivative { variables, value, terms, .. } => {
            writeln!(writer, "variables,order,terms,value")?;
            writeln!(
                writer,
                "{},{},{},{:.*}",
                join_variables(variables, " "),
                variables.len(),
                terms,
                precision,
                value
            )?;
        }
        Outcome::Gradient(gradient) => {
            writeln!(writer, "index,element,dx,dy,dz")?;
            for (i, (atom, g)) in report.atoms.iter().zip(gradient.chunks(3)).enumerate() {
                writeln!(
                    writer,
                    "{},{},{:.*},{:.*},{:.*}",
                    i,
                    element_symbol(atom.atomic_number),
                    precision,
                    g[0],
                    precision,
                    g[1],
                    precision,
                    g[2]
                )?;
            }
        }
        Outcome::Hessian(hessian) => {
            let labels: Vec<String> = Variable::all(report.atoms.len())
                .map(|v| v.to_string())
                .collect();
            writeln!(writer, ",{}", labels.join(","))?;
            for (label, values) in labels.iter().zip(hessian) {
                let cells: Vec<String> = values
                    .iter()
                    .map(|value| format!("{:.*}", precision, value))
                    .collect();
                writeln!(writer, "{},{}", label, cells.join(","))?;
            }
        }
    }
    Ok(())
}

fn write_json(writer: &mut dyn Write, report: &Report) -> Result<(), CliError> {
    let atoms: Vec<_> = report
        .atoms
        .iter()
        .enumerate()
        .map(|(i, atom)| {
            json!({
                "index": i,
                "element": element_symbol(atom.atomic_number),
                "charge": atom.atomic_number,
                "position": atom.position,
            })
        })
        .collect();

    let result = match &report.outcome {
        Outcome::Derivative {
            variables,
            value,
            terms,
            latex,
        } => json!({
            "variables": variables.iter().map(ToString::to_string).collect::<Vec<_>>(),
            "order": variables.len(),
            "terms": terms,
            "value": value,
            "latex": latex,
        }),
        Outcome::Gradient(gradient) => json!({ "gradient": gradient }),
        Outcome::Hessian(hessian) => json!({ "hessian": hessian }),
    };

    let document = json!({
        "source": report.source_name,
        "comment": report.comment.trim(),
        "atoms": atoms,
        "energy": report.energy,
        "task": report.outcome.task_label(),
        "result": result,
    });

    serde_json::to_writer_pretty(&mut *writer, &document)?;
    writeln!(writer)?;
    Ok(())
}

fn join_variables(variables: &[Variable], separator: &str) -> String {
    variables
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(separator)
}
