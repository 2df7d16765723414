//! LaTeX rendering of expanded expressions.
//!
//! A term such as `-3 (x_0 - x_1)^2 Z_0 Z_1 / R_01^5` is written as
//! `-3(x_0 - x_1)^2\frac{ Z_0 Z_1 } { R_{ 01 }^{ 5 } }`, and a whole expression as the terms
//! joined by `+` inside `$$ ... $$`.

use crate::expression::{Expression, Sign, Term};
use crate::types::Variable;
use std::fmt::Write;

impl Term {
    /// Renders this term as a LaTeX fragment; extinct terms render as `0`.
    pub fn to_latex(&self) -> String {
        if self.is_extinct() {
            return "0".to_string();
        }

        let mut out = String::new();
        if self.sign() == Sign::Minus {
            out.push('-');
        }
        if self.coefficient() != 1.0 {
            out.push_str(&format_coefficient(self.coefficient()));
        }

        let (a, b) = (self.pair().first(), self.pair().second());
        for (factor, multiplicity) in self.factors() {
            let k = factor.axis.letter();
            let _ = write!(out, "({k}_{a} - {k}_{b})");
            if multiplicity > 1 {
                let _ = write!(out, "^{multiplicity}");
            }
        }

        let _ = write!(
            out,
            "\\frac{{ Z_{a} Z_{b} }} {{ R_{{ {a}{b} }}^{{ {} }} }}",
            self.power()
        );
        out
    }
}

impl Expression {
    /// Renders the whole sum as display-math LaTeX.
    ///
    /// # Examples
    ///
    /// ```
    /// use nucrep::Expression;
    ///
    /// let seed = Expression::seed(2).unwrap();
    /// assert_eq!(seed.to_latex(), "$$\\frac{ Z_0 Z_1 } { R_{ 01 }^{ 1 } }$$");
    /// ```
    pub fn to_latex(&self) -> String {
        let mut body = String::new();
        for (i, term) in self.terms().iter().enumerate() {
            let rendered = term.to_latex();
            if i > 0 && !rendered.starts_with('-') {
                body.push('+');
            }
            body.push_str(&rendered);
        }
        if body.is_empty() {
            body.push('0');
        }
        format!("$${body}$$")
    }
}

/// Renders a differentiation request such as `[x0, y1]` as `$x_0 y_1 $`.
pub fn variables_to_latex(variables: &[Variable]) -> String {
    let mut out = String::from("$");
    for variable in variables {
        let _ = write!(out, "{}_{} ", variable.axis.letter(), variable.atom);
    }
    out.push('$');
    out
}

fn format_coefficient(coefficient: f64) -> String {
    if coefficient.fract() == 0.0 && coefficient.abs() < 1e15 {
        format!("{}", coefficient as i64)
    } else {
        format!("{coefficient}")
    }
}
