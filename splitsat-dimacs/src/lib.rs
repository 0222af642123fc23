//! DIMACS CNF reader and writer for the splitsat partitioning solver.
//!
//! The reader accepts the usual liberal shape of DIMACS CNF files: comment lines starting with
//! `c`, an optional `p cnf <vars> <clauses>` header, clauses as whitespace separated signed
//! numbers terminated by `0`, possibly spanning lines, with arbitrary leading whitespace and
//! empty lines in between. The writer emits exactly one header line followed by one clause per
//! line.

use std::io;

use splitsat_formula::{CnfFormula, Lit, Solution, SolvingResult, Var};

use thiserror::Error;

/// Possible errors while reading a DIMACS CNF formula.
#[derive(Debug, Error)]
pub enum ParserError {
    #[error("line {line}: invalid header: {header}")]
    InvalidHeader { line: usize, header: String },
    #[error("line {line}: unexpected token: {token}")]
    UnexpectedToken { line: usize, token: String },
    #[error("line {line}: literal {number} is out of range")]
    LiteralOutOfRange { line: usize, number: isize },
    #[error("line {line}: unterminated clause")]
    UnterminatedClause { line: usize },
    #[error("formula uses {var_count} variables while the header declares {header_var_count}")]
    VarCount {
        var_count: usize,
        header_var_count: usize,
    },
    #[error("formula has {clause_count} clauses while the header declares {header_clause_count}")]
    ClauseCount {
        clause_count: usize,
        header_clause_count: usize,
    },
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Variable and clause count declared by a DIMACS CNF header.
#[derive(Copy, Clone, Debug)]
pub struct DimacsHeader {
    pub var_count: usize,
    pub clause_count: usize,
}

/// Reads a whole DIMACS CNF input into a formula.
///
/// When a header is present its counts are checked against the parsed formula.
pub fn parse_dimacs(input: impl io::Read) -> Result<CnfFormula, ParserError> {
    use io::BufRead;

    let mut formula = CnfFormula::new();
    let mut header: Option<DimacsHeader> = None;
    let mut clause: Vec<Lit> = vec![];
    let mut clause_count = 0;
    let mut line_number = 0;

    for line in io::BufReader::new(input).lines() {
        let line = line?;
        line_number += 1;

        let trimmed = line.trim_start();
        if trimmed.is_empty() || trimmed.starts_with('c') {
            continue;
        }
        if trimmed.starts_with('p') {
            if header.is_some() {
                return Err(ParserError::InvalidHeader {
                    line: line_number,
                    header: trimmed.to_owned(),
                });
            }
            let parsed = parse_header(trimmed).ok_or_else(|| ParserError::InvalidHeader {
                line: line_number,
                header: trimmed.to_owned(),
            })?;
            formula.set_var_count(parsed.var_count);
            header = Some(parsed);
            continue;
        }

        for token in trimmed.split_whitespace() {
            let number: isize = token.parse().map_err(|_| ParserError::UnexpectedToken {
                line: line_number,
                token: token.to_owned(),
            })?;
            if number == 0 {
                formula.add_clause(&clause);
                clause.clear();
                clause_count += 1;
            } else if number.unsigned_abs() > Var::max_count() {
                return Err(ParserError::LiteralOutOfRange {
                    line: line_number,
                    number,
                });
            } else {
                clause.push(Lit::from_dimacs(number));
            }
        }
    }

    if !clause.is_empty() {
        return Err(ParserError::UnterminatedClause { line: line_number });
    }

    if let Some(header) = header {
        if formula.var_count() != header.var_count {
            return Err(ParserError::VarCount {
                var_count: formula.var_count(),
                header_var_count: header.var_count,
            });
        }
        if clause_count != header.clause_count {
            return Err(ParserError::ClauseCount {
                clause_count,
                header_clause_count: header.clause_count,
            });
        }
    }

    Ok(formula)
}

fn parse_header(line: &str) -> Option<DimacsHeader> {
    let mut fields = line.split_whitespace();
    if fields.next() != Some("p") || fields.next() != Some("cnf") {
        return None;
    }
    let var_count: usize = fields.next()?.parse().ok()?;
    if var_count > Var::max_count() {
        return None;
    }
    let clause_count: usize = fields.next()?.parse().ok()?;
    if fields.next().is_some() {
        return None;
    }
    Some(DimacsHeader {
        var_count,
        clause_count,
    })
}

/// Writes a formula as DIMACS CNF, header included.
pub fn write_dimacs(target: &mut impl io::Write, formula: &CnfFormula) -> io::Result<()> {
    writeln!(target, "p cnf {} {}", formula.var_count(), formula.len())?;
    for clause in formula.iter() {
        for lit in clause {
            write!(target, "{} ", lit)?;
        }
        target.write_all(b"0\n")?;
    }
    Ok(())
}

/// Writes a solution as a single line: `sat`, `unsat` or `undef`, with the model appended as
/// space separated signed literals when one is present.
pub fn write_solution(target: &mut impl io::Write, solution: &Solution) -> io::Result<()> {
    match solution.result {
        SolvingResult::Satisfiable => write!(target, "sat")?,
        SolvingResult::Unsatisfiable => write!(target, "unsat")?,
        SolvingResult::Undefined => write!(target, "undef")?,
    }
    if let Some(assignment) = &solution.assignment {
        for lit in assignment.to_lits() {
            write!(target, " {}", lit)?;
        }
    }
    writeln!(target)
}

#[cfg(test)]
mod tests {
    use super::*;

    use proptest::prelude::*;

    use splitsat_formula::{cnf_formula, Assignment};
    use splitsat_formula::cnf::strategy::cnf_formula as cnf_formula_strategy;

    #[test]
    fn parses_with_comments_and_blank_lines() {
        let input = b"\nc a comment\n  c another\np cnf 4 3\n1 2 0\n  -2 3 0\n4 -1\n0\n";
        let formula = parse_dimacs(&input[..]).unwrap();

        assert_eq!(
            formula,
            cnf_formula![
                1, 2;
                -2, 3;
                4, -1;
            ]
        );
        assert_eq!(formula.var_count(), 4);
    }

    #[test]
    fn parses_without_header() {
        let formula = parse_dimacs(&b"1 -3 0 2 0"[..]).unwrap();
        assert_eq!(formula.len(), 2);
        assert_eq!(formula.var_count(), 3);
    }

    #[test]
    fn rejects_bad_inputs() {
        match parse_dimacs(&b"p cnf 2\n1 0\n"[..]) {
            Err(ParserError::InvalidHeader { .. }) => (),
            other => panic!("unexpected result: {:?}", other.map(|_| ())),
        }
        match parse_dimacs(&b"1 x 0\n"[..]) {
            Err(ParserError::UnexpectedToken { .. }) => (),
            other => panic!("unexpected result: {:?}", other.map(|_| ())),
        }
        match parse_dimacs(&b"1 2\n"[..]) {
            Err(ParserError::UnterminatedClause { .. }) => (),
            other => panic!("unexpected result: {:?}", other.map(|_| ())),
        }
        match parse_dimacs(&b"p cnf 1 1\n1 2 0\n"[..]) {
            Err(ParserError::VarCount { .. }) => (),
            other => panic!("unexpected result: {:?}", other.map(|_| ())),
        }
        match parse_dimacs(&b"p cnf 2 2\n1 2 0\n"[..]) {
            Err(ParserError::ClauseCount { .. }) => (),
            other => panic!("unexpected result: {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn writes_solutions() {
        let mut output = vec![];
        write_solution(&mut output, &Solution::unsatisfiable()).unwrap();
        assert_eq!(output, b"unsat\n");

        let mut assignment = Assignment::new(3);
        assignment.complete_with(false);
        assignment.set(splitsat_formula::var!(2), Some(true));

        let mut output = vec![];
        write_solution(&mut output, &Solution::satisfiable(assignment)).unwrap();
        assert_eq!(output, b"sat -1 2 -3\n");
    }

    proptest! {
        #[test]
        fn roundtrips_through_dimacs(formula in cnf_formula_strategy(1..100usize, 0..500, 0..10)) {
            let mut written = vec![];
            write_dimacs(&mut written, &formula).unwrap();
            let parsed = parse_dimacs(&written[..]).unwrap();
            prop_assert_eq!(parsed, formula);
        }
    }
}
