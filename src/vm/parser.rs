//! `.vm` text parser.
//!
//! One command per line. `//` starts a comment; blank lines are skipped.

use crate::core::error::{TranslateError, TranslateResult};
use crate::core::segment::Segment;

use super::{ArithmeticOp, Command, Program, SourceUnit};

/// Parse the text of one `.vm` file into a [`SourceUnit`] named `name`.
pub fn parse_unit(name: &str, text: &str) -> TranslateResult<SourceUnit> {
    let parser = Parser::new(name);
    let mut commands = Vec::new();

    for (idx, raw) in text.lines().enumerate() {
        let line = strip_comment(raw).trim();
        if line.is_empty() {
            continue;
        }
        commands.push(parser.parse_line(idx + 1, line)?);
    }

    log::debug!("parsed {} commands from unit {}", commands.len(), name);
    Ok(SourceUnit::new(name, commands))
}

/// Parse several `(name, text)` sources into a [`Program`], keeping their order.
pub fn parse_program<'a, I>(sources: I) -> TranslateResult<Program>
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    let mut program = Program::default();
    for (name, text) in sources {
        program.push_unit(parse_unit(name, text)?);
    }
    Ok(program)
}

fn strip_comment(line: &str) -> &str {
    match line.find("//") {
        Some(pos) => &line[..pos],
        None => line,
    }
}

struct Parser<'a> {
    unit: &'a str,
}

impl<'a> Parser<'a> {
    fn new(unit: &'a str) -> Self {
        Self { unit }
    }

    fn error(&self, line: usize, reason: impl Into<String>) -> TranslateError {
        TranslateError::Parse {
            unit: self.unit.to_string(),
            line,
            reason: reason.into(),
        }
    }

    fn parse_line(&self, line: usize, text: &str) -> TranslateResult<Command> {
        let words: Vec<&str> = text.split_whitespace().collect();
        let keyword = words[0];
        let operands = &words[1..];

        if let Some(op) = ArithmeticOp::from_keyword(keyword) {
            self.expect_operands(line, keyword, operands, 0)?;
            return Ok(Command::Arithmetic(op));
        }

        let command = match keyword {
            "push" | "pop" => {
                self.expect_operands(line, keyword, operands, 2)?;
                let segment = Segment::from_keyword(operands[0])
                    .ok_or_else(|| self.error(line, format!("unknown segment '{}'", operands[0])))?;
                let index = self.parse_number(line, operands[1])?;
                if keyword == "push" {
                    Command::Push { segment, index }
                } else {
                    Command::Pop { segment, index }
                }
            }
            "label" | "goto" | "if-goto" => {
                self.expect_operands(line, keyword, operands, 1)?;
                let name = operands[0].to_string();
                match keyword {
                    "label" => Command::Label(name),
                    "goto" => Command::Goto(name),
                    _ => Command::IfGoto(name),
                }
            }
            "function" => {
                self.expect_operands(line, keyword, operands, 2)?;
                Command::Function {
                    name: operands[0].to_string(),
                    locals: self.parse_number(line, operands[1])?,
                }
            }
            "call" => {
                self.expect_operands(line, keyword, operands, 2)?;
                Command::Call {
                    function: operands[0].to_string(),
                    args: self.parse_number(line, operands[1])?,
                }
            }
            "return" => {
                self.expect_operands(line, keyword, operands, 0)?;
                Command::Return
            }
            other => return Err(self.error(line, format!("unknown command '{other}'"))),
        };
        Ok(command)
    }

    fn expect_operands(
        &self,
        line: usize,
        keyword: &str,
        operands: &[&str],
        expected: usize,
    ) -> TranslateResult<()> {
        if operands.len() != expected {
            return Err(self.error(
                line,
                format!("'{keyword}' takes {expected} operand(s), found {}", operands.len()),
            ));
        }
        Ok(())
    }

    fn parse_number(&self, line: usize, word: &str) -> TranslateResult<u16> {
        word.parse::<u16>()
            .map_err(|_| self.error(line, format!("'{word}' is not a number in 0..=65535")))
    }
}
