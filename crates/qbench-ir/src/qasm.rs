//! OpenQASM 2.0 reading and writing.
//!
//! The reader flattens every `qreg`/`creg` into one contiguous register in
//! declaration order and supports register broadcasting for gates,
//! measurements and barriers. Custom `gate` definitions are not supported.

use logos::Logos;
use std::f64::consts::PI;
use std::fmt::Write as _;
use std::path::Path;
use std::sync::Arc;

use crate::chain::GateChain;
use crate::error::{IrError, IrResult};
use crate::gate::{Gate, GateKind};
use crate::hardware::Hardware;
use crate::qubit::{ClbitId, QubitId};

/// Tokens for OpenQASM 2.0.
#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\r\n]+")]
#[logos(skip r"//[^\n]*")]
pub enum Token {
    #[token("OPENQASM")]
    OpenQasm,

    #[token("include")]
    Include,

    #[token("qreg")]
    QReg,

    #[token("creg")]
    CReg,

    #[token("measure")]
    Measure,

    #[token("barrier")]
    Barrier,

    #[token("gate")]
    GateDef,

    #[token("pi")]
    Pi,

    #[regex(r"[0-9]+\.[0-9]*([eE][+-]?[0-9]+)?", |lex| lex.slice().parse::<f64>().ok())]
    #[regex(r"\.[0-9]+([eE][+-]?[0-9]+)?", |lex| lex.slice().parse::<f64>().ok())]
    #[regex(r"[0-9]+[eE][+-]?[0-9]+", |lex| lex.slice().parse::<f64>().ok())]
    Float(f64),

    #[regex(r"[0-9]+", |lex| lex.slice().parse::<u64>().ok(), priority = 3)]
    Int(u64),

    #[regex(r#""[^"]*""#, |lex| {
        let s = lex.slice();
        s[1..s.len() - 1].to_string()
    })]
    Str(String),

    #[regex(r"[a-zA-Z_][a-zA-Z0-9_]*", |lex| lex.slice().to_string())]
    Ident(String),

    #[token("->")]
    Arrow,

    #[token("[")]
    LBracket,

    #[token("]")]
    RBracket,

    #[token("(")]
    LParen,

    #[token(")")]
    RParen,

    #[token(",")]
    Comma,

    #[token(";")]
    Semicolon,

    #[token("+")]
    Plus,

    #[token("-")]
    Minus,

    #[token("*")]
    Star,

    #[token("/")]
    Slash,
}

/// A token with its 1-based source line.
#[derive(Debug, Clone, PartialEq)]
struct Spanned {
    token: Token,
    line: usize,
}

fn tokenize(source: &str) -> IrResult<Vec<Spanned>> {
    let mut out = Vec::new();
    let mut lexer = Token::lexer(source);
    while let Some(result) = lexer.next() {
        let span = lexer.span();
        let line = source[..span.start].matches('\n').count() + 1;
        match result {
            Ok(token) => out.push(Spanned { token, line }),
            Err(()) => {
                return Err(IrError::Qasm {
                    line,
                    message: format!("unexpected character sequence '{}'", &source[span]),
                });
            }
        }
    }
    Ok(out)
}

/// Evaluate an angle expression such as `2*pi/30` or `-pi/4`.
pub fn eval_angle(expr: &str) -> IrResult<f64> {
    let tokens = tokenize(expr).map_err(|_| IrError::InvalidAngle(expr.to_string()))?;
    let mut parser = Parser { tokens, pos: 0, qregs: Vec::new(), cregs: Vec::new() };
    let value = parser.expr().map_err(|_| IrError::InvalidAngle(expr.to_string()))?;
    if parser.pos != parser.tokens.len() {
        return Err(IrError::InvalidAngle(expr.to_string()));
    }
    Ok(value)
}

/// A declared register flattened into the global index space.
#[derive(Debug, Clone)]
struct Register {
    name: String,
    offset: u32,
    size: u32,
}

/// Register argument: one element or the whole register.
#[derive(Debug, Clone, Copy)]
enum Arg {
    Single(u32),
    Whole { offset: u32, size: u32 },
}

impl Arg {
    fn width(self) -> Option<u32> {
        match self {
            Arg::Single(_) => None,
            Arg::Whole { size, .. } => Some(size),
        }
    }

    fn at(self, i: u32) -> u32 {
        match self {
            Arg::Single(idx) => idx,
            Arg::Whole { offset, .. } => offset + i,
        }
    }
}

struct Parser {
    tokens: Vec<Spanned>,
    pos: usize,
    qregs: Vec<Register>,
    cregs: Vec<Register>,
}

impl Parser {
    fn line(&self) -> usize {
        self.tokens
            .get(self.pos)
            .or_else(|| self.tokens.last())
            .map_or(1, |t| t.line)
    }

    fn error<T>(&self, message: impl Into<String>) -> IrResult<T> {
        Err(IrError::Qasm { line: self.line(), message: message.into() })
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|t| &t.token)
    }

    fn next(&mut self) -> Option<Token> {
        let tok = self.tokens.get(self.pos).map(|t| t.token.clone());
        if tok.is_some() {
            self.pos += 1;
        }
        tok
    }

    fn expect(&mut self, expected: Token) -> IrResult<()> {
        match self.next() {
            Some(tok) if tok == expected => Ok(()),
            Some(tok) => {
                self.pos -= 1;
                self.error(format!("expected {expected:?}, found {tok:?}"))
            }
            None => self.error(format!("expected {expected:?}, found end of input")),
        }
    }

    fn ident(&mut self) -> IrResult<String> {
        match self.next() {
            Some(Token::Ident(name)) => Ok(name),
            other => self.error(format!("expected identifier, found {other:?}")),
        }
    }

    fn int(&mut self) -> IrResult<u64> {
        match self.next() {
            Some(Token::Int(v)) => Ok(v),
            other => self.error(format!("expected integer, found {other:?}")),
        }
    }

    fn expr(&mut self) -> IrResult<f64> {
        let mut value = self.term()?;
        loop {
            match self.peek() {
                Some(Token::Plus) => {
                    self.pos += 1;
                    value += self.term()?;
                }
                Some(Token::Minus) => {
                    self.pos += 1;
                    value -= self.term()?;
                }
                _ => return Ok(value),
            }
        }
    }

    fn term(&mut self) -> IrResult<f64> {
        let mut value = self.factor()?;
        loop {
            match self.peek() {
                Some(Token::Star) => {
                    self.pos += 1;
                    value *= self.factor()?;
                }
                Some(Token::Slash) => {
                    self.pos += 1;
                    let divisor = self.factor()?;
                    if divisor == 0.0 {
                        return self.error("division by zero in angle expression");
                    }
                    value /= divisor;
                }
                _ => return Ok(value),
            }
        }
    }

    fn factor(&mut self) -> IrResult<f64> {
        match self.next() {
            Some(Token::Minus) => Ok(-self.factor()?),
            Some(Token::Plus) => self.factor(),
            Some(Token::Float(v)) => Ok(v),
            Some(Token::Int(v)) => Ok(v as f64),
            Some(Token::Pi) => Ok(PI),
            Some(Token::LParen) => {
                let v = self.expr()?;
                self.expect(Token::RParen)?;
                Ok(v)
            }
            other => self.error(format!("expected angle expression, found {other:?}")),
        }
    }

    fn declare(&mut self, quantum: bool) -> IrResult<()> {
        let name = self.ident()?;
        self.expect(Token::LBracket)?;
        let size = self.int()? as u32;
        self.expect(Token::RBracket)?;
        self.expect(Token::Semicolon)?;
        let regs = if quantum { &mut self.qregs } else { &mut self.cregs };
        if regs.iter().any(|r| r.name == name) {
            return self.error(format!("register '{name}' declared twice"));
        }
        let regs = if quantum { &mut self.qregs } else { &mut self.cregs };
        let offset = regs.last().map_or(0, |r| r.offset + r.size);
        regs.push(Register { name, offset, size });
        Ok(())
    }

    fn arg(&mut self, quantum: bool) -> IrResult<Arg> {
        let name = self.ident()?;
        let regs = if quantum { &self.qregs } else { &self.cregs };
        let Some(reg) = regs.iter().find(|r| r.name == name).cloned() else {
            return self.error(format!("undeclared register '{name}'"));
        };
        if self.peek() == Some(&Token::LBracket) {
            self.pos += 1;
            let idx = self.int()? as u32;
            self.expect(Token::RBracket)?;
            if idx >= reg.size {
                return self.error(format!("index {idx} out of range for register '{name}[{}]'", reg.size));
            }
            Ok(Arg::Single(reg.offset + idx))
        } else {
            Ok(Arg::Whole { offset: reg.offset, size: reg.size })
        }
    }

    fn arg_list(&mut self) -> IrResult<Vec<Arg>> {
        let mut args = vec![self.arg(true)?];
        while self.peek() == Some(&Token::Comma) {
            self.pos += 1;
            args.push(self.arg(true)?);
        }
        Ok(args)
    }

    /// Number of repetitions implied by whole-register arguments.
    fn broadcast_width(&self, args: &[Arg]) -> IrResult<u32> {
        let mut width: Option<u32> = None;
        for w in args.iter().filter_map(|a| a.width()) {
            match width {
                Some(prev) if prev != w => {
                    return self.error("registers of different sizes in one statement");
                }
                _ => width = Some(w),
            }
        }
        Ok(width.unwrap_or(1))
    }

    fn statement(&mut self, ops: &mut Vec<Pending>) -> IrResult<()> {
        let Some(tok) = self.next() else {
            return Ok(());
        };
        match tok {
            Token::OpenQasm => {
                match self.next() {
                    Some(Token::Float(_)) | Some(Token::Int(_)) => {}
                    other => return self.error(format!("expected version, found {other:?}")),
                }
                self.expect(Token::Semicolon)
            }
            Token::Include => {
                match self.next() {
                    Some(Token::Str(_)) => {}
                    other => return self.error(format!("expected file name, found {other:?}")),
                }
                self.expect(Token::Semicolon)
            }
            Token::QReg => self.declare(true),
            Token::CReg => self.declare(false),
            Token::Measure => {
                let q = self.arg(true)?;
                self.expect(Token::Arrow)?;
                let c = self.arg(false)?;
                self.expect(Token::Semicolon)?;
                if q.width() != c.width() {
                    return self.error("measure operands must both be registers of equal size or both single bits");
                }
                for i in 0..q.width().unwrap_or(1) {
                    ops.push(Pending::Measure(q.at(i), c.at(i)));
                }
                Ok(())
            }
            Token::Barrier => {
                let args = self.arg_list()?;
                self.expect(Token::Semicolon)?;
                let mut qs: Vec<u32> = Vec::new();
                for a in args {
                    for i in 0..a.width().unwrap_or(1) {
                        let q = a.at(i);
                        if !qs.contains(&q) {
                            qs.push(q);
                        }
                    }
                }
                let line = self.tokens[self.pos - 1].line;
                ops.push(Pending::Gate(Gate::from(GateKind::Barrier), qs, line));
                Ok(())
            }
            Token::GateDef => self.error("custom gate definitions are not supported"),
            Token::Ident(name) => {
                let line = self.tokens[self.pos - 1].line;
                let kind = GateKind::from_name(&name)
                    .filter(|k| k.is_unitary())
                    .ok_or_else(|| IrError::Qasm { line, message: format!("unknown gate '{name}'") })?;
                let mut params = Vec::new();
                if self.peek() == Some(&Token::LParen) {
                    self.pos += 1;
                    if self.peek() != Some(&Token::RParen) {
                        params.push(self.expr()?);
                        while self.peek() == Some(&Token::Comma) {
                            self.pos += 1;
                            params.push(self.expr()?);
                        }
                    }
                    self.expect(Token::RParen)?;
                }
                let gate = Gate::new(kind, params).map_err(|e| IrError::Qasm { line, message: e.to_string() })?;
                let args = self.arg_list()?;
                self.expect(Token::Semicolon)?;
                let width = self.broadcast_width(&args)?;
                for i in 0..width {
                    let qs = args.iter().map(|a| a.at(i)).collect();
                    ops.push(Pending::Gate(gate.clone(), qs, line));
                }
                Ok(())
            }
            other => {
                self.pos -= 1;
                self.error(format!("unexpected token {other:?}"))
            }
        }
    }
}

enum Pending {
    Gate(Gate, Vec<u32>, usize),
    Measure(u32, u32),
}

/// Parse OpenQASM 2.0 source into a chain.
///
/// The chain is bound to `hardware` if given, otherwise to an unconstrained
/// device as wide as the declared quantum registers.
pub fn parse(source: &str, hardware: Option<Arc<Hardware>>) -> IrResult<GateChain> {
    let tokens = tokenize(source)?;
    let mut parser = Parser { tokens, pos: 0, qregs: Vec::new(), cregs: Vec::new() };
    let mut pending = Vec::new();
    while parser.pos < parser.tokens.len() {
        parser.statement(&mut pending)?;
    }
    let width = parser.qregs.last().map_or(0, |r| r.offset + r.size);
    let hardware = hardware.unwrap_or_else(|| Arc::new(Hardware::unconstrained(width)));
    let mut chain = GateChain::new(hardware);
    for p in pending {
        match p {
            Pending::Gate(gate, qs, line) => {
                chain
                    .add_gate(gate, qs.into_iter().map(QubitId).collect())
                    .map_err(|e| IrError::Qasm { line, message: e.to_string() })?;
            }
            Pending::Measure(q, c) => {
                chain.measure(QubitId(q), ClbitId(c));
            }
        }
    }
    Ok(chain)
}

/// Read and parse a `.qasm` file.
pub fn parse_file(path: impl AsRef<Path>, hardware: Option<Arc<Hardware>>) -> IrResult<GateChain> {
    let source = std::fs::read_to_string(path)?;
    parse(&source, hardware)
}

/// Emit a chain as OpenQASM 2.0 over a single `q`/`c` register pair.
pub fn emit(chain: &GateChain) -> String {
    let mut out = String::new();
    out.push_str("OPENQASM 2.0;\n");
    out.push_str("include \"qelib1.inc\";\n");
    let _ = writeln!(out, "qreg q[{}];", chain.num_qubits());
    if chain.num_clbits() > 0 {
        let _ = writeln!(out, "creg c[{}];", chain.num_clbits());
    }
    for op in chain.ops() {
        let targets: Vec<String> = op.qubits.iter().map(|q| format!("q[{}]", q.0)).collect();
        if op.kind() == GateKind::Measure {
            let clbit = op.clbits.first().map_or(0, |c| c.0);
            let _ = writeln!(out, "measure {} -> c[{clbit}];", targets.join(","));
        } else {
            let _ = writeln!(out, "{} {};", op.gate, targets.join(","));
        }
    }
    out
}

/// Write a chain to `path` as OpenQASM 2.0.
pub fn write_file(chain: &GateChain, path: impl AsRef<Path>) -> IrResult<()> {
    std::fs::write(path, emit(chain))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const BELL: &str = r#"
        OPENQASM 2.0;
        include "qelib1.inc";
        qreg q[2];
        creg c[2];
        h q[0];
        cx q[0],q[1];
        measure q -> c;
    "#;

    #[test]
    fn test_eval_angle() {
        assert!((eval_angle("2*pi/30").unwrap() - 2.0 * PI / 30.0).abs() < 1e-12);
        assert!((eval_angle("-pi/4").unwrap() + PI / 4.0).abs() < 1e-12);
        assert!((eval_angle("(1+2)*0.5").unwrap() - 1.5).abs() < 1e-12);
        assert!(eval_angle("pi/").is_err());
        assert!(eval_angle("1/0").is_err());
    }

    #[test]
    fn test_parse_bell() {
        let chain = parse(BELL, None).unwrap();
        assert_eq!(chain.len(), 4);
        assert_eq!(chain.num_clbits(), 2);
        assert_eq!(chain.hardware().num_qubits(), 2);
        assert_eq!(chain.ops()[1].qubits, vec![QubitId(0), QubitId(1)]);
    }

    #[test]
    fn test_registers_are_flattened() {
        let src = "OPENQASM 2.0; qreg a[2]; qreg b[3]; x b[1]; cx a[0],b[2];";
        let chain = parse(src, None).unwrap();
        assert_eq!(chain.num_qubits(), 5);
        assert_eq!(chain.ops()[0].qubits, vec![QubitId(3)]);
        assert_eq!(chain.ops()[1].qubits, vec![QubitId(0), QubitId(4)]);
    }

    #[test]
    fn test_broadcast_single_qubit_gate() {
        let chain = parse("OPENQASM 2.0; qreg q[3]; h q;", None).unwrap();
        assert_eq!(chain.len(), 3);
    }

    #[test]
    fn test_parameterized_gate() {
        let chain = parse("OPENQASM 2.0; qreg q[1]; u3(pi/2, 0, pi) q[0]; rz(-0.25) q[0];", None).unwrap();
        let params = chain.ops()[0].gate.params();
        assert!((params[0] - PI / 2.0).abs() < 1e-12);
        assert!((chain.ops()[1].gate.params()[0] + 0.25).abs() < 1e-12);
    }

    #[test]
    fn test_unknown_gate_reports_line() {
        let err = parse("OPENQASM 2.0;\nqreg q[1];\nfoo q[0];", None).unwrap_err();
        assert!(matches!(err, IrError::Qasm { line: 3, .. }));
    }

    #[test]
    fn test_out_of_range_index() {
        assert!(parse("OPENQASM 2.0; qreg q[1]; x q[1];", None).is_err());
    }

    #[test]
    fn test_emit_then_parse_preserves_chain() {
        let chain = parse(BELL, None).unwrap();
        let text = emit(&chain);
        assert!(text.contains("cx q[0],q[1];"));
        assert!(text.contains("measure q[1] -> c[1];"));
        assert_eq!(parse(&text, None).unwrap(), chain);
    }
}
