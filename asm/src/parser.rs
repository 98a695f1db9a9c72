//! Turns a token stream into one [`NodeBlock`] per `node` directive. Knows
//! which mnemonics want an operand (the eight address-class opcodes) and
//! which want the next token swallowed whole as a literal (`@p`/`!p`), but
//! leaves label resolution and slot packing to [`super::emit`].

use ga144_core::coord::Coord;
use ga144_core::word::Opcode;

use crate::lexer::Tok;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operand {
    Number(u32),
    Label(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Instr {
    /// A plain opcode with no address field at all.
    Bare(Opcode),
    /// An address-class opcode with an explicit operand.
    Addressed(Opcode, Operand),
    /// An address-class opcode whose operand was left out; resolved from
    /// the loop/patch stacks during emission.
    Implicit(Opcode),
    /// `ret`/`ex`: address-class by slot layout only — the decoded address
    /// field is never consulted at runtime, so no operand is ever expected.
    Terminator(Opcode),
    /// `@p`/`!p` followed by the word it treats as a bare literal.
    InlineLiteral(Opcode, Operand),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeItem {
    Org(u32),
    Warm,
    Label(String),
    LoopMark,
    Then,
    While,
    End,
    Instr { instr: Instr, line: u32, col: u32 },
    Data(Operand),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeBlock {
    pub coord: Coord,
    pub items: Vec<NodeItem>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    pub line: u32,
    pub col: u32,
    pub message: String,
}

pub fn parse(toks: &[Tok]) -> (Vec<NodeBlock>, Vec<ParseError>) {
    let mut blocks = Vec::new();
    let mut errors = Vec::new();
    let mut current: Option<NodeBlock> = None;

    let mut i = 0usize;
    while i < toks.len() {
        let tok = &toks[i];
        match tok.text.as_str() {
            "node" => {
                if let Some(block) = current.take() {
                    blocks.push(block);
                }
                match toks.get(i + 1).and_then(|t| t.text.parse::<u16>().ok()).and_then(|raw| Coord::try_from(raw).ok()) {
                    Some(coord) => {
                        current = Some(NodeBlock { coord, items: Vec::new() });
                        i += 2;
                    }
                    None => {
                        errors.push(ParseError {
                            line: tok.line,
                            col: tok.col,
                            message: "node directive needs a valid row*100+col coordinate".into(),
                        });
                        i += 1;
                    }
                }
                continue;
            }
            "org" => {
                let Some(block) = current.as_mut() else {
                    errors.push(no_active_node(tok));
                    i += 1;
                    continue;
                };
                match toks.get(i + 1).and_then(|t| parse_number(&t.text)) {
                    Some(n) => {
                        block.items.push(NodeItem::Org(n));
                        i += 2;
                    }
                    None => {
                        errors.push(ParseError { line: tok.line, col: tok.col, message: "org needs a numeric address".into() });
                        i += 1;
                    }
                }
                continue;
            }
            "warm" => {
                push_or_error(&mut current, &mut errors, tok, NodeItem::Warm);
                i += 1;
                continue;
            }
            "for" | "begin" => {
                push_or_error(&mut current, &mut errors, tok, NodeItem::LoopMark);
                i += 1;
                continue;
            }
            "then" => {
                push_or_error(&mut current, &mut errors, tok, NodeItem::Then);
                i += 1;
                continue;
            }
            "while" => {
                push_or_error(&mut current, &mut errors, tok, NodeItem::While);
                i += 1;
                continue;
            }
            "end" => {
                push_or_error(&mut current, &mut errors, tok, NodeItem::End);
                i += 1;
                continue;
            }
            _ => {}
        }

        if let Some(name) = tok.text.strip_suffix(':') {
            if !name.is_empty() {
                push_or_error(&mut current, &mut errors, tok, NodeItem::Label(name.to_string()));
                i += 1;
                continue;
            }
        }

        if let Some(op) = Opcode::from_mnemonic(&tok.text) {
            let Some(block) = current.as_mut() else {
                errors.push(no_active_node(tok));
                i += 1;
                continue;
            };

            if op.takes_inline_literal() {
                match toks.get(i + 1).filter(|t| !is_reserved_word(&t.text)).map(|t| parse_operand(&t.text)) {
                    Some(Some(operand)) => {
                        block.items.push(NodeItem::Instr {
                            instr: Instr::InlineLiteral(op, operand),
                            line: tok.line,
                            col: tok.col,
                        });
                        i += 2;
                    }
                    _ => {
                        errors.push(ParseError {
                            line: tok.line,
                            col: tok.col,
                            message: format!("{} needs a following literal", op.mnemonic()),
                        });
                        i += 1;
                    }
                }
                continue;
            }

            if matches!(op, Opcode::Ret | Opcode::Ex) {
                block.items.push(NodeItem::Instr { instr: Instr::Terminator(op), line: tok.line, col: tok.col });
                i += 1;
                continue;
            }

            if op.requires_address() {
                let operand =
                    toks.get(i + 1).filter(|t| !is_reserved_word(&t.text)).and_then(|t| parse_operand(&t.text));
                match operand {
                    Some(operand) => {
                        block.items.push(NodeItem::Instr {
                            instr: Instr::Addressed(op, operand),
                            line: tok.line,
                            col: tok.col,
                        });
                        i += 2;
                    }
                    None => {
                        block.items.push(NodeItem::Instr { instr: Instr::Implicit(op), line: tok.line, col: tok.col });
                        i += 1;
                    }
                }
                continue;
            }

            block.items.push(NodeItem::Instr { instr: Instr::Bare(op), line: tok.line, col: tok.col });
            i += 1;
            continue;
        }

        if let Some(operand) = parse_operand(&tok.text) {
            let Some(block) = current.as_mut() else {
                errors.push(no_active_node(tok));
                i += 1;
                continue;
            };
            block.items.push(NodeItem::Data(operand));
            i += 1;
            continue;
        }

        errors.push(ParseError { line: tok.line, col: tok.col, message: format!("unrecognized token '{}'", tok.text) });
        i += 1;
    }

    if let Some(block) = current.take() {
        blocks.push(block);
    }

    (blocks, errors)
}

fn push_or_error(current: &mut Option<NodeBlock>, errors: &mut Vec<ParseError>, tok: &Tok, item: NodeItem) {
    match current.as_mut() {
        Some(block) => block.items.push(item),
        None => errors.push(no_active_node(tok)),
    }
}

fn no_active_node(tok: &Tok) -> ParseError {
    ParseError { line: tok.line, col: tok.col, message: "no active node; write 'node N' first".into() }
}

/// True for anything that can't be an operand: a directive keyword, a
/// mnemonic, or a label definition. Lets the lookahead tell "`if dup`"
/// (implicit branch, `dup` starts the next statement) apart from "`call
/// loop`" (explicit operand naming a label).
fn is_reserved_word(text: &str) -> bool {
    matches!(text, "node" | "org" | "warm" | "for" | "begin" | "then" | "while" | "end")
        || Opcode::from_mnemonic(text).is_some()
        || text.ends_with(':')
}

fn parse_operand(text: &str) -> Option<Operand> {
    if let Some(n) = parse_number(text) {
        return Some(Operand::Number(n));
    }
    if text.chars().next().is_some_and(|c| c.is_alphabetic() || c == '_') {
        return Some(Operand::Label(text.to_string()));
    }
    None
}

fn parse_number(text: &str) -> Option<u32> {
    if let Some(hex) = text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        return u32::from_str_radix(hex, 16).ok();
    }
    text.parse::<u32>().ok()
}
