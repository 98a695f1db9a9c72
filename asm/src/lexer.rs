//! Splits source text into whitespace-delimited tokens, stripping `\ ...`
//! line comments and `( ... )` block comments. Numbers, labels, mnemonics,
//! and directive keywords all come out as plain text; [`super::parser`]
//! decides what each one means.

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tok {
    pub text: String,
    pub line: u32,
    pub col: u32,
}

pub fn lex(source: &str) -> Vec<Tok> {
    let mut toks = Vec::new();
    let mut in_block_comment = false;

    for (line_no, line) in source.lines().enumerate() {
        let line_no = line_no as u32 + 1;
        let mut col = 0u32;
        let mut chars = line.char_indices().peekable();

        while let Some(&(byte_idx, ch)) = chars.peek() {
            col = byte_idx as u32 + 1;
            if in_block_comment {
                chars.next();
                if ch == ')' {
                    in_block_comment = false;
                }
                continue;
            }
            if ch.is_whitespace() {
                chars.next();
                continue;
            }
            if ch == '\\' {
                break; // rest of the line is a comment
            }
            if ch == '(' {
                chars.next();
                in_block_comment = true;
                continue;
            }

            let start = byte_idx;
            let start_col = col;
            while let Some(&(_, c)) = chars.peek() {
                if c.is_whitespace() {
                    break;
                }
                chars.next();
            }
            let end = chars.peek().map(|&(i, _)| i).unwrap_or(line.len());
            toks.push(Tok { text: line[start..end].to_string(), line: line_no, col: start_col });
        }
    }

    toks
}
