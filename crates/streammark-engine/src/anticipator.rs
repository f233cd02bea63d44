//! Streaming anticipator (SA): decides whether still-unterminated formatting
//! or math at the tail of a dirty block's raw text can be "anticipated" by
//! speculatively appending closing delimiters, so the inline parser sees
//! complete (if provisional) markup instead of stray open delimiters.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StackToken {
    Code,
    Strike,
    Strong,
    Em,
    MathInline,
    MathDisplay,
}

impl StackToken {
    fn closer(self) -> &'static str {
        match self {
            StackToken::Code => "`",
            StackToken::Strike => "~~",
            StackToken::Strong => "**",
            StackToken::Em => "*",
            StackToken::MathInline => "$",
            StackToken::MathDisplay => "$$",
        }
    }
}

/// `true` means `{inline: true}` with every other flag false.
#[derive(Debug, Clone, Copy)]
pub enum AnticipationConfig {
    Bool(bool),
    Flags(AnticipationFlags),
}

#[derive(Debug, Clone, Copy, Default)]
pub struct AnticipationFlags {
    pub inline: bool,
    pub math_inline: bool,
    pub math_block: bool,
    pub html: bool,
    pub mdx: bool,
    pub regex: bool,
}

impl AnticipationConfig {
    fn resolve(self) -> AnticipationFlags {
        match self {
            AnticipationConfig::Bool(true) => AnticipationFlags {
                inline: true,
                ..Default::default()
            },
            AnticipationConfig::Bool(false) => AnticipationFlags::default(),
            AnticipationConfig::Flags(f) => f,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseStatus {
    Complete,
    Anticipated,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PrepareResult {
    Raw {
        reason: &'static str,
    },
    Parse {
        status: ParseStatus,
        content: String,
        appended: Option<String>,
    },
}

/// Single left-to-right scan maintaining a stack of open tokens. A code span
/// suppresses recognition of every other delimiter until it closes (or EOF).
/// Newlines never close a token but do mark math-display anticipation as
/// invalid once one has been open across a newline.
fn scan(content: &str) -> (Vec<StackToken>, bool) {
    let bytes = content.as_bytes();
    let mut stack: Vec<StackToken> = Vec::new();
    let mut math_display_crossed_newline = false;
    let mut i = 0;
    while i < bytes.len() {
        if stack.last() == Some(&StackToken::Code) {
            match bytes[i] {
                b'`' => {
                    stack.pop();
                    i += 1;
                }
                _ => i += 1,
            }
            continue;
        }
        if bytes[i..].starts_with(b"$$") {
            toggle(&mut stack, StackToken::MathDisplay);
            i += 2;
            continue;
        }
        match bytes[i] {
            b'$' => {
                toggle(&mut stack, StackToken::MathInline);
                i += 1;
            }
            b'`' => {
                stack.push(StackToken::Code);
                i += 1;
            }
            b'\n' => {
                if stack.contains(&StackToken::MathDisplay) {
                    math_display_crossed_newline = true;
                }
                i += 1;
            }
            _ if bytes[i..].starts_with(b"**") || bytes[i..].starts_with(b"__") => {
                toggle(&mut stack, StackToken::Strong);
                i += 2;
            }
            _ if bytes[i..].starts_with(b"~~") => {
                toggle(&mut stack, StackToken::Strike);
                i += 2;
            }
            b'*' | b'_' => {
                toggle(&mut stack, StackToken::Em);
                i += 1;
            }
            _ => i += 1,
        }
    }
    (stack, math_display_crossed_newline)
}

fn toggle(stack: &mut Vec<StackToken>, tok: StackToken) {
    if stack.last() == Some(&tok) {
        stack.pop();
    } else {
        stack.push(tok);
    }
}

pub fn prepare(content: &str, config: AnticipationConfig) -> PrepareResult {
    let flags = config.resolve();
    let (stack, md_newline_crossed) = scan(content);

    if stack.is_empty() {
        return PrepareResult::Parse {
            status: ParseStatus::Complete,
            content: content.to_string(),
            appended: None,
        };
    }

    if let Some(tok) = stack
        .iter()
        .find(|t| matches!(t, StackToken::MathInline | StackToken::MathDisplay))
    {
        let allowed = match tok {
            StackToken::MathInline => flags.math_inline,
            StackToken::MathDisplay => flags.math_block && !md_newline_crossed,
            _ => unreachable!(),
        };
        if !allowed {
            return PrepareResult::Raw {
                reason: "incomplete-math",
            };
        }
    }

    let has_formatting = stack
        .iter()
        .any(|t| matches!(t, StackToken::Code | StackToken::Strike | StackToken::Strong | StackToken::Em));
    if has_formatting && !flags.inline {
        return PrepareResult::Raw {
            reason: "incomplete-formatting",
        };
    }

    let appended: String = stack.iter().rev().map(|t| t.closer()).collect();
    let mut content = content.to_string();
    content.push_str(&appended);
    PrepareResult::Parse {
        status: ParseStatus::Anticipated,
        content,
        appended: Some(appended),
    }
}
