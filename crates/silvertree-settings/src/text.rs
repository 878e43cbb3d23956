//! Cleans remote strings before they reach the terminal.

#[derive(Clone, Copy)]
enum Skip {
    AfterEsc,
    Csi,
    // OSC and DCS-like strings end with BEL or ESC \.
    Str { bel_ends: bool, saw_esc: bool },
}

/// Drops escape sequences and control characters, folds tabs and newlines to
/// spaces and cuts the result at `max_chars` (marked with `…`).
pub fn sanitize_display(input: &str, max_chars: usize) -> String {
    let mut out = String::with_capacity(input.len().min(max_chars));
    let mut skip: Option<Skip> = None;
    let mut count = 0usize;

    for c in input.chars() {
        if let Some(state) = skip {
            skip = match state {
                Skip::AfterEsc => match c {
                    '[' => Some(Skip::Csi),
                    ']' => Some(Skip::Str {
                        bel_ends: true,
                        saw_esc: false,
                    }),
                    'P' | 'X' | '^' | '_' => Some(Skip::Str {
                        bel_ends: false,
                        saw_esc: false,
                    }),
                    _ => None,
                },
                Skip::Csi => (!('@'..='~').contains(&c)).then_some(Skip::Csi),
                Skip::Str { bel_ends, saw_esc } => {
                    if (bel_ends && c == '\x07') || (saw_esc && c == '\\') {
                        None
                    } else {
                        Some(Skip::Str {
                            bel_ends,
                            saw_esc: c == '\x1b',
                        })
                    }
                }
            };
            continue;
        }

        let shown = match c {
            '\x1b' => {
                skip = Some(Skip::AfterEsc);
                continue;
            }
            '\t' | '\n' | '\r' => ' ',
            c if c.is_control() || is_invisible_format(c) => continue,
            c => c,
        };
        if count == max_chars {
            out.push('…');
            break;
        }
        out.push(shown);
        count += 1;
    }
    out
}

fn is_invisible_format(c: char) -> bool {
    matches!(
        c,
        '\u{200b}'..='\u{200f}' | '\u{202a}'..='\u{202e}' | '\u{2066}'..='\u{2069}' | '\u{feff}'
    )
}
