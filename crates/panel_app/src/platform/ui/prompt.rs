use std::io::{self, BufRead, Write};

/// Asks a yes/no question on the terminal. Anything but `y`/`yes` declines,
/// as does end of input.
pub fn confirm(question: &str) -> io::Result<bool> {
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    confirm_with(question, &mut stdin.lock(), &mut stdout)
}

pub fn confirm_with(
    question: &str,
    input: &mut impl BufRead,
    output: &mut impl Write,
) -> io::Result<bool> {
    write!(output, "{question} [y/N] ")?;
    output.flush()?;
    let mut answer = String::new();
    input.read_line(&mut answer)?;
    Ok(matches!(
        answer.trim().to_ascii_lowercase().as_str(),
        "y" | "yes"
    ))
}
