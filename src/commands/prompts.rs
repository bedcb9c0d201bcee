//! Stdin prompting helpers shared by the interactive commands.

use std::io::{self, Write};

/// Prompt for one line of input. An empty answer returns the default when
/// one is given, otherwise the empty string.
pub fn prompt_line(label: &str, default: Option<&str>) -> Result<String, String> {
    match default {
        Some(d) if !d.is_empty() => print!("{} [{}]: ", label, d),
        _ => print!("{}: ", label),
    }
    io::stdout()
        .flush()
        .map_err(|e| format!("Failed to flush stdout: {}", e))?;

    let mut line = String::new();
    io::stdin()
        .read_line(&mut line)
        .map_err(|e| format!("Failed to read input: {}", e))?;

    let answer = line.trim();
    if answer.is_empty() {
        Ok(default.unwrap_or("").to_string())
    } else {
        Ok(answer.to_string())
    }
}

/// Ask a yes/no question. Empty input takes the default.
pub fn confirm(label: &str, default_yes: bool) -> Result<bool, String> {
    let suffix = if default_yes { "(Y/n)" } else { "(y/N)" };
    let answer = prompt_line(&format!("{} {}", label, suffix), None)?;
    let lowered = answer.to_lowercase();
    if lowered.is_empty() {
        Ok(default_yes)
    } else {
        Ok(lowered == "y" || lowered == "yes")
    }
}

/// Read lines until a lone `.` line or EOF. Blank lines pass through, so
/// pasted markdown keeps its paragraph breaks, and stdin stays usable for
/// the prompts that follow.
pub fn read_multiline() -> Result<String, String> {
    let mut collected = String::new();
    loop {
        let mut line = String::new();
        let read = io::stdin()
            .read_line(&mut line)
            .map_err(|e| format!("Failed to read input: {}", e))?;
        if read == 0 || line.trim() == "." {
            break;
        }
        collected.push_str(&line);
    }
    Ok(collected)
}
