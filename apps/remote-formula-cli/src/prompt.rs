//! Line-based terminal prompts.

use std::io::{self, BufRead, Write};

use remote_formula_core::{PromptError, Prompter};

/// Prompter reading answers from standard input.
pub struct TerminalPrompter;

impl TerminalPrompter {
    fn ask(question: &str) -> Result<String, PromptError> {
        print!("{question}");
        io::stdout().flush()?;

        let mut line = String::new();
        if io::stdin().lock().read_line(&mut line)? == 0 {
            return Err(PromptError::Cancelled);
        }
        Ok(line.trim().to_string())
    }
}

/// Resolve an answer to one of `items`, by 1-based index or by name.
fn pick<'a>(items: &'a [String], answer: &str) -> Option<&'a String> {
    answer
        .parse::<usize>()
        .ok()
        .and_then(|n| n.checked_sub(1))
        .and_then(|i| items.get(i))
        .or_else(|| items.iter().find(|item| *item == answer))
}

impl Prompter for TerminalPrompter {
    fn select(&self, label: &str, items: &[String]) -> Result<String, PromptError> {
        if items.is_empty() {
            return Err(PromptError::NoChoices(label.to_string()));
        }
        println!("{label}:");
        for (i, item) in items.iter().enumerate() {
            println!("  {}. {item}", i + 1);
        }
        loop {
            let answer = Self::ask(&format!("Choice [1-{}]: ", items.len()))?;
            if let Some(item) = pick(items, &answer) {
                return Ok(item.clone());
            }
            println!("Invalid choice");
        }
    }

    fn text(&self, label: &str, required: bool) -> Result<String, PromptError> {
        loop {
            let answer = Self::ask(&format!("{label}: "))?;
            if !required || !answer.is_empty() {
                return Ok(answer);
            }
            println!("{label} is required");
        }
    }

    fn confirm(&self, label: &str) -> Result<bool, PromptError> {
        loop {
            match Self::ask(&format!("{label} [y/n]: "))?.to_lowercase().as_str() {
                "y" | "yes" | "true" => return Ok(true),
                "n" | "no" | "false" => return Ok(false),
                _ => println!("Please answer y or n"),
            }
        }
    }

    fn password(&self, label: &str) -> Result<String, PromptError> {
        Ok(rpassword::prompt_password(format!("{label}: "))?)
    }
}
