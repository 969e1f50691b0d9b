use crate::domain::ports::Confirm;
use crate::utils::error::Result;
use std::io::{self, BufRead, BufReader, Stdin, Write};
use std::sync::Mutex;

/// Yes/no questions answered one line at a time.
pub struct LineConfirm<R: BufRead + Send> {
    input: Mutex<R>,
}

pub type ConsoleConfirm = LineConfirm<BufReader<Stdin>>;

impl ConsoleConfirm {
    pub fn stdin() -> Self {
        Self::new(BufReader::new(io::stdin()))
    }
}

impl<R: BufRead + Send> LineConfirm<R> {
    pub fn new(input: R) -> Self {
        Self {
            input: Mutex::new(input),
        }
    }
}

impl<R: BufRead + Send> Confirm for LineConfirm<R> {
    fn confirm(&self, question: &str) -> Result<bool> {
        let mut input = self
            .input
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        loop {
            print!("{} [y/n]: ", question);
            io::stdout().flush()?;

            let mut answer = String::new();
            // EOF 視為拒絕
            if input.read_line(&mut answer)? == 0 {
                println!();
                return Ok(false);
            }

            match answer.trim().to_lowercase().as_str() {
                "y" | "yes" => return Ok(true),
                "n" | "no" => return Ok(false),
                _ => println!("Please enter y or n"),
            }
        }
    }
}
