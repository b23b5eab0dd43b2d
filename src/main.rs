
#[macro_use]
extern crate maplit;

mod builtin;
mod equality;
mod expr;
mod read;
mod runtime;

use std::io::{self, Write};

// One form per line against a persistent root environment; errors are
// reported and the session continues.
fn main() {
    let env = builtin::initial_environment();
    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        print!("> ");
        stdout.flush().expect("IO error writing prompt");
        let mut line = String::new();
        let bytes = stdin.read_line(&mut line).expect("IO error reading input");
        if bytes == 0 {
            break;
        }
        if line.trim().is_empty() {
            continue;
        }
        match read::read(&line).and_then(|expr| expr.eval(&env)) {
            Ok(value) => println!("{}", value),
            Err(err) => println!("Error: {}", err),
        }
    }
}
