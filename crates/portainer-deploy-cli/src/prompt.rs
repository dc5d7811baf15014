//! Interactive credential prompts.

use std::io::{self, BufRead, IsTerminal, Write};

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::terminal;
use portainer_deploy_api::Credentials;
use secrecy::SecretString;

/// Ask for the Portainer login. `username` skips the first prompt.
pub(crate) fn credentials(username: Option<&str>) -> anyhow::Result<Credentials> {
    let username = match username {
        Some(name) => name.to_owned(),
        None => read_line("Enter username: ")?,
    };
    let password = read_password("Enter password: ")?;
    Ok(Credentials::new(username, password))
}

fn read_line(prompt: &str) -> io::Result<String> {
    print!("{prompt}");
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().lock().read_line(&mut input)?;
    Ok(input.trim_end_matches(['\r', '\n']).to_owned())
}

/// Masked with `*` on a terminal; piped stdin is read as a plain line.
fn read_password(prompt: &str) -> anyhow::Result<SecretString> {
    if !io::stdin().is_terminal() {
        return Ok(SecretString::from(read_line(prompt)?));
    }

    print!("{prompt}");
    io::stdout().flush()?;

    terminal::enable_raw_mode()?;
    let result = read_masked();
    terminal::disable_raw_mode()?;
    println!();

    Ok(SecretString::from(result?))
}

fn read_masked() -> anyhow::Result<String> {
    let mut password = String::new();
    let mut stdout = io::stdout();

    loop {
        let Event::Key(KeyEvent {
            code,
            modifiers,
            kind,
            ..
        }) = event::read()?
        else {
            continue;
        };
        if kind == KeyEventKind::Release {
            continue;
        }

        match code {
            KeyCode::Enter => break,
            KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => {
                anyhow::bail!("password prompt interrupted")
            }
            KeyCode::Char(c) => {
                password.push(c);
                write!(stdout, "*")?;
                stdout.flush()?;
            }
            KeyCode::Backspace => {
                if password.pop().is_some() {
                    write!(stdout, "\u{8} \u{8}")?;
                    stdout.flush()?;
                }
            }
            _ => {}
        }
    }

    Ok(password)
}
