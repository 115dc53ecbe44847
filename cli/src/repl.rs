//! The interactive command loop.
//!
//! Reads a command name, collects its arguments, runs it through the
//! [`Driver`] and reports the outcome. Precondition failures and local
//! errors go to the error stream; results and rejected requests go to the
//! output stream. Only fatal connection errors end the loop early.

use std::io::{BufRead, Write};
use std::str::FromStr;

use library_core::{ApiError, Credentials, Driver, NewBook, Transport};
use serde_json::Value;

use crate::input::TokenReader;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Register,
    Login,
    EnterLibrary,
    GetBooks,
    GetBook,
    AddBook,
    DeleteBook,
    Logout,
    Exit,
}

#[derive(Debug, PartialEq, Eq)]
pub struct UnknownCommand;

impl FromStr for Command {
    type Err = UnknownCommand;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "register" => Ok(Command::Register),
            "login" => Ok(Command::Login),
            "enter_library" => Ok(Command::EnterLibrary),
            "get_books" => Ok(Command::GetBooks),
            "get_book" => Ok(Command::GetBook),
            "add_book" => Ok(Command::AddBook),
            "delete_book" => Ok(Command::DeleteBook),
            "logout" => Ok(Command::Logout),
            "exit" => Ok(Command::Exit),
            _ => Err(UnknownCommand),
        }
    }
}

enum Flow {
    Continue,
    Exit,
}

pub struct Shell<R, W, E, T> {
    input: TokenReader<R>,
    out: W,
    err: E,
    driver: Driver<T>,
}

impl<R: BufRead, W: Write, E: Write, T: Transport> Shell<R, W, E, T> {
    pub fn new(input: R, out: W, err: E, driver: Driver<T>) -> Self {
        Self {
            input: TokenReader::new(input),
            out,
            err,
            driver,
        }
    }

    pub fn driver(&self) -> &Driver<T> {
        &self.driver
    }

    /// Run until `exit`, end of input, or a fatal error.
    pub fn run(&mut self) -> Result<(), ApiError> {
        while let Some(token) = self.input.next_token()? {
            let flow = match token.parse::<Command>() {
                Ok(command) => self.dispatch(command)?,
                Err(UnknownCommand) => {
                    writeln!(self.out, "Invalid input!")?;
                    Flow::Continue
                }
            };
            if let Flow::Exit = flow {
                break;
            }
            writeln!(self.out)?;
            self.out.flush()?;
        }
        Ok(())
    }

    fn dispatch(&mut self, command: Command) -> Result<Flow, ApiError> {
        match command {
            Command::Register => {
                let Some(credentials) = self.read_credentials()? else {
                    return Ok(Flow::Exit);
                };
                let result = self.driver.register(&credentials);
                self.report(result, "Registration succeeded!", "Registration failed")?;
            }
            Command::Login => {
                let Some(credentials) = self.read_credentials()? else {
                    return Ok(Flow::Exit);
                };
                let result = self.driver.login(&credentials);
                self.report(result, "Login succeeded!", "Login failed")?;
            }
            Command::EnterLibrary => {
                let result = self.driver.enter_library();
                self.report(result, "Authorized!", "Couldn't enter the library")?;
            }
            Command::GetBooks => {
                let result = self.driver.get_books();
                self.report_json(result, "Received the books!", "The books weren't received")?;
            }
            Command::GetBook => {
                let Some(id) = self.read_number("Book id: ")? else {
                    return Ok(Flow::Exit);
                };
                let result = self.driver.get_book(id);
                self.report_json(result, "Received the book!", "The book wasn't received")?;
            }
            Command::AddBook => {
                let Some(book) = self.read_book()? else {
                    return Ok(Flow::Exit);
                };
                let result = self.driver.add_book(&book);
                self.report(result, "Added book to the library!", "Couldn't add the book")?;
            }
            Command::DeleteBook => {
                let Some(id) = self.read_number("Book id: ")? else {
                    return Ok(Flow::Exit);
                };
                let result = self.driver.delete_book(id);
                self.report(result, "Removed the book from the library!", "Couldn't remove the book")?;
            }
            Command::Logout => {
                let result = self.driver.logout();
                self.report(result, "You logged out!", "Couldn't log out")?;
            }
            Command::Exit => return Ok(Flow::Exit),
        }
        Ok(Flow::Continue)
    }

    fn prompt(&mut self, label: &str) -> Result<(), ApiError> {
        write!(self.out, "{label}")?;
        self.out.flush()?;
        Ok(())
    }

    fn read_text(&mut self, label: &str) -> Result<Option<String>, ApiError> {
        self.prompt(label)?;
        Ok(self.input.next_text()?)
    }

    /// Prompt until a non-negative integer is entered.
    fn read_number(&mut self, label: &str) -> Result<Option<u32>, ApiError> {
        loop {
            self.prompt(label)?;
            let Some(token) = self.input.next_token()? else {
                return Ok(None);
            };
            let parsed = token
                .chars()
                .all(|c| c.is_ascii_digit())
                .then(|| token.parse::<u32>().ok())
                .flatten();
            match parsed {
                Some(n) => return Ok(Some(n)),
                None => writeln!(self.err, "Invalid value!")?,
            }
        }
    }

    fn read_credentials(&mut self) -> Result<Option<Credentials>, ApiError> {
        let Some(username) = self.read_text("Username: ")? else {
            return Ok(None);
        };
        let Some(password) = self.read_text("Password: ")? else {
            return Ok(None);
        };
        Ok(Some(Credentials::new(username, password)))
    }

    fn read_book(&mut self) -> Result<Option<NewBook>, ApiError> {
        let Some(title) = self.read_text("Title: ")? else {
            return Ok(None);
        };
        let Some(author) = self.read_text("Author: ")? else {
            return Ok(None);
        };
        let Some(genre) = self.read_text("Genre: ")? else {
            return Ok(None);
        };
        let Some(publisher) = self.read_text("Publisher: ")? else {
            return Ok(None);
        };
        let Some(page_count) = self.read_number("Number of pages: ")? else {
            return Ok(None);
        };
        Ok(Some(NewBook {
            title,
            author,
            genre,
            publisher,
            page_count,
        }))
    }

    fn report(&mut self, result: Result<(), ApiError>, success: &str, failure: &str) -> Result<(), ApiError> {
        match result {
            Ok(()) => {
                writeln!(self.out, "{success}")?;
                Ok(())
            }
            Err(e) => self.report_error(e, failure),
        }
    }

    fn report_json(&mut self, result: Result<Value, ApiError>, success: &str, failure: &str) -> Result<(), ApiError> {
        match result {
            Ok(json) => {
                writeln!(self.out, "{success}")?;
                let pretty = serde_json::to_string_pretty(&json)
                    .map_err(|e| ApiError::Serialization(e.to_string()))?;
                writeln!(self.out, "{pretty}")?;
                Ok(())
            }
            Err(e) => self.report_error(e, failure),
        }
    }

    /// Print a failed operation. Fatal errors are handed back to the caller.
    fn report_error(&mut self, error: ApiError, failure: &str) -> Result<(), ApiError> {
        match error {
            e if e.is_fatal() => Err(e),
            e if e.is_precondition() => {
                writeln!(self.err, "{e}")?;
                Ok(())
            }
            ApiError::HttpError { status, message } => {
                writeln!(self.out, "{failure} ({status})")?;
                if let Some(message) = message {
                    writeln!(self.out, "{message}")?;
                }
                Ok(())
            }
            e => {
                writeln!(self.err, "{failure}: {e}")?;
                Ok(())
            }
        }
    }
}
